use std::path::Path;
use std::time::Duration;

use regex::Regex;
use rustc_hash::FxHashMap;
use tree_sitter::{Language, Parser, Tree};

use crate::kernel::services::ports::SyncSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum LanguageId {
    Rust,
    Go,
    Python,
    JavaScript,
    TypeScript,
    Tsx,
    C,
    Cpp,
    Java,
    Json,
    Yaml,
    Html,
    Xml,
    Css,
    Toml,
    Sql,
    Bash,
}

impl LanguageId {
    pub const ALL: [Self; 17] = [
        Self::Rust,
        Self::Go,
        Self::Python,
        Self::JavaScript,
        Self::TypeScript,
        Self::Tsx,
        Self::C,
        Self::Cpp,
        Self::Java,
        Self::Json,
        Self::Yaml,
        Self::Html,
        Self::Xml,
        Self::Css,
        Self::Toml,
        Self::Sql,
        Self::Bash,
    ];

    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|s| s.to_str())? {
            "rs" => Some(Self::Rust),
            "go" => Some(Self::Go),
            "py" | "pyi" => Some(Self::Python),
            "js" | "mjs" | "cjs" | "jsx" => Some(Self::JavaScript),
            "ts" | "mts" | "cts" => Some(Self::TypeScript),
            "tsx" => Some(Self::Tsx),
            "c" => Some(Self::C),
            "cc" | "cpp" | "cxx" | "c++" | "hpp" | "hh" | "hxx" | "h++" | "h" => Some(Self::Cpp),
            "java" => Some(Self::Java),
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "html" | "htm" => Some(Self::Html),
            "xml" => Some(Self::Xml),
            "css" => Some(Self::Css),
            "toml" => Some(Self::Toml),
            "sql" => Some(Self::Sql),
            "sh" | "bash" => Some(Self::Bash),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|lang| lang.name() == name)
    }

    /// Settings-facing language name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Rust => "rust",
            Self::Go => "go",
            Self::Python => "python",
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Tsx => "tsx",
            Self::C => "c",
            Self::Cpp => "cpp",
            Self::Java => "java",
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Html => "html",
            Self::Xml => "xml",
            Self::Css => "css",
            Self::Toml => "toml",
            Self::Sql => "sql",
            Self::Bash => "bash",
        }
    }

    pub fn default_scopes(self) -> &'static [&'static str] {
        match self {
            Self::Rust => &["source.rust"],
            Self::Go => &["source.go"],
            Self::Python => &["source.python"],
            Self::JavaScript => &["source.js", "source.jsx"],
            Self::TypeScript => &["source.ts"],
            Self::Tsx => &["source.tsx"],
            Self::C => &["source.c"],
            Self::Cpp => &["source.c++"],
            Self::Java => &["source.java"],
            Self::Json => &["source.json"],
            Self::Yaml => &["source.yaml"],
            Self::Html => &["text.html.basic"],
            Self::Xml => &["text.xml"],
            Self::Css => &["source.css"],
            Self::Toml => &["source.toml"],
            Self::Sql => &["source.sql"],
            Self::Bash => &["source.shell"],
        }
    }

    pub fn default_scope(self) -> &'static str {
        self.default_scopes()[0]
    }

    pub fn grammar(self) -> Language {
        match self {
            Self::Rust => tree_sitter_rust::language(),
            Self::Go => tree_sitter_go::language(),
            Self::Python => tree_sitter_python::language(),
            Self::C => tree_sitter_c::language(),
            Self::Cpp => tree_sitter_cpp::language(),
            Self::Java => tree_sitter_java::language(),
            Self::JavaScript => tree_sitter_javascript::language(),
            Self::TypeScript => tree_sitter_typescript::language_typescript(),
            Self::Tsx => tree_sitter_typescript::language_tsx(),
            Self::Json => tree_sitter_json::language(),
            Self::Yaml => tree_sitter_yaml::language(),
            Self::Html => tree_sitter_html::language(),
            Self::Xml => tree_sitter_xml::language_xml(),
            Self::Css => tree_sitter_css::language(),
            Self::Toml => tree_sitter_toml::language(),
            Self::Sql => db3_sqlparser::language(),
            Self::Bash => tree_sitter_bash::language(),
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Rust => "Rust",
            Self::Go => "Go",
            Self::Python => "Python",
            Self::JavaScript => "JavaScript",
            Self::TypeScript => "TypeScript",
            Self::Tsx => "TSX",
            Self::C => "C",
            Self::Cpp => "C++",
            Self::Java => "Java",
            Self::Json => "JSON",
            Self::Yaml => "YAML",
            Self::Html => "HTML",
            Self::Xml => "XML",
            Self::Css => "CSS",
            Self::Toml => "TOML",
            Self::Sql => "SQL",
            Self::Bash => "Bash",
        }
    }
}

/// Scope -> grammar table, built once from settings.
///
/// Read-only once constructed; the sync controller only performs lookups against it.
pub struct LanguageRegistry {
    scopes: FxHashMap<String, LanguageId>,
    grammars: FxHashMap<LanguageId, Language>,
    debounce: FxHashMap<LanguageId, Duration>,
    ignore_patterns: Vec<Regex>,
}

impl LanguageRegistry {
    pub fn from_settings(settings: &SyncSettings) -> Self {
        let mut registry = Self {
            scopes: FxHashMap::default(),
            grammars: FxHashMap::default(),
            debounce: FxHashMap::default(),
            ignore_patterns: Vec::new(),
        };

        for name in &settings.installed_languages {
            let Some(language) = LanguageId::from_name(name) else {
                tracing::warn!(language = %name, "unknown language in installed_languages");
                continue;
            };
            if registry.grammars.contains_key(&language) {
                continue;
            }
            registry.grammars.insert(language, language.grammar());
            let scopes: Vec<String> = match settings.language_name_to_scopes.get(name) {
                Some(custom) => custom.clone(),
                None => language
                    .default_scopes()
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            };
            for scope in scopes {
                registry.scopes.insert(scope, language);
            }

            let debounce_ms = settings.debounce_ms(name);
            if debounce_ms > 0 {
                registry
                    .debounce
                    .insert(language, Duration::from_millis(debounce_ms));
            }
        }

        for pattern in &settings.file_ignore_patterns {
            match Regex::new(pattern) {
                Ok(re) => registry.ignore_patterns.push(re),
                Err(e) => {
                    tracing::warn!(pattern = %pattern, error = %e, "invalid file ignore pattern")
                }
            }
        }

        tracing::debug!(
            languages = registry.grammars.len(),
            scopes = registry.scopes.len(),
            "language registry ready"
        );
        registry
    }

    /// Registered scope for `scope`: an exact match, else any registered scope that is a
    /// dotted prefix of it (`source.yaml` serves `source.yaml.sublime.syntax`).
    pub fn check_scope(&self, scope: &str) -> Option<&str> {
        if scope.is_empty() {
            return None;
        }
        if let Some((registered, _)) = self.scopes.get_key_value(scope) {
            return Some(registered.as_str());
        }

        self.scopes
            .keys()
            .filter(|registered| {
                scope
                    .strip_prefix(registered.as_str())
                    .is_some_and(|rest| rest.starts_with('.'))
            })
            .max_by_key(|registered| registered.len())
            .map(String::as_str)
    }

    /// Scope the engine should track a document under, or `None` when it is unsupported or
    /// its path matches an ignore pattern.
    pub fn resolve_scope(&self, scope: Option<&str>, path: Option<&Path>) -> Option<String> {
        if let Some(path) = path.and_then(|p| p.to_str()) {
            if self.ignore_patterns.iter().any(|re| re.is_match(path)) {
                return None;
            }
        }
        self.check_scope(scope?).map(str::to_string)
    }

    pub fn language_for_scope(&self, scope: &str) -> Option<LanguageId> {
        self.scopes.get(scope).copied()
    }

    pub fn language_name_for_scope(&self, scope: &str) -> Option<&'static str> {
        self.language_for_scope(scope).map(LanguageId::name)
    }

    pub fn grammar(&self, language: LanguageId) -> Option<Language> {
        self.grammars.get(&language).copied()
    }

    pub fn grammar_for_scope(&self, scope: &str) -> Option<Language> {
        self.grammar(self.language_for_scope(scope)?)
    }

    pub fn debounce(&self, language: LanguageId) -> Duration {
        self.debounce
            .get(&language)
            .copied()
            .unwrap_or(Duration::ZERO)
    }

    pub fn debounce_for_scope(&self, scope: &str) -> Duration {
        self.language_for_scope(scope)
            .map(|language| self.debounce(language))
            .unwrap_or(Duration::ZERO)
    }

    pub fn installed_languages(&self) -> Vec<LanguageId> {
        let mut languages: Vec<_> = self.grammars.keys().copied().collect();
        languages.sort_by_key(|language| language.name());
        languages
    }

    /// One-off parse of arbitrary code under `scope`.
    pub fn parse_code(&self, scope: &str, text: &str) -> Option<Tree> {
        let scope = self.check_scope(scope)?;
        let grammar = self.grammar_for_scope(scope)?;
        let mut parser = Parser::new();
        parser.set_language(grammar).ok()?;
        parser.parse(text, None)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/language.rs"]
mod tests;
