use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_MAX_CACHED_TREES: usize = 16;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    #[serde(default = "default_max_cached_trees")]
    pub max_cached_trees: usize,
    /// Verify every reconstructed snapshot against the editor text after an edit batch.
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_installed_languages")]
    pub installed_languages: Vec<String>,
    /// Overrides (or adds to) the built-in language -> scopes table.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub language_name_to_scopes: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub language_name_to_debounce_ms: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub file_ignore_patterns: Vec<String>,
}

fn default_max_cached_trees() -> usize {
    DEFAULT_MAX_CACHED_TREES
}

fn default_installed_languages() -> Vec<String> {
    vec!["python".to_string(), "json".to_string()]
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            max_cached_trees: DEFAULT_MAX_CACHED_TREES,
            debug: false,
            installed_languages: default_installed_languages(),
            language_name_to_scopes: BTreeMap::new(),
            language_name_to_debounce_ms: BTreeMap::new(),
            file_ignore_patterns: Vec::new(),
        }
    }
}

impl SyncSettings {
    pub fn from_json_str(data: &str) -> serde_json::Result<Self> {
        serde_json::from_str(data)
    }

    pub fn with_languages<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.installed_languages = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn debounce_ms(&self, language_name: &str) -> u64 {
        self.language_name_to_debounce_ms
            .get(language_name)
            .map(|ms| ms.max(0.0).round() as u64)
            .unwrap_or(0)
    }
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/ports/settings.rs"]
mod tests;
