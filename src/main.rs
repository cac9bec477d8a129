use std::path::Path;
use std::process::ExitCode;
use std::sync::{mpsc, Arc};
use std::time::Duration;

use treesync::kernel::services::adapters::{ensure_settings_file, load_settings};
use treesync::kernel::syntax::nav::format_tree;
use treesync::{
    DocumentId, DocumentSnapshot, LanguageId, LanguageRegistry, SyncController, SyncWorker,
    TreeStore,
};

mod logging;

const PARSE_TIMEOUT: Duration = Duration::from_secs(30);

fn main() -> ExitCode {
    let _logging = logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(file) = args.first() else {
        eprintln!("usage: treesync <file> [scope]");
        return ExitCode::from(2);
    };
    let path = Path::new(file);

    match run(path, args.get(1).map(String::as_str)) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "treesync failed");
            eprintln!("treesync: {}: {e}", path.display());
            ExitCode::FAILURE
        }
    }
}

fn run(path: &Path, scope_arg: Option<&str>) -> std::io::Result<ExitCode> {
    if let Err(e) = ensure_settings_file() {
        tracing::warn!(error = %e, "could not create settings file");
    }
    let mut settings = load_settings().unwrap_or_default();

    let language = LanguageId::from_path(path);
    let scope = match (scope_arg, language) {
        (Some(scope), _) => scope.to_string(),
        (None, Some(language)) => language.default_scope().to_string(),
        (None, None) => {
            eprintln!("treesync: no grammar for {}", path.display());
            return Ok(ExitCode::FAILURE);
        }
    };
    // The file's own language is always available to the CLI.
    if let Some(language) = language {
        if !settings.installed_languages.iter().any(|n| n == language.name()) {
            settings.installed_languages.push(language.name().to_string());
        }
    }

    let registry = Arc::new(LanguageRegistry::from_settings(&settings));
    let Some(resolved) = registry.resolve_scope(Some(&scope), Some(path)) else {
        eprintln!("treesync: no grammar for scope {scope}");
        return Ok(ExitCode::FAILURE);
    };

    let text = std::fs::read_to_string(path)?;
    let (tx, rx) = mpsc::channel();
    let store = TreeStore::new(settings.max_cached_trees);
    let controller = SyncController::new(registry, store, &settings).with_updates(tx);
    let worker = SyncWorker::spawn(controller)?;

    let doc = DocumentId(1);
    worker.load(
        doc,
        DocumentSnapshot::new(Some(&resolved), &text).with_path(path),
    );
    if rx.recv_timeout(PARSE_TIMEOUT).is_err() {
        eprintln!("treesync: parse did not finish");
        return Ok(ExitCode::FAILURE);
    }
    let Some(entry) = worker.store().snapshot(doc) else {
        eprintln!("treesync: parse did not finish");
        return Ok(ExitCode::FAILURE);
    };

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    println!("Tree ({}) - {name}", entry.language.display_name());
    print!("{}", format_tree(entry.tree.root_node()));
    Ok(ExitCode::SUCCESS)
}
