use super::*;
use crate::kernel::language::LanguageRegistry;
use crate::kernel::services::ports::SyncSettings;
use crate::kernel::syntax::{point_for_char, TreeUpdate, UpdateKind};
use crate::models::{TextChange, TextPosition};
use ropey::Rope;
use std::path::PathBuf;
use std::sync::mpsc::{self as std_mpsc, Receiver};

const PY: &str = "source.python";
const JSON: &str = "source.json";
const TIMEOUT: Duration = Duration::from_secs(5);

fn worker_with(settings: SyncSettings) -> (SyncWorker, Receiver<TreeUpdate>) {
    let registry = Arc::new(LanguageRegistry::from_settings(&settings));
    let store = TreeStore::new(settings.max_cached_trees);
    let (tx, rx) = std_mpsc::channel();
    let controller = SyncController::new(registry, store, &settings).with_updates(tx);
    (SyncWorker::spawn(controller).unwrap(), rx)
}

fn worker() -> (SyncWorker, Receiver<TreeUpdate>) {
    worker_with(SyncSettings::default())
}

fn insertion(rope: &mut Rope, offset: usize, text: &str) -> TextChange {
    let point = point_for_char(rope, offset);
    let change = TextChange::insert(TextPosition::new(offset, point.row, point.column), text);
    rope.insert(offset, text);
    change
}

#[test]
fn load_is_applied_before_following_edit() {
    let (worker, rx) = worker();
    let doc = DocumentId(1);
    let mut rope = Rope::from_str("def f():\n    pass");

    worker.load(doc, DocumentSnapshot::new(Some(PY), &rope.to_string()));
    let change = insertion(&mut rope, 6, "x");
    worker.text_changed(
        doc,
        TextChangedEvent::new(Some(PY), vec![change], &rope.to_string()),
    );
    assert!(worker.barrier());

    let kinds: Vec<_> = rx.try_iter().map(|u| u.kind).collect();
    assert_eq!(kinds, vec![UpdateKind::FullParse, UpdateKind::Incremental]);
    let entry = worker.store().snapshot(doc).unwrap();
    assert_eq!(entry.text.to_string(), "def f(x):\n    pass");
}

#[test]
fn jobs_run_in_submission_order() {
    let (worker, rx) = worker();
    let doc = DocumentId(2);
    let mut rope = Rope::from_str("items = []\n");
    worker.load(doc, DocumentSnapshot::new(Some(PY), &rope.to_string()));

    for i in 0..20 {
        let at = rope.len_chars() - 2;
        let text = if i == 0 { "0".to_string() } else { format!(", {i}") };
        let change = insertion(&mut rope, at, &text);
        worker.text_changed(
            doc,
            TextChangedEvent::new(Some(PY), vec![change], &rope.to_string()),
        );
    }
    assert!(worker.barrier());

    let updates: Vec<_> = rx.try_iter().collect();
    assert_eq!(updates.len(), 21);
    assert_eq!(updates[0].kind, UpdateKind::FullParse);
    assert!(updates[1..]
        .iter()
        .all(|u| u.kind == UpdateKind::Incremental && u.doc == doc));

    let entry = worker.store().snapshot(doc).unwrap();
    assert_eq!(entry.text, rope);
    let full = LanguageRegistry::from_settings(&SyncSettings::default())
        .parse_code(PY, &rope.to_string())
        .unwrap();
    assert_eq!(entry.tree.root_node().to_sexp(), full.root_node().to_sexp());
}

#[test]
fn debounced_edits_collapse_into_one_parse() {
    let mut settings = SyncSettings::default();
    settings
        .language_name_to_debounce_ms
        .insert("json".to_string(), 30.0);
    let (worker, rx) = worker_with(settings);
    let doc = DocumentId(3);
    let mut rope = Rope::from_str("[]");

    for digit in ["1", "2", "3"] {
        let at = rope.len_chars() - 1;
        let change = insertion(&mut rope, at, digit);
        worker.text_changed(
            doc,
            TextChangedEvent::new(Some(JSON), vec![change], &rope.to_string()),
        );
    }

    let update = rx.recv_timeout(TIMEOUT).unwrap();
    assert_eq!(update.kind, UpdateKind::FullParse);
    assert_eq!(worker.store().snapshot(doc).unwrap().text.to_string(), "[123]");

    // Later timers from the same burst find nothing pending.
    std::thread::sleep(Duration::from_millis(150));
    assert!(worker.barrier());
    assert!(rx.try_recv().is_err());
}

#[test]
fn close_drops_tree() {
    let (worker, _rx) = worker();
    let doc = DocumentId(4);
    worker.load(doc, DocumentSnapshot::new(Some(PY), "pass\n"));
    worker.close(doc, 1);
    assert!(worker.barrier());
    assert!(worker.store().contains(doc));

    worker.close(doc, 0);
    assert!(worker.barrier());
    assert!(!worker.store().contains(doc));
}

struct OneDocument {
    doc: DocumentId,
    scope: &'static str,
    text: &'static str,
}

impl DocumentSource for OneDocument {
    fn text(&self, doc: DocumentId) -> Option<Rope> {
        (doc == self.doc).then(|| Rope::from_str(self.text))
    }

    fn scope(&self, doc: DocumentId) -> Option<String> {
        (doc == self.doc).then(|| self.scope.to_string())
    }

    fn path(&self, _doc: DocumentId) -> Option<PathBuf> {
        None
    }
}

#[test]
fn tree_request_parses_missing_document() {
    let (worker, rx) = worker();
    let source = Arc::new(OneDocument {
        doc: DocumentId(5),
        scope: JSON,
        text: "{\"a\": 1}",
    });

    let entry = worker.tree(DocumentId(5), source.clone()).unwrap();
    assert_eq!(entry.scope, JSON);
    assert_eq!(rx.recv_timeout(TIMEOUT).unwrap().kind, UpdateKind::FullParse);

    assert!(worker.tree(DocumentId(6), source).is_none());
}

#[test]
fn job_debug_names_kind_and_document() {
    let job = SyncJob::Close {
        doc: DocumentId(7),
        remaining_views: 0,
    };
    let rendered = format!("{job:?}");
    assert!(rendered.contains("close"));
    assert!(rendered.contains("DocumentId(7)"));
    assert_eq!(job.doc(), Some(DocumentId(7)));
}

#[test]
fn current_thread_runtime_drains_queue_and_fires_timers() {
    let mut settings = SyncSettings::default();
    settings
        .language_name_to_debounce_ms
        .insert("json".to_string(), 10.0);
    let registry = Arc::new(LanguageRegistry::from_settings(&settings));
    let store = TreeStore::new(settings.max_cached_trees);
    let (tx, rx) = std_mpsc::channel();
    let controller = SyncController::new(registry, store, &settings).with_updates(tx);
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let worker = SyncWorker::with_runtime(controller, runtime).unwrap();

    let doc = DocumentId(8);
    worker.load(doc, DocumentSnapshot::new(Some(PY), "pass\n"));
    assert!(worker.barrier());
    assert!(worker.store().contains(doc));

    let mut rope = Rope::from_str("[]");
    let change = insertion(&mut rope, 1, "1");
    worker.text_changed(
        DocumentId(9),
        TextChangedEvent::new(Some(JSON), vec![change], &rope.to_string()),
    );
    let kinds: Vec<_> = std::iter::from_fn(|| rx.recv_timeout(TIMEOUT).ok())
        .take(2)
        .map(|u| (u.doc, u.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (doc, UpdateKind::FullParse),
            (DocumentId(9), UpdateKind::FullParse)
        ]
    );
}

#[test]
fn last_synced_document_survives_eviction() {
    let mut settings = SyncSettings::default();
    settings.max_cached_trees = 1;
    let (worker, _rx) = worker_with(settings);
    let large = "x = 1\n".repeat(20_000);

    worker.load(DocumentId(10), DocumentSnapshot::new(Some(PY), &large));
    worker.load(DocumentId(11), DocumentSnapshot::new(Some(PY), "y = 2\n"));
    let mut rope = Rope::from_str("z = 3\n");
    let change = insertion(&mut rope, 5, "0");
    worker.text_changed(
        DocumentId(12),
        TextChangedEvent::new(Some(PY), vec![change], &rope.to_string()),
    );
    assert!(worker.barrier());

    assert_eq!(worker.store().tracked_documents(), vec![DocumentId(12)]);
}

#[test]
fn dropping_worker_stops_sync_thread() {
    let (worker, rx) = worker();
    worker.load(DocumentId(13), DocumentSnapshot::new(Some(PY), "pass\n"));
    drop(worker);

    // Queued jobs still run, then the controller and its update sender go away.
    assert_eq!(rx.recv_timeout(TIMEOUT).unwrap().kind, UpdateKind::FullParse);
    assert!(matches!(
        rx.recv_timeout(TIMEOUT),
        Err(std_mpsc::RecvTimeoutError::Disconnected)
    ));
}
