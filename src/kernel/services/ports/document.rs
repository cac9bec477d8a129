use crate::models::DocumentId;
use ropey::Rope;
use std::path::PathBuf;

/// Read access to the editor's live documents.
///
/// Every method returns `None` for a handle that no longer resolves to an open document.
pub trait DocumentSource {
    fn text(&self, doc: DocumentId) -> Option<Rope>;

    /// Syntax scope the editor currently assigns to the document, e.g. `source.python`.
    fn scope(&self, doc: DocumentId) -> Option<String>;

    fn path(&self, _doc: DocumentId) -> Option<PathBuf> {
        None
    }
}
