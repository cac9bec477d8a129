use crate::models::DocumentId;

/// Failure while turning a change batch into parser edits.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("change {index} reaches code point {offset}, snapshot has {len}")]
    OutOfBounds {
        index: usize,
        offset: usize,
        len: usize,
    },
    #[error("change {index} ends at {end} before it starts at {start}")]
    InvertedRange {
        index: usize,
        start: usize,
        end: usize,
    },
    #[error(
        "change {index} reports start point {reported:?}, snapshot has {actual:?}"
    )]
    PositionMismatch {
        index: usize,
        reported: (usize, usize),
        actual: (usize, usize),
    },
    #[error("reconstructed snapshot ({reconstructed} bytes) differs from editor text ({expected} bytes)")]
    SnapshotMismatch {
        reconstructed: usize,
        expected: usize,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("edit batch for document {doc} rejected: {source}")]
    Edit {
        doc: DocumentId,
        #[source]
        source: EditError,
    },
    #[error("parser produced no tree for document {doc} ({scope})")]
    ParseFailed { doc: DocumentId, scope: String },
}
