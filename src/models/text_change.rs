use ropey::Rope;
use std::fmt;
use std::path::PathBuf;

/// Identity of an open buffer, owned by the editor.
///
/// Stable for the lifetime of the buffer; the engine only uses it as a cache key.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId(pub u64);

impl fmt::Debug for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentId({})", self.0)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A position as the editor reports it at the time a change happened.
///
/// `offset` counts code points from the start of the buffer, `col_utf8` counts UTF-8 bytes
/// from the start of `row`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextPosition {
    pub offset: usize,
    pub row: usize,
    pub col_utf8: usize,
}

impl TextPosition {
    pub const fn new(offset: usize, row: usize, col_utf8: usize) -> Self {
        Self {
            offset,
            row,
            col_utf8,
        }
    }
}

/// One atomic change, already decomposed by the editor.
///
/// - Insertion: `a == b` and `text` is the inserted text.
/// - Deletion: `a.offset < b.offset` and `text` is empty.
///
/// Replacements arrive as a deletion followed by an insertion at the same point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChange {
    pub a: TextPosition,
    pub b: TextPosition,
    pub text: String,
}

impl TextChange {
    pub fn insert(at: TextPosition, text: impl Into<String>) -> Self {
        Self {
            a: at,
            b: at,
            text: text.into(),
        }
    }

    pub fn delete(start: TextPosition, end: TextPosition) -> Self {
        Self {
            a: start,
            b: end,
            text: String::new(),
        }
    }

    pub fn is_deletion(&self) -> bool {
        self.a.offset < self.b.offset
    }

    pub fn is_insertion(&self) -> bool {
        !self.text.is_empty()
    }
}

/// Full view of a document at load/revert/reload time.
#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    pub scope: Option<String>,
    pub path: Option<PathBuf>,
    pub text: Rope,
}

impl DocumentSnapshot {
    pub fn new(scope: Option<&str>, text: &str) -> Self {
        Self {
            scope: scope.map(str::to_string),
            path: None,
            text: Rope::from_str(text),
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// A batch of changes plus the document state the editor reports after applying them.
#[derive(Debug, Clone)]
pub struct TextChangedEvent {
    pub scope: Option<String>,
    pub path: Option<PathBuf>,
    pub changes: Vec<TextChange>,
    pub text: Rope,
}

impl TextChangedEvent {
    pub fn new(scope: Option<&str>, changes: Vec<TextChange>, text: &str) -> Self {
        Self {
            scope: scope.map(str::to_string),
            path: None,
            changes,
            text: Rope::from_str(text),
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}
