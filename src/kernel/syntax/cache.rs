use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use ropey::Rope;
use rustc_hash::FxHashMap;
use tree_sitter::Tree;

use crate::kernel::language::LanguageId;
use crate::kernel::services::ports::DEFAULT_MAX_CACHED_TREES;
use crate::models::DocumentId;

/// A parse tree and the exact text it was parsed from.
///
/// Entries are replaced wholesale on every sync, never mutated in place. Cloning is cheap:
/// the tree is reference counted by the parser and the rope shares its chunks.
#[derive(Clone)]
pub struct CacheEntry {
    pub tree: Tree,
    pub text: Rope,
    pub scope: String,
    pub language: LanguageId,
    pub updated_at: Instant,
}

impl CacheEntry {
    pub fn new(tree: Tree, text: Rope, scope: impl Into<String>, language: LanguageId) -> Self {
        Self {
            tree,
            text,
            scope: scope.into(),
            language,
            updated_at: Instant::now(),
        }
    }

    pub fn at(mut self, updated_at: Instant) -> Self {
        self.updated_at = updated_at;
        self
    }
}

impl std::fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheEntry")
            .field("scope", &self.scope)
            .field("language", &self.language)
            .field("bytes", &self.text.len_bytes())
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Bounded document -> tree map with least-recently-updated eviction.
pub struct TreeCache {
    capacity: usize,
    entries: FxHashMap<DocumentId, CacheEntry>,
}

impl TreeCache {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            entries: FxHashMap::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, doc: DocumentId) -> bool {
        self.entries.contains_key(&doc)
    }

    pub fn get(&self, doc: DocumentId) -> Option<&CacheEntry> {
        self.entries.get(&doc)
    }

    /// Insert or replace, then evict down to capacity. Returns the evicted documents, oldest
    /// first.
    pub fn put(&mut self, doc: DocumentId, entry: CacheEntry) -> Vec<DocumentId> {
        self.entries.insert(doc, entry);
        self.evict()
    }

    pub fn remove(&mut self, doc: DocumentId) -> Option<CacheEntry> {
        self.entries.remove(&doc)
    }

    pub fn document_ids(&self) -> Vec<DocumentId> {
        let mut ids: Vec<_> = self.entries.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Linear scan per eviction; capacity is small and evictions are rare next to parses.
    fn evict(&mut self) -> Vec<DocumentId> {
        let mut evicted = Vec::new();
        while self.entries.len() > self.capacity {
            let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(doc, entry)| (entry.updated_at, **doc))
                .map(|(doc, _)| *doc)
            else {
                break;
            };
            self.entries.remove(&oldest);
            evicted.push(oldest);
        }
        evicted
    }
}

impl Default for TreeCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_CACHED_TREES)
    }
}

/// Shared handle to the tree cache.
///
/// The sync controller is the only writer. Readers take [`TreeStore::snapshot`] copies so a
/// concurrent replacement never yields a torn entry.
#[derive(Clone, Default)]
pub struct TreeStore {
    inner: Arc<Mutex<TreeCache>>,
}

impl TreeStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(TreeCache::with_capacity(capacity))),
        }
    }

    pub fn snapshot(&self, doc: DocumentId) -> Option<CacheEntry> {
        self.inner.lock().get(doc).cloned()
    }

    pub fn contains(&self, doc: DocumentId) -> bool {
        self.inner.lock().contains(doc)
    }

    pub fn tracked_documents(&self) -> Vec<DocumentId> {
        self.inner.lock().document_ids()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub(crate) fn put(&self, doc: DocumentId, entry: CacheEntry) -> Vec<DocumentId> {
        self.inner.lock().put(doc, entry)
    }

    pub(crate) fn remove(&self, doc: DocumentId) -> Option<CacheEntry> {
        self.inner.lock().remove(doc)
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/syntax/cache.rs"]
mod tests;
