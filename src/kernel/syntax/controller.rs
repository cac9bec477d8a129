use std::path::Path;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ropey::Rope;
use rustc_hash::FxHashMap;
use tree_sitter::Parser;

use super::cache::{CacheEntry, TreeStore};
use super::edit::EditBatch;
use super::error::SyncError;
use super::parse_rope;
use crate::kernel::language::{LanguageId, LanguageRegistry};
use crate::kernel::services::ports::{DocumentSource, SyncSettings};
use crate::models::{DocumentId, DocumentSnapshot, TextChangedEvent};

/// Slack added to a debounce interval before the deferred check runs, so the check never
/// lands a hair before the interval expires.
const DEBOUNCE_SLACK: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    FullParse,
    Incremental,
}

/// Sent after every cache write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeUpdate {
    pub doc: DocumentId,
    pub scope: String,
    pub kind: UpdateKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Unsupported or ignored document; nothing is tracked.
    Skipped,
    /// Full parse of the current text.
    Parsed,
    /// Edits applied to the cached tree, then an incremental reparse.
    Edited,
    /// Parse postponed; call [`SyncController::debounce_elapsed`] after `delay`.
    Deferred { delay: Duration },
    /// Deferred check fired before the document went quiet.
    Stale,
}

struct PendingParse {
    changed_at: Instant,
    text: Rope,
    scope: String,
}

/// Per-document sync state machine.
///
/// The controller is the only writer of its [`TreeStore`]. Callers must feed it events for
/// a document in the order they happened; the worker's FIFO queue provides that.
pub struct SyncController {
    parser: Parser,
    active_language: Option<LanguageId>,
    registry: Arc<LanguageRegistry>,
    store: TreeStore,
    verify: bool,
    pending: FxHashMap<DocumentId, PendingParse>,
    updates: Option<Sender<TreeUpdate>>,
}

impl SyncController {
    pub fn new(registry: Arc<LanguageRegistry>, store: TreeStore, settings: &SyncSettings) -> Self {
        Self {
            parser: Parser::new(),
            active_language: None,
            registry,
            store,
            verify: settings.debug,
            pending: FxHashMap::default(),
            updates: None,
        }
    }

    pub fn with_updates(mut self, tx: Sender<TreeUpdate>) -> Self {
        self.updates = Some(tx);
        self
    }

    pub fn store(&self) -> &TreeStore {
        &self.store
    }

    pub fn registry(&self) -> &Arc<LanguageRegistry> {
        &self.registry
    }

    pub fn has_pending(&self, doc: DocumentId) -> bool {
        self.pending.contains_key(&doc)
    }

    /// Load, revert, reload or activation. Always a full parse: the text may have changed
    /// outside any edit stream.
    pub fn load(
        &mut self,
        doc: DocumentId,
        snapshot: &DocumentSnapshot,
    ) -> Result<SyncOutcome, SyncError> {
        self.pending.remove(&doc);
        let Some(scope) = self.resolve(doc, snapshot.scope.as_deref(), snapshot.path.as_deref())
        else {
            return Ok(SyncOutcome::Skipped);
        };

        self.full_parse(doc, &scope, snapshot.text.clone())?;
        Ok(SyncOutcome::Parsed)
    }

    /// `now` is when the change happened. It only drives the debounce quiet period.
    pub fn text_changed(
        &mut self,
        doc: DocumentId,
        event: &TextChangedEvent,
        now: Instant,
    ) -> Result<SyncOutcome, SyncError> {
        let Some(scope) = self.resolve(doc, event.scope.as_deref(), event.path.as_deref()) else {
            self.pending.remove(&doc);
            return Ok(SyncOutcome::Skipped);
        };

        let debounce = self.registry.debounce_for_scope(&scope);
        if !debounce.is_zero() {
            self.pending.insert(
                doc,
                PendingParse {
                    changed_at: now,
                    text: event.text.clone(),
                    scope,
                },
            );
            return Ok(SyncOutcome::Deferred {
                delay: debounce + DEBOUNCE_SLACK,
            });
        }
        self.pending.remove(&doc);

        let cached = self.store.snapshot(doc).filter(|entry| entry.scope == scope);
        let Some(cached) = cached else {
            self.full_parse(doc, &scope, event.text.clone())?;
            return Ok(SyncOutcome::Parsed);
        };

        let mut tree = cached.tree;
        let mut batch = EditBatch::new(&event.changes);
        if self.verify {
            batch = batch.verified(&event.text);
        }
        if let Err(source) = batch.apply(&mut tree, &cached.text) {
            self.store.remove(doc);
            tracing::error!(
                doc = %doc,
                scope = %scope,
                changes = batch.len(),
                error = %source,
                "edit batch rejected, dropping syntax tree"
            );
            return Err(SyncError::Edit { doc, source });
        }

        self.use_language(doc, cached.language, &scope)?;
        let Some(tree) = parse_rope(&mut self.parser, &event.text, Some(&tree)) else {
            self.store.remove(doc);
            return Err(SyncError::ParseFailed { doc, scope });
        };
        tracing::trace!(doc = %doc, changes = batch.len(), "incremental reparse");

        let entry = CacheEntry::new(tree, event.text.clone(), scope, cached.language);
        self.commit(doc, entry, UpdateKind::Incremental);
        Ok(SyncOutcome::Edited)
    }

    /// Deferred check scheduled by [`SyncOutcome::Deferred`]. Parses the latest pending text
    /// once the document has been quiet for the full debounce interval.
    pub fn debounce_elapsed(
        &mut self,
        doc: DocumentId,
        now: Instant,
    ) -> Result<SyncOutcome, SyncError> {
        let Some(pending) = self.pending.get(&doc) else {
            return Ok(SyncOutcome::Stale);
        };
        let debounce = self.registry.debounce_for_scope(&pending.scope);
        if now.saturating_duration_since(pending.changed_at) < debounce {
            return Ok(SyncOutcome::Stale);
        }

        let Some(pending) = self.pending.remove(&doc) else {
            return Ok(SyncOutcome::Stale);
        };
        self.full_parse(doc, &pending.scope, pending.text)?;
        Ok(SyncOutcome::Parsed)
    }

    /// Drop the document once its last view closes. Returns whether a tree was dropped.
    pub fn close(&mut self, doc: DocumentId, remaining_views: usize) -> bool {
        if remaining_views > 0 {
            return false;
        }
        self.pending.remove(&doc);
        let removed = self.store.remove(doc).is_some();
        if removed {
            tracing::debug!(doc = %doc, "document closed, syntax tree dropped");
        }
        removed
    }

    /// Current tree for `doc`, parsing on the spot when none is cached or the document's
    /// scope changed since the last sync.
    pub fn tree(
        &mut self,
        doc: DocumentId,
        source: &dyn DocumentSource,
    ) -> Result<Option<CacheEntry>, SyncError> {
        let Some(text) = source.text(doc) else {
            return Ok(None);
        };
        let scope = source.scope(doc);
        let path = source.path(doc);
        let Some(scope) = self.resolve(doc, scope.as_deref(), path.as_deref()) else {
            self.pending.remove(&doc);
            return Ok(None);
        };

        if let Some(entry) = self.store.snapshot(doc) {
            if entry.scope == scope {
                return Ok(Some(entry));
            }
        }
        self.full_parse(doc, &scope, text).map(Some)
    }

    /// Registered scope for the document. An unsupported document loses any tree it had.
    fn resolve(&self, doc: DocumentId, scope: Option<&str>, path: Option<&Path>) -> Option<String> {
        let resolved = self.registry.resolve_scope(scope, path);
        if resolved.is_none() && self.store.remove(doc).is_some() {
            tracing::debug!(doc = %doc, scope = ?scope, "scope unsupported, syntax tree dropped");
        }
        resolved
    }

    fn full_parse(
        &mut self,
        doc: DocumentId,
        scope: &str,
        text: Rope,
    ) -> Result<CacheEntry, SyncError> {
        let Some(language) = self.registry.language_for_scope(scope) else {
            return Err(SyncError::ParseFailed {
                doc,
                scope: scope.to_string(),
            });
        };
        self.use_language(doc, language, scope)?;

        let started = Instant::now();
        let Some(tree) = parse_rope(&mut self.parser, &text, None) else {
            self.store.remove(doc);
            return Err(SyncError::ParseFailed {
                doc,
                scope: scope.to_string(),
            });
        };
        tracing::debug!(
            doc = %doc,
            scope = %scope,
            bytes = text.len_bytes(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "full parse"
        );

        let entry = CacheEntry::new(tree, text, scope, language);
        Ok(self.commit(doc, entry, UpdateKind::FullParse))
    }

    fn use_language(
        &mut self,
        doc: DocumentId,
        language: LanguageId,
        scope: &str,
    ) -> Result<(), SyncError> {
        if self.active_language == Some(language) {
            return Ok(());
        }
        let grammar = self.registry.grammar(language);
        match grammar.map(|grammar| self.parser.set_language(grammar)) {
            Some(Ok(())) => {
                self.active_language = Some(language);
                Ok(())
            }
            Some(Err(e)) => {
                tracing::error!(language = language.name(), error = %e, "grammar rejected by parser");
                self.active_language = None;
                Err(SyncError::ParseFailed {
                    doc,
                    scope: scope.to_string(),
                })
            }
            None => Err(SyncError::ParseFailed {
                doc,
                scope: scope.to_string(),
            }),
        }
    }

    /// `updated_at` is the commit time, never the time of the event that caused it.
    fn commit(&mut self, doc: DocumentId, entry: CacheEntry, kind: UpdateKind) -> CacheEntry {
        let entry = entry.at(Instant::now());
        let scope = entry.scope.clone();
        for evicted in self.store.put(doc, entry.clone()) {
            tracing::debug!(doc = %evicted, "evicted least recently updated syntax tree");
        }
        if let Some(tx) = &self.updates {
            let _ = tx.send(TreeUpdate { doc, scope, kind });
        }
        entry
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/syntax/controller.rs"]
mod tests;
