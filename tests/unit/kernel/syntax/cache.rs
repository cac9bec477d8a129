use super::*;
use std::time::Duration;
use tree_sitter::Parser;

fn entry_at(base: Instant, secs: u64) -> CacheEntry {
    let mut parser = Parser::new();
    parser
        .set_language(LanguageId::Json.grammar())
        .unwrap();
    let text = "[1, 2]";
    let tree = parser.parse(text, None).unwrap();
    CacheEntry::new(tree, Rope::from_str(text), "source.json", LanguageId::Json)
        .at(base + Duration::from_secs(secs))
}

#[test]
fn get_put_remove() {
    let base = Instant::now();
    let mut cache = TreeCache::with_capacity(4);
    assert!(cache.get(DocumentId(1)).is_none());

    assert!(cache.put(DocumentId(1), entry_at(base, 1)).is_empty());
    assert!(cache.contains(DocumentId(1)));
    assert_eq!(cache.get(DocumentId(1)).unwrap().scope, "source.json");

    assert!(cache.remove(DocumentId(1)).is_some());
    assert!(cache.remove(DocumentId(1)).is_none());
    assert!(cache.is_empty());
}

#[test]
fn put_replaces_existing_entry() {
    let base = Instant::now();
    let mut cache = TreeCache::with_capacity(2);
    cache.put(DocumentId(7), entry_at(base, 1));
    cache.put(DocumentId(7), entry_at(base, 5));
    assert_eq!(cache.len(), 1);
    assert_eq!(
        cache.get(DocumentId(7)).unwrap().updated_at,
        base + Duration::from_secs(5)
    );
}

#[test]
fn capacity_two_evicts_oldest_update() {
    let base = Instant::now();
    let mut cache = TreeCache::with_capacity(2);
    cache.put(DocumentId(0xA), entry_at(base, 1));
    cache.put(DocumentId(0xB), entry_at(base, 2));
    let evicted = cache.put(DocumentId(0xC), entry_at(base, 3));

    assert_eq!(evicted, vec![DocumentId(0xA)]);
    assert_eq!(cache.document_ids(), vec![DocumentId(0xB), DocumentId(0xC)]);
}

#[test]
fn eviction_uses_update_time_not_insertion_order() {
    let base = Instant::now();
    let mut cache = TreeCache::with_capacity(2);
    cache.put(DocumentId(1), entry_at(base, 10));
    cache.put(DocumentId(2), entry_at(base, 2));
    // Doc 1 was inserted first but updated most recently.
    let evicted = cache.put(DocumentId(3), entry_at(base, 11));
    assert_eq!(evicted, vec![DocumentId(2)]);
}

#[test]
fn equal_timestamps_break_ties_by_document_id() {
    let base = Instant::now();
    let mut cache = TreeCache::with_capacity(1);
    cache.put(DocumentId(9), entry_at(base, 1));
    let evicted = cache.put(DocumentId(3), entry_at(base, 1));
    assert_eq!(evicted, vec![DocumentId(3)]);
    assert!(cache.contains(DocumentId(9)));
}

#[test]
fn cache_never_exceeds_capacity() {
    let base = Instant::now();
    let mut cache = TreeCache::with_capacity(3);
    for i in 0..20u64 {
        // Non-monotonic update times.
        let secs = (i * 7) % 11;
        let before: Vec<_> = cache
            .document_ids()
            .into_iter()
            .map(|doc| (doc, cache.get(doc).unwrap().updated_at))
            .collect();
        let evicted = cache.put(DocumentId(i), entry_at(base, secs));
        assert!(cache.len() <= 3);

        for doc in evicted {
            let evicted_at = before
                .iter()
                .find(|(d, _)| *d == doc)
                .map(|(_, at)| *at)
                .unwrap_or(base + Duration::from_secs(secs));
            let survivors_min = cache
                .document_ids()
                .into_iter()
                .map(|d| cache.get(d).unwrap().updated_at)
                .min()
                .unwrap();
            assert!(evicted_at <= survivors_min);
        }
    }
}

#[test]
fn zero_capacity_keeps_nothing() {
    let base = Instant::now();
    let mut cache = TreeCache::with_capacity(0);
    assert_eq!(cache.put(DocumentId(1), entry_at(base, 1)), vec![DocumentId(1)]);
    assert!(cache.is_empty());
}

#[test]
fn store_snapshots_are_independent_copies() {
    let base = Instant::now();
    let store = TreeStore::new(4);
    store.put(DocumentId(1), entry_at(base, 1));

    let snapshot = store.snapshot(DocumentId(1)).unwrap();
    store.put(DocumentId(1), entry_at(base, 2));
    store.remove(DocumentId(1));

    assert_eq!(snapshot.updated_at, base + Duration::from_secs(1));
    assert_eq!(snapshot.tree.root_node().kind(), "document");
    assert!(store.snapshot(DocumentId(1)).is_none());
    assert!(store.is_empty());
}

#[test]
fn store_lists_tracked_documents() {
    let base = Instant::now();
    let store = TreeStore::new(4);
    store.put(DocumentId(5), entry_at(base, 1));
    store.put(DocumentId(2), entry_at(base, 2));
    assert_eq!(store.tracked_documents(), vec![DocumentId(2), DocumentId(5)]);
    assert!(store.contains(DocumentId(5)));
    assert_eq!(store.len(), 2);
}
