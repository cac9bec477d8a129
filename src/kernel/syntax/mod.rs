//! Syntax tree synchronization: coordinates, edit descriptors, the tree cache, the sync
//! controller, and traversal helpers for downstream consumers.

mod cache;
mod controller;
mod coord;
mod edit;
mod error;
pub mod nav;

pub use cache::{CacheEntry, TreeCache, TreeStore};
pub use controller::{SyncController, SyncOutcome, TreeUpdate, UpdateKind};
pub use coord::{byte_offset, char_offset, point_for_char, rope_byte_offset};
pub use edit::{build_input_edit, EditBatch};
pub use error::{EditError, SyncError};

use ropey::Rope;
use tree_sitter::{Parser, Tree};

/// Feed `rope` to the parser chunk by chunk. `old_tree` must already carry every edit
/// that turns its text into `rope`.
pub(crate) fn parse_rope(parser: &mut Parser, rope: &Rope, old_tree: Option<&Tree>) -> Option<Tree> {
    let mut cache = RopeChunkCache::new(rope);
    parser.parse_with(
        &mut |byte_offset, _| cache.bytes_from(byte_offset),
        old_tree,
    )
}

struct RopeChunkCache<'a> {
    rope: &'a Rope,
    chunk: &'a str,
    start: usize,
    end: usize,
}

impl<'a> RopeChunkCache<'a> {
    fn new(rope: &'a Rope) -> Self {
        Self {
            rope,
            chunk: "",
            start: 0,
            end: 0,
        }
    }

    fn bytes_from(&mut self, byte_offset: usize) -> &'a [u8] {
        if byte_offset >= self.rope.len_bytes() {
            return &[];
        }

        if byte_offset < self.start || byte_offset >= self.end {
            let (chunk, chunk_start, _, _) = self.rope.chunk_at_byte(byte_offset);
            self.chunk = chunk;
            self.start = chunk_start;
            self.end = chunk_start + chunk.len();
        }

        let rel = byte_offset.saturating_sub(self.start);
        &self.chunk.as_bytes()[rel..]
    }
}
