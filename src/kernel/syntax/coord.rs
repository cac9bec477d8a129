//! Code point <-> UTF-8 byte translation.
//!
//! Editors address text by code point, the parser by byte. The two only agree on ASCII, and
//! an edit expressed in the wrong unit silently shifts every node after it.
//!
//! Rows count `\n` only (ropey is built without `unicode_lines`), which is how the parser
//! counts them.

use ropey::Rope;
use tree_sitter::Point;

/// UTF-8 length of `text[..offset]`, with `offset` in code points.
///
/// `offset` past the end of `text` is a caller bug; debug builds assert, release builds
/// clamp to `text.len()`.
pub fn byte_offset(text: &str, offset: usize) -> usize {
    match text.char_indices().nth(offset) {
        Some((byte, _)) => byte,
        None => {
            debug_assert!(
                offset <= text.chars().count(),
                "code point offset {offset} past end of text"
            );
            text.len()
        }
    }
}

/// [`byte_offset`] against a rope snapshot, clamped to the rope.
pub fn rope_byte_offset(rope: &Rope, offset: usize) -> usize {
    rope.char_to_byte(offset.min(rope.len_chars()))
}

/// Code point offset of `byte`, clamped to the rope.
pub fn char_offset(rope: &Rope, byte: usize) -> usize {
    rope.byte_to_char(byte.min(rope.len_bytes()))
}

/// Parser point (row, UTF-8 column) for a code point offset.
pub fn point_for_char(rope: &Rope, offset: usize) -> Point {
    let offset = offset.min(rope.len_chars());
    let row = rope.char_to_line(offset);
    let column = rope.char_to_byte(offset) - rope.line_to_byte(row);
    Point { row, column }
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/syntax/coord.rs"]
mod tests;
