//! Editor text changes -> parser `InputEdit`s.

use ropey::Rope;
use tree_sitter::{InputEdit, Point, Tree};

use super::coord::point_for_char;
use super::error::EditError;
use crate::models::TextChange;

/// Edit descriptor for a single change against the text it applies to.
///
/// Byte offsets are taken from `rope`; points are the editor-reported positions.
pub fn build_input_edit(rope: &Rope, change: &TextChange) -> Result<InputEdit, EditError> {
    input_edit_at(0, rope, change)
}

fn input_edit_at(index: usize, rope: &Rope, change: &TextChange) -> Result<InputEdit, EditError> {
    let (a, b) = (change.a, change.b);
    if b.offset < a.offset {
        return Err(EditError::InvertedRange {
            index,
            start: a.offset,
            end: b.offset,
        });
    }
    let len = rope.len_chars();
    if b.offset > len {
        return Err(EditError::OutOfBounds {
            index,
            offset: b.offset,
            len,
        });
    }

    let start_byte = rope.char_to_byte(a.offset);
    let start_position = Point {
        row: a.row,
        column: a.col_utf8,
    };

    let mut old_end_byte = start_byte;
    let mut new_end_byte = start_byte;
    let old_end_position = Point {
        row: b.row,
        column: b.col_utf8,
    };
    let mut new_end_position = start_position;

    if change.is_deletion() {
        old_end_byte = rope.char_to_byte(b.offset);
    }
    if change.is_insertion() {
        new_end_byte = start_byte + change.text.len();
        new_end_position = advance_point(start_position, &change.text);
    }

    Ok(InputEdit {
        start_byte,
        old_end_byte,
        new_end_byte,
        start_position,
        old_end_position,
        new_end_position,
    })
}

fn advance_point(start: Point, text: &str) -> Point {
    let bytes = text.as_bytes();
    match memchr::memrchr(b'\n', bytes) {
        None => Point {
            row: start.row,
            column: start.column + bytes.len(),
        },
        Some(last_newline) => Point {
            row: start.row + memchr::memchr_iter(b'\n', bytes).count(),
            column: bytes.len() - last_newline - 1,
        },
    }
}

/// An ordered batch of changes from one text-changed event.
///
/// Change N is translated against the text produced by changes 0..N, so offsets stay
/// correct for multi-cursor edits and decomposed replacements.
pub struct EditBatch<'a> {
    changes: &'a [TextChange],
    expected: Option<&'a Rope>,
}

impl<'a> EditBatch<'a> {
    pub fn new(changes: &'a [TextChange]) -> Self {
        Self {
            changes,
            expected: None,
        }
    }

    /// Check positions and the final reconstruction against the editor's post-edit text.
    pub fn verified(mut self, expected: &'a Rope) -> Self {
        self.expected = Some(expected);
        self
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Edit descriptors in application order, plus the reconstructed post-batch text.
    pub fn descriptors(&self, snapshot: &Rope) -> Result<(Vec<InputEdit>, Rope), EditError> {
        let verify = self.expected.is_some();
        let mut running = snapshot.clone();
        let mut edits = Vec::with_capacity(self.changes.len());

        for (index, change) in self.changes.iter().enumerate() {
            let edit = input_edit_at(index, &running, change)?;
            if verify {
                check_point(index, &running, change.a.offset, edit.start_position)?;
                if change.is_deletion() {
                    check_point(index, &running, change.b.offset, edit.old_end_position)?;
                }
            }

            if change.is_deletion() {
                running.remove(change.a.offset..change.b.offset);
            }
            if change.is_insertion() {
                running.insert(change.a.offset, &change.text);
            }
            edits.push(edit);
        }

        if let Some(expected) = self.expected {
            if running != *expected {
                return Err(EditError::SnapshotMismatch {
                    reconstructed: running.len_bytes(),
                    expected: expected.len_bytes(),
                });
            }
        }

        Ok((edits, running))
    }

    /// Apply every descriptor to `tree` in order.
    ///
    /// All descriptors are computed before the tree is touched, so on error `tree` is left
    /// exactly as it was.
    pub fn apply(&self, tree: &mut Tree, snapshot: &Rope) -> Result<Rope, EditError> {
        let (edits, running) = self.descriptors(snapshot)?;
        for edit in &edits {
            tree.edit(edit);
        }
        Ok(running)
    }
}

fn check_point(index: usize, rope: &Rope, offset: usize, reported: Point) -> Result<(), EditError> {
    let actual = point_for_char(rope, offset);
    if actual != reported {
        return Err(EditError::PositionMismatch {
            index,
            reported: (reported.row, reported.column),
            actual: (actual.row, actual.column),
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/syntax/edit.rs"]
mod tests;
