use super::*;
use ropey::Rope;

#[test]
fn ascii_offsets_are_identity() {
    let text = "def f():\n    pass";
    for p in 0..=text.len() {
        assert_eq!(byte_offset(text, p), p);
    }
}

#[test]
fn byte_offset_matches_encoded_prefix_length() {
    let text = "añ😀b\nשָׁ c";
    let total = text.chars().count();
    let rope = Rope::from_str(text);
    for p in 0..=total {
        let prefix: String = text.chars().take(p).collect();
        assert_eq!(byte_offset(text, p), prefix.len(), "offset {p}");
        assert_eq!(rope_byte_offset(&rope, p), prefix.len(), "rope offset {p}");
    }
}

#[test]
fn rope_translation_clamps_past_the_end() {
    let rope = Rope::from_str("añ");
    assert_eq!(rope_byte_offset(&rope, 10), 3);
    assert_eq!(char_offset(&rope, 10), 2);
}

#[test]
fn char_offset_inverts_byte_offset() {
    let text = "x😀y\nz";
    let rope = Rope::from_str(text);
    for p in 0..=text.chars().count() {
        assert_eq!(char_offset(&rope, rope_byte_offset(&rope, p)), p);
    }
}

#[test]
fn point_for_char_counts_utf8_columns() {
    let rope = Rope::from_str("é = 1\nñé\n");
    assert_eq!(point_for_char(&rope, 0), Point { row: 0, column: 0 });
    assert_eq!(point_for_char(&rope, 1), Point { row: 0, column: 2 });
    assert_eq!(point_for_char(&rope, 6), Point { row: 1, column: 0 });
    assert_eq!(point_for_char(&rope, 8), Point { row: 1, column: 4 });
}

#[test]
fn point_for_char_ignores_carriage_returns() {
    let rope = Rope::from_str("a\rb\r\nc");
    assert_eq!(point_for_char(&rope, 2), Point { row: 0, column: 2 });
    assert_eq!(point_for_char(&rope, 5), Point { row: 1, column: 0 });
}
