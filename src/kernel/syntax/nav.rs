//! Read-side traversal over cached trees.
//!
//! Byte-level helpers work on any [`Node`]. Region helpers take a [`CacheEntry`] so editor
//! code-point selections are translated against the exact text the tree was parsed from.

use std::fmt::Write as _;

use ropey::{Rope, RopeSlice};
use tree_sitter::{Node, Tree, TreeCursor};

use super::cache::CacheEntry;
use super::coord::{char_offset, rope_byte_offset};
use crate::models::Region;

/// Anything a traversal can start from: a whole tree, a cache entry, or a single node.
pub trait SyntaxRoot<'tree> {
    fn syntax_root(&self) -> Node<'tree>;
}

impl<'tree> SyntaxRoot<'tree> for &'tree Tree {
    fn syntax_root(&self) -> Node<'tree> {
        self.root_node()
    }
}

impl<'tree> SyntaxRoot<'tree> for &'tree CacheEntry {
    fn syntax_root(&self) -> Node<'tree> {
        self.tree.root_node()
    }
}

impl<'tree> SyntaxRoot<'tree> for Node<'tree> {
    fn syntax_root(&self) -> Node<'tree> {
        *self
    }
}

/// Depth-first pre-order walk. Yields `(node, depth)` with depth relative to the start
/// node; children deeper than `max_depth` are not visited.
pub fn walk<'tree>(root: impl SyntaxRoot<'tree>, max_depth: Option<usize>) -> TreeWalk<'tree> {
    TreeWalk {
        cursor: root.syntax_root().walk(),
        depth: 0,
        max_depth,
        done: false,
    }
}

pub struct TreeWalk<'tree> {
    cursor: TreeCursor<'tree>,
    depth: usize,
    max_depth: Option<usize>,
    done: bool,
}

impl<'tree> Iterator for TreeWalk<'tree> {
    type Item = (Node<'tree>, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = (self.cursor.node(), self.depth);

        let may_descend = self.max_depth.map_or(true, |max| self.depth < max);
        if may_descend && self.cursor.goto_first_child() {
            self.depth += 1;
            return Some(item);
        }
        loop {
            if self.depth == 0 {
                self.done = true;
                break;
            }
            if self.cursor.goto_next_sibling() {
                break;
            }
            if !self.cursor.goto_parent() {
                self.done = true;
                break;
            }
            self.depth -= 1;
        }
        Some(item)
    }
}

impl std::iter::FusedIterator for TreeWalk<'_> {}

/// Smallest node under `node` spanning `start..end`.
pub fn descendant_for_byte_range<'tree>(
    node: Node<'tree>,
    start: usize,
    end: usize,
) -> Option<Node<'tree>> {
    node.descendant_for_byte_range(start, end)
}

/// `node` followed by its ancestors up to the root, at most `max_len` nodes (never fewer
/// than one).
pub fn ancestors(node: Node<'_>, max_len: Option<usize>) -> Vec<Node<'_>> {
    let mut nodes = vec![node];
    let mut current = node.parent();
    while let Some(parent) = current {
        if max_len.is_some_and(|max| nodes.len() >= max) {
            break;
        }
        nodes.push(parent);
        current = parent.parent();
    }
    nodes
}

/// Distance from the tree root; the root is at depth 0.
pub fn depth(node: Node<'_>) -> usize {
    let mut depth = 0;
    let mut current = node.parent();
    while let Some(parent) = current {
        depth += 1;
        current = parent.parent();
    }
    depth
}

pub fn contains(a: Node<'_>, b: Node<'_>) -> bool {
    a.start_byte() <= b.start_byte() && a.end_byte() >= b.end_byte()
}

pub fn byte_size(node: Node<'_>) -> usize {
    node.end_byte() - node.start_byte()
}

/// Nearest ancestor strictly larger than `node`.
pub fn larger_ancestor(node: Node<'_>) -> Option<Node<'_>> {
    let size = byte_size(node);
    let mut current = node.parent();
    while let Some(parent) = current {
        if byte_size(parent) > size {
            return Some(parent);
        }
        current = parent.parent();
    }
    None
}

/// Field under which `node` hangs off its parent, e.g. `parameters` or `body`.
pub fn field_name(node: Node<'_>) -> Option<&'static str> {
    let parent = node.parent()?;
    let mut cursor = parent.walk();
    if !cursor.goto_first_child() {
        return None;
    }
    loop {
        if cursor.node().id() == node.id() {
            return cursor.field_name();
        }
        if !cursor.goto_next_sibling() {
            return None;
        }
    }
}

fn node_slice<'r>(node: Node<'_>, rope: &'r Rope) -> Option<RopeSlice<'r>> {
    rope.get_byte_slice(node.start_byte()..node.end_byte())
}

/// Source text of `node`. Empty when the node lies outside `rope`.
pub fn node_text(node: Node<'_>, rope: &Rope) -> String {
    node_slice(node, rope)
        .map(|slice| slice.to_string())
        .unwrap_or_default()
}

/// Smallest node spanning `region`.
///
/// A caret between two nodes touches both; the deeper of the two wins.
pub fn node_spanning_region(entry: &CacheEntry, region: Region) -> Option<Node<'_>> {
    let root = entry.tree.root_node();
    let text = &entry.text;
    let (begin, end) = (region.begin(), region.end());

    let node = root.descendant_for_byte_range(
        rope_byte_offset(text, begin),
        rope_byte_offset(text, end),
    );
    if !region.is_empty() || begin == 0 {
        return node;
    }

    let before = root.descendant_for_byte_range(
        rope_byte_offset(text, begin - 1),
        rope_byte_offset(text, end - 1),
    );
    match (node, before) {
        (Some(node), Some(before)) => Some(if depth(node) >= depth(before) {
            node
        } else {
            before
        }),
        (node, before) => node.or(before),
    }
}

/// Region exactly covering `node`, in code points of `rope`.
pub fn node_region(node: Node<'_>, rope: &Rope, reverse: bool) -> Region {
    let a = char_offset(rope, node.start_byte());
    let b = char_offset(rope, node.end_byte());
    if reverse {
        Region::new(b, a)
    } else {
        Region::new(a, b)
    }
}

/// Next step of selection expansion: the spanning node if it is larger than `region`,
/// else the first strictly larger ancestor.
pub fn ancestor_for_region(entry: &CacheEntry, region: Region) -> Option<Node<'_>> {
    let node = node_spanning_region(entry, region)?;
    let parent = node.parent()?;
    if node_region(node, &entry.text, false).len() > region.len() {
        return Some(node);
    }
    larger_ancestor(node).or(Some(parent))
}

/// First descendant of the spanning node (or the root) that is smaller than it. Such a
/// node nearly always has siblings.
pub fn descendant_for_region(entry: &CacheEntry, region: Region) -> Option<Node<'_>> {
    let node = node_spanning_region(entry, region).unwrap_or_else(|| entry.tree.root_node());
    let size = byte_size(node);
    walk(node, None)
        .map(|(desc, _)| desc)
        .find(|desc| byte_size(*desc) < size)
}

fn children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

/// Sibling after (or before) the node spanning `region`, wrapping around.
///
/// Single-child chains are climbed first, so the step is taken at the first level that
/// has more than one node. At the root the nearest descendant with siblings stands in.
pub fn sibling_for_region(entry: &CacheEntry, region: Region, forward: bool) -> Option<Node<'_>> {
    let mut node = node_spanning_region(entry, region)?;

    if node.parent().is_none() {
        let first = descendant_for_region(entry, region)?;
        let Some(parent) = first.parent() else {
            return Some(first);
        };
        let begin = rope_byte_offset(&entry.text, region.begin());
        let siblings = children(parent);
        let adjacent = if forward {
            siblings.into_iter().find(|s| begin <= s.start_byte())
        } else {
            siblings.into_iter().rev().find(|s| begin >= s.start_byte())
        };
        return adjacent.or(Some(first));
    }

    while let Some(parent) = node.parent() {
        if parent.parent().is_none() || parent.child_count() != 1 {
            break;
        }
        node = parent;
    }

    let siblings = children(node.parent()?);
    let index = siblings.iter().position(|s| s.id() == node.id())?;
    let len = siblings.len();
    let next = if forward {
        (index + 1) % len
    } else {
        (index + len - 1) % len
    };
    siblings.get(next).copied()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CousinOptions {
    /// Same kind, and ancestors of the same kinds.
    pub same_types: bool,
    pub same_text: bool,
    pub same_depth: bool,
    /// Only compare this many levels of the kind chain.
    pub same_types_depth: Option<usize>,
}

impl Default for CousinOptions {
    fn default() -> Self {
        Self {
            same_types: true,
            same_text: false,
            same_depth: true,
            same_types_depth: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Which {
    Next,
    Previous,
    #[default]
    All,
}

/// Nodes structurally alike to the one spanning `region`, in document order.
///
/// `Next`/`Previous` return the single nearest cousin, wrapping around the document.
pub fn cousins_for_region(
    entry: &CacheEntry,
    region: Region,
    options: CousinOptions,
    which: Which,
) -> Vec<Node<'_>> {
    let Some(node) = node_spanning_region(entry, region) else {
        return Vec::new();
    };
    if node.parent().is_none() {
        return Vec::new();
    }

    let chain = ancestors(node, None);
    let node_depth = chain.len() - 1;
    let kinds = |nodes: &[Node<'_>]| -> Vec<&'static str> {
        let limit = options.same_types_depth.unwrap_or(usize::MAX);
        nodes.iter().take(limit).map(|n| n.kind()).collect()
    };
    let node_kinds = kinds(&chain);
    let wanted_text = options
        .same_text
        .then(|| node_slice(node, &entry.text))
        .flatten();

    let root = chain[node_depth];
    let max_depth = options.same_depth.then_some(node_depth);
    let cousins: Vec<Node<'_>> = walk(root, max_depth)
        .filter(|(cousin, depth)| {
            if options.same_depth && *depth != node_depth {
                return false;
            }
            if options.same_text && node_slice(*cousin, &entry.text) != wanted_text {
                return false;
            }
            if options.same_types {
                let cousin_chain = ancestors(*cousin, options.same_types_depth);
                if kinds(&cousin_chain) != node_kinds {
                    return false;
                }
            }
            true
        })
        .map(|(cousin, _)| cousin)
        .collect();

    let start = node.start_byte();
    let picked = match which {
        Which::All => return cousins,
        Which::Next => cousins
            .iter()
            .find(|c| c.start_byte() > start)
            .or_else(|| cousins.first()),
        Which::Previous => cousins
            .iter()
            .rev()
            .find(|c| c.start_byte() < start)
            .or_else(|| cousins.last()),
    };
    picked.copied().into_iter().collect()
}

/// Nodes spanning each selection. Carets are skipped unless `include_empty`.
pub fn selected_nodes<'e>(
    entry: &'e CacheEntry,
    regions: &[Region],
    include_empty: bool,
) -> Vec<Node<'e>> {
    regions
        .iter()
        .filter(|region| include_empty || !region.is_empty())
        .filter_map(|region| node_spanning_region(entry, *region))
        .collect()
}

/// Indented outline of the subtree at `node`, one node per line:
/// `kind [field]  (row, col) → (row, col)`.
///
/// Starts from the shallowest ancestor that spans the same bytes as `node`.
pub fn format_tree(node: Node<'_>) -> String {
    let mut root = node;
    while let Some(parent) = root.parent() {
        if byte_size(parent) != byte_size(root) {
            break;
        }
        root = parent;
    }

    let mut out = String::new();
    for (node, depth) in walk(root, None) {
        let (start, end) = (node.start_position(), node.end_position());
        let field = if depth == 0 { None } else { field_name(node) };
        let _ = write!(out, "{:indent$}{}", "", node.kind(), indent = depth * 2);
        if let Some(field) = field {
            let _ = write!(out, " [{field}]");
        }
        let _ = writeln!(
            out,
            "  ({}, {}) → ({}, {})",
            start.row, start.column, end.row, end.column
        );
    }
    out
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/syntax/nav.rs"]
mod tests;
