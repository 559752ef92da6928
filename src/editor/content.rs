use log::trace;

use crate::document::{Document, NodeId, NodeKind, Position, byte_index};

use super::cursor::{
    after_node, before_node, is_block_end_strict, last_content_leaf, previous_content_leaf,
    previous_leaf,
};
use super::inspect::{
    has_visible_content, is_block, is_collapsible_space, is_format_node, is_visible_empty_marker,
};

/// Which edge of a line a text run now touches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Boundary {
    /// The run now starts a line.
    LineStart,
    /// The run now ends a line.
    LineEnd,
    /// The run used to start a line and now continues the previous one.
    Joined,
}

/// Whitespace rules applied to text runs next to a boundary created or
/// removed by a structural edit.
pub trait TextNormalizer {
    fn collapse_and_mark_boundary_spaces(&self, document: &mut Document, text: NodeId, boundary: Boundary);
}

/// Converts a boundary space into a non-breaking space so it keeps
/// rendering, and drops leading spaces that were hidden at a line start once
/// the run joins the previous line.
#[derive(Clone, Copy, Debug, Default)]
pub struct WhitespaceNormalizer;

impl TextNormalizer for WhitespaceNormalizer {
    fn collapse_and_mark_boundary_spaces(&self, document: &mut Document, text: NodeId, boundary: Boundary) {
        let Some(content) = document.text_mut(text) else {
            return;
        };
        match boundary {
            Boundary::LineStart => {
                if content.starts_with(' ') {
                    content.replace_range(0..1, "\u{a0}");
                }
            }
            Boundary::LineEnd => {
                if content.ends_with(' ') {
                    let start = content.len() - 1;
                    content.replace_range(start.., "\u{a0}");
                }
            }
            Boundary::Joined => {
                let trimmed = content.trim_start_matches(is_collapsible_space).len();
                if trimmed != content.len() {
                    let cut = content.len() - trimmed;
                    content.replace_range(..cut, "");
                }
            }
        }
        trace!("normalized {:?} boundary of text {}", boundary, text.index());
    }
}

/// Normalizer that leaves every run untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct VerbatimNormalizer;

impl TextNormalizer for VerbatimNormalizer {
    fn collapse_and_mark_boundary_spaces(&self, _: &mut Document, _: NodeId, _: Boundary) {}
}

pub(crate) fn first_text_of(document: &Document, node: NodeId) -> Option<NodeId> {
    if document.is_text(node) {
        return Some(node);
    }
    let mut current = node;
    loop {
        let child = document.first_child(current)?;
        if document.is_text(child) {
            return Some(child);
        }
        if is_block(document, child) || is_visible_empty_marker(document, child) {
            return None;
        }
        current = child;
    }
}

pub(crate) fn last_text_of(document: &Document, node: NodeId) -> Option<NodeId> {
    if document.is_text(node) {
        return Some(node);
    }
    let mut current = node;
    loop {
        let child = document.last_child(current)?;
        if document.is_text(child) {
            return Some(child);
        }
        if is_block(document, child) || is_visible_empty_marker(document, child) {
            return None;
        }
        current = child;
    }
}

/// Removes the character at `offset` (counted in chars).
pub(crate) fn remove_char_at(document: &mut Document, text: NodeId, offset: usize) -> bool {
    let Some(content) = document.text_mut(text) else {
        return false;
    };
    let start = byte_index(content, offset);
    if start >= content.len() {
        return false;
    }
    let end = byte_index(content, offset + 1);
    content.replace_range(start..end, "");
    true
}

/// Called after a character of `text` was removed at `offset`. A text node
/// left empty goes away together with the format wrappers it was the only
/// child of. Returns the position of the removal.
pub(crate) fn after_text_removal(document: &mut Document, text: NodeId, offset: usize) -> Position {
    if document.len(text) > 0 {
        return Position::new(text, offset);
    }
    let mut gone = text;
    while let Some(parent) = document.parent(gone) {
        if !is_format_node(document, parent) || document.children(parent).len() != 1 {
            break;
        }
        gone = parent;
    }
    let Some(position) = before_node(document, gone) else {
        return Position::new(text, 0);
    };
    document.remove(gone);
    position
}

/// Empty text nodes and format nodes without visible content.
fn is_invisible_inline(document: &Document, node: NodeId) -> bool {
    match document.kind(node) {
        NodeKind::Text(text) => text.is_empty(),
        _ => is_format_node(document, node) && !has_visible_content(document, node),
    }
}

/// Drops empty text and empty format wrappers from the block's own inline
/// content.
pub(crate) fn prune_empty_inline(document: &mut Document, block: NodeId) {
    let children: Vec<NodeId> = document.children(block).to_vec();
    for child in children {
        if is_invisible_inline(document, child) {
            document.remove(child);
        } else if is_format_node(document, child) {
            prune_empty_inline(document, child);
        }
    }
}

/// Guarantees a block without visible content holds exactly one marker.
/// Returns true when the block had to be filled.
pub(crate) fn fill_empty_block(document: &mut Document, block: NodeId) -> bool {
    if has_visible_content(document, block) {
        return false;
    }
    prune_empty_inline(document, block);
    let marker = document.create(NodeKind::LineBreak);
    document.append(block, marker);
    trace!("filled empty block {} with a marker", block.index());
    true
}

/// Ensures the block's leading line (the inline run before its first block
/// child) renders, inserting a marker when it is empty. Returns true when a
/// marker was added.
pub(crate) fn fill_leading_line(document: &mut Document, block: NodeId) -> bool {
    let children: Vec<NodeId> = document.children(block).to_vec();
    let Some(first_block) = children.iter().position(|&child| is_block(document, child)) else {
        return fill_empty_block(document, block);
    };
    let line = &children[..first_block];
    if line.iter().any(|&child| has_visible_content(document, child)) {
        return false;
    }
    for &child in line {
        document.remove(child);
    }
    let marker = document.create(NodeKind::LineBreak);
    document.insert(block, 0, marker);
    true
}

/// Removes a final marker that directly follows other content: such a marker
/// draws nothing.
pub(crate) fn remove_orphan_marker(document: &mut Document, block: NodeId) -> bool {
    let Some(last) = last_content_leaf(document, block) else {
        return false;
    };
    if !is_visible_empty_marker(document, last) {
        return false;
    }
    let Some(before) = before_node(document, last) else {
        return false;
    };
    match previous_content_leaf(document, before, block) {
        Some(previous) if !is_visible_empty_marker(document, previous) => {
            document.remove(last);
            trace!("removed orphan marker in block {}", block.index());
            true
        }
        _ => false,
    }
}

/// When the caret ends a block right after a marker, that marker became the
/// invisible terminator of the previous line; a second one keeps the empty
/// line on screen. Returns the caret, which stays between the two markers.
pub(crate) fn double_trailing_marker(document: &mut Document, caret: Position, block: NodeId) -> Position {
    if !is_block_end_strict(document, caret, block) {
        return caret;
    }
    let Some(previous) = previous_content_leaf(document, caret, block) else {
        return caret;
    };
    if !is_visible_empty_marker(document, previous) {
        return caret;
    }
    let Some(after) = after_node(document, previous) else {
        return caret;
    };
    let marker = document.create(NodeKind::LineBreak);
    document.insert(after.node, after.offset, marker);
    trace!("doubled trailing marker in block {}", block.index());
    after
}

/// If the caret sits after the block's final marker, move it in front of the
/// marker: nothing can be typed on the line a trailing marker terminates.
pub(crate) fn skip_trailing_marker(document: &Document, caret: Position, block: NodeId) -> Position {
    if !is_block_end_strict(document, caret, block) {
        return caret;
    }
    match previous_leaf(document, caret) {
        Some(leaf) if document.contains(block, leaf) && is_visible_empty_marker(document, leaf) => {
            before_node(document, leaf).unwrap_or(caret)
        }
        _ => caret,
    }
}

/// Wraps the run of inline nodes around `position` (which sits directly in
/// the editable root) into a new paragraph. Returns the paragraph and the
/// position translated into it.
pub(crate) fn blockify(document: &mut Document, position: Position) -> (NodeId, Position) {
    let root = document.root();
    let anchor_index = if position.node == root {
        position.offset
    } else {
        document
            .ancestors(position.node)
            .find(|&id| document.parent(id) == Some(root))
            .and_then(|id| document.index_in_parent(id))
            .unwrap_or(0)
    };
    let children: Vec<NodeId> = document.children(root).to_vec();
    let mut start = anchor_index.min(children.len());
    while start > 0 && !is_block(document, children[start - 1]) {
        start -= 1;
    }
    let mut end = anchor_index.min(children.len());
    while end < children.len() && !is_block(document, children[end]) {
        end += 1;
    }
    let paragraph = document.create(NodeKind::Paragraph);
    document.insert(root, start, paragraph);
    for &child in &children[start..end] {
        document.append(paragraph, child);
    }
    fill_empty_block(document, paragraph);
    trace!("wrapped {} root inline nodes into a paragraph", end - start);
    let position = if position.node == root {
        Position::new(paragraph, position.offset.saturating_sub(start).min(end - start))
    } else {
        position
    };
    (paragraph, position)
}
