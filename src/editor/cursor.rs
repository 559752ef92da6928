use crate::document::{Document, NodeId, NodeKind, Position};
use crate::error::{Error, Result};

use super::inspect::{
    is_block, is_editable_root, is_list, is_list_item, is_unbreakable,
    is_visible_empty_marker, is_void_inline,
};

/// Nearest ancestor-or-self that is a block. Inline content sitting directly
/// in the editable root resolves to the root.
pub fn closest_block(document: &Document, node: NodeId) -> Result<NodeId> {
    document
        .ancestors(node)
        .find(|&id| is_block(document, id) || is_editable_root(document, id))
        .filter(|&id| document.is_attached(id))
        .ok_or_else(|| Error::not_found(node, "block"))
}

pub fn closest_list_item(document: &Document, node: NodeId) -> Result<NodeId> {
    document
        .ancestors(node)
        .find(|&id| is_list_item(document, id))
        .ok_or_else(|| Error::not_found(node, "list item"))
}

pub fn closest_list(document: &Document, node: NodeId) -> Result<NodeId> {
    document
        .ancestors(node)
        .find(|&id| is_list(document, id, None))
        .ok_or_else(|| Error::not_found(node, "list"))
}

/// Nearest unbreakable ancestor-or-self, the editable root when none is
/// flagged.
pub fn closest_unbreakable(document: &Document, node: NodeId) -> NodeId {
    document
        .ancestors(node)
        .find(|&id| is_unbreakable(document, id))
        .unwrap_or(document.root())
}

/// The child of `ancestor` on the path down to `node`.
pub(crate) fn child_towards(document: &Document, ancestor: NodeId, node: NodeId) -> Option<NodeId> {
    document
        .ancestors(node)
        .find(|&id| document.parent(id) == Some(ancestor))
}

/// Topmost list containing `node`.
pub(crate) fn outermost_list(document: &Document, node: NodeId) -> Option<NodeId> {
    document
        .ancestors(node)
        .filter(|&id| is_list(document, id, None))
        .last()
}

/// Canonical form of a position: descends into the child at the offset (or
/// the last child when the offset is at the end) until reaching a text node.
/// Line breaks and other childless elements stop the descent so the position
/// keeps pointing at the gap next to them.
pub fn deepest_position(document: &Document, position: Position) -> Position {
    let mut current = position;
    loop {
        if document.is_text(current.node) {
            return current;
        }
        let children = document.children(current.node);
        if children.is_empty() {
            return current;
        }
        let (child, at_end) = if current.offset < children.len() {
            (children[current.offset], false)
        } else {
            (children[children.len() - 1], true)
        };
        if document.is_text(child) {
            let offset = if at_end { document.len(child) } else { 0 };
            return Position::new(child, offset);
        }
        if document.children(child).is_empty() {
            return current;
        }
        let offset = if at_end { document.len(child) } else { 0 };
        current = Position::new(child, offset);
    }
}

pub fn start_of(document: &Document, node: NodeId) -> Position {
    deepest_position(document, Position::new(node, 0))
}

pub fn end_of(document: &Document, node: NodeId) -> Position {
    deepest_position(document, Position::new(node, document.len(node)))
}

/// The element gap a position denotes: `(parent, child index)`. Text
/// positions map to the gap before the text node when at its start and after
/// it when at its end; a position inside text has no gap and yields `None`.
pub(crate) fn element_gap(document: &Document, position: Position) -> Option<(NodeId, usize)> {
    if !document.is_text(position.node) {
        return Some((position.node, position.offset));
    }
    let parent = document.parent(position.node)?;
    let index = document.index_in_parent(position.node)?;
    if position.offset == 0 {
        Some((parent, index))
    } else if position.offset >= document.len(position.node) {
        Some((parent, index + 1))
    } else {
        None
    }
}

/// Turns the position into an element gap, splitting a text node when the
/// position falls inside it.
pub(crate) fn split_to_gap(document: &mut Document, position: Position) -> Option<(NodeId, usize)> {
    if let Some(gap) = element_gap(document, position) {
        return Some(gap);
    }
    let tail = document.split_text(position.node, position.offset)?;
    let parent = document.parent(tail)?;
    Some((parent, document.index_in_parent(tail)?))
}

fn last_leaf(document: &Document, node: NodeId) -> NodeId {
    let mut current = node;
    while let Some(child) = document.last_child(current) {
        current = child;
    }
    current
}

fn first_leaf(document: &Document, node: NodeId) -> NodeId {
    let mut current = node;
    while let Some(child) = document.first_child(current) {
        current = child;
    }
    current
}

/// The leaf holding content immediately before `position` in document order.
/// A text position with characters before it yields its own node.
pub fn previous_leaf(document: &Document, position: Position) -> Option<NodeId> {
    if document.is_text(position.node) && position.offset > 0 {
        return Some(position.node);
    }
    let (mut node, mut index) = match element_gap(document, position) {
        Some(gap) => gap,
        None => return Some(position.node),
    };
    loop {
        if index > 0 {
            let sibling = document.child(node, index - 1)?;
            return Some(last_leaf(document, sibling));
        }
        if is_editable_root(document, node) {
            return None;
        }
        index = document.index_in_parent(node)?;
        node = document.parent(node)?;
    }
}

/// The leaf holding content immediately after `position` in document order.
pub fn next_leaf(document: &Document, position: Position) -> Option<NodeId> {
    if document.is_text(position.node) && position.offset < document.len(position.node) {
        return Some(position.node);
    }
    let (mut node, mut index) = match element_gap(document, position) {
        Some(gap) => gap,
        None => return Some(position.node),
    };
    loop {
        if let Some(sibling) = document.child(node, index) {
            return Some(first_leaf(document, sibling));
        }
        if is_editable_root(document, node) {
            return None;
        }
        index = document.index_in_parent(node)? + 1;
        node = document.parent(node)?;
    }
}

pub(crate) fn before_node(document: &Document, node: NodeId) -> Option<Position> {
    Some(Position::new(document.parent(node)?, document.index_in_parent(node)?))
}

pub(crate) fn after_node(document: &Document, node: NodeId) -> Option<Position> {
    Some(Position::new(document.parent(node)?, document.index_in_parent(node)? + 1))
}

/// Leaves that render something: non-empty text, markers and void inlines.
pub(crate) fn is_content_leaf(document: &Document, leaf: NodeId) -> bool {
    match document.kind(leaf) {
        NodeKind::Text(text) => !text.is_empty(),
        _ => is_visible_empty_marker(document, leaf) || is_void_inline(document, leaf),
    }
}

/// True when nothing rendered precedes `position` inside `block`.
pub(crate) fn is_block_start(document: &Document, position: Position, block: NodeId) -> bool {
    if document.is_text(position.node) && position.offset > 0 {
        return false;
    }
    let mut probe = position;
    while let Some(leaf) = previous_leaf(document, probe) {
        if !document.contains(block, leaf) {
            return true;
        }
        if is_content_leaf(document, leaf) {
            return false;
        }
        match before_node(document, leaf) {
            Some(position) => probe = position,
            None => return true,
        }
    }
    true
}

/// True when nothing rendered follows `position` inside `block`. A final line
/// break does not count: it either is the empty-block placeholder or the
/// invisible terminator of the last line.
pub(crate) fn is_block_end(document: &Document, position: Position, block: NodeId) -> bool {
    if document.is_text(position.node) && position.offset < document.len(position.node) {
        return false;
    }
    let mut probe = position;
    while let Some(leaf) = next_leaf(document, probe) {
        if !document.contains(block, leaf) {
            return true;
        }
        if is_content_leaf(document, leaf) {
            if is_visible_empty_marker(document, leaf) {
                let after = after_node(document, leaf).unwrap_or(probe);
                return is_block_end_strict(document, after, block);
            }
            return false;
        }
        match after_node(document, leaf) {
            Some(position) => probe = position,
            None => return true,
        }
    }
    true
}

/// Like `is_block_end`, but any rendered leaf counts.
pub(crate) fn is_block_end_strict(document: &Document, position: Position, block: NodeId) -> bool {
    if document.is_text(position.node) && position.offset < document.len(position.node) {
        return false;
    }
    let mut probe = position;
    while let Some(leaf) = next_leaf(document, probe) {
        if !document.contains(block, leaf) {
            return true;
        }
        if is_content_leaf(document, leaf) {
            return false;
        }
        match after_node(document, leaf) {
            Some(position) => probe = position,
            None => return true,
        }
    }
    true
}

/// Nearest rendered leaf before `position` that is still inside `block`.
pub(crate) fn previous_content_leaf(
    document: &Document,
    position: Position,
    block: NodeId,
) -> Option<NodeId> {
    let mut probe = position;
    loop {
        let leaf = previous_leaf(document, probe)?;
        if !document.contains(block, leaf) {
            return None;
        }
        if is_content_leaf(document, leaf) {
            return Some(leaf);
        }
        probe = before_node(document, leaf)?;
    }
}

/// Last rendered leaf of the block's own content.
pub(crate) fn last_content_leaf(document: &Document, block: NodeId) -> Option<NodeId> {
    previous_content_leaf(document, Position::new(block, document.len(block)), block)
}

/// A position expressed relative to a node that moves along with the
/// content, so it stays valid while list operations reparent blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Anchor {
    Text(NodeId, usize),
    Before(NodeId),
    End(NodeId),
}

pub(crate) fn anchor(document: &Document, position: Position) -> Anchor {
    let position = deepest_position(document, position);
    if document.is_text(position.node) {
        return Anchor::Text(position.node, position.offset);
    }
    match document.child(position.node, position.offset) {
        Some(child) => Anchor::Before(child),
        None => Anchor::End(position.node),
    }
}

pub(crate) fn resolve(document: &Document, anchor: Anchor) -> Option<Position> {
    let position = match anchor {
        Anchor::Text(node, offset) if document.is_attached(node) => {
            Position::new(node, offset.min(document.len(node)))
        }
        Anchor::Before(node) if document.is_attached(node) => before_node(document, node)?,
        Anchor::End(node) if document.is_attached(node) => {
            Position::new(node, document.len(node))
        }
        _ => return None,
    };
    Some(deepest_position(document, position))
}
