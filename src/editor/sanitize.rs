use log::trace;

use crate::document::{Document, NodeId, NodeKind, Position};

use super::Selection;
use super::cursor::{closest_block, outermost_list};
use super::inspect::wrapper_list;

/// Post-edit cleanup the host runs after an operation completes.
pub trait Sanitizer {
    /// Merges `node`'s enclosing block subtree's adjacent similar siblings,
    /// keeping `selection` pointing at the same content.
    fn merge_similar_adjacent_elements(&self, document: &mut Document, node: NodeId, selection: &mut Selection);
}

/// Merges adjacent text nodes, adjacent format elements with identical
/// attributes, adjacent lists of the same type and adjacent wrapper items
/// whose nested lists share a type. Empty text nodes are dropped.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimilarElementSanitizer;

impl Sanitizer for SimilarElementSanitizer {
    fn merge_similar_adjacent_elements(&self, document: &mut Document, node: NodeId, selection: &mut Selection) {
        let Ok(block) = closest_block(document, node) else {
            return;
        };
        let start = outermost_list(document, block)
            .and_then(|list| document.parent(list))
            .unwrap_or(block);
        sanitize_children(document, start, selection);
    }
}

fn similar(document: &Document, left: NodeId, right: NodeId) -> bool {
    let (left_kind, right_kind) = (document.kind(left), document.kind(right));
    if left_kind.is_text() && right_kind.is_text() {
        return true;
    }
    if left_kind != right_kind || document.attrs(left) != document.attrs(right) {
        return false;
    }
    match left_kind {
        NodeKind::Format(_) | NodeKind::List(_) => true,
        NodeKind::ListItem => match (wrapper_list(document, left), wrapper_list(document, right)) {
            (Some(left_list), Some(right_list)) => {
                document.kind(left_list) == document.kind(right_list)
            }
            _ => false,
        },
        _ => false,
    }
}

fn remap(selection: &mut Selection, map: impl Fn(Position) -> Position) {
    selection.anchor = map(selection.anchor);
    selection.focus = map(selection.focus);
}

/// Appends `right` to `left` and removes it.
fn merge_pair(document: &mut Document, left: NodeId, right: NodeId, selection: &mut Selection) {
    let Some(parent) = document.parent(right) else {
        return;
    };
    let Some(right_index) = document.index_in_parent(right) else {
        return;
    };
    let left_len = document.len(left);
    if document.is_text(left) {
        let tail = document.text(right).unwrap_or_default().to_string();
        if let Some(text) = document.text_mut(left) {
            text.push_str(&tail);
        }
    } else {
        document.move_children(right, 0, left);
    }
    document.remove(right);
    remap(selection, |position| {
        if position.node == right {
            Position::new(left, left_len + position.offset)
        } else if position.node == parent && position.offset == right_index {
            Position::new(left, left_len)
        } else if position.node == parent && position.offset > right_index {
            Position::new(parent, position.offset - 1)
        } else {
            position
        }
    });
    trace!("merged node {} into similar sibling {}", right.index(), left.index());
}

fn drop_empty_text(document: &mut Document, text: NodeId, selection: &mut Selection) {
    let (Some(parent), Some(index)) = (document.parent(text), document.index_in_parent(text)) else {
        return;
    };
    document.remove(text);
    remap(selection, |position| {
        if position.node == text {
            Position::new(parent, index)
        } else if position.node == parent && position.offset > index {
            Position::new(parent, position.offset - 1)
        } else {
            position
        }
    });
}

fn sanitize_children(document: &mut Document, node: NodeId, selection: &mut Selection) {
    let mut index = 0;
    while let Some(child) = document.child(node, index) {
        if document.text(child).is_some_and(str::is_empty) {
            drop_empty_text(document, child, selection);
            continue;
        }
        while let Some(next) = document.next_sibling(child) {
            if document.text(next).is_some_and(str::is_empty) {
                drop_empty_text(document, next, selection);
                continue;
            }
            if !similar(document, child, next) {
                break;
            }
            merge_pair(document, child, next, selection);
        }
        if !document.is_text(child) {
            sanitize_children(document, child, selection);
        }
        index += 1;
    }
}
