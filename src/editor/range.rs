use log::debug;

use crate::document::{Document, NodeId, Position, byte_index};
use crate::error::Result;

use super::content::{
    Boundary, TextNormalizer, double_trailing_marker, fill_empty_block, last_text_of,
};
use super::cursor::{closest_block, closest_unbreakable, deepest_position, is_block_end, outermost_list};
use super::merge::{Survivor, merge_blocks};
use super::structure::refresh_checklist_states;

fn remove_after(document: &mut Document, parent: NodeId, left: Option<NodeId>) {
    let from = match left {
        Some(node) => document.index_in_parent(node).map_or(0, |index| index + 1),
        None => 0,
    };
    let doomed: Vec<NodeId> = document.children(parent).iter().skip(from).copied().collect();
    for node in doomed {
        document.remove(node);
    }
}

fn remove_before(document: &mut Document, parent: NodeId, right: Option<NodeId>) {
    let to = match right {
        Some(node) => document.index_in_parent(node).unwrap_or(0),
        None => document.len(parent),
    };
    let doomed: Vec<NodeId> = document.children(parent).iter().take(to).copied().collect();
    for node in doomed {
        document.remove(node);
    }
}

fn remove_between(document: &mut Document, parent: NodeId, left: Option<NodeId>, right: Option<NodeId>) {
    let from = match left {
        Some(node) => document.index_in_parent(node).map_or(0, |index| index + 1),
        None => 0,
    };
    let to = match right {
        Some(node) => document.index_in_parent(node).unwrap_or(from),
        None => document.len(parent),
    };
    let doomed: Vec<NodeId> = document
        .children(parent)
        .iter()
        .skip(from)
        .take(to.saturating_sub(from))
        .copied()
        .collect();
    for node in doomed {
        document.remove(node);
    }
}

/// Removes everything strictly between `start` and `end` and merges the two
/// edge blocks once. Returns the caret at the junction, or `None` when the
/// edges sit in different unbreakable regions (nothing is touched then).
pub(crate) fn delete_range(
    document: &mut Document,
    normalizer: &dyn TextNormalizer,
    start: Position,
    end: Position,
) -> Result<Option<Position>> {
    let start = deepest_position(document, start);
    let end = deepest_position(document, end);
    let start_block = closest_block(document, start.node)?;
    let end_block = closest_block(document, end.node)?;
    if closest_unbreakable(document, start_block) != closest_unbreakable(document, end_block) {
        debug!("range deletion refused: edges in different unbreakable regions");
        return Ok(None);
    }
    let touched_lists = [outermost_list(document, start_block), outermost_list(document, end_block)];

    if start.node == end.node && document.is_text(start.node) {
        if let Some(text) = document.text_mut(start.node) {
            let from = byte_index(text, start.offset);
            let to = byte_index(text, end.offset);
            text.replace_range(from..to.max(from), "");
        }
        return Ok(Some(finish(document, normalizer, start, start_block)));
    }

    // Edges as stable sibling references: everything after `left` inside
    // `start_parent` and before `right` inside `end_parent` goes.
    let (end_parent, right) = if document.is_text(end.node) {
        let parent = document.parent(end.node).unwrap_or(end_block);
        if end.offset == 0 {
            (parent, Some(end.node))
        } else if end.offset >= document.len(end.node) {
            (parent, document.next_sibling(end.node))
        } else {
            (parent, document.split_text(end.node, end.offset))
        }
    } else {
        (end.node, document.child(end.node, end.offset))
    };
    let (start_parent, left) = if document.is_text(start.node) {
        let parent = document.parent(start.node).unwrap_or(start_block);
        if start.offset == 0 {
            (parent, document.previous_sibling(start.node))
        } else {
            if start.offset < document.len(start.node) {
                document.split_text(start.node, start.offset);
            }
            (parent, Some(start.node))
        }
    } else {
        let left = start
            .offset
            .checked_sub(1)
            .and_then(|index| document.child(start.node, index));
        (start.node, left)
    };

    let Some(common) = document.common_ancestor(start_parent, end_parent) else {
        return Ok(None);
    };

    let start_left = left;
    let mut parent = start_parent;
    let mut left = left;
    while parent != common {
        remove_after(document, parent, left);
        left = Some(parent);
        let Some(next) = document.parent(parent) else {
            break;
        };
        parent = next;
    }
    let mut parent = end_parent;
    let mut right = right;
    while parent != common {
        remove_before(document, parent, right);
        right = Some(parent);
        let Some(next) = document.parent(parent) else {
            break;
        };
        parent = next;
    }
    remove_between(document, common, left, right);

    let mut caret = if document.is_text(start.node) && start.offset > 0 {
        start
    } else {
        let index = match start_left.filter(|&node| document.parent(node) == Some(start_parent)) {
            Some(node) => document.index_in_parent(node).map_or(0, |index| index + 1),
            None => 0,
        };
        Position::new(start_parent, index)
    };

    let nested = document.contains(start_block, end_block) || document.contains(end_block, start_block);
    if start_block != end_block && !nested && document.is_attached(end_block) {
        let insert_at = document.len(start_block);
        if let Some(junction) = merge_blocks(
            document,
            normalizer,
            start_block,
            insert_at,
            end_block,
            0,
            Survivor::Target,
        ) {
            if !(document.is_text(caret.node) && document.is_attached(caret.node)) {
                caret = junction;
            }
        }
    }
    let caret = finish(document, normalizer, caret, start_block);
    for list in touched_lists.into_iter().flatten() {
        if document.is_attached(list) {
            refresh_checklist_states(document, list);
        }
    }
    debug!("deleted range, caret now in node {}", caret.node.index());
    Ok(Some(caret))
}

/// Restores the marker invariant of the surviving block and keeps a space
/// that now ends the line visible.
fn finish(document: &mut Document, normalizer: &dyn TextNormalizer, caret: Position, block: NodeId) -> Position {
    if fill_empty_block(document, block) {
        return Position::new(block, 0);
    }
    let caret = double_trailing_marker(document, deepest_position(document, caret), block);
    if document.is_text(caret.node)
        && caret.offset == document.len(caret.node)
        && is_block_end(document, caret, block)
    {
        if let Some(text) = last_text_of(document, caret.node) {
            normalizer.collapse_and_mark_boundary_spaces(document, text, Boundary::LineEnd);
        }
    }
    caret
}
