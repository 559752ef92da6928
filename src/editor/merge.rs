use log::debug;

use crate::document::{Document, NodeId, Position};

use super::content::{Boundary, TextNormalizer, fill_empty_block, first_text_of};
use super::cursor::{before_node, child_towards, outermost_list, previous_content_leaf};
use super::inspect::{
    has_block_children, has_real_content, has_visible_content, is_block, is_list_item,
    is_unbreakable, is_visible_empty_marker,
};
use super::structure::{
    normalize_wrapper_style, refresh_checklist_states, refresh_checklists_around, rejoin_lists_at,
    remove_with_empty_ancestors,
};

/// How the surviving block is chosen when the target line is empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Survivor {
    /// An empty target takes the source's kind and attributes.
    ContentWins,
    /// The target keeps its identity.
    Target,
}

fn count_markers(document: &Document, nodes: &[NodeId]) -> usize {
    nodes
        .iter()
        .map(|&node| {
            usize::from(is_visible_empty_marker(document, node))
                + document
                    .descendants(node)
                    .into_iter()
                    .filter(|&id| is_visible_empty_marker(document, id))
                    .count()
        })
        .sum()
}

/// Index range of the inline line in `block` that ends right before `end`.
fn line_before(document: &Document, block: NodeId, end: usize) -> Vec<NodeId> {
    let children = document.children(block);
    let end = end.min(children.len());
    let start = children[..end]
        .iter()
        .rposition(|&child| is_block(document, child))
        .map(|index| index + 1)
        .unwrap_or(0);
    children[start..end].to_vec()
}

/// Index range of the inline line in `block` starting at `start`.
fn line_from(document: &Document, block: NodeId, start: usize) -> Vec<NodeId> {
    document
        .children(block)
        .iter()
        .skip(start)
        .take_while(|&&child| !is_block(document, child))
        .copied()
        .collect()
}

/// True when `leaf` belongs to `block`'s own line rather than a nested block.
fn in_own_line(document: &Document, leaf: NodeId, block: NodeId) -> bool {
    document
        .ancestors(leaf)
        .skip(1)
        .take_while(|&id| id != block)
        .all(|id| !is_block(document, id))
}

/// Moves the inline line of `source` that starts at child `run_start` into
/// `target` at child index `insert_at`, then removes whatever the move left
/// empty. Returns the caret at the junction.
///
/// Classification happens before any mutation: an unbreakable side yields
/// `None` and leaves the tree untouched.
pub(crate) fn merge_blocks(
    document: &mut Document,
    normalizer: &dyn TextNormalizer,
    target: NodeId,
    insert_at: usize,
    source: NodeId,
    run_start: usize,
    survivor: Survivor,
) -> Option<Position> {
    if is_unbreakable(document, target) || is_unbreakable(document, source) {
        debug!("merge refused: unbreakable block");
        return None;
    }
    let source_list = outermost_list(document, source);

    let run = line_from(document, source, run_start);
    let run_real = run.iter().any(|&node| has_real_content(document, node));
    let placeholder_only = !run_real && count_markers(document, &run) <= 1;
    let target_line = line_before(document, target, insert_at);
    let target_real = target_line
        .iter()
        .any(|&node| has_real_content(document, node));

    if survivor == Survivor::ContentWins
        && !target_real
        && run_real
        && run_start == 0
        && document.kind(target) != document.kind(source)
        && !is_list_item(document, target)
        && !is_list_item(document, source)
        && !has_block_children(document, target)
        && !has_block_children(document, source)
    {
        let kind = document.kind(source).clone();
        let attrs = document.attrs(source).clone();
        document.set_kind(target, kind);
        *document.attrs_mut(target) = attrs;
        debug!("empty block {} adopts the identity of {}", target.index(), source.index());
    }

    let mut insert_at = insert_at;
    if placeholder_only {
        for node in run.iter().copied() {
            document.remove(node);
        }
    } else if let Some(marker) = previous_content_leaf(document, Position::new(target, insert_at), target)
        .filter(|&leaf| is_visible_empty_marker(document, leaf) && in_own_line(document, leaf, target))
    {
        if document.parent(marker) == Some(target) {
            insert_at -= 1;
        }
        document.remove(marker);
    }

    let caret = match insert_at.checked_sub(1).and_then(|index| document.child(target, index)) {
        Some(previous) if document.is_text(previous) => Position::new(previous, document.len(previous)),
        _ => Position::new(target, insert_at),
    };

    if !placeholder_only {
        for (offset, node) in run.iter().copied().enumerate() {
            document.insert(target, insert_at + offset, node);
        }
        if target_real {
            if let Some(text) = run.first().and_then(|&node| first_text_of(document, node)) {
                normalizer.collapse_and_mark_boundary_spaces(document, text, Boundary::Joined);
            }
        }
    }

    if !has_visible_content(document, source) && !has_block_children(document, source) {
        if let Some((parent, index)) = remove_with_empty_ancestors(document, source) {
            rejoin_lists_at(document, parent, index);
        }
    } else {
        normalize_wrapper_style(document, source);
    }
    fill_empty_block(document, target);

    // Items moved or removed: wrapper states of both list trees may change.
    if let Some(list) = source_list.filter(|&list| document.is_attached(list)) {
        refresh_checklist_states(document, list);
    }
    refresh_checklists_around(document, target);

    debug!("merged block {} into {}", source.index(), target.index());
    Some(caret)
}

/// Child index in `block` right after the child holding `position`.
pub(crate) fn line_end_index(document: &Document, block: NodeId, position: Position) -> usize {
    if position.node == block {
        return line_from(document, block, position.offset).len() + position.offset;
    }
    let Some(top) = child_towards(document, block, position.node) else {
        return document.len(block);
    };
    let index = document.index_in_parent(top).unwrap_or(0);
    index + line_from(document, block, index).len()
}

/// Child index in `block` of the child holding `leaf`.
pub(crate) fn line_start_index(document: &Document, block: NodeId, leaf: NodeId) -> usize {
    child_towards(document, block, leaf)
        .and_then(|top| before_node(document, top))
        .map(|position| position.offset)
        .unwrap_or(0)
}
