use log::debug;

use crate::document::{Document, NodeId, NodeKind, Position};
use crate::error::Result;

use super::EditContext;
use super::content::{
    Boundary, blockify, fill_empty_block, fill_leading_line, first_text_of, prune_empty_inline,
    remove_orphan_marker,
};
use super::cursor::{
    closest_block, deepest_position, is_block_end, is_block_end_strict, is_block_start,
    last_content_leaf, split_to_gap, start_of,
};
use super::inspect::{
    CHECKED_CLASS, has_block_children, has_real_content, holds_flow_blocks, is_editable_root,
    is_list_item, is_unbreakable,
};
use super::structure::{
    Lifted, adapt_item_to_list, lift_list_item, normalize_wrapper_style, propagate_checked,
    refresh_checklists_around,
};

fn new_paragraph(document: &mut Document) -> NodeId {
    let paragraph = document.create(NodeKind::Paragraph);
    fill_empty_block(document, paragraph);
    paragraph
}

/// An empty block of the same kind as `block`, holding only a marker.
fn empty_sibling(document: &mut Document, context: &EditContext<'_>, block: NodeId, after: bool) -> NodeId {
    let sibling = document.shallow_clone(block);
    if after
        && context.config.heading_break_creates_paragraph
        && matches!(document.kind(block), NodeKind::Heading(_) | NodeKind::Blockquote)
    {
        document.set_kind(sibling, NodeKind::Paragraph);
    }
    fill_empty_block(document, sibling);
    sibling
}

/// A new item produced by a split never inherits the checked state.
fn settle_new_item(document: &mut Document, item: NodeId) {
    if !is_list_item(document, item) {
        return;
    }
    document.attrs_mut(item).remove_class(CHECKED_CLASS);
    normalize_wrapper_style(document, item);
    adapt_item_to_list(document, item);
    propagate_checked(document, item);
}

/// Splits `block` at `caret`. At the very start an empty sibling goes in
/// front, at the very end an empty sibling goes after; otherwise the content
/// after the caret moves into a clone of the block, duplicating every inline
/// element open at the caret. Returns the caret in the new block.
pub(crate) fn split_block(
    document: &mut Document,
    context: &EditContext<'_>,
    block: NodeId,
    caret: Position,
) -> Position {
    if is_block_end(document, caret, block) {
        let sibling = empty_sibling(document, context, block, true);
        document.insert_after(block, sibling);
        settle_new_item(document, sibling);
        debug!("split at block end: new block {}", sibling.index());
        return Position::new(sibling, 0);
    }
    if is_block_start(document, caret, block) {
        let sibling = empty_sibling(document, context, block, false);
        document.insert_before(block, sibling);
        settle_new_item(document, sibling);
        debug!("split at block start: new block {}", sibling.index());
        return Position::new(sibling, 0);
    }

    let Some((mut node, mut index)) = split_to_gap(document, caret) else {
        return caret;
    };
    let new_block = loop {
        let clone = document.shallow_clone(node);
        document.move_children(node, index, clone);
        document.insert_after(node, clone);
        if node == block {
            break clone;
        }
        index = document.index_in_parent(node).map_or(0, |current| current + 1);
        match document.parent(node) {
            Some(parent) => node = parent,
            None => break clone,
        }
    };

    prune_empty_inline(document, block);
    prune_empty_inline(document, new_block);
    fill_empty_block(document, block);
    remove_orphan_marker(document, block);
    fill_leading_line(document, new_block);

    if let Some(last) = last_content_leaf(document, block).filter(|&leaf| document.is_text(leaf)) {
        context
            .normalizer
            .collapse_and_mark_boundary_spaces(document, last, Boundary::LineEnd);
    }
    if let Some(first) = first_text_of(document, new_block) {
        context
            .normalizer
            .collapse_and_mark_boundary_spaces(document, first, Boundary::LineStart);
    }
    settle_new_item(document, new_block);
    debug!("split block {} into {}", block.index(), new_block.index());
    start_of(document, new_block)
}

/// Paragraph break at a collapsed caret.
pub(crate) fn insert_paragraph_break_at(
    document: &mut Document,
    context: &EditContext<'_>,
    caret: Position,
) -> Result<Position> {
    let mut caret = deepest_position(document, caret);
    let mut block = closest_block(document, caret.node)?;
    if is_editable_root(document, block) {
        (block, caret) = blockify(document, caret);
    }

    if matches!(document.kind(block), NodeKind::Preformatted) {
        if !is_block_end(document, caret, block) {
            return insert_line_break_at(document, caret);
        }
        let paragraph = new_paragraph(document);
        document.insert_after(block, paragraph);
        return Ok(Position::new(paragraph, 0));
    }

    // A cell keeps the caret: the break becomes a new line inside it.
    if matches!(document.kind(block), NodeKind::TableCell) {
        return insert_line_break_at(document, caret);
    }

    if is_unbreakable(document, block) {
        if !document
            .parent(block)
            .is_some_and(|parent| holds_flow_blocks(document, parent))
        {
            debug!("unbreakable block {} has no room beside it", block.index());
            return insert_line_break_at(document, caret);
        }
        let paragraph = new_paragraph(document);
        if is_block_start(document, caret, block) && has_real_content(document, block) {
            document.insert_before(block, paragraph);
        } else {
            document.insert_after(block, paragraph);
        }
        debug!("unbreakable block {}: paragraph placed beside it", block.index());
        return Ok(Position::new(paragraph, 0));
    }

    if is_list_item(document, block)
        && !has_real_content(document, block)
        && !has_block_children(document, block)
        && document.next_sibling(block).is_none()
    {
        let lifted = lift_list_item(document, block);
        debug!("empty last item {} leaves its list", block.index());
        return Ok(match lifted {
            Some(Lifted::Item(item)) => {
                refresh_checklists_around(document, item);
                start_of(document, item)
            }
            Some(Lifted::Blocks(first)) => start_of(document, first),
            None => caret,
        });
    }

    Ok(split_block(document, context, block, caret))
}

/// Line-break marker at a collapsed caret. When the new marker would be the
/// invisible terminator of the block's last line, a second one is added so
/// the new line shows.
pub(crate) fn insert_line_break_at(document: &mut Document, caret: Position) -> Result<Position> {
    let mut caret = deepest_position(document, caret);
    let mut block = closest_block(document, caret.node)?;
    if is_editable_root(document, block) {
        (block, caret) = blockify(document, caret);
    }
    let Some((parent, index)) = split_to_gap(document, caret) else {
        return Ok(caret);
    };
    let marker = document.create(NodeKind::LineBreak);
    document.insert(parent, index, marker);
    let after = Position::new(parent, index + 1);
    if is_block_end_strict(document, after, block) {
        let terminator = document.create(NodeKind::LineBreak);
        document.insert(parent, index + 1, terminator);
    }
    debug!("inserted line break in block {}", block.index());
    Ok(after)
}
