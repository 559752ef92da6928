//! The list model.
//!
//! Nesting is never a list directly inside a list: a deeper level is always a
//! wrapper item (a `li` with `list-style: none`) whose only block child is the
//! nested list. Indent, outdent, un-listing and checked-state propagation are
//! all expressed in terms of that convention.

use log::{debug, trace};

use crate::document::{Document, ListType, NodeId, NodeKind};

use super::content::fill_empty_block;
use super::cursor::outermost_list;
use super::inspect::{
    CHECKED_CLASS, LIST_STYLE, UNCHECKED_CLASS, has_block_children, has_visible_content, is_block,
    is_checked, is_list, is_list_item, is_unbreakable, is_wrapper_item, list_type, wrapper_list,
};

pub(crate) fn set_checked_class(document: &mut Document, item: NodeId, checked: bool) {
    let attrs = document.attrs_mut(item);
    if checked {
        attrs.remove_class(UNCHECKED_CLASS);
        attrs.add_class(CHECKED_CLASS);
    } else {
        attrs.remove_class(CHECKED_CLASS);
        attrs.add_class(UNCHECKED_CLASS);
    }
}

fn clear_checked_class(document: &mut Document, item: NodeId) {
    let attrs = document.attrs_mut(item);
    attrs.remove_class(CHECKED_CLASS);
    attrs.remove_class(UNCHECKED_CLASS);
}

/// Brings an item's checklist classes in line with the list it now lives in.
pub(crate) fn adapt_item_to_list(document: &mut Document, item: NodeId) {
    let in_checklist = document
        .parent(item)
        .is_some_and(|list| is_list(document, list, Some(ListType::Checklist)));
    if !in_checklist {
        clear_checked_class(document, item);
    } else if !is_wrapper_item(document, item) && !is_checked(document, item) {
        set_checked_class(document, item, false);
    }
}

/// Marks a wrapper item as a structural host for a nested list.
pub(crate) fn mark_wrapper(document: &mut Document, item: NodeId) {
    document.attrs_mut(item).set_style(LIST_STYLE, "none");
}

fn unmark_wrapper(document: &mut Document, item: NodeId) {
    document.attrs_mut(item).remove_style(LIST_STYLE);
}

/// Re-derives the wrapper style of an item after its content changed.
pub(crate) fn normalize_wrapper_style(document: &mut Document, item: NodeId) {
    if !is_list_item(document, item) {
        return;
    }
    if is_wrapper_item(document, item) {
        mark_wrapper(document, item);
    } else if document.attrs(item).style(LIST_STYLE) == Some("none") {
        unmark_wrapper(document, item);
    }
}

/// Removes marker styling (`list-style`, `list-style-type`, ...) from an item.
fn strip_list_markers(document: &mut Document, item: NodeId) {
    document
        .attrs_mut(item)
        .retain_styles(|name| !name.starts_with(LIST_STYLE));
}

fn new_wrapper(document: &mut Document, list_type: ListType) -> (NodeId, NodeId) {
    let wrapper = document.create(NodeKind::ListItem);
    mark_wrapper(document, wrapper);
    let list = document.create(NodeKind::List(list_type));
    document.append(wrapper, list);
    (wrapper, list)
}

// ============================================================================
// Joining lists
// ============================================================================

/// Appends the items of `second` to `first`, removes `second`, and rejoins
/// the nested lists of wrapper items meeting at the junction.
pub(crate) fn join_lists(document: &mut Document, first: NodeId, second: NodeId) {
    let junction_left = document.last_child(first);
    let junction_right = document.first_child(second);
    document.move_children(second, 0, first);
    document.remove(second);
    trace!("joined list {} into {}", second.index(), first.index());
    if let (Some(left), Some(right)) = (junction_left, junction_right) {
        join_wrappers(document, left, right);
    }
}

fn join_wrappers(document: &mut Document, left: NodeId, right: NodeId) {
    let (Some(left_list), Some(right_list)) =
        (wrapper_list(document, left), wrapper_list(document, right))
    else {
        return;
    };
    if list_type(document, left_list) != list_type(document, right_list) {
        return;
    }
    join_lists(document, left_list, right_list);
    document.remove(right);
}

/// Joins the two children of `parent` meeting at `index` when they are lists
/// of the same type.
pub(crate) fn rejoin_lists_at(document: &mut Document, parent: NodeId, index: usize) -> bool {
    if index == 0 || document.get(parent).is_none() {
        return false;
    }
    let (Some(left), Some(right)) = (document.child(parent, index - 1), document.child(parent, index))
    else {
        return false;
    };
    let (Some(left_type), Some(right_type)) = (list_type(document, left), list_type(document, right))
    else {
        return false;
    };
    if left_type != right_type {
        return false;
    }
    join_lists(document, left, right);
    debug!("rejoined sibling lists under node {}", parent.index());
    true
}

/// Merges `list` with directly adjacent sibling lists of the same type and
/// returns the surviving list.
pub(crate) fn join_adjacent_lists(document: &mut Document, list: NodeId) -> NodeId {
    let Some(wanted) = list_type(document, list) else {
        return list;
    };
    let mut list = list;
    if let Some(previous) = document.previous_sibling(list) {
        if list_type(document, previous) == Some(wanted) {
            join_lists(document, previous, list);
            list = previous;
        }
    }
    if let Some(next) = document.next_sibling(list) {
        if list_type(document, next) == Some(wanted) {
            join_lists(document, list, next);
        }
    }
    list
}

fn is_disposable(document: &Document, node: NodeId) -> bool {
    if is_unbreakable(document, node) {
        return false;
    }
    if is_list(document, node, None) {
        return !document
            .children(node)
            .iter()
            .any(|&child| is_list_item(document, child));
    }
    if is_block(document, node) {
        return !has_visible_content(document, node) && !has_block_children(document, node);
    }
    false
}

/// Removes `node` and then every ancestor left without content, stopping at
/// unbreakable regions and the root. Returns the gap the topmost removed node
/// left behind.
pub(crate) fn remove_with_empty_ancestors(document: &mut Document, node: NodeId) -> Option<(NodeId, usize)> {
    let mut current = node;
    loop {
        let parent = document.parent(current)?;
        let index = document.index_in_parent(current)?;
        document.remove(current);
        if !is_disposable(document, parent) {
            normalize_wrapper_style(document, parent);
            return Some((parent, index));
        }
        current = parent;
    }
}

/// Wraps a non-list block into a fresh single-item list of `target`.
/// Paragraphs dissolve into the item; other blocks are kept inside it.
pub(crate) fn wrap_block_in_list(document: &mut Document, block: NodeId, target: ListType) -> NodeId {
    let list = document.create(NodeKind::List(target));
    let item = document.create(NodeKind::ListItem);
    document.append(list, item);
    document.insert_before(block, list);
    if matches!(document.kind(block), NodeKind::Paragraph) {
        document.move_children(block, 0, item);
        document.remove(block);
        fill_empty_block(document, item);
    } else {
        document.append(item, block);
    }
    if target == ListType::Checklist {
        set_checked_class(document, item, false);
    }
    debug!("wrapped block into new {:?} list {}", target, list.index());
    list
}

/// Changes the type of an existing list. Per-item marker styles are dropped,
/// checked state is created or discarded as the new type requires.
pub(crate) fn convert_list_type(document: &mut Document, list: NodeId, target: ListType) {
    let Some(previous) = list_type(document, list) else {
        return;
    };
    if previous == target {
        return;
    }
    document.set_kind(list, NodeKind::List(target));
    let items: Vec<NodeId> = document.children(list).to_vec();
    for item in items {
        if !is_list_item(document, item) {
            continue;
        }
        strip_list_markers(document, item);
        if is_wrapper_item(document, item) {
            mark_wrapper(document, item);
        }
        if previous == ListType::Checklist {
            clear_checked_class(document, item);
        }
        adapt_item_to_list(document, item);
    }
    debug!("converted list {} from {:?} to {:?}", list.index(), previous, target);
}

/// Where a lifted item ended up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Lifted {
    /// Still a list item, one level up.
    Item(NodeId),
    /// Dissolved into blocks; the first of them.
    Blocks(NodeId),
}

/// Moves an item one nesting level up. A nested item lands in the parent
/// list right after its wrapper, splitting the nested list when it had
/// following siblings. A top-level item dissolves into blocks placed after
/// its list, splitting the list likewise.
///
/// Returns `None` when `item` is not inside a list.
pub(crate) fn lift_list_item(document: &mut Document, item: NodeId) -> Option<Lifted> {
    let list = document.parent(item)?;
    let container = document.parent(list)?;
    let nested = is_list_item(document, container);

    let following: Vec<NodeId> = document
        .children(list)
        .iter()
        .skip(document.index_in_parent(item)? + 1)
        .copied()
        .collect();
    if !following.is_empty() {
        let tail = document.shallow_clone(list);
        for sibling in following {
            document.append(tail, sibling);
        }
        if nested {
            let wrapper = document.create(NodeKind::ListItem);
            mark_wrapper(document, wrapper);
            document.append(wrapper, tail);
            document.insert_after(container, wrapper);
            refresh_wrapper(document, wrapper);
        } else {
            document.insert_after(list, tail);
        }
    }

    if nested {
        document.insert_after(container, item);
        if document.children(list).is_empty() {
            document.remove(list);
            if !has_visible_content(document, container)
                && !has_block_children(document, container)
            {
                document.remove(container);
            } else {
                normalize_wrapper_style(document, container);
            }
        }
        normalize_wrapper_style(document, item);
        adapt_item_to_list(document, item);
        trace!("lifted item {} one level", item.index());
        return Some(Lifted::Item(item));
    }

    let mut last = list;
    let mut line: Option<NodeId> = None;
    let children: Vec<NodeId> = document.children(item).to_vec();
    for child in children {
        if is_block(document, child) {
            line = None;
            document.insert_after(last, child);
            last = child;
        } else {
            let paragraph = match line {
                Some(paragraph) => paragraph,
                None => {
                    let paragraph = document.create(NodeKind::Paragraph);
                    document.insert_after(last, paragraph);
                    last = paragraph;
                    line = Some(paragraph);
                    paragraph
                }
            };
            document.append(paragraph, child);
        }
    }
    if last == list {
        let paragraph = document.create(NodeKind::Paragraph);
        document.insert_after(list, paragraph);
        last = paragraph;
    }
    let mut first = last;
    let mut created = Some(last);
    while let Some(block) = created {
        if matches!(document.kind(block), NodeKind::Paragraph) {
            fill_empty_block(document, block);
        }
        first = block;
        created = document.previous_sibling(block).filter(|&previous| previous != list);
    }
    document.remove(item);
    if document.children(list).is_empty() {
        document.remove(list);
    }
    trace!("lifted top-level item {} out of its list", item.index());
    Some(Lifted::Blocks(first))
}

/// Groups items into runs of directly adjacent siblings.
pub(crate) fn sibling_runs(document: &Document, items: &[NodeId]) -> Vec<Vec<NodeId>> {
    let mut runs: Vec<Vec<NodeId>> = Vec::new();
    for &item in items {
        match runs.last_mut() {
            Some(run)
                if run
                    .last()
                    .is_some_and(|&last| document.next_sibling(last) == Some(item)) =>
            {
                run.push(item)
            }
            _ => runs.push(vec![item]),
        }
    }
    runs
}

/// Indents a run of adjacent sibling items by one level.
pub(crate) fn indent_run(document: &mut Document, run: &[NodeId]) -> Option<NodeId> {
    let first = *run.first()?;
    let last = *run.last()?;
    let list = document.parent(first)?;
    let parent_type = list_type(document, list)?;

    let previous = document
        .previous_sibling(first)
        .filter(|&sibling| is_wrapper_item(document, sibling));
    let next = document
        .next_sibling(last)
        .filter(|&sibling| is_wrapper_item(document, sibling));

    let target = if let Some(wrapper) = previous {
        let nested = wrapper_list(document, wrapper)?;
        for &item in run {
            document.append(nested, item);
        }
        if let Some(next_wrapper) = next {
            if let Some(next_nested) = wrapper_list(document, next_wrapper) {
                join_lists(document, nested, next_nested);
            }
            document.remove(next_wrapper);
        }
        nested
    } else if let Some(wrapper) = next {
        let nested = wrapper_list(document, wrapper)?;
        for (index, &item) in run.iter().enumerate() {
            document.insert(nested, index, item);
        }
        nested
    } else {
        let (wrapper, nested) = new_wrapper(document, parent_type);
        document.insert_before(first, wrapper);
        for &item in run {
            document.append(nested, item);
        }
        nested
    };
    for &item in run {
        adapt_item_to_list(document, item);
    }
    debug!("indented {} item(s) into list {}", run.len(), target.index());
    Some(target)
}

// ============================================================================
// Checked state
// ============================================================================

/// Derived state of a wrapper whose nested list is a checklist: checked iff
/// the list has items and every one of them is checked.
fn derived_checked(document: &Document, nested: NodeId) -> bool {
    let items: Vec<NodeId> = document
        .children(nested)
        .iter()
        .copied()
        .filter(|&child| is_list_item(document, child))
        .collect();
    !items.is_empty()
        && items.iter().all(|&item| match wrapper_list(document, item) {
            Some(inner) if is_list(document, inner, Some(ListType::Checklist)) => {
                derived_checked(document, inner)
            }
            Some(_) => false,
            None => is_checked(document, item),
        })
}

fn refresh_wrapper(document: &mut Document, wrapper: NodeId) -> bool {
    let Some(nested) = wrapper_list(document, wrapper) else {
        return false;
    };
    if !is_list(document, nested, Some(ListType::Checklist)) {
        return false;
    }
    let checked = derived_checked(document, nested);
    set_checked_class(document, wrapper, checked);
    true
}

/// Recomputes every wrapper state below `list`, innermost first.
pub(crate) fn refresh_checklist_states(document: &mut Document, list: NodeId) {
    let items: Vec<NodeId> = document.children(list).to_vec();
    for item in items {
        let nested: Vec<NodeId> = document
            .children(item)
            .iter()
            .copied()
            .filter(|&child| is_list(document, child, None))
            .collect();
        for inner in nested {
            refresh_checklist_states(document, inner);
        }
        if is_wrapper_item(document, item) {
            refresh_wrapper(document, item);
        }
    }
}

/// Refreshes wrapper states for the whole list tree `node` belongs to.
pub(crate) fn refresh_checklists_around(document: &mut Document, node: NodeId) {
    if let Some(list) = outermost_list(document, node) {
        refresh_checklist_states(document, list);
    }
}

/// Walks up from a leaf item through wrapper items whose nested list is a
/// checklist, re-deriving each wrapper's state.
pub(crate) fn propagate_checked(document: &mut Document, item: NodeId) {
    let mut current = item;
    while let Some(list) = document.parent(current) {
        let Some(wrapper) = document.parent(list) else {
            break;
        };
        if !is_list_item(document, wrapper) || !refresh_wrapper(document, wrapper) {
            break;
        }
        current = wrapper;
    }
}

/// Sets a leaf checklist item's state and propagates it to its wrappers.
pub(crate) fn set_item_checked(document: &mut Document, item: NodeId, checked: bool) {
    set_checked_class(document, item, checked);
    propagate_checked(document, item);
    trace!("item {} checked = {}", item.index(), checked);
}
