//! Node classification. Every predicate is total: it accepts any handle,
//! including text nodes and stale handles, and answers `false` when the
//! category does not apply.

use crate::document::{Document, ListType, NodeId, NodeKind};

pub const UNBREAKABLE_ATTRIBUTE: &str = "t";
pub const UNBREAKABLE_CLASS: &str = "oe-unbreakable";
pub const CHECKLIST_CLASS: &str = "checklist";
pub const CHECKED_CLASS: &str = "checked";
pub const UNCHECKED_CLASS: &str = "unchecked";
pub const LIST_STYLE: &str = "list-style";

fn kind(document: &Document, id: NodeId) -> Option<&NodeKind> {
    document.get(id).map(|node| node.kind())
}

pub fn is_editable_root(document: &Document, id: NodeId) -> bool {
    matches!(kind(document, id), Some(NodeKind::Root))
}

pub fn is_block(document: &Document, id: NodeId) -> bool {
    matches!(
        kind(document, id),
        Some(
            NodeKind::Paragraph
                | NodeKind::Heading(_)
                | NodeKind::Blockquote
                | NodeKind::Preformatted
                | NodeKind::Divider
                | NodeKind::List(_)
                | NodeKind::ListItem
                | NodeKind::TableCell
                | NodeKind::Block(_)
        )
    )
}

/// Merge and split boundaries: flagged elements, table cells and the
/// editable root.
pub fn is_unbreakable(document: &Document, id: NodeId) -> bool {
    let Some(node) = document.get(id) else {
        return false;
    };
    match node.kind() {
        NodeKind::Root | NodeKind::TableCell => true,
        NodeKind::Text(_) => false,
        _ => {
            node.attrs().get(UNBREAKABLE_ATTRIBUTE).is_some()
                || node.attrs().has_class(UNBREAKABLE_CLASS)
        }
    }
}

/// Containers a paragraph may be placed into. Table sections and rows hold
/// cells only.
pub fn holds_flow_blocks(document: &Document, id: NodeId) -> bool {
    match kind(document, id) {
        Some(
            NodeKind::Root
            | NodeKind::ListItem
            | NodeKind::TableCell
            | NodeKind::Blockquote
            | NodeKind::Divider,
        ) => true,
        Some(NodeKind::Block(tag)) => {
            !matches!(tag.as_str(), "table" | "thead" | "tbody" | "tfoot" | "tr")
        }
        _ => false,
    }
}

pub fn list_type(document: &Document, id: NodeId) -> Option<ListType> {
    match kind(document, id)? {
        NodeKind::List(list_type) => Some(*list_type),
        _ => None,
    }
}

/// `is_list(doc, id, None)` matches any list.
pub fn is_list(document: &Document, id: NodeId, wanted: Option<ListType>) -> bool {
    match list_type(document, id) {
        Some(list_type) => wanted.is_none_or(|wanted| wanted == list_type),
        None => false,
    }
}

pub fn is_list_item(document: &Document, id: NodeId) -> bool {
    matches!(kind(document, id), Some(NodeKind::ListItem))
}

/// The nested list of a wrapper item: a list item whose only block child is
/// a list and which carries no visible inline content of its own.
pub fn wrapper_list(document: &Document, id: NodeId) -> Option<NodeId> {
    if !is_list_item(document, id) {
        return None;
    }
    let mut nested = None;
    for &child in document.children(id) {
        if is_list(document, child, None) {
            if nested.is_some() {
                return None;
            }
            nested = Some(child);
        } else if is_block(document, child) || has_visible_content(document, child) {
            return None;
        }
    }
    nested
}

pub fn is_wrapper_item(document: &Document, id: NodeId) -> bool {
    wrapper_list(document, id).is_some()
}

pub fn is_visible_empty_marker(document: &Document, id: NodeId) -> bool {
    matches!(kind(document, id), Some(NodeKind::LineBreak))
}

pub fn is_format_node(document: &Document, id: NodeId) -> bool {
    matches!(kind(document, id), Some(NodeKind::Format(_)))
}

/// Childless inline elements that render as content of their own.
pub fn is_void_inline(document: &Document, id: NodeId) -> bool {
    matches!(kind(document, id), Some(NodeKind::Inline(_)))
        && document.get(id).is_some_and(|node| node.children().is_empty())
}

pub fn is_checked(document: &Document, id: NodeId) -> bool {
    document
        .get(id)
        .is_some_and(|node| node.attrs().has_class(CHECKED_CLASS))
}

/// True for characters a browser collapses away at line edges.
pub fn is_collapsible_space(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r' | '\u{200b}' | '\u{feff}')
}

pub fn is_visible_text(text: &str) -> bool {
    text.chars().any(|ch| !is_collapsible_space(ch))
}

/// Visible content anywhere in the subtree, line-break markers included.
pub fn has_visible_content(document: &Document, id: NodeId) -> bool {
    let Some(node) = document.get(id) else {
        return false;
    };
    match node.kind() {
        NodeKind::Text(text) => is_visible_text(text),
        NodeKind::LineBreak => true,
        NodeKind::Inline(_) if node.children().is_empty() => true,
        _ => node
            .children()
            .iter()
            .any(|&child| has_visible_content(document, child)),
    }
}

/// Visible content other than line-break markers.
pub fn has_real_content(document: &Document, id: NodeId) -> bool {
    let Some(node) = document.get(id) else {
        return false;
    };
    match node.kind() {
        NodeKind::Text(text) => is_visible_text(text),
        NodeKind::LineBreak => false,
        NodeKind::Inline(_) if node.children().is_empty() => true,
        _ => node
            .children()
            .iter()
            .any(|&child| has_real_content(document, child)),
    }
}

pub fn has_block_children(document: &Document, id: NodeId) -> bool {
    document.get(id).is_some_and(|node| {
        node.children()
            .iter()
            .any(|&child| is_block(document, child))
    })
}
