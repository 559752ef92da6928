//! Arena-backed document tree.
//!
//! Nodes live in a `Vec` and are addressed by [`NodeId`] handles. Every node
//! owns its ordered child list; the parent handle is a plain back-reference
//! used for upward navigation only. Removed nodes leave an empty slot behind,
//! so a stale handle never aliases a newer node.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::ops::{Index, IndexMut};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ListType {
    Ordered,
    Unordered,
    Checklist,
}

impl ListType {
    pub fn tag(self) -> &'static str {
        match self {
            ListType::Ordered => "ol",
            ListType::Unordered | ListType::Checklist => "ul",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormatKind {
    Bold,
    Strong,
    Italic,
    Emphasis,
    Underline,
    Strike,
    Span,
    Link,
    Font,
    Code,
}

impl FormatKind {
    pub fn tag(self) -> &'static str {
        match self {
            FormatKind::Bold => "b",
            FormatKind::Strong => "strong",
            FormatKind::Italic => "i",
            FormatKind::Emphasis => "em",
            FormatKind::Underline => "u",
            FormatKind::Strike => "s",
            FormatKind::Span => "span",
            FormatKind::Link => "a",
            FormatKind::Font => "font",
            FormatKind::Code => "code",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        let kind = match tag {
            "b" => FormatKind::Bold,
            "strong" => FormatKind::Strong,
            "i" => FormatKind::Italic,
            "em" => FormatKind::Emphasis,
            "u" => FormatKind::Underline,
            "s" | "strike" => FormatKind::Strike,
            "span" => FormatKind::Span,
            "a" => FormatKind::Link,
            "font" => FormatKind::Font,
            "code" => FormatKind::Code,
            _ => return None,
        };
        Some(kind)
    }
}

/// Role of a node. Unknown tags fall back to `Block` or `Inline`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Paragraph,
    Heading(u8),
    Blockquote,
    Preformatted,
    Divider,
    List(ListType),
    ListItem,
    TableCell,
    Block(String),
    Format(FormatKind),
    LineBreak,
    Inline(String),
    Text(String),
}

const GENERIC_BLOCK_TAGS: &[&str] = &[
    "section", "article", "header", "footer", "nav", "aside", "table", "thead", "tbody", "tfoot",
    "tr", "th", "hr", "address", "figure", "dl", "dt", "dd",
];

impl NodeKind {
    /// Maps a markup tag name to a node role.
    pub fn from_tag(tag: &str) -> NodeKind {
        let tag = tag.to_ascii_lowercase();
        match tag.as_str() {
            "p" => NodeKind::Paragraph,
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                NodeKind::Heading(tag.as_bytes()[1] - b'0')
            }
            "blockquote" => NodeKind::Blockquote,
            "pre" => NodeKind::Preformatted,
            "div" => NodeKind::Divider,
            "ul" => NodeKind::List(ListType::Unordered),
            "ol" => NodeKind::List(ListType::Ordered),
            "li" => NodeKind::ListItem,
            "td" => NodeKind::TableCell,
            "br" => NodeKind::LineBreak,
            _ => {
                if let Some(format) = FormatKind::from_tag(&tag) {
                    NodeKind::Format(format)
                } else if GENERIC_BLOCK_TAGS.contains(&tag.as_str()) {
                    NodeKind::Block(tag)
                } else {
                    NodeKind::Inline(tag)
                }
            }
        }
    }

    /// Tag name used when writing the node out. `None` for text and the root.
    pub fn tag(&self) -> Option<String> {
        let tag = match self {
            NodeKind::Root | NodeKind::Text(_) => return None,
            NodeKind::Paragraph => "p".to_string(),
            NodeKind::Heading(level) => format!("h{}", level),
            NodeKind::Blockquote => "blockquote".to_string(),
            NodeKind::Preformatted => "pre".to_string(),
            NodeKind::Divider => "div".to_string(),
            NodeKind::List(list_type) => list_type.tag().to_string(),
            NodeKind::ListItem => "li".to_string(),
            NodeKind::TableCell => "td".to_string(),
            NodeKind::Block(tag) | NodeKind::Inline(tag) => tag.clone(),
            NodeKind::Format(format) => format.tag().to_string(),
            NodeKind::LineBreak => "br".to_string(),
        };
        Some(tag)
    }

    pub fn is_text(&self) -> bool {
        matches!(self, NodeKind::Text(_))
    }
}

/// Element attributes: an ordered class set, an ordered style map and the
/// remaining attributes by name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Attributes {
    classes: Vec<String>,
    style: Vec<(String, String)>,
    other: BTreeMap<String, String>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.style.is_empty() && self.other.is_empty()
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.classes.iter().any(|class| class == name)
    }

    pub fn add_class(&mut self, name: &str) {
        if !self.has_class(name) {
            self.classes.push(name.to_string());
        }
    }

    pub fn remove_class(&mut self, name: &str) -> bool {
        let before = self.classes.len();
        self.classes.retain(|class| class != name);
        self.classes.len() != before
    }

    pub fn style(&self, property: &str) -> Option<&str> {
        self.style
            .iter()
            .find(|(name, _)| name == property)
            .map(|(_, value)| value.as_str())
    }

    pub fn styles(&self) -> impl Iterator<Item = (&str, &str)> {
        self.style
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn set_style(&mut self, property: &str, value: &str) {
        if let Some(entry) = self.style.iter_mut().find(|(name, _)| name == property) {
            entry.1 = value.to_string();
        } else {
            self.style.push((property.to_string(), value.to_string()));
        }
    }

    pub fn remove_style(&mut self, property: &str) -> bool {
        let before = self.style.len();
        self.style.retain(|(name, _)| name != property);
        self.style.len() != before
    }

    /// Drops every style property `keep` rejects.
    pub fn retain_styles(&mut self, keep: impl Fn(&str) -> bool) {
        self.style.retain(|(name, _)| keep(name));
    }

    /// Parses a `style` attribute value (`name: value; name: value`).
    pub fn set_style_text(&mut self, text: &str) {
        self.style.clear();
        for declaration in text.split(';') {
            let Some((name, value)) = declaration.split_once(':') else {
                continue;
            };
            let name = name.trim();
            if !name.is_empty() {
                self.set_style(name, value.trim());
            }
        }
    }

    pub fn style_text(&self) -> String {
        self.style
            .iter()
            .map(|(name, value)| format!("{}: {};", name, value))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.other.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: &str, value: &str) {
        self.other.insert(name.to_string(), value.to_string());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.other.remove(name)
    }

    /// Attributes other than `class` and `style`, ordered by name.
    pub fn others(&self) -> impl Iterator<Item = (&str, &str)> {
        self.other
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

#[derive(Clone, Debug)]
pub struct Node {
    kind: NodeKind,
    attrs: Attributes,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn attrs(&self) -> &Attributes {
        &self.attrs
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// A caret position: a character offset into a text node, or a child index
/// into an element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    pub node: NodeId,
    pub offset: usize,
}

impl Position {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

#[derive(Clone, Debug)]
pub struct Document {
    nodes: Vec<Option<Node>>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<NodeId> for Document {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        match self.nodes.get(id.0) {
            Some(Some(node)) => node,
            _ => panic!("stale node handle {}", id.0),
        }
    }
}

impl IndexMut<NodeId> for Document {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        match self.nodes.get_mut(id.0) {
            Some(Some(node)) => node,
            _ => panic!("stale node handle {}", id.0),
        }
    }
}

impl Document {
    pub fn new() -> Self {
        let root = Node {
            kind: NodeKind::Root,
            attrs: Attributes::new(),
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![Some(root)],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    /// Number of live nodes, the root included.
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    /// True when `id` is live and connected to the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            let Some(node) = self.get(current) else {
                return false;
            };
            match node.parent {
                Some(parent) => current = parent,
                None => return current == self.root,
            }
        }
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self[id].kind
    }

    pub fn attrs(&self, id: NodeId) -> &Attributes {
        &self[id].attrs
    }

    pub fn attrs_mut(&mut self, id: NodeId) -> &mut Attributes {
        &mut self[id].attrs
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self[id].children
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.get(id)?.children.get(index).copied()
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.children.first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.children.last().copied()
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self[parent].children.iter().position(|child| *child == id)
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        if index == 0 {
            return None;
        }
        self.child(parent, index - 1)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        self.child(parent, index + 1)
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(|node| node.kind.is_text())
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.get(id)?.kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn text_mut(&mut self, id: NodeId) -> Option<&mut String> {
        match &mut self.nodes.get_mut(id.0)?.as_mut()?.kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Node length: characters for text, child count for elements.
    pub fn len(&self, id: NodeId) -> usize {
        match &self[id].kind {
            NodeKind::Text(text) => text.chars().count(),
            _ => self[id].children.len(),
        }
    }

    /// Ancestors of `id`, starting with `id` itself.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            document: self,
            next: self.get(id).map(|_| id),
        }
    }

    /// True when `ancestor` is `node` or one of its ancestors.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).any(|id| id == ancestor)
    }

    pub fn common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        let chain: Vec<NodeId> = self.ancestors(a).collect();
        self.ancestors(b).find(|id| chain.contains(id))
    }

    /// All descendants of `id` in document order, `id` excluded.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self[id].children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self[next].children.iter().rev().copied());
        }
        out
    }

    fn path(&self, id: NodeId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = id;
        while let Some(index) = self.index_in_parent(current) {
            path.push(index);
            current = self[current].parent.unwrap_or(current);
        }
        path.reverse();
        path
    }

    /// Orders two positions in document order. Equivalent gaps expressed at
    /// different depths compare consistently, shallower first.
    pub fn compare_positions(&self, a: Position, b: Position) -> Ordering {
        let mut key_a = self.path(a.node);
        key_a.push(a.offset);
        let mut key_b = self.path(b.node);
        key_b.push(b.offset);
        key_a.cmp(&key_b)
    }

    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        self.create_with(kind, Attributes::new())
    }

    pub fn create_with(&mut self, kind: NodeKind, attrs: Attributes) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(Node {
            kind,
            attrs,
            parent: None,
            children: Vec::new(),
        }));
        id
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.create(NodeKind::Text(text.into()))
    }

    /// Detached copy of `id` with the same kind and attributes, no children.
    pub fn shallow_clone(&mut self, id: NodeId) -> NodeId {
        let kind = match &self[id].kind {
            NodeKind::Text(_) => NodeKind::Text(String::new()),
            other => other.clone(),
        };
        let attrs = self[id].attrs.clone();
        self.create_with(kind, attrs)
    }

    pub fn set_kind(&mut self, id: NodeId, kind: NodeKind) {
        self[id].kind = kind;
    }

    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self[parent].children.push(child);
        self[child].parent = Some(parent);
    }

    /// Inserts `child` into `parent` so that it ends up at `index`, counted
    /// before `child` is detached from any previous position.
    pub fn insert(&mut self, parent: NodeId, index: usize, child: NodeId) {
        debug_assert!(!self.contains(child, parent), "insert would create a cycle");
        let mut index = index;
        if self.parent(child) == Some(parent)
            && self.index_in_parent(child).is_some_and(|current| current < index)
        {
            index -= 1;
        }
        self.detach(child);
        let len = self[parent].children.len();
        self[parent].children.insert(index.min(len), child);
        self[child].parent = Some(parent);
    }

    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) {
        if reference == node {
            return;
        }
        self.detach(node);
        let (Some(parent), Some(index)) = (self.parent(reference), self.index_in_parent(reference))
        else {
            return;
        };
        self[parent].children.insert(index, node);
        self[node].parent = Some(parent);
    }

    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) {
        if reference == node {
            return;
        }
        self.detach(node);
        let (Some(parent), Some(index)) = (self.parent(reference), self.index_in_parent(reference))
        else {
            return;
        };
        self[parent].children.insert(index + 1, node);
        self[node].parent = Some(parent);
    }

    /// Unlinks `id` from its parent. The subtree stays alive.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        self[parent].children.retain(|child| *child != id);
        self[id].parent = None;
    }

    /// Unlinks `id` and frees its whole subtree.
    pub fn remove(&mut self, id: NodeId) {
        if id == self.root || self.get(id).is_none() {
            return;
        }
        self.detach(id);
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(next.0).and_then(Option::take) {
                stack.extend(node.children);
            }
        }
    }

    /// Moves `from`'s children starting at `start` to the end of `to`.
    pub fn move_children(&mut self, from: NodeId, start: usize, to: NodeId) {
        let moved: Vec<NodeId> = self[from].children.iter().skip(start).copied().collect();
        for child in moved {
            self.append(to, child);
        }
    }

    /// Replaces `id` with its children.
    pub fn unwrap(&mut self, id: NodeId) {
        let children = self[id].children.clone();
        for child in children {
            self.insert_before(id, child);
        }
        self.remove(id);
    }

    /// Splits a text node at a character offset. The tail moves into a new
    /// text node inserted right after `id`, which is returned.
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> Option<NodeId> {
        let text = self.text_mut(id)?;
        let byte = byte_index(text, offset);
        let tail = text.split_off(byte);
        let new_node = self.create_text(tail);
        if self.parent(id).is_some() {
            self.insert_after(id, new_node);
        }
        Some(new_node)
    }
}

pub struct Ancestors<'a> {
    document: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.document.parent(current);
        Some(current)
    }
}

/// Byte index of the `char_idx`-th character, clamped to the end.
pub(crate) fn byte_index(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod document_tests;
