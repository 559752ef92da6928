//! Compact markup notation for documents with a selection.
//!
//! Used by tests, benchmarks and the command-line tool. The dialect covers
//! what fixtures need: elements with quoted attributes, void `<br>`, a
//! handful of entities and the selection markers `[` (anchor) and `]`
//! (focus). `[]`, or a lone marker, is a collapsed caret. A
//! `<ul class="checklist">` reads as a checklist.

use log::trace;

use crate::document::{Attributes, Document, ListType, NodeId, NodeKind, Position};
use crate::editor::{CHECKLIST_CLASS, Selection};
use crate::error::{Error, Result};

const VOID_TAGS: &[&str] = &["br", "img", "hr", "input"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Marker {
    Anchor,
    Focus,
}

struct Parser<'a> {
    source: &'a str,
    pos: usize,
    document: Document,
    open: Vec<(NodeId, String)>,
    text: String,
    /// Markers seen since the last flush, with the char offset into `text`.
    pending: Vec<(Marker, usize)>,
    anchor: Option<Position>,
    focus: Option<Position>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            document: Document::new(),
            open: Vec::new(),
            text: String::new(),
            pending: Vec::new(),
            anchor: None,
            focus: None,
        }
    }

    fn current(&self) -> NodeId {
        self.open
            .last()
            .map_or(self.document.root(), |(node, _)| *node)
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn expect(&mut self, wanted: char) -> Result<()> {
        match self.bump() {
            Some(ch) if ch == wanted => Ok(()),
            Some(ch) => Err(Error::notation(
                format!("expected '{}', found '{}'", wanted, ch),
                self.pos - ch.len_utf8(),
            )),
            None => Err(Error::notation(
                format!("expected '{}', found end of input", wanted),
                self.pos,
            )),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn name(&mut self) -> Result<String> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
        {
            self.bump();
        }
        if self.pos == start {
            return Err(Error::notation("expected a name", start));
        }
        Ok(self.source[start..self.pos].to_ascii_lowercase())
    }

    fn place(&mut self, marker: Marker, position: Position) -> Result<()> {
        let slot = match marker {
            Marker::Anchor => &mut self.anchor,
            Marker::Focus => &mut self.focus,
        };
        if slot.is_some() {
            return Err(Error::notation(format!("duplicate {:?} marker", marker), self.pos));
        }
        *slot = Some(position);
        Ok(())
    }

    /// Turns buffered characters into a text node and settles the markers
    /// seen while buffering.
    fn flush(&mut self) -> Result<()> {
        let parent = self.current();
        let pending = std::mem::take(&mut self.pending);
        if self.text.is_empty() {
            let index = self.document.len(parent);
            for (marker, _) in pending {
                self.place(marker, Position::new(parent, index))?;
            }
            return Ok(());
        }
        let text = self.document.create_text(std::mem::take(&mut self.text));
        self.document.append(parent, text);
        for (marker, offset) in pending {
            self.place(marker, Position::new(text, offset))?;
        }
        Ok(())
    }

    fn entity(&mut self) -> Result<char> {
        let start = self.pos;
        self.expect('&')?;
        let Some(end) = self.rest().find(';') else {
            return Err(Error::notation("unterminated entity", start));
        };
        let name = &self.rest()[..end];
        let ch = match name {
            "nbsp" => '\u{a0}',
            "lt" => '<',
            "gt" => '>',
            "amp" => '&',
            "quot" => '"',
            _ => {
                return Err(Error::notation(format!("unknown entity '&{};'", name), start));
            }
        };
        self.pos += end + 1;
        Ok(ch)
    }

    fn attribute_value(&mut self) -> Result<String> {
        let quote = match self.bump() {
            Some(quote @ ('"' | '\'')) => quote,
            _ => return Err(Error::notation("expected a quoted attribute value", self.pos)),
        };
        let mut value = String::new();
        loop {
            match self.peek() {
                Some(ch) if ch == quote => {
                    self.bump();
                    return Ok(value);
                }
                Some('&') => value.push(self.entity()?),
                Some(ch) => {
                    value.push(ch);
                    self.bump();
                }
                None => return Err(Error::notation("unterminated attribute value", self.pos)),
            }
        }
    }

    fn open_tag(&mut self) -> Result<()> {
        let start = self.pos;
        self.expect('<')?;
        let tag = self.name()?;
        let mut attrs = Attributes::new();
        let self_closing = loop {
            self.skip_whitespace();
            match self.peek() {
                Some('>') => {
                    self.bump();
                    break false;
                }
                Some('/') => {
                    self.bump();
                    self.expect('>')?;
                    break true;
                }
                Some(_) => {
                    let name = self.name()?;
                    self.skip_whitespace();
                    let value = if self.peek() == Some('=') {
                        self.bump();
                        self.skip_whitespace();
                        self.attribute_value()?
                    } else {
                        String::new()
                    };
                    match name.as_str() {
                        "class" => value.split_whitespace().for_each(|class| attrs.add_class(class)),
                        "style" => attrs.set_style_text(&value),
                        _ => attrs.set(&name, &value),
                    }
                }
                None => return Err(Error::notation(format!("unterminated <{}>", tag), start)),
            }
        };

        let mut kind = NodeKind::from_tag(&tag);
        if kind == NodeKind::List(ListType::Unordered) && attrs.remove_class(CHECKLIST_CLASS) {
            kind = NodeKind::List(ListType::Checklist);
        }
        let node = self.document.create_with(kind, attrs);
        let parent = self.current();
        self.document.append(parent, node);
        if !self_closing && !VOID_TAGS.contains(&tag.as_str()) {
            self.open.push((node, tag));
        }
        Ok(())
    }

    fn close_tag(&mut self) -> Result<()> {
        let start = self.pos;
        self.expect('<')?;
        self.expect('/')?;
        let tag = self.name()?;
        self.skip_whitespace();
        self.expect('>')?;
        match self.open.pop() {
            Some((_, open)) if open == tag => Ok(()),
            Some((_, open)) => Err(Error::notation(
                format!("</{}> closes <{}>", tag, open),
                start,
            )),
            None => Err(Error::notation(format!("</{}> without an open element", tag), start)),
        }
    }

    fn run(mut self) -> Result<(Document, Option<Selection>)> {
        while let Some(ch) = self.peek() {
            match ch {
                '<' => {
                    self.flush()?;
                    if self.rest().starts_with("</") {
                        self.close_tag()?;
                    } else {
                        self.open_tag()?;
                    }
                }
                '&' => {
                    let ch = self.entity()?;
                    self.text.push(ch);
                }
                '[' | ']' => {
                    self.bump();
                    let marker = if ch == '[' { Marker::Anchor } else { Marker::Focus };
                    self.pending.push((marker, self.text.chars().count()));
                }
                _ => {
                    self.bump();
                    self.text.push(ch);
                }
            }
        }
        self.flush()?;
        if let Some((_, tag)) = self.open.last() {
            return Err(Error::notation(format!("<{}> is never closed", tag), self.pos));
        }
        // A lone marker of either kind is a caret.
        let selection = match (self.anchor, self.focus) {
            (Some(anchor), Some(focus)) => Some(Selection::new(&self.document, anchor, focus)),
            (Some(caret), None) | (None, Some(caret)) => Some(Selection::caret(caret)),
            (None, None) => None,
        };
        trace!("parsed fixture into {} nodes", self.document.node_count());
        Ok((self.document, selection))
    }
}

/// Reads a document and its optional selection.
pub fn parse(source: &str) -> Result<(Document, Option<Selection>)> {
    Parser::new(source).run()
}

/// Reads a document that must carry a selection.
pub fn parse_with_selection(source: &str) -> Result<(Document, Selection)> {
    match parse(source)? {
        (document, Some(selection)) => Ok((document, selection)),
        (_, None) => Err(Error::notation("missing selection markers", 0)),
    }
}

fn write_markers(out: &mut String, selection: Option<&Selection>, node: NodeId, offset: usize) {
    let Some(selection) = selection else {
        return;
    };
    let here = Position::new(node, offset);
    match (selection.anchor == here, selection.focus == here) {
        (true, true) => out.push_str("[]"),
        (true, false) => out.push('['),
        (false, true) => out.push(']'),
        (false, false) => {}
    }
}

fn write_escaped(out: &mut String, ch: char) {
    match ch {
        '\u{a0}' => out.push_str("&nbsp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '&' => out.push_str("&amp;"),
        '"' => out.push_str("&quot;"),
        _ => out.push(ch),
    }
}

fn write_attribute(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    value.chars().for_each(|ch| write_escaped(out, ch));
    out.push('"');
}

fn write_node(out: &mut String, document: &Document, node: NodeId, selection: Option<&Selection>) {
    let kind = document.kind(node);
    if let NodeKind::Text(text) = kind {
        for (index, ch) in text.chars().enumerate() {
            write_markers(out, selection, node, index);
            write_escaped(out, ch);
        }
        write_markers(out, selection, node, text.chars().count());
        return;
    }
    let Some(tag) = kind.tag() else {
        write_children(out, document, node, selection);
        return;
    };

    out.push('<');
    out.push_str(&tag);
    let attrs = document.attrs(node);
    let mut classes: Vec<&str> = Vec::new();
    if *kind == NodeKind::List(ListType::Checklist) {
        classes.push(CHECKLIST_CLASS);
    }
    classes.extend(attrs.classes());
    if !classes.is_empty() {
        write_attribute(out, "class", &classes.join(" "));
    }
    let style = attrs.style_text();
    if !style.is_empty() {
        write_attribute(out, "style", &style);
    }
    for (name, value) in attrs.others() {
        write_attribute(out, name, value);
    }
    out.push('>');

    let void = VOID_TAGS.contains(&tag.as_str()) && document.children(node).is_empty();
    if void {
        return;
    }
    write_children(out, document, node, selection);
    out.push_str("</");
    out.push_str(&tag);
    out.push('>');
}

fn write_children(out: &mut String, document: &Document, node: NodeId, selection: Option<&Selection>) {
    let children = document.children(node);
    for (index, &child) in children.iter().enumerate() {
        write_markers(out, selection, node, index);
        write_node(out, document, child, selection);
    }
    write_markers(out, selection, node, children.len());
}

/// Writes the document, placing markers for `selection` when given.
pub fn serialize(document: &Document, selection: Option<&Selection>) -> String {
    let mut out = String::new();
    write_node(&mut out, document, document.root(), selection);
    out
}

#[cfg(test)]
#[path = "notation_tests.rs"]
mod notation_tests;
