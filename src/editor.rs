use std::fmt;
use std::str::FromStr;

use log::debug;

use crate::config::EditorConfig;
use crate::document::{Document, ListType, NodeId, Position};
use crate::error::{Error, Result};

use content::{
    after_text_removal, blockify, double_trailing_marker, fill_empty_block, fill_leading_line,
    remove_char_at, remove_orphan_marker, skip_trailing_marker,
};
use cursor::{
    Anchor, after_node, anchor, before_node, is_block_end, is_block_start, outermost_list,
    resolve,
};
use inspect::{has_block_children, is_checked, is_void_inline};
use merge::{Survivor, line_end_index, line_start_index, merge_blocks};
use range::delete_range;
use split::{insert_line_break_at, insert_paragraph_break_at};
use structure::{
    Lifted, convert_list_type, indent_run, join_adjacent_lists, lift_list_item,
    refresh_checklist_states, refresh_checklists_around, set_item_checked, sibling_runs,
    wrap_block_in_list,
};

mod content;
mod cursor;
mod inspect;
mod merge;
mod range;
mod sanitize;
mod split;
mod structure;

pub use content::{Boundary, TextNormalizer, VerbatimNormalizer, WhitespaceNormalizer};
pub use cursor::{
    closest_block, closest_list, closest_list_item, closest_unbreakable, deepest_position,
    end_of, next_leaf, previous_leaf, start_of,
};
pub use inspect::{
    CHECKED_CLASS, CHECKLIST_CLASS, UNBREAKABLE_ATTRIBUTE, UNBREAKABLE_CLASS, UNCHECKED_CLASS,
    is_block, is_editable_root, is_format_node, is_list, is_list_item, is_unbreakable,
    is_visible_empty_marker, is_wrapper_item, list_type,
};
pub use sanitize::{Sanitizer, SimilarElementSanitizer};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
}

/// Anchor and focus of a selection. Collapsed when both denote the same
/// position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Position,
    pub focus: Position,
    pub direction: Direction,
}

impl Selection {
    pub fn caret(position: Position) -> Self {
        Self {
            anchor: position,
            focus: position,
            direction: Direction::Forward,
        }
    }

    /// Builds a selection, deriving the direction from document order.
    pub fn new(document: &Document, anchor: Position, focus: Position) -> Self {
        let direction = if document.compare_positions(anchor, focus).is_gt() {
            Direction::Backward
        } else {
            Direction::Forward
        };
        Self {
            anchor,
            focus,
            direction,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// The edge that comes first in document order.
    pub fn start(&self) -> Position {
        match self.direction {
            Direction::Forward => self.anchor,
            Direction::Backward => self.focus,
        }
    }

    pub fn end(&self) -> Position {
        match self.direction {
            Direction::Forward => self.focus,
            Direction::Backward => self.anchor,
        }
    }
}

/// Horizontal alignment of a block's lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    /// The `text-align` value written to the block.
    pub fn css_value(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "justify",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    DeleteBackward,
    DeleteForward,
    InsertParagraphBreak,
    InsertLineBreak,
    ToggleList(ListType),
    Indent,
    Outdent,
    ToggleChecked,
    Align(Alignment),
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::DeleteBackward => write!(f, "delete-backward"),
            Command::DeleteForward => write!(f, "delete-forward"),
            Command::InsertParagraphBreak => write!(f, "enter"),
            Command::InsertLineBreak => write!(f, "line-break"),
            Command::ToggleList(ListType::Ordered) => write!(f, "toggle-list=ordered"),
            Command::ToggleList(ListType::Unordered) => write!(f, "toggle-list=unordered"),
            Command::ToggleList(ListType::Checklist) => write!(f, "toggle-list=checklist"),
            Command::Indent => write!(f, "indent"),
            Command::Outdent => write!(f, "outdent"),
            Command::ToggleChecked => write!(f, "toggle-checked"),
            Command::Align(alignment) => write!(f, "align={}", alignment.css_value()),
        }
    }
}

impl FromStr for Command {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        let command = match value {
            "delete-backward" | "backspace" => Command::DeleteBackward,
            "delete-forward" | "delete" => Command::DeleteForward,
            "enter" | "insert-paragraph-break" => Command::InsertParagraphBreak,
            "line-break" | "shift-enter" => Command::InsertLineBreak,
            "indent" | "tab" => Command::Indent,
            "outdent" | "shift-tab" => Command::Outdent,
            "toggle-checked" => Command::ToggleChecked,
            other => {
                if let Some(mode) = other.strip_prefix("align=") {
                    let alignment = match mode {
                        "left" => Alignment::Left,
                        "center" => Alignment::Center,
                        "right" => Alignment::Right,
                        "justify" => Alignment::Justify,
                        _ => return Err(format!("unknown alignment '{}'", mode)),
                    };
                    return Ok(Command::Align(alignment));
                }
                let Some(kind) = other.strip_prefix("toggle-list=") else {
                    return Err(format!("unknown command '{}'", other));
                };
                let list_type = match kind {
                    "ordered" | "ol" => ListType::Ordered,
                    "unordered" | "ul" => ListType::Unordered,
                    "checklist" | "cl" => ListType::Checklist,
                    _ => return Err(format!("unknown list type '{}'", kind)),
                };
                Command::ToggleList(list_type)
            }
        };
        Ok(command)
    }
}

/// Result of a single operation. Refusals and no-ops are expected
/// classification outcomes, not errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The tree changed; the new selection.
    Applied(Selection),
    /// Nothing to do at this position.
    Unchanged,
    /// The edit would break an unbreakable element.
    Refused(Refusal),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Refusal {
    /// The block at the caret may not be merged or split.
    UnbreakableBlock,
    /// The neighbouring content lives in another unbreakable region.
    UnbreakableBoundary,
}

/// Collaborators and settings an operation runs with.
pub struct EditContext<'a> {
    pub config: &'a EditorConfig,
    pub normalizer: &'a dyn TextNormalizer,
}

impl<'a> EditContext<'a> {
    pub fn new(config: &'a EditorConfig, normalizer: &'a dyn TextNormalizer) -> Self {
        Self { config, normalizer }
    }
}

/// Applies one command to `document` at `selection`.
///
/// Fails only when the selection does not describe a valid position in the
/// tree. A required ancestor that cannot be found mid-operation turns the
/// operation into a no-op.
pub fn apply(
    document: &mut Document,
    selection: &Selection,
    command: Command,
    context: &EditContext<'_>,
) -> Result<Outcome> {
    validate_selection(document, selection)?;
    let selection = normalize_selection(document, selection);
    debug!("{} at {:?}", command, selection);
    let result = match command {
        Command::DeleteBackward => delete_backward(document, context, &selection),
        Command::DeleteForward => delete_forward(document, context, &selection),
        Command::InsertParagraphBreak => insert_paragraph_break(document, context, &selection),
        Command::InsertLineBreak => insert_line_break(document, context, &selection),
        Command::ToggleList(target) => toggle_list(document, &selection, target),
        Command::Indent => indent(document, &selection),
        Command::Outdent => outdent(document, &selection),
        Command::ToggleChecked => toggle_checked(document, &selection),
        Command::Align(alignment) => align(document, &selection, alignment),
    };
    match result {
        Err(Error::NotFound { node, what }) => {
            debug!("{} skipped: no {} around node {}", command, what, node.index());
            Ok(Outcome::Unchanged)
        }
        Ok(Outcome::Applied(selection)) => Ok(Outcome::Applied(Selection {
            anchor: deepest_position(document, selection.anchor),
            focus: deepest_position(document, selection.focus),
            direction: selection.direction,
        })),
        other => other,
    }
}

fn validate_selection(document: &Document, selection: &Selection) -> Result<()> {
    for position in [selection.anchor, selection.focus] {
        if !document.is_attached(position.node) {
            return Err(Error::InvalidSelection(format!(
                "node {} is not part of the document",
                position.node.index()
            )));
        }
        if position.offset > document.len(position.node) {
            return Err(Error::InvalidSelection(format!(
                "offset {} is past the end of node {}",
                position.offset,
                position.node.index()
            )));
        }
    }
    Ok(())
}

fn normalize_selection(document: &Document, selection: &Selection) -> Selection {
    let anchor = deepest_position(document, selection.anchor);
    let focus = deepest_position(document, selection.focus);
    Selection::new(document, anchor, focus)
}

fn caret(position: Position) -> Outcome {
    Outcome::Applied(Selection::caret(position))
}

/// The next thing a deletion would consume.
enum Unit {
    /// The character at this index of a text node.
    Char(NodeId, usize),
    Marker(NodeId),
    /// A void inline element.
    Atom(NodeId),
    /// An empty text or format node to skip over.
    Empty(NodeId),
    /// No more content of this block in the deletion direction.
    Boundary,
}

fn classify_leaf(document: &Document, leaf: NodeId, block: NodeId, backward: bool) -> Unit {
    if closest_block(document, leaf).ok() != Some(block) {
        return Unit::Boundary;
    }
    if let Some(text) = document.text(leaf) {
        if text.is_empty() {
            return Unit::Empty(leaf);
        }
        let index = if backward { document.len(leaf) - 1 } else { 0 };
        return Unit::Char(leaf, index);
    }
    if is_visible_empty_marker(document, leaf) {
        Unit::Marker(leaf)
    } else if is_void_inline(document, leaf) {
        Unit::Atom(leaf)
    } else if is_block(document, leaf) {
        Unit::Boundary
    } else {
        Unit::Empty(leaf)
    }
}

fn previous_unit(document: &Document, caret: Position, block: NodeId) -> Unit {
    if document.is_text(caret.node) && caret.offset > 0 {
        return Unit::Char(caret.node, caret.offset - 1);
    }
    match previous_leaf(document, caret) {
        Some(leaf) if document.contains(block, leaf) => classify_leaf(document, leaf, block, true),
        _ => Unit::Boundary,
    }
}

fn next_unit(document: &Document, caret: Position, block: NodeId) -> Unit {
    if document.is_text(caret.node) && caret.offset < document.len(caret.node) {
        return Unit::Char(caret.node, caret.offset);
    }
    match next_leaf(document, caret) {
        Some(leaf) if document.contains(block, leaf) => classify_leaf(document, leaf, block, false),
        _ => Unit::Boundary,
    }
}

/// Restores the marker rules after a character or atom disappeared next to
/// the caret.
fn settle_after_char(
    document: &mut Document,
    context: &EditContext<'_>,
    caret: Position,
    block: NodeId,
) -> Position {
    let filled = if has_block_children(document, block) {
        fill_leading_line(document, block)
    } else {
        fill_empty_block(document, block)
    };
    if filled {
        return Position::new(block, 0);
    }
    let doubled = double_trailing_marker(document, caret, block);
    if doubled != caret {
        return doubled;
    }
    if document.is_text(caret.node) {
        if caret.offset == document.len(caret.node) && is_block_end(document, caret, block) {
            context
                .normalizer
                .collapse_and_mark_boundary_spaces(document, caret.node, Boundary::LineEnd);
        }
        if caret.offset == 0 && is_block_start(document, caret, block) {
            context
                .normalizer
                .collapse_and_mark_boundary_spaces(document, caret.node, Boundary::LineStart);
        }
    }
    caret
}

/// Restores the marker rules after a line break next to the caret was
/// removed.
fn settle_after_marker(
    document: &mut Document,
    context: &EditContext<'_>,
    caret: Position,
    block: NodeId,
) -> Position {
    if fill_empty_block(document, block) {
        return Position::new(block, 0);
    }
    remove_orphan_marker(document, block);
    let caret = Position::new(caret.node, caret.offset.min(document.len(caret.node)));
    if !is_block_start(document, caret, block) {
        let following = next_leaf(document, caret)
            .filter(|&leaf| document.is_text(leaf) && document.contains(block, leaf));
        if let Some(text) = following {
            context
                .normalizer
                .collapse_and_mark_boundary_spaces(document, text, Boundary::Joined);
        }
    }
    caret
}

/// Removes a character; drops the text node (and format wrappers it leaves
/// empty) when nothing is left of it. Returns the caret at the removal point.
fn remove_char(document: &mut Document, text: NodeId, index: usize) -> Position {
    remove_char_at(document, text, index);
    after_text_removal(document, text, index)
}

fn delete_backward(
    document: &mut Document,
    context: &EditContext<'_>,
    selection: &Selection,
) -> Result<Outcome> {
    if !selection.is_collapsed() {
        return delete_selection(document, context, selection);
    }
    let mut position = selection.focus;
    let block = closest_block(document, position.node)?;
    position = skip_trailing_marker(document, position, block);
    loop {
        match previous_unit(document, position, block) {
            Unit::Char(text, index) => {
                let position = remove_char(document, text, index);
                return Ok(caret(settle_after_char(document, context, position, block)));
            }
            Unit::Atom(node) => {
                let position = before_node(document, node).unwrap_or(position);
                document.remove(node);
                return Ok(caret(settle_after_char(document, context, position, block)));
            }
            Unit::Marker(marker) => {
                let position = before_node(document, marker).unwrap_or(position);
                document.remove(marker);
                return Ok(caret(settle_after_marker(document, context, position, block)));
            }
            Unit::Empty(node) => {
                position = before_node(document, node).unwrap_or(position);
                document.remove(node);
            }
            Unit::Boundary => break,
        }
    }
    merge_backward(document, context, position, block)
}

/// Backspace at the start of a block: lift a first list item, otherwise
/// merge the block's first line into the preceding block.
fn merge_backward(
    document: &mut Document,
    context: &EditContext<'_>,
    position: Position,
    block: NodeId,
) -> Result<Outcome> {
    if is_editable_root(document, block) {
        return Ok(Outcome::Unchanged);
    }
    if is_unbreakable(document, block) {
        debug!("backspace refused at start of unbreakable block {}", block.index());
        return Ok(Outcome::Refused(Refusal::UnbreakableBlock));
    }
    let run_start = if position.node == block {
        position.offset
    } else {
        line_start_index(document, block, position.node)
    };

    if is_list_item(document, block) && document.previous_sibling(block).is_none() && run_start == 0 {
        let kept = anchor(document, position);
        let lifted = lift_list_item(document, block);
        let fallback = match lifted {
            Some(Lifted::Item(item)) => {
                refresh_checklists_around(document, item);
                start_of(document, item)
            }
            Some(Lifted::Blocks(first)) => start_of(document, first),
            None => return Ok(Outcome::Unchanged),
        };
        debug!("backspace lifted first item {}", block.index());
        return Ok(caret(resolve(document, kept).unwrap_or(fallback)));
    }

    let Some(leaf) = previous_leaf(document, position) else {
        return Ok(Outcome::Unchanged);
    };
    let target = closest_block(document, leaf)?;
    if is_unbreakable(document, target)
        || closest_unbreakable(document, target) != closest_unbreakable(document, block)
    {
        debug!("backspace refused: block {} is behind an unbreakable boundary", target.index());
        return Ok(Outcome::Refused(Refusal::UnbreakableBoundary));
    }
    let insert_at = line_end_index(document, target, Position::new(leaf, 0));
    match merge_blocks(
        document,
        context.normalizer,
        target,
        insert_at,
        block,
        run_start,
        Survivor::ContentWins,
    ) {
        Some(junction) => Ok(caret(junction)),
        None => Ok(Outcome::Refused(Refusal::UnbreakableBlock)),
    }
}

fn delete_forward(
    document: &mut Document,
    context: &EditContext<'_>,
    selection: &Selection,
) -> Result<Outcome> {
    if !selection.is_collapsed() {
        return delete_selection(document, context, selection);
    }
    let mut position = selection.focus;
    let block = closest_block(document, position.node)?;
    loop {
        if is_block_end(document, position, block) {
            break;
        }
        match next_unit(document, position, block) {
            Unit::Char(text, index) => {
                let position = remove_char(document, text, index);
                return Ok(caret(settle_after_char(document, context, position, block)));
            }
            Unit::Atom(node) => {
                let position = before_node(document, node).unwrap_or(position);
                document.remove(node);
                return Ok(caret(settle_after_char(document, context, position, block)));
            }
            Unit::Marker(marker) => {
                let position = before_node(document, marker).unwrap_or(position);
                document.remove(marker);
                return Ok(caret(settle_after_marker(document, context, position, block)));
            }
            Unit::Empty(node) => {
                position = before_node(document, node).unwrap_or(position);
                document.remove(node);
            }
            Unit::Boundary => break,
        }
    }
    merge_forward(document, context, position, block)
}

/// Delete at the end of a block: pull the next block's first line in.
fn merge_forward(
    document: &mut Document,
    context: &EditContext<'_>,
    position: Position,
    block: NodeId,
) -> Result<Outcome> {
    if is_editable_root(document, block) {
        return Ok(Outcome::Unchanged);
    }
    if is_unbreakable(document, block) {
        debug!("delete refused at end of unbreakable block {}", block.index());
        return Ok(Outcome::Refused(Refusal::UnbreakableBlock));
    }
    // Step over whatever is left of this block's line: empty inlines and its
    // final marker.
    let mut probe = position;
    let next = loop {
        let Some(leaf) = next_leaf(document, probe) else {
            return Ok(Outcome::Unchanged);
        };
        if closest_block(document, leaf).ok() != Some(block) {
            break leaf;
        }
        probe = match after_node(document, leaf) {
            Some(after) => after,
            None => return Ok(Outcome::Unchanged),
        };
    };
    let source = closest_block(document, next)?;
    if is_unbreakable(document, source)
        || closest_unbreakable(document, source) != closest_unbreakable(document, block)
    {
        debug!("delete refused: block {} is behind an unbreakable boundary", source.index());
        return Ok(Outcome::Refused(Refusal::UnbreakableBoundary));
    }
    let run_start = line_start_index(document, source, next);
    let insert_at = line_end_index(document, block, position);
    match merge_blocks(
        document,
        context.normalizer,
        block,
        insert_at,
        source,
        run_start,
        Survivor::ContentWins,
    ) {
        Some(junction) => Ok(caret(junction)),
        None => Ok(Outcome::Refused(Refusal::UnbreakableBlock)),
    }
}

fn delete_selection(
    document: &mut Document,
    context: &EditContext<'_>,
    selection: &Selection,
) -> Result<Outcome> {
    match delete_range(document, context.normalizer, selection.start(), selection.end())? {
        Some(position) => Ok(caret(position)),
        None => Ok(Outcome::Refused(Refusal::UnbreakableBoundary)),
    }
}

fn insert_paragraph_break(
    document: &mut Document,
    context: &EditContext<'_>,
    selection: &Selection,
) -> Result<Outcome> {
    let position = if selection.is_collapsed() {
        selection.focus
    } else {
        match delete_range(document, context.normalizer, selection.start(), selection.end())? {
            Some(position) => position,
            None => return Ok(Outcome::Refused(Refusal::UnbreakableBoundary)),
        }
    };
    Ok(caret(insert_paragraph_break_at(document, context, position)?))
}

fn insert_line_break(
    document: &mut Document,
    context: &EditContext<'_>,
    selection: &Selection,
) -> Result<Outcome> {
    let position = if selection.is_collapsed() {
        selection.focus
    } else {
        match delete_range(document, context.normalizer, selection.start(), selection.end())? {
            Some(position) => position,
            None => return Ok(Outcome::Refused(Refusal::UnbreakableBoundary)),
        }
    };
    Ok(caret(insert_line_break_at(document, position)?))
}

/// Wraps inline content sitting directly in the root around either edge of
/// the selection into paragraphs, translating the edges.
fn blockify_edges(document: &mut Document, selection: &Selection) -> Selection {
    let mut edges = [selection.anchor, selection.focus];
    for edge in edges.iter_mut() {
        if closest_block(document, edge.node).is_ok_and(|block| is_editable_root(document, block)) {
            let (_, position) = blockify(document, *edge);
            *edge = position;
        }
    }
    Selection {
        anchor: edges[0],
        focus: edges[1],
        direction: selection.direction,
    }
}

/// Blocks overlapped by the selection, in document order.
fn covered_blocks(document: &Document, selection: &Selection) -> Result<Vec<NodeId>> {
    let start = selection.start();
    let end = selection.end();
    let first = closest_block(document, start.node)?;
    let last = closest_block(document, end.node)?;
    let mut blocks = vec![first];
    if !selection.is_collapsed() {
        for leaf in document.descendants(document.root()) {
            if !document.children(leaf).is_empty() {
                continue;
            }
            let leaf_end = Position::new(leaf, document.len(leaf));
            let leaf_start = Position::new(leaf, 0);
            if document.compare_positions(leaf_end, start).is_lt()
                || document.compare_positions(leaf_start, end).is_gt()
            {
                continue;
            }
            if let Ok(block) = closest_block(document, leaf) {
                if !blocks.contains(&block) {
                    blocks.push(block);
                }
            }
        }
        if !blocks.contains(&last) {
            blocks.push(last);
        }
    }
    Ok(blocks)
}

/// Non-wrapper list items holding the covered blocks.
fn covered_items(document: &Document, selection: &Selection) -> Result<Vec<NodeId>> {
    let mut items = Vec::new();
    for block in covered_blocks(document, selection)? {
        let Ok(item) = closest_list_item(document, block) else {
            continue;
        };
        if !is_wrapper_item(document, item) && !items.contains(&item) {
            items.push(item);
        }
    }
    Ok(items)
}

/// Turns anchors taken before a restructuring back into a selection.
fn resolve_selection(document: &Document, anchors: (Anchor, Anchor), fallback: &Selection) -> Selection {
    let anchor = resolve(document, anchors.0);
    let focus = resolve(document, anchors.1);
    let fallback_position = |position: Position| {
        if document.is_attached(position.node) && position.offset <= document.len(position.node) {
            position
        } else {
            start_of(document, document.root())
        }
    };
    let anchor = anchor.or(focus).unwrap_or_else(|| fallback_position(fallback.anchor));
    let focus = focus.unwrap_or(anchor);
    Selection::new(document, anchor, focus)
}

fn toggle_list(document: &mut Document, selection: &Selection, target: ListType) -> Result<Outcome> {
    let selection = blockify_edges(document, selection);
    let anchors = (anchor(document, selection.anchor), anchor(document, selection.focus));

    let mut targets: Vec<NodeId> = Vec::new();
    for block in covered_blocks(document, &selection)? {
        let candidate = closest_list_item(document, block).unwrap_or(block);
        if is_editable_root(document, candidate)
            || (!is_list_item(document, candidate) && is_unbreakable(document, candidate))
            || is_list(document, candidate, None)
        {
            continue;
        }
        if !targets.contains(&candidate) {
            targets.push(candidate);
        }
    }
    if targets.is_empty() {
        return Ok(Outcome::Unchanged);
    }

    let already_listed = |document: &Document, node: NodeId| {
        is_list_item(document, node)
            && document
                .parent(node)
                .is_some_and(|list| list_type(document, list) == Some(target))
    };
    let convert = targets.iter().any(|&node| !already_listed(document, node));

    if convert {
        let mut touched: Vec<NodeId> = Vec::new();
        for &node in &targets {
            let list = if is_list_item(document, node) {
                let Some(list) = document.parent(node) else {
                    continue;
                };
                convert_list_type(document, list, target);
                list
            } else {
                wrap_block_in_list(document, node, target)
            };
            if !touched.contains(&list) {
                touched.push(list);
            }
        }
        for list in touched {
            if document.is_attached(list) {
                let joined = join_adjacent_lists(document, list);
                refresh_checklists_around(document, joined);
            }
        }
        debug!("converted {} block(s) into {:?} list items", targets.len(), target);
    } else {
        let roots: Vec<NodeId> = targets
            .iter()
            .filter_map(|&item| outermost_list(document, item))
            .collect();
        for &item in targets.iter().rev() {
            let mut current = item;
            while let Some(Lifted::Item(lifted)) = lift_list_item(document, current) {
                current = lifted;
            }
        }
        for list in roots {
            if document.is_attached(list) {
                refresh_checklist_states(document, list);
            }
        }
        debug!("un-listed {} item(s)", targets.len());
    }
    Ok(Outcome::Applied(resolve_selection(document, anchors, &selection)))
}

fn indent(document: &mut Document, selection: &Selection) -> Result<Outcome> {
    let items = covered_items(document, selection)?;
    if items.is_empty() {
        return Ok(Outcome::Unchanged);
    }
    let anchors = (anchor(document, selection.anchor), anchor(document, selection.focus));
    for run in sibling_runs(document, &items) {
        indent_run(document, &run);
    }
    for &item in &items {
        refresh_checklists_around(document, item);
    }
    Ok(Outcome::Applied(resolve_selection(document, anchors, selection)))
}

fn outdent(document: &mut Document, selection: &Selection) -> Result<Outcome> {
    let items = covered_items(document, selection)?;
    let anchors = (anchor(document, selection.anchor), anchor(document, selection.focus));
    let roots: Vec<NodeId> = items
        .iter()
        .filter_map(|&item| outermost_list(document, item))
        .collect();
    let mut changed = false;
    for &item in items.iter().rev() {
        let Some(list) = document.parent(item) else {
            continue;
        };
        let Some(container) = document.parent(list) else {
            continue;
        };
        let nested = is_list_item(document, container);
        if !nested && document.children(list).len() > 1 {
            debug!("outdent: item {} already at the top level", item.index());
            continue;
        }
        if lift_list_item(document, item).is_some() {
            changed = true;
        }
    }
    if !changed {
        return Ok(Outcome::Unchanged);
    }
    for list in roots {
        if document.is_attached(list) {
            refresh_checklist_states(document, list);
        }
    }
    Ok(Outcome::Applied(resolve_selection(document, anchors, selection)))
}

fn toggle_checked(document: &mut Document, selection: &Selection) -> Result<Outcome> {
    let items: Vec<NodeId> = covered_items(document, selection)?
        .into_iter()
        .filter(|&item| {
            document
                .parent(item)
                .is_some_and(|list| is_list(document, list, Some(ListType::Checklist)))
        })
        .collect();
    if items.is_empty() {
        return Ok(Outcome::Unchanged);
    }
    let check = !items.iter().all(|&item| is_checked(document, item));
    for &item in &items {
        set_item_checked(document, item, check);
    }
    debug!("set {} checklist item(s) to checked = {}", items.len(), check);
    Ok(Outcome::Applied(*selection))
}

const TEXT_ALIGN: &str = "text-align";

/// Sets the alignment of every covered block. Inline content in the root is
/// wrapped into a paragraph first.
fn align(document: &mut Document, selection: &Selection, alignment: Alignment) -> Result<Outcome> {
    let selection = blockify_edges(document, selection);
    let mode = alignment.css_value();
    let mut changed = 0;
    for block in covered_blocks(document, &selection)? {
        if is_editable_root(document, block) || is_list(document, block, None) {
            continue;
        }
        if document.attrs(block).style(TEXT_ALIGN) != Some(mode) {
            document.attrs_mut(block).set_style(TEXT_ALIGN, mode);
            changed += 1;
        }
    }
    if changed == 0 {
        return Ok(Outcome::Unchanged);
    }
    debug!("aligned {} block(s) to {}", changed, mode);
    Ok(Outcome::Applied(selection))
}

/// Owns a document and a selection and applies commands to them the way a
/// host would: one operation at a time, each followed by the sanitizer pass.
pub struct DocumentEditor {
    document: Document,
    selection: Selection,
    config: EditorConfig,
    normalizer: Box<dyn TextNormalizer>,
    sanitizer: Box<dyn Sanitizer>,
}

impl DocumentEditor {
    pub fn new(document: Document, selection: Selection) -> Self {
        Self {
            document,
            selection,
            config: EditorConfig::default(),
            normalizer: Box::new(WhitespaceNormalizer),
            sanitizer: Box::new(SimilarElementSanitizer),
        }
    }

    pub fn with_config(mut self, config: EditorConfig) -> Self {
        if !config.nbsp_at_boundaries {
            self.normalizer = Box::new(VerbatimNormalizer);
        }
        self.config = config;
        self
    }

    pub fn with_normalizer(mut self, normalizer: Box<dyn TextNormalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_sanitizer(mut self, sanitizer: Box<dyn Sanitizer>) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn set_selection(&mut self, selection: Selection) -> Result<()> {
        validate_selection(&self.document, &selection)?;
        self.selection = selection;
        Ok(())
    }

    pub fn into_parts(self) -> (Document, Selection) {
        (self.document, self.selection)
    }

    /// Applies `command`. Returns whether the document changed.
    pub fn execute(&mut self, command: Command) -> Result<bool> {
        let context = EditContext::new(&self.config, self.normalizer.as_ref());
        match apply(&mut self.document, &self.selection, command, &context)? {
            Outcome::Applied(selection) => {
                self.selection = selection;
                if self.config.sanitize_after_edit {
                    self.sanitize();
                }
                Ok(true)
            }
            Outcome::Unchanged => Ok(false),
            Outcome::Refused(reason) => {
                debug!("{} refused: {:?}", command, reason);
                Ok(false)
            }
        }
    }

    fn sanitize(&mut self) {
        let focus = self.selection.focus.node;
        self.sanitizer
            .merge_similar_adjacent_elements(&mut self.document, focus, &mut self.selection);
        let anchor = self.selection.anchor.node;
        if anchor != self.selection.focus.node && self.document.is_attached(anchor) {
            self.sanitizer
                .merge_similar_adjacent_elements(&mut self.document, anchor, &mut self.selection);
        }
    }

    pub fn delete_backward(&mut self) -> Result<bool> {
        self.execute(Command::DeleteBackward)
    }

    pub fn delete_forward(&mut self) -> Result<bool> {
        self.execute(Command::DeleteForward)
    }

    pub fn insert_paragraph_break(&mut self) -> Result<bool> {
        self.execute(Command::InsertParagraphBreak)
    }

    pub fn insert_line_break(&mut self) -> Result<bool> {
        self.execute(Command::InsertLineBreak)
    }

    pub fn toggle_list(&mut self, target: ListType) -> Result<bool> {
        self.execute(Command::ToggleList(target))
    }

    pub fn indent(&mut self) -> Result<bool> {
        self.execute(Command::Indent)
    }

    pub fn outdent(&mut self) -> Result<bool> {
        self.execute(Command::Outdent)
    }

    pub fn toggle_checked(&mut self) -> Result<bool> {
        self.execute(Command::ToggleChecked)
    }

    pub fn align(&mut self, alignment: Alignment) -> Result<bool> {
        self.execute(Command::Align(alignment))
    }
}

#[cfg(test)]
#[path = "editor_tests.rs"]
mod editor_tests;



#[cfg(test)]
#[path = "editor/structure_tests.rs"]
mod structure_tests;
