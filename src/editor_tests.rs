use crate::notation::{parse_with_selection, serialize};

use super::*;

fn editor_for(fixture: &str) -> DocumentEditor {
    let (document, selection) = parse_with_selection(fixture).unwrap();
    DocumentEditor::new(document, selection)
}

fn shown(editor: &DocumentEditor) -> String {
    serialize(editor.document(), Some(&editor.selection()))
}

fn run(fixture: &str, command: Command) -> String {
    let mut editor = editor_for(fixture);
    editor.execute(command).unwrap();
    shown(&editor)
}

fn assert_edit(before: &str, command: Command, after: &str) {
    assert_eq!(run(before, command), after, "{} on {}", command, before);
}

fn outcome_of(fixture: &str, command: Command) -> Outcome {
    let (mut document, selection) = parse_with_selection(fixture).unwrap();
    let config = EditorConfig::default();
    let context = EditContext::new(&config, &WhitespaceNormalizer);
    apply(&mut document, &selection, command, &context).unwrap()
}

#[test]
fn backspace_removes_previous_character() {
    assert_edit("<p>ab[]cd</p>", Command::DeleteBackward, "<p>a[]cd</p>");
}

#[test]
fn backspace_at_document_start_is_a_no_op() {
    assert_edit("<p>[]abc</p>", Command::DeleteBackward, "<p>[]abc</p>");
    assert_eq!(
        outcome_of("<p>[]abc</p>", Command::DeleteBackward),
        Outcome::Unchanged
    );
}

#[test]
fn backspace_merges_paragraphs() {
    assert_edit("<p>ab</p><p>[]cd</p>", Command::DeleteBackward, "<p>ab[]cd</p>");
}

#[test]
fn backspace_on_last_character_leaves_marker() {
    assert_edit("<p>a[]</p>", Command::DeleteBackward, "<p>[]<br></p>");
}

#[test]
fn backspace_keeps_trailing_space_visible() {
    assert_edit("<p>ab c[]</p>", Command::DeleteBackward, "<p>ab&nbsp;[]</p>");
}

#[test]
fn backspace_doubles_marker_that_becomes_trailing() {
    assert_edit("<p>ab<br>c[]</p>", Command::DeleteBackward, "<p>ab<br>[]<br></p>");
}

#[test]
fn backspace_after_double_marker_collapses_line() {
    assert_edit("<p>ab<br>[]<br></p>", Command::DeleteBackward, "<p>ab[]</p>");
}

#[test]
fn backspace_drops_empty_paragraph_into_heading() {
    assert_edit("<h1>ab</h1><p>[]<br></p>", Command::DeleteBackward, "<h1>ab[]</h1>");
}

#[test]
fn empty_block_takes_identity_of_merged_content() {
    assert_edit("<p><br></p><h1>[]ab</h1>", Command::DeleteBackward, "<h1>[]ab</h1>");
}

#[test]
fn backspace_in_single_empty_item_degenerates_to_paragraph() {
    assert_edit("<ul><li>[]<br></li></ul>", Command::DeleteBackward, "<p>[]<br></p>");
}

#[test]
fn backspace_at_first_item_lifts_it_out_of_the_list() {
    assert_edit(
        "<ul><li>[]ab</li><li>cd</li></ul>",
        Command::DeleteBackward,
        "<p>[]ab</p><ul><li>cd</li></ul>",
    );
}

#[test]
fn backspace_at_first_nested_item_outdents() {
    assert_edit(
        "<ul><li>a</li><li style=\"list-style: none;\"><ul><li>[]b</li><li>c</li></ul></li></ul>",
        Command::DeleteBackward,
        "<ul><li>a</li><li>[]b</li><li style=\"list-style: none;\"><ul><li>c</li></ul></li></ul>",
    );
}

#[test]
fn backspace_merges_list_items() {
    assert_edit(
        "<ul><li>ab</li><li>[]cd</li></ul>",
        Command::DeleteBackward,
        "<ul><li>ab[]cd</li></ul>",
    );
}

#[test]
fn removing_separator_rejoins_sibling_lists() {
    assert_edit(
        "<ul><li>a</li></ul><p>[]<br></p><ul><li>b</li></ul>",
        Command::DeleteBackward,
        "<ul><li>a[]</li><li>b</li></ul>",
    );
}

#[test]
fn backspace_refuses_to_leave_table_cell() {
    let fixture = "<table><tbody><tr><td>ab</td><td>[]cd</td></tr></tbody></table>";
    assert_edit(fixture, Command::DeleteBackward, fixture);
    assert_eq!(
        outcome_of(fixture, Command::DeleteBackward),
        Outcome::Refused(Refusal::UnbreakableBlock)
    );
}

#[test]
fn backspace_refuses_to_merge_into_unbreakable_region() {
    let fixture = "<div t=\"1\"><p>ab</p></div><p>[]cd</p>";
    assert_eq!(
        outcome_of(fixture, Command::DeleteBackward),
        Outcome::Refused(Refusal::UnbreakableBoundary)
    );
    assert_edit(fixture, Command::DeleteBackward, fixture);
}

#[test]
fn backspace_over_range_merges_edge_blocks_once() {
    assert_edit("<p>a[b</p><p>c]d</p>", Command::DeleteBackward, "<p>a[]d</p>");
}

#[test]
fn backspace_over_range_inside_text() {
    assert_edit("<p>a[bc]d</p>", Command::DeleteBackward, "<p>a[]d</p>");
}

#[test]
fn range_across_list_items_keeps_one_item() {
    assert_edit(
        "<ul><li>a[b</li><li>c]d</li></ul>",
        Command::DeleteBackward,
        "<ul><li>a[]d</li></ul>",
    );
}

#[test]
fn delete_removes_next_character() {
    assert_edit("<p>a[]bc</p>", Command::DeleteForward, "<p>a[]c</p>");
}

#[test]
fn delete_at_block_end_pulls_next_block_in() {
    assert_edit("<p>ab[]</p><p>cd</p>", Command::DeleteForward, "<p>ab[]cd</p>");
}

#[test]
fn delete_at_document_end_is_a_no_op() {
    assert_eq!(outcome_of("<p>ab[]</p>", Command::DeleteForward), Outcome::Unchanged);
}

#[test]
fn delete_steps_through_double_marker() {
    assert_edit("<p>ab[]<br><br></p>", Command::DeleteForward, "<p>ab[]</p>");
}

#[test]
fn delete_in_empty_paragraph_adopts_heading() {
    assert_edit("<p>[]<br></p><h1>ab</h1>", Command::DeleteForward, "<h1>[]ab</h1>");
}

#[test]
fn delete_pulls_first_item_out_of_following_list() {
    assert_edit(
        "<p>ab[]</p><ul><li>cd</li><li>ef</li></ul>",
        Command::DeleteForward,
        "<p>ab[]cd</p><ul><li>ef</li></ul>",
    );
}

#[test]
fn enter_splits_paragraph() {
    assert_edit("<p>ab[]cd</p>", Command::InsertParagraphBreak, "<p>ab</p><p>[]cd</p>");
}

#[test]
fn enter_duplicates_open_format() {
    assert_edit(
        "<p><b>ab[]cd</b></p>",
        Command::InsertParagraphBreak,
        "<p><b>ab</b></p><p><b>[]cd</b></p>",
    );
}

#[test]
fn enter_marks_spaces_at_new_boundaries() {
    assert_edit(
        "<p>ab []cd</p>",
        Command::InsertParagraphBreak,
        "<p>ab&nbsp;</p><p>[]cd</p>",
    );
    assert_edit(
        "<p>ab[] cd</p>",
        Command::InsertParagraphBreak,
        "<p>ab</p><p>[]&nbsp;cd</p>",
    );
}

#[test]
fn enter_at_block_start_inserts_empty_block_before() {
    assert_edit("<p>[]ab</p>", Command::InsertParagraphBreak, "<p>[]<br></p><p>ab</p>");
}

#[test]
fn enter_at_heading_end_continues_with_paragraph() {
    assert_edit("<h1>ab[]</h1>", Command::InsertParagraphBreak, "<h1>ab</h1><p>[]<br></p>");
}

#[test]
fn enter_at_heading_end_can_keep_heading() {
    let config = EditorConfig {
        heading_break_creates_paragraph: false,
        ..EditorConfig::default()
    };
    let mut editor = editor_for("<h1>ab[]</h1>").with_config(config);
    assert!(editor.insert_paragraph_break().unwrap());
    assert_eq!(shown(&editor), "<h1>ab</h1><h1>[]<br></h1>");
}

#[test]
fn enter_in_checked_item_creates_unchecked_item() {
    assert_edit(
        "<ul class=\"checklist\"><li class=\"checked\">ab[]</li></ul>",
        Command::InsertParagraphBreak,
        "<ul class=\"checklist\"><li class=\"checked\">ab</li><li class=\"unchecked\">[]<br></li></ul>",
    );
}

#[test]
fn enter_in_empty_last_item_leaves_the_list() {
    assert_edit(
        "<ul><li>ab</li><li>[]<br></li></ul>",
        Command::InsertParagraphBreak,
        "<ul><li>ab</li></ul><p>[]<br></p>",
    );
}

#[test]
fn enter_in_preformatted_inserts_line_break() {
    assert_edit("<pre>ab[]cd</pre>", Command::InsertParagraphBreak, "<pre>ab<br>[]cd</pre>");
    assert_edit("<pre>ab[]</pre>", Command::InsertParagraphBreak, "<pre>ab</pre><p>[]<br></p>");
}

#[test]
fn enter_in_unbreakable_block_places_paragraph_beside_it() {
    assert_edit(
        "<div t=\"1\">ab[]</div>",
        Command::InsertParagraphBreak,
        "<div t=\"1\">ab</div><p>[]<br></p>",
    );
}

#[test]
fn enter_in_table_cell_breaks_the_line() {
    assert_edit(
        "<table><tr><td>ab[]cd</td></tr></table>",
        Command::InsertParagraphBreak,
        "<table><tr><td>ab<br>[]cd</td></tr></table>",
    );
    assert_edit(
        "<table><tbody><tr><td>ab[]</td></tr></tbody></table>",
        Command::InsertParagraphBreak,
        "<table><tbody><tr><td>ab<br>[]<br></td></tr></tbody></table>",
    );
}

#[test]
fn enter_in_unbreakable_block_inside_cell_stays_in_cell() {
    assert_edit(
        "<table><tr><td><p t=\"1\">ab[]</p></td></tr></table>",
        Command::InsertParagraphBreak,
        "<table><tr><td><p t=\"1\">ab</p><p>[]<br></p></td></tr></table>",
    );
}

#[test]
fn enter_in_unbreakable_row_breaks_the_line() {
    assert_edit(
        "<table><tr t=\"1\">ab[]</tr></table>",
        Command::InsertParagraphBreak,
        "<table><tr t=\"1\">ab<br>[]<br></tr></table>",
    );
}

#[test]
fn enter_over_range_deletes_then_splits() {
    assert_edit(
        "<p>a[b</p><p>c]d</p>",
        Command::InsertParagraphBreak,
        "<p>a</p><p>[]d</p>",
    );
}

#[test]
fn enter_wraps_root_inline_content_into_paragraph() {
    assert_edit("ab[]cd", Command::InsertParagraphBreak, "<p>ab</p><p>[]cd</p>");
}

#[test]
fn line_break_in_middle_of_text() {
    assert_edit("<p>a[]b</p>", Command::InsertLineBreak, "<p>a<br>[]b</p>");
}

#[test]
fn line_break_at_block_end_is_doubled() {
    assert_edit("<p>ab[]</p>", Command::InsertLineBreak, "<p>ab<br>[]<br></p>");
}

#[test]
fn toggle_list_wraps_paragraph() {
    assert_edit(
        "<p>a[]b</p>",
        Command::ToggleList(ListType::Unordered),
        "<ul><li>a[]b</li></ul>",
    );
}

#[test]
fn toggle_list_drops_marker_style_of_old_type() {
    assert_edit(
        "<ul><li style=\"list-style-type: square;\">a[]</li></ul>",
        Command::ToggleList(ListType::Ordered),
        "<ol><li>a[]</li></ol>",
    );
}

#[test]
fn toggle_list_unwraps_item_of_same_type() {
    assert_edit(
        "<ul><li>a[]b</li></ul>",
        Command::ToggleList(ListType::Unordered),
        "<p>a[]b</p>",
    );
}

#[test]
fn toggle_list_converts_other_type() {
    assert_edit(
        "<ul><li>a[]b</li><li>cd</li></ul>",
        Command::ToggleList(ListType::Ordered),
        "<ol><li>a[]b</li><li>cd</li></ol>",
    );
}

#[test]
fn toggle_checklist_creates_unchecked_items() {
    assert_edit(
        "<p>a[]b</p>",
        Command::ToggleList(ListType::Checklist),
        "<ul class=\"checklist\"><li class=\"unchecked\">a[]b</li></ul>",
    );
}

#[test]
fn converting_checklist_discards_checked_state() {
    assert_edit(
        "<ul class=\"checklist\"><li class=\"checked\">a[]b</li></ul>",
        Command::ToggleList(ListType::Unordered),
        "<ul><li>a[]b</li></ul>",
    );
}

#[test]
fn toggle_list_absorbs_paragraph_between_lists() {
    assert_edit(
        "<ol><li>a[b</li></ol><p>cd</p><ol><li>e]f</li></ol>",
        Command::ToggleList(ListType::Ordered),
        "<ol><li>a[b</li><li>cd</li><li>e]f</li></ol>",
    );
}

#[test]
fn toggle_list_over_range_builds_one_list() {
    assert_edit(
        "<p>a[b</p><p>c]d</p>",
        Command::ToggleList(ListType::Ordered),
        "<ol><li>a[b</li><li>c]d</li></ol>",
    );
    assert_edit(
        "<ol><li>a[b</li><li>c]d</li></ol>",
        Command::ToggleList(ListType::Ordered),
        "<p>a[b</p><p>c]d</p>",
    );
}

#[test]
fn toggle_list_keeps_heading_inside_item() {
    assert_edit(
        "<h1>a[]b</h1>",
        Command::ToggleList(ListType::Unordered),
        "<ul><li><h1>a[]b</h1></li></ul>",
    );
    assert_edit(
        "<ul><li><h1>a[]b</h1></li></ul>",
        Command::ToggleList(ListType::Unordered),
        "<h1>a[]b</h1>",
    );
}

#[test]
fn indent_creates_wrapper_item() {
    assert_edit(
        "<ul><li>ab</li><li>c[]d</li></ul>",
        Command::Indent,
        "<ul><li>ab</li><li style=\"list-style: none;\"><ul><li>c[]d</li></ul></li></ul>",
    );
}

#[test]
fn indent_joins_preceding_wrapper() {
    assert_edit(
        "<ul><li>a</li><li style=\"list-style: none;\"><ul><li>b</li></ul></li><li>c[]</li></ul>",
        Command::Indent,
        "<ul><li>a</li><li style=\"list-style: none;\"><ul><li>b</li><li>c[]</li></ul></li></ul>",
    );
}

#[test]
fn indent_outside_list_is_a_no_op() {
    assert_eq!(outcome_of("<p>a[]b</p>", Command::Indent), Outcome::Unchanged);
}

#[test]
fn outdent_promotes_nested_item() {
    assert_edit(
        "<ul><li>ab</li><li style=\"list-style:none;\"><ul><li>c[d</li></ul></li></ul>",
        Command::Outdent,
        "<ul><li>ab</li><li>c[]d</li></ul>",
    );
}

#[test]
fn outdent_of_top_level_item_is_a_no_op() {
    assert_eq!(
        outcome_of("<ul><li>a[]</li><li>b</li></ul>", Command::Outdent),
        Outcome::Unchanged
    );
}

#[test]
fn outdent_of_sole_item_degenerates_to_paragraph() {
    assert_edit("<ul><li>a[]b</li></ul>", Command::Outdent, "<p>a[]b</p>");
}

#[test]
fn indent_in_checklist_derives_wrapper_state() {
    assert_edit(
        "<ul class=\"checklist\"><li class=\"checked\">a</li><li class=\"checked\">b[]</li></ul>",
        Command::Indent,
        "<ul class=\"checklist\"><li class=\"checked\">a</li><li class=\"checked\" style=\"list-style: none;\"><ul class=\"checklist\"><li class=\"checked\">b[]</li></ul></li></ul>",
    );
}

#[test]
fn toggle_checked_propagates_to_wrapper() {
    assert_edit(
        "<ul class=\"checklist\"><li class=\"unchecked\">a</li><li class=\"unchecked\" style=\"list-style: none;\"><ul class=\"checklist\"><li class=\"unchecked\">b[]</li></ul></li></ul>",
        Command::ToggleChecked,
        "<ul class=\"checklist\"><li class=\"unchecked\">a</li><li class=\"checked\" style=\"list-style: none;\"><ul class=\"checklist\"><li class=\"checked\">b[]</li></ul></li></ul>",
    );
}

#[test]
fn toggle_checked_unchecks_when_all_checked() {
    assert_edit(
        "<ul class=\"checklist\"><li class=\"checked\">a[b</li><li class=\"checked\">c]d</li></ul>",
        Command::ToggleChecked,
        "<ul class=\"checklist\"><li class=\"unchecked\">a[b</li><li class=\"unchecked\">c]d</li></ul>",
    );
}

#[test]
fn toggle_checked_outside_checklist_is_a_no_op() {
    assert_eq!(
        outcome_of("<ul><li>a[]</li></ul>", Command::ToggleChecked),
        Outcome::Unchanged
    );
}

#[test]
fn invalid_selection_is_an_error() {
    let (mut document, selection) = parse_with_selection("<p>[]ab</p>").unwrap();
    let bad = Selection::caret(Position::new(selection.focus.node, 10));
    let config = EditorConfig::default();
    let context = EditContext::new(&config, &WhitespaceNormalizer);
    let result = apply(&mut document, &bad, Command::DeleteBackward, &context);
    assert!(matches!(result, Err(Error::InvalidSelection(_))));
}

#[test]
fn detached_selection_is_rejected_by_editor() {
    let mut editor = editor_for("<p>ab</p><p>[]cd</p>");
    assert!(editor.delete_backward().unwrap());
    let (mut document, selection) = editor.into_parts();
    let stray = document.create_text("x");
    let mut editor = DocumentEditor::new(document, selection);
    assert!(editor.set_selection(Selection::caret(Position::new(stray, 0))).is_err());
}

#[test]
fn verbatim_normalizer_keeps_plain_spaces() {
    let config = EditorConfig {
        nbsp_at_boundaries: false,
        ..EditorConfig::default()
    };
    let mut editor = editor_for("<p>ab c[]</p>").with_config(config);
    assert!(editor.delete_backward().unwrap());
    assert_eq!(shown(&editor), "<p>ab []</p>");
}

#[test]
fn sanitizer_merges_similar_formats() {
    let (mut document, mut selection) = parse_with_selection("<p><b>a</b><b>b[]</b></p>").unwrap();
    SimilarElementSanitizer.merge_similar_adjacent_elements(&mut document, selection.focus.node, &mut selection);
    assert_eq!(serialize(&document, Some(&selection)), "<p><b>ab[]</b></p>");
}

#[test]
fn sanitizer_keeps_distinct_attributes_apart() {
    let fixture = "<p><span class=\"x\">a</span><span class=\"y\">b[]</span></p>";
    let (mut document, mut selection) = parse_with_selection(fixture).unwrap();
    SimilarElementSanitizer.merge_similar_adjacent_elements(&mut document, selection.focus.node, &mut selection);
    assert_eq!(serialize(&document, Some(&selection)), fixture);
}

#[test]
fn command_names_round_trip() {
    for command in [
        Command::DeleteBackward,
        Command::DeleteForward,
        Command::InsertParagraphBreak,
        Command::InsertLineBreak,
        Command::ToggleList(ListType::Checklist),
        Command::Indent,
        Command::Outdent,
        Command::ToggleChecked,
        Command::Align(Alignment::Justify),
    ] {
        assert_eq!(command.to_string().parse::<Command>(), Ok(command));
    }
    assert_eq!("toggle-list=ol".parse::<Command>(), Ok(Command::ToggleList(ListType::Ordered)));
    assert!("toggle-list=dl".parse::<Command>().is_err());
    assert!("align=middle".parse::<Command>().is_err());
}

#[test]
fn align_sets_text_align_on_caret_block() {
    assert_edit(
        "<p>a[]b</p><p>cd</p>",
        Command::Align(Alignment::Center),
        "<p style=\"text-align: center;\">a[]b</p><p>cd</p>",
    );
}

#[test]
fn align_covers_every_block_in_range() {
    assert_edit(
        "<p>a[b</p><ul><li>c]d</li></ul>",
        Command::Align(Alignment::Right),
        "<p style=\"text-align: right;\">a[b</p><ul><li style=\"text-align: right;\">c]d</li></ul>",
    );
}

#[test]
fn align_replaces_previous_mode() {
    assert_edit(
        "<h2 style=\"color: red; text-align: left;\">a[]b</h2>",
        Command::Align(Alignment::Justify),
        "<h2 style=\"color: red; text-align: justify;\">a[]b</h2>",
    );
    assert_eq!(
        outcome_of("<p style=\"text-align: center;\">a[]b</p>", Command::Align(Alignment::Center)),
        Outcome::Unchanged
    );
}

#[test]
fn align_wraps_loose_root_text() {
    assert_edit(
        "ab[]",
        Command::Align(Alignment::Left),
        "<p style=\"text-align: left;\">ab[]</p>",
    );
}

#[test]
fn split_then_merge_restores_content() {
    let mut editor = editor_for("<p>ab[]cd</p>");
    assert!(editor.insert_paragraph_break().unwrap());
    assert!(editor.delete_backward().unwrap());
    assert_eq!(shown(&editor), "<p>ab[]cd</p>");
}

#[test]
fn merge_then_split_restores_blocks() {
    for fixture in ["<p>ab</p><p>[]cd</p>", "<p>a<b>b</b></p><p><i>[]c</i>d</p>"] {
        let mut editor = editor_for(fixture);
        assert!(editor.delete_backward().unwrap());
        assert!(editor.insert_paragraph_break().unwrap());
        assert_eq!(shown(&editor), fixture);
    }
}

#[test]
fn enter_after_line_break_drops_the_spent_marker() {
    assert_edit("<p>ab<br>[]cd</p>", Command::InsertParagraphBreak, "<p>ab</p><p>[]cd</p>");
}

#[test]
fn deleting_last_line_keeps_it_visible() {
    assert_edit("<p>ab<br>[cd]</p>", Command::DeleteBackward, "<p>ab<br>[]<br></p>");
}

#[test]
fn merging_nested_items_rederives_wrapper_state() {
    assert_edit(
        "<ul class=\"checklist\"><li class=\"unchecked\" style=\"list-style: none;\"><ul class=\"checklist\">\
         <li class=\"checked\">b</li><li class=\"unchecked\">[]c</li></ul></li></ul>",
        Command::DeleteBackward,
        "<ul class=\"checklist\"><li class=\"checked\" style=\"list-style: none;\"><ul class=\"checklist\">\
         <li class=\"checked\">b[]c</li></ul></li></ul>",
    );
}

mod invariants {
    use crate::document::{Document, ListType, NodeId, NodeKind};
    use crate::notation::serialize;

    use super::super::inspect::{
        has_block_children, has_visible_content, is_block, is_checked, is_editable_root, is_list,
        is_list_item, is_visible_empty_marker, is_void_inline, is_wrapper_item, list_type,
        wrapper_list, CHECKED_CLASS, UNCHECKED_CLASS,
    };
    use super::super::{Alignment, Command};
    use super::editor_for;

    const FIXTURES: &[&str] = &[
        "<p>ab[]cd</p><p>ef</p>",
        "<p>ab</p><p>[]cd</p>",
        "<p>ab<br>[]<br></p><p>cd</p>",
        "<p>a[]b<br><br></p>",
        "<ul><li>a</li><li style=\"list-style: none;\"><ul><li>b[]</li><li>c</li></ul></li><li>d</li></ul>",
        "<ul class=\"checklist\"><li class=\"checked\">a</li>\
         <li class=\"unchecked\" style=\"list-style: none;\"><ul class=\"checklist\">\
         <li class=\"checked\">b</li><li class=\"unchecked\">[]c</li></ul></li></ul>",
        "<ul><li>a[]</li></ul><ol><li>b</li></ol><p>c</p>",
        "<ol><li>a[b</li></ol><p>cd</p><ol><li>e]f</li></ol>",
        "<h2>[]<br></h2><p>ab</p>",
        "<ul><li>[]<br></li></ul>",
        "<table><tbody><tr><td>a[]b</td><td>c</td></tr></tbody></table>",
        "<p>x</p><blockquote>a[b</blockquote>\
         <ul class=\"checklist\"><li class=\"unchecked\">c]d</li></ul>",
    ];

    const COMMANDS: &[Command] = &[
        Command::DeleteBackward,
        Command::DeleteForward,
        Command::InsertParagraphBreak,
        Command::InsertLineBreak,
        Command::ToggleList(ListType::Unordered),
        Command::ToggleList(ListType::Ordered),
        Command::ToggleList(ListType::Checklist),
        Command::Indent,
        Command::Outdent,
        Command::ToggleChecked,
        Command::Align(Alignment::Center),
    ];

    /// Blocks that hold inline lines only.
    fn is_line_block(document: &Document, node: NodeId) -> bool {
        is_block(document, node)
            && !is_list(document, node, None)
            && !has_block_children(document, node)
    }

    /// Markers and visible leaves of a line block, in order.
    fn visible_leaves(document: &Document, block: NodeId) -> Vec<NodeId> {
        document
            .descendants(block)
            .into_iter()
            .filter(|&node| match document.kind(node) {
                NodeKind::Text(_) => has_visible_content(document, node),
                NodeKind::LineBreak => true,
                _ => is_void_inline(document, node),
            })
            .collect()
    }

    /// Every line renders, and no marker trails real content on its own.
    fn check_markers(document: &Document, block: NodeId, label: &str) {
        let leaves = visible_leaves(document, block);
        assert!(!leaves.is_empty(), "{}: block {} renders nothing", label, block.index());
        if let [.., before, last] = leaves.as_slice() {
            assert!(
                !is_visible_empty_marker(document, *last) || is_visible_empty_marker(document, *before),
                "{}: orphan marker in block {}",
                label,
                block.index()
            );
        }
    }

    fn check_list(document: &Document, list: NodeId, label: &str) {
        let items = document.children(list);
        assert!(!items.is_empty(), "{}: empty list {}", label, list.index());
        let checklist = is_list(document, list, Some(ListType::Checklist));
        for &item in items {
            assert!(is_list_item(document, item), "{}: list {} holds a non-item", label, list.index());
            if is_wrapper_item(document, item) {
                continue;
            }
            let attrs = document.attrs(item);
            let states = [CHECKED_CLASS, UNCHECKED_CLASS]
                .iter()
                .filter(|class| attrs.has_class(class))
                .count();
            let expected = if checklist { 1 } else { 0 };
            assert_eq!(states, expected, "{}: item {} state classes", label, item.index());
        }
        if let Some(previous) = document.previous_sibling(list) {
            assert!(
                list_type(document, previous) != list_type(document, list),
                "{}: adjacent lists of one type at {}",
                label,
                list.index()
            );
        }
    }

    /// All leaf items below `list`, or `None` when a non-checklist list is
    /// part of the subtree.
    fn checklist_leaves(document: &Document, list: NodeId) -> Option<Vec<NodeId>> {
        if !is_list(document, list, Some(ListType::Checklist)) {
            return None;
        }
        let mut leaves = Vec::new();
        for &item in document.children(list) {
            match wrapper_list(document, item) {
                Some(nested) => leaves.extend(checklist_leaves(document, nested)?),
                None => leaves.push(item),
            }
        }
        Some(leaves)
    }

    fn check_wrapper(document: &Document, wrapper: NodeId, label: &str) {
        let Some(nested) = wrapper_list(document, wrapper) else {
            return;
        };
        let Some(leaves) = checklist_leaves(document, nested) else {
            return;
        };
        let derived = leaves.iter().all(|&leaf| is_checked(document, leaf));
        assert_eq!(
            is_checked(document, wrapper),
            derived,
            "{}: wrapper {} disagrees with its items",
            label,
            wrapper.index()
        );
    }

    /// Walks the whole tree and checks the structural rules every edit must
    /// leave behind.
    pub(super) fn assert_well_formed(document: &Document, label: &str) {
        let label = format!("{} => {}", label, serialize(document, None));
        for node in document.descendants(document.root()) {
            for &child in document.children(node) {
                assert_eq!(document.parent(child), Some(node), "{}: broken parent link", label);
            }
            if is_editable_root(document, node) {
                continue;
            }
            if is_list(document, node, None) {
                check_list(document, node, &label);
            } else if is_wrapper_item(document, node) {
                check_wrapper(document, node, &label);
            } else if is_line_block(document, node) {
                check_markers(document, node, &label);
            }
        }
    }

    #[test]
    fn fixtures_are_well_formed() {
        for fixture in FIXTURES {
            assert_well_formed(editor_for(fixture).document(), fixture);
        }
    }

    #[test]
    fn every_command_keeps_the_tree_well_formed() {
        for fixture in FIXTURES {
            for &command in COMMANDS {
                let mut editor = editor_for(fixture);
                editor.execute(command).unwrap();
                assert_well_formed(editor.document(), &format!("{} on {}", command, fixture));
            }
        }
    }

    #[test]
    fn editing_sessions_keep_the_tree_well_formed() {
        let script = [
            Command::InsertParagraphBreak,
            Command::InsertLineBreak,
            Command::Indent,
            Command::ToggleList(ListType::Checklist),
            Command::ToggleChecked,
            Command::Outdent,
            Command::DeleteBackward,
            Command::DeleteBackward,
            Command::DeleteForward,
        ];
        for fixture in [FIXTURES[0], FIXTURES[5], FIXTURES[6]] {
            let mut editor = editor_for(fixture);
            for (step, &command) in script.iter().enumerate() {
                editor.execute(command).unwrap();
                assert_well_formed(editor.document(), &format!("step {} ({}) of {}", step, command, fixture));
            }
        }
    }
}
