use crate::notation::{parse, serialize};

use super::structure::{join_lists, rejoin_lists_at, remove_with_empty_ancestors};
use super::*;

fn doc(source: &str) -> Document {
    parse(source).unwrap().0
}

fn at(document: &Document, path: &[usize]) -> NodeId {
    path.iter().fold(document.root(), |node, &index| {
        document.child(node, index).unwrap()
    })
}

fn shown(document: &Document) -> String {
    serialize(document, None)
}

#[test]
fn adjacent_lists_of_same_type_join() {
    let mut document = doc("<ul><li>a</li></ul><ul><li>b</li></ul><ul><li>c</li></ul>");
    let middle = at(&document, &[1]);
    let survivor = join_adjacent_lists(&mut document, middle);
    assert_eq!(survivor, at(&document, &[0]));
    assert_eq!(shown(&document), "<ul><li>a</li><li>b</li><li>c</li></ul>");
}

#[test]
fn lists_of_different_type_stay_apart() {
    let mut document = doc("<ul><li>a</li></ul><ol><li>b</li></ol>");
    let second = at(&document, &[1]);
    join_adjacent_lists(&mut document, second);
    assert_eq!(shown(&document), "<ul><li>a</li></ul><ol><li>b</li></ol>");
}

#[test]
fn joining_rejoins_wrappers_at_junction() {
    let mut document = doc(
        "<ul><li>a</li><li style=\"list-style: none;\"><ul><li>b</li></ul></li></ul>\
         <ul><li style=\"list-style: none;\"><ul><li>c</li></ul></li></ul>",
    );
    let (first, second) = (at(&document, &[0]), at(&document, &[1]));
    join_lists(&mut document, first, second);
    assert_eq!(
        shown(&document),
        "<ul><li>a</li><li style=\"list-style: none;\"><ul><li>b</li><li>c</li></ul></li></ul>"
    );
}

#[test]
fn rejoin_requires_two_lists() {
    let mut document = doc("<ul><li>a</li></ul><p>x</p><ul><li>b</li></ul>");
    let root = document.root();
    assert!(!rejoin_lists_at(&mut document, root, 1));
    let separator = at(&document, &[1]);
    document.remove(separator);
    assert!(rejoin_lists_at(&mut document, root, 1));
    assert_eq!(shown(&document), "<ul><li>a</li><li>b</li></ul>");
}

#[test]
fn paragraph_dissolves_into_new_item() {
    let mut document = doc("<p>ab</p>");
    let paragraph = at(&document, &[0]);
    wrap_block_in_list(&mut document, paragraph, ListType::Ordered);
    assert_eq!(shown(&document), "<ol><li>ab</li></ol>");
}

#[test]
fn other_blocks_stay_inside_new_item() {
    let mut document = doc("<blockquote>ab</blockquote>");
    let quote = at(&document, &[0]);
    wrap_block_in_list(&mut document, quote, ListType::Checklist);
    assert_eq!(
        shown(&document),
        "<ul class=\"checklist\"><li class=\"unchecked\"><blockquote>ab</blockquote></li></ul>"
    );
}

#[test]
fn converting_to_checklist_adds_unchecked_state() {
    let mut document = doc("<ol><li>a</li><li style=\"list-style: none;\"><ol><li>b</li></ol></li></ol>");
    let list = at(&document, &[0]);
    convert_list_type(&mut document, list, ListType::Checklist);
    // Wrapper items carry a derived state, not a fresh one.
    assert_eq!(
        shown(&document),
        "<ul class=\"checklist\"><li class=\"unchecked\">a</li><li style=\"list-style: none;\"><ol><li>b</li></ol></li></ul>"
    );
}

#[test]
fn converting_away_from_checklist_drops_state() {
    let mut document = doc("<ul class=\"checklist\"><li class=\"checked\">a</li></ul>");
    let list = at(&document, &[0]);
    convert_list_type(&mut document, list, ListType::Ordered);
    assert_eq!(shown(&document), "<ol><li>a</li></ol>");
}

#[test]
fn converting_strips_every_marker_style() {
    let mut document = doc(
        "<ul><li style=\"list-style-type: square; color: red;\">a</li>\
         <li style=\"list-style-image: url(x.png);\">b</li>\
         <li style=\"list-style: none; list-style-type: disc;\"><ul><li>c</li></ul></li></ul>",
    );
    let list = at(&document, &[0]);
    convert_list_type(&mut document, list, ListType::Ordered);
    assert_eq!(
        shown(&document),
        "<ol><li style=\"color: red;\">a</li><li>b</li>\
         <li style=\"list-style: none;\"><ul><li>c</li></ul></li></ol>"
    );
}

#[test]
fn lifting_top_level_item_splits_list() {
    let mut document = doc("<ul><li>a</li><li>b</li><li>c</li></ul>");
    let item = at(&document, &[0, 1]);
    let lifted = lift_list_item(&mut document, item).unwrap();
    assert_eq!(lifted, Lifted::Blocks(at(&document, &[1])));
    assert_eq!(shown(&document), "<ul><li>a</li></ul><p>b</p><ul><li>c</li></ul>");
}

#[test]
fn lifting_item_with_blocks_keeps_them() {
    let mut document = doc("<ul><li>a<h2>b</h2>c</li></ul>");
    let item = at(&document, &[0, 0]);
    let lifted = lift_list_item(&mut document, item).unwrap();
    assert_eq!(lifted, Lifted::Blocks(at(&document, &[0])));
    assert_eq!(shown(&document), "<p>a</p><h2>b</h2><p>c</p>");
}

#[test]
fn lifting_empty_item_yields_filled_paragraph() {
    let mut document = doc("<ul><li></li></ul>");
    let item = at(&document, &[0, 0]);
    lift_list_item(&mut document, item);
    assert_eq!(shown(&document), "<p><br></p>");
}

#[test]
fn lifting_nested_item_moves_it_after_wrapper() {
    let mut document = doc(
        "<ul><li>a</li><li style=\"list-style: none;\"><ul><li>b</li><li>c</li></ul></li><li>d</li></ul>",
    );
    let item = at(&document, &[0, 1, 0, 0]);
    let lifted = lift_list_item(&mut document, item).unwrap();
    assert_eq!(lifted, Lifted::Item(item));
    assert_eq!(
        shown(&document),
        "<ul><li>a</li><li>b</li><li style=\"list-style: none;\"><ul><li>c</li></ul></li><li>d</li></ul>"
    );
}

#[test]
fn lifting_only_nested_item_removes_wrapper() {
    let mut document = doc("<ul><li>a</li><li style=\"list-style: none;\"><ul><li>b</li></ul></li></ul>");
    let item = at(&document, &[0, 1, 0, 0]);
    lift_list_item(&mut document, item);
    assert_eq!(shown(&document), "<ul><li>a</li><li>b</li></ul>");
}

#[test]
fn sibling_runs_group_adjacent_items() {
    let document = doc("<ul><li>a</li><li>b</li><li>c</li><li>d</li></ul>");
    let items: Vec<NodeId> = [0, 1, 3].iter().map(|&i| at(&document, &[0, i])).collect();
    let runs = sibling_runs(&document, &items);
    assert_eq!(runs, vec![vec![items[0], items[1]], vec![items[2]]]);
}

#[test]
fn indent_prepends_to_following_wrapper() {
    let mut document = doc("<ol><li>a</li><li>b</li><li style=\"list-style: none;\"><ol><li>c</li></ol></li></ol>");
    let item = at(&document, &[0, 1]);
    indent_run(&mut document, &[item]);
    assert_eq!(
        shown(&document),
        "<ol><li>a</li><li style=\"list-style: none;\"><ol><li>b</li><li>c</li></ol></li></ol>"
    );
}

#[test]
fn indent_merges_wrappers_on_both_sides() {
    let mut document = doc(
        "<ul><li style=\"list-style: none;\"><ul><li>a</li></ul></li><li>b</li>\
         <li style=\"list-style: none;\"><ul><li>c</li></ul></li></ul>",
    );
    let item = at(&document, &[0, 1]);
    indent_run(&mut document, &[item]);
    assert_eq!(
        shown(&document),
        "<ul><li style=\"list-style: none;\"><ul><li>a</li><li>b</li><li>c</li></ul></li></ul>"
    );
}

#[test]
fn wrapper_state_follows_nested_items() {
    let mut document = doc(
        "<ul class=\"checklist\"><li class=\"unchecked\">a</li>\
         <li style=\"list-style: none;\"><ul class=\"checklist\">\
         <li class=\"checked\">b</li><li class=\"unchecked\">c</li></ul></li></ul>",
    );
    let list = at(&document, &[0]);
    refresh_checklist_states(&mut document, list);
    let wrapper = at(&document, &[0, 1]);
    assert!(!is_checked(&document, wrapper));

    let c = at(&document, &[0, 1, 0, 1]);
    set_item_checked(&mut document, c, true);
    assert!(is_checked(&document, wrapper));

    set_item_checked(&mut document, c, false);
    assert!(!is_checked(&document, wrapper));
}

#[test]
fn wrapper_of_plain_list_has_no_state() {
    let mut document = doc("<ul class=\"checklist\"><li class=\"checked\">a</li><li style=\"list-style: none;\"><ul><li>b</li></ul></li></ul>");
    let list = at(&document, &[0]);
    refresh_checklist_states(&mut document, list);
    assert_eq!(
        shown(&document),
        "<ul class=\"checklist\"><li class=\"checked\">a</li><li style=\"list-style: none;\"><ul><li>b</li></ul></li></ul>"
    );
}

#[test]
fn removing_last_item_removes_emptied_list() {
    let mut document = doc("<p>x</p><ul><li>a</li></ul>");
    let item = at(&document, &[1, 0]);
    let gap = remove_with_empty_ancestors(&mut document, item);
    assert_eq!(gap, Some((document.root(), 1)));
    assert_eq!(shown(&document), "<p>x</p>");
}
