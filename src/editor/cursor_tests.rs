use super::*;
use crate::cursor::{CursorService, Placement};

fn caret(editor: &Editor) -> (NodeId, usize) {
    editor.caret_offset().expect("caret on a line")
}

fn lines(editor: &Editor) -> Vec<String> {
    editor
        .leaf_lines()
        .into_iter()
        .map(|id| editor.levels().line(id).expect("line").text())
        .collect()
}

#[test]
fn typing_advances_the_caret() {
    let mut editor = Editor::new();
    assert!(editor.insert_text("héllo"));

    let (node, offset) = caret(&editor);
    assert_eq!(offset, 5);
    assert_eq!(editor.levels().line(node).unwrap().text(), "héllo");
}

#[test]
fn typing_in_the_middle_of_a_line() {
    let mut editor = Editor::new();
    editor.insert_text("heo");
    let (node, _) = caret(&editor);
    editor.cursor_mut().place(node, Placement::At(2));

    editor.insert_char('l');
    editor.insert_char('l');

    assert_eq!(editor.caret_line_text().as_deref(), Some("hello"));
    assert_eq!(caret(&editor), (node, 4));
}

#[test]
fn line_break_splits_at_the_caret() {
    let mut editor = Editor::new();
    editor.insert_text("hello");
    let (node, _) = caret(&editor);
    editor.cursor_mut().place(node, Placement::At(2));

    assert!(editor.insert_line_break());

    assert_eq!(lines(&editor), ["he", "llo"]);
    let (after, offset) = caret(&editor);
    assert_ne!(after, node);
    assert_eq!(offset, 0);
    editor.check_invariants().unwrap();
}

#[test]
fn backspace_joins_with_previous_line() {
    let mut editor = Editor::new();
    editor.insert_text("ab\ncd");
    let first = editor.leaf_lines()[0];
    let (node, _) = caret(&editor);
    editor.cursor_mut().place(node, Placement::Start);

    assert!(editor.delete_backward());

    assert_eq!(lines(&editor), ["abcd"]);
    assert_eq!(caret(&editor), (first, 2));
}

#[test]
fn backspace_removes_previous_character() {
    let mut editor = Editor::new();
    editor.insert_text("abc");

    assert!(editor.delete_backward());

    assert_eq!(editor.caret_line_text().as_deref(), Some("ab"));
    assert_eq!(caret(&editor).1, 2);
}

#[test]
fn backspace_after_a_level_does_nothing() {
    let mut editor = Editor::new();
    let first = editor.levels().first_level().unwrap();
    editor.insert_text("a\nb");
    let line_a = editor.leaf_lines()[0];
    editor.cursor_mut().place(line_a, Placement::End);
    editor.handle_chord("tab".parse().unwrap());
    let line_b = *editor.leaf_lines().last().unwrap();
    editor.cursor_mut().place(line_b, Placement::Start);

    assert!(!editor.delete_backward());
    assert_eq!(editor.level(first).unwrap().len(), 3);
}

#[test]
fn backspace_at_the_very_start_does_nothing() {
    let mut editor = Editor::new();
    assert!(!editor.delete_backward());
}

#[test]
fn left_and_right_wrap_across_lines() {
    let mut editor = Editor::new();
    editor.insert_text("ab\ncd");
    let [first, second] = editor.leaf_lines()[..] else {
        panic!("expected two lines");
    };
    editor.cursor_mut().place(second, Placement::Start);

    assert!(editor.move_left());
    assert_eq!(caret(&editor), (first, 2));

    assert!(editor.move_right());
    assert_eq!(caret(&editor), (second, 0));

    editor.cursor_mut().place(second, Placement::End);
    assert!(!editor.move_right());
}

#[test]
fn up_and_down_walk_lines_in_document_order() {
    let mut editor = Editor::new();
    editor.insert_text("top");
    editor.handle_chord("tab".parse().unwrap());
    editor.insert_text("nested");
    editor.handle_chord("ctrl+shift+enter".parse().unwrap());
    editor.insert_text("right");

    assert_eq!(lines(&editor), ["top", "nested", "right", ""]);

    assert!(editor.move_up());
    assert_eq!(editor.caret_line_text().as_deref(), Some("nested"));
    assert!(editor.move_up());
    assert_eq!(editor.caret_line_text().as_deref(), Some("top"));
    assert_eq!(caret(&editor).1, 3);
    assert!(!editor.move_up());

    assert!(editor.move_down());
    assert!(editor.move_down());
    assert!(editor.move_down());
    assert_eq!(editor.caret_line_text().as_deref(), Some(""));
    assert!(!editor.move_down());
}

#[test]
fn leaf_lines_cover_every_level() {
    let mut editor = Editor::new();
    editor.insert_text("a");
    editor.handle_chord("shift+enter".parse().unwrap());
    editor.insert_text("b\nc");

    assert_eq!(lines(&editor), ["a", "b", "c"]);
}

#[test]
fn shift_motions_select_from_the_anchor() {
    let mut editor = Editor::new();
    editor.insert_text("hello world");
    let (node, _) = caret(&editor);

    assert!(editor.select_left());
    assert!(editor.select_left());
    assert_eq!(editor.cursor().selection().as_deref(), Some("ld"));
    assert_eq!(caret(&editor), (node, 9));

    assert!(editor.select_right());
    assert_eq!(editor.cursor().selection().as_deref(), Some("d"));

    assert!(editor.select_to_line_start());
    assert_eq!(editor.cursor().selection().as_deref(), Some("hello world"));
    assert_eq!(caret(&editor), (node, 0));
}

#[test]
fn selecting_back_over_the_anchor_collapses() {
    let mut editor = Editor::new();
    editor.insert_text("abc");
    let (node, _) = caret(&editor);
    editor.cursor_mut().place(node, Placement::At(1));

    assert!(editor.select_to_line_end());
    assert_eq!(editor.cursor().selection().as_deref(), Some("bc"));
    assert!(editor.select_to_line_start());
    assert_eq!(editor.cursor().selection().as_deref(), Some("a"));
    assert!(editor.select_right());
    assert_eq!(editor.cursor().selection(), None);
    assert_eq!(caret(&editor), (node, 1));
}

#[test]
fn plain_motion_drops_the_selection() {
    let mut editor = Editor::new();
    editor.insert_text("abc");
    editor.select_to_line_start();
    assert_eq!(editor.cursor().selection().as_deref(), Some("abc"));

    editor.move_right();

    assert_eq!(editor.cursor().selection(), None);
    assert_eq!(editor.cursor().anchor(), None);
}

#[test]
fn selection_does_not_follow_the_caret_to_another_line() {
    let mut editor = Editor::new();
    editor.insert_text("one\ntwo");
    editor.select_left();
    assert_eq!(editor.cursor().selection().as_deref(), Some("o"));

    editor.move_up();
    assert!(editor.select_to_line_start());

    assert_eq!(editor.cursor().selection().as_deref(), Some("on"));
}
