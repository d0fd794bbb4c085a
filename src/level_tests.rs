use tdoc::{InlineStyle, Paragraph, Span};

use super::*;
use crate::cursor::{Caret, MemoryCursor};

fn line_keys(level: &Level) -> Vec<NodeKey> {
    level.content().iter().map(ContentNode::key).collect()
}

fn bold_line() -> Line {
    let mut bold = Span::new_text("World");
    bold.style = InlineStyle::Bold;
    Line::from_paragraphs(vec![Paragraph::new_text().with_content(vec![
        Span::new_text("Hello "),
        bold,
        Span::new_text("!"),
    ])])
}

#[test]
fn new_level_is_seeded_with_one_empty_line() {
    let level = Level::new(0);
    assert_eq!(level.len(), 1);
    assert!(level.has_handle());
    assert!(!level.is_column());
    let line = level.content()[0].as_line().expect("seed line");
    assert!(line.is_empty());
}

#[test]
fn root_has_no_handle_and_negative_depth() {
    let root = Level::new_root();
    assert_eq!(root.depth(), -1);
    assert!(!root.has_handle());
    assert!(root.is_empty());
}

#[test]
fn level_ids_increase_monotonically() {
    let ids: Vec<LevelId> = (0..16).map(|_| Level::new(0).id()).collect();
    for pair in ids.windows(2) {
        assert!(pair[0] < pair[1], "{} should precede {}", pair[0], pair[1]);
    }
}

#[test]
fn write_inserts_after_preceding_node() {
    let mut level = Level::new(0);
    let first = level.first_key().unwrap();
    let a = Line::from_text("a");
    let b = Line::from_text("b");
    let a_key = NodeKey::Node(a.id());
    let b_key = NodeKey::Node(b.id());

    level.write(a.into(), None);
    level.write(b.into(), Some(first));

    assert_eq!(line_keys(&level), vec![first, b_key, a_key]);
}

#[test]
fn write_appends_when_preceding_is_unknown() {
    let mut level = Level::new(0);
    let stray = NodeKey::Node(NodeId::next());
    let line = Line::from_text("tail");
    let key = NodeKey::Node(line.id());

    level.write(line.into(), Some(stray));

    assert_eq!(level.last_key(), Some(key));
}

#[test]
fn overwrite_replaces_target_and_returns_it() {
    let mut level = Level::new(0);
    let seed = level.first_key().unwrap();
    let replacement = Line::from_text("new");
    let replacement_key = NodeKey::Node(replacement.id());

    let removed = level.overwrite(replacement.into(), Some(seed));

    assert_eq!(removed.map(|node| node.key()), Some(seed));
    assert_eq!(line_keys(&level), vec![replacement_key]);
}

#[test]
fn overwrite_without_target_only_appends() {
    let mut level = Level::new(0);
    let removed = level.overwrite(Line::from_text("x").into(), None);
    assert!(removed.is_none());
    assert_eq!(level.len(), 2);
}

#[test]
fn clear_hands_back_every_node() {
    let mut level = Level::new(0);
    level.write(Line::from_text("a").into(), None);
    let nodes = level.clear();
    assert_eq!(nodes.len(), 2);
    assert!(level.is_empty());
}

#[test]
fn trailing_empty_line_detection() {
    let mut level = Level::new(0);
    let seed = level.first_key().unwrap();
    assert!(!level.is_trailing_empty_line(seed), "sole line is never trailing");

    let text = Line::from_text("text");
    let text_key = NodeKey::Node(text.id());
    level.write(text.into(), None);
    assert!(!level.is_trailing_empty_line(text_key));

    let empty = Line::empty();
    let empty_key = NodeKey::Node(empty.id());
    level.write(empty.into(), None);
    assert!(level.is_trailing_empty_line(empty_key));
    assert!(!level.is_trailing_empty_line(seed));
}

#[test]
fn focus_to_places_caret_at_end() {
    let level = Level::new(0);
    let node = level.content()[0].as_line().unwrap().id();
    let mut cursor = MemoryCursor::new();

    level.focus_to(node, &mut cursor);

    assert_eq!(
        cursor.caret(),
        Some(Caret {
            node,
            placement: Placement::End
        })
    );
}

#[test]
fn line_text_joins_paragraphs_with_newlines() {
    let line = Line::from_text("one\ntwo");
    assert_eq!(line.blocks().len(), 2);
    assert_eq!(line.text(), "one\ntwo");
    assert_eq!(line.len(), 7);
}

#[test]
fn line_insert_and_remove_chars() {
    let mut line = Line::from_text("hllo");
    assert!(line.insert_char(1, 'e'));
    assert_eq!(line.text(), "hello");
    assert!(line.remove_char(0));
    assert_eq!(line.text(), "ello");
    assert!(!line.remove_char(10));
}

#[test]
fn line_insert_handles_multibyte_text() {
    let mut line = Line::from_text("größe");
    assert!(line.insert_char(3, '-'));
    assert_eq!(line.text(), "grö-ße");
}

#[test]
fn removing_paragraph_separator_joins_paragraphs() {
    let mut line = Line::from_text("ab\ncd");
    assert!(line.remove_char(2));
    assert_eq!(line.text(), "abcd");
    assert_eq!(line.blocks().len(), 1);
}

#[test]
fn split_off_keeps_styles_on_both_sides() {
    let mut line = bold_line();
    let tail = line.split_off(8);

    assert_eq!(line.text(), "Hello Wo");
    assert_eq!(tail.text(), "rld!");
    assert_ne!(line.id(), tail.id());

    let tail_spans = tail.blocks()[0].content();
    assert_eq!(tail_spans[0].style, InlineStyle::Bold);
    assert_eq!(tail_spans[0].text, "rld");
}

#[test]
fn split_off_at_end_yields_empty_line() {
    let mut line = Line::from_text("done");
    let tail = line.split_off(4);
    assert_eq!(line.text(), "done");
    assert!(tail.is_empty());
}

#[test]
fn append_joins_meeting_paragraphs() {
    let mut line = Line::from_text("foo");
    line.append(Line::from_text("bar\nbaz"));
    assert_eq!(line.text(), "foobar\nbaz");
    assert_eq!(line.blocks().len(), 2);
}

#[test]
fn preformatted_line_is_a_code_block() {
    let line = Line::preformatted("fn main() {}");
    assert!(line.is_preformatted());
    assert_eq!(line.text(), "fn main() {}");
    assert!(!Line::from_text("plain").is_preformatted());
}

#[test]
fn plain_text_is_not_treated_as_markup() {
    let line = Line::from_markup("1 + 1 = 2");
    assert_eq!(line.text(), "1 + 1 = 2");
}

#[test]
fn markup_keeps_its_text() {
    let line = Line::from_markup("<p>Hello</p>");
    assert!(line.text().contains("Hello"));
}

#[test]
fn char_to_byte_idx_counts_characters() {
    assert_eq!(char_to_byte_idx("größe", 0), 0);
    assert_eq!(char_to_byte_idx("größe", 3), 4);
    assert_eq!(char_to_byte_idx("größe", 99), "größe".len());
}
