use std::io::Cursor;

use tdoc::{ChecklistItem, Paragraph, Span};

use super::NodeId;

/// A plain editable unit of a content region. Holds one or more rich text
/// paragraphs; an empty line holds a single empty text paragraph.
///
/// Offsets address the line's text, where paragraphs are joined by `\n`.
#[derive(Debug, PartialEq)]
pub struct Line {
    id: NodeId,
    blocks: Vec<Paragraph>,
}

impl Line {
    pub fn empty() -> Self {
        Self::from_text("")
    }

    pub fn from_text(text: &str) -> Self {
        let blocks = text
            .split('\n')
            .map(|piece| Paragraph::new_text().with_content(vec![Span::new_text(piece)]))
            .collect();
        Self::from_paragraphs(blocks)
    }

    /// A single preformatted block, used for fetched content.
    pub fn preformatted(text: &str) -> Self {
        Self::from_paragraphs(vec![Paragraph::CodeBlock {
            content: vec![Span::new_text(text)],
        }])
    }

    pub fn from_paragraphs(blocks: Vec<Paragraph>) -> Self {
        let blocks = if blocks.is_empty() {
            vec![empty_text_paragraph()]
        } else {
            blocks
        };
        Self {
            id: NodeId::next(),
            blocks,
        }
    }

    /// Interprets `markup` as FTML. Text without markup, or markup that does
    /// not parse, is kept as plain text.
    pub fn from_markup(markup: &str) -> Self {
        if looks_like_markup(markup) {
            match tdoc::parse(Cursor::new(markup.to_string())) {
                Ok(document) if !document.paragraphs.is_empty() => {
                    return Self::from_paragraphs(document.paragraphs);
                }
                Ok(_) => {}
                Err(err) => tracing::debug!(%err, "markup did not parse, keeping it as text"),
            }
        }
        Self::from_text(markup)
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn blocks(&self) -> &[Paragraph] {
        &self.blocks
    }

    pub fn text(&self) -> String {
        self.blocks
            .iter()
            .map(paragraph_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Length of [`Line::text`] in characters.
    pub fn len(&self) -> usize {
        let separators = self.blocks.len().saturating_sub(1);
        self.blocks.iter().map(paragraph_len).sum::<usize>() + separators
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_preformatted(&self) -> bool {
        self.blocks
            .iter()
            .all(|block| matches!(block, Paragraph::CodeBlock { .. }))
    }

    pub(crate) fn insert_char(&mut self, offset: usize, ch: char) -> bool {
        let Some((block_idx, inner)) = self.locate(offset) else {
            return false;
        };
        let block = &mut self.blocks[block_idx];
        if !block.paragraph_type().is_leaf() {
            return false;
        }
        let spans = block.content_mut();
        if insert_into_spans(spans, inner, ch).is_err() {
            spans.push(Span::new_text(&ch.to_string()));
        }
        true
    }

    /// Removes the character at `offset`. Removing the separator between two
    /// paragraphs joins them.
    pub(crate) fn remove_char(&mut self, offset: usize) -> bool {
        let Some((block_idx, inner)) = self.locate(offset) else {
            return false;
        };
        if inner < paragraph_len(&self.blocks[block_idx]) {
            let block = &mut self.blocks[block_idx];
            if !block.paragraph_type().is_leaf() {
                return false;
            }
            let spans = block.content_mut();
            let removed = remove_from_spans(spans, inner).is_ok();
            prune_and_merge_spans(spans);
            return removed;
        }
        self.join_with_next_block(block_idx)
    }

    /// Splits the line at `offset`, keeping the head and returning the tail
    /// as a new line.
    pub(crate) fn split_off(&mut self, offset: usize) -> Line {
        let Some((block_idx, inner)) = self.locate(offset) else {
            return Line::empty();
        };
        let mut tail_blocks = self.blocks.split_off(block_idx + 1);
        let block = &mut self.blocks[block_idx];
        if block.paragraph_type().is_leaf() {
            let tail_spans = split_spans_at(block.content_mut(), inner);
            // The tail keeps the paragraph type of the block it was cut from.
            let mut tail = block.clone();
            *tail.content_mut() = if tail_spans.is_empty() {
                vec![Span::new_text("")]
            } else {
                tail_spans
            };
            tail_blocks.insert(0, tail);
            if block.content().is_empty() {
                block.content_mut().push(Span::new_text(""));
            }
        }
        Line::from_paragraphs(tail_blocks)
    }

    /// Moves every paragraph of `other` to the end of this line, joining the
    /// two paragraphs that meet.
    pub(crate) fn append(&mut self, other: Line) {
        let boundary = self.blocks.len().saturating_sub(1);
        self.blocks.extend(other.blocks);
        self.join_with_next_block(boundary);
    }

    fn join_with_next_block(&mut self, block_idx: usize) -> bool {
        if block_idx + 1 >= self.blocks.len() {
            return false;
        }
        let both_leaf = self.blocks[block_idx].paragraph_type().is_leaf()
            && self.blocks[block_idx + 1].paragraph_type().is_leaf();
        if !both_leaf {
            return false;
        }
        let next = self.blocks.remove(block_idx + 1);
        let spans = self.blocks[block_idx].content_mut();
        spans.extend(next.content().iter().cloned());
        prune_and_merge_spans(spans);
        if spans.is_empty() {
            spans.push(Span::new_text(""));
        }
        true
    }

    fn locate(&self, offset: usize) -> Option<(usize, usize)> {
        let mut remaining = offset;
        for (idx, block) in self.blocks.iter().enumerate() {
            let len = paragraph_len(block);
            if remaining <= len {
                return Some((idx, remaining));
            }
            remaining -= len + 1;
        }
        None
    }
}

fn empty_text_paragraph() -> Paragraph {
    Paragraph::new_text().with_content(vec![Span::new_text("")])
}

fn looks_like_markup(text: &str) -> bool {
    let trimmed = text.trim_start();
    trimmed.starts_with('<') && trimmed.contains('>')
}

pub(crate) fn paragraph_text(paragraph: &Paragraph) -> String {
    match paragraph {
        Paragraph::Quote { children } => children
            .iter()
            .map(paragraph_text)
            .collect::<Vec<_>>()
            .join("\n"),
        Paragraph::OrderedList { entries } | Paragraph::UnorderedList { entries } => entries
            .iter()
            .flat_map(|entry| entry.iter().map(paragraph_text))
            .collect::<Vec<_>>()
            .join("\n"),
        Paragraph::Checklist { items } => {
            let mut lines = Vec::new();
            collect_checklist_text(items, &mut lines);
            lines.join("\n")
        }
        _ => {
            let mut text = String::new();
            collect_span_text(paragraph.content(), &mut text);
            text
        }
    }
}

fn paragraph_len(paragraph: &Paragraph) -> usize {
    paragraph_text(paragraph).chars().count()
}

fn collect_checklist_text(items: &[ChecklistItem], lines: &mut Vec<String>) {
    for item in items {
        let mut text = String::new();
        collect_span_text(&item.content, &mut text);
        lines.push(text);
        collect_checklist_text(&item.children, lines);
    }
}

fn collect_span_text(spans: &[Span], out: &mut String) {
    for span in spans {
        out.push_str(&span.text);
        collect_span_text(&span.children, out);
    }
}

fn spans_len(spans: &[Span]) -> usize {
    spans
        .iter()
        .map(|span| span.text.chars().count() + spans_len(&span.children))
        .sum()
}

fn insert_into_spans(spans: &mut [Span], offset: usize, ch: char) -> Result<(), usize> {
    let mut remaining = offset;
    for span in spans.iter_mut() {
        let len = span.text.chars().count();
        if remaining <= len {
            let byte_idx = char_to_byte_idx(&span.text, remaining);
            span.text.insert(byte_idx, ch);
            return Ok(());
        }
        remaining -= len;
        match insert_into_spans(&mut span.children, remaining, ch) {
            Ok(()) => return Ok(()),
            Err(rest) => remaining = rest,
        }
    }
    Err(remaining)
}

fn remove_from_spans(spans: &mut [Span], offset: usize) -> Result<(), usize> {
    let mut remaining = offset;
    for span in spans.iter_mut() {
        let len = span.text.chars().count();
        if remaining < len {
            let start = char_to_byte_idx(&span.text, remaining);
            let end = char_to_byte_idx(&span.text, remaining + 1);
            span.text.drain(start..end);
            return Ok(());
        }
        remaining -= len;
        match remove_from_spans(&mut span.children, remaining) {
            Ok(()) => return Ok(()),
            Err(rest) => remaining = rest,
        }
    }
    Err(remaining)
}

/// Cuts `spans` at a character offset and returns everything after it.
fn split_spans_at(spans: &mut Vec<Span>, offset: usize) -> Vec<Span> {
    let mut remaining = offset;
    for idx in 0..spans.len() {
        let len = spans[idx].text.chars().count();
        let total = len + spans_len(&spans[idx].children);
        if remaining > total {
            remaining -= total;
            continue;
        }

        let mut trailing = spans.split_off(idx + 1);
        let span = &mut spans[idx];
        let original = span.clone();
        let tail = if remaining <= len {
            let (left, right) = split_text(&original.text, remaining);
            span.text = left;
            span.children.clear();
            let mut tail = original;
            tail.text = right;
            tail
        } else {
            let children_tail = split_spans_at(&mut span.children, remaining - len);
            let mut tail = original;
            tail.text.clear();
            tail.children = children_tail;
            tail
        };
        if !span_is_empty(&tail) {
            trailing.insert(0, tail);
        }
        prune_and_merge_spans(spans);
        return trailing;
    }
    Vec::new()
}

fn split_text(text: &str, offset: usize) -> (String, String) {
    let byte_idx = char_to_byte_idx(text, offset);
    (text[..byte_idx].to_string(), text[byte_idx..].to_string())
}

fn span_is_empty(span: &Span) -> bool {
    span.text.is_empty() && span.children.iter().all(span_is_empty)
}

fn prune_and_merge_spans(spans: &mut Vec<Span>) {
    let mut idx = 0;
    while idx < spans.len() {
        prune_and_merge_spans(&mut spans[idx].children);
        if span_is_empty(&spans[idx]) {
            spans.remove(idx);
        } else {
            idx += 1;
        }
    }

    let mut i = 0;
    while i + 1 < spans.len() {
        if can_merge_spans(&spans[i], &spans[i + 1]) {
            let right = spans.remove(i + 1);
            spans[i].text.push_str(&right.text);
        } else {
            i += 1;
        }
    }
}

fn can_merge_spans(left: &Span, right: &Span) -> bool {
    left.style == right.style
        && left.link_target == right.link_target
        && left.children.is_empty()
        && right.children.is_empty()
}

pub(crate) fn char_to_byte_idx(text: &str, char_idx: usize) -> usize {
    if char_idx == 0 {
        return 0;
    }
    for (count, (byte_idx, _)) in text.char_indices().enumerate() {
        if count == char_idx {
            return byte_idx;
        }
    }
    text.len()
}
