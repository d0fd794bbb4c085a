//! Lays the outline out as terminal lines: nested levels are indented behind
//! a `::` handle and the columns of a row sit side by side.

use std::mem;

use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};
use tdoc::{InlineStyle, Paragraph, Span as DocSpan};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::cursor::Caret;
use crate::level::{ContentNode, Line as TextLine, LevelId, Row, paragraph_text};
use crate::registry::Registry;
use crate::theme::Theme;

const HANDLE: &str = ":: ";
const INDENT: &str = "   ";
const COLUMN_SEPARATOR: &str = " ┆ ";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CursorVisualPosition {
    pub line: usize,
    pub column: u16,
}

#[derive(Debug)]
pub struct RenderResult {
    pub lines: Vec<Line<'static>>,
    pub cursor: Option<CursorVisualPosition>,
    pub total_lines: usize,
}

pub fn render_outline(
    levels: &Registry,
    caret: Option<Caret>,
    width: usize,
    theme: &Theme,
) -> RenderResult {
    let renderer = Renderer {
        levels,
        caret,
        theme,
    };
    renderer.render_region(levels.root(), width.max(1)).finish()
}

struct Renderer<'a> {
    levels: &'a Registry,
    caret: Option<Caret>,
    theme: &'a Theme,
}

impl Renderer<'_> {
    fn render_region(&self, level: LevelId, width: usize) -> Block {
        let mut block = Block::default();
        let Some(region) = self.levels.get(level) else {
            return block;
        };
        for node in region.content() {
            let rendered = match node {
                ContentNode::Line(line) => self.render_line(line, width),
                ContentNode::Level(child) => self.render_nested(*child, width),
                ContentNode::Row(row) => self.render_row(row, width),
            };
            block.append(rendered);
        }
        block
    }

    /// A level below its parent: a handle on the first line, indentation on
    /// the rest.
    fn render_nested(&self, level: LevelId, width: usize) -> Block {
        let prefix_width = HANDLE.width();
        let mut inner = self.render_region(level, width.saturating_sub(prefix_width).max(1));
        if inner.lines.is_empty() {
            inner.lines.push(RenderedLine::default());
        }
        let has_handle = self.levels.get(level).is_some_and(|level| level.has_handle());
        let first = if has_handle { HANDLE } else { INDENT };
        inner.prefixed(first, self.theme.handle_style(), prefix_width)
    }

    fn render_row(&self, row: &Row, width: usize) -> Block {
        let count = row.columns().len().max(1);
        let separator_width = COLUMN_SEPARATOR.width();
        let available = width.saturating_sub(separator_width * (count - 1));
        let column_width = (available / count).max(1);

        let mut columns: Vec<Block> = row
            .columns()
            .iter()
            .map(|column| self.render_nested(*column, column_width))
            .collect();
        let height = columns.iter().map(|column| column.lines.len()).max().unwrap_or(0);

        let mut block = Block::default();
        for idx in 0..height {
            let mut line = RenderedLine::default();
            for (col_idx, column) in columns.iter_mut().enumerate() {
                if col_idx > 0 {
                    line.push(
                        COLUMN_SEPARATOR.to_string(),
                        self.theme.column_separator_style(),
                        separator_width,
                    );
                }
                let start = line.width;
                if let Some(cell) = column.lines.get_mut(idx) {
                    line.extend(mem::take(cell));
                }
                if col_idx + 1 < count {
                    line.pad_to(start + column_width);
                }
                if let Some((cursor_line, cursor_column)) = column.cursor {
                    if cursor_line == idx {
                        block.cursor = Some((idx, start + cursor_column));
                    }
                }
            }
            block.lines.push(line);
        }
        block
    }

    /// One text line, wrapped at `width`. Block boundaries inside the line
    /// start a new visual line.
    fn render_line(&self, line: &TextLine, width: usize) -> Block {
        let chars = styled_chars(line, self.theme);
        let caret = self
            .caret
            .filter(|caret| caret.node == line.id())
            .map(|caret| caret.placement.offset(line.len()));

        let mut rows: Vec<Vec<(char, Style)>> = Vec::new();
        let mut current: Vec<(char, Style)> = Vec::new();
        let mut current_width = 0;
        let mut cursor = None;

        for (idx, (ch, style)) in chars.iter().copied().enumerate() {
            if ch == '\n' {
                if caret == Some(idx) {
                    cursor = Some((rows.len(), current_width));
                }
                rows.push(mem::take(&mut current));
                current_width = 0;
                continue;
            }
            let char_width = ch.width().unwrap_or(0);
            if current_width > 0 && current_width + char_width > width {
                rows.push(mem::take(&mut current));
                current_width = 0;
            }
            if caret == Some(idx) {
                cursor = Some((rows.len(), current_width));
            }
            current.push((ch, style));
            current_width += char_width;
        }
        if caret == Some(chars.len()) {
            cursor = Some((rows.len(), current_width));
        }
        rows.push(current);

        Block {
            lines: rows.into_iter().map(RenderedLine::from_chars).collect(),
            cursor,
        }
    }
}

#[derive(Debug, Default)]
struct RenderedLine {
    spans: Vec<Span<'static>>,
    width: usize,
}

impl RenderedLine {
    fn from_chars(chars: Vec<(char, Style)>) -> Self {
        let mut line = Self::default();
        let mut run = String::new();
        let mut run_style = Style::default();
        let mut run_width = 0;
        for (ch, style) in chars {
            if style != run_style && !run.is_empty() {
                line.push(mem::take(&mut run), run_style, run_width);
                run_width = 0;
            }
            run_style = style;
            run.push(ch);
            run_width += ch.width().unwrap_or(0);
        }
        line.push(run, run_style, run_width);
        line
    }

    fn push(&mut self, text: String, style: Style, width: usize) {
        if !text.is_empty() {
            self.spans.push(Span::styled(text, style));
        }
        self.width += width;
    }

    fn extend(&mut self, other: RenderedLine) {
        self.spans.extend(other.spans);
        self.width += other.width;
    }

    fn pad_to(&mut self, width: usize) {
        if self.width < width {
            let gap = width - self.width;
            self.push(" ".repeat(gap), Style::default(), gap);
        }
    }
}

/// Rendered lines plus the caret's line and column within them.
#[derive(Debug, Default)]
struct Block {
    lines: Vec<RenderedLine>,
    cursor: Option<(usize, usize)>,
}

impl Block {
    fn append(&mut self, other: Block) {
        if let Some((line, column)) = other.cursor {
            self.cursor = Some((self.lines.len() + line, column));
        }
        self.lines.extend(other.lines);
    }

    fn prefixed(self, first: &str, style: Style, width: usize) -> Block {
        let lines = self
            .lines
            .into_iter()
            .enumerate()
            .map(|(idx, line)| {
                let mut prefixed = RenderedLine::default();
                let prefix = if idx == 0 { first } else { INDENT };
                prefixed.push(prefix.to_string(), style, width);
                prefixed.extend(line);
                prefixed
            })
            .collect();
        Block {
            lines,
            cursor: self.cursor.map(|(line, column)| (line, column + width)),
        }
    }

    fn finish(self) -> RenderResult {
        let lines: Vec<Line<'static>> = self
            .lines
            .into_iter()
            .map(|line| Line::from(line.spans))
            .collect();
        let total_lines = lines.len();
        RenderResult {
            lines,
            cursor: self.cursor.map(|(line, column)| CursorVisualPosition {
                line,
                column: u16::try_from(column).unwrap_or(u16::MAX),
            }),
            total_lines,
        }
    }
}

fn styled_chars(line: &TextLine, theme: &Theme) -> Vec<(char, Style)> {
    let mut chars = Vec::new();
    for (idx, paragraph) in line.blocks().iter().enumerate() {
        if idx > 0 {
            chars.push(('\n', Style::default()));
        }
        match paragraph {
            Paragraph::CodeBlock { content } => {
                collect_chars(content, theme.preformatted_style(), theme, &mut chars)
            }
            Paragraph::Quote { .. }
            | Paragraph::OrderedList { .. }
            | Paragraph::UnorderedList { .. }
            | Paragraph::Checklist { .. } => chars.extend(
                paragraph_text(paragraph)
                    .chars()
                    .map(|ch| (ch, Style::default())),
            ),
            _ => collect_chars(paragraph.content(), Style::default(), theme, &mut chars),
        }
    }
    chars
}

fn collect_chars(spans: &[DocSpan], base: Style, theme: &Theme, out: &mut Vec<(char, Style)>) {
    for span in spans {
        let style = merge_style(base, span.style, theme);
        out.extend(span.text.chars().map(|ch| (ch, style)));
        collect_chars(&span.children, style, theme, out);
    }
}

fn merge_style(base: Style, inline: InlineStyle, theme: &Theme) -> Style {
    match inline {
        InlineStyle::None => base,
        InlineStyle::Bold => base.add_modifier(Modifier::BOLD),
        InlineStyle::Italic => base.add_modifier(Modifier::ITALIC),
        InlineStyle::Highlight => base.add_modifier(Modifier::REVERSED),
        InlineStyle::Underline => base.add_modifier(Modifier::UNDERLINED),
        InlineStyle::Strike => base.add_modifier(Modifier::CROSSED_OUT),
        InlineStyle::Link => base.patch(theme.link_style()),
        InlineStyle::Code => base.add_modifier(Modifier::DIM),
    }
}
