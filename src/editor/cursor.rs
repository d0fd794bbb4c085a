//! Plain text editing and caret movement for keys no command handles.

use crate::cursor::{Caret, CursorService, MemoryCursor, Placement};
use crate::level::{ContentNode, LevelId, NodeId, NodeKey};

use super::Editor;

impl<C: CursorService> Editor<C> {
    pub fn insert_char(&mut self, ch: char) -> bool {
        let Some((node, offset)) = self.caret_offset() else {
            return false;
        };
        let inserted = self
            .levels
            .line_mut(node)
            .is_some_and(|line| line.insert_char(offset, ch));
        if inserted {
            self.cursor.place(node, Placement::At(offset + 1));
        }
        inserted
    }

    pub fn insert_text(&mut self, text: &str) -> bool {
        text.chars().all(|ch| {
            if ch == '\n' {
                self.insert_line_break()
            } else {
                self.insert_char(ch)
            }
        })
    }

    /// Splits the caret line in two; the caret moves to the start of the
    /// second half.
    pub fn insert_line_break(&mut self) -> bool {
        let Some((node, offset)) = self.caret_offset() else {
            return false;
        };
        let Some(owner) = self.levels.owner_of(NodeKey::Node(node)) else {
            return false;
        };
        let Some(tail) = self.levels.line_mut(node).map(|line| line.split_off(offset)) else {
            return false;
        };
        let tail_id = tail.id();
        let Some(region) = self.levels.get_mut(owner) else {
            return false;
        };
        region.write(tail.into(), Some(NodeKey::Node(node)));
        self.cursor.place(tail_id, Placement::Start);
        true
    }

    /// Deletes the character before the caret. At the start of a line the
    /// line is joined onto a directly preceding line.
    pub fn delete_backward(&mut self) -> bool {
        let Some((node, offset)) = self.caret_offset() else {
            return false;
        };
        if offset > 0 {
            let removed = self
                .levels
                .line_mut(node)
                .is_some_and(|line| line.remove_char(offset - 1));
            if removed {
                self.cursor.place(node, Placement::At(offset - 1));
            }
            return removed;
        }

        let Some(owner) = self.levels.owner_of(NodeKey::Node(node)) else {
            return false;
        };
        let Some(region) = self.levels.get_mut(owner) else {
            return false;
        };
        let Some(index) = region.position_of(NodeKey::Node(node)) else {
            return false;
        };
        let previous = index
            .checked_sub(1)
            .and_then(|idx| region.content().get(idx))
            .and_then(ContentNode::as_line)
            .map(|line| line.id());
        let Some(previous) = previous else {
            return false;
        };
        let Some(ContentNode::Line(current)) = region.remove(NodeKey::Node(node)) else {
            return false;
        };
        let Some(previous_line) = region.line_mut(previous) else {
            return false;
        };
        let join_at = previous_line.len();
        previous_line.append(current);
        self.cursor.place(previous, Placement::At(join_at));
        true
    }

    pub fn move_left(&mut self) -> bool {
        let Some((node, offset)) = self.caret_offset() else {
            return false;
        };
        if offset > 0 {
            self.cursor.place(node, Placement::At(offset - 1));
            return true;
        }
        match self.adjacent_line(node, -1) {
            Some(previous) => {
                self.cursor.place(previous, Placement::End);
                true
            }
            None => false,
        }
    }

    pub fn move_right(&mut self) -> bool {
        let Some((node, offset)) = self.caret_offset() else {
            return false;
        };
        let len = self.levels.line(node).map_or(0, |line| line.len());
        if offset < len {
            self.cursor.place(node, Placement::At(offset + 1));
            return true;
        }
        match self.adjacent_line(node, 1) {
            Some(next) => {
                self.cursor.place(next, Placement::Start);
                true
            }
            None => false,
        }
    }

    pub fn move_up(&mut self) -> bool {
        self.move_vertical(-1)
    }

    pub fn move_down(&mut self) -> bool {
        self.move_vertical(1)
    }

    /// Every line of the outline in document order, columns left to right.
    pub fn leaf_lines(&self) -> Vec<NodeId> {
        let mut lines = Vec::new();
        self.collect_lines(self.levels.root(), &mut lines);
        lines
    }

    fn collect_lines(&self, level: LevelId, lines: &mut Vec<NodeId>) {
        let Some(region) = self.levels.get(level) else {
            return;
        };
        for node in region.content() {
            match node {
                ContentNode::Line(line) => lines.push(line.id()),
                ContentNode::Level(child) => self.collect_lines(*child, lines),
                ContentNode::Row(row) => {
                    for column in row.columns() {
                        self.collect_lines(*column, lines);
                    }
                }
            }
        }
    }

    fn move_vertical(&mut self, delta: isize) -> bool {
        let Some((node, offset)) = self.caret_offset() else {
            return false;
        };
        match self.adjacent_line(node, delta) {
            Some(other) => {
                self.cursor.place(other, Placement::At(offset));
                true
            }
            None => false,
        }
    }

    fn adjacent_line(&self, node: NodeId, delta: isize) -> Option<NodeId> {
        let lines = self.leaf_lines();
        let index = lines.iter().position(|line| *line == node)?;
        let target = index.checked_add_signed(delta)?;
        lines.get(target).copied()
    }

    /// The caret line and the caret's character offset within it.
    pub(crate) fn caret_offset(&self) -> Option<(NodeId, usize)> {
        let Caret { node, placement } = self.cursor.caret()?;
        let len = self.levels.line(node)?.len();
        Some((node, placement.offset(len)))
    }
}

/// Shift-motions that grow or shrink the selection on the caret line.
impl Editor<MemoryCursor> {
    pub fn select_left(&mut self) -> bool {
        self.extend_selection(|offset, _| offset.saturating_sub(1))
    }

    pub fn select_right(&mut self) -> bool {
        self.extend_selection(|offset, len| (offset + 1).min(len))
    }

    pub fn select_to_line_start(&mut self) -> bool {
        self.extend_selection(|_, _| 0)
    }

    pub fn select_to_line_end(&mut self) -> bool {
        self.extend_selection(|_, len| len)
    }

    /// Moves the caret within its line and selects everything between the
    /// anchor and the new caret. The anchor is the caret position when no
    /// selection on this line is being extended.
    fn extend_selection(&mut self, motion: impl FnOnce(usize, usize) -> usize) -> bool {
        let Some((node, offset)) = self.caret_offset() else {
            return false;
        };
        let Some(line) = self.levels.line(node) else {
            return false;
        };
        let len = line.len();
        let anchor = match self.cursor.anchor() {
            Some((anchored, at)) if anchored == node => at.min(len),
            _ => offset,
        };
        let target = motion(offset, len);
        let (start, end) = (anchor.min(target), anchor.max(target));
        let text: String = line.text().chars().skip(start).take(end - start).collect();

        self.cursor.place(node, Placement::At(target));
        self.cursor.select_from((node, anchor), text);
        target != offset
    }
}
