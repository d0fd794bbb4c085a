use crate::cursor::CursorService;
use crate::error::EditError;
use crate::level::{ContentNode, LevelId, Line, NodeId, NodeKey, Row};
use crate::registry::Location;
use crate::reorder::SortGroup;

use super::{Editor, Outcome, Target};

/// Which neighbour of a Level's visual root to look at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Side {
    Before,
    After,
}

/// The node next to a Level's visual root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Neighbour {
    Line(NodeId),
    Level(LevelId),
    Row(NodeId),
}

impl Neighbour {
    pub(crate) fn level(self) -> Option<LevelId> {
        match self {
            Neighbour::Level(id) => Some(id),
            _ => None,
        }
    }
}

impl<C: CursorService> Editor<C> {
    // ========================================================================
    // Commands
    // ========================================================================

    pub(super) fn indent(&mut self, target: Target) -> Result<Outcome, EditError> {
        let key = NodeKey::Node(target.node);
        let next = self
            .levels
            .level(target.level)?
            .node_after(key)
            .and_then(ContentNode::as_level);
        self.drop_trailing_empty(target.level, target.node)?;

        if let Some(next) = next {
            self.focus_start(next);
            return Ok(Outcome::Handled);
        }

        let child = self.levels.make_child(target.level)?;
        self.levels
            .level_mut(target.level)?
            .write(ContentNode::Level(child), Some(key));
        self.focus_start(child);
        tracing::debug!(parent = %target.level, %child, "indented into new level");
        Ok(Outcome::Handled)
    }

    pub(super) fn outdent(&mut self, target: Target) -> Result<Outcome, EditError> {
        let Some(parent) = self.levels.parent(target.level) else {
            return Ok(Outcome::Handled);
        };
        if parent == self.levels.root() {
            return Ok(Outcome::Handled);
        }
        self.drop_trailing_empty(target.level, target.node)?;

        match self.sibling(target.level, Side::After) {
            Some(Neighbour::Line(line)) => self.focus_to(parent, line),
            _ => {
                self.levels
                    .level_mut(parent)?
                    .write(Line::empty().into(), None);
                self.focus_end(parent);
            }
        }
        Ok(Outcome::Handled)
    }

    pub(super) fn split_horizontal(&mut self, target: Target) -> Result<Outcome, EditError> {
        self.split_level(target.level, Some(target.node))?;
        Ok(Outcome::Handled)
    }

    pub(super) fn split_vertical(&mut self, target: Target) -> Result<Outcome, EditError> {
        let location = self
            .levels
            .locate(target.level)
            .ok_or(EditError::Detached(target.level))?;

        if let Location::Row {
            owner, row, column, ..
        } = location
        {
            let added = self.build_row(owner, 1)?.columns()[0];
            self.levels
                .level_mut(owner)?
                .row_mut(row)
                .ok_or(EditError::Detached(target.level))?
                .columns_mut()
                .insert(column + 1, added);
            self.attach_row_reordering(row);
            self.focus_start(added);
            return Ok(Outcome::Handled);
        }

        let row = self.build_row(target.level, 2)?;
        let (left, right, row_id) = (row.columns()[0], row.columns()[1], row.id());
        let region = self.levels.level_mut(target.level)?;
        let moved = region.overwrite(ContentNode::Row(row), Some(NodeKey::Node(target.node)));
        region.write(Line::empty().into(), None);

        let left_region = self.levels.level_mut(left)?;
        left_region.clear();
        if let Some(moved) = moved {
            left_region.write(moved, None);
        } else {
            left_region.write(Line::empty().into(), None);
        }

        self.attach_row_reordering(row_id);
        self.focus_start(right);
        Ok(Outcome::Handled)
    }

    pub(super) fn erase(&mut self, target: Target) -> Result<Outcome, EditError> {
        let region = self.levels.level(target.level)?;
        let short = region
            .line(target.node)
            .is_some_and(|line| line.len() <= 1);
        if region.len() != 1 || !short {
            return Ok(Outcome::Unhandled);
        }

        self.replace_region(target.level, Line::empty())?;
        self.focus_start(target.level);
        Ok(Outcome::Handled)
    }

    pub(super) fn move_level_up(&mut self, target: Target) -> Result<Outcome, EditError> {
        self.swap_with_neighbour(target, Side::Before)
    }

    pub(super) fn move_level_down(&mut self, target: Target) -> Result<Outcome, EditError> {
        self.swap_with_neighbour(target, Side::After)
    }

    pub(super) fn cursor_up(&mut self, target: Target) -> Result<Outcome, EditError> {
        let region = self.levels.level(target.level)?;
        if region.first_key() != Some(NodeKey::Node(target.node)) {
            return Ok(Outcome::Unhandled);
        }
        match self.sibling(target.level, Side::Before).and_then(Neighbour::level) {
            Some(previous) => {
                self.focus_end(previous);
                Ok(Outcome::Handled)
            }
            None => Ok(Outcome::Unhandled),
        }
    }

    pub(super) fn cursor_down(&mut self, target: Target) -> Result<Outcome, EditError> {
        let region = self.levels.level(target.level)?;
        if region.last_key() != Some(NodeKey::Node(target.node)) {
            return Ok(Outcome::Unhandled);
        }
        match self.sibling(target.level, Side::After).and_then(Neighbour::level) {
            Some(next) => {
                self.focus_start(next);
                Ok(Outcome::Handled)
            }
            None => Ok(Outcome::Unhandled),
        }
    }

    // ========================================================================
    // Shared primitives
    // ========================================================================

    /// Creates a new sibling after `level` and focuses its start. A column
    /// gets a whole new row of the same width right after its own row.
    /// Returns the Level that received focus.
    pub(super) fn split_level(
        &mut self,
        level: LevelId,
        node: Option<NodeId>,
    ) -> Result<LevelId, EditError> {
        let location = self
            .levels
            .locate(level)
            .ok_or(EditError::NoParent(level))?;

        match location {
            Location::Row { owner, row, .. } => {
                let width = self
                    .levels
                    .level(owner)?
                    .row(row)
                    .map_or(1, |row| row.columns().len().max(1));
                let new_row = self.build_row(owner, width)?;
                let first = new_row.columns()[0];
                let new_row_id = new_row.id();
                self.levels
                    .level_mut(owner)?
                    .write(ContentNode::Row(new_row), Some(NodeKey::Node(row)));
                self.attach_row_reordering(new_row_id);
                self.focus_start(first);
                Ok(first)
            }
            Location::Region { owner, .. } => {
                if let Some(node) = node {
                    self.drop_trailing_empty(level, node)?;
                }
                let sibling = self.levels.make_child(owner)?;
                self.levels
                    .level_mut(owner)?
                    .write(ContentNode::Level(sibling), Some(NodeKey::Level(level)));
                self.focus_start(sibling);
                self.attach_reordering(SortGroup::Region(owner));
                Ok(sibling)
            }
        }
    }

    /// Registers `width` fresh column Levels under `owner` and groups them
    /// into a row. The caller places the row.
    pub(super) fn build_row(&mut self, owner: LevelId, width: usize) -> Result<Row, EditError> {
        let mut columns = Vec::with_capacity(width);
        for _ in 0..width {
            let column = self.levels.make_child(owner)?;
            self.levels.level_mut(column)?.set_column(true);
            columns.push(column);
        }
        Ok(Row::new(columns))
    }

    pub(super) fn attach_row_reordering(&mut self, row: NodeId) {
        self.attach_reordering(SortGroup::Row(row));
    }

    /// Removes `node` from `level` when it is an empty line trailing other
    /// content.
    pub(super) fn drop_trailing_empty(
        &mut self,
        level: LevelId,
        node: NodeId,
    ) -> Result<bool, EditError> {
        let region = self.levels.level_mut(level)?;
        let key = NodeKey::Node(node);
        if !region.is_trailing_empty_line(key) {
            return Ok(false);
        }
        if let Some(removed) = region.remove(key) {
            self.discard(removed);
        }
        Ok(true)
    }

    /// Clears `level` and leaves `line` as its only content.
    pub(super) fn replace_region(&mut self, level: LevelId, line: Line) -> Result<NodeId, EditError> {
        let id = line.id();
        let region = self.levels.level_mut(level)?;
        let removed = region.clear();
        region.write(line.into(), None);
        for node in removed {
            self.discard(node);
        }
        Ok(id)
    }

    /// What sits next to `level`'s visual root: the neighbouring column
    /// inside a row, otherwise the neighbouring node of the parent's region.
    pub(crate) fn sibling(&self, level: LevelId, side: Side) -> Option<Neighbour> {
        let location = self.levels.locate(level)?;
        let region = self.levels.get(location.owner())?;
        match location {
            Location::Region { index, .. } => {
                let node = neighbour(region.content(), index, side)?;
                Some(match node {
                    ContentNode::Line(line) => Neighbour::Line(line.id()),
                    ContentNode::Level(id) => Neighbour::Level(*id),
                    ContentNode::Row(row) => Neighbour::Row(row.id()),
                })
            }
            Location::Row { row, column, .. } => {
                let columns = region.row(row)?.columns();
                neighbour(columns, column, side).map(|id| Neighbour::Level(*id))
            }
        }
    }

    fn swap_with_neighbour(&mut self, target: Target, side: Side) -> Result<Outcome, EditError> {
        let location = self
            .levels
            .locate(target.level)
            .ok_or(EditError::NoParent(target.level))?;

        match location {
            Location::Region { owner, index } => {
                let content = self.levels.level_mut(owner)?.content_mut();
                if let Some(other) = neighbour_index(content.len(), index, side) {
                    content.swap(index, other);
                }
            }
            Location::Row {
                owner, row, column, ..
            } => {
                let columns = self
                    .levels
                    .level_mut(owner)?
                    .row_mut(row)
                    .ok_or(EditError::Detached(target.level))?
                    .columns_mut();
                if let Some(other) = neighbour_index(columns.len(), column, side) {
                    columns.swap(column, other);
                }
            }
        }
        self.focus_to(target.level, target.node);
        Ok(Outcome::Handled)
    }
}

fn neighbour_index(len: usize, index: usize, side: Side) -> Option<usize> {
    match side {
        Side::Before => index.checked_sub(1),
        Side::After => (index + 1 < len).then_some(index + 1),
    }
}

fn neighbour<T>(items: &[T], index: usize, side: Side) -> Option<&T> {
    items.get(neighbour_index(items.len(), index, side)?)
}
