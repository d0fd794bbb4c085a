use crate::cursor::{Caret, CursorService};
use crate::error::EditError;
use crate::level::{Level, LevelId, NodeKey};
use crate::registry::Registry;

use super::Editor;

impl<C: CursorService> Editor<C> {
    pub fn levels(&self) -> &Registry {
        &self.levels
    }

    pub fn cursor(&self) -> &C {
        &self.cursor
    }

    pub fn cursor_mut(&mut self) -> &mut C {
        &mut self.cursor
    }

    pub fn caret(&self) -> Option<Caret> {
        self.cursor.caret()
    }

    /// The Level whose region holds the caret line.
    pub fn current_level(&self) -> Option<LevelId> {
        self.target().map(|target| target.level)
    }

    pub fn level(&self, id: LevelId) -> Option<&Level> {
        self.levels.get(id)
    }

    pub fn region_text(&self, id: LevelId) -> String {
        self.levels.text_of(id)
    }

    /// Text of the line holding the caret.
    pub fn caret_line_text(&self) -> Option<String> {
        let caret = self.cursor.caret()?;
        self.levels.line(caret.node).map(|line| line.text())
    }

    /// Levels from the first level down to the one holding the caret.
    pub fn breadcrumbs(&self) -> Vec<LevelId> {
        let mut path = Vec::new();
        let mut current = self.current_level();
        while let Some(level) = current {
            if level == self.levels.root() {
                break;
            }
            path.push(level);
            current = self.levels.parent(level);
        }
        path.reverse();
        path
    }

    /// Depth of the Level holding the caret.
    pub fn current_depth(&self) -> Option<i32> {
        let level = self.current_level()?;
        Some(self.levels.get(level)?.depth())
    }

    pub fn check_invariants(&self) -> Result<(), EditError> {
        self.levels.check_invariants()?;
        if let Some(caret) = self.cursor.caret() {
            if self.levels.owner_of(NodeKey::Node(caret.node)).is_none() {
                return Err(EditError::InvariantViolation(format!(
                    "caret is on detached line {}",
                    caret.node
                )));
            }
        }
        Ok(())
    }
}
