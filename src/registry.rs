use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use crate::error::EditError;
use crate::level::{ContentNode, Level, LevelId, Line, NodeId, NodeKey};

struct Entry {
    level: Level,
    parent: Option<LevelId>,
}

/// Where a Level's visual root sits inside its parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Location {
    /// Directly in the parent's region, at `index`.
    Region { owner: LevelId, index: usize },
    /// As column `column` of the row at `index` in the parent's region.
    Row {
        owner: LevelId,
        index: usize,
        row: NodeId,
        column: usize,
    },
}

impl Location {
    pub fn owner(&self) -> LevelId {
        match *self {
            Location::Region { owner, .. } | Location::Row { owner, .. } => owner,
        }
    }

    pub fn index(&self) -> usize {
        match *self {
            Location::Region { index, .. } | Location::Row { index, .. } => index,
        }
    }
}

/// Owns every live Level and the child to parent back references. The
/// outline structure itself lives in the content regions.
pub struct Registry {
    root: LevelId,
    entries: HashMap<LevelId, Entry>,
    /// Last known owner of every line and row. A hit is confirmed against
    /// the owner's region; a stale or missing entry rebuilds the map.
    owners: RefCell<HashMap<NodeId, LevelId>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Creates the synthetic root holding a single empty first level.
    pub fn new() -> Self {
        let mut root = Level::new_root();
        let first = Level::new(0);
        let root_id = root.id();
        let first_id = first.id();
        root.write(ContentNode::Level(first_id), None);

        let mut entries = HashMap::new();
        entries.insert(
            root_id,
            Entry {
                level: root,
                parent: None,
            },
        );
        entries.insert(
            first_id,
            Entry {
                level: first,
                parent: Some(root_id),
            },
        );
        Self {
            root: root_id,
            entries,
            owners: RefCell::default(),
        }
    }

    pub fn root(&self) -> LevelId {
        self.root
    }

    pub fn first_level(&self) -> Option<LevelId> {
        self.get(self.root)?.first_key()?.as_level()
    }

    /// Registers a fresh Level one step deeper than `parent`. The caller is
    /// expected to attach its visual root to the parent's region.
    pub fn make_child(&mut self, parent: LevelId) -> Result<LevelId, EditError> {
        let depth = self.get(parent).ok_or(EditError::Detached(parent))?.depth();
        let level = Level::new(depth + 1);
        let id = level.id();
        self.entries.insert(
            id,
            Entry {
                level,
                parent: Some(parent),
            },
        );
        Ok(id)
    }

    pub fn get(&self, id: LevelId) -> Option<&Level> {
        self.entries.get(&id).map(|entry| &entry.level)
    }

    pub fn get_mut(&mut self, id: LevelId) -> Option<&mut Level> {
        self.entries.get_mut(&id).map(|entry| &mut entry.level)
    }

    pub fn level(&self, id: LevelId) -> Result<&Level, EditError> {
        self.get(id).ok_or(EditError::Detached(id))
    }

    pub fn level_mut(&mut self, id: LevelId) -> Result<&mut Level, EditError> {
        self.get_mut(id).ok_or(EditError::Detached(id))
    }

    pub fn contains(&self, id: LevelId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn parent(&self, id: LevelId) -> Option<LevelId> {
        self.entries.get(&id).and_then(|entry| entry.parent)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = LevelId> + '_ {
        self.entries.keys().copied()
    }

    /// The first line in document order below `level`, descending into
    /// nested levels and first columns.
    pub fn first_line(&self, level: LevelId) -> Option<NodeId> {
        match self.get(level)?.content().first()? {
            ContentNode::Line(line) => Some(line.id()),
            ContentNode::Level(child) => self.first_line(*child),
            ContentNode::Row(row) => self.first_line(*row.columns().first()?),
        }
    }

    pub fn last_line(&self, level: LevelId) -> Option<NodeId> {
        match self.get(level)?.content().last()? {
            ContentNode::Line(line) => Some(line.id()),
            ContentNode::Level(child) => self.last_line(*child),
            ContentNode::Row(row) => self.last_line(*row.columns().last()?),
        }
    }

    /// The Level whose region directly contains `key`.
    pub fn owner_of(&self, key: NodeKey) -> Option<LevelId> {
        match key {
            NodeKey::Level(id) => match self.locate(id)? {
                Location::Region { owner, .. } => Some(owner),
                Location::Row { .. } => None,
            },
            NodeKey::Node(node) => {
                let cached = self.owners.borrow().get(&node).copied();
                let confirmed = cached
                    .filter(|owner| self.get(*owner).is_some_and(|level| level.contains(key)));
                if confirmed.is_some() {
                    return confirmed;
                }
                self.reindex();
                self.owners.borrow().get(&node).copied()
            }
        }
    }

    fn reindex(&self) {
        let owners: HashMap<NodeId, LevelId> = self
            .entries
            .iter()
            .flat_map(|(id, entry)| {
                entry.level.content().iter().filter_map(move |node| match node.key() {
                    NodeKey::Node(node) => Some((node, *id)),
                    NodeKey::Level(_) => None,
                })
            })
            .collect();
        *self.owners.borrow_mut() = owners;
    }

    pub fn line(&self, node: NodeId) -> Option<&Line> {
        let owner = self.owner_of(NodeKey::Node(node))?;
        self.get(owner)?.line(node)
    }

    pub fn line_mut(&mut self, node: NodeId) -> Option<&mut Line> {
        let owner = self.owner_of(NodeKey::Node(node))?;
        self.get_mut(owner)?.line_mut(node)
    }

    pub fn locate(&self, level: LevelId) -> Option<Location> {
        let owner = self.parent(level)?;
        let region = self.get(owner)?;
        if let Some(index) = region.position_of(NodeKey::Level(level)) {
            return Some(Location::Region { owner, index });
        }
        region
            .content()
            .iter()
            .enumerate()
            .find_map(|(index, node)| {
                let row = node.as_row()?;
                let column = row.position_of(level)?;
                Some(Location::Row {
                    owner,
                    index,
                    row: row.id(),
                    column,
                })
            })
    }

    /// Drops the registry entries of every Level inside `node`, returning
    /// the released ids.
    pub fn release(&mut self, node: ContentNode) -> Vec<LevelId> {
        let mut released = Vec::new();
        match node {
            ContentNode::Line(_) => {}
            ContentNode::Level(id) => self.release_level(id, &mut released),
            ContentNode::Row(row) => {
                for column in row.columns() {
                    self.release_level(*column, &mut released);
                }
            }
        }
        released
    }

    fn release_level(&mut self, id: LevelId, released: &mut Vec<LevelId>) {
        let Some(entry) = self.entries.remove(&id) else {
            return;
        };
        released.push(id);
        let mut level = entry.level;
        for node in level.clear() {
            match node {
                ContentNode::Line(_) => {}
                ContentNode::Level(child) => self.release_level(child, released),
                ContentNode::Row(row) => {
                    for column in row.columns() {
                        self.release_level(*column, released);
                    }
                }
            }
        }
    }

    /// Text of a region with nested levels and columns inlined, one line per
    /// text line.
    pub fn text_of(&self, level: LevelId) -> String {
        let Some(region) = self.get(level) else {
            return String::new();
        };
        region
            .content()
            .iter()
            .map(|node| match node {
                ContentNode::Line(line) => line.text(),
                ContentNode::Level(child) => self.text_of(*child),
                ContentNode::Row(row) => row
                    .columns()
                    .iter()
                    .map(|column| self.text_of(*column))
                    .collect::<Vec<_>>()
                    .join("\n"),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Verifies the structural invariants of the whole outline.
    pub fn check_invariants(&self) -> Result<(), EditError> {
        let violation = |message: String| Err(EditError::InvariantViolation(message));

        let Some(root) = self.entries.get(&self.root) else {
            return violation("root is not registered".into());
        };
        if root.parent.is_some() || root.level.depth() != -1 || root.level.has_handle() {
            return violation("root must be a handleless level at depth -1".into());
        }
        if root.level.is_empty() || !root.level.content().iter().all(ContentNode::is_level) {
            return violation("root region must hold levels only".into());
        }

        let mut seen_lines = HashSet::new();
        for (id, entry) in &self.entries {
            let level = &entry.level;
            if level.is_empty() {
                return violation(format!("level {id} has an empty region"));
            }
            for node in level.content() {
                if let ContentNode::Line(line) = node {
                    if !seen_lines.insert(line.id()) {
                        return violation(format!("line {} appears twice", line.id()));
                    }
                }
                if let ContentNode::Row(row) = node {
                    if row.columns().is_empty() {
                        return violation(format!("row {} in level {id} is empty", row.id()));
                    }
                    for column in row.columns() {
                        let flagged = self.get(*column).is_some_and(Level::is_column);
                        if !flagged || self.parent(*column) != Some(*id) {
                            return violation(format!("column {column} of row {} is detached", row.id()));
                        }
                    }
                }
            }

            if *id == self.root {
                continue;
            }
            let Some(parent) = entry.parent.and_then(|parent| self.get(parent)) else {
                return violation(format!("level {id} has no registered parent"));
            };
            if level.depth() != parent.depth() + 1 {
                return violation(format!(
                    "level {id} has depth {} under a parent at depth {}",
                    level.depth(),
                    parent.depth()
                ));
            }
            if !level.has_handle() {
                return violation(format!("level {id} has no handle"));
            }
            let occurrences = parent
                .content()
                .iter()
                .map(|node| match node {
                    ContentNode::Level(child) => usize::from(child == id),
                    ContentNode::Row(row) => row.columns().iter().filter(|c| *c == id).count(),
                    ContentNode::Line(_) => 0,
                })
                .sum::<usize>();
            if occurrences != 1 {
                return violation(format!("level {id} appears {occurrences} times in its parent"));
            }
            let in_row = matches!(self.locate(*id), Some(Location::Row { .. }));
            if in_row != level.is_column() {
                return violation(format!("column flag of level {id} does not match its position"));
            }
        }

        let reachable = self.count_reachable(self.root);
        if reachable != self.entries.len() {
            return violation(format!(
                "{} registered levels but only {reachable} reachable from the root",
                self.entries.len()
            ));
        }
        Ok(())
    }

    fn count_reachable(&self, id: LevelId) -> usize {
        let Some(level) = self.get(id) else {
            return 0;
        };
        1 + level
            .content()
            .iter()
            .map(|node| match node {
                ContentNode::Line(_) => 0,
                ContentNode::Level(child) => self.count_reachable(*child),
                ContentNode::Row(row) => row
                    .columns()
                    .iter()
                    .map(|column| self.count_reachable(*column))
                    .sum(),
            })
            .sum::<usize>()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod registry_tests;
