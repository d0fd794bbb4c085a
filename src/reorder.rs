//! Seam to the drag-and-drop reordering capability attached to groups of
//! sibling levels.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::level::{LevelId, NodeId};

/// A group of siblings that can be reordered as a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SortGroup {
    /// The direct nodes of a level's region.
    Region(LevelId),
    /// The columns of a row.
    Row(NodeId),
}

impl fmt::Display for SortGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortGroup::Region(level) => write!(f, "region of level {level}"),
            SortGroup::Row(row) => write!(f, "row {row}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReorderOptions {
    pub animation_ms: u32,
    pub handle_selector: String,
}

impl Default for ReorderOptions {
    fn default() -> Self {
        Self {
            animation_ms: 150,
            handle_selector: ".handle".to_string(),
        }
    }
}

pub trait Reorderer {
    /// Makes `group` reorderable, replacing any earlier attachment.
    fn attach(&mut self, group: SortGroup, options: &ReorderOptions);

    fn detach(&mut self, group: SortGroup);
}

/// Keeps track of attached groups without any drag support of its own.
/// Drops are fed back through [`crate::editor::Editor::reorder`].
#[derive(Debug, Default)]
pub struct TrackingReorderer {
    attached: HashMap<SortGroup, ReorderOptions>,
}

impl TrackingReorderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_attached(&self, group: SortGroup) -> bool {
        self.attached.contains_key(&group)
    }

    pub fn options(&self, group: SortGroup) -> Option<&ReorderOptions> {
        self.attached.get(&group)
    }

    pub fn len(&self) -> usize {
        self.attached.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attached.is_empty()
    }
}

impl Reorderer for TrackingReorderer {
    fn attach(&mut self, group: SortGroup, options: &ReorderOptions) {
        self.attached.insert(group, options.clone());
    }

    fn detach(&mut self, group: SortGroup) {
        self.attached.remove(&group);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;

    #[test]
    fn attach_replaces_previous_options() {
        let level = Registry::new().root();
        let group = SortGroup::Region(level);
        let mut reorderer = TrackingReorderer::new();

        reorderer.attach(group, &ReorderOptions::default());
        reorderer.attach(
            group,
            &ReorderOptions {
                animation_ms: 0,
                handle_selector: ".grip".into(),
            },
        );

        assert_eq!(reorderer.len(), 1);
        assert_eq!(reorderer.options(group).unwrap().animation_ms, 0);

        reorderer.detach(group);
        assert!(!reorderer.is_attached(group));
    }
}
