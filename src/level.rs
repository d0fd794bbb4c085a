use std::{fmt, mem};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::cursor::{CursorService, Placement};
use crate::registry::Registry;

mod line;

pub use line::Line;
pub(crate) use line::{char_to_byte_idx, paragraph_text};

static NEXT_LEVEL_ID: AtomicU64 = AtomicU64::new(0);
static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(0);

/// Identifies a [`Level`] for the lifetime of the process. Ids are handed
/// out in increasing order and never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LevelId(u64);

impl LevelId {
    fn next() -> Self {
        Self(NEXT_LEVEL_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies a line or row inside a content region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    pub(crate) fn next() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Reference to a direct member of a content region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKey {
    Node(NodeId),
    Level(LevelId),
}

impl NodeKey {
    pub fn as_level(self) -> Option<LevelId> {
        match self {
            NodeKey::Level(id) => Some(id),
            NodeKey::Node(_) => None,
        }
    }
}

impl From<NodeId> for NodeKey {
    fn from(id: NodeId) -> Self {
        NodeKey::Node(id)
    }
}

impl From<LevelId> for NodeKey {
    fn from(id: LevelId) -> Self {
        NodeKey::Level(id)
    }
}

/// A lateral group of column levels rendered side by side.
#[derive(Debug, PartialEq)]
pub struct Row {
    id: NodeId,
    columns: Vec<LevelId>,
}

impl Row {
    pub(crate) fn new(columns: Vec<LevelId>) -> Self {
        Self {
            id: NodeId::next(),
            columns,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn columns(&self) -> &[LevelId] {
        &self.columns
    }

    pub(crate) fn columns_mut(&mut self) -> &mut Vec<LevelId> {
        &mut self.columns
    }

    pub fn position_of(&self, level: LevelId) -> Option<usize> {
        self.columns.iter().position(|column| *column == level)
    }
}

#[derive(Debug, PartialEq)]
pub enum ContentNode {
    Line(Line),
    Level(LevelId),
    Row(Row),
}

impl ContentNode {
    pub fn key(&self) -> NodeKey {
        match self {
            ContentNode::Line(line) => NodeKey::Node(line.id()),
            ContentNode::Level(id) => NodeKey::Level(*id),
            ContentNode::Row(row) => NodeKey::Node(row.id()),
        }
    }

    pub fn as_line(&self) -> Option<&Line> {
        match self {
            ContentNode::Line(line) => Some(line),
            _ => None,
        }
    }

    pub fn as_level(&self) -> Option<LevelId> {
        match self {
            ContentNode::Level(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_row(&self) -> Option<&Row> {
        match self {
            ContentNode::Row(row) => Some(row),
            _ => None,
        }
    }

    pub fn is_level(&self) -> bool {
        matches!(self, ContentNode::Level(_))
    }
}

impl From<Line> for ContentNode {
    fn from(line: Line) -> Self {
        ContentNode::Line(line)
    }
}

/// One node of the outline: an editable content region plus the decoration
/// needed to reorder it.
#[derive(Debug)]
pub struct Level {
    id: LevelId,
    depth: i32,
    content: Vec<ContentNode>,
    handle: bool,
    column: bool,
}

impl Level {
    pub(crate) fn new(depth: i32) -> Self {
        Self {
            id: LevelId::next(),
            depth,
            content: vec![ContentNode::Line(Line::empty())],
            handle: true,
            column: false,
        }
    }

    /// The synthetic root: no handle, and an empty region that is filled with
    /// the first level right after construction.
    pub(crate) fn new_root() -> Self {
        Self {
            id: LevelId::next(),
            depth: -1,
            content: Vec::new(),
            handle: false,
            column: false,
        }
    }

    pub fn id(&self) -> LevelId {
        self.id
    }

    pub fn depth(&self) -> i32 {
        self.depth
    }

    pub fn has_handle(&self) -> bool {
        self.handle
    }

    pub fn is_column(&self) -> bool {
        self.column
    }

    pub(crate) fn set_column(&mut self, column: bool) {
        self.column = column;
    }

    pub fn content(&self) -> &[ContentNode] {
        &self.content
    }

    pub(crate) fn content_mut(&mut self) -> &mut Vec<ContentNode> {
        &mut self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn position_of(&self, key: NodeKey) -> Option<usize> {
        self.content.iter().position(|node| node.key() == key)
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.position_of(key).is_some()
    }

    pub fn first_key(&self) -> Option<NodeKey> {
        self.content.first().map(ContentNode::key)
    }

    pub fn last_key(&self) -> Option<NodeKey> {
        self.content.last().map(ContentNode::key)
    }

    /// The node directly after `key` in this region.
    pub fn node_after(&self, key: NodeKey) -> Option<&ContentNode> {
        let idx = self.position_of(key)?;
        self.content.get(idx + 1)
    }

    pub fn line(&self, id: NodeId) -> Option<&Line> {
        self.content.iter().find_map(|node| match node {
            ContentNode::Line(line) if line.id() == id => Some(line),
            _ => None,
        })
    }

    pub(crate) fn line_mut(&mut self, id: NodeId) -> Option<&mut Line> {
        self.content.iter_mut().find_map(|node| match node {
            ContentNode::Line(line) if line.id() == id => Some(line),
            _ => None,
        })
    }

    pub fn row(&self, id: NodeId) -> Option<&Row> {
        self.content.iter().find_map(|node| match node {
            ContentNode::Row(row) if row.id() == id => Some(row),
            _ => None,
        })
    }

    pub(crate) fn row_mut(&mut self, id: NodeId) -> Option<&mut Row> {
        self.content.iter_mut().find_map(|node| match node {
            ContentNode::Row(row) if row.id() == id => Some(row),
            _ => None,
        })
    }

    /// Inserts `node` right after `preceding`. Without a preceding node, or
    /// when it is not a member of this region, the node is appended.
    pub fn write(&mut self, node: ContentNode, preceding: Option<NodeKey>) {
        match preceding.and_then(|key| self.position_of(key)) {
            Some(idx) => self.content.insert(idx + 1, node),
            None => self.content.push(node),
        }
    }

    /// Writes `node` after `target` and then removes `target`, handing the
    /// removed node back so the caller can release it.
    pub fn overwrite(&mut self, node: ContentNode, target: Option<NodeKey>) -> Option<ContentNode> {
        self.write(node, target);
        self.remove(target?)
    }

    pub fn remove(&mut self, key: NodeKey) -> Option<ContentNode> {
        let idx = self.position_of(key)?;
        Some(self.content.remove(idx))
    }

    /// Empties the region. The caller must put something back before the
    /// command returns.
    pub fn clear(&mut self) -> Vec<ContentNode> {
        mem::take(&mut self.content)
    }

    /// True when `key` is an empty line sitting at the end of a region that
    /// has other nodes too. Such lines are dropped before restructuring.
    pub fn is_trailing_empty_line(&self, key: NodeKey) -> bool {
        if self.content.len() <= 1 || self.last_key() != Some(key) {
            return false;
        }
        matches!(self.content.last(), Some(ContentNode::Line(line)) if line.is_empty())
    }

    pub fn focus_start(&self, levels: &Registry, cursor: &mut dyn CursorService) {
        if let Some(target) = levels.first_line(self.id) {
            cursor.place(target, Placement::Start);
        }
    }

    pub fn focus_end(&self, levels: &Registry, cursor: &mut dyn CursorService) {
        if let Some(target) = levels.last_line(self.id) {
            cursor.place(target, Placement::End);
        }
    }

    pub fn focus_to(&self, node: NodeId, cursor: &mut dyn CursorService) {
        cursor.place(node, Placement::End);
    }
}

#[cfg(test)]
#[path = "level_tests.rs"]
mod level_tests;
