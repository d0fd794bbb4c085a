use crate::level::NodeId;

/// Where inside a line the caret should land.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    Start,
    End,
    At(usize),
}

impl Placement {
    /// Resolves the placement to a character offset in a line of `len`
    /// characters.
    pub fn offset(self, len: usize) -> usize {
        match self {
            Placement::Start => 0,
            Placement::End => len,
            Placement::At(offset) => offset.min(len),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Caret {
    pub node: NodeId,
    pub placement: Placement,
}

/// The caret and selection primitives the editor relies on. A host that
/// owns real selection state (a terminal, a browser) implements this.
pub trait CursorService {
    fn caret(&self) -> Option<Caret>;

    /// Text of the live selection, `None` when the selection is collapsed.
    fn selection(&self) -> Option<String>;

    fn place(&mut self, node: NodeId, placement: Placement);
}

#[derive(Clone, Debug, Default)]
pub struct MemoryCursor {
    caret: Option<Caret>,
    selection: Option<String>,
    anchor: Option<(NodeId, usize)>,
}

impl MemoryCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.selection = if text.is_empty() { None } else { Some(text) };
    }

    /// Selects `text` and remembers where the selection started, so a later
    /// extension keeps the same fixed end.
    pub fn select_from(&mut self, anchor: (NodeId, usize), text: impl Into<String>) {
        self.select(text);
        self.anchor = Some(anchor);
    }

    /// The fixed end of a selection being extended.
    pub fn anchor(&self) -> Option<(NodeId, usize)> {
        self.anchor
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
        self.anchor = None;
    }
}

impl CursorService for MemoryCursor {
    fn caret(&self) -> Option<Caret> {
        self.caret
    }

    fn selection(&self) -> Option<String> {
        self.selection.clone()
    }

    fn place(&mut self, node: NodeId, placement: Placement) {
        self.caret = Some(Caret { node, placement });
        self.selection = None;
        self.anchor = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placement_offsets_are_clamped() {
        assert_eq!(Placement::Start.offset(5), 0);
        assert_eq!(Placement::End.offset(5), 5);
        assert_eq!(Placement::At(3).offset(5), 3);
        assert_eq!(Placement::At(9).offset(5), 5);
    }

    #[test]
    fn placing_the_caret_collapses_the_selection() {
        let mut cursor = MemoryCursor::new();
        cursor.select("abc");
        assert_eq!(cursor.selection().as_deref(), Some("abc"));

        let node = NodeId::next();
        cursor.place(node, Placement::End);
        assert_eq!(cursor.selection(), None);
        assert_eq!(
            cursor.caret(),
            Some(Caret {
                node,
                placement: Placement::End
            })
        );
    }

    #[test]
    fn placing_the_caret_forgets_the_anchor() {
        let mut cursor = MemoryCursor::new();
        let node = NodeId::next();
        cursor.select_from((node, 2), "ab");
        assert_eq!(cursor.anchor(), Some((node, 2)));

        cursor.place(node, Placement::Start);
        assert_eq!(cursor.anchor(), None);
        assert_eq!(cursor.selection(), None);
    }

    #[test]
    fn empty_selection_is_collapsed() {
        let mut cursor = MemoryCursor::new();
        cursor.select("");
        assert_eq!(cursor.selection(), None);
    }
}
