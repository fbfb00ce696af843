use crate::model::TreeModel;

/// Outcome of removing a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Removal<Id> {
    /// The node and its subtree were detached; ids are listed in pre-order.
    Detached(Vec<Id>),
    /// The node was the only root: its content was cleared and it stays in place.
    Cleared(Id),
    /// The node is not part of the tree.
    Missing,
}

impl<Id> Removal<Id> {
    /// Returns the ids that no longer exist after the removal.
    pub fn removed(&self) -> &[Id] {
        match self {
            Self::Detached(ids) => ids,
            Self::Cleared(_) | Self::Missing => &[],
        }
    }
}

/// Structural edit interface used by `MessageTreeState::handle_edit_action`.
pub trait TreeEdit: TreeModel {
    /// Appends an empty root and returns its id.
    fn insert_root(&mut self) -> Self::Id;
    /// Appends an empty child under `parent`; `None` if the parent is unknown.
    fn insert_child(&mut self, parent: Self::Id) -> Option<Self::Id>;
    /// Removes the node with its subtree (see [`Removal`]).
    fn remove_node(&mut self, id: Self::Id) -> Removal<Self::Id>;
    /// Sets the collapse flag; returns `false` for unknown ids.
    fn set_collapsed(&mut self, id: Self::Id, collapsed: bool) -> bool;
    /// Sets the collapse flag of every node.
    fn set_all_collapsed(&mut self, collapsed: bool);
    /// Returns the node's current content.
    fn node_content(&self, id: Self::Id) -> Option<&str>;
    /// Replaces the node's content; returns `false` for unknown ids.
    fn replace_content(&mut self, id: Self::Id, content: String) -> bool;

    /// Flips the collapse flag and returns the new value.
    fn toggle_collapsed(&mut self, id: Self::Id) -> Option<bool> {
        let collapsed = !self.is_collapsed(id);
        self.set_collapsed(id, collapsed).then_some(collapsed)
    }

    /// Expands every ancestor of `id` so the node becomes visible.
    fn reveal(&mut self, id: Self::Id) {
        let mut cursor = self.parent(id);
        while let Some(parent) = cursor {
            self.set_collapsed(parent, false);
            cursor = self.parent(parent);
        }
    }
}
