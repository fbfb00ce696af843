use std::fmt;

use rustc_hash::{FxBuildHasher, FxHashMap};
use tracing::debug;

use crate::codec::MessageData;
use crate::edit::{Removal, TreeEdit};
use crate::model::{PreOrder, TreeModel};

/// Synthetic node identifier, unique within one [`MessageTree`].
///
/// Ids correlate view rows with store entries and are never persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Returns the raw counter value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

/// A single chatbot prompt message.
#[derive(Clone, Debug, Default)]
pub struct MessageNode {
    content: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    collapsed: bool,
}

impl MessageNode {
    /// Raw content as typed, untrimmed.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Whether the node's children are hidden in the editor.
    pub const fn is_collapsed(&self) -> bool {
        self.collapsed
    }
}

/// Arena-backed forest of messages.
///
/// The store owns every node. Parent/child relations are id links into the
/// node table, and the id counter belongs to this instance only, so several
/// editors can live side by side without collisions.
#[derive(Clone, Debug, Default)]
pub struct MessageTree {
    nodes: FxHashMap<NodeId, MessageNode>,
    roots: Vec<NodeId>,
    next_id: u64,
}

impl MessageTree {
    /// Creates an empty forest (zero roots).
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: FxHashMap::with_capacity_and_hasher(capacity, FxBuildHasher),
            roots: Vec::new(),
            next_id: 0,
        }
    }

    /// Seeds a forest from previously saved data and guarantees at least one root.
    pub fn from_data(data: &[MessageData]) -> Self {
        let mut tree = Self::with_capacity(data.iter().map(MessageData::node_count).sum());
        for root in data {
            tree.add_root(root.content.as_str(), &root.children);
        }
        tree.ensure_root();
        tree
    }

    /// Appends a root built from `content` and a nested `children` description.
    pub fn add_root(&mut self, content: impl Into<String>, children: &[MessageData]) -> NodeId {
        let id = self.alloc(None, content.into());
        self.roots.push(id);
        self.build_children(id, children);
        debug!(node = %id, roots = self.roots.len(), "added root message");
        id
    }

    /// Appends a child under `parent`; returns `None` if `parent` is not in the tree.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        content: impl Into<String>,
        children: &[MessageData],
    ) -> Option<NodeId> {
        if !self.nodes.contains_key(&parent) {
            debug!(parent = %parent, "add_child on unknown parent ignored");
            return None;
        }
        let id = self.attach(parent, content.into());
        self.build_children(id, children);
        debug!(node = %id, parent = %parent, "added child message");
        Some(id)
    }

    /// Removes `id` with its whole subtree.
    ///
    /// The only remaining root is never detached: its content is cleared instead
    /// and its children are kept.
    pub fn remove(&mut self, id: NodeId) -> Removal<NodeId> {
        let Some(node) = self.nodes.get_mut(&id) else {
            return Removal::Missing;
        };

        match node.parent {
            None if self.roots.len() == 1 => {
                node.content.clear();
                debug!(node = %id, "cleared last root instead of removing it");
                return Removal::Cleared(id);
            }
            None => self.roots.retain(|&root| root != id),
            Some(parent) => {
                if let Some(parent_node) = self.nodes.get_mut(&parent) {
                    parent_node.children.retain(|&child| child != id);
                }
            }
        }

        let removed: Vec<NodeId> = self.subtree_ids(id);
        for removed_id in &removed {
            self.nodes.remove(removed_id);
        }
        debug!(node = %id, removed = removed.len(), "removed message subtree");
        Removal::Detached(removed)
    }

    /// Flips the collapse flag and returns the new value.
    pub fn toggle_collapsed(&mut self, id: NodeId) -> Option<bool> {
        let node = self.nodes.get_mut(&id)?;
        node.collapsed = !node.collapsed;
        Some(node.collapsed)
    }

    /// Sets the collapse flag; returns `false` for unknown ids.
    pub fn set_collapsed(&mut self, id: NodeId, collapsed: bool) -> bool {
        self.nodes.get_mut(&id).is_some_and(|node| {
            node.collapsed = collapsed;
            true
        })
    }

    /// Collapses or expands every node.
    pub fn set_all_collapsed(&mut self, collapsed: bool) {
        for node in self.nodes.values_mut() {
            node.collapsed = collapsed;
        }
    }

    /// Returns `true` when there are no roots.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Adds an empty root if the forest has none; returns the new root's id.
    pub fn ensure_root(&mut self) -> Option<NodeId> {
        self.is_empty().then(|| self.add_root("", &[]))
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> Option<&MessageNode> {
        self.nodes.get(&id)
    }

    pub fn content(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(&id).map(MessageNode::content)
    }

    /// Replaces the node's content; returns `false` for unknown ids.
    pub fn set_content(&mut self, id: NodeId, content: impl Into<String>) -> bool {
        self.nodes.get_mut(&id).is_some_and(|node| {
            node.content = content.into();
            true
        })
    }

    pub fn is_root(&self, id: NodeId) -> bool {
        self.nodes
            .get(&id)
            .is_some_and(|node| node.parent.is_none())
    }

    /// Number of nodes in the subtree rooted at `id` (0 for unknown ids).
    pub fn subtree_len(&self, id: NodeId) -> usize {
        PreOrder::subtree(self, id).count()
    }

    /// Walks every node, parents before children and siblings in order.
    pub fn pre_order(&self) -> PreOrder<'_, Self> {
        PreOrder::new(self)
    }

    fn subtree_ids(&self, id: NodeId) -> Vec<NodeId> {
        PreOrder::subtree(self, id).collect()
    }

    fn alloc(&mut self, parent: Option<NodeId>, content: String) -> NodeId {
        self.next_id += 1;
        let id = NodeId(self.next_id);
        self.nodes.insert(
            id,
            MessageNode {
                content,
                parent,
                children: Vec::new(),
                collapsed: false,
            },
        );
        id
    }

    fn attach(&mut self, parent: NodeId, content: String) -> NodeId {
        let id = self.alloc(Some(parent), content);
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.push(id);
        }
        id
    }

    // Attaches nested data in pre-order without recursing, so saved trees of any depth load.
    fn build_children(&mut self, parent: NodeId, children: &[MessageData]) {
        let mut stack: Vec<(NodeId, &MessageData)> =
            children.iter().rev().map(|child| (parent, child)).collect();
        while let Some((parent, child)) = stack.pop() {
            let id = self.attach(parent, child.content.clone());
            stack.extend(child.children.iter().rev().map(|grandchild| (id, grandchild)));
        }
    }
}

impl TreeModel for MessageTree {
    type Id = NodeId;

    fn roots(&self) -> &[Self::Id] {
        &self.roots
    }

    fn children(&self, id: Self::Id) -> &[Self::Id] {
        self.nodes
            .get(&id)
            .map_or(&[], |node| node.children.as_slice())
    }

    fn parent(&self, id: Self::Id) -> Option<Self::Id> {
        self.nodes.get(&id).and_then(|node| node.parent)
    }

    fn contains(&self, id: Self::Id) -> bool {
        self.nodes.contains_key(&id)
    }

    fn is_collapsed(&self, id: Self::Id) -> bool {
        self.nodes.get(&id).is_some_and(|node| node.collapsed)
    }

    fn size_hint(&self) -> usize {
        self.nodes.len()
    }
}

impl TreeEdit for MessageTree {
    fn insert_root(&mut self) -> Self::Id {
        self.add_root("", &[])
    }

    fn insert_child(&mut self, parent: Self::Id) -> Option<Self::Id> {
        self.add_child(parent, "", &[])
    }

    fn remove_node(&mut self, id: Self::Id) -> Removal<Self::Id> {
        self.remove(id)
    }

    fn set_collapsed(&mut self, id: Self::Id, collapsed: bool) -> bool {
        Self::set_collapsed(self, id, collapsed)
    }

    fn set_all_collapsed(&mut self, collapsed: bool) {
        Self::set_all_collapsed(self, collapsed);
    }

    fn node_content(&self, id: Self::Id) -> Option<&str> {
        self.content(id)
    }

    fn replace_content(&mut self, id: Self::Id, content: String) -> bool {
        self.set_content(id, content)
    }

    fn toggle_collapsed(&mut self, id: Self::Id) -> Option<bool> {
        Self::toggle_collapsed(self, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(content: &str, children: Vec<MessageData>) -> MessageData {
        MessageData::new(content, children)
    }

    #[test]
    fn add_root_builds_nested_children_in_order() {
        let mut tree = MessageTree::new();
        let root = tree.add_root(
            "menu",
            &[
                data("option a", vec![data("deep", vec![])]),
                data("option b", vec![]),
            ],
        );

        assert_eq!(tree.len(), 4);
        let children = tree.node(root).map(MessageNode::children).unwrap_or_default();
        assert_eq!(children.len(), 2);
        assert_eq!(tree.content(children[0]), Some("option a"));
        assert_eq!(tree.content(children[1]), Some("option b"));
        assert_eq!(tree.parent(children[0]), Some(root));
        assert_eq!(tree.children(children[0]).len(), 1);
    }

    #[test]
    fn add_child_to_unknown_parent_is_ignored() {
        let mut tree = MessageTree::new();
        let root = tree.add_root("a", &[]);
        let stale = tree.add_root("b", &[]);
        tree.remove(stale);

        assert_eq!(tree.add_child(stale, "x", &[]), None);
        assert!(tree.add_child(root, "x", &[]).is_some());
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn remove_cascades_to_descendants() {
        let mut tree = MessageTree::new();
        let first = tree.add_root("a", &[data("b", vec![data("c", vec![])])]);
        tree.add_root("d", &[]);
        let before = tree.len();
        let subtree = tree.subtree_len(first);

        let removal = tree.remove(first);

        assert_eq!(removal.removed().len(), 3);
        assert_eq!(tree.len(), before - subtree);
        assert_eq!(tree.root_count(), 1);
        assert!(!tree.contains(first));
    }

    #[test]
    fn removing_last_root_clears_content_and_keeps_children() {
        let mut tree = MessageTree::new();
        let root = tree.add_root("Hello", &[data("child", vec![])]);

        let removal = tree.remove(root);

        assert_eq!(removal, Removal::Cleared(root));
        assert_eq!(tree.root_count(), 1);
        assert_eq!(tree.content(root), Some(""));
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn removing_unknown_node_reports_missing() {
        let mut tree = MessageTree::new();
        tree.add_root("a", &[]);
        assert_eq!(tree.remove(NodeId(1234)), Removal::Missing);
    }

    #[test]
    fn ensure_root_only_heals_empty_forest() {
        let mut tree = MessageTree::new();
        assert!(tree.is_empty());
        let healed = tree.ensure_root();
        assert!(healed.is_some());
        assert_eq!(tree.ensure_root(), None);
        assert_eq!(tree.root_count(), 1);
        assert_eq!(tree.content(tree.roots()[0]), Some(""));
    }

    #[test]
    fn toggle_collapsed_is_reversible() {
        let mut tree = MessageTree::new();
        let root = tree.add_root("a", &[]);
        assert_eq!(tree.toggle_collapsed(root), Some(true));
        assert!(TreeModel::is_collapsed(&tree, root));
        assert_eq!(tree.toggle_collapsed(root), Some(false));
        assert_eq!(tree.toggle_collapsed(NodeId(77)), None);
    }

    #[test]
    fn ids_are_scoped_to_each_tree() {
        let mut first = MessageTree::new();
        let mut second = MessageTree::new();
        assert_eq!(first.add_root("a", &[]), second.add_root("b", &[]));
        assert_ne!(first.add_root("c", &[]), first.roots()[0]);
    }

    #[test]
    fn reveal_expands_all_ancestors() {
        let mut tree = MessageTree::new();
        let root = tree.add_root("a", &[data("b", vec![data("c", vec![])])]);
        let mid = tree.children(root)[0];
        let leaf = tree.children(mid)[0];
        tree.set_all_collapsed(true);

        tree.reveal(leaf);

        assert!(!TreeModel::is_collapsed(&tree, root));
        assert!(!TreeModel::is_collapsed(&tree, mid));
        assert!(TreeModel::is_collapsed(&tree, leaf));
    }

    #[test]
    fn from_data_loads_deep_chain_in_order() {
        let mut nested = data("leaf", vec![]);
        for level in (1..500).rev() {
            nested = data(&format!("level {level}"), vec![nested, data("side", vec![])]);
        }
        let tree = MessageTree::from_data(&[nested]);

        assert_eq!(tree.len(), 999);
        let mut cursor = tree.roots()[0];
        for _ in 1..500 {
            let children = tree.children(cursor);
            assert_eq!(tree.content(children[1]), Some("side"));
            cursor = children[0];
        }
        assert_eq!(tree.content(cursor), Some("leaf"));
    }
}
