use std::hash::Hash;

use smallvec::SmallVec;

/// Minimal forest contract required by the widget, labels and traversals.
///
/// A proper forest is expected (not a DAG):
/// - no cycles (DFS traversal is used directly);
/// - each node has at most one parent and roots have none;
/// - `parent` and `children` agree with each other;
/// - identifiers are stable between frames (for selection and labels).
pub trait TreeModel {
    /// Node identifier type.
    type Id: Copy + Eq + Hash;

    /// Returns the root nodes in display order (empty if the forest is empty).
    fn roots(&self) -> &[Self::Id];
    /// Returns the node's children in a deterministic order.
    fn children(&self, id: Self::Id) -> &[Self::Id];
    /// Returns the node's parent, or `None` for roots and unknown ids.
    fn parent(&self, id: Self::Id) -> Option<Self::Id>;
    /// Returns `true` if the node exists in the model.
    fn contains(&self, id: Self::Id) -> bool;
    /// Returns `true` if the node's children are hidden from the view.
    fn is_collapsed(&self, _id: Self::Id) -> bool {
        false
    }
    /// Returns an approximate size hint (not required to be exact).
    fn size_hint(&self) -> usize {
        0
    }
}

/// Returns the sibling sequence that contains `id` (its parent's children, or the roots).
pub fn siblings_of<T: TreeModel>(model: &T, id: T::Id) -> &[T::Id] {
    match model.parent(id) {
        Some(parent) => model.children(parent),
        None => model.roots(),
    }
}

/// Pre-order iterator: parent before children, siblings in order.
pub struct PreOrder<'a, T: TreeModel> {
    model: &'a T,
    stack: SmallVec<[T::Id; 16]>,
}

impl<'a, T: TreeModel> PreOrder<'a, T> {
    /// Walks the whole forest.
    pub fn new(model: &'a T) -> Self {
        Self::from_starts(model, model.roots())
    }

    /// Walks the subtree rooted at `id` (empty if the node is unknown).
    pub fn subtree(model: &'a T, id: T::Id) -> Self {
        if model.contains(id) {
            Self::from_starts(model, &[id])
        } else {
            Self::from_starts(model, &[])
        }
    }

    fn from_starts(model: &'a T, starts: &[T::Id]) -> Self {
        let mut stack = SmallVec::with_capacity(starts.len());
        stack.extend(starts.iter().rev().copied());
        Self { model, stack }
    }
}

impl<T: TreeModel> Iterator for PreOrder<'_, T> {
    type Item = T::Id;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.model.children(id).iter().rev().copied());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestForest {
        roots: Vec<usize>,
        children: Vec<Vec<usize>>,
        parents: Vec<Option<usize>>,
    }

    impl TestForest {
        // 0 -> {1 -> {3, 4}, 2}, 5
        fn new() -> Self {
            Self {
                roots: vec![0, 5],
                children: vec![vec![1, 2], vec![3, 4], vec![], vec![], vec![], vec![]],
                parents: vec![None, Some(0), Some(0), Some(1), Some(1), None],
            }
        }
    }

    impl TreeModel for TestForest {
        type Id = usize;

        fn roots(&self) -> &[Self::Id] {
            &self.roots
        }

        fn children(&self, id: Self::Id) -> &[Self::Id] {
            &self.children[id]
        }

        fn parent(&self, id: Self::Id) -> Option<Self::Id> {
            self.parents.get(id).copied().flatten()
        }

        fn contains(&self, id: Self::Id) -> bool {
            id < self.children.len()
        }
    }

    #[test]
    fn pre_order_visits_parents_before_children() {
        let forest = TestForest::new();
        let order: Vec<_> = PreOrder::new(&forest).collect();
        assert_eq!(order, vec![0, 1, 3, 4, 2, 5]);
    }

    #[test]
    fn subtree_walk_stays_inside_subtree() {
        let forest = TestForest::new();
        let order: Vec<_> = PreOrder::subtree(&forest, 1).collect();
        assert_eq!(order, vec![1, 3, 4]);
        assert_eq!(PreOrder::subtree(&forest, 42).count(), 0);
    }

    #[test]
    fn siblings_of_root_are_roots() {
        let forest = TestForest::new();
        assert_eq!(siblings_of(&forest, 5), &[0, 5]);
        assert_eq!(siblings_of(&forest, 4), &[3, 4]);
    }
}
