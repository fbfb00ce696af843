//! Dotted position labels ("2.1.3") derived from structural position.
//!
//! Labels are never stored on nodes; they are recomputed from the current
//! sibling order whenever the tree changes.

use std::fmt;
use std::str::FromStr;

use rustc_hash::{FxBuildHasher, FxHashMap};
use smallvec::SmallVec;

use crate::model::{TreeModel, siblings_of};

/// 1-based sibling indices from a root down to a node.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PositionLabel(SmallVec<[u32; 8]>);

impl PositionLabel {
    pub fn indices(&self) -> &[u32] {
        &self.0
    }

    /// Number of levels; roots have depth 1.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Label of the parent position, `None` for roots.
    pub fn parent(&self) -> Option<Self> {
        (self.0.len() > 1).then(|| Self(SmallVec::from_slice(&self.0[..self.0.len() - 1])))
    }

    fn child(&self, position: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(one_based(position));
        Self(indices)
    }
}

impl From<&[u32]> for PositionLabel {
    fn from(indices: &[u32]) -> Self {
        Self(SmallVec::from_slice(indices))
    }
}

impl fmt::Display for PositionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, position) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(".")?;
            }
            write!(f, "{position}")?;
        }
        Ok(())
    }
}

/// Error returned when a string is not a dotted list of positive integers.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid position label: {0:?}")]
pub struct ParseLabelError(String);

impl FromStr for PositionLabel {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut indices = SmallVec::new();
        for part in s.trim().split('.') {
            match part.parse::<u32>() {
                Ok(position) if position > 0 => indices.push(position),
                _ => return Err(ParseLabelError(s.to_string())),
            }
        }
        Ok(Self(indices))
    }
}

fn one_based(position: usize) -> u32 {
    u32::try_from(position + 1).unwrap_or(u32::MAX)
}

/// Computes the label of a single node by walking its ancestors.
///
/// Returns `None` if the node is not in the model.
pub fn position_label<T: TreeModel>(model: &T, id: T::Id) -> Option<PositionLabel> {
    if !model.contains(id) {
        return None;
    }

    let mut indices: SmallVec<[u32; 8]> = SmallVec::new();
    let mut cursor = id;
    loop {
        let position = siblings_of(model, cursor)
            .iter()
            .position(|&sibling| sibling == cursor)?;
        indices.push(one_based(position));
        match model.parent(cursor) {
            Some(parent) => cursor = parent,
            None => break,
        }
    }
    indices.reverse();
    Some(PositionLabel(indices))
}

/// Computes every node's label in a single depth-first pass.
pub fn label_all<T: TreeModel>(model: &T) -> FxHashMap<T::Id, PositionLabel> {
    let mut labels = FxHashMap::with_capacity_and_hasher(model.size_hint(), FxBuildHasher);
    let root = PositionLabel::default();
    let mut stack: Vec<(T::Id, PositionLabel)> = model
        .roots()
        .iter()
        .copied()
        .enumerate()
        .map(|(position, id)| (id, root.child(position)))
        .collect();
    while let Some((id, label)) = stack.pop() {
        stack.extend(
            model
                .children(id)
                .iter()
                .copied()
                .enumerate()
                .map(|(position, child)| (child, label.child(position))),
        );
        labels.insert(id, label);
    }
    labels
}

/// Resolves a label back to the node currently at that position.
pub fn node_at<T: TreeModel>(model: &T, label: &PositionLabel) -> Option<T::Id> {
    let (first, rest) = label.indices().split_first()?;
    let mut current = *model.roots().get(index_of(*first)?)?;
    for position in rest {
        current = *model.children(current).get(index_of(*position)?)?;
    }
    Some(current)
}

fn index_of(position: u32) -> Option<usize> {
    usize::try_from(position).ok()?.checked_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::MessageData;
    use crate::store::MessageTree;

    fn sample() -> MessageTree {
        let mut tree = MessageTree::new();
        tree.add_root(
            "r1",
            &[
                MessageData::new("c1", vec![]),
                MessageData::new("c2", vec![MessageData::new("g1", vec![])]),
            ],
        );
        tree.add_root("r2", &[]);
        tree
    }

    fn label_text(tree: &MessageTree, id: crate::store::NodeId) -> String {
        position_label(tree, id).map(|label| label.to_string()).unwrap_or_default()
    }

    #[test]
    fn labels_follow_sibling_positions() {
        let tree = sample();
        let r1 = tree.roots()[0];
        let r2 = tree.roots()[1];
        let c1 = tree.children(r1)[0];
        let c2 = tree.children(r1)[1];
        let g1 = tree.children(c2)[0];

        assert_eq!(label_text(&tree, r1), "1");
        assert_eq!(label_text(&tree, r2), "2");
        assert_eq!(label_text(&tree, c1), "1.1");
        assert_eq!(label_text(&tree, c2), "1.2");
        assert_eq!(label_text(&tree, g1), "1.2.1");
    }

    #[test]
    fn relabels_after_removal() {
        let mut tree = sample();
        let r1 = tree.roots()[0];
        let r2 = tree.roots()[1];
        tree.remove(r1);
        assert_eq!(label_text(&tree, r2), "1");
    }

    #[test]
    fn single_pass_agrees_with_ancestor_walk() {
        let tree = sample();
        let labels = label_all(&tree);
        assert_eq!(labels.len(), tree.len());
        for id in tree.pre_order() {
            assert_eq!(labels.get(&id), position_label(&tree, id).as_ref());
        }
    }

    #[test]
    fn node_at_resolves_labels() {
        let tree = sample();
        for id in tree.pre_order() {
            let label = position_label(&tree, id);
            assert_eq!(label.and_then(|label| node_at(&tree, &label)), Some(id));
        }
        let missing: PositionLabel = "3".parse().unwrap();
        assert_eq!(node_at(&tree, &missing), None);
    }

    #[test]
    fn parses_and_prints_dotted_labels() {
        let label: PositionLabel = "2.1.3".parse().unwrap();
        assert_eq!(label.indices(), &[2, 1, 3]);
        assert_eq!(label.to_string(), "2.1.3");
        assert_eq!(label.parent().map(|p| p.to_string()), Some("2.1".to_string()));
        assert!("1.0".parse::<PositionLabel>().is_err());
        assert!("".parse::<PositionLabel>().is_err());
        assert!("a.b".parse::<PositionLabel>().is_err());
    }

    #[test]
    fn unknown_node_has_no_label() {
        let mut tree = sample();
        let r2 = tree.roots()[1];
        tree.remove(r2);
        assert_eq!(position_label(&tree, r2), None);
    }

    #[test]
    fn label_all_handles_deep_chains() {
        let mut tree = MessageTree::new();
        let mut cursor = tree.add_root("a", &[]);
        for _ in 1..400 {
            cursor = tree.add_child(cursor, "b", &[]).unwrap();
        }
        let labels = label_all(&tree);
        assert_eq!(labels[&cursor].depth(), 400);
        assert_eq!(labels.get(&cursor), position_label(&tree, cursor).as_ref());
    }
}
