use smallvec::SmallVec;

use crate::codec::MessageData;
use crate::error::{PayloadError, ValidationError};
use crate::label::PositionLabel;
use crate::store::MessageTree;

fn is_blank(content: &str) -> bool {
    content.trim().is_empty()
}

/// Checks that the forest has roots and that every message has content.
///
/// The walk is pre-order and stops at the first blank message, which is the
/// one reported.
pub fn validate(tree: &MessageTree) -> Result<(), ValidationError> {
    if tree.is_empty() {
        return Err(ValidationError::EmptyTree);
    }
    match tree
        .pre_order()
        .find(|&id| tree.content(id).is_none_or(is_blank))
    {
        Some(id) => Err(ValidationError::EmptyContent(id)),
        None => Ok(()),
    }
}

/// Same check over plain data; the offender is reported by its position label.
pub fn validate_data(data: &[MessageData]) -> Result<(), PayloadError> {
    if data.is_empty() {
        return Err(PayloadError::EmptyTree);
    }
    match first_blank(data) {
        Some(label) => Err(PayloadError::EmptyContent { label }),
        None => Ok(()),
    }
}

// Pre-order walk with an explicit stack; `path` mirrors the current node's position.
fn first_blank(roots: &[MessageData]) -> Option<PositionLabel> {
    let mut path: SmallVec<[u32; 8]> = SmallVec::new();
    let mut stack: Vec<(usize, usize, &MessageData)> =
        roots.iter().enumerate().rev().map(|(position, node)| (0, position, node)).collect();
    while let Some((depth, position, node)) = stack.pop() {
        path.truncate(depth);
        path.push(u32::try_from(position + 1).unwrap_or(u32::MAX));
        if is_blank(&node.content) {
            return Some(PositionLabel::from(path.as_slice()));
        }
        stack.extend(
            node.children
                .iter()
                .enumerate()
                .rev()
                .map(|(position, child)| (depth + 1, position, child)),
        );
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TreeModel;

    #[test]
    fn empty_forest_is_rejected() {
        let tree = MessageTree::new();
        assert_eq!(validate(&tree), Err(ValidationError::EmptyTree));
    }

    #[test]
    fn whitespace_only_content_is_blank() {
        let mut tree = MessageTree::new();
        let root = tree.add_root(" \n\t", &[]);
        assert_eq!(validate(&tree), Err(ValidationError::EmptyContent(root)));
    }

    #[test]
    fn reports_first_offender_in_pre_order() {
        let mut tree = MessageTree::new();
        let first = tree.add_root(
            "root 1",
            &[MessageData::leaf("child 1"), MessageData::leaf("")],
        );
        tree.add_root("", &[]);
        let offender = tree.children(first)[1];

        assert_eq!(validate(&tree), Err(ValidationError::EmptyContent(offender)));
    }

    #[test]
    fn complete_tree_passes() {
        let mut tree = MessageTree::new();
        tree.add_root("a", &[MessageData::new("b", vec![MessageData::leaf("c")])]);
        tree.add_root("d", &[]);
        assert_eq!(validate(&tree), Ok(()));
    }

    #[test]
    fn plain_data_reports_position_label() {
        let data = vec![
            MessageData::new("a", vec![MessageData::leaf("b"), MessageData::leaf("")]),
            MessageData::leaf(""),
        ];
        match validate_data(&data) {
            Err(PayloadError::EmptyContent { label }) => assert_eq!(label.to_string(), "1.2"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(matches!(validate_data(&[]), Err(PayloadError::EmptyTree)));
    }

    #[test]
    fn deep_data_reports_full_label() {
        let mut data = MessageData::leaf("");
        for _ in 0..299 {
            data = MessageData::new("x", vec![MessageData::leaf("y"), data]);
        }
        match validate_data(&[data]) {
            Err(PayloadError::EmptyContent { label }) => {
                assert_eq!(label.depth(), 300);
                assert!(label.indices()[1..].iter().all(|&index| index == 2));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
