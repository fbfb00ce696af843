//! Plain-data form of a message tree and the JSON carried by the form.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::error::{PayloadError, TreeDataError};
use crate::model::TreeModel;
use crate::store::{MessageTree, NodeId};
use crate::validate::validate_data;

/// One message with its sub-options, as sent to and received from the backend.
///
/// Missing or `null` fields read as empty; unknown fields (such as a backend
/// row id) are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub children: Vec<MessageData>,
}

impl MessageData {
    pub fn new(content: impl Into<String>, children: Vec<Self>) -> Self {
        Self {
            content: content.into(),
            children,
        }
    }

    /// Creates a message without sub-options.
    pub fn leaf(content: impl Into<String>) -> Self {
        Self::new(content, Vec::new())
    }

    /// Number of messages in this subtree, including itself.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Self::node_count).sum::<usize>()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Converts the forest into plain data, trimming every message.
///
/// Collapse state and node ids stay behind. The walk keeps its own stack, so
/// depth is bounded by memory only.
pub fn serialize(tree: &MessageTree) -> Vec<MessageData> {
    // A node being built: its trimmed content, children left to visit, children done.
    struct Frame<'a> {
        content: String,
        pending: std::slice::Iter<'a, NodeId>,
        built: Vec<MessageData>,
    }

    let mut out = Vec::with_capacity(tree.root_count());
    let mut roots = tree.roots().iter();
    let mut stack: Vec<Frame<'_>> = Vec::new();
    loop {
        let next = match stack.last_mut() {
            Some(frame) => frame.pending.next(),
            None => roots.next(),
        };
        if let Some(&id) = next {
            let children = tree.children(id);
            stack.push(Frame {
                content: tree.content(id).unwrap_or_default().trim().to_string(),
                pending: children.iter(),
                built: Vec::with_capacity(children.len()),
            });
            continue;
        }
        let Some(done) = stack.pop() else {
            break;
        };
        let node = MessageData::new(done.content, done.built);
        match stack.last_mut() {
            Some(parent) => parent.built.push(node),
            None => out.push(node),
        }
    }
    out
}

/// Serializes the forest into the JSON string written to the form's hidden field.
pub fn to_json(tree: &MessageTree) -> Result<String, serde_json::Error> {
    let mut out = Vec::new();
    let mut json = serde_json::Serializer::new(&mut out);
    serialize(tree).serialize(serde_stacker::Serializer::new(&mut json))?;
    String::from_utf8(out).map_err(<serde_json::Error as serde::ser::Error>::custom)
}

// Nesting depth is unbounded: the recursion limit is off and the stack grows on demand.
fn from_json<T: DeserializeOwned>(raw: &str) -> Result<T, serde_json::Error> {
    let mut json = serde_json::Deserializer::from_str(raw);
    json.disable_recursion_limit();
    let value = T::deserialize(serde_stacker::Deserializer::new(&mut json))?;
    json.end()?;
    Ok(value)
}

/// Parses initial tree data. Blank input and `null` mean "no data".
pub fn parse_initial(raw: &str) -> Result<Vec<MessageData>, TreeDataError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    let data: Option<Vec<MessageData>> = from_json(raw)?;
    Ok(data.unwrap_or_default())
}

/// Builds the editable tree from optional initial data.
///
/// Malformed data is logged and treated as absent; the result always has at
/// least one root.
pub fn load_initial(raw: Option<&str>) -> MessageTree {
    let data = match raw.map(parse_initial) {
        Some(Ok(data)) => data,
        Some(Err(err)) => {
            warn!(error = %err, "could not read the initial message tree, starting empty");
            Vec::new()
        }
        None => Vec::new(),
    };
    MessageTree::from_data(&data)
}

/// Parses and checks a submitted payload, as the receiving side does before saving.
pub fn parse_payload(raw: &str) -> Result<Vec<MessageData>, PayloadError> {
    let data: Vec<MessageData> = if raw.trim().is_empty() {
        Vec::new()
    } else {
        from_json(raw)?
    };
    validate_data(&data)?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn shape(tree: &MessageTree) -> Vec<MessageData> {
        serialize(tree)
    }

    #[test]
    fn serialize_trims_and_keeps_order() {
        let mut tree = MessageTree::new();
        let root = tree.add_root("  Welcome!  ", &[]);
        tree.add_child(root, "1 - Sales\n", &[]);
        tree.add_child(root, "2 - Support", &[]);
        tree.add_root("\tBye", &[]);

        assert_eq!(
            serialize(&tree),
            vec![
                MessageData::new(
                    "Welcome!",
                    vec![MessageData::leaf("1 - Sales"), MessageData::leaf("2 - Support")],
                ),
                MessageData::leaf("Bye"),
            ]
        );
    }

    #[test]
    fn round_trip_ignores_collapse_state() {
        let mut tree = MessageTree::new();
        let root = tree.add_root("a", &[MessageData::new("b", vec![MessageData::leaf("c")])]);
        tree.add_root("d", &[]);
        tree.toggle_collapsed(root);

        let rebuilt = MessageTree::from_data(&serialize(&tree));

        assert_eq!(shape(&rebuilt), shape(&tree));
        assert!(rebuilt.roots().iter().all(|&id| !rebuilt.is_collapsed(id)));
    }

    #[test]
    fn json_has_only_content_and_children() {
        let mut tree = MessageTree::new();
        tree.add_root("hi", &[]);
        assert_eq!(
            to_json(&tree).unwrap(),
            r#"[{"content":"hi","children":[]}]"#
        );
    }

    #[test]
    fn parse_initial_tolerates_missing_and_null_fields() {
        let data =
            parse_initial(r#"[{"id": 4, "content": null, "children": [{"content": "x"}]}, {}]"#)
                .unwrap();
        assert_eq!(
            data,
            vec![
                MessageData::new("", vec![MessageData::leaf("x")]),
                MessageData::default(),
            ]
        );
    }

    #[test]
    fn parse_initial_treats_blank_and_null_as_empty() {
        assert!(parse_initial("").unwrap().is_empty());
        assert!(parse_initial("  ").unwrap().is_empty());
        assert!(parse_initial("null").unwrap().is_empty());
    }

    #[test]
    fn load_initial_falls_back_to_single_empty_root() {
        for raw in [None, Some("not json"), Some(r#"{"content": "x"}"#), Some("[]")] {
            let tree = load_initial(raw);
            assert_eq!(tree.root_count(), 1, "input {raw:?}");
            assert_eq!(tree.len(), 1);
            assert_eq!(tree.content(tree.roots()[0]), Some(""));
        }
    }

    #[test]
    fn load_initial_seeds_saved_tree() {
        let tree = load_initial(Some(
            r#"[{"content": "a", "children": [{"content": "b", "children": []}]}]"#,
        ));
        assert_eq!(
            serialize(&tree),
            vec![MessageData::new("a", vec![MessageData::leaf("b")])]
        );
    }

    fn chain(depth: usize) -> MessageTree {
        let mut tree = MessageTree::new();
        let mut parent = tree.add_root("level 1", &[]);
        for level in 2..=depth {
            parent = tree.add_child(parent, format!("level {level}"), &[]).unwrap();
        }
        tree
    }

    #[test]
    fn deep_chain_survives_json_round_trip() {
        let tree = chain(200);
        let json = to_json(&tree).unwrap();

        let restored = load_initial(Some(&json));

        assert_eq!(restored.len(), 200);
        assert_eq!(shape(&restored), shape(&tree));
        assert!(parse_payload(&json).is_ok());
    }

    #[test]
    fn trailing_garbage_is_malformed() {
        assert!(matches!(parse_initial("[] []"), Err(TreeDataError::Malformed(_))));
    }

    #[test]
    fn parse_payload_rejects_empty_and_blank_messages() {
        assert!(matches!(parse_payload(""), Err(PayloadError::EmptyTree)));
        assert!(matches!(parse_payload("{"), Err(PayloadError::Malformed(_))));
        let err = parse_payload(r#"[{"content": "a", "children": [{"content": " "}]}]"#)
            .unwrap_err();
        assert_eq!(err.to_string(), "message 1.1 is empty");
        assert_eq!(
            parse_payload(r#"[{"content": "a"}]"#).unwrap(),
            vec![MessageData::leaf("a")]
        );
    }
}
