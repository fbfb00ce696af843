use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// User-facing texts shown when the tree step cannot be left.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorMessages {
    pub empty_tree: String,
    pub empty_content: String,
}

impl Default for EditorMessages {
    fn default() -> Self {
        Self {
            empty_tree: "Add at least one main message.".to_string(),
            empty_content: "Fill in every message and sub-option before saving.".to_string(),
        }
    }
}

impl EditorMessages {
    pub fn for_error(&self, error: &ValidationError) -> &str {
        match error {
            ValidationError::EmptyTree => &self.empty_tree,
            ValidationError::EmptyContent(_) => &self.empty_content,
        }
    }
}

/// Behaviour switches of `MessageTreeEditor`.
///
/// Every field has a default, so partial JSON configs are accepted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Open the inline input on messages right after they are created.
    pub edit_on_create: bool,
    /// Expand and select the offending message when validation fails.
    pub reveal_invalid: bool,
    pub messages: EditorMessages,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            edit_on_create: true,
            reveal_invalid: true,
            messages: EditorMessages::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_config_keeps_defaults() {
        let config: EditorConfig =
            serde_json::from_str(r#"{"edit_on_create": false, "messages": {"empty_tree": "x"}}"#)
                .unwrap();
        assert_eq!(
            config,
            EditorConfig {
                edit_on_create: false,
                messages: EditorMessages {
                    empty_tree: "x".to_string(),
                    ..EditorMessages::default()
                },
                ..EditorConfig::default()
            }
        );
    }
}
