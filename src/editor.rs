use ratatui::layout::Rect;
use ratatui::prelude::Buffer;
use ratatui::widgets::StatefulWidget;
use tracing::debug;

use crate::action::{TreeAction, TreeEvent};
use crate::codec::{MessageData, load_initial, serialize, to_json};
use crate::config::EditorConfig;
use crate::error::{SubmitError, ValidationError};
use crate::glyphs::MessageLabel;
use crate::input::InputAction;
use crate::state::MessageTreeState;
use crate::store::{MessageTree, NodeId};
use crate::style::TreeViewStyle;
use crate::validate::validate;
use crate::widget::MessageTreeView;

#[cfg(feature = "keymap")]
use crossterm::event::KeyEvent;

/// A form step that can refuse to be left.
///
/// The wizard calls this before advancing past the step and again before the
/// final submission.
pub trait StepGate {
    type Error;

    fn check_step(&mut self) -> Result<(), Self::Error>;
}

/// The message tree step of the form: store, view state and validation in one
/// place. All mutations go through here so the "at least one root" rule and the
/// view state stay consistent.
pub struct MessageTreeEditor {
    tree: MessageTree,
    state: MessageTreeState<NodeId>,
    config: EditorConfig,
    error: Option<String>,
}

impl Default for MessageTreeEditor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl MessageTreeEditor {
    /// Creates an editor holding a single empty root.
    pub fn new(config: EditorConfig) -> Self {
        Self::from_initial(None, config)
    }

    /// Creates an editor seeded from optional JSON data.
    ///
    /// Unreadable data is logged and replaced by a single empty root.
    pub fn from_initial(raw: Option<&str>, config: EditorConfig) -> Self {
        Self::with_tree(load_initial(raw), config)
    }

    /// Creates an editor over an existing tree, adding a root if it has none.
    pub fn with_tree(mut tree: MessageTree, config: EditorConfig) -> Self {
        tree.ensure_root();
        let mut state = MessageTreeState::with_capacity(tree.len());
        state.set_edit_on_create(config.edit_on_create);
        state.ensure_visible_nodes(&tree);
        Self {
            tree,
            state,
            config,
            error: None,
        }
    }

    pub const fn tree(&self) -> &MessageTree {
        &self.tree
    }

    pub const fn state(&self) -> &MessageTreeState<NodeId> {
        &self.state
    }

    pub const fn state_mut(&mut self) -> &mut MessageTreeState<NodeId> {
        &mut self.state
    }

    pub const fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Message to show after the last failed step check.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn add_root(&mut self, content: impl Into<String>) -> NodeId {
        let id = self.tree.add_root(content, &[]);
        self.state.invalidate();
        id
    }

    pub fn add_child(&mut self, parent: NodeId, content: impl Into<String>) -> Option<NodeId> {
        let id = self.tree.add_child(parent, content, &[])?;
        self.state.invalidate();
        Some(id)
    }

    /// Removes the message with its sub-options (the last root is cleared instead).
    pub fn remove(&mut self, id: NodeId) -> bool {
        self.state.commit_edit(&mut self.tree);
        self.state.remove(&mut self.tree, id)
    }

    pub fn toggle_collapsed(&mut self, id: NodeId) -> Option<bool> {
        let collapsed = self.tree.toggle_collapsed(id)?;
        self.state.invalidate();
        Some(collapsed)
    }

    pub fn collapse_all(&mut self) {
        self.tree.set_all_collapsed(true);
        self.state.invalidate();
    }

    pub fn expand_all(&mut self) {
        self.tree.set_all_collapsed(false);
        self.state.invalidate();
    }

    /// Replaces a message's content; editing the flagged message clears its error styling.
    pub fn set_content(&mut self, id: NodeId, content: impl Into<String>) -> bool {
        if !self.tree.set_content(id, content) {
            return false;
        }
        if self.state.invalid_id() == Some(id) {
            self.state.clear_invalid();
        }
        true
    }

    /// Applies a keystroke to the open inline input.
    pub fn input(&mut self, action: InputAction) -> bool {
        self.state.handle_input(&mut self.tree, action)
    }

    /// Plain-data form of the current tree.
    pub fn serialize(&self) -> Vec<MessageData> {
        serialize(&self.tree)
    }

    /// Applies an action: navigation updates the view, structural actions
    /// change the tree, custom actions are handed back.
    pub fn apply<C>(&mut self, action: TreeAction<C>) -> TreeEvent<C> {
        match self.state.handle_action(&self.tree, action) {
            TreeEvent::Action(TreeAction::Custom(custom)) => {
                TreeEvent::Action(TreeAction::Custom(custom))
            }
            TreeEvent::Action(action) => self.apply_edit(action),
            event => event,
        }
    }

    fn apply_edit<C>(&mut self, action: TreeAction<C>) -> TreeEvent<C> {
        if action.is_edit() {
            self.state.commit_edit(&mut self.tree);
        }
        if self.state.handle_edit_action(&mut self.tree, action) {
            TreeEvent::Handled
        } else {
            TreeEvent::Unhandled
        }
    }

    #[cfg(feature = "keymap")]
    /// Routes a key to the open input, or resolves it into a tree action.
    pub fn handle_key(&mut self, key: KeyEvent) -> TreeEvent<()> {
        if self.state.is_editing() {
            let Some(input) = self.state.keymap().resolve_input(key) else {
                return TreeEvent::Unhandled;
            };
            return if self.input(input) {
                TreeEvent::Handled
            } else {
                TreeEvent::Unhandled
            };
        }

        match self.state.handle_key(&self.tree, key) {
            TreeEvent::Action(action) => self.apply_edit(action),
            event => event,
        }
    }

    /// Validates the tree and serializes it for the form's hidden field.
    pub fn submit(&mut self) -> Result<String, SubmitError> {
        self.check_step()?;
        let json = to_json(&self.tree)?;
        debug!(messages = self.tree.len(), bytes = json.len(), "serialized message tree");
        Ok(json)
    }

    /// Draws the tree into `buf`.
    pub fn render(&mut self, area: Rect, buf: &mut Buffer, style: TreeViewStyle<'_>) {
        MessageTreeView::new(&self.tree, &MessageLabel, style).render(area, buf, &mut self.state);
    }
}

impl StepGate for MessageTreeEditor {
    type Error = ValidationError;

    /// Commits any open input, then validates. On failure the user-facing
    /// message is stored and the offending message is flagged and selected.
    fn check_step(&mut self) -> Result<(), Self::Error> {
        self.state.commit_edit(&mut self.tree);
        match validate(&self.tree) {
            Ok(()) => {
                self.error = None;
                self.state.clear_invalid();
                Ok(())
            }
            Err(err) => {
                debug!(error = %err, "message tree step blocked");
                self.error = Some(self.config.messages.for_error(&err).to_string());
                if let Some(id) = err.node() {
                    if self.config.reveal_invalid {
                        self.state.mark_invalid(&mut self.tree, id);
                    } else {
                        self.state.set_invalid(id);
                    }
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TreeModel;
    use pretty_assertions::assert_eq;

    #[test]
    fn starts_with_one_empty_root() {
        let editor = MessageTreeEditor::default();
        assert_eq!(editor.tree().root_count(), 1);
        assert_eq!(editor.serialize(), vec![MessageData::leaf("")]);
        assert_eq!(editor.error_message(), None);
    }

    #[test]
    fn check_step_flags_first_blank_message() {
        let mut editor = MessageTreeEditor::from_initial(
            Some(r#"[{"content": "Hi", "children": [{"content": "1"}, {"content": ""}]}, {"content": ""}]"#),
            EditorConfig::default(),
        );
        editor.collapse_all();
        let root = editor.tree().roots()[0];
        let offender = editor.tree().children(root)[1];

        assert_eq!(editor.check_step(), Err(ValidationError::EmptyContent(offender)));
        assert_eq!(
            editor.error_message(),
            Some("Fill in every message and sub-option before saving.")
        );
        assert_eq!(editor.state().invalid_id(), Some(offender));
        assert_eq!(editor.state().selected_id(), Some(offender));

        editor.set_content(offender, "2");
        assert_eq!(editor.state().invalid_id(), None);
        let second = editor.tree().roots()[1];
        editor.set_content(second, "Bye");
        assert_eq!(editor.check_step(), Ok(()));
        assert_eq!(editor.error_message(), None);
    }

    #[test]
    fn submit_commits_open_input_and_returns_json() {
        let mut editor = MessageTreeEditor::default();
        assert_eq!(editor.apply::<()>(TreeAction::EditNode), TreeEvent::Handled);
        for ch in " Olá ".chars() {
            assert!(editor.input(InputAction::Insert(ch)));
        }

        let json = editor.submit().unwrap();

        assert_eq!(json, r#"[{"content":"Olá","children":[]}]"#);
    }

    #[test]
    fn submit_refuses_blank_tree() {
        let mut editor = MessageTreeEditor::default();
        assert!(matches!(
            editor.submit(),
            Err(SubmitError::Invalid(ValidationError::EmptyContent(_)))
        ));
    }

    #[test]
    fn structural_actions_route_through_the_store() {
        let mut editor = MessageTreeEditor::new(EditorConfig {
            edit_on_create: false,
            ..EditorConfig::default()
        });
        let root = editor.tree().roots()[0];

        assert_eq!(editor.apply::<()>(TreeAction::AddChild), TreeEvent::Handled);
        assert_eq!(editor.tree().children(root).len(), 1);
        assert!(!editor.state().is_editing());

        assert_eq!(editor.apply::<()>(TreeAction::RemoveNode), TreeEvent::Handled);
        assert_eq!(editor.tree().children(root).len(), 0);
        assert_eq!(editor.state().selected_id(), Some(root));

        assert_eq!(editor.apply::<()>(TreeAction::AddRoot), TreeEvent::Handled);
        assert_eq!(editor.tree().root_count(), 2);
        assert_eq!(
            editor.apply(TreeAction::Custom("help")),
            TreeEvent::Action(TreeAction::Custom("help"))
        );
    }

    #[test]
    fn removing_the_only_root_keeps_it() {
        let mut editor = MessageTreeEditor::from_initial(
            Some(r#"[{"content": "Hello"}]"#),
            EditorConfig::default(),
        );
        let root = editor.tree().roots()[0];
        assert!(editor.remove(root));
        assert_eq!(editor.serialize(), vec![MessageData::leaf("")]);
    }

    #[test]
    fn remove_commits_open_input_first() {
        let mut editor = MessageTreeEditor::from_initial(
            Some(r#"[{"content": "Hello", "children": [{"content": "c"}]}]"#),
            EditorConfig::default(),
        );
        let root = editor.tree().roots()[0];
        let child = editor.tree().children(root)[0];

        assert_eq!(editor.apply::<()>(TreeAction::SelectNext), TreeEvent::Handled);
        assert_eq!(editor.apply::<()>(TreeAction::EditNode), TreeEvent::Handled);
        for ch in "xyz".chars() {
            assert!(editor.input(InputAction::Insert(ch)));
        }
        assert!(editor.remove(root));
        editor.set_content(root, "Hi");

        assert_eq!(editor.check_step(), Ok(()));
        assert_eq!(editor.tree().content(child), Some("cxyz"));
    }
}
