pub use crate::{
    EditorConfig, MessageData, MessageLabel, MessageTree, MessageTreeEditor, MessageTreeState,
    MessageTreeView, NodeId, PositionLabel, StepGate, TreeAction, TreeEdit, TreeEvent, TreeGlyphs,
    TreeModel, TreeScrollPolicy, TreeViewStyle, ValidationError,
};

#[cfg(feature = "keymap")]
pub use crate::{KeymapProfile, TreeKeyBindings};
