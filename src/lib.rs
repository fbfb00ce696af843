//! Editable chatbot message tree for ratatui: an arena-backed forest of
//! messages, derived position labels ("1", "1.2", "2.1.3"), inline editing,
//! validation and JSON serialization.
//!
//! Feature flags:
//! - `keymap`: crossterm-based key bindings and `handle_key` helpers.

mod action;
mod codec;
mod config;
mod context;
mod edit;
mod editor;
mod error;
mod glyphs;
mod input;
#[cfg(feature = "keymap")]
mod keymap;
mod label;
mod model;
pub mod prelude;
mod state;
mod store;
mod style;
mod validate;
mod widget;

pub use action::{TreeAction, TreeEvent};
pub use codec::{MessageData, load_initial, parse_initial, parse_payload, serialize, to_json};
pub use config::{EditorConfig, EditorMessages};
pub use context::TreeRowContext;
pub use edit::{Removal, TreeEdit};
pub use editor::{MessageTreeEditor, StepGate};
pub use error::{PayloadError, SubmitError, TreeDataError, ValidationError};
pub use glyphs::{
    MessageLabel, TreeGlyphs, TreeLabelParts, TreeLabelProvider, TreeLabelRenderer,
    tree_label_line, tree_name_cell,
};
pub use input::{ContentInput, InputAction, InputOutcome};
#[cfg(feature = "keymap")]
pub use keymap::{KeymapProfile, TreeKeyBindings};
pub use label::{ParseLabelError, PositionLabel, label_all, node_at, position_label};
pub use model::{PreOrder, TreeModel, siblings_of};
pub use state::MessageTreeState;
pub use store::{MessageNode, MessageTree, NodeId};
pub use style::{TreeScrollPolicy, TreeViewStyle};
pub use validate::{validate, validate_data};
pub use widget::MessageTreeView;
