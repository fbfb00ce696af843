use crate::label::PositionLabel;
use crate::store::NodeId;

/// Reasons a message tree cannot leave the editing step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("add at least one main message")]
    EmptyTree,

    #[error("fill in every message and sub-option before saving")]
    EmptyContent(NodeId),
}

impl ValidationError {
    /// Returns the node that should receive error styling and focus.
    pub const fn node(&self) -> Option<NodeId> {
        match self {
            Self::EmptyTree => None,
            Self::EmptyContent(id) => Some(*id),
        }
    }
}

/// Initial tree data that could not be read.
#[derive(Debug, thiserror::Error)]
pub enum TreeDataError {
    #[error("malformed initial tree data: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Problems with a submitted tree payload, as seen by the receiving side.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("could not read the submitted messages: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("add at least one message before saving")]
    EmptyTree,

    #[error("message {label} is empty")]
    EmptyContent { label: PositionLabel },
}

/// Errors returned by `MessageTreeEditor::submit`.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("could not encode the message tree: {0}")]
    Encode(#[from] serde_json::Error),
}
