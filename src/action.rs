/// Actions that a user or application can initiate on the message tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeAction<Custom = ()> {
    /// Move selection to the previous visible row.
    SelectPrev,
    /// Move selection to the next visible row.
    SelectNext,
    /// Move selection to the parent message.
    SelectParent,
    /// Move selection to the first sub-option, expanding the message if needed.
    SelectChild,
    /// Select the first visible row.
    SelectFirst,
    /// Select the last visible row.
    SelectLast,
    /// Collapse or expand the selected message's sub-options.
    ToggleCollapsed,
    /// Collapse every message.
    CollapseAll,
    /// Expand every message.
    ExpandAll,
    /// Append a new root message.
    AddRoot,
    /// Append a sub-option under the selected message.
    AddChild,
    /// Remove the selected message with its sub-options.
    RemoveNode,
    /// Open the inline input on the selected message.
    EditNode,
    /// Toggle drawing of guide lines.
    ToggleGuides,
    /// Custom action forwarded to the caller without internal handling.
    Custom(Custom),
}

impl<C> TreeAction<C> {
    /// Returns `true` for actions that change the tree rather than the view.
    pub const fn is_edit(&self) -> bool {
        matches!(
            self,
            Self::ToggleCollapsed
                | Self::CollapseAll
                | Self::ExpandAll
                | Self::AddRoot
                | Self::AddChild
                | Self::RemoveNode
                | Self::EditNode
        )
    }
}

/// Result of handling an action or key event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeEvent<Custom = ()> {
    /// The action was handled internally and state was updated.
    Handled,
    /// The action was ignored (e.g., nothing selected / nothing to do).
    Unhandled,
    /// The action is forwarded to the caller for handling.
    Action(TreeAction<Custom>),
}
