use ratatui::style::Style;

use crate::label::PositionLabel;

/// Per-row data handed to label renderers.
#[derive(Clone, Copy)]
pub struct TreeRowContext<'a> {
    pub level: u16,
    pub is_tail_stack: &'a [bool],
    pub is_collapsed: bool,
    pub has_children: bool,
    pub position: Option<&'a PositionLabel>,
    pub is_invalid: bool,
    /// Input text before and after the cursor when this row is being edited.
    pub editing: Option<(&'a str, &'a str)>,
    pub draw_lines: bool,
    pub placeholder: &'a str,
    pub line_style: Style,
    pub badge_style: Style,
    pub placeholder_style: Style,
    pub invalid_style: Style,
    pub cursor_style: Style,
}
