use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::Borders;

/// Scroll policy applied when the selected row changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeScrollPolicy {
    KeepInView,
    CenterOnSelect,
}

/// Visual settings of the message tree widget.
#[derive(Clone)]
pub struct TreeViewStyle<'a> {
    pub title: Option<Line<'a>>,
    pub block_style: Style,
    pub border_style: Style,
    pub highlight_style: Style,
    pub line_style: Style,
    /// Style of the "1.2" position badge.
    pub badge_style: Style,
    /// Style of the placeholder shown for empty messages.
    pub placeholder_style: Style,
    /// Style of the row that failed validation.
    pub invalid_style: Style,
    pub cursor_style: Style,
    pub placeholder: &'a str,
    pub highlight_symbol: &'a str,
    pub borders: Borders,
    pub virtualize_rows: bool,
    pub scroll_policy: TreeScrollPolicy,
}

impl Default for TreeViewStyle<'_> {
    fn default() -> Self {
        Self {
            title: None,
            block_style: Style::default(),
            border_style: Style::default(),
            highlight_style: Style::default().add_modifier(Modifier::REVERSED),
            line_style: Style::default(),
            badge_style: Style::default().add_modifier(Modifier::BOLD),
            placeholder_style: Style::default().add_modifier(Modifier::DIM),
            invalid_style: Style::default().add_modifier(Modifier::UNDERLINED),
            cursor_style: Style::default().add_modifier(Modifier::REVERSED),
            placeholder: "Message (e.g. Type 1 to do X)",
            highlight_symbol: ">> ",
            borders: Borders::ALL,
            virtualize_rows: false,
            scroll_policy: TreeScrollPolicy::KeepInView,
        }
    }
}
