//! Renders a seeded message tree once into an off-screen buffer and prints it.

use ratatui::layout::Rect;
use ratatui::prelude::Buffer;

use tui_messagetree::{
    EditorConfig, MessageTreeEditor, PositionLabel, StepGate, TreeViewStyle, node_at,
};

const SEED: &str = r#"[
    {"content": "Hi! What can I do for you?\nPick an option:", "children": [
        {"content": "Opening hours", "children": [
            {"content": "Weekdays"},
            {"content": "Weekends"}
        ]},
        {"content": "Talk to a human"}
    ]},
    {"content": ""}
]"#;

fn main() {
    let mut editor = MessageTreeEditor::from_initial(Some(SEED), EditorConfig::default());

    let area = Rect::new(0, 0, 48, 10);
    let mut buffer = Buffer::empty(area);
    let style = TreeViewStyle {
        placeholder: "(empty message)",
        ..TreeViewStyle::default()
    };
    editor.render(area, &mut buffer, style);
    print_buffer(&buffer);

    if let Err(err) = editor.check_step() {
        println!("blocked: {err}");
        if let Some(message) = editor.error_message() {
            println!("{message}");
        }
    }

    if let Ok(label) = "1.1.2".parse::<PositionLabel>()
        && let Some(id) = node_at(editor.tree(), &label)
    {
        println!("{label} -> {:?}", editor.tree().content(id));
    }
}

fn print_buffer(buffer: &Buffer) {
    let area = buffer.area;
    for y in area.top()..area.bottom() {
        let line: String = (area.left()..area.right())
            .map(|x| buffer[(x, y)].symbol())
            .collect();
        println!("{}", line.trim_end());
    }
}
