use std::env;
use std::fs;
use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::{DefaultTerminal, Frame};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use tui_messagetree::{EditorConfig, MessageTreeEditor, StepGate, TreeEvent, TreeViewStyle};

/// First wizard step: the chatbot needs a name before its messages can be edited.
#[derive(Default)]
struct NameStep {
    name: String,
    error: Option<&'static str>,
}

impl NameStep {
    fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(ch) => {
                self.name.push(ch);
                self.error = None;
            }
            KeyCode::Backspace => {
                self.name.pop();
            }
            _ => {}
        }
    }
}

impl StepGate for NameStep {
    type Error = &'static str;

    fn check_step(&mut self) -> Result<(), Self::Error> {
        if self.name.trim().is_empty() {
            self.error = Some("Give the chatbot a name.");
            return Err("missing name");
        }
        self.error = None;
        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Step {
    Name,
    Messages,
}

struct Wizard {
    step: Step,
    name: NameStep,
    editor: MessageTreeEditor,
}

enum Flow {
    Continue,
    Quit,
    Submit(String),
}

impl Wizard {
    fn handle_key(&mut self, key: KeyEvent) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Flow::Quit;
        }
        match self.step {
            Step::Name => match key.code {
                KeyCode::Esc => Flow::Quit,
                KeyCode::Enter | KeyCode::Tab => {
                    if self.name.check_step().is_ok() {
                        self.step = Step::Messages;
                    }
                    Flow::Continue
                }
                _ => {
                    self.name.handle_key(key);
                    Flow::Continue
                }
            },
            Step::Messages => self.handle_tree_key(key),
        }
    }

    fn handle_tree_key(&mut self, key: KeyEvent) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('s') {
            return match self.editor.submit() {
                Ok(json) => Flow::Submit(json),
                Err(err) => {
                    tracing::info!(error = %err, "submission refused");
                    Flow::Continue
                }
            };
        }
        if !self.editor.state().is_editing() {
            match key.code {
                KeyCode::Char('q') => return Flow::Quit,
                KeyCode::Esc | KeyCode::BackTab => {
                    self.step = Step::Name;
                    return Flow::Continue;
                }
                _ => {}
            }
        }
        if let TreeEvent::Action(action) = self.editor.handle_key(key) {
            tracing::debug!(?action, "unbound tree action");
        }
        Flow::Continue
    }
}

fn tree_style() -> TreeViewStyle<'static> {
    TreeViewStyle {
        title: Some(Line::from(" Messages ")),
        block_style: Style::default()
            .fg(Color::Rgb(221, 227, 235))
            .bg(Color::Rgb(24, 28, 36)),
        border_style: Style::default().fg(Color::Rgb(92, 110, 140)),
        line_style: Style::default().fg(Color::Rgb(86, 98, 120)),
        badge_style: Style::default()
            .fg(Color::Rgb(136, 192, 208))
            .add_modifier(Modifier::BOLD),
        highlight_style: Style::default()
            .fg(Color::Rgb(255, 255, 255))
            .bg(Color::Rgb(52, 66, 96))
            .add_modifier(Modifier::BOLD),
        ..TreeViewStyle::default()
    }
}

fn render_name(frame: &mut Frame, area: Rect, step: &NameStep) {
    let lines = vec![
        Line::from("Chatbot name:"),
        Line::from(vec![
            Span::raw(step.name.as_str()),
            Span::styled(" ", Style::default().add_modifier(Modifier::REVERSED)),
        ]),
    ];
    let block = Block::default().borders(Borders::ALL).title(" Step 1 of 2 ");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render(frame: &mut Frame, wizard: &mut Wizard) {
    let [body, status, help] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    let (error, hint) = match wizard.step {
        Step::Name => {
            render_name(frame, body, &wizard.name);
            (wizard.name.error, "Enter: next  Esc: quit")
        }
        Step::Messages => {
            wizard.editor.render(body, frame.buffer_mut(), tree_style());
            (
                wizard.editor.error_message(),
                "a: sub-option  r: message  Enter: edit  d: remove  Space: fold  C/E: fold all  Ctrl+S: save  Esc: back",
            )
        }
    };

    if let Some(error) = error {
        frame.render_widget(
            Paragraph::new(error).style(Style::default().fg(Color::Red)),
            status,
        );
    }
    frame.render_widget(
        Paragraph::new(hint).style(Style::default().fg(Color::DarkGray)),
        help,
    );
}

fn run_app(mut terminal: DefaultTerminal, mut wizard: Wizard) -> io::Result<Option<String>> {
    loop {
        terminal.draw(|frame| render(frame, &mut wizard))?;

        if event::poll(Duration::from_millis(200))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match wizard.handle_key(key) {
                Flow::Continue => {}
                Flow::Quit => return Ok(None),
                Flow::Submit(json) => return Ok(Some(json)),
            }
        }
    }
}

// Logs go to a file so the terminal UI stays clean; the guard flushes them on exit.
fn init_logging() -> Option<WorkerGuard> {
    let log_dir = env::var_os("MESSAGE_TREE_LOG_DIR")?;
    let file_appender = tracing_appender::rolling::never(log_dir, "message-tree.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tui_messagetree=debug,wizard=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(non_blocking)
        .init();
    Some(guard)
}

fn main() -> io::Result<()> {
    let _log_guard = init_logging();

    let initial = match env::args().nth(1) {
        Some(path) => Some(fs::read_to_string(path)?),
        None => None,
    };
    let wizard = Wizard {
        step: Step::Name,
        name: NameStep::default(),
        editor: MessageTreeEditor::from_initial(initial.as_deref(), EditorConfig::default()),
    };

    let terminal = ratatui::init();
    let result = run_app(terminal, wizard);
    ratatui::restore();

    if let Some(json) = result? {
        println!("{json}");
    }
    Ok(())
}
