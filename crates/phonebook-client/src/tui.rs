//! Terminal User Interface (TUI) for browsing the phonebook.
//!
//! Shows the search input, the directory tree, the error line and an
//! event log. Built with ratatui and crossterm.
//!
//! Keys: type to search, Up/Down to select, Enter/Right/Left to open or
//! close the selected department, Esc to reset, Ctrl-C to quit.

use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use tokio::time::Instant;

use phonebook_protocol::{Abonent, NodeId};
use phonebook_tree::forest::{Row, RowKind};

use crate::app::PhonebookApp;

/// A log entry for the event log panel.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub category: LogCategory,
    pub message: String,
}

/// Category of a log entry, used for coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogCategory {
    Fetch,
    Search,
    Error,
    System,
}

impl LogCategory {
    /// Short label for display in the event log.
    pub fn label(&self) -> &'static str {
        match self {
            LogCategory::Fetch => "FETCH",
            LogCategory::Search => "FIND",
            LogCategory::Error => "ERR",
            LogCategory::System => "SYS",
        }
    }

    fn color(&self) -> Color {
        match self {
            LogCategory::Fetch => Color::Cyan,
            LogCategory::Search => Color::Yellow,
            LogCategory::Error => Color::Red,
            LogCategory::System => Color::Blue,
        }
    }
}

/// What a key press asks the event loop to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    None,
    Quit,
}

/// A displayed tree row, detached from the view borrow.
struct RowLine {
    depth: usize,
    branch: Option<bool>,
    text: String,
}

/// Rendering and input state around the app.
pub struct PhonebookTui {
    app: PhonebookApp,
    input: String,
    selected: usize,
}

impl PhonebookTui {
    pub fn new(app: PhonebookApp) -> Self {
        Self {
            app,
            input: String::new(),
            selected: 0,
        }
    }

    pub fn app(&self) -> &PhonebookApp {
        &self.app
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Id of the selected row, if any row is displayed.
    pub fn selected_id(&self) -> Option<NodeId> {
        self.app.view().rows().get(self.selected).map(|row| row.id.clone())
    }

    fn row_lines(&self) -> Vec<RowLine> {
        self.app
            .view()
            .rows()
            .iter()
            .map(|row: &Row<'_>| match row.kind {
                RowKind::Branch { title, expanded } => RowLine {
                    depth: row.depth,
                    branch: Some(expanded),
                    text: title.to_string(),
                },
                RowKind::Leaf(abonent) => RowLine {
                    depth: row.depth,
                    branch: None,
                    text: leaf_columns(abonent),
                },
            })
            .collect()
    }

    /// Handle one key press at `now`.
    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> KeyAction {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return KeyAction::Quit;
        }

        match key.code {
            KeyCode::Char(c) => {
                self.input.push(c);
                self.app.keyup(&self.input, now);
            }
            KeyCode::Backspace => {
                self.input.pop();
                self.app.keyup(&self.input, now);
            }
            KeyCode::Esc => {
                self.input.clear();
                self.app.escape();
            }
            KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down => {
                let rows = self.app.view().rows().len();
                if self.selected + 1 < rows {
                    self.selected += 1;
                }
            }
            KeyCode::Enter => self.activate_selected(None),
            KeyCode::Right => self.activate_selected(Some(false)),
            KeyCode::Left => self.activate_selected(Some(true)),
            _ => {}
        }
        self.clamp_selection();
        KeyAction::None
    }

    /// Activate the selected branch. With `only_if_expanded`, the
    /// activation only happens when the branch is in that state.
    fn activate_selected(&mut self, only_if_expanded: Option<bool>) {
        let Some(id) = self.selected_id() else {
            return;
        };
        let view = self.app.view();
        if !view.is_branch(&id) {
            return;
        }
        if let Some(expanded) = only_if_expanded {
            if view.is_expanded(&id) != expanded {
                return;
            }
        }
        self.app.activate(&id);
    }

    fn clamp_selection(&mut self) {
        let rows = self.app.view().rows().len();
        self.selected = self.selected.min(rows.saturating_sub(1));
    }

    /// Render the full TUI layout into a frame.
    fn render(&self, frame: &mut Frame) {
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Search
                Constraint::Min(6),    // Tree
                Constraint::Length(1), // Error line
                Constraint::Length(8), // Event log
                Constraint::Length(1), // Key hints
            ])
            .split(frame.area());

        self.render_search(frame, outer[0]);
        self.render_tree(frame, outer[1]);
        self.render_error(frame, outer[2]);
        self.render_event_log(frame, outer[3]);
        self.render_hints(frame, outer[4]);
    }

    fn render_search(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Search ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow));
        let text = Line::from(vec![
            Span::styled("  ", Style::default()),
            Span::styled(&self.input, Style::default().fg(Color::White)),
            Span::styled("_", Style::default().fg(Color::DarkGray)),
        ]);
        frame.render_widget(Paragraph::new(text).block(block), area);
    }

    fn render_tree(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Phonebook ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White));

        let rows = self.row_lines();
        if rows.is_empty() {
            let text = if self.app.in_flight() > 0 {
                "  Loading..."
            } else {
                "  Nothing to show"
            };
            let paragraph = Paragraph::new(Line::from(Span::styled(
                text,
                Style::default().fg(Color::DarkGray),
            )))
            .block(block);
            frame.render_widget(paragraph, area);
            return;
        }

        // Keep the selection in view.
        let inner_height = area.height.saturating_sub(2) as usize;
        let offset = (self.selected + 1).saturating_sub(inner_height);

        let lines: Vec<Line> = rows
            .iter()
            .enumerate()
            .skip(offset)
            .take(inner_height)
            .map(|(i, row)| {
                let indent = "  ".repeat(row.depth + 1);
                let (marker, color) = match row.branch {
                    Some(true) => ("▾ ", Color::Cyan),
                    Some(false) => ("▸ ", Color::Cyan),
                    None => ("  ", Color::White),
                };
                let mut style = Style::default().fg(color);
                if i == self.selected {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                Line::from(vec![
                    Span::raw(indent),
                    Span::styled(format!("{}{}", marker, row.text), style),
                ])
            })
            .collect();

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn render_error(&self, frame: &mut Frame, area: Rect) {
        let line = match self.app.error() {
            Some(message) => Line::from(Span::styled(
                format!("  {}", message),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
            None => Line::from(""),
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_event_log(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Event Log ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Gray));

        let inner_height = area.height.saturating_sub(2) as usize;
        let log = self.app.event_log();
        let skip = log.len().saturating_sub(inner_height);

        let lines: Vec<Line> = log
            .iter()
            .skip(skip)
            .map(|entry| {
                let time_str = entry.timestamp.format("%H:%M:%S").to_string();
                Line::from(vec![
                    Span::styled(
                        format!("  [{}] ", time_str),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::styled(
                        format!("{:<5} ", entry.category.label()),
                        Style::default()
                            .fg(entry.category.color())
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(&entry.message, Style::default().fg(Color::White)),
                ])
            })
            .collect();

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn render_hints(&self, frame: &mut Frame, area: Rect) {
        let hints = Line::from(Span::styled(
            "  Type to search | Up/Down select | Enter/Right/Left open/close | Esc reset | Ctrl-C quit",
            Style::default().fg(Color::DarkGray),
        ));
        frame.render_widget(Paragraph::new(hints), area);
    }
}

/// `post | full name | rank | extensions | landlines`.
pub fn leaf_columns(abonent: &Abonent) -> String {
    [
        abonent.post.clone(),
        abonent.full_name(),
        abonent.rank.clone(),
        abonent.extension.join(", "),
        abonent.landline.join(", "),
    ]
    .join(" | ")
}

/// Set up the terminal for TUI rendering.
fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Run the TUI event loop.
///
/// Redraws every `tick`, or sooner when the search debounce is due, and
/// applies fetch completions between frames. The terminal is restored on
/// exit, including on panic.
pub async fn run_tui(app: PhonebookApp, tick: Duration) -> Result<(), anyhow::Error> {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let mut terminal = setup_terminal()?;
    let mut tui = PhonebookTui::new(app);
    tui.app.start();

    loop {
        tui.app.drain_completions();
        tui.app.poll_timers(Instant::now());
        tui.clamp_selection();

        terminal.draw(|frame| {
            tui.render(frame);
        })?;

        let timeout = match tui.app.session().debounce_deadline() {
            Some(deadline) => tick.min(deadline.saturating_duration_since(Instant::now())),
            None => tick,
        };

        // Spawned fetches keep running on the runtime's worker threads
        // while this task waits for input.
        if event::poll(timeout)? {
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press
                    && tui.handle_key(key_event, Instant::now()) == KeyAction::Quit
                {
                    break;
                }
            }
        }
    }

    restore_terminal(&mut terminal)?;

    Ok(())
}
