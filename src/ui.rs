use anyhow::Result;
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use std::path::Path;

use expense_tracker::{DisplayRow, ExpenseStore, SortColumn, SortState, CATEGORIES};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    Save,
    Load,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Browse,
    Entry,
    PathPrompt(FileAction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryField {
    Date,
    Category,
    Description,
    Amount,
}

impl EntryField {
    pub fn next(&self) -> Self {
        match self {
            EntryField::Date => EntryField::Category,
            EntryField::Category => EntryField::Description,
            EntryField::Description => EntryField::Amount,
            EntryField::Amount => EntryField::Date,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            EntryField::Date => EntryField::Amount,
            EntryField::Category => EntryField::Date,
            EntryField::Description => EntryField::Category,
            EntryField::Amount => EntryField::Description,
        }
    }
}

/// Form state for one expense entry. Date keeps its last value between
/// entries (defaulting to today); description and amount clear after a
/// successful add for faster repeated entry.
pub struct EntryForm {
    pub date: String,
    pub category_index: usize,
    pub description: String,
    pub amount: String,
    pub focus: EntryField,
}

impl EntryForm {
    pub fn new() -> Self {
        EntryForm {
            date: Local::now().format("%Y-%m-%d").to_string(),
            category_index: 0,
            description: String::new(),
            amount: String::new(),
            focus: EntryField::Date,
        }
    }

    pub fn category(&self) -> &str {
        CATEGORIES[self.category_index]
    }

    pub fn next_category(&mut self) {
        self.category_index = (self.category_index + 1) % CATEGORIES.len();
    }

    pub fn previous_category(&mut self) {
        self.category_index = (self.category_index + CATEGORIES.len() - 1) % CATEGORIES.len();
    }

    pub fn clear_after_add(&mut self) {
        self.description.clear();
        self.amount.clear();
        self.focus = EntryField::Description;
    }

    fn focused_text(&mut self) -> Option<&mut String> {
        match self.focus {
            EntryField::Date => Some(&mut self.date),
            EntryField::Description => Some(&mut self.description),
            EntryField::Amount => Some(&mut self.amount),
            EntryField::Category => None,
        }
    }
}

impl Default for EntryForm {
    fn default() -> Self {
        EntryForm::new()
    }
}

pub struct App {
    pub store: ExpenseStore,
    pub rows: Vec<DisplayRow>,
    pub state: TableState,
    pub sort_state: SortState,
    pub mode: Mode,
    pub form: EntryForm,
    pub path_input: String,
    pub notice: Option<String>,
}

impl App {
    pub fn new(store: ExpenseStore) -> Self {
        let rows: Vec<DisplayRow> = store
            .records()
            .iter()
            .map(DisplayRow::from_record)
            .collect();

        let mut state = TableState::default();
        if !rows.is_empty() {
            state.select(Some(0));
        }

        Self {
            store,
            rows,
            state,
            sort_state: SortState::new(),
            mode: Mode::Browse,
            form: EntryForm::new(),
            path_input: String::new(),
            notice: None,
        }
    }

    /// Rebuild the whole projection from store order. Used after load; any
    /// active sort order is discarded along with the old rows.
    pub fn rebuild_rows(&mut self) {
        self.rows = self
            .store
            .records()
            .iter()
            .map(DisplayRow::from_record)
            .collect();
        self.sort_state = SortState::new();
        if self.rows.is_empty() {
            self.state.select(None);
        } else {
            self.state.select(Some(0));
        }
    }

    pub fn submit_entry(&mut self) {
        let category = self.form.category().to_string();
        let row = match self.store.add(
            &self.form.date,
            &category,
            &self.form.description,
            &self.form.amount,
        ) {
            Ok(record) => DisplayRow::from_record(record),
            Err(err) => {
                self.notice = Some(err.to_string());
                return;
            }
        };

        self.rows.push(row);
        self.state.select(Some(self.rows.len() - 1));
        self.notice = Some(format!("Added expense ({} total)", self.store.total_text()));
        self.form.clear_after_add();
        self.mode = Mode::Browse;
    }

    pub fn delete_selected(&mut self) {
        let selected = match self.state.selected() {
            Some(i) if i < self.rows.len() => i,
            _ => {
                self.notice = Some("No selection: select a row to delete".to_string());
                return;
            }
        };

        let row = self.rows[selected].clone();
        match self.store.remove_matching(
            &row.date,
            &row.category,
            &row.description,
            &row.amount,
        ) {
            Some(_) => {
                self.rows.remove(selected);
                if self.rows.is_empty() {
                    self.state.select(None);
                } else if selected >= self.rows.len() {
                    self.state.select(Some(self.rows.len() - 1));
                }
                self.notice = Some(format!("Deleted 1 record ({} total)", self.store.total_text()));
            }
            None => {
                self.notice = Some("Selected row no longer matches a record".to_string());
            }
        }
    }

    pub fn sort_by(&mut self, column: SortColumn) {
        if self.rows.is_empty() {
            return;
        }
        let descending = self.sort_state.sort(&mut self.rows, column);
        self.state.select(Some(0));
        self.notice = Some(format!(
            "Sorted by {} ({})",
            column.title(),
            if descending { "descending" } else { "ascending" }
        ));
    }

    pub fn save_to(&mut self, path: &str) {
        match self.store.save_to_path(Path::new(path)) {
            Ok(()) => {
                self.notice = Some(format!("Saved {} records to {}", self.store.len(), path));
            }
            Err(err) => {
                self.notice = Some(format!("Error saving: {:#}", err));
            }
        }
    }

    pub fn load_from(&mut self, path: &str) {
        match self.store.load_from_path(Path::new(path)) {
            Ok(count) => {
                self.rebuild_rows();
                self.notice = Some(format!("Loaded {} records", count));
            }
            Err(err) => {
                // Store contents are untouched on failure
                self.notice = Some(format!("Error loading: {:#}", err));
            }
        }
    }

    pub fn next(&mut self) {
        let len = self.rows.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.rows.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.rows.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                let next = i + 20;
                if next >= len {
                    len - 1
                } else {
                    next
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        let i = match self.state.selected() {
            Some(i) => {
                if i < 20 {
                    0
                } else {
                    i - 20
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match app.mode {
                Mode::Browse => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Char('a') => {
                        app.notice = None;
                        app.mode = Mode::Entry;
                    }
                    KeyCode::Char('d') | KeyCode::Delete => app.delete_selected(),
                    KeyCode::Char('s') => {
                        if app.store.is_empty() {
                            app.notice = Some("Nothing to save".to_string());
                        } else {
                            app.path_input.clear();
                            app.mode = Mode::PathPrompt(FileAction::Save);
                        }
                    }
                    KeyCode::Char('o') => {
                        app.path_input.clear();
                        app.mode = Mode::PathPrompt(FileAction::Load);
                    }
                    KeyCode::Char('1') => app.sort_by(SortColumn::Date),
                    KeyCode::Char('2') => app.sort_by(SortColumn::Category),
                    KeyCode::Char('3') => app.sort_by(SortColumn::Description),
                    KeyCode::Char('4') => app.sort_by(SortColumn::Amount),
                    KeyCode::Down | KeyCode::Char('j') => app.next(),
                    KeyCode::Up | KeyCode::Char('k') => app.previous(),
                    KeyCode::PageDown => app.page_down(),
                    KeyCode::PageUp => app.page_up(),
                    KeyCode::Home => app.state.select(Some(0)),
                    KeyCode::End => {
                        if !app.rows.is_empty() {
                            app.state.select(Some(app.rows.len() - 1));
                        }
                    }
                    _ => {}
                },
                Mode::Entry => match key.code {
                    KeyCode::Esc => app.mode = Mode::Browse,
                    KeyCode::Enter => app.submit_entry(),
                    KeyCode::Tab | KeyCode::Down => app.form.focus = app.form.focus.next(),
                    KeyCode::BackTab | KeyCode::Up => {
                        app.form.focus = app.form.focus.previous()
                    }
                    KeyCode::Left if app.form.focus == EntryField::Category => {
                        app.form.previous_category()
                    }
                    KeyCode::Right if app.form.focus == EntryField::Category => {
                        app.form.next_category()
                    }
                    KeyCode::Backspace => {
                        if let Some(text) = app.form.focused_text() {
                            text.pop();
                        }
                    }
                    KeyCode::Char(c) => {
                        if let Some(text) = app.form.focused_text() {
                            text.push(c);
                        }
                    }
                    _ => {}
                },
                Mode::PathPrompt(action) => match key.code {
                    // Cancel (or an empty path) is a no-op, not an error
                    KeyCode::Esc => app.mode = Mode::Browse,
                    KeyCode::Enter => {
                        let path = app.path_input.trim().to_string();
                        app.mode = Mode::Browse;
                        if !path.is_empty() {
                            match action {
                                FileAction::Save => app.save_to(&path),
                                FileAction::Load => app.load_from(&path),
                            }
                        }
                    }
                    KeyCode::Backspace => {
                        app.path_input.pop();
                    }
                    KeyCode::Char(c) => app.path_input.push(c),
                    _ => {}
                },
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with total
            Constraint::Min(0),    // Table (with optional entry form)
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.mode == Mode::Entry {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(60), // Expense table
                Constraint::Percentage(40), // Entry form
            ])
            .split(chunks[1]);

        render_table(f, content_chunks[0], app);
        render_entry_form(f, content_chunks[1], app);
    } else {
        render_table(f, chunks[1], app);
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let header_text = vec![Line::from(vec![
        Span::styled(
            "Expense Tracker",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("Records: {}", app.store.len()),
            Style::default().fg(Color::White),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("Total: {}", app.store.total_text()),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
    ])];

    let header = Paragraph::new(header_text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["Date [1]", "Category [2]", "Description [3]", "Amount [4]"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.rows.iter().map(|row| {
        let cells = vec![
            Cell::from(row.date.clone()),
            Cell::from(row.category.clone()),
            Cell::from(truncate(&row.description, 40)),
            Cell::from(row.amount.clone()).style(Style::default().fg(Color::Green)),
        ];
        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(15),
            Constraint::Min(24),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Expenses "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_entry_form(f: &mut Frame, area: Rect, app: &App) {
    let field_style = |field: EntryField| {
        if app.form.focus == field {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Cyan)
        }
    };
    let cursor = |field: EntryField| if app.form.focus == field { "_" } else { "" };

    let content = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Date:        ", field_style(EntryField::Date)),
            Span::raw(format!("{}{}", app.form.date, cursor(EntryField::Date))),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Category:    ", field_style(EntryField::Category)),
            Span::raw(if app.form.focus == EntryField::Category {
                format!("< {} >", app.form.category())
            } else {
                app.form.category().to_string()
            }),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Description: ", field_style(EntryField::Description)),
            Span::raw(format!(
                "{}{}",
                app.form.description,
                cursor(EntryField::Description)
            )),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Amount:      ", field_style(EntryField::Amount)),
            Span::raw(format!("{}{}", app.form.amount, cursor(EntryField::Amount))),
        ]),
        Line::from(""),
        Line::from("  ─────────────────────────────────────"),
        Line::from(vec![
            Span::styled(
                "  Tab",
                Style::default().fg(Color::Yellow),
            ),
            Span::raw(" next field  "),
            Span::styled("←/→", Style::default().fg(Color::Yellow)),
            Span::raw(" category  "),
            Span::styled("Enter", Style::default().fg(Color::Yellow)),
            Span::raw(" add  "),
            Span::styled("Esc", Style::default().fg(Color::Yellow)),
            Span::raw(" cancel"),
        ]),
    ];

    let form_panel = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Add Expense "),
    );

    f.render_widget(form_panel, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = Vec::new();

    if let Mode::PathPrompt(action) = app.mode {
        let label = match action {
            FileAction::Save => "Save to",
            FileAction::Load => "Load from",
        };
        status_spans.push(Span::styled(
            format!(" {}: ", label),
            Style::default().fg(Color::Cyan),
        ));
        status_spans.push(Span::raw(format!("{}_", app.path_input)));
        status_spans.push(Span::raw("  ("));
        status_spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" confirm, "));
        status_spans.push(Span::styled("Esc", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" cancel)"));
    } else if let Some(notice) = &app.notice {
        status_spans.push(Span::styled(
            format!(" {} ", notice),
            Style::default().fg(Color::Green),
        ));
    } else {
        let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
        status_spans.push(Span::styled(
            format!(" Row: {}/{} ", selected, app.rows.len()),
            Style::default().fg(Color::Cyan),
        ));
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled("a", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" Add | "));
        status_spans.push(Span::styled("d", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" Delete | "));
        status_spans.push(Span::styled("s", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" Save | "));
        status_spans.push(Span::styled("o", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" Load | "));
        status_spans.push(Span::styled("1-4", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" Sort | "));
        status_spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" Nav | "));
        status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
        status_spans.push(Span::raw(" Quit"));
    }

    let status_text = vec![Line::from(status_spans)];

    let status_bar = Paragraph::new(status_text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
