use anyhow::Result;
use best_card::{
    delete_saved_card, insert_saved_card, nice_label, AppConfig, CardRef, Catalog, MatchResult,
    SavedCardRef, SavedCards, SearchEngine,
};
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
    widgets::{Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use rusqlite::Connection;
use std::io;

/// Suggestions shown under the query box
const SUGGESTION_PREVIEW: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Query,
    Results,
    Cards,
}

impl Focus {
    pub fn next(&self) -> Self {
        match self {
            Focus::Query => Focus::Results,
            Focus::Results => Focus::Cards,
            Focus::Cards => Focus::Query,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Focus::Query => Focus::Cards,
            Focus::Results => Focus::Query,
            Focus::Cards => Focus::Results,
        }
    }
}

pub struct App {
    pub engine: SearchEngine,
    pub saved: SavedCards,
    pub conn: Connection,
    pub config: AppConfig,
    pub input: String,
    /// None until the first non-blank search
    pub results: Option<Vec<MatchResult>>,
    /// Query behind `results`; the input box may have moved on since
    pub last_query: String,
    pub results_state: TableState,
    pub cards: Vec<CardRef>,
    pub cards_state: ListState,
    pub focus: Focus,
    pub status: String,
}

impl App {
    pub fn new(engine: SearchEngine, saved: SavedCards, conn: Connection, config: AppConfig) -> Self {
        let cards = engine.cards_sorted();
        let mut cards_state = ListState::default();
        if !cards.is_empty() {
            cards_state.select(Some(0));
        }

        let status = format!("{} cards loaded", cards.len());

        Self {
            engine,
            saved,
            conn,
            config,
            input: String::new(),
            results: None,
            last_query: String::new(),
            results_state: TableState::default(),
            cards,
            cards_state,
            focus: Focus::Query,
            status,
        }
    }

    pub fn run_search(&mut self) {
        let query = self.input.clone();
        self.search_for(&query);
    }

    fn search_for(&mut self, query: &str) {
        // Blank query: keep whatever is on screen
        let Some(results) = self.engine.search(query, &self.saved) else {
            return;
        };

        self.status = if results.is_empty() {
            format!("No matches for \"{}\"", query.trim())
        } else {
            format!("{} results for \"{}\"", results.len(), query.trim())
        };
        self.results_state
            .select(if results.is_empty() { None } else { Some(0) });
        self.results = Some(results);
        self.last_query = query.to_string();
    }

    /// Re-run the query currently on screen, e.g. after the saved set changed
    fn refresh_results(&mut self) {
        if self.results.is_some() {
            let query = self.last_query.clone();
            self.search_for(&query);
        }
    }

    pub fn clear_input(&mut self) {
        self.input.clear();
    }

    pub fn suggestions(&self) -> Vec<&str> {
        if self.input.trim().is_empty() {
            return Vec::new();
        }
        self.engine
            .suggestions_matching(&self.input, SUGGESTION_PREVIEW.min(self.config.suggestion_limit))
    }

    /// Replace the query with the first suggestion
    pub fn accept_suggestion(&mut self) {
        if let Some(first) = self.suggestions().first().map(|s| s.to_string()) {
            self.input = first;
        }
    }

    /// Save or unsave a card, persist it, and re-rank the current results
    pub fn toggle_saved(&mut self, bank: &str, card_name: &str) -> Result<()> {
        let card = SavedCardRef::new(bank, card_name);

        if self.saved.contains(bank, card_name) {
            delete_saved_card(&self.conn, &card)?;
            self.saved.remove(bank, card_name);
            self.status = format!("Removed {} - {}", bank, card_name);
        } else {
            insert_saved_card(&self.conn, &card)?;
            self.saved.add(bank, card_name);
            self.status = format!("Saved {} - {}", bank, card_name);
        }

        let status = std::mem::take(&mut self.status);
        self.refresh_results();
        self.status = status;
        Ok(())
    }

    pub fn toggle_selected_card(&mut self) -> Result<()> {
        let Some(card) = self.cards_state.selected().and_then(|i| self.cards.get(i)).cloned() else {
            return Ok(());
        };
        self.toggle_saved(&card.bank, &card.card_name)
    }

    pub fn toggle_selected_result(&mut self) -> Result<()> {
        let Some((bank, card_name)) = self.selected_result().map(|r| (r.bank.clone(), r.card_name.clone()))
        else {
            return Ok(());
        };
        self.toggle_saved(&bank, &card_name)
    }

    pub fn selected_result(&self) -> Option<&MatchResult> {
        let results = self.results.as_ref()?;
        self.results_state.selected().and_then(|i| results.get(i))
    }

    pub fn reload_catalog(&mut self) -> Result<()> {
        let catalog = Catalog::from_file(&self.config.catalog_path)?;
        if self.engine.reload(catalog) {
            self.cards = self.engine.cards_sorted();
            self.cards_state
                .select(if self.cards.is_empty() { None } else { Some(0) });
            self.refresh_results();
            self.status = format!("Catalog reloaded: {} cards", self.cards.len());
        } else {
            self.status = "Catalog unchanged".to_string();
        }
        Ok(())
    }

    pub fn next(&mut self) {
        self.move_selection(true);
    }

    pub fn previous(&mut self) {
        self.move_selection(false);
    }

    fn move_selection(&mut self, forward: bool) {
        match self.focus {
            Focus::Results => {
                let len = self.results.as_ref().map_or(0, Vec::len);
                let i = step(self.results_state.selected(), len, forward);
                self.results_state.select(i);
            }
            Focus::Cards => {
                let i = step(self.cards_state.selected(), self.cards.len(), forward);
                self.cards_state.select(i);
            }
            Focus::Query => {}
        }
    }

    /// Apply one key press. Returns false when the app should exit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        let outcome = match key.code {
            KeyCode::Esc => return false,
            KeyCode::Char('c') if ctrl => return false,
            KeyCode::Char('u') if ctrl => {
                self.clear_input();
                self.focus = Focus::Query;
                Ok(())
            }
            KeyCode::Char('r') if ctrl => self.reload_catalog(),
            KeyCode::Tab => {
                self.focus = self.focus.next();
                Ok(())
            }
            KeyCode::BackTab => {
                self.focus = self.focus.previous();
                Ok(())
            }
            KeyCode::Down => {
                self.next();
                Ok(())
            }
            KeyCode::Up => {
                self.previous();
                Ok(())
            }
            _ => self.handle_focused_key(key),
        };

        if let Err(e) = outcome {
            self.status = format!("Error: {:#}", e);
        }
        true
    }

    fn handle_focused_key(&mut self, key: KeyEvent) -> Result<()> {
        match (self.focus, key.code) {
            (Focus::Query, KeyCode::Enter) => self.run_search(),
            (Focus::Query, KeyCode::Right) => self.accept_suggestion(),
            (Focus::Query, KeyCode::Backspace) => {
                self.input.pop();
            }
            (Focus::Query, KeyCode::Char(c)) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.push(c)
            }
            (Focus::Results, KeyCode::Enter | KeyCode::Char('s')) => self.toggle_selected_result()?,
            (Focus::Cards, KeyCode::Enter | KeyCode::Char(' ')) => self.toggle_selected_card()?,
            _ => {}
        }
        Ok(())
    }
}

/// Wrapping selection move
fn step(current: Option<usize>, len: usize, forward: bool) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let i = match current {
        Some(i) if forward => (i + 1) % len,
        Some(0) => len - 1,
        Some(i) => i - 1,
        None => 0,
    };
    Some(i)
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
            // Windows reports releases too
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if !app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Query input
            Constraint::Length(1), // Suggestions
            Constraint::Min(0),    // Results + cards
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_input(f, chunks[0], app);
    render_suggestions(f, chunks[1], app);

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(chunks[2]);

    render_results(f, content_chunks[0], app);

    let side_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(content_chunks[1]);

    render_saved_cards(f, side_chunks[0], app);
    render_card_picker(f, side_chunks[1], app);

    render_status_bar(f, chunks[3], app);
}

fn border_style(app: &App, focus: Focus) -> Style {
    if app.focus == focus {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::White)
    }
}

fn render_input(f: &mut Frame, area: Rect, app: &App) {
    let input = Paragraph::new(app.input.as_str()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style(app, Focus::Query))
            .title(" Merchant or category "),
    );
    f.render_widget(input, area);

    if app.focus == Focus::Query {
        let width = app.input.chars().count() as u16;
        f.set_cursor(area.x + 1 + width.min(area.width.saturating_sub(2)), area.y + 1);
    }
}

fn render_suggestions(f: &mut Frame, area: Rect, app: &App) {
    let suggestions = app.suggestions();
    let mut spans = vec![Span::styled(" ➜ ", Style::default().fg(Color::DarkGray))];
    for (i, suggestion) in suggestions.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" · "));
        }
        let style = if i == 0 {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Cyan)
        };
        spans.push(Span::styled(suggestion.to_string(), style));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_results(f: &mut Frame, area: Rect, app: &mut App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app, Focus::Results))
        .title(" Best cards ");

    let Some(results) = app.results.as_ref() else {
        let hint = Paragraph::new("Type a merchant (e.g. Grab) or category and press Enter.").block(block);
        f.render_widget(hint, area);
        return;
    };

    if results.is_empty() {
        let empty = Paragraph::new("No matching card benefits found.").block(block);
        f.render_widget(empty, area);
        return;
    }

    let header_cells = ["Card", "Category", "Benefit", "Score"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = results.iter().map(|r| {
        let card = if r.saved {
            Line::from(vec![
                Span::raw(truncate(&r.card, 24)),
                Span::styled(" ★", Style::default().fg(Color::Green)),
            ])
        } else {
            Line::from(truncate(&r.card, 26))
        };

        Row::new(vec![
            Cell::from(card),
            Cell::from(truncate(&nice_label(&r.category), 20)),
            Cell::from(truncate(&r.description, 60)),
            Cell::from(format!("{:.0}", r.score)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(28),
            Constraint::Length(22),
            Constraint::Min(20),
            Constraint::Length(7),
        ],
    )
    .header(header)
    .block(block)
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.results_state);
}

fn render_saved_cards(f: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = if app.saved.is_empty() {
        vec![ListItem::new(Span::styled(
            "No saved cards yet.",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        app.saved
            .iter()
            .map(|c| ListItem::new(format!("★ {} - {}", c.bank, c.card_name)))
            .collect()
    };

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" Saved cards ({}) ", app.saved.len())),
    );
    f.render_widget(list, area);
}

fn render_card_picker(f: &mut Frame, area: Rect, app: &mut App) {
    let items: Vec<ListItem> = app
        .cards
        .iter()
        .map(|card| {
            let saved = app.saved.contains(&card.bank, &card.card_name);
            let mark = if saved { "★ " } else { "  " };
            let style = if saved {
                Style::default().fg(Color::Green)
            } else {
                Style::default()
            };
            ListItem::new(format!("{}{}", mark, card.label())).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style(app, Focus::Cards))
                .title(" All cards "),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("→ ");

    f.render_stateful_widget(list, area, &mut app.cards_state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![Span::styled(
        format!(" {} ", app.status),
        Style::default().fg(Color::Cyan),
    )];

    let hints: &[(&str, &str)] = match app.focus {
        Focus::Query => &[("Enter", "Search"), ("→", "Complete"), ("Ctrl+U", "Clear")],
        Focus::Results => &[("Enter/s", "Save/unsave card"), ("↑/↓", "Nav")],
        Focus::Cards => &[("Enter/Space", "Save/unsave"), ("↑/↓", "Nav")],
    };
    for (key, action) in hints.iter().chain(&[("Tab", "Focus"), ("Ctrl+R", "Reload")]) {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(*key, Style::default().fg(Color::Yellow)));
        spans.push(Span::raw(format!(" {}", action)));
    }
    spans.push(Span::raw(" | "));
    spans.push(Span::styled("Esc", Style::default().fg(Color::Red)));
    spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(Line::from(spans)).block(
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
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
