use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
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
use std::sync::{Arc, Mutex};

use rideroad::achievements::{self, AchievementStatus, AchievementSummary, Rarity};
use rideroad::stats::{format_currency, GarageSummary, GroupStatistics};
use rideroad::{CollectorProfile, Condition, Family, GarageStore, Vehicle, VehicleGroup};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Cars,
    Motorcycles,
    Achievements,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Cars => Page::Motorcycles,
            Page::Motorcycles => Page::Achievements,
            Page::Achievements => Page::Cars,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Cars => Page::Achievements,
            Page::Motorcycles => Page::Cars,
            Page::Achievements => Page::Motorcycles,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Cars => "Cars",
            Page::Motorcycles => "Motorcycles",
            Page::Achievements => "Achievements",
        }
    }

    /// Family shown on this page, if it is a group page
    pub fn family(&self) -> Option<Family> {
        match self {
            Page::Cars => Some(Family::Cars),
            Page::Motorcycles => Some(Family::Motorcycles),
            Page::Achievements => None,
        }
    }
}

pub struct App {
    pub store: GarageStore,
    pub profile: CollectorProfile,
    pub current_page: Page,
    pub state: TableState,
    pub achievements_state: TableState,
    pub show_detail: bool,
    /// Last store event, written by the store observer
    pub last_event: Arc<Mutex<Option<String>>>,
}

impl App {
    pub fn new(mut store: GarageStore, profile: CollectorProfile) -> Self {
        let last_event = Arc::new(Mutex::new(None));

        let sink = Arc::clone(&last_event);
        store.subscribe(move |event| {
            let text = format!(
                "{} {}",
                event.event_type.as_str(),
                if event.persisted { "saved" } else { "NOT saved" }
            );
            if let Ok(mut slot) = sink.lock() {
                *slot = Some(text);
            }
        });

        let mut state = TableState::default();
        if !store.groups(Family::Cars).is_empty() {
            state.select(Some(0));
        }

        let mut achievements_state = TableState::default();
        achievements_state.select(Some(0));

        Self {
            store,
            profile,
            current_page: Page::Cars,
            state,
            achievements_state,
            show_detail: false,
            last_event,
        }
    }

    /// Groups of the family on the current page; empty on other pages
    pub fn groups(&self) -> &[VehicleGroup] {
        match self.current_page.family() {
            Some(family) => self.store.groups(family),
            None => &[],
        }
    }

    pub fn selected_group(&self) -> Option<&VehicleGroup> {
        self.state.selected().and_then(|i| self.groups().get(i))
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
        self.reset_selection();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
        self.reset_selection();
    }

    fn reset_selection(&mut self) {
        let selection = if self.groups().is_empty() { None } else { Some(0) };
        self.state.select(selection);
        self.show_detail = false;
    }

    fn active_len(&self) -> usize {
        match self.current_page {
            Page::Achievements => achievements::RULES.len(),
            _ => self.groups().len(),
        }
    }

    fn active_state(&mut self) -> &mut TableState {
        match self.current_page {
            Page::Achievements => &mut self.achievements_state,
            _ => &mut self.state,
        }
    }

    pub fn next(&mut self) {
        let len = self.active_len();
        if len == 0 {
            return;
        }
        let state = self.active_state();
        let i = match state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.active_len();
        if len == 0 {
            return;
        }
        let state = self.active_state();
        let i = match state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        state.select(Some(i));
    }

    /// Delete the highlighted group (and its members)
    pub fn delete_selected(&mut self) -> bool {
        let Some(family) = self.current_page.family() else {
            return false;
        };
        let Some(id) = self.selected_group().map(|g| g.id) else {
            return false;
        };

        let deleted = self.store.delete_group(family, id);

        let len = self.groups().len();
        let selection = match self.state.selected() {
            _ if len == 0 => None,
            Some(i) if i >= len => Some(len - 1),
            other => other,
        };
        self.state.select(selection);

        deleted
    }

    pub fn last_event(&self) -> Option<String> {
        self.last_event.lock().ok().and_then(|slot| slot.clone())
    }

    pub fn achievements(&self) -> Vec<AchievementStatus> {
        achievements::evaluate(self.store.garage())
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
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::Tab => {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        app.previous_page();
                    } else {
                        app.next_page();
                    }
                }
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Char('d') => {
                    app.delete_selected();
                }
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Achievements => render_achievements(f, chunks[1], app),
        _ if app.show_detail => {
            let content_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([
                    Constraint::Percentage(55), // Group list
                    Constraint::Percentage(45), // Member panel
                ])
                .split(chunks[1]);

            render_groups(f, content_chunks[0], app);
            render_members(f, content_chunks[1], app);
        }
        _ => render_groups(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let summary = GarageSummary::compute(app.store.garage());

    let pages = [Page::Cars, Page::Motorcycles, Page::Achievements];

    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("🚗 {}", summary.cars.total_count),
        Style::default().fg(Color::Cyan),
    ));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(
        format!("🏍️ {}", summary.motorcycles.total_count),
        Style::default().fg(Color::Magenta),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format_currency(summary.combined_value),
        Style::default().fg(Color::Green),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        app.profile.display_name().to_string(),
        Style::default().fg(Color::White),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    let cells = titles.iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    Row::new(cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1)
}

fn render_groups(f: &mut Frame, area: Rect, app: &mut App) {
    let title = format!(" {} Groups ", app.current_page.title());

    let rows: Vec<Row> = app
        .groups()
        .iter()
        .map(|group| {
            let stats = GroupStatistics::compute(group);
            Row::new(vec![
                Cell::from(truncate(&group.name, 24)),
                Cell::from(truncate(&group.location, 18)),
                Cell::from(stats.total_count.to_string()),
                Cell::from(format_currency(stats.total_value)).style(Style::default().fg(Color::Green)),
                Cell::from(stats.excellent_count.to_string()),
                Cell::from(stats.type_count.to_string()),
            ])
            .height(1)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(26),
            Constraint::Length(20),
            Constraint::Length(10),
            Constraint::Length(16),
            Constraint::Length(10),
            Constraint::Length(7),
        ],
    )
    .header(header_row(&["Name", "Location", "Vehicles", "Value", "Excellent", "Types"]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn condition_color(condition: Condition) -> Color {
    match condition {
        Condition::Excellent => Color::Green,
        Condition::Good => Color::Blue,
        Condition::Fair => Color::Yellow,
        Condition::Poor => Color::Red,
        Condition::Damaged => Color::DarkGray,
    }
}

fn member_line(member: &Vehicle, usage_label: &str) -> Vec<Line<'static>> {
    vec![
        Line::from(vec![
            Span::raw(format!("  {} ", member.type_tag)),
            Span::styled(
                member.name.clone(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("  ×{}", member.quantity)),
        ]),
        Line::from(vec![
            Span::raw(format!("     {} {} · ", member.brand, member.year)),
            Span::styled(
                format_currency(member.total_value()),
                Style::default().fg(Color::Green),
            ),
            Span::raw(" · "),
            Span::styled(
                member.condition.as_str(),
                Style::default().fg(condition_color(member.condition)),
            ),
            Span::raw(format!(" · {} {}", usage_label, member.usage)),
        ]),
    ]
}

fn render_members(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Group Members ");

    let (Some(group), Some(family)) = (app.selected_group(), app.current_page.family()) else {
        f.render_widget(Paragraph::new("No group selected").block(block), area);
        return;
    };

    let mut content = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Group: ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            Span::raw(group.name.clone()),
        ]),
        Line::from(vec![
            Span::styled("  Location: ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            Span::raw(group.location.clone()),
        ]),
    ];
    if !group.description.is_empty() {
        content.push(Line::from(vec![Span::styled(
            format!("  {}", group.description),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )]));
    }
    content.push(Line::from(""));
    content.push(Line::from("  ─────────────────────────────────────"));

    if group.members.is_empty() {
        content.push(Line::from(""));
        content.push(Line::from("  (empty)"));
    }
    for member in &group.members {
        content.push(Line::from(""));
        content.extend(member_line(member, family.usage_label()));
    }

    content.push(Line::from(""));
    content.push(Line::from(vec![Span::styled(
        "  Press Enter to close",
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    )]));

    f.render_widget(Paragraph::new(content).block(block), area);
}

fn rarity_color(rarity: Rarity) -> Color {
    match rarity {
        Rarity::Common => Color::White,
        Rarity::Rare => Color::Blue,
        Rarity::Epic => Color::Magenta,
        Rarity::Legendary => Color::Yellow,
    }
}

fn progress_bar(progress: i64, target: i64, width: usize) -> String {
    let filled = if target <= 0 {
        width
    } else {
        ((progress.max(0) as usize) * width / target as usize).min(width)
    };
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

fn render_achievements(f: &mut Frame, area: Rect, app: &mut App) {
    let statuses = app.achievements();
    let overall = AchievementSummary::from_statuses(&statuses);

    let rows: Vec<Row> = statuses
        .iter()
        .map(|status| {
            let style = if status.unlocked {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::DarkGray)
            };

            Row::new(vec![
                Cell::from(format!("{} {}", status.icon, status.title)),
                Cell::from(status.rarity.as_str()).style(Style::default().fg(rarity_color(status.rarity))),
                Cell::from(progress_bar(status.progress, status.target, 12)).style(style),
                Cell::from(format!("{}/{}", status.progress, status.target)),
                Cell::from(if status.unlocked { "✓" } else { "" }).style(style),
            ])
            .height(1)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(28),
            Constraint::Length(11),
            Constraint::Length(14),
            Constraint::Length(10),
            Constraint::Length(3),
        ],
    )
    .header(header_row(&["Achievement", "Rarity", "Progress", "", ""]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(
                " Achievements - {}/{} unlocked ({}%) ",
                overall.unlocked, overall.total, overall.percent
            )),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.achievements_state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let (selected, total) = match app.current_page {
        Page::Achievements => (
            app.achievements_state.selected().map(|i| i + 1).unwrap_or(0),
            achievements::RULES.len(),
        ),
        _ => (
            app.state.selected().map(|i| i + 1).unwrap_or(0),
            app.groups().len(),
        ),
    };

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, total),
        Style::default().fg(Color::Cyan),
    )];

    if let Some(event) = app.last_event() {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(event, Style::default().fg(Color::Green)));
    }
    if let Some(err) = app.store.last_write_error() {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(
            format!("write failed: {}", truncate(err, 30)),
            Style::default().fg(Color::Red),
        ));
    }

    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Members | "));
    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Page | "));
    status_spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Nav | "));
    status_spans.push(Span::styled("d", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Delete | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
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
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
