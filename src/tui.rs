use std::collections::VecDeque;
use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::ExecutableCommand;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use miette::IntoDiagnostic;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, List, ListItem,
    ListState, Paragraph, Wrap,
};

use crate::domain::{SubjectId, TaxonObservation};
use crate::error::DashError;
use crate::render::{self, BarBounds, BubbleBounds, ChartRenderer, MetadataLine};
use crate::session::Session;

const EVENTS_MAX: usize = 50;
const BAR_RESOLUTION: u64 = 1000;
const HINT: &str = "↑/↓ select  Home/End jump  / search  q quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    Browse,
    Search,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Continue,
    Reselect,
    Quit,
}

/// Terminal dashboard. Holds the panels of the currently selected subject,
/// filled through [`ChartRenderer`].
pub struct Dashboard {
    metadata: Vec<MetadataLine>,
    bar: Vec<TaxonObservation>,
    bubble: Vec<TaxonObservation>,
    events: VecDeque<String>,
    input: String,
    mode: InputMode,
    error: Option<String>,
}

impl ChartRenderer for Dashboard {
    fn draw_metadata(&mut self, lines: &[MetadataLine]) -> Result<(), DashError> {
        self.metadata = lines.to_vec();
        Ok(())
    }

    fn draw_bar_chart(&mut self, observations: &[TaxonObservation]) -> Result<(), DashError> {
        self.bar = observations.to_vec();
        Ok(())
    }

    fn draw_bubble_chart(&mut self, observations: &[TaxonObservation]) -> Result<(), DashError> {
        self.bubble = observations.to_vec();
        Ok(())
    }
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Dashboard {
    pub fn new() -> Self {
        Self {
            metadata: Vec::new(),
            bar: Vec::new(),
            bubble: Vec::new(),
            events: VecDeque::new(),
            input: String::new(),
            mode: InputMode::Browse,
            error: None,
        }
    }

    pub fn run(&mut self, session: &mut Session<'_>) -> miette::Result<()> {
        let mut terminal = enter_terminal().into_diagnostic()?;
        let result = self.event_loop(&mut terminal, session);
        leave_terminal().into_diagnostic()?;
        result
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
        session: &mut Session<'_>,
    ) -> miette::Result<()> {
        self.refresh(session);
        loop {
            terminal
                .draw(|frame| draw_ui(frame, self, &*session))
                .into_diagnostic()?;

            if !event::poll(Duration::from_millis(250)).into_diagnostic()? {
                continue;
            }
            if let Event::Key(key) = event::read().into_diagnostic()? {
                match self.handle_key(key, session) {
                    Action::Quit => break,
                    Action::Reselect => self.refresh(session),
                    Action::Continue => {}
                }
            }
        }
        Ok(())
    }

    /// Recomputes every panel for the current selection. Errors are shown in
    /// the status line with empty panels rather than stale ones.
    pub fn refresh(&mut self, session: &Session<'_>) {
        let subject = session.current();
        let outcome = session
            .plan()
            .and_then(|plan| render::present(&plan, self));
        match outcome {
            Ok(()) => {
                self.error = None;
                self.push_event(format!("subject {subject}: {} taxa", self.bubble.len()));
            }
            Err(err) => {
                self.metadata.clear();
                self.bar.clear();
                self.bubble.clear();
                self.push_event(format!("subject {subject}: {err}"));
                self.error = Some(err.to_string());
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent, session: &mut Session<'_>) -> Action {
        if key.kind != KeyEventKind::Press {
            return Action::Continue;
        }
        match self.mode {
            InputMode::Browse => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
                KeyCode::Up | KeyCode::Char('k') => {
                    session.select_previous();
                    Action::Reselect
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    session.select_next();
                    Action::Reselect
                }
                KeyCode::Home | KeyCode::Char('g') => {
                    session.select_first();
                    Action::Reselect
                }
                KeyCode::End | KeyCode::Char('G') => {
                    session.select_last();
                    Action::Reselect
                }
                KeyCode::Char('/') => {
                    self.mode = InputMode::Search;
                    self.input.clear();
                    Action::Continue
                }
                _ => Action::Continue,
            },
            InputMode::Search => match key.code {
                KeyCode::Esc => {
                    self.mode = InputMode::Browse;
                    self.input.clear();
                    Action::Continue
                }
                KeyCode::Enter => {
                    self.mode = InputMode::Browse;
                    let needle = std::mem::take(&mut self.input);
                    let Some(best) = best_match(needle.trim(), session) else {
                        self.push_event(format!("no subject matches {needle:?}"));
                        return Action::Continue;
                    };
                    match session.select(&best) {
                        Ok(()) => Action::Reselect,
                        Err(err) => {
                            self.push_event(err.to_string());
                            Action::Continue
                        }
                    }
                }
                KeyCode::Backspace => {
                    self.input.pop();
                    Action::Continue
                }
                KeyCode::Char(ch) => {
                    self.input.push(ch);
                    Action::Continue
                }
                _ => Action::Continue,
            },
        }
    }

    fn push_event(&mut self, message: String) {
        let stamp = chrono::Local::now().format("%H:%M:%S");
        self.events.push_back(format!("[{stamp}] {message}"));
        while self.events.len() > EVENTS_MAX {
            self.events.pop_front();
        }
    }
}

fn enter_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    terminal.clear()?;
    Ok(terminal)
}

fn leave_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

fn best_match(needle: &str, session: &Session<'_>) -> Option<SubjectId> {
    if needle.is_empty() {
        return None;
    }
    let mut best: Option<(usize, &SubjectId)> = None;
    for subject in session.subjects() {
        if let Some(score) = fuzzy_score(needle, subject.as_str()) {
            // exact ids beat any fuzzy hit
            let score = if subject.as_str() == needle { 0 } else { score };
            match best {
                Some((best_score, _)) if score >= best_score => {}
                _ => best = Some((score, subject)),
            }
        }
    }
    best.map(|(_, subject)| subject.clone())
}

fn fuzzy_score(needle: &str, hay: &str) -> Option<usize> {
    let mut score = 0usize;
    let mut iter = hay.chars();
    for ch in needle.chars() {
        let mut found = false;
        for h in iter.by_ref() {
            score += 1;
            if h.eq_ignore_ascii_case(&ch) {
                found = true;
                break;
            }
        }
        if !found {
            return None;
        }
    }
    Some(score + hay.chars().count())
}

fn draw_ui(frame: &mut ratatui::Frame, dashboard: &Dashboard, session: &Session<'_>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(10),
            Constraint::Length(3),
        ])
        .split(frame.area());

    frame.render_widget(draw_header(session), chunks[0]);

    let main = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(28), Constraint::Percentage(72)])
        .split(chunks[1]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(main[0]);
    draw_selector(frame, session, left[0]);
    frame.render_widget(draw_metadata_panel(dashboard), left[1]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(38),
            Constraint::Percentage(37),
            Constraint::Percentage(25),
        ])
        .split(main[1]);
    draw_bar_chart(frame, dashboard, session, right[0]);
    draw_bubble_chart(frame, dashboard, right[1]);
    frame.render_widget(draw_taxon_panel(dashboard), right[2]);

    frame.render_widget(draw_status_line(dashboard), chunks[2]);
}

fn draw_header(session: &Session<'_>) -> Paragraph<'static> {
    let line = Line::from(vec![
        Span::styled(
            "OTU-DASH",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(env!("CARGO_PKG_VERSION"), Style::default().fg(Color::Gray)),
        Span::raw("   "),
        Span::styled("Subject: ", Style::default().fg(Color::Gray)),
        Span::styled(
            session.current().to_string(),
            Style::default().fg(Color::Yellow),
        ),
        Span::styled(
            format!("   ({}/{})", session.index() + 1, session.subjects().len()),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    Paragraph::new(line).block(Block::default().borders(Borders::BOTTOM))
}

fn draw_selector(frame: &mut ratatui::Frame, session: &Session<'_>, area: Rect) {
    let items: Vec<ListItem> = session
        .subjects()
        .iter()
        .map(|subject| ListItem::new(subject.to_string()))
        .collect();
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Test Subject ID"))
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(Some(session.index()));
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_metadata_panel(dashboard: &Dashboard) -> Paragraph<'static> {
    let lines: Vec<Line> = dashboard
        .metadata
        .iter()
        .map(|line| {
            Line::from(vec![
                Span::styled(format!("{}: ", line.label), Style::default().fg(Color::Gray)),
                Span::raw(line.value.clone()),
            ])
        })
        .collect();
    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Demographic Info"))
        .wrap(Wrap { trim: true })
}

fn draw_bar_chart(
    frame: &mut ratatui::Frame,
    dashboard: &Dashboard,
    session: &Session<'_>,
    area: Rect,
) {
    let bounds = BarBounds::of(&dashboard.bar);
    // Observations arrive smallest first; horizontal bars are laid out top
    // down, so iterate in reverse to keep the largest taxon on top.
    let bars: Vec<Bar> = dashboard
        .bar
        .iter()
        .rev()
        .map(|obs| {
            Bar::default()
                .value(bar_length(obs.otu_value, bounds.max_value))
                .label(Line::from(format!("OTU {}", obs.otu_id)))
                .text_value(format!("{}", obs.otu_value))
        })
        .collect();
    let title = format!("Top {} OTUs for {}", dashboard.bar.len(), session.current());
    let chart = BarChart::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .bar_style(Style::default().fg(Color::Green))
        .value_style(Style::default().fg(Color::White))
        .max(BAR_RESOLUTION)
        .data(BarGroup::default().bars(&bars));
    frame.render_widget(chart, area);
}

/// Bar length in `BAR_RESOLUTION` steps relative to the largest bar. Any
/// positive value gets at least one step.
fn bar_length(value: f64, max_value: f64) -> u64 {
    if !(value.is_finite() && value > 0.0 && max_value.is_finite() && max_value > 0.0) {
        return 0;
    }
    let steps = (value / max_value * BAR_RESOLUTION as f64).round() as u64;
    steps.clamp(1, BAR_RESOLUTION)
}

fn draw_bubble_chart(frame: &mut ratatui::Frame, dashboard: &Dashboard, area: Rect) {
    let bounds = BubbleBounds::of(&dashboard.bubble);
    let mut small = Vec::new();
    let mut medium = Vec::new();
    let mut large = Vec::new();
    for obs in &dashboard.bubble {
        let point = (obs.otu_id as f64, obs.otu_value);
        match bounds.radius(obs.otu_value) {
            r if r >= 0.66 => large.push(point),
            r if r >= 0.33 => medium.push(point),
            _ => small.push(point),
        }
    }

    let datasets = vec![
        Dataset::default()
            .name("low")
            .marker(Marker::Braille)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Blue))
            .data(&small),
        Dataset::default()
            .name("mid")
            .marker(Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Yellow))
            .data(&medium),
        Dataset::default()
            .name("high")
            .marker(Marker::Block)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Red))
            .data(&large),
    ];

    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title("OTU abundance"))
        .x_axis(
            Axis::default()
                .title("OTU ID")
                .style(Style::default().fg(Color::Gray))
                .bounds(bounds.x)
                .labels(axis_labels(bounds.x)),
        )
        .y_axis(
            Axis::default()
                .title("Value")
                .style(Style::default().fg(Color::Gray))
                .bounds(bounds.y)
                .labels(axis_labels(bounds.y)),
        );
    frame.render_widget(chart, area);
}

fn draw_taxon_panel(dashboard: &Dashboard) -> Paragraph<'static> {
    Paragraph::new(taxon_lines(dashboard))
        .block(Block::default().borders(Borders::ALL).title("Taxa"))
}

/// One row per taxon in bubble order, carrying the lineage label the charts
/// have no room for. Rows that also appear in the bar chart are highlighted.
fn taxon_lines(dashboard: &Dashboard) -> Vec<Line<'static>> {
    dashboard
        .bubble
        .iter()
        .map(|obs| {
            let style = if dashboard.bar.contains(obs) {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Gray)
            };
            Line::from(vec![
                Span::styled(format!("{:>6}  {:>8}  ", obs.otu_id, obs.otu_value), style),
                Span::raw(obs.otu_label.clone()),
            ])
        })
        .collect()
}

fn axis_labels(bounds: [f64; 2]) -> Vec<String> {
    let mid = (bounds[0] + bounds[1]) / 2.0;
    vec![
        format!("{:.0}", bounds[0]),
        format!("{mid:.0}"),
        format!("{:.0}", bounds[1]),
    ]
}

fn draw_status_line(dashboard: &Dashboard) -> Paragraph<'static> {
    let status = match (&dashboard.error, dashboard.events.back()) {
        (Some(err), _) => Span::styled(err.clone(), Style::default().fg(Color::Red)),
        (None, Some(event)) => Span::styled(event.clone(), Style::default().fg(Color::Gray)),
        (None, None) => Span::raw("ready"),
    };
    let prompt = match dashboard.mode {
        InputMode::Search => Line::from(vec![
            Span::styled("/", Style::default().fg(Color::Cyan)),
            Span::raw(dashboard.input.clone()),
        ]),
        InputMode::Browse => Line::from(Span::styled(HINT, Style::default().fg(Color::DarkGray))),
    };
    Paragraph::new(vec![Line::from(status), prompt])
        .block(Block::default().borders(Borders::TOP))
}
