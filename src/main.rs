use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols;
use ratatui::widgets::{
    Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Clear, Dataset, GraphType, Paragraph,
};
use tracing::{error, info};

use gps_round_report::chart::ChartModel;
use gps_round_report::config::Config;
use gps_round_report::dataset::{self, LoadReport, ObservationTable};
use gps_round_report::export;
use gps_round_report::family::{ChartKind, Precision};
use gps_round_report::logging;
use gps_round_report::rounds::SortPolicy;
use gps_round_report::state::{ChartPanel, ChartView, DashboardState, Theme};

struct App {
    table: ObservationTable,
    state: DashboardState,
    config: Config,
    should_quit: bool,
}

impl App {
    fn new(table: ObservationTable, report: &LoadReport, config: Config) -> Self {
        let mut state = DashboardState::from_table(&table, config.theme);
        state.push_log(format!(
            "[INFO] Loaded {} rows for {} players from {}",
            report.rows_loaded,
            report.players,
            config.data_file.display()
        ));
        if report.rows_skipped > 0 {
            state.push_log(format!("[WARN] Skipped {} rows", report.rows_skipped));
        }
        Self {
            table,
            state,
            config,
            should_quit: false,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.state.next_player(),
            KeyCode::Char('k') | KeyCode::Up => self.state.prev_player(),
            KeyCode::Enter | KeyCode::Char('u') => self.state.select_player(&self.table),
            KeyCode::Tab => self.state.focus_next(),
            KeyCode::BackTab => self.state.focus_prev(),
            KeyCode::Char(c @ '1'..='6') => {
                self.state.focus_chart(c as usize - '1' as usize);
            }
            KeyCode::Char('d') => self.set_sort(SortPolicy::Chronological),
            KeyCode::Char('v') => self.set_sort(SortPolicy::ByValue),
            KeyCode::Char('f') => self.set_sort(SortPolicy::RecentForm),
            KeyCode::Char('l') | KeyCode::Right => self.state.next_round(),
            KeyCode::Char('h') | KeyCode::Left => self.state.prev_round(),
            KeyCode::Char('t') => self.state.cycle_theme(),
            KeyCode::Char('x') => self.export_selected(),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc => self.state.help_overlay = false,
            _ => {}
        }
    }

    fn set_sort(&mut self, sort: SortPolicy) {
        if self.state.selected_player.is_none() {
            self.state.push_log("[INFO] Select a player first");
        }
        self.state.set_sort(&self.table, sort);
    }

    fn export_selected(&mut self) {
        let Some(player) = self.state.selected_player.clone() else {
            self.state.push_log("[INFO] No player selected for export");
            return;
        };
        let path = self
            .config
            .export_dir
            .join(export::default_file_name(&player));
        let sort = self.state.focused_panel().sort;
        match export::export_player_workbook(&path, &self.table, &player, sort) {
            Ok(report) => {
                info!(path = %report.path.display(), rows = report.rows, "exported workbook");
                self.state.push_log(format!(
                    "[INFO] Exported {} rounds to {}",
                    report.rows,
                    report.path.display()
                ));
                for skipped in report.skipped {
                    self.state.push_log(format!("[WARN] {skipped}"));
                }
            }
            Err(err) => {
                error!("export failed: {err:#}");
                self.state.push_log(format!("[WARN] Export failed: {err}"));
            }
        }
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = Config::load(&args);
    let file_logging = logging::init_file_logging(&config.log_dir);

    let (table, report) = dataset::load_table(&config.data_file, &config.sheet)
        .with_context(|| format!("unable to load {}", config.data_file.display()))?;
    let mut app = App::new(table, &report, config);
    if !file_logging {
        app.state.push_log("[WARN] File logging disabled");
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let poll_rate = Duration::from_millis(250);
    loop {
        terminal.draw(|f| ui(f, app))?;

        if event::poll(poll_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Palette {
    bg: Color,
    fg: Color,
    banner: Color,
    first: Color,
    second: Color,
    line: Color,
    highlight: Color,
    muted: Color,
}

fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Night => Palette {
            bg: Color::Rgb(30, 30, 30),
            fg: Color::White,
            banner: Color::Rgb(0, 0, 128),
            first: Color::Rgb(135, 206, 235),
            second: Color::Rgb(70, 130, 180),
            line: Color::Rgb(30, 144, 255),
            highlight: Color::Yellow,
            muted: Color::DarkGray,
        },
        Theme::Club => Palette {
            bg: Color::White,
            fg: Color::Black,
            banner: Color::Rgb(135, 206, 235),
            first: Color::Rgb(0, 0, 128),
            second: Color::Rgb(100, 149, 237),
            line: Color::Rgb(0, 0, 255),
            highlight: Color::Red,
            muted: Color::Gray,
        },
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let state = &app.state;
    let colors = palette(state.theme);
    frame.render_widget(
        Block::default().style(Style::default().bg(colors.bg).fg(colors.fg)),
        frame.size(),
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.config.title, state))
        .style(
            Style::default()
                .fg(Color::White)
                .bg(colors.banner)
                .add_modifier(Modifier::BOLD),
        )
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(28), Constraint::Min(30)])
        .split(chunks[1]);

    let sidebar = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(body[0]);

    render_player_selector(frame, sidebar[0], state, colors);
    render_round_detail(frame, sidebar[1], state);

    match state.theme {
        Theme::Night => render_chart_grid(frame, body[1], state, colors),
        Theme::Club => render_chart_stack(frame, body[1], state, colors),
    }

    let console = Paragraph::new(console_text(state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text()).style(Style::default().fg(colors.muted));
    frame.render_widget(footer, chunks[3]);

    if state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(title: &str, state: &DashboardState) -> String {
    let player = state.selected_player.as_deref().unwrap_or("-");
    let line1 = format!(" {title} - GPS - Player-data");
    let line2 = format!(" Player: {player} | Theme: {}", state.theme.label());
    format!("{line1}\n{line2}")
}

fn footer_text() -> &'static str {
    "j/k Player | Enter Update | Tab/1-6 Chart | d Round Order | v Low-High | f Form | h/l Round | t Theme | x Export | ? Help | q Quit"
}

fn render_player_selector(frame: &mut Frame, area: Rect, state: &DashboardState, colors: Palette) {
    let block = Block::default().title("Players").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 {
        return;
    }
    if state.players.is_empty() {
        let empty = Paragraph::new("No players in data").style(Style::default().fg(colors.muted));
        frame.render_widget(empty, inner);
        return;
    }

    let (start, end) = visible_range(state.player_cursor, state.players.len(), inner.height as usize);
    for (i, idx) in (start..end).enumerate() {
        let name = &state.players[idx];
        let is_cursor = idx == state.player_cursor;
        let is_selected = state.selected_player.as_deref() == Some(name.as_str());
        let marker = if is_selected { "* " } else { "  " };
        let mut style = Style::default();
        if is_cursor {
            style = style.fg(Color::White).bg(Color::DarkGray);
        }
        if is_selected {
            style = style.add_modifier(Modifier::BOLD);
        }
        let row = Rect {
            x: inner.x,
            y: inner.y + i as u16,
            width: inner.width,
            height: 1,
        };
        frame.render_widget(Paragraph::new(format!("{marker}{name}")).style(style), row);
    }
}

fn render_round_detail(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let panel = state.focused_panel();
    let mut lines = vec![format!("Sort: {}", panel.sort.label())];
    match panel.selected_detail() {
        Some(detail) => lines.extend(detail.iter().cloned()),
        None => lines.push("No round selected".to_string()),
    }
    let detail = Paragraph::new(lines.join("\n"))
        .block(Block::default().title("Round Detail").borders(Borders::ALL));
    frame.render_widget(detail, area);
}

fn render_chart_grid(frame: &mut Frame, area: Rect, state: &DashboardState, colors: Palette) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);
    for (row_idx, row_area) in rows.iter().enumerate() {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(*row_area);
        for (col_idx, cell) in cols.iter().enumerate() {
            let idx = row_idx * 2 + col_idx;
            if let Some(panel) = state.panels.get(idx) {
                render_chart_panel(frame, *cell, idx, panel, idx == state.focus, colors);
            }
        }
    }
}

fn render_chart_stack(frame: &mut Frame, area: Rect, state: &DashboardState, colors: Palette) {
    let constraints: Vec<Constraint> = (0..state.panels.len())
        .map(|idx| {
            if idx == state.focus {
                Constraint::Min(10)
            } else {
                Constraint::Length(3)
            }
        })
        .collect();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);
    for (idx, panel) in state.panels.iter().enumerate() {
        let focused = idx == state.focus;
        if focused {
            render_chart_panel(frame, rows[idx], idx, panel, true, colors);
        } else {
            render_collapsed_panel(frame, rows[idx], idx, panel, colors);
        }
    }
}

fn panel_title(idx: usize, panel: &ChartPanel) -> String {
    let title = panel
        .model()
        .map(|model| model.title.clone())
        .unwrap_or_else(|| panel.family.label().to_string());
    format!(" {} {} [{}] ", idx + 1, title, panel.sort.label())
}

fn render_collapsed_panel(
    frame: &mut Frame,
    area: Rect,
    idx: usize,
    panel: &ChartPanel,
    colors: Palette,
) {
    let summary = match &panel.view {
        ChartView::Empty => "Select a player".to_string(),
        ChartView::Missing { column } => format!("Column `{column}` missing"),
        ChartView::Ready(model) => {
            let latest = model
                .series
                .first()
                .and_then(|s| s.values.last().copied())
                .map(|v| model.format_value(v))
                .unwrap_or_else(|| "-".to_string());
            format!("{} rounds | last: {latest}", model.len())
        }
    };
    let block = Block::default()
        .title(panel_title(idx, panel))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors.muted));
    frame.render_widget(Paragraph::new(summary).block(block), area);
}

fn render_chart_panel(
    frame: &mut Frame,
    area: Rect,
    idx: usize,
    panel: &ChartPanel,
    focused: bool,
    colors: Palette,
) {
    let border = if focused {
        Style::default().fg(colors.highlight)
    } else {
        Style::default().fg(colors.muted)
    };
    let block = Block::default()
        .title(panel_title(idx, panel))
        .borders(Borders::ALL)
        .border_style(border);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let message = match &panel.view {
        ChartView::Empty => Some("Select a player".to_string()),
        ChartView::Missing { column } => Some(format!("No data: column `{column}` missing")),
        ChartView::Ready(model) if model.is_empty() => Some("No rounds for this player".to_string()),
        ChartView::Ready(_) => None,
    };
    if let Some(message) = message {
        let empty = Paragraph::new(message).style(Style::default().fg(colors.muted));
        frame.render_widget(empty, inner);
        return;
    }

    let Some(model) = panel.model() else {
        return;
    };
    let cursor = focused.then_some(panel.round_cursor);
    match model.kind {
        ChartKind::Bars => frame.render_widget(bar_chart(model, inner.width, cursor, colors), inner),
        ChartKind::Line => render_line_chart(frame, inner, model, cursor, colors),
    }
}

fn bar_chart(model: &ChartModel, width: u16, cursor: Option<usize>, colors: Palette) -> BarChart<'static> {
    // Bars hold integers, so one-decimal values are drawn in tenths.
    let scale = match model.precision {
        Precision::Integer => 1.0,
        Precision::OneDecimal => 10.0,
    };
    let series_count = model.series.len().max(1) as u16;
    let groups = model.len().max(1) as u16;
    let per_group = (width / groups).max(2);
    let bar_width = ((per_group - 1) / series_count).max(1);

    let mut chart = BarChart::default()
        .bar_width(bar_width)
        .bar_gap(0)
        .group_gap(1);

    for (round_idx, label) in model.labels.iter().enumerate() {
        let highlighted = cursor == Some(round_idx);
        let bars: Vec<Bar<'static>> = model
            .series
            .iter()
            .enumerate()
            .map(|(series_idx, series)| {
                let value = series.values.get(round_idx).copied().unwrap_or(0.0);
                let color = if highlighted {
                    colors.highlight
                } else if series_idx == 0 {
                    colors.first
                } else {
                    colors.second
                };
                Bar::default()
                    .value((value.max(0.0) * scale).round() as u64)
                    .text_value(model.format_value(value))
                    .style(Style::default().fg(color))
            })
            .collect();
        chart = chart.data(
            BarGroup::default()
                .label(Line::from(label.clone()))
                .bars(&bars),
        );
    }
    chart
}

fn render_line_chart(
    frame: &mut Frame,
    area: Rect,
    model: &ChartModel,
    cursor: Option<usize>,
    colors: Palette,
) {
    let Some(series) = model.series.first() else {
        return;
    };
    let points: Vec<(f64, f64)> = series
        .values
        .iter()
        .enumerate()
        .map(|(idx, value)| (idx as f64, *value))
        .collect();
    let marked: Vec<(f64, f64)> = cursor
        .and_then(|idx| points.get(idx).copied())
        .into_iter()
        .collect();

    let x_max = (points.len().saturating_sub(1)).max(1) as f64;
    let y_max = (model.max_value() * 1.1).max(1.0);

    let first_label = model.labels.first().cloned().unwrap_or_default();
    let last_label = model.labels.last().cloned().unwrap_or_default();

    let datasets = vec![
        Dataset::default()
            .name(series.name)
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(colors.line))
            .data(&points),
        Dataset::default()
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(colors.highlight))
            .data(&marked),
    ];

    let chart = Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("Round")
                .bounds([0.0, x_max])
                .labels(vec![Span::raw(first_label), Span::raw(last_label)]),
        )
        .y_axis(
            Axis::default()
                .title(model.y_label)
                .bounds([0.0, y_max])
                .labels(vec![
                    Span::raw("0"),
                    Span::raw(model.format_value(y_max / 2.0)),
                    Span::raw(model.format_value(y_max)),
                ]),
        );
    frame.render_widget(chart, area);
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn console_text(state: &DashboardState) -> String {
    if state.logs.is_empty() {
        return "No alerts yet".to_string();
    }
    let start = state.logs.len().saturating_sub(3);
    state
        .logs
        .iter()
        .skip(start)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "GPS Player Report - Help",
        "",
        "Players:",
        "  j/k or ↑/↓   Move selector",
        "  Enter / u    Update charts for player",
        "",
        "Charts:",
        "  Tab / 1-6    Focus chart",
        "  d            Round Order",
        "  v            Lowest to Highest",
        "  f            Form (Last 5 Rounds)",
        "  h/l or ←/→   Move round cursor",
        "",
        "Global:",
        "  t            Toggle theme",
        "  x            Export player workbook",
        "  ?            Toggle help",
        "  q            Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
