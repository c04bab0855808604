//! Ratatui-based terminal dashboard.
//!
//! A settings panel picks the forecast source (local mock or remote service),
//! the scope and the store/department ids; the body shows one dashboard view
//! per tab. Failed runs only update the status line, the dashboard on screen
//! stays as it was.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use plotters::style::RGBColor;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{BarChart, Block, Borders, Clear, List, ListItem, ListState, Paragraph, Row, Table, Tabs},
};

use crate::app::pipeline;
use crate::cli::DashArgs;
use crate::dashboard::{Dashboard, DashboardState};
use crate::data::ForecastClient;
use crate::data::service::validate;
use crate::domain::{
    DEFAULT_DEPT_LIMIT, DEFAULT_STORE_LIMIT, DatedValue, ForecastScope, ForecastSource, ResidualSeries, ScatterPoint,
    TrainOptions, WeeklyAggregate,
};
use crate::error::AppError;
use crate::io::dashboard_file::write_dashboard_json;
use crate::io::ingest::{IngestedSales, load_sales_file};
use crate::report::fmt_money;

mod plotters_chart;

use plotters_chart::{ChartSeries, SalesChart};

const SAVE_PATH: &str = "salescast-dashboard.json";
const FIELD_COUNT: usize = 5;

const CYAN: RGBColor = RGBColor(0, 255, 255);
const ORANGE: RGBColor = RGBColor(255, 165, 0);
const WHITE: RGBColor = RGBColor(255, 255, 255);
const YELLOW: RGBColor = RGBColor(255, 255, 0);

/// Start the TUI.
pub fn run(args: DashArgs) -> Result<(), AppError> {
    let path = match &args.file {
        Some(path) => crate::cli::picker::validate_csv_path(path)?,
        None => crate::cli::picker::prompt_for_csv_path()?,
    };

    let mut app = App::new(path, &args);
    app.load();

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| AppError::runtime(format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::runtime(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::runtime(format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Forecast,
    Models,
    Stores,
    Departments,
    Holidays,
    Residuals,
    Scatter,
    Weekly,
}

impl Tab {
    const ALL: [Tab; 8] = [
        Tab::Forecast,
        Tab::Models,
        Tab::Stores,
        Tab::Departments,
        Tab::Holidays,
        Tab::Residuals,
        Tab::Scatter,
        Tab::Weekly,
    ];

    fn title(self) -> &'static str {
        match self {
            Tab::Forecast => "1 Forecast",
            Tab::Models => "2 Models",
            Tab::Stores => "3 Stores",
            Tab::Departments => "4 Departments",
            Tab::Holidays => "5 Holidays",
            Tab::Residuals => "6 Residuals",
            Tab::Scatter => "7 Scatter",
            Tab::Weekly => "8 Weekly",
        }
    }

    /// Views filled on demand from the service rather than from the dashboard.
    fn is_remote_view(self) -> bool {
        matches!(self, Tab::Residuals | Tab::Scatter | Tab::Weekly)
    }

    fn index(self) -> usize {
        Tab::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }

    fn prev(self) -> Self {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }
}

/// Work that blocks; run after the next redraw so the status line shows first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Generate,
    LastRun,
    Residuals,
    Scatter,
    Weekly,
}

struct App {
    path: PathBuf,
    ingest: Option<IngestedSales>,
    source: ForecastSource,
    scope: ForecastScope,
    store_id: Option<u32>,
    dept_id: Option<u32>,
    horizon: usize,
    seed: u64,
    api_url: Option<String>,
    client: Option<ForecastClient>,
    state: DashboardState,
    residuals: Option<ResidualSeries>,
    scatter: Option<Vec<ScatterPoint>>,
    weekly: Option<Vec<WeeklyAggregate>>,
    tab: Tab,
    selected_field: usize,
    editing: Option<String>,
    pending: Option<Action>,
    status: String,
}

impl App {
    fn new(path: PathBuf, args: &DashArgs) -> Self {
        Self {
            path,
            ingest: None,
            source: args.source,
            scope: args.service.scope,
            store_id: args.service.store_id,
            dept_id: args.service.dept_id,
            horizon: args.service.horizon,
            seed: args.seed,
            api_url: args.service.api_url.clone(),
            client: None,
            state: DashboardState::default(),
            residuals: None,
            scatter: None,
            weekly: None,
            tab: Tab::Forecast,
            selected_field: 0,
            editing: None,
            pending: Some(Action::Generate),
            status: "Loading...".to_string(),
        }
    }

    /// Read the sales file; a failure is shown in the status line.
    fn load(&mut self) {
        match load_sales_file(&self.path) {
            Ok(ingest) => {
                self.status = format!("Loaded {} rows from {}.", ingest.rows_used, ingest.source_name);
                self.ingest = Some(ingest);
            }
            Err(err) => {
                self.status = err.message().to_string();
                self.pending = None;
                self.state.apply(Err(err));
            }
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::runtime(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if let Some(action) = self.pending.take() {
                self.perform(action);
                needs_redraw = true;
                continue;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::runtime(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::runtime(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.editing.is_some() {
            self.handle_id_edit(code);
            return false;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab => self.tab = self.tab.next(),
            KeyCode::BackTab => self.tab = self.tab.prev(),
            KeyCode::Char(c @ '1'..='8') => {
                let idx = c as usize - '1' as usize;
                self.tab = Tab::ALL[idx];
            }
            KeyCode::Up => self.selected_field = self.selected_field.saturating_sub(1),
            KeyCode::Down => {
                if self.selected_field + 1 < FIELD_COUNT {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.adjust_field(-1),
            KeyCode::Right => self.adjust_field(1),
            KeyCode::Enter => {
                if matches!(self.selected_field, 2 | 3) {
                    let current = if self.selected_field == 2 { self.store_id } else { self.dept_id };
                    self.editing = Some(current.map(|id| id.to_string()).unwrap_or_default());
                    self.status = "Type an id. Enter to apply, Esc to cancel.".to_string();
                }
            }
            KeyCode::Char('g') => self.request(Action::Generate),
            KeyCode::Char('r') => {
                self.seed = self.seed.wrapping_add(1);
                self.source = ForecastSource::Mock;
                self.request(Action::Generate);
            }
            KeyCode::Char('l') => self.request(Action::LastRun),
            KeyCode::Char('x') => {
                let action = match self.tab {
                    Tab::Scatter => Action::Scatter,
                    Tab::Weekly => Action::Weekly,
                    _ => Action::Residuals,
                };
                self.request(action);
            }
            KeyCode::Char('s') => self.save(),
            _ => {}
        }

        false
    }

    fn handle_id_edit(&mut self, code: KeyCode) {
        let Some(buffer) = self.editing.as_mut() else {
            return;
        };
        match code {
            KeyCode::Esc => {
                self.editing = None;
                self.status = "Edit canceled.".to_string();
            }
            KeyCode::Enter => {
                let text = buffer.trim().to_string();
                self.editing = None;
                let id = if text.is_empty() {
                    None
                } else {
                    match text.parse::<u32>() {
                        Ok(id) => Some(id),
                        Err(e) => {
                            self.status = format!("Invalid id '{text}': {e}");
                            return;
                        }
                    }
                };
                if self.selected_field == 2 {
                    self.store_id = id;
                } else {
                    self.dept_id = id;
                }
                self.status = "Id updated. Press g to run.".to_string();
            }
            KeyCode::Backspace => {
                buffer.pop();
            }
            KeyCode::Char(c) if c.is_ascii_digit() => buffer.push(c),
            _ => {}
        }
    }

    fn adjust_field(&mut self, delta: i32) {
        match self.selected_field {
            0 => {
                self.source = self.source.toggle();
                self.status = format!("source: {}. Press g to run.", self.source.display_name());
            }
            1 => {
                self.scope = if delta >= 0 { self.scope.next() } else { self.scope.prev() };
                self.status = format!("scope: {}", self.scope.display_name());
            }
            2 => self.store_id = step_id(self.store_id, delta),
            3 => self.dept_id = step_id(self.dept_id, delta),
            4 => {
                self.seed = if delta >= 0 {
                    self.seed.wrapping_add(1)
                } else {
                    self.seed.wrapping_sub(1)
                };
                if self.source == ForecastSource::Mock {
                    self.request(Action::Generate);
                }
            }
            _ => {}
        }
    }

    fn request(&mut self, action: Action) {
        self.status = match (action, self.source) {
            (Action::Generate, ForecastSource::Mock) => "Generating mock forecast...".to_string(),
            (Action::Generate, ForecastSource::Remote) => "Training on the forecasting service...".to_string(),
            (Action::LastRun, _) => "Fetching the last training run...".to_string(),
            (Action::Residuals, _) => "Fetching residuals...".to_string(),
            (Action::Scatter, _) => "Fetching scatter data...".to_string(),
            (Action::Weekly, _) => "Fetching weekly sales...".to_string(),
        };
        self.pending = Some(action);
    }

    fn perform(&mut self, action: Action) {
        match action {
            Action::Generate => self.generate(),
            Action::LastRun => self.load_last_run(),
            Action::Residuals => self.fetch_residuals(),
            Action::Scatter => self.fetch_scatter(),
            Action::Weekly => self.fetch_weekly(),
        }
    }

    fn generate(&mut self) {
        let outcome = match self.source {
            ForecastSource::Mock => self.mock_dashboard(),
            ForecastSource::Remote => self.remote_dashboard(),
        };

        if self.state.apply(outcome) {
            self.clear_remote_views();
            self.status = match self.source {
                ForecastSource::Mock => format!("Mock forecast generated (seed {}).", self.seed),
                ForecastSource::Remote => "Training finished.".to_string(),
            };
        } else if let Some(err) = self.state.error() {
            self.status = err.to_string();
        }
    }

    fn mock_dashboard(&self) -> Result<Dashboard, AppError> {
        let ingest = self
            .ingest
            .clone()
            .ok_or_else(|| AppError::no_data(format!("No usable sales rows in '{}'.", self.path.display())))?;
        Ok(pipeline::run_local_with_ingest(ingest, self.seed, DEFAULT_STORE_LIMIT, DEFAULT_DEPT_LIMIT).dashboard)
    }

    fn remote_dashboard(&mut self) -> Result<Dashboard, AppError> {
        let options = self.train_options();
        validate(&options)?;

        let path = self.path.clone();
        let summary = self.ingest.as_ref().map(|i| i.summary.clone());
        self.with_client(|client| pipeline::run_remote(client, &path, &options, summary))
    }

    /// Replay the service's most recent training run without uploading again.
    fn load_last_run(&mut self) {
        let summary = self.ingest.as_ref().map(|i| i.summary.clone());
        let outcome = self
            .with_client(ForecastClient::fetch_train_results)
            .map(|result| Dashboard::from_train_result(result, summary));

        if self.state.apply(outcome) {
            self.source = ForecastSource::Remote;
            self.clear_remote_views();
            self.status = "Loaded the last training run.".to_string();
        } else if let Some(err) = self.state.error() {
            self.status = err.to_string();
        }
    }

    fn fetch_residuals(&mut self) {
        let (Some(store), Some(dept)) = (self.store_id, self.dept_id) else {
            self.status = "Set a store id and a department id to load residuals.".to_string();
            return;
        };

        match self.with_client(|client| client.fetch_residuals(store, dept)) {
            Ok(series) => {
                self.residuals = Some(series);
                self.tab = Tab::Residuals;
                self.status = format!("Residuals for store {store}, dept {dept}.");
            }
            Err(err) => self.status = err.message().to_string(),
        }
    }

    /// Scatter of actual vs predicted sales, filtered by whichever ids are set.
    fn fetch_scatter(&mut self) {
        let (store, dept) = (self.store_id, self.dept_id);
        match self.with_client(|client| client.fetch_scatter(store, dept)) {
            Ok(points) => {
                self.status = format!("{} scatter points{}.", points.len(), id_filter_label(store, dept));
                self.scatter = Some(points);
                self.tab = Tab::Scatter;
            }
            Err(err) => self.status = err.message().to_string(),
        }
    }

    fn fetch_weekly(&mut self) {
        let (store, dept) = (self.store_id, self.dept_id);
        match self.with_client(|client| client.fetch_weekly(store, dept)) {
            Ok(rows) => {
                self.status = format!("{} weeks of sales{}.", rows.len(), id_filter_label(store, dept));
                self.weekly = Some(rows);
                self.tab = Tab::Weekly;
            }
            Err(err) => self.status = err.message().to_string(),
        }
    }

    fn clear_remote_views(&mut self) {
        self.residuals = None;
        self.scatter = None;
        self.weekly = None;
    }

    /// Run `f` against the service client, building it on first use.
    fn with_client<T>(&mut self, f: impl FnOnce(&ForecastClient) -> Result<T, AppError>) -> Result<T, AppError> {
        if self.client.is_none() {
            self.client = Some(ForecastClient::from_env(self.api_url.as_deref())?);
        }
        match &self.client {
            Some(client) => f(client),
            None => Err(AppError::runtime("Forecasting client unavailable.")),
        }
    }

    fn train_options(&self) -> TrainOptions {
        TrainOptions::for_scope(self.scope, self.store_id, self.dept_id, self.horizon)
    }

    fn save(&mut self) {
        let Some(dashboard) = self.state.current() else {
            self.status = "Nothing to save yet.".to_string();
            return;
        };
        let source_file = self.path.file_name().map(|n| n.to_string_lossy().into_owned());
        self.status = match write_dashboard_json(Path::new(SAVE_PATH), dashboard, source_file.as_deref()) {
            Ok(()) => format!("Saved {SAVE_PATH}"),
            Err(err) => err.message().to_string(),
        };
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(7),
                Constraint::Length(3),
            ])
            .split(frame.area());

        self.draw_header(frame, chunks[0]);
        self.draw_tabs(frame, chunks[1]);
        self.draw_body(frame, chunks[2]);
        self.draw_settings(frame, chunks[3]);
        self.draw_footer(frame, chunks[4]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let file = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string());

        let mut lines = vec![Line::from(vec![
            Span::styled("salescast", Style::default().fg(Color::Cyan)),
            Span::raw(format!(" | {file} | weekly sales forecast")),
        ])];

        let kpi_line = match self.state.current() {
            Some(d) => format!(
                "{} | sales {} | predicted {} | accuracy {:.1}% | stores {} | depts {}",
                d.source.display_name(),
                fmt_money(d.kpis.total_sales),
                fmt_money(d.kpis.total_predicted),
                d.kpis.accuracy_pct,
                d.kpis.stores,
                d.kpis.departments,
            ),
            None => "No dashboard yet. Press g to generate.".to_string(),
        };
        lines.push(Line::from(Span::styled(kpi_line, Style::default().fg(Color::Gray))));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_tabs(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let tabs = Tabs::new(Tab::ALL.iter().map(|t| t.title()))
            .select(self.tab.index())
            .block(Block::default().borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
        frame.render_widget(tabs, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title(self.tab.title()).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        if self.tab.is_remote_view() {
            self.draw_remote_view(frame, inner);
            return;
        }

        let Some(d) = self.state.current() else {
            frame.render_widget(waiting("No dashboard yet. Press g to generate."), inner);
            return;
        };

        match self.tab {
            Tab::Forecast => draw_forecast(frame, inner, d),
            Tab::Models => draw_models(frame, inner, d),
            Tab::Stores => {
                let bars: Vec<(&str, u64)> = d.store_data.iter().map(|s| (s.name.as_str(), bar_value(s.sales))).collect();
                draw_bars(frame, inner, &bars);
            }
            Tab::Departments => {
                let bars: Vec<(&str, u64)> = d.dept_data.iter().map(|s| (s.name.as_str(), bar_value(s.value))).collect();
                draw_bars(frame, inner, &bars);
            }
            Tab::Holidays => draw_holidays(frame, inner, d),
            Tab::Residuals | Tab::Scatter | Tab::Weekly => {}
        }
    }

    fn draw_remote_view(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let (bundle, hint, x_label, y_label) = match self.tab {
            Tab::Scatter => (
                self.scatter.as_deref().and_then(scatter_series),
                "Press x to load actual vs predicted points (store/dept ids filter).",
                "actual",
                "predicted",
            ),
            Tab::Weekly => (
                self.weekly.as_deref().and_then(weekly_series),
                "Press x to load weekly sales (store/dept ids filter).",
                "week",
                "sales",
            ),
            _ => (
                self.residuals.as_ref().and_then(residual_series),
                "Set store and dept ids, then press x to load residuals.",
                "week",
                "residual",
            ),
        };
        let fmt_x: fn(f64) -> String = if self.tab == Tab::Scatter { fmt_sales_axis } else { fmt_week };

        let Some((series, x_bounds, y_bounds)) = bundle else {
            frame.render_widget(waiting(hint), area);
            return;
        };
        let widget = SalesChart {
            series: &series,
            x_bounds,
            y_bounds,
            x_label,
            y_label,
            fmt_x,
            fmt_y: fmt_sales_axis,
        };
        frame.render_widget(widget, area);
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let id_label = |field: usize, id: Option<u32>| -> String {
            match (&self.editing, self.selected_field == field) {
                (Some(buffer), true) => format!("{buffer}_"),
                _ => id.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string()),
            }
        };

        let items = vec![
            ListItem::new(format!("Source: {}", self.source.display_name())),
            ListItem::new(format!("Scope: {}", self.scope.display_name())),
            ListItem::new(format!("Store id: {}", id_label(2, self.store_id))),
            ListItem::new(format!("Dept id: {}", id_label(3, self.dept_id))),
            ListItem::new(format!("Seed: {}", self.seed)),
        ];

        let list = List::new(items)
            .block(Block::default().title("Settings").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help =
            "Tab/1-8 view  ↑/↓ select  ←/→ adjust  Enter edit id  g run  l last run  r reseed  x load view  s save  q quit";
        let status_style = if self.state.error() == Some(self.status.as_str()) {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::Yellow)
        };
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(self.status.as_str(), status_style),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn waiting(msg: &str) -> Paragraph<'_> {
    Paragraph::new(msg).style(Style::default().fg(Color::Yellow))
}

fn draw_forecast(frame: &mut ratatui::Frame<'_>, area: Rect, d: &Dashboard) {
    let Some((series, x_bounds, y_bounds)) = forecast_series(d) else {
        frame.render_widget(waiting("No predictions to plot."), area);
        return;
    };
    let widget = SalesChart {
        series: &series,
        x_bounds,
        y_bounds,
        x_label: "week",
        y_label: "sales",
        fmt_x: fmt_week,
        fmt_y: fmt_sales_axis,
    };
    frame.render_widget(widget, area);
}

fn draw_models(frame: &mut ratatui::Frame<'_>, area: Rect, d: &Dashboard) {
    let header = Row::new(["Model", "MAE", "RMSE", "R²"]).style(Style::default().add_modifier(Modifier::BOLD));

    let mut rows: Vec<Row> = d
        .metrics
        .iter()
        .map(|m| {
            Row::new(vec![
                m.model.clone(),
                format!("{:.2}", m.mae),
                format!("{:.2}", m.rmse),
                format!("{:.3}", m.r2),
            ])
        })
        .collect();
    if let Some(a) = &d.arima_metrics {
        let fmt = |v: Option<f64>| v.map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".to_string());
        rows.push(Row::new(vec!["ARIMA".to_string(), fmt(a.mae), fmt(a.rmse), fmt(a.r2)]));
    }

    if rows.is_empty() {
        frame.render_widget(waiting("No model metrics."), area);
        return;
    }

    let table = Table::new(
        rows,
        [
            Constraint::Min(20),
            Constraint::Length(14),
            Constraint::Length(14),
            Constraint::Length(8),
        ],
    )
    .header(header);
    frame.render_widget(table, area);
}

fn draw_bars(frame: &mut ratatui::Frame<'_>, area: Rect, bars: &[(&str, u64)]) {
    if bars.is_empty() {
        frame.render_widget(waiting("No data."), area);
        return;
    }
    let slot = area.width / bars.len() as u16;
    let chart = BarChart::default()
        .data(bars)
        .bar_width(slot.saturating_sub(2).clamp(3, 16))
        .bar_gap(2)
        .bar_style(Style::default().fg(Color::Cyan))
        .value_style(Style::default().fg(Color::Black).bg(Color::Cyan));
    frame.render_widget(chart, area);
}

fn draw_holidays(frame: &mut ratatui::Frame<'_>, area: Rect, d: &Dashboard) {
    if d.holiday_impact.is_empty() {
        frame.render_widget(waiting("No holiday weeks in the data."), area);
        return;
    }

    let n = d.holiday_impact.len() as u32;
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Ratio(1, n); n as usize])
        .split(area);

    for (h, rect) in d.holiday_impact.iter().zip(cards.iter()) {
        let lift_color = if h.lift >= 0.0 { Color::Green } else { Color::Red };
        let text = vec![
            Line::from(Span::styled(
                format!("{:+.1}%", h.lift),
                Style::default().fg(lift_color).add_modifier(Modifier::BOLD),
            )),
            Line::from(format!("avg week {}", fmt_money(h.sales))),
        ];
        let card = Paragraph::new(text).block(Block::default().title(h.holiday.as_str()).borders(Borders::ALL));
        frame.render_widget(card, *rect);
    }
}

type SeriesBundle = (Vec<ChartSeries>, [f64; 2], [f64; 2]);

/// Actual points, the predicted line and the forecast line continuing from it.
fn forecast_series(d: &Dashboard) -> Option<SeriesBundle> {
    let history = d.history();
    let total = history.len() + d.forecast.len();
    if total == 0 {
        return None;
    }

    let predicted: Vec<(f64, f64)> = history
        .iter()
        .enumerate()
        .map(|(i, p)| (i as f64, p.predicted))
        .collect();
    let actual: Vec<(f64, f64)> = history
        .iter()
        .enumerate()
        .filter_map(|(i, p)| p.actual.map(|a| (i as f64, a)))
        .collect();
    let mut ahead: Vec<(f64, f64)> = predicted.last().copied().into_iter().collect();
    ahead.extend(
        d.forecast
            .iter()
            .enumerate()
            .map(|(i, p)| ((history.len() + i) as f64, p.predicted)),
    );

    let y_bounds = padded_bounds(predicted.iter().chain(&actual).chain(&ahead))?;
    let x_bounds = [0.0, (total.max(2) - 1) as f64];

    Some((
        vec![
            ChartSeries::line(predicted, CYAN),
            ChartSeries::line(ahead, ORANGE),
            ChartSeries::points(actual, WHITE),
        ],
        x_bounds,
        y_bounds,
    ))
}

/// Training residuals followed by validation residuals, with their smoothed lines.
fn residual_series(r: &ResidualSeries) -> Option<SeriesBundle> {
    fn indexed(values: &[DatedValue], start: usize) -> Vec<(f64, f64)> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| ((start + i) as f64, v.value))
            .collect()
    }

    let offset = r.train_residuals.len().max(r.smoothed_train.len());
    let train = indexed(&r.train_residuals, 0);
    let valid = indexed(&r.valid_residuals, offset);
    let smooth_train = indexed(&r.smoothed_train, 0);
    let smooth_forecast = indexed(&r.smoothed_forecast, offset);

    let total = offset + r.valid_residuals.len().max(r.smoothed_forecast.len());
    if total == 0 {
        return None;
    }

    let zero = [(0.0, 0.0)];
    let y_bounds = padded_bounds(
        train
            .iter()
            .chain(&valid)
            .chain(&smooth_train)
            .chain(&smooth_forecast)
            .chain(&zero),
    )?;
    let x_bounds = [0.0, (total.max(2) - 1) as f64];

    Some((
        vec![
            ChartSeries::points(train, WHITE),
            ChartSeries::points(valid, YELLOW),
            ChartSeries::line(smooth_train, CYAN),
            ChartSeries::line(smooth_forecast, ORANGE),
        ],
        x_bounds,
        y_bounds,
    ))
}

/// Actual vs predicted points over a `y = x` reference line.
fn scatter_series(points: &[ScatterPoint]) -> Option<SeriesBundle> {
    let xy: Vec<(f64, f64)> = points
        .iter()
        .map(|p| (p.actual, p.predicted))
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();
    // Same range on both axes so the diagonal means "perfect prediction".
    let swapped: Vec<(f64, f64)> = xy.iter().map(|&(x, y)| (y, x)).collect();
    let bounds = padded_bounds(xy.iter().chain(&swapped))?;

    Some((
        vec![
            ChartSeries::line(vec![(bounds[0], bounds[0]), (bounds[1], bounds[1])], ORANGE),
            ChartSeries::points(xy, CYAN),
        ],
        bounds,
        bounds,
    ))
}

/// Weekly totals in service order.
fn weekly_series(rows: &[WeeklyAggregate]) -> Option<SeriesBundle> {
    if rows.is_empty() {
        return None;
    }
    let line: Vec<(f64, f64)> = rows.iter().enumerate().map(|(i, r)| (i as f64, r.sales)).collect();
    let y_bounds = padded_bounds(line.iter())?;
    let x_bounds = [0.0, (rows.len().max(2) - 1) as f64];
    Some((vec![ChartSeries::line(line, CYAN)], x_bounds, y_bounds))
}

fn id_filter_label(store: Option<u32>, dept: Option<u32>) -> String {
    match (store, dept) {
        (Some(s), Some(d)) => format!(" for store {s}, dept {d}"),
        (Some(s), None) => format!(" for store {s}"),
        (None, Some(d)) => format!(" for dept {d}"),
        (None, None) => String::new(),
    }
}

fn padded_bounds<'a>(points: impl Iterator<Item = &'a (f64, f64)>) -> Option<[f64; 2]> {
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(_, y) in points {
        if y.is_finite() {
            lo = lo.min(y);
            hi = hi.max(y);
        }
    }
    if !(lo.is_finite() && hi.is_finite()) {
        return None;
    }
    if hi <= lo {
        lo -= 1.0;
        hi += 1.0;
    }
    let pad = (hi - lo) * 0.05;
    Some([lo - pad, hi + pad])
}

fn step_id(id: Option<u32>, delta: i32) -> Option<u32> {
    match (id, delta >= 0) {
        (None, true) => Some(1),
        (None, false) => None,
        (Some(v), true) => Some(v.saturating_add(1)),
        (Some(v), false) => v.checked_sub(1).filter(|v| *v > 0),
    }
}

fn bar_value(v: f64) -> u64 {
    if v.is_finite() && v > 0.0 { v.round() as u64 } else { 0 }
}

fn fmt_week(v: f64) -> String {
    format!("W{}", v.round() as i64 + 1)
}

fn fmt_sales_axis(v: f64) -> String {
    let abs = v.abs();
    if abs >= 1_000_000.0 {
        format!("{:.1}M", v / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{:.0}k", v / 1_000.0)
    } else {
        format!("{v:.0}")
    }
}
