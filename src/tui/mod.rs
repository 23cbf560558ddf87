//! Ratatui-based terminal UI.
//!
//! Up to four choropleth maps share one date slider. The slider position is
//! owned by a `FrameController`; this module only translates key presses into
//! index-changed events and draws whatever the controller last emitted.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, LineGauge, Paragraph},
};

use crate::controller::{FrameController, FrameRenderer, FrameUpdate};
use crate::data::Dataset;
use crate::domain::{JoinedFrame, metric_title};
use crate::error::{AppError, CoreError};
use crate::join::GeoJoinEngine;

mod map_chart;

use map_chart::{ChoroplethChart, legend_line};

/// Days moved by PgUp/PgDn.
const PAGE_STEP: i64 = 7;

/// Start the TUI for the given metric fields.
pub fn run(dataset: Dataset, metrics: Vec<String>, export_dir: PathBuf) -> Result<(), AppError> {
    let extent = dataset
        .geometry
        .extent()
        .ok_or_else(|| AppError::new(3, "State boundaries have no coordinates."))?;
    let engines = metrics
        .into_iter()
        .map(|m| GeoJoinEngine::new(dataset.geometry.clone(), m))
        .collect();

    let mut controller = FrameController::new(dataset.series, engines, MapView::default());
    controller.refresh()?;

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App {
        controller,
        extent,
        export_dir,
        status: "Ready.".to_string(),
    };
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
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

/// Renderer that keeps the latest update for the next draw.
#[derive(Debug, Default)]
pub struct MapView {
    current: Option<FrameUpdate>,
}

impl MapView {
    pub fn current(&self) -> Option<&FrameUpdate> {
        self.current.as_ref()
    }
}

impl FrameRenderer for MapView {
    fn render(&mut self, update: &FrameUpdate) {
        self.current = Some(update.clone());
    }
}

/// What a key press asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Step(i64),
    First,
    Last,
    Export,
    Quit,
    Ignore,
}

fn key_action(code: KeyCode) -> Action {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Left | KeyCode::Char('h') => Action::Step(-1),
        KeyCode::Right | KeyCode::Char('l') => Action::Step(1),
        KeyCode::PageUp => Action::Step(-PAGE_STEP),
        KeyCode::PageDown => Action::Step(PAGE_STEP),
        KeyCode::Home => Action::First,
        KeyCode::End => Action::Last,
        KeyCode::Char('e') => Action::Export,
        _ => Action::Ignore,
    }
}

/// Slider target after applying `action`, clamped to `0..len`.
///
/// The slider clamps; the controller itself never does.
fn slider_target(current: usize, action: Action, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let last = len - 1;
    match action {
        Action::Step(delta) => {
            let target = (current as i64).saturating_add(delta).clamp(0, last as i64);
            Some(target as usize)
        }
        Action::First => Some(0),
        Action::Last => Some(last),
        _ => None,
    }
}

/// Final slider position after a burst of queued actions, or `None` when the
/// burst does not move the slider.
fn burst_target(current: usize, actions: &[Action], len: usize) -> Option<usize> {
    actions
        .iter()
        .fold(None, |target, &action| {
            slider_target(target.unwrap_or(current), action, len).or(target)
        })
}

/// Apply a burst of slider actions with at most one index-changed dispatch.
///
/// Returns whether the controller emitted a new update.
fn dispatch_burst<R: FrameRenderer>(
    controller: &mut FrameController<R>,
    actions: &[Action],
) -> Result<bool, CoreError> {
    match burst_target(controller.date_index(), actions, controller.date_count()) {
        Some(index) if index != controller.date_index() => {
            controller.on_index_changed(index as i64)?;
            Ok(true)
        }
        _ => Ok(false),
    }
}

struct App {
    controller: FrameController<MapView>,
    extent: geo::Rect<f64>,
    export_dir: PathBuf,
    status: String,
}

impl App {
    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            // Coalesce a burst of slider keys (key repeat) into one dispatch.
            let mut burst = Vec::new();
            let mut pending = true;
            while pending {
                match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => match key_action(key.code) {
                        Action::Quit => return Ok(()),
                        Action::Export => {
                            self.export_current();
                            needs_redraw = true;
                        }
                        Action::Ignore => {}
                        action => burst.push(action),
                    },
                    Event::Resize(_, _) => needs_redraw = true,
                    _ => {}
                }
                pending = event::poll(Duration::ZERO)
                    .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?;
            }

            if dispatch_burst(&mut self.controller, &burst)? {
                needs_redraw = true;
            }
        }
    }

    fn export_current(&mut self) {
        let Some(update) = self.controller.renderer().current() else {
            self.status = "Nothing to export yet.".to_string();
            return;
        };
        self.status = match export_frames(&self.export_dir, &update.frames) {
            Ok(n) => format!("Exported {n} GeoJSON file(s) to {}", self.export_dir.display()),
            Err(err) => format!("Export failed: {err}"),
        };
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_maps(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let label = self
            .controller
            .renderer()
            .current()
            .map(|u| u.date_label.clone())
            .unwrap_or_else(|| "Selected date: -".to_string());

        let lines = vec![
            Line::from(vec![
                Span::styled("cmap", Style::default().fg(Color::Cyan)),
                Span::raw(" - US COVID-19 by state"),
            ]),
            Line::from(Span::styled(label, Style::default().add_modifier(Modifier::BOLD))),
        ];

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_maps(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let Some(update) = self.controller.renderer().current() else {
            let msg = Paragraph::new("Waiting for data...")
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(msg, area);
            return;
        };

        for (cell, joined) in grid_cells(area, update.frames.len()).into_iter().zip(&update.frames) {
            self.draw_map(frame, cell, joined);
        }
    }

    fn draw_map(&self, frame: &mut ratatui::Frame<'_>, area: Rect, joined: &JoinedFrame) {
        let block = Block::default()
            .title(format!(" {} ", metric_title(&joined.metric)))
            .borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(inner);

        frame.render_widget(
            ChoroplethChart {
                frame: joined,
                extent: self.extent,
            },
            chunks[0],
        );

        let swatches = (chunks[1].width as usize).saturating_sub(30).clamp(4, 32);
        frame.render_widget(Paragraph::new(legend_line(joined, swatches)), chunks[1]);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(area);

        let count = self.controller.date_count();
        let index = self.controller.date_index();
        let ratio = if count > 1 {
            index as f64 / (count - 1) as f64
        } else {
            0.0
        };
        let gauge = LineGauge::default()
            .block(Block::default().borders(Borders::ALL).title(" Date "))
            .filled_style(Style::default().fg(Color::Cyan))
            .label(format!("{}/{}", index + 1, count))
            .ratio(ratio);
        frame.render_widget(gauge, chunks[0]);

        let help = "←/→ day  PgUp/PgDn week  Home/End  e export  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, chunks[1]);
    }
}

/// Split `area` into a grid for `n` maps (1 → full, 2 → side by side, 3-4 → 2x2).
fn grid_cells(area: Rect, n: usize) -> Vec<Rect> {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(if n > 2 {
            vec![Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)]
        } else {
            vec![Constraint::Min(0)]
        })
        .split(area);

    let cols_per_row = if n > 1 { 2 } else { 1 };
    rows.iter()
        .flat_map(|row| {
            Layout::default()
                .direction(Direction::Horizontal)
                .constraints(vec![Constraint::Ratio(1, cols_per_row); cols_per_row as usize])
                .split(*row)
                .to_vec()
        })
        .take(n)
        .collect()
}

/// Write every frame to `<dir>/<metric>_<YYYYMMDD>.geojson`.
pub fn export_frames(dir: &Path, frames: &[JoinedFrame]) -> Result<usize, AppError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| AppError::new(2, format!("Failed to create export dir '{}': {e}", dir.display())))?;
    for joined in frames {
        let path = dir.join(crate::io::export_file_name(joined));
        crate::io::write_frame_geojson(&path, joined)?;
    }
    Ok(frames.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_to_slider_actions() {
        assert_eq!(key_action(KeyCode::Right), Action::Step(1));
        assert_eq!(key_action(KeyCode::PageUp), Action::Step(-PAGE_STEP));
        assert_eq!(key_action(KeyCode::Char('q')), Action::Quit);
        assert_eq!(key_action(KeyCode::Char('x')), Action::Ignore);
    }

    #[test]
    fn slider_clamps_at_both_ends() {
        assert_eq!(slider_target(0, Action::Step(-1), 10), Some(0));
        assert_eq!(slider_target(8, Action::Step(PAGE_STEP), 10), Some(9));
        assert_eq!(slider_target(3, Action::Step(1), 10), Some(4));
        assert_eq!(slider_target(3, Action::Last, 10), Some(9));
        assert_eq!(slider_target(3, Action::First, 10), Some(0));
        assert_eq!(slider_target(0, Action::Step(1), 0), None);
        assert_eq!(slider_target(0, Action::Export, 10), None);
    }

    #[test]
    fn key_burst_folds_to_one_target() {
        let burst = [Action::Step(1), Action::Step(1), Action::Step(PAGE_STEP)];
        assert_eq!(burst_target(0, &burst, 20), Some(9));
        assert_eq!(burst_target(0, &[Action::Step(-1), Action::Step(-1)], 20), Some(0));
        assert_eq!(burst_target(5, &[Action::Last, Action::Step(-2)], 20), Some(17));
        assert_eq!(burst_target(5, &[], 20), None);
    }

    #[test]
    fn key_burst_dispatches_once() {
        use std::sync::Arc;

        use crate::domain::{GeometryTable, RawMetricRecord, StateGeometry};
        use crate::series::MetricTimeSeries;

        #[derive(Default)]
        struct Counter(usize);
        impl FrameRenderer for Counter {
            fn render(&mut self, _update: &FrameUpdate) {
                self.0 += 1;
            }
        }

        let series = MetricTimeSeries::new((1..=20).map(|day| RawMetricRecord {
            date: format!("202004{day:02}"),
            state: "CA".to_string(),
            metrics: [("death".to_string(), day as f64)].into(),
        }))
        .unwrap();
        let geometry = GeometryTable::new(vec![StateGeometry::new(
            "CA",
            None,
            geo::Rect::new((0.0, 0.0), (1.0, 1.0)).to_polygon(),
        )])
        .unwrap();
        let mut controller = FrameController::new(
            Arc::new(series),
            vec![GeoJoinEngine::new(geometry, "death")],
            Counter::default(),
        );

        let burst = [Action::Step(1), Action::Step(1), Action::Step(PAGE_STEP)];
        assert!(dispatch_burst(&mut controller, &burst).unwrap());
        assert_eq!(controller.date_index(), 9);
        assert_eq!(controller.renderer().0, 1);

        // A burst that ends where it started emits nothing.
        assert!(!dispatch_burst(&mut controller, &[Action::Step(1), Action::Step(-1)]).unwrap());
        assert_eq!(controller.renderer().0, 1);
    }

    #[test]
    fn grid_matches_map_count() {
        let area = Rect::new(0, 0, 100, 40);
        assert_eq!(grid_cells(area, 1), vec![area]);
        assert_eq!(grid_cells(area, 2).len(), 2);
        let four = grid_cells(area, 4);
        assert_eq!(four.len(), 4);
        assert_eq!(four[0].y, four[1].y);
        assert!(four[2].y > four[0].y);
        assert_eq!(grid_cells(area, 3).len(), 3);
    }

    #[test]
    fn map_view_keeps_latest_update() {
        use chrono::NaiveDate;

        let mut view = MapView::default();
        assert!(view.current().is_none());
        let date = NaiveDate::from_ymd_opt(2020, 1, 22).unwrap();
        let update = FrameUpdate {
            date_index: 0,
            date,
            date_label: crate::controller::date_label(date),
            frames: vec![],
        };
        view.render(&update);
        assert_eq!(view.current(), Some(&update));
    }
}
