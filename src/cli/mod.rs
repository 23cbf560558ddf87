//! Command-line parsing for the COVID-19 choropleth viewer.
//!
//! Argument parsing and command dispatch are kept apart from the join/render
//! code; see `crate::app` for dispatch.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::Metric;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "cmap", version, about = "US COVID-19 choropleth maps with a date slider")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive TUI (one map per metric, shared date slider).
    Tui(TuiArgs),
    /// Join and print a single frame, optionally as an ASCII map or GeoJSON export.
    Frame(FrameArgs),
    /// List the slider positions (index, date, reporting states).
    Dates(DataArgs),
}

/// Input locations shared by every command.
///
/// Unset values fall back to `CMAP_DAILY_JSON` / `CMAP_STATES_GEOJSON` and then
/// to built-in defaults.
#[derive(Debug, Args, Clone, Default)]
pub struct DataArgs {
    /// Daily per-state JSON (array of records with `date`, `state`, metrics).
    #[arg(long, value_name = "PATH")]
    pub daily: Option<PathBuf>,

    /// State boundaries GeoJSON (local path or http(s) URL).
    #[arg(long, value_name = "PATH|URL")]
    pub geometry: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct TuiArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Metrics to map (repeat or comma-separate; at most four are shown).
    /// Defaults to deaths, death increase, currently hospitalized, positive.
    #[arg(short = 'm', long = "metric", value_enum, value_delimiter = ',')]
    pub metrics: Vec<Metric>,

    /// Directory for `e` (export) in the TUI.
    #[arg(long, value_name = "DIR", default_value = "exports")]
    pub export_dir: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct FrameArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Metric to join.
    #[arg(short = 'm', long, value_enum, default_value_t = Metric::Death)]
    pub metric: Metric,

    /// Raw metric field name; overrides `--metric`.
    #[arg(long, value_name = "FIELD")]
    pub field: Option<String>,

    /// Slider index (0 = earliest date).
    #[arg(short = 'i', long, allow_hyphen_values = true, default_value_t = 0)]
    pub index: i64,

    /// Select by date instead of index (YYYY-MM-DD or YYYYMMDD).
    #[arg(short = 'd', long, conflicts_with = "index")]
    pub date: Option<String>,

    /// Render an ASCII map below the table.
    #[arg(long)]
    pub map: bool,

    /// Map width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Map height (rows).
    #[arg(long, default_value_t = 30)]
    pub height: usize,

    /// Write the joined frame as GeoJSON.
    #[arg(long, value_name = "GEOJSON")]
    pub export: Option<PathBuf>,
}

impl FrameArgs {
    /// The field name to join on.
    pub fn field_name(&self) -> String {
        self.field
            .clone()
            .unwrap_or_else(|| self.metric.field().to_string())
    }
}

impl TuiArgs {
    /// Requested metric fields, defaulting to the four-map dashboard.
    pub fn metric_fields(&self) -> Vec<String> {
        let metrics: &[Metric] = if self.metrics.is_empty() {
            &Metric::DASHBOARD
        } else {
            &self.metrics
        };
        metrics.iter().take(4).map(|m| m.field().to_string()).collect()
    }
}
