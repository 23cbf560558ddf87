//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads the daily records and state boundaries
//! - drives a `FrameController` for the chosen front-end
//! - writes optional exports

use clap::Parser;

use crate::cli::{Command, DataArgs, FrameArgs, TuiArgs};
use crate::controller::{FrameController, FrameRenderer, FrameUpdate};
use crate::error::AppError;
use crate::join::GeoJoinEngine;

pub mod pipeline;

/// Entry point for the `cmap` binary.
pub fn run() -> Result<(), AppError> {
    // `cmap` and `cmap -m positive` behave like `cmap tui ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Tui(args) => handle_tui(args),
        Command::Frame(args) => handle_frame(args),
        Command::Dates(args) => handle_dates(args),
    }
}

/// Prints each update to stdout and keeps the last one for export.
struct StdoutRenderer {
    map: Option<(usize, usize)>,
    last: Option<FrameUpdate>,
}

impl FrameRenderer for StdoutRenderer {
    fn render(&mut self, update: &FrameUpdate) {
        println!("{}\n", update.date_label);
        for frame in &update.frames {
            println!("{}", crate::report::format_frame(frame));
            if let Some((width, height)) = self.map {
                println!("{}", crate::plot::render_ascii_map(frame, width, height));
            }
        }
        self.last = Some(update.clone());
    }
}

fn handle_frame(args: FrameArgs) -> Result<(), AppError> {
    let dataset = pipeline::load(&args.data)?;
    let index = pipeline::select_index(&dataset.series, args.index, args.date.as_deref())?;

    let engine = GeoJoinEngine::new(dataset.geometry.clone(), args.field_name());
    let renderer = StdoutRenderer {
        map: args.map.then_some((args.width, args.height)),
        last: None,
    };
    let mut controller = FrameController::new(dataset.series, vec![engine], renderer);
    controller.on_index_changed(index)?;

    if let Some(path) = &args.export {
        if let Some(frame) = controller.renderer().last.as_ref().and_then(|u| u.frames.first()) {
            crate::io::write_frame_geojson(path, frame)?;
            log::info!("exported {} to {}", frame.metric, path.display());
        }
    }

    Ok(())
}

fn handle_dates(args: DataArgs) -> Result<(), AppError> {
    let dataset = pipeline::load(&args)?;
    print!("{}", crate::report::format_dates(&dataset.series));
    Ok(())
}

fn handle_tui(args: TuiArgs) -> Result<(), AppError> {
    let dataset = pipeline::load(&args.data)?;
    crate::tui::run(dataset, args.metric_fields(), args.export_dir)
}

/// Rewrite argv so `cmap` defaults to `cmap tui`.
///
/// Rules:
/// - `cmap`                        -> `cmap tui`
/// - `cmap -m positive ...`        -> `cmap tui -m positive ...`
/// - `cmap --help/--version/-h`    -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "tui" | "frame" | "dates");
    if is_subcommand {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    argv
}
