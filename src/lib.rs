//! `covid-choropleth` library crate.
//!
//! The binary (`cmap`) is a thin wrapper around this library so that:
//!
//! - the join core is testable without spawning processes
//! - front-ends (TUI, plain CLI) share one controller
//!
//! Core flow: daily records -> [`series::MetricTimeSeries`] ->
//! [`join::GeoJoinEngine`] per metric -> [`controller::FrameController`] ->
//! renderer.

pub mod app;
pub mod cli;
pub mod config;
pub mod controller;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod join;
pub mod plot;
pub mod report;
pub mod series;
pub mod tui;
