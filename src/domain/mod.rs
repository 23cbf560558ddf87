//! Domain types shared by the core and its collaborators.
//!
//! This module defines:
//!
//! - raw and normalized metric records (`RawMetricRecord`, `MetricRecord`)
//! - state geometry (`Boundary` over `geo::MultiPolygon`, `StateGeometry`, `GeometryTable`)
//! - join outputs (`MetricValue`, `JoinedEntry`, `JoinedFrame`, `ScaleBounds`)
//! - the metric catalogue (`Metric`)

pub mod types;

pub use types::*;
