//! Geometry ⋈ metric join for one date.
//!
//! The engine walks the geometry table (never the records), so every state is
//! present in every frame, and computes per-frame color-scale bounds over the
//! values that are actually present.

use crate::domain::{GeometryTable, JoinedEntry, JoinedFrame, MetricValue, ScaleBounds};
use crate::error::CoreError;
use crate::series::MetricTimeSeries;

/// Joins one metric against a shared geometry table.
#[derive(Debug, Clone)]
pub struct GeoJoinEngine {
    geometry: GeometryTable,
    metric: String,
}

impl GeoJoinEngine {
    pub fn new(geometry: GeometryTable, metric: impl Into<String>) -> Self {
        Self {
            geometry,
            metric: metric.into(),
        }
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }

    pub fn geometry(&self) -> &GeometryTable {
        &self.geometry
    }

    /// Build the frame for `series.dates()[date_index]`.
    ///
    /// States without a value on that date are `Missing`. When the whole frame
    /// is missing, the bounds are `0..0` (`ScaleBounds::EMPTY`).
    pub fn join(&self, date_index: usize, series: &MetricTimeSeries) -> Result<JoinedFrame, CoreError> {
        let date = series
            .dates()
            .get(date_index)
            .copied()
            .ok_or(CoreError::IndexOutOfRange {
                index: i64::try_from(date_index).unwrap_or(i64::MAX),
                len: series.len(),
            })?;
        let day = series.records_for(date);

        let entries: Vec<JoinedEntry> = self
            .geometry
            .iter()
            .map(|g| JoinedEntry {
                state: g.state.clone(),
                name: g.name.clone(),
                geometry: g.geometry.clone(),
                value: MetricValue::from_option(day.metric(&g.state, &self.metric)),
            })
            .collect();

        let bounds = ScaleBounds::from_values(entries.iter().map(|e| e.value));

        log::debug!(
            "join {} @ {date}: {} present, {} missing, bounds {:.3}..{:.3}",
            self.metric,
            entries.iter().filter(|e| !e.value.is_missing()).count(),
            entries.iter().filter(|e| e.value.is_missing()).count(),
            bounds.low,
            bounds.high,
        );

        Ok(JoinedFrame {
            date,
            metric: self.metric.clone(),
            entries,
            bounds,
        })
    }
}
