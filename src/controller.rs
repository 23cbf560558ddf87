//! Date-index controller: the only stateful piece between the slider and the
//! renderer.

use std::sync::Arc;

use chrono::NaiveDate;
use rayon::prelude::*;

use crate::domain::JoinedFrame;
use crate::error::CoreError;
use crate::join::GeoJoinEngine;
use crate::series::MetricTimeSeries;

/// Everything the renderer needs for one slider position.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameUpdate {
    pub date_index: usize,
    pub date: NaiveDate,
    /// `"Selected date: YYYY-MM-DD"`.
    pub date_label: String,
    /// One frame per engine, in engine order.
    pub frames: Vec<JoinedFrame>,
}

/// Consumer of frame updates (terminal UI, exporter, test recorder, ...).
pub trait FrameRenderer {
    fn render(&mut self, update: &FrameUpdate);
}

pub fn date_label(date: NaiveDate) -> String {
    format!("Selected date: {}", date.format("%Y-%m-%d"))
}

/// Holds the current date index and dispatches joins on change.
#[derive(Debug)]
pub struct FrameController<R> {
    series: Arc<MetricTimeSeries>,
    engines: Vec<GeoJoinEngine>,
    date_index: usize,
    renderer: R,
}

impl<R: FrameRenderer> FrameController<R> {
    pub fn new(series: Arc<MetricTimeSeries>, engines: Vec<GeoJoinEngine>, renderer: R) -> Self {
        Self {
            series,
            engines,
            date_index: 0,
            renderer,
        }
    }

    pub fn date_index(&self) -> usize {
        self.date_index
    }

    pub fn date_count(&self) -> usize {
        self.series.len()
    }

    pub fn series(&self) -> &MetricTimeSeries {
        &self.series
    }

    pub fn engines(&self) -> &[GeoJoinEngine] {
        &self.engines
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Handle "index changed to `index`".
    ///
    /// On error the current index is kept and nothing is emitted.
    pub fn on_index_changed(&mut self, index: i64) -> Result<(), CoreError> {
        let update = self.build_update(index)?;
        self.date_index = update.date_index;
        self.renderer.render(&update);
        Ok(())
    }

    /// Re-emit the frames for the current index.
    pub fn refresh(&mut self) -> Result<(), CoreError> {
        self.on_index_changed(self.date_index as i64)
    }

    /// Compute the update for `index` without touching controller state.
    pub fn build_update(&self, index: i64) -> Result<FrameUpdate, CoreError> {
        let date = self.series.date_at(index)?;
        // `date_at` succeeded, so `index` is within `0..len`.
        let date_index = index as usize;

        // Engines only read the shared series/geometry, so the per-metric
        // joins can run side by side. `collect` keeps engine order. The closure
        // must not capture `self`: `R` is not required to be `Sync`.
        let series: &MetricTimeSeries = &self.series;
        let frames = self
            .engines
            .par_iter()
            .map(|engine| engine.join(date_index, series))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FrameUpdate {
            date_index,
            date,
            date_label: date_label(date),
            frames,
        })
    }
}
