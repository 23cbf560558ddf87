//! Sequential color scale for choropleth fills.
//!
//! The ramp is Viridis, reversed so that higher values render darker. Missing
//! values have no color (drawn unfilled).

use plotters::style::RGBColor;
use plotters::style::colors::colormaps::{ColorMap, ViridisRGB};

use crate::domain::{MetricValue, ScaleBounds};

/// 8-bit RGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Sample the (non-reversed) Viridis ramp at `t ∈ [0, 1]`; dark at `0.0`.
pub fn viridis(t: f64) -> Rgb {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let RGBColor(r, g, b) = <ViridisRGB as ColorMap<RGBColor, f64>>::get_color_normalized(&ViridisRGB, t, 0.0, 1.0);
    Rgb(r, g, b)
}

/// Maps frame values to fill colors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    bounds: ScaleBounds,
}

impl Palette {
    pub fn new(bounds: ScaleBounds) -> Self {
        Self { bounds }
    }

    /// Scale position with `1.0` = top of the scale.
    ///
    /// Degenerate bounds (`low == high`, including the all-missing `0..0`)
    /// put every value at `0.0`, i.e. a single-color map.
    pub fn position(&self, value: f64) -> f64 {
        self.bounds.normalize(value)
    }

    /// Fill for `value`; `None` when missing.
    pub fn color_for(&self, value: MetricValue) -> Option<Rgb> {
        value.as_option().map(|v| viridis(1.0 - self.position(v)))
    }

    /// `n` evenly spaced legend swatches from `low` to `high`.
    pub fn legend(&self, n: usize) -> Vec<Rgb> {
        let n = n.max(2);
        (0..n)
            .map(|i| viridis(1.0 - i as f64 / (n as f64 - 1.0)))
            .collect()
    }
}
