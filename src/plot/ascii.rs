//! ASCII choropleth for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid, plain lon/lat), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Cell glyphs:
//! - present values: `-` `+` `*` `#` `@` (low → high, denser is higher)
//! - missing values: `.`
//! - outside every state: space

use geo::{BoundingRect, Contains, MultiPolygon, Point, Rect};

use crate::domain::JoinedFrame;
use crate::plot::palette::Palette;

const SHADES: [char; 5] = ['-', '+', '*', '#', '@'];
const MISSING: char = '.';

/// Rasterize one frame into a `width × height` character grid.
pub fn render_ascii_map(frame: &JoinedFrame, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);
    let palette = Palette::new(frame.bounds);

    let mut out = String::new();
    out.push_str(&format!(
        "Map: {} @ {} | scale=[{:.2}, {:.2}] | present={} missing={}\n",
        frame.metric,
        frame.date.format("%Y-%m-%d"),
        frame.bounds.low,
        frame.bounds.high,
        frame.present_count(),
        frame.missing_count(),
    ));

    // Per-entry bounding boxes let most cells skip the polygon test.
    let boxes: Vec<Option<Rect<f64>>> = frame.entries.iter().map(|e| e.geometry.bounding_rect()).collect();
    let all: MultiPolygon<f64> = boxes.iter().flatten().map(|b| b.to_polygon()).collect();
    let Some(extent) = all.bounding_rect() else {
        return out;
    };
    let span_x = non_zero(extent.width());
    let span_y = non_zero(extent.height());

    for row in 0..height {
        let y = extent.max().y - (row as f64 + 0.5) / height as f64 * span_y;
        let line: String = (0..width)
            .map(|col| {
                let p = Point::new(extent.min().x + (col as f64 + 0.5) / width as f64 * span_x, y);
                frame
                    .entries
                    .iter()
                    .zip(&boxes)
                    .find(|(e, bbox)| bbox.is_some_and(|b| b.contains(&p)) && e.geometry.contains(&p))
                    .map_or(' ', |(e, _)| match e.value.as_option() {
                        Some(v) => shade(palette.position(v)),
                        None => MISSING,
                    })
            })
            .collect();
        out.push_str(&line);
        out.push('\n');
    }

    out
}

fn shade(position: f64) -> char {
    let i = (position * (SHADES.len() - 1) as f64).round() as usize;
    SHADES[i.min(SHADES.len() - 1)]
}

fn non_zero(span: f64) -> f64 {
    if span.is_finite() && span > 0.0 { span } else { 1.0 }
}
