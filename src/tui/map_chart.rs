//! Plotters-powered choropleth widget for Ratatui.
//!
//! We render Plotters output into the Ratatui buffer using
//! `plotters-ratatui-backend`; Plotters gives us filled polygons, which the
//! built-in `Canvas` shapes do not.

use plotters::prelude::*;
use plotters::style::Color as _;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::domain::JoinedFrame;
use crate::plot::palette::{Palette, Rgb};
use crate::report::fmt_value;

/// A render-only map description.
///
/// All inputs are computed outside the render call; `extent` is the geometry
/// table's bounding box so every frame shares the same projection.
pub struct ChoroplethChart<'a> {
    pub frame: &'a JoinedFrame,
    pub extent: geo::Rect<f64>,
}

impl<'a> Widget for ChoroplethChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 10 || area.height < 4 {
            buf.set_string(
                area.x,
                area.y,
                "Map area too small.",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let (x0, y0) = self.extent.min().x_y();
        let (x1, y1) = self.extent.max().x_y();
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let palette = Palette::new(self.frame.bounds);
        let outline = RGBColor(40, 40, 40);
        let frame = self.frame;

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root).margin(0).build_cartesian_2d(x0..x1, y0..y1)?;

            for entry in &frame.entries {
                let fill = palette.color_for(entry.value);
                for polygon in &entry.geometry.0 {
                    let exterior: Vec<(f64, f64)> = polygon.exterior().coords().map(|c| (c.x, c.y)).collect();

                    // Missing states keep only their outline.
                    if let Some(Rgb(r, g, b)) = fill {
                        chart.draw_series(std::iter::once(Polygon::new(
                            exterior.clone(),
                            RGBColor(r, g, b).filled(),
                        )))?;
                    }
                    chart.draw_series(std::iter::once(PathElement::new(exterior, &outline)))?;

                    // Holes are not cut out of the fill, only outlined.
                    for hole in polygon.interiors() {
                        let ring: Vec<(f64, f64)> = hole.coords().map(|c| (c.x, c.y)).collect();
                        chart.draw_series(std::iter::once(PathElement::new(ring, &outline)))?;
                    }
                }
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}

/// One-line legend: `low ████████ high  □ missing (n)`.
pub fn legend_line(frame: &JoinedFrame, swatches: usize) -> Line<'static> {
    let palette = Palette::new(frame.bounds);
    let mut spans = Vec::with_capacity(swatches + 4);

    spans.push(Span::styled(
        format!("{} ", fmt_value(frame.bounds.low)),
        Style::default().fg(Color::Gray),
    ));
    for Rgb(r, g, b) in palette.legend(swatches) {
        spans.push(Span::styled("█", Style::default().fg(Color::Rgb(r, g, b))));
    }
    spans.push(Span::styled(
        format!(" {}", fmt_value(frame.bounds.high)),
        Style::default().fg(Color::Gray),
    ));
    if frame.missing_count() > 0 {
        spans.push(Span::styled(
            format!("  □ missing ({})", frame.missing_count()),
            Style::default().fg(Color::DarkGray),
        ));
    }

    Line::from(spans)
}
