//! Plain-text tables for `cmap frame` and `cmap dates`.

use crate::domain::{JoinedFrame, MetricValue, metric_title};
use crate::series::MetricTimeSeries;

/// Per-state table for one frame, in geometry order.
pub fn format_frame(frame: &JoinedFrame) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "=== {} on {} ===\n",
        metric_title(&frame.metric),
        frame.date.format("%Y-%m-%d")
    ));
    if frame.present_count() == 0 {
        out.push_str("Scale: 0 .. 0 (no values on this date)\n");
    } else {
        out.push_str(&format!(
            "Scale: {} .. {}\n",
            fmt_value(frame.bounds.low),
            fmt_value(frame.bounds.high)
        ));
    }
    out.push_str(&format!(
        "States: {} | present: {} | missing: {}\n\n",
        frame.entries.len(),
        frame.present_count(),
        frame.missing_count()
    ));

    out.push_str(&format!("{:<6} {:<24} {:>14}\n", "state", "name", frame.metric));
    out.push_str(&format!("{:-<6} {:-<24} {:->14}\n", "", "", ""));
    for e in &frame.entries {
        let value = match e.value {
            MetricValue::Present(v) => fmt_value(v),
            MetricValue::Missing => "-".to_string(),
        };
        out.push_str(&format!(
            "{:<6} {:<24} {:>14}\n",
            e.state,
            truncate(e.name.as_deref().unwrap_or(""), 24),
            value
        ));
    }

    out
}

/// `index  date  states` listing of the slider positions.
pub fn format_dates(series: &MetricTimeSeries) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:>5}  {:<10}  {:>6}\n", "index", "date", "states"));
    for (i, date) in series.dates().iter().enumerate() {
        out.push_str(&format!(
            "{:>5}  {:<10}  {:>6}\n",
            i,
            date.format("%Y-%m-%d").to_string(),
            series.records_for(*date).len()
        ));
    }
    out
}

/// Integers print without decimals; everything else with two.
pub fn fmt_value(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut t: String = s.chars().take(max.saturating_sub(1)).collect();
        t.push('…');
        t
    }
}
