//! Shared domain types.
//!
//! These types are intentionally kept lightweight so they can be:
//!
//! - built once from the data provider and shared read-only
//! - handed to the renderer without copying geometry
//! - exported to GeoJSON

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use clap::ValueEnum;
use geo::{BoundingRect, MultiPolygon, Rect};
use serde::Serialize;

use crate::error::CoreError;

/// Two-letter state/territory code (`"CA"`, `"NY"`, `"PR"`, ...).
pub type StateCode = String;

/// Metric name → value for one (date, state) record.
pub type Metrics = BTreeMap<String, f64>;

/// One row as delivered by the data provider, before date validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMetricRecord {
    /// Date token, `YYYYMMDD` (or ISO `YYYY-MM-DD`).
    pub date: String,
    pub state: StateCode,
    pub metrics: Metrics,
}

/// A validated row: canonical calendar date plus its metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub date: NaiveDate,
    pub state: StateCode,
    pub metrics: Metrics,
}

/// Polygonal boundary of one state, in lon/lat.
///
/// Single polygons from the GeoJSON source are promoted to a one-member
/// multipolygon, so every state has the same shape type.
pub type Boundary = MultiPolygon<f64>;

/// Static boundary for one state.
#[derive(Debug, Clone, PartialEq)]
pub struct StateGeometry {
    pub state: StateCode,
    /// Display name (e.g. `"California"`), when the source provides one.
    pub name: Option<String>,
    pub geometry: Arc<Boundary>,
}

impl StateGeometry {
    pub fn new(state: impl Into<StateCode>, name: Option<String>, geometry: impl Into<Boundary>) -> Self {
        Self {
            state: state.into(),
            name,
            geometry: Arc::new(geometry.into()),
        }
    }
}

/// The ordered, shared set of state boundaries.
///
/// Cloning is cheap (reference-counted); the iteration order is the order the
/// provider delivered and is the entry order of every joined frame.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryTable {
    entries: Arc<[StateGeometry]>,
}

impl GeometryTable {
    /// Build the table, rejecting duplicate state identifiers.
    pub fn new(entries: Vec<StateGeometry>) -> Result<Self, CoreError> {
        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if !seen.insert(entry.state.as_str()) {
                return Err(CoreError::DuplicateGeometry {
                    state: entry.state.clone(),
                });
            }
        }
        Ok(Self {
            entries: entries.into(),
        })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StateGeometry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, state: &str) -> bool {
        self.entries.iter().any(|e| e.state == state)
    }

    /// Bounding box of every geometry in the table.
    pub fn extent(&self) -> Option<Rect<f64>> {
        let boxes: MultiPolygon<f64> = self
            .entries
            .iter()
            .filter_map(|e| e.geometry.bounding_rect())
            .map(|r| r.to_polygon())
            .collect();
        boxes.bounding_rect()
    }
}

impl<'a> IntoIterator for &'a GeometryTable {
    type Item = &'a StateGeometry;
    type IntoIter = std::slice::Iter<'a, StateGeometry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A joined metric value: present, or explicitly missing (never zero).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(into = "Option<f64>")]
pub enum MetricValue {
    Present(f64),
    Missing,
}

impl MetricValue {
    /// Non-finite inputs are treated as missing.
    pub fn from_option(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() => MetricValue::Present(v),
            _ => MetricValue::Missing,
        }
    }

    pub fn as_option(self) -> Option<f64> {
        match self {
            MetricValue::Present(v) => Some(v),
            MetricValue::Missing => None,
        }
    }

    pub fn is_missing(self) -> bool {
        matches!(self, MetricValue::Missing)
    }
}

impl From<Option<f64>> for MetricValue {
    fn from(value: Option<f64>) -> Self {
        MetricValue::from_option(value)
    }
}

impl From<MetricValue> for Option<f64> {
    fn from(value: MetricValue) -> Self {
        value.as_option()
    }
}

/// Color-scale bounds for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScaleBounds {
    pub low: f64,
    pub high: f64,
}

impl ScaleBounds {
    /// Bounds used when a frame has no present values.
    pub const EMPTY: ScaleBounds = ScaleBounds { low: 0.0, high: 0.0 };

    /// Min/max over the present values; `EMPTY` when there are none.
    pub fn from_values(values: impl IntoIterator<Item = MetricValue>) -> Self {
        values
            .into_iter()
            .filter_map(MetricValue::as_option)
            .fold(None, |acc: Option<ScaleBounds>, v| {
                Some(match acc {
                    Some(b) => ScaleBounds {
                        low: b.low.min(v),
                        high: b.high.max(v),
                    },
                    None => ScaleBounds { low: v, high: v },
                })
            })
            .unwrap_or(Self::EMPTY)
    }

    pub fn span(&self) -> f64 {
        self.high - self.low
    }

    pub fn is_degenerate(&self) -> bool {
        self.span() <= 0.0
    }

    /// Position of `value` within the bounds, clamped to `[0, 1]`.
    ///
    /// A degenerate scale maps everything to `0.0`.
    pub fn normalize(&self, value: f64) -> f64 {
        if self.is_degenerate() {
            return 0.0;
        }
        ((value - self.low) / self.span()).clamp(0.0, 1.0)
    }
}

/// One state in a joined frame.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedEntry {
    pub state: StateCode,
    pub name: Option<String>,
    /// Shared with the geometry table; never copied per frame.
    pub geometry: Arc<Boundary>,
    pub value: MetricValue,
}

/// The join output for one (date, metric).
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedFrame {
    pub date: NaiveDate,
    pub metric: String,
    /// Same order as the geometry table.
    pub entries: Vec<JoinedEntry>,
    pub bounds: ScaleBounds,
}

impl JoinedFrame {
    pub fn present_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.value.is_missing()).count()
    }

    pub fn missing_count(&self) -> usize {
        self.entries.len() - self.present_count()
    }

    pub fn value_of(&self, state: &str) -> Option<MetricValue> {
        self.entries
            .iter()
            .find(|e| e.state == state)
            .map(|e| e.value)
    }
}

/// The metrics the dashboard knows how to title.
///
/// The engine accepts any field name; this list only drives the CLI and labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Metric {
    Death,
    DeathIncrease,
    HospitalizedCurrently,
    Positive,
    Hospitalized,
    DeathConfirmed,
}

impl Metric {
    /// The four maps of the combined dashboard, in grid order.
    pub const DASHBOARD: [Metric; 4] = [
        Metric::Death,
        Metric::DeathIncrease,
        Metric::HospitalizedCurrently,
        Metric::Positive,
    ];

    /// Field name in the daily JSON.
    pub fn field(self) -> &'static str {
        match self {
            Metric::Death => "death",
            Metric::DeathIncrease => "deathIncrease",
            Metric::HospitalizedCurrently => "hospitalizedCurrently",
            Metric::Positive => "positive",
            Metric::Hospitalized => "hospitalized",
            Metric::DeathConfirmed => "deathConfirmed",
        }
    }

    /// Human-readable label for titles and legends.
    pub fn title(self) -> &'static str {
        match self {
            Metric::Death => "COVID-19 deaths",
            Metric::DeathIncrease => "COVID-19 death increase",
            Metric::HospitalizedCurrently => "Currently hospitalized",
            Metric::Positive => "Positive cases",
            Metric::Hospitalized => "Hospitalizations",
            Metric::DeathConfirmed => "Confirmed deaths",
        }
    }

    /// Look up the catalogue entry for a JSON field name.
    pub fn from_field(field: &str) -> Option<Metric> {
        [
            Metric::Death,
            Metric::DeathIncrease,
            Metric::HospitalizedCurrently,
            Metric::Positive,
            Metric::Hospitalized,
            Metric::DeathConfirmed,
        ]
        .into_iter()
        .find(|m| m.field() == field)
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_possible_value() {
            Some(v) => write!(f, "{}", v.get_name()),
            None => write!(f, "{}", self.field()),
        }
    }
}

/// Title for a metric field, falling back to the raw field name.
pub fn metric_title(field: &str) -> String {
    Metric::from_field(field)
        .map(|m| m.title().to_string())
        .unwrap_or_else(|| field.to_string())
}

#[cfg(test)]
mod tests {
    use geo::{Contains, Point, polygon};

    use super::*;

    fn square(x: f64, y: f64) -> geo::Polygon<f64> {
        Rect::new((x, y), (x + 1.0, y + 1.0)).to_polygon()
    }

    #[test]
    fn geometry_table_rejects_duplicate_states() {
        let err = GeometryTable::new(vec![
            StateGeometry::new("CA", None, square(0.0, 0.0)),
            StateGeometry::new("CA", None, square(2.0, 0.0)),
        ])
        .unwrap_err();
        assert_eq!(err, CoreError::DuplicateGeometry { state: "CA".to_string() });
        assert!(err.is_data_integrity());
    }

    #[test]
    fn single_polygons_become_one_member_boundaries() {
        let g = StateGeometry::new("RI", Some("Rhode Island".to_string()), square(0.0, 0.0));
        assert_eq!(g.geometry.0.len(), 1);
        assert!(g.geometry.contains(&Point::new(0.5, 0.5)));
    }

    #[test]
    fn boundaries_respect_holes_and_islands() {
        let donut = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 4.0), (x: 0.0, y: 4.0)],
            interiors: [[(x: 1.0, y: 1.0), (x: 3.0, y: 1.0), (x: 3.0, y: 3.0), (x: 1.0, y: 3.0)]]
        );
        let g = StateGeometry::new("MI", None, donut);
        assert!(g.geometry.contains(&Point::new(0.5, 0.5)));
        assert!(!g.geometry.contains(&Point::new(2.0, 2.0)));

        let islands: Boundary = MultiPolygon::new(vec![square(0.0, 0.0), square(5.0, 5.0)]);
        assert!(islands.contains(&Point::new(5.5, 5.5)));
        assert!(!islands.contains(&Point::new(3.0, 3.0)));
    }

    #[test]
    fn table_extent_covers_all_states() {
        let table = GeometryTable::new(vec![
            StateGeometry::new("A", None, square(-3.0, 1.0)),
            StateGeometry::new("B", None, square(4.0, -2.0)),
        ])
        .unwrap();
        let e = table.extent().unwrap();
        assert_eq!((e.min().x, e.min().y, e.max().x, e.max().y), (-3.0, -2.0, 5.0, 2.0));

        assert!(GeometryTable::new(vec![]).unwrap().extent().is_none());
    }

    #[test]
    fn scale_bounds_ignore_missing_and_fall_back_to_zero() {
        let b = ScaleBounds::from_values([
            MetricValue::Missing,
            MetricValue::Present(7.0),
            MetricValue::Present(-2.0),
        ]);
        assert_eq!(b, ScaleBounds { low: -2.0, high: 7.0 });

        let empty = ScaleBounds::from_values([MetricValue::Missing, MetricValue::Missing]);
        assert_eq!(empty, ScaleBounds::EMPTY);
        assert!(empty.is_degenerate());
        assert_eq!(empty.normalize(5.0), 0.0);
    }

    #[test]
    fn normalize_clamps_to_unit_interval() {
        let b = ScaleBounds { low: 10.0, high: 20.0 };
        assert!((b.normalize(15.0) - 0.5).abs() < 1e-12);
        assert_eq!(b.normalize(0.0), 0.0);
        assert_eq!(b.normalize(99.0), 1.0);
    }

    #[test]
    fn metric_value_serializes_missing_as_null() {
        let json = serde_json::to_string(&[MetricValue::Present(1.5), MetricValue::Missing]).unwrap();
        assert_eq!(json, "[1.5,null]");
        assert!(MetricValue::from_option(Some(f64::NAN)).is_missing());
    }

    #[test]
    fn metric_catalogue_round_trips_fields() {
        for m in Metric::DASHBOARD {
            assert_eq!(Metric::from_field(m.field()), Some(m));
        }
        assert_eq!(metric_title("totalTestResults"), "totalTestResults");
    }
}
