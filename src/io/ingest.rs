//! Raw input parsing.
//!
//! This module turns the provider's two payloads into domain inputs:
//!
//! - the daily metrics JSON (an array of per-state, per-day objects) into
//!   `RawMetricRecord`s
//! - a GeoJSON `FeatureCollection` of state boundaries into `StateGeometry`s
//!
//! Design goals:
//! - **Row-level tolerance** for the daily feed (skip rows without a key,
//!   report them)
//! - **No date validation here**; every present `date` value is passed on as a
//!   token, so a bad one fails `MetricTimeSeries::new` and aborts the load
//! - **Deterministic output order** (input order is preserved)

use std::io::Read;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::domain::{Boundary, Metrics, RawMetricRecord, StateGeometry};
use crate::error::AppError;

/// A row skipped during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    /// Zero-based position in the input array.
    pub row: usize,
    pub message: String,
}

/// Ingest output for the daily feed.
#[derive(Debug, Clone)]
pub struct IngestedRecords {
    pub records: Vec<RawMetricRecord>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Parse the daily metrics feed.
///
/// Every numeric field other than `date` becomes a metric; `null`, strings and
/// booleans are ignored, so a `null` metric reads as missing downstream.
pub fn parse_daily_records<R: Read>(reader: R) -> Result<IngestedRecords, AppError> {
    let rows: Vec<Value> = serde_json::from_reader(reader)
        .map_err(|e| AppError::new(2, format!("Invalid daily JSON (expected an array of objects): {e}")))?;

    let rows_read = rows.len();
    let mut records = Vec::with_capacity(rows_read);
    let mut row_errors = Vec::new();

    for (row, value) in rows.into_iter().enumerate() {
        match parse_row(value) {
            Ok(record) => records.push(record),
            Err(message) => {
                log::warn!("skipping daily row {row}: {message}");
                row_errors.push(RowError { row, message });
            }
        }
    }

    Ok(IngestedRecords {
        records,
        row_errors,
        rows_read,
    })
}

fn parse_row(value: Value) -> Result<RawMetricRecord, String> {
    let Value::Object(mut obj) = value else {
        return Err("row is not a JSON object".to_string());
    };

    let date = match obj.remove("date") {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
        None => return Err("missing 'date'".to_string()),
    };

    let state = match obj.remove("state") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(other) => return Err(format!("unsupported 'state' value {other}")),
        None => return Err("missing 'state'".to_string()),
    };

    Ok(RawMetricRecord {
        date,
        state,
        metrics: numeric_fields(obj),
    })
}

fn numeric_fields(obj: Map<String, Value>) -> Metrics {
    obj.into_iter()
        .filter_map(|(k, v)| v.as_f64().filter(|x| x.is_finite()).map(|x| (k, x)))
        .collect()
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    #[serde(default)]
    geometry: Option<Value>,
}

/// Parse a GeoJSON `FeatureCollection` of state boundaries.
///
/// The state code is the feature `id`, falling back to a `state` or `id`
/// property. Features without a code or with a non-polygonal geometry are
/// skipped with a warning.
pub fn parse_state_geometries<R: Read>(reader: R) -> Result<Vec<StateGeometry>, AppError> {
    let collection: FeatureCollection = serde_json::from_reader(reader)
        .map_err(|e| AppError::new(2, format!("Invalid GeoJSON FeatureCollection: {e}")))?;

    let mut out = Vec::with_capacity(collection.features.len());
    for (idx, feature) in collection.features.into_iter().enumerate() {
        let Some(state) = feature_state(&feature) else {
            log::warn!("skipping feature {idx}: no state identifier");
            continue;
        };

        let Some(raw) = feature.geometry else {
            log::warn!("skipping feature {state}: no geometry");
            continue;
        };
        let geometry = match to_boundary(raw) {
            Ok(g) => g,
            Err(message) => {
                log::warn!("skipping feature {state}: {message}");
                continue;
            }
        };

        let name = feature
            .properties
            .as_ref()
            .and_then(|p| p.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string);

        out.push(StateGeometry::new(state, name, geometry));
    }

    Ok(out)
}

/// GeoJSON geometry object -> `geo` multipolygon.
fn to_boundary(raw: Value) -> Result<Boundary, String> {
    let geometry: geojson::Geometry =
        serde_json::from_value(raw).map_err(|e| format!("invalid geometry ({e})"))?;
    match geo::Geometry::<f64>::try_from(geometry).map_err(|e| format!("invalid geometry ({e})"))? {
        geo::Geometry::Polygon(p) => Ok(p.into()),
        geo::Geometry::MultiPolygon(m) => Ok(m),
        _ => Err("unsupported geometry (expected Polygon or MultiPolygon)".to_string()),
    }
}

fn feature_state(feature: &Feature) -> Option<String> {
    let from_props = |key: &str| {
        feature
            .properties
            .as_ref()
            .and_then(|p| p.get(key))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    feature
        .id
        .as_ref()
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| from_props("state"))
        .or_else(|| from_props("id"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
