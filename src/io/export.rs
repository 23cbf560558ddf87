//! Export joined frames as GeoJSON.
//!
//! One `FeatureCollection` per frame. Each feature carries `state`, `name`,
//! `date`, `metric` and `value` (`null` when missing); the collection carries
//! `metric`, `date` and the frame's color-scale bounds in a `scale` member.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, feature::Id};
use serde_json::json;

use crate::domain::JoinedFrame;
use crate::error::AppError;

/// Build the GeoJSON collection for one frame.
pub fn frame_to_geojson(frame: &JoinedFrame) -> FeatureCollection {
    let date = frame.date.format("%Y-%m-%d").to_string();
    let features = frame
        .entries
        .iter()
        .map(|e| {
            let mut properties = JsonObject::new();
            properties.insert("state".to_string(), json!(e.state));
            properties.insert("name".to_string(), json!(e.name));
            properties.insert("date".to_string(), json!(date));
            properties.insert("metric".to_string(), json!(frame.metric));
            properties.insert("value".to_string(), json!(e.value));
            Feature {
                bbox: None,
                geometry: Some(Geometry::new(geojson::Value::from(&*e.geometry))),
                id: Some(Id::String(e.state.clone())),
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    let mut members = JsonObject::new();
    members.insert("metric".to_string(), json!(frame.metric));
    members.insert("date".to_string(), json!(date));
    members.insert("scale".to_string(), json!(frame.bounds));

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(members),
    }
}

/// Write one frame to `path`.
pub fn write_frame_geojson(path: &Path, frame: &JoinedFrame) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create GeoJSON '{}': {e}", path.display())))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &frame_to_geojson(frame))
        .map_err(|e| AppError::new(2, format!("Failed to write GeoJSON: {e}")))?;
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to write GeoJSON '{}': {e}", path.display())))?;

    log::info!(
        "wrote {} @ {} ({} features) to {}",
        frame.metric,
        frame.date,
        frame.entries.len(),
        path.display()
    );
    Ok(())
}

/// Default export file name: `<metric>_<YYYYMMDD>.geojson`.
pub fn export_file_name(frame: &JoinedFrame) -> String {
    format!("{}_{}.geojson", frame.metric, frame.date.format("%Y%m%d"))
}
