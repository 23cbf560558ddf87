//! File/HTTP data provider and dataset assembly.

use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

use reqwest::blocking::Client;

use crate::config::{DataConfig, GeometrySource};
use crate::domain::{GeometryTable, RawMetricRecord, StateGeometry};
use crate::error::AppError;
use crate::io::ingest::{parse_daily_records, parse_state_geometries};
use crate::series::MetricTimeSeries;

/// The two read interfaces the core depends on.
pub trait DataProvider {
    fn metric_records(&self) -> Result<Vec<RawMetricRecord>, AppError>;
    fn state_geometries(&self) -> Result<Vec<StateGeometry>, AppError>;
}

/// Reads the daily feed from disk and the boundaries from disk or HTTP.
pub struct FileProvider {
    config: DataConfig,
}

impl FileProvider {
    pub fn new(config: DataConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DataConfig {
        &self.config
    }

    fn fetch_geometry(&self, url: &str) -> Result<Vec<StateGeometry>, AppError> {
        log::info!("fetching state boundaries from {url}");
        let resp = Client::new()
            .get(url)
            .send()
            .map_err(|e| AppError::new(2, format!("Geometry request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::new(
                2,
                format!("Geometry request failed with status {}.", resp.status()),
            ));
        }

        let body = resp
            .bytes()
            .map_err(|e| AppError::new(2, format!("Failed to read geometry response: {e}")))?;
        parse_state_geometries(body.as_ref())
    }
}

impl DataProvider for FileProvider {
    fn metric_records(&self) -> Result<Vec<RawMetricRecord>, AppError> {
        let path = &self.config.daily;
        let file = File::open(path)
            .map_err(|e| AppError::new(2, format!("Failed to open daily JSON '{}': {e}", path.display())))?;

        let ingest = parse_daily_records(BufReader::new(file))?;
        if !ingest.row_errors.is_empty() {
            log::warn!(
                "{} of {} daily rows skipped",
                ingest.row_errors.len(),
                ingest.rows_read
            );
        }
        Ok(ingest.records)
    }

    fn state_geometries(&self) -> Result<Vec<StateGeometry>, AppError> {
        match &self.config.geometry {
            GeometrySource::Path(path) => {
                let file = File::open(path).map_err(|e| {
                    AppError::new(2, format!("Failed to open GeoJSON '{}': {e}", path.display()))
                })?;
                parse_state_geometries(BufReader::new(file))
            }
            GeometrySource::Url(url) => self.fetch_geometry(url),
        }
    }
}

/// A loaded, validated dataset ready for joining.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub series: Arc<MetricTimeSeries>,
    pub geometry: GeometryTable,
}

/// Load both inputs and validate them into core types.
pub fn load_dataset(provider: &dyn DataProvider) -> Result<Dataset, AppError> {
    let series = MetricTimeSeries::new(provider.metric_records()?)?;
    let geometry = GeometryTable::new(provider.state_geometries()?)?;

    if series.is_empty() {
        return Err(AppError::new(3, "Daily JSON contains no usable records."));
    }
    if geometry.is_empty() {
        return Err(AppError::new(3, "GeoJSON contains no usable state boundaries."));
    }

    log::info!(
        "loaded {} records over {} dates ({} .. {}), {} state boundaries",
        series.record_count(),
        series.len(),
        series.dates()[0],
        series.dates()[series.len() - 1],
        geometry.len()
    );

    let unmapped: Vec<String> = series
        .states()
        .into_iter()
        .filter(|s| !geometry.contains(s))
        .collect();
    if !unmapped.is_empty() {
        log::warn!("states without boundaries (never drawn): {}", unmapped.join(", "));
    }

    Ok(Dataset {
        series: Arc::new(series),
        geometry,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticProvider {
        records: Vec<RawMetricRecord>,
        states: Vec<StateGeometry>,
    }

    impl DataProvider for StaticProvider {
        fn metric_records(&self) -> Result<Vec<RawMetricRecord>, AppError> {
            Ok(self.records.clone())
        }

        fn state_geometries(&self) -> Result<Vec<StateGeometry>, AppError> {
            Ok(self.states.clone())
        }
    }

    fn record(date: &str, state: &str) -> RawMetricRecord {
        RawMetricRecord {
            date: date.to_string(),
            state: state.to_string(),
            metrics: [("death".to_string(), 1.0)].into(),
        }
    }

    fn state(code: &str) -> StateGeometry {
        StateGeometry::new(code, None, geo::Rect::new((0.0, 0.0), (1.0, 1.0)).to_polygon())
    }

    #[test]
    fn dataset_loads_from_provider() {
        let provider = StaticProvider {
            records: vec![record("20200122", "CA"), record("20200123", "CA")],
            states: vec![state("CA"), state("NY")],
        };
        let ds = load_dataset(&provider).unwrap();
        assert_eq!(ds.series.len(), 2);
        assert_eq!(ds.geometry.len(), 2);
    }

    #[test]
    fn integrity_failures_abort_the_load() {
        let provider = StaticProvider {
            records: vec![record("20200122", "CA"), record("20200122", "CA")],
            states: vec![state("CA")],
        };
        assert_eq!(load_dataset(&provider).unwrap_err().exit_code(), 3);

        let provider = StaticProvider {
            records: vec![record("2020-13-01", "CA")],
            states: vec![state("CA")],
        };
        assert_eq!(load_dataset(&provider).unwrap_err().exit_code(), 3);

        let provider = StaticProvider {
            records: vec![record("20200122", "CA")],
            states: vec![state("CA"), state("CA")],
        };
        assert_eq!(load_dataset(&provider).unwrap_err().exit_code(), 3);
    }

    #[test]
    fn empty_inputs_are_rejected() {
        let provider = StaticProvider {
            records: vec![],
            states: vec![state("CA")],
        };
        assert!(load_dataset(&provider).is_err());
    }

    #[test]
    fn file_provider_reads_local_files() {
        let dir = std::env::temp_dir().join(format!("cmap_provider_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let daily = dir.join("daily.json");
        let states = dir.join("states.json");
        std::fs::write(&daily, r#"[{"date": 20200122, "state": "CA", "death": 2}]"#).unwrap();
        std::fs::write(
            &states,
            r#"{"type":"FeatureCollection","features":[{"type":"Feature","id":"CA","properties":{"name":"California"},"geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}}]}"#,
        )
        .unwrap();

        let provider = FileProvider::new(DataConfig {
            daily: daily.clone(),
            geometry: GeometrySource::Path(states.clone()),
        });
        let ds = load_dataset(&provider).unwrap();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(ds.series.record_count(), 1);
        assert_eq!(ds.geometry.iter().next().unwrap().name.as_deref(), Some("California"));
    }

    #[test]
    fn missing_daily_file_is_an_input_error() {
        let provider = FileProvider::new(DataConfig {
            daily: std::env::temp_dir().join("cmap_definitely_missing.json"),
            geometry: GeometrySource::Path("unused.json".into()),
        });
        assert_eq!(provider.metric_records().unwrap_err().exit_code(), 2);
    }
}
