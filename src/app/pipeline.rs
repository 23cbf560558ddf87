//! Shared loading logic used by the CLI and TUI front-ends.
//!
//! config -> provider -> validated dataset -> slider index

use crate::cli::DataArgs;
use crate::config::DataConfig;
use crate::data::{Dataset, FileProvider, load_dataset};
use crate::error::AppError;
use crate::series::{MetricTimeSeries, parse_date_token};

/// Resolve data sources and load the dataset.
pub fn load(args: &DataArgs) -> Result<Dataset, AppError> {
    let config = DataConfig::from_args(args);
    log::debug!("daily json: {}, geometry: {}", config.daily.display(), config.geometry);
    load_dataset(&FileProvider::new(config))
}

/// Slider index for an explicit date, or `index` when no date is given.
///
/// The index is passed through unchecked; the controller rejects it if it is
/// out of range.
pub fn select_index(series: &MetricTimeSeries, index: i64, date: Option<&str>) -> Result<i64, AppError> {
    let Some(token) = date else {
        return Ok(index);
    };
    let date = parse_date_token(token)?;
    series
        .index_of(date)
        .map(|i| i as i64)
        .ok_or_else(|| AppError::new(4, format!("No records for {date}.")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RawMetricRecord;

    fn series() -> MetricTimeSeries {
        MetricTimeSeries::new(["20200122", "20200124"].map(|d| RawMetricRecord {
            date: d.to_string(),
            state: "CA".to_string(),
            metrics: Default::default(),
        }))
        .unwrap()
    }

    #[test]
    fn date_selects_its_slider_position() {
        let s = series();
        assert_eq!(select_index(&s, 0, Some("2020-01-24")).unwrap(), 1);
        assert_eq!(select_index(&s, 0, Some("20200122")).unwrap(), 0);
        assert_eq!(select_index(&s, -3, None).unwrap(), -3);
    }

    #[test]
    fn unknown_or_malformed_dates_are_errors() {
        let s = series();
        assert_eq!(select_index(&s, 0, Some("2020-01-23")).unwrap_err().exit_code(), 4);
        assert_eq!(select_index(&s, 0, Some("Jan 22")).unwrap_err().exit_code(), 3);
    }
}
