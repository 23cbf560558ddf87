//! Date-indexed metric store.
//!
//! `MetricTimeSeries` turns the provider's raw rows into:
//!
//! - an ascending, deduplicated list of dates (the slider's index space)
//! - a `(date, state) → metrics` lookup
//!
//! It is built once and never mutated.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;

use crate::domain::{MetricRecord, Metrics, RawMetricRecord, StateCode};
use crate::error::CoreError;

/// Records for one date, keyed by state.
type DayTable = BTreeMap<StateCode, MetricRecord>;

#[derive(Debug, Clone)]
pub struct MetricTimeSeries {
    dates: Vec<NaiveDate>,
    by_date: HashMap<NaiveDate, DayTable>,
    record_count: usize,
}

impl MetricTimeSeries {
    /// Validate and index the raw rows.
    ///
    /// Fails on the first unparseable date token or duplicate `(date, state)`
    /// pair; nothing is built in that case.
    pub fn new(records: impl IntoIterator<Item = RawMetricRecord>) -> Result<Self, CoreError> {
        let mut by_date: HashMap<NaiveDate, DayTable> = HashMap::new();
        let mut record_count = 0usize;

        for raw in records {
            let date = parse_date_token(&raw.date)?;
            let day = by_date.entry(date).or_default();
            if day.contains_key(&raw.state) {
                return Err(CoreError::DuplicateRecord {
                    date,
                    state: raw.state,
                });
            }
            day.insert(
                raw.state.clone(),
                MetricRecord {
                    date,
                    state: raw.state,
                    metrics: raw.metrics,
                },
            );
            record_count += 1;
        }

        let mut dates: Vec<NaiveDate> = by_date.keys().copied().collect();
        dates.sort_unstable();

        Ok(Self {
            dates,
            by_date,
            record_count,
        })
    }

    /// All distinct dates, ascending.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Number of distinct dates (the slider has `len()` positions).
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Resolve a slider index to its date.
    pub fn date_at(&self, index: i64) -> Result<NaiveDate, CoreError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.dates.get(i).copied())
            .ok_or(CoreError::IndexOutOfRange {
                index,
                len: self.dates.len(),
            })
    }

    /// Slider index of `date`, if the dataset has it.
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    /// State → metrics for one date. Empty (not an error) for unknown dates.
    pub fn records_for(&self, date: NaiveDate) -> DayRecords<'_> {
        DayRecords {
            table: self.by_date.get(&date),
        }
    }

    /// Every metric name seen in any record, sorted.
    pub fn metric_names(&self) -> Vec<String> {
        let names: BTreeSet<&str> = self
            .by_date
            .values()
            .flat_map(|day| day.values())
            .flat_map(|record| record.metrics.keys())
            .map(String::as_str)
            .collect();
        names.into_iter().map(str::to_string).collect()
    }

    /// Every state seen in any record, sorted.
    pub fn states(&self) -> Vec<StateCode> {
        let states: BTreeSet<&StateCode> = self
            .by_date
            .values()
            .flat_map(|day| day.keys())
            .collect();
        states.into_iter().cloned().collect()
    }
}

/// Read-only view of one date's records.
#[derive(Debug, Clone, Copy)]
pub struct DayRecords<'a> {
    table: Option<&'a DayTable>,
}

impl<'a> DayRecords<'a> {
    pub fn get(&self, state: &str) -> Option<&'a Metrics> {
        self.table
            .and_then(|t| t.get(state))
            .map(|record| &record.metrics)
    }

    /// Value of one metric for one state, if recorded.
    pub fn metric(&self, state: &str, metric: &str) -> Option<f64> {
        self.get(state).and_then(|m| m.get(metric)).copied()
    }

    pub fn len(&self) -> usize {
        self.table.map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(state, metrics)` pairs in state order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Metrics)> + 'a {
        self.table
            .into_iter()
            .flat_map(|t| t.iter())
            .map(|(state, record)| (state.as_str(), &record.metrics))
    }
}

/// Parse a provider date token.
///
/// Accepts the compact `YYYYMMDD` form used by the daily feed and ISO
/// `YYYY-MM-DD`.
pub fn parse_date_token(token: &str) -> Result<NaiveDate, CoreError> {
    let t = token.trim();
    let parsed = if t.len() == 8 && t.bytes().all(|b| b.is_ascii_digit()) {
        NaiveDate::parse_from_str(t, "%Y%m%d").ok()
    } else if t.len() == 10 {
        NaiveDate::parse_from_str(t, "%Y-%m-%d").ok()
    } else {
        None
    };
    parsed.ok_or_else(|| CoreError::MalformedDate {
        token: token.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(date: &str, state: &str, metrics: &[(&str, f64)]) -> RawMetricRecord {
        RawMetricRecord {
            date: date.to_string(),
            state: state.to_string(),
            metrics: metrics.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn dates_are_sorted_and_deduplicated() {
        let series = MetricTimeSeries::new(vec![
            raw("20200123", "CA", &[("death", 2.0)]),
            raw("20200122", "CA", &[("death", 1.0)]),
            raw("20200123", "NY", &[("death", 5.0)]),
        ])
        .unwrap();

        assert_eq!(series.dates(), &[ymd(2020, 1, 22), ymd(2020, 1, 23)]);
        assert_eq!(series.len(), 2);
        assert_eq!(series.record_count(), 3);
        assert_eq!(series.index_of(ymd(2020, 1, 23)), Some(1));
        assert_eq!(series.index_of(ymd(2020, 1, 24)), None);
    }

    #[test]
    fn dates_are_restartable() {
        let series = MetricTimeSeries::new(vec![raw("20200122", "CA", &[])]).unwrap();
        let first: Vec<_> = series.dates().iter().collect();
        let second: Vec<_> = series.dates().iter().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn duplicate_date_state_pair_is_rejected() {
        let err = MetricTimeSeries::new(vec![
            raw("20200122", "CA", &[("death", 1.0)]),
            raw("20200122", "CA", &[("death", 2.0)]),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            CoreError::DuplicateRecord {
                date: ymd(2020, 1, 22),
                state: "CA".to_string()
            }
        );
    }

    #[test]
    fn same_state_on_equivalent_date_tokens_is_a_duplicate() {
        let err = MetricTimeSeries::new(vec![
            raw("20200122", "CA", &[]),
            raw("2020-01-22", "CA", &[]),
        ])
        .unwrap_err();
        assert!(err.is_data_integrity());
    }

    #[test]
    fn malformed_dates_are_rejected() {
        for token in ["2020013", "20201322", "jan 22", "", "2020/01/22"] {
            let err = MetricTimeSeries::new(vec![raw(token, "CA", &[])]).unwrap_err();
            assert_eq!(
                err,
                CoreError::MalformedDate {
                    token: token.to_string()
                },
                "token {token:?}"
            );
        }
    }

    #[test]
    fn records_for_unknown_date_is_empty() {
        let series = MetricTimeSeries::new(vec![raw("20200122", "CA", &[("death", 1.0)])]).unwrap();
        let day = series.records_for(ymd(2021, 1, 1));
        assert!(day.is_empty());
        assert_eq!(day.get("CA"), None);
        assert_eq!(day.iter().count(), 0);
    }

    #[test]
    fn records_for_returns_state_metrics() {
        let series = MetricTimeSeries::new(vec![
            raw("20200122", "NY", &[("death", 3.0), ("positive", 10.0)]),
            raw("20200122", "CA", &[("death", 1.0)]),
        ])
        .unwrap();
        let day = series.records_for(ymd(2020, 1, 22));
        assert_eq!(day.len(), 2);
        assert_eq!(day.metric("NY", "positive"), Some(10.0));
        assert_eq!(day.metric("CA", "positive"), None);
        let states: Vec<&str> = day.iter().map(|(s, _)| s).collect();
        assert_eq!(states, vec!["CA", "NY"]);
    }

    #[test]
    fn date_at_checks_bounds() {
        let series = MetricTimeSeries::new(vec![
            raw("20200122", "CA", &[]),
            raw("20200123", "CA", &[]),
        ])
        .unwrap();
        assert_eq!(series.date_at(1).unwrap(), ymd(2020, 1, 23));
        assert_eq!(
            series.date_at(-1).unwrap_err(),
            CoreError::IndexOutOfRange { index: -1, len: 2 }
        );
        assert!(series.date_at(2).is_err());
    }

    #[test]
    fn metric_names_and_states_are_collected() {
        let series = MetricTimeSeries::new(vec![
            raw("20200122", "NY", &[("positive", 1.0)]),
            raw("20200123", "CA", &[("death", 1.0)]),
        ])
        .unwrap();
        assert_eq!(series.metric_names(), vec!["death", "positive"]);
        assert_eq!(series.states(), vec!["CA", "NY"]);
    }
}
