//! Data-source configuration.
//!
//! Resolution order for each source: explicit CLI flag, then environment
//! (after loading `.env`), then the built-in default.

use std::path::PathBuf;

use crate::cli::DataArgs;

pub const ENV_DAILY_JSON: &str = "CMAP_DAILY_JSON";
pub const ENV_STATES_GEOJSON: &str = "CMAP_STATES_GEOJSON";

pub const DEFAULT_DAILY_JSON: &str = "daily.json";
pub const DEFAULT_STATES_GEOJSON: &str =
    "https://raw.githubusercontent.com/python-visualization/folium/master/examples/data/us-states.json";

/// Where the state boundaries come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometrySource {
    Path(PathBuf),
    Url(String),
}

impl GeometrySource {
    /// `http(s)://` values are URLs; anything else is a local path.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            GeometrySource::Url(trimmed.to_string())
        } else {
            GeometrySource::Path(PathBuf::from(trimmed))
        }
    }
}

impl std::fmt::Display for GeometrySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometrySource::Path(p) => write!(f, "{}", p.display()),
            GeometrySource::Url(u) => write!(f, "{u}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataConfig {
    pub daily: PathBuf,
    pub geometry: GeometrySource,
}

impl DataConfig {
    /// Resolve against the process environment (loads `.env` first).
    pub fn from_args(args: &DataArgs) -> Self {
        dotenvy::dotenv().ok();
        Self::resolve(args, |key| std::env::var(key).ok())
    }

    /// Resolve with an explicit environment lookup.
    pub fn resolve(args: &DataArgs, env: impl Fn(&str) -> Option<String>) -> Self {
        let daily = args
            .daily
            .clone()
            .or_else(|| env(ENV_DAILY_JSON).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DAILY_JSON));

        let geometry = args
            .geometry
            .clone()
            .or_else(|| env(ENV_STATES_GEOJSON))
            .unwrap_or_else(|| DEFAULT_STATES_GEOJSON.to_string());

        Self {
            daily,
            geometry: GeometrySource::parse(&geometry),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_apply_without_flags_or_env() {
        let cfg = DataConfig::resolve(&DataArgs::default(), no_env);
        assert_eq!(cfg.daily, PathBuf::from("daily.json"));
        assert_eq!(cfg.geometry, GeometrySource::Url(DEFAULT_STATES_GEOJSON.to_string()));
    }

    #[test]
    fn env_overrides_defaults_and_flags_override_env() {
        let env = |key: &str| match key {
            ENV_DAILY_JSON => Some("/data/daily.json".to_string()),
            ENV_STATES_GEOJSON => Some("/data/states.json".to_string()),
            _ => None,
        };
        let cfg = DataConfig::resolve(&DataArgs::default(), env);
        assert_eq!(cfg.daily, PathBuf::from("/data/daily.json"));
        assert_eq!(cfg.geometry, GeometrySource::Path(PathBuf::from("/data/states.json")));

        let args = DataArgs {
            daily: Some(PathBuf::from("local.json")),
            geometry: Some("https://example.org/states.json".to_string()),
        };
        let cfg = DataConfig::resolve(&args, env);
        assert_eq!(cfg.daily, PathBuf::from("local.json"));
        assert_eq!(cfg.geometry, GeometrySource::Url("https://example.org/states.json".to_string()));
    }
}
