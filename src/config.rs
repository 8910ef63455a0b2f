use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::export::DEFAULT_EXPORT_FILE;
use crate::layout::LayoutRegistry;
use crate::model::{FilterSpec, InterpretabilityFilter};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_EDGE_CAP: usize = 20_000;
pub const DEFAULT_MIN_WEIGHT: f64 = 8400.0;
pub const DEFAULT_LIMIT: usize = 500;
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid api url {url:?}: {source}")]
    ApiUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("minimum weight must be a non-negative number, got {0}")]
    MinWeight(f64),
    #[error("unknown layout {0:?}")]
    Layout(String),
}

/// Runtime options for an [`crate::engine::Explorer`] session.
#[derive(Clone, Debug, PartialEq)]
pub struct ExplorerConfig {
    pub api_url: Url,
    pub edge_cap: usize,
    pub defaults: FilterSpec,
    pub search_limit: usize,
    pub layout: String,
    pub request_timeout: Duration,
    /// Where the canvas export is written.
    pub export_path: PathBuf,
}

/// Unvalidated options as they come from the command line.
#[derive(Clone, Debug)]
pub struct RawConfig {
    pub api_url: String,
    pub edge_cap: usize,
    pub min_weight: f64,
    pub interpretability: InterpretabilityFilter,
    pub limit: usize,
    pub search_limit: usize,
    pub layout: String,
    pub timeout_secs: u64,
    pub export_path: PathBuf,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            edge_cap: DEFAULT_EDGE_CAP,
            min_weight: DEFAULT_MIN_WEIGHT,
            interpretability: InterpretabilityFilter::All,
            limit: DEFAULT_LIMIT,
            search_limit: DEFAULT_SEARCH_LIMIT,
            layout: "circle".to_owned(),
            timeout_secs: 10,
            export_path: PathBuf::from(DEFAULT_EXPORT_FILE),
        }
    }
}

impl RawConfig {
    pub fn validate(self) -> Result<ExplorerConfig, ConfigError> {
        let api_url = Url::parse(&self.api_url).map_err(|source| ConfigError::ApiUrl {
            url: self.api_url.clone(),
            source,
        })?;

        if self.edge_cap == 0 {
            return Err(ConfigError::Zero("edge cap"));
        }
        if self.limit == 0 {
            return Err(ConfigError::Zero("limit"));
        }
        if self.search_limit == 0 {
            return Err(ConfigError::Zero("search limit"));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Zero("request timeout"));
        }
        if !self.min_weight.is_finite() || self.min_weight < 0.0 {
            return Err(ConfigError::MinWeight(self.min_weight));
        }
        if !LayoutRegistry::default().contains(&self.layout) {
            return Err(ConfigError::Layout(self.layout));
        }

        Ok(ExplorerConfig {
            api_url,
            edge_cap: self.edge_cap,
            defaults: FilterSpec::new(self.min_weight, self.interpretability, self.limit)
                .clamped(self.edge_cap),
            search_limit: self.search_limit,
            layout: self.layout,
            request_timeout: Duration::from_secs(self.timeout_secs),
            export_path: self.export_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawConfig {
        RawConfig {
            edge_cap: 1000,
            limit: 5000,
            layout: "grid".to_owned(),
            timeout_secs: 5,
            ..RawConfig::default()
        }
    }

    #[test]
    fn defaults_are_clamped_to_the_cap() {
        let config = raw().validate().expect("valid config");
        assert_eq!(config.defaults.limit, 1000);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn rejects_bad_values() {
        let bad_url = RawConfig {
            api_url: "not a url".into(),
            ..raw()
        };
        assert!(matches!(bad_url.validate(), Err(ConfigError::ApiUrl { .. })));

        let bad_weight = RawConfig {
            min_weight: -1.0,
            ..raw()
        };
        assert!(matches!(bad_weight.validate(), Err(ConfigError::MinWeight(_))));

        let bad_layout = RawConfig {
            layout: "cose".into(),
            ..raw()
        };
        assert!(matches!(bad_layout.validate(), Err(ConfigError::Layout(_))));

        let zero_cap = RawConfig {
            edge_cap: 0,
            ..raw()
        };
        assert!(matches!(zero_cap.validate(), Err(ConfigError::Zero("edge cap"))));
    }
}
