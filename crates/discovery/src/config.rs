//! Discovery configuration.
//!
//! One TOML file with a `[search]` and a `[pipeline]` table. Every field has
//! a default, so an empty file (or no file) gives a usable configuration
//! apart from the search credentials.

use image_model::{DiscoveryError, Result};
use serde::{Deserialize, Serialize};
use sources::SearchSettings;
use std::path::Path;
use std::time::Duration;

/// Source CDNs whose images are never surfaced
pub const DEFAULT_EXCLUDED_DOMAINS: [&str; 4] =
    ["fbcdn.net", "cdninstagram.com", "pinimg.com", "twimg.com"];

/// Settings for the assessment side of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Cap on the number of ranked results returned
    pub max_results: usize,
    /// Candidates to aggregate when the caller gives no target
    pub target_count: usize,
    /// Candidates assessed concurrently
    pub worker_count: usize,
    pub excluded_domains: Vec<String>,
    /// Probe candidate URLs before assessing them (strict mode only)
    pub check_reachability: bool,
    pub reachability_timeout_secs: u64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_results: 12,
            target_count: 20,
            worker_count: 8,
            excluded_domains: DEFAULT_EXCLUDED_DOMAINS.iter().map(|d| d.to_string()).collect(),
            check_reachability: false,
            reachability_timeout_secs: 5,
        }
    }
}

impl PipelineSettings {
    pub fn reachability_timeout(&self) -> Duration {
        Duration::from_secs(self.reachability_timeout_secs.max(1))
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub search: SearchSettings,
    pub pipeline: PipelineSettings,
}

impl DiscoveryConfig {
    /// Read and parse a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| {
            DiscoveryError::Config(format!("cannot read {}: {}", path.display(), err))
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|err| DiscoveryError::Config(err.to_string()))
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|err| DiscoveryError::Config(err.to_string()))
    }

    /// Check the settings every orchestrator needs.
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.worker_count == 0 {
            return Err(DiscoveryError::Config(
                "pipeline.worker_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Check the credentials the Google search client needs.
    pub fn validate_credentials(&self) -> Result<()> {
        if self.search.api_key.trim().is_empty() {
            return Err(DiscoveryError::Config("search.api_key is empty".to_string()));
        }
        if self.search.search_engine_id.trim().is_empty() {
            return Err(DiscoveryError::Config(
                "search.search_engine_id is empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = DiscoveryConfig::from_toml_str("").unwrap();
        assert_eq!(config, DiscoveryConfig::default());
        assert_eq!(config.pipeline.max_results, 12);
        assert_eq!(config.search.page_size_limit, 10);
        assert_eq!(config.search.offset_ceiling, 91);
        assert!(config.pipeline.excluded_domains.contains(&"fbcdn.net".to_string()));
    }

    #[test]
    fn test_partial_tables() {
        let config = DiscoveryConfig::from_toml_str(
            r#"
            [search]
            api_key = "k"
            search_engine_id = "cx"

            [pipeline]
            max_results = 5
            excluded_domains = []
            "#,
        )
        .unwrap();

        assert_eq!(config.search.api_key, "k");
        assert_eq!(config.search.batch_timeout_secs, 10);
        assert_eq!(config.pipeline.max_results, 5);
        assert_eq!(config.pipeline.worker_count, 8);
        assert!(config.pipeline.excluded_domains.is_empty());
        assert!(config.validate_credentials().is_ok());
    }

    #[test]
    fn test_defaults_render_and_parse_back() {
        let rendered = DiscoveryConfig::default().to_toml().unwrap();
        assert!(rendered.contains("[search]"));
        assert!(rendered.contains("[pipeline]"));
        assert_eq!(
            DiscoveryConfig::from_toml_str(&rendered).unwrap(),
            DiscoveryConfig::default()
        );
    }

    #[test]
    fn test_validation() {
        let mut config = DiscoveryConfig::default();
        assert!(config.validate().is_ok());
        assert!(matches!(
            config.validate_credentials(),
            Err(DiscoveryError::Config(_))
        ));

        config.pipeline.worker_count = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let result = DiscoveryConfig::from_toml_str("[pipeline]\nmax_results = \"many\"");
        assert!(matches!(result, Err(DiscoveryError::Config(_))));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = DiscoveryConfig::load("/nonexistent/image-scout.toml");
        assert!(matches!(result, Err(DiscoveryError::Config(_))));
    }
}
