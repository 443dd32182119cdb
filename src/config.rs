//! Engine configuration
//!
//! Every field has a default, so an empty JSON object or YAML document is a
//! valid configuration.

use crate::algo::{EigenvectorConfig, LouvainConfig};
use crate::error::{MapError, MapResult};
use crate::layout::LayoutStrategy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub analytics: AnalyticsConfig,
    pub offload: OffloadConfig,
    pub layout: LayoutConfig,
}

/// Metrics pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalyticsConfig {
    pub eigenvector: EigenvectorConfig,
    pub louvain: LouvainConfig,
    /// Size of `mostCentralNodes`
    pub top_central_nodes: usize,
    /// Size of `mostConnectedClusters`
    pub top_clusters: usize,
    /// Upper bound on reported bottlenecks
    pub max_bottlenecks: usize,
    /// Upper bound on reported collaboration opportunities
    pub max_collaboration_opportunities: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            eigenvector: EigenvectorConfig::default(),
            louvain: LouvainConfig::default(),
            top_central_nodes: 10,
            top_clusters: 5,
            max_bottlenecks: 5,
            max_collaboration_opportunities: 10,
        }
    }
}

/// Background execution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OffloadConfig {
    /// Disable to always compute on the caller's thread
    pub enabled: bool,
    /// Graphs with more nodes than this are offloaded
    pub node_threshold: usize,
    /// Bounded request queue of the background worker
    pub channel_capacity: usize,
    /// Force-directed iteration cap for the synchronous retry
    pub fallback_force_iterations: usize,
    /// Eigenvector iteration cap for the synchronous retry
    pub fallback_eigenvector_iterations: usize,
}

impl Default for OffloadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            node_threshold: 100,
            channel_capacity: 64,
            fallback_force_iterations: 50,
            fallback_eigenvector_iterations: 20,
        }
    }
}

/// Layout defaults used when a caller names only a strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub default_strategy: LayoutStrategy,
    pub seed: u64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            default_strategy: LayoutStrategy::ForceDirected,
            seed: 42,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> MapResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(yaml: &str) -> MapResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file
    pub fn from_path(path: impl AsRef<Path>) -> MapResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&raw),
            Some("json") => Self::from_json_str(&raw),
            other => Err(MapError::InvalidConfig(format!(
                "unsupported config extension: {:?}",
                other
            ))),
        }
    }

    pub fn validate(&self) -> MapResult<()> {
        let a = &self.analytics;
        if a.top_central_nodes == 0 || a.top_clusters == 0 {
            return Err(MapError::InvalidConfig(
                "top-N summary sizes must be at least 1".to_string(),
            ));
        }
        if a.eigenvector.tolerance.is_nan() || a.eigenvector.tolerance < 0.0 {
            return Err(MapError::InvalidConfig(
                "eigenvector tolerance must be a non-negative number".to_string(),
            ));
        }
        if self.offload.node_threshold == 0 {
            return Err(MapError::InvalidConfig(
                "offload node threshold must be at least 1".to_string(),
            ));
        }
        if self.offload.channel_capacity == 0 {
            return Err(MapError::InvalidConfig(
                "offload channel capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.analytics.eigenvector.max_iterations, 100);
        assert_eq!(config.offload.node_threshold, 100);
        assert!(config.offload.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json_str(
            r#"{"analytics": {"topCentralNodes": 3, "eigenvector": {"maxIterations": 7}}}"#,
        )
        .unwrap();
        assert_eq!(config.analytics.top_central_nodes, 3);
        assert_eq!(config.analytics.eigenvector.max_iterations, 7);
        assert_eq!(config.analytics.top_clusters, 5);
        assert_eq!(config.offload.node_threshold, 100);
    }

    #[test]
    fn test_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "offload:\n  nodeThreshold: 250\nlayout:\n  defaultStrategy: grid").unwrap();

        let config = EngineConfig::from_path(file.path()).unwrap();
        assert_eq!(config.offload.node_threshold, 250);
        assert_eq!(config.layout.default_strategy, LayoutStrategy::Grid);
    }

    #[test]
    fn test_validate_rejects_zero_threshold() {
        let err = EngineConfig::from_json_str(r#"{"offload": {"nodeThreshold": 0}}"#).unwrap_err();
        assert!(matches!(err, MapError::InvalidConfig(_)));
    }

    #[test]
    fn test_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        assert!(matches!(
            EngineConfig::from_path(file.path()),
            Err(MapError::InvalidConfig(_))
        ));
    }
}
