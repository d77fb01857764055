//! Engine configuration
//!
//! Configuration is layered: compiled-in defaults, then an optional JSON
//! file, then `SOPGRAPH_*` environment variables.

use crate::constants::{engine, env};
use crate::error::{SopResult, SystemError};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunables for [`NodeGraphEngine`](crate::nodes::NodeGraphEngine)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Cook independent upstream branches on scoped threads
    pub parallel_branches: bool,
    /// Upper bound on threads spawned for one node's inputs
    pub max_branch_threads: usize,
    /// Collect hit/miss counters and cook timings
    pub track_statistics: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel_branches: engine::DEFAULT_PARALLEL_BRANCHES,
            max_branch_threads: engine::DEFAULT_MAX_BRANCH_THREADS,
            track_statistics: true,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json(json: &str) -> SopResult<Self> {
        serde_json::from_str(json).map_err(|e| SystemError::Config(e.to_string()).into())
    }

    pub fn from_file(path: impl AsRef<Path>) -> SopResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| SystemError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    /// Defaults, overlaid with an optional file, overlaid with the environment
    pub fn load(path: Option<&Path>) -> SopResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        debug!("Engine configuration: {:?}", config);
        Ok(config)
    }

    /// Apply `SOPGRAPH_*` overrides from `lookup`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> SopResult<()> {
        if let Some(value) = lookup(env::PARALLEL_BRANCHES) {
            self.parallel_branches = parse_flag(env::PARALLEL_BRANCHES, &value)?;
        }
        if let Some(value) = lookup(env::MAX_BRANCH_THREADS) {
            self.max_branch_threads = value.trim().parse().map_err(|_| {
                SystemError::Config(format!("{} must be a positive integer, got '{}'", env::MAX_BRANCH_THREADS, value))
            })?;
        }
        if let Some(value) = lookup(env::TRACK_STATISTICS) {
            self.track_statistics = parse_flag(env::TRACK_STATISTICS, &value)?;
        }
        self.validate()
    }

    pub fn validate(&self) -> SopResult<()> {
        if self.max_branch_threads == 0 {
            return Err(SystemError::Config("max_branch_threads must be at least 1".into()).into());
        }
        Ok(())
    }
}

fn parse_flag(key: &str, value: &str) -> SopResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(SystemError::Config(format!("{} must be a boolean, got '{}'", key, value)).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{ "parallel_branches": false }"#).unwrap();
        assert!(!config.parallel_branches);
        assert_eq!(config.max_branch_threads, engine::DEFAULT_MAX_BRANCH_THREADS);
    }

    #[test]
    fn test_environment_overrides() {
        let vars: HashMap<&str, &str> = [(env::MAX_BRANCH_THREADS, "2"), (env::PARALLEL_BRANCHES, "off")]
            .into_iter()
            .collect();
        let mut config = EngineConfig::default();
        config
            .apply_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.max_branch_threads, 2);
        assert!(!config.parallel_branches);
    }

    #[test]
    fn test_zero_threads_rejected() {
        let mut config = EngineConfig::default();
        let result = config.apply_overrides(|k| (k == env::MAX_BRANCH_THREADS).then(|| "0".to_string()));
        assert!(result.is_err());
    }
}
