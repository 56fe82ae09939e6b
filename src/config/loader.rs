//! Configuration loader with a two-tier hierarchy: process defaults
//! (`ConfigLevel::Default`) overridden by a task-time caller-supplied
//! layer (`ConfigLevel::Override`). Grounded on the teacher's
//! `ConfigLoader`/`AetherlightConfig` shape (`config/loader.rs`), whose
//! 4-tier System→Team→Project→User resolution collapses here because
//! this system has exactly two places configuration legitimately comes
//! from: the binary's own defaults and whatever a caller passes in for
//! one task.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::validator::ConfigValidator;

/// Configuration hierarchy level. Higher wins on merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigLevel {
    Default,
    Override,
}

impl Default for ConfigLevel {
    fn default() -> Self {
        ConfigLevel::Default
    }
}

/// `execution_mode` (§6). A legacy mode is explicitly out of scope; this
/// enum exists so the option is present in config files without
/// implying a second mode is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    Gen3,
}

impl Default for ExecutionMode {
    fn default() -> Self {
        ExecutionMode::Gen3
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteSkillServiceConfig {
    pub enabled: bool,
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_s: u64,
    pub poll_interval_s: u64,
    pub max_poll_attempts: u32,
}

impl Default for RemoteSkillServiceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: String::new(),
            api_key: None,
            timeout_s: 300,
            poll_interval_s: 2,
            max_poll_attempts: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingServiceConfig {
    pub provider: String,
    pub api_key: Option<String>,
    pub dimension: u32,
}

impl Default for EmbeddingServiceConfig {
    fn default() -> Self {
        Self {
            provider: "none".into(),
            api_key: None,
            dimension: 0,
        }
    }
}

/// Complete configuration for one process (or one task override layer).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewCoreConfig {
    pub execution_mode: ExecutionMode,
    pub remote_skill_service: RemoteSkillServiceConfig,
    pub embedding_service: EmbeddingServiceConfig,
    pub clause_retry_limit: u32,
    pub reject_retry_limit: u32,
    pub per_skill_timeout_local_s: u64,
    pub per_skill_timeout_remote_s: u64,

    #[serde(skip)]
    pub level: ConfigLevel,
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Default for ReviewCoreConfig {
    fn default() -> Self {
        Self {
            execution_mode: ExecutionMode::default(),
            remote_skill_service: RemoteSkillServiceConfig::default(),
            embedding_service: EmbeddingServiceConfig::default(),
            clause_retry_limit: 2,
            reject_retry_limit: 1,
            per_skill_timeout_local_s: 60,
            per_skill_timeout_remote_s: 300,
            level: ConfigLevel::Default,
            source_path: None,
        }
    }
}

impl ReviewCoreConfig {
    /// Merges `other` on top of `self`; `other` wins field-for-field when
    /// its level is at least as high (an `Override` layer always wins
    /// over `Default`).
    pub fn merge(&mut self, other: &ReviewCoreConfig) {
        if other.level < self.level {
            return;
        }
        self.execution_mode = other.execution_mode;
        self.remote_skill_service = other.remote_skill_service.clone();
        self.embedding_service = other.embedding_service.clone();
        self.clause_retry_limit = other.clause_retry_limit;
        self.reject_retry_limit = other.reject_retry_limit;
        self.per_skill_timeout_local_s = other.per_skill_timeout_local_s;
        self.per_skill_timeout_remote_s = other.per_skill_timeout_remote_s;
        self.level = other.level;
        self.source_path.clone_from(&other.source_path);
    }
}

/// Loads a `ReviewCoreConfig` from a default-level file plus an optional
/// override-level file, merging the two.
pub struct ConfigLoader {
    default_path: PathBuf,
    override_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new(default_path: impl Into<PathBuf>) -> Self {
        Self {
            default_path: default_path.into(),
            override_path: None,
        }
    }

    pub fn with_override_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_path = Some(path.into());
        self
    }

    pub fn load(&self) -> Result<ReviewCoreConfig> {
        let mut config = match Self::load_level(&self.default_path, ConfigLevel::Default)? {
            Some(loaded) => loaded,
            None => ReviewCoreConfig::default(),
        };

        if let Some(path) = &self.override_path {
            if let Some(overrides) = Self::load_level(path, ConfigLevel::Override)? {
                config.merge(&overrides);
            }
        }

        ConfigValidator::validate(&config).map_err(|errors| Error::Configuration(errors.join("; ")))?;
        Ok(config)
    }

    fn load_level(path: &Path, level: ConfigLevel) -> Result<Option<ReviewCoreConfig>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        let mut config: ReviewCoreConfig =
            toml::from_str(&content).map_err(|e| Error::Configuration(format!("{}: {e}", path.display())))?;
        config.level = level;
        config.source_path = Some(path.to_path_buf());
        Ok(Some(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_passes_validation() {
        let config = ReviewCoreConfig::default();
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn override_level_wins_on_merge() {
        let mut base = ReviewCoreConfig::default();
        let mut over = ReviewCoreConfig::default();
        over.level = ConfigLevel::Override;
        over.clause_retry_limit = 5;
        base.merge(&over);
        assert_eq!(base.clause_retry_limit, 5);
        assert_eq!(base.level, ConfigLevel::Override);
    }

    #[test]
    fn missing_files_yield_defaults() {
        let loader = ConfigLoader::new("/nonexistent/review-core/config.toml");
        let config = loader.load().unwrap();
        assert_eq!(config.clause_retry_limit, 2);
    }
}
