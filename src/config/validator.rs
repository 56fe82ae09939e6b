//! Configuration validation, kept as its own module so it can be called
//! both from `ConfigLoader::load` and independently by callers assembling
//! a config programmatically. Grounded on the teacher's `ConfigValidator`
//! (`config/validator.rs`): collect every violation rather than failing
//! on the first.

use super::loader::{ConfigLevel, ReviewCoreConfig};

pub type ValidationResult = Result<(), Vec<String>>;

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &ReviewCoreConfig) -> ValidationResult {
        let mut errors = Vec::new();

        if config.remote_skill_service.enabled {
            if config.remote_skill_service.base_url.is_empty() {
                errors.push("remote_skill_service.base_url cannot be empty when enabled".into());
            } else if !config.remote_skill_service.base_url.starts_with("http://")
                && !config.remote_skill_service.base_url.starts_with("https://")
            {
                errors.push(format!(
                    "remote_skill_service.base_url must start with 'http://' or 'https://', got '{}'",
                    config.remote_skill_service.base_url
                ));
            }
            if config.remote_skill_service.timeout_s == 0 {
                errors.push("remote_skill_service.timeout_s must be greater than 0".into());
            }
            if config.remote_skill_service.max_poll_attempts == 0 {
                errors.push("remote_skill_service.max_poll_attempts must be greater than 0".into());
            }
        }

        if config.embedding_service.dimension > 0 && config.embedding_service.provider == "none" {
            errors.push("embedding_service.dimension is set but provider is 'none'".into());
        }

        if config.clause_retry_limit == 0 {
            errors.push("clause_retry_limit must be at least 1".into());
        }

        if config.per_skill_timeout_local_s == 0 {
            errors.push("per_skill_timeout_local_s must be greater than 0".into());
        }
        if config.per_skill_timeout_remote_s == 0 {
            errors.push("per_skill_timeout_remote_s must be greater than 0".into());
        }
        if config.per_skill_timeout_remote_s < config.per_skill_timeout_local_s {
            errors.push(format!(
                "per_skill_timeout_remote_s ({}) should be >= per_skill_timeout_local_s ({})",
                config.per_skill_timeout_remote_s, config.per_skill_timeout_local_s
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// An `Override` layer submitted by an untrusted caller gets an extra
    /// check: it may not silently disable retries.
    pub fn validate_for_level(config: &ReviewCoreConfig, level: ConfigLevel) -> ValidationResult {
        let mut errors = Self::validate(config).err().unwrap_or_default();
        if level == ConfigLevel::Override && config.reject_retry_limit == 0 && config.clause_retry_limit == 0 {
            errors.push("override config disables both retry limits".into());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ConfigValidator::validate(&ReviewCoreConfig::default()).is_ok());
    }

    #[test]
    fn remote_service_requires_base_url() {
        let mut config = ReviewCoreConfig::default();
        config.remote_skill_service.enabled = true;
        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("base_url")));
    }

    #[test]
    fn remote_service_rejects_bad_scheme() {
        let mut config = ReviewCoreConfig::default();
        config.remote_skill_service.enabled = true;
        config.remote_skill_service.base_url = "ftp://example.com".into();
        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("http://")));
    }

    #[test]
    fn zero_clause_retry_limit_is_rejected() {
        let mut config = ReviewCoreConfig::default();
        config.clause_retry_limit = 0;
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn all_violations_collected_at_once() {
        let mut config = ReviewCoreConfig::default();
        config.remote_skill_service.enabled = true;
        config.remote_skill_service.timeout_s = 0;
        config.clause_retry_limit = 0;
        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert!(errors.len() >= 3);
    }
}
