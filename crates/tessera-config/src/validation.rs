//! Semantic checks on a loaded [`AppConfig`].
//!
//! Every problem is collected instead of stopping at the first, so a bad
//! deployment reports all of them at once.

use crate::{AppConfig, RedisConfig};
use std::fmt;
use tessera_core::telemetry::LogConfig;
use url::Url;

/// A single problem found in the configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    /// `redis.pool_size` is zero.
    EmptyPool,
    /// `redis.pool_size` is above the supported ceiling.
    PoolSizeTooLarge { value: usize, maximum: usize },
    /// `redis.url` does not parse or uses another scheme.
    InvalidRedisUrl { url: String, reason: String },
    /// A timeout is set to zero seconds.
    ZeroTimeout { name: &'static str },
    /// `logging.level` is not a tracing level.
    InvalidLogLevel { value: String },
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPool => write!(f, "Redis pool size must be at least 1"),
            Self::PoolSizeTooLarge { value, maximum } => {
                write!(f, "Redis pool size {} is above the limit of {}", value, maximum)
            }
            Self::InvalidRedisUrl { url, reason } => {
                write!(f, "Redis URL '{}' rejected: {}", url, reason)
            }
            Self::ZeroTimeout { name } => write!(f, "'{}' must be at least 1 second", name),
            Self::InvalidLogLevel { value } => write!(
                f,
                "Log level '{}' is not one of {}",
                value,
                ConfigValidator::LOG_LEVELS.join(", ")
            ),
        }
    }
}

impl std::error::Error for ConfigValidationError {}

/// Validates an [`AppConfig`] after loading.
pub struct ConfigValidator;

impl ConfigValidator {
    const MAX_POOL_SIZE: usize = 1000;
    const LOG_LEVELS: &'static [&'static str] = &["trace", "debug", "info", "warn", "error"];

    /// Check the whole configuration, returning every problem found.
    pub fn validate(config: &AppConfig) -> Result<(), Vec<ConfigValidationError>> {
        let mut errors = Vec::new();

        Self::check_redis(&config.redis, &mut errors);
        Self::check_logging(&config.logging, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    // Skipped entirely when Redis is disabled; the in-process store needs
    // none of these settings.
    fn check_redis(config: &RedisConfig, errors: &mut Vec<ConfigValidationError>) {
        if !config.enabled {
            return;
        }

        let reason = match Url::parse(&config.url) {
            Ok(url) if matches!(url.scheme(), "redis" | "rediss") => None,
            Ok(url) => Some(format!("scheme '{}' is not redis or rediss", url.scheme())),
            Err(e) => Some(e.to_string()),
        };
        if let Some(reason) = reason {
            errors.push(ConfigValidationError::InvalidRedisUrl {
                url: config.url.clone(),
                reason,
            });
        }

        match config.pool_size {
            0 => errors.push(ConfigValidationError::EmptyPool),
            size if size > Self::MAX_POOL_SIZE => {
                errors.push(ConfigValidationError::PoolSizeTooLarge {
                    value: size,
                    maximum: Self::MAX_POOL_SIZE,
                });
            }
            _ => {}
        }

        if config.connect_timeout_secs == 0 {
            errors.push(ConfigValidationError::ZeroTimeout {
                name: "redis.connect_timeout_secs",
            });
        }
    }

    fn check_logging(config: &LogConfig, errors: &mut Vec<ConfigValidationError>) {
        if !Self::LOG_LEVELS.contains(&config.level.to_lowercase().as_str()) {
            errors.push(ConfigValidationError::InvalidLogLevel {
                value: config.level.clone(),
            });
        }
    }
}

/// Render validation errors as a numbered list.
pub fn format_validation_errors(errors: &[ConfigValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .fold(String::from("Invalid configuration:\n"), |mut out, (i, error)| {
            out.push_str(&format!("  {}. {}\n", i + 1, error));
            out
        })
}
