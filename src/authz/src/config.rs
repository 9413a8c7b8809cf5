//! Expression handler configuration
//!
//! Environment variables read by [`HandlerConfig::from_env`]:
//! - `POSTAUTHZ_PROGRAM_CACHE` - cache compiled programs (default: true)
//! - `POSTAUTHZ_PROGRAM_CACHE_CAPACITY` - max cached programs (default: 1024)

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Configuration for [`CelExpressionHandler`](crate::CelExpressionHandler)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlerConfig {
    /// Reuse compiled programs across calls
    pub enable_program_cache: bool,

    /// Number of programs kept before the cache is flushed
    pub program_cache_capacity: usize,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            enable_program_cache: true,
            program_cache_capacity: 1024,
        }
    }
}

impl HandlerConfig {
    pub const ENV_PROGRAM_CACHE: &'static str = "POSTAUTHZ_PROGRAM_CACHE";
    pub const ENV_PROGRAM_CACHE_CAPACITY: &'static str = "POSTAUTHZ_PROGRAM_CACHE_CAPACITY";

    /// Load configuration from the environment, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let enable_program_cache = lookup(Self::ENV_PROGRAM_CACHE)
            .and_then(|s| parse_or_warn(Self::ENV_PROGRAM_CACHE, &s))
            .unwrap_or(defaults.enable_program_cache);

        let program_cache_capacity = lookup(Self::ENV_PROGRAM_CACHE_CAPACITY)
            .and_then(|s| parse_or_warn(Self::ENV_PROGRAM_CACHE_CAPACITY, &s))
            .unwrap_or(defaults.program_cache_capacity);

        Self {
            enable_program_cache,
            program_cache_capacity,
        }
    }
}

fn parse_or_warn<T: std::str::FromStr>(key: &str, raw: &str) -> Option<T> {
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid value for {}: {:?}", key, raw);
            None
        }
    }
}
