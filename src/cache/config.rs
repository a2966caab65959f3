//! Cache configuration.

use std::time::Duration;

use serde::Deserialize;

const DEFAULT_TTL_SECONDS: u64 = 60;
const DEFAULT_REFERENCE_TTL_SECONDS: u64 = 3600;

/// Response-cache configuration from `tasmik.toml`.
///
/// `enabled` is the process-wide kill switch: when false the policy refuses
/// every request and the subsystem is inert.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// TTL tier for volatile collections (participants, assessors).
    pub default_ttl_seconds: u64,
    /// TTL tier for near-static reference data (regions).
    pub reference_ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_ttl_seconds: DEFAULT_TTL_SECONDS,
            reference_ttl_seconds: DEFAULT_REFERENCE_TTL_SECONDS,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            default_ttl_seconds: settings.default_ttl_seconds,
            reference_ttl_seconds: settings.reference_ttl_seconds,
        }
    }
}

impl CacheConfig {
    /// Default tier, clamped to at least one second.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_seconds.max(1))
    }

    /// Reference-data tier, clamped to at least one second.
    pub fn reference_ttl(&self) -> Duration {
        Duration::from_secs(self.reference_ttl_seconds.max(1))
    }
}
