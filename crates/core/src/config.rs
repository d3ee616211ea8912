//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. The intent is to avoid reading process-wide environment variables
//! during request handling, which can lead to inconsistent behaviour in multi-threaded runtimes
//! and test harnesses.

use crate::constants::{
    DEFAULT_GEOCODE_COUNTRY, DEFAULT_GEOCODE_TIMEOUT_SECS, DEFAULT_GEOCODE_URL,
    DEFAULT_RADIUS_KM, DEFAULT_RESULT_LIMIT, MAX_RESULT_LIMIT, WRITE_RETRY_ATTEMPTS,
};
use crate::{DirectoryError, DirectoryResult};
use std::time::Duration;

/// Settings for the external geocoding collaborator.
#[derive(Clone, Debug)]
pub struct GeocodeConfig {
    pub base_url: String,
    pub country_codes: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GEOCODE_URL.into(),
            country_codes: DEFAULT_GEOCODE_COUNTRY.into(),
            user_agent: "clindex-directory/0.1 (community clinic directory)".into(),
            timeout_secs: DEFAULT_GEOCODE_TIMEOUT_SECS,
        }
    }
}

/// Builds a [`GeocodeConfig`] from raw environment values, falling back to
/// the defaults for absent ones.
///
/// The binaries read the variables; this function only parses, so it stays
/// testable without touching the process environment.
///
/// # Errors
/// Returns `DirectoryError::InvalidArgument` if the timeout value is not a
/// positive integer.
pub fn geocode_config_from_env_values(
    base_url: Option<String>,
    country_codes: Option<String>,
    user_agent: Option<String>,
    timeout_secs: Option<String>,
) -> DirectoryResult<GeocodeConfig> {
    let defaults = GeocodeConfig::default();
    let timeout_secs = match timeout_secs {
        Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
            DirectoryError::InvalidArgument(format!(
                "Geocode timeout must be a positive integer, got {raw:?}"
            ))
        })?,
        None => defaults.timeout_secs,
    };
    Ok(GeocodeConfig {
        base_url: base_url.unwrap_or(defaults.base_url),
        country_codes: country_codes.unwrap_or(defaults.country_codes),
        user_agent: user_agent.unwrap_or(defaults.user_agent),
        timeout_secs,
    })
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    default_radius_km: f64,
    default_limit: usize,
    max_limit: usize,
    write_retry_attempts: usize,
    geocode: GeocodeConfig,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// Search defaults come from [`crate::constants`]; only the geocoding
    /// settings vary per deployment.
    ///
    /// # Errors
    /// Returns `DirectoryError::InvalidArgument` if any geocoding setting is
    /// empty or the timeout is zero.
    pub fn new(geocode: GeocodeConfig) -> DirectoryResult<Self> {
        if geocode.base_url.trim().is_empty() {
            return Err(DirectoryError::InvalidArgument(
                "Geocode base URL cannot be empty".into(),
            ));
        }
        if geocode.country_codes.trim().is_empty() {
            return Err(DirectoryError::InvalidArgument(
                "Geocode country codes cannot be empty".into(),
            ));
        }
        if geocode.user_agent.trim().is_empty() {
            return Err(DirectoryError::InvalidArgument(
                "Geocode user agent cannot be empty".into(),
            ));
        }
        if geocode.timeout_secs == 0 {
            return Err(DirectoryError::InvalidArgument(
                "Geocode timeout must be at least one second".into(),
            ));
        }

        Ok(Self {
            default_radius_km: DEFAULT_RADIUS_KM,
            default_limit: DEFAULT_RESULT_LIMIT,
            max_limit: MAX_RESULT_LIMIT,
            write_retry_attempts: WRITE_RETRY_ATTEMPTS,
            geocode,
        })
    }

    pub fn default_radius_km(&self) -> f64 {
        self.default_radius_km
    }

    pub fn default_limit(&self) -> usize {
        self.default_limit
    }

    pub fn max_limit(&self) -> usize {
        self.max_limit
    }

    pub fn write_retry_attempts(&self) -> usize {
        self.write_retry_attempts
    }

    pub fn geocode(&self) -> &GeocodeConfig {
        &self.geocode
    }

    pub fn geocode_timeout(&self) -> Duration {
        Duration::from_secs(self.geocode.timeout_secs)
    }

    /// Clamp a caller-supplied limit into `1..=max_limit`, falling back to
    /// the default when absent.
    pub fn effective_limit(&self, requested: Option<usize>) -> usize {
        match requested {
            Some(0) | None => self.default_limit,
            Some(n) => n.min(self.max_limit),
        }
    }
}
