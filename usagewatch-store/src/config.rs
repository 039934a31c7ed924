//! Configuration management.
//!
//! Configuration is read from the environment. Command-line flags are
//! applied on top by the binary.

use std::time::Duration;
use tracing::{debug, info};
use usagewatch_core::{Credentials, ProviderKind};

use crate::cadence::RefreshPolicy;
use crate::error::StoreError;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default scheduler tick period in seconds.
pub const DEFAULT_TICK_SECS: u64 = 60;

// ============================================================================
// Config
// ============================================================================

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// iiNet toolbox login.
    pub iinet: Credentials,
    /// Vodafone portal login (mobile number and password).
    pub vodafone: Credentials,
    /// Listen port on all interfaces.
    pub port: u16,
    /// Release string echoed in every response.
    pub version: String,
    /// Refresh policy.
    pub policy: RefreshPolicy,
    /// Scheduler tick period.
    pub tick: Duration,
}

impl Config {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if a credential is missing or a
    /// value does not parse.
    pub fn from_env() -> Result<Self, StoreError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if a credential is missing or a
    /// value does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let iinet = Credentials::new(
            required(&lookup, "IINET_USERNAME")?,
            required(&lookup, "IINET_PASSWORD")?,
        );
        let vodafone = Credentials::new(
            required(&lookup, "VODAFONE_MOBILE_NUMBER")?,
            required(&lookup, "VODAFONE_PASSWORD")?,
        );

        let port = match optional(&lookup, "PORT") {
            Some(port) => port
                .parse()
                .map_err(|_| StoreError::Config(format!("PORT is not a valid port: {port:?}")))?,
            None => DEFAULT_PORT,
        };

        let policy = match optional(&lookup, "REFRESH_POLICY") {
            Some(policy) => policy.parse()?,
            None => RefreshPolicy::default(),
        };

        let tick_secs = match optional(&lookup, "REFRESH_TICK_SECS") {
            Some(secs) => secs.parse::<u64>().ok().filter(|s| *s > 0).ok_or_else(|| {
                StoreError::Config(format!(
                    "REFRESH_TICK_SECS must be a positive number of seconds: {secs:?}"
                ))
            })?,
            None => DEFAULT_TICK_SECS,
        };

        let config = Self {
            iinet,
            vodafone,
            port,
            version: lookup("VERSION").unwrap_or_default(),
            policy,
            tick: Duration::from_secs(tick_secs),
        };

        info!(
            port = config.port,
            version = %config.version,
            policy = %config.policy,
            tick_secs,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Returns the credentials for a provider.
    pub fn credentials(&self, provider: ProviderKind) -> &Credentials {
        match provider {
            ProviderKind::IiNet => &self.iinet,
            ProviderKind::Vodafone => &self.vodafone,
        }
    }
}

fn required<F>(lookup: &F, name: &str) -> Result<String, StoreError>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, name).ok_or_else(|| StoreError::Config(format!("{name} is not set")))
}

/// Looks up a variable, treating blank values as unset.
fn optional<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(name).filter(|v| !v.trim().is_empty());
    debug!(name, present = value.is_some(), "Config variable");
    value
}

// ============================================================================
// Tests
// ============================================================================
