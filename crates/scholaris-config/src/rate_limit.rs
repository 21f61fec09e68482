//! Rate limiting configuration.
//!
//! Two token buckets keyed by peer IP: a general one for the API and a
//! stricter one for `/api/auth` to slow down password guessing.
//!
//! - `RATE_LIMIT_ENABLED`: set to `false` to disable limiting (default `true`)
//! - `RATE_LIMIT_GENERAL_PER_SECOND` (default 2)
//! - `RATE_LIMIT_GENERAL_BURST_SIZE` (default 60)
//! - `RATE_LIMIT_AUTH_PER_SECOND` (default 10)
//! - `RATE_LIMIT_AUTH_BURST_SIZE` (default 5)

use tower_governor::governor::{GovernorConfig, GovernorConfigBuilder};
use tower_governor::key_extractor::PeerIpKeyExtractor;

use crate::env_or;

pub type PeerIpGovernorConfig =
    GovernorConfig<PeerIpKeyExtractor, ::governor::middleware::NoOpMiddleware>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// Token replenishment interval for general endpoints, in requests per second.
    pub general_per_second: u64,
    /// Maximum tokens that can accumulate for general endpoints.
    pub general_burst_size: u32,
    /// Replenishment for auth endpoints. Governor treats this as the period
    /// in seconds between tokens, so a larger number is stricter.
    pub auth_per_second: u64,
    pub auth_burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            general_per_second: 2,
            general_burst_size: 60,
            auth_per_second: 10,
            auth_burst_size: 5,
        }
    }
}

impl RateLimitConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: env_or("RATE_LIMIT_ENABLED", defaults.enabled),
            general_per_second: env_or("RATE_LIMIT_GENERAL_PER_SECOND", defaults.general_per_second),
            general_burst_size: env_or("RATE_LIMIT_GENERAL_BURST_SIZE", defaults.general_burst_size),
            auth_per_second: env_or("RATE_LIMIT_AUTH_PER_SECOND", defaults.auth_per_second),
            auth_burst_size: env_or("RATE_LIMIT_AUTH_BURST_SIZE", defaults.auth_burst_size),
        }
    }

    /// Disabled configuration used by integration tests.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Governor config for general API endpoints.
    ///
    /// Returns `None` when the values cannot form a valid bucket (zero rate
    /// or burst); the router then skips the layer.
    #[must_use]
    pub fn general_governor_config(&self) -> Option<PeerIpGovernorConfig> {
        GovernorConfigBuilder::default()
            .per_second(self.general_per_second)
            .burst_size(self.general_burst_size)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
    }

    #[must_use]
    pub fn auth_governor_config(&self) -> Option<PeerIpGovernorConfig> {
        GovernorConfigBuilder::default()
            .per_second(self.auth_per_second)
            .burst_size(self.auth_burst_size)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
    }
}
