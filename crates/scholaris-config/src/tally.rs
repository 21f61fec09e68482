use std::time::Duration;

use crate::{env_or, env_string_or};

/// Tally accounting gateway.
#[derive(Clone, Debug)]
pub struct TallyConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl TallyConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: env_string_or("TALLY_URL", "http://localhost:9000"),
            timeout: Duration::from_secs(env_or("TALLY_TIMEOUT_SECS", 10)),
        }
    }
}
