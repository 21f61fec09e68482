use crate::{env_or, env_string_or};

/// Address the API binds to. The frontend dev proxy expects port 5001.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            host: env_string_or("HOST", "0.0.0.0"),
            port: env_or("PORT", 5001),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
