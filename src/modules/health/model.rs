use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// `ok` when the database answered, `degraded` otherwise
    pub status: String,
    pub database: bool,
    pub version: String,
}

impl HealthResponse {
    pub fn from_ping(database: bool) -> Self {
        Self {
            status: if database { "ok" } else { "degraded" }.to_string(),
            database,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_follows_database_ping() {
        assert_eq!(HealthResponse::from_ping(true).status, "ok");
        let down = HealthResponse::from_ping(false);
        assert_eq!(down.status, "degraded");
        assert!(!down.database);
        assert_eq!(down.version, env!("CARGO_PKG_VERSION"));
    }
}
