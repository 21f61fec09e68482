use crate::env_or;

#[derive(Clone, Debug, PartialEq)]
pub struct LibraryConfig {
    /// Default loan length when an issue does not specify a due date.
    pub loan_days: i64,
    /// Fine charged per day a book is returned late.
    pub fine_per_day: f64,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            loan_days: 14,
            fine_per_day: 1.0,
        }
    }
}

impl LibraryConfig {
    pub fn from_env() -> Self {
        Self {
            loan_days: env_or("LIBRARY_LOAN_DAYS", 14),
            fine_per_day: env_or("LIBRARY_FINE_PER_DAY", 1.0),
        }
    }
}
