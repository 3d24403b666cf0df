use std::sync::{OnceLock, RwLock};

use chrono::{Duration, NaiveDate, Utc};

/// Look-back window applied when no explicit date range has been set.
const DEFAULT_DAYS_BACK: i64 = 90;

#[derive(Debug, Clone)]
struct Config {
    start_date: NaiveDate,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            start_date: Utc::now().date_naive() - Duration::days(DEFAULT_DAYS_BACK),
        }
    }
}

fn config() -> &'static RwLock<Config> {
    static CONFIG: OnceLock<RwLock<Config>> = OnceLock::new();
    CONFIG.get_or_init(|| RwLock::new(Config::default()))
}

/// Set the process-wide start of the query date range.
pub fn set_date_range(start: NaiveDate) {
    config().write().expect("config lock poisoned").start_date = start;
}

/// Start of the process-wide query date range, used as the default
/// `created_after` bound when none is given explicitly.
pub fn start_date() -> NaiveDate {
    config().read().expect("config lock poisoned").start_date
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_range_roundtrip() {
        // Default is a look-back window ending today.
        let default = start_date();
        assert!(default < Utc::now().date_naive());

        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        set_date_range(start);
        assert_eq!(start_date(), start);
    }
}
