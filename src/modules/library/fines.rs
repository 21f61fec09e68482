use chrono::NaiveDate;

/// Whole days between the due date and the return date; early or on-time
/// returns are zero.
pub fn overdue_days(due_on: NaiveDate, returned_on: NaiveDate) -> i64 {
    (returned_on - due_on).num_days().max(0)
}

/// Fine rounded to cents.
pub fn fine_for(due_on: NaiveDate, returned_on: NaiveDate, fine_per_day: f64) -> f64 {
    let fine = overdue_days(due_on, returned_on) as f64 * fine_per_day.max(0.0);
    (fine * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn test_on_time_and_early_returns_are_free() {
        assert_eq!(fine_for(d(10), d(10), 2.0), 0.0);
        assert_eq!(fine_for(d(10), d(3), 2.0), 0.0);
    }

    #[test]
    fn test_late_return_is_charged_per_day() {
        assert_eq!(overdue_days(d(10), d(13)), 3);
        assert_eq!(fine_for(d(10), d(13), 1.5), 4.5);
    }

    #[test]
    fn test_fine_rounds_to_cents() {
        assert_eq!(fine_for(d(1), d(4), 0.333), 1.0);
    }

    #[test]
    fn test_negative_rate_is_ignored() {
        assert_eq!(fine_for(d(1), d(5), -1.0), 0.0);
    }
}
