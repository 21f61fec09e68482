//! Percentages and letter grades for report cards.

/// Grade bands as (minimum percentage, grade), highest first.
pub const GRADE_BANDS: &[(f64, &str)] = &[
    (90.0, "A+"),
    (80.0, "A"),
    (70.0, "B"),
    (60.0, "C"),
    (50.0, "D"),
    (40.0, "E"),
];

pub const FAILING_GRADE: &str = "F";

/// `obtained / max` as a percentage rounded to two decimals. A zero or
/// negative maximum yields 0.
pub fn percentage(obtained: f64, max: f64) -> f64 {
    if max <= 0.0 {
        return 0.0;
    }
    (obtained / max * 10_000.0).round() / 100.0
}

pub fn grade_for(percentage: f64) -> &'static str {
    GRADE_BANDS
        .iter()
        .find(|(min, _)| percentage >= *min)
        .map_or(FAILING_GRADE, |(_, grade)| grade)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(45.0, 50.0), 90.0);
        assert_eq!(percentage(1.0, 3.0), 33.33);
        assert_eq!(percentage(10.0, 0.0), 0.0);
    }

    #[test]
    fn test_band_edges() {
        assert_eq!(grade_for(100.0), "A+");
        assert_eq!(grade_for(90.0), "A+");
        assert_eq!(grade_for(89.99), "A");
        assert_eq!(grade_for(70.0), "B");
        assert_eq!(grade_for(40.0), "E");
        assert_eq!(grade_for(39.99), "F");
        assert_eq!(grade_for(0.0), "F");
    }
}
