//! Property-based tests for machine_core.
//!
//! Deadline resolution must keep `deadline > created_at` for every label and
//! fallback duration a generator or a command can hand us.

use chrono::{Duration, TimeZone, Utc};
use machine_core::{parse_deadline_days, resolve_deadline};
use proptest::prelude::*;

proptest! {
    #[test]
    fn deadline_always_after_creation(label in ".{0,24}", fallback in 0u32..10_000) {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let deadline = resolve_deadline(&label, fallback, now);
        prop_assert!(deadline > now);
    }

    #[test]
    fn leading_day_count_is_parsed(days in 1u32..1000, suffix in "[ a-zA-Zé]{0,12}") {
        let label = format!("{}{}", days, suffix);
        prop_assert_eq!(parse_deadline_days(&label), Some(days));
    }

    #[test]
    fn label_days_override_fallback(days in 1u32..60, fallback in 1u32..500) {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let deadline = resolve_deadline(&format!("{} jours", days), fallback, now);
        prop_assert_eq!(deadline, now + Duration::days(days as i64));
    }

    #[test]
    fn labels_without_leading_digits_fall_back(label in "[a-zA-Z ]{0,16}", fallback in 1u32..500) {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let deadline = resolve_deadline(&label, fallback, now);
        prop_assert_eq!(deadline, now + Duration::hours(fallback as i64));
    }
}
