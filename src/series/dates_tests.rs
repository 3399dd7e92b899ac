#![allow(clippy::unwrap_used)]

use super::*;

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[test]
fn test_shift_months_simple() {
    assert_eq!(shift_months(d("2024-01-01"), 1), Some(d("2024-02-01")));
    assert_eq!(shift_months(d("2024-01-01"), 12), Some(d("2025-01-01")));
    assert_eq!(shift_months(d("2024-11-15"), 3), Some(d("2025-02-15")));
}

#[test]
fn test_shift_months_zero_is_identity() {
    assert_eq!(shift_months(d("2024-05-31"), 0), Some(d("2024-05-31")));
}

#[test]
fn test_shift_months_clamps_to_month_end() {
    assert_eq!(shift_months(d("2024-01-31"), 1), Some(d("2024-02-29")));
    assert_eq!(shift_months(d("2023-01-31"), 1), Some(d("2023-02-28")));
    assert_eq!(shift_months(d("2024-03-31"), 1), Some(d("2024-04-30")));
}

#[test]
fn test_days_in_month() {
    assert_eq!(days_in_month(2024, 2), 29);
    assert_eq!(days_in_month(2023, 2), 28);
    assert_eq!(days_in_month(2024, 4), 30);
    assert_eq!(days_in_month(2024, 12), 31);
}

#[test]
fn test_pin_day_within_range() {
    assert_eq!(pin_day(d("2024-06-01"), 15), d("2024-06-15"));
}

#[test]
fn test_pin_day_clamps_overflow() {
    assert_eq!(pin_day(d("2024-02-10"), 31), d("2024-02-29"));
    assert_eq!(pin_day(d("2024-04-10"), 31), d("2024-04-30"));
    assert_eq!(pin_day(d("2024-04-10"), 0), d("2024-04-01"));
}

#[test]
fn test_occurrence_does_not_drift() {
    let base = d("2024-01-31");
    assert_eq!(occurrence(base, 1, None), Some(d("2024-02-29")));
    assert_eq!(occurrence(base, 2, None), Some(d("2024-03-31")));
    assert_eq!(occurrence(base, 3, None), Some(d("2024-04-30")));
}

#[test]
fn test_occurrence_with_pinned_day() {
    let base = d("2024-01-05");
    assert_eq!(occurrence(base, 1, Some(31)), Some(d("2024-02-29")));
    assert_eq!(occurrence(base, 2, Some(31)), Some(d("2024-03-31")));
    assert_eq!(occurrence(base, 2, Some(10)), Some(d("2024-03-10")));
}
