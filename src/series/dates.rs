use chrono::{Datelike, Months, NaiveDate};

/// `date` moved forward `months` calendar months. Days past the end of the
/// target month clamp to its last day (Jan 31 + 1 → Feb 28/29).
pub(crate) fn shift_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}

pub(crate) fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map_or(28, |last| last.day())
}

/// Same month as `date`, day set to `day` clamped into the month's range.
pub(crate) fn pin_day(date: NaiveDate, day: u32) -> NaiveDate {
    let day = day.clamp(1, days_in_month(date.year(), date.month()));
    date.with_day(day).unwrap_or(date)
}

/// The `i`-th monthly occurrence after `base`, optionally pinned to `day`.
/// Always computed from `base`, so short months never drift the series.
pub(crate) fn occurrence(base: NaiveDate, i: u32, day: Option<u32>) -> Option<NaiveDate> {
    let shifted = shift_months(base, i)?;
    Some(match day {
        Some(d) => pin_day(shifted, d),
        None => shifted,
    })
}

#[cfg(test)]
#[path = "dates_tests.rs"]
mod tests;
