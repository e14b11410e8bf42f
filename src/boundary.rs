//! Calendar boundary math for date-based rotation.

use chrono::format::{Item, StrftimeItems};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::error::RollError;

/// The calendar granularity that date-based rotation aligns to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RollPoint {
    /// Start of every minute.
    TopOfMinute,
    /// Start of every hour.
    TopOfHour,
    /// Midnight and noon.
    HalfDay,
    /// Midnight.
    TopOfDay,
    /// Midnight of the first day of the week (Sunday).
    TopOfWeek,
    /// Midnight of the first day of the month.
    TopOfMonth,
}

impl RollPoint {
    /// Every granularity, finest first; the order [`infer_roll_point`]
    /// probes in.
    pub(crate) const ALL: [RollPoint; 6] = [
        RollPoint::TopOfMinute,
        RollPoint::TopOfHour,
        RollPoint::HalfDay,
        RollPoint::TopOfDay,
        RollPoint::TopOfWeek,
        RollPoint::TopOfMonth,
    ];
}

/// Check that `pattern` is a well-formed strftime string.
///
/// Done once at activation so later calls to [`suffix`] cannot fail.
pub(crate) fn validate_pattern(pattern: &str) -> Result<(), RollError> {
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(RollError::InvalidDatePattern {
            pattern: pattern.to_owned(),
        });
    }
    Ok(())
}

/// Format `t` with an already-validated date pattern.
pub(crate) fn suffix(t: NaiveDateTime, pattern: &str) -> String {
    t.format(pattern).to_string()
}

/// Infer which granularity a date pattern is able to distinguish.
///
/// Probes the Unix epoch: formats it once, then formats the next boundary of
/// each granularity in turn, finest first, and returns the first one whose
/// string differs. `None` means the pattern never changes and date rotation
/// can never fire.
pub(crate) fn infer_roll_point(pattern: &str) -> Option<RollPoint> {
    let epoch = NaiveDateTime::default();
    let formatted_epoch = suffix(epoch, pattern);
    RollPoint::ALL
        .iter()
        .copied()
        .find(|&roll_point| suffix(next_boundary(epoch, roll_point), pattern) != formatted_epoch)
}

/// The boundary instant strictly after `t` for `roll_point`.
///
/// Truncates below the granularity before advancing, so results are always
/// aligned: top-of-hour outputs have zero minutes and seconds, and so on.
pub(crate) fn next_boundary(t: NaiveDateTime, roll_point: RollPoint) -> NaiveDateTime {
    let midnight = t.date().and_time(NaiveTime::MIN);
    let day_seconds = i64::from(t.time().num_seconds_from_midnight());
    match roll_point {
        RollPoint::TopOfMinute => midnight + Duration::minutes(day_seconds / 60 + 1),
        RollPoint::TopOfHour => midnight + Duration::hours(day_seconds / 3600 + 1),
        RollPoint::HalfDay => {
            if t.time().hour() >= 12 {
                midnight + Duration::days(1)
            } else {
                midnight + Duration::hours(12)
            }
        }
        RollPoint::TopOfDay => midnight + Duration::days(1),
        RollPoint::TopOfWeek => {
            midnight + Duration::days(7 - i64::from(t.weekday().num_days_from_sunday()))
        }
        RollPoint::TopOfMonth => {
            midnight + Duration::days(days_in_month(t.date()) - i64::from(t.day()) + 1)
        }
    }
}

fn days_in_month(date: NaiveDate) -> i64 {
    match date.month() {
        2 if date.leap_year() => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}
