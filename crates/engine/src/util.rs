//! Internal helpers for calendar math and input normalization.
//!
//! These utilities are **not** part of the public API.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use crate::{EngineError, ResultEngine};

pub(crate) fn parse_timezone(value: &str) -> ResultEngine<Tz> {
    value
        .parse::<Tz>()
        .map_err(|_| EngineError::Validation(format!("invalid timezone: {value}")))
}

pub(crate) fn ensure_month(month: u32) -> ResultEngine<()> {
    if (1..=12).contains(&month) {
        Ok(())
    } else {
        Err(EngineError::Validation(format!(
            "month must be 1..=12, got {month}"
        )))
    }
}

/// January wraps to December of the previous year.
pub(crate) fn previous_period(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

fn first_of(year: i32, month: u32) -> ResultEngine<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| EngineError::Validation(format!("invalid period {year}-{month:02}")))
}

fn next_period(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

pub(crate) fn days_in_month(year: i32, month: u32) -> ResultEngine<u32> {
    let start = first_of(year, month)?;
    let (next_year, next_month) = next_period(year, month);
    let end = first_of(next_year, next_month)?;
    u32::try_from((end - start).num_days())
        .map_err(|_| EngineError::Validation(format!("invalid period {year}-{month:02}")))
}

/// UTC instant of local midnight on `date`.
///
/// When midnight falls into a DST gap the next valid local instant is used.
fn local_midnight_utc(tz: Tz, date: NaiveDate) -> ResultEngine<DateTime<Utc>> {
    let mut naive = date.and_time(chrono::NaiveTime::MIN);
    for _ in 0..4 {
        if let Some(local) = tz.from_local_datetime(&naive).earliest() {
            return Ok(local.with_timezone(&Utc));
        }
        naive += chrono::Duration::minutes(30);
    }
    Err(EngineError::Validation(format!(
        "no local midnight for {date} in {tz}"
    )))
}

/// Half-open UTC range covering the local calendar month.
pub(crate) fn month_bounds_utc(
    tz: Tz,
    year: i32,
    month: u32,
) -> ResultEngine<(DateTime<Utc>, DateTime<Utc>)> {
    let (next_year, next_month) = next_period(year, month);
    let start = local_midnight_utc(tz, first_of(year, month)?)?;
    let end = local_midnight_utc(tz, first_of(next_year, next_month)?)?;
    Ok((start, end))
}

/// Local calendar date of an instant.
pub(crate) fn local_date(tz: Tz, at: DateTime<Utc>) -> NaiveDate {
    at.with_timezone(&tz).date_naive()
}

/// `(year, month, day)` of an instant in the branch's calendar.
pub(crate) fn local_day(tz: Tz, at: DateTime<Utc>) -> (i32, u32, u32) {
    let date = local_date(tz, at);
    (date.year(), date.month(), date.day())
}

/// Trim free text and map blanks to `None`.
pub(crate) fn normalize_optional_text(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn january_wraps_to_previous_december() {
        assert_eq!(previous_period(2024, 1), (2023, 12));
        assert_eq!(previous_period(2024, 7), (2024, 6));
    }

    #[test]
    fn days_in_month_handles_leap_years() {
        assert_eq!(days_in_month(2024, 2).unwrap(), 29);
        assert_eq!(days_in_month(2023, 2).unwrap(), 28);
        assert_eq!(days_in_month(2024, 12).unwrap(), 31);
        assert_eq!(days_in_month(2024, 4).unwrap(), 30);
    }

    #[test]
    fn month_must_be_in_range() {
        assert!(ensure_month(0).is_err());
        assert!(ensure_month(13).is_err());
        assert!(ensure_month(12).is_ok());
    }

    #[test]
    fn local_day_uses_branch_zone() {
        let tz: Tz = "Asia/Manila".parse().unwrap();
        let at = Utc.with_ymd_and_hms(2024, 3, 31, 17, 30, 0).unwrap();
        assert_eq!(local_day(tz, at), (2024, 4, 1));
        assert_eq!(local_day(chrono_tz::UTC, at), (2024, 3, 31));
    }

    #[test]
    fn month_bounds_start_at_local_midnight() {
        let tz: Tz = "Asia/Manila".parse().unwrap();
        let (start, end) = month_bounds_utc(tz, 2024, 4).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 31, 16, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 4, 30, 16, 0, 0).unwrap());
    }

    #[test]
    fn blank_text_is_dropped() {
        assert_eq!(normalize_optional_text(Some("  ".to_string())), None);
        assert_eq!(
            normalize_optional_text(Some(" scrap ".to_string())),
            Some("scrap".to_string())
        );
    }
}
