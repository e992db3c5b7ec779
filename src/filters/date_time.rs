//! Partial RFC 3339 date/time filter.
//!
//! Accepts anything from a bare year (`2009`) to a full timestamp with offset
//! (`2008-07-01T22:35:17+08:00`) and produces the half-open UTC range covered
//! by the precision supplied. A date separator of `T` or a single space is
//! accepted; values without an offset are read as UTC.

use std::sync::LazyLock;

use chrono::{
    DateTime, Duration, FixedOffset, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};
use regex::{Captures, Regex};

use crate::error::{AppError, Result};

use super::ParameterFilter;

static PARTIAL_RFC3339: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<year>[0-9]{4})(?:-(?P<month>[0-9]{2})(?:-(?P<day>[0-9]{2})(?:[T ](?P<hour>[0-9]{2}):(?P<minute>[0-9]{2})(?::(?P<second>[0-9]{2})(?:\.(?P<fraction>[0-9]+))?)?(?P<offset>Z|[-+][0-9]{2}(?::?[0-9]{2})?)?)?)?)?$",
    )
    .expect("date/time pattern is valid")
});

/// How much of a timestamp the caller supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    Year,
    Month,
    Day,
    Minute,
    /// Seconds, with or without a fractional part. Stored timestamps have
    /// whole-second resolution, so a fraction narrows nothing further.
    Second,
}

/// Half-open `[start, end)` interval in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub precision: Precision,
}

#[cfg(test)]
impl TimeRange {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeFilter;

impl ParameterFilter for DateTimeFilter {
    type Output = TimeRange;

    fn filter(&self, raw: &str) -> Result<TimeRange> {
        parse_time_range(raw)
    }
}

fn invalid(raw: &str) -> AppError {
    AppError::BadRequest(format!("Invalid RFC 3339 date '{}'", raw))
}

fn number(caps: &Captures, name: &str) -> Option<u32> {
    caps.name(name).and_then(|m| m.as_str().parse().ok())
}

fn parse_offset(raw: &str, offset: Option<&str>) -> Result<FixedOffset> {
    let Some(offset) = offset else {
        return FixedOffset::east_opt(0).ok_or_else(|| invalid(raw));
    };
    if offset == "Z" {
        return FixedOffset::east_opt(0).ok_or_else(|| invalid(raw));
    }

    let sign = if offset.starts_with('-') { -1 } else { 1 };
    let digits: String = offset[1..].chars().filter(|c| *c != ':').collect();
    let hours: i32 = digits[..2].parse().map_err(|_| invalid(raw))?;
    let minutes: i32 = if digits.len() > 2 {
        digits[2..].parse().map_err(|_| invalid(raw))?
    } else {
        0
    };
    if hours > 23 || minutes > 59 {
        return Err(invalid(raw));
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(|| invalid(raw))
}

/// Parse a partial RFC 3339 value into the UTC range it denotes.
pub fn parse_time_range(raw: &str) -> Result<TimeRange> {
    let caps = PARTIAL_RFC3339.captures(raw).ok_or_else(|| invalid(raw))?;

    let year: i32 = caps["year"].parse().map_err(|_| invalid(raw))?;
    let month = number(&caps, "month");
    let day = number(&caps, "day");
    let hour = number(&caps, "hour");
    let minute = number(&caps, "minute");
    let second = number(&caps, "second");

    let precision = match (month, day, hour, second) {
        (None, _, _, _) => Precision::Year,
        (Some(_), None, _, _) => Precision::Month,
        (Some(_), Some(_), None, _) => Precision::Day,
        (Some(_), Some(_), Some(_), None) => Precision::Minute,
        (Some(_), Some(_), Some(_), Some(_)) => Precision::Second,
    };

    let date = NaiveDate::from_ymd_opt(year, month.unwrap_or(1), day.unwrap_or(1))
        .ok_or_else(|| invalid(raw))?;
    let time = NaiveTime::from_hms_opt(hour.unwrap_or(0), minute.unwrap_or(0), second.unwrap_or(0))
        .ok_or_else(|| invalid(raw))?;
    let local_start = NaiveDateTime::new(date, time);

    let local_end = match precision {
        Precision::Year => {
            NaiveDate::from_ymd_opt(year + 1, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0))
        }
        Precision::Month => local_start.checked_add_months(Months::new(1)),
        Precision::Day => local_start.checked_add_signed(Duration::days(1)),
        Precision::Minute => local_start.checked_add_signed(Duration::minutes(1)),
        Precision::Second => local_start.checked_add_signed(Duration::seconds(1)),
    }
    .ok_or_else(|| invalid(raw))?;

    let offset = parse_offset(raw, caps.name("offset").map(|m| m.as_str()))?;
    let to_utc = |local: NaiveDateTime| {
        offset
            .from_local_datetime(&local)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| invalid(raw))
    };

    Ok(TimeRange {
        start: to_utc(local_start)?,
        end: to_utc(local_end)?,
        precision,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_full_timestamp_with_zulu() {
        let range = parse_time_range("2009-11-05T13:15:30Z").unwrap();
        assert_eq!(range.precision, Precision::Second);
        assert_eq!(range.start, utc("2009-11-05T13:15:30Z"));
        assert_eq!(range.end, utc("2009-11-05T13:15:31Z"));
        assert!(range.contains(utc("2009-11-05T13:15:30Z")));
        assert!(!range.contains(utc("2009-11-05T13:15:31Z")));
    }

    #[test]
    fn test_offset_is_converted_to_utc() {
        let range = parse_time_range("2008-07-01T22:35:17+08:00").unwrap();
        assert_eq!(range.start, utc("2008-07-01T14:35:17Z"));

        let compact = parse_time_range("2008-07-01T22:35:17+0800").unwrap();
        assert_eq!(compact.start, range.start);

        let hours_only = parse_time_range("2008-07-01T22:35:17-03").unwrap();
        assert_eq!(hours_only.start, utc("2008-07-02T01:35:17Z"));
    }

    #[test]
    fn test_year_precision() {
        let range = parse_time_range("2009").unwrap();
        assert_eq!(range.precision, Precision::Year);
        assert_eq!(range.start, utc("2009-01-01T00:00:00Z"));
        assert_eq!(range.end, utc("2010-01-01T00:00:00Z"));
    }

    #[test]
    fn test_month_precision_handles_december() {
        let range = parse_time_range("2009-12").unwrap();
        assert_eq!(range.precision, Precision::Month);
        assert_eq!(range.end, utc("2010-01-01T00:00:00Z"));
    }

    #[test]
    fn test_day_precision() {
        let range = parse_time_range("2012-02-29").unwrap();
        assert_eq!(range.precision, Precision::Day);
        assert_eq!(range.end, utc("2012-03-01T00:00:00Z"));
    }

    #[test]
    fn test_minute_precision_with_space_separator() {
        let range = parse_time_range("2009-11-05 13:15").unwrap();
        assert_eq!(range.precision, Precision::Minute);
        assert_eq!(range.start, utc("2009-11-05T13:15:00Z"));
        assert_eq!(range.end, utc("2009-11-05T13:16:00Z"));
    }

    #[test]
    fn test_fraction_truncates_to_second() {
        let range = parse_time_range("2009-11-05T13:15:30.250Z").unwrap();
        assert_eq!(range.precision, Precision::Second);
        assert_eq!(range.start, utc("2009-11-05T13:15:30Z"));
    }

    #[test]
    fn test_rejects_malformed_values() {
        for raw in ["", "09", "2009-1", "2009-11-05T13", "yesterday", "2009-11-05T13:15:30+8"] {
            assert!(
                matches!(parse_time_range(raw), Err(AppError::BadRequest(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_out_of_range_components() {
        for raw in ["2009-13", "2009-02-30", "2009-11-05T24:00", "2009-11-05T10:00+25:00"] {
            assert!(
                matches!(parse_time_range(raw), Err(AppError::BadRequest(_))),
                "{raw} should be rejected"
            );
        }
    }
}
