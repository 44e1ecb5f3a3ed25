//! Date/time values as they appear in DTSTART/DTEND, and the helpers both
//! expansion strategies use to turn them into instants.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc, Weekday};
use chrono_tz::Tz;

use crate::error::{ExpandError, ExpandResult};

/// A DTSTART/DTEND value before timezone resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IcsTime {
    /// `VALUE=DATE:20250910`
    Date(NaiveDate),
    /// `20250910T090000`, wall-clock time in the local zone
    Floating(NaiveDateTime),
    /// `20250910T090000Z`
    Utc(DateTime<Utc>),
    /// `TZID=Europe/Berlin:20250910T090000`
    Zoned { datetime: NaiveDateTime, tzid: String },
}

impl IcsTime {
    pub fn is_date(&self) -> bool {
        matches!(self, IcsTime::Date(_))
    }

    /// Wall-clock value in the zone returned by [`IcsTime::zone`].
    /// Dates become midnight.
    pub fn naive(&self) -> NaiveDateTime {
        match self {
            IcsTime::Date(d) => d.and_time(chrono::NaiveTime::MIN),
            IcsTime::Floating(dt) => *dt,
            IcsTime::Utc(dt) => dt.naive_utc(),
            IcsTime::Zoned { datetime, .. } => *datetime,
        }
    }

    /// The zone this value's wall clock belongs to. Dates and floating
    /// values live in `local_tz`.
    pub fn zone(&self, local_tz: Tz) -> ExpandResult<Tz> {
        match self {
            IcsTime::Date(_) | IcsTime::Floating(_) => Ok(local_tz),
            IcsTime::Utc(_) => Ok(Tz::UTC),
            IcsTime::Zoned { tzid, .. } => parse_tzid(tzid),
        }
    }

    /// Resolve to an instant.
    pub fn resolve(&self, local_tz: Tz) -> ExpandResult<DateTime<Utc>> {
        match self {
            IcsTime::Utc(dt) => Ok(*dt),
            other => Ok(resolve_wall_clock(other.zone(local_tz)?, other.naive())),
        }
    }

    /// Add a duration on the wall clock, keeping the variant. A date stays a
    /// date only when the duration is a whole number of days.
    pub fn add_wall_clock(&self, duration: Duration) -> IcsTime {
        match self {
            IcsTime::Date(d) if duration.num_seconds() % 86_400 == 0 => {
                IcsTime::Date(*d + Duration::days(duration.num_days()))
            }
            IcsTime::Date(_) | IcsTime::Floating(_) => IcsTime::Floating(self.naive() + duration),
            IcsTime::Utc(dt) => IcsTime::Utc(*dt + duration),
            IcsTime::Zoned { datetime, tzid } => IcsTime::Zoned {
                datetime: *datetime + duration,
                tzid: tzid.clone(),
            },
        }
    }
}

impl fmt::Display for IcsTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IcsTime::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            IcsTime::Floating(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            IcsTime::Utc(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%SZ")),
            IcsTime::Zoned { datetime, tzid } => {
                write!(f, "{} ({})", datetime.format("%Y-%m-%dT%H:%M:%S"), tzid)
            }
        }
    }
}

/// Look up an IANA zone name.
pub fn parse_tzid(tzid: &str) -> ExpandResult<Tz> {
    tzid.trim_matches('"')
        .parse::<Tz>()
        .map_err(|_| ExpandError::UnknownTimezone(tzid.to_string()))
}

/// Interpret a wall-clock value in `tz`.
///
/// Ambiguous times (DST fold) take the earlier instant. Times that do not
/// exist (DST gap) move forward by an hour; if that still fails the value is
/// read as UTC.
pub fn resolve_wall_clock(tz: Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

/// Parse an ISO 8601 duration (`P1W`, `P2DT3H`, `PT1H30M`).
pub fn parse_duration(value: &str) -> Option<Duration> {
    let parsed = iso8601::duration(value.trim()).ok()?;
    let std_duration: std::time::Duration = parsed.into();
    Duration::from_std(std_duration).ok()
}

/// Decode the `\n`, `\,` and `\;` escapes of an iCalendar text value.
pub fn unescape_text(value: &str) -> String {
    value
        .replace("\\n", "\n")
        .replace("\\N", "\n")
        .replace("\\,", ",")
        .replace("\\;", ";")
}

/// `2025-01-11T09:00:00.000Z`
pub fn to_iso_millis(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Read an RRULE UNTIL value as an instant.
///
/// `20250301T120000Z` is UTC, `20250301T120000` is wall-clock time in `tz`
/// and a bare date `20250301` covers that whole day in `tz`.
pub fn parse_until(value: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let value = value.trim();
    let (body, is_utc) = match value.strip_suffix(['Z', 'z']) {
        Some(body) => (body, true),
        None => (value, false),
    };

    let has_time = match body.len() {
        8 => false,
        15 if body.as_bytes()[8].eq_ignore_ascii_case(&b'T') => true,
        _ => return None,
    };
    let digits_ok = body
        .bytes()
        .enumerate()
        .all(|(i, b)| i == 8 || b.is_ascii_digit());
    if !digits_ok {
        return None;
    }

    let num = |from: usize, to: usize| -> Option<u32> { body.get(from..to)?.parse().ok() };
    let date = NaiveDate::from_ymd_opt(i32::try_from(num(0, 4)?).ok()?, num(4, 6)?, num(6, 8)?)?;

    if !has_time {
        let last_second = date.and_hms_opt(23, 59, 59)?;
        return Some(resolve_wall_clock(tz, last_second));
    }

    let datetime = date.and_hms_opt(num(9, 11)?, num(11, 13)?, num(13, 15)?)?;
    if is_utc {
        Some(datetime.and_utc())
    } else {
        Some(resolve_wall_clock(tz, datetime))
    }
}

pub fn weekday_code(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

/// Map a BYDAY entry to a weekday. Only the last two characters count, so
/// ordinal forms such as `1MO` or `-1FR` are accepted.
pub fn weekday_from_code(code: &str) -> Option<Weekday> {
    let code = code.trim();
    let tail = code.get(code.len().checked_sub(2)?..)?;
    match tail.to_ascii_uppercase().as_str() {
        "MO" => Some(Weekday::Mon),
        "TU" => Some(Weekday::Tue),
        "WE" => Some(Weekday::Wed),
        "TH" => Some(Weekday::Thu),
        "FR" => Some(Weekday::Fri),
        "SA" => Some(Weekday::Sat),
        "SU" => Some(Weekday::Sun),
        _ => None,
    }
}
