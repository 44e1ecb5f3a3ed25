//! Query window for occurrence expansion.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::constants::DEFAULT_WINDOW_DAYS;
use crate::time::resolve_wall_clock;

/// The half-open window `[start, end)` occurrences are matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl QueryWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        QueryWindow { start, end }
    }

    /// True when `[start, end)` shares any time with the window.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        end > self.start && start < self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Build a window from command-line style arguments.
    /// - `from`: YYYY-MM-DD (midnight in `tz`) or RFC 3339, defaults to now
    /// - `to`: same formats, defaults to DEFAULT_WINDOW_DAYS after `from`
    pub fn from_args(from: Option<&str>, to: Option<&str>, tz: Tz) -> Result<Self, String> {
        let start = match from {
            Some(s) => parse_bound(s, tz)?,
            None => Utc::now(),
        };

        let end = match to {
            Some(s) => parse_bound(s, tz)?,
            None => start + Duration::days(DEFAULT_WINDOW_DAYS),
        };

        if end <= start {
            return Err(format!("Window end '{}' is not after its start", end.to_rfc3339()));
        }

        Ok(QueryWindow { start, end })
    }
}

fn parse_bound(s: &str, tz: Tz) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
        format!("Invalid date format '{}'. Expected YYYY-MM-DD or RFC 3339", s)
    })?;
    Ok(resolve_wall_clock(tz, date.and_time(chrono::NaiveTime::MIN)))
}
