//! The expander's output type, and the pieces of occurrence construction
//! shared by the primary and fallback paths.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_TIMED_DURATION_HOURS, NO_TITLE};
use crate::date_range::QueryWindow;
use crate::error::ExpandResult;
use crate::time::{IcsTime, resolve_wall_clock, to_iso_millis};

/// One concrete instance of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    pub uid: String,
    pub summary: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub all_day: bool,
    pub location: String,
}

impl Occurrence {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Per-event data every occurrence of that event shares.
#[derive(Debug, Clone)]
pub(crate) struct EventTemplate {
    pub uid: Option<String>,
    pub summary: Option<String>,
    pub location: Option<String>,
    pub all_day: bool,
    /// Mixed into synthesized UIDs
    pub discriminator: usize,
}

impl EventTemplate {
    /// Build the occurrence at `[start, end)` if it overlaps the window.
    pub fn occurrence(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        window: &QueryWindow,
    ) -> Option<Occurrence> {
        if !window.overlaps(start, end) {
            return None;
        }

        let uid = match &self.uid {
            Some(uid) if !uid.is_empty() => uid.clone(),
            _ => synthesize_uid(&start, self.discriminator),
        };
        let summary = match &self.summary {
            Some(s) if !s.is_empty() => s.clone(),
            _ => NO_TITLE.to_string(),
        };

        Some(Occurrence {
            uid,
            summary,
            start,
            end,
            all_day: self.all_day,
            location: self.location.clone().unwrap_or_default(),
        })
    }
}

/// UID for events without one. Not unique: two events starting together
/// with the same discriminator collide.
pub(crate) fn synthesize_uid(start: &DateTime<Utc>, discriminator: usize) -> String {
    format!("{}-{}", to_iso_millis(start), discriminator)
}

/// Keep `end` only when it is after `start`; otherwise one hour.
pub(crate) fn ensure_end(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> DateTime<Utc> {
    match end {
        Some(end) if end > start => end,
        _ => start + Duration::hours(DEFAULT_TIMED_DURATION_HOURS),
    }
}

/// How a recurring instance's end follows from its start. Computed once
/// per event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Span {
    /// Whole days on the local wall clock (all-day events)
    Days { days: i64, tz: Tz },
    Exact(Duration),
}

impl Span {
    pub fn between(start: &IcsTime, end: &IcsTime, local_tz: Tz) -> ExpandResult<Self> {
        if start.is_date() && end.is_date() {
            let days = (end.naive().date() - start.naive().date()).num_days();
            return Ok(Span::Days {
                days: days.max(1),
                tz: local_tz,
            });
        }

        let start = start.resolve(local_tz)?;
        let end = ensure_end(start, Some(end.resolve(local_tz)?));
        Ok(Span::Exact(end - start))
    }

    /// Rough length, for widening search bounds.
    pub fn approx(&self) -> Duration {
        match self {
            Span::Days { days, .. } => Duration::days(*days),
            Span::Exact(duration) => *duration,
        }
    }

    /// End of an instance starting at `start`, whose wall-clock start is
    /// `local_start`.
    pub fn end_after(&self, local_start: NaiveDateTime, start: DateTime<Utc>) -> DateTime<Utc> {
        let end = match self {
            Span::Days { days, tz } => resolve_wall_clock(*tz, local_start + Duration::days(*days)),
            Span::Exact(duration) => start + *duration,
        };
        ensure_end(start, Some(end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn window() -> QueryWindow {
        QueryWindow::new(
            Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 2, 0, 0, 0).unwrap(),
        )
    }

    fn template() -> EventTemplate {
        EventTemplate {
            uid: None,
            summary: None,
            location: None,
            all_day: false,
            discriminator: 42,
        }
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        let occ = template()
            .occurrence(start, start + Duration::hours(1), &window())
            .unwrap();

        assert_eq!(occ.uid, "2025-03-01T10:00:00.000Z-42");
        assert_eq!(occ.summary, NO_TITLE);
        assert_eq!(occ.location, "");
    }

    #[test]
    fn test_outside_window_is_dropped() {
        let start = Utc.with_ymd_and_hms(2025, 3, 2, 0, 0, 0).unwrap();
        assert!(
            template()
                .occurrence(start, start + Duration::hours(1), &window())
                .is_none()
        );
    }

    #[test]
    fn test_ensure_end_replaces_invalid_end() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        assert_eq!(ensure_end(start, None), start + Duration::hours(1));
        assert_eq!(ensure_end(start, Some(start)), start + Duration::hours(1));
        assert_eq!(
            ensure_end(start, Some(start - Duration::hours(3))),
            start + Duration::hours(1)
        );
        assert_eq!(
            ensure_end(start, Some(start + Duration::minutes(15))),
            start + Duration::minutes(15)
        );
    }

    #[test]
    fn test_all_day_end_not_after_start_spans_one_day() {
        let day = IcsTime::Date(chrono::NaiveDate::from_ymd_opt(2025, 9, 10).unwrap());
        let earlier = IcsTime::Date(chrono::NaiveDate::from_ymd_opt(2025, 9, 8).unwrap());
        let tz = Tz::UTC;

        assert_eq!(Span::between(&day, &day, tz).unwrap(), Span::Days { days: 1, tz });
        assert_eq!(Span::between(&day, &earlier, tz).unwrap(), Span::Days { days: 1, tz });

        let begin = day.resolve(tz).unwrap();
        let span = Span::between(&day, &day, tz).unwrap();
        assert_eq!(span.end_after(day.naive(), begin) - begin, Duration::days(1));
    }

    #[test]
    fn test_span_of_all_day_event_tracks_dst() {
        let start = IcsTime::Date(chrono::NaiveDate::from_ymd_opt(2025, 3, 29).unwrap());
        let end = IcsTime::Date(chrono::NaiveDate::from_ymd_opt(2025, 3, 31).unwrap());
        let tz = chrono_tz::Europe::Berlin;
        let span = Span::between(&start, &end, tz).unwrap();
        assert_eq!(span, Span::Days { days: 2, tz });

        let local = start.naive();
        let begin = start.resolve(tz).unwrap();
        // 47 hours: the night of 2025-03-30 is an hour short
        assert_eq!(span.end_after(local, begin) - begin, Duration::hours(47));
    }

    #[test]
    fn test_span_of_timed_event_is_exact() {
        let start = IcsTime::Utc(Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap());
        let end = IcsTime::Utc(Utc.with_ymd_and_hms(2025, 3, 1, 10, 45, 0).unwrap());
        let span = Span::between(&start, &end, Tz::UTC).unwrap();
        assert_eq!(span, Span::Exact(Duration::minutes(45)));
    }

    #[test]
    fn test_serializes_camel_case() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        let occ = template()
            .occurrence(start, start + Duration::hours(1), &window())
            .unwrap();
        let json = serde_json::to_value(&occ).unwrap();
        assert_eq!(json["allDay"], false);
        assert_eq!(json["start"], "2025-03-01T10:00:00Z");
    }
}
