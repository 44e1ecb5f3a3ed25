//! RRULE expansion for the primary path.
//!
//! Expands a recurring event into the occurrences that overlap a window using
//! the rrule crate.

use chrono::Utc;
use rrule::RRuleSet;

use crate::config::ExpandOptions;
use crate::date_range::QueryWindow;
use crate::error::{ExpandError, ExpandResult};
use crate::ics::EventSource;
use crate::occurrence::{Occurrence, Span};
use crate::time::{IcsTime, parse_until};

/// Build an iCalendar-format DTSTART + RRULE block for the rrule crate parser.
///
/// Floating and date-only starts are pinned to the local zone, so the rule
/// steps on the local wall clock. The rrule crate wants a UTC UNTIL next to
/// a zoned DTSTART, so date-only and floating UNTIL values are rewritten
/// into UTC instants read in DTSTART's zone.
fn build_rrule_string(event: &EventSource, rrule: &str, local_tz: chrono_tz::Tz) -> ExpandResult<String> {
    let zone = event.start.zone(local_tz)?;
    let dtstart = match &event.start {
        IcsTime::Utc(dt) => format!("DTSTART:{}", dt.format("%Y%m%dT%H%M%SZ")),
        other => format!(
            "DTSTART;TZID={}:{}",
            zone.name(),
            other.naive().format("%Y%m%dT%H%M%S")
        ),
    };

    Ok(format!("{}\nRRULE:{}", dtstart, until_as_utc(rrule, zone)))
}

/// Rewrite the rule's UNTIL part as `YYYYMMDDTHHMMSSZ`. Unreadable values
/// are left for the rrule parser to reject.
fn until_as_utc(rrule: &str, zone: chrono_tz::Tz) -> String {
    rrule
        .split(';')
        .map(|part| match part.split_once('=') {
            Some((key, value)) if key.trim().eq_ignore_ascii_case("UNTIL") => {
                match parse_until(value, zone) {
                    Some(until) => format!("UNTIL={}", until.format("%Y%m%dT%H%M%SZ")),
                    None => part.to_string(),
                }
            }
            _ => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}

/// Expand a recurring event into the occurrences overlapping `window`.
///
/// Enumeration starts `options.lookbehind` before the window so long events
/// that began earlier are still seen, stops at the first instance starting
/// at or after the window end, and examines at most `options.max_instances`
/// instances.
pub(crate) fn expand_recurring(
    event: &EventSource,
    window: &QueryWindow,
    options: &ExpandOptions,
) -> ExpandResult<Vec<Occurrence>> {
    let rrule = match &event.rrule {
        Some(r) => r,
        None => return Ok(Vec::new()),
    };

    let rrule_str = build_rrule_string(event, rrule, options.local_tz)?;

    let rrule_set: RRuleSet = rrule_str.parse().map_err(|e| {
        ExpandError::InvalidRrule(format!(
            "Failed to parse RRULE '{}' for event '{}': {}",
            rrule,
            event.uid.as_deref().unwrap_or("<no uid>"),
            e
        ))
    })?;

    let tz: rrule::Tz = Utc.into();
    let after = (window.start - options.lookbehind).with_timezone(&tz);
    let before = window.end.with_timezone(&tz);

    let result = rrule_set.after(after).before(before).all(options.max_instances);
    if result.limited {
        tracing::warn!(
            uid = event.uid.as_deref().unwrap_or_default(),
            limit = options.max_instances,
            "Recurrence expansion hit the instance limit"
        );
    }

    let span = Span::between(&event.start, &event.end_time(), options.local_tz)?;
    let template = event.template();

    let mut occurrences = Vec::new();
    for occ_dt in &result.dates {
        let start = occ_dt.with_timezone(&Utc);
        if start >= window.end {
            break;
        }

        let end = span.end_after(occ_dt.naive_local(), start);
        occurrences.extend(template.occurrence(start, end, window));
    }

    Ok(occurrences)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, NaiveDate, TimeZone};

    fn event(start: IcsTime, end: Option<IcsTime>, rrule: &str) -> EventSource {
        EventSource {
            uid: Some("rec-1".to_string()),
            summary: Some("Recurring".to_string()),
            location: None,
            start,
            end,
            duration: None,
            rrule: Some(rrule.to_string()),
            serialized_len: 100,
        }
    }

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_build_rrule_string_pins_floating_to_local_zone() {
        let naive = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let ev = event(IcsTime::Floating(naive), None, "FREQ=DAILY");
        let s = build_rrule_string(&ev, "FREQ=DAILY", chrono_tz::Europe::Paris).unwrap();
        assert_eq!(s, "DTSTART;TZID=Europe/Paris:20250101T090000\nRRULE:FREQ=DAILY");
    }

    #[test]
    fn test_until_rewritten_to_utc() {
        let paris = chrono_tz::Europe::Paris;
        assert_eq!(
            until_as_utc("FREQ=WEEKLY;UNTIL=20250210;BYDAY=MO", paris),
            "FREQ=WEEKLY;UNTIL=20250210T225959Z;BYDAY=MO"
        );
        assert_eq!(
            until_as_utc("FREQ=DAILY;until=20250110T090000", paris),
            "FREQ=DAILY;UNTIL=20250110T080000Z"
        );
        assert_eq!(
            until_as_utc("FREQ=DAILY;UNTIL=20250110T090000Z", paris),
            "FREQ=DAILY;UNTIL=20250110T090000Z"
        );
        assert_eq!(until_as_utc("FREQ=DAILY;UNTIL=later", paris), "FREQ=DAILY;UNTIL=later");
    }

    #[test]
    fn test_date_start_with_date_until() {
        let ev = event(
            IcsTime::Date(NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()),
            None,
            "FREQ=WEEKLY;UNTIL=20250120",
        );
        let window = QueryWindow::new(utc(2025, 1, 1, 0), utc(2025, 2, 1, 0));

        let occs = expand_recurring(&ev, &window, &ExpandOptions::with_timezone(chrono_tz::Tz::UTC))
            .unwrap();

        let starts: Vec<_> = occs.iter().map(|o| o.start).collect();
        assert_eq!(starts, vec![utc(2025, 1, 6, 0), utc(2025, 1, 13, 0), utc(2025, 1, 20, 0)]);
        assert!(occs.iter().all(|o| o.all_day && o.end - o.start == Duration::days(1)));
    }

    #[test]
    fn test_floating_start_with_floating_until() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 6)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let ev = event(IcsTime::Floating(start), None, "FREQ=DAILY;UNTIL=20250108T090000");
        let tz = chrono_tz::Europe::Berlin;
        let window = QueryWindow::new(utc(2025, 1, 1, 0), utc(2025, 2, 1, 0));

        let occs = expand_recurring(&ev, &window, &ExpandOptions::with_timezone(tz)).unwrap();

        let starts: Vec<_> = occs.iter().map(|o| o.start).collect();
        assert_eq!(starts, vec![utc(2025, 1, 6, 8), utc(2025, 1, 7, 8), utc(2025, 1, 8, 8)]);
    }

    #[test]
    fn test_weekly_utc_event_in_window() {
        let ev = event(
            IcsTime::Utc(utc(2025, 2, 3, 8)),
            Some(IcsTime::Utc(utc(2025, 2, 3, 9))),
            "FREQ=WEEKLY;BYDAY=MO",
        );
        let window = QueryWindow::new(utc(2025, 2, 10, 0), utc(2025, 2, 24, 0));

        let occs = expand_recurring(&ev, &window, &ExpandOptions::with_timezone(chrono_tz::Tz::UTC))
            .unwrap();

        let starts: Vec<_> = occs.iter().map(|o| o.start).collect();
        assert_eq!(starts, vec![utc(2025, 2, 10, 8), utc(2025, 2, 17, 8)]);
        assert!(occs.iter().all(|o| o.end - o.start == Duration::hours(1)));
    }

    #[test]
    fn test_long_instance_before_window_is_kept() {
        // Starts 20:00 the day before, runs 6 hours into the window
        let ev = event(
            IcsTime::Utc(utc(2025, 3, 1, 20)),
            Some(IcsTime::Utc(utc(2025, 3, 2, 2))),
            "FREQ=DAILY",
        );
        let window = QueryWindow::new(utc(2025, 3, 5, 0), utc(2025, 3, 5, 12));

        let occs = expand_recurring(&ev, &window, &ExpandOptions::with_timezone(chrono_tz::Tz::UTC))
            .unwrap();

        assert_eq!(occs.len(), 1);
        assert_eq!(occs[0].start, utc(2025, 3, 4, 20));
    }

    #[test]
    fn test_all_day_span_follows_calendar_days() {
        let ev = event(
            IcsTime::Date(NaiveDate::from_ymd_opt(2025, 3, 24).unwrap()),
            Some(IcsTime::Date(NaiveDate::from_ymd_opt(2025, 3, 25).unwrap())),
            "FREQ=WEEKLY",
        );
        // Berlin switches to summer time on 2025-03-30
        let tz = chrono_tz::Europe::Berlin;
        let window = QueryWindow::new(utc(2025, 3, 30, 0), utc(2025, 4, 1, 0));

        let occs = expand_recurring(&ev, &window, &ExpandOptions::with_timezone(tz)).unwrap();

        assert_eq!(occs.len(), 1);
        assert!(occs[0].all_day);
        // Mon 2025-03-31 00:00 CEST .. Tue 2025-04-01 00:00 CEST
        assert_eq!(occs[0].start, Utc.with_ymd_and_hms(2025, 3, 30, 22, 0, 0).unwrap());
        assert_eq!(occs[0].end, Utc.with_ymd_and_hms(2025, 3, 31, 22, 0, 0).unwrap());
    }

    #[test]
    fn test_instance_limit_bounds_output() {
        let ev = event(
            IcsTime::Utc(utc(2025, 1, 1, 0)),
            Some(IcsTime::Utc(Utc.with_ymd_and_hms(2025, 1, 1, 0, 5, 0).unwrap())),
            "FREQ=HOURLY",
        );
        let window = QueryWindow::new(utc(2025, 1, 1, 0), utc(2025, 2, 1, 0));
        let options = ExpandOptions {
            max_instances: 50,
            ..ExpandOptions::with_timezone(chrono_tz::Tz::UTC)
        };

        let occs = expand_recurring(&ev, &window, &options).unwrap();
        assert!(occs.len() <= 50);
    }

    #[test]
    fn test_unparseable_rule_is_an_error() {
        let ev = event(IcsTime::Utc(utc(2025, 1, 1, 0)), None, "FREQ=SOMETIMES");
        let window = QueryWindow::new(utc(2025, 1, 1, 0), utc(2025, 2, 1, 0));
        assert!(matches!(
            expand_recurring(&ev, &window, &ExpandOptions::with_timezone(chrono_tz::Tz::UTC)),
            Err(ExpandError::InvalidRrule(_))
        ));
    }
}
