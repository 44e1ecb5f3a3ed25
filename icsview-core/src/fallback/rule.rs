//! Restricted RRULE support for the fallback scanner: DAILY and WEEKLY with
//! INTERVAL, BYDAY and UNTIL.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;

use crate::date_range::QueryWindow;
use crate::time::{parse_until, resolve_wall_clock, weekday_from_code};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    Weekly,
    /// Anything else; never expanded
    Unsupported(String),
}

/// The parts of an RRULE the fallback scanner understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub freq: Option<Frequency>,
    pub interval: u32,
    pub byday: Vec<Weekday>,
    /// Inclusive upper bound on instance starts
    pub until: Option<DateTime<Utc>>,
}

/// One generated instance: its wall-clock start and the instant it maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instance {
    pub local: NaiveDateTime,
    pub start: DateTime<Utc>,
}

/// Where and how far to look for instances.
#[derive(Debug, Clone, Copy)]
pub struct Bounds {
    pub window: QueryWindow,
    /// Zone the event's wall clock runs in
    pub zone: Tz,
    /// Approximate instance length; instances starting this long before the
    /// window can still overlap it
    pub reach: Duration,
    /// Candidates examined before giving up
    pub max_instances: u16,
}

impl RecurrenceRule {
    /// Parse `FREQ=WEEKLY;INTERVAL=2;BYDAY=MO,WE;UNTIL=20250301T000000Z`.
    ///
    /// Never fails: unknown parts are ignored, a bad INTERVAL becomes 1 and
    /// a bad UNTIL is dropped. A date-only or floating UNTIL is read in
    /// `local_tz`.
    pub fn parse(rrule: &str, local_tz: Tz) -> Self {
        let parts: HashMap<String, &str> = rrule
            .split(';')
            .filter_map(|p| p.split_once('='))
            .map(|(k, v)| (k.trim().to_ascii_uppercase(), v.trim()))
            .collect();

        let freq = parts
            .get("FREQ")
            .map(|f| f.to_ascii_uppercase())
            .filter(|f| !f.is_empty())
            .map(|f| match f.as_str() {
                "DAILY" => Frequency::Daily,
                "WEEKLY" => Frequency::Weekly,
                _ => Frequency::Unsupported(f),
            });

        let interval = parts
            .get("INTERVAL")
            .and_then(|i| i.parse::<u32>().ok())
            .filter(|i| *i > 0)
            .unwrap_or(1);

        let byday = parts
            .get("BYDAY")
            .map(|days| days.split(',').filter_map(weekday_from_code).collect())
            .unwrap_or_default();

        let until = parts.get("UNTIL").and_then(|u| parse_until(u, local_tz));

        RecurrenceRule {
            freq,
            interval,
            byday,
            until,
        }
    }

    /// Instances starting from `dtstart` (wall clock in `bounds.zone`) that
    /// may overlap the window, in generation order.
    pub fn instances(&self, dtstart: NaiveDateTime, bounds: &Bounds) -> Vec<Instance> {
        match &self.freq {
            Some(Frequency::Daily) => self.daily(dtstart, bounds),
            Some(Frequency::Weekly) => self.weekly(dtstart, bounds),
            Some(Frequency::Unsupported(freq)) => {
                tracing::debug!(freq = %freq, "Fallback scanner does not expand this frequency");
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    fn is_past_until(&self, start: DateTime<Utc>) -> bool {
        self.until.is_some_and(|until| start > until)
    }

    /// `dtstart + k * interval` days for k >= 0.
    fn daily(&self, dtstart: NaiveDateTime, bounds: &Bounds) -> Vec<Instance> {
        let interval = i64::from(self.interval);
        let lower = search_floor(dtstart, bounds);

        // First k whose instance is not before `lower`'s day
        let k = (lower - dtstart).num_days() / interval;
        let mut local = dtstart + Duration::days(k * interval);

        let mut instances = Vec::new();
        for _ in 0..bounds.max_instances {
            let start = resolve_wall_clock(bounds.zone, local);
            if start >= bounds.window.end || self.is_past_until(start) {
                break;
            }
            instances.push(Instance { local, start });
            local += Duration::days(interval);
        }
        instances
    }

    /// Weeks run Sunday to Saturday. A week is used when it is a multiple of
    /// `interval` weeks after DTSTART's week.
    fn weekly(&self, dtstart: NaiveDateTime, bounds: &Bounds) -> Vec<Instance> {
        let interval = i64::from(self.interval);
        let mut by_day = if self.byday.is_empty() {
            vec![dtstart.weekday()]
        } else {
            self.byday.clone()
        };
        by_day.sort_by_key(|d| d.num_days_from_sunday());
        by_day.dedup();

        let time_of_day = dtstart.time();
        let first_week = week_start(dtstart.date());
        let mut cursor = week_start(search_floor(dtstart, bounds).date());

        let window_end = bounds.window.end.with_timezone(&bounds.zone).naive_local();
        let until = self
            .until
            .map(|u| u.with_timezone(&bounds.zone).naive_local());

        let mut instances = Vec::new();
        let mut examined: u16 = 0;

        'weeks: loop {
            let week_begins = cursor.and_time(NaiveTime::MIN);
            if week_begins >= window_end || until.is_some_and(|u| week_begins > u) {
                break;
            }

            let weeks_since_start = (cursor - first_week).num_days() / 7;
            if weeks_since_start % interval == 0 {
                for weekday in &by_day {
                    if examined >= bounds.max_instances {
                        break 'weeks;
                    }
                    examined += 1;

                    let day = cursor + Duration::days(i64::from(weekday.num_days_from_sunday()));
                    let local = day.and_time(time_of_day);
                    if local < dtstart {
                        continue;
                    }

                    let start = resolve_wall_clock(bounds.zone, local);
                    if start >= bounds.window.end || self.is_past_until(start) {
                        continue;
                    }
                    instances.push(Instance { local, start });
                }
            } else {
                examined = examined.saturating_add(1);
                if examined >= bounds.max_instances {
                    break;
                }
            }

            cursor += Duration::days(7);
        }
        instances
    }
}

/// The later of DTSTART and the window start pulled back by one instance
/// length, on the event's wall clock.
fn search_floor(dtstart: NaiveDateTime, bounds: &Bounds) -> NaiveDateTime {
    let window_start = (bounds.window.start - bounds.reach)
        .with_timezone(&bounds.zone)
        .naive_local();
    window_start.max(dtstart)
}

/// Sunday on or before `date`.
fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}
