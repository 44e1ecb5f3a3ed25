//! Single-date schedule matching for locally planned tasks.
//!
//! Unlike the expander this never generates occurrences; it only answers
//! whether a schedule applies to one given date.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::time::weekday_code;

/// How a task repeats. Serialized as `{"kind": "weekly", "weeklyByDay": ["MO"]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Schedule {
    /// A single date; no date means "any day"
    Once {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        date: Option<NaiveDate>,
    },
    Daily,
    Weekly {
        /// Two-letter weekday codes
        #[serde(rename = "weeklyByDay", default)]
        by_day: Vec<String>,
    },
    /// Only `FREQ=DAILY` and a `BYDAY=` list are understood
    CustomRrule {
        #[serde(default)]
        rrule: String,
    },
}

/// Whether `schedule` applies on `date`. No schedule never matches.
pub fn occurs_on_date(schedule: Option<&Schedule>, date: NaiveDate) -> bool {
    let Some(schedule) = schedule else {
        return false;
    };
    let code = weekday_code(date.weekday());

    match schedule {
        Schedule::Once { date: planned } => planned.is_none_or(|d| d == date),
        Schedule::Daily => true,
        Schedule::Weekly { by_day } => by_day.iter().any(|d| d.trim().eq_ignore_ascii_case(code)),
        Schedule::CustomRrule { rrule } => rrule_matches(rrule, code),
    }
}

fn rrule_matches(rrule: &str, code: &str) -> bool {
    let parts: Vec<(&str, &str)> = rrule
        .split(';')
        .filter_map(|p| p.split_once('='))
        .map(|(k, v)| (k.trim(), v.trim()))
        .collect();

    let value = |key: &str| {
        parts
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| *v)
    };

    if value("FREQ").is_some_and(|f| f.eq_ignore_ascii_case("DAILY")) {
        return true;
    }

    match value("BYDAY") {
        Some(days) => days.split(',').any(|d| d.trim().eq_ignore_ascii_case(code)),
        None => false,
    }
}
