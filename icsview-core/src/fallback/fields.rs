//! Text-level VEVENT extraction: block splitting, unfolding and property
//! matching without a full RFC 5545 parser.

use std::sync::LazyLock;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::constants::DEFAULT_TIMED_DURATION_HOURS;
use crate::error::{ExpandError, ExpandResult};
use crate::time::{IcsTime, parse_duration, unescape_text};

static BLOCK_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\nBEGIN:VEVENT\r?\n").expect("valid regex"));
static BLOCK_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\nEND:VEVENT").expect("valid regex"));
static FOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r?\n[ \t]").expect("valid regex"));
static DATE_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{4})([0-9]{2})([0-9]{2})(?:T([0-9]{2})([0-9]{2})([0-9]{2})(Z)?)?")
        .expect("valid regex")
});

/// Everything after each `BEGIN:VEVENT` line, cut at its `END:VEVENT`.
pub fn split_blocks(content: &str) -> Vec<&str> {
    BLOCK_START
        .split(content)
        .skip(1)
        .map(|block| BLOCK_END.split(block).next().unwrap_or_default())
        .collect()
}

/// Join folded continuation lines back onto their logical line.
pub fn unfold(block: &str) -> String {
    FOLD.replace_all(block, "").into_owned()
}

/// A property line split into its parameter section and value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawProperty<'a> {
    pub params: &'a str,
    pub value: &'a str,
}

impl RawProperty<'_> {
    fn param(&self, key: &str) -> Option<&str> {
        self.params
            .split(';')
            .filter_map(|p| p.split_once('='))
            .find(|(k, _)| k.trim().eq_ignore_ascii_case(key))
            .map(|(_, v)| v.trim().trim_matches('"'))
    }
}

/// First property line named `name` (case-insensitive) in an unfolded block.
pub fn find_property<'a>(unfolded: &'a str, name: &str) -> Option<RawProperty<'a>> {
    unfolded.lines().find_map(|line| {
        let line = line.trim_end_matches('\r');
        let head = line.get(..name.len())?;
        if !head.eq_ignore_ascii_case(name) {
            return None;
        }

        let rest = &line[name.len()..];
        if let Some(value) = rest.strip_prefix(':') {
            return Some(RawProperty { params: "", value });
        }

        // NAME;PARAM=...;PARAM="a:b":value
        let params = rest.strip_prefix(';')?;
        let mut in_quotes = false;
        for (i, c) in params.char_indices() {
            match c {
                '"' => in_quotes = !in_quotes,
                ':' if !in_quotes => {
                    return Some(RawProperty {
                        params: &params[..i],
                        value: &params[i + 1..],
                    });
                }
                _ => {}
            }
        }
        None
    })
}

/// Text value with escapes decoded; `None` when absent or empty.
pub fn text_property(unfolded: &str, name: &str) -> Option<String> {
    find_property(unfolded, name)
        .map(|p| unescape_text(p.value.trim()))
        .filter(|s| !s.is_empty())
}

/// Parse a DTSTART/DTEND-style value.
///
/// `VALUE=DATE:20250910` and bare `20250910` are dates, `20250910T090000Z`
/// is UTC, anything else with a time is floating. A TZID is not resolved:
/// such values are floating too.
pub fn parse_date_time(prop: &RawProperty<'_>) -> ExpandResult<IcsTime> {
    let caps = DATE_TIME
        .captures(prop.value.trim())
        .ok_or_else(|| ExpandError::InvalidTime(prop.value.to_string()))?;

    let num = |i: usize| -> u32 { caps.get(i).map_or(0, |m| m.as_str().parse().unwrap_or(0)) };
    let invalid = || ExpandError::InvalidTime(prop.value.to_string());

    let date = NaiveDate::from_ymd_opt(num(1) as i32, num(2), num(3)).ok_or_else(invalid)?;

    if caps.get(4).is_none() || prop.param("VALUE").is_some_and(|v| v.eq_ignore_ascii_case("DATE")) {
        return Ok(IcsTime::Date(date));
    }

    let datetime: NaiveDateTime = date.and_hms_opt(num(4), num(5), num(6)).ok_or_else(invalid)?;

    if caps.get(7).is_some() {
        Ok(IcsTime::Utc(datetime.and_utc()))
    } else {
        Ok(IcsTime::Floating(datetime))
    }
}

/// The properties of one VEVENT block the fallback scanner uses.
#[derive(Debug, Clone)]
pub struct BlockFields {
    pub uid: Option<String>,
    pub summary: Option<String>,
    pub location: Option<String>,
    pub start: IcsTime,
    pub end: Option<IcsTime>,
    pub duration: Option<Duration>,
    pub rrule: Option<String>,
    /// Length of the unfolded block text
    pub text_len: usize,
}

impl BlockFields {
    /// Extract fields from an unfolded block. Fails when DTSTART is missing
    /// or unreadable; a broken DTEND is treated as absent.
    pub fn extract(unfolded: &str) -> ExpandResult<Self> {
        let start = find_property(unfolded, "DTSTART")
            .ok_or_else(|| ExpandError::InvalidTime("missing DTSTART".into()))
            .and_then(|p| parse_date_time(&p))?;

        let end = find_property(unfolded, "DTEND").and_then(|p| parse_date_time(&p).ok());
        let duration = find_property(unfolded, "DURATION").and_then(|p| parse_duration(p.value));

        Ok(BlockFields {
            uid: text_property(unfolded, "UID"),
            summary: text_property(unfolded, "SUMMARY"),
            location: text_property(unfolded, "LOCATION"),
            start,
            end,
            duration,
            rrule: find_property(unfolded, "RRULE").map(|p| p.value.trim().to_string()),
            text_len: unfolded.len(),
        })
    }

    /// DTEND, else DTSTART + DURATION, else a day (dates) or an hour later.
    pub fn end_time(&self) -> IcsTime {
        if let Some(end) = &self.end {
            return end.clone();
        }
        let duration = match self.duration {
            Some(d) if d > Duration::zero() => d,
            _ if self.start.is_date() => Duration::days(1),
            _ => Duration::hours(DEFAULT_TIMED_DURATION_HOURS),
        };
        self.start.add_wall_clock(duration)
    }
}
