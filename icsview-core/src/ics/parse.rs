//! VEVENT extraction using the icalendar crate's parser.

use chrono::Duration;
use icalendar::{
    DatePerhapsTime,
    parser::{Component, read_calendar, unfold},
};

use crate::error::{ExpandError, ExpandResult};
use crate::occurrence::EventTemplate;
use crate::time::{IcsTime, parse_duration, unescape_text};

/// The fields of one VEVENT that expansion needs.
#[derive(Debug, Clone)]
pub struct EventSource {
    pub uid: Option<String>,
    pub summary: Option<String>,
    pub location: Option<String>,
    pub start: IcsTime,
    pub end: Option<IcsTime>,
    pub duration: Option<Duration>,
    pub rrule: Option<String>,
    /// Length of the component as serialized text
    pub serialized_len: usize,
}

impl EventSource {
    /// DTEND, else DTSTART + DURATION, else DTSTART itself (a day later for
    /// date-only starts).
    pub fn end_time(&self) -> IcsTime {
        if let Some(end) = &self.end {
            return end.clone();
        }
        if let Some(duration) = self.duration {
            return self.start.add_wall_clock(duration);
        }
        if self.start.is_date() {
            self.start.add_wall_clock(Duration::days(1))
        } else {
            self.start.clone()
        }
    }

    pub fn is_all_day(&self) -> bool {
        self.start.is_date() && self.end_time().is_date()
    }

    pub(crate) fn template(&self) -> EventTemplate {
        EventTemplate {
            uid: self.uid.clone(),
            summary: self.summary.clone(),
            location: self.location.clone(),
            all_day: self.is_all_day(),
            discriminator: self.serialized_len,
        }
    }
}

/// Parse calendar text and return every VEVENT in it.
///
/// Fails when the text is not a VCALENDAR or the parser rejects it. Events
/// without a usable DTSTART are skipped.
pub fn read_events(content: &str) -> ExpandResult<Vec<EventSource>> {
    let unfolded = unfold(content);

    let first_line = unfolded
        .lines()
        .map(|l| l.trim_start_matches('\u{feff}').trim())
        .find(|l| !l.is_empty());
    if !first_line.is_some_and(|l| l.eq_ignore_ascii_case("BEGIN:VCALENDAR")) {
        return Err(ExpandError::IcsParse("missing BEGIN:VCALENDAR".into()));
    }

    let calendar = read_calendar(&unfolded).map_err(|e| ExpandError::IcsParse(e.to_string()))?;

    let mut vevents = Vec::new();
    for component in &calendar.components {
        collect_vevents(component, &mut vevents);
    }

    let events = vevents
        .into_iter()
        .filter_map(|vevent| {
            let event = read_event(vevent);
            if event.is_none() {
                tracing::debug!("Skipping VEVENT without a usable DTSTART");
            }
            event
        })
        .collect();

    Ok(events)
}

fn collect_vevents<'a, 'b>(component: &'b Component<'a>, out: &mut Vec<&'b Component<'a>>) {
    if component.name == "VEVENT" {
        out.push(component);
        return;
    }
    for child in &component.components {
        collect_vevents(child, out);
    }
}

fn read_event(vevent: &Component<'_>) -> Option<EventSource> {
    let start = to_ics_time(DatePerhapsTime::try_from(vevent.find_prop("DTSTART")?).ok()?);
    let end = vevent
        .find_prop("DTEND")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
        .map(to_ics_time);
    let duration = vevent
        .find_prop("DURATION")
        .and_then(|p| parse_duration(p.val.as_ref()));

    let text = |name: &str| {
        vevent
            .find_prop(name)
            .map(|p| unescape_text(p.val.as_ref()))
            .filter(|s| !s.is_empty())
    };

    Some(EventSource {
        uid: text("UID"),
        summary: text("SUMMARY"),
        location: text("LOCATION"),
        start,
        end,
        duration,
        rrule: vevent.find_prop("RRULE").map(|p| p.val.to_string()),
        serialized_len: serialized_len(vevent),
    })
}

/// Convert icalendar's DatePerhapsTime to our IcsTime, preserving timezone info
fn to_ics_time(dpt: DatePerhapsTime) -> IcsTime {
    match dpt {
        DatePerhapsTime::Date(d) => IcsTime::Date(d),
        DatePerhapsTime::DateTime(cal_dt) => match cal_dt {
            icalendar::CalendarDateTime::Utc(dt) => IcsTime::Utc(dt),
            icalendar::CalendarDateTime::Floating(naive) => IcsTime::Floating(naive),
            icalendar::CalendarDateTime::WithTimezone { date_time, tzid } => IcsTime::Zoned {
                datetime: date_time,
                tzid,
            },
        },
    }
}

/// Length of the component written back out as unfolded `NAME;K=V:value`
/// lines with CRLF endings, nested components included.
fn serialized_len(component: &Component<'_>) -> usize {
    let name_len = component.name.to_string().len();
    let wrapper = "BEGIN:".len() + "END:".len() + 2 * (name_len + 2);

    let properties: usize = component
        .properties
        .iter()
        .map(|p| {
            let params: usize = p
                .params
                .iter()
                .map(|param| {
                    let val_len = param.val.as_ref().map_or(0, |v| v.to_string().len() + 1);
                    1 + param.key.to_string().len() + val_len
                })
                .sum();
            p.name.to_string().len() + params + 1 + p.val.to_string().len() + 2
        })
        .sum();

    let children: usize = component.components.iter().map(serialized_len).sum();

    wrapper + properties + children
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    const CALENDAR: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:TEST\r\n\
BEGIN:VEVENT\r\n\
UID:standup@example.com\r\n\
SUMMARY:Standup\\, daily\r\n\
LOCATION:Room 4\r\n\
DTSTART;TZID=Europe/Berlin:20250203T093000\r\n\
DURATION:PT15M\r\n\
RRULE:FREQ=DAILY;COUNT=5\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
DTSTART;VALUE=DATE:20250910\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
SUMMARY:No start\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

    #[test]
    fn test_reads_every_vevent_with_a_start() {
        let events = read_events(CALENDAR).unwrap();
        assert_eq!(events.len(), 2);

        let standup = &events[0];
        assert_eq!(standup.uid.as_deref(), Some("standup@example.com"));
        assert_eq!(standup.summary.as_deref(), Some("Standup, daily"));
        assert_eq!(standup.location.as_deref(), Some("Room 4"));
        assert_eq!(standup.rrule.as_deref(), Some("FREQ=DAILY;COUNT=5"));
        assert_eq!(standup.duration, Some(Duration::minutes(15)));
        match &standup.start {
            IcsTime::Zoned { tzid, .. } => assert_eq!(tzid, "Europe/Berlin"),
            other => panic!("Expected Zoned, got {:?}", other),
        }
    }

    #[test]
    fn test_date_only_start_gets_one_day_end() {
        let events = read_events(CALENDAR).unwrap();
        let all_day = &events[1];

        assert!(all_day.is_all_day());
        assert_eq!(
            all_day.end_time(),
            IcsTime::Date(NaiveDate::from_ymd_opt(2025, 9, 11).unwrap())
        );
        assert!(all_day.uid.is_none());
        assert!(all_day.serialized_len > 0);
    }

    #[test]
    fn test_duration_end_is_timed() {
        let events = read_events(CALENDAR).unwrap();
        let end = events[0].end_time();
        assert_eq!(
            end.resolve(chrono_tz::Tz::UTC).unwrap(),
            Utc.with_ymd_and_hms(2025, 2, 3, 8, 45, 0).unwrap()
        );
        assert!(!events[0].is_all_day());
    }

    #[test]
    fn test_rejects_text_without_vcalendar_header() {
        let broken = CALENDAR.replacen("BEGIN:VCALENDAR", "BEGIN VCALENDAR", 1);
        assert!(matches!(read_events(&broken), Err(ExpandError::IcsParse(_))));
    }

    #[test]
    fn test_serialized_len_is_stable() {
        let first = read_events(CALENDAR).unwrap();
        let second = read_events(CALENDAR).unwrap();
        assert_eq!(first[1].serialized_len, second[1].serialized_len);
        assert_ne!(first[0].serialized_len, first[1].serialized_len);
    }
}
