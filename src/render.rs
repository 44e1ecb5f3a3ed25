//! Terminal rendering of occurrence lists.

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use icsview_core::Occurrence;
use owo_colors::OwoColorize;

/// Print occurrences grouped under a heading per local day.
/// Expects them sorted by start.
pub fn print_agenda(occurrences: &[Occurrence], tz: Tz) {
    if occurrences.is_empty() {
        println!("{}", "No events found".dimmed());
        return;
    }

    let today = Utc::now().with_timezone(&tz).date_naive();
    let mut current_date: Option<NaiveDate> = None;

    for occ in occurrences {
        let date = occ.start.with_timezone(&tz).date_naive();

        if current_date != Some(date) {
            if current_date.is_some() {
                println!();
            }
            println!("{}", day_label(date, today).bold());
            current_date = Some(date);
        }

        let location = if occ.location.is_empty() {
            String::new()
        } else {
            format!(" @ {}", occ.location)
        };
        println!("  {} {}{}", format_time(occ, tz), occ.summary, location.dimmed());
    }
}

/// "Today", "Tomorrow", or e.g. "Wed Feb 25"
fn day_label(date: NaiveDate, today: NaiveDate) -> String {
    match (date - today).num_days() {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        _ => date.format("%a %b %-d").to_string(),
    }
}

/// Start time (e.g. "  15:00") or "all-day"
fn format_time(occ: &Occurrence, tz: Tz) -> String {
    if occ.all_day {
        return "all-day".to_string();
    }
    format!("{:>7}", occ.start.with_timezone(&tz).format("%H:%M"))
}
