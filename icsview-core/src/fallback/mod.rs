//! Fallback scanner.
//!
//! A text-driven VEVENT extractor for calendars the primary parser rejects
//! or yields nothing for, such as feeds with TZIDs outside the IANA
//! database. It understands only the handful of properties an occurrence
//! needs and a restricted RRULE subset (see [`rule`]).

mod fields;
mod rule;

pub use fields::{BlockFields, find_property, split_blocks, unfold};
pub use rule::{Frequency, RecurrenceRule};

use crate::config::ExpandOptions;
use crate::date_range::QueryWindow;
use crate::error::ExpandResult;
use crate::occurrence::{EventTemplate, Occurrence, Span};
use rule::Bounds;

/// Scan `content` block by block. A block that can't be read is skipped
/// without affecting the others.
pub fn scan(content: &str, window: &QueryWindow, options: &ExpandOptions) -> Vec<Occurrence> {
    let mut occurrences = Vec::new();

    for (index, block) in split_blocks(content).into_iter().enumerate() {
        match scan_block(block, window, options) {
            Ok(found) => occurrences.extend(found),
            Err(e) => tracing::debug!(block = index, error = %e, "Skipping unreadable VEVENT block"),
        }
    }

    occurrences
}

fn scan_block(
    block: &str,
    window: &QueryWindow,
    options: &ExpandOptions,
) -> ExpandResult<Vec<Occurrence>> {
    let unfolded = unfold(block);
    let fields = BlockFields::extract(&unfolded)?;

    let end_time = fields.end_time();
    let template = EventTemplate {
        uid: fields.uid.clone(),
        summary: fields.summary.clone(),
        location: fields.location.clone(),
        all_day: fields.start.is_date() && end_time.is_date(),
        discriminator: fields.text_len,
    };

    let local_tz = options.local_tz;
    let span = Span::between(&fields.start, &end_time, local_tz)?;

    let Some(rrule) = &fields.rrule else {
        let start = fields.start.resolve(local_tz)?;
        let end = span.end_after(fields.start.naive(), start);
        return Ok(template.occurrence(start, end, window).into_iter().collect());
    };

    let rule = RecurrenceRule::parse(rrule, local_tz);
    let bounds = Bounds {
        window: *window,
        zone: fields.start.zone(local_tz)?,
        reach: span.approx(),
        max_instances: options.max_instances,
    };

    let occurrences = rule
        .instances(fields.start.naive(), &bounds)
        .into_iter()
        .filter_map(|instance| {
            let end = span.end_after(instance.local, instance.start);
            template.occurrence(instance.start, end, window)
        })
        .collect();

    Ok(occurrences)
}
