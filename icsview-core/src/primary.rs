//! Primary expander: RFC 5545 parse + rrule expansion.

use crate::config::ExpandOptions;
use crate::date_range::QueryWindow;
use crate::error::ExpandResult;
use crate::ics::{EventSource, read_events};
use crate::occurrence::{Occurrence, Span};
use crate::recurrence::expand_recurring;

/// Expand every VEVENT in `content` into the occurrences overlapping `window`.
///
/// Any parse, timezone or RRULE error aborts the whole expansion so the
/// caller can switch to the fallback scanner.
pub fn expand_primary(
    content: &str,
    window: &QueryWindow,
    options: &ExpandOptions,
) -> ExpandResult<Vec<Occurrence>> {
    let events = read_events(content)?;

    let mut occurrences = Vec::new();
    for event in &events {
        if event.rrule.is_some() {
            occurrences.extend(expand_recurring(event, window, options)?);
        } else {
            occurrences.extend(expand_single(event, window, options)?);
        }
    }

    tracing::debug!(
        events = events.len(),
        occurrences = occurrences.len(),
        "Primary expansion finished"
    );

    Ok(occurrences)
}

fn expand_single(
    event: &EventSource,
    window: &QueryWindow,
    options: &ExpandOptions,
) -> ExpandResult<Option<Occurrence>> {
    let start = event.start.resolve(options.local_tz)?;
    let span = Span::between(&event.start, &event.end_time(), options.local_tz)?;
    let end = span.end_after(event.start.naive(), start);

    Ok(event.template().occurrence(start, end, window))
}
