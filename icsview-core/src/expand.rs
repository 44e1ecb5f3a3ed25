//! Entry point: primary expander with the fallback scanner behind it.

use std::panic::{self, UnwindSafe};

use crate::config::ExpandOptions;
use crate::date_range::QueryWindow;
use crate::error::ExpandResult;
use crate::fallback;
use crate::occurrence::Occurrence;
use crate::primary::expand_primary;

/// Occurrences in `content` overlapping `window`, with default options.
///
/// See [`parse_occurrences_with`].
pub fn parse_occurrences(content: &str, window: &QueryWindow) -> Vec<Occurrence> {
    parse_occurrences_with(content, window, &ExpandOptions::default())
}

/// Occurrences in `content` overlapping `window`.
///
/// Runs the primary expander; if it fails or finds nothing, the fallback
/// scanner's result is returned instead. Never fails: the worst case is an
/// empty list. Results are in discovery order, not sorted.
///
/// A panic inside the primary expander is caught and handled like an error.
/// The process panic hook still runs first, so such a panic is reported on
/// stderr before the fallback result is returned.
pub fn parse_occurrences_with(
    content: &str,
    window: &QueryWindow,
    options: &ExpandOptions,
) -> Vec<Occurrence> {
    if window.is_empty() {
        return Vec::new();
    }

    match run_primary(|| expand_primary(content, window, options)) {
        Some(occurrences) => occurrences,
        None => fallback::scan(content, window, options),
    }
}

/// The primary result when it is non-empty; `None` on error, panic or no
/// occurrences.
fn run_primary<F>(primary: F) -> Option<Vec<Occurrence>>
where
    F: FnOnce() -> ExpandResult<Vec<Occurrence>> + UnwindSafe,
{
    match panic::catch_unwind(primary) {
        Ok(Ok(occurrences)) if !occurrences.is_empty() => return Some(occurrences),
        Ok(Ok(_)) => tracing::debug!("Primary expander found nothing, trying fallback scanner"),
        Ok(Err(e)) => tracing::warn!(error = %e, "ICS parse failed, trying fallback scanner"),
        Err(_) => tracing::warn!("Primary expander panicked, trying fallback scanner"),
    }
    None
}
