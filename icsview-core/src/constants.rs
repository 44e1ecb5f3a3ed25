/// Summary used when an event carries no SUMMARY property.
pub const NO_TITLE: &str = "(no title)";

/// Default query window length when the CLI is given no `--to`.
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// Hard cap on recurrence candidates examined per event.
pub const DEFAULT_MAX_INSTANCES: u16 = 10_000;

/// How far before the window the primary recurrence iterator is seeded.
pub const DEFAULT_LOOKBEHIND_HOURS: i64 = 24;

/// Length given to timed events that have no usable end.
pub const DEFAULT_TIMED_DURATION_HOURS: i64 = 1;
