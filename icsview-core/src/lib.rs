//! Expand iCalendar text into the concrete event occurrences of a time window.
//!
//! Two expanders sit behind [`parse_occurrences`]:
//! - the primary expander parses the calendar with `icalendar` and expands
//!   recurrence rules with `rrule`
//! - the [`fallback`] scanner reads VEVENT blocks as plain text and
//!   expands only DAILY and WEEKLY rules, for feeds the primary rejects
//!
//! The entry point never fails; unreadable input yields an empty list.

pub mod config;
pub mod constants;
pub mod date_range;
pub mod error;
pub mod expand;
pub mod fallback;
pub mod ics;
pub mod occurrence;
pub mod primary;
mod recurrence;
pub mod schedule;
pub mod time;

pub use config::{ExpandOptions, IcsviewConfig};
pub use date_range::QueryWindow;
pub use error::{ExpandError, ExpandResult};
pub use expand::{parse_occurrences, parse_occurrences_with};
pub use occurrence::Occurrence;
pub use schedule::{Schedule, occurs_on_date};
