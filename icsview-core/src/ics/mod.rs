//! ICS parsing for the primary expander.
//!
//! Reads calendar text with the icalendar crate's RFC 5545 parser.

mod parse;

pub use parse::{EventSource, read_events};
