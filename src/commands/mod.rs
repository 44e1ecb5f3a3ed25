pub mod config;
pub mod occurrences;
pub mod occurs_on;
