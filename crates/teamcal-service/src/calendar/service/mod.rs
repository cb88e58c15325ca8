//! Store-backed operations on calendar events.

pub mod import;
pub mod query;
pub mod series;
