//! RFC 5545 text layer for team calendar events.
//!
//! Parses iCalendar documents into a typed component tree and serializes
//! them back with canonical ordering, escaping and line folding.

pub mod error;
pub mod ical;
