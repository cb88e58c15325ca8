//! Team calendar event core: the `CalEvent` model, recurrence translation,
//! the ICS codec, the series modification engine and ICS import.

pub mod calendar;
pub mod error;
