//! iCalendar core models (RFC 5545).
//!
//! Unknown properties and parameters are kept verbatim so a decoded calendar
//! can be written back without losing data.

mod component;
mod datetime;
mod parameter;
mod property;
mod rrule;
mod value;

pub use component::{Component, ComponentKind, ICalendar};
pub use datetime::{Date, DateTime, DateTimeForm};
pub use parameter::Parameter;
pub use property::Property;
pub use rrule::{Frequency, RRule, RRuleUntil, Weekday, WeekdayNum};
pub use value::Value;
