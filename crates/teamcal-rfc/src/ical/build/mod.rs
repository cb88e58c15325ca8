//! iCalendar serialization (RFC 5545).

mod escape;
mod fold;
mod serializer;

pub use escape::{escape_param_value, escape_text, format_parameters};
pub use fold::fold_line;
pub use serializer::{format_duration, serialize, serialize_component, serialize_property};
