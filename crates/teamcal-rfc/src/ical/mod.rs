//! iCalendar RFC 5545 support scoped to event exchange.
//!
//! - `core`: component tree and value types
//! - `parse`: lexer and parser
//! - `build`: serializer, escaping and folding

pub mod build;
pub mod core;
pub mod parse;

#[cfg(test)]
mod tests;

pub use build::serialize;
pub use self::core::{Component, ComponentKind, ICalendar, Parameter, Property, Value};
pub use parse::{ParseError, ParseResult, parse};
