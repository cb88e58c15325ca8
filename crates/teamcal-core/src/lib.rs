//! Shared building blocks for the team calendar event core: configuration,
//! request context, error types and event identifiers.

pub mod config;
pub mod context;
pub mod error;
pub mod types;
pub mod uid;
