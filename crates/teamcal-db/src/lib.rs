//! Storage collaborator for calendar events: the persisted record, the
//! `EventStore` access trait and an in-memory implementation.

pub mod db;
pub mod error;
pub mod model;
