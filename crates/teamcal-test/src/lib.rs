//! Team calendar event core - integration test support.
//!
//! Shared feeds and helpers for the end-to-end tests under `tests/`.

pub mod fixtures;

pub use teamcal_app as app;
pub use teamcal_core as core;
pub use teamcal_db as db;
pub use teamcal_service as service;
