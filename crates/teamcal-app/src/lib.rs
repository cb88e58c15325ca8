//! Command line front end: feeds are imported into an in-memory store and
//! listed, expanded or exported from there.

pub mod cli;
pub mod commands;
pub mod error;
