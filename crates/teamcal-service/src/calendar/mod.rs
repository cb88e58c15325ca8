pub mod codec;
pub mod event;
pub mod expand;
pub mod mapping;
pub mod recurrence;
pub mod service;
