mod filter;

pub use filter::{EventFilter, sort_by_start_desc};
