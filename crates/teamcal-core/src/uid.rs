//! Server-side event UID generation.

use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide sequence mixed into every generated UID.
static UID_SEQUENCE: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone)]
pub struct EventUidGenerator {
    domain: String,
}

impl EventUidGenerator {
    #[must_use]
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
        }
    }

    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// ## Summary
    /// Creates a new UID of the form `<uuid-v7>-<sequence>@<domain>`.
    ///
    /// UUIDv7 is time ordered with a random tail; the sequence keeps UIDs
    /// distinct even when two are created within the same millisecond.
    #[must_use]
    pub fn generate(&self) -> String {
        let sequence = UID_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let uid = format!("{}-{sequence}@{}", uuid::Uuid::now_v7(), self.domain);
        tracing::trace!(uid = %uid, "Generated event UID");
        uid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generated_uids_are_unique_and_carry_domain() {
        let generator = EventUidGenerator::new("calendar.example.com");
        let uids: HashSet<String> = (0..500).map(|_| generator.generate()).collect();
        assert_eq!(uids.len(), 500);
        assert!(uids.iter().all(|uid| uid.ends_with("@calendar.example.com")));
    }
}
