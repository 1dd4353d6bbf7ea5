//! Subscriber identifiers.
//!
//! Observers and signal subscriptions are keyed by a [`SubscriberId`] so the
//! tracking stack can verify that scopes unwind in order and logs can name
//! which computation re-ran.

use std::cell::Cell;
use std::fmt;

thread_local! {
    static COUNTER: Cell<u64> = const { Cell::new(0) };
}

/// Unique identifier for a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new identifier, unique within the current thread.
    pub fn new() -> Self {
        COUNTER.with(|counter| {
            let id = counter.get();
            counter.set(id + 1);
            Self(id)
        })
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscriber_ids_are_unique() {
        let id1 = SubscriberId::new();
        let id2 = SubscriberId::new();
        let id3 = SubscriberId::new();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert!(id1 < id2);
    }

    #[test]
    fn display_uses_raw_value() {
        let id = SubscriberId::new();
        assert_eq!(id.to_string(), format!("#{}", id.raw()));
    }
}
