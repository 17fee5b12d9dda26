//! Strongly-typed identifiers used across tabula.
//!
//! Tokens are drawn from process-wide counters, so two tags compare equal only
//! when one was copied from the other.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

macro_rules! new_id {
    ($name:ident, $counter:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Ord, PartialOrd,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        static $counter: AtomicU64 = AtomicU64::new(1);

        impl $name {
            pub const fn new(v: u64) -> Self {
                Self(v)
            }
            pub const fn get(self) -> u64 {
                self.0
            }
            /// Allocate a fresh, never-before-issued token.
            pub fn next() -> Self {
                Self($counter.fetch_add(1, Ordering::Relaxed))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

new_id!(VersionTag, VERSION_COUNTER);
new_id!(SubscriptionId, SUBSCRIPTION_COUNTER);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_tokens_are_unique() {
        let a = VersionTag::next();
        let b = VersionTag::next();
        assert_ne!(a, b);
        assert!(b.get() > a.get());
    }

    #[test]
    fn serializes_transparently() {
        let tag = VersionTag::new(42);
        assert_eq!(serde_json::to_string(&tag).unwrap(), "42");
    }
}
