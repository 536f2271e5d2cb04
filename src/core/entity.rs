//! Card instance identification.
//!
//! Every physical copy of a card in a match gets its own `InstanceId`.
//! Two copies of the same definition share a `CardId` but never an
//! `InstanceId`, which is what active effects, support targets and the
//! event log use to tell simultaneous copies apart.
//!
//! ```
//! use lane_duel::core::InstanceId;
//!
//! let first = InstanceId::new(1);
//! let second = first.next();
//! assert_ne!(first, second);
//! assert_eq!(second.raw(), 2);
//! ```

use serde::{Deserialize, Serialize};

/// Unique identifier for a card instance within one match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(pub u32);

impl InstanceId {
    /// Create an instance ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// The ID allocated right after this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl From<u32> for InstanceId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_is_sequential() {
        let id = InstanceId::new(41);
        assert_eq!(id.next(), InstanceId::new(42));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", InstanceId(7)), "#7");
    }

    #[test]
    fn test_serializes_as_number() {
        let json = serde_json::to_string(&InstanceId(12)).unwrap();
        assert_eq!(json, "12");
        let back: InstanceId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, InstanceId(12));
    }
}
