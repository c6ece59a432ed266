use std::fmt;
use std::num::NonZeroU64;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Identity of a persisted content record.
///
/// Record stores hand out positive integer identities. Zero is reserved as
/// "no record" by the platform, so it cannot be represented here; a record
/// without identity is modeled as `Option<RecordId>::None`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct RecordId(NonZeroU64);

impl RecordId {
    /// Create a record id, returning `None` for zero.
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    /// The raw integer identity.
    pub fn get(&self) -> u64 {
        self.0.get()
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u64> for RecordId {
    type Error = TypeError;

    fn try_from(raw: u64) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or_else(|| TypeError::InvalidRecordId(raw.to_string()))
    }
}

impl From<RecordId> for u64 {
    fn from(id: RecordId) -> Self {
        id.get()
    }
}

impl FromStr for RecordId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: u64 = s
            .trim()
            .parse()
            .map_err(|_| TypeError::InvalidRecordId(s.to_string()))?;
        Self::try_from(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_not_an_identity() {
        assert!(RecordId::new(0).is_none());
        assert_eq!(RecordId::new(7).map(|id| id.get()), Some(7));
    }

    #[test]
    fn parse_from_string() {
        let id: RecordId = "42".parse().unwrap();
        assert_eq!(id.get(), 42);
        assert!("0".parse::<RecordId>().is_err());
        assert!("abc".parse::<RecordId>().is_err());
    }

    #[test]
    fn serializes_as_plain_integer() {
        let id = RecordId::new(12).unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "12");
        let back: RecordId = serde_json::from_str("12").unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<RecordId>("0").is_err());
    }

    #[test]
    fn display_format() {
        let id = RecordId::new(99).unwrap();
        assert_eq!(format!("{id}"), "99");
        assert_eq!(format!("{id:?}"), "RecordId(99)");
    }
}
