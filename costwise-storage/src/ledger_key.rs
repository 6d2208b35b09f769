//! Owner-scoped keys for the persistent calculation ledger.
//!
//! A key can only be built from an owner and a timestamp, so every LMDB
//! access to the ledger names the partition it touches.

use chrono::{DateTime, SecondsFormat, Utc};
use costwise_core::{OwnerId, Timestamp};

/// Separator between owner and timestamp. Never appears in UTF-8 text.
const SEPARATOR: u8 = 0xFF;

/// Ledger key scoped to one owner.
///
/// # Binary Format
///
/// `[owner utf-8 bytes][0xFF][timestamp as RFC 3339, nanosecond precision, 'Z']`
///
/// The timestamp part is fixed width for years 0000-9999, so byte order
/// within one owner's prefix matches chronological order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OwnerScopedKey {
    owner: OwnerId,
    timestamp: Timestamp,
}

impl OwnerScopedKey {
    pub fn new(owner: &OwnerId, timestamp: Timestamp) -> Self {
        Self {
            owner: owner.clone(),
            timestamp,
        }
    }

    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Self::owner_prefix(&self.owner);
        bytes.extend_from_slice(
            self.timestamp
                .to_rfc3339_opts(SecondsFormat::Nanos, true)
                .as_bytes(),
        );
        bytes
    }

    /// Decode a key. Returns `None` for anything `encode` could not produce.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let split = bytes.iter().position(|b| *b == SEPARATOR)?;
        let owner = std::str::from_utf8(&bytes[..split]).ok()?;
        let timestamp = std::str::from_utf8(&bytes[split + 1..]).ok()?;
        let timestamp = DateTime::parse_from_rfc3339(timestamp)
            .ok()?
            .with_timezone(&Utc);
        let owner = OwnerId::new(owner).ok()?;
        Some(Self::new(&owner, timestamp))
    }

    /// Prefix shared by every key of one owner.
    pub fn owner_prefix(owner: &OwnerId) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(owner.as_str().len() + 1);
        bytes.extend_from_slice(owner.as_str().as_bytes());
        bytes.push(SEPARATOR);
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn owner(s: &str) -> OwnerId {
        OwnerId::new(s).unwrap()
    }

    #[test]
    fn test_encode_decode() {
        let ts = Utc.with_ymd_and_hms(2024, 7, 4, 12, 0, 0).unwrap() + Duration::nanoseconds(17);
        let key = OwnerScopedKey::new(&owner("alice"), ts);
        let decoded = OwnerScopedKey::decode(&key.encode()).unwrap();
        assert_eq!(decoded, key);
        assert_eq!(decoded.owner().as_str(), "alice");
        assert_eq!(decoded.timestamp(), ts);
    }

    #[test]
    fn test_prefix_does_not_match_longer_owner() {
        let ts = Utc.with_ymd_and_hms(2024, 7, 4, 12, 0, 0).unwrap();
        let key = OwnerScopedKey::new(&owner("alice2"), ts).encode();
        let prefix = OwnerScopedKey::owner_prefix(&owner("alice"));
        assert!(!key.starts_with(&prefix));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(OwnerScopedKey::decode(b"no-separator").is_none());
        assert!(OwnerScopedKey::decode(b"alice\xFFnot-a-date").is_none());
        assert!(OwnerScopedKey::decode(b"\xFF2024-01-01T00:00:00Z").is_none());
    }

    proptest! {
        #[test]
        fn prop_key_order_is_chronological(a in 0i64..4_000_000_000, b in 0i64..4_000_000_000) {
            let base = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
            let ta = base + Duration::seconds(a);
            let tb = base + Duration::seconds(b);
            let ka = OwnerScopedKey::new(&owner("o"), ta).encode();
            let kb = OwnerScopedKey::new(&owner("o"), tb).encode();
            prop_assert_eq!(ta.cmp(&tb), ka.cmp(&kb));
        }
    }
}
