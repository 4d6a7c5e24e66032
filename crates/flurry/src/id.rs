use core::fmt;
use std::time::Duration;

/// A packed 64-bit Snowflake ID.
///
/// The raw value is always non-negative: bit 63 is reserved by every
/// [`Layout`]. Ordering follows the raw value, so IDs from a single generator
/// sort in generation order.
///
/// Decoding the fields requires the [`Layout`] the ID was packed with; see
/// [`Layout::decode`].
///
/// [`Layout`]: crate::Layout
/// [`Layout::decode`]: crate::Layout::decode
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct SnowflakeId {
    id: i64,
}

impl SnowflakeId {
    /// Wraps a raw packed value.
    pub const fn from_raw(id: i64) -> Self {
        Self { id }
    }

    /// Returns the raw packed value.
    pub const fn to_raw(self) -> i64 {
        self.id
    }

    /// Returns the ID as a zero-padded 19-digit string, which sorts
    /// lexicographically in the same order as the numeric value.
    pub fn to_padded_string(&self) -> String {
        format!("{:019}", self.id)
    }
}

impl fmt::Display for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl From<SnowflakeId> for i64 {
    fn from(id: SnowflakeId) -> Self {
        id.id
    }
}

/// The unpacked fields of a [`SnowflakeId`].
///
/// `timestamp` is relative to the generator's epoch. For flat layouts
/// `datacenter` is always zero.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Components {
    pub timestamp: u64,
    pub datacenter: u64,
    pub server: u64,
    pub sequence: u64,
}

impl Components {
    /// Milliseconds since the UNIX epoch at which the ID was generated.
    ///
    /// Saturates at `u64::MAX` for IDs decoded under an epoch they were not
    /// generated with.
    pub fn unix_millis(&self, epoch: Duration) -> u64 {
        let epoch = u64::try_from(epoch.as_millis()).unwrap_or(u64::MAX);
        self.timestamp.saturating_add(epoch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_decimal_and_padding_sorts() {
        let small = SnowflakeId::from_raw(42);
        let large = SnowflakeId::from_raw(1_000_000_000_000);
        assert_eq!(small.to_string(), "42");
        assert_eq!(small.to_padded_string(), "0000000000000000042");
        assert!(small.to_padded_string() < large.to_padded_string());
        assert_eq!(i64::from(large), 1_000_000_000_000);
    }

    #[test]
    fn components_resolve_unix_millis() {
        let parts = Components {
            timestamp: 5,
            datacenter: 0,
            server: 1,
            sequence: 0,
        };
        assert_eq!(parts.unix_millis(Duration::from_millis(1_000)), 1_005);
    }

    #[test]
    fn unix_millis_saturates_on_huge_epoch() {
        let parts = Components {
            timestamp: (1 << 41) - 1,
            datacenter: 0,
            server: 0,
            sequence: 0,
        };
        assert_eq!(parts.unix_millis(Duration::from_millis(u64::MAX)), u64::MAX);
        assert_eq!(parts.unix_millis(Duration::MAX), u64::MAX);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_id_is_transparent() {
        let id = SnowflakeId::from_raw(123);
        assert_eq!(serde_json::to_string(&id).unwrap(), "123");
        let back: SnowflakeId = serde_json::from_str("123").unwrap();
        assert_eq!(back, id);
    }
}
