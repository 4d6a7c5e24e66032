use core::fmt;

/// A result type defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// The bit field an identifier was validated against.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    /// The datacenter sub-field of a split layout.
    Datacenter,
    /// The server field (the whole machine field for flat layouts).
    Server,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Datacenter => f.write_str("datacenter id"),
            Self::Server => f.write_str("machine id"),
        }
    }
}

/// All error variants that `flurry` can emit.
///
/// Construction errors ([`Error::InvalidIdentifier`],
/// [`Error::InvalidLayout`], [`Error::InvalidEpoch`], [`Error::EmptyPool`]) are raised before any ID
/// is produced and should abort startup. Call-time errors
/// ([`Error::ClockRegression`], [`Error::TimestampOutOfRange`]) leave the
/// generator untouched, so a later call resumes correctly once the host clock
/// is sane again.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An identifier does not fit the bit width configured for its field.
    #[error("invalid {field}: {value} exceeds maximum {max}")]
    InvalidIdentifier { field: Field, value: u64, max: u64 },

    /// The requested bit partition leaves no room for a timestamp or has no
    /// sequence bits.
    #[error(
        "invalid layout: {datacenter_bits} datacenter + {server_bits} server + {sequence_bits} sequence bits"
    )]
    InvalidLayout {
        datacenter_bits: u8,
        server_bits: u8,
        sequence_bits: u8,
    },

    /// The configured epoch lies after the current time or cannot be read as
    /// milliseconds, so no timestamp would ever fit.
    #[error("invalid epoch: {epoch}ms is later than the current time {now}ms")]
    InvalidEpoch { epoch: u64, now: u64 },

    /// A pool was requested with zero members.
    #[error("pool must contain at least one generator")]
    EmptyPool,

    /// The clock reported a time earlier than the last recorded timestamp.
    #[error("clock moved backwards: last timestamp {last}ms, now {now}ms")]
    ClockRegression { last: u64, now: u64 },

    /// The clock reading is before the epoch or beyond what the timestamp
    /// field can hold.
    #[error("timestamp {millis}ms is outside the representable range")]
    TimestampOutOfRange { millis: u64 },
}

impl Error {
    /// Returns `true` for failures that can only happen while constructing a
    /// generator.
    pub const fn is_construction(&self) -> bool {
        matches!(
            self,
            Self::InvalidIdentifier { .. }
                | Self::InvalidLayout { .. }
                | Self::InvalidEpoch { .. }
                | Self::EmptyPool
        )
    }
}
