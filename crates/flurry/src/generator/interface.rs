use std::time::Duration;

use crate::{Layout, NodeId, Result, SnowflakeId};

/// The single operation every transport, CLI, or embedding caller invokes.
///
/// Implementations differ only in how they serialize access to the
/// sequencing state: [`LockGenerator`] holds one generator behind a mutex,
/// [`PoolGenerator`] hands out exclusive custody of one of several
/// generators per call.
///
/// [`LockGenerator`]: crate::LockGenerator
/// [`PoolGenerator`]: crate::PoolGenerator
pub trait IdGenerator {
    /// Generates the next ID, blocking until a generator is available and,
    /// if the current millisecond's sequence space is used up, until the
    /// clock advances.
    ///
    /// # Errors
    ///
    /// - [`Error::ClockRegression`] if the clock reads earlier than the last
    ///   recorded timestamp.
    /// - [`Error::TimestampOutOfRange`] if the clock reads before the epoch
    ///   or past the last representable timestamp.
    ///
    /// In both cases no state is mutated.
    ///
    /// [`Error::ClockRegression`]: crate::Error::ClockRegression
    /// [`Error::TimestampOutOfRange`]: crate::Error::TimestampOutOfRange
    fn next_id(&self) -> Result<SnowflakeId>;

    /// The bit layout every produced ID is packed with.
    fn layout(&self) -> Layout;

    /// The epoch subtracted from clock readings before packing.
    fn epoch(&self) -> Duration;

    /// Snapshots the sequencing state of every underlying generator, ordered
    /// by node.
    fn states(&self) -> Vec<GeneratorState>;
}

/// A point-in-time copy of one generator's sequencing state.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct GeneratorState {
    pub node: NodeId,
    /// Milliseconds since the UNIX epoch of the last issued ID, or zero if
    /// none has been issued.
    pub last_timestamp: u64,
    pub sequence: u64,
}
