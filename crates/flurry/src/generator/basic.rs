use core::cmp::Ordering;
use std::time::Duration;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{Error, GeneratorState, Layout, NodeId, Result, SnowflakeId, TimeSource};

/// Delay between clock polls while waiting out an exhausted millisecond.
pub const DEFAULT_SPIN_INTERVAL: Duration = Duration::from_micros(100);

/// A single-owner Snowflake ID generator.
///
/// This is the sequencing state machine every other generator wraps. It
/// needs `&mut self` to produce an ID, so sharing it between threads goes
/// through [`LockGenerator`] or [`PoolGenerator`].
///
/// ## Features
/// - ❌ Not shareable on its own
/// - ✅ Any [`Layout`], flat or split
/// - ✅ Detects clock regression instead of issuing a risky ID
///
/// ## See Also
/// - [`LockGenerator`]
/// - [`PoolGenerator`]
///
/// [`LockGenerator`]: crate::LockGenerator
/// [`PoolGenerator`]: crate::PoolGenerator
#[derive(Debug)]
pub struct BasicGenerator<T>
where
    T: TimeSource,
{
    layout: Layout,
    epoch: u64,
    node: NodeId,
    last_timestamp: u64,
    sequence: u64,
    spin_interval: Duration,
    time: T,
}

impl<T> BasicGenerator<T>
where
    T: TimeSource,
{
    /// Creates a new [`BasicGenerator`] for `node`, with no timestamp
    /// recorded yet and the sequence at zero.
    ///
    /// # Parameters
    ///
    /// - `layout`: The bit partition of produced IDs.
    /// - `epoch`: Subtracted from every clock reading before packing.
    /// - `node`: The identifier stamped into every produced ID.
    /// - `time`: A [`TimeSource`] implementation (e.g., [`SystemClock`]).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] if `node` does not fit `layout`.
    ///
    /// # Example
    /// ```
    /// use flurry::{BasicGenerator, Layout, NodeId, SystemClock, TWITTER_EPOCH};
    ///
    /// let mut generator =
    ///     BasicGenerator::new(Layout::TWITTER, TWITTER_EPOCH, NodeId::flat(1), SystemClock)?;
    /// let a = generator.next_id()?;
    /// let b = generator.next_id()?;
    /// assert!(a < b);
    /// # Ok::<(), flurry::Error>(())
    /// ```
    ///
    /// [`SystemClock`]: crate::SystemClock
    pub fn new(layout: Layout, epoch: Duration, node: NodeId, time: T) -> Result<Self> {
        Self::from_components(layout, epoch, node, 0, 0, time)
    }

    /// Creates a generator preloaded with explicit state.
    ///
    /// Useful for restoring state or for tests that need to start in the
    /// middle of a millisecond. `sequence` is masked to the layout's width.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] if `node` does not fit `layout`.
    pub fn from_components(
        layout: Layout,
        epoch: Duration,
        node: NodeId,
        last_timestamp: u64,
        sequence: u64,
        time: T,
    ) -> Result<Self> {
        layout.validate_node(node)?;
        Ok(Self {
            layout,
            epoch: epoch.as_millis() as u64,
            node,
            last_timestamp,
            sequence: sequence & layout.max_sequence(),
            spin_interval: DEFAULT_SPIN_INTERVAL,
            time,
        })
    }

    /// Sets how long to sleep between clock polls when the sequence is
    /// exhausted. A zero interval busy-spins.
    #[must_use]
    pub fn with_spin_interval(mut self, spin_interval: Duration) -> Self {
        self.spin_interval = spin_interval;
        self
    }

    pub const fn layout(&self) -> Layout {
        self.layout
    }

    pub const fn epoch(&self) -> Duration {
        Duration::from_millis(self.epoch)
    }

    pub const fn node(&self) -> NodeId {
        self.node
    }

    pub const fn state(&self) -> GeneratorState {
        GeneratorState {
            node: self.node,
            last_timestamp: self.last_timestamp,
            sequence: self.sequence,
        }
    }

    /// Generates the next ID.
    ///
    /// Within one millisecond the sequence increments; once it wraps, this
    /// call waits for the clock to move past the recorded millisecond and
    /// issues sequence zero there. Exhaustion is never reported.
    ///
    /// # Errors
    ///
    /// - [`Error::ClockRegression`] if the clock is behind the last recorded
    ///   timestamp.
    /// - [`Error::TimestampOutOfRange`] if the reading cannot be packed.
    ///
    /// The generator is left unchanged on error.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self), fields(node = ?self.node)))]
    pub fn next_id(&mut self) -> Result<SnowflakeId> {
        let mut now = self.time.current_millis();

        let sequence = match now.cmp(&self.last_timestamp) {
            Ordering::Equal => {
                let next = (self.sequence + 1) & self.layout.max_sequence();
                if next == 0 {
                    now = self.wait_next_millis();
                }
                next
            }
            Ordering::Greater => 0,
            Ordering::Less => return Err(self.cold_clock_behind(now)),
        };

        let timestamp = self.relative_timestamp(now)?;
        self.last_timestamp = now;
        self.sequence = sequence;
        Ok(self.layout.encode(timestamp, self.node, sequence))
    }

    /// Polls the clock until it reads strictly past the recorded timestamp.
    fn wait_next_millis(&self) -> u64 {
        let mut now = self.time.current_millis();
        while now <= self.last_timestamp {
            if self.spin_interval.is_zero() {
                core::hint::spin_loop();
            } else {
                std::thread::sleep(self.spin_interval);
            }
            now = self.time.current_millis();
        }
        now
    }

    fn relative_timestamp(&self, now: u64) -> Result<u64> {
        match now.checked_sub(self.epoch) {
            Some(timestamp) if timestamp <= self.layout.max_timestamp() => Ok(timestamp),
            _ => Err(Error::TimestampOutOfRange { millis: now }),
        }
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(&self, now: u64) -> Error {
        #[cfg(feature = "tracing")]
        tracing::warn!(
            node = ?self.node,
            behind_ms = self.last_timestamp - now,
            "clock moved backwards, refusing to generate"
        );
        Error::ClockRegression {
            last: self.last_timestamp,
            now,
        }
    }
}
