use parking_lot::Mutex;
use std::time::Duration;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    BasicGenerator, GeneratorState, IdGenerator, Layout, NodeId, Result, SnowflakeId, TimeSource,
};

/// A lock-based Snowflake ID generator suitable for multi-threaded
/// environments.
///
/// Wraps a single [`BasicGenerator`] in a [`Mutex`] held for the whole of
/// each call, including any wait for the next millisecond. At most one
/// `next_id` runs at a time and only one machine identifier is consumed.
///
/// ## Features
/// - ✅ Thread-safe
/// - ✅ One machine-identifier slot
///
/// ## Recommended When
/// - Only one identifier is available to this instance
/// - Request rates stay well below one sequence space per millisecond
///
/// ## See Also
/// - [`PoolGenerator`]
///
/// [`PoolGenerator`]: crate::PoolGenerator
pub struct LockGenerator<T>
where
    T: TimeSource,
{
    state: Mutex<BasicGenerator<T>>,
    layout: Layout,
    epoch: Duration,
}

impl<T> LockGenerator<T>
where
    T: TimeSource,
{
    /// Creates a new [`LockGenerator`] for `node`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] if `node` does not fit `layout`.
    ///
    /// # Example
    /// ```
    /// use flurry::{IdGenerator, Layout, LockGenerator, NodeId, SystemClock, TWITTER_EPOCH};
    ///
    /// let generator =
    ///     LockGenerator::new(Layout::TWITTER, TWITTER_EPOCH, NodeId::flat(0), SystemClock)?;
    /// let id = generator.next_id()?;
    /// assert_eq!(Layout::TWITTER.decode(id).server, 0);
    /// # Ok::<(), flurry::Error>(())
    /// ```
    ///
    /// [`Error::InvalidIdentifier`]: crate::Error::InvalidIdentifier
    pub fn new(layout: Layout, epoch: Duration, node: NodeId, time: T) -> Result<Self> {
        BasicGenerator::new(layout, epoch, node, time).map(Self::from_generator)
    }

    /// Wraps an existing generator, keeping its state.
    pub fn from_generator(generator: BasicGenerator<T>) -> Self {
        Self {
            layout: generator.layout(),
            epoch: generator.epoch(),
            state: Mutex::new(generator),
        }
    }

    pub fn node(&self) -> NodeId {
        self.state.lock().node()
    }

    pub fn state(&self) -> GeneratorState {
        self.state.lock().state()
    }

    /// Generates the next ID under the lock.
    ///
    /// # Errors
    ///
    /// See [`BasicGenerator::next_id`].
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next_id(&self) -> Result<SnowflakeId> {
        self.state.lock().next_id()
    }
}

impl<T> IdGenerator for LockGenerator<T>
where
    T: TimeSource,
{
    fn next_id(&self) -> Result<SnowflakeId> {
        self.next_id()
    }

    fn layout(&self) -> Layout {
        self.layout
    }

    fn epoch(&self) -> Duration {
        self.epoch
    }

    fn states(&self) -> Vec<GeneratorState> {
        vec![self.state()]
    }
}
