use core::mem::ManuallyDrop;
use core::ops::{Deref, DerefMut};
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use std::time::Duration;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    BasicGenerator, Error, GeneratorState, IdGenerator, Layout, NodeId, Result, SnowflakeId,
    TimeSource,
};

/// A fixed pool of independently sequenced generators.
///
/// Member `i` owns node `base.offset(i)`, so members never share an output
/// space. Idle members wait in a bounded hand-off channel; each call takes
/// exclusive custody of whichever member is idle first, generates, and hands
/// it back whether or not generation succeeded.
///
/// Callers block while every member is busy. There is no timeout and no
/// fairness beyond the channel's FIFO order.
///
/// ## Features
/// - ✅ Thread-safe
/// - ✅ N-way concurrency with no contention inside the critical section
/// - ❌ Consumes N machine-identifier slots
/// - ❌ No ordering between IDs of different members
///
/// ## See Also
/// - [`LockGenerator`]
///
/// [`LockGenerator`]: crate::LockGenerator
pub struct PoolGenerator<T>
where
    T: TimeSource,
{
    idle_tx: Sender<BasicGenerator<T>>,
    idle_rx: Receiver<BasicGenerator<T>>,
    size: usize,
    base: NodeId,
    layout: Layout,
    epoch: Duration,
    // Serializes `states()` so two inspections can't each hold part of the
    // pool and wait on each other forever.
    inspect: Mutex<()>,
}

impl<T> PoolGenerator<T>
where
    T: TimeSource + Clone,
{
    /// Creates `size` generators with nodes `base`, `base + 1`, ...,
    /// `base + size - 1`, all reading the same clock.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyPool`] if `size` is zero.
    /// - [`Error::InvalidIdentifier`] if any member's node does not fit
    ///   `layout`.
    ///
    /// # Example
    /// ```
    /// use flurry::{IdGenerator, Layout, NodeId, PoolGenerator, SystemClock, TWITTER_EPOCH};
    ///
    /// let pool = PoolGenerator::new(Layout::TWITTER, TWITTER_EPOCH, NodeId::flat(8), 4, SystemClock)?;
    /// let id = pool.next_id()?;
    /// assert!((8..12).contains(&Layout::TWITTER.decode(id).server));
    /// # Ok::<(), flurry::Error>(())
    /// ```
    pub fn new(layout: Layout, epoch: Duration, base: NodeId, size: usize, time: T) -> Result<Self> {
        if size == 0 {
            return Err(Error::EmptyPool);
        }

        let members = (0..size as u64)
            .map(|offset| BasicGenerator::new(layout, epoch, base.offset(offset), time.clone()))
            .collect::<Result<Vec<_>>>()?;

        let (idle_tx, idle_rx) = crossbeam_channel::bounded(size);
        for member in members {
            // Capacity equals the member count, so this never blocks.
            let _ = idle_tx.send(member);
        }

        Ok(Self {
            idle_tx,
            idle_rx,
            size,
            base,
            layout,
            epoch,
            inspect: Mutex::new(()),
        })
    }
}

impl<T> PoolGenerator<T>
where
    T: TimeSource,
{
    /// Applies [`BasicGenerator::with_spin_interval`] to every member.
    #[must_use]
    pub fn with_spin_interval(self, spin_interval: Duration) -> Self {
        // Owning `self` means nobody else holds a member right now.
        let members: Vec<_> = self.idle_rx.try_iter().collect();
        for member in members {
            let _ = self.idle_tx.send(member.with_spin_interval(spin_interval));
        }
        self
    }

    pub const fn size(&self) -> usize {
        self.size
    }

    pub const fn base(&self) -> NodeId {
        self.base
    }

    /// Generates the next ID on whichever member is idle first.
    ///
    /// # Errors
    ///
    /// See [`BasicGenerator::next_id`]. The member is returned to the pool
    /// either way.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next_id(&self) -> Result<SnowflakeId> {
        self.checkout().next_id()
    }

    /// Takes custody of every member in turn and snapshots its state.
    ///
    /// Blocks until all in-flight calls have returned their members.
    pub fn states(&self) -> Vec<GeneratorState> {
        let _inspect = self.inspect.lock();
        let members: Vec<_> = (0..self.size).map(|_| self.checkout()).collect();
        let mut states: Vec<_> = members.iter().map(|member| member.state()).collect();
        states.sort_by_key(|state| state.node);
        states
    }

    fn checkout(&self) -> Checkout<'_, T> {
        let Ok(generator) = self.idle_rx.recv() else {
            unreachable!("pool holds its own sender, so the channel cannot disconnect");
        };
        Checkout {
            generator: ManuallyDrop::new(generator),
            idle_tx: &self.idle_tx,
        }
    }
}

/// Exclusive custody of one pool member, returned to the pool on drop so a
/// panicking caller can't shrink the pool.
struct Checkout<'a, T>
where
    T: TimeSource,
{
    generator: ManuallyDrop<BasicGenerator<T>>,
    idle_tx: &'a Sender<BasicGenerator<T>>,
}

impl<T> Deref for Checkout<'_, T>
where
    T: TimeSource,
{
    type Target = BasicGenerator<T>;

    fn deref(&self) -> &Self::Target {
        &self.generator
    }
}

impl<T> DerefMut for Checkout<'_, T>
where
    T: TimeSource,
{
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.generator
    }
}

impl<T> Drop for Checkout<'_, T>
where
    T: TimeSource,
{
    fn drop(&mut self) {
        // SAFETY: `generator` is taken exactly once, here, and `self` is not
        // used again afterwards.
        let generator = unsafe { ManuallyDrop::take(&mut self.generator) };
        // At most `size` members exist, so the bounded channel has room.
        let _ = self.idle_tx.send(generator);
    }
}

impl<T> IdGenerator for PoolGenerator<T>
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
        self.states()
    }
}
