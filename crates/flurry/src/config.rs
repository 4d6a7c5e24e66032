//! Configuration for building a shared [`IdGenerator`].
//!
//! [`GeneratorConfig`] gathers everything a generator needs (layout, epoch,
//! node identity, concurrency strategy) into one explicit value. Callers parse
//! it from wherever they like (CLI flags, environment, files) and hand it to
//! [`GeneratorConfig::build`]; nothing in this crate reads configuration
//! sources itself.

use std::time::Duration;

use crate::{
    BasicGenerator, DEFAULT_SPIN_INTERVAL, Error, IdGenerator, Layout, LockGenerator, NodeId,
    PoolGenerator, Result, TWITTER_EPOCH, TimeSource,
};

/// How concurrent callers are serialized onto sequencing state.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Strategy {
    /// One generator behind a mutex. Consumes a single node.
    Lock,
    /// `size` generators on consecutive nodes, one borrowed per call.
    Pool { size: usize },
}

impl Default for Strategy {
    fn default() -> Self {
        Self::Pool { size: 1 }
    }
}

/// A shared generator behind its strategy.
pub type SharedGenerator = Box<dyn IdGenerator + Send + Sync>;

/// Everything needed to construct a generator.
///
/// # Example
///
/// ```
/// use flurry::{GeneratorConfig, IdGenerator, Layout, NodeId, Strategy, SystemClock};
///
/// let config = GeneratorConfig {
///     layout: Layout::DATACENTER,
///     node: NodeId::split(1, 4),
///     strategy: Strategy::Pool { size: 4 },
///     ..Default::default()
/// };
/// let generator = config.build(SystemClock)?;
/// assert_eq!(generator.states().len(), 4);
/// # Ok::<(), flurry::Error>(())
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct GeneratorConfig {
    pub layout: Layout,
    pub epoch: Duration,
    /// The node of the lock generator, or the first node of the pool.
    pub node: NodeId,
    pub strategy: Strategy,
    /// Sleep between clock polls while waiting for the next millisecond.
    pub spin_interval: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            layout: Layout::TWITTER,
            epoch: TWITTER_EPOCH,
            node: NodeId::default(),
            strategy: Strategy::default(),
            spin_interval: DEFAULT_SPIN_INTERVAL,
        }
    }
}

impl GeneratorConfig {
    /// Number of node identifiers this configuration occupies.
    pub const fn nodes_used(&self) -> usize {
        match self.strategy {
            Strategy::Lock => 1,
            Strategy::Pool { size } => size,
        }
    }

    /// Constructs the configured generator.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidIdentifier`] if any node does not fit the layout.
    /// - [`Error::InvalidEpoch`] if `epoch` is later than `time` reads now.
    /// - [`Error::EmptyPool`] for a pool of size zero.
    ///
    /// All are startup failures: the process should not serve.
    ///
    /// [`Error::InvalidIdentifier`]: crate::Error::InvalidIdentifier
    /// [`Error::InvalidEpoch`]: crate::Error::InvalidEpoch
    /// [`Error::EmptyPool`]: crate::Error::EmptyPool
    pub fn build<T>(&self, time: T) -> Result<SharedGenerator>
    where
        T: TimeSource + Clone + Send + 'static,
    {
        self.validate_epoch(&time)?;

        let generator: SharedGenerator = match self.strategy {
            Strategy::Lock => {
                let generator = BasicGenerator::new(self.layout, self.epoch, self.node, time)?
                    .with_spin_interval(self.spin_interval);
                Box::new(LockGenerator::from_generator(generator))
            }
            Strategy::Pool { size } => Box::new(
                PoolGenerator::new(self.layout, self.epoch, self.node, size, time)?
                    .with_spin_interval(self.spin_interval),
            ),
        };
        Ok(generator)
    }

    /// Checks that `epoch` is not ahead of `time`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEpoch`] otherwise.
    ///
    /// [`Error::InvalidEpoch`]: crate::Error::InvalidEpoch
    pub fn validate_epoch<T: TimeSource>(&self, time: &T) -> Result<()> {
        let now = time.current_millis();
        let epoch = u64::try_from(self.epoch.as_millis()).unwrap_or(u64::MAX);
        if epoch > now {
            return Err(Error::InvalidEpoch { epoch, now });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SystemClock;

    #[test]
    fn default_config_matches_classic_service() {
        let config = GeneratorConfig::default();
        assert_eq!(config.layout, Layout::TWITTER);
        assert_eq!(config.epoch.as_millis(), 1_288_834_974_657);
        assert_eq!(config.strategy, Strategy::Pool { size: 1 });
        assert_eq!(config.spin_interval, Duration::from_micros(100));
        assert_eq!(config.nodes_used(), 1);
    }

    #[test]
    fn build_lock_strategy() {
        let config = GeneratorConfig {
            node: NodeId::flat(9),
            strategy: Strategy::Lock,
            ..Default::default()
        };
        let generator = config.build(SystemClock).unwrap();
        let id = generator.next_id().unwrap();
        assert_eq!(generator.layout().decode(id).server, 9);
        assert_eq!(generator.states().len(), 1);
        assert_eq!(generator.epoch(), TWITTER_EPOCH);
    }

    #[test]
    fn build_pool_strategy() {
        let config = GeneratorConfig {
            node: NodeId::flat(100),
            strategy: Strategy::Pool { size: 3 },
            ..Default::default()
        };
        assert_eq!(config.nodes_used(), 3);
        let generator = config.build(SystemClock).unwrap();
        let servers: Vec<_> = generator.states().iter().map(|s| s.node.server).collect();
        assert_eq!(servers, [100, 101, 102]);
    }

    #[test]
    fn build_rejects_bad_configs() {
        let too_high = GeneratorConfig {
            node: NodeId::flat(1024),
            strategy: Strategy::Lock,
            ..Default::default()
        };
        assert!(matches!(
            too_high.build(SystemClock),
            Err(Error::InvalidIdentifier { .. })
        ));

        let empty = GeneratorConfig {
            strategy: Strategy::Pool { size: 0 },
            ..Default::default()
        };
        assert!(matches!(empty.build(SystemClock), Err(Error::EmptyPool)));
    }

    #[test]
    fn build_rejects_epoch_after_now() {
        #[derive(Clone)]
        struct Fixed(u64);
        impl TimeSource for Fixed {
            fn current_millis(&self) -> u64 {
                self.0
            }
        }

        let config = GeneratorConfig {
            epoch: Duration::from_millis(2_000),
            ..Default::default()
        };
        assert_eq!(
            config.build(Fixed(1_999)).err(),
            Some(Error::InvalidEpoch {
                epoch: 2_000,
                now: 1_999
            })
        );
        assert!(config.build(Fixed(2_000)).is_ok());

        let far = GeneratorConfig {
            epoch: Duration::from_millis(u64::MAX),
            strategy: Strategy::Lock,
            ..Default::default()
        };
        let err = far.build(SystemClock).err().unwrap();
        assert!(err.is_construction());
    }
}
