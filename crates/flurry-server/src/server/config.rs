use anyhow::bail;
use clap::{Parser, ValueEnum};
use core::time::Duration;
use flurry::{
    GeneratorConfig, Layout, NodeId, Strategy, SystemClock, TWITTER_EPOCH, TimeSource,
};

/// Bit layout selectable from the command line.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum LayoutKind {
    /// 41-bit timestamp, 10-bit machine id, 12-bit sequence.
    Twitter,
    /// 41-bit timestamp, 5-bit datacenter id, 5-bit machine id, 12-bit
    /// sequence.
    Datacenter,
}

/// Concurrency strategy selectable from the command line.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum StrategyKind {
    /// A single generator behind a mutex.
    Lock,
    /// `POOL_SIZE` generators on consecutive machine ids.
    Pool,
}

/// Runtime configuration for the `flurry-server` binary.
///
/// All values are parsed from CLI arguments or environment variables. A
/// `.env` file in the working directory is loaded before parsing.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "flurry-server",
    version,
    about = "An HTTP service handing out Snowflake-like IDs"
)]
pub struct CliArgs {
    /// Address to listen on.
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:8181"))]
    pub server_addr: String,

    /// Machine id of the lock generator, or the first machine id of the
    /// pool.
    ///
    /// A pool of `N` generators uses `MACHINE_ID..MACHINE_ID + N`; every id
    /// in that range must fit the layout's machine field.
    ///
    /// Environment variable: `MACHINE_ID`
    #[arg(long, env = "MACHINE_ID", default_value_t = 0)]
    pub machine_id: u64,

    /// Datacenter id. Only valid with `--layout datacenter`, where it
    /// defaults to 0.
    ///
    /// Environment variable: `DATACENTER_ID`
    #[arg(long, env = "DATACENTER_ID")]
    pub datacenter_id: Option<u64>,

    /// Number of independently sequenced generators.
    ///
    /// Must be 1 with `--strategy lock`.
    ///
    /// Environment variable: `POOL_SIZE`
    #[arg(long, env = "POOL_SIZE", default_value_t = 1)]
    pub pool_size: usize,

    /// How concurrent requests share generator state.
    ///
    /// Environment variable: `STRATEGY`
    #[arg(long, env = "STRATEGY", value_enum, default_value_t = StrategyKind::Pool)]
    pub strategy: StrategyKind,

    /// Bit layout of generated IDs.
    ///
    /// Environment variable: `LAYOUT`
    #[arg(long, env = "LAYOUT", value_enum, default_value_t = LayoutKind::Twitter)]
    pub layout: LayoutKind,

    /// Custom epoch in milliseconds since the UNIX epoch.
    ///
    /// Changing this on a running deployment breaks ordering against IDs
    /// already issued.
    ///
    /// Environment variable: `EPOCH_MS`
    #[arg(long, env = "EPOCH_MS", default_value_t = TWITTER_EPOCH.as_millis() as u64)]
    pub epoch_ms: u64,

    /// Sleep between clock polls, in microseconds, while waiting out an
    /// exhausted millisecond. 0 busy-spins.
    ///
    /// Environment variable: `SPIN_MICROS`
    #[arg(long, env = "SPIN_MICROS", default_value_t = 100)]
    pub spin_micros: u64,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_addr: String,
    pub generator: GeneratorConfig,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.pool_size == 0 {
            bail!("POOL_SIZE must be greater than 0");
        }

        let now = SystemClock.current_millis();
        if args.epoch_ms > now {
            bail!("EPOCH_MS ({}) is later than the current time ({now})", args.epoch_ms);
        }

        let strategy = match args.strategy {
            StrategyKind::Lock if args.pool_size != 1 => {
                bail!("POOL_SIZE ({}) must be 1 with STRATEGY=lock", args.pool_size);
            }
            StrategyKind::Lock => Strategy::Lock,
            StrategyKind::Pool => Strategy::Pool {
                size: args.pool_size,
            },
        };

        let (layout, node) = match (args.layout, args.datacenter_id) {
            (LayoutKind::Twitter, Some(datacenter_id)) => {
                bail!("DATACENTER_ID ({datacenter_id}) requires LAYOUT=datacenter");
            }
            (LayoutKind::Twitter, None) => (Layout::TWITTER, NodeId::flat(args.machine_id)),
            (LayoutKind::Datacenter, datacenter_id) => (
                Layout::DATACENTER,
                NodeId::split(datacenter_id.unwrap_or(0), args.machine_id),
            ),
        };

        Ok(Self {
            server_addr: args.server_addr,
            generator: GeneratorConfig {
                layout,
                epoch: Duration::from_millis(args.epoch_ms),
                node,
                strategy,
                spin_interval: Duration::from_micros(args.spin_micros),
            },
        })
    }
}
