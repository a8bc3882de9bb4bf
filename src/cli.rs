use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Command-line flags. Every flag overrides its environment and default
/// counterparts when set; see [`crate::config::Config::resolve`].
#[derive(Parser, Debug, Default)]
#[command(name = "peskar-hub")]
#[command(about = "Central hub coordinating media download workers", version)]
pub struct Cli {
    /// HTTP listen address
    #[arg(long = "listen-addr", value_name = "ADDR")]
    pub listen_addr: Option<String>,

    /// Data directory for state snapshots
    #[arg(long)]
    pub datadir: Option<PathBuf>,

    /// Number of jobs allowed to run in parallel
    #[arg(long = "parallel-jobs")]
    pub parallel_jobs: Option<usize>,

    /// Level at which the hub should log messages
    #[arg(long = "log-level")]
    pub log_level: Option<String>,

    /// Redis server URL
    #[arg(long = "redis-addr")]
    pub redis_addr: Option<String>,

    /// Close Redis connections after remaining idle for this duration
    #[arg(long = "redis-idle-timeout", value_parser = humantime::parse_duration)]
    pub redis_idle_timeout: Option<Duration>,

    /// Maximum number of idle connections in the Redis pool
    #[arg(long = "redis-max-idle")]
    pub redis_max_idle: Option<usize>,

    /// Enable dnd mode
    #[arg(long = "dnd-enable")]
    pub dnd_enable: bool,

    /// Dnd mode start hour
    #[arg(long = "dnd-start")]
    pub dnd_start: Option<i64>,

    /// Dnd mode end hour
    #[arg(long = "dnd-end")]
    pub dnd_end: Option<i64>,
}
