//! Configuration resolution: built-in defaults, then `PESKAR_*`
//! environment variables, then command-line flags (flags win when set).

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::cli::Cli;

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_DATA_DIR: &str = "/opt/peskar/data";
pub const DEFAULT_PARALLEL_JOB_COUNT: usize = 1;
pub const DEFAULT_REDIS_ADDR: &str = "redis://localhost:6379/0";
pub const DEFAULT_REDIS_IDLE_TIMEOUT: Duration = Duration::from_secs(240);
pub const DEFAULT_REDIS_MAX_IDLE: usize = 3;
pub const DEFAULT_DND_STARTS_AT: i64 = 7;
pub const DEFAULT_DND_ENDS_AT: i64 = 18;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Must specify Redis server URL using -redis-addr")]
    MissingRedisAddr,

    #[error("Must specify Redis idle timeout using -redis-idle-timeout")]
    MissingRedisIdleTimeout,

    #[error("Must specify Redis max idle using -redis-max-idle")]
    MissingRedisMaxIdle,

    #[error("Must specify number of parallel jobs using -parallel-jobs")]
    MissingParallelJobs,

    #[error("Must specify HTTP listen address using -listen-addr")]
    MissingListenAddr,

    #[error("Must specify data directory using -datadir")]
    MissingDataDir,

    #[error("Unknown log level: {0}")]
    UnknownLogLevel(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: String,
    pub data_dir: PathBuf,
    pub log_level: Option<String>,
    pub parallel_job_count: usize,
    pub redis_addr: String,
    pub redis_idle_timeout: Duration,
    pub redis_max_idle: usize,
    pub dnd_enable: bool,
    pub dnd_starts_at: i64,
    pub dnd_ends_at: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            log_level: None,
            parallel_job_count: DEFAULT_PARALLEL_JOB_COUNT,
            redis_addr: DEFAULT_REDIS_ADDR.to_string(),
            redis_idle_timeout: DEFAULT_REDIS_IDLE_TIMEOUT,
            redis_max_idle: DEFAULT_REDIS_MAX_IDLE,
            dnd_enable: false,
            dnd_starts_at: DEFAULT_DND_STARTS_AT,
            dnd_ends_at: DEFAULT_DND_ENDS_AT,
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

fn env_hour(name: &str) -> Option<i64> {
    env_string(name).and_then(|value| value.parse().ok())
}

impl Config {
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = Config::default();
        config.apply_env();
        config.apply_flags(cli);
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Some(addr) = env_string("PESKAR_REDIS_ADDR") {
            self.redis_addr = addr;
        }
        if let Some(addr) = env_string("PESKAR_LISTEN_ADDR") {
            self.listen_addr = addr;
        }
        if let Some(dir) = env_string("PESKAR_DATADIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if env_string("PESKAR_DND_MODE").is_some() {
            self.dnd_enable = true;
        }
        if let Some(hour) = env_hour("PESKAR_DND_START") {
            self.dnd_starts_at = hour;
        }
        if let Some(hour) = env_hour("PESKAR_DND_END") {
            self.dnd_ends_at = hour;
        }
    }

    fn apply_flags(&mut self, cli: &Cli) {
        if let Some(dir) = &cli.datadir {
            self.data_dir = dir.clone();
        }
        if let Some(count) = cli.parallel_jobs {
            self.parallel_job_count = count;
        }
        if let Some(addr) = &cli.listen_addr {
            self.listen_addr = addr.clone();
        }
        if let Some(addr) = &cli.redis_addr {
            self.redis_addr = addr.clone();
        }
        if let Some(timeout) = cli.redis_idle_timeout {
            self.redis_idle_timeout = timeout;
        }
        if let Some(max_idle) = cli.redis_max_idle {
            self.redis_max_idle = max_idle;
        }
        if let Some(level) = &cli.log_level {
            self.log_level = Some(level.clone());
        }
        if cli.dnd_enable {
            self.dnd_enable = true;
        }
        if let Some(hour) = cli.dnd_start {
            self.dnd_starts_at = hour;
        }
        if let Some(hour) = cli.dnd_end {
            self.dnd_ends_at = hour;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.redis_addr.is_empty() {
            return Err(ConfigError::MissingRedisAddr);
        }
        if self.redis_idle_timeout.is_zero() {
            return Err(ConfigError::MissingRedisIdleTimeout);
        }
        if self.redis_max_idle == 0 {
            return Err(ConfigError::MissingRedisMaxIdle);
        }
        if self.parallel_job_count == 0 {
            return Err(ConfigError::MissingParallelJobs);
        }
        if self.listen_addr.is_empty() {
            return Err(ConfigError::MissingListenAddr);
        }
        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingDataDir);
        }
        if let Some(level) = &self.log_level {
            level
                .parse::<tracing::Level>()
                .map_err(|_| ConfigError::UnknownLogLevel(level.clone()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Environment-variable precedence is exercised manually; tests avoid
    // mutating the process environment.

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.data_dir, PathBuf::from("/opt/peskar/data"));
        assert_eq!(config.parallel_job_count, 1);
        assert_eq!(config.redis_addr, "redis://localhost:6379/0");
        assert_eq!(config.redis_idle_timeout, Duration::from_secs(240));
        assert_eq!(config.redis_max_idle, 3);
        assert!(!config.dnd_enable);
        assert_eq!(config.dnd_starts_at, 7);
        assert_eq!(config.dnd_ends_at, 18);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli {
            listen_addr: Some("127.0.0.1:9000".to_string()),
            parallel_jobs: Some(4),
            redis_max_idle: Some(10),
            dnd_enable: true,
            dnd_start: Some(9),
            ..Cli::default()
        };
        let mut config = Config::default();
        config.apply_flags(&cli);
        assert_eq!(config.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.parallel_job_count, 4);
        assert_eq!(config.redis_max_idle, 10);
        assert!(config.dnd_enable);
        assert_eq!(config.dnd_starts_at, 9);
        assert_eq!(config.dnd_ends_at, 18);
    }

    #[test]
    fn test_validate_rejects_zeroed_required_fields() {
        let mut config = Config::default();
        config.redis_addr = String::new();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRedisAddr)
        ));

        let mut config = Config::default();
        config.redis_idle_timeout = Duration::ZERO;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRedisIdleTimeout)
        ));

        let mut config = Config::default();
        config.redis_max_idle = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRedisMaxIdle)
        ));

        let mut config = Config::default();
        config.parallel_job_count = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingParallelJobs)
        ));
    }

    #[test]
    fn test_validate_log_level() {
        let mut config = Config::default();
        config.log_level = Some("debug".to_string());
        assert!(config.validate().is_ok());

        config.log_level = Some("verbose".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownLogLevel(_))
        ));
    }
}
