//! Configuration management for the latchkey binary
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults
//! 2. The configuration file (`conf/latchkey.yml` unless `--config` is given)
//! 3. Environment variables prefixed with `LATCHKEY_`, nested keys joined by
//!    `__` (e.g. `LATCHKEY_LOCK__AUTO_RELEASE_SECS=60`)
//! 4. Command line overrides

use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use latchkey_common::{
    DEFAULT_ACQUIRE_TIMEOUT_SECS, DEFAULT_AUTO_RELEASE_SECS, DEFAULT_BASE_RETRY_DELAY_MS,
    LockOptions,
};
use serde::Deserialize;

use crate::cli::Cli;

pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Output format of log records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Bunyan-style JSON lines
    #[default]
    Json,
    /// Human readable single lines
    Pretty,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisSettings {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LockSettings {
    pub auto_release_secs: u64,
    pub base_retry_delay_ms: u64,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    pub level: String,
    pub format: LogFormat,
}

/// Application settings loaded from defaults, file, environment and flags
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub redis: RedisSettings,
    pub lock: LockSettings,
    pub log: LogSettings,
}

impl Settings {
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("redis.url", DEFAULT_REDIS_URL)?
            .set_default("lock.auto_release_secs", DEFAULT_AUTO_RELEASE_SECS)?
            .set_default("lock.base_retry_delay_ms", DEFAULT_BASE_RETRY_DELAY_MS)?
            .set_default("lock.acquire_timeout_secs", DEFAULT_ACQUIRE_TIMEOUT_SECS)?
            .set_default("log.level", DEFAULT_LOG_LEVEL)?
            .set_default("log.format", "json")?
            .add_source(File::from(cli.config.as_path()).required(false))
            .add_source(
                Environment::with_prefix("LATCHKEY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        if let Some(url) = &cli.redis_url {
            builder = builder.set_override("redis.url", url.as_str())?;
        }
        if let Some(level) = &cli.log_level {
            builder = builder.set_override("log.level", level.as_str())?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn lock_options(&self) -> LockOptions {
        LockOptions::new()
            .with_auto_release_secs(self.lock.auto_release_secs)
            .with_base_retry_delay_ms(self.lock.base_retry_delay_ms)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.lock.acquire_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use clap::Parser;

    use super::*;

    fn cli_for(config: &std::path::Path, extra: &[&str]) -> Cli {
        let mut args = vec!["latchkey", "--config", config.to_str().unwrap()];
        args.extend_from_slice(extra);
        args.extend_from_slice(&["status", "jobs"]);
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_defaults_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let cli = cli_for(&dir.path().join("absent.yml"), &["--redis-url", DEFAULT_REDIS_URL]);
        let settings = Settings::load(&cli).unwrap();

        assert_eq!(settings.redis.url, DEFAULT_REDIS_URL);
        assert_eq!(settings.lock_options(), LockOptions::default());
        assert_eq!(settings.acquire_timeout(), Duration::from_secs(10));
        assert_eq!(settings.log.format, LogFormat::Json);
    }

    #[test]
    fn test_file_values_and_cli_overrides() {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(
            file,
            "redis:\n  url: redis://cache:6379/2\nlock:\n  auto_release_secs: 60\n  base_retry_delay_ms: 25\nlog:\n  level: debug\n  format: pretty"
        )
        .unwrap();

        let cli = cli_for(file.path(), &["--log-level", "warn"]);
        let settings = Settings::load(&cli).unwrap();

        // REDIS_URL from the environment would win over the file; only assert when unset
        if std::env::var("REDIS_URL").is_err() {
            assert_eq!(settings.redis.url, "redis://cache:6379/2");
        }
        assert_eq!(
            settings.lock_options(),
            LockOptions::new()
                .with_auto_release_secs(60)
                .with_base_retry_delay_ms(25)
        );
        assert_eq!(settings.lock.acquire_timeout_secs, 10);
        assert_eq!(settings.log.level, "warn");
        assert_eq!(settings.log.format, LogFormat::Pretty);
    }
}
