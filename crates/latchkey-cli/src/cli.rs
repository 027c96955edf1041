//! Command line arguments

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Default configuration file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "conf/latchkey.yml";

/// Command line arguments for the latchkey binary
#[derive(Debug, Parser)]
#[command(
    name = "latchkey",
    version,
    about = "Run commands under a Redis-backed mutual exclusion lock"
)]
pub struct Cli {
    /// Configuration file (missing file is not an error)
    #[arg(short = 'c', long = "config", env = "LATCHKEY_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Redis URL, overrides `redis.url`
    #[arg(long = "redis-url", env = "REDIS_URL")]
    pub redis_url: Option<String>,

    /// Log level filter, overrides `log.level`
    #[arg(long = "log-level")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Acquire the lock, run a command, release the lock
    Run {
        /// Lock name
        name: String,
        /// Seconds to wait for the lock, overrides `lock.acquire_timeout_secs`
        #[arg(short = 'w', long = "wait")]
        wait: Option<u64>,
        /// Seconds before the store frees the lock, overrides `lock.auto_release_secs`
        #[arg(short = 'a', long = "auto-release")]
        auto_release: Option<u64>,
        /// Command and arguments to run
        #[arg(last = true, required = true, num_args = 1..)]
        command: Vec<String>,
    },
    /// Print whether the lock is currently held by anyone
    Status {
        /// Lock name
        name: String,
    },
    /// Delete the lock only if it still holds the given ownership token
    Release {
        /// Lock name
        name: String,
        /// Ownership token of the holder to release
        #[arg(long = "token")]
        token: String,
    },
}
