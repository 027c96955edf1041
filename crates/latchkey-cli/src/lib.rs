//! Latchkey CLI - Run commands under a Redis-backed lock
//!
//! This crate provides:
//! - Command line parsing
//! - Layered configuration (defaults, file, environment, flags)
//! - Logging setup
//! - Subcommand handlers

pub mod cli;
pub mod commands;
pub mod logging;
pub mod settings;

pub use cli::{Cli, Commands};
pub use settings::{LogFormat, Settings};
