//! CLI argument parsing for the redis-exclusive worker.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// redis-exclusive: take, inspect and clear distributed locks from the shell.
///
/// Each process acts as an independent lock owner, which makes the binary a
/// convenient worker for exercising contention between processes.
#[derive(Parser, Debug)]
#[command(name = "redis-exclusive")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// YAML config file. Without it, defaults and REDIS_EXCLUSIVE_* variables apply.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Hold a lock inside a transaction for a while.
    ///
    /// Prints `acquired:<key>` once the lock is held, or `failed:<key>` and
    /// exits with code 4 when another owner holds it.
    Hold(HoldArgs),

    /// Hold several locks at once, all or nothing.
    MultiHold(MultiHoldArgs),

    /// Show who holds a lock.
    Show(ShowArgs),

    /// Force-delete a lock regardless of owner.
    ///
    /// Requires --force to prevent accidental clearing.
    Clear(ClearArgs),
}

/// Arguments for the `hold` command.
#[derive(Parser, Debug)]
pub struct HoldArgs {
    /// Logical lock key (the configured prefix is prepended).
    pub key: String,

    /// How long to keep the lock, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    pub hold_ms: u64,

    /// Lock TTL in milliseconds (defaults to `default_ttl_ms`).
    #[arg(long)]
    pub ttl_ms: Option<u64>,

    /// Owner token (defaults to `user@HOST:pid`).
    #[arg(long)]
    pub owner: Option<String>,

    /// Poll until the lock frees up, using the configured retry policy.
    #[arg(long)]
    pub retry: bool,
}

/// Arguments for the `multi-hold` command.
#[derive(Parser, Debug)]
pub struct MultiHoldArgs {
    /// Logical lock keys.
    #[arg(required = true)]
    pub keys: Vec<String>,

    /// How long to keep the locks, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    pub hold_ms: u64,

    /// Lock TTL in milliseconds (defaults to `default_ttl_ms`).
    #[arg(long)]
    pub ttl_ms: Option<u64>,

    /// Owner token (defaults to `user@HOST:pid`).
    #[arg(long)]
    pub owner: Option<String>,
}

/// Arguments for the `show` command.
#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Logical lock key.
    pub key: String,

    /// Print as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `clear` command.
#[derive(Parser, Debug)]
pub struct ClearArgs {
    /// Logical lock key.
    pub key: String,

    /// Confirm clearing a lock another process may still rely on.
    #[arg(long)]
    pub force: bool,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
