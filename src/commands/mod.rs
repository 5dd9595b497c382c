//! Command implementations for the redis-exclusive worker.
//!
//! `dispatch` loads configuration and connects to Redis; every handler then
//! works against any [`Store`] and writes its report to the given output.

use crate::cli::{ClearArgs, Cli, Command, HoldArgs, MultiHoldArgs, ShowArgs};
use redis_exclusive::locks::ReleaseGuard;
use redis_exclusive::{
    Config, ExclusiveError, Lock, LockFactory, RedisStore, Result, Store, owner_token,
};
use serde_json::json;
use std::io::Write;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Dispatch a command to its implementation.
pub fn dispatch(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::from_env()?,
    };

    let store = Arc::new(RedisStore::open(&config.redis_url()?)?);
    let factory = LockFactory::from_config(store, &config);
    tracing::info!(
        prefix = factory.prefix(),
        database = factory.database_number(),
        "connected"
    );

    run(cli.command, &factory, &config, &mut std::io::stdout())
}

/// Run `command` against `factory`, writing its report to `out`.
pub fn run<S, W>(
    command: Command,
    factory: &LockFactory<S>,
    config: &Config,
    out: &mut W,
) -> Result<()>
where
    S: Store + ?Sized,
    W: Write,
{
    match command {
        Command::Hold(args) => cmd_hold(args, factory, config, out),
        Command::MultiHold(args) => cmd_multi_hold(args, factory, config, out),
        Command::Show(args) => cmd_show(args, factory, out),
        Command::Clear(args) => cmd_clear(args, factory, out),
    }
}

fn cmd_hold<S, W>(
    args: HoldArgs,
    factory: &LockFactory<S>,
    config: &Config,
    out: &mut W,
) -> Result<()>
where
    S: Store + ?Sized,
    W: Write,
{
    let ttl = args.ttl_ms.map(Duration::from_millis).unwrap_or(config.default_ttl());
    let owner = args.owner.unwrap_or_else(owner_token);
    let hold = Duration::from_millis(args.hold_ms);

    if args.retry {
        let mut lock = factory.lock(&args.key, ttl, owner)?;
        if !lock.acquire_with_retry(config.max_wait(), config.backoff())? {
            report(out, &format!("failed:{}", args.key))?;
            return Err(ExclusiveError::lock_acquisition());
        }

        let guard = ReleaseGuard::new(&mut lock);
        report(out, &format!("acquired:{}", args.key))?;
        thread::sleep(hold);
        guard.release()?;
        return Ok(());
    }

    let outcome: Result<()> = factory.transactional(&args.key, ttl, owner, || {
        report(out, &format!("acquired:{}", args.key))?;
        thread::sleep(hold);
        Ok(())
    });

    if let Err(ExclusiveError::LockAcquisition(_)) = &outcome {
        report(out, &format!("failed:{}", args.key))?;
    }
    outcome
}

fn cmd_multi_hold<S, W>(
    args: MultiHoldArgs,
    factory: &LockFactory<S>,
    config: &Config,
    out: &mut W,
) -> Result<()>
where
    S: Store + ?Sized,
    W: Write,
{
    let ttl = args.ttl_ms.map(Duration::from_millis).unwrap_or(config.default_ttl());
    let owner = args.owner.unwrap_or_else(owner_token);
    let hold = Duration::from_millis(args.hold_ms);
    let label = args.keys.join(",");

    let outcome: Result<()> = factory.multi_transactional(args.keys, ttl, owner, || {
        report(out, &format!("acquired:{}", label))?;
        thread::sleep(hold);
        Ok(())
    });

    if let Err(ExclusiveError::LockAcquisition(_)) = &outcome {
        report(out, &format!("failed:{}", label))?;
    }
    outcome
}

fn cmd_show<S, W>(args: ShowArgs, factory: &LockFactory<S>, out: &mut W) -> Result<()>
where
    S: Store + ?Sized,
    W: Write,
{
    let key = format!("{}{}", factory.prefix(), args.key);
    factory.client().select(factory.database_number())?;
    let owner = factory.client().get(&key)?;

    let line = if args.json {
        json!({
            "key": key,
            "locked": owner.is_some(),
            "owner": owner,
        })
        .to_string()
    } else {
        match owner {
            Some(owner) => format!("{} (owner: {})", key, owner),
            None => format!("{} (free)", key),
        }
    };

    report(out, &line)
}

fn cmd_clear<S, W>(args: ClearArgs, factory: &LockFactory<S>, out: &mut W) -> Result<()>
where
    S: Store + ?Sized,
    W: Write,
{
    let key = format!("{}{}", factory.prefix(), args.key);

    if !args.force {
        return Err(ExclusiveError::UserError(format!(
            "refusing to clear '{}' without --force",
            key
        )));
    }

    factory.client().select(factory.database_number())?;
    if factory.client().remove(&[key.as_str()])? == 0 {
        return Err(ExclusiveError::UserError(format!(
            "lock '{}' does not exist",
            key
        )));
    }

    tracing::info!(key = %key, "lock cleared");
    report(out, &format!("cleared:{}", key))
}

fn report<W: Write>(out: &mut W, line: &str) -> Result<()> {
    writeln!(out, "{}", line)
        .and_then(|_| out.flush())
        .map_err(|e| ExclusiveError::UserError(format!("failed to write output: {}", e)))
}
