//! In-process store with Redis-like semantics.
//!
//! Keys expire lazily: an entry past its deadline is purged the next time it
//! is touched. Writes issued between `multi` and `exec` are queued and
//! applied in order on `exec`; reads inside a transaction see the committed
//! state. Scripts are not interpreted. Each script text maps to a registered
//! [`ScriptHandler`], and the lock release script is registered up front.

use super::options::SetOptions;
use super::reply::Reply;
use super::{DATABASE_COUNT, RELEASE_SCRIPT, Store};
use crate::error::{ExclusiveError, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Handler standing in for a server-side script.
///
/// Receives the selected keyspace, the script's keys and its arguments.
pub type ScriptHandler =
    Arc<dyn Fn(&mut Keyspace, &[String], &[String]) -> Result<Reply> + Send + Sync>;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// One logical database.
#[derive(Debug, Default)]
pub struct Keyspace {
    entries: HashMap<String, Entry>,
}

impl Keyspace {
    fn purge(&mut self, key: &str) {
        let now = Instant::now();
        if self.entries.get(key).is_some_and(|e| !e.is_live(now)) {
            self.entries.remove(key);
        }
    }

    /// Current value of `key`, if present and not expired.
    pub fn get(&mut self, key: &str) -> Option<&str> {
        self.purge(key);
        self.entries.get(key).map(|e| e.value.as_str())
    }

    /// Remove `key`, returning whether it existed.
    pub fn remove(&mut self, key: &str) -> bool {
        self.purge(key);
        self.entries.remove(key).is_some()
    }

    /// Remaining time to live of `key`. `None` if absent or persistent.
    pub fn ttl(&mut self, key: &str) -> Option<Duration> {
        self.purge(key);
        self.entries
            .get(key)
            .and_then(|e| e.expires_at)
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// Apply a `SET` and return the reply Redis would send.
    pub fn set(&mut self, key: &str, value: &str, options: &SetOptions) -> Result<Reply> {
        options.validate()?;
        self.purge(key);

        let existing = self.entries.get(key);
        let old = existing
            .map(|e| Reply::Bulk(e.value.clone()))
            .unwrap_or(Reply::Nil);

        let blocked = (options.only_if_absent && existing.is_some())
            || (options.only_if_present && existing.is_none());
        if blocked {
            return Ok(if options.return_old { old } else { Reply::Nil });
        }

        let expires_at = if options.keep_ttl {
            existing.and_then(|e| e.expires_at)
        } else {
            expiry_from(options, Instant::now())
        };

        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );

        Ok(if options.return_old {
            old
        } else {
            Reply::Status("OK".to_string())
        })
    }
}

fn expiry_from(options: &SetOptions, now: Instant) -> Option<Instant> {
    if let Some(secs) = options.expire_secs {
        return Some(now + Duration::from_secs(secs));
    }
    if let Some(ms) = options.expire_ms {
        return Some(now + Duration::from_millis(ms));
    }

    let at_ms = options
        .expire_at_ms
        .or(options.expire_at_secs.map(|s| s.saturating_mul(1000)))?;
    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);

    Some(now + Duration::from_millis(at_ms.saturating_sub(now_ms)))
}

fn compare_and_delete(keyspace: &mut Keyspace, keys: &[String], args: &[String]) -> Result<Reply> {
    let (Some(key), Some(expected)) = (keys.first(), args.first()) else {
        return Err(ExclusiveError::Store(
            "compare-and-delete expects one key and one argument".to_string(),
        ));
    };

    if keyspace.get(key) == Some(expected.as_str()) {
        keyspace.remove(key);
        Ok(Reply::Int(1))
    } else {
        Ok(Reply::Int(0))
    }
}

enum Queued {
    Set {
        key: String,
        value: String,
        options: SetOptions,
    },
    Remove(Vec<String>),
    Eval {
        handler: ScriptHandler,
        keys: Vec<String>,
        args: Vec<String>,
    },
}

struct State {
    databases: Vec<Keyspace>,
    selected: usize,
    queued: Option<Vec<Queued>>,
}

impl State {
    fn keyspace(&mut self) -> &mut Keyspace {
        &mut self.databases[self.selected]
    }
}

/// Store keeping all data in process memory.
pub struct MemoryStore {
    state: Mutex<State>,
    scripts: Mutex<HashMap<String, ScriptHandler>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let mut scripts: HashMap<String, ScriptHandler> = HashMap::new();
        scripts.insert(RELEASE_SCRIPT.to_string(), Arc::new(compare_and_delete));

        Self {
            state: Mutex::new(State {
                databases: (0..DATABASE_COUNT).map(|_| Keyspace::default()).collect(),
                selected: 0,
                queued: None,
            }),
            scripts: Mutex::new(scripts),
        }
    }

    /// Register a handler evaluated in place of `script`.
    pub fn register_script(&self, script: &str, handler: ScriptHandler) {
        self.scripts
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .insert(script.to_string(), handler);
    }

    /// Remaining time to live of `key` in the selected database.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        self.state().keyspace().ttl(key)
    }

    /// Index of the currently selected database.
    pub fn selected_database(&self) -> u32 {
        self.state().selected as u32
    }

    /// Whether a transaction block is open.
    pub fn in_transaction(&self) -> bool {
        self.state().queued.is_some()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    fn script(&self, script: &str) -> Result<ScriptHandler> {
        self.scripts
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .get(script)
            .cloned()
            .ok_or_else(|| ExclusiveError::Store("script not registered for eval".to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("MemoryStore")
            .field("selected", &state.selected)
            .field("in_transaction", &state.queued.is_some())
            .finish()
    }
}

impl Store for MemoryStore {
    fn select(&self, database: u32) -> Result<bool> {
        if database >= DATABASE_COUNT {
            return Err(ExclusiveError::Store(format!(
                "DB index {} is out of range",
                database
            )));
        }

        self.state().selected = database as usize;
        Ok(true)
    }

    fn set(&self, key: &str, value: &str, options: &SetOptions) -> Result<bool> {
        let mut state = self.state();

        if let Some(queue) = state.queued.as_mut() {
            options.validate()?;
            queue.push(Queued::Set {
                key: key.to_string(),
                value: value.to_string(),
                options: options.clone(),
            });
            return Ok(true);
        }

        let reply = state.keyspace().set(key, value, options)?;
        Ok(options.written(reply.is_nil()))
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.state().keyspace().get(key).map(str::to_string))
    }

    fn remove(&self, keys: &[&str]) -> Result<u64> {
        let mut state = self.state();

        if let Some(queue) = state.queued.as_mut() {
            queue.push(Queued::Remove(keys.iter().map(|k| k.to_string()).collect()));
            return Ok(0);
        }

        let keyspace = state.keyspace();
        Ok(keys.iter().filter(|key| keyspace.remove(key)).count() as u64)
    }

    fn eval(&self, script: &str, keys: &[&str], args: &[&str]) -> Result<Reply> {
        let handler = self.script(script)?;
        let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();

        let mut state = self.state();

        if let Some(queue) = state.queued.as_mut() {
            queue.push(Queued::Eval {
                handler,
                keys,
                args,
            });
            return Ok(Reply::Status("QUEUED".to_string()));
        }

        handler(state.keyspace(), &keys, &args)
    }

    fn multi(&self) -> Result<()> {
        let mut state = self.state();

        if state.queued.is_some() {
            return Err(ExclusiveError::Store(
                "MULTI calls can not be nested".to_string(),
            ));
        }

        state.queued = Some(Vec::new());
        Ok(())
    }

    fn exec(&self) -> Result<Vec<Reply>> {
        let mut state = self.state();

        let queue = state
            .queued
            .take()
            .ok_or_else(|| ExclusiveError::Store("EXEC without MULTI".to_string()))?;

        let keyspace = state.keyspace();
        let replies = queue
            .into_iter()
            .map(|command| {
                let outcome = match command {
                    Queued::Set {
                        key,
                        value,
                        options,
                    } => keyspace.set(&key, &value, &options),
                    Queued::Remove(keys) => Ok(Reply::Int(
                        keys.iter().filter(|key| keyspace.remove(key)).count() as i64,
                    )),
                    Queued::Eval {
                        handler,
                        keys,
                        args,
                    } => handler(keyspace, &keys, &args),
                };
                outcome.unwrap_or_else(|e| Reply::Status(format!("ERR {}", e)))
            })
            .collect();

        Ok(replies)
    }

    fn discard(&self) -> Result<()> {
        self.state()
            .queued
            .take()
            .map(|_| ())
            .ok_or_else(|| ExclusiveError::Store("DISCARD without MULTI".to_string()))
    }
}
