//! Redis-backed store over a blocking connection.
//!
//! One connection is shared behind a mutex: `MULTI` state lives on the
//! connection, so queued writes and the final `EXEC`/`DISCARD` must travel
//! over the same socket.

use super::options::{OptionDispatcher, SetOptions};
use super::reply::Reply;
use super::Store;
use crate::error::{ExclusiveError, Result};
use redis::{Client, Connection, Value};
use std::sync::{Mutex, MutexGuard};

/// Store talking to a Redis-compatible server.
pub struct RedisStore {
    connection: Mutex<Connection>,
    dispatcher: OptionDispatcher,
}

impl RedisStore {
    /// Connect to `url` (e.g. `redis://127.0.0.1:6379/`) and verify the server answers.
    pub fn open(url: &str) -> Result<Self> {
        let client = Client::open(url)
            .map_err(|e| ExclusiveError::Store(format!("failed to create redis client: {}", e)))?;

        let mut connection = client.get_connection().map_err(|e| {
            ExclusiveError::Store(format!("failed to connect to redis at {}: {}", url, e))
        })?;

        let pong: String = redis::cmd("PING")
            .query(&mut connection)
            .map_err(|e| ExclusiveError::Store(format!("redis ping failed: {}", e)))?;
        if pong != "PONG" {
            return Err(ExclusiveError::Store(
                "redis ping did not return pong".to_string(),
            ));
        }

        tracing::debug!("redis connection established");

        Ok(Self::new(connection, OptionDispatcher::default()))
    }

    /// Wrap an existing connection with a custom option dispatcher.
    pub fn new(connection: Connection, dispatcher: OptionDispatcher) -> Self {
        Self {
            connection: Mutex::new(connection),
            dispatcher,
        }
    }

    fn connection(&self) -> MutexGuard<'_, Connection> {
        self.connection
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

impl Store for RedisStore {
    fn select(&self, database: u32) -> Result<bool> {
        redis::cmd("SELECT")
            .arg(database)
            .query::<()>(&mut *self.connection())?;
        Ok(true)
    }

    fn set(&self, key: &str, value: &str, options: &SetOptions) -> Result<bool> {
        let args = self.dispatcher.dispatch("SET", options)?;

        let reply: Value = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg(&args)
            .query(&mut *self.connection())?;

        Ok(options.written(matches!(reply, Value::Nil)))
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = redis::cmd("GET")
            .arg(key)
            .query(&mut *self.connection())?;
        Ok(value)
    }

    fn remove(&self, keys: &[&str]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }

        let reply: Value = redis::cmd("DEL")
            .arg(keys)
            .query(&mut *self.connection())?;

        // Inside MULTI the reply is QUEUED rather than a count.
        Ok(match reply {
            Value::Int(n) => n.max(0) as u64,
            _ => 0,
        })
    }

    fn eval(&self, script: &str, keys: &[&str], args: &[&str]) -> Result<Reply> {
        let reply: Value = redis::cmd("EVAL")
            .arg(script)
            .arg(keys.len())
            .arg(keys)
            .arg(args)
            .query(&mut *self.connection())?;
        Ok(Reply::from(reply))
    }

    fn multi(&self) -> Result<()> {
        redis::cmd("MULTI").query::<()>(&mut *self.connection())?;
        Ok(())
    }

    fn exec(&self) -> Result<Vec<Reply>> {
        let reply: Value = redis::cmd("EXEC").query(&mut *self.connection())?;

        match Reply::from(reply) {
            Reply::Array(replies) => Ok(replies),
            Reply::Nil => Err(ExclusiveError::Store(
                "transaction aborted by the server".to_string(),
            )),
            other => Err(ExclusiveError::Store(format!(
                "unexpected EXEC reply: {:?}",
                other
            ))),
        }
    }

    fn discard(&self) -> Result<()> {
        redis::cmd("DISCARD").query::<()>(&mut *self.connection())?;
        Ok(())
    }
}
