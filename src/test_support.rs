use crate::error::{ExclusiveError, Result};
use crate::store::{MemoryStore, Reply, SetOptions, Store};
use std::sync::{Mutex, MutexGuard};

/// A store call as observed by [`RecordingStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Select(u32),
    Set(String),
    Get(String),
    Remove(Vec<String>),
    Eval(Vec<String>),
    Multi,
    Exec,
    Discard,
}

/// In-memory store that records every call in order.
///
/// Optionally fails `set` for one key to simulate a store outage mid-sequence.
#[derive(Default)]
pub(crate) struct RecordingStore {
    inner: MemoryStore,
    calls: Mutex<Vec<Call>>,
    failing_key: Mutex<Option<String>>,
}

impl RecordingStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.log().clone()
    }

    /// Keys passed to `set`, in call order.
    pub(crate) fn set_keys(&self) -> Vec<String> {
        self.log()
            .iter()
            .filter_map(|call| match call {
                Call::Set(key) => Some(key.clone()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn clear_calls(&self) {
        self.log().clear();
    }

    pub(crate) fn fail_set_for(&self, key: &str) {
        *self
            .failing_key
            .lock()
            .unwrap_or_else(|poison| poison.into_inner()) = Some(key.to_string());
    }

    fn log(&self) -> MutexGuard<'_, Vec<Call>> {
        self.calls.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    fn record(&self, call: Call) {
        self.log().push(call);
    }
}

impl Store for RecordingStore {
    fn select(&self, database: u32) -> Result<bool> {
        self.record(Call::Select(database));
        self.inner.select(database)
    }

    fn set(&self, key: &str, value: &str, options: &SetOptions) -> Result<bool> {
        self.record(Call::Set(key.to_string()));

        let failing = self
            .failing_key
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone();
        if failing.as_deref() == Some(key) {
            return Err(ExclusiveError::Store(format!(
                "connection reset while writing '{}'",
                key
            )));
        }

        self.inner.set(key, value, options)
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        self.record(Call::Get(key.to_string()));
        self.inner.get(key)
    }

    fn remove(&self, keys: &[&str]) -> Result<u64> {
        self.record(Call::Remove(keys.iter().map(|k| k.to_string()).collect()));
        self.inner.remove(keys)
    }

    fn eval(&self, script: &str, keys: &[&str], args: &[&str]) -> Result<Reply> {
        self.record(Call::Eval(keys.iter().map(|k| k.to_string()).collect()));
        self.inner.eval(script, keys, args)
    }

    fn multi(&self) -> Result<()> {
        self.record(Call::Multi);
        self.inner.multi()
    }

    fn exec(&self) -> Result<Vec<Reply>> {
        self.record(Call::Exec);
        self.inner.exec()
    }

    fn discard(&self) -> Result<()> {
        self.record(Call::Discard);
        self.inner.discard()
    }
}
