//! Command options and their translation into driver arguments.
//!
//! Callers describe a write with [`SetOptions`]. A driver that speaks the
//! Redis protocol turns those options into raw command arguments through an
//! [`OptionDispatcher`], which routes each command to the first
//! [`OptionAdaptor`] that supports it.

use crate::error::{ExclusiveError, Result};

/// Options for a `SET` command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Relative expiry in seconds (`EX`).
    pub expire_secs: Option<u64>,
    /// Relative expiry in milliseconds (`PX`).
    pub expire_ms: Option<u64>,
    /// Absolute expiry as a unix timestamp in seconds (`EXAT`).
    pub expire_at_secs: Option<u64>,
    /// Absolute expiry as a unix timestamp in milliseconds (`PXAT`).
    pub expire_at_ms: Option<u64>,
    /// Only write when the key does not exist (`NX`).
    pub only_if_absent: bool,
    /// Only write when the key already exists (`XX`).
    pub only_if_present: bool,
    /// Keep the remaining TTL of an existing key (`KEEPTTL`).
    pub keep_ttl: bool,
    /// Ask the server for the previous value (`GET`).
    pub return_old: bool,
}

impl SetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expire_secs(mut self, secs: u64) -> Self {
        self.expire_secs = Some(secs);
        self
    }

    pub fn expire_ms(mut self, ms: u64) -> Self {
        self.expire_ms = Some(ms);
        self
    }

    pub fn expire_at_secs(mut self, timestamp: u64) -> Self {
        self.expire_at_secs = Some(timestamp);
        self
    }

    pub fn expire_at_ms(mut self, timestamp_ms: u64) -> Self {
        self.expire_at_ms = Some(timestamp_ms);
        self
    }

    pub fn only_if_absent(mut self) -> Self {
        self.only_if_absent = true;
        self
    }

    pub fn only_if_present(mut self) -> Self {
        self.only_if_present = true;
        self
    }

    pub fn keep_ttl(mut self) -> Self {
        self.keep_ttl = true;
        self
    }

    pub fn return_old(mut self) -> Self {
        self.return_old = true;
        self
    }

    /// Check that the options form a valid `SET` invocation.
    ///
    /// Rules:
    /// - `NX` and `XX` are mutually exclusive
    /// - at most one of `EX`, `PX`, `EXAT`, `PXAT`, `KEEPTTL`
    /// - expiries must be positive
    pub fn validate(&self) -> Result<()> {
        if self.only_if_absent && self.only_if_present {
            return Err(ExclusiveError::Store(
                "SET options NX and XX are mutually exclusive".to_string(),
            ));
        }

        let expiries = [
            self.expire_secs,
            self.expire_ms,
            self.expire_at_secs,
            self.expire_at_ms,
        ];
        let expiry_count =
            expiries.iter().filter(|e| e.is_some()).count() + usize::from(self.keep_ttl);
        if expiry_count > 1 {
            return Err(ExclusiveError::Store(
                "SET accepts only one of EX, PX, EXAT, PXAT or KEEPTTL".to_string(),
            ));
        }

        if expiries.iter().flatten().any(|&e| e == 0) {
            return Err(ExclusiveError::Store(
                "invalid expire time in SET".to_string(),
            ));
        }

        Ok(())
    }

    /// Decide whether a `SET` took effect from whether its reply was nil.
    ///
    /// Without `GET` a nil reply means a condition blocked the write. With
    /// `GET` the reply is the previous value, so the meaning depends on the
    /// condition: `NX` wrote only when nothing was there, `XX` only when
    /// something was.
    pub fn written(&self, reply_is_nil: bool) -> bool {
        if !self.return_old {
            return !reply_is_nil;
        }

        if self.only_if_absent {
            reply_is_nil
        } else if self.only_if_present {
            !reply_is_nil
        } else {
            true
        }
    }
}

/// Translates unified command options into a driver's argument format.
pub trait OptionAdaptor: Send + Sync {
    /// Check if the adaptor supports the given command.
    fn supports(&self, command: &str) -> bool;

    /// Adapt the options for the given command.
    fn adapt(&self, command: &str, options: &SetOptions) -> Result<Vec<String>>;
}

/// Adaptor producing Redis protocol arguments for `SET`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetAdaptor;

impl OptionAdaptor for SetAdaptor {
    fn supports(&self, command: &str) -> bool {
        command.eq_ignore_ascii_case("SET")
    }

    fn adapt(&self, _command: &str, options: &SetOptions) -> Result<Vec<String>> {
        options.validate()?;

        let mut args = Vec::new();

        let expiries = [
            ("EX", options.expire_secs),
            ("PX", options.expire_ms),
            ("EXAT", options.expire_at_secs),
            ("PXAT", options.expire_at_ms),
        ];
        for (flag, value) in expiries {
            if let Some(value) = value {
                args.push(flag.to_string());
                args.push(value.to_string());
            }
        }

        let flags = [
            ("NX", options.only_if_absent),
            ("XX", options.only_if_present),
            ("KEEPTTL", options.keep_ttl),
            ("GET", options.return_old),
        ];
        args.extend(
            flags
                .into_iter()
                .filter(|(_, enabled)| *enabled)
                .map(|(flag, _)| flag.to_string()),
        );

        Ok(args)
    }
}

/// Routes command options to the first adaptor that supports the command.
pub struct OptionDispatcher {
    adaptors: Vec<Box<dyn OptionAdaptor>>,
}

impl OptionDispatcher {
    pub fn new(adaptors: Vec<Box<dyn OptionAdaptor>>) -> Self {
        Self { adaptors }
    }

    /// Dispatch the command options to the appropriate adaptor.
    ///
    /// Fails with [`ExclusiveError::UnsupportedCommand`] when no adaptor
    /// claims the command.
    pub fn dispatch(&self, command: &str, options: &SetOptions) -> Result<Vec<String>> {
        self.adaptors
            .iter()
            .find(|adaptor| adaptor.supports(command))
            .ok_or_else(|| ExclusiveError::UnsupportedCommand(command.to_string()))?
            .adapt(command, options)
    }
}

impl Default for OptionDispatcher {
    fn default() -> Self {
        Self::new(vec![Box::new(SetAdaptor)])
    }
}

impl std::fmt::Debug for OptionDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionDispatcher")
            .field("adaptors", &self.adaptors.len())
            .finish()
    }
}
