//! Driver-neutral replies for scripts and transactions.

/// A reply returned by [`Store::eval`](super::Store::eval) or
/// [`Store::exec`](super::Store::exec).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// No value (a missing key, or a blocked conditional write).
    Nil,
    /// Integer reply.
    Int(i64),
    /// Bulk string reply.
    Bulk(String),
    /// Status reply such as `OK` or `QUEUED`.
    Status(String),
    /// Nested replies.
    Array(Vec<Reply>),
}

impl Reply {
    /// Integer value of this reply, if it is one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Reply::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Whether this reply is [`Reply::Nil`].
    pub fn is_nil(&self) -> bool {
        matches!(self, Reply::Nil)
    }
}

impl From<redis::Value> for Reply {
    fn from(value: redis::Value) -> Self {
        use redis::Value;

        match value {
            Value::Nil => Reply::Nil,
            Value::Int(n) => Reply::Int(n),
            Value::BulkString(bytes) => Reply::Bulk(String::from_utf8_lossy(&bytes).into_owned()),
            Value::SimpleString(status) => Reply::Status(status),
            Value::Okay => Reply::Status("OK".to_string()),
            Value::Boolean(flag) => Reply::Int(i64::from(flag)),
            Value::Array(items) | Value::Set(items) => {
                Reply::Array(items.into_iter().map(Reply::from).collect())
            }
            other => Reply::Status(format!("{:?}", other)),
        }
    }
}
