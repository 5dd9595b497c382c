//! Owner token helpers.

/// Build an owner token unique to this process: `user@HOST:pid`.
///
/// Tokens are opaque to the lock; callers that share a token across
/// processes also share the right to release each other's locks.
pub fn owner_token() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}:{}", user, host, std::process::id())
}
