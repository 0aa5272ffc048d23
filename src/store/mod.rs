//! The text-command key-value store surface the core talks to.

pub mod memory;
pub mod redis;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

use thiserror::Error;

/// Reply shapes the card scripts produce: nothing, one text value, or a
/// list of identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreReply {
    Nil,
    Text(String),
    Values(Vec<String>),
}

impl StoreReply {
    /// Short rendering for logs and rejection messages.
    pub fn summary(&self) -> String {
        match self {
            StoreReply::Nil => "(nil)".to_string(),
            StoreReply::Text(text) => text.clone(),
            StoreReply::Values(values) => format!("{} value(s)", values.len()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Connection-level failure: the store could not be reached at all.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// The store no longer knows a previously registered script handle.
    #[error("script is not known to the store")]
    UnknownScript,
    /// The store executed the command and reported an error.
    #[error("store command failed: {0}")]
    Command(String),
    /// The store answered with a shape this crate does not understand.
    #[error("unexpected store reply: {0}")]
    Protocol(String),
}

impl StoreError {
    pub fn code_str(&self) -> &'static str {
        match self {
            StoreError::Unavailable(_) => "store_unavailable",
            StoreError::UnknownScript => "unknown_script",
            StoreError::Command(_) => "store_command",
            StoreError::Protocol(_) => "store_protocol",
        }
    }
}

/// Minimum contract the core needs from the store: scalar get/set, script
/// registration returning a content-addressed handle, invocation of a
/// registered script by handle, and a liveness probe.
///
/// Implementations perform one round trip per call and add no pooling or
/// internal parallelism; pooling and deadlines belong to the caller. A
/// single script invocation is assumed to execute without interleaving
/// from other clients.
pub trait StoreConnection: Send + Sync {
    fn ping(&self) -> Result<(), StoreError>;

    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Registers a script body and returns the handle to invoke it by.
    /// Re-registering identical content yields the same handle, so racing
    /// reloads are safe.
    fn script_load(&self, source: &str) -> Result<String, StoreError>;

    fn evalsha(
        &self,
        handle: &str,
        keys: &[&str],
        args: &[&str],
    ) -> Result<StoreReply, StoreError>;
}
