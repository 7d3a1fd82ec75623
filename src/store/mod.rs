//! Shared counter store abstraction.
//!
//! The rate limiting strategies never keep state in process. Every counter,
//! log, bucket and queue lives in a [`Store`], and all cross-task consistency
//! comes from the atomicity of the primitives below. Implementations must
//! make each individual call atomic with respect to every other call, and
//! must execute a [`Pipeline`] as one uninterrupted unit.

mod memory;

pub use memory::MemoryStore;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur in store operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("store connection is closed")]
    Closed,
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("operation against a key holding the wrong kind of value: {0}")]
    WrongType(String),
    #[error("value at {0} is not an integer")]
    NotAnInteger(String),
    #[error("unexpected reply: {0}")]
    UnexpectedReply(String),
}

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A single command inside a transactional [`Pipeline`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Incr { key: String },
    Expire { key: String, ttl: Duration },
    Get { key: String },
    Set { key: String, value: String, ttl: Option<Duration> },
    ZAdd { key: String, member: String, score: f64 },
    /// Removes members whose score lies in `[min, max)`.
    ZRemRangeByScore { key: String, min: f64, max: f64 },
    ZCard { key: String },
    LPushCapped { key: String, value: String, cap: usize },
    SAdd { key: String, member: String },
}

/// Reply to one pipelined command, in command order.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Int(i64),
    Bool(bool),
    Count(usize),
    Value(Option<String>),
    /// New list length, or `None` when a capped push found the list full.
    Pushed(Option<usize>),
    Ok,
}

impl Reply {
    /// Interpret the reply as a cardinality or removal count.
    pub fn as_count(&self) -> Option<usize> {
        match self {
            Reply::Count(n) => Some(*n),
            Reply::Int(n) => usize::try_from(*n).ok(),
            _ => None,
        }
    }

    /// Interpret the reply as an integer counter value.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Reply::Int(n) => Some(*n),
            Reply::Count(n) => i64::try_from(*n).ok(),
            _ => None,
        }
    }
}

/// An ordered batch of commands executed atomically by [`Store::exec`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    commands: Vec<Command>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr(mut self, key: &str) -> Self {
        self.commands.push(Command::Incr { key: key.to_string() });
        self
    }

    pub fn expire(mut self, key: &str, ttl: Duration) -> Self {
        self.commands.push(Command::Expire {
            key: key.to_string(),
            ttl,
        });
        self
    }

    pub fn get(mut self, key: &str) -> Self {
        self.commands.push(Command::Get { key: key.to_string() });
        self
    }

    pub fn set(mut self, key: &str, value: &str, ttl: Option<Duration>) -> Self {
        self.commands.push(Command::Set {
            key: key.to_string(),
            value: value.to_string(),
            ttl,
        });
        self
    }

    pub fn zadd(mut self, key: &str, member: &str, score: f64) -> Self {
        self.commands.push(Command::ZAdd {
            key: key.to_string(),
            member: member.to_string(),
            score,
        });
        self
    }

    pub fn zremrangebyscore(mut self, key: &str, min: f64, max: f64) -> Self {
        self.commands.push(Command::ZRemRangeByScore {
            key: key.to_string(),
            min,
            max,
        });
        self
    }

    pub fn zcard(mut self, key: &str) -> Self {
        self.commands.push(Command::ZCard { key: key.to_string() });
        self
    }

    pub fn lpush_capped(mut self, key: &str, value: &str, cap: usize) -> Self {
        self.commands.push(Command::LPushCapped {
            key: key.to_string(),
            value: value.to_string(),
            cap,
        });
        self
    }

    pub fn sadd(mut self, key: &str, member: &str) -> Self {
        self.commands.push(Command::SAdd {
            key: key.to_string(),
            member: member.to_string(),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<Command> {
        self.commands
    }
}

/// Atomic key-value service shared by every engine instance and the leak worker.
#[async_trait]
pub trait Store: Send + Sync + std::fmt::Debug {
    /// Increment the integer at `key`, creating it at 0 first. Keeps any TTL.
    async fn incr(&self, key: &str) -> StoreResult<i64>;

    /// Set the time-to-live of an existing key. Returns `false` when absent.
    async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<bool>;

    /// Remaining time-to-live, `None` when the key is absent or persistent.
    async fn ttl(&self, key: &str) -> StoreResult<Option<Duration>>;

    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()>;

    /// Write `value` only if the current value equals `expected`
    /// (`None` meaning the key must be absent). Returns whether it was written.
    async fn compare_and_set(
        &self,
        key: &str,
        expected: Option<&str>,
        value: &str,
        ttl: Option<Duration>,
    ) -> StoreResult<bool>;

    /// Add or update a sorted-set member. Returns `true` for a new member.
    async fn zadd(&self, key: &str, member: &str, score: f64) -> StoreResult<bool>;

    /// Remove members scored in `[min, max)`, returning how many were removed.
    async fn zremrangebyscore(&self, key: &str, min: f64, max: f64) -> StoreResult<usize>;

    async fn zcard(&self, key: &str) -> StoreResult<usize>;

    /// Push onto the head of a list, returning the new length.
    async fn lpush(&self, key: &str, value: &str) -> StoreResult<usize>;

    /// Push onto the head of a list only while it holds fewer than `cap`
    /// entries. Returns the new length, or `None` when the list was full.
    async fn lpush_capped(&self, key: &str, value: &str, cap: usize) -> StoreResult<Option<usize>>;

    /// Pop from the tail of a list.
    async fn rpop(&self, key: &str) -> StoreResult<Option<String>>;

    async fn llen(&self, key: &str) -> StoreResult<usize>;

    /// Add a set member. Returns `true` when it was not already present.
    async fn sadd(&self, key: &str, member: &str) -> StoreResult<bool>;

    async fn smembers(&self, key: &str) -> StoreResult<Vec<String>>;

    async fn scard(&self, key: &str) -> StoreResult<usize>;

    /// Execute every command of the pipeline as one atomic unit.
    ///
    /// Execution stops at the first failing command; commands already
    /// applied are not rolled back.
    async fn exec(&self, pipeline: Pipeline) -> StoreResult<Vec<Reply>>;

    async fn ping(&self) -> StoreResult<()>;

    /// Remove every key.
    async fn flush_all(&self) -> StoreResult<()>;

    /// Release the connection. Every later call fails with [`StoreError::Closed`].
    async fn close(&self) -> StoreResult<()>;
}
