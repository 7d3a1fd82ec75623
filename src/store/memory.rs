//! In-process [`Store`] implementation.
//!
//! A single mutex guards the whole keyspace, which makes every call and every
//! pipeline trivially atomic. TTLs are evaluated against the injected clock:
//! every call first evicts all keys whose deadline has passed, using an index
//! ordered by deadline.

use std::cmp::Ordering as CmpOrdering;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info, trace};

use super::{Command, Pipeline, Reply, Store, StoreError, StoreResult};
use crate::clock::{Clock, SystemClock};

#[derive(Debug, Clone)]
enum Value {
    Str(String),
    /// Member -> score.
    ZSet(HashMap<String, f64>),
    List(VecDeque<String>),
    Set(HashSet<String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<f64>,
}

impl Entry {
    fn persistent(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }
}

/// Expiry instant in epoch seconds, totally ordered.
#[derive(Debug, Clone, Copy)]
struct Deadline(f64);

impl PartialEq for Deadline {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == CmpOrdering::Equal
    }
}

impl Eq for Deadline {}

impl PartialOrd for Deadline {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for Deadline {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Debug, Default)]
struct Keyspace {
    entries: HashMap<String, Entry>,
    /// One `(deadline, key)` pair per entry with a TTL.
    expiries: BTreeSet<(Deadline, String)>,
}

impl Keyspace {
    /// Evict every key whose deadline is at or before `now`.
    fn purge_expired(&mut self, now: f64) -> usize {
        let mut evicted = 0;
        while self
            .expiries
            .first()
            .map_or(false, |(at, _)| at.0 <= now)
        {
            if let Some((_, key)) = self.expiries.pop_first() {
                self.entries.remove(&key);
                evicted += 1;
            }
        }
        evicted
    }

    fn insert(&mut self, key: &str, entry: Entry) {
        self.remove(key);
        if let Some(at) = entry.expires_at {
            self.expiries.insert((Deadline(at), key.to_string()));
        }
        self.entries.insert(key.to_string(), entry);
    }

    fn remove(&mut self, key: &str) -> Option<Entry> {
        let entry = self.entries.remove(key)?;
        if let Some(at) = entry.expires_at {
            self.expiries.remove(&(Deadline(at), key.to_string()));
        }
        Some(entry)
    }

    fn clear(&mut self) -> usize {
        let dropped = self.entries.len();
        self.entries.clear();
        self.expiries.clear();
        dropped
    }

    /// The entry at `key` unless its TTL has elapsed.
    fn live(&mut self, key: &str, now: f64) -> Option<&mut Entry> {
        let expired = self
            .entries
            .get(key)
            .and_then(|e| e.expires_at)
            .map_or(false, |at| at <= now);
        if expired {
            self.remove(key);
        }
        self.entries.get_mut(key)
    }

    /// Remove aggregate values that became empty.
    fn drop_if_empty(&mut self, key: &str) {
        let empty = match self.entries.get(key).map(|e| &e.value) {
            Some(Value::ZSet(z)) => z.is_empty(),
            Some(Value::List(l)) => l.is_empty(),
            Some(Value::Set(s)) => s.is_empty(),
            _ => false,
        };
        if empty {
            self.remove(key);
        }
    }

    fn incr(&mut self, key: &str, now: f64) -> StoreResult<i64> {
        match self.live(key, now) {
            None => {
                self.insert(key, Entry::persistent(Value::Str("1".to_string())));
                Ok(1)
            }
            Some(Entry {
                value: Value::Str(s),
                ..
            }) => {
                let next = s
                    .parse::<i64>()
                    .map_err(|_| StoreError::NotAnInteger(key.to_string()))?
                    + 1;
                *s = next.to_string();
                Ok(next)
            }
            Some(_) => Err(StoreError::WrongType(key.to_string())),
        }
    }

    fn expire(&mut self, key: &str, ttl: Duration, now: f64) -> bool {
        let previous = match self.live(key, now) {
            Some(entry) => entry.expires_at,
            None => return false,
        };
        let at = now + ttl.as_secs_f64();
        if let Some(previous) = previous {
            self.expiries.remove(&(Deadline(previous), key.to_string()));
        }
        self.expiries.insert((Deadline(at), key.to_string()));
        if let Some(entry) = self.entries.get_mut(key) {
            entry.expires_at = Some(at);
        }
        true
    }

    fn ttl(&mut self, key: &str, now: f64) -> Option<Duration> {
        self.live(key, now)
            .and_then(|e| e.expires_at)
            .map(|at| Duration::from_secs_f64((at - now).max(0.0)))
    }

    fn get(&mut self, key: &str, now: f64) -> StoreResult<Option<String>> {
        match self.live(key, now) {
            None => Ok(None),
            Some(Entry {
                value: Value::Str(s),
                ..
            }) => Ok(Some(s.clone())),
            Some(_) => Err(StoreError::WrongType(key.to_string())),
        }
    }

    fn set(&mut self, key: &str, value: &str, ttl: Option<Duration>, now: f64) {
        self.insert(
            key,
            Entry {
                value: Value::Str(value.to_string()),
                expires_at: ttl.map(|t| now + t.as_secs_f64()),
            },
        );
    }

    fn zset(&mut self, key: &str, now: f64) -> StoreResult<Option<&mut HashMap<String, f64>>> {
        match self.live(key, now) {
            None => Ok(None),
            Some(Entry {
                value: Value::ZSet(z),
                ..
            }) => Ok(Some(z)),
            Some(_) => Err(StoreError::WrongType(key.to_string())),
        }
    }

    fn zadd(&mut self, key: &str, member: &str, score: f64, now: f64) -> StoreResult<bool> {
        if let Some(z) = self.zset(key, now)? {
            return Ok(z.insert(member.to_string(), score).is_none());
        }
        let mut z = HashMap::new();
        z.insert(member.to_string(), score);
        self.insert(key, Entry::persistent(Value::ZSet(z)));
        Ok(true)
    }

    fn zremrangebyscore(&mut self, key: &str, min: f64, max: f64, now: f64) -> StoreResult<usize> {
        let removed = match self.zset(key, now)? {
            Some(z) => {
                let before = z.len();
                z.retain(|_, score| *score < min || *score >= max);
                before - z.len()
            }
            None => 0,
        };
        self.drop_if_empty(key);
        Ok(removed)
    }

    fn zcard(&mut self, key: &str, now: f64) -> StoreResult<usize> {
        Ok(self.zset(key, now)?.map_or(0, |z| z.len()))
    }

    fn list(&mut self, key: &str, now: f64) -> StoreResult<Option<&mut VecDeque<String>>> {
        match self.live(key, now) {
            None => Ok(None),
            Some(Entry {
                value: Value::List(l),
                ..
            }) => Ok(Some(l)),
            Some(_) => Err(StoreError::WrongType(key.to_string())),
        }
    }

    fn lpush(&mut self, key: &str, value: &str, now: f64) -> StoreResult<usize> {
        if let Some(l) = self.list(key, now)? {
            l.push_front(value.to_string());
            return Ok(l.len());
        }
        let mut l = VecDeque::new();
        l.push_front(value.to_string());
        self.insert(key, Entry::persistent(Value::List(l)));
        Ok(1)
    }

    fn lpush_capped(
        &mut self,
        key: &str,
        value: &str,
        cap: usize,
        now: f64,
    ) -> StoreResult<Option<usize>> {
        if self.llen(key, now)? >= cap {
            return Ok(None);
        }
        self.lpush(key, value, now).map(Some)
    }

    fn llen(&mut self, key: &str, now: f64) -> StoreResult<usize> {
        Ok(self.list(key, now)?.map_or(0, |l| l.len()))
    }

    fn rpop(&mut self, key: &str, now: f64) -> StoreResult<Option<String>> {
        let popped = self.list(key, now)?.and_then(|l| l.pop_back());
        self.drop_if_empty(key);
        Ok(popped)
    }

    fn set_members(&mut self, key: &str, now: f64) -> StoreResult<Option<&mut HashSet<String>>> {
        match self.live(key, now) {
            None => Ok(None),
            Some(Entry {
                value: Value::Set(s),
                ..
            }) => Ok(Some(s)),
            Some(_) => Err(StoreError::WrongType(key.to_string())),
        }
    }

    fn sadd(&mut self, key: &str, member: &str, now: f64) -> StoreResult<bool> {
        if let Some(s) = self.set_members(key, now)? {
            return Ok(s.insert(member.to_string()));
        }
        let mut s = HashSet::new();
        s.insert(member.to_string());
        self.insert(key, Entry::persistent(Value::Set(s)));
        Ok(true)
    }

    fn apply(&mut self, command: Command, now: f64) -> StoreResult<Reply> {
        match command {
            Command::Incr { key } => self.incr(&key, now).map(Reply::Int),
            Command::Expire { key, ttl } => Ok(Reply::Bool(self.expire(&key, ttl, now))),
            Command::Get { key } => self.get(&key, now).map(Reply::Value),
            Command::Set { key, value, ttl } => {
                self.set(&key, &value, ttl, now);
                Ok(Reply::Ok)
            }
            Command::ZAdd { key, member, score } => {
                self.zadd(&key, &member, score, now).map(Reply::Bool)
            }
            Command::ZRemRangeByScore { key, min, max } => {
                self.zremrangebyscore(&key, min, max, now).map(Reply::Count)
            }
            Command::ZCard { key } => self.zcard(&key, now).map(Reply::Count),
            Command::LPushCapped { key, value, cap } => {
                self.lpush_capped(&key, &value, cap, now).map(Reply::Pushed)
            }
            Command::SAdd { key, member } => self.sadd(&key, &member, now).map(Reply::Bool),
        }
    }
}

/// Store that keeps every key in process memory.
///
/// Cloning is not supported; share it behind an `Arc` instead.
#[derive(Debug)]
pub struct MemoryStore {
    clock: Arc<dyn Clock>,
    keyspace: Mutex<Keyspace>,
    closed: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store that evaluates TTLs against the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty store that evaluates TTLs against `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            keyspace: Mutex::new(Keyspace::default()),
            closed: AtomicBool::new(false),
        }
    }

    /// Number of live keys.
    pub fn key_count(&self) -> usize {
        let now = self.clock.now();
        let mut keyspace = self.keyspace.lock();
        keyspace.purge_expired(now);
        keyspace.entries.len()
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    /// Run `f` against the keyspace under the lock, at the current clock time.
    fn with_keyspace<T>(&self, f: impl FnOnce(&mut Keyspace, f64) -> StoreResult<T>) -> StoreResult<T> {
        self.ensure_open()?;
        let now = self.clock.now();
        let mut keyspace = self.keyspace.lock();
        let evicted = keyspace.purge_expired(now);
        if evicted > 0 {
            trace!(keys = evicted, "Evicted expired keys");
        }
        f(&mut keyspace, now)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn incr(&self, key: &str) -> StoreResult<i64> {
        self.with_keyspace(|ks, now| ks.incr(key, now))
    }

    async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<bool> {
        self.with_keyspace(|ks, now| Ok(ks.expire(key, ttl, now)))
    }

    async fn ttl(&self, key: &str) -> StoreResult<Option<Duration>> {
        self.with_keyspace(|ks, now| Ok(ks.ttl(key, now)))
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.with_keyspace(|ks, now| ks.get(key, now))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()> {
        self.with_keyspace(|ks, now| {
            ks.set(key, value, ttl, now);
            Ok(())
        })
    }

    async fn compare_and_set(
        &self,
        key: &str,
        expected: Option<&str>,
        value: &str,
        ttl: Option<Duration>,
    ) -> StoreResult<bool> {
        self.with_keyspace(|ks, now| {
            let current = ks.get(key, now)?;
            if current.as_deref() != expected {
                return Ok(false);
            }
            ks.set(key, value, ttl, now);
            Ok(true)
        })
    }

    async fn zadd(&self, key: &str, member: &str, score: f64) -> StoreResult<bool> {
        self.with_keyspace(|ks, now| ks.zadd(key, member, score, now))
    }

    async fn zremrangebyscore(&self, key: &str, min: f64, max: f64) -> StoreResult<usize> {
        self.with_keyspace(|ks, now| ks.zremrangebyscore(key, min, max, now))
    }

    async fn zcard(&self, key: &str) -> StoreResult<usize> {
        self.with_keyspace(|ks, now| ks.zcard(key, now))
    }

    async fn lpush(&self, key: &str, value: &str) -> StoreResult<usize> {
        self.with_keyspace(|ks, now| ks.lpush(key, value, now))
    }

    async fn lpush_capped(&self, key: &str, value: &str, cap: usize) -> StoreResult<Option<usize>> {
        self.with_keyspace(|ks, now| ks.lpush_capped(key, value, cap, now))
    }

    async fn rpop(&self, key: &str) -> StoreResult<Option<String>> {
        self.with_keyspace(|ks, now| ks.rpop(key, now))
    }

    async fn llen(&self, key: &str) -> StoreResult<usize> {
        self.with_keyspace(|ks, now| ks.llen(key, now))
    }

    async fn sadd(&self, key: &str, member: &str) -> StoreResult<bool> {
        self.with_keyspace(|ks, now| ks.sadd(key, member, now))
    }

    async fn smembers(&self, key: &str) -> StoreResult<Vec<String>> {
        self.with_keyspace(|ks, now| {
            let mut members: Vec<String> = ks
                .set_members(key, now)?
                .map(|s| s.iter().cloned().collect())
                .unwrap_or_default();
            members.sort();
            Ok(members)
        })
    }

    async fn scard(&self, key: &str) -> StoreResult<usize> {
        self.with_keyspace(|ks, now| Ok(ks.set_members(key, now)?.map_or(0, |s| s.len())))
    }

    async fn exec(&self, pipeline: Pipeline) -> StoreResult<Vec<Reply>> {
        self.with_keyspace(|ks, now| {
            let commands = pipeline.into_commands();
            let mut replies = Vec::with_capacity(commands.len());
            for command in commands {
                replies.push(ks.apply(command, now)?);
            }
            Ok(replies)
        })
    }

    async fn ping(&self) -> StoreResult<()> {
        self.ensure_open()
    }

    async fn flush_all(&self) -> StoreResult<()> {
        self.with_keyspace(|ks, _| {
            let dropped = ks.clear();
            debug!(keys = dropped, "Flushed in-memory store");
            Ok(())
        })
    }

    async fn close(&self) -> StoreResult<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            info!("In-memory store closed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn test_store() -> (MemoryStore, ManualClock) {
        let clock = ManualClock::new(1_000.0);
        (MemoryStore::with_clock(Arc::new(clock.clone())), clock)
    }

    #[tokio::test]
    async fn test_incr_creates_and_increments() {
        let (store, _) = test_store();
        assert_eq!(store.incr("k").await.unwrap(), 1);
        assert_eq!(store.incr("k").await.unwrap(), 2);
        assert_eq!(store.get("k").await.unwrap(), Some("2".to_string()));
    }

    #[tokio::test]
    async fn test_incr_rejects_non_integer() {
        let (store, _) = test_store();
        store.set("k", "abc", None).await.unwrap();
        assert_eq!(
            store.incr("k").await.unwrap_err(),
            StoreError::NotAnInteger("k".to_string())
        );
    }

    #[tokio::test]
    async fn test_expire_and_eviction() {
        let (store, clock) = test_store();
        assert!(!store.expire("missing", Duration::from_secs(5)).await.unwrap());

        store.incr("k").await.unwrap();
        assert!(store.expire("k", Duration::from_secs(5)).await.unwrap());
        assert_eq!(store.ttl("k").await.unwrap(), Some(Duration::from_secs(5)));

        clock.advance(Duration::from_secs(4));
        assert_eq!(store.get("k").await.unwrap(), Some("1".to_string()));

        clock.advance(Duration::from_secs(1));
        assert_eq!(store.get("k").await.unwrap(), None);
        // A fresh increment starts over without the old TTL.
        assert_eq!(store.incr("k").await.unwrap(), 1);
        assert_eq!(store.ttl("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_untouched_keys_are_reclaimed() {
        let (store, clock) = test_store();

        for index in 0..1000 {
            let key = format!("window:{}", index);
            store.incr(&key).await.unwrap();
            store.expire(&key, Duration::from_secs(1)).await.unwrap();
            assert!(store.key_count() <= 1);
            clock.advance(Duration::from_secs(5));
        }

        assert_eq!(store.key_count(), 0);
    }

    #[tokio::test]
    async fn test_refreshed_ttl_moves_the_deadline() {
        let (store, clock) = test_store();
        store.incr("k").await.unwrap();
        store.expire("k", Duration::from_secs(2)).await.unwrap();
        store.expire("k", Duration::from_secs(10)).await.unwrap();

        clock.advance(Duration::from_secs(5));
        assert_eq!(store.key_count(), 1);
        assert_eq!(store.get("k").await.unwrap(), Some("1".to_string()));

        // Overwriting without a TTL makes the key persistent.
        store.set("k", "v", None).await.unwrap();
        clock.advance(Duration::from_secs(60));
        assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_incr_keeps_ttl() {
        let (store, clock) = test_store();
        store.incr("k").await.unwrap();
        store.expire("k", Duration::from_secs(10)).await.unwrap();
        clock.advance(Duration::from_secs(3));
        store.incr("k").await.unwrap();
        assert_eq!(store.ttl("k").await.unwrap(), Some(Duration::from_secs(7)));
    }

    #[tokio::test]
    async fn test_set_with_ttl() {
        let (store, clock) = test_store();
        store.set("k", "v", Some(Duration::from_secs(2))).await.unwrap();
        clock.advance(Duration::from_secs(2));
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_compare_and_set() {
        let (store, _) = test_store();
        assert!(store.compare_and_set("k", None, "a", None).await.unwrap());
        assert!(!store.compare_and_set("k", None, "b", None).await.unwrap());
        assert!(!store.compare_and_set("k", Some("x"), "b", None).await.unwrap());
        assert!(store.compare_and_set("k", Some("a"), "b", None).await.unwrap());
        assert_eq!(store.get("k").await.unwrap(), Some("b".to_string()));
    }

    #[tokio::test]
    async fn test_sorted_set_range_removal_is_half_open() {
        let (store, _) = test_store();
        for score in [1.0, 2.0, 3.0, 4.0] {
            store.zadd("z", &score.to_string(), score).await.unwrap();
        }
        // Same member overwrites instead of duplicating.
        assert!(!store.zadd("z", "4", 4.0).await.unwrap());

        let removed = store.zremrangebyscore("z", 0.0, 3.0).await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.zcard("z").await.unwrap(), 2);

        store.zremrangebyscore("z", 0.0, 10.0).await.unwrap();
        assert_eq!(store.zcard("z").await.unwrap(), 0);
        assert_eq!(store.key_count(), 0);
    }

    #[tokio::test]
    async fn test_list_is_fifo_from_the_tail() {
        let (store, _) = test_store();
        store.lpush("q", "first").await.unwrap();
        store.lpush("q", "second").await.unwrap();
        assert_eq!(store.llen("q").await.unwrap(), 2);
        assert_eq!(store.rpop("q").await.unwrap(), Some("first".to_string()));
        assert_eq!(store.rpop("q").await.unwrap(), Some("second".to_string()));
        assert_eq!(store.rpop("q").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_lpush_capped() {
        let (store, _) = test_store();
        assert_eq!(store.lpush_capped("q", "a", 2).await.unwrap(), Some(1));
        assert_eq!(store.lpush_capped("q", "b", 2).await.unwrap(), Some(2));
        assert_eq!(store.lpush_capped("q", "c", 2).await.unwrap(), None);
        assert_eq!(store.llen("q").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_sets() {
        let (store, _) = test_store();
        assert!(store.sadd("s", "b").await.unwrap());
        assert!(store.sadd("s", "a").await.unwrap());
        assert!(!store.sadd("s", "a").await.unwrap());
        assert_eq!(store.scard("s").await.unwrap(), 2);
        assert_eq!(store.smembers("s").await.unwrap(), vec!["a", "b"]);
        assert!(store.smembers("none").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_wrong_type() {
        let (store, _) = test_store();
        store.lpush("q", "a").await.unwrap();
        assert_eq!(
            store.get("q").await.unwrap_err(),
            StoreError::WrongType("q".to_string())
        );
        assert!(store.sadd("q", "x").await.is_err());
    }

    #[tokio::test]
    async fn test_pipeline_executes_in_order() {
        let (store, _) = test_store();
        store.zadd("log", "1", 1.0).await.unwrap();

        let replies = store
            .exec(
                Pipeline::new()
                    .zremrangebyscore("log", 0.0, 5.0)
                    .zadd("log", "10", 10.0)
                    .zcard("log")
                    .expire("log", Duration::from_secs(61)),
            )
            .await
            .unwrap();

        assert_eq!(
            replies,
            vec![Reply::Count(1), Reply::Bool(true), Reply::Count(1), Reply::Bool(true)]
        );
        assert_eq!(store.ttl("log").await.unwrap(), Some(Duration::from_secs(61)));
    }

    #[tokio::test]
    async fn test_pipeline_capped_push_and_register() {
        let (store, _) = test_store();
        let push = || Pipeline::new().lpush_capped("q", "x", 1).sadd("active", "q");

        let replies = store.exec(push()).await.unwrap();
        assert_eq!(replies, vec![Reply::Pushed(Some(1)), Reply::Bool(true)]);

        let replies = store.exec(push()).await.unwrap();
        assert_eq!(replies, vec![Reply::Pushed(None), Reply::Bool(false)]);
        assert_eq!(store.llen("q").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_pipeline_stops_at_first_error() {
        let (store, _) = test_store();
        store.lpush("q", "a").await.unwrap();

        let result = store
            .exec(Pipeline::new().incr("counter").incr("q").incr("counter"))
            .await;

        assert_eq!(result.unwrap_err(), StoreError::WrongType("q".to_string()));
        assert_eq!(store.get("counter").await.unwrap(), Some("1".to_string()));
    }

    #[tokio::test]
    async fn test_flush_all() {
        let (store, _) = test_store();
        store.incr("a").await.unwrap();
        store.sadd("b", "x").await.unwrap();
        store.flush_all().await.unwrap();
        assert_eq!(store.key_count(), 0);
    }

    #[tokio::test]
    async fn test_close_fails_later_calls() {
        let (store, _) = test_store();
        store.ping().await.unwrap();
        store.close().await.unwrap();
        assert_eq!(store.ping().await.unwrap_err(), StoreError::Closed);
        assert_eq!(store.incr("k").await.unwrap_err(), StoreError::Closed);
        // Closing twice is harmless.
        store.close().await.unwrap();
    }
}
