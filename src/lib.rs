//! Ratekeeper - per-client admission control
//!
//! This crate decides, per client identity, whether a request is admitted
//! under one of five rate limiting algorithms. All limiter state lives in a
//! shared key/value [`store::Store`], so any number of engine instances
//! agree on each client's budget. A background leak worker drains leaky
//! bucket queues, and limits can be changed at runtime through the store.

pub mod clock;
pub mod config;
pub mod error;
pub mod ratelimit;
pub mod store;
