//! Generic caching layer for data persistence and offline support.
//!
//! This module provides a domain-agnostic caching mechanism that:
//! - Stores entities as ordered partitions keyed by a hashed query key
//! - Replaces a partition atomically on every successful refresh
//! - Serves the last cached partition when the network is unavailable

mod layer;
mod storage;
mod traits;

pub use layer::CacheLayer;
pub use storage::{CacheStorage, MemoryStorage, SqliteStorage};
pub use traits::{Cacheable, QueryKey};
