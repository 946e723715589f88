//! Core traits for the caching system.

use serde::{de::DeserializeOwned, Serialize};

/// Trait for entities that can be cached.
pub trait Cacheable: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
  /// Identity of this entity (e.g., article url, source id)
  fn cache_key(&self) -> String;

  /// Entity type name for storage organization (e.g., "article", "source")
  fn entity_type() -> &'static str;
}

/// Trait for keys that name a cached partition.
pub trait QueryKey {
  /// Stable, fixed-length partition key
  fn cache_hash(&self) -> String;

  /// Human readable description, stored alongside the partition
  fn description(&self) -> String;
}
