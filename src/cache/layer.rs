//! Cache layer that orchestrates network refreshes with the local cache.

use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

use super::storage::{CacheStorage, CachedQueryResult};
use super::traits::{Cacheable, QueryKey};
use crate::error::NewsError;

/// Per-category sync over a shared storage backend.
///
/// Online, every request refreshes the partition from the network and answers
/// from what was written. Offline, the partition is served as last cached.
pub struct CacheLayer<S: CacheStorage> {
  storage: Arc<S>,
}

impl<S: CacheStorage> CacheLayer<S> {
  /// Create a new cache layer with the given storage backend.
  pub fn new(storage: S) -> Self {
    Self {
      storage: Arc::new(storage),
    }
  }

  /// Decide between refresh and cache-only with a connectivity value captured
  /// once by the caller.
  ///
  /// An empty partition while offline is `NewsError::EmptyOffline`, never an
  /// empty success.
  pub async fn sync<T, K, F, Fut>(
    &self,
    key: &K,
    connected: bool,
    fetcher: F,
  ) -> Result<Vec<T>, NewsError>
  where
    T: Cacheable,
    K: QueryKey,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<T>, NewsError>>,
  {
    if connected {
      return self.refresh_and_cache(key, fetcher).await;
    }

    match self.read_cache::<T, K>(key).await? {
      Some(cached) if !cached.entities.is_empty() => {
        info!(
          partition = %key.description(),
          age_secs = (Utc::now() - cached.cached_at).num_seconds(),
          "offline, serving cached rows"
        );
        Ok(cached.entities)
      }
      _ => Err(NewsError::EmptyOffline),
    }
  }

  /// Fetch, atomically replace the partition, then answer with a re-read of it.
  ///
  /// A failed fetch leaves the partition untouched.
  pub async fn refresh_and_cache<T, K, F, Fut>(&self, key: &K, fetcher: F) -> Result<Vec<T>, NewsError>
  where
    T: Cacheable,
    K: QueryKey,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<T>, NewsError>>,
  {
    let data = fetcher().await?;
    debug!(partition = %key.description(), rows = data.len(), "replacing partition");

    let hash = key.cache_hash();
    let description = key.description();
    let storage = Arc::clone(&self.storage);

    // Replace and read-back run in one blocking job so the read observes the write
    let cached = tokio::task::spawn_blocking(move || {
      storage.replace_all(&hash, &description, &data)?;
      storage.read_all::<T>(&hash)
    })
    .await
    .map_err(|e| NewsError::Store(e.to_string()))?
    .map_err(|e| NewsError::Store(e.to_string()))?;

    Ok(cached.map(|c| c.entities).unwrap_or_default())
  }

  /// Read the partition as last cached.
  pub async fn read_cache<T, K>(&self, key: &K) -> Result<Option<CachedQueryResult<T>>, NewsError>
  where
    T: Cacheable,
    K: QueryKey,
  {
    let hash = key.cache_hash();
    let storage = Arc::clone(&self.storage);

    tokio::task::spawn_blocking(move || storage.read_all::<T>(&hash))
      .await
      .map_err(|e| NewsError::Store(e.to_string()))?
      .map_err(|e| NewsError::Store(e.to_string()))
  }
}

impl<S: CacheStorage> Clone for CacheLayer<S> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
    }
  }
}
