//! Cache storage trait with SQLite and in-memory implementations.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use super::traits::Cacheable;

/// Result of a cached partition lookup.
#[derive(Debug, Clone)]
pub struct CachedQueryResult<T> {
  /// The cached entities in fetch order
  pub entities: Vec<T>,
  /// When the partition was last replaced
  pub cached_at: DateTime<Utc>,
}

/// Trait for cache storage backends.
///
/// Both operations are atomic per partition key: a read observes the rows of
/// one complete `replace_all`, never a mix of two.
pub trait CacheStorage: Send + Sync + 'static {
  /// Replace every row of the partition with `entities`.
  fn replace_all<T: Cacheable>(&self, key: &str, description: &str, entities: &[T]) -> Result<()>;

  /// Read the partition. `None` if it was never written.
  fn read_all<T: Cacheable>(&self, key: &str) -> Result<Option<CachedQueryResult<T>>>;
}

/// SQLite-based cache storage implementation.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  /// Open the cache database at `path`, or at the default location.
  pub fn open(path: Option<&Path>) -> Result<Self> {
    let path = match path {
      Some(p) => p.to_path_buf(),
      None => Self::default_path()?,
    };

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(&path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;
    debug!(path = %path.display(), "opened cache database");

    Self::with_connection(conn)
  }

  /// Open a private in-memory database.
  pub fn in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory cache database: {}", e))?;
    Self::with_connection(conn)
  }

  fn with_connection(conn: Connection) -> Result<Self> {
    let storage = Self {
      conn: Mutex::new(conn),
    };
    storage.run_migrations()?;
    Ok(storage)
  }

  /// Get the default database path.
  pub fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("headlines").join("cache.db"))
  }

  /// Run database migrations for cache tables.
  fn run_migrations(&self) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(())
  }
}

/// Schema for cache tables.
const CACHE_SCHEMA: &str = r#"
-- One row per partition (country, source, catalog)
CREATE TABLE IF NOT EXISTS partition_cache (
    entity_type TEXT NOT NULL,
    partition_key TEXT NOT NULL,
    description TEXT NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now')),
    row_count INTEGER NOT NULL,
    PRIMARY KEY (entity_type, partition_key)
);

-- Partition rows in fetch order; duplicate entity keys are kept
CREATE TABLE IF NOT EXISTS partition_rows (
    entity_type TEXT NOT NULL,
    partition_key TEXT NOT NULL,
    position INTEGER NOT NULL,
    entity_key TEXT NOT NULL,
    data BLOB NOT NULL,
    PRIMARY KEY (entity_type, partition_key, position)
);
"#;

impl CacheStorage for SqliteStorage {
  fn replace_all<T: Cacheable>(&self, key: &str, description: &str, entities: &[T]) -> Result<()> {
    let mut conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    let entity_type = T::entity_type();

    let tx = conn
      .transaction()
      .map_err(|e| eyre!("Failed to begin transaction: {}", e))?;

    tx.execute(
      "DELETE FROM partition_rows WHERE entity_type = ? AND partition_key = ?",
      params![entity_type, key],
    )
    .map_err(|e| eyre!("Failed to delete old partition rows: {}", e))?;

    tx.execute(
      "INSERT OR REPLACE INTO partition_cache (entity_type, partition_key, description, cached_at, row_count)
       VALUES (?, ?, ?, datetime('now'), ?)",
      params![entity_type, key, description, entities.len()],
    )
    .map_err(|e| eyre!("Failed to update partition cache: {}", e))?;

    {
      let mut stmt = tx
        .prepare(
          "INSERT INTO partition_rows (entity_type, partition_key, position, entity_key, data)
           VALUES (?, ?, ?, ?, ?)",
        )
        .map_err(|e| eyre!("Failed to prepare row insert: {}", e))?;

      for (position, entity) in entities.iter().enumerate() {
        let data =
          serde_json::to_vec(entity).map_err(|e| eyre!("Failed to serialize entity: {}", e))?;
        stmt
          .execute(params![entity_type, key, position, entity.cache_key(), data])
          .map_err(|e| eyre!("Failed to store partition row: {}", e))?;
      }
    }

    tx.commit()
      .map_err(|e| eyre!("Failed to commit transaction: {}", e))?;

    Ok(())
  }

  fn read_all<T: Cacheable>(&self, key: &str) -> Result<Option<CachedQueryResult<T>>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    let entity_type = T::entity_type();

    let mut stmt = conn
      .prepare(
        "SELECT cached_at FROM partition_cache
         WHERE entity_type = ? AND partition_key = ?",
      )
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let cached_at_str: Option<String> = stmt
      .query_row(params![entity_type, key], |row| row.get(0))
      .optional()
      .map_err(|e| eyre!("Failed to read partition: {}", e))?;

    let cached_at = match cached_at_str {
      Some(s) => parse_datetime(&s)?,
      None => return Ok(None),
    };

    let mut stmt = conn
      .prepare(
        "SELECT data FROM partition_rows
         WHERE entity_type = ? AND partition_key = ?
         ORDER BY position",
      )
      .map_err(|e| eyre!("Failed to prepare row query: {}", e))?;

    let rows: Vec<Vec<u8>> = stmt
      .query_map(params![entity_type, key], |row| row.get(0))
      .map_err(|e| eyre!("Failed to query partition rows: {}", e))?
      .collect::<rusqlite::Result<_>>()
      .map_err(|e| eyre!("Failed to read partition rows: {}", e))?;

    let entities = rows
      .iter()
      .filter_map(|data| decode_row(entity_type, serde_json::from_slice(data)))
      .collect();

    Ok(Some(CachedQueryResult {
      entities,
      cached_at,
    }))
  }
}

/// A partition held by `MemoryStorage`.
struct MemoryPartition {
  rows: Vec<serde_json::Value>,
  cached_at: DateTime<Utc>,
}

/// Storage that lives only as long as the process.
/// Used for `--ephemeral` runs and in tests.
#[derive(Default)]
pub struct MemoryStorage {
  partitions: RwLock<HashMap<(&'static str, String), MemoryPartition>>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }
}

impl CacheStorage for MemoryStorage {
  fn replace_all<T: Cacheable>(&self, key: &str, _description: &str, entities: &[T]) -> Result<()> {
    let rows = entities
      .iter()
      .map(serde_json::to_value)
      .collect::<serde_json::Result<Vec<_>>>()
      .map_err(|e| eyre!("Failed to serialize entity: {}", e))?;

    let mut partitions = self
      .partitions
      .write()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    partitions.insert(
      (T::entity_type(), key.to_string()),
      MemoryPartition {
        rows,
        cached_at: Utc::now(),
      },
    );

    Ok(())
  }

  fn read_all<T: Cacheable>(&self, key: &str) -> Result<Option<CachedQueryResult<T>>> {
    let partitions = self
      .partitions
      .read()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let partition = match partitions.get(&(T::entity_type(), key.to_string())) {
      Some(p) => p,
      None => return Ok(None),
    };

    let entities = partition
      .rows
      .iter()
      .filter_map(|row| decode_row(T::entity_type(), serde_json::from_value(row.clone())))
      .collect();

    Ok(Some(CachedQueryResult {
      entities,
      cached_at: partition.cached_at,
    }))
  }
}

/// Rows that no longer decode are skipped rather than failing the whole read.
fn decode_row<T>(entity_type: &str, decoded: serde_json::Result<T>) -> Option<T> {
  match decoded {
    Ok(entity) => Some(entity),
    Err(e) => {
      warn!(entity_type, error = %e, "skipping undecodable cached row");
      None
    }
  }
}

/// Parse a datetime string from SQLite format.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
  // SQLite stores as "YYYY-MM-DD HH:MM:SS"
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|e| eyre!("Failed to parse datetime '{}': {}", s, e))
}
