//! Caching implementations for news types.

use sha2::{Digest, Sha256};

use crate::cache::{Cacheable, QueryKey};

use super::types::{Article, NewsSource};

// ============================================================================
// Cacheable implementations
// ============================================================================

impl Cacheable for Article {
  fn cache_key(&self) -> String {
    self.url.clone()
  }

  fn entity_type() -> &'static str {
    "article"
  }
}

impl Cacheable for NewsSource {
  fn cache_key(&self) -> String {
    self.id.clone().unwrap_or_else(|| self.name.clone())
  }

  fn entity_type() -> &'static str {
    "news_source"
  }
}

// ============================================================================
// Query key types
// ============================================================================

/// Cached partitions.
#[derive(Clone, Debug)]
pub enum NewsQueryKey {
  /// Top headlines for a country code
  TopHeadlines { country: String },
  /// Top headlines from one publisher
  SourceHeadlines { source: String },
  /// Top headlines in one language
  LanguageHeadlines { language: String },
  /// The global source catalog
  Sources,
}

impl QueryKey for NewsQueryKey {
  fn cache_hash(&self) -> String {
    let input = match self {
      Self::TopHeadlines { country } => format!("top_headlines:{}", normalize(country)),
      Self::SourceHeadlines { source } => format!("source_headlines:{}", normalize(source)),
      Self::LanguageHeadlines { language } => {
        format!("language_headlines:{}", normalize(language))
      }
      Self::Sources => "sources".to_string(),
    };

    // SHA256 hash for stable, fixed-length keys
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
  }

  fn description(&self) -> String {
    match self {
      Self::TopHeadlines { country } => format!("top headlines: {}", country),
      Self::SourceHeadlines { source } => format!("headlines from {}", source),
      Self::LanguageHeadlines { language } => format!("headlines in {}", language),
      Self::Sources => "all sources".to_string(),
    }
  }
}

/// Country codes, language codes and source ids are case-insensitive on the API side.
fn normalize(key: &str) -> String {
  key.trim().to_lowercase()
}
