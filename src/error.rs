use thiserror::Error;

/// Failures that can reach a published `ResultState`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NewsError {
  /// Gateway call failed: transport, non-2xx status, API error body or decode failure
  #[error("{0}")]
  Remote(String),
  /// Offline and nothing cached (or nothing found) for the request
  #[error("Data Not found.")]
  EmptyOffline,
  /// Local cache read or write failed
  #[error("cache error: {0}")]
  Store(String),
}

impl NewsError {
  pub fn is_empty_offline(&self) -> bool {
    matches!(self, NewsError::EmptyOffline)
  }
}

impl From<reqwest::Error> for NewsError {
  fn from(e: reqwest::Error) -> Self {
    NewsError::Remote(e.to_string())
  }
}
