//! Cursor pagination over an unbounded remote sequence.
//!
//! A `PagingSource` loads one page per integer key. `Pager` turns a source into
//! a lazily pulled stream of pages. Nothing here caches or merges pages: each
//! `load` stands on its own.

use async_trait::async_trait;
use futures::Stream;
use std::sync::Arc;
use tracing::debug;

use crate::error::NewsError;

/// Key of the first page
pub const INITIAL_KEY: u32 = 1;

/// One loaded page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
  pub key: u32,
  pub data: Vec<T>,
  /// Absent on the initial page
  pub prev_key: Option<u32>,
  /// Absent once a page comes back empty
  pub next_key: Option<u32>,
}

impl<T> Page<T> {
  pub fn new(key: u32, data: Vec<T>) -> Self {
    let prev_key = if key == INITIAL_KEY {
      None
    } else {
      key.checked_sub(1)
    };
    let next_key = if data.is_empty() {
      None
    } else {
      key.checked_add(1)
    };

    Self {
      key,
      data,
      prev_key,
      next_key,
    }
  }
}

/// Pages a consumer has loaded so far, plus the item it is looking at
#[derive(Debug, Clone)]
pub struct PagingState<T> {
  pub pages: Vec<Page<T>>,
  /// Index of the anchor item across all loaded pages
  pub anchor_position: Option<usize>,
}

impl<T> PagingState<T> {
  pub fn new(pages: Vec<Page<T>>, anchor_position: Option<usize>) -> Self {
    Self {
      pages,
      anchor_position,
    }
  }

  /// The page holding `position`; positions past the end map to the last page.
  pub fn closest_page_to_position(&self, position: usize) -> Option<&Page<T>> {
    let last = self.pages.len().checked_sub(1)?;
    let mut index = 0;
    let mut item = position;

    while index < last && item >= self.pages[index].data.len() {
      item -= self.pages[index].data.len();
      index += 1;
    }

    self.pages.get(index)
  }
}

/// Key a restarted session should load first so it lands near the anchor.
pub fn refresh_key<T>(state: &PagingState<T>) -> Option<u32> {
  let anchor = state.anchor_position?;
  let page = state.closest_page_to_position(anchor)?;

  page
    .prev_key
    .and_then(|k| k.checked_add(1))
    .or_else(|| page.next_key.and_then(|k| k.checked_sub(1)))
}

/// Loads pages by key
#[async_trait]
pub trait PagingSource: Send + Sync {
  type Item: Send;

  /// Load the page for `key`, or the initial page. Failures come back as values.
  async fn load(&self, key: Option<u32>) -> Result<Page<Self::Item>, NewsError>;

  fn refresh_key(&self, state: &PagingState<Self::Item>) -> Option<u32> {
    refresh_key(state)
  }
}

/// Drives a `PagingSource` as a stream of pages.
pub struct Pager<S: PagingSource> {
  source: Arc<S>,
}

impl<S: PagingSource + 'static> Pager<S> {
  pub fn new(source: S) -> Self {
    Self {
      source: Arc::new(source),
    }
  }

  /// Pages in key order starting at `start` (or the initial key).
  ///
  /// The stream ends after a page without `next_key`, or right after yielding
  /// an error. Pages are only loaded as the stream is polled.
  pub fn stream(
    &self,
    start: Option<u32>,
  ) -> impl Stream<Item = Result<Page<S::Item>, NewsError>> + Send + 'static {
    let source = Arc::clone(&self.source);

    futures::stream::unfold(Some(start), move |next| {
      let source = Arc::clone(&source);
      async move {
        let key = next?;
        match source.load(key).await {
          Ok(page) => {
            debug!(key = page.key, items = page.data.len(), "loaded page");
            let following = page.next_key.map(Some);
            Some((Ok(page), following))
          }
          Err(e) => {
            debug!(?key, error = %e, "page load failed");
            Some((Err(e), None))
          }
        }
      }
    })
  }

  /// Restart from the page nearest the consumer's anchor.
  pub fn refresh(
    &self,
    state: &PagingState<S::Item>,
  ) -> impl Stream<Item = Result<Page<S::Item>, NewsError>> + Send + 'static {
    self.stream(self.source.refresh_key(state))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use futures::StreamExt;
  use std::sync::Mutex;

  /// Three pages of numbers, then nothing
  struct Numbers {
    fail_at: Option<u32>,
    loaded: Mutex<Vec<u32>>,
  }

  impl Numbers {
    fn new(fail_at: Option<u32>) -> Self {
      Self {
        fail_at,
        loaded: Mutex::new(Vec::new()),
      }
    }
  }

  #[async_trait]
  impl PagingSource for Numbers {
    type Item = u32;

    async fn load(&self, key: Option<u32>) -> Result<Page<u32>, NewsError> {
      let key = key.unwrap_or(INITIAL_KEY);
      self.loaded.lock().unwrap().push(key);
      if self.fail_at == Some(key) {
        return Err(NewsError::Remote("page unavailable".into()));
      }
      let data = if key <= 3 {
        ((key - 1) * 2..key * 2).collect()
      } else {
        Vec::new()
      };
      Ok(Page::new(key, data))
    }
  }

  #[test]
  fn test_page_keys_at_boundaries() {
    let first = Page::new(INITIAL_KEY, vec!["a"]);
    assert_eq!(first.prev_key, None);
    assert_eq!(first.next_key, Some(2));

    let middle = Page::new(4, vec!["a"]);
    assert_eq!(middle.prev_key, Some(3));
    assert_eq!(middle.next_key, Some(5));

    let last = Page::<&str>::new(5, vec![]);
    assert_eq!(last.prev_key, Some(4));
    assert_eq!(last.next_key, None);
  }

  #[test]
  fn test_closest_page_to_position() {
    let state = PagingState::new(
      vec![Page::new(1, vec![0, 1]), Page::new(2, vec![2, 3]), Page::new(3, vec![4])],
      None,
    );
    assert_eq!(state.closest_page_to_position(0).map(|p| p.key), Some(1));
    assert_eq!(state.closest_page_to_position(2).map(|p| p.key), Some(2));
    assert_eq!(state.closest_page_to_position(4).map(|p| p.key), Some(3));
    assert_eq!(state.closest_page_to_position(99).map(|p| p.key), Some(3));

    let empty = PagingState::<u32>::new(vec![], Some(0));
    assert!(empty.closest_page_to_position(0).is_none());
  }

  #[test]
  fn test_refresh_key_prefers_prev_key() {
    let state = PagingState::new(
      vec![Page::new(3, vec![0, 1]), Page::new(4, vec![2, 3])],
      Some(2),
    );
    // Anchor sits on page 4, whose prev_key is 3
    assert_eq!(refresh_key(&state), Some(4));
  }

  #[test]
  fn test_refresh_key_falls_back_to_next_key() {
    let state = PagingState::new(vec![Page::new(INITIAL_KEY, vec![0, 1])], Some(1));
    assert_eq!(refresh_key(&state), Some(INITIAL_KEY));
  }

  #[test]
  fn test_refresh_key_without_anchor_or_keys() {
    let no_anchor = PagingState::new(vec![Page::new(2, vec![0])], None);
    assert_eq!(refresh_key(&no_anchor), None);

    let dead_end = PagingState::<u32>::new(vec![Page::new(INITIAL_KEY, vec![])], Some(0));
    assert_eq!(refresh_key(&dead_end), None);
  }

  #[tokio::test]
  async fn test_stream_ends_after_empty_page() {
    let pager = Pager::new(Numbers::new(None));
    let pages: Vec<_> = pager.stream(None).collect().await;

    let keys: Vec<u32> = pages.iter().map(|p| p.as_ref().unwrap().key).collect();
    assert_eq!(keys, vec![1, 2, 3, 4]);
    assert_eq!(pages[3].as_ref().unwrap().next_key, None);
  }

  #[tokio::test]
  async fn test_stream_yields_error_then_stops() {
    let pager = Pager::new(Numbers::new(Some(2)));
    let pages: Vec<_> = pager.stream(None).collect().await;

    assert_eq!(pages.len(), 2);
    assert!(pages[0].is_ok());
    assert_eq!(pages[1], Err(NewsError::Remote("page unavailable".into())));
  }

  #[tokio::test]
  async fn test_stream_loads_lazily() {
    let source = Numbers::new(None);
    let pager = Pager::new(source);
    let mut stream = Box::pin(pager.stream(None));

    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.data, vec![0, 1]);
    assert_eq!(*pager.source.loaded.lock().unwrap(), vec![1]);
  }

  #[tokio::test]
  async fn test_refresh_restarts_near_anchor() {
    let pager = Pager::new(Numbers::new(None));
    let state = PagingState::new(
      vec![Page::new(1, vec![0, 1]), Page::new(2, vec![2, 3])],
      Some(3),
    );

    let mut stream = Box::pin(pager.refresh(&state));
    assert_eq!(stream.next().await.unwrap().unwrap().key, 2);
  }
}
