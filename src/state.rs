//! Published result states and the async query that produces them.
//!
//! Every use case hands the presentation layer a `ResultState<T>`: either
//! still loading, a successful value, or a human-readable error. `Query<T>`
//! wraps a fetcher closure, runs it on the runtime and publishes the reduced
//! outcome on a watch channel.
//!
//! # Example
//!
//! ```ignore
//! let service = service.clone();
//! let mut query = Query::new(move || {
//!     let service = service.clone();
//!     async move { service.top_headlines("us").await }
//! });
//!
//! let updates = query.subscribe(); // handed to the renderer
//! query.fetch();
//!
//! match query.settle().await {
//!     ResultState::Loading => render_spinner(),
//!     ResultState::Success(articles) => render_articles(articles),
//!     ResultState::Error(e) => render_error(e),
//! }
//! ```

use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

/// The state published for one stream
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResultState<T> {
  /// Work is in flight, or nothing has completed yet
  #[default]
  Loading,
  /// The latest upstream event succeeded
  Success(T),
  /// The latest upstream event failed; only the description survives
  Error(String),
}

impl<T> ResultState<T> {
  pub fn is_loading(&self) -> bool {
    matches!(self, ResultState::Loading)
  }

  pub fn is_success(&self) -> bool {
    matches!(self, ResultState::Success(_))
  }

  pub fn is_error(&self) -> bool {
    matches!(self, ResultState::Error(_))
  }

  pub fn data(&self) -> Option<&T> {
    match self {
      ResultState::Success(data) => Some(data),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&str> {
    match self {
      ResultState::Error(e) => Some(e),
      _ => None,
    }
  }
}

/// Reducer: a completed upstream event fully replaces the published state.
impl<T, E: Display> From<Result<T, E>> for ResultState<T> {
  fn from(result: Result<T, E>) -> Self {
    match result {
      Ok(data) => ResultState::Success(data),
      Err(e) => ResultState::Error(e.to_string()),
    }
  }
}

const TASK_STOPPED: &str = "Query task stopped before completing";

/// A boxed future resolving to an already-reduced state
type BoxFuture<T> = Pin<Box<dyn Future<Output = ResultState<T>> + Send>>;

/// A factory function that creates futures for fetching data
type FetcherFn<T> = Box<dyn Fn() -> BoxFuture<T> + Send + Sync>;

/// Async query for data fetching with published state.
///
/// Query<T> encapsulates:
/// - The fetching logic (via a closure)
/// - The current `ResultState`, mirrored to any number of watch subscribers
/// - Cancellation of superseded work: `refetch` aborts the running task and
///   dropping the query aborts it too
pub struct Query<T> {
  state: ResultState<T>,
  publisher: watch::Sender<ResultState<T>>,
  fetcher: FetcherFn<T>,
  receiver: Option<oneshot::Receiver<ResultState<T>>>,
  task: Option<JoinHandle<()>>,
}

impl<T: Clone + Send + Sync + 'static> Query<T> {
  /// Create a new query with the given fetcher function.
  ///
  /// The fetcher is called each time `fetch()` or `refetch()` starts work.
  /// Its error type only needs `Display`; the reducer keeps the description.
  pub fn new<F, Fut, E>(fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    E: Display + Send + 'static,
  {
    let (publisher, _) = watch::channel(ResultState::Loading);
    Self {
      state: ResultState::Loading,
      publisher,
      fetcher: Box::new(move || {
        let fut = fetcher();
        Box::pin(async move { ResultState::from(fut.await) })
      }),
      receiver: None,
      task: None,
    }
  }

  /// Subscribe to state changes. The receiver starts at the current state.
  pub fn subscribe(&self) -> watch::Receiver<ResultState<T>> {
    self.publisher.subscribe()
  }

  pub fn data(&self) -> Option<&T> {
    self.state.data()
  }

  pub fn is_loading(&self) -> bool {
    self.state.is_loading()
  }

  pub fn is_error(&self) -> bool {
    self.state.is_error()
  }

  pub fn error(&self) -> Option<&str> {
    self.state.error()
  }

  /// Start fetching unless a fetch is already running.
  pub fn fetch(&mut self) {
    if self.receiver.is_some() {
      return;
    }
    self.start_fetch();
  }

  /// Force a new fetch. Any running fetch is aborted and its result discarded.
  pub fn refetch(&mut self) {
    self.cancel();
    self.start_fetch();
  }

  /// Wait for the pending fetch, if any, and return the resulting state.
  pub async fn settle(&mut self) -> &ResultState<T> {
    if let Some(rx) = &mut self.receiver {
      let next = rx
        .await
        .unwrap_or_else(|_| ResultState::Error(TASK_STOPPED.to_string()));
      self.finish(next);
    }
    &self.state
  }

  fn start_fetch(&mut self) {
    let (tx, rx) = oneshot::channel();
    self.receiver = Some(rx);
    self.publish(ResultState::Loading);

    let future = (self.fetcher)();
    self.task = Some(tokio::spawn(async move {
      // Receiver is gone when the query was refetched or dropped
      let _ = tx.send(future.await);
    }));
  }

  fn finish(&mut self, next: ResultState<T>) {
    self.receiver = None;
    self.task = None;
    self.publish(next);
  }

  fn publish(&mut self, next: ResultState<T>) {
    self.publisher.send_replace(next.clone());
    self.state = next;
  }

  fn cancel(&mut self) {
    self.receiver = None;
    if let Some(task) = self.task.take() {
      task.abort();
    }
  }
}

impl<T> Drop for Query<T> {
  fn drop(&mut self) {
    if let Some(task) = self.task.take() {
      task.abort();
    }
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("state", &self.state)
      .finish_non_exhaustive()
  }
}
