//! Debounced free-text search.
//!
//! `SearchQuery` accepts raw query text as often as the user types it and
//! publishes search results for it:
//! - the text must stay unchanged for the debounce window before it counts
//! - text shorter than the minimum length publishes an empty success and never
//!   reaches the network
//! - the same settled text twice in a row is searched once
//! - a newer qualifying query aborts the running search; only the latest
//!   search's outcome is ever published
//!
//! A short query also resets the "same text" check. This differs from a plain
//! filter-then-distinct pipeline: "news", "ne", "news" searches twice, because
//! the short query cleared the published results in between.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::connectivity::Connectivity;
use crate::error::NewsError;
use crate::news::client::NewsGateway;
use crate::news::types::Article;
use crate::state::ResultState;

pub type SearchState = ResultState<Vec<Article>>;

#[derive(Debug, Clone, Copy)]
pub struct SearchSettings {
  /// Quiet period before a query is acted on
  pub debounce: Duration,
  /// Shorter queries clear the results instead of searching
  pub min_query_len: usize,
}

impl Default for SearchSettings {
  fn default() -> Self {
    Self {
      debounce: Duration::from_millis(300),
      min_query_len: 3,
    }
  }
}

/// Handle to a running search stream.
///
/// Dropping the handle stops the stream, its debounce timer and any running
/// search.
pub struct SearchQuery {
  query: watch::Sender<String>,
  state: watch::Receiver<SearchState>,
  driver: JoinHandle<()>,
}

impl SearchQuery {
  pub fn spawn(
    gateway: Arc<dyn NewsGateway>,
    connectivity: Arc<dyn Connectivity>,
    settings: SearchSettings,
  ) -> Self {
    let (query_tx, query_rx) = watch::channel(String::new());
    let (state_tx, state_rx) = watch::channel(ResultState::Loading);

    let driver = SearchDriver {
      gateway,
      connectivity,
      settings,
      state: state_tx,
      last_query: None,
      in_flight: None,
    };

    Self {
      query: query_tx,
      state: state_rx,
      driver: tokio::spawn(driver.run(query_rx)),
    }
  }

  /// Replace the current query text.
  pub fn set_query(&self, text: impl Into<String>) {
    self.query.send_replace(text.into());
  }

  pub fn subscribe(&self) -> watch::Receiver<SearchState> {
    self.state.clone()
  }

  pub fn state(&self) -> SearchState {
    self.state.borrow().clone()
  }
}

impl Drop for SearchQuery {
  fn drop(&mut self) {
    self.driver.abort();
  }
}

/// Aborts the task when dropped
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
  fn drop(&mut self) {
    self.0.abort();
  }
}

type SearchOutcome = Result<Vec<Article>, NewsError>;

/// Owns the published state; nothing else writes to it.
struct SearchDriver {
  gateway: Arc<dyn NewsGateway>,
  connectivity: Arc<dyn Connectivity>,
  settings: SearchSettings,
  state: watch::Sender<SearchState>,
  /// Last query that was searched, for the distinct filter
  last_query: Option<String>,
  in_flight: Option<AbortOnDrop<SearchOutcome>>,
}

impl SearchDriver {
  async fn run(mut self, mut queries: watch::Receiver<String>) {
    // The initial value goes through the debounce like any other
    let mut pending = Some(queries.borrow_and_update().clone());
    let mut deadline = Some(Instant::now() + self.settings.debounce);

    loop {
      tokio::select! {
        changed = queries.changed() => {
          if changed.is_err() {
            break;
          }
          pending = Some(queries.borrow_and_update().clone());
          deadline = Some(Instant::now() + self.settings.debounce);
        }
        () = sleep_until(deadline), if deadline.is_some() => {
          deadline = None;
          if let Some(query) = pending.take() {
            self.settle(query);
          }
        }
        outcome = join(&mut self.in_flight), if self.in_flight.is_some() => {
          self.in_flight = None;
          self.publish(outcome);
        }
        () = self.state.closed() => break,
      }
    }

    debug!("search stream closed");
  }

  /// Act on a query that survived the debounce window.
  fn settle(&mut self, query: String) {
    if query.chars().count() < self.settings.min_query_len {
      self.in_flight = None;
      self.last_query = None;
      self.state.send_replace(ResultState::Success(Vec::new()));
      return;
    }

    if self.last_query.as_deref() == Some(query.as_str()) {
      return;
    }

    debug!(%query, "searching");
    self.last_query = Some(query.clone());
    // Replacing the slot aborts the superseded search
    self.in_flight = None;
    self.state.send_replace(ResultState::Loading);

    let gateway = Arc::clone(&self.gateway);
    let connectivity = Arc::clone(&self.connectivity);
    self.in_flight = Some(AbortOnDrop(tokio::spawn(async move {
      let articles = gateway.search(&query).await?.into_articles(&query);
      if articles.is_empty() && !connectivity.is_connected().await {
        return Err(NewsError::EmptyOffline);
      }
      Ok(articles)
    })));
  }

  fn publish(&mut self, outcome: Result<SearchOutcome, JoinError>) {
    let next = match outcome {
      Ok(result) => ResultState::from(result),
      Err(e) if e.is_cancelled() => return,
      Err(e) => {
        warn!(error = %e, "search task failed");
        ResultState::Error(e.to_string())
      }
    };
    self.state.send_replace(next);
  }
}

async fn sleep_until(deadline: Option<Instant>) {
  match deadline {
    Some(deadline) => tokio::time::sleep_until(deadline).await,
    None => std::future::pending().await,
  }
}

async fn join<T>(slot: &mut Option<AbortOnDrop<T>>) -> Result<T, JoinError> {
  match slot {
    Some(task) => (&mut task.0).await,
    None => std::future::pending().await,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::connectivity::FixedConnectivity;
  use crate::news::fake::{api_article, FakeGateway};

  const STEP: Duration = Duration::from_millis(100);
  const SETTLE: Duration = Duration::from_millis(400);

  fn spawn(gateway: &Arc<FakeGateway>, connected: bool) -> SearchQuery {
    SearchQuery::spawn(
      gateway.clone(),
      Arc::new(FixedConnectivity(connected)),
      SearchSettings::default(),
    )
  }

  fn urls(state: &SearchState) -> Vec<String> {
    state
      .data()
      .map(|articles| articles.iter().map(|a| a.url.clone()).collect())
      .unwrap_or_default()
  }

  #[tokio::test(start_paused = true)]
  async fn test_initial_state_is_loading_then_empty() {
    let gateway = Arc::new(FakeGateway::new());
    let search = spawn(&gateway, true);
    assert!(search.state().is_loading());

    tokio::time::sleep(SETTLE).await;
    assert_eq!(search.state(), ResultState::Success(Vec::new()));
    assert!(gateway.calls().is_empty());
  }

  #[tokio::test(start_paused = true)]
  async fn test_short_queries_never_reach_network() {
    let gateway = Arc::new(FakeGateway::new());
    let search = spawn(&gateway, true);

    search.set_query("a");
    tokio::time::sleep(STEP).await;
    search.set_query("ab");
    tokio::time::sleep(SETTLE).await;

    assert_eq!(search.state(), ResultState::Success(Vec::new()));
    assert!(gateway.calls().is_empty());
  }

  #[tokio::test(start_paused = true)]
  async fn test_stable_query_fetches_once() {
    let gateway = Arc::new(FakeGateway::new().with_search(
      "news",
      vec![api_article("t", "u")],
      Duration::ZERO,
    ));
    let search = spawn(&gateway, true);

    search.set_query("n");
    search.set_query("ne");
    search.set_query("new");
    search.set_query("news");
    tokio::time::sleep(SETTLE).await;

    let state = search.state();
    assert_eq!(urls(&state), vec!["u"]);
    assert_eq!(state.data().unwrap()[0].category, "news");
    assert_eq!(gateway.calls(), vec!["search:news"]);
  }

  #[tokio::test(start_paused = true)]
  async fn test_latest_query_wins() {
    let gateway = Arc::new(
      FakeGateway::new()
        .with_search("abc", vec![api_article("old", "u-abc")], Duration::from_secs(1))
        .with_search("abcd", vec![api_article("new", "u-abcd")], STEP),
    );
    let search = spawn(&gateway, true);

    search.set_query("abc");
    tokio::time::sleep(SETTLE).await;
    assert!(search.state().is_loading());

    search.set_query("abcd");
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(urls(&search.state()), vec!["u-abcd"]);
    assert_eq!(gateway.calls(), vec!["search:abc", "search:abcd"]);
    // The superseded search was cancelled, not just ignored
    assert_eq!(gateway.finished_searches(), vec!["abcd"]);
  }

  #[tokio::test(start_paused = true)]
  async fn test_repeated_settled_query_is_not_refetched() {
    let gateway = Arc::new(FakeGateway::new().with_search(
      "news",
      vec![api_article("t", "u")],
      Duration::ZERO,
    ));
    let search = spawn(&gateway, true);

    search.set_query("news");
    tokio::time::sleep(SETTLE).await;
    search.set_query("newsy");
    tokio::time::sleep(STEP).await;
    search.set_query("news");
    tokio::time::sleep(SETTLE).await;

    assert_eq!(gateway.calls(), vec!["search:news"]);
    assert_eq!(urls(&search.state()), vec!["u"]);
  }

  #[tokio::test(start_paused = true)]
  async fn test_short_query_clears_and_cancels() {
    let gateway = Arc::new(FakeGateway::new().with_search(
      "abc",
      vec![api_article("t", "u")],
      Duration::from_secs(1),
    ));
    let search = spawn(&gateway, true);

    search.set_query("abc");
    tokio::time::sleep(SETTLE).await;
    search.set_query("a");
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(search.state(), ResultState::Success(Vec::new()));
    assert!(gateway.finished_searches().is_empty());

    // Clearing resets the distinct filter, so the same text searches again
    search.set_query("abc");
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(urls(&search.state()), vec!["u"]);
  }

  #[tokio::test(start_paused = true)]
  async fn test_same_query_after_short_query_searches_again() {
    let gateway = Arc::new(FakeGateway::new().with_search(
      "news",
      vec![api_article("t", "u")],
      Duration::ZERO,
    ));
    let search = spawn(&gateway, true);

    search.set_query("news");
    tokio::time::sleep(SETTLE).await;
    search.set_query("ne");
    tokio::time::sleep(SETTLE).await;
    assert_eq!(search.state(), ResultState::Success(Vec::new()));

    search.set_query("news");
    tokio::time::sleep(SETTLE).await;

    assert_eq!(urls(&search.state()), vec!["u"]);
    assert_eq!(gateway.calls(), vec!["search:news", "search:news"]);
  }

  #[tokio::test(start_paused = true)]
  async fn test_offline_empty_result_is_error() {
    let gateway = Arc::new(FakeGateway::new());
    let search = spawn(&gateway, false);

    search.set_query("nothing");
    tokio::time::sleep(SETTLE).await;

    assert_eq!(search.state(), ResultState::Error("Data Not found.".into()));
  }

  #[tokio::test(start_paused = true)]
  async fn test_online_empty_result_is_success() {
    let gateway = Arc::new(FakeGateway::new());
    let search = spawn(&gateway, true);

    search.set_query("nothing");
    tokio::time::sleep(SETTLE).await;

    assert_eq!(search.state(), ResultState::Success(Vec::new()));
    assert_eq!(gateway.calls(), vec!["search:nothing"]);
  }

  #[tokio::test(start_paused = true)]
  async fn test_gateway_error_is_published() {
    let gateway =
      Arc::new(FakeGateway::new().failing_search(NewsError::Remote("HTTP 429: rateLimited".into())));
    let search = spawn(&gateway, true);

    search.set_query("rust");
    tokio::time::sleep(SETTLE).await;

    assert_eq!(search.state(), ResultState::Error("HTTP 429: rateLimited".into()));
  }

  #[tokio::test(start_paused = true)]
  async fn test_subscriber_sees_loading_then_result() {
    let gateway = Arc::new(FakeGateway::new().with_search(
      "rust",
      vec![api_article("t", "u")],
      STEP,
    ));
    let search = spawn(&gateway, true);
    let mut rx = search.subscribe();

    search.set_query("rust");
    tokio::time::sleep(Duration::from_millis(350)).await;
    assert!(rx.borrow_and_update().is_loading());

    let state = rx.wait_for(|s| s.is_success()).await.unwrap().clone();
    assert_eq!(urls(&state), vec!["u"]);
  }

  #[tokio::test(start_paused = true)]
  async fn test_drop_cancels_running_search() {
    let gateway = Arc::new(FakeGateway::new().with_search(
      "abc",
      vec![api_article("t", "u")],
      Duration::from_secs(1),
    ));
    let search = spawn(&gateway, true);

    search.set_query("abc");
    tokio::time::sleep(SETTLE).await;
    assert_eq!(gateway.calls(), vec!["search:abc"]);

    drop(search);
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(gateway.finished_searches().is_empty());
  }
}
