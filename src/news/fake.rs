//! In-process gateway for tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::error::NewsError;
use crate::news::api_types::{ApiArticle, ApiHeadlinesResponse, ApiSource, ApiSourcesResponse};
use crate::news::client::NewsGateway;
use crate::news::types::HeadlineFilter;

pub fn api_article(title: &str, url: &str) -> ApiArticle {
  ApiArticle {
    title: title.to_string(),
    url: url.to_string(),
    source: ApiSource {
      id: Some("s".to_string()),
      name: "n".to_string(),
    },
    ..Default::default()
  }
}

/// Scripted gateway. Unscripted requests answer with an empty result set.
#[derive(Default)]
pub struct FakeGateway {
  headlines: Mutex<HashMap<(String, u32), Vec<ApiArticle>>>,
  headline_error: Mutex<Option<NewsError>>,
  sources: Mutex<Vec<ApiSource>>,
  searches: Mutex<HashMap<String, (Vec<ApiArticle>, Duration)>>,
  search_error: Mutex<Option<NewsError>>,
  calls: Mutex<Vec<String>>,
  finished_searches: Mutex<Vec<String>>,
}

impl FakeGateway {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_headlines(self, category: &str, page: u32, articles: Vec<ApiArticle>) -> Self {
    self
      .headlines
      .lock()
      .unwrap()
      .insert((category.to_string(), page), articles);
    self
  }

  pub fn with_sources(self, sources: Vec<ApiSource>) -> Self {
    *self.sources.lock().unwrap() = sources;
    self
  }

  pub fn with_search(self, query: &str, articles: Vec<ApiArticle>, delay: Duration) -> Self {
    self
      .searches
      .lock()
      .unwrap()
      .insert(query.to_string(), (articles, delay));
    self
  }

  pub fn failing_headlines(self, error: NewsError) -> Self {
    *self.headline_error.lock().unwrap() = Some(error);
    self
  }

  pub fn failing_search(self, error: NewsError) -> Self {
    *self.search_error.lock().unwrap() = Some(error);
    self
  }

  /// Every request received, in order
  pub fn calls(&self) -> Vec<String> {
    self.calls.lock().unwrap().clone()
  }

  /// Searches that ran to completion (aborted ones never appear)
  pub fn finished_searches(&self) -> Vec<String> {
    self.finished_searches.lock().unwrap().clone()
  }

  fn record(&self, call: String) {
    self.calls.lock().unwrap().push(call);
  }
}

fn response(articles: Vec<ApiArticle>) -> ApiHeadlinesResponse {
  ApiHeadlinesResponse {
    status: "ok".to_string(),
    total_results: articles.len() as u64,
    articles,
  }
}

#[async_trait]
impl NewsGateway for FakeGateway {
  async fn fetch_headlines(
    &self,
    filter: &HeadlineFilter,
    page: Option<u32>,
    _page_size: Option<u32>,
  ) -> Result<ApiHeadlinesResponse, NewsError> {
    let page = page.unwrap_or(1);
    self.record(format!("headlines:{}:{}", filter.category(), page));

    if let Some(error) = self.headline_error.lock().unwrap().clone() {
      return Err(error);
    }

    let articles = self
      .headlines
      .lock()
      .unwrap()
      .get(&(filter.category().to_string(), page))
      .cloned()
      .unwrap_or_default();
    Ok(response(articles))
  }

  async fn fetch_sources(&self) -> Result<ApiSourcesResponse, NewsError> {
    self.record("sources".to_string());
    Ok(ApiSourcesResponse {
      status: "ok".to_string(),
      sources: self.sources.lock().unwrap().clone(),
    })
  }

  async fn search(&self, query: &str) -> Result<ApiHeadlinesResponse, NewsError> {
    self.record(format!("search:{}", query));

    let (articles, delay) = self
      .searches
      .lock()
      .unwrap()
      .get(query)
      .cloned()
      .unwrap_or_default();
    tokio::time::sleep(delay).await;
    self.finished_searches.lock().unwrap().push(query.to_string());

    if let Some(error) = self.search_error.lock().unwrap().clone() {
      return Err(error);
    }
    Ok(response(articles))
  }
}
