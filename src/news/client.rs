use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::error::NewsError;
use crate::news::api_types::{ApiErrorResponse, ApiHeadlinesResponse, ApiSourcesResponse};
use crate::news::types::HeadlineFilter;

/// Remote content provider consumed by the sync, paging and search engines
#[async_trait]
pub trait NewsGateway: Send + Sync {
  /// Top headlines, optionally one page of them
  async fn fetch_headlines(
    &self,
    filter: &HeadlineFilter,
    page: Option<u32>,
    page_size: Option<u32>,
  ) -> Result<ApiHeadlinesResponse, NewsError>;

  /// The publisher catalog
  async fn fetch_sources(&self) -> Result<ApiSourcesResponse, NewsError>;

  /// Free-text search across all articles
  async fn search(&self, query: &str) -> Result<ApiHeadlinesResponse, NewsError>;
}

/// NewsAPI client
#[derive(Clone)]
pub struct NewsClient {
  http: reqwest::Client,
  base_url: Url,
}

impl NewsClient {
  pub fn new(config: &Config) -> Result<Self> {
    let api_key = Config::get_api_key()?;
    Self::with_base_url(
      &config.api.url,
      &api_key,
      Duration::from_secs(config.api.timeout_secs),
    )
  }

  pub fn with_base_url(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
    let mut base_url =
      Url::parse(base_url).map_err(|e| eyre!("Invalid API url {}: {}", base_url, e))?;
    // Url::join drops the last path segment unless it ends with a slash
    if !base_url.path().ends_with('/') {
      let path = format!("{}/", base_url.path());
      base_url.set_path(&path);
    }

    let mut key = HeaderValue::from_str(api_key).map_err(|e| eyre!("Invalid API key: {}", e))?;
    key.set_sensitive(true);
    let mut headers = HeaderMap::new();
    headers.insert("x-api-key", key);

    let http = reqwest::Client::builder()
      .timeout(timeout)
      .user_agent(concat!("headlines/", env!("CARGO_PKG_VERSION")))
      .default_headers(headers)
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { http, base_url })
  }

  fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<Url, NewsError> {
    let mut url = self
      .base_url
      .join(path)
      .map_err(|e| NewsError::Remote(format!("Invalid endpoint {}: {}", path, e)))?;
    if !query.is_empty() {
      url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url)
  }

  async fn get<T: DeserializeOwned>(
    &self,
    path: &str,
    query: &[(&str, String)],
  ) -> Result<T, NewsError> {
    let url = self.endpoint(path, query)?;
    debug!(%url, "GET");

    let response = self.http.get(url).send().await?;
    let status = response.status();
    let body = response.bytes().await?;

    // NewsAPI reports failures as {"status": "error", ...}, sometimes with a 200
    let envelope: ApiErrorResponse = serde_json::from_slice(&body).unwrap_or_default();
    if !status.is_success() {
      return Err(NewsError::Remote(format!(
        "HTTP {}: {}",
        status.as_u16(),
        envelope.describe()
      )));
    }
    if envelope.status.as_deref() == Some("error") {
      return Err(NewsError::Remote(envelope.describe()));
    }

    serde_json::from_slice(&body)
      .map_err(|e| NewsError::Remote(format!("Failed to decode {} response: {}", path, e)))
  }
}

#[async_trait]
impl NewsGateway for NewsClient {
  async fn fetch_headlines(
    &self,
    filter: &HeadlineFilter,
    page: Option<u32>,
    page_size: Option<u32>,
  ) -> Result<ApiHeadlinesResponse, NewsError> {
    let mut query = match filter {
      HeadlineFilter::Country(country) => vec![("country", country.clone())],
      HeadlineFilter::Source(source) => vec![("sources", source.clone())],
      HeadlineFilter::Language(language) => vec![("language", language.clone())],
    };
    if let Some(page) = page {
      query.push(("page", page.to_string()));
    }
    if let Some(page_size) = page_size {
      query.push(("pageSize", page_size.to_string()));
    }

    self.get("top-headlines", &query).await
  }

  async fn fetch_sources(&self) -> Result<ApiSourcesResponse, NewsError> {
    self.get("top-headlines/sources", &[]).await
  }

  async fn search(&self, query: &str) -> Result<ApiHeadlinesResponse, NewsError> {
    self.get("everything", &[("q", query.to_string())]).await
  }
}
