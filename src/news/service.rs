//! Use cases handed to the presentation layer.

use std::sync::Arc;
use tracing::info;

use crate::cache::{CacheLayer, CacheStorage};
use crate::config::Config;
use crate::connectivity::Connectivity;
use crate::error::NewsError;
use crate::news::cache::NewsQueryKey;
use crate::news::client::NewsGateway;
use crate::news::headline_pages::HeadlinePagingSource;
use crate::news::reference::{COUNTRIES, LANGUAGES};
use crate::news::search::{SearchQuery, SearchSettings};
use crate::news::types::{Article, Country, HeadlineFilter, Language, NewsSource};
use crate::paging::Pager;

/// News access with transparent caching and offline support.
///
/// Cached use cases check connectivity once per call: online they refresh the
/// cache from the network, offline they serve what was cached last.
pub struct NewsService<S: CacheStorage> {
  gateway: Arc<dyn NewsGateway>,
  connectivity: Arc<dyn Connectivity>,
  cache: CacheLayer<S>,
  page_size: u32,
  search: SearchSettings,
}

impl<S: CacheStorage> NewsService<S> {
  pub fn new(
    gateway: Arc<dyn NewsGateway>,
    connectivity: Arc<dyn Connectivity>,
    storage: S,
    config: &Config,
  ) -> Self {
    Self {
      gateway,
      connectivity,
      cache: CacheLayer::new(storage),
      page_size: config.api.page_size,
      search: config.search.settings(),
    }
  }

  /// Top headlines for a country code
  pub async fn top_headlines(&self, country: &str) -> Result<Vec<Article>, NewsError> {
    let key = NewsQueryKey::TopHeadlines {
      country: country.to_string(),
    };
    self
      .headlines(HeadlineFilter::Country(country.to_string()), key)
      .await
  }

  /// Top headlines from one publisher
  pub async fn source_headlines(&self, source: &str) -> Result<Vec<Article>, NewsError> {
    let key = NewsQueryKey::SourceHeadlines {
      source: source.to_string(),
    };
    self
      .headlines(HeadlineFilter::Source(source.to_string()), key)
      .await
  }

  /// Top headlines in one language
  pub async fn language_headlines(&self, language: &str) -> Result<Vec<Article>, NewsError> {
    let key = NewsQueryKey::LanguageHeadlines {
      language: language.to_string(),
    };
    self
      .headlines(HeadlineFilter::Language(language.to_string()), key)
      .await
  }

  async fn headlines(
    &self,
    filter: HeadlineFilter,
    key: NewsQueryKey,
  ) -> Result<Vec<Article>, NewsError> {
    let connected = self.connectivity.is_connected().await;
    let gateway = Arc::clone(&self.gateway);

    let articles = self
      .cache
      .sync(&key, connected, || async move {
        let response = gateway.fetch_headlines(&filter, None, None).await?;
        Ok(response.into_articles(filter.category()))
      })
      .await?;

    info!(category = ?key, connected, count = articles.len(), "headlines ready");
    Ok(articles)
  }

  /// The publisher catalog
  pub async fn news_sources(&self) -> Result<Vec<NewsSource>, NewsError> {
    let connected = self.connectivity.is_connected().await;
    let gateway = Arc::clone(&self.gateway);

    self
      .cache
      .sync(&NewsQueryKey::Sources, connected, || async move {
        let response = gateway.fetch_sources().await?;
        Ok(response.sources.into_iter().map(NewsSource::from).collect())
      })
      .await
  }

  pub async fn countries(&self) -> Result<Vec<Country>, NewsError> {
    Ok(COUNTRIES.to_vec())
  }

  pub async fn languages(&self) -> Result<Vec<Language>, NewsError> {
    Ok(LANGUAGES.to_vec())
  }

  /// Uncached, page-by-page top headlines
  pub fn headline_pager(&self, country: &str) -> Pager<HeadlinePagingSource> {
    Pager::new(HeadlinePagingSource::new(
      Arc::clone(&self.gateway),
      country,
      self.page_size,
    ))
  }

  /// A new debounced search stream
  pub fn search(&self) -> SearchQuery {
    SearchQuery::spawn(
      Arc::clone(&self.gateway),
      Arc::clone(&self.connectivity),
      self.search,
    )
  }
}

impl<S: CacheStorage> Clone for NewsService<S> {
  fn clone(&self) -> Self {
    Self {
      gateway: Arc::clone(&self.gateway),
      connectivity: Arc::clone(&self.connectivity),
      cache: self.cache.clone(),
      page_size: self.page_size,
      search: self.search,
    }
  }
}
