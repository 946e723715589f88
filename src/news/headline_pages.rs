use async_trait::async_trait;
use std::sync::Arc;

use crate::error::NewsError;
use crate::news::client::NewsGateway;
use crate::news::types::{Article, HeadlineFilter};
use crate::paging::{Page, PagingSource, INITIAL_KEY};

/// Top headlines for one country, page by page. Never cached.
pub struct HeadlinePagingSource {
  gateway: Arc<dyn NewsGateway>,
  filter: HeadlineFilter,
  page_size: u32,
}

impl HeadlinePagingSource {
  pub fn new(gateway: Arc<dyn NewsGateway>, country: &str, page_size: u32) -> Self {
    Self {
      gateway,
      filter: HeadlineFilter::Country(country.to_string()),
      page_size,
    }
  }
}

#[async_trait]
impl PagingSource for HeadlinePagingSource {
  type Item = Article;

  async fn load(&self, key: Option<u32>) -> Result<Page<Article>, NewsError> {
    let page = key.unwrap_or(INITIAL_KEY);
    let response = self
      .gateway
      .fetch_headlines(&self.filter, Some(page), Some(self.page_size))
      .await?;

    Ok(Page::new(page, response.into_articles(self.filter.category())))
  }
}
