//! Serde-deserializable types matching NewsAPI responses.
//!
//! These types are separate from domain types to allow lenient deserialization
//! (missing and null fields are common on the wire) while keeping domain types
//! focused on application needs.

use serde::Deserialize;

use super::types::{Article, NewsSource, SourceRef};

// ============================================================================
// Shared nested types
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ApiSource {
  #[serde(default)]
  pub id: Option<String>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ApiArticle {
  #[serde(default, deserialize_with = "null_as_default")]
  pub title: String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub url: String,
  #[serde(rename = "urlToImage", default)]
  pub image_url: Option<String>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub source: ApiSource,
}

// ============================================================================
// Endpoint responses
// ============================================================================

/// `top-headlines` and `everything` share this shape
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiHeadlinesResponse {
  #[serde(default)]
  pub status: String,
  #[serde(rename = "totalResults", default)]
  pub total_results: u64,
  #[serde(default, deserialize_with = "null_as_default")]
  pub articles: Vec<ApiArticle>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiSourcesResponse {
  #[serde(default)]
  pub status: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub sources: Vec<ApiSource>,
}

/// Body returned with `status: "error"`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorResponse {
  #[serde(default)]
  pub status: Option<String>,
  #[serde(default)]
  pub code: Option<String>,
  #[serde(default)]
  pub message: Option<String>,
}

impl ApiErrorResponse {
  pub fn describe(&self) -> String {
    match (&self.code, &self.message) {
      (Some(code), Some(message)) => format!("{}: {}", code, message),
      (None, Some(message)) => message.clone(),
      (Some(code), None) => code.clone(),
      (None, None) => "unknown API error".to_string(),
    }
  }
}

// ============================================================================
// Conversions to domain types
// ============================================================================

impl From<ApiSource> for SourceRef {
  fn from(source: ApiSource) -> Self {
    SourceRef {
      id: source.id,
      name: source.name,
    }
  }
}

impl From<ApiSource> for NewsSource {
  fn from(source: ApiSource) -> Self {
    NewsSource {
      id: source.id,
      name: source.name,
    }
  }
}

impl ApiArticle {
  pub fn into_article(self, category: &str) -> Article {
    Article {
      title: self.title,
      description: self.description,
      url: self.url,
      image_url: self.image_url,
      source: self.source.into(),
      category: category.to_string(),
    }
  }
}

impl ApiHeadlinesResponse {
  pub fn into_articles(self, category: &str) -> Vec<Article> {
    self
      .articles
      .into_iter()
      .map(|a| a.into_article(category))
      .collect()
  }
}

// ============================================================================
// Helpers
// ============================================================================

/// Treat an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
  D: serde::Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_headlines_response_decodes_sparse_articles() {
    let body = r#"{
      "status": "ok",
      "totalResults": 2,
      "articles": [
        {"title": "t", "url": "u", "source": {"id": "s", "name": "n"}},
        {"title": null, "description": "d", "url": "u2", "urlToImage": "i",
         "source": {"id": null, "name": "Blog"}, "author": "someone"}
      ]
    }"#;

    let response: ApiHeadlinesResponse = serde_json::from_str(body).unwrap();
    assert_eq!(response.status, "ok");
    assert_eq!(response.total_results, 2);

    let articles = response.into_articles("us");
    assert_eq!(
      articles[0],
      Article {
        title: "t".into(),
        description: None,
        url: "u".into(),
        image_url: None,
        source: SourceRef {
          id: Some("s".into()),
          name: "n".into(),
        },
        category: "us".into(),
      }
    );
    assert_eq!(articles[1].title, "");
    assert_eq!(articles[1].image_url.as_deref(), Some("i"));
    assert_eq!(articles[1].source.id, None);
  }

  #[test]
  fn test_sources_response_decodes() {
    let body = r#"{"status": "ok", "sources": [
      {"id": "bbc-news", "name": "BBC News", "category": "general"},
      {"name": "Unnamed"}
    ]}"#;

    let response: ApiSourcesResponse = serde_json::from_str(body).unwrap();
    let sources: Vec<NewsSource> = response.sources.into_iter().map(NewsSource::from).collect();
    assert_eq!(sources[0].id.as_deref(), Some("bbc-news"));
    assert_eq!(sources[1].id, None);
    assert_eq!(sources[1].name, "Unnamed");
  }

  #[test]
  fn test_error_response_description() {
    let body = r#"{"status": "error", "code": "apiKeyInvalid", "message": "Your API key is invalid."}"#;
    let response: ApiErrorResponse = serde_json::from_str(body).unwrap();
    assert_eq!(response.describe(), "apiKeyInvalid: Your API key is invalid.");
  }
}
