use serde::{Deserialize, Serialize};

/// Publisher reference carried by every article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
  pub id: Option<String>,
  pub name: String,
}

/// A news article, tagged with the category it was fetched under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
  pub title: String,
  pub description: Option<String>,
  pub url: String,
  pub image_url: Option<String>,
  pub source: SourceRef,
  /// Country code, source id, language code or search query
  pub category: String,
}

/// Publisher from the source catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsSource {
  pub id: Option<String>,
  pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Country {
  pub id: &'static str,
  pub name: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
  pub id: &'static str,
  pub name: &'static str,
}

/// Which headlines to ask the gateway for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadlineFilter {
  Country(String),
  Source(String),
  Language(String),
}

impl HeadlineFilter {
  /// The category tag stored on articles fetched with this filter
  pub fn category(&self) -> &str {
    match self {
      HeadlineFilter::Country(c) => c,
      HeadlineFilter::Source(s) => s,
      HeadlineFilter::Language(l) => l,
    }
  }
}
