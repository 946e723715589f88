//! NewsAPI integration: wire types, the HTTP gateway and the use cases built
//! on top of the cache, paging and search engines.

pub mod api_types;
pub mod cache;
pub mod client;
#[cfg(test)]
pub mod fake;
pub mod headline_pages;
pub mod reference;
pub mod search;
pub mod service;
pub mod types;

pub use client::NewsClient;
pub use service::NewsService;
pub use types::Article;
