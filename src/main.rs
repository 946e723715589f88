mod cache;
mod config;
mod connectivity;
mod error;
mod logging;
mod news;
mod paging;
mod state;

use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::cache::{CacheStorage, MemoryStorage, SqliteStorage};
use crate::config::Config;
use crate::connectivity::{Connectivity, FixedConnectivity, NetworkProbe};
use crate::news::reference::{find_country, find_language};
use crate::news::{Article, NewsClient, NewsService};
use crate::state::{Query, ResultState};

#[derive(Parser, Debug)]
#[command(name = "headlines")]
#[command(about = "An offline-first news reader for the terminal")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/headlines/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Skip the network and serve cached data only
  #[arg(long, global = true)]
  offline: bool,

  /// Keep the cache in memory for this run
  #[arg(long, global = true)]
  ephemeral: bool,

  /// Debug-level logging
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Top headlines for a country
  Top {
    /// Two-letter country code (default from config)
    #[arg(short = 'C', long)]
    country: Option<String>,
  },
  /// Top headlines from one publisher
  Source {
    /// Publisher id, e.g. bbc-news
    id: String,
  },
  /// Top headlines in one language
  Language {
    /// Two-letter language code, e.g. fr
    id: String,
  },
  /// List publishers
  Sources,
  /// Search all articles
  Search { query: String },
  /// Page through top headlines without caching
  Pages {
    #[arg(short = 'C', long)]
    country: Option<String>,
    /// Stop after this many pages
    #[arg(short, long, default_value_t = 3)]
    max_pages: usize,
  },
  /// List supported countries
  Countries,
  /// List supported languages
  Languages,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _guard = logging::init(args.verbose)?;

  let config = Config::load(args.config.as_deref())?;

  let connectivity: Arc<dyn Connectivity> = if args.offline {
    Arc::new(FixedConnectivity(false))
  } else {
    Arc::new(NetworkProbe::new(
      config.connectivity.probe_address.clone(),
      config.connectivity.probe_timeout(),
    ))
  };

  let gateway = Arc::new(NewsClient::new(&config)?);

  if args.ephemeral {
    let service = NewsService::new(gateway, connectivity, MemoryStorage::new(), &config);
    run(service, &config, args.command).await
  } else {
    let storage = SqliteStorage::open(config.cache.path.as_deref())?;
    let service = NewsService::new(gateway, connectivity, storage, &config);
    run(service, &config, args.command).await
  }
}

async fn run<S: CacheStorage>(
  service: NewsService<S>,
  config: &Config,
  command: Command,
) -> Result<()> {
  info!(?command, "running command");

  match command {
    Command::Top { country } => {
      let country = country.unwrap_or_else(|| config.api.country.clone());
      if find_country(&country).is_none() {
        return Err(eyre!("Unknown country code: {}", country));
      }
      let articles = settle(service.clone(), move |s| {
        let country = country.clone();
        async move { s.top_headlines(&country).await }
      })
      .await?;
      print_articles(&articles);
    }
    Command::Source { id } => {
      let articles = settle(service.clone(), move |s| {
        let id = id.clone();
        async move { s.source_headlines(&id).await }
      })
      .await?;
      print_articles(&articles);
    }
    Command::Language { id } => {
      if find_language(&id).is_none() {
        return Err(eyre!("Unknown language code: {}", id));
      }
      let articles = settle(service.clone(), move |s| {
        let id = id.clone();
        async move { s.language_headlines(&id).await }
      })
      .await?;
      print_articles(&articles);
    }
    Command::Sources => {
      let sources = settle(service.clone(), |s| async move { s.news_sources().await }).await?;
      for source in sources {
        match source.id {
          Some(id) => println!("{:<28} {}", id, source.name),
          None => println!("{:<28} {}", "-", source.name),
        }
      }
    }
    Command::Search { query } => {
      let search = service.search();
      let mut rx = search.subscribe();
      search.set_query(query);

      let state = rx
        .wait_for(|s| !s.is_loading())
        .await
        .map_err(|e| eyre!("Search stopped: {}", e))?
        .clone();
      match state {
        ResultState::Success(articles) => print_articles(&articles),
        ResultState::Error(e) => return Err(eyre!(e)),
        ResultState::Loading => {}
      }
    }
    Command::Pages { country, max_pages } => {
      let country = country.unwrap_or_else(|| config.api.country.clone());
      let pager = service.headline_pager(&country);
      let mut pages = Box::pin(pager.stream(None).take(max_pages));

      while let Some(page) = pages.next().await {
        let page = page.map_err(|e| eyre!(e))?;
        if page.data.is_empty() {
          break;
        }
        println!("--- page {} ---", page.key);
        print_articles(&page.data);
      }
    }
    Command::Countries => {
      for country in service.countries().await? {
        println!("{}  {}", country.id, country.name);
      }
    }
    Command::Languages => {
      for language in service.languages().await? {
        println!("{}  {}", language.id, language.name);
      }
    }
  }

  Ok(())
}

/// Run a one-shot query through the state holder and unwrap its final state.
async fn settle<S, T, F, Fut>(service: NewsService<S>, load: F) -> Result<T>
where
  S: CacheStorage,
  T: Clone + Send + Sync + 'static,
  F: Fn(NewsService<S>) -> Fut + Send + Sync + 'static,
  Fut: std::future::Future<Output = Result<T, error::NewsError>> + Send + 'static,
{
  let mut query = Query::new(move || load(service.clone()));
  query.fetch();

  match query.settle().await {
    ResultState::Success(data) => Ok(data.clone()),
    ResultState::Error(e) => Err(eyre!("{}", e)),
    ResultState::Loading => Err(eyre!("Query did not complete")),
  }
}

fn print_articles(articles: &[Article]) {
  if articles.is_empty() {
    println!("No articles.");
    return;
  }

  for article in articles {
    println!("{}", article.title);
    println!("  {} | {}", article.source.name, article.url);
    if let Some(description) = &article.description {
      println!("  {}", description);
    }
  }
}
