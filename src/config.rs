use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::news::search::SearchSettings;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub search: SearchConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub connectivity: ConnectivityConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  /// Base url of the NewsAPI v2 endpoints
  pub url: String,
  /// Country used when none is given on the command line
  pub country: String,
  /// Page size for paged headlines
  pub page_size: u32,
  pub timeout_secs: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      url: "https://newsapi.org/v2/".to_string(),
      country: "us".to_string(),
      page_size: 10,
      timeout_secs: 10,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
  pub debounce_ms: u64,
  pub min_query_len: usize,
}

impl Default for SearchConfig {
  fn default() -> Self {
    let settings = SearchSettings::default();
    Self {
      debounce_ms: settings.debounce.as_millis() as u64,
      min_query_len: settings.min_query_len,
    }
  }
}

impl SearchConfig {
  pub fn settings(&self) -> SearchSettings {
    SearchSettings {
      debounce: Duration::from_millis(self.debounce_ms),
      min_query_len: self.min_query_len,
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  /// Cache database file (defaults to $XDG_DATA_HOME/headlines/cache.db)
  pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConnectivityConfig {
  /// `host:port` probed to decide between network and cache
  pub probe_address: String,
  pub probe_timeout_ms: u64,
}

impl Default for ConnectivityConfig {
  fn default() -> Self {
    Self {
      probe_address: "newsapi.org:443".to_string(),
      probe_timeout_ms: 1500,
    }
  }
}

impl ConnectivityConfig {
  pub fn probe_timeout(&self) -> Duration {
    Duration::from_millis(self.probe_timeout_ms)
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./headlines.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/headlines/config.yaml
  ///
  /// Without any file every setting takes its default.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("headlines.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("headlines").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Get the NewsAPI key from environment variables.
  ///
  /// Checks HEADLINES_API_KEY first, then NEWS_API_KEY as fallback.
  pub fn get_api_key() -> Result<String> {
    std::env::var("HEADLINES_API_KEY")
      .or_else(|_| std::env::var("NEWS_API_KEY"))
      .map_err(|_| {
        eyre!("NewsAPI key not found. Set HEADLINES_API_KEY or NEWS_API_KEY environment variable.")
      })
  }
}
