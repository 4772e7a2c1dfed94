use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_API_URL: &str = "https://jsonplaceholder.typicode.com";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  /// Base URL of the todo resource (the `todos` collection lives under it)
  #[serde(default = "default_api_url")]
  pub api_url: String,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub log: LogConfig,
}

fn default_api_url() -> String {
  DEFAULT_API_URL.to_string()
}

impl Default for Config {
  fn default() -> Self {
    Self {
      api_url: default_api_url(),
      cache: CacheConfig::default(),
      log: LogConfig::default(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// Minutes before a cached query result is considered stale
  #[serde(default = "default_stale_minutes")]
  pub stale_minutes: i64,
  /// Keep a snapshot of the todo list on disk between runs
  #[serde(default = "default_true")]
  pub persist: bool,
  /// Location of the cache database (defaults to the user data directory)
  pub path: Option<PathBuf>,
}

fn default_stale_minutes() -> i64 {
  5
}

fn default_true() -> bool {
  true
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      stale_minutes: default_stale_minutes(),
      persist: true,
      path: None,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
  /// Default filter directive, overridden by RUST_LOG
  #[serde(default = "default_log_level")]
  pub level: String,
  /// Directory for log files (defaults to the user data directory)
  pub dir: Option<PathBuf>,
}

fn default_log_level() -> String {
  "info".to_string()
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: default_log_level(),
      dir: None,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./todomaster.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/todomaster/config.yaml
  ///
  /// No file at all means defaults; the API needs no credentials.
  /// `TODOMASTER_API_URL` overrides the configured API URL.
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

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Self::default(),
    };

    if let Ok(url) = std::env::var("TODOMASTER_API_URL") {
      config.api_url = url;
    }

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("todomaster.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("todomaster").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> std::result::Result<Self, serde_yaml::Error> {
    serde_yaml::from_str(contents)
  }

  /// Staleness window for the in-memory query cache.
  pub fn stale_time(&self) -> chrono::Duration {
    chrono::Duration::try_minutes(self.cache.stale_minutes.max(0)).unwrap_or(chrono::Duration::MAX)
  }

  /// Directory log files are written to.
  pub fn log_dir(&self) -> Result<PathBuf> {
    if let Some(dir) = &self.log.dir {
      return Ok(dir.clone());
    }
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;
    Ok(data_dir.join("todomaster").join("logs"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_file_uses_defaults() {
    let config = Config::parse("{}").unwrap();
    assert_eq!(config.api_url, DEFAULT_API_URL);
    assert_eq!(config.cache.stale_minutes, 5);
    assert!(config.cache.persist);
    assert_eq!(config.log.level, "info");
  }

  #[test]
  fn test_parse_full_config() {
    let config = Config::parse(
      r#"
api_url: http://localhost:3000
cache:
  stale_minutes: 1
  persist: false
  path: /tmp/todos.db
log:
  level: debug
  dir: /tmp/logs
"#,
    )
    .unwrap();

    assert_eq!(config.api_url, "http://localhost:3000");
    assert_eq!(config.stale_time(), chrono::Duration::minutes(1));
    assert!(!config.cache.persist);
    assert_eq!(config.cache.path, Some(PathBuf::from("/tmp/todos.db")));
    assert_eq!(config.log_dir().unwrap(), PathBuf::from("/tmp/logs"));
  }

  #[test]
  fn test_negative_stale_minutes_clamp_to_zero() {
    let config = Config::parse("cache:\n  stale_minutes: -3\n").unwrap();
    assert_eq!(config.stale_time(), chrono::Duration::zero());
  }

  #[test]
  fn test_huge_stale_minutes_saturate() {
    let config = Config::parse("cache:\n  stale_minutes: 9223372036854775807\n").unwrap();
    assert_eq!(config.stale_time(), chrono::Duration::MAX);
  }

  #[test]
  fn test_missing_explicit_path_is_an_error() {
    let result = Config::load(Some(Path::new("/definitely/not/here.yaml")));
    assert!(result.is_err());
  }
}
