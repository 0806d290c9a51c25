use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::http::retry::RetryPolicy;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api/";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub retry: RetryConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub credentials: CredentialsConfig,
  /// Email used by `login` when none is given on the command line
  pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  pub base_url: String,
  /// Per-request timeout; uploads always get 30s
  pub timeout_secs: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: DEFAULT_BASE_URL.to_string(),
      timeout_secs: 10,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
  pub max_retries: u32,
  pub delay_ms: u64,
}

impl Default for RetryConfig {
  fn default() -> Self {
    Self {
      max_retries: 3,
      delay_ms: 1000,
    }
  }
}

impl RetryConfig {
  pub fn policy(&self) -> RetryPolicy {
    RetryPolicy {
      max_retries: self.max_retries,
      delay: Duration::from_millis(self.delay_ms),
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
  /// Refetch cached entries older than this. Unset means entries live until
  /// invalidated.
  pub stale_after_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialsConfig {
  /// SQLite file holding the tokens (defaults to the data directory)
  pub path: Option<PathBuf>,
  /// Keep tokens in memory only
  #[serde(default)]
  pub in_memory: bool,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./pictura.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/pictura/config.yaml
  ///
  /// Falls back to defaults when no file is found.
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
      None => {
        tracing::debug!("no config file found, using defaults");
        Ok(Self::default())
      }
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("pictura.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("pictura").join("config.yaml");
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

  pub fn parse(contents: &str) -> Result<Self> {
    // An empty file deserializes as null
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    Ok(serde_yaml::from_str(contents)?)
  }

  pub fn stale_after(&self) -> Option<chrono::Duration> {
    self
      .cache
      .stale_after_secs
      .and_then(|secs| chrono::Duration::try_seconds(secs as i64))
  }

  /// Get the account password from the environment.
  ///
  /// Checks PICTURA_PASSWORD.
  pub fn get_password() -> Result<String> {
    std::env::var("PICTURA_PASSWORD")
      .map_err(|_| eyre!("Password not found. Set PICTURA_PASSWORD environment variable."))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn test_defaults() {
    let config = Config::parse("").unwrap();
    assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
    assert_eq!(config.api.timeout_secs, 10);
    assert_eq!(config.retry.policy(), RetryPolicy::default());
    assert!(config.stale_after().is_none());
    assert!(!config.credentials.in_memory);
  }

  #[test]
  fn test_partial_sections_keep_defaults() {
    let config = Config::parse(
      "api:\n  base_url: https://photos.example.com/api/\nretry:\n  max_retries: 1\ncache:\n  stale_after_secs: 60\n",
    )
    .unwrap();

    assert_eq!(config.api.base_url, "https://photos.example.com/api/");
    assert_eq!(config.api.timeout_secs, 10);
    assert_eq!(config.retry.max_retries, 1);
    assert_eq!(config.retry.delay_ms, 1000);
    assert_eq!(config.stale_after(), Some(chrono::Duration::seconds(60)));
  }

  #[test]
  fn test_explicit_missing_path_is_an_error() {
    let err = Config::load(Some(Path::new("/nonexistent/pictura.yaml"))).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
  }

  #[test]
  fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "email: ana@example.com\ncredentials:\n  in_memory: true\n").unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.email.as_deref(), Some("ana@example.com"));
    assert!(config.credentials.in_memory);
  }
}
