//! Credential storage: the access and refresh tokens of the current session.

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::lock;

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Key/value storage for credentials.
///
/// Implementors only provide raw get/set/remove; the token helpers are
/// shared.
pub trait TokenStore: Send + Sync {
  fn get(&self, key: &str) -> Result<Option<String>>;

  fn set(&self, key: &str, value: &str) -> Result<()>;

  fn remove(&self, key: &str) -> Result<()>;

  fn access_token(&self) -> Result<Option<String>> {
    self.get(ACCESS_TOKEN_KEY)
  }

  fn refresh_token(&self) -> Result<Option<String>> {
    self.get(REFRESH_TOKEN_KEY)
  }

  fn set_tokens(&self, access: &str, refresh: &str) -> Result<()> {
    self.set(ACCESS_TOKEN_KEY, access)?;
    self.set(REFRESH_TOKEN_KEY, refresh)
  }

  fn set_access_token(&self, access: &str) -> Result<()> {
    self.set(ACCESS_TOKEN_KEY, access)
  }

  /// Remove both tokens.
  fn clear(&self) -> Result<()> {
    self.remove(ACCESS_TOKEN_KEY)?;
    self.remove(REFRESH_TOKEN_KEY)
  }

  fn has_tokens(&self) -> Result<bool> {
    Ok(self.access_token()?.is_some() && self.refresh_token()?.is_some())
  }
}

/// Credentials that live as long as the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
  values: Mutex<HashMap<String, String>>,
}

impl MemoryTokenStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl TokenStore for MemoryTokenStore {
  fn get(&self, key: &str) -> Result<Option<String>> {
    Ok(lock(&self.values).get(key).cloned())
  }

  fn set(&self, key: &str, value: &str) -> Result<()> {
    lock(&self.values).insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<()> {
    lock(&self.values).remove(key);
    Ok(())
  }
}

/// SQLite-backed credentials that survive restarts.
pub struct SqliteTokenStore {
  conn: Mutex<Connection>,
}

const CREDENTIALS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS credentials (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

impl SqliteTokenStore {
  /// Open the store at the default location.
  pub fn open_default() -> Result<Self> {
    Self::open(&Self::default_path()?)
  }

  pub fn open(path: &Path) -> Result<Self> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create credentials directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open credentials database at {}: {}", path.display(), e))?;

    conn
      .execute_batch(CREDENTIALS_SCHEMA)
      .map_err(|e| eyre!("Failed to run credentials migrations: {}", e))?;

    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  pub fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("pictura").join("credentials.db"))
  }
}

impl TokenStore for SqliteTokenStore {
  fn get(&self, key: &str) -> Result<Option<String>> {
    let conn = lock(&self.conn);
    conn
      .query_row(
        "SELECT value FROM credentials WHERE key = ?",
        params![key],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| eyre!("Failed to read credential {}: {}", key, e))
  }

  fn set(&self, key: &str, value: &str) -> Result<()> {
    let conn = lock(&self.conn);
    conn
      .execute(
        "INSERT OR REPLACE INTO credentials (key, value, updated_at) VALUES (?, ?, datetime('now'))",
        params![key, value],
      )
      .map_err(|e| eyre!("Failed to store credential {}: {}", key, e))?;
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<()> {
    let conn = lock(&self.conn);
    conn
      .execute("DELETE FROM credentials WHERE key = ?", params![key])
      .map_err(|e| eyre!("Failed to remove credential {}: {}", key, e))?;
    Ok(())
  }
}
