// Credential persistence in a SQLite key-value table

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{CredentialStore, TokenPair};

/// Credential store persisted in a SQLite `auth_kv` table
///
/// The two credentials live as rows under the configured key names, so
/// every client opening the same database observes whichever pair was most
/// recently persisted.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    access_key: String,
    refresh_key: String,
}

impl SqliteStore {
    /// Open the database at the given path, creating it if missing
    pub fn open(
        path: &Path,
        access_key: impl Into<String>,
        refresh_key: impl Into<String>,
    ) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open credential database: {}", path.display()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS auth_kv (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
            [],
        )
        .context("Failed to create auth_kv table")?;

        Ok(Self {
            conn: Mutex::new(conn),
            access_key: access_key.into(),
            refresh_key: refresh_key.into(),
        })
    }

    /// Default database location under the platform data directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_local_dir().map(|dir| dir.join("portal-client/credentials.sqlite3"))
    }

    fn get(conn: &Connection, key: &str) -> Result<Option<String>> {
        conn.query_row("SELECT value FROM auth_kv WHERE key = ?", [key], |row| {
            row.get(0)
        })
        .optional()
        .with_context(|| format!("Failed to read {key} from auth_kv"))
    }

    fn put(conn: &Connection, key: &str, value: &str) -> Result<()> {
        conn.execute(
            "INSERT OR REPLACE INTO auth_kv (key, value) VALUES (?, ?)",
            [key, value],
        )
        .with_context(|| format!("Failed to write {key} to auth_kv"))?;
        Ok(())
    }
}

impl CredentialStore for SqliteStore {
    fn load(&self) -> Result<Option<TokenPair>> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow::anyhow!("credential store lock poisoned"))?;

        let access = Self::get(&conn, &self.access_key)?;
        let refresh = Self::get(&conn, &self.refresh_key)?;

        match (access, refresh) {
            (Some(access_token), Some(refresh_token)) => Ok(Some(TokenPair {
                access_token,
                refresh_token,
            })),
            _ => Ok(None),
        }
    }

    fn save(&self, pair: &TokenPair) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow::anyhow!("credential store lock poisoned"))?;

        Self::put(&conn, &self.access_key, &pair.access_token)?;
        Self::put(&conn, &self.refresh_key, &pair.refresh_token)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow::anyhow!("credential store lock poisoned"))?;

        conn.execute(
            "DELETE FROM auth_kv WHERE key IN (?, ?)",
            [self.access_key.as_str(), self.refresh_key.as_str()],
        )
        .context("Failed to delete credentials from auth_kv")?;
        Ok(())
    }
}
