use crate::error::CacheError;
use crate::models::distribution::Distribution;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, RwLock};

const DB_SCHEMA_VERSION: i64 = 2;

/// Durable year -> distribution map. Entries never expire on their own.
pub trait DistributionCache: Send + Sync {
    fn get(&self, year: i32) -> Result<Option<Distribution>, CacheError>;
    fn put(&self, year: i32, distribution: &Distribution) -> Result<(), CacheError>;
    /// Drop one year. Returns whether an entry existed.
    fn invalidate(&self, year: i32) -> Result<bool, CacheError>;
}

pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;",
    )?;

    let mut version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if version < 1 {
        apply_migration_1(conn)?;
        version = 1;
        conn.pragma_update(None, "user_version", version)?;
    }

    if version < 2 {
        apply_migration_2(conn)?;
        version = 2;
        conn.pragma_update(None, "user_version", version)?;
    }

    if version > DB_SCHEMA_VERSION {
        log::warn!("Cache schema version {version} is newer than {DB_SCHEMA_VERSION}; continuing");
    }

    Ok(())
}

fn apply_migration_1(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS distributions (
            year INTEGER PRIMARY KEY,
            payload_json TEXT NOT NULL,
            total_shots INTEGER NOT NULL DEFAULT 0
        );
        ",
    )
}

fn apply_migration_2(conn: &Connection) -> rusqlite::Result<()> {
    add_column_if_missing(conn, "distributions", "computed_at INTEGER NOT NULL DEFAULT 0")
}

fn add_column_if_missing(conn: &Connection, table: &str, column_def: &str) -> rusqlite::Result<()> {
    let column_name = column_def
        .split_whitespace()
        .next()
        .unwrap_or(column_def)
        .to_string();

    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let exists = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .filter_map(|res| res.ok())
        .any(|name| name == column_name);

    if !exists {
        conn.execute(&format!("ALTER TABLE {table} ADD COLUMN {column_def}"), [])?;
    }

    Ok(())
}

/// Cache stored in a SQLite file so results survive restarts.
pub struct SqliteDistributionCache {
    conn: Mutex<Connection>,
}

impl SqliteDistributionCache {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self, CacheError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn cached_years(&self) -> Result<Vec<i32>, CacheError> {
        let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;
        let mut stmt = conn.prepare("SELECT year FROM distributions ORDER BY year ASC")?;
        let years = stmt
            .query_map([], |row| row.get::<_, i32>(0))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(years)
    }
}

impl DistributionCache for SqliteDistributionCache {
    fn get(&self, year: i32) -> Result<Option<Distribution>, CacheError> {
        let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;
        let payload: Option<String> = conn
            .query_row(
                "SELECT payload_json FROM distributions WHERE year = ?1",
                params![year],
                |row| row.get(0),
            )
            .optional()?;

        match payload {
            Some(json) => match serde_json::from_str::<Distribution>(&json) {
                Ok(dist) => Ok(Some(dist)),
                Err(e) => {
                    log::warn!("Ignoring unreadable cache entry for {year}: {e}");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    fn put(&self, year: i32, distribution: &Distribution) -> Result<(), CacheError> {
        let payload = serde_json::to_string(distribution)?;
        let now = chrono::Utc::now().timestamp();
        let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;

        conn.execute(
            "
            INSERT INTO distributions (year, payload_json, total_shots, computed_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(year) DO UPDATE SET
                payload_json = excluded.payload_json,
                total_shots = excluded.total_shots,
                computed_at = excluded.computed_at
            ",
            params![year, payload, distribution.total_shots as i64, now],
        )?;

        Ok(())
    }

    fn invalidate(&self, year: i32) -> Result<bool, CacheError> {
        let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;
        let removed = conn.execute("DELETE FROM distributions WHERE year = ?1", params![year])?;
        Ok(removed > 0)
    }
}

/// Process-local cache for tests and `persistCache = false` runs.
#[derive(Debug, Default)]
pub struct MemoryDistributionCache {
    entries: RwLock<HashMap<i32, Distribution>>,
}

impl MemoryDistributionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DistributionCache for MemoryDistributionCache {
    fn get(&self, year: i32) -> Result<Option<Distribution>, CacheError> {
        let entries = self.entries.read().map_err(|_| CacheError::Poisoned)?;
        Ok(entries.get(&year).cloned())
    }

    fn put(&self, year: i32, distribution: &Distribution) -> Result<(), CacheError> {
        let mut entries = self.entries.write().map_err(|_| CacheError::Poisoned)?;
        entries.insert(year, distribution.clone());
        Ok(())
    }

    fn invalidate(&self, year: i32) -> Result<bool, CacheError> {
        let mut entries = self.entries.write().map_err(|_| CacheError::Poisoned)?;
        Ok(entries.remove(&year).is_some())
    }
}
