// /////////////////////////////////////////////////////////////////////////////
// memo — persistent memoization library
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # SQLite archive
//!
//! A durable mapping stored in a single SQLite table, schema
//! `CREATE TABLE IF NOT EXISTS <table> (k BLOB PRIMARY KEY, v BLOB NOT NULL)`.
//! Connection pool owned by the archive, table name threaded through as a
//! format parameter, schema ensured on construction. Both sides are
//! stored as raw `BLOB`s — keys and values here are already opaque bytes
//! ([`memo_core::Key::encode_filename`]'s digest/bytes/string forms, and
//! whatever the configured encoder produced), so there is nothing for a
//! text column to buy.
//!
//! [`Archive`] is synchronous but `sqlx` is not; this module owns a
//! dedicated multi-thread Tokio runtime and blocks on it per call, a
//! synchronous facade over an async connection pool.

use memo_core::{Archive, Key, MemoError, Result, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

fn open_pool(path: &str, runtime: &tokio::runtime::Runtime) -> Result<SqlitePool> {
    runtime.block_on(async {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| MemoError::database(e.to_string()))?
            .create_if_missing(true);
        // A single connection: `:memory:` databases are per-connection, so
        // a pool of more than one would silently fragment an in-memory
        // archive across connections that each see an empty database.
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| MemoError::database(e.to_string()))
    })
}

fn ensure_table(pool: &SqlitePool, runtime: &tokio::runtime::Runtime, table: &str) -> Result<()> {
    validate_table_name(table)?;
    runtime.block_on(async {
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (k BLOB PRIMARY KEY, v BLOB NOT NULL)"
        ))
        .execute(pool)
        .await
        .map_err(|e| MemoError::database(e.to_string()))?;
        Ok(())
    })
}

fn new_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .map_err(|e| MemoError::database(e.to_string()))
}

pub struct SqliteArchive {
    pool: SqlitePool,
    table: String,
    runtime: tokio::runtime::Runtime,
}

impl SqliteArchive {
    /// Opens (creating if absent) the SQLite database at `path` and
    /// ensures `table` exists with the archive's fixed two-column schema.
    pub fn open(path: &str, table: impl Into<String>) -> Result<Self> {
        let table = table.into();
        let runtime = new_runtime()?;
        let pool = open_pool(path, &runtime)?;
        ensure_table(&pool, &runtime, &table)?;
        Ok(Self { pool, table, runtime })
    }
}

/// A single SQLite database shared by several named caches, each keyed
/// into its own table. One pool and one runtime are shared across every
/// table handed out, rather than each cache paying for its own
/// connection pool and worker thread the way standalone [`SqliteArchive`]
/// instances would.
pub struct SqliteMultiTableArchive {
    pool: SqlitePool,
    runtime: Arc<tokio::runtime::Runtime>,
}

impl SqliteMultiTableArchive {
    pub fn open(path: &str) -> Result<Self> {
        let runtime = Arc::new(new_runtime()?);
        let pool = open_pool(path, &runtime)?;
        Ok(Self { pool, runtime })
    }

    /// Hands out an [`Archive`] backed by `table` in this database,
    /// creating the table if it doesn't exist yet. Cheap: it clones the
    /// shared pool and runtime handle rather than opening a new
    /// connection pool.
    pub fn table(&self, table: impl Into<String>) -> Result<SqliteTableArchive> {
        let table = table.into();
        ensure_table(&self.pool, &self.runtime, &table)?;
        Ok(SqliteTableArchive {
            pool: self.pool.clone(),
            table,
            runtime: Arc::clone(&self.runtime),
        })
    }
}

/// A handle to one table of a [`SqliteMultiTableArchive`].
pub struct SqliteTableArchive {
    pool: SqlitePool,
    table: String,
    runtime: Arc<tokio::runtime::Runtime>,
}

/// Table names are interpolated into the schema/query strings (`sqlx`
/// cannot bind identifiers), so reject anything that isn't a plain
/// identifier before it ever reaches a query.
fn validate_table_name(name: &str) -> Result<()> {
    let ok = !name.is_empty()
        && name.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if ok {
        Ok(())
    } else {
        Err(MemoError::database(format!("invalid table name: {name}")))
    }
}

fn table_get(pool: &SqlitePool, runtime: &tokio::runtime::Runtime, table: &str, key: &Key) -> Result<Option<Value>> {
    let k = key.encode_filename().into_bytes();
    runtime.block_on(async {
        let row = sqlx::query(&format!("SELECT v FROM {table} WHERE k = ?"))
            .bind(&k)
            .fetch_optional(pool)
            .await
            .map_err(|e| MemoError::database(e.to_string()))?;
        Ok(row.map(|row| Value::from_bytes(row.get::<Vec<u8>, _>("v"))))
    })
}

fn table_put(pool: &SqlitePool, runtime: &tokio::runtime::Runtime, table: &str, key: &Key, value: Value) -> Result<()> {
    let k = key.encode_filename().into_bytes();
    let v = value.as_bytes().to_vec();
    runtime.block_on(async {
        sqlx::query(&format!("INSERT OR REPLACE INTO {table} (k, v) VALUES (?, ?)"))
            .bind(&k)
            .bind(&v)
            .execute(pool)
            .await
            .map_err(|e| MemoError::database(e.to_string()))?;
        Ok(())
    })
}

fn table_delete(pool: &SqlitePool, runtime: &tokio::runtime::Runtime, table: &str, key: &Key) -> Result<()> {
    let k = key.encode_filename().into_bytes();
    runtime.block_on(async {
        sqlx::query(&format!("DELETE FROM {table} WHERE k = ?"))
            .bind(&k)
            .execute(pool)
            .await
            .map_err(|e| MemoError::database(e.to_string()))?;
        Ok(())
    })
}

/// Same recovery heuristic as the directory archive, applied to the
/// stored `k` column instead of a filename: the column holds the UTF-8
/// bytes of [`Key::encode_filename`]'s base64 string, so it must be
/// base64-decoded back to raw bytes before the length check that tells a
/// digest apart from a string or an opaque byte key.
fn table_keys(pool: &SqlitePool, runtime: &tokio::runtime::Runtime, table: &str) -> Result<Vec<Key>> {
    use base64::Engine;
    runtime.block_on(async {
        let rows = sqlx::query(&format!("SELECT k FROM {table}"))
            .fetch_all(pool)
            .await
            .map_err(|e| MemoError::database(e.to_string()))?;
        rows.into_iter()
            .map(|row| {
                let encoded: Vec<u8> = row.get("k");
                let raw = base64::engine::general_purpose::URL_SAFE_NO_PAD
                    .decode(&encoded)
                    .map_err(|e| MemoError::database(e.to_string()))?;
                Ok(if raw.len() == 32 {
                    let mut digest = [0u8; 32];
                    digest.copy_from_slice(&raw);
                    Key::Digest(memo_core::Digest(digest))
                } else {
                    match String::from_utf8(raw.clone()) {
                        Ok(s) => Key::Str(s),
                        Err(_) => Key::Bytes(Value::from_bytes(raw)),
                    }
                })
            })
            .collect()
    })
}

fn table_len(pool: &SqlitePool, runtime: &tokio::runtime::Runtime, table: &str) -> Result<usize> {
    runtime.block_on(async {
        let row = sqlx::query(&format!("SELECT COUNT(*) AS n FROM {table}"))
            .fetch_one(pool)
            .await
            .map_err(|e| MemoError::database(e.to_string()))?;
        Ok(row.get::<i64, _>("n") as usize)
    })
}

fn table_clear(pool: &SqlitePool, runtime: &tokio::runtime::Runtime, table: &str) -> Result<()> {
    runtime.block_on(async {
        sqlx::query(&format!("DELETE FROM {table}"))
            .execute(pool)
            .await
            .map_err(|e| MemoError::database(e.to_string()))?;
        Ok(())
    })
}

impl Archive for SqliteArchive {
    fn get(&self, key: &Key) -> Result<Option<Value>> {
        table_get(&self.pool, &self.runtime, &self.table, key)
    }

    fn put(&self, key: &Key, value: Value) -> Result<()> {
        table_put(&self.pool, &self.runtime, &self.table, key, value)
    }

    fn delete(&self, key: &Key) -> Result<()> {
        table_delete(&self.pool, &self.runtime, &self.table, key)
    }

    fn keys(&self) -> Result<Vec<Key>> {
        table_keys(&self.pool, &self.runtime, &self.table)
    }

    fn len(&self) -> Result<usize> {
        table_len(&self.pool, &self.runtime, &self.table)
    }

    fn clear(&self) -> Result<()> {
        table_clear(&self.pool, &self.runtime, &self.table)
    }
}

impl Archive for SqliteTableArchive {
    fn get(&self, key: &Key) -> Result<Option<Value>> {
        table_get(&self.pool, &self.runtime, &self.table, key)
    }

    fn put(&self, key: &Key, value: Value) -> Result<()> {
        table_put(&self.pool, &self.runtime, &self.table, key, value)
    }

    fn delete(&self, key: &Key) -> Result<()> {
        table_delete(&self.pool, &self.runtime, &self.table, key)
    }

    fn keys(&self) -> Result<Vec<Key>> {
        table_keys(&self.pool, &self.runtime, &self.table)
    }

    fn len(&self) -> Result<usize> {
        table_len(&self.pool, &self.runtime, &self.table)
    }

    fn clear(&self) -> Result<()> {
        table_clear(&self.pool, &self.runtime, &self.table)
    }
}
