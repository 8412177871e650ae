//! Read-only database layer for Pitwall.
//!
//! The analytics store is owned by the ETL; this crate only reads it. All
//! SQL issued by the resolution and interpretation pipeline goes through
//! [`PitwallDb`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use pitwall_db::{PitwallDb, Result};
//!
//! let db = PitwallDb::open_existing("~/.pitwall/pitwall.sqlite3").await?;
//! let rows = db.driver_name_rows().await?;
//! let seasons = db.driver_seasons("max_verstappen").await?;
//! ```

mod error;
mod schema;
mod types;

// Query implementations organized by table family
mod coverage;
mod reference;
mod season;

pub use error::{DbError, Result};
pub use types::*;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::info;

/// Handle to the analytics store.
#[derive(Clone)]
pub struct PitwallDb {
    pool: SqlitePool,
}

impl PitwallDb {
    /// Open or create a database at the given path.
    ///
    /// Creates the reference tables if they don't exist.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let url = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let db = Self { pool };
        db.ensure_schema(true).await?;

        info!(path = %path.display(), "Database opened");
        Ok(db)
    }

    /// Open an existing database read-only (fails if not exists).
    pub async fn open_existing(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(DbError::not_found(format!(
                "Database not found: {}",
                path.display()
            )));
        }

        let url = format!("sqlite:{}?mode=ro", path.display());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        info!(path = %path.display(), "Database opened read-only");
        Ok(Self { pool })
    }

    /// Open a private in-memory database with the reference schema (for fixtures).
    pub async fn open_in_memory() -> Result<Self> {
        // One connection that never expires: each new connection would see an empty database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let db = Self { pool };
        db.ensure_schema(false).await?;
        Ok(db)
    }

    /// Get the underlying connection pool (escape hatch for fixtures).
    ///
    /// Prefer using the typed methods instead.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection.
    pub async fn close(self) {
        self.pool.close().await;
    }
}
