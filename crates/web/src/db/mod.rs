//! Database operations for Cellarbook's SQLite store.
//!
//! ## Tables
//!
//! - `users` - Accounts (unique username and email, argon2 password hash)
//! - `products` - Inventory records, each owned by one user
//! - `tower_sessions` - Session storage (managed by `tower-sessions-sqlx-store`)
//!
//! The schema is created on startup by [`init_schema`] when absent; there is
//! no separate migration step.

pub mod products;
pub mod users;

use std::str::FromStr;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use thiserror::Error;
use tower_sessions_sqlx_store::SqliteStore;

pub use products::ProductRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

const CREATE_USERS: &str = r"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
";

const CREATE_PRODUCTS: &str = r"
    CREATE TABLE IF NOT EXISTS products (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        category TEXT NOT NULL,
        kind TEXT NOT NULL,
        volume REAL NOT NULL,
        strength REAL NOT NULL,
        quantity INTEGER NOT NULL,
        price TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE
    )
";

const CREATE_PRODUCTS_USER_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_products_user_id ON products (user_id)";

/// Create a SQLite connection pool.
///
/// The database file is created if missing and foreign keys are enforced.
/// In-memory databases live only as long as their connection, so for
/// those the pool is pinned to a single connection that never expires.
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is invalid or the connection fails.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<SqlitePool, sqlx::Error> {
    let url = database_url.expose_secret();
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool_options = if is_in_memory(url) {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
    } else {
        SqlitePoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(10))
    };

    pool_options.connect_with(options).await
}

/// Create the application tables and the session table if they are absent.
///
/// Safe to run on every startup.
///
/// # Errors
///
/// Returns `sqlx::Error` if any DDL statement fails.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in [CREATE_USERS, CREATE_PRODUCTS, CREATE_PRODUCTS_USER_INDEX] {
        sqlx::query(statement).execute(pool).await?;
    }

    SqliteStore::new(pool.clone()).migrate().await?;

    tracing::debug!("database schema ready");
    Ok(())
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Map a unique-constraint violation on `table.column` to `Conflict(column)`.
///
/// SQLite reports the offending column as `UNIQUE constraint failed: users.email`.
fn map_unique_violation(err: sqlx::Error, table: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        let prefix = format!("{table}.");
        let column = db_err
            .message()
            .rsplit(' ')
            .next()
            .and_then(|qualified| qualified.strip_prefix(&prefix))
            .unwrap_or("unknown")
            .to_owned();
        return RepositoryError::Conflict(column);
    }
    RepositoryError::Database(err)
}
