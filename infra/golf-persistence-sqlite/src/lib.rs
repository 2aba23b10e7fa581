use std::{str::FromStr, time::Duration};

use chrono::{DateTime, SecondsFormat, Utc};
use golf_handicap_app::domain::{Pagination, RepoError};
use sqlx::{
    Pool, Sqlite,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

pub mod courses;
pub mod rounds;
pub mod users;

const SCHEMA: [&str; 5] = [
    "CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY NOT NULL,
        display_name TEXT NOT NULL,
        handicap REAL NOT NULL,
        updated_at TEXT
    )",
    "CREATE TABLE IF NOT EXISTS courses (
        id TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS course_tees (
        course_id TEXT NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
        tee TEXT NOT NULL,
        rating REAL NOT NULL,
        slope REAL NOT NULL,
        PRIMARY KEY (course_id, tee)
    )",
    "CREATE TABLE IF NOT EXISTS rounds (
        id TEXT PRIMARY KEY NOT NULL,
        user_id TEXT NOT NULL,
        course_id TEXT NOT NULL,
        course_name TEXT NOT NULL,
        tee TEXT NOT NULL,
        hole_count INTEGER NOT NULL,
        date TEXT NOT NULL,
        holes TEXT NOT NULL,
        total_score INTEGER NOT NULL,
        total_par INTEGER NOT NULL,
        score_differential REAL NOT NULL,
        players TEXT NOT NULL,
        group_id TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS rounds_user_date ON rounds (user_id, date DESC, created_at DESC)",
];

/// Opens the database at `database_url`, creating the file if needed.
///
/// An in-memory database only lives as long as its connection, so such a
/// pool holds exactly one connection that is never recycled.
pub async fn create_db_pool(database_url: &str) -> Result<Pool<Sqlite>, sqlx::Error> {
    let connect_options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool_options = if database_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };
    pool_options.connect_with(connect_options).await
}

pub async fn migrate(pool: &Pool<Sqlite>) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

/// Timestamps are stored as fixed width RFC 3339 text so that they sort
/// chronologically as strings.
pub(crate) fn timestamp_to_text(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn timestamp_from_text(text: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid timestamp '{}': {}", text, e))
}

pub(crate) fn uuid_from_text(text: &str) -> Result<uuid::Uuid, String> {
    uuid::Uuid::parse_str(text).map_err(|e| format!("invalid id '{}': {}", text, e))
}

/// `LIMIT` and `OFFSET` binds for a page. A missing limit becomes `-1`,
/// which sqlite reads as unlimited.
pub(crate) fn sql_window(pagination: &Pagination) -> Result<(i64, i64), RepoError> {
    let limit = match pagination.limit {
        Some(limit) => i64::try_from(limit)
            .map_err(|_| RepoError::StorageError(format!("limit {} out of range", limit)))?,
        None => -1,
    };
    let offset = pagination.offset.unwrap_or(0);
    let offset = i64::try_from(offset)
        .map_err(|_| RepoError::StorageError(format!("offset {} out of range", offset)))?;
    Ok((limit, offset))
}

#[cfg(test)]
pub(crate) async fn test_pool() -> Pool<Sqlite> {
    let pool = create_db_pool("sqlite::memory:").await.unwrap();
    migrate(&pool).await.unwrap();
    pool
}
