use chrono::{DateTime, Utc};
use golf_handicap_app::domain::{
    PaginatedResponse, RepoCreateError, RepoError, RepoRetrieveError, RepoUpdateError, SortOrder,
    UserId,
    user::{User, UserQuery, UserRepository, UserSortBy},
};
use sqlx::{Pool, Row, Sqlite, sqlite::SqliteRow};

use crate::{sql_window, timestamp_from_text, timestamp_to_text, uuid_from_text};

pub struct SqliteUserRepository {
    pool: Pool<Sqlite>,
}

impl SqliteUserRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    fn user_from_row(row: &SqliteRow) -> Result<User, String> {
        let id: String = row.try_get("id").map_err(|e| e.to_string())?;
        let updated_at: Option<String> = row.try_get("updated_at").map_err(|e| e.to_string())?;
        Ok(User {
            id: UserId(uuid_from_text(&id)?),
            display_name: row.try_get("display_name").map_err(|e| e.to_string())?,
            handicap: row.try_get("handicap").map_err(|e| e.to_string())?,
            updated_at: updated_at.as_deref().map(timestamp_from_text).transpose()?,
        })
    }

    pub async fn create_user(&self, user: &User) -> Result<(), RepoCreateError> {
        sqlx::query("INSERT INTO users (id, display_name, handicap, updated_at) VALUES (?, ?, ?, ?)")
            .bind(user.id.to_string())
            .bind(&user.display_name)
            .bind(user.handicap)
            .bind(user.updated_at.as_ref().map(timestamp_to_text))
            .execute(&self.pool)
            .await
            .map_err(|e| match e.as_database_error() {
                Some(db_error) if db_error.is_unique_violation() => RepoCreateError::Conflict,
                _ => RepoCreateError::StorageError(e.to_string()),
            })?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl UserRepository for SqliteUserRepository {
    async fn get_user(&self, user_id: UserId) -> Result<User, RepoRetrieveError> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoRetrieveError::StorageError(e.to_string()))?
            .ok_or(RepoRetrieveError::NotFound)?;
        Self::user_from_row(&row).map_err(RepoRetrieveError::StorageError)
    }

    async fn update_handicap(
        &self,
        user_id: UserId,
        handicap: f64,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepoUpdateError> {
        let result = sqlx::query("UPDATE users SET handicap = ?, updated_at = ? WHERE id = ?")
            .bind(handicap)
            .bind(timestamp_to_text(&updated_at))
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| RepoUpdateError::StorageError(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(RepoUpdateError::NotFound);
        }
        Ok(())
    }

    async fn query_users(&self, query: UserQuery) -> Result<PaginatedResponse<User>, RepoError> {
        let (limit, offset) = sql_window(&query.pagination)?;
        let total_count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepoError::StorageError(e.to_string()))?;

        let order_by = match query.sort {
            Some((order, sort_by)) => {
                let column = match sort_by {
                    UserSortBy::Handicap => "handicap",
                    UserSortBy::DisplayName => "display_name",
                };
                let direction = match order {
                    SortOrder::Ascending => "ASC",
                    SortOrder::Descending => "DESC",
                };
                format!("{} {}, id ASC", column, direction)
            }
            None => "id ASC".to_string(),
        };
        let rows = sqlx::query(&format!(
            "SELECT * FROM users ORDER BY {} LIMIT ? OFFSET ?",
            order_by
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::StorageError(e.to_string()))?;

        let items = rows
            .iter()
            .map(Self::user_from_row)
            .collect::<Result<Vec<User>, String>>()
            .map_err(RepoError::StorageError)?;
        Ok(PaginatedResponse {
            items,
            total_count: total_count as usize,
        })
    }
}
