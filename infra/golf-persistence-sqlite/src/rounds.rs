use std::str::FromStr;

use chrono::NaiveDate;
use golf_core::{HoleCount, HoleResult, Tee};
use golf_handicap_app::domain::{
    CourseId, PaginatedResponse, RepoCreateError, RepoError, RepoRetrieveError, RepoUpdateError,
    RoundGroupId, RoundId, UserId,
    round::{Round, RoundQuery, RoundRepository, RoundUpdate},
};
use sqlx::{Pool, Row, Sqlite, sqlite::SqliteRow};

use crate::{sql_window, timestamp_from_text, timestamp_to_text, uuid_from_text};

pub struct SqliteRoundRepository {
    pool: Pool<Sqlite>,
}

impl SqliteRoundRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    fn round_from_row(row: &SqliteRow) -> Result<Round, String> {
        fn column<'r, T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>>(
            row: &'r SqliteRow,
            name: &str,
        ) -> Result<T, String> {
            row.try_get(name)
                .map_err(|e| format!("column {}: {}", name, e))
        }

        let holes: Vec<HoleResult> = serde_json::from_str(&column::<String>(row, "holes")?)
            .map_err(|e| format!("invalid holes: {}", e))?;
        let players: Vec<UserId> = serde_json::from_str(&column::<String>(row, "players")?)
            .map_err(|e| format!("invalid players: {}", e))?;
        let hole_count = u8::try_from(column::<i64>(row, "hole_count")?)
            .map_err(|e| e.to_string())
            .and_then(|n| HoleCount::try_from(n).map_err(|e| e.to_string()))?;
        let date = column::<String>(row, "date")?;
        let group_id: Option<String> = column(row, "group_id")?;

        Ok(Round {
            id: RoundId(uuid_from_text(&column::<String>(row, "id")?)?),
            user_id: UserId(uuid_from_text(&column::<String>(row, "user_id")?)?),
            course_id: CourseId(uuid_from_text(&column::<String>(row, "course_id")?)?),
            course_name: column(row, "course_name")?,
            tee: Tee::from_str(&column::<String>(row, "tee")?).map_err(|e| e.to_string())?,
            hole_count,
            date: NaiveDate::from_str(&date).map_err(|e| format!("invalid date '{}': {}", date, e))?,
            holes,
            total_score: u32::try_from(column::<i64>(row, "total_score")?)
                .map_err(|e| e.to_string())?,
            total_par: u32::try_from(column::<i64>(row, "total_par")?)
                .map_err(|e| e.to_string())?,
            score_differential: column(row, "score_differential")?,
            players,
            group_id: group_id
                .as_deref()
                .map(uuid_from_text)
                .transpose()?
                .map(RoundGroupId),
            created_at: timestamp_from_text(&column::<String>(row, "created_at")?)?,
            updated_at: timestamp_from_text(&column::<String>(row, "updated_at")?)?,
        })
    }

    fn filter_clause(query: &RoundQuery) -> String {
        let mut clause = "WHERE user_id = ?".to_string();
        if query.date.is_some() {
            clause.push_str(" AND date = ?");
        }
        if query.course_id.is_some() {
            clause.push_str(" AND course_id = ?");
        }
        clause
    }

    fn bind_filter<'q>(
        mut sql: sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
        query: &RoundQuery,
    ) -> sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
        sql = sql.bind(query.user_id.to_string());
        if let Some(date) = query.date {
            sql = sql.bind(date.to_string());
        }
        if let Some(course_id) = query.course_id {
            sql = sql.bind(course_id.to_string());
        }
        sql
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| e.to_string())
}

#[async_trait::async_trait]
impl RoundRepository for SqliteRoundRepository {
    async fn get_round(&self, round_id: RoundId) -> Result<Round, RepoRetrieveError> {
        let row = sqlx::query("SELECT * FROM rounds WHERE id = ?")
            .bind(round_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoRetrieveError::StorageError(e.to_string()))?
            .ok_or(RepoRetrieveError::NotFound)?;
        Self::round_from_row(&row).map_err(RepoRetrieveError::StorageError)
    }

    async fn create_round(&self, round: &Round) -> Result<(), RepoCreateError> {
        let holes = to_json(&round.holes).map_err(RepoCreateError::StorageError)?;
        let players = to_json(&round.players).map_err(RepoCreateError::StorageError)?;

        let fields = [
            "id",
            "user_id",
            "course_id",
            "course_name",
            "tee",
            "hole_count",
            "date",
            "holes",
            "total_score",
            "total_par",
            "score_differential",
            "players",
            "group_id",
            "created_at",
            "updated_at",
        ];
        sqlx::query(&format!(
            "INSERT INTO rounds ({}) VALUES ({})",
            fields.join(", "),
            fields.iter().map(|_| "?").collect::<Vec<_>>().join(", ")
        ))
        .bind(round.id.to_string())
        .bind(round.user_id.to_string())
        .bind(round.course_id.to_string())
        .bind(&round.course_name)
        .bind(round.tee.as_str())
        .bind(u8::from(round.hole_count) as i64)
        .bind(round.date.to_string())
        .bind(holes)
        .bind(round.total_score as i64)
        .bind(round.total_par as i64)
        .bind(round.score_differential)
        .bind(players)
        .bind(round.group_id.map(|g| g.to_string()))
        .bind(timestamp_to_text(&round.created_at))
        .bind(timestamp_to_text(&round.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db_error) if db_error.is_unique_violation() => RepoCreateError::Conflict,
            _ => RepoCreateError::StorageError(e.to_string()),
        })?;
        Ok(())
    }

    async fn update_round(
        &self,
        round_id: RoundId,
        update: RoundUpdate,
    ) -> Result<Round, RepoUpdateError> {
        let holes = to_json(&update.holes).map_err(RepoUpdateError::StorageError)?;
        let players = to_json(&update.players).map_err(RepoUpdateError::StorageError)?;

        let result = sqlx::query(
            "UPDATE rounds SET holes = ?, total_score = ?, total_par = ?, score_differential = ?, \
             players = ?, group_id = ?, updated_at = ? WHERE id = ?",
        )
        .bind(holes)
        .bind(update.total_score as i64)
        .bind(update.total_par as i64)
        .bind(update.score_differential)
        .bind(players)
        .bind(update.group_id.map(|g| g.to_string()))
        .bind(timestamp_to_text(&update.updated_at))
        .bind(round_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoUpdateError::StorageError(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(RepoUpdateError::NotFound);
        }

        self.get_round(round_id).await.map_err(|e| match e {
            RepoRetrieveError::NotFound => RepoUpdateError::NotFound,
            RepoRetrieveError::StorageError(e) => RepoUpdateError::StorageError(e),
        })
    }

    async fn delete_round(&self, round_id: RoundId) -> Result<(), RepoRetrieveError> {
        let result = sqlx::query("DELETE FROM rounds WHERE id = ?")
            .bind(round_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| RepoRetrieveError::StorageError(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(RepoRetrieveError::NotFound);
        }
        Ok(())
    }

    async fn query_rounds(
        &self,
        query: RoundQuery,
    ) -> Result<PaginatedResponse<Round>, RepoError> {
        let (limit, offset) = sql_window(&query.pagination)?;
        let filter = Self::filter_clause(&query);

        let count_sql = format!("SELECT COUNT(*) FROM rounds {}", filter);
        let total_count: i64 = Self::bind_filter(sqlx::query(&count_sql), &query)
            .fetch_one(&self.pool)
            .await
            .and_then(|row| row.try_get(0))
            .map_err(|e| RepoError::StorageError(e.to_string()))?;

        let select_sql = format!(
            "SELECT * FROM rounds {} ORDER BY date DESC, created_at DESC LIMIT ? OFFSET ?",
            filter
        );
        let rows = Self::bind_filter(sqlx::query(&select_sql), &query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::StorageError(e.to_string()))?;

        let items = rows
            .iter()
            .map(Self::round_from_row)
            .collect::<Result<Vec<Round>, String>>()
            .map_err(RepoError::StorageError)?;
        Ok(PaginatedResponse {
            items,
            total_count: total_count as usize,
        })
    }

    async fn count_rounds(&self, user_id: UserId) -> Result<usize, RepoError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM rounds WHERE user_id = ?")
            .bind(user_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map(|count| count as usize)
            .map_err(|e| RepoError::StorageError(e.to_string()))
    }
}
