use std::{collections::HashMap, str::FromStr, time::Duration};

use golf_core::Tee;
use golf_handicap_app::{
    domain::{CourseId, RepoCreateError},
    ports::course_lookup::{Course, CourseLookupError, CourseLookupPort},
};
use sqlx::{Pool, Row, Sqlite};

/// Course ratings rarely change, so lookups are served from a cache that
/// expires entries after a fixed time.
pub struct SqliteCourseLookup {
    pool: Pool<Sqlite>,
    course_cache: moka::future::Cache<CourseId, Course>,
}

impl SqliteCourseLookup {
    pub fn new(pool: Pool<Sqlite>, cache_ttl: Duration) -> Self {
        let course_cache = moka::future::Cache::builder()
            .max_capacity(1_000)
            .time_to_live(cache_ttl)
            .build();
        Self { pool, course_cache }
    }

    pub async fn create_course(&self, course: &Course) -> Result<(), RepoCreateError> {
        let storage_error = |e: sqlx::Error| RepoCreateError::StorageError(e.to_string());
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        sqlx::query("INSERT INTO courses (id, name) VALUES (?, ?)")
            .bind(course.id.to_string())
            .bind(&course.name)
            .execute(&mut *tx)
            .await
            .map_err(|e| match e.as_database_error() {
                Some(db_error) if db_error.is_unique_violation() => RepoCreateError::Conflict,
                _ => RepoCreateError::StorageError(e.to_string()),
            })?;

        for tee in Tee::ALL {
            let (Some(rating), Some(slope)) = (course.rating.get(&tee), course.slope.get(&tee))
            else {
                continue;
            };
            sqlx::query("INSERT INTO course_tees (course_id, tee, rating, slope) VALUES (?, ?, ?, ?)")
                .bind(course.id.to_string())
                .bind(tee.as_str())
                .bind(*rating)
                .bind(*slope)
                .execute(&mut *tx)
                .await
                .map_err(storage_error)?;
        }

        tx.commit().await.map_err(storage_error)?;
        self.course_cache.invalidate(&course.id).await;
        log::info!("Created course {} ({})", course.name, course.id);
        Ok(())
    }

    async fn load_course(&self, course_id: CourseId) -> Result<Course, CourseLookupError> {
        let unavailable = |e: sqlx::Error| CourseLookupError::Unavailable(e.to_string());

        let name: String = sqlx::query_scalar("SELECT name FROM courses WHERE id = ?")
            .bind(course_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?
            .ok_or(CourseLookupError::NotFound)?;

        let rows = sqlx::query("SELECT tee, rating, slope FROM course_tees WHERE course_id = ?")
            .bind(course_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(unavailable)?;

        let mut rating: HashMap<Tee, f64> = HashMap::new();
        let mut slope: HashMap<Tee, f64> = HashMap::new();
        for row in rows {
            let tee_name: String = row.try_get("tee").map_err(unavailable)?;
            let Ok(tee) = Tee::from_str(&tee_name) else {
                log::warn!("Ignoring unknown tee '{}' of course {}", tee_name, course_id);
                continue;
            };
            rating.insert(tee, row.try_get("rating").map_err(unavailable)?);
            slope.insert(tee, row.try_get("slope").map_err(unavailable)?);
        }

        Ok(Course {
            id: course_id,
            name,
            rating,
            slope,
        })
    }
}

#[async_trait::async_trait]
impl CourseLookupPort for SqliteCourseLookup {
    async fn get_course(&self, course_id: CourseId) -> Result<Course, CourseLookupError> {
        if let Some(cached) = self.course_cache.get(&course_id).await {
            return Ok(cached);
        }
        let course = self.load_course(course_id).await?;
        self.course_cache.insert(course_id, course.clone()).await;
        Ok(course)
    }
}
