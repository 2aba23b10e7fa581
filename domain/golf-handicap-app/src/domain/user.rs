use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    PaginatedResponse, Pagination, RepoError, RepoRetrieveError, RepoUpdateError, SortOrder,
    UserId, handicap::MAX_HANDICAP_INDEX,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub display_name: String,
    pub handicap: f64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            handicap: MAX_HANDICAP_INDEX,
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum UserSortBy {
    Handicap,
    DisplayName,
}

#[derive(Debug, Clone, Default)]
pub struct UserQuery {
    pub pagination: Pagination,
    pub sort: Option<(SortOrder, UserSortBy)>,
}

#[async_trait::async_trait]
pub trait UserRepository {
    async fn get_user(&self, user_id: UserId) -> Result<User, RepoRetrieveError>;
    async fn update_handicap(
        &self,
        user_id: UserId,
        handicap: f64,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepoUpdateError>;
    async fn query_users(&self, query: UserQuery) -> Result<PaginatedResponse<User>, RepoError>;
}
