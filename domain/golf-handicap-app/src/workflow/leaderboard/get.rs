use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use thiserror::Error;

use crate::domain::{
    Pagination, SortOrder, UserId,
    round::RoundRepository,
    user::{UserQuery, UserRepository, UserSortBy},
};

pub const DEFAULT_LEADERBOARD_SIZE: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub user_id: UserId,
    pub display_name: String,
    pub handicap: f64,
    pub rounds_played: usize,
}

#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error("limit must be at least 1")]
    InvalidLimit,
    #[error("storage error: {0}")]
    Storage(String),
}

/// Users ordered by handicap, lowest first.
#[async_trait::async_trait]
pub trait GetLeaderboardUseCase {
    async fn get_leaderboard(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<LeaderboardEntry>, LeaderboardError>;
}

pub struct GetLeaderboardUseCaseImpl<U: UserRepository, R: RoundRepository> {
    user_repository: Arc<U>,
    round_repository: Arc<R>,
}

impl<U: UserRepository, R: RoundRepository> GetLeaderboardUseCaseImpl<U, R> {
    pub fn new(user_repository: Arc<U>, round_repository: Arc<R>) -> Self {
        Self {
            user_repository,
            round_repository,
        }
    }
}

#[async_trait::async_trait]
impl<U: UserRepository + Send + Sync + 'static, R: RoundRepository + Send + Sync + 'static>
    GetLeaderboardUseCase for GetLeaderboardUseCaseImpl<U, R>
{
    async fn get_leaderboard(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let limit = limit.unwrap_or(DEFAULT_LEADERBOARD_SIZE);
        if limit == 0 {
            return Err(LeaderboardError::InvalidLimit);
        }
        let query = UserQuery {
            pagination: Pagination::first(limit),
            sort: Some((SortOrder::Ascending, UserSortBy::Handicap)),
        };
        let users = self
            .user_repository
            .query_users(query)
            .await
            .map_err(|e| {
                log::error!("Error querying users for leaderboard: {}", e);
                LeaderboardError::Storage(e.to_string())
            })?
            .items;

        let counts = join_all(
            users
                .iter()
                .map(|user| self.round_repository.count_rounds(user.id)),
        )
        .await;

        users
            .into_iter()
            .zip(counts)
            .map(|(user, count)| -> Result<LeaderboardEntry, LeaderboardError> {
                let rounds_played = count.map_err(|e| {
                    log::error!("Error counting rounds of user {}: {}", user.id, e);
                    LeaderboardError::Storage(e.to_string())
                })?;
                Ok(LeaderboardEntry {
                    user_id: user.id,
                    display_name: user.display_name,
                    handicap: user.handicap,
                    rounds_played,
                })
            })
            .collect()
    }
}
