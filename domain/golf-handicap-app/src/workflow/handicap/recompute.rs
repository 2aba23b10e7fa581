use std::{collections::HashSet, sync::Arc};

use futures::future::join_all;
use thiserror::Error;

use crate::domain::{
    Pagination, RepoUpdateError, UserId,
    handicap::HandicapService,
    round::{RoundQuery, RoundRepository},
    user::UserRepository,
};

/// Derives a user's handicap from their most recent rounds and stores it.
#[async_trait::async_trait]
pub trait RecomputeHandicapWorkflow {
    /// Fallible form, for explicit recalculation requests and scheduled jobs.
    async fn try_recompute_handicap(&self, user_id: UserId) -> Result<f64, HandicapUpdateError>;
    /// Never fails: errors are logged so the triggering round mutation stands.
    async fn recompute_handicap(&self, user_id: UserId);
    /// Recomputes every distinct user in parallel, never failing.
    async fn recompute_handicaps(&self, user_ids: &[UserId]);
}

#[derive(Debug, Error)]
pub enum HandicapUpdateError {
    #[error("failed to load rounds: {0}")]
    RoundQuery(String),
    #[error("user not found")]
    UserNotFound,
    #[error("failed to store handicap: {0}")]
    Storage(String),
}

pub struct RecomputeHandicapWorkflowImpl<R: RoundRepository, U: UserRepository, H: HandicapService>
{
    round_repository: Arc<R>,
    user_repository: Arc<U>,
    handicap_service: Arc<H>,
}

impl<R: RoundRepository, U: UserRepository, H: HandicapService>
    RecomputeHandicapWorkflowImpl<R, U, H>
{
    pub fn new(
        round_repository: Arc<R>,
        user_repository: Arc<U>,
        handicap_service: Arc<H>,
    ) -> Self {
        Self {
            round_repository,
            user_repository,
            handicap_service,
        }
    }
}

#[async_trait::async_trait]
impl<
    R: RoundRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    H: HandicapService + Send + Sync + 'static,
> RecomputeHandicapWorkflow for RecomputeHandicapWorkflowImpl<R, U, H>
{
    async fn try_recompute_handicap(&self, user_id: UserId) -> Result<f64, HandicapUpdateError> {
        let query = RoundQuery::for_user(user_id)
            .with_pagination(Pagination::first(self.handicap_service.window_size()));
        let recent_rounds = self
            .round_repository
            .query_rounds(query)
            .await
            .map_err(|e| HandicapUpdateError::RoundQuery(e.to_string()))?;

        let differentials: Vec<f64> = recent_rounds
            .items
            .iter()
            .map(|round| round.score_differential)
            .collect();
        let handicap = self.handicap_service.handicap_index(&differentials);

        match self
            .user_repository
            .update_handicap(user_id, handicap, chrono::Utc::now())
            .await
        {
            Ok(()) => {
                log::info!(
                    "Updated handicap for user {}: {:.1} (from {} rounds)",
                    user_id,
                    handicap,
                    differentials.len()
                );
                Ok(handicap)
            }
            Err(RepoUpdateError::NotFound) => Err(HandicapUpdateError::UserNotFound),
            Err(RepoUpdateError::StorageError(e)) => Err(HandicapUpdateError::Storage(e)),
        }
    }

    async fn recompute_handicap(&self, user_id: UserId) {
        if let Err(e) = self.try_recompute_handicap(user_id).await {
            log::error!("Failed to update handicap for user {}: {}", user_id, e);
        }
    }

    async fn recompute_handicaps(&self, user_ids: &[UserId]) {
        let mut seen = HashSet::new();
        let distinct: Vec<UserId> = user_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();
        join_all(distinct.into_iter().map(|id| self.recompute_handicap(id))).await;
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::{
        domain::{handicap::HandicapServiceImpl, user::User},
        testing::{FakeRoundRepository, FakeUserRepository, round_with_differential},
    };

    use super::*;

    fn workflow(
        rounds: Arc<FakeRoundRepository>,
        users: Arc<FakeUserRepository>,
    ) -> RecomputeHandicapWorkflowImpl<FakeRoundRepository, FakeUserRepository, HandicapServiceImpl>
    {
        RecomputeHandicapWorkflowImpl::new(rounds, users, Arc::new(HandicapServiceImpl::new()))
    }

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + chrono::Days::new(n as u64)
    }

    #[tokio::test]
    async fn test_no_rounds_resets_to_max() {
        let rounds = Arc::new(FakeRoundRepository::new());
        let users = Arc::new(FakeUserRepository::new());
        let user_id = UserId::new();
        let mut user = User::new(user_id, "Ada");
        user.handicap = 12.3;
        users.insert(user);

        let handicap = workflow(rounds, users.clone())
            .try_recompute_handicap(user_id)
            .await
            .unwrap();
        assert_eq!(handicap, 54.0);
        let stored = users.user(user_id).unwrap();
        assert_eq!(stored.handicap, 54.0);
        assert!(stored.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_only_twenty_most_recent_rounds_count() {
        let rounds = Arc::new(FakeRoundRepository::new());
        let users = Arc::new(FakeUserRepository::new());
        let user_id = UserId::new();
        users.insert(User::new(user_id, "Ada"));

        // Five old excellent rounds fall outside the window.
        for n in 0..5 {
            rounds.insert(round_with_differential(user_id, day(n), -10.0));
        }
        for n in 5..25 {
            rounds.insert(round_with_differential(user_id, day(n), 10.0 + n as f64));
        }

        let handicap = workflow(rounds, users)
            .try_recompute_handicap(user_id)
            .await
            .unwrap();
        // Best 8 of differentials 15..=34.
        assert_eq!(handicap, 18.5);
    }

    #[tokio::test]
    async fn test_recompute_is_idempotent() {
        let rounds = Arc::new(FakeRoundRepository::new());
        let users = Arc::new(FakeUserRepository::new());
        let user_id = UserId::new();
        users.insert(User::new(user_id, "Ada"));
        for (n, diff) in [14.2, 9.8, 21.0, 11.2].into_iter().enumerate() {
            rounds.insert(round_with_differential(user_id, day(n as u32), diff));
        }

        let workflow = workflow(rounds, users.clone());
        let first = workflow.try_recompute_handicap(user_id).await.unwrap();
        let second = workflow.try_recompute_handicap(user_id).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first, 10.5);
        assert_eq!(users.user(user_id).unwrap().handicap, 10.5);
    }

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let rounds = Arc::new(FakeRoundRepository::new());
        let users = Arc::new(FakeUserRepository::new());
        let user_id = UserId::new();
        users.insert(User::new(user_id, "Ada"));
        rounds.fail_queries(true);

        let workflow = workflow(rounds.clone(), users.clone());
        assert!(matches!(
            workflow.try_recompute_handicap(user_id).await,
            Err(HandicapUpdateError::RoundQuery(_))
        ));
        workflow.recompute_handicap(user_id).await;
        assert_eq!(users.user(user_id).unwrap().updated_at, None);

        rounds.fail_queries(false);
        assert!(matches!(
            workflow.try_recompute_handicap(UserId::new()).await,
            Err(HandicapUpdateError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_recompute_many_deduplicates() {
        let rounds = Arc::new(FakeRoundRepository::new());
        let users = Arc::new(FakeUserRepository::new());
        let a = UserId::new();
        let b = UserId::new();
        users.insert(User::new(a, "A"));
        users.insert(User::new(b, "B"));
        rounds.insert(round_with_differential(a, day(1), 7.0));
        rounds.insert(round_with_differential(b, day(1), 9.0));

        workflow(rounds, users.clone())
            .recompute_handicaps(&[a, b, a])
            .await;
        assert_eq!(users.user(a).unwrap().handicap, 7.0);
        assert_eq!(users.user(b).unwrap().handicap, 9.0);
        assert_eq!(users.handicap_updates(), 2);
    }
}
