use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::domain::{
    Pagination, UserId,
    handicap::HandicapService,
    round::{RoundQuery, RoundRepository},
    user::{User, UserQuery, UserRepository},
};

/// Stored and recomputed handicaps closer than this are considered equal.
pub const DRIFT_TOLERANCE: f64 = 0.1;

const USER_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandicapAuditEntry {
    pub user_id: UserId,
    pub display_name: String,
    pub stored_handicap: f64,
    pub computed_handicap: f64,
    pub total_rounds: usize,
    /// Rounds inside the window, newest first.
    pub rounds_considered: usize,
    /// The best differentials that make up the index, ascending.
    pub counted_differentials: Vec<f64>,
}

impl HandicapAuditEntry {
    pub fn drift(&self) -> f64 {
        (self.computed_handicap - self.stored_handicap).abs()
    }

    pub fn is_consistent(&self) -> bool {
        self.drift() < DRIFT_TOLERANCE
    }
}

#[derive(Debug, Error)]
pub enum HandicapAuditError {
    #[error("failed to load users: {0}")]
    Users(String),
    #[error("failed to load rounds of user {0}: {1}")]
    Rounds(UserId, String),
}

/// Compares every user's stored handicap with the value their recent rounds
/// produce. Nothing is written.
#[async_trait::async_trait]
pub trait AuditHandicapsUseCase {
    async fn audit_handicaps(&self) -> Result<Vec<HandicapAuditEntry>, HandicapAuditError>;
}

pub struct AuditHandicapsUseCaseImpl<R: RoundRepository, U: UserRepository, H: HandicapService> {
    round_repository: Arc<R>,
    user_repository: Arc<U>,
    handicap_service: Arc<H>,
}

impl<R: RoundRepository, U: UserRepository, H: HandicapService> AuditHandicapsUseCaseImpl<R, U, H> {
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

    async fn audit_user(&self, user: User) -> Result<HandicapAuditEntry, HandicapAuditError> {
        let query = RoundQuery::for_user(user.id)
            .with_pagination(Pagination::first(self.handicap_service.window_size()));
        let recent = self
            .round_repository
            .query_rounds(query)
            .await
            .map_err(|e| HandicapAuditError::Rounds(user.id, e.to_string()))?;

        let mut differentials: Vec<f64> =
            recent.items.iter().map(|r| r.score_differential).collect();
        let computed_handicap = self.handicap_service.handicap_index(&differentials);
        differentials.sort_by(f64::total_cmp);
        differentials.truncate(
            self.handicap_service
                .differentials_counted(recent.items.len()),
        );

        Ok(HandicapAuditEntry {
            user_id: user.id,
            display_name: user.display_name,
            stored_handicap: user.handicap,
            computed_handicap,
            total_rounds: recent.total_count,
            rounds_considered: recent.items.len(),
            counted_differentials: differentials,
        })
    }
}

#[async_trait::async_trait]
impl<
    R: RoundRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    H: HandicapService + Send + Sync + 'static,
> AuditHandicapsUseCase for AuditHandicapsUseCaseImpl<R, U, H>
{
    async fn audit_handicaps(&self) -> Result<Vec<HandicapAuditEntry>, HandicapAuditError> {
        let mut entries = Vec::new();
        let mut offset = 0;
        loop {
            let page = self
                .user_repository
                .query_users(UserQuery {
                    pagination: Pagination {
                        offset: Some(offset),
                        limit: Some(USER_PAGE_SIZE),
                    },
                    sort: None,
                })
                .await
                .map_err(|e| HandicapAuditError::Users(e.to_string()))?;
            let fetched = page.items.len();
            for user in page.items {
                entries.push(self.audit_user(user).await?);
            }
            offset += fetched;
            if fetched == 0 || offset >= page.total_count {
                break;
            }
        }

        let drifted = entries.iter().filter(|e| !e.is_consistent()).count();
        if drifted > 0 {
            log::warn!(
                "Handicap audit found {} of {} users with a drifted handicap",
                drifted,
                entries.len()
            );
        } else {
            log::info!("Handicap audit: all {} handicaps consistent", entries.len());
        }
        Ok(entries)
    }
}
