use std::{sync::Arc, time::Duration};

use tokio::time::MissedTickBehavior;

use crate::{
    domain::{
        Pagination, UserId,
        user::{UserQuery, UserRepository},
    },
    workflow::handicap::recompute::RecomputeHandicapWorkflow,
};

const USER_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub updated: usize,
    pub failed: Vec<UserId>,
}

/// Periodically recomputes every user's handicap, repairing values left stale
/// by swallowed update failures.
pub struct HandicapReconcileJob<U: UserRepository, H: RecomputeHandicapWorkflow> {
    user_repository: Arc<U>,
    recompute_handicap_workflow: Arc<H>,
    interval: Duration,
}

impl<
    U: UserRepository + Send + Sync + 'static,
    H: RecomputeHandicapWorkflow + Send + Sync + 'static,
> HandicapReconcileJob<U, H>
{
    pub fn new(
        user_repository: Arc<U>,
        recompute_handicap_workflow: Arc<H>,
        interval: Duration,
    ) -> Self {
        Self {
            user_repository,
            recompute_handicap_workflow,
            interval,
        }
    }

    pub async fn run(&self) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let summary = self.reconcile_all().await;
            if summary.failed.is_empty() {
                log::info!("Reconciled handicaps of {} users", summary.updated);
            } else {
                log::warn!(
                    "Reconciled handicaps of {} users, {} failed",
                    summary.updated,
                    summary.failed.len()
                );
            }
        }
    }

    pub async fn reconcile_all(&self) -> ReconcileSummary {
        let mut summary = ReconcileSummary::default();
        let mut offset = 0;
        loop {
            let query = UserQuery {
                pagination: Pagination {
                    offset: Some(offset),
                    limit: Some(USER_PAGE_SIZE),
                },
                sort: None,
            };
            let page = match self.user_repository.query_users(query).await {
                Ok(page) => page,
                Err(e) => {
                    log::error!("Failed to list users for handicap reconcile: {}", e);
                    return summary;
                }
            };
            let fetched = page.items.len();
            for user in page.items {
                match self
                    .recompute_handicap_workflow
                    .try_recompute_handicap(user.id)
                    .await
                {
                    Ok(_) => summary.updated += 1,
                    Err(e) => {
                        log::error!("Failed to reconcile handicap of user {}: {}", user.id, e);
                        summary.failed.push(user.id);
                    }
                }
            }
            offset += fetched;
            if fetched == 0 || offset >= page.total_count {
                return summary;
            }
        }
    }
}
