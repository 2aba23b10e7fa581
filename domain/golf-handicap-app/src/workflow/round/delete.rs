use std::sync::Arc;

use futures::future::join_all;

use crate::{
    domain::{
        RepoRetrieveError, RoundId, UserId,
        round::{Round, RoundRepository},
    },
    workflow::{
        handicap::recompute::RecomputeHandicapWorkflow,
        round::{RoundError, discover_outing_rounds, distinct_players, load_owned_round},
    },
};

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteRoundOutcome {
    pub deleted_count: usize,
    pub deleted_round_ids: Vec<RoundId>,
}

#[async_trait::async_trait]
pub trait DeleteRoundUseCase {
    /// Deletes a round and, with `cascade`, the rounds of everyone else who
    /// played the same outing.
    async fn delete_round(
        &self,
        round_id: RoundId,
        requesting_user: UserId,
        cascade: bool,
    ) -> Result<DeleteRoundOutcome, RoundError>;
}

pub struct DeleteRoundUseCaseImpl<R: RoundRepository, H: RecomputeHandicapWorkflow> {
    round_repository: Arc<R>,
    recompute_handicap_workflow: Arc<H>,
}

impl<R: RoundRepository, H: RecomputeHandicapWorkflow> DeleteRoundUseCaseImpl<R, H> {
    pub fn new(round_repository: Arc<R>, recompute_handicap_workflow: Arc<H>) -> Self {
        Self {
            round_repository,
            recompute_handicap_workflow,
        }
    }

    async fn delete_siblings(&self, anchor: &Round) -> Vec<Round> {
        let candidates = distinct_players(&anchor.players, Some(anchor.user_id));
        let siblings: Vec<Round> =
            discover_outing_rounds(self.round_repository.as_ref(), anchor, &candidates)
                .await
                .into_iter()
                .filter(|r| r.id != anchor.id)
                .collect();

        let results = join_all(siblings.into_iter().map(|round| async move {
            let result = self.round_repository.delete_round(round.id).await;
            (round, result)
        }))
        .await;

        results
            .into_iter()
            .filter_map(|(round, result)| match result {
                Ok(()) => Some(round),
                Err(RepoRetrieveError::NotFound) => None,
                Err(RepoRetrieveError::StorageError(e)) => {
                    log::warn!(
                        "Skipping round {} of player {} while deleting group of round {}: {}",
                        round.id,
                        round.user_id,
                        anchor.id,
                        e
                    );
                    None
                }
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl<
    R: RoundRepository + Send + Sync + 'static,
    H: RecomputeHandicapWorkflow + Send + Sync + 'static,
> DeleteRoundUseCase for DeleteRoundUseCaseImpl<R, H>
{
    async fn delete_round(
        &self,
        round_id: RoundId,
        requesting_user: UserId,
        cascade: bool,
    ) -> Result<DeleteRoundOutcome, RoundError> {
        let anchor =
            load_owned_round(self.round_repository.as_ref(), round_id, requesting_user).await?;

        let mut deleted = Vec::new();
        match self.round_repository.delete_round(anchor.id).await {
            Ok(()) => deleted.push(anchor.clone()),
            Err(RepoRetrieveError::NotFound) => {}
            Err(RepoRetrieveError::StorageError(e)) => {
                log::error!("Failed to delete round {}: {}", anchor.id, e);
                return Err(RoundError::Storage(e));
            }
        }

        if cascade && anchor.is_group_round() {
            deleted.extend(self.delete_siblings(&anchor).await);
        }

        let mut owners: Vec<UserId> = deleted.iter().map(|r| r.user_id).collect();
        owners.push(anchor.user_id);
        self.recompute_handicap_workflow
            .recompute_handicaps(&owners)
            .await;

        log::info!(
            "Deleted {} round(s) starting from round {} for user {}",
            deleted.len(),
            anchor.id,
            requesting_user
        );
        Ok(DeleteRoundOutcome {
            deleted_count: deleted.len(),
            deleted_round_ids: deleted.into_iter().map(|r| r.id).collect(),
        })
    }
}
