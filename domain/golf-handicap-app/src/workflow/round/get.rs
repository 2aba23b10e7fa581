use std::sync::Arc;

use crate::{
    domain::{
        RoundId, UserId,
        round::{Round, RoundRepository},
    },
    workflow::round::{RoundError, load_owned_round},
};

#[async_trait::async_trait]
pub trait GetRoundUseCase {
    async fn get_round(&self, round_id: RoundId, requesting_user: UserId)
    -> Result<Round, RoundError>;
}

pub struct GetRoundUseCaseImpl<R: RoundRepository> {
    round_repository: Arc<R>,
}

impl<R: RoundRepository> GetRoundUseCaseImpl<R> {
    pub fn new(round_repository: Arc<R>) -> Self {
        Self { round_repository }
    }
}

#[async_trait::async_trait]
impl<R: RoundRepository + Send + Sync + 'static> GetRoundUseCase for GetRoundUseCaseImpl<R> {
    async fn get_round(
        &self,
        round_id: RoundId,
        requesting_user: UserId,
    ) -> Result<Round, RoundError> {
        load_owned_round(self.round_repository.as_ref(), round_id, requesting_user).await
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::{Fixture, round_with_differential};

    use super::*;

    #[tokio::test]
    async fn test_get_round_checks_owner() {
        let f = Fixture::new();
        let a = f.add_user("Ann");
        let b = f.add_user("Bob");
        let round = round_with_differential(a, f.date(), 7.5);
        f.rounds.insert(round.clone());
        let use_case = GetRoundUseCaseImpl::new(f.rounds.clone());

        assert_eq!(use_case.get_round(round.id, a).await.unwrap(), round);
        assert!(matches!(
            use_case.get_round(round.id, b).await,
            Err(RoundError::Forbidden(_))
        ));
        assert!(matches!(
            use_case.get_round(RoundId::new(), a).await,
            Err(RoundError::NotFound(_))
        ));
    }
}
