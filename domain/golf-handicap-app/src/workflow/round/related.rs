use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::join_all;

use crate::{
    domain::{
        CourseId, Pagination, UserId,
        round::{Round, RoundQuery, RoundRepository},
    },
    workflow::round::{RoundError, distinct_players},
};

/// Looks up what each player recorded for an outing, so an editor can show
/// everyone's scores before changing the group.
#[async_trait::async_trait]
pub trait RelatedRoundsUseCase {
    async fn related_rounds(
        &self,
        date: NaiveDate,
        course_id: CourseId,
        user_ids: &[UserId],
    ) -> Result<Vec<Round>, RoundError>;
}

pub struct RelatedRoundsUseCaseImpl<R: RoundRepository> {
    round_repository: Arc<R>,
}

impl<R: RoundRepository> RelatedRoundsUseCaseImpl<R> {
    pub fn new(round_repository: Arc<R>) -> Self {
        Self { round_repository }
    }
}

#[async_trait::async_trait]
impl<R: RoundRepository + Send + Sync + 'static> RelatedRoundsUseCase
    for RelatedRoundsUseCaseImpl<R>
{
    async fn related_rounds(
        &self,
        date: NaiveDate,
        course_id: CourseId,
        user_ids: &[UserId],
    ) -> Result<Vec<Round>, RoundError> {
        let users = distinct_players(user_ids, None);
        let results = join_all(users.iter().map(|&user_id| {
            let query = RoundQuery::on_outing(user_id, date, course_id)
                .with_pagination(Pagination::first(1));
            self.round_repository.query_rounds(query)
        }))
        .await;

        let mut rounds = Vec::with_capacity(users.len());
        for result in results {
            match result {
                Ok(page) => rounds.extend(page.items.into_iter().next()),
                Err(e) => {
                    log::error!("Error looking up rounds on {} at {}: {}", date, course_id, e);
                    return Err(RoundError::Storage(e.to_string()));
                }
            }
        }
        Ok(rounds)
    }
}
