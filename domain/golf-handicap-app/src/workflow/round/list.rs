use std::sync::Arc;

use crate::{
    domain::{
        Pagination, UserId,
        round::{Round, RoundQuery, RoundRepository},
    },
    workflow::round::RoundError,
};

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct RoundPage {
    pub rounds: Vec<Round>,
    /// Pass back to fetch the following page. `None` on the last page.
    pub next_token: Option<String>,
    pub has_more: bool,
}

/// A user's rounds, newest first.
#[async_trait::async_trait]
pub trait ListRoundsUseCase {
    async fn list_rounds(
        &self,
        user_id: UserId,
        limit: Option<usize>,
        next_token: Option<String>,
    ) -> Result<RoundPage, RoundError>;
}

pub struct ListRoundsUseCaseImpl<R: RoundRepository> {
    round_repository: Arc<R>,
}

impl<R: RoundRepository> ListRoundsUseCaseImpl<R> {
    pub fn new(round_repository: Arc<R>) -> Self {
        Self { round_repository }
    }
}

/// Tokens are offsets. Anything a store could not seek to is rejected.
fn parse_token(token: Option<String>) -> Result<usize, RoundError> {
    let Some(token) = token else {
        return Ok(0);
    };
    token
        .parse::<i64>()
        .ok()
        .and_then(|offset| usize::try_from(offset).ok())
        .ok_or_else(|| RoundError::Validation(format!("invalid page token '{}'", token)))
}

#[async_trait::async_trait]
impl<R: RoundRepository + Send + Sync + 'static> ListRoundsUseCase for ListRoundsUseCaseImpl<R> {
    async fn list_rounds(
        &self,
        user_id: UserId,
        limit: Option<usize>,
        next_token: Option<String>,
    ) -> Result<RoundPage, RoundError> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE);
        if !(1..=MAX_PAGE_SIZE).contains(&limit) {
            return Err(RoundError::Validation(format!(
                "limit must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        let offset = parse_token(next_token)?;

        let query = RoundQuery::for_user(user_id).with_pagination(Pagination {
            offset: Some(offset),
            limit: Some(limit),
        });
        let page = match self.round_repository.query_rounds(query).await {
            Ok(page) => page,
            Err(e) => {
                log::error!("Error listing rounds of user {}: {}", user_id, e);
                return Err(RoundError::Storage(e.to_string()));
            }
        };

        let Some(end) = offset.checked_add(page.items.len()) else {
            return Err(RoundError::Validation(format!(
                "page token {} is out of range",
                offset
            )));
        };
        let has_more = end < page.total_count;
        Ok(RoundPage {
            rounds: page.items,
            next_token: has_more.then(|| end.to_string()),
            has_more,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Days;

    use crate::testing::{Fixture, round_with_differential};

    use super::*;

    #[tokio::test]
    async fn test_pages_newest_first() {
        let f = Fixture::new();
        let a = f.add_user("Ann");
        for day in 0..5 {
            let date = f.date() - Days::new(day);
            f.rounds.insert(round_with_differential(a, date, day as f64));
        }
        f.rounds
            .insert(round_with_differential(f.add_user("Bob"), f.date(), 1.0));
        let use_case = ListRoundsUseCaseImpl::new(f.rounds.clone());

        let first = use_case.list_rounds(a, Some(2), None).await.unwrap();
        assert_eq!(first.rounds.len(), 2);
        assert_eq!(first.rounds[0].date, f.date());
        assert!(first.has_more);

        let second = use_case
            .list_rounds(a, Some(2), first.next_token)
            .await
            .unwrap();
        assert_eq!(second.rounds[0].date, f.date() - Days::new(2));
        assert!(second.has_more);

        let last = use_case
            .list_rounds(a, Some(2), second.next_token)
            .await
            .unwrap();
        assert_eq!(last.rounds.len(), 1);
        assert!(!last.has_more);
        assert_eq!(last.next_token, None);

        let all = use_case.list_rounds(a, None, None).await.unwrap();
        assert_eq!(all.rounds.len(), 5);

        let beyond = use_case
            .list_rounds(a, Some(2), Some(i64::MAX.to_string()))
            .await
            .unwrap();
        assert!(beyond.rounds.is_empty());
        assert!(!beyond.has_more);
        assert_eq!(beyond.next_token, None);
    }

    #[tokio::test]
    async fn test_rejects_bad_input() {
        let f = Fixture::new();
        let a = f.add_user("Ann");
        let use_case = ListRoundsUseCaseImpl::new(f.rounds.clone());

        for limit in [0, 101] {
            assert!(matches!(
                use_case.list_rounds(a, Some(limit), None).await,
                Err(RoundError::Validation(_))
            ));
        }
        for token in ["not-a-token".to_string(), "-1".to_string(), u64::MAX.to_string()] {
            assert!(matches!(
                use_case.list_rounds(a, Some(10), Some(token)).await,
                Err(RoundError::Validation(_))
            ));
        }

        f.rounds.fail_queries(true);
        assert!(matches!(
            use_case.list_rounds(a, None, None).await,
            Err(RoundError::Storage(_))
        ));
    }
}
