use chrono::{DateTime, NaiveDate, Utc};
use golf_core::{HoleCount, HoleResult, Tee};
use serde::{Deserialize, Serialize};

use crate::domain::{
    CourseId, PaginatedResponse, Pagination, RepoCreateError, RepoError, RepoRetrieveError,
    RepoUpdateError, RoundGroupId, RoundId, UserId,
};

/// One player's record of one outing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub id: RoundId,
    pub user_id: UserId,
    pub course_id: CourseId,
    pub course_name: String,
    pub tee: Tee,
    pub hole_count: HoleCount,
    pub date: NaiveDate,
    pub holes: Vec<HoleResult>,
    pub total_score: u32,
    pub total_par: u32,
    pub score_differential: f64,
    /// The other players of the outing, never including `user_id`.
    pub players: Vec<UserId>,
    pub group_id: Option<RoundGroupId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Round {
    /// Owner first, then the co-players in recorded order.
    pub fn participants(&self) -> Vec<UserId> {
        let mut participants = Vec::with_capacity(self.players.len() + 1);
        participants.push(self.user_id);
        participants.extend(self.players.iter().copied().filter(|p| *p != self.user_id));
        participants
    }

    pub fn is_group_round(&self) -> bool {
        !self.players.is_empty()
    }

    /// Whether `other` was recorded for the same outing as this round.
    ///
    /// Rounds that carry a group id only match rounds with the same id; rounds
    /// without one fall back to matching on date and course.
    pub fn belongs_to_same_outing(&self, other: &Round) -> bool {
        if self.date != other.date || self.course_id != other.course_id {
            return false;
        }
        match self.group_id {
            Some(group_id) => other.group_id == Some(group_id),
            None => true,
        }
    }
}

/// Full replacement of the mutable fields of a round.
#[derive(Clone, Debug, PartialEq)]
pub struct RoundUpdate {
    pub holes: Vec<HoleResult>,
    pub total_score: u32,
    pub total_par: u32,
    pub score_differential: f64,
    pub players: Vec<UserId>,
    pub group_id: Option<RoundGroupId>,
    pub updated_at: DateTime<Utc>,
}

impl RoundUpdate {
    /// Keeps the scores and detaches the round from its outing.
    pub fn standalone(round: &Round, updated_at: DateTime<Utc>) -> Self {
        Self {
            holes: round.holes.clone(),
            total_score: round.total_score,
            total_par: round.total_par,
            score_differential: round.score_differential,
            players: Vec::new(),
            group_id: None,
            updated_at,
        }
    }

    pub fn apply_to(self, round: &mut Round) {
        round.holes = self.holes;
        round.total_score = self.total_score;
        round.total_par = self.total_par;
        round.score_differential = self.score_differential;
        round.players = self.players;
        round.group_id = self.group_id;
        round.updated_at = self.updated_at;
    }
}

/// Results are always ordered by date, newest first, then by creation time,
/// newest first.
#[derive(Debug, Clone)]
pub struct RoundQuery {
    pub user_id: UserId,
    pub date: Option<NaiveDate>,
    pub course_id: Option<CourseId>,
    pub pagination: Pagination,
}

impl RoundQuery {
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id,
            date: None,
            course_id: None,
            pagination: Pagination::default(),
        }
    }

    pub fn on_outing(user_id: UserId, date: NaiveDate, course_id: CourseId) -> Self {
        Self {
            user_id,
            date: Some(date),
            course_id: Some(course_id),
            pagination: Pagination::default(),
        }
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    pub fn matches(&self, round: &Round) -> bool {
        round.user_id == self.user_id
            && self.date.is_none_or(|date| round.date == date)
            && self.course_id.is_none_or(|course_id| round.course_id == course_id)
    }
}

/// Ordering used for every round listing.
pub fn newest_first(a: &Round, b: &Round) -> std::cmp::Ordering {
    b.date
        .cmp(&a.date)
        .then_with(|| b.created_at.cmp(&a.created_at))
}

#[async_trait::async_trait]
pub trait RoundRepository {
    async fn get_round(&self, round_id: RoundId) -> Result<Round, RepoRetrieveError>;
    async fn create_round(&self, round: &Round) -> Result<(), RepoCreateError>;
    async fn update_round(
        &self,
        round_id: RoundId,
        update: RoundUpdate,
    ) -> Result<Round, RepoUpdateError>;
    async fn delete_round(&self, round_id: RoundId) -> Result<(), RepoRetrieveError>;
    async fn query_rounds(&self, query: RoundQuery)
    -> Result<PaginatedResponse<Round>, RepoError>;
    async fn count_rounds(&self, user_id: UserId) -> Result<usize, RepoError>;
}
