use std::{collections::HashSet, fmt};

use chrono::{DateTime, NaiveDate, Utc};
use futures::future::join_all;
use golf_core::{HoleCount, HoleResult, Tee};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    domain::{
        CourseId, RepoCreateError, RepoRetrieveError, RoundGroupId, RoundId, UserId,
        round::{Round, RoundQuery, RoundRepository},
        scoring::{CourseRating, ScoringError, ScoringService},
        user::UserRepository,
    },
    ports::course_lookup::{Course, CourseLookupError, CourseLookupPort},
};

pub mod create_group;
pub mod delete;
pub mod get;
pub mod list;
pub mod related;
pub mod update_group;

#[derive(Debug, Clone, Error)]
pub enum RoundError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    PartialWrite(GroupWriteReport),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<ScoringError> for RoundError {
    fn from(e: ScoringError) -> Self {
        RoundError::Validation(e.to_string())
    }
}

/// Outcome of writing every round of a group when at least one write failed.
/// Writes that succeeded are not rolled back.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupWriteReport {
    pub succeeded: Vec<UserId>,
    pub failed: Vec<(UserId, String)>,
}

impl GroupWriteReport {
    pub fn failed_players(&self) -> Vec<UserId> {
        self.failed.iter().map(|(id, _)| *id).collect()
    }
}

impl fmt::Display for GroupWriteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rounds were saved for {} of {} players; failed for: ",
            self.succeeded.len(),
            self.succeeded.len() + self.failed.len()
        )?;
        let failed: Vec<String> = self
            .failed
            .iter()
            .map(|(id, reason)| format!("{} ({})", id, reason))
            .collect();
        f.write_str(&failed.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerScores {
    pub player_id: UserId,
    pub holes: Vec<HoleResult>,
}

impl PlayerScores {
    pub fn new(player_id: UserId, holes: Vec<HoleResult>) -> Self {
        Self { player_id, holes }
    }
}

/// Everything the rounds of one outing have in common.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Outing {
    pub course_id: CourseId,
    pub course_name: String,
    pub tee: Tee,
    pub hole_count: HoleCount,
    pub date: NaiveDate,
}

impl Outing {
    pub fn of(round: &Round) -> Self {
        Self {
            course_id: round.course_id,
            course_name: round.course_name.clone(),
            tee: round.tee,
            hole_count: round.hole_count,
            date: round.date,
        }
    }
}

pub(crate) async fn load_owned_round<R: RoundRepository>(
    round_repository: &R,
    round_id: RoundId,
    requesting_user: UserId,
) -> Result<Round, RoundError> {
    let round = match round_repository.get_round(round_id).await {
        Ok(round) => round,
        Err(RepoRetrieveError::NotFound) => {
            return Err(RoundError::NotFound(format!("round {}", round_id)));
        }
        Err(RepoRetrieveError::StorageError(e)) => return Err(RoundError::Storage(e)),
    };
    if round.user_id != requesting_user {
        return Err(RoundError::Forbidden(format!(
            "round {} does not belong to user {}",
            round_id, requesting_user
        )));
    }
    Ok(round)
}

pub(crate) async fn resolve_course<C: CourseLookupPort>(
    course_lookup: &C,
    course_id: CourseId,
) -> Result<Course, RoundError> {
    match course_lookup.get_course(course_id).await {
        Ok(course) => Ok(course),
        Err(CourseLookupError::NotFound) => {
            Err(RoundError::NotFound(format!("course {}", course_id)))
        }
        Err(CourseLookupError::Unavailable(e)) => Err(RoundError::Storage(e)),
    }
}

/// Every listed player must be a known user.
pub(crate) async fn ensure_players_exist<U: UserRepository>(
    user_repository: &U,
    players: &[UserId],
) -> Result<(), RoundError> {
    let results = join_all(players.iter().map(|&user_id| async move {
        (user_id, user_repository.get_user(user_id).await)
    }))
    .await;
    for (user_id, result) in results {
        match result {
            Ok(_) => {}
            Err(RepoRetrieveError::NotFound) => {
                return Err(RoundError::NotFound(format!("player {}", user_id)));
            }
            Err(RepoRetrieveError::StorageError(e)) => return Err(RoundError::Storage(e)),
        }
    }
    Ok(())
}

/// Order-preserving removal of duplicates and of `exclude`.
pub(crate) fn distinct_players(players: &[UserId], exclude: Option<UserId>) -> Vec<UserId> {
    let mut seen = HashSet::new();
    players
        .iter()
        .copied()
        .filter(|id| Some(*id) != exclude && seen.insert(*id))
        .collect()
}

/// Builds one round per member. Each round lists the other members as
/// players and, for more than one member, shares `group_id`.
pub(crate) fn build_group_rounds<S: ScoringService>(
    scoring_service: &S,
    outing: &Outing,
    rating: CourseRating,
    members: Vec<PlayerScores>,
    group_id: RoundGroupId,
    now: DateTime<Utc>,
) -> Result<Vec<Round>, RoundError> {
    let member_ids: Vec<UserId> = members.iter().map(|m| m.player_id).collect();
    let group_id = (member_ids.len() > 1).then_some(group_id);

    members
        .into_iter()
        .map(|member| {
            let scored = scoring_service
                .score_card(member.holes, outing.hole_count, rating)
                .map_err(|e| {
                    RoundError::Validation(format!("scores of player {}: {}", member.player_id, e))
                })?;
            Ok(Round {
                id: RoundId::new(),
                user_id: member.player_id,
                course_id: outing.course_id,
                course_name: outing.course_name.clone(),
                tee: outing.tee,
                hole_count: outing.hole_count,
                date: outing.date,
                holes: scored.holes,
                total_score: scored.total_score,
                total_par: scored.total_par,
                score_differential: scored.score_differential,
                players: distinct_players(&member_ids, Some(member.player_id)),
                group_id,
                created_at: now,
                updated_at: now,
            })
        })
        .collect()
}

/// Writes every round in parallel and waits for all of them.
pub(crate) async fn write_group_rounds<R: RoundRepository>(
    round_repository: &R,
    rounds: &[Round],
) -> Result<(), GroupWriteReport> {
    let results = join_all(rounds.iter().map(|round| async move {
        let result = round_repository.create_round(round).await;
        (round.user_id, result)
    }))
    .await;

    let mut report = GroupWriteReport {
        succeeded: Vec::new(),
        failed: Vec::new(),
    };
    for (user_id, result) in results {
        match result {
            Ok(()) => report.succeeded.push(user_id),
            Err(e) => {
                let reason = match e {
                    RepoCreateError::Conflict => "round already exists".to_string(),
                    RepoCreateError::StorageError(e) => e,
                };
                log::error!("Failed to save round for player {}: {}", user_id, reason);
                report.failed.push((user_id, reason));
            }
        }
    }

    if report.failed.is_empty() {
        Ok(())
    } else {
        Err(report)
    }
}

/// Finds the rounds recorded for the same outing as `anchor` by each of
/// `candidates`. Candidates whose rounds cannot be queried are skipped.
pub(crate) async fn discover_outing_rounds<R: RoundRepository>(
    round_repository: &R,
    anchor: &Round,
    candidates: &[UserId],
) -> Vec<Round> {
    let candidates = distinct_players(candidates, None);
    let results = join_all(candidates.iter().map(|&user_id| async move {
        let query = RoundQuery::on_outing(user_id, anchor.date, anchor.course_id);
        (user_id, round_repository.query_rounds(query).await)
    }))
    .await;

    let mut seen = HashSet::new();
    let mut rounds = Vec::new();
    for (user_id, result) in results {
        match result {
            Ok(page) => rounds.extend(
                page.items
                    .into_iter()
                    .filter(|r| anchor.belongs_to_same_outing(r) && seen.insert(r.id)),
            ),
            Err(e) => log::warn!(
                "Skipping rounds of player {} for outing of round {}: {}",
                user_id,
                anchor.id,
                e
            ),
        }
    }
    rounds
}
