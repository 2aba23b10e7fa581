use std::sync::Arc;

use chrono::NaiveDate;
use golf_core::{HoleCount, Tee};

use crate::{
    domain::{
        CourseId, RoundGroupId, UserId,
        round::{Round, RoundRepository},
        scoring::ScoringService,
        user::UserRepository,
    },
    ports::course_lookup::CourseLookupPort,
    workflow::{
        handicap::recompute::RecomputeHandicapWorkflow,
        round::{
            Outing, PlayerScores, RoundError, build_group_rounds, distinct_players,
            ensure_players_exist, resolve_course, write_group_rounds,
        },
    },
};

#[derive(Debug, Clone)]
pub struct CreateRoundGroupRequest {
    pub course_id: CourseId,
    /// Falls back to the course's own name when empty.
    pub course_name: String,
    pub tee: Tee,
    pub hole_count: HoleCount,
    pub date: NaiveDate,
    pub requesting_user: UserId,
    pub player_scores: Vec<PlayerScores>,
}

/// Records one outing as one round per player.
#[async_trait::async_trait]
pub trait CreateRoundGroupUseCase {
    async fn create_round_group(
        &self,
        request: CreateRoundGroupRequest,
    ) -> Result<Vec<Round>, RoundError>;
}

pub struct CreateRoundGroupUseCaseImpl<
    R: RoundRepository,
    U: UserRepository,
    C: CourseLookupPort,
    S: ScoringService,
    H: RecomputeHandicapWorkflow,
> {
    round_repository: Arc<R>,
    user_repository: Arc<U>,
    course_lookup: Arc<C>,
    scoring_service: Arc<S>,
    recompute_handicap_workflow: Arc<H>,
}

impl<
    R: RoundRepository,
    U: UserRepository,
    C: CourseLookupPort,
    S: ScoringService,
    H: RecomputeHandicapWorkflow,
> CreateRoundGroupUseCaseImpl<R, U, C, S, H>
{
    pub fn new(
        round_repository: Arc<R>,
        user_repository: Arc<U>,
        course_lookup: Arc<C>,
        scoring_service: Arc<S>,
        recompute_handicap_workflow: Arc<H>,
    ) -> Self {
        Self {
            round_repository,
            user_repository,
            course_lookup,
            scoring_service,
            recompute_handicap_workflow,
        }
    }
}

#[async_trait::async_trait]
impl<
    R: RoundRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    C: CourseLookupPort + Send + Sync + 'static,
    S: ScoringService + Send + Sync + 'static,
    H: RecomputeHandicapWorkflow + Send + Sync + 'static,
> CreateRoundGroupUseCase for CreateRoundGroupUseCaseImpl<R, U, C, S, H>
{
    async fn create_round_group(
        &self,
        request: CreateRoundGroupRequest,
    ) -> Result<Vec<Round>, RoundError> {
        let player_ids: Vec<UserId> = request.player_scores.iter().map(|p| p.player_id).collect();
        if player_ids.is_empty() {
            return Err(RoundError::Validation(
                "at least one player is required".to_string(),
            ));
        }
        if distinct_players(&player_ids, None).len() != player_ids.len() {
            return Err(RoundError::Validation(
                "a player is listed more than once".to_string(),
            ));
        }
        if !player_ids.contains(&request.requesting_user) {
            return Err(RoundError::Forbidden(format!(
                "user {} is not one of the players",
                request.requesting_user
            )));
        }

        let course = resolve_course(self.course_lookup.as_ref(), request.course_id).await?;
        let rating = self
            .scoring_service
            .course_rating(&course, request.tee, request.hole_count)?;
        ensure_players_exist(self.user_repository.as_ref(), &player_ids).await?;

        let outing = Outing {
            course_id: request.course_id,
            course_name: if request.course_name.trim().is_empty() {
                course.name
            } else {
                request.course_name
            },
            tee: request.tee,
            hole_count: request.hole_count,
            date: request.date,
        };
        let rounds = build_group_rounds(
            self.scoring_service.as_ref(),
            &outing,
            rating,
            request.player_scores,
            RoundGroupId::new(),
            chrono::Utc::now(),
        )?;

        if let Err(report) = write_group_rounds(self.round_repository.as_ref(), &rounds).await {
            self.recompute_handicap_workflow
                .recompute_handicaps(&report.succeeded)
                .await;
            return Err(RoundError::PartialWrite(report));
        }

        log::info!(
            "Created {} round(s) at {} on {} for user {}",
            rounds.len(),
            outing.course_name,
            outing.date,
            request.requesting_user
        );
        self.recompute_handicap_workflow
            .recompute_handicaps(&player_ids)
            .await;
        Ok(rounds)
    }
}
