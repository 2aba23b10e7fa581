use std::{sync::Arc, time::Duration};

use golf_core::{DifferentialError, HoleCount, score_differential};
use tokio::task::JoinHandle;

use crate::{
    domain::{
        handicap::HandicapServiceImpl, round::RoundRepository, scoring::ScoringServiceImpl,
        user::UserRepository,
    },
    ports::course_lookup::CourseLookupPort,
    processes::handicap_reconcile_runner::HandicapReconcileJob,
    workflow::{
        handicap::{
            audit::{AuditHandicapsUseCase, AuditHandicapsUseCaseImpl},
            recompute::{RecomputeHandicapWorkflow, RecomputeHandicapWorkflowImpl},
        },
        leaderboard::get::{GetLeaderboardUseCase, GetLeaderboardUseCaseImpl},
        round::{
            create_group::{CreateRoundGroupUseCase, CreateRoundGroupUseCaseImpl},
            delete::{DeleteRoundUseCase, DeleteRoundUseCaseImpl},
            get::{GetRoundUseCase, GetRoundUseCaseImpl},
            list::{ListRoundsUseCase, ListRoundsUseCaseImpl},
            related::{RelatedRoundsUseCase, RelatedRoundsUseCaseImpl},
            update_group::{UpdateRoundGroupUseCase, UpdateRoundGroupUseCaseImpl},
        },
    },
};

pub mod domain;
pub mod ports;
pub mod processes;
pub mod workflow;

#[cfg(test)]
mod testing;

pub struct Application {
    pub jobs: JoinHandle<()>,

    pub round_create_group_use_case: Box<dyn CreateRoundGroupUseCase + Send + Sync + 'static>,
    pub round_update_group_use_case: Box<dyn UpdateRoundGroupUseCase + Send + Sync + 'static>,
    pub round_delete_use_case: Box<dyn DeleteRoundUseCase + Send + Sync + 'static>,
    pub round_get_use_case: Box<dyn GetRoundUseCase + Send + Sync + 'static>,
    pub round_list_use_case: Box<dyn ListRoundsUseCase + Send + Sync + 'static>,
    pub round_related_use_case: Box<dyn RelatedRoundsUseCase + Send + Sync + 'static>,

    pub leaderboard_get_use_case: Box<dyn GetLeaderboardUseCase + Send + Sync + 'static>,

    pub handicap_audit_use_case: Box<dyn AuditHandicapsUseCase + Send + Sync + 'static>,
    pub recompute_handicap_workflow: Arc<dyn RecomputeHandicapWorkflow + Send + Sync + 'static>,
}

impl Application {
    pub fn compute_differential(
        &self,
        total_score: u32,
        course_rating: f64,
        slope_rating: f64,
        hole_count: HoleCount,
    ) -> Result<f64, DifferentialError> {
        score_differential(total_score, course_rating, slope_rating, hole_count)
    }
}

pub async fn build_application<
    R: RoundRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    C: CourseLookupPort + Send + Sync + 'static,
>(
    round_repository: Arc<R>,
    user_repository: Arc<U>,
    course_lookup: Arc<C>,
    reconcile_interval: Duration,
) -> Application {
    let handicap_service = Arc::new(HandicapServiceImpl::new());
    let scoring_service = Arc::new(ScoringServiceImpl::new());

    let recompute_handicap_workflow = Arc::new(RecomputeHandicapWorkflowImpl::new(
        round_repository.clone(),
        user_repository.clone(),
        handicap_service.clone(),
    ));

    let reconcile_job = HandicapReconcileJob::new(
        user_repository.clone(),
        recompute_handicap_workflow.clone(),
        reconcile_interval,
    );

    let jobs = tokio::spawn(async move {
        reconcile_job.run().await;
    });

    let application = Application {
        jobs,
        round_create_group_use_case: Box::new(CreateRoundGroupUseCaseImpl::new(
            round_repository.clone(),
            user_repository.clone(),
            course_lookup.clone(),
            scoring_service.clone(),
            recompute_handicap_workflow.clone(),
        )),
        round_update_group_use_case: Box::new(UpdateRoundGroupUseCaseImpl::new(
            round_repository.clone(),
            user_repository.clone(),
            course_lookup.clone(),
            scoring_service.clone(),
            recompute_handicap_workflow.clone(),
        )),
        round_delete_use_case: Box::new(DeleteRoundUseCaseImpl::new(
            round_repository.clone(),
            recompute_handicap_workflow.clone(),
        )),
        round_get_use_case: Box::new(GetRoundUseCaseImpl::new(round_repository.clone())),
        round_list_use_case: Box::new(ListRoundsUseCaseImpl::new(round_repository.clone())),
        round_related_use_case: Box::new(RelatedRoundsUseCaseImpl::new(round_repository.clone())),

        leaderboard_get_use_case: Box::new(GetLeaderboardUseCaseImpl::new(
            user_repository.clone(),
            round_repository.clone(),
        )),

        handicap_audit_use_case: Box::new(AuditHandicapsUseCaseImpl::new(
            round_repository.clone(),
            user_repository.clone(),
            handicap_service.clone(),
        )),
        recompute_handicap_workflow,
    };

    application
}
