use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use futures::future::join_all;
use golf_core::{HoleResult, par_default};

use crate::{
    domain::{
        RepoRetrieveError, RepoUpdateError, RoundGroupId, RoundId, UserId,
        round::{Round, RoundRepository, RoundUpdate},
        scoring::ScoringService,
        user::UserRepository,
    },
    ports::course_lookup::{Course, CourseLookupPort},
    workflow::{
        handicap::recompute::RecomputeHandicapWorkflow,
        round::{
            GroupWriteReport, Outing, PlayerScores, RoundError, build_group_rounds,
            discover_outing_rounds, distinct_players, ensure_players_exist, load_owned_round,
            resolve_course, write_group_rounds,
        },
    },
};

#[derive(Debug, Clone)]
pub struct UpdateRoundGroupRequest {
    pub anchor_round_id: RoundId,
    pub requesting_user: UserId,
    /// New hole results per member. Members without an entry keep their scores.
    pub scores: HashMap<UserId, Vec<HoleResult>>,
    /// Desired co-players of the anchor's owner.
    pub players: Vec<UserId>,
}

#[derive(Debug, Clone)]
pub struct UpdateRoundGroupOutcome {
    /// The group's rounds after the edit, owner first.
    pub rounds: Vec<Round>,
    /// Whether the group was written as new records instead of edited.
    pub recreated: bool,
    /// Replaced records that could not be deleted after a recreate.
    pub stale_round_ids: Vec<RoundId>,
}

/// Edits the scores and player set of an outing starting from one of its
/// rounds.
#[async_trait::async_trait]
pub trait UpdateRoundGroupUseCase {
    async fn update_round_group(
        &self,
        request: UpdateRoundGroupRequest,
    ) -> Result<UpdateRoundGroupOutcome, RoundError>;
}

pub struct UpdateRoundGroupUseCaseImpl<
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
> UpdateRoundGroupUseCaseImpl<R, U, C, S, H>
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

/// The anchor, its discovered siblings and the requested membership.
struct GroupEdit {
    anchor: Round,
    members: Vec<UserId>,
    siblings: HashMap<UserId, Round>,
    removed: Vec<UserId>,
    scores: HashMap<UserId, Vec<HoleResult>>,
}

impl GroupEdit {
    fn round_of(&self, user_id: UserId) -> Option<&Round> {
        if user_id == self.anchor.user_id {
            Some(&self.anchor)
        } else {
            self.siblings.get(&user_id)
        }
    }

    fn removed_rounds(&self) -> Vec<&Round> {
        self.removed
            .iter()
            .filter_map(|user_id| self.siblings.get(user_id))
            .collect()
    }

    fn touched_players(&self) -> Vec<UserId> {
        let mut touched = self.members.clone();
        touched.extend(self.removed.iter().copied());
        touched
    }
}

impl<
    R: RoundRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    C: CourseLookupPort + Send + Sync + 'static,
    S: ScoringService + Send + Sync + 'static,
    H: RecomputeHandicapWorkflow + Send + Sync + 'static,
> UpdateRoundGroupUseCaseImpl<R, U, C, S, H>
{
    /// Writes a fresh group, then deletes the records it replaces. The old
    /// group is left untouched when any new record fails to save.
    async fn recreate(
        &self,
        edit: GroupEdit,
        course: &Course,
    ) -> Result<UpdateRoundGroupOutcome, RoundError> {
        let anchor = &edit.anchor;
        let new_players: Vec<UserId> = edit
            .members
            .iter()
            .copied()
            .filter(|id| edit.round_of(*id).is_none())
            .collect();
        ensure_players_exist(self.user_repository.as_ref(), &new_players).await?;

        let rating = self
            .scoring_service
            .course_rating(course, anchor.tee, anchor.hole_count)?;
        let members: Vec<PlayerScores> = edit
            .members
            .iter()
            .map(|&user_id| {
                let holes = match (edit.scores.get(&user_id), edit.round_of(user_id)) {
                    (Some(holes), _) => holes.clone(),
                    (None, Some(existing)) => existing.holes.clone(),
                    (None, None) => par_default(&anchor.holes),
                };
                PlayerScores::new(user_id, holes)
            })
            .collect();
        let rounds = build_group_rounds(
            self.scoring_service.as_ref(),
            &Outing::of(anchor),
            rating,
            members,
            RoundGroupId::new(),
            chrono::Utc::now(),
        )?;

        if let Err(report) = write_group_rounds(self.round_repository.as_ref(), &rounds).await {
            self.recompute_handicap_workflow
                .recompute_handicaps(&report.succeeded)
                .await;
            return Err(RoundError::PartialWrite(report));
        }

        let replaced: Vec<RoundId> = edit
            .members
            .iter()
            .filter_map(|id| edit.round_of(*id))
            .map(|round| round.id)
            .collect();
        let deletions = join_all(replaced.iter().map(|&round_id| async move {
            (round_id, self.round_repository.delete_round(round_id).await)
        }))
        .await;
        let stale_round_ids: Vec<RoundId> = deletions
            .into_iter()
            .filter_map(|(round_id, result)| match result {
                Ok(()) | Err(RepoRetrieveError::NotFound) => None,
                Err(RepoRetrieveError::StorageError(e)) => {
                    log::warn!("Failed to delete replaced round {}: {}", round_id, e);
                    Some(round_id)
                }
            })
            .collect();

        self.detach(&edit.removed_rounds()).await;

        let mut touched = edit.touched_players();
        touched.extend(anchor.participants());
        self.recompute_handicap_workflow
            .recompute_handicaps(&touched)
            .await;

        log::info!(
            "Recreated group of round {} as {} new round(s)",
            anchor.id,
            rounds.len()
        );
        Ok(UpdateRoundGroupOutcome {
            rounds,
            recreated: true,
            stale_round_ids,
        })
    }

    async fn update_in_place(
        &self,
        edit: GroupEdit,
        course: &Course,
    ) -> Result<UpdateRoundGroupOutcome, RoundError> {
        let group_id = if edit.members.len() > 1 {
            Some(edit.anchor.group_id.unwrap_or_else(RoundGroupId::new))
        } else {
            None
        };
        let now = chrono::Utc::now();

        let mut updates = Vec::with_capacity(edit.members.len());
        for &user_id in &edit.members {
            let Some(round) = edit.round_of(user_id) else {
                continue;
            };
            let holes = edit
                .scores
                .get(&user_id)
                .cloned()
                .unwrap_or_else(|| round.holes.clone());
            let rating = self
                .scoring_service
                .course_rating(course, round.tee, round.hole_count)?;
            let scored = self
                .scoring_service
                .score_card(holes, round.hole_count, rating)
                .map_err(|e| {
                    RoundError::Validation(format!("scores of player {}: {}", user_id, e))
                })?;
            updates.push((
                user_id,
                round.id,
                RoundUpdate {
                    holes: scored.holes,
                    total_score: scored.total_score,
                    total_par: scored.total_par,
                    score_differential: scored.score_differential,
                    players: distinct_players(&edit.members, Some(user_id)),
                    group_id,
                    updated_at: now,
                },
            ));
        }

        let results = join_all(updates.into_iter().map(|(user_id, round_id, update)| async move {
            (user_id, self.round_repository.update_round(round_id, update).await)
        }))
        .await;

        let mut rounds = Vec::new();
        let mut report = GroupWriteReport {
            succeeded: Vec::new(),
            failed: Vec::new(),
        };
        for (user_id, result) in results {
            match result {
                Ok(round) => {
                    report.succeeded.push(user_id);
                    rounds.push(round);
                }
                Err(e) => {
                    let reason = match e {
                        RepoUpdateError::NotFound => "round no longer exists".to_string(),
                        RepoUpdateError::StorageError(e) => e,
                    };
                    log::error!("Failed to update round of player {}: {}", user_id, reason);
                    report.failed.push((user_id, reason));
                }
            }
        }

        self.detach(&edit.removed_rounds()).await;
        self.recompute_handicap_workflow
            .recompute_handicaps(&edit.touched_players())
            .await;

        if !report.failed.is_empty() {
            return Err(RoundError::PartialWrite(report));
        }
        log::info!(
            "Updated {} round(s) of the group of round {}",
            rounds.len(),
            edit.anchor.id
        );
        Ok(UpdateRoundGroupOutcome {
            rounds,
            recreated: false,
            stale_round_ids: Vec::new(),
        })
    }

    /// Turns the rounds of players who left the group into solo rounds.
    async fn detach(&self, rounds: &[&Round]) {
        let now = chrono::Utc::now();
        let results = join_all(rounds.iter().map(|round| async move {
            let update = RoundUpdate::standalone(round, now);
            (round.id, self.round_repository.update_round(round.id, update).await)
        }))
        .await;
        for (round_id, result) in results {
            if let Err(e) = result {
                log::warn!("Failed to detach round {} from its group: {}", round_id, e);
            }
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
> UpdateRoundGroupUseCase for UpdateRoundGroupUseCaseImpl<R, U, C, S, H>
{
    async fn update_round_group(
        &self,
        request: UpdateRoundGroupRequest,
    ) -> Result<UpdateRoundGroupOutcome, RoundError> {
        let anchor = load_owned_round(
            self.round_repository.as_ref(),
            request.anchor_round_id,
            request.requesting_user,
        )
        .await?;
        let owner = anchor.user_id;

        let desired = distinct_players(&request.players, Some(owner));
        let mut members = vec![owner];
        members.extend(desired.iter().copied());
        let member_set: HashSet<UserId> = members.iter().copied().collect();
        if let Some(outsider) = request.scores.keys().find(|id| !member_set.contains(*id)) {
            return Err(RoundError::Validation(format!(
                "scores supplied for player {} who is not in the group",
                outsider
            )));
        }

        let course = resolve_course(self.course_lookup.as_ref(), anchor.course_id).await?;

        let original = distinct_players(&anchor.players, Some(owner));
        let mut siblings: HashMap<UserId, Round> = HashMap::new();
        for round in
            discover_outing_rounds(self.round_repository.as_ref(), &anchor, &original).await
        {
            siblings.entry(round.user_id).or_insert(round);
        }

        let added = desired.iter().any(|id| !original.contains(id));
        let missing = desired.iter().any(|id| !siblings.contains_key(id));
        let removed: Vec<UserId> = original
            .iter()
            .copied()
            .filter(|id| !member_set.contains(id))
            .collect();

        let edit = GroupEdit {
            anchor,
            members,
            siblings,
            removed,
            scores: request.scores,
        };
        if added || missing {
            self.recreate(edit, &course).await
        } else {
            self.update_in_place(edit, &course).await
        }
    }
}

#[cfg(test)]
mod tests {
    use golf_core::HoleCount;

    use crate::{
        testing::{Fixture, even_card},
        workflow::round::create_group::{
            CreateRoundGroupRequest, CreateRoundGroupUseCase, CreateRoundGroupUseCaseImpl,
        },
    };

    use super::*;

    fn use_case(f: &Fixture) -> impl UpdateRoundGroupUseCase {
        UpdateRoundGroupUseCaseImpl::new(
            f.rounds.clone(),
            f.users.clone(),
            f.courses.clone(),
            f.scoring.clone(),
            f.recompute.clone(),
        )
    }

    /// Creates a group where every player shot five on every hole.
    async fn create_group(f: &Fixture, players: &[UserId]) -> Vec<Round> {
        let create = CreateRoundGroupUseCaseImpl::new(
            f.rounds.clone(),
            f.users.clone(),
            f.courses.clone(),
            f.scoring.clone(),
            f.recompute.clone(),
        );
        create
            .create_round_group(CreateRoundGroupRequest {
                course_id: f.course.id,
                course_name: String::new(),
                tee: golf_core::Tee::White,
                hole_count: HoleCount::Eighteen,
                date: f.date(),
                requesting_user: players[0],
                player_scores: players
                    .iter()
                    .map(|&p| PlayerScores::new(p, even_card(HoleCount::Eighteen, 5)))
                    .collect(),
            })
            .await
            .unwrap()
    }

    fn request(anchor: &Round, players: &[UserId]) -> UpdateRoundGroupRequest {
        UpdateRoundGroupRequest {
            anchor_round_id: anchor.id,
            requesting_user: anchor.user_id,
            scores: HashMap::new(),
            players: players.to_vec(),
        }
    }

    #[tokio::test]
    async fn test_adding_player_recreates_group() {
        let f = Fixture::new();
        let a = f.add_user("Ann");
        let b = f.add_user("Bob");
        let c = f.add_user("Cid");
        let old = create_group(&f, &[a, b]).await;

        let outcome = use_case(&f)
            .update_round_group(request(&old[0], &[b, c]))
            .await
            .unwrap();

        assert!(outcome.recreated);
        assert!(outcome.stale_round_ids.is_empty());
        assert_eq!(f.rounds.len(), 3);
        for round in &old {
            assert!(f.rounds.round(round.id).is_none());
        }
        let new_c = &f.rounds.rounds_of(c)[0];
        assert_eq!(new_c.total_score, new_c.total_par);
        assert!(new_c.holes.iter().all(|h| h.strokes == h.par));
        assert_eq!(f.rounds.rounds_of(b)[0].total_score, 90);
        let group_id = new_c.group_id;
        assert!(group_id.is_some());
        assert_ne!(group_id, old[0].group_id);
        for round in f.rounds.all() {
            assert_eq!(round.group_id, group_id);
            assert_eq!(round.players.len(), 2);
        }
        assert_eq!(f.users.user(c).unwrap().handicap, 0.0);
    }

    #[tokio::test]
    async fn test_score_edit_updates_in_place() {
        let f = Fixture::new();
        let a = f.add_user("Ann");
        let b = f.add_user("Bob");
        let old = create_group(&f, &[a, b]).await;
        let old_b = old.iter().find(|r| r.user_id == b).unwrap();

        let mut edit = request(&old[0], &[b]);
        edit.scores.insert(b, even_card(HoleCount::Eighteen, 4));
        let outcome = use_case(&f).update_round_group(edit).await.unwrap();

        assert!(!outcome.recreated);
        assert_eq!(outcome.rounds.len(), 2);
        assert_eq!(f.rounds.len(), 2);
        let new_b = f.rounds.round(old_b.id).unwrap();
        assert_eq!(new_b.total_score, 72);
        assert_eq!(new_b.score_differential, 0.0);
        assert_eq!(new_b.players, vec![a]);
        assert_eq!(new_b.group_id, old_b.group_id);
        assert_eq!(f.rounds.round(old[0].id).unwrap().total_score, 90);
        assert_eq!(f.users.user(b).unwrap().handicap, 0.0);
        assert_eq!(f.users.user(a).unwrap().handicap, 18.0);
    }

    #[tokio::test]
    async fn test_removed_player_keeps_standalone_round() {
        let f = Fixture::new();
        let a = f.add_user("Ann");
        let b = f.add_user("Bob");
        let c = f.add_user("Cid");
        let old = create_group(&f, &[a, b, c]).await;

        let outcome = use_case(&f)
            .update_round_group(request(&old[0], &[b]))
            .await
            .unwrap();

        assert!(!outcome.recreated);
        assert_eq!(f.rounds.len(), 3);
        assert_eq!(f.rounds.round(old[0].id).unwrap().players, vec![b]);
        assert_eq!(f.rounds.rounds_of(b)[0].players, vec![a]);
        let left = &f.rounds.rounds_of(c)[0];
        assert!(left.players.is_empty());
        assert_eq!(left.group_id, None);
        assert_eq!(left.total_score, 90);
    }

    #[tokio::test]
    async fn test_removing_every_co_player_leaves_solo_round() {
        let f = Fixture::new();
        let a = f.add_user("Ann");
        let b = f.add_user("Bob");
        let old = create_group(&f, &[a, b]).await;
        let old_a = old.iter().find(|r| r.user_id == a).unwrap();
        assert!(old_a.group_id.is_some());

        let outcome = use_case(&f)
            .update_round_group(request(old_a, &[]))
            .await
            .unwrap();

        assert!(!outcome.recreated);
        assert_eq!(outcome.rounds.len(), 1);
        for round in f.rounds.all() {
            assert!(round.players.is_empty());
            assert_eq!(round.group_id, None);
        }
    }

    #[tokio::test]
    async fn test_failed_in_place_write_is_reported() {
        let f = Fixture::new();
        let a = f.add_user("Ann");
        let b = f.add_user("Bob");
        let old = create_group(&f, &[a, b]).await;
        let old_a = old.iter().find(|r| r.user_id == a).unwrap();
        let old_b = old.iter().find(|r| r.user_id == b).unwrap();
        f.rounds.fail_updates_of(old_b.id);

        let mut edit = request(old_a, &[b]);
        edit.scores.insert(a, even_card(HoleCount::Eighteen, 4));
        edit.scores.insert(b, even_card(HoleCount::Eighteen, 4));
        let result = use_case(&f).update_round_group(edit).await;

        let Err(RoundError::PartialWrite(report)) = result else {
            panic!("expected a partial write, got {:?}", result);
        };
        assert_eq!(report.succeeded, vec![a]);
        assert_eq!(report.failed_players(), vec![b]);
        assert_eq!(f.rounds.round(old_a.id).unwrap().total_score, 72);
        assert_eq!(f.rounds.round(old_b.id).unwrap().total_score, 90);
        assert_eq!(f.users.user(a).unwrap().handicap, 0.0);
    }

    #[tokio::test]
    async fn test_failed_detach_does_not_fail_edit() {
        let f = Fixture::new();
        let a = f.add_user("Ann");
        let b = f.add_user("Bob");
        let c = f.add_user("Cid");
        let old = create_group(&f, &[a, b, c]).await;
        let old_a = old.iter().find(|r| r.user_id == a).unwrap();
        let old_c = old.iter().find(|r| r.user_id == c).unwrap();
        f.rounds.fail_updates_of(old_c.id);

        let outcome = use_case(&f)
            .update_round_group(request(old_a, &[b]))
            .await
            .unwrap();

        assert!(!outcome.recreated);
        assert_eq!(outcome.rounds.len(), 2);
        assert_eq!(f.rounds.round(old_a.id).unwrap().players, vec![b]);
        let kept = f.rounds.round(old_c.id).unwrap();
        assert_eq!(kept.players.len(), 2);
        assert_eq!(kept.group_id, old_c.group_id);
    }

    #[tokio::test]
    async fn test_missing_sibling_recreates_with_par() {
        let f = Fixture::new();
        let a = f.add_user("Ann");
        let b = f.add_user("Bob");
        let old = create_group(&f, &[a, b]).await;
        f.rounds.delete_round(old[1].id).await.unwrap();

        let outcome = use_case(&f)
            .update_round_group(request(&old[0], &[b]))
            .await
            .unwrap();

        assert!(outcome.recreated);
        assert_eq!(f.rounds.len(), 2);
        assert!(f.rounds.round(old[0].id).is_none());
        let new_b = &f.rounds.rounds_of(b)[0];
        assert_eq!(new_b.total_score, new_b.total_par);
        assert_eq!(f.rounds.rounds_of(a)[0].total_score, 90);
    }

    #[tokio::test]
    async fn test_failed_recreate_keeps_old_group() {
        let f = Fixture::new();
        let a = f.add_user("Ann");
        let b = f.add_user("Bob");
        let c = f.add_user("Cid");
        let old = create_group(&f, &[a, b]).await;
        f.rounds.fail_creates_for(c);

        let result = use_case(&f)
            .update_round_group(request(&old[0], &[b, c]))
            .await;

        let Err(RoundError::PartialWrite(report)) = result else {
            panic!("expected a partial write, got {:?}", result);
        };
        assert_eq!(report.failed_players(), vec![c]);
        for round in &old {
            assert!(f.rounds.round(round.id).is_some());
        }
    }

    #[tokio::test]
    async fn test_undeletable_record_is_reported_stale() {
        let f = Fixture::new();
        let a = f.add_user("Ann");
        let b = f.add_user("Bob");
        let c = f.add_user("Cid");
        let old = create_group(&f, &[a, b]).await;
        f.rounds.fail_delete_of(old[0].id);

        let outcome = use_case(&f)
            .update_round_group(request(&old[0], &[b, c]))
            .await
            .unwrap();

        assert_eq!(outcome.stale_round_ids, vec![old[0].id]);
        assert_eq!(f.rounds.len(), 4);
    }

    #[tokio::test]
    async fn test_rejects_foreign_anchor_and_outsider_scores() {
        let f = Fixture::new();
        let a = f.add_user("Ann");
        let b = f.add_user("Bob");
        let old = create_group(&f, &[a, b]).await;

        let mut foreign = request(&old[0], &[b]);
        foreign.requesting_user = b;
        assert!(matches!(
            use_case(&f).update_round_group(foreign).await,
            Err(RoundError::Forbidden(_))
        ));

        let mut outsider = request(&old[0], &[b]);
        outsider
            .scores
            .insert(UserId::new(), even_card(HoleCount::Eighteen, 4));
        assert!(matches!(
            use_case(&f).update_round_group(outsider).await,
            Err(RoundError::Validation(_))
        ));

        let missing = UpdateRoundGroupRequest {
            anchor_round_id: RoundId::new(),
            ..request(&old[0], &[b])
        };
        assert!(matches!(
            use_case(&f).update_round_group(missing).await,
            Err(RoundError::NotFound(_))
        ));
    }
}
