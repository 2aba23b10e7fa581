//! In-memory repositories with failure injection for workflow tests.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use chrono::{DateTime, NaiveDate, Utc};
use dashmap::{DashMap, DashSet};
use golf_core::{HoleCount, HoleResult, Tee};

use crate::{
    domain::{
        CourseId, PaginatedResponse, RepoCreateError, RepoError, RepoRetrieveError,
        RepoUpdateError, RoundId, SortOrder, UserId,
        handicap::HandicapServiceImpl,
        round::{Round, RoundQuery, RoundRepository, RoundUpdate, newest_first},
        scoring::ScoringServiceImpl,
        user::{User, UserQuery, UserRepository, UserSortBy},
    },
    ports::course_lookup::{Course, CourseLookupError, CourseLookupPort},
    workflow::handicap::recompute::RecomputeHandicapWorkflowImpl,
};

pub type TestRecomputeWorkflow =
    RecomputeHandicapWorkflowImpl<FakeRoundRepository, FakeUserRepository, HandicapServiceImpl>;

#[derive(Default)]
pub struct FakeRoundRepository {
    rounds: DashMap<RoundId, Round>,
    failing_creates: DashSet<UserId>,
    failing_deletes: DashSet<RoundId>,
    failing_updates: DashSet<RoundId>,
    failing_queries: AtomicBool,
}

impl FakeRoundRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, round: Round) {
        self.rounds.insert(round.id, round);
    }

    pub fn round(&self, round_id: RoundId) -> Option<Round> {
        self.rounds.get(&round_id).map(|r| r.clone())
    }

    pub fn all(&self) -> Vec<Round> {
        self.rounds.iter().map(|r| r.value().clone()).collect()
    }

    pub fn rounds_of(&self, user_id: UserId) -> Vec<Round> {
        self.all()
            .into_iter()
            .filter(|r| r.user_id == user_id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn fail_creates_for(&self, user_id: UserId) {
        self.failing_creates.insert(user_id);
    }

    pub fn fail_delete_of(&self, round_id: RoundId) {
        self.failing_deletes.insert(round_id);
    }

    pub fn fail_updates_of(&self, round_id: RoundId) {
        self.failing_updates.insert(round_id);
    }

    pub fn fail_queries(&self, fail: bool) {
        self.failing_queries.store(fail, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl RoundRepository for FakeRoundRepository {
    async fn get_round(&self, round_id: RoundId) -> Result<Round, RepoRetrieveError> {
        self.round(round_id).ok_or(RepoRetrieveError::NotFound)
    }

    async fn create_round(&self, round: &Round) -> Result<(), RepoCreateError> {
        if self.failing_creates.contains(&round.user_id) {
            return Err(RepoCreateError::StorageError("injected failure".to_string()));
        }
        if self.rounds.contains_key(&round.id) {
            return Err(RepoCreateError::Conflict);
        }
        self.insert(round.clone());
        Ok(())
    }

    async fn update_round(
        &self,
        round_id: RoundId,
        update: RoundUpdate,
    ) -> Result<Round, RepoUpdateError> {
        if self.failing_updates.contains(&round_id) {
            return Err(RepoUpdateError::StorageError("injected failure".to_string()));
        }
        let Some(mut round) = self.rounds.get_mut(&round_id) else {
            return Err(RepoUpdateError::NotFound);
        };
        update.apply_to(&mut round);
        Ok(round.clone())
    }

    async fn delete_round(&self, round_id: RoundId) -> Result<(), RepoRetrieveError> {
        if self.failing_deletes.contains(&round_id) {
            return Err(RepoRetrieveError::StorageError(
                "injected failure".to_string(),
            ));
        }
        self.rounds
            .remove(&round_id)
            .map(|_| ())
            .ok_or(RepoRetrieveError::NotFound)
    }

    async fn query_rounds(
        &self,
        query: RoundQuery,
    ) -> Result<PaginatedResponse<Round>, RepoError> {
        if self.failing_queries.load(Ordering::SeqCst) {
            return Err(RepoError::StorageError("injected failure".to_string()));
        }
        let mut matching: Vec<Round> = self
            .all()
            .into_iter()
            .filter(|r| query.matches(r))
            .collect();
        matching.sort_by(newest_first);
        let total_count = matching.len();
        Ok(PaginatedResponse {
            items: query.pagination.apply(matching),
            total_count,
        })
    }

    async fn count_rounds(&self, user_id: UserId) -> Result<usize, RepoError> {
        Ok(self.rounds_of(user_id).len())
    }
}

#[derive(Default)]
pub struct FakeUserRepository {
    users: DashMap<UserId, User>,
    failing_updates: AtomicBool,
    handicap_updates: AtomicUsize,
}

impl FakeUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user: User) {
        self.users.insert(user.id, user);
    }

    pub fn user(&self, user_id: UserId) -> Option<User> {
        self.users.get(&user_id).map(|u| u.clone())
    }

    pub fn fail_updates(&self, fail: bool) {
        self.failing_updates.store(fail, Ordering::SeqCst);
    }

    pub fn handicap_updates(&self) -> usize {
        self.handicap_updates.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl UserRepository for FakeUserRepository {
    async fn get_user(&self, user_id: UserId) -> Result<User, RepoRetrieveError> {
        self.user(user_id).ok_or(RepoRetrieveError::NotFound)
    }

    async fn update_handicap(
        &self,
        user_id: UserId,
        handicap: f64,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepoUpdateError> {
        if self.failing_updates.load(Ordering::SeqCst) {
            return Err(RepoUpdateError::StorageError("injected failure".to_string()));
        }
        let Some(mut user) = self.users.get_mut(&user_id) else {
            return Err(RepoUpdateError::NotFound);
        };
        user.handicap = handicap;
        user.updated_at = Some(updated_at);
        self.handicap_updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn query_users(&self, query: UserQuery) -> Result<PaginatedResponse<User>, RepoError> {
        let mut users: Vec<User> = self.users.iter().map(|u| u.value().clone()).collect();
        match query.sort {
            Some((order, UserSortBy::Handicap)) => {
                users.sort_by(|a, b| a.handicap.total_cmp(&b.handicap));
                if order == SortOrder::Descending {
                    users.reverse();
                }
            }
            Some((order, UserSortBy::DisplayName)) => {
                users.sort_by(|a, b| a.display_name.cmp(&b.display_name));
                if order == SortOrder::Descending {
                    users.reverse();
                }
            }
            None => users.sort_by_key(|u| u.id),
        }
        let total_count = users.len();
        Ok(PaginatedResponse {
            items: query.pagination.apply(users),
            total_count,
        })
    }
}

#[derive(Default)]
pub struct FakeCourseLookup {
    courses: DashMap<CourseId, Course>,
}

#[async_trait::async_trait]
impl CourseLookupPort for FakeCourseLookup {
    async fn get_course(&self, course_id: CourseId) -> Result<Course, CourseLookupError> {
        self.courses
            .get(&course_id)
            .map(|c| c.clone())
            .ok_or(CourseLookupError::NotFound)
    }
}

/// A course rated 72.0 / 113 from the white tee and 70.0 / 125 from the red.
pub fn test_course() -> Course {
    Course {
        id: CourseId(uuid::Uuid::new_v4()),
        name: "Pine Valley".to_string(),
        rating: HashMap::from([(Tee::White, 72.0), (Tee::Red, 70.0)]),
        slope: HashMap::from([(Tee::White, 113.0), (Tee::Red, 125.0)]),
    }
}

/// Par four holes with the given strokes.
pub fn card(strokes: &[u8]) -> Vec<HoleResult> {
    strokes
        .iter()
        .enumerate()
        .map(|(i, &s)| HoleResult::new(i as u8 + 1, 4, s))
        .collect()
}

pub fn even_card(hole_count: HoleCount, strokes: u8) -> Vec<HoleResult> {
    card(&vec![strokes; hole_count.holes()])
}

pub fn round_with_differential(user_id: UserId, date: NaiveDate, differential: f64) -> Round {
    let now = Utc::now();
    Round {
        id: RoundId::new(),
        user_id,
        course_id: CourseId(uuid::Uuid::new_v4()),
        course_name: "Anywhere".to_string(),
        tee: Tee::White,
        hole_count: HoleCount::Eighteen,
        date,
        holes: even_card(HoleCount::Eighteen, 4),
        total_score: 72,
        total_par: 72,
        score_differential: differential,
        players: Vec::new(),
        group_id: None,
        created_at: now,
        updated_at: now,
    }
}

pub struct Fixture {
    pub rounds: Arc<FakeRoundRepository>,
    pub users: Arc<FakeUserRepository>,
    pub courses: Arc<FakeCourseLookup>,
    pub scoring: Arc<ScoringServiceImpl>,
    pub recompute: Arc<TestRecomputeWorkflow>,
    pub course: Course,
}

impl Fixture {
    pub fn new() -> Self {
        let rounds = Arc::new(FakeRoundRepository::new());
        let users = Arc::new(FakeUserRepository::new());
        let courses = Arc::new(FakeCourseLookup::default());
        let course = test_course();
        courses.courses.insert(course.id, course.clone());
        let recompute = Arc::new(RecomputeHandicapWorkflowImpl::new(
            rounds.clone(),
            users.clone(),
            Arc::new(HandicapServiceImpl::new()),
        ));
        Self {
            rounds,
            users,
            courses,
            scoring: Arc::new(ScoringServiceImpl::new()),
            recompute,
            course,
        }
    }

    pub fn add_user(&self, name: &str) -> UserId {
        let id = UserId::new();
        self.users.insert(User::new(id, name));
        id
    }

    pub fn date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 14).unwrap()
    }
}
