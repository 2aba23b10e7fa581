use golf_core::{
    DifferentialError, HoleCount, HoleResult, ScoreCardError, Tee, score_differential, totals,
    validate_holes,
};
use thiserror::Error;

use crate::ports::course_lookup::Course;

/// Rating inputs for the differential of one tee and hole count.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CourseRating {
    pub course_rating: f64,
    pub slope_rating: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScoredCard {
    pub holes: Vec<HoleResult>,
    pub total_score: u32,
    pub total_par: u32,
    pub score_differential: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    #[error("course has no rating for the {0} tee")]
    UnratedTee(Tee),
    #[error(transparent)]
    ScoreCard(#[from] ScoreCardError),
    #[error(transparent)]
    Differential(#[from] DifferentialError),
}

pub trait ScoringService {
    fn course_rating(
        &self,
        course: &Course,
        tee: Tee,
        hole_count: HoleCount,
    ) -> Result<CourseRating, ScoringError>;
    fn score_card(
        &self,
        holes: Vec<HoleResult>,
        hole_count: HoleCount,
        rating: CourseRating,
    ) -> Result<ScoredCard, ScoringError>;
}

pub struct ScoringServiceImpl;

impl ScoringServiceImpl {
    pub fn new() -> Self {
        Self {}
    }
}

impl ScoringService for ScoringServiceImpl {
    fn course_rating(
        &self,
        course: &Course,
        tee: Tee,
        hole_count: HoleCount,
    ) -> Result<CourseRating, ScoringError> {
        let (Some(&rating), Some(&slope)) = (course.rating.get(&tee), course.slope.get(&tee)) else {
            return Err(ScoringError::UnratedTee(tee));
        };
        // Nine hole rounds use half the eighteen hole rating but the full slope.
        let course_rating = match hole_count {
            HoleCount::Eighteen => rating,
            HoleCount::Nine => rating / 2.0,
        };
        Ok(CourseRating {
            course_rating,
            slope_rating: slope,
        })
    }

    fn score_card(
        &self,
        holes: Vec<HoleResult>,
        hole_count: HoleCount,
        rating: CourseRating,
    ) -> Result<ScoredCard, ScoringError> {
        validate_holes(&holes, hole_count)?;
        let totals = totals(&holes);
        let score_differential = score_differential(
            totals.total_score,
            rating.course_rating,
            rating.slope_rating,
            hole_count,
        )?;
        Ok(ScoredCard {
            holes,
            total_score: totals.total_score,
            total_par: totals.total_par,
            score_differential,
        })
    }
}
