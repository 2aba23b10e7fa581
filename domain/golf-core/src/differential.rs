use thiserror::Error;

use crate::HoleCount;

/// Slope rating of a course of standard difficulty.
pub const STANDARD_SLOPE: f64 = 113.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DifferentialError {
    #[error("slope rating must be positive, got {0}")]
    NonPositiveSlope(f64),
    #[error("course rating must be a finite number, got {0}")]
    NonFiniteRating(f64),
}

/// Normalizes a gross score against course difficulty.
///
/// Nine hole rounds are scaled to an eighteen hole equivalent by doubling both
/// the score and the supplied course rating, which must already be the nine
/// hole rating. The slope is used unchanged for both hole counts.
///
/// The result is not rounded.
pub fn score_differential(
    total_score: u32,
    course_rating: f64,
    slope_rating: f64,
    hole_count: HoleCount,
) -> Result<f64, DifferentialError> {
    if !slope_rating.is_finite() || slope_rating <= 0.0 {
        return Err(DifferentialError::NonPositiveSlope(slope_rating));
    }
    if !course_rating.is_finite() {
        return Err(DifferentialError::NonFiniteRating(course_rating));
    }

    let (adjusted_score, adjusted_rating) = match hole_count {
        HoleCount::Eighteen => (total_score as f64, course_rating),
        HoleCount::Nine => (total_score as f64 * 2.0, course_rating * 2.0),
    };

    Ok(((adjusted_score - adjusted_rating) * STANDARD_SLOPE) / slope_rating)
}
