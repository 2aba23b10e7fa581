use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

use crate::HoleCount;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct HoleResult {
    #[validate(range(min = 1, max = 18))]
    pub hole_number: u8,
    #[validate(range(min = 3, max = 6))]
    pub par: u8,
    #[validate(range(min = 1))]
    pub strokes: u8,
}

impl HoleResult {
    pub fn new(hole_number: u8, par: u8, strokes: u8) -> Self {
        Self {
            hole_number,
            par,
            strokes,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScoreTotals {
    pub total_score: u32,
    pub total_par: u32,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreCardError {
    #[error("expected {expected} holes, got {actual}")]
    WrongHoleCount { expected: usize, actual: usize },
    #[error("hole {hole_number} is invalid: {reason}")]
    InvalidHole { hole_number: u8, reason: String },
    #[error("hole {0} appears more than once")]
    DuplicateHole(u8),
}

pub fn totals(holes: &[HoleResult]) -> ScoreTotals {
    ScoreTotals {
        total_score: holes.iter().map(|h| h.strokes as u32).sum(),
        total_par: holes.iter().map(|h| h.par as u32).sum(),
    }
}

pub fn validate_holes(holes: &[HoleResult], hole_count: HoleCount) -> Result<(), ScoreCardError> {
    if holes.len() != hole_count.holes() {
        return Err(ScoreCardError::WrongHoleCount {
            expected: hole_count.holes(),
            actual: holes.len(),
        });
    }

    let mut seen = HashSet::new();
    for hole in holes {
        if let Err(e) = hole.validate() {
            return Err(ScoreCardError::InvalidHole {
                hole_number: hole.hole_number,
                reason: e.to_string(),
            });
        }
        if !seen.insert(hole.hole_number) {
            return Err(ScoreCardError::DuplicateHole(hole.hole_number));
        }
    }
    Ok(())
}

/// Copies the hole layout with every hole scored at par.
pub fn par_default(holes: &[HoleResult]) -> Vec<HoleResult> {
    holes
        .iter()
        .map(|h| HoleResult::new(h.hole_number, h.par, h.par))
        .collect()
}
