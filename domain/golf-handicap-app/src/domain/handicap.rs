pub const MAX_HANDICAP_INDEX: f64 = 54.0;
pub const MIN_HANDICAP_INDEX: f64 = 0.0;

/// Number of most recent rounds a handicap index is derived from.
pub const HANDICAP_WINDOW: usize = 20;

pub trait HandicapService {
    /// Handicap index for a set of score differentials, in any order.
    fn handicap_index(&self, differentials: &[f64]) -> f64;
    /// How many of the best differentials count when `available` are known.
    fn differentials_counted(&self, available: usize) -> usize;
    fn window_size(&self) -> usize;
}

pub struct HandicapServiceImpl;

impl HandicapServiceImpl {
    // (minimum available differentials, best differentials averaged)
    const COUNTED_DIFFERENTIALS: [(usize, usize); 8] = [
        (20, 8),
        (19, 7),
        (16, 6),
        (12, 5),
        (9, 4),
        (6, 3),
        (3, 2),
        (1, 1),
    ];

    pub fn new() -> Self {
        Self {}
    }

    fn round_to_tenth(value: f64) -> f64 {
        (value * 10.0).round() / 10.0
    }
}

impl HandicapService for HandicapServiceImpl {
    fn handicap_index(&self, differentials: &[f64]) -> f64 {
        if differentials.is_empty() {
            return MAX_HANDICAP_INDEX;
        }

        let mut sorted = differentials.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let counted = self.differentials_counted(sorted.len());
        let best = &sorted[..counted];
        let average = best.iter().sum::<f64>() / counted as f64;

        Self::round_to_tenth(average).clamp(MIN_HANDICAP_INDEX, MAX_HANDICAP_INDEX)
    }

    fn differentials_counted(&self, available: usize) -> usize {
        Self::COUNTED_DIFFERENTIALS
            .iter()
            .find(|(minimum, _)| available >= *minimum)
            .map(|(_, counted)| *counted)
            .unwrap_or(0)
    }

    fn window_size(&self) -> usize {
        HANDICAP_WINDOW
    }
}
