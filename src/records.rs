use crate::session::{Difficulty, Mode};
use serde::{Deserialize, Serialize};

/// Stored best time before any all-correct time attack has been finished
pub const UNSET_BEST_TIME: f64 = 9999.0;

/// Best results for one player: a score slot per (mode, difficulty) and a
/// time slot per difficulty for time attack.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordTable {
    scores: [[u64; Difficulty::COUNT]; Mode::COUNT],
    times: [f64; Difficulty::COUNT],
}

impl Default for RecordTable {
    fn default() -> Self {
        Self {
            scores: [[0; Difficulty::COUNT]; Mode::COUNT],
            times: [UNSET_BEST_TIME; Difficulty::COUNT],
        }
    }
}

impl RecordTable {
    pub fn best_score(&self, mode: Mode, difficulty: Difficulty) -> u64 {
        self.scores[mode.index()][difficulty.index()]
    }

    /// `None` until a time has been set
    pub fn best_time(&self, difficulty: Difficulty) -> Option<f64> {
        let t = self.times[difficulty.index()];
        (t < UNSET_BEST_TIME).then_some(t)
    }

    pub fn try_update_score(&mut self, mode: Mode, difficulty: Difficulty, candidate: u64) -> bool {
        let slot = &mut self.scores[mode.index()][difficulty.index()];
        if candidate > *slot {
            *slot = candidate;
            true
        } else {
            false
        }
    }

    /// Only a run with every question answered correctly may set a time.
    pub fn try_update_time(&mut self, difficulty: Difficulty, candidate: f64, all_correct: bool) -> bool {
        let slot = &mut self.times[difficulty.index()];
        if all_correct && candidate < *slot {
            *slot = candidate;
            true
        } else {
            false
        }
    }
}
