use serde::{Deserialize, Serialize};

/// Combo multiplier, selected by the streak *after* a correct answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Multiplier {
    Base,
    Combo,
    Fever,
}

impl Multiplier {
    pub fn for_streak(streak: u32) -> Self {
        if streak >= 10 {
            Multiplier::Fever
        } else if streak >= 3 {
            Multiplier::Combo
        } else {
            Multiplier::Base
        }
    }

    /// Exact ratio, so `n * num / den` is `floor(n * factor)` without float drift
    fn ratio(self) -> (u64, u64) {
        match self {
            Multiplier::Base => (1, 1),
            Multiplier::Combo => (6, 5),
            Multiplier::Fever => (2, 1),
        }
    }

    pub fn label(self) -> Option<&'static str> {
        match self {
            Multiplier::Base => None,
            Multiplier::Combo => Some("×1.2"),
            Multiplier::Fever => Some("×2.0"),
        }
    }

    fn apply(self, n: u64) -> i64 {
        let (num, den) = self.ratio();
        (n.saturating_mul(num) / den).min(i64::MAX as u64) as i64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreOutcome {
    pub delta: i64,
    pub streak: u32,
    pub multiplier: Multiplier,
}

/// Score one graded round.
///
/// Correct answers extend the streak and earn `n` times the combo multiplier.
/// Wrong answers break the streak and cost half of `n`, truncated toward zero.
pub fn score_answer(is_correct: bool, n: u64, streak_before: u32) -> ScoreOutcome {
    if is_correct {
        let streak = streak_before.saturating_add(1);
        let multiplier = Multiplier::for_streak(streak);
        ScoreOutcome {
            delta: multiplier.apply(n),
            streak,
            multiplier,
        }
    } else {
        ScoreOutcome {
            delta: -((n / 2).min(i64::MAX as u64) as i64),
            streak: 0,
            multiplier: Multiplier::Base,
        }
    }
}

/// Running totals never drop below zero
pub fn apply_delta(total: u64, delta: i64) -> u64 {
    if delta >= 0 {
        total.saturating_add(delta as u64)
    } else {
        total.saturating_sub(delta.unsigned_abs())
    }
}

/// Time attack ranking metric: points per second, scaled by 100.
/// Total time is clamped to one second before dividing.
pub fn efficiency_score(total_score: u64, total_secs: f64) -> u64 {
    let secs = if total_secs.is_nan() {
        1.0
    } else {
        total_secs.max(1.0)
    };
    ((total_score as f64 / secs) * 100.0).floor() as u64
}
