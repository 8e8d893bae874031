use crate::config::Config;
use crate::records::RecordTable;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Mode {
    /// Fixed number of questions, ranked by points per second
    #[value(alias = "time-attack")]
    FixedCount,
    /// Answer as many as possible before the clock runs out
    #[value(alias = "survival")]
    FixedDuration,
}

impl Mode {
    pub const COUNT: usize = 2;
    pub const ALL: [Mode; Mode::COUNT] = [Mode::FixedCount, Mode::FixedDuration];

    pub fn index(self) -> usize {
        match self {
            Mode::FixedCount => 0,
            Mode::FixedDuration => 1,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Mode::FixedCount => "Time Attack",
            Mode::FixedDuration => "Survival",
        }
    }

    /// Form-style lookup. Unknown names have no mode to start.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "fixed_count" | "time_attack" => Some(Mode::FixedCount),
            "fixed_duration" | "3_minutes" | "survival" => Some(Mode::FixedDuration),
            _ => None,
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Difficulty {
    #[default]
    #[value(alias = "start")]
    Early,
    #[value(alias = "sprint")]
    Mid,
    #[value(alias = "final")]
    Late,
}

impl Difficulty {
    pub const COUNT: usize = 3;
    pub const ALL: [Difficulty; Difficulty::COUNT] =
        [Difficulty::Early, Difficulty::Mid, Difficulty::Late];

    pub fn index(self) -> usize {
        match self {
            Difficulty::Early => 0,
            Difficulty::Mid => 1,
            Difficulty::Late => 2,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Difficulty::Early => "Early",
            Difficulty::Mid => "Mid",
            Difficulty::Late => "Late",
        }
    }

    /// Form-style lookup; anything unrecognised plays as `Early`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "early" | "start" => Difficulty::Early,
            "mid" | "sprint" => Difficulty::Mid,
            "late" | "final" => Difficulty::Late,
            other => {
                tracing::warn!(difficulty = other, "unknown difficulty, falling back to early");
                Difficulty::Early
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModeCounters {
    FixedCount {
        /// 1-based index of the question being asked
        question_index: u32,
        correct: u32,
        wrong: u32,
        active_secs: f64,
        penalty_secs: f64,
    },
    FixedDuration {
        remaining_secs: f64,
        correct: u32,
        answered: u32,
    },
}

impl ModeCounters {
    pub fn fresh(mode: Mode, config: &Config) -> Self {
        match mode {
            Mode::FixedCount => ModeCounters::FixedCount {
                question_index: 1,
                correct: 0,
                wrong: 0,
                active_secs: 0.0,
                penalty_secs: 0.0,
            },
            Mode::FixedDuration => ModeCounters::FixedDuration {
                remaining_secs: config.survival_secs,
                correct: 0,
                answered: 0,
            },
        }
    }
}

/// The question currently on screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub number: u64,
    pub presented_at: SystemTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountSummary {
    pub difficulty: Difficulty,
    pub total_score: u64,
    pub efficiency_score: u64,
    pub active_secs: f64,
    pub penalty_secs: f64,
    pub total_secs: f64,
    pub correct: u32,
    pub questions: u32,
    pub new_high_score: bool,
    pub new_best_time: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurvivalSummary {
    pub difficulty: Difficulty,
    pub total_score: u64,
    pub correct: u32,
    pub answered: u32,
    pub new_high_score: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Completion {
    FixedCount(CountSummary),
    FixedDuration(SurvivalSummary),
}

impl Completion {
    pub fn mode(&self) -> Mode {
        match self {
            Completion::FixedCount(_) => Mode::FixedCount,
            Completion::FixedDuration(_) => Mode::FixedDuration,
        }
    }

    pub fn is_new_record(&self) -> bool {
        match self {
            Completion::FixedCount(s) => s.new_high_score || s.new_best_time,
            Completion::FixedDuration(s) => s.new_high_score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Phase {
    Active,
    Pending(Round),
    Complete(Completion),
}

/// One running mode instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub mode: Mode,
    pub difficulty: Difficulty,
    pub streak: u32,
    pub total_score: u64,
    pub counters: ModeCounters,
    pub phase: Phase,
}

impl SessionState {
    pub fn new(mode: Mode, difficulty: Difficulty, config: &Config) -> Self {
        Self {
            mode,
            difficulty,
            streak: 0,
            total_score: 0,
            counters: ModeCounters::fresh(mode, config),
            phase: Phase::Active,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.phase, Phase::Complete(_))
    }
}

/// Everything persisted for one player. No `state` means idle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerSession {
    pub state: Option<SessionState>,
    pub records: RecordTable,
}
