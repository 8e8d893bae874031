use crate::config::Config;
use crate::error::Result;
use crate::game::{self, AnswerReport, Flow, RoundView};
use crate::records::RecordTable;
use crate::runtime::{Clock, SystemClock};
use crate::session::{Completion, Difficulty, Mode};
use crate::store::{DifficultyHistory, RoundLogEntry, SessionStore};
use chrono::Local;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// The operations a front end drives.
///
/// Each call loads the player's session from the store, reads the clock once,
/// runs a single transition and writes the session back.
pub struct QuizService<S: SessionStore, C: Clock = SystemClock> {
    config: Config,
    store: S,
    clock: C,
    rng: StdRng,
}

impl<S: SessionStore> QuizService<S, SystemClock> {
    pub fn new(config: Config, store: S) -> Self {
        Self::with_clock(config, store, SystemClock)
    }
}

impl<S: SessionStore, C: Clock> QuizService<S, C> {
    pub fn with_clock(config: Config, store: S, clock: C) -> Self {
        Self {
            config,
            store,
            clock,
            rng: StdRng::from_entropy(),
        }
    }

    /// Make question generation reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn records(&self, player: &str) -> Result<RecordTable> {
        Ok(self.store.load(player)?.records)
    }

    pub fn history(&self, player: &str) -> Result<Vec<DifficultyHistory>> {
        self.store.history(player)
    }

    pub fn start_mode(&mut self, player: &str, mode: Mode, difficulty: Difficulty) -> Result<()> {
        let mut session = self.store.load(player)?;
        game::start(&mut session, mode, difficulty, &self.config);
        tracing::info!(player, %mode, %difficulty, "mode started");
        self.store.save(player, &session)
    }

    /// Start from free-form names, as a submitted form would carry them.
    /// Unknown difficulties play as early; an unknown mode sends the player back.
    pub fn start_from_form(&mut self, player: &str, mode: &str, difficulty: &str) -> Result<Flow<()>> {
        let Some(mode) = Mode::from_name(mode) else {
            tracing::warn!(player, mode, "unknown mode requested");
            return Ok(Flow::RedirectToStart);
        };
        let difficulty = Difficulty::from_name(difficulty);
        self.start_mode(player, mode, difficulty)?;
        Ok(Flow::Continue(()))
    }

    pub fn request_round(&mut self, player: &str) -> Result<Flow<RoundView>> {
        let mut session = self.store.load(player)?;
        let now = self.clock.now();
        let flow = game::next_round(&mut session, &self.config, now, &mut self.rng);
        if flow == Flow::RedirectToStart {
            tracing::warn!(player, "round requested with no active mode");
            return Ok(flow);
        }
        self.store.save(player, &session)?;
        Ok(flow)
    }

    pub fn submit_answer(&mut self, player: &str, answer: &str) -> Result<Flow<AnswerReport>> {
        let mut session = self.store.load(player)?;
        let now = self.clock.now();
        let flow = game::grade(&mut session, &self.config, answer, now);

        let Flow::Continue(report) = flow else {
            tracing::warn!(player, "answer submitted with no pending round");
            return Ok(Flow::RedirectToStart);
        };

        self.store.save(player, &session)?;
        if let Some(state) = session.state.as_ref() {
            let entry = RoundLogEntry {
                mode: state.mode,
                difficulty: state.difficulty,
                number: report.number,
                guess: report.guess,
                was_correct: report.is_correct,
                time_taken_ms: (report.time_taken_secs * 1000.0).round() as u64,
                timestamp: Local::now(),
            };
            self.store.record_round(player, &entry)?;
        }
        Ok(Flow::Continue(report))
    }

    pub fn completion(&self, player: &str) -> Result<Flow<Completion>> {
        let session = self.store.load(player)?;
        Ok(game::completion(&session))
    }
}
