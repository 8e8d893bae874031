//! Transitions of one player's quiz session.
//!
//! Every transition takes the player's [`PlayerSession`] explicitly along with
//! the wall-clock reading for the request, so a caller reads the clock once and
//! the same instant is used for every elapsed-time computation in the step.
//!
//! ```text
//! Idle --start--> Active --next_round--> Pending --grade--> Active | Complete
//! ```
//!
//! Survival expiry is lazy: nothing ticks in the background, the remaining
//! budget is only charged when an answer is graded and only checked when the
//! next round is requested.

use crate::config::Config;
use crate::factor::{Classification, Factorization};
use crate::generator::generate_question;
use crate::records::RecordTable;
use crate::scoring::{apply_delta, efficiency_score, score_answer, Multiplier};
use crate::session::{
    Completion, CountSummary, Difficulty, Mode, ModeCounters, Phase, PlayerSession, Round,
    SessionState, SurvivalSummary,
};
use rand::Rng;
use std::time::SystemTime;

/// Result of an inbound operation: either a value to show, or the session had
/// nothing to act on and the caller should send the player back to the start.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow<T> {
    Continue(T),
    RedirectToStart,
}

impl<T> Flow<T> {
    pub fn continued(self) -> Option<T> {
        match self {
            Flow::Continue(v) => Some(v),
            Flow::RedirectToStart => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionView {
    pub number: u64,
    pub mode: Mode,
    pub difficulty: Difficulty,
    pub streak: u32,
    pub total_score: u64,
    /// Time attack only
    pub question_index: Option<u32>,
    pub total_questions: u32,
    /// Survival only
    pub remaining_secs: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RoundView {
    Question(QuestionView),
    Complete(Completion),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnswerReport {
    pub number: u64,
    pub guess: Option<Classification>,
    pub answer: Classification,
    pub is_correct: bool,
    pub factors: Vec<u64>,
    pub breakdown: String,
    pub time_taken_secs: f64,
    pub delta: i64,
    pub multiplier: Multiplier,
    pub streak: u32,
    pub total_score: u64,
    /// Index of the next time attack question
    pub question_index: Option<u32>,
    pub total_questions: u32,
    pub remaining_secs: Option<f64>,
    pub completion: Option<Completion>,
}

impl AnswerReport {
    pub fn bonus(&self) -> Option<&'static str> {
        if self.is_correct {
            self.multiplier.label()
        } else {
            None
        }
    }

    pub fn is_count_complete(&self) -> bool {
        matches!(self.completion, Some(Completion::FixedCount(_)))
    }

    pub fn is_time_up(&self) -> bool {
        matches!(self.completion, Some(Completion::FixedDuration(_)))
    }
}

/// Begin a new mode instance, discarding whatever was in progress.
pub fn start(session: &mut PlayerSession, mode: Mode, difficulty: Difficulty, config: &Config) {
    session.state = Some(SessionState::new(mode, difficulty, config));
}

pub fn next_round<R: Rng + ?Sized>(
    session: &mut PlayerSession,
    config: &Config,
    now: SystemTime,
    rng: &mut R,
) -> Flow<RoundView> {
    let PlayerSession { state, records } = session;
    let Some(state) = state.as_mut() else {
        return Flow::RedirectToStart;
    };

    if let Phase::Complete(completion) = &state.phase {
        return Flow::Continue(RoundView::Complete(completion.clone()));
    }

    if let ModeCounters::FixedDuration { remaining_secs, .. } = &mut state.counters {
        if *remaining_secs <= 0.0 {
            *remaining_secs = 0.0;
            let completion = complete(state, records, config);
            return Flow::Continue(RoundView::Complete(completion));
        }
    }

    let number = generate_question(config.range_for(state.difficulty), rng);
    state.phase = Phase::Pending(Round {
        number,
        presented_at: now,
    });
    tracing::debug!(number, mode = %state.mode, difficulty = %state.difficulty, "round presented");

    let (question_index, remaining_secs) = match state.counters {
        ModeCounters::FixedCount { question_index, .. } => (Some(question_index), None),
        ModeCounters::FixedDuration { remaining_secs, .. } => (None, Some(remaining_secs)),
    };

    Flow::Continue(RoundView::Question(QuestionView {
        number,
        mode: state.mode,
        difficulty: state.difficulty,
        streak: state.streak,
        total_score: state.total_score,
        question_index,
        total_questions: config.question_count,
        remaining_secs,
    }))
}

/// Grade `answer` against the pending round, consuming it.
pub fn grade(
    session: &mut PlayerSession,
    config: &Config,
    answer: &str,
    now: SystemTime,
) -> Flow<AnswerReport> {
    let PlayerSession { state, records } = session;
    let Some(state) = state.as_mut() else {
        return Flow::RedirectToStart;
    };

    let round = match std::mem::replace(&mut state.phase, Phase::Active) {
        Phase::Pending(round) => round,
        other => {
            state.phase = other;
            return Flow::RedirectToStart;
        }
    };

    let factorization = Factorization::of(round.number);
    let correct_answer = factorization.classification();
    let guess = Classification::from_answer(answer);
    let is_correct = guess == Some(correct_answer);
    let time_taken_secs = now
        .duration_since(round.presented_at)
        .unwrap_or_default()
        .as_secs_f64();

    let outcome = score_answer(is_correct, round.number, state.streak);
    state.streak = outcome.streak;
    state.total_score = apply_delta(state.total_score, outcome.delta);

    let finished = match &mut state.counters {
        ModeCounters::FixedCount {
            question_index,
            correct,
            wrong,
            active_secs,
            penalty_secs,
        } => {
            *active_secs += time_taken_secs;
            if is_correct {
                *correct += 1;
            } else {
                *wrong += 1;
                *penalty_secs += config.penalty_secs;
            }
            let asked = *question_index;
            *question_index += 1;
            asked >= config.question_count
        }
        ModeCounters::FixedDuration {
            remaining_secs,
            correct,
            answered,
        } => {
            *answered += 1;
            if is_correct {
                *correct += 1;
            }
            *remaining_secs -= time_taken_secs;
            if *remaining_secs <= 0.0 {
                *remaining_secs = 0.0;
                true
            } else {
                false
            }
        }
    };

    tracing::debug!(
        number = round.number,
        is_correct,
        delta = outcome.delta,
        streak = state.streak,
        total = state.total_score,
        "round graded"
    );

    let completion = finished.then(|| complete(state, records, config));

    let (question_index, remaining_secs) = match state.counters {
        ModeCounters::FixedCount { question_index, .. } => (Some(question_index), None),
        ModeCounters::FixedDuration { remaining_secs, .. } => (None, Some(remaining_secs)),
    };

    Flow::Continue(AnswerReport {
        number: round.number,
        guess,
        answer: correct_answer,
        is_correct,
        breakdown: factorization.breakdown(),
        factors: factorization.factors,
        time_taken_secs,
        delta: outcome.delta,
        multiplier: outcome.multiplier,
        streak: state.streak,
        total_score: state.total_score,
        question_index,
        total_questions: config.question_count,
        remaining_secs,
        completion,
    })
}

/// The summary of a finished mode instance
pub fn completion(session: &PlayerSession) -> Flow<Completion> {
    match session.state.as_ref().map(|s| &s.phase) {
        Some(Phase::Complete(completion)) => Flow::Continue(completion.clone()),
        _ => Flow::RedirectToStart,
    }
}

/// Move `state` into its terminal phase and offer the result to the records.
/// Runs once per mode instance.
fn complete(state: &mut SessionState, records: &mut RecordTable, config: &Config) -> Completion {
    let completion = match state.counters {
        ModeCounters::FixedCount {
            correct,
            active_secs,
            penalty_secs,
            ..
        } => Completion::FixedCount(settle_fixed_count(
            state.difficulty,
            state.total_score,
            correct,
            active_secs,
            penalty_secs,
            records,
            config,
        )),
        ModeCounters::FixedDuration {
            correct, answered, ..
        } => {
            let new_high_score =
                records.try_update_score(Mode::FixedDuration, state.difficulty, state.total_score);
            Completion::FixedDuration(SurvivalSummary {
                difficulty: state.difficulty,
                total_score: state.total_score,
                correct,
                answered,
                new_high_score,
            })
        }
    };

    tracing::info!(
        mode = %state.mode,
        difficulty = %state.difficulty,
        total = state.total_score,
        new_record = completion.is_new_record(),
        "mode complete"
    );
    state.phase = Phase::Complete(completion.clone());
    completion
}

fn settle_fixed_count(
    difficulty: Difficulty,
    total_score: u64,
    correct: u32,
    active_secs: f64,
    penalty_secs: f64,
    records: &mut RecordTable,
    config: &Config,
) -> CountSummary {
    let total_secs = active_secs + penalty_secs;
    let efficiency = efficiency_score(total_score, total_secs);
    let new_high_score = records.try_update_score(Mode::FixedCount, difficulty, efficiency);
    let all_correct = correct >= config.question_count;
    let new_best_time = records.try_update_time(difficulty, total_secs, all_correct);

    CountSummary {
        difficulty,
        total_score,
        efficiency_score: efficiency,
        active_secs,
        penalty_secs,
        total_secs,
        correct,
        questions: config.question_count,
        new_high_score,
        new_best_time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factor::factorize;
    use assert_matches::assert_matches;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Duration;

    fn t(secs: f64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000) + Duration::from_secs_f64(secs)
    }

    fn right_answer(n: u64) -> &'static str {
        if factorize(n).len() == 1 {
            "prime"
        } else {
            "composite"
        }
    }

    fn wrong_answer(n: u64) -> &'static str {
        if factorize(n).len() == 1 {
            "composite"
        } else {
            "prime"
        }
    }

    fn present(session: &mut PlayerSession, config: &Config, now: SystemTime, rng: &mut StdRng) -> u64 {
        match next_round(session, config, now, rng) {
            Flow::Continue(RoundView::Question(q)) => q.number,
            other => panic!("expected a question, got {other:?}"),
        }
    }

    fn pending(session: &mut PlayerSession, number: u64, at: SystemTime) {
        session.state.as_mut().unwrap().phase = Phase::Pending(Round {
            number,
            presented_at: at,
        });
    }

    #[test]
    fn test_idle_session_redirects() {
        let config = Config::default();
        let mut rng = StdRng::seed_from_u64(1);
        let mut session = PlayerSession::default();

        assert_eq!(next_round(&mut session, &config, t(0.0), &mut rng), Flow::RedirectToStart);
        assert_eq!(grade(&mut session, &config, "prime", t(0.0)), Flow::RedirectToStart);
        assert_eq!(completion(&session), Flow::RedirectToStart);
    }

    #[test]
    fn test_start_resets_progress() {
        let config = Config::default();
        let mut session = PlayerSession::default();
        start(&mut session, Mode::FixedCount, Difficulty::Mid, &config);
        {
            let state = session.state.as_mut().unwrap();
            state.streak = 4;
            state.total_score = 900;
        }

        start(&mut session, Mode::FixedDuration, Difficulty::Late, &config);
        let state = session.state.as_ref().unwrap();
        assert_eq!(state.mode, Mode::FixedDuration);
        assert_eq!(state.difficulty, Difficulty::Late);
        assert_eq!(state.streak, 0);
        assert_eq!(state.total_score, 0);
        assert_eq!(state.phase, Phase::Active);
    }

    #[test]
    fn test_question_view_reflects_state() {
        let config = Config::default();
        let mut rng = StdRng::seed_from_u64(3);
        let mut session = PlayerSession::default();
        start(&mut session, Mode::FixedCount, Difficulty::Late, &config);

        match next_round(&mut session, &config, t(0.0), &mut rng) {
            Flow::Continue(RoundView::Question(q)) => {
                assert!(config.late.contains(q.number));
                assert_eq!(q.question_index, Some(1));
                assert_eq!(q.total_questions, 10);
                assert_eq!(q.remaining_secs, None);
                assert_eq!(q.streak, 0);
                assert_eq!(q.total_score, 0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_round_consumed_once() {
        let config = Config::default();
        let mut rng = StdRng::seed_from_u64(9);
        let mut session = PlayerSession::default();
        start(&mut session, Mode::FixedCount, Difficulty::Early, &config);

        let n = present(&mut session, &config, t(0.0), &mut rng);
        assert_matches!(grade(&mut session, &config, right_answer(n), t(1.0)), Flow::Continue(_));
        assert_eq!(grade(&mut session, &config, right_answer(n), t(2.0)), Flow::RedirectToStart);
    }

    #[test]
    fn test_correct_prime_scores_face_value() {
        let config = Config::default();
        let mut session = PlayerSession::default();
        start(&mut session, Mode::FixedCount, Difficulty::Early, &config);
        pending(&mut session, 97, t(0.0));

        let report = grade(&mut session, &config, "prime", t(2.5)).continued().unwrap();
        assert!(report.is_correct);
        assert_eq!(report.answer, Classification::Prime);
        assert_eq!(report.delta, 97);
        assert_eq!(report.streak, 1);
        assert_eq!(report.total_score, 97);
        assert_eq!(report.bonus(), None);
        assert_eq!(report.breakdown, "97 is prime");
        assert_eq!(report.question_index, Some(2));
        assert_eq!(report.time_taken_secs, 2.5);
        assert!(report.completion.is_none());
    }

    #[test]
    fn test_malformed_answer_is_wrong() {
        let config = Config::default();
        let mut session = PlayerSession::default();
        start(&mut session, Mode::FixedCount, Difficulty::Early, &config);
        session.state.as_mut().unwrap().total_score = 100;
        pending(&mut session, 91, t(0.0));

        let report = grade(&mut session, &config, "maybe", t(1.0)).continued().unwrap();
        assert!(!report.is_correct);
        assert_eq!(report.guess, None);
        assert_eq!(report.delta, -45);
        assert_eq!(report.total_score, 55);
        assert_eq!(report.breakdown, "91 = 7 * 13");
        match session.state.unwrap().counters {
            ModeCounters::FixedCount {
                wrong,
                penalty_secs,
                ..
            } => {
                assert_eq!(wrong, 1);
                assert_eq!(penalty_secs, 10.0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_fixed_count_completes_after_ten_rounds() {
        let config = Config::default();
        let mut rng = StdRng::seed_from_u64(11);
        let mut session = PlayerSession::default();
        start(&mut session, Mode::FixedCount, Difficulty::Mid, &config);

        let mut now = 0.0;
        let mut wrong = 0;
        for i in 0..10 {
            let n = present(&mut session, &config, t(now), &mut rng);
            now += 2.0;
            let answer = if i % 3 == 0 {
                wrong += 1;
                wrong_answer(n)
            } else {
                right_answer(n)
            };
            let report = grade(&mut session, &config, answer, t(now)).continued().unwrap();
            // thinking time between rounds is not charged
            now += 5.0;
            assert_eq!(report.is_count_complete(), i == 9);
        }

        let summary = match completion(&session) {
            Flow::Continue(Completion::FixedCount(s)) => s,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(wrong, 4);
        assert_eq!(summary.correct, 6);
        assert_eq!(summary.questions, 10);
        assert!((summary.active_secs - 20.0).abs() < 1e-9);
        assert_eq!(summary.penalty_secs, 40.0);
        assert!((summary.total_secs - 60.0).abs() < 1e-9);
        assert!(!summary.new_best_time);
        assert_eq!(
            session.records.best_score(Mode::FixedCount, Difficulty::Mid),
            summary.efficiency_score
        );
    }

    #[test]
    fn test_completed_fixed_count_returns_summary_on_next_request() {
        let config = Config {
            question_count: 1,
            ..Config::default()
        };
        let mut rng = StdRng::seed_from_u64(5);
        let mut session = PlayerSession::default();
        start(&mut session, Mode::FixedCount, Difficulty::Early, &config);
        let n = present(&mut session, &config, t(0.0), &mut rng);
        let report = grade(&mut session, &config, right_answer(n), t(4.0)).continued().unwrap();
        let done = report.completion.unwrap();

        assert_eq!(
            next_round(&mut session, &config, t(10.0), &mut rng),
            Flow::Continue(RoundView::Complete(done.clone()))
        );
        assert_eq!(grade(&mut session, &config, "prime", t(11.0)), Flow::RedirectToStart);
        assert_eq!(completion(&session), Flow::Continue(done));
    }

    #[test]
    fn test_equal_efficiency_is_not_a_high_score() {
        let config = Config::default();
        let mut session = PlayerSession::default();
        session
            .records
            .try_update_score(Mode::FixedCount, Difficulty::Mid, 500);
        start(&mut session, Mode::FixedCount, Difficulty::Mid, &config);
        {
            let state = session.state.as_mut().unwrap();
            state.total_score = 903;
            state.counters = ModeCounters::FixedCount {
                question_index: 10,
                correct: 9,
                wrong: 0,
                active_secs: 190.0,
                penalty_secs: 0.0,
            };
        }
        pending(&mut session, 97, t(0.0));

        let report = grade(&mut session, &config, "prime", t(10.0)).continued().unwrap();
        let summary = match report.completion {
            Some(Completion::FixedCount(s)) => s,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(summary.total_score, 1000);
        assert_eq!(summary.total_secs, 200.0);
        assert_eq!(summary.efficiency_score, 500);
        assert!(!summary.new_high_score);
        assert!(summary.new_best_time);
        assert_eq!(session.records.best_score(Mode::FixedCount, Difficulty::Mid), 500);
        assert_eq!(session.records.best_time(Difficulty::Mid), Some(200.0));
    }

    #[test]
    fn test_survival_charges_answer_time_only() {
        let config = Config::default();
        let mut rng = StdRng::seed_from_u64(21);
        let mut session = PlayerSession::default();
        start(&mut session, Mode::FixedDuration, Difficulty::Early, &config);

        let n = present(&mut session, &config, t(0.0), &mut rng);
        let report = grade(&mut session, &config, right_answer(n), t(30.0)).continued().unwrap();
        assert_eq!(report.remaining_secs, Some(150.0));
        assert!(!report.is_time_up());

        match next_round(&mut session, &config, t(500.0), &mut rng) {
            Flow::Continue(RoundView::Question(q)) => assert_eq!(q.remaining_secs, Some(150.0)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_survival_time_up_clamps_to_zero() {
        let config = Config::default();
        let mut rng = StdRng::seed_from_u64(22);
        let mut session = PlayerSession::default();
        start(&mut session, Mode::FixedDuration, Difficulty::Early, &config);

        let n = present(&mut session, &config, t(0.0), &mut rng);
        let report = grade(&mut session, &config, right_answer(n), t(175.0)).continued().unwrap();
        assert_eq!(report.remaining_secs, Some(5.0));

        let n = present(&mut session, &config, t(200.0), &mut rng);
        let report = grade(&mut session, &config, wrong_answer(n), t(260.0)).continued().unwrap();
        assert_eq!(report.remaining_secs, Some(0.0));
        assert!(report.is_time_up());

        let summary = match report.completion.clone() {
            Some(Completion::FixedDuration(s)) => s,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(summary.answered, 2);
        assert_eq!(summary.correct, 1);
        assert_eq!(summary.new_high_score, summary.total_score > 0);

        for later in [261.0, 1000.0] {
            assert_matches!(
                next_round(&mut session, &config, t(later), &mut rng),
                Flow::Continue(RoundView::Complete(Completion::FixedDuration(_)))
            );
        }
        match session.state.unwrap().counters {
            ModeCounters::FixedDuration { remaining_secs, .. } => assert_eq!(remaining_secs, 0.0),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_survival_request_with_exhausted_budget_completes() {
        let config = Config::default();
        let mut rng = StdRng::seed_from_u64(23);
        let mut session = PlayerSession::default();
        start(&mut session, Mode::FixedDuration, Difficulty::Mid, &config);
        session.state.as_mut().unwrap().counters = ModeCounters::FixedDuration {
            remaining_secs: -3.0,
            correct: 0,
            answered: 4,
        };

        assert_matches!(
            next_round(&mut session, &config, t(0.0), &mut rng),
            Flow::Continue(RoundView::Complete(Completion::FixedDuration(SurvivalSummary {
                answered: 4,
                new_high_score: false,
                ..
            })))
        );
        match &session.state.as_ref().unwrap().counters {
            ModeCounters::FixedDuration { remaining_secs, .. } => assert_eq!(*remaining_secs, 0.0),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_survival_high_score_is_raw_total() {
        let config = Config::default();
        let mut session = PlayerSession::default();
        start(&mut session, Mode::FixedDuration, Difficulty::Late, &config);
        session.state.as_mut().unwrap().total_score = 4000;
        session.state.as_mut().unwrap().counters = ModeCounters::FixedDuration {
            remaining_secs: 1.0,
            correct: 3,
            answered: 3,
        };
        pending(&mut session, 10007, t(0.0));

        let report = grade(&mut session, &config, "prime", t(2.0)).continued().unwrap();
        assert!(report.is_time_up());
        assert_eq!(report.total_score, 14007);
        assert_eq!(
            session.records.best_score(Mode::FixedDuration, Difficulty::Late),
            14007
        );
        assert_eq!(session.records.best_score(Mode::FixedCount, Difficulty::Late), 0);
    }

    #[test]
    fn test_clock_going_backwards_counts_as_zero_elapsed() {
        let config = Config::default();
        let mut session = PlayerSession::default();
        start(&mut session, Mode::FixedDuration, Difficulty::Early, &config);
        pending(&mut session, 97, t(10.0));

        let report = grade(&mut session, &config, "prime", t(5.0)).continued().unwrap();
        assert_eq!(report.time_taken_secs, 0.0);
        assert_eq!(report.remaining_secs, Some(180.0));
    }

    #[test]
    fn test_combo_bonus_label() {
        let config = Config::default();
        let mut session = PlayerSession::default();
        start(&mut session, Mode::FixedDuration, Difficulty::Early, &config);
        session.state.as_mut().unwrap().streak = 9;
        pending(&mut session, 101, t(0.0));

        let report = grade(&mut session, &config, "prime", t(1.0)).continued().unwrap();
        assert_eq!(report.streak, 10);
        assert_eq!(report.bonus(), Some("×2.0"));
        assert_eq!(report.delta, 202);
    }
}
