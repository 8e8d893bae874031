use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::SystemTime;

use crate::celebration::Celebration;
use crate::error::Result;
use crate::game::{AnswerReport, Flow, QuestionView, RoundView};
use crate::records::RecordTable;
use crate::runtime::{Clock, SystemClock};
use crate::service::QuizService;
use crate::session::{Completion, Difficulty, Mode};
use crate::store::{DifficultyHistory, SessionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Menu,
    Question,
    Answer,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// Terminal front end over a [`QuizService`] for a single player
pub struct App<S: SessionStore, C: Clock = SystemClock> {
    pub service: QuizService<S, C>,
    pub player: String,
    pub state: AppState,
    pub mode: Mode,
    pub difficulty: Difficulty,
    pub question: Option<QuestionView>,
    pub report: Option<AnswerReport>,
    pub completion: Option<Completion>,
    pub records: RecordTable,
    pub history: Vec<DifficultyHistory>,
    pub celebration: Celebration,
    /// Shown on the menu after a redirect
    pub notice: Option<String>,
    shown_at: Option<SystemTime>,
    viewport: (u16, u16),
}

impl<S: SessionStore, C: Clock> App<S, C> {
    pub fn new(service: QuizService<S, C>, player: impl Into<String>) -> Result<Self> {
        let mut app = Self {
            service,
            player: player.into(),
            state: AppState::Menu,
            mode: Mode::FixedCount,
            difficulty: Difficulty::default(),
            question: None,
            report: None,
            completion: None,
            records: RecordTable::default(),
            history: Vec::new(),
            celebration: Celebration::new(),
            notice: None,
            shown_at: None,
            viewport: (80, 24),
        };
        app.refresh_records()?;
        Ok(app)
    }

    pub fn set_viewport(&mut self, width: u16, height: u16) {
        self.viewport = (width, height);
    }

    pub fn refresh_records(&mut self) -> Result<()> {
        self.records = self.service.records(&self.player)?;
        self.history = self.service.history(&self.player)?;
        Ok(())
    }

    /// Start the selected mode and show its first question
    pub fn start(&mut self) -> Result<()> {
        self.notice = None;
        self.report = None;
        self.completion = None;
        self.service
            .start_mode(&self.player, self.mode, self.difficulty)?;
        self.next_question()
    }

    fn next_question(&mut self) -> Result<()> {
        match self.service.request_round(&self.player)? {
            Flow::Continue(RoundView::Question(question)) => {
                self.question = Some(question);
                self.shown_at = Some(self.service.clock().now());
                self.state = AppState::Question;
            }
            Flow::Continue(RoundView::Complete(completion)) => self.finish(completion)?,
            Flow::RedirectToStart => self.back_to_menu(Some("No quiz in progress"))?,
        }
        Ok(())
    }

    fn answer(&mut self, answer: &str) -> Result<()> {
        match self.service.submit_answer(&self.player, answer)? {
            Flow::Continue(report) => {
                if let Some(completion) = report.completion.clone() {
                    self.record_completion(completion)?;
                }
                self.report = Some(report);
                self.state = AppState::Answer;
            }
            Flow::RedirectToStart => self.back_to_menu(Some("That question has expired"))?,
        }
        Ok(())
    }

    fn finish(&mut self, completion: Completion) -> Result<()> {
        self.record_completion(completion)?;
        self.state = AppState::Complete;
        Ok(())
    }

    fn record_completion(&mut self, completion: Completion) -> Result<()> {
        if let Some(text) = Celebration::headline(&completion) {
            let (width, height) = self.viewport;
            self.celebration.start(text, width, height);
        }
        self.completion = Some(completion);
        self.refresh_records()
    }

    fn back_to_menu(&mut self, notice: Option<&str>) -> Result<()> {
        self.state = AppState::Menu;
        self.question = None;
        self.report = None;
        self.notice = notice.map(str::to_string);
        self.refresh_records()
    }

    /// Seconds left on the survival clock as of now. Display only; expiry is
    /// decided when the answer is graded.
    pub fn display_remaining_secs(&self) -> Option<f64> {
        let question = self.question.as_ref()?;
        let remaining = question.remaining_secs?;
        if self.state != AppState::Question {
            return Some(remaining);
        }
        let shown_for = self
            .service
            .clock()
            .now()
            .duration_since(self.shown_at?)
            .unwrap_or_default()
            .as_secs_f64();
        Some((remaining - shown_for).max(0.0))
    }

    /// True while something on screen changes without input
    pub fn is_animating(&self) -> bool {
        self.celebration.is_active
            || (self.state == AppState::Question
                && self.question.as_ref().is_some_and(|q| q.remaining_secs.is_some()))
    }

    pub fn on_tick(&mut self) {
        self.celebration.update();
    }

    pub fn on_key(&mut self, key: KeyEvent) -> Result<Control> {
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            return Ok(Control::Quit);
        }

        match self.state {
            AppState::Menu => match key.code {
                KeyCode::Enter => self.start()?,
                KeyCode::Char('m') | KeyCode::Left | KeyCode::Right => {
                    self.mode = match self.mode {
                        Mode::FixedCount => Mode::FixedDuration,
                        Mode::FixedDuration => Mode::FixedCount,
                    };
                }
                KeyCode::Char(c @ '1'..='3') => {
                    let idx = c as usize - '1' as usize;
                    self.difficulty = Difficulty::ALL[idx];
                }
                _ => {}
            },
            AppState::Question => match key.code {
                KeyCode::Char('p') => self.answer("prime")?,
                KeyCode::Char('c') => self.answer("composite")?,
                _ => {}
            },
            AppState::Answer => {
                if key.code == KeyCode::Enter {
                    match self.report.as_ref().and_then(|r| r.completion.clone()) {
                        Some(_) => self.state = AppState::Complete,
                        None => self.next_question()?,
                    }
                }
            }
            AppState::Complete => {
                if key.code == KeyCode::Enter {
                    self.completion = None;
                    self.celebration = Celebration::new();
                    self.back_to_menu(None)?;
                }
            }
        }

        Ok(Control::Continue)
    }
}
