use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};

use crate::app::{App, AppState};
use crate::game::AnswerReport;
use crate::runtime::Clock;
use crate::session::{Completion, Mode};
use crate::store::SessionStore;
use crate::ui::records::{history_lines, records_table};
use crate::util::{format_delta, format_secs};

const HORIZONTAL_MARGIN: u16 = 5;

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

fn key_hint(keys: &str, action: &str) -> Vec<Span<'static>> {
    vec![
        Span::styled(format!("({keys})"), bold().add_modifier(Modifier::DIM)),
        Span::styled(format!(" {action}  "), dim().add_modifier(Modifier::ITALIC)),
    ]
}

/// A UI screen boundary: renders one [`AppState`]
pub trait Screen<S: SessionStore, C: Clock> {
    fn render(&self, app: &App<S, C>, area: Rect, buf: &mut Buffer);
}

pub struct MenuScreen;

impl<S: SessionStore, C: Clock> Screen<S, C> for MenuScreen {
    fn render(&self, app: &App<S, C>, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(1)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(6),
                Constraint::Min(4),
                Constraint::Length(1),
            ])
            .split(area);

        let mut title = vec![
            Line::from(Span::styled(
                "PRIME OR COMPOSITE?",
                bold().fg(Color::Magenta),
            )),
            Line::from(Span::styled(format!("player: {}", app.player), dim())),
        ];
        if let Some(notice) = &app.notice {
            title.push(Line::from(Span::styled(
                notice.clone(),
                Style::default().fg(Color::Yellow),
            )));
        }
        Paragraph::new(title)
            .alignment(Alignment::Center)
            .render(chunks[0], buf);

        let range = app.service.config().range_for(app.difficulty);
        let selection = vec![
            Line::from(vec![
                Span::styled("Mode: ", dim()),
                Span::styled(app.mode.title(), bold().fg(Color::Cyan)),
                Span::styled(
                    match app.mode {
                        Mode::FixedCount => format!(
                            "  {} questions, {}s per miss",
                            app.service.config().question_count,
                            app.service.config().penalty_secs
                        ),
                        Mode::FixedDuration => {
                            format!("  {} on the clock", format_secs(app.service.config().survival_secs))
                        }
                    },
                    dim(),
                ),
            ]),
            Line::from(vec![
                Span::styled("Difficulty: ", dim()),
                Span::styled(app.difficulty.title(), bold().fg(Color::Cyan)),
                Span::styled(format!("  {}..={}", range.min, range.max), dim()),
            ]),
        ];
        Paragraph::new(selection)
            .alignment(Alignment::Center)
            .render(chunks[1], buf);

        records_table(&app.records, app.difficulty).render(chunks[2], buf);

        let mut history = vec![Line::from(Span::styled("History", bold()))];
        history.extend(history_lines(&app.history));
        Paragraph::new(history).render(chunks[3], buf);

        let mut hints = key_hint("enter", "start");
        hints.extend(key_hint("m", "mode"));
        hints.extend(key_hint("1-3", "difficulty"));
        hints.extend(key_hint("esc", "quit"));
        Paragraph::new(Line::from(hints))
            .alignment(Alignment::Center)
            .render(chunks[4], buf);
    }
}

pub struct QuestionScreen;

impl<S: SessionStore, C: Clock> Screen<S, C> for QuestionScreen {
    fn render(&self, app: &App<S, C>, area: Rect, buf: &mut Buffer) {
        let Some(question) = &app.question else {
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(1),
                Constraint::Length(3),
                Constraint::Min(1),
                Constraint::Length(1),
            ])
            .split(area);

        let progress = match (question.question_index, app.display_remaining_secs()) {
            (Some(index), _) => format!("Question {}/{}", index, question.total_questions),
            (None, Some(remaining)) => format!("{} left", format_secs(remaining)),
            (None, None) => String::new(),
        };
        let status = Line::from(vec![
            Span::styled(progress, bold().fg(Color::Cyan)),
            Span::styled(
                format!("   score {}   streak {}", question.total_score, question.streak),
                dim(),
            ),
        ]);
        Paragraph::new(status)
            .alignment(Alignment::Center)
            .render(chunks[0], buf);

        Paragraph::new(vec![
            Line::from(Span::styled(question.number.to_string(), bold().fg(Color::Yellow))),
            Line::from(""),
            Line::from(Span::styled("prime or composite?", dim())),
        ])
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

        let mut hints = key_hint("p", "prime");
        hints.extend(key_hint("c", "composite"));
        hints.extend(key_hint("esc", "quit"));
        Paragraph::new(Line::from(hints))
            .alignment(Alignment::Center)
            .render(chunks[4], buf);
    }
}

pub struct AnswerScreen;

fn verdict(report: &AnswerReport) -> Line<'static> {
    let (mark, style) = if report.is_correct {
        ("✓ correct", bold().fg(Color::Green))
    } else {
        ("✗ wrong", bold().fg(Color::Red))
    };
    let mut spans = vec![
        Span::styled(mark, style),
        Span::styled(format!("  {}", format_delta(report.delta)), bold()),
    ];
    if let Some(bonus) = report.bonus() {
        spans.push(Span::styled(format!("  {bonus}"), bold().fg(Color::Magenta)));
    }
    Line::from(spans)
}

impl<S: SessionStore, C: Clock> Screen<S, C> for AnswerScreen {
    fn render(&self, app: &App<S, C>, area: Rect, buf: &mut Buffer) {
        let Some(report) = &app.report else {
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Min(1),
                Constraint::Length(6),
                Constraint::Min(1),
                Constraint::Length(1),
            ])
            .split(area);

        let progress = match (report.question_index, report.remaining_secs) {
            // index has already moved past the graded question
            (Some(next), _) => format!(
                "answered {}/{}",
                next.saturating_sub(1).min(report.total_questions),
                report.total_questions
            ),
            (None, Some(remaining)) => format!("{} left", format_secs(remaining)),
            (None, None) => String::new(),
        };

        let lines = vec![
            verdict(report),
            Line::from(""),
            Line::from(Span::styled(report.breakdown.clone(), bold().fg(Color::Yellow))),
            Line::from(Span::styled(
                format!("answered in {}", format_secs(report.time_taken_secs)),
                dim(),
            )),
            Line::from(""),
            Line::from(Span::styled(
                format!(
                    "score {}   streak {}   {}",
                    report.total_score, report.streak, progress
                ),
                dim(),
            )),
        ];
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(chunks[1], buf);

        let action = if report.completion.is_some() {
            "results"
        } else {
            "next"
        };
        let mut hints = key_hint("enter", action);
        hints.extend(key_hint("esc", "quit"));
        Paragraph::new(Line::from(hints))
            .alignment(Alignment::Center)
            .render(chunks[3], buf);
    }
}

pub struct CompleteScreen;

fn record_flag(set: bool, label: &str) -> Option<Line<'static>> {
    set.then(|| {
        Line::from(Span::styled(
            format!("★ new {label}"),
            bold().fg(Color::Yellow),
        ))
    })
}

impl<S: SessionStore, C: Clock> Screen<S, C> for CompleteScreen {
    fn render(&self, app: &App<S, C>, area: Rect, buf: &mut Buffer) {
        let Some(completion) = &app.completion else {
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Min(1),
                Constraint::Length(10),
                Constraint::Min(1),
                Constraint::Length(1),
            ])
            .split(area);

        let mut lines = match completion {
            Completion::FixedCount(s) => {
                let mut lines = vec![
                    Line::from(Span::styled(
                        format!("Time Attack · {}", s.difficulty.title()),
                        bold().fg(Color::Cyan),
                    )),
                    Line::from(""),
                    Line::from(vec![
                        Span::styled("efficiency ", dim()),
                        Span::styled(s.efficiency_score.to_string(), bold()),
                        Span::styled(format!("   score {}", s.total_score), dim()),
                    ]),
                    Line::from(Span::styled(
                        format!(
                            "{} answering + {} penalty = {}",
                            format_secs(s.active_secs),
                            format_secs(s.penalty_secs),
                            format_secs(s.total_secs)
                        ),
                        dim(),
                    )),
                    Line::from(Span::styled(
                        format!("{}/{} correct", s.correct, s.questions),
                        dim(),
                    )),
                    Line::from(""),
                ];
                lines.extend(record_flag(s.new_high_score, "high score"));
                lines.extend(record_flag(s.new_best_time, "best time"));
                lines
            }
            Completion::FixedDuration(s) => {
                let mut lines = vec![
                    Line::from(Span::styled(
                        format!("Survival · {}", s.difficulty.title()),
                        bold().fg(Color::Cyan),
                    )),
                    Line::from(""),
                    Line::from(vec![
                        Span::styled("score ", dim()),
                        Span::styled(s.total_score.to_string(), bold()),
                    ]),
                    Line::from(Span::styled(
                        format!("{}/{} correct", s.correct, s.answered),
                        dim(),
                    )),
                    Line::from(""),
                ];
                lines.extend(record_flag(s.new_high_score, "high score"));
                lines
            }
        };
        if !completion.is_new_record() {
            lines.push(Line::from(Span::styled("no new record", dim())));
        }

        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .render(chunks[1], buf);

        let mut hints = key_hint("enter", "menu");
        hints.extend(key_hint("esc", "quit"));
        Paragraph::new(Line::from(hints))
            .alignment(Alignment::Center)
            .render(chunks[3], buf);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen<S: SessionStore, C: Clock>(state: AppState) -> Box<dyn Screen<S, C>> {
    match state {
        AppState::Menu => Box::new(MenuScreen),
        AppState::Question => Box::new(QuestionScreen),
        AppState::Answer => Box::new(AnswerScreen),
        AppState::Complete => Box::new(CompleteScreen),
    }
}
