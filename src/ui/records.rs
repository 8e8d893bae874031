use ratatui::{
    layout::Constraint,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Row, Table},
};

use crate::records::RecordTable;
use crate::session::{Difficulty, Mode};
use crate::store::DifficultyHistory;
use crate::util::{format_best_time, format_secs};

/// Pure presenter for one difficulty's record row
pub fn present_row(records: &RecordTable, difficulty: Difficulty, highlight: bool) -> Row<'static> {
    let score_cell = |mode: Mode| {
        let best = records.best_score(mode, difficulty);
        if best == 0 {
            Cell::from("--").style(Style::default().add_modifier(Modifier::DIM))
        } else {
            Cell::from(best.to_string())
        }
    };

    let best_time = records.best_time(difficulty);
    let time_style = if best_time.is_some() {
        Style::default().fg(Color::Green)
    } else {
        Style::default().add_modifier(Modifier::DIM)
    };

    let label_style = if highlight {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };

    Row::new(vec![
        Cell::from(difficulty.title()).style(label_style),
        score_cell(Mode::FixedCount),
        Cell::from(format_best_time(best_time)).style(time_style),
        score_cell(Mode::FixedDuration),
    ])
}

/// All nine record slots, one row per difficulty
pub fn records_table(records: &RecordTable, selected: Difficulty) -> Table<'static> {
    let header = Row::new(vec![
        Cell::from("Difficulty"),
        Cell::from("Time Attack score"),
        Cell::from("Best time"),
        Cell::from("Survival score"),
    ])
    .style(
        Style::default()
            .add_modifier(Modifier::BOLD)
            .add_modifier(Modifier::UNDERLINED),
    );

    let rows: Vec<Row> = Difficulty::ALL
        .iter()
        .map(|&d| present_row(records, d, d == selected))
        .collect();

    let widths = [
        Constraint::Length(12),
        Constraint::Length(18),
        Constraint::Length(12),
        Constraint::Length(16),
    ];

    Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("Records"))
}

pub fn history_lines(history: &[DifficultyHistory]) -> Vec<Line<'static>> {
    if history.is_empty() {
        return vec![Line::from(Span::styled(
            "No answers recorded yet",
            Style::default().add_modifier(Modifier::DIM | Modifier::ITALIC),
        ))];
    }

    history
        .iter()
        .map(|h| {
            let avg = h
                .avg_time_ms
                .map_or_else(|| "--".to_string(), |ms| format_secs(ms / 1000.0));
            Line::from(vec![
                Span::styled(
                    format!("{:<6}", h.difficulty.title()),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!(
                    " {} answered, {:.0}% correct, avg {}",
                    h.rounds,
                    h.accuracy(),
                    avg
                )),
            ])
        })
        .collect()
}
