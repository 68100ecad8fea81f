use chrono::Local;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::app::App;
use crate::clock::TimeSource;
use crate::records::LeaderboardEntry;
use crate::session::Session;
use crate::storage::BlobStore;

const HORIZONTAL_MARGIN: u16 = 2;
const SIDEBAR_WIDTH: u16 = 38;

impl<S: BlobStore, C: TimeSource> Widget for &App<S, C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(30), Constraint::Length(SIDEBAR_WIDTH)])
            .split(area);

        render_round(self, columns[0], buf);
        render_leaderboard(self, columns[1], buf);
    }
}

fn render_round<S: BlobStore, C: TimeSource>(app: &App<S, C>, area: Rect, buf: &mut Buffer) {
    let session = app.game.session();
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
    let prompt_width = session.target().width().max(session.input().width());
    let prompt_lines = if prompt_width <= max_chars_per_line as usize {
        1
    } else {
        (prompt_width as f64 / max_chars_per_line as f64).ceil() as u16 + 1
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(prompt_lines + 2),
            Constraint::Length(6),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    Paragraph::new(Span::styled("Typing Contest", bold.fg(Color::Cyan)))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    let border_style = match session.result() {
        Some(r) if r.correct => Style::default().fg(Color::Green),
        Some(_) => Style::default().fg(Color::Red),
        None => Style::default().add_modifier(Modifier::DIM),
    };
    Paragraph::new(Line::from(prompt_spans(session, app.input_selected)))
        .block(Block::default().borders(Borders::ALL).border_style(border_style))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false })
        .render(chunks[2], buf);

    Paragraph::new(result_lines(session))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

    let won = session.result().is_some_and(|r| r.correct);
    let restart_style = if won {
        bold
    } else {
        Style::default().add_modifier(Modifier::DIM)
    };
    Paragraph::new(Span::styled("[ Tab: restart ]", restart_style))
        .alignment(Alignment::Center)
        .render(chunks[4], buf);

    let help = if app.confirming_clear {
        Span::styled(
            "Clear all records? (y/n)",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(
            "enter submit · ^D delete latest · ^L clear all · esc quit",
            Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
        )
    };
    Paragraph::new(help)
        .alignment(Alignment::Center)
        .render(chunks[6], buf);
}

/// Target sentence with the typed text laid over it.
///
/// A selected attempt is drawn reversed, as a text field highlights it.
fn prompt_spans(session: &Session, selected: bool) -> Vec<Span<'static>> {
    let typed = if selected {
        Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    let wrong = typed.fg(Color::Red).add_modifier(Modifier::CROSSED_OUT);
    let pending = Style::default().add_modifier(Modifier::DIM);

    let mut chars = session.input().chars();
    let mut spans: Vec<Span> = session
        .target()
        .chars()
        .map(|expected| match chars.next() {
            Some(c) if c == expected => Span::styled(c.to_string(), typed),
            Some(' ') => Span::styled("·", wrong),
            Some(c) => Span::styled(c.to_string(), wrong),
            None => Span::styled(expected.to_string(), pending),
        })
        .collect();

    let overflow: String = chars.collect();
    if !overflow.is_empty() {
        spans.push(Span::styled(overflow, wrong));
    }
    spans
}

fn result_lines(session: &Session) -> Vec<Line<'static>> {
    let bold = Style::default().add_modifier(Modifier::BOLD);

    match session.result() {
        Some(result) => {
            let (headline, hint) = if result.correct {
                (Span::styled("Success!", bold.fg(Color::Green)), Line::from(""))
            } else {
                (
                    Span::styled("Wrong", bold.fg(Color::Red)),
                    Line::from(Span::styled(
                        "type again or press enter to retry",
                        Style::default().fg(Color::Red),
                    )),
                )
            };
            // a miss keeps the clock running, so show the live value
            let time = if result.correct {
                result.time
            } else {
                session.elapsed()
            };
            vec![
                Line::from(headline),
                hint,
                Line::from(format!("time: {:.3}s", time)),
                Line::from(format!("accuracy: {:.1}%", result.accuracy)),
                Line::from(format!("speed: {} cpm", result.speed)),
            ]
        }
        None => vec![
            Line::from(""),
            Line::from(""),
            Line::from(format!("time: {:.3}s", session.elapsed())),
            Line::from("accuracy: 0%"),
            Line::from("speed: 0 cpm"),
        ],
    }
}

fn render_leaderboard<S: BlobStore, C: TimeSource>(app: &App<S, C>, area: Rect, buf: &mut Buffer) {
    let block = Block::default().borders(Borders::LEFT).title(" Records ");
    let board = app.game.leaderboard();

    let lines: Vec<Line> = if board.is_empty() {
        vec![
            Line::from(""),
            Line::from(Span::styled(
                "- no records yet -",
                Style::default().add_modifier(Modifier::DIM),
            )),
        ]
    } else {
        board.iter().map(leaderboard_line).collect()
    };

    Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center)
        .render(area, buf);
}

fn leaderboard_line(entry: &LeaderboardEntry<'_>) -> Line<'static> {
    let record = entry.record;
    let time_style = if entry.is_best {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Blue)
    };

    let mut spans = vec![
        Span::raw(format!("[{}, #{}] ", entry.rank, record.original_index)),
        Span::styled(format!("({:.3}s)", record.time), time_style),
    ];
    if let Some(at) = record.recorded_at {
        spans.push(Span::styled(
            format!(" {}", at.with_timezone(&Local).format("%H:%M")),
            Style::default().add_modifier(Modifier::DIM),
        ));
    }
    if entry.is_best {
        spans.push(Span::styled(" ★", time_style));
    }
    if entry.deletable {
        spans.push(Span::styled(" ×", Style::default().fg(Color::Red)));
    }
    Line::from(spans)
}
