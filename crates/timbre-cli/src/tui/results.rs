use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};

use super::App;
use crate::commands::render::{playback_line, truncate};

pub fn render_title(frame: &mut Frame, app: &App, area: Rect) {
    let title = Paragraph::new(format!(
        "timbre    limit {}    genre {}",
        app.limit,
        app.genre()
    ))
    .style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(title, area);
}

/// Render the most recent results. They stay on screen when a later
/// search fails.
pub fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let Some(resolution) = app.view.current() else {
        let hint = Paragraph::new("  Pick a song and press Enter.")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title("Similar"));
        frame.render_widget(hint, area);
        return;
    };

    let header = Row::new(vec![
        Cell::from("#").style(Style::default().fg(Color::DarkGray)),
        Cell::from("Score"),
        Cell::from("Song").style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from("Genre"),
        Cell::from("Audio"),
    ])
    .height(1);

    let rows: Vec<Row> = resolution
        .entries
        .iter()
        .map(|entry| {
            let result = &entry.result;
            Row::new(vec![
                Cell::from(result.rank.to_string()),
                Cell::from(format!("{:.4}", result.score)),
                Cell::from(result.record.display_label()),
                Cell::from(result.record.genre.clone()),
                Cell::from(playback_line(&entry.playback, &result.record.audio_url)),
            ])
        })
        .collect();

    let title = format!(
        "Similar to {} [{} results]",
        truncate(&resolution.seed.label(), 40),
        resolution.entries.len()
    );

    let table = Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Length(7),
            Constraint::Percentage(40),
            Constraint::Length(12),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(title));

    frame.render_widget(table, area);
}

pub fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let (text, style) = if app.searching {
        (
            "  Searching...".to_string(),
            Style::default().fg(Color::Yellow),
        )
    } else if let Some(error) = app.view.last_error() {
        (format!("  {error}"), Style::default().fg(Color::Red))
    } else {
        (
            "  \u{2191}/k Up  \u{2193}/j Down  +/- Limit  g Genre  Enter Search  q Quit".to_string(),
            Style::default().fg(Color::DarkGray),
        )
    };

    let status = Paragraph::new(text)
        .style(style)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, area);
}
