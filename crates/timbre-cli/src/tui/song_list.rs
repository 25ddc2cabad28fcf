use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem};

use super::App;

/// Render the catalog song list with the current selection highlighted.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    // area.height - 2 for borders
    let viewport_height = usize::from(area.height.saturating_sub(2));
    let visible_start = app.song_list_offset;
    let visible_end = (visible_start + viewport_height).min(app.songs.len());

    let items: Vec<ListItem> = app
        .songs
        .iter()
        .enumerate()
        .skip(visible_start)
        .take(viewport_height)
        .map(|(i, label)| {
            let style = if i == app.selected_song {
                Style::default().bg(Color::DarkGray).fg(Color::White)
            } else {
                Style::default()
            };
            ListItem::new(label.as_str()).style(style)
        })
        .collect();

    let title = if app.songs.len() > viewport_height {
        format!(
            "Songs [{}-{} of {}]",
            visible_start + 1,
            visible_end,
            app.songs.len()
        )
    } else {
        "Songs".to_string()
    };

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(list, area);
}
