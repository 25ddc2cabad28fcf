use std::io;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::prelude::*;
use timbre_core::model::MAX_RESULTS;
use timbre_search::{Config, ResolutionWorkflow, ResultsView, SearchRequest};
use tokio::runtime::Handle;

use crate::commands::build_workflow;

pub mod results;
pub mod song_list;

/// What the event loop should do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Search,
    Quit,
}

/// Application state for the explore TUI.
#[derive(Debug)]
pub struct App {
    pub songs: Vec<String>,
    /// Filter choices; the first is always "none".
    pub genres: Vec<String>,
    pub selected_song: usize,
    pub song_list_offset: usize,
    pub selected_genre: usize,
    pub limit: usize,
    pub view: ResultsView,
    pub searching: bool,
}

impl App {
    pub fn new(songs: Vec<String>, genres: Vec<String>, limit: usize) -> Self {
        let mut choices = vec!["none".to_string()];
        choices.extend(genres);
        Self {
            songs,
            genres: choices,
            selected_song: 0,
            song_list_offset: 0,
            selected_genre: 0,
            limit: limit.clamp(1, MAX_RESULTS),
            view: ResultsView::new(),
            searching: false,
        }
    }

    pub fn genre(&self) -> &str {
        self.genres
            .get(self.selected_genre)
            .map_or("none", String::as_str)
    }

    pub fn selected_label(&self) -> Option<&str> {
        self.songs.get(self.selected_song).map(String::as_str)
    }

    /// The request Enter would send, if a song is selected.
    pub fn request(&self) -> Option<SearchRequest> {
        self.selected_label().map(|label| {
            SearchRequest::label(label)
                .with_limit(self.limit)
                .with_genre(self.genre())
        })
    }

    fn handle_key(&mut self, key: KeyCode, viewport_height: usize) -> Action {
        let viewport_height = viewport_height.max(1);
        match key {
            KeyCode::Char('q') | KeyCode::Esc => return Action::Quit,
            KeyCode::Char('j') | KeyCode::Down => {
                if self.selected_song + 1 < self.songs.len() {
                    self.selected_song += 1;
                    if self.selected_song >= self.song_list_offset + viewport_height {
                        self.song_list_offset = self.selected_song + 1 - viewport_height;
                    }
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                if self.selected_song > 0 {
                    self.selected_song -= 1;
                    if self.selected_song < self.song_list_offset {
                        self.song_list_offset = self.selected_song;
                    }
                }
            }
            KeyCode::Char('+' | '=') | KeyCode::Right => {
                self.limit = (self.limit + 1).min(MAX_RESULTS);
            }
            KeyCode::Char('-') | KeyCode::Left => {
                self.limit = self.limit.saturating_sub(1).max(1);
            }
            KeyCode::Char('g') => {
                self.selected_genre = (self.selected_genre + 1) % self.genres.len();
            }
            KeyCode::Char('G') => {
                self.selected_genre = self
                    .selected_genre
                    .checked_sub(1)
                    .unwrap_or(self.genres.len() - 1);
            }
            KeyCode::Enter if !self.songs.is_empty() => return Action::Search,
            _ => {}
        }
        Action::None
    }
}

/// Run the explore TUI.
///
/// Sets up the terminal, runs the main event loop, and restores the terminal
/// on exit (including on error).
pub fn run_explore(config: &Config) -> Result<()> {
    let workflow = build_workflow(config, true)?;
    let songs = workflow
        .catalog()
        .labels()
        .into_iter()
        .map(str::to_string)
        .collect();
    let genres = workflow
        .catalog()
        .genres()
        .into_iter()
        .map(str::to_string)
        .collect();
    let app = App::new(songs, genres, config.default_limit);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_event_loop(&mut terminal, app, &workflow);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: App,
    workflow: &ResolutionWorkflow,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, &app))?;

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        // Title, help, and borders take 8 rows.
        let viewport_height = usize::from(terminal.size()?.height.saturating_sub(8));
        match app.handle_key(key.code, viewport_height) {
            Action::Quit => return Ok(()),
            Action::Search => {
                let Some(request) = app.request() else {
                    continue;
                };
                app.searching = true;
                terminal.draw(|frame| render(frame, &app))?;

                let outcome = tokio::task::block_in_place(|| {
                    Handle::current().block_on(workflow.run(request))
                });
                if let Err(e) = app.view.apply(outcome) {
                    log::warn!("Search failed: {e}");
                }
                app.searching = false;
            }
            Action::None => {}
        }
    }
}

fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(5),    // Songs and results
            Constraint::Length(3), // Status / help bar
        ])
        .split(frame.area());

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[1]);

    results::render_title(frame, app, chunks[0]);
    song_list::render(frame, app, body[0]);
    results::render_table(frame, app, body[1]);
    results::render_status(frame, app, chunks[2]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        let songs = (1..=5).map(|i| format!("Artist - Song {i}")).collect();
        App::new(songs, vec!["Folk".to_string(), "Jazz".to_string()], 10)
    }

    #[test]
    fn test_limit_stays_in_range() {
        let mut app = app();
        for _ in 0..40 {
            app.handle_key(KeyCode::Char('+'), 10);
        }
        assert_eq!(app.limit, MAX_RESULTS);
        for _ in 0..40 {
            app.handle_key(KeyCode::Char('-'), 10);
        }
        assert_eq!(app.limit, 1);
    }

    #[test]
    fn test_genre_cycles_through_none() {
        let mut app = app();
        assert_eq!(app.genre(), "none");
        app.handle_key(KeyCode::Char('g'), 10);
        assert_eq!(app.genre(), "Folk");
        app.handle_key(KeyCode::Char('g'), 10);
        app.handle_key(KeyCode::Char('g'), 10);
        assert_eq!(app.genre(), "none");
        app.handle_key(KeyCode::Char('G'), 10);
        assert_eq!(app.genre(), "Jazz");
    }

    #[test]
    fn test_navigation_scrolls() {
        let mut app = app();
        for _ in 0..4 {
            app.handle_key(KeyCode::Down, 2);
        }
        assert_eq!(app.selected_song, 4);
        assert_eq!(app.song_list_offset, 3);
        app.handle_key(KeyCode::Down, 2);
        assert_eq!(app.selected_song, 4);
        for _ in 0..4 {
            app.handle_key(KeyCode::Up, 2);
        }
        assert_eq!(app.song_list_offset, 0);
    }

    #[test]
    fn test_enter_builds_request() {
        let mut app = app();
        app.handle_key(KeyCode::Down, 10);
        app.handle_key(KeyCode::Char('g'), 10);
        assert_eq!(app.handle_key(KeyCode::Enter, 10), Action::Search);

        let request = app.request().unwrap();
        assert_eq!(request.limit, 10);
        assert_eq!(request.genre.as_deref(), Some("Folk"));
        assert!(request.exclude_self);
    }

    #[test]
    fn test_enter_without_songs_does_nothing() {
        let mut app = App::new(Vec::new(), Vec::new(), 10);
        assert_eq!(app.handle_key(KeyCode::Enter, 10), Action::None);
        assert_eq!(app.handle_key(KeyCode::Char('q'), 10), Action::Quit);
    }
}
