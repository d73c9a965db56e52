//! COLORIS - a falling-column color matcher for the terminal
//!
//! Line up three of a kind and watch the neighbours go with them.

mod board;
mod collapse;
mod color;
mod game;
mod generator;
mod input;
mod matcher;
mod menu;
mod piece;
mod score;
mod settings;
mod speed;
mod ui;

use crossterm::{
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use game::{Action, Game, GameEvent, GameStatus};
use input::InputHandler;
use menu::{Menu, MenuAction, MenuScreen};
use ratatui::{backend::CrosstermBackend, Terminal};
use settings::Settings;
use std::{
    io::{self, stdout},
    time::{Duration, Instant},
};

/// Target frame rate
const TARGET_FPS: u64 = 60;
const FRAME_DURATION: Duration = Duration::from_micros(1_000_000 / TARGET_FPS);

/// Input delay after game over to prevent accidental restart
const GAME_OVER_INPUT_DELAY: Duration = Duration::from_secs(1);

/// Application state
enum AppState {
    Menu(Menu),
    Playing(Game, InputHandler),
}

/// Get the coloris temp directory, creating it if needed
fn coloris_temp_dir() -> std::path::PathBuf {
    let dir = std::env::temp_dir().join("coloris");
    let _ = std::fs::create_dir_all(&dir);
    dir
}

fn main() -> io::Result<()> {
    let session_id: u32 = rand::random();

    // Setup tracing to a per-session log file; the terminal belongs to the UI
    let log_dir = coloris_temp_dir();
    let log_file = format!("{:08x}.log", session_id);
    let file_appender = tracing_appender::rolling::never(&log_dir, &log_file);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("coloris=debug".parse().unwrap()),
        )
        .with_ansi(false)
        .init();

    tracing::info!(
        "COLORIS starting up, session={:08x}, log={}",
        session_id,
        log_dir.join(&log_file).display()
    );

    let mut settings = Settings::load();

    // Setup terminal
    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen)?;

    // Ask for key release events; terminals without support ignore this
    let release_events = crossterm::terminal::supports_keyboard_enhancement().unwrap_or(false);
    if release_events {
        let _ = execute!(
            stdout(),
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        );
    }
    tracing::debug!("key release events: {}", release_events);

    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut settings, release_events);

    // Restore terminal
    if release_events {
        let _ = execute!(stdout(), PopKeyboardEnhancementFlags);
    }
    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen)?;

    // Save settings (including any new high scores)
    if let Err(e) = settings.save() {
        tracing::warn!("could not save settings: {}", e);
        eprintln!("Warning: Could not save settings: {}", e);
    }

    println!("\nThanks for playing COLORIS!");
    if let Ok(Some(game)) = &result {
        println!("Final Score: {}", game.score.points);
        println!(
            "Cleared: {} | Best Chain: {} | Pieces: {}",
            game.score.cells, game.score.best_chain, game.score.pieces
        );
    }
    if let Some(best) = settings.best_score() {
        println!("High Score: {}", best);
    }

    tracing::info!("COLORIS shutting down");
    result.map(|_| ())
}

/// Create a game configured from the current settings, waiting for start.
/// `COLORIS_SEED` fixes the piece sequence.
fn new_game(settings: &Settings, release_events: bool) -> (Game, InputHandler) {
    let seed = std::env::var("COLORIS_SEED").ok().and_then(|s| s.parse::<u64>().ok());
    let mut game = match seed {
        Some(seed) => {
            tracing::info!("using fixed piece seed {}", seed);
            Game::with_seed(settings.timing(), seed)
        }
        None => Game::new(settings.timing()),
    };
    game.set_clear_animation(settings.visual.clear_animation);
    let input = InputHandler::from_settings(settings).with_release_events(release_events);
    (game, input)
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    settings: &mut Settings,
    release_events: bool,
) -> io::Result<Option<Game>> {
    let mut state = AppState::Menu(Menu::new());
    let mut last_game: Option<Game> = None;
    let mut game_over_time: Option<Instant> = None;
    let mut last_frame = Instant::now();

    loop {
        terminal.draw(|frame| match &state {
            AppState::Menu(menu) => ui::render_menu(frame, menu),
            AppState::Playing(game, _) => ui::render_game(frame, game, settings),
        })?;

        if event::poll(FRAME_DURATION)? {
            if let Event::Key(key) = event::read()? {
                match &mut state {
                    AppState::Menu(menu) => {
                        if key.kind == KeyEventKind::Release {
                            continue;
                        }
                        match handle_menu_key(menu, key, settings) {
                            Some(MenuAction::StartGame) => {
                                let (game, input) = new_game(settings, release_events);
                                tracing::info!("entering game screen");
                                state = AppState::Playing(game, input);
                            }
                            Some(MenuAction::GoToScreen(screen)) => menu.go_to(screen, settings),
                            Some(MenuAction::Back) => menu.go_back(settings),
                            Some(MenuAction::SaveSettings) => match settings.save() {
                                Ok(()) => tracing::info!("settings saved"),
                                Err(e) => tracing::warn!("could not save settings: {}", e),
                            },
                            Some(MenuAction::Quit) => return Ok(last_game),
                            None => {}
                        }
                    }
                    AppState::Playing(game, input) => {
                        let actions = if key.kind == KeyEventKind::Release {
                            input.key_up(key)
                        } else {
                            input.key_down(key)
                        };

                        let mut leave = false;
                        for action in actions {
                            match (game.status, action) {
                                (_, Action::Quit) => leave = true,
                                (GameStatus::Over, Action::Start)
                                    if game_over_time.is_some_and(|t| t.elapsed() < GAME_OVER_INPUT_DELAY) => {}
                                (_, Action::Pause) => {
                                    game.process_action(action);
                                    for action in input.clear() {
                                        game.process_action(action);
                                    }
                                }
                                _ => game.process_action(action),
                            }
                        }

                        if leave {
                            if let AppState::Playing(game, _) =
                                std::mem::replace(&mut state, AppState::Menu(Menu::new()))
                            {
                                leave_game(&game, settings);
                                last_game = Some(game);
                            }
                            game_over_time = None;
                        }
                    }
                }
            }
        }

        // Advance the game by the real time since the last frame
        let now = Instant::now();
        let dt = now.duration_since(last_frame);
        last_frame = now;

        if let AppState::Playing(game, input) = &mut state {
            for action in input.update() {
                game.process_action(action);
            }
            game.update(dt);

            for event in game.take_events() {
                log_event(&event);
                match event {
                    GameEvent::Started => game_over_time = None,
                    GameEvent::GameOver { .. } => {
                        game_over_time = Some(now);
                        save_high_score(game, settings);
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Translate a key press into menu navigation
fn handle_menu_key(menu: &mut Menu, key: KeyEvent, settings: &mut Settings) -> Option<MenuAction> {
    if menu.rebinding.is_some() {
        match key.code {
            KeyCode::Esc => menu.cancel_rebind(),
            KeyCode::Enter => menu.finish_rebind(),
            code => {
                if let Some(key_str) = key_to_string(code) {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        // Shift+Key adds to existing bindings (keeps rebind mode)
                        menu.add_key(key_str, settings);
                    } else {
                        menu.set_key(key_str, settings);
                    }
                }
            }
        }
        return None;
    }

    match key.code {
        KeyCode::Up => menu.move_up(),
        KeyCode::Down => menu.move_down(),
        KeyCode::Left => menu.adjust_left(settings),
        KeyCode::Right => menu.adjust_right(settings),
        KeyCode::Enter if menu.on_key_bind() => menu.start_rebind(),
        KeyCode::Enter => return menu.select(),
        KeyCode::Delete | KeyCode::Backspace => menu.clear_binding(settings),
        KeyCode::Char('q') | KeyCode::Esc => {
            return Some(if menu.screen == MenuScreen::Main {
                MenuAction::Quit
            } else {
                MenuAction::Back
            });
        }
        _ => {}
    }
    None
}

fn log_event(event: &GameEvent) {
    match event {
        GameEvent::Started => tracing::info!("game started"),
        GameEvent::PieceSettled { row, col } => {
            tracing::debug!("piece settled at row={} col={}", row, col)
        }
        GameEvent::BlastDetected { cells, points, chain } => {
            tracing::debug!("blast: {} cells, +{} points, chain pass {}", cells, points, chain)
        }
        GameEvent::ChainFinished { passes } => tracing::debug!("chain finished after {} passes", passes),
        GameEvent::PieceSpawned { colors } => {
            let names: Vec<&str> = colors.iter().map(|c| c.name()).collect();
            tracing::trace!("piece spawned: {}", names.join("/"))
        }
        GameEvent::SpeedUp { interval } => {
            tracing::info!("speed up: drop interval now {}ms", interval.as_millis())
        }
        GameEvent::GameOver { score } => tracing::info!("game over, score={}", score),
    }
}

/// Leaving mid-game still counts the score; a finished game was already recorded
fn leave_game(game: &Game, settings: &mut Settings) {
    if game.status == GameStatus::Running {
        tracing::info!("left game, score={}", game.score.points);
        save_high_score(game, settings);
    }
}

/// Record a finished game in the high score table
fn save_high_score(game: &Game, settings: &mut Settings) {
    let score = &game.score;
    if let Some(rank) = settings.add_score(score.points, score.cells, score.best_chain) {
        tracing::info!("new high score #{}: {}", rank + 1, score.points);
    }
}

/// Convert a key code to the name stored in settings
fn key_to_string(code: KeyCode) -> Option<String> {
    let name = match code {
        KeyCode::Left => "Left".to_string(),
        KeyCode::Right => "Right".to_string(),
        KeyCode::Up => "Up".to_string(),
        KeyCode::Down => "Down".to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_ascii_lowercase().to_string(),
        _ => return None,
    };
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_rebind_to_space() {
        let mut settings = Settings::default();
        let mut menu = Menu::settings_keys(&settings);
        menu.start_rebind();
        handle_menu_key(&mut menu, key(KeyCode::Char(' ')), &mut settings);
        assert_eq!(settings.keys.move_left, vec!["Space"]);
        assert!(menu.rebinding.is_none());
    }

    #[test]
    fn test_unsupported_keys_are_ignored() {
        assert_eq!(key_to_string(KeyCode::F(5)), None);
        assert_eq!(key_to_string(KeyCode::Char('W')).as_deref(), Some("w"));
    }

    #[test]
    fn test_menu_quit_and_back() {
        let mut settings = Settings::default();
        let mut menu = Menu::new();
        assert_eq!(handle_menu_key(&mut menu, key(KeyCode::Esc), &mut settings), Some(MenuAction::Quit));
        menu.go_to(MenuScreen::Settings, &settings);
        assert_eq!(handle_menu_key(&mut menu, key(KeyCode::Esc), &mut settings), Some(MenuAction::Back));
    }

    #[test]
    fn test_leaving_running_game_records_score() {
        let mut settings = Settings::default();
        let (mut game, _) = new_game(&settings, false);
        game.process_action(Action::Start);
        game.score.add_pass(4);

        leave_game(&game, &mut settings);
        assert_eq!(game.status, GameStatus::Running);
        assert_eq!(settings.best_score(), Some(40));
    }

    #[test]
    fn test_leaving_title_screen_records_nothing() {
        let mut settings = Settings::default();
        let (game, _) = new_game(&settings, false);
        leave_game(&game, &mut settings);
        assert_eq!(settings.best_score(), None);
    }

    #[test]
    fn test_new_game_waits_for_start() {
        let mut settings = Settings::default();
        settings.visual.clear_animation = false;
        let (game, _) = new_game(&settings, false);
        assert_eq!(game.status, GameStatus::NotStarted);
    }
}
