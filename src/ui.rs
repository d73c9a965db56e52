//! Terminal UI rendering with ratatui

use crate::board::{GRID_HEIGHT, GRID_WIDTH};
use crate::color::BlockColor;
use crate::game::{DisplayCell, Game, GameStatus};
use crate::menu::{Menu, MenuItem, MenuItemType, MenuScreen};
use crate::piece::Piece;
use crate::settings::Settings;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use std::time::Duration;

const EMPTY: &str = "  ";

/// Total width: stats(16) + board(22) + next/controls(22)
const GAME_WIDTH: u16 = 60;
/// Board rows plus borders
const GAME_HEIGHT: u16 = GRID_HEIGHT as u16 + 2;
/// Board columns are two characters wide, plus borders
const BOARD_WIDTH: u16 = GRID_WIDTH as u16 * 2 + 2;

/// Render the main menu
pub fn render_menu(frame: &mut Frame, menu: &Menu) {
    let area = frame.area();

    let menu_width = 50u16;
    let menu_height = (menu.items.len() as u16 * 2 + 4).max(10);
    let title_height = if menu.screen == MenuScreen::Main { 4u16 } else { 3u16 };
    let menu_area = center_rect(area, menu_width, menu_height + title_height);

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(title_height), Constraint::Min(6)])
        .split(menu_area);

    let title_lines = if menu.screen == MenuScreen::Main {
        vec![
            Line::raw(""),
            rainbow_title("C O L O R I S"),
            Line::styled("match three, watch them fall", Style::default().fg(Color::DarkGray)),
        ]
    } else {
        vec![
            Line::raw(""),
            Line::styled(menu.screen.title(), Style::default().fg(Color::Cyan).bold()),
        ]
    };
    frame.render_widget(Paragraph::new(title_lines).alignment(Alignment::Center), layout[0]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));
    let inner = block.inner(layout[1]);
    frame.render_widget(block, layout[1]);

    let mut lines = vec![Line::raw("")];
    for (i, item) in menu.items.iter().enumerate() {
        lines.push(render_menu_item(item, i == menu.selected, menu.rebinding == Some(i)));
        lines.push(Line::raw(""));
    }
    lines.push(Line::styled(controls_hint(menu), Style::default().fg(Color::DarkGray)));

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

/// Title text with letters cycling through the block palette
fn rainbow_title(text: &str) -> Line<'static> {
    let mut palette = BlockColor::ALL.iter().cycle();
    let spans: Vec<Span> = text
        .chars()
        .map(|c| {
            if c == ' ' {
                Span::raw(" ")
            } else {
                let color = palette.next().map(|b| b.color()).unwrap_or(Color::White);
                Span::styled(c.to_string(), Style::default().fg(color).bold())
            }
        })
        .collect();
    Line::from(spans)
}

/// Render a single menu item based on its type
fn render_menu_item(item: &MenuItem, is_selected: bool, is_rebinding: bool) -> Line<'static> {
    let prefix = if is_selected { "▶ " } else { "  " };
    let base_style = if is_selected {
        Style::default().fg(Color::Yellow).bold()
    } else {
        Style::default().fg(Color::White)
    };
    let label = Span::styled(format!("{}{}: ", prefix, item.label), base_style);

    let value = match &item.item_type {
        MenuItemType::Button(_) => {
            return Line::styled(format!("{}{}", prefix, item.label), base_style);
        }
        MenuItemType::Toggle { value, .. } => {
            let (text, color) = if *value { ("ON", Color::Green) } else { ("OFF", Color::Red) };
            Span::styled(format!("< {} >", text), Style::default().fg(color).bold())
        }
        MenuItemType::Cycle { options, current, .. } => {
            let text = options.get(*current).map(String::as_str).unwrap_or("-");
            Span::styled(format!("< {} >", text), Style::default().fg(Color::Cyan))
        }
        MenuItemType::Number { value, .. } => {
            Span::styled(format!("< {} >", value), Style::default().fg(Color::Cyan))
        }
        MenuItemType::KeyBind { .. } if is_rebinding => {
            Span::styled("Press a key...", Style::default().fg(Color::Yellow).bold())
        }
        MenuItemType::KeyBind { keys, .. } => {
            let keys_str = if keys.is_empty() { "None".to_string() } else { keys.join(", ") };
            Span::styled(format!("[{}]", keys_str), Style::default().fg(Color::Magenta))
        }
    };
    Line::from(vec![label, value])
}

/// Get the controls hint based on current menu state
fn controls_hint(menu: &Menu) -> &'static str {
    if menu.rebinding.is_some() {
        return "Key=Set | Shift+Key=Add more | Enter=Done | Esc=Cancel";
    }
    match menu.items.get(menu.selected).map(|item| &item.item_type) {
        Some(MenuItemType::Toggle { .. } | MenuItemType::Cycle { .. } | MenuItemType::Number { .. }) => {
            "↑↓ Select  ←→ Adjust  Esc Back"
        }
        Some(MenuItemType::KeyBind { .. }) => "↑↓ Select  Enter Rebind  Del Clear  Esc Back",
        _ => "↑↓ Select  Enter Confirm  Esc Back",
    }
}

/// Render the entire game UI
pub fn render_game(frame: &mut Frame, game: &Game, settings: &Settings) {
    let area = frame.area();
    let game_area = center_rect(area, GAME_WIDTH, GAME_HEIGHT);

    // stats | board | next + controls
    let main_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(16),
            Constraint::Length(BOARD_WIDTH),
            Constraint::Length(22),
        ])
        .split(game_area);

    render_stats(frame, main_layout[0], game, settings);
    render_board(frame, main_layout[1], game, settings);

    let right_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(8)])
        .split(main_layout[2]);

    render_next(frame, right_layout[0], game.next_piece.as_ref(), settings);
    render_controls(frame, right_layout[1], settings);

    match game.status {
        GameStatus::NotStarted => {
            let hint = format!("Press {} to start", first_key(&settings.keys.start));
            render_overlay(frame, area, "COLORIS", &[hint]);
        }
        GameStatus::Running if game.paused => {
            let hint = format!("Press {} to resume", first_key(&settings.keys.pause));
            render_overlay(frame, area, "PAUSED", &[hint]);
        }
        GameStatus::Over => {
            let lines = [
                format!("Final Score: {}", game.score.points),
                format!("{} restart  {} menu", first_key(&settings.keys.start), first_key(&settings.keys.quit)),
            ];
            render_overlay(frame, area, "GAME OVER", &lines);
        }
        GameStatus::Running => {}
    }
}

fn first_key(keys: &[String]) -> &str {
    keys.first().map(String::as_str).unwrap_or("?")
}

/// Center a rect within another rect
fn center_rect(area: Rect, width: u16, height: u16) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Render the next piece preview
fn render_next(frame: &mut Frame, area: Rect, next: Option<&Piece>, settings: &Settings) {
    let block = Block::default()
        .title(" NEXT ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(piece) = next else {
        return;
    };
    let (block_char, _) = settings.visual.block_chars();
    let lines: Vec<Line> = piece
        .colors
        .iter()
        .map(|color| Line::styled(block_char, Style::default().fg(color.color())))
        .collect();
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

/// Render the game board
fn render_board(frame: &mut Frame, area: Rect, game: &Game, settings: &Settings) {
    let (block_char, ghost_char) = settings.visual.block_chars();

    let border_color = if game.is_resolving() { Color::Yellow } else { Color::White };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines: Vec<Line> = game
        .display_cells(settings.visual.show_ghost)
        .iter()
        .map(|row| {
            let spans: Vec<Span> = row
                .iter()
                .map(|cell| match *cell {
                    DisplayCell::Empty => Span::raw(EMPTY),
                    DisplayCell::Block(color) | DisplayCell::Falling(color) => {
                        Span::styled(block_char, Style::default().fg(color.color()))
                    }
                    DisplayCell::Ghost(color) => {
                        Span::styled(ghost_char, Style::default().fg(color.color()).dim())
                    }
                    DisplayCell::Clearing(color) => {
                        Span::styled(ghost_char, Style::default().fg(Color::White).bg(color.color()))
                    }
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn speed_label(game: &Game) -> String {
    let ms = game.drop_interval().as_millis();
    if game.is_soft_dropping() {
        format!("{} ms (soft)", ms)
    } else {
        format!("{} ms", ms)
    }
}

fn format_time(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Render stats panel
fn render_stats(frame: &mut Frame, area: Rect, game: &Game, settings: &Settings) {
    let block = Block::default()
        .title(" SCORE ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let label = |text: &'static str| Line::from(Span::styled(text, Style::default().fg(Color::Gray)));
    let best = settings.best_score().unwrap_or(0).max(game.score.points);

    let mut lines = vec![
        label("SCORE"),
        Line::styled(game.score.points.to_string(), Style::default().fg(Color::Yellow).bold()),
        Line::raw(""),
        label("BEST"),
        Line::styled(best.to_string(), Style::default().fg(Color::Cyan)),
        Line::raw(""),
        label("CLEARED"),
        Line::styled(game.score.cells.to_string(), Style::default().fg(Color::Green)),
        Line::raw(""),
        label("BEST CHAIN"),
        Line::styled(game.score.best_chain.to_string(), Style::default().fg(Color::Magenta)),
        Line::raw(""),
        label("SPEED"),
        Line::styled(speed_label(game), Style::default().fg(Color::White)),
        Line::raw(""),
        label("TIME"),
        Line::styled(format_time(game.elapsed), Style::default().fg(Color::White)),
    ];

    if let Some(action) = &game.last_action {
        lines.push(Line::raw(""));
        lines.push(Line::styled(action.clone(), Style::default().fg(Color::Magenta).bold()));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Render the key reference panel
fn render_controls(frame: &mut Frame, area: Rect, settings: &Settings) {
    let block = Block::default()
        .title(" CONTROLS ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let keys = &settings.keys;
    let rows = [
        ("Move", format!("{} {}", first_key(&keys.move_left), first_key(&keys.move_right))),
        ("Rotate", keys.rotate.join(" ")),
        ("Fast", first_key(&keys.soft_drop).to_string()),
        ("Nudge", first_key(&keys.nudge).to_string()),
        ("Drop", first_key(&keys.hard_drop).to_string()),
        ("Pause", first_key(&keys.pause).to_string()),
        ("Quit", first_key(&keys.quit).to_string()),
    ];
    let lines: Vec<Line> = rows
        .into_iter()
        .map(|(name, key)| {
            Line::from(vec![
                Span::styled(format!("{:<7}", name), Style::default().fg(Color::Gray)),
                Span::styled(key, Style::default().fg(Color::Magenta)),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Render an overlay (for start, pause and game over)
fn render_overlay(frame: &mut Frame, area: Rect, title: &str, subtitle: &[String]) {
    let popup_width = 30u16;
    let popup_height = 4 + subtitle.len() as u16;
    let popup_area = center_rect(area, popup_width, popup_height);

    // Clear the background
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .style(Style::default().bg(Color::Black));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let mut text = vec![
        Line::styled(title.to_string(), Style::default().fg(Color::Yellow).bold()),
        Line::raw(""),
    ];
    text.extend(
        subtitle
            .iter()
            .map(|line| Line::styled(line.clone(), Style::default().fg(Color::Gray))),
    );

    frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), inner);
}
