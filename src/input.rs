//! Input handling with DAS (Delayed Auto Shift) and ARR (Auto Repeat Rate)
//!
//! Uses a polling-based approach that doesn't rely on key release events,
//! which are unreliable on Linux terminals. A held key that stops repeating
//! counts as released after `KEY_TIMEOUT`.

use crate::game::Action;
use crate::settings::Settings;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::{Duration, Instant};

/// Time after which we consider a key "released" if no repeat received
const KEY_TIMEOUT: Duration = Duration::from_millis(100);

/// Soft drop gets longer before its first repeat, which the OS delays by
/// up to half a second
const FIRST_REPEAT_TIMEOUT: Duration = Duration::from_millis(600);

/// Input handler with DAS/ARR support
pub struct InputHandler {
    /// Held state for lateral movement keys (for DAS)
    left_state: Option<KeyPressState>,
    right_state: Option<KeyPressState>,
    /// Soft drop key, while held
    soft_drop: Option<HeldKey>,
    /// Key bindings
    bindings: KeyBindings,
    /// DAS duration
    das: Duration,
    /// ARR duration
    arr: Duration,
    /// Release timeout for terminals that never report key release
    key_timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
struct KeyPressState {
    first_press: Instant,
    last_seen: Instant,
    das_triggered: bool,
    last_arr: Option<Instant>,
}

impl KeyPressState {
    fn new(now: Instant) -> Self {
        Self {
            first_press: now,
            last_seen: now,
            das_triggered: false,
            last_arr: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct HeldKey {
    last_seen: Instant,
    repeated: bool,
}

impl HeldKey {
    fn timeout(&self, key_timeout: Duration) -> Duration {
        if self.repeated {
            key_timeout
        } else {
            key_timeout.max(FIRST_REPEAT_TIMEOUT)
        }
    }
}

/// Key bindings configuration - supports multiple keys per action
#[derive(Debug, Clone)]
pub struct KeyBindings {
    pub move_left: Vec<KeyCode>,
    pub move_right: Vec<KeyCode>,
    pub soft_drop: Vec<KeyCode>,
    pub nudge: Vec<KeyCode>,
    pub hard_drop: Vec<KeyCode>,
    pub rotate: Vec<KeyCode>,
    pub start: Vec<KeyCode>,
    pub pause: Vec<KeyCode>,
    pub quit: Vec<KeyCode>,
}

impl KeyBindings {
    /// Parse a key string into KeyCode
    fn parse_key(s: &str) -> Option<KeyCode> {
        let key = match s.to_lowercase().as_str() {
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "space" => KeyCode::Char(' '),
            "enter" => KeyCode::Enter,
            "tab" => KeyCode::Tab,
            "backspace" => KeyCode::Backspace,
            "esc" | "escape" => KeyCode::Esc,
            s => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyCode::Char(c),
                    _ => return None,
                }
            }
        };
        Some(key)
    }

    /// Parse a list of key strings into KeyCodes, skipping unknown names
    fn parse_keys(keys: &[String]) -> Vec<KeyCode> {
        keys.iter().filter_map(|s| Self::parse_key(s)).collect()
    }

    /// Create keybindings from settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            move_left: Self::parse_keys(&settings.keys.move_left),
            move_right: Self::parse_keys(&settings.keys.move_right),
            soft_drop: Self::parse_keys(&settings.keys.soft_drop),
            nudge: Self::parse_keys(&settings.keys.nudge),
            hard_drop: Self::parse_keys(&settings.keys.hard_drop),
            rotate: Self::parse_keys(&settings.keys.rotate),
            start: Self::parse_keys(&settings.keys.start),
            pause: Self::parse_keys(&settings.keys.pause),
            quit: Self::parse_keys(&settings.keys.quit),
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl InputHandler {
    pub fn new() -> Self {
        Self {
            left_state: None,
            right_state: None,
            soft_drop: None,
            bindings: KeyBindings::default(),
            das: Duration::from_millis(170),
            arr: Duration::from_millis(50),
            key_timeout: Some(KEY_TIMEOUT),
        }
    }

    /// Trust key release events instead of timing out held keys
    pub fn with_release_events(mut self, supported: bool) -> Self {
        self.key_timeout = (!supported).then_some(KEY_TIMEOUT);
        self
    }

    /// Create input handler from settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            bindings: KeyBindings::from_settings(settings),
            das: Duration::from_millis(settings.gameplay.das_ms),
            arr: Duration::from_millis(settings.gameplay.arr_ms),
            ..Self::new()
        }
    }

    /// Handle a key press event - returns immediate actions
    pub fn key_down(&mut self, key: KeyEvent) -> Vec<Action> {
        self.key_down_at(key, Instant::now())
    }

    fn key_down_at(&mut self, key: KeyEvent, now: Instant) -> Vec<Action> {
        let mut actions = Vec::new();

        // Handle Ctrl+C for quit
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            actions.push(Action::Quit);
            return actions;
        }

        let code = normalize_key(key.code);

        if self.bindings.move_left.contains(&code) {
            match &mut self.left_state {
                Some(state) => state.last_seen = now,
                None => {
                    actions.push(Action::MoveLeft);
                    self.left_state = Some(KeyPressState::new(now));
                }
            }
            // Cancel opposite direction
            self.right_state = None;
        } else if self.bindings.move_right.contains(&code) {
            match &mut self.right_state {
                Some(state) => state.last_seen = now,
                None => {
                    actions.push(Action::MoveRight);
                    self.right_state = Some(KeyPressState::new(now));
                }
            }
            self.left_state = None;
        } else if self.bindings.soft_drop.contains(&code) {
            match &mut self.soft_drop {
                Some(held) => {
                    held.last_seen = now;
                    held.repeated = true;
                }
                None => {
                    actions.push(Action::SoftDropStart);
                    self.soft_drop = Some(HeldKey {
                        last_seen: now,
                        repeated: false,
                    });
                }
            }
        } else if self.bindings.nudge.contains(&code) {
            actions.push(Action::SoftDropStep);
        } else if self.bindings.hard_drop.contains(&code) {
            actions.push(Action::HardDrop);
        } else if self.bindings.rotate.contains(&code) {
            actions.push(Action::Rotate);
        } else if self.bindings.start.contains(&code) {
            actions.push(Action::Start);
        } else if self.bindings.pause.contains(&code) {
            actions.push(Action::Pause);
        } else if self.bindings.quit.contains(&code) {
            actions.push(Action::Quit);
        }

        actions
    }

    /// Handle a key release event (may never arrive on some terminals)
    pub fn key_up(&mut self, key: KeyEvent) -> Vec<Action> {
        let code = normalize_key(key.code);

        if self.bindings.move_left.contains(&code) {
            self.left_state = None;
        } else if self.bindings.move_right.contains(&code) {
            self.right_state = None;
        } else if self.bindings.soft_drop.contains(&code) && self.soft_drop.take().is_some() {
            return vec![Action::SoftDropStop];
        }
        Vec::new()
    }

    /// Update held keys and return repeat actions (call every frame)
    pub fn update(&mut self) -> Vec<Action> {
        self.update_at(Instant::now())
    }

    fn update_at(&mut self, now: Instant) -> Vec<Action> {
        let mut actions = Vec::new();
        let timeout = self.key_timeout;
        let timed_out = |last_seen: Instant| {
            timeout.is_some_and(|timeout| now.saturating_duration_since(last_seen) > timeout)
        };

        // Check for timed-out keys (no recent key event = released)
        if self.left_state.as_ref().is_some_and(|s| timed_out(s.last_seen)) {
            self.left_state = None;
        }
        if self.right_state.as_ref().is_some_and(|s| timed_out(s.last_seen)) {
            self.right_state = None;
        }
        let soft_drop_released = self.soft_drop.zip(timeout).is_some_and(|(held, timeout)| {
            now.saturating_duration_since(held.last_seen) > held.timeout(timeout)
        });
        if soft_drop_released {
            self.soft_drop = None;
            actions.push(Action::SoftDropStop);
        }

        let (das, arr) = (self.das, self.arr);
        if let Some(state) = &mut self.left_state {
            if process_das_arr(state, now, das, arr) {
                actions.push(Action::MoveLeft);
            }
        }
        if let Some(state) = &mut self.right_state {
            if process_das_arr(state, now, das, arr) {
                actions.push(Action::MoveRight);
            }
        }

        actions
    }

    /// Forget all held keys (on pause, restart or leaving the game).
    /// Returns `SoftDropStop` if soft drop was held.
    pub fn clear(&mut self) -> Vec<Action> {
        self.left_state = None;
        self.right_state = None;
        match self.soft_drop.take() {
            Some(_) => vec![Action::SoftDropStop],
            None => Vec::new(),
        }
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Process DAS/ARR logic for a key state, returns true if should trigger action
fn process_das_arr(state: &mut KeyPressState, now: Instant, das: Duration, arr: Duration) -> bool {
    let held_duration = now.saturating_duration_since(state.first_press);
    if held_duration < das {
        return false;
    }

    match state.last_arr {
        // First trigger after DAS
        None if !state.das_triggered => {
            state.das_triggered = true;
            state.last_arr = Some(now);
            true
        }
        Some(last) if now.saturating_duration_since(last) >= arr => {
            state.last_arr = Some(now);
            true
        }
        _ => false,
    }
}

/// Normalize key codes for consistent handling
fn normalize_key(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_default_bindings() {
        let mut input = InputHandler::new();
        let t = Instant::now();
        assert_eq!(input.key_down_at(press(KeyCode::Up), t), vec![Action::Rotate]);
        assert_eq!(input.key_down_at(press(KeyCode::Char('x')), t), vec![Action::Rotate]);
        assert_eq!(input.key_down_at(press(KeyCode::Char(' ')), t), vec![Action::HardDrop]);
        assert_eq!(input.key_down_at(press(KeyCode::Char('s')), t), vec![Action::SoftDropStep]);
        assert_eq!(input.key_down_at(press(KeyCode::Enter), t), vec![Action::Start]);
        assert_eq!(input.key_down_at(press(KeyCode::Esc), t), vec![Action::Pause]);
        assert_eq!(input.key_down_at(press(KeyCode::Char('Q')), t), vec![Action::Quit]);
    }

    #[test]
    fn test_ctrl_c_quits() {
        let mut input = InputHandler::new();
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(input.key_down(key), vec![Action::Quit]);
    }

    #[test]
    fn test_das_then_arr() {
        let mut input = InputHandler::new();
        let t = Instant::now();
        assert_eq!(input.key_down_at(press(KeyCode::Left), t), vec![Action::MoveLeft]);

        // Terminal key repeats keep the key alive without extra moves
        for step in 1..=4 {
            assert!(input.key_down_at(press(KeyCode::Left), t + ms(50 * step)).is_empty());
        }
        assert!(input.update_at(t + ms(160)).is_empty());
        assert_eq!(input.update_at(t + ms(200)), vec![Action::MoveLeft]);
        assert!(input.update_at(t + ms(220)).is_empty());
        input.key_down_at(press(KeyCode::Left), t + ms(240));
        assert_eq!(input.update_at(t + ms(250)), vec![Action::MoveLeft]);
    }

    #[test]
    fn test_opposite_direction_cancels() {
        let mut input = InputHandler::new();
        let t = Instant::now();
        input.key_down_at(press(KeyCode::Left), t);
        assert_eq!(input.key_down_at(press(KeyCode::Right), t), vec![Action::MoveRight]);
        assert!(input.left_state.is_none());
    }

    #[test]
    fn test_released_key_stops_repeating() {
        let mut input = InputHandler::new();
        let t = Instant::now();
        input.key_down_at(press(KeyCode::Right), t);
        assert!(input.key_up(press(KeyCode::Right)).is_empty());
        assert!(input.update_at(t + ms(300)).is_empty());
    }

    #[test]
    fn test_soft_drop_is_held_until_release() {
        let mut input = InputHandler::new();
        let t = Instant::now();
        assert_eq!(input.key_down_at(press(KeyCode::Down), t), vec![Action::SoftDropStart]);
        assert!(input.key_down_at(press(KeyCode::Down), t + ms(30)).is_empty());
        assert!(input.update_at(t + ms(60)).is_empty());
        assert_eq!(input.key_up(press(KeyCode::Down)), vec![Action::SoftDropStop]);
        assert!(input.key_up(press(KeyCode::Down)).is_empty());
    }

    #[test]
    fn test_soft_drop_times_out() {
        let mut input = InputHandler::new();
        let t = Instant::now();
        input.key_down_at(press(KeyCode::Down), t);
        assert!(input.update_at(t + ms(150)).is_empty());
        assert_eq!(input.update_at(t + ms(650)), vec![Action::SoftDropStop]);
        assert!(input.update_at(t + ms(800)).is_empty());
    }

    #[test]
    fn test_soft_drop_survives_os_repeat_delay() {
        let mut input = InputHandler::new();
        let t = Instant::now();
        assert_eq!(input.key_down_at(press(KeyCode::Down), t), vec![Action::SoftDropStart]);
        for step in 1..=35 {
            assert!(input.update_at(t + ms(10 * step)).is_empty());
        }

        // First repeat after 400ms, then every 30ms
        for step in 0..5 {
            let at = t + ms(400 + 30 * step);
            assert!(input.key_down_at(press(KeyCode::Down), at).is_empty());
            assert!(input.update_at(at).is_empty());
        }

        // Repeats stopped at 520ms: released after the short timeout
        assert!(input.update_at(t + ms(600)).is_empty());
        assert_eq!(input.update_at(t + ms(630)), vec![Action::SoftDropStop]);
    }

    #[test]
    fn test_release_events_disable_timeout() {
        let mut input = InputHandler::new().with_release_events(true);
        let t = Instant::now();
        input.key_down_at(press(KeyCode::Down), t);
        input.key_down_at(press(KeyCode::Left), t);
        let actions = input.update_at(t + ms(1000));
        assert_eq!(actions, vec![Action::MoveLeft]);
        assert_eq!(input.key_up(press(KeyCode::Down)), vec![Action::SoftDropStop]);
    }

    #[test]
    fn test_clear_releases_soft_drop() {
        let mut input = InputHandler::new();
        input.key_down(press(KeyCode::Down));
        input.key_down(press(KeyCode::Left));
        assert_eq!(input.clear(), vec![Action::SoftDropStop]);
        assert!(input.clear().is_empty());
        assert!(input.left_state.is_none());
    }

    #[test]
    fn test_bindings_from_settings() {
        let mut settings = Settings::default();
        settings.keys.move_left = vec!["a".to_string()];
        settings.keys.rotate = vec!["w".to_string(), "Bogus".to_string()];
        let bindings = KeyBindings::from_settings(&settings);
        assert_eq!(bindings.move_left, vec![KeyCode::Char('a')]);
        assert_eq!(bindings.rotate, vec![KeyCode::Char('w')]);

        let mut input = InputHandler::from_settings(&settings);
        assert_eq!(input.key_down(press(KeyCode::Char('A'))), vec![Action::MoveLeft]);
        assert!(input.key_down(press(KeyCode::Up)).is_empty());
    }

    #[test]
    fn test_parse_key_names() {
        assert_eq!(KeyBindings::parse_key("Space"), Some(KeyCode::Char(' ')));
        assert_eq!(KeyBindings::parse_key("ESCAPE"), Some(KeyCode::Esc));
        assert_eq!(KeyBindings::parse_key("k"), Some(KeyCode::Char('k')));
        assert_eq!(KeyBindings::parse_key("Nope"), None);
    }
}
