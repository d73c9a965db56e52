//! Main menu system with settings configuration

use crate::settings::Settings;

/// Menu screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuScreen {
    Main,
    Settings,
    SettingsKeys,
    SettingsVisual,
    SettingsGameplay,
}

impl MenuScreen {
    /// Screen reached by going back
    pub fn parent(self) -> Self {
        match self {
            MenuScreen::Main | MenuScreen::Settings => MenuScreen::Main,
            MenuScreen::SettingsKeys | MenuScreen::SettingsVisual | MenuScreen::SettingsGameplay => {
                MenuScreen::Settings
            }
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            MenuScreen::Main => "",
            MenuScreen::Settings => "SETTINGS",
            MenuScreen::SettingsKeys => "KEY BINDINGS",
            MenuScreen::SettingsVisual => "VISUAL",
            MenuScreen::SettingsGameplay => "GAMEPLAY",
        }
    }
}

/// Menu state
#[derive(Debug, Clone)]
pub struct Menu {
    pub screen: MenuScreen,
    pub selected: usize,
    pub items: Vec<MenuItem>,
    /// For key rebinding: index of the item waiting for input
    pub rebinding: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct MenuItem {
    pub label: String,
    pub item_type: MenuItemType,
}

impl MenuItem {
    fn new(label: &str, item_type: MenuItemType) -> Self {
        Self {
            label: label.to_string(),
            item_type,
        }
    }

    fn button(label: &str, action: MenuAction) -> Self {
        Self::new(label, MenuItemType::Button(action))
    }
}

#[derive(Debug, Clone)]
pub enum MenuItemType {
    /// Simple button that triggers an action
    Button(MenuAction),
    /// Toggle boolean setting
    Toggle { key: SettingKey, value: bool },
    /// Cycle through options
    Cycle { key: SettingKey, options: Vec<String>, current: usize },
    /// Numeric value with increment/decrement
    Number { key: SettingKey, value: u64, min: u64, max: u64, step: u64 },
    /// Key binding (shows current keys, can rebind)
    KeyBind { action: BindingAction, keys: Vec<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    StartGame,
    GoToScreen(MenuScreen),
    Back,
    Quit,
    SaveSettings,
}

/// Setting keys for identifying which setting to modify
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    ShowGhost,
    BlockStyle,
    ClearAnimation,
    DasMs,
    ArrMs,
    BaseIntervalMs,
    MinIntervalMs,
    SpeedUpStepMs,
    ClearFlashMs,
    ChainDelayMs,
}

/// Rebindable game actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingAction {
    MoveLeft,
    MoveRight,
    Rotate,
    SoftDrop,
    Nudge,
    HardDrop,
    Start,
    Pause,
    Quit,
}

impl BindingAction {
    pub const ALL: [BindingAction; 9] = [
        BindingAction::MoveLeft,
        BindingAction::MoveRight,
        BindingAction::Rotate,
        BindingAction::SoftDrop,
        BindingAction::Nudge,
        BindingAction::HardDrop,
        BindingAction::Start,
        BindingAction::Pause,
        BindingAction::Quit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BindingAction::MoveLeft => "Move Left",
            BindingAction::MoveRight => "Move Right",
            BindingAction::Rotate => "Rotate",
            BindingAction::SoftDrop => "Soft Drop (hold)",
            BindingAction::Nudge => "Nudge Down",
            BindingAction::HardDrop => "Hard Drop",
            BindingAction::Start => "Start / Restart",
            BindingAction::Pause => "Pause",
            BindingAction::Quit => "Quit",
        }
    }

    /// The settings entry holding this action's keys
    fn keys_mut(self, settings: &mut Settings) -> &mut Vec<String> {
        let keys = &mut settings.keys;
        match self {
            BindingAction::MoveLeft => &mut keys.move_left,
            BindingAction::MoveRight => &mut keys.move_right,
            BindingAction::Rotate => &mut keys.rotate,
            BindingAction::SoftDrop => &mut keys.soft_drop,
            BindingAction::Nudge => &mut keys.nudge,
            BindingAction::HardDrop => &mut keys.hard_drop,
            BindingAction::Start => &mut keys.start,
            BindingAction::Pause => &mut keys.pause,
            BindingAction::Quit => &mut keys.quit,
        }
    }

    pub fn keys(self, settings: &Settings) -> &[String] {
        let keys = &settings.keys;
        match self {
            BindingAction::MoveLeft => &keys.move_left,
            BindingAction::MoveRight => &keys.move_right,
            BindingAction::Rotate => &keys.rotate,
            BindingAction::SoftDrop => &keys.soft_drop,
            BindingAction::Nudge => &keys.nudge,
            BindingAction::HardDrop => &keys.hard_drop,
            BindingAction::Start => &keys.start,
            BindingAction::Pause => &keys.pause,
            BindingAction::Quit => &keys.quit,
        }
    }
}

const BLOCK_STYLES: [&str; 3] = ["solid", "bracket", "round"];

impl Menu {
    pub fn new() -> Self {
        Self::main_menu()
    }

    fn with_items(screen: MenuScreen, items: Vec<MenuItem>) -> Self {
        Self {
            screen,
            selected: 0,
            rebinding: None,
            items,
        }
    }

    pub fn main_menu() -> Self {
        Self::with_items(
            MenuScreen::Main,
            vec![
                MenuItem::button("Play", MenuAction::StartGame),
                MenuItem::button("Settings", MenuAction::GoToScreen(MenuScreen::Settings)),
                MenuItem::button("Quit", MenuAction::Quit),
            ],
        )
    }

    pub fn settings_menu() -> Self {
        Self::with_items(
            MenuScreen::Settings,
            vec![
                MenuItem::button("Key Bindings", MenuAction::GoToScreen(MenuScreen::SettingsKeys)),
                MenuItem::button("Visual", MenuAction::GoToScreen(MenuScreen::SettingsVisual)),
                MenuItem::button("Gameplay", MenuAction::GoToScreen(MenuScreen::SettingsGameplay)),
                MenuItem::button("Save", MenuAction::SaveSettings),
                MenuItem::button("Back", MenuAction::Back),
            ],
        )
    }

    pub fn settings_keys(settings: &Settings) -> Self {
        let mut items: Vec<MenuItem> = BindingAction::ALL
            .iter()
            .map(|&action| {
                MenuItem::new(
                    action.label(),
                    MenuItemType::KeyBind {
                        action,
                        keys: action.keys(settings).to_vec(),
                    },
                )
            })
            .collect();
        items.push(MenuItem::button("Back", MenuAction::Back));
        Self::with_items(MenuScreen::SettingsKeys, items)
    }

    pub fn settings_visual(settings: &Settings) -> Self {
        let current_style = BLOCK_STYLES
            .iter()
            .position(|s| *s == settings.visual.block_style)
            .unwrap_or(0);

        Self::with_items(
            MenuScreen::SettingsVisual,
            vec![
                MenuItem::new(
                    "Ghost Piece",
                    MenuItemType::Toggle {
                        key: SettingKey::ShowGhost,
                        value: settings.visual.show_ghost,
                    },
                ),
                MenuItem::new(
                    "Block Style",
                    MenuItemType::Cycle {
                        key: SettingKey::BlockStyle,
                        options: BLOCK_STYLES.iter().map(|s| s.to_string()).collect(),
                        current: current_style,
                    },
                ),
                MenuItem::new(
                    "Clear Animation",
                    MenuItemType::Toggle {
                        key: SettingKey::ClearAnimation,
                        value: settings.visual.clear_animation,
                    },
                ),
                MenuItem::button("Back", MenuAction::Back),
            ],
        )
    }

    pub fn settings_gameplay(settings: &Settings) -> Self {
        let gameplay = &settings.gameplay;
        let number = |label: &str, key, value, min, max, step| {
            MenuItem::new(label, MenuItemType::Number { key, value, min, max, step })
        };

        Self::with_items(
            MenuScreen::SettingsGameplay,
            vec![
                number("DAS (ms)", SettingKey::DasMs, gameplay.das_ms, 0, 500, 10),
                number("ARR (ms)", SettingKey::ArrMs, gameplay.arr_ms, 0, 100, 5),
                number("Start Speed (ms)", SettingKey::BaseIntervalMs, gameplay.base_interval_ms, 100, 2000, 50),
                number("Top Speed (ms)", SettingKey::MinIntervalMs, gameplay.min_interval_ms, 50, 1000, 25),
                number("Speed-up Step (ms)", SettingKey::SpeedUpStepMs, gameplay.speed_up_step_ms, 0, 200, 5),
                number("Clear Flash (ms)", SettingKey::ClearFlashMs, gameplay.clear_flash_ms, 0, 1000, 50),
                number("Chain Delay (ms)", SettingKey::ChainDelayMs, gameplay.chain_delay_ms, 0, 1000, 50),
                MenuItem::button("Back", MenuAction::Back),
            ],
        )
    }

    pub fn move_up(&mut self) {
        if self.rebinding.is_some() {
            return; // Don't move while rebinding
        }
        self.selected = match self.selected {
            0 => self.items.len().saturating_sub(1),
            n => n - 1,
        };
    }

    pub fn move_down(&mut self) {
        if self.rebinding.is_some() {
            return;
        }
        self.selected = if self.selected + 1 < self.items.len() {
            self.selected + 1
        } else {
            0
        };
    }

    /// Handle left for cycling options and numbers
    pub fn adjust_left(&mut self, settings: &mut Settings) {
        self.adjust(settings, false);
    }

    /// Handle right for cycling options and numbers
    pub fn adjust_right(&mut self, settings: &mut Settings) {
        self.adjust(settings, true);
    }

    fn adjust(&mut self, settings: &mut Settings, forward: bool) {
        if self.rebinding.is_some() {
            return;
        }
        let Some(item) = self.items.get_mut(self.selected) else {
            return;
        };
        match &mut item.item_type {
            MenuItemType::Toggle { key, value } => {
                *value = !*value;
                apply_setting(settings, *key, SettingValue::Bool(*value));
            }
            MenuItemType::Cycle { key, options, current } if !options.is_empty() => {
                let len = options.len();
                *current = if forward { (*current + 1) % len } else { (*current + len - 1) % len };
                apply_setting(settings, *key, SettingValue::Text(&options[*current]));
            }
            MenuItemType::Number { key, value, min, max, step } => {
                *value = if forward {
                    value.saturating_add(*step).min(*max)
                } else {
                    value.saturating_sub(*step).max(*min)
                };
                apply_setting(settings, *key, SettingValue::Number(*value));
            }
            _ => {}
        }
    }

    /// Get the action for the current selection (for Button types)
    pub fn select(&self) -> Option<MenuAction> {
        if self.rebinding.is_some() {
            return None;
        }
        match self.items.get(self.selected).map(|item| &item.item_type) {
            Some(MenuItemType::Button(action)) => Some(*action),
            _ => None,
        }
    }

    /// True if the selected item is a key binding
    pub fn on_key_bind(&self) -> bool {
        matches!(
            self.items.get(self.selected).map(|item| &item.item_type),
            Some(MenuItemType::KeyBind { .. })
        )
    }

    /// Start rebinding a key
    pub fn start_rebind(&mut self) {
        if self.on_key_bind() {
            self.rebinding = Some(self.selected);
        }
    }

    /// Cancel rebinding
    pub fn cancel_rebind(&mut self) {
        self.rebinding = None;
    }

    /// Finish adding keys and exit rebind mode
    pub fn finish_rebind(&mut self) {
        self.rebinding = None;
    }

    /// Run `edit` on the keys of the binding being edited and store the result
    fn edit_binding(&mut self, index: usize, settings: &mut Settings, edit: impl FnOnce(&mut Vec<String>)) {
        if let Some(MenuItem {
            item_type: MenuItemType::KeyBind { action, keys },
            ..
        }) = self.items.get_mut(index)
        {
            edit(keys);
            *action.keys_mut(settings) = keys.clone();
        }
    }

    /// Add a key to the current rebinding action (stays in rebind mode)
    pub fn add_key(&mut self, key: String, settings: &mut Settings) {
        if let Some(index) = self.rebinding {
            self.edit_binding(index, settings, |keys| {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            });
        }
    }

    /// Replace the keys of the current rebinding action and exit rebind mode
    pub fn set_key(&mut self, key: String, settings: &mut Settings) {
        if let Some(index) = self.rebinding.take() {
            self.edit_binding(index, settings, |keys| *keys = vec![key]);
        }
    }

    /// Remove every key from the selected binding
    pub fn clear_binding(&mut self, settings: &mut Settings) {
        if self.rebinding.is_none() {
            self.edit_binding(self.selected, settings, Vec::clear);
        }
    }

    pub fn go_to(&mut self, screen: MenuScreen, settings: &Settings) {
        *self = match screen {
            MenuScreen::Main => Self::main_menu(),
            MenuScreen::Settings => Self::settings_menu(),
            MenuScreen::SettingsKeys => Self::settings_keys(settings),
            MenuScreen::SettingsVisual => Self::settings_visual(settings),
            MenuScreen::SettingsGameplay => Self::settings_gameplay(settings),
        };
    }

    /// Go back to previous screen
    pub fn go_back(&mut self, settings: &Settings) {
        self.go_to(self.screen.parent(), settings);
    }
}

impl Default for Menu {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper enum for setting values
enum SettingValue<'a> {
    Bool(bool),
    Text(&'a str),
    Number(u64),
}

/// Apply a setting change to the Settings struct
fn apply_setting(settings: &mut Settings, key: SettingKey, value: SettingValue) {
    let gameplay = &mut settings.gameplay;
    match (key, value) {
        (SettingKey::ShowGhost, SettingValue::Bool(v)) => settings.visual.show_ghost = v,
        (SettingKey::ClearAnimation, SettingValue::Bool(v)) => settings.visual.clear_animation = v,
        (SettingKey::BlockStyle, SettingValue::Text(v)) => settings.visual.block_style = v.to_string(),
        (SettingKey::DasMs, SettingValue::Number(v)) => gameplay.das_ms = v,
        (SettingKey::ArrMs, SettingValue::Number(v)) => gameplay.arr_ms = v,
        (SettingKey::BaseIntervalMs, SettingValue::Number(v)) => gameplay.base_interval_ms = v,
        (SettingKey::MinIntervalMs, SettingValue::Number(v)) => gameplay.min_interval_ms = v,
        (SettingKey::SpeedUpStepMs, SettingValue::Number(v)) => gameplay.speed_up_step_ms = v,
        (SettingKey::ClearFlashMs, SettingValue::Number(v)) => gameplay.clear_flash_ms = v,
        (SettingKey::ChainDelayMs, SettingValue::Number(v)) => gameplay.chain_delay_ms = v,
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_menu_navigation_wraps() {
        let mut menu = Menu::new();
        assert_eq!(menu.select(), Some(MenuAction::StartGame));
        menu.move_up();
        assert_eq!(menu.select(), Some(MenuAction::Quit));
        menu.move_down();
        assert_eq!(menu.selected, 0);
    }

    #[test]
    fn test_go_back_returns_to_parent() {
        let settings = Settings::default();
        let mut menu = Menu::new();
        menu.go_to(MenuScreen::SettingsVisual, &settings);
        menu.go_back(&settings);
        assert_eq!(menu.screen, MenuScreen::Settings);
        menu.go_back(&settings);
        assert_eq!(menu.screen, MenuScreen::Main);
    }

    #[test]
    fn test_toggle_and_cycle_apply_settings() {
        let mut settings = Settings::default();
        let mut menu = Menu::settings_visual(&settings);

        menu.adjust_right(&mut settings);
        assert!(!settings.visual.show_ghost);

        menu.move_down();
        menu.adjust_left(&mut settings);
        assert_eq!(settings.visual.block_style, "round");

        menu.move_down();
        menu.adjust_left(&mut settings);
        assert!(!settings.visual.clear_animation);
    }

    #[test]
    fn test_number_is_clamped() {
        let mut settings = Settings::default();
        let mut menu = Menu::settings_gameplay(&settings);
        menu.selected = 1; // ARR
        for _ in 0..30 {
            menu.adjust_right(&mut settings);
        }
        assert_eq!(settings.gameplay.arr_ms, 100);
        for _ in 0..30 {
            menu.adjust_left(&mut settings);
        }
        assert_eq!(settings.gameplay.arr_ms, 0);
    }

    #[test]
    fn test_rebinding_updates_settings() {
        let mut settings = Settings::default();
        let mut menu = Menu::settings_keys(&settings);
        menu.selected = 2; // Rotate
        menu.start_rebind();
        assert!(menu.select().is_none());

        menu.add_key("w".to_string(), &mut settings);
        assert_eq!(settings.keys.rotate, vec!["Up", "x", "w"]);
        assert!(menu.rebinding.is_some());

        menu.set_key("k".to_string(), &mut settings);
        assert_eq!(settings.keys.rotate, vec!["k"]);
        assert!(menu.rebinding.is_none());

        menu.clear_binding(&mut settings);
        assert!(settings.keys.rotate.is_empty());
    }

    #[test]
    fn test_every_binding_listed() {
        let settings = Settings::default();
        let menu = Menu::settings_keys(&settings);
        let binds = menu
            .items
            .iter()
            .filter(|item| matches!(item.item_type, MenuItemType::KeyBind { .. }))
            .count();
        assert_eq!(binds, BindingAction::ALL.len());
    }
}
