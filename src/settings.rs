//! Settings persistence using TOML
//!
//! Stores settings in ~/.config/coloris/settings.toml (or platform equivalent)

use crate::speed::Timing;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Number of high scores kept
const MAX_HIGH_SCORES: usize = 10;

/// Game settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Keybindings
    pub keys: KeyBindings,
    /// Visual settings
    pub visual: VisualSettings,
    /// Gameplay settings
    pub gameplay: GameplaySettings,
    /// High scores
    pub high_scores: HighScores,
}

/// Key bindings (stored as strings for easy editing)
/// Each action can have one or more keys bound to it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub move_left: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub move_right: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub soft_drop: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub hard_drop: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub nudge: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub rotate: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub start: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub pause: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub quit: Vec<String>,
}

/// A key list as written in the file: one name or several
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn deserialize_keys<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(key) => vec![key],
        OneOrMany::Many(keys) => keys,
    })
}

/// Write a single key as a plain string, several as an array
fn serialize_keys<S>(keys: &[String], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match keys {
        [key] => serializer.serialize_str(key),
        keys => keys.serialize(serializer),
    }
}

/// Visual settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualSettings {
    /// Ghost piece visibility
    pub show_ghost: bool,
    /// Block style: "solid", "bracket", "round"
    pub block_style: String,
    /// Flash blast zones and pause between chain passes
    pub clear_animation: bool,
}

/// Gameplay settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplaySettings {
    /// Delayed Auto Shift in milliseconds
    pub das_ms: u64,
    /// Auto Repeat Rate in milliseconds
    pub arr_ms: u64,
    /// Starting drop interval
    pub base_interval_ms: u64,
    /// Drop interval while soft drop is held
    pub soft_drop_interval_ms: u64,
    /// Running time between speed-ups
    pub speed_up_every_ms: u64,
    /// Amount each speed-up removes from the drop interval
    pub speed_up_step_ms: u64,
    /// Shortest drop interval
    pub min_interval_ms: u64,
    /// Blast zone highlight time
    pub clear_flash_ms: u64,
    /// Pause between chain passes
    pub chain_delay_ms: u64,
}

/// Best games, highest score first
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct HighScores {
    pub entries: Vec<ScoreEntry>,
}

/// A single high score entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreEntry {
    pub score: u64,
    pub cells: u32,
    pub best_chain: u32,
    /// Date as ISO string
    pub date: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            keys: KeyBindings::default(),
            visual: VisualSettings::default(),
            gameplay: GameplaySettings::default(),
            high_scores: HighScores::default(),
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            move_left: vec!["Left".to_string()],
            move_right: vec!["Right".to_string()],
            soft_drop: vec!["Down".to_string()],
            hard_drop: vec!["Space".to_string()],
            nudge: vec!["s".to_string()],
            rotate: vec!["Up".to_string(), "x".to_string()],
            start: vec!["Enter".to_string()],
            pause: vec!["p".to_string(), "Esc".to_string()],
            quit: vec!["q".to_string()],
        }
    }
}

impl Default for VisualSettings {
    fn default() -> Self {
        Self {
            show_ghost: true,
            block_style: "solid".to_string(),
            clear_animation: true,
        }
    }
}

impl Default for GameplaySettings {
    fn default() -> Self {
        let timing = Timing::default();
        let ms = |d: Duration| d.as_millis() as u64;
        Self {
            das_ms: 170,
            arr_ms: 50,
            base_interval_ms: ms(timing.base_interval),
            soft_drop_interval_ms: ms(timing.soft_drop_interval),
            speed_up_every_ms: ms(timing.speed_up_every),
            speed_up_step_ms: ms(timing.speed_up_step),
            min_interval_ms: ms(timing.min_interval),
            clear_flash_ms: ms(timing.clear_flash),
            chain_delay_ms: ms(timing.chain_delay),
        }
    }
}

impl GameplaySettings {
    /// Timing parameters for a new game.
    /// The minimum interval never exceeds the base interval.
    pub fn timing(&self) -> Timing {
        let base = Duration::from_millis(self.base_interval_ms);
        Timing {
            base_interval: base,
            soft_drop_interval: Duration::from_millis(self.soft_drop_interval_ms),
            speed_up_every: Duration::from_millis(self.speed_up_every_ms),
            speed_up_step: Duration::from_millis(self.speed_up_step_ms),
            min_interval: Duration::from_millis(self.min_interval_ms).min(base),
            clear_flash: Duration::from_millis(self.clear_flash_ms),
            chain_delay: Duration::from_millis(self.chain_delay_ms),
        }
    }
}

impl Settings {
    /// Location of settings.toml in the platform config directory
    fn path() -> Option<PathBuf> {
        ProjectDirs::from("com", "coloris", "coloris")
            .map(|dirs| dirs.config_dir().join("settings.toml"))
    }

    /// Load settings from disk. A missing or unreadable file gives defaults.
    pub fn load() -> Self {
        Self::path()
            .and_then(|path| fs::read_to_string(path).ok())
            .map(|contents| Self::from_toml(&contents))
            .unwrap_or_default()
    }

    /// Parse settings, falling back to defaults on malformed input
    fn from_toml(contents: &str) -> Self {
        toml::from_str(contents).unwrap_or_else(|e| {
            tracing::warn!("ignoring malformed settings file: {}", e);
            Self::default()
        })
    }

    /// Write settings to disk
    pub fn save(&self) -> Result<(), String> {
        let path = Self::path().ok_or("Could not determine config directory")?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| format!("Failed to create {}: {}", dir.display(), e))?;
        }
        let contents = toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize: {}", e))?;
        fs::write(&path, contents).map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
        tracing::debug!("settings written to {}", path.display());
        Ok(())
    }

    /// Timing parameters from the gameplay section
    pub fn timing(&self) -> Timing {
        self.gameplay.timing()
    }

    /// Record a finished game. Returns its rank (0 is best) if it made the table.
    pub fn add_score(&mut self, score: u64, cells: u32, best_chain: u32) -> Option<usize> {
        if score == 0 {
            return None;
        }
        let entries = &mut self.high_scores.entries;
        // Ties go below existing entries
        let rank = entries.iter().take_while(|e| e.score >= score).count();
        if rank >= MAX_HIGH_SCORES {
            return None;
        }
        entries.insert(
            rank,
            ScoreEntry {
                score,
                cells,
                best_chain,
                date: today(),
            },
        );
        entries.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }

    /// Get the best score so far
    pub fn best_score(&self) -> Option<u64> {
        self.high_scores.entries.first().map(|e| e.score)
    }
}

/// Today's UTC date as YYYY-MM-DD
fn today() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let (year, month, day) = civil_from_days((secs / 86_400) as i64);
    format!("{:04}-{:02}-{:02}", year, month, day)
}

/// Gregorian date of a day count since 1970-01-01
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

impl VisualSettings {
    /// Get the block characters based on style
    pub fn block_chars(&self) -> (&'static str, &'static str) {
        match self.block_style.as_str() {
            "bracket" => ("[]", ".."),
            "round" => ("()", ".."),
            _ => ("██", "░░"), // "solid" or default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timing_matches_game_defaults() {
        assert_eq!(Settings::default().timing(), Timing::default());
    }

    #[test]
    fn test_min_interval_capped_by_base() {
        let mut settings = Settings::default();
        settings.gameplay.base_interval_ms = 100;
        settings.gameplay.min_interval_ms = 300;
        let timing = settings.timing();
        assert_eq!(timing.min_interval, Duration::from_millis(100));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut settings = Settings::default();
        settings.visual.clear_animation = false;
        settings.keys.hard_drop = vec!["Enter".to_string(), "Space".to_string()];
        settings.add_score(120, 12, 2);

        let text = toml::to_string_pretty(&settings).unwrap();
        let loaded: Settings = toml::from_str(&text).unwrap();
        assert!(!loaded.visual.clear_animation);
        assert_eq!(loaded.keys.hard_drop, settings.keys.hard_drop);
        assert_eq!(loaded.high_scores, settings.high_scores);
    }

    #[test]
    fn test_keys_accept_string_or_array() {
        let text = r#"
            [keys]
            move_left = "a"
            rotate = ["w", "Up"]
        "#;
        let settings: Settings = toml::from_str(text).unwrap();
        assert_eq!(settings.keys.move_left, vec!["a"]);
        assert_eq!(settings.keys.rotate, vec!["w", "Up"]);
        // Missing entries fall back to defaults
        assert_eq!(settings.keys.hard_drop, vec!["Space"]);
        assert_eq!(settings.gameplay.base_interval_ms, 800);
    }

    #[test]
    fn test_malformed_file_gives_defaults() {
        let settings = Settings::from_toml("keys = 5\n[[[");
        assert_eq!(settings.keys.quit, vec!["q"]);
    }

    #[test]
    fn test_civil_dates() {
        assert_eq!(civil_from_days(0), (1970, 1, 1));
        assert_eq!(civil_from_days(11_016), (2000, 2, 29));
        assert_eq!(civil_from_days(20_743), (2026, 10, 17));
    }

    #[test]
    fn test_high_scores_sorted_and_capped() {
        let mut settings = Settings::default();
        for score in 1..=12u64 {
            settings.add_score(score * 10, 0, 0);
        }
        let entries = &settings.high_scores.entries;
        assert_eq!(entries.len(), MAX_HIGH_SCORES);
        assert_eq!(settings.best_score(), Some(120));
        assert!(entries.windows(2).all(|w| w[0].score >= w[1].score));

        assert_eq!(settings.add_score(5, 0, 0), None);
        assert_eq!(settings.add_score(0, 0, 0), None);
        assert_eq!(settings.add_score(1000, 0, 0), Some(0));
    }
}
