use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::Error;

/// Keys of the settings read when a quest is launched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    /// Run the quest without sound
    NoAudio,
    /// Ask the engine for hardware video acceleration
    VideoAcceleration,
    /// Show the engine console window (Windows only)
    WinConsole,
    /// Fixed quest window size
    QuestSize,
}

impl SettingKey {
    /// Name of the key in the config file
    pub fn as_str(self) -> &'static str {
        match self {
            SettingKey::NoAudio => "no_audio",
            SettingKey::VideoAcceleration => "video_acceleration",
            SettingKey::WinConsole => "win_console",
            SettingKey::QuestSize => "quest_size",
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quest window size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct QuestSize {
    pub width: u32,
    pub height: u32,
}

impl QuestSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A size is only usable when both dimensions are positive
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

impl fmt::Display for QuestSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for QuestSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidQuestSize(s.to_string());
        let (width, height) = s.split_once('x').ok_or_else(invalid)?;
        let width = width.trim().parse().map_err(|_| invalid())?;
        let height = height.trim().parse().map_err(|_| invalid())?;
        Ok(Self { width, height })
    }
}

impl TryFrom<String> for QuestSize {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Source of typed setting values
///
/// Only read at launch time; the values are copied into a
/// [`LaunchConfig`](crate::quest::LaunchConfig).
pub trait SettingsProvider {
    /// Boolean value of a key, `false` for keys that are not booleans
    fn get_bool(&self, key: SettingKey) -> bool;

    /// Size value of a key, `None` when unset or not a size
    fn get_size(&self, key: SettingKey) -> Option<QuestSize>;
}

/// Quest launch settings stored in the `[settings]` table of the config file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub no_audio: bool,
    pub video_acceleration: bool,
    pub win_console: bool,
    pub quest_size: Option<QuestSize>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            no_audio: false,
            video_acceleration: true,
            win_console: false,
            quest_size: None,
        }
    }
}

impl SettingsProvider for Settings {
    fn get_bool(&self, key: SettingKey) -> bool {
        match key {
            SettingKey::NoAudio => self.no_audio,
            SettingKey::VideoAcceleration => self.video_acceleration,
            SettingKey::WinConsole => self.win_console,
            SettingKey::QuestSize => false,
        }
    }

    fn get_size(&self, key: SettingKey) -> Option<QuestSize> {
        match key {
            SettingKey::QuestSize => self.quest_size,
            _ => None,
        }
    }
}
