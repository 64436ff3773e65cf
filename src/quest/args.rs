use crate::config::{QuestSize, SettingKey, SettingsProvider};
use crate::error::{Error, Result};

/// Flag that switches the executable into quest launcher mode
pub const RUN_FLAG: &str = "-run";

const NO_AUDIO_FLAG: &str = "-no-audio";
const VIDEO_ACCELERATION_PREFIX: &str = "-video-acceleration=";
const WIN_CONSOLE_PREFIX: &str = "-win-console=";
const QUEST_SIZE_PREFIX: &str = "-quest-size=";

/// Everything needed to launch one quest
///
/// Assembled from the settings when the quest starts and never written back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchConfig {
    pub quest_path: String,
    pub no_audio: bool,
    pub video_acceleration: bool,
    pub win_console: bool,
    pub quest_size: Option<QuestSize>,
}

impl LaunchConfig {
    /// Snapshot the launch settings for `quest_path`
    pub fn from_settings(quest_path: impl Into<String>, settings: &impl SettingsProvider) -> Self {
        Self {
            quest_path: quest_path.into(),
            no_audio: settings.get_bool(SettingKey::NoAudio),
            video_acceleration: settings.get_bool(SettingKey::VideoAcceleration),
            win_console: settings.get_bool(SettingKey::WinConsole),
            quest_size: settings.get_size(SettingKey::QuestSize),
        }
    }

    /// Arguments passed to the launcher: `-run <path>`, the engine flags, then `<path>` again
    pub fn to_arguments(&self) -> Vec<String> {
        let mut arguments = vec![RUN_FLAG.to_string(), self.quest_path.clone()];
        arguments.extend(self.engine_arguments());
        arguments
    }

    /// Arguments understood by the engine itself, ending with the quest path
    pub fn engine_arguments(&self) -> Vec<String> {
        let mut arguments = Vec::new();

        if self.no_audio {
            arguments.push(NO_AUDIO_FLAG.to_string());
        }
        arguments.push(format!(
            "{VIDEO_ACCELERATION_PREFIX}{}",
            yes_no(self.video_acceleration)
        ));
        arguments.push(format!("{WIN_CONSOLE_PREFIX}{}", yes_no(self.win_console)));
        if let Some(size) = self.quest_size.filter(QuestSize::is_valid) {
            arguments.push(format!("{QUEST_SIZE_PREFIX}{size}"));
        }
        arguments.push(self.quest_path.clone());

        arguments
    }

    /// Parse the launcher arguments produced by [`LaunchConfig::to_arguments`]
    ///
    /// `arguments` excludes the program name. The quest path is read by
    /// position, so it may itself start with `-`.
    pub fn parse_arguments<S: AsRef<str>>(arguments: &[S]) -> Result<Self> {
        let mut iter = arguments.iter().map(|argument| argument.as_ref());

        match iter.next() {
            Some(RUN_FLAG) => {}
            _ => {
                return Err(Error::InvalidArguments(format!(
                    "expected {RUN_FLAG} as first argument"
                )));
            }
        }
        let quest_path = match iter.next() {
            Some(path) if !path.is_empty() => path.to_string(),
            _ => {
                return Err(Error::InvalidArguments(format!(
                    "{RUN_FLAG} requires a quest path"
                )));
            }
        };

        let mut options: Vec<&str> = iter.collect();
        if options.last() == Some(&quest_path.as_str()) {
            options.pop();
        }

        let mut config = Self {
            quest_path,
            no_audio: false,
            video_acceleration: true,
            win_console: false,
            quest_size: None,
        };

        for argument in options {
            if argument == NO_AUDIO_FLAG {
                config.no_audio = true;
            } else if let Some(value) = argument.strip_prefix(VIDEO_ACCELERATION_PREFIX) {
                config.video_acceleration = parse_yes_no(argument, value)?;
            } else if let Some(value) = argument.strip_prefix(WIN_CONSOLE_PREFIX) {
                config.win_console = parse_yes_no(argument, value)?;
            } else if let Some(value) = argument.strip_prefix(QUEST_SIZE_PREFIX) {
                config.quest_size = Some(value.parse()?);
            } else if argument.starts_with('-') {
                return Err(Error::InvalidArguments(format!(
                    "unknown option '{argument}'"
                )));
            } else {
                return Err(Error::InvalidArguments(format!(
                    "quest path mismatch: '{}' and '{argument}'",
                    config.quest_path
                )));
            }
        }

        Ok(config)
    }
}

/// Build the launcher argument vector for `quest_path` from the current settings
pub fn build_arguments(quest_path: &str, settings: &impl SettingsProvider) -> Vec<String> {
    LaunchConfig::from_settings(quest_path, settings).to_arguments()
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

fn parse_yes_no(argument: &str, value: &str) -> Result<bool> {
    match value {
        "yes" => Ok(true),
        "no" => Ok(false),
        _ => Err(Error::InvalidArguments(format!(
            "expected yes or no in '{argument}'"
        ))),
    }
}
