mod settings;

pub use settings::{QuestSize, SettingKey, Settings, SettingsProvider};

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Default maximum number of lines kept in the console log
pub const DEFAULT_MAX_BUFFER_LINES: usize = 10000;

/// Engine program started by launcher mode when none is configured
pub const DEFAULT_ENGINE_PROGRAM: &str = "solarus-run";

/// Application configuration loaded from `config.toml`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Engine executable the launcher hands the quest to
    pub engine_program: String,
    /// Maximum lines kept in the console log (0 for unlimited)
    pub max_buffer_lines: usize,
    /// Log filter used when `RUST_LOG` is not set
    pub log_level: String,
    /// Quest launch settings
    pub settings: Settings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine_program: DEFAULT_ENGINE_PROGRAM.to_string(),
            max_buffer_lines: DEFAULT_MAX_BUFFER_LINES,
            log_level: "info".to_string(),
            settings: Settings::default(),
        }
    }
}

impl Config {
    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("questrun").join("config.toml"))
    }

    /// Load the config from `path`, or from the default location
    ///
    /// A missing file at the default location yields the defaults; an
    /// explicitly requested file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_from(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Load the config from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn config_load_from_reads_all_fields() {
        let file = write_config(
            r#"
engine_program = "/opt/solarus/solarus-run"
max_buffer_lines = 500
log_level = "debug"

[settings]
no_audio = true
video_acceleration = false
win_console = true
quest_size = "320x240"
"#,
        );

        let config = Config::load_from(file.path()).unwrap();

        assert_eq!(config.engine_program, "/opt/solarus/solarus-run");
        assert_eq!(config.max_buffer_lines, 500);
        assert_eq!(config.log_level, "debug");
        assert!(config.settings.no_audio);
        assert!(!config.settings.video_acceleration);
        assert!(config.settings.win_console);
        assert_eq!(config.settings.quest_size, Some(QuestSize::new(320, 240)));
    }

    #[test]
    fn config_load_from_fills_missing_fields_with_defaults() {
        let file = write_config("[settings]\nno_audio = true\n");

        let config = Config::load_from(file.path()).unwrap();

        assert_eq!(config.engine_program, DEFAULT_ENGINE_PROGRAM);
        assert_eq!(config.max_buffer_lines, DEFAULT_MAX_BUFFER_LINES);
        assert!(config.settings.no_audio);
        assert!(config.settings.video_acceleration);
    }

    #[test]
    fn config_load_from_rejects_invalid_quest_size() {
        let file = write_config("[settings]\nquest_size = \"big\"\n");

        let result = Config::load_from(file.path());

        assert!(matches!(result, Err(Error::ConfigParse { .. })));
    }

    #[test]
    fn config_load_returns_error_for_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(Some(&dir.path().join("absent.toml")));

        assert!(matches!(result, Err(Error::ConfigRead { .. })));
    }
}
