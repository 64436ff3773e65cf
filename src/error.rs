use std::path::PathBuf;

/// Result alias used by configuration loading and launcher mode
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced outside the quest supervisor
///
/// The supervisor never returns these: launch and runtime failures are
/// turned into lifecycle notifications instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid quest size '{0}', expected <width>x<height>")]
    InvalidQuestSize(String),

    #[error("invalid launcher arguments: {0}")]
    InvalidArguments(String),

    #[error("failed to launch engine '{program}': {source}")]
    EngineLaunch {
        program: String,
        source: std::io::Error,
    },
}
