//! Launcher mode: `questrun -run <quest> [options] <quest>`
//!
//! The console re-invokes its own executable in this mode. The launcher
//! hands the quest to the engine program with the engine's own options and
//! leaves stdin/stdout attached, so the console talks to the engine directly.

use std::ffi::OsString;
use std::process::Command;

use tracing::info;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::quest::{LaunchConfig, RUN_FLAG};

/// Environment variable carrying the console's `--config` path to the launcher
pub const CONFIG_ENV: &str = "QUESTRUN_CONFIG";

/// Launcher arguments, or `None` when `arguments` do not select launcher mode
///
/// `arguments` excludes the program name. Launcher arguments must be UTF-8.
pub fn launcher_arguments<I>(arguments: I) -> Option<Result<Vec<String>>>
where
    I: IntoIterator<Item = OsString>,
{
    let mut arguments = arguments.into_iter().peekable();
    if arguments
        .peek()
        .is_none_or(|first| first.as_os_str() != RUN_FLAG)
    {
        return None;
    }

    Some(
        arguments
            .map(|argument| {
                argument.into_string().map_err(|argument| {
                    Error::InvalidArguments(format!(
                        "argument is not valid UTF-8: {}",
                        argument.to_string_lossy()
                    ))
                })
            })
            .collect(),
    )
}

/// Engine command line for launcher arguments (program name excluded)
pub fn engine_command(config: &Config, arguments: &[String]) -> Result<Command> {
    let launch = LaunchConfig::parse_arguments(arguments)?;
    let engine_arguments = launch.engine_arguments();
    info!(
        engine = %config.engine_program,
        arguments = ?engine_arguments,
        "launching engine"
    );

    let mut command = Command::new(&config.engine_program);
    command.args(engine_arguments);
    Ok(command)
}

/// Run the engine and return its exit code
///
/// On Unix the launcher process is replaced by the engine, so this only
/// returns when the engine could not be started. Elsewhere the engine runs
/// as a child of the launcher; stopping the quest kills the launcher only
/// and the engine is left to exit on its own.
pub fn run(config: &Config, arguments: &[String]) -> Result<i32> {
    let mut command = engine_command(config, arguments)?;
    let launch_error = |source| Error::EngineLaunch {
        program: config.engine_program.clone(),
        source,
    };

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;

        Err(launch_error(command.exec()))
    }
    #[cfg(not(unix))]
    {
        let status = command.status().map_err(launch_error)?;
        Ok(status.code().unwrap_or(1))
    }
}
