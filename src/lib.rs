//! Quest console: runs a quest in a child process, shows its log and
//! sends Lua commands to it.

pub mod app;
pub mod buffer;
pub mod config;
pub mod console;
pub mod error;
pub mod launcher;
pub mod quest;
pub mod tui;

pub use error::{Error, Result};
