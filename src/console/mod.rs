mod decorate;
mod history;

pub use decorate::{ClassifiedLine, LogColor, Severity, classify, decorate};
pub use history::{CommandHistory, MAX_HISTORY_ENTRIES};
