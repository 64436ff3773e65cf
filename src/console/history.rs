use std::collections::VecDeque;

/// Maximum number of commands remembered by the console
pub const MAX_HISTORY_ENTRIES: usize = 500;

/// In-memory history of executed console commands
///
/// Navigation works like a shell: `older` walks back from the newest
/// entry, `newer` walks forward and finally returns to an empty line.
pub struct CommandHistory {
    entries: VecDeque<String>,
    max_entries: usize,
    /// Index of the entry being browsed, `None` when editing a new line
    cursor: Option<usize>,
}

impl CommandHistory {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries,
            cursor: None,
        }
    }

    /// Record an executed command and stop browsing
    ///
    /// Blank commands and repeats of the newest entry are not recorded.
    pub fn push(&mut self, command: &str) {
        self.cursor = None;
        if command.trim().is_empty() || self.entries.back().map(String::as_str) == Some(command) {
            return;
        }
        if self.max_entries > 0 && self.entries.len() >= self.max_entries {
            self.entries.pop_front();
        }
        self.entries.push_back(command.to_string());
    }

    /// Older entry, staying on the oldest one
    pub fn older(&mut self) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        let index = match self.cursor {
            None => self.entries.len() - 1,
            Some(index) => index.saturating_sub(1),
        };
        self.cursor = Some(index);
        self.entries.get(index).map(String::as_str)
    }

    /// Newer entry, or `None` once past the newest one
    pub fn newer(&mut self) -> Option<&str> {
        let index = self.cursor? + 1;
        if index >= self.entries.len() {
            self.cursor = None;
            return None;
        }
        self.cursor = Some(index);
        self.entries.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new(MAX_HISTORY_ENTRIES)
    }
}
