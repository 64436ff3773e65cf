use ratatui::style::Color;
use tracing::{debug, info};
use tui_input::{Input, InputRequest};

use crate::buffer::{OutputKind, OutputLine};
use crate::config::{Settings, SettingsProvider};
use crate::console::{CommandHistory, classify};
use crate::quest::{QuestRunner, RunnerEvent};
use crate::tui::ConsoleView;

/// Quest status shown in the status bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestStatus {
    /// No quest launched yet
    Idle,
    Running,
    Finished,
}

/// Console application state
pub struct App<P: SettingsProvider = Settings> {
    runner: QuestRunner<P>,
    quest_path: Option<String>,
    status: QuestStatus,
    console: ConsoleView,
    input: Input,
    history: CommandHistory,
    should_quit: bool,
}

impl<P: SettingsProvider> App<P> {
    /// Initialize the application
    pub fn new(runner: QuestRunner<P>, quest_path: Option<String>, max_buffer_lines: usize) -> Self {
        Self {
            runner,
            quest_path,
            status: QuestStatus::Idle,
            console: ConsoleView::new(max_buffer_lines),
            input: Input::default(),
            history: CommandHistory::default(),
            should_quit: false,
        }
    }

    /// Launch the configured quest unless one is already started
    pub fn start_quest(&mut self) {
        match self.quest_path.as_deref() {
            Some(path) if !path.is_empty() => self.runner.start(path),
            _ => self.push_warning("No quest to run".to_string()),
        }
    }

    /// Ask the running quest to exit
    pub fn stop_quest(&mut self) {
        self.runner.stop();
    }

    /// Drain runner notifications into the console
    pub fn poll_runner(&mut self) {
        for event in self.runner.poll_events() {
            self.handle_runner_event(event);
        }
    }

    fn handle_runner_event(&mut self, event: RunnerEvent) {
        match event {
            RunnerEvent::Running => {
                self.status = QuestStatus::Running;
                self.push_status("Quest started");
            }
            RunnerEvent::Finished => {
                self.status = QuestStatus::Finished;
                self.push_status("Quest finished");
            }
            RunnerEvent::OutputProduced(lines) => {
                for line in lines {
                    if let Some(line) = OutputLine::from_classified(classify(&line)) {
                        self.console.push_line(line);
                    }
                }
            }
            RunnerEvent::Warning(message) => self.push_warning(message),
        }
    }

    /// Send the command line to the quest, record and echo it
    ///
    /// Ignored when the line is empty or no quest is running.
    pub fn submit_command(&mut self) {
        if !self.runner.is_running() {
            return;
        }
        let command = self.input.value().to_string();
        if command.trim().is_empty() {
            return;
        }

        let sent = self.runner.execute_command(&command);
        debug!(command = %command, sent, "console command submitted");

        self.history.push(&command);
        self.input.reset();
        self.console.push_line(OutputLine::command_echo(&command));
        if !sent {
            self.push_warning("Failed to send the command to the quest".to_string());
        }
    }

    /// Edit the command line
    pub fn handle_input(&mut self, req: InputRequest) {
        self.input.handle(req);
    }

    /// Replace the command line with the previous history entry
    pub fn history_previous(&mut self) {
        if let Some(command) = self.history.older() {
            self.input = command.into();
        }
    }

    /// Replace the command line with the next history entry, or clear it
    pub fn history_next(&mut self) {
        match self.history.newer() {
            Some(command) => self.input = command.into(),
            None => self.input.reset(),
        }
    }

    /// Stop the quest and wait for it before exiting
    pub async fn shutdown(&mut self) {
        if self.runner.is_started() {
            info!("shutting down quest before exit");
        }
        self.runner.shutdown().await;
    }

    fn push_status(&mut self, message: &str) {
        self.console.push_line(OutputLine::colored(
            OutputKind::Status,
            message.to_string(),
            Color::DarkGray,
        ));
    }

    fn push_warning(&mut self, message: String) {
        self.console
            .push_line(OutputLine::colored(OutputKind::Warning, message, Color::Red));
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn status(&self) -> QuestStatus {
        self.status
    }

    pub fn quest_path(&self) -> Option<&str> {
        self.quest_path.as_deref()
    }

    pub fn runner(&self) -> &QuestRunner<P> {
        &self.runner
    }

    pub fn console(&self) -> &ConsoleView {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut ConsoleView {
        &mut self.console
    }

    pub fn input(&self) -> &Input {
        &self.input
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }
}
