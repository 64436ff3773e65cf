use std::collections::VecDeque;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc::{
    self,
    error::{TryRecvError, TrySendError},
};
use tracing::{debug, info, warn};

use crate::config::{Settings, SettingsProvider};
use crate::quest::args::build_arguments;
use crate::quest::drain::OutputDrainer;

/// Time given to the quest to exit after a terminate request before it is killed
pub const TERMINATE_GRACE_PERIOD: Duration = Duration::from_millis(1000);

/// Time to wait for stdout to close once the process has exited
const STDOUT_CLOSE_GRACE_PERIOD: Duration = Duration::from_millis(500);

const READ_CHUNK_SIZE: usize = 4096;

/// Commands waiting to be written to the quest's stdin
const COMMAND_QUEUE_SIZE: usize = 256;

/// Lifecycle of the supervised quest process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    NotStarted,
    Running,
    Finished,
}

/// Notification delivered by [`QuestRunner::poll_events`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerEvent {
    /// The OS reports the quest process alive
    Running,
    /// The quest exited or could not be launched
    Finished,
    /// Complete lines read from the quest's standard output, in order
    OutputProduced(Vec<String>),
    /// Launch precondition failure worth showing to the user
    Warning(String),
}

/// Executable that runs quests
///
/// Normally the current executable, re-invoked in launcher mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub path: PathBuf,
    /// Arguments placed before the launcher arguments
    pub leading_args: Vec<String>,
    /// Extra environment variables
    pub env: Vec<(String, OsString)>,
}

impl Program {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            leading_args: Vec::new(),
            env: Vec::new(),
        }
    }

    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// The running executable
    pub fn current_exe() -> std::io::Result<Self> {
        std::env::current_exe().map(Self::new)
    }
}

/// A spawned quest process and the streams attached to it
struct QuestProcess {
    child: Child,
    commands: Option<mpsc::Sender<Vec<u8>>>,
    stdout: mpsc::Receiver<Vec<u8>>,
    stdout_closed: bool,
    drainer: OutputDrainer,
    exited_at: Option<Instant>,
}

impl QuestProcess {
    fn spawn(program: &Program, arguments: &[String]) -> std::io::Result<Self> {
        let mut child = Command::new(&program.path)
            .args(&program.leading_args)
            .args(arguments)
            .envs(program.env.iter().map(|(key, value)| (key, value)))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let (tx, rx) = mpsc::channel(1000);

        // Forward raw stdout chunks; line splitting happens on the polling side
        if let Some(mut stdout) = child.stdout.take() {
            tokio::spawn(async move {
                let mut buf = vec![0u8; READ_CHUNK_SIZE];
                loop {
                    match stdout.read(&mut buf).await {
                        Ok(0) => break,
                        Ok(n) => {
                            if tx.send(buf[..n].to_vec()).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            debug!(error = %e, "quest stdout read failed");
                            break;
                        }
                    }
                }
            });
        }

        // The engine logs to stdout; stderr only goes to the application log
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(target: "questrun::quest_stderr", "{line}");
                }
            });
        }

        // Whole lines go through one writer so a slow reader never splits a command
        let commands = child.stdin.take().map(|mut stdin| {
            let (command_tx, mut command_rx) = mpsc::channel::<Vec<u8>>(COMMAND_QUEUE_SIZE);
            tokio::spawn(async move {
                while let Some(line) = command_rx.recv().await {
                    if let Err(e) = stdin.write_all(&line).await {
                        debug!(error = %e, "quest stdin write failed");
                        break;
                    }
                    if let Err(e) = stdin.flush().await {
                        debug!(error = %e, "quest stdin flush failed");
                        break;
                    }
                }
            });
            command_tx
        });

        Ok(Self {
            child,
            commands,
            stdout: rx,
            stdout_closed: false,
            drainer: OutputDrainer::new(),
            exited_at: None,
        })
    }

    /// Read pending stdout and report whether the process is over
    fn poll(&mut self, lines: &mut Vec<String>) -> bool {
        loop {
            match self.stdout.try_recv() {
                Ok(chunk) => lines.extend(self.drainer.drain(&chunk)),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.stdout_closed {
                        self.stdout_closed = true;
                        lines.extend(self.drainer.finish());
                    }
                    break;
                }
            }
        }

        if self.exited_at.is_none() {
            match self.child.try_wait() {
                Ok(Some(status)) => {
                    info!(%status, "quest process exited");
                    self.exited_at = Some(Instant::now());
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(error = %e, "failed to query quest process");
                    return true;
                }
            }
        }

        match self.exited_at {
            Some(_) if self.stdout_closed => true,
            Some(at) if at.elapsed() >= STDOUT_CLOSE_GRACE_PERIOD => {
                lines.extend(self.drainer.finish());
                true
            }
            _ => false,
        }
    }

    fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Ask the process to exit
    fn terminate(&mut self) {
        #[cfg(unix)]
        {
            use nix::sys::signal::{Signal, kill};
            use nix::unistd::Pid;

            if let Some(pid) = self.child.id()
                && let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM)
            {
                warn!(pid, error = %e, "failed to send SIGTERM to quest process");
            }
        }
        #[cfg(not(unix))]
        {
            if let Err(e) = self.child.start_kill() {
                warn!(error = %e, "failed to terminate quest process");
            }
        }
    }

    /// Terminate, wait for the grace period, then kill
    async fn shutdown(&mut self) {
        if !self.is_alive() {
            return;
        }
        self.terminate();
        if tokio::time::timeout(TERMINATE_GRACE_PERIOD, self.child.wait())
            .await
            .is_err()
        {
            warn!("quest process ignored terminate request, killing it");
            if let Err(e) = self.child.kill().await {
                warn!(error = %e, "failed to kill quest process");
            }
        }
    }
}

impl Drop for QuestProcess {
    fn drop(&mut self) {
        if !self.is_alive() {
            return;
        }

        self.terminate();
        let deadline = Instant::now() + TERMINATE_GRACE_PERIOD;
        while Instant::now() < deadline {
            if !self.is_alive() {
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }

        warn!("quest process ignored terminate request, killing it");
        if let Err(e) = self.child.start_kill() {
            warn!(error = %e, "failed to kill quest process");
            return;
        }
        // Reap it so no zombie outlives the runner
        for _ in 0..50 {
            if !self.is_alive() {
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
    }
}

/// Supervisor of one quest process
///
/// Starts the quest by re-invoking [`Program`] in launcher mode, turns its
/// standard output into line batches and writes console commands to its
/// standard input. Every result is delivered by [`QuestRunner::poll_events`]
/// on the caller's loop.
pub struct QuestRunner<P: SettingsProvider = Settings> {
    program: Option<Program>,
    settings: P,
    state: ProcessState,
    process: Option<QuestProcess>,
    events: VecDeque<RunnerEvent>,
    reset_on_poll: bool,
}

impl<P: SettingsProvider> QuestRunner<P> {
    /// Create a runner that launches quests through `program`
    ///
    /// `None` means the launcher could not be resolved; starting a quest then
    /// raises a warning and fails.
    pub fn new(program: Option<Program>, settings: P) -> Self {
        Self {
            program,
            settings,
            state: ProcessState::NotStarted,
            process: None,
            events: VecDeque::new(),
            reset_on_poll: false,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// Whether a quest was started and its finish not yet acknowledged
    pub fn is_started(&self) -> bool {
        self.state != ProcessState::NotStarted
    }

    /// Whether the quest process is alive
    pub fn is_running(&self) -> bool {
        self.state == ProcessState::Running
    }

    /// Process ID of the running quest
    pub fn pid(&self) -> Option<u32> {
        self.process.as_ref().and_then(QuestProcess::pid)
    }

    /// Start `quest_path`
    ///
    /// Does nothing if the path is empty or a quest is already started.
    /// Returns immediately: [`RunnerEvent::Running`] or
    /// [`RunnerEvent::Finished`] follows on the next poll.
    pub fn start(&mut self, quest_path: &str) {
        if quest_path.is_empty() || self.is_started() {
            return;
        }

        let program = match &self.program {
            Some(program) => program.clone(),
            None => {
                warn!("cannot start quest process: no program name");
                self.events.push_back(RunnerEvent::Warning(
                    "Cannot start quest process: no program name".to_string(),
                ));
                Program::new(PathBuf::new())
            }
        };

        let arguments = build_arguments(quest_path, &self.settings);
        debug!(program = %program.path.display(), ?arguments, "launching quest");

        match QuestProcess::spawn(&program, &arguments) {
            Ok(process) => {
                info!(pid = ?process.pid(), quest = quest_path, "quest process running");
                self.process = Some(process);
                self.state = ProcessState::Running;
                self.events.push_back(RunnerEvent::Running);
            }
            Err(e) => {
                warn!(error = %e, quest = quest_path, "failed to launch quest process");
                self.finish();
            }
        }
    }

    /// Ask the running quest to exit
    ///
    /// Returns immediately; [`RunnerEvent::Finished`] follows once it exits.
    pub fn stop(&mut self) {
        if !self.is_running() {
            return;
        }
        if let Some(process) = self.process.as_mut() {
            info!(pid = ?process.pid(), "stopping quest process");
            process.terminate();
        }
    }

    /// Send a line of Lua code to the running quest
    ///
    /// Returns `true` once the whole line is queued for the quest's stdin,
    /// even if the code later fails in the quest. Never waits on the pipe.
    pub fn execute_command(&self, command: &str) -> bool {
        if !self.is_running() {
            return false;
        }
        let Some(commands) = self.process.as_ref().and_then(|p| p.commands.as_ref()) else {
            return false;
        };

        let mut line = command.as_bytes().to_vec();
        line.push(b'\n');

        match commands.try_send(line) {
            Ok(()) => {
                debug!(command, "command queued for quest process");
                true
            }
            Err(TrySendError::Full(_)) => {
                warn!("quest process is not reading commands, dropping command");
                false
            }
            Err(TrySendError::Closed(_)) => {
                warn!("quest process stdin is closed");
                false
            }
        }
    }

    /// Collect notifications produced since the previous poll, in order
    ///
    /// A runner whose [`RunnerEvent::Finished`] was returned by the previous
    /// poll goes back to [`ProcessState::NotStarted`] here.
    pub fn poll_events(&mut self) -> Vec<RunnerEvent> {
        if self.reset_on_poll {
            self.reset_on_poll = false;
            if self.state == ProcessState::Finished {
                self.state = ProcessState::NotStarted;
            }
        }

        if self.state == ProcessState::Running {
            let mut lines = Vec::new();
            let over = match self.process.as_mut() {
                Some(process) => process.poll(&mut lines),
                None => true,
            };
            if !lines.is_empty() {
                self.events.push_back(RunnerEvent::OutputProduced(lines));
            }
            if over {
                self.finish();
            }
        }

        let events: Vec<RunnerEvent> = self.events.drain(..).collect();
        if events.contains(&RunnerEvent::Finished) {
            self.reset_on_poll = true;
        }
        events
    }

    /// Stop the quest and wait for it, killing it after the grace period
    pub async fn shutdown(&mut self) {
        if let Some(process) = self.process.as_mut() {
            process.shutdown().await;
        }
        if self.is_running() {
            self.finish();
        }
    }

    fn finish(&mut self) {
        self.process = None;
        self.state = ProcessState::Finished;
        self.events.push_back(RunnerEvent::Finished);
    }
}
