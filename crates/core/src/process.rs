//! Lifecycle of a single script process.
//!
//! [`ProcessSession`] spawns the interpreter with piped stdout/stderr and hands
//! the child to a supervisor task. The supervisor races process exit against
//! the run deadline and a cancellation request, and reports everything it sees
//! as [`SessionMessage`]s on the controller's channel. Reader tasks only read;
//! they never touch controller state.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::script_definitions::ScriptDescriptor;

pub type SessionId = u64;

pub const PREVIEW_FLAG: &str = "--preview";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Runs with `--preview` and buffers the whole output.
    Preview,
    /// Runs with the user's arguments and streams output line by line.
    Run,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl Display for StreamKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamKind::Stdout => formatter.write_str("stdout"),
            StreamKind::Stderr => formatter.write_str("stderr"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    pub stream: StreamKind,
    pub text: String,
}

/// Whole output of a preview run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    Line(RawLine),
    /// The process exited on its own. `captured` is only set in preview mode.
    Finished {
        exit_code: Option<i32>,
        captured: Option<CapturedOutput>,
    },
    /// The run deadline passed; `Killed` follows once the process is gone.
    TimedOut,
    Killed,
}

impl ProcessEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessEvent::Finished { .. } | ProcessEvent::Killed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMessage {
    pub session: SessionId,
    pub event: ProcessEvent,
}

pub type MessageSender = mpsc::UnboundedSender<SessionMessage>;

/// Everything needed to launch a script.
#[derive(Debug, Clone)]
pub struct Launch {
    pub interpreter: PathBuf,
    pub script: PathBuf,
    /// Script arguments for run mode; ignored by previews.
    pub arguments: Vec<String>,
    pub environment: HashMap<String, String>,
    pub bundled_runtime: bool,
    /// Run mode deadline, measured from process start.
    pub run_timeout: Duration,
    pub stop_grace: Duration,
}

impl Launch {
    /// The arguments passed to the interpreter for `mode`.
    pub fn interpreter_arguments(&self, mode: Mode) -> Vec<String> {
        let mut arguments = vec![self.script.to_string_lossy().to_string()];
        match mode {
            Mode::Preview => arguments.push(PREVIEW_FLAG.to_string()),
            Mode::Run => arguments.extend(self.arguments.iter().cloned()),
        }
        arguments
    }

    fn command(&self, mode: Mode) -> Command {
        let mut command = Command::new(&self.interpreter);
        command
            .args(self.interpreter_arguments(mode))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .env("PYTHONUNBUFFERED", "1");

        if self.bundled_runtime {
            if let Some(runtime_dir) = self.interpreter.parent() {
                command
                    .env("PYTHONPATH", runtime_dir)
                    .env("PYTHONHOME", runtime_dir);
            }
        }

        command.envs(&self.environment);

        #[cfg(windows)]
        {
            const CREATE_NO_WINDOW: u32 = 0x0800_0000;
            command.creation_flags(CREATE_NO_WINDOW);
        }

        command
    }
}

/// Aborts the reader when dropped, so an abandoned supervisor cannot leave a
/// reader behind.
struct ReaderTask(JoinHandle<String>);

impl ReaderTask {
    async fn join(mut self, grace: Duration) -> String {
        match tokio::time::timeout(grace, &mut self.0).await {
            Ok(Ok(captured)) => captured,
            Ok(Err(e)) => {
                warn!("Output reader failed: {}", e);
                String::new()
            }
            Err(_) => {
                warn!("Output reader did not finish within {:?}", grace);
                String::new()
            }
        }
    }
}

impl Drop for ReaderTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

enum Outcome {
    Exited(std::io::Result<std::process::ExitStatus>),
    Cancelled,
    TimedOut,
}

/// One running script process.
pub struct ProcessSession {
    id: SessionId,
    descriptor: ScriptDescriptor,
    mode: Mode,
    started_at: Instant,
    stop_grace: Duration,
    cancel: Option<oneshot::Sender<()>>,
    supervisor: Option<JoinHandle<()>>,
}

impl ProcessSession {
    /// Spawns the script and starts supervising it.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExecutableNotFound`] if the interpreter does not exist
    /// and [`Error::SpawnFailed`] if the OS refuses to start it.
    pub fn start(
        id: SessionId,
        descriptor: ScriptDescriptor,
        mode: Mode,
        launch: &Launch,
        sink: MessageSender,
    ) -> Result<Self> {
        if !launch.interpreter.is_file() {
            return Err(Error::ExecutableNotFound {
                searched: vec![launch.interpreter.display().to_string()],
            });
        }

        let mut child = launch.command(mode).spawn().map_err(|e| {
            Error::spawn_failed(launch.interpreter.display().to_string(), e)
        })?;

        info!(
            "Started {} ({:?} mode, pid {:?}) as session {}",
            descriptor.file_name,
            mode,
            child.id(),
            id
        );

        let deadline = match mode {
            Mode::Run => Some(tokio::time::Instant::now() + launch.run_timeout),
            Mode::Preview => None,
        };

        let readers = [
            child
                .stdout
                .take()
                .map(|stdout| spawn_reader(stdout, StreamKind::Stdout, mode, id, sink.clone())),
            child
                .stderr
                .take()
                .map(|stderr| spawn_reader(stderr, StreamKind::Stderr, mode, id, sink.clone())),
        ];

        let (cancel_tx, cancel_rx) = oneshot::channel();
        let supervisor = tokio::spawn(supervise(
            child,
            id,
            mode,
            readers,
            deadline,
            cancel_rx,
            launch.stop_grace,
            sink,
        ));

        Ok(Self {
            id,
            descriptor,
            mode,
            started_at: Instant::now(),
            stop_grace: launch.stop_grace,
            cancel: Some(cancel_tx),
            supervisor: Some(supervisor),
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn descriptor(&self) -> &ScriptDescriptor {
        &self.descriptor
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Time since the process was spawned.
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Kills the process and waits, bounded, for the supervisor to wind down.
    ///
    /// Calling this more than once, or after the process exited, does nothing.
    pub async fn stop(&mut self) {
        let Some(cancel) = self.cancel.take() else {
            return;
        };
        // The supervisor is gone already if the process exited on its own.
        let _ = cancel.send(());

        if let Some(mut supervisor) = self.supervisor.take() {
            let limit = self.stop_grace * 2;
            if tokio::time::timeout(limit, &mut supervisor).await.is_err() {
                warn!(
                    "Session {} did not stop within {:?}, abandoning it",
                    self.id, limit
                );
                supervisor.abort();
            }
        }
    }
}

impl Drop for ProcessSession {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }
}

fn spawn_reader<R>(
    reader: R,
    stream: StreamKind,
    mode: Mode,
    session: SessionId,
    sink: MessageSender,
) -> ReaderTask
where
    R: AsyncRead + Unpin + Send + 'static,
{
    ReaderTask(tokio::spawn(read_stream(reader, stream, mode, session, sink)))
}

/// Reads `reader` line by line. Run mode forwards each non-empty line as it
/// arrives; preview mode collects them and returns the whole text.
async fn read_stream<R>(
    reader: R,
    stream: StreamKind,
    mode: Mode,
    session: SessionId,
    sink: MessageSender,
) -> String
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buffer = Vec::new();
    let mut captured = String::new();

    loop {
        buffer.clear();
        match reader.read_until(b'\n', &mut buffer).await {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&buffer);
                let text = text.trim_end_matches(['\r', '\n']);
                if text.is_empty() {
                    continue;
                }
                debug!("[{}] {}", stream, text);

                match mode {
                    Mode::Preview => {
                        captured.push_str(text);
                        captured.push('\n');
                    }
                    Mode::Run => {
                        let message = SessionMessage {
                            session,
                            event: ProcessEvent::Line(RawLine {
                                stream,
                                text: text.to_string(),
                            }),
                        };
                        if sink.send(message).is_err() {
                            // Controller is gone; nobody is listening.
                            break;
                        }
                    }
                }
            }
            Err(e) => {
                warn!("Error reading {} of session {}: {}", stream, session, e);
                break;
            }
        }
    }

    captured
}

#[allow(clippy::too_many_arguments)]
async fn supervise(
    mut child: Child,
    session: SessionId,
    mode: Mode,
    readers: [Option<ReaderTask>; 2],
    deadline: Option<tokio::time::Instant>,
    mut cancel: oneshot::Receiver<()>,
    grace: Duration,
    sink: MessageSender,
) {
    let deadline_elapsed = async {
        match deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline_elapsed);

    // Biased so that an exit observed together with the deadline counts as
    // a normal exit.
    let outcome = tokio::select! {
        biased;
        status = child.wait() => Outcome::Exited(status),
        _ = &mut cancel => Outcome::Cancelled,
        () = &mut deadline_elapsed => Outcome::TimedOut,
    };

    let send = |event: ProcessEvent| {
        let _ = sink.send(SessionMessage { session, event });
    };

    match outcome {
        Outcome::Exited(Ok(status)) => {
            let [stdout, stderr] = readers;
            let stdout = match stdout {
                Some(reader) => reader.join(grace).await,
                None => String::new(),
            };
            let stderr = match stderr {
                Some(reader) => reader.join(grace).await,
                None => String::new(),
            };

            info!("Session {} exited with {}", session, status);
            let captured = match mode {
                Mode::Preview => Some(CapturedOutput { stdout, stderr }),
                Mode::Run => None,
            };
            send(ProcessEvent::Finished {
                exit_code: status.code(),
                captured,
            });
        }
        Outcome::Exited(Err(e)) => {
            warn!("Waiting for session {} failed: {}", session, e);
            drop(readers);
            send(ProcessEvent::Finished {
                exit_code: None,
                captured: None,
            });
        }
        Outcome::Cancelled => {
            drop(readers);
            kill(&mut child, session, grace).await;
            send(ProcessEvent::Killed);
        }
        Outcome::TimedOut => {
            drop(readers);
            warn!("Session {} hit its deadline, killing it", session);
            send(ProcessEvent::TimedOut);
            kill(&mut child, session, grace).await;
            send(ProcessEvent::Killed);
        }
    }
}

async fn kill(child: &mut Child, session: SessionId, grace: Duration) {
    if let Err(e) = child.start_kill() {
        // Most likely the process already exited.
        debug!("Kill of session {} failed: {}", session, e);
    }

    match tokio::time::timeout(grace, child.wait()).await {
        Ok(Ok(status)) => info!("Session {} killed ({})", session, status),
        Ok(Err(e)) => warn!("Waiting for killed session {} failed: {}", session, e),
        Err(_) => warn!("Session {} did not exit within {:?} of being killed", session, grace),
    }
}
