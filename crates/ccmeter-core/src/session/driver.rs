//! PTY session driver.
//!
//! Owns the pseudo-terminal pair and the child process for exactly one
//! capture. A reader thread pumps master-side bytes into a channel; the
//! driver drains it with a bounded `recv_timeout`, so a stretch of silence
//! is the completion signal for each phase. The target has no explicit
//! "done rendering" marker, which makes this a documented heuristic: a
//! render slower than the idle window is mistaken for completion.

use std::io::{Read, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use portable_pty::{native_pty_system, Child, CommandBuilder, PtySize};
use thiserror::Error;
use tracing::{debug, warn};

use super::script::{Input, Phase};

/// Fatal session errors. Everything else (no output, unparseable output)
/// is represented in the captured bytes, not as an error.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to allocate pty: {0}")]
    Pty(anyhow::Error),
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        source: anyhow::Error,
    },
}

/// Configuration for one terminal session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Program to spawn, resolved via PATH
    pub program: String,
    pub args: Vec<String>,
    /// Terminal geometry, set before spawn. The target's renderer branches
    /// on width, so this must match the layout the parser expects.
    pub rows: u16,
    pub cols: u16,
    /// Idle window for the initial read, before any input is sent. Startup
    /// rendering is the slowest part of the session.
    pub startup_timeout: Duration,
    /// Default idle window after each phase, unless the phase overrides it
    pub idle_timeout: Duration,
    /// Hard cap on the whole session, scripted delays included
    pub overall_deadline: Duration,
    /// How long to wait after SIGTERM before force-killing the child
    pub term_grace: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            program: "claude".to_string(),
            args: Vec::new(),
            rows: 50,
            cols: 120,
            startup_timeout: Duration::from_secs(4),
            idle_timeout: Duration::from_secs(1),
            overall_deadline: Duration::from_secs(60),
            term_grace: Duration::from_secs(2),
        }
    }
}

/// Run one scripted session and return every byte the target rendered.
///
/// Zero captured bytes is not an error; the caller classifies an empty
/// capture. Only spawn and pty allocation failures are fatal.
pub fn run_session(config: &SessionConfig, phases: &[Phase]) -> Result<Vec<u8>, SessionError> {
    let mut session = PtySession::spawn(config)?;
    let captured = session.drive(phases);
    // Drop terminates the child and releases the descriptors on every path
    drop(session);
    Ok(captured)
}

/// One live pty session. The pty pair, child handle, and reader thread are
/// owned here exclusively and released together in `Drop`, so every exit
/// path (completion, deadline, panic in the caller) tears the session down.
struct PtySession {
    child: Box<dyn Child + Send + Sync>,
    writer: Box<dyn Write + Send>,
    chunks: Receiver<Vec<u8>>,
    reader: Option<JoinHandle<()>>,
    // Master kept alive until drop; closing it early would EOF the child
    _master: Box<dyn portable_pty::MasterPty + Send>,
    started: Instant,
    config: SessionConfig,
    /// Child closed its side of the terminal; treated as normal termination
    eof: bool,
}

impl PtySession {
    fn spawn(config: &SessionConfig) -> Result<Self, SessionError> {
        let pty_system = native_pty_system();
        // Geometry goes in before the spawn so the target never renders at
        // a default size
        let pair = pty_system
            .openpty(PtySize {
                rows: config.rows,
                cols: config.cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(SessionError::Pty)?;

        let mut cmd = CommandBuilder::new(&config.program);
        cmd.args(&config.args);
        if let Ok(cwd) = std::env::current_dir() {
            cmd.cwd(cwd);
        }

        let child = pair.slave.spawn_command(cmd).map_err(|e| SessionError::Spawn {
            program: config.program.clone(),
            source: e,
        })?;
        // The slave side belongs to the child now
        drop(pair.slave);

        debug!(
            "spawned {} (pid {:?}) on a {}x{} pty",
            config.program,
            child.process_id(),
            config.cols,
            config.rows
        );

        let mut reader = pair
            .master
            .try_clone_reader()
            .map_err(SessionError::Pty)?;
        let writer = pair.master.take_writer().map_err(SessionError::Pty)?;

        let (tx, rx) = mpsc::channel::<Vec<u8>>();
        let reader_thread = thread::spawn(move || {
            let mut buf = [0u8; 4096];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        debug!("pty read ended: {}", e);
                        break;
                    }
                }
            }
        });

        Ok(Self {
            child,
            writer,
            chunks: rx,
            reader: Some(reader_thread),
            _master: pair.master,
            started: Instant::now(),
            config: config.clone(),
            eof: false,
        })
    }

    /// Run the scripted phases and accumulate everything rendered.
    fn drive(&mut self, phases: &[Phase]) -> Vec<u8> {
        let mut captured = Vec::new();

        // Let the startup screen finish before the first keystroke
        self.read_until_idle(self.config.startup_timeout, &mut captured);

        for phase in phases {
            if self.eof {
                debug!("child closed the terminal; ending script early");
                break;
            }
            if self.deadline_left().is_zero() {
                warn!(
                    "session deadline of {:?} reached with script unfinished",
                    self.config.overall_deadline
                );
                break;
            }

            self.send_input(&phase.input);
            let idle = phase.idle_timeout.unwrap_or(self.config.idle_timeout);
            self.read_until_idle(idle, &mut captured);
        }

        debug!("captured {} bytes", captured.len());
        captured
    }

    /// Read until no data arrives within `idle`. Any chunk resets the idle
    /// clock. Channel disconnect means the reader saw EOF: the child left,
    /// which ends the phase normally.
    fn read_until_idle(&mut self, idle: Duration, out: &mut Vec<u8>) {
        loop {
            let wait = idle.min(self.deadline_left());
            if wait.is_zero() {
                break;
            }
            match self.chunks.recv_timeout(wait) {
                Ok(chunk) => out.extend_from_slice(&chunk),
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    self.eof = true;
                    break;
                }
            }
        }
    }

    fn send_input(&mut self, input: &Input) {
        let result = match input {
            Input::Type { text, char_delay } => {
                let mut buf = [0u8; 4];
                let mut res = Ok(());
                for ch in text.chars() {
                    res = self
                        .writer
                        .write_all(ch.encode_utf8(&mut buf).as_bytes())
                        .and_then(|_| self.writer.flush());
                    if res.is_err() {
                        break;
                    }
                    thread::sleep(*char_delay);
                }
                res
            }
            Input::Raw(bytes) => self
                .writer
                .write_all(bytes)
                .and_then(|_| self.writer.flush()),
        };

        if let Err(e) = result {
            // Write failure means the child is gone; the read loop will
            // observe the disconnect
            debug!("pty write failed: {}", e);
            self.eof = true;
        }
    }

    fn deadline_left(&self) -> Duration {
        self.config
            .overall_deadline
            .saturating_sub(self.started.elapsed())
    }

    /// SIGTERM, bounded grace wait, then SIGKILL.
    fn terminate(&mut self) {
        if matches!(self.child.try_wait(), Ok(Some(_))) {
            return;
        }

        if let Some(pid) = self.child.process_id() {
            debug!("sending SIGTERM to pid {}", pid);
            let _ = signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
        }

        let waited = Instant::now();
        while waited.elapsed() < self.config.term_grace {
            if matches!(self.child.try_wait(), Ok(Some(_))) {
                return;
            }
            thread::sleep(Duration::from_millis(50));
        }

        warn!("child ignored SIGTERM; force-killing");
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl Drop for PtySession {
    fn drop(&mut self) {
        self.terminate();
        // The reader unblocks once the child is gone and the slave closes
        if let Some(handle) = self.reader.take() {
            join_with_timeout(handle, Duration::from_secs(1));
        }
    }
}

/// Join a thread with a timeout, abandoning it if it does not finish in time
fn join_with_timeout<T>(handle: JoinHandle<T>, timeout: Duration) {
    let start = Instant::now();
    loop {
        if handle.is_finished() {
            let _ = handle.join();
            return;
        }
        if start.elapsed() >= timeout {
            debug!("reader thread join timed out; abandoning it");
            return;
        }
        thread::sleep(Duration::from_millis(10));
    }
}
