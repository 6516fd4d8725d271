//! Shell command execution.
//!
//! The live runner starts `sh -c <command>` in its own process group so a
//! timeout can kill the whole pipeline, not just the shell. stdout and
//! stderr are drained on helper threads while the main thread polls for
//! exit; each stream keeps at most `max_output` bytes but is read to EOF so
//! the child never blocks on a full pipe. A background process that keeps a
//! pipe open does not hold the reply back: whatever was read by the grace
//! deadline is returned and the output is flagged incomplete.

use std::collections::BTreeMap;
use std::ffi::CString;
use std::io::{self, Read, Write};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Marker appended to a stream cut at `max_output` bytes.
pub const TRUNCATION_MARKER: &str = "\n... [output truncated]";

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// How long to wait for a reader after the child is gone. Background
/// processes that inherited the pipe must not hold the response hostage.
const READER_GRACE: Duration = Duration::from_millis(500);

/// One fully validated command invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSpec {
    pub command: String,
    pub working_dir: String,
    pub env_vars: BTreeMap<String, String>,
    pub input: String,
    pub timeout: Duration,
    pub max_output: usize,
}

/// Exit status and captured output of a finished command.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutput {
    pub return_code: i32,
    pub stdout: String,
    pub stderr: String,
    /// Wall-clock seconds.
    pub execution_time: f64,
    /// A pipe was still open after the shell exited; the streams hold only
    /// what had been read by then.
    pub output_incomplete: bool,
}

impl CommandOutput {
    pub fn succeeded(&self) -> bool {
        self.return_code == 0
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("Working directory does not exist: {0}")]
    WorkingDirMissing(String),

    #[error("No write access to working directory: {0}")]
    WorkingDirNotWritable(String),

    #[error("failed to spawn command: {0}")]
    Spawn(#[source] io::Error),

    #[error("failed waiting for command: {0}")]
    Wait(#[source] io::Error),

    #[error("Command timed out after {seconds} seconds")]
    TimedOut {
        seconds: u64,
        stdout: String,
        stderr: String,
    },
}

/// Runs validated commands.
pub trait CommandRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, RunError>;
}

// ── Live runner ─────────────────────────────────────────────────────────

/// Runs commands through `/bin/sh`.
#[derive(Debug, Default)]
pub struct SubprocessRunner;

impl CommandRunner for SubprocessRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, RunError> {
        let dir = Path::new(&spec.working_dir);
        if !dir.is_dir() {
            return Err(RunError::WorkingDirMissing(spec.working_dir.clone()));
        }
        if !is_writable(dir) {
            return Err(RunError::WorkingDirNotWritable(spec.working_dir.clone()));
        }

        let start = Instant::now();
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&spec.command)
            .current_dir(dir)
            .envs(&spec.env_vars)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0)
            .spawn()
            .map_err(RunError::Spawn)?;
        let pgid = child.id() as libc::pid_t;
        debug!(pid = pgid, command = %spec.command, "spawned command");

        if let Some(mut stdin) = child.stdin.take() {
            let input = spec.input.clone().into_bytes();
            thread::spawn(move || {
                // BrokenPipe is expected when the command ignores stdin.
                match stdin.write_all(&input) {
                    Ok(()) => {}
                    Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
                    Err(e) => debug!(error = %e, "failed to write command stdin"),
                }
            });
        }

        let stdout_capture = child.stdout.take().map(|pipe| drain(pipe, spec.max_output));
        let stderr_capture = child.stderr.take().map(|pipe| drain(pipe, spec.max_output));

        let status = wait_with_deadline(&mut child, pgid, spec.timeout);

        let (stdout, stdout_open) = collect(stdout_capture);
        let (stderr, stderr_open) = collect(stderr_capture);
        let execution_time = start.elapsed().as_secs_f64();

        match status {
            Ok(Some(status)) => Ok(CommandOutput {
                return_code: exit_code(status),
                stdout,
                stderr,
                execution_time,
                output_incomplete: stdout_open || stderr_open,
            }),
            Ok(None) => {
                warn!(
                    pid = pgid,
                    timeout_secs = spec.timeout.as_secs(),
                    "command timed out; killed process group"
                );
                Err(RunError::TimedOut {
                    seconds: spec.timeout.as_secs(),
                    stdout,
                    stderr,
                })
            }
            Err(e) => Err(RunError::Wait(e)),
        }
    }
}

/// Poll until exit or deadline. `Ok(None)` means the group was killed.
fn wait_with_deadline(
    child: &mut Child,
    pgid: libc::pid_t,
    timeout: Duration,
) -> io::Result<Option<ExitStatus>> {
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(Some(status)),
            Ok(None) if Instant::now() >= deadline => {
                kill_group(pgid);
                let _ = child.kill();
                let _ = child.wait();
                return Ok(None);
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                kill_group(pgid);
                let _ = child.wait();
                return Err(e);
            }
        }
    }
}

fn kill_group(pgid: libc::pid_t) {
    // SAFETY: killpg only sends a signal; the group was created by spawn.
    let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if rc != 0 {
        debug!(pgid, error = %io::Error::last_os_error(), "killpg failed");
    }
}

fn is_writable(dir: &Path) -> bool {
    let Ok(path) = CString::new(dir.as_os_str().as_bytes()) else {
        return false;
    };
    // SAFETY: path is a valid NUL-terminated string for the call's duration.
    unsafe { libc::access(path.as_ptr(), libc::W_OK) == 0 }
}

/// Shell convention: a signal-terminated child reports 128 + signal.
fn exit_code(status: ExitStatus) -> i32 {
    status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(-1)
}

/// Bytes read from one pipe so far.
#[derive(Debug, Default)]
struct Capture {
    kept: Vec<u8>,
    truncated: bool,
    closed: bool,
}

type SharedCapture = Arc<(Mutex<Capture>, Condvar)>;

fn drain<R: Read + Send + 'static>(mut pipe: R, limit: usize) -> SharedCapture {
    let shared = SharedCapture::default();
    let writer = Arc::clone(&shared);
    thread::spawn(move || {
        let (lock, done) = &*writer;
        let mut buf = [0u8; 8192];
        loop {
            let n = match pipe.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            };
            let mut capture = lock.lock().unwrap_or_else(PoisonError::into_inner);
            let room = limit.saturating_sub(capture.kept.len());
            if n > room {
                capture.truncated = true;
            }
            capture.kept.extend_from_slice(&buf[..n.min(room)]);
        }
        lock.lock().unwrap_or_else(PoisonError::into_inner).closed = true;
        done.notify_all();
    });
    shared
}

/// Text read from a pipe, and whether the pipe was still open at the
/// grace deadline.
fn collect(capture: Option<SharedCapture>) -> (String, bool) {
    let Some(shared) = capture else {
        return (String::new(), false);
    };
    let (lock, done) = &*shared;
    let guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
    let (capture, _) = done
        .wait_timeout_while(guard, READER_GRACE, |c| !c.closed)
        .unwrap_or_else(PoisonError::into_inner);
    if !capture.closed {
        warn!(
            bytes = capture.kept.len(),
            "output pipe still open after exit; returning partial stream"
        );
    }
    (render(&capture.kept, capture.truncated), !capture.closed)
}

fn render(bytes: &[u8], truncated: bool) -> String {
    let mut text = String::from_utf8_lossy(bytes).into_owned();
    if truncated {
        text.push_str(TRUNCATION_MARKER);
    }
    text
}

// ── Simulated runner ────────────────────────────────────────────────────

/// Canned output keyed on the executable; never spawns anything.
#[derive(Debug, Default)]
pub struct SimulatedRunner;

impl SimulatedRunner {
    fn canned_stdout(command: &str, executable: &str) -> String {
        match executable {
            "ls" => "file1.txt\nfile2.log\ndirectory1/\ntotal 4".to_string(),
            "ps" => "PID   USER     TIME  COMMAND\n1234  root     0:01  nginx\n5678  app      0:05  python app.py".to_string(),
            "systemctl" if command.contains("status") => "● nginx.service - The nginx HTTP server\n   Loaded: loaded (/lib/systemd/system/nginx.service; enabled)\n   Active: active (running)".to_string(),
            "systemctl" => "Service operation completed successfully".to_string(),
            "grep" => "2024-01-15 10:30:25 ERROR: Connection timeout\n2024-01-15 10:31:15 ERROR: Database unavailable".to_string(),
            "df" => "Filesystem     1K-blocks    Used Available Use%\n/dev/sda1       10485760 5242880   5242880  50% /".to_string(),
            _ => format!("Simulated output for command: {command}"),
        }
    }
}

impl CommandRunner for SimulatedRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, RunError> {
        let start = Instant::now();
        let executable = shell_words::split(&spec.command)
            .ok()
            .and_then(|tokens| tokens.into_iter().next())
            .map(|first| executable_name(&first).to_string())
            .unwrap_or_default();

        let (return_code, stdout, stderr) = if executable == "false" {
            (1, String::new(), format!("Simulated error for command: {}", spec.command))
        } else {
            (0, Self::canned_stdout(&spec.command, &executable), String::new())
        };

        info!(
            command = %spec.command,
            working_dir = %spec.working_dir,
            return_code,
            stdout_len = stdout.len(),
            "simulated command execution"
        );

        let clip = |text: String| {
            if text.len() > spec.max_output {
                render(&text.as_bytes()[..spec.max_output], true)
            } else {
                text
            }
        };

        Ok(CommandOutput {
            return_code,
            stdout: clip(stdout),
            stderr: clip(stderr),
            execution_time: start.elapsed().as_secs_f64(),
            output_incomplete: false,
        })
    }
}

/// Basename of a command token (`/usr/bin/ls` → `ls`).
pub fn executable_name(token: &str) -> &str {
    token.rsplit('/').next().unwrap_or(token)
}
