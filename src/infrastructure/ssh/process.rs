//! Bounded child processes
//!
//! ssh, rsync and scp all run through here: output is captured on reader
//! threads, a wall-clock limit kills the child, and the child is kept out of
//! the terminal's foreground process group so Ctrl+C only reaches treemirror.

use std::io::{self, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// How often a running child is polled for completion
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Exit status and captured output of a finished child
#[derive(Debug)]
pub(crate) struct Captured {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl Captured {
    /// Exit code, `-1` when the child was killed by a signal.
    pub fn code(&self) -> i32 {
        self.status.code().unwrap_or(-1)
    }
}

/// Start the child in its own process group.
///
/// A terminal interrupt then sets treemirror's flag without killing the
/// transfer or remote command in flight.
pub(crate) fn detach_from_terminal(cmd: &mut Command) -> &mut Command {
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }
    cmd
}

/// Wait for `child`, killing it once `timeout` has elapsed.
///
/// `Ok(None)` means the limit was hit.
pub(crate) fn wait_with_timeout(
    child: &mut Child,
    timeout: Duration,
) -> io::Result<Option<ExitStatus>> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if start.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Run `cmd` to completion or until `timeout`, feeding `input` on stdin.
///
/// Returns `Ok(None)` when the child was killed for running too long.
pub(crate) fn run_captured(
    mut cmd: Command,
    input: Option<String>,
    timeout: Duration,
) -> io::Result<Option<Captured>> {
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    if input.is_some() {
        cmd.stdin(Stdio::piped());
    } else {
        cmd.stdin(Stdio::null());
    }
    detach_from_terminal(&mut cmd);

    let mut child = cmd.spawn()?;

    let writer = match (input, child.stdin.take()) {
        (Some(body), Some(mut stdin)) => Some(thread::spawn(move || {
            let _ = stdin.write_all(body.as_bytes());
        })),
        _ => None,
    };
    let stdout = spawn_reader(child.stdout.take());
    let stderr = spawn_reader(child.stderr.take());

    let status = wait_with_timeout(&mut child, timeout)?;

    if let Some(writer) = writer {
        let _ = writer.join();
    }
    let stdout = stdout.join().unwrap_or_default();
    let stderr = stderr.join().unwrap_or_default();

    Ok(status.map(|status| Captured {
        status,
        stdout,
        stderr,
    }))
}
