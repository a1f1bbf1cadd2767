//! Running external tools as scoped child processes.
//!
//! A spawned tool is owned by a [`ChildGuard`]: if anything goes wrong
//! before the child has been waited on, dropping the guard kills and reaps
//! it. Output is read line by line until end of stream, and only then is the
//! exit status inspected.

use std::io::{self, BufRead, BufReader, Read};
use std::process::{Child, ChildStderr, Command, ExitStatus, Stdio};
use std::thread;

/// How many trailing stderr lines to keep for error messages.
const STDERR_TAIL_LINES: usize = 20;

/// Result of a finished tool run.
#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    /// Last lines the tool wrote to stderr.
    pub stderr_tail: Vec<String>,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// One-line description of a failed run, for error messages.
    pub fn failure_message(&self, tool: &str) -> String {
        match self.stderr_tail.last() {
            Some(line) => format!("{tool} exited with {}: {line}", self.status),
            None => format!("{tool} exited with {}", self.status),
        }
    }
}

/// Owns a child process until it has been reaped.
struct ChildGuard {
    child: Child,
    reaped: bool,
}

impl ChildGuard {
    fn spawn(cmd: &mut Command) -> io::Result<Self> {
        Ok(Self {
            child: cmd.spawn()?,
            reaped: false,
        })
    }

    fn wait(&mut self) -> io::Result<ExitStatus> {
        let status = self.child.wait()?;
        self.reaped = true;
        Ok(status)
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if !self.reaped {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Run `cmd`, handing each stdout line to `on_line` as it arrives.
///
/// Stderr is drained concurrently (so a chatty tool cannot block on a full
/// pipe), logged at debug level, and its tail kept for diagnostics.
pub fn run_streaming(cmd: &mut Command, mut on_line: impl FnMut(&str)) -> io::Result<ToolOutput> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    log::debug!("Running {cmd:?}");

    let mut guard = ChildGuard::spawn(cmd)?;
    let stderr_reader = guard.child.stderr.take().map(spawn_stderr_drain);

    if let Some(stdout) = guard.child.stdout.take() {
        for_each_line(stdout, |line| on_line(line))?;
    }

    let stderr_tail = match stderr_reader {
        Some(handle) => handle.join().unwrap_or_default(),
        None => Vec::new(),
    };
    let status = guard.wait()?;
    Ok(ToolOutput {
        status,
        stderr_tail,
    })
}

/// Run `cmd` to completion and collect its stdout.
pub fn run_captured(cmd: &mut Command) -> io::Result<(ToolOutput, Vec<u8>)> {
    let mut stdout = Vec::new();
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    log::debug!("Running {cmd:?}");

    let mut guard = ChildGuard::spawn(cmd)?;
    let stderr_reader = guard.child.stderr.take().map(spawn_stderr_drain);
    if let Some(mut out) = guard.child.stdout.take() {
        out.read_to_end(&mut stdout)?;
    }
    let stderr_tail = match stderr_reader {
        Some(handle) => handle.join().unwrap_or_default(),
        None => Vec::new(),
    };
    let status = guard.wait()?;
    Ok((
        ToolOutput {
            status,
            stderr_tail,
        },
        stdout,
    ))
}

/// Feed `reader` to `on_line` one line at a time until end of stream.
///
/// Lines are decoded lossily: tools echo stream metadata in whatever
/// encoding the broadcaster used, and the pipe must be read to the end
/// regardless of its content.
fn for_each_line(reader: impl Read, mut on_line: impl FnMut(&str)) -> io::Result<()> {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        on_line(line.trim_end_matches(['\n', '\r']));
    }
}

fn spawn_stderr_drain(stderr: ChildStderr) -> thread::JoinHandle<Vec<String>> {
    thread::spawn(move || {
        let mut tail = Vec::new();
        let drained = for_each_line(stderr, |line| {
            log::debug!("  {line}");
            if tail.len() == STDERR_TAIL_LINES {
                tail.remove(0);
            }
            tail.push(line.to_string());
        });
        if let Err(e) = drained {
            log::debug!("Stopped reading tool stderr: {e}");
        }
        tail
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_streams_stdout_lines() {
        let mut lines = Vec::new();
        let output = run_streaming(
            Command::new("sh").args(["-c", "echo one; echo two; echo oops >&2"]),
            |l| lines.push(l.to_string()),
        )
        .unwrap();
        assert!(output.success());
        assert_eq!(lines, vec!["one", "two"]);
        assert_eq!(output.stderr_tail, vec!["oops"]);
    }

    #[test]
    fn test_reports_exit_status() {
        let output = run_streaming(Command::new("sh").args(["-c", "echo bad >&2; exit 3"]), |_| {})
            .unwrap();
        assert!(!output.success());
        let msg = output.failure_message("sh");
        assert!(msg.starts_with("sh exited with"));
        assert!(msg.ends_with("bad"));
    }

    #[test]
    fn test_captures_stdout() {
        let (output, stdout) =
            run_captured(Command::new("sh").args(["-c", "printf '{}'"])).unwrap();
        assert!(output.success());
        assert_eq!(stdout, b"{}");
    }

    #[test]
    fn test_undecodable_stderr_keeps_draining() {
        let script = "printf 'caf\\351\\n' >&2; \
                      i=0; while [ $i -lt 5000 ]; do echo \"frame=$i\" >&2; i=$((i+1)); done; \
                      echo done";
        let mut lines = Vec::new();
        let output = run_streaming(Command::new("sh").args(["-c", script]), |l| {
            lines.push(l.to_string())
        })
        .unwrap();
        assert!(output.success(), "{}", output.failure_message("sh"));
        assert_eq!(lines, vec!["done"]);
        assert_eq!(output.stderr_tail.len(), STDERR_TAIL_LINES);
        assert_eq!(output.stderr_tail.last().map(String::as_str), Some("frame=4999"));
    }

    #[test]
    fn test_undecodable_stdout_line_is_lossy() {
        let mut lines = Vec::new();
        let output = run_streaming(
            Command::new("sh").args(["-c", "printf 'caf\\351\\nnext\\n'"]),
            |l| lines.push(l.to_string()),
        )
        .unwrap();
        assert!(output.success());
        assert_eq!(lines, vec!["caf\u{FFFD}", "next"]);
    }

    #[test]
    fn test_missing_program_is_io_error() {
        let result = run_streaming(&mut Command::new("/nonexistent/tool-xyz"), |_| {});
        assert!(result.is_err());
    }
}
