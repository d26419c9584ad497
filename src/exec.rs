//! Subprocess plumbing for the external tools bookvox coordinates.
//!
//! Two invocation shapes cover every tool: [`run_captured`] for commands that
//! run to completion (ffprobe, ffmpeg concat, ebook-convert), and
//! [`PipedChild`] for commands fed from a byte stream on stdin whose stdout
//! is consumed live (piper, ffmpeg raw encode, iconv).
//!
//! A spawned child's stderr is always drained on its own thread from the
//! moment of spawn. A child that fills its stderr pipe while nobody reads it
//! blocks forever, and the captured text is what makes a non-zero exit
//! diagnosable.

use crate::error::{BookvoxError, Result};
use std::io::{self, BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;
use tracing::debug;

/// Resolve a tool name to its path, failing with a `ToolNotFound` that names
/// the missing binary.
pub fn require(tool: &str) -> Result<PathBuf> {
    which::which(tool).map_err(|_| BookvoxError::ToolNotFound {
        tool: tool.to_string(),
    })
}

/// A child process wired for streaming: stdin is fed from a reader on a
/// writer thread, stderr is drained concurrently, and stdout is handed to
/// the caller to consume.
pub struct PipedChild {
    tool: String,
    child: Child,
    stdout: Option<ChildStdout>,
    stderr_thread: Option<JoinHandle<String>>,
    stdin_thread: Option<JoinHandle<()>>,
}

impl PipedChild {
    /// Spawn `tool` with `args`, streaming `input` into its stdin.
    pub fn spawn(tool: &str, args: &[&str], mut input: Box<dyn Read + Send>) -> Result<Self> {
        let binary = require(tool)?;
        debug!(tool, ?args, "spawning");

        let mut child = Command::new(&binary)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Child::spawn with Stdio::piped always populates these handles.
        let mut stdin = child.stdin.take().ok_or_else(|| {
            io::Error::other(format!("no stdin handle for {tool}"))
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            io::Error::other(format!("no stdout handle for {tool}"))
        })?;
        let stderr = child.stderr.take().ok_or_else(|| {
            io::Error::other(format!("no stderr handle for {tool}"))
        })?;

        let stdin_tool = tool.to_string();
        let stdin_thread = std::thread::spawn(move || {
            // A child that exits before consuming all input breaks the pipe;
            // its exit status is the authoritative failure signal.
            if let Err(e) = io::copy(&mut input, &mut stdin) {
                if e.kind() != io::ErrorKind::BrokenPipe {
                    debug!(tool = %stdin_tool, error = %e, "stdin copy ended");
                }
            }
            // stdin drops here, closing the pipe so the child sees EOF.
        });

        let stderr_tool = tool.to_string();
        let stderr_thread = std::thread::spawn(move || {
            let mut captured = String::new();
            for line in BufReader::new(stderr).lines() {
                match line {
                    Ok(line) => {
                        debug!(tool = %stderr_tool, "{line}");
                        captured.push_str(&line);
                        captured.push('\n');
                    }
                    Err(_) => break,
                }
            }
            captured
        });

        Ok(Self {
            tool: tool.to_string(),
            child,
            stdout: Some(stdout),
            stderr_thread: Some(stderr_thread),
            stdin_thread: Some(stdin_thread),
        })
    }

    /// Take the child's live stdout. Yields `Some` exactly once.
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.stdout.take()
    }

    /// Wait for the child to exit, returning a `Subprocess` error carrying
    /// the captured stderr on non-zero exit.
    pub fn wait(mut self) -> Result<()> {
        // Drop any unconsumed stdout so the child is not blocked writing.
        drop(self.stdout.take());

        if let Some(handle) = self.stdin_thread.take() {
            let _ = handle.join();
        }

        let status = self.child.wait()?;
        let stderr = self
            .stderr_thread
            .take()
            .and_then(|h| h.join().ok())
            .unwrap_or_default();

        if !status.success() {
            return Err(BookvoxError::Subprocess {
                tool: self.tool,
                status: status.to_string(),
                stderr,
            });
        }
        Ok(())
    }
}

/// Run a tool to completion with no stdin, returning its stdout.
///
/// A non-zero exit becomes a `Subprocess` error carrying the captured
/// stderr.
pub fn run_captured(tool: &str, args: &[&str]) -> Result<String> {
    let binary = require(tool)?;
    debug!(tool, ?args, "running");

    let output = Command::new(&binary)
        .args(args)
        .stdin(Stdio::null())
        .output()?;

    if !output.status.success() {
        return Err(BookvoxError::Subprocess {
            tool: tool.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn require_finds_common_binary() {
        // `sh` exists on any Linux host the test suite runs on.
        assert!(require("sh").is_ok());
    }

    #[test]
    fn require_reports_missing_tool_by_name() {
        let err = require("definitely-not-a-real-binary-name").unwrap_err();
        match err {
            BookvoxError::ToolNotFound { tool } => {
                assert_eq!(tool, "definitely-not-a-real-binary-name");
            }
            other => panic!("expected ToolNotFound, got {other:?}"),
        }
    }

    #[test]
    fn piped_child_streams_stdin_to_stdout() {
        let input = Box::new(Cursor::new(b"hello piped world".to_vec()));
        let mut child = PipedChild::spawn("cat", &[], input).unwrap();

        let mut output = String::new();
        child
            .take_stdout()
            .unwrap()
            .read_to_string(&mut output)
            .unwrap();
        child.wait().unwrap();

        assert_eq!(output, "hello piped world");
    }

    #[test]
    fn piped_child_take_stdout_yields_once() {
        let input = Box::new(Cursor::new(Vec::new()));
        let mut child = PipedChild::spawn("cat", &[], input).unwrap();
        assert!(child.take_stdout().is_some());
        assert!(child.take_stdout().is_none());
        child.wait().unwrap();
    }

    #[test]
    fn piped_child_nonzero_exit_captures_stderr() {
        let input = Box::new(Cursor::new(Vec::new()));
        let child = PipedChild::spawn(
            "sh",
            &["-c", "echo synthesis blew up >&2; exit 3"],
            input,
        )
        .unwrap();

        let err = child.wait().unwrap_err();
        match err {
            BookvoxError::Subprocess {
                tool,
                status,
                stderr,
            } => {
                assert_eq!(tool, "sh");
                assert!(status.contains('3'), "status was {status}");
                assert!(stderr.contains("synthesis blew up"));
            }
            other => panic!("expected Subprocess, got {other:?}"),
        }
    }

    #[test]
    fn piped_child_survives_child_ignoring_stdin() {
        // Child exits without reading stdin; the writer thread must absorb
        // the broken pipe instead of wedging wait().
        let input = Box::new(Cursor::new(vec![0u8; 1 << 20]));
        let child = PipedChild::spawn("true", &[], input).unwrap();
        child.wait().unwrap();
    }

    #[test]
    fn run_captured_returns_stdout() {
        let out = run_captured("sh", &["-c", "echo captured"]).unwrap();
        assert_eq!(out.trim(), "captured");
    }

    #[test]
    fn run_captured_failure_carries_stderr() {
        let err = run_captured("sh", &["-c", "echo bad flag >&2; exit 1"]).unwrap_err();
        match err {
            BookvoxError::Subprocess { stderr, .. } => assert!(stderr.contains("bad flag")),
            other => panic!("expected Subprocess, got {other:?}"),
        }
    }
}
