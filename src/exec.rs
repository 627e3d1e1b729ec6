//! # Subprocess plumbing shared by process-backed sources and sinks.
//!
//! - [`output`] runs a command to completion and returns its stdout.
//! - [`lines`] spawns a long-running command and yields its stdout lazily, one
//!   line per item.
//!
//! ## Failure mapping
//! ```text
//! spawn fails              ─► SourceError::Spawn
//! read fails               ─► SourceError::Io
//! exit status != 0         ─► SourceError::Exit (last item of `lines`)
//! stdout EOF + exit 0      ─► clean end of `lines`
//! ```
//!
//! Children are spawned with `kill_on_drop`, so dropping a [`lines`] stream (e.g.
//! when the supervisor restarts or shuts down) does not leak the process.

use std::fmt;
use std::process::Stdio;

use futures::stream::{self, BoxStream, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};

use crate::error::SourceError;

/// Program plus arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandLine {
    /// Program to execute (looked up in `PATH`).
    pub program: String,
    /// Arguments.
    pub args: Vec<String>,
}

impl CommandLine {
    /// Creates a command line.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Same command with `arg` appended.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).stdin(Stdio::null()).kill_on_drop(true);
        cmd
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Runs `cmd` to completion and returns its stdout (lossy UTF-8).
pub async fn output(cmd: &CommandLine) -> Result<String, SourceError> {
    let out = cmd
        .command()
        .stderr(Stdio::null())
        .output()
        .await
        .map_err(|source| SourceError::Spawn {
            program: cmd.program.clone(),
            source,
        })?;

    if !out.status.success() {
        return Err(SourceError::Exit {
            program: cmd.program.clone(),
            code: out.status.code(),
        });
    }
    Ok(String::from_utf8_lossy(&out.stdout).into_owned())
}

/// Streaming state of one spawned child.
struct Running {
    program: String,
    child: Child,
    lines: Lines<BufReader<ChildStdout>>,
}

/// Spawns `cmd` and yields each stdout line as it is printed.
///
/// The stream ends cleanly when stdout closes and the child exits with status 0.
/// Any other ending yields exactly one error item and then ends.
pub fn lines(cmd: &CommandLine) -> BoxStream<'static, Result<String, SourceError>> {
    let spawned = cmd
        .command()
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| SourceError::Spawn {
            program: cmd.program.clone(),
            source,
        })
        .and_then(|mut child| match child.stdout.take() {
            Some(stdout) => Ok(Running {
                program: cmd.program.clone(),
                child,
                lines: BufReader::new(stdout).lines(),
            }),
            None => Err(SourceError::StreamClosed {
                program: cmd.program.clone(),
            }),
        });

    match spawned {
        Ok(running) => stream::unfold(Some(running), next_line).boxed(),
        Err(e) => stream::once(async move { Err(e) }).boxed(),
    }
}

async fn next_line(
    state: Option<Running>,
) -> Option<(Result<String, SourceError>, Option<Running>)> {
    let mut running = state?;
    match running.lines.next_line().await {
        Ok(Some(line)) => Some((Ok(line), Some(running))),
        Ok(None) => match running.child.wait().await {
            Ok(status) if status.success() => None,
            Ok(status) => Some((
                Err(SourceError::Exit {
                    program: running.program,
                    code: status.code(),
                }),
                None,
            )),
            Err(source) => Some((
                Err(SourceError::Io {
                    program: running.program,
                    source,
                }),
                None,
            )),
        },
        Err(source) => Some((
            Err(SourceError::Io {
                program: running.program,
                source,
            }),
            None,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> CommandLine {
        CommandLine::new("sh", ["-c", script])
    }

    #[tokio::test]
    async fn output_returns_stdout() {
        let out = output(&sh("printf 'hello\\n'")).await.unwrap();
        assert_eq!(out, "hello\n");
    }

    #[tokio::test]
    async fn output_maps_nonzero_exit() {
        let err = output(&sh("exit 4")).await.unwrap_err();
        assert!(matches!(err, SourceError::Exit { code: Some(4), .. }));
    }

    #[tokio::test]
    async fn output_maps_missing_program() {
        let cmd = CommandLine::new("statusvisor-definitely-missing", Vec::<String>::new());
        let err = output(&cmd).await.unwrap_err();
        assert_eq!(err.as_label(), "source_spawn");
    }

    #[tokio::test]
    async fn lines_end_cleanly_on_success() {
        let items: Vec<_> = lines(&sh("printf 'a\\nb\\n'")).collect().await;
        let items: Vec<String> = items.into_iter().map(Result::unwrap).collect();
        assert_eq!(items, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn lines_end_with_exit_error() {
        let items: Vec<_> = lines(&sh("echo one; echo two; exit 2")).collect().await;
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_deref().unwrap(), "one");
        assert_eq!(items[1].as_deref().unwrap(), "two");
        assert!(matches!(
            items[2],
            Err(SourceError::Exit { code: Some(2), .. })
        ));
    }

    #[test]
    fn display_joins_args() {
        let cmd = CommandLine::new("xsetroot", ["-name"]).arg("hi there");
        assert_eq!(cmd.to_string(), "xsetroot -name hi there");
    }
}
