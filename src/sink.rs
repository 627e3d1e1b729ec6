//! # Display sinks.
//!
//! A [`Sink`] receives every rendered line. Failures are reported back to the
//! merger, which keeps its snapshot and re-renders later; a sink never has to
//! retry on its own.
//!
//! Built-in sinks:
//! - [`StdoutSink`]: one line per render on stdout (for bars that read a pipe).
//! - [`CommandSink`]: runs a command with the line as its last argument
//!   (e.g. `xsetroot -name <line>` for dwm).

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::SinkError;
use crate::exec::{self, CommandLine};

/// Destination of rendered status lines.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use statusvisor::{Sink, SinkError};
///
/// struct Discard;
///
/// #[async_trait]
/// impl Sink for Discard {
///     async fn render(&self, _text: &str) -> Result<(), SinkError> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Sink: Send + Sync + 'static {
    /// Pushes `text` to the display.
    async fn render(&self, text: &str) -> Result<(), SinkError>;

    /// Name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Writes each line to stdout and flushes.
#[derive(Debug, Default)]
pub struct StdoutSink;

#[async_trait]
impl Sink for StdoutSink {
    async fn render(&self, text: &str) -> Result<(), SinkError> {
        let mut out = tokio::io::stdout();
        out.write_all(text.as_bytes()).await?;
        out.write_all(b"\n").await?;
        out.flush().await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "stdout"
    }
}

/// Runs a command with the rendered line appended as the last argument.
#[derive(Clone, Debug)]
pub struct CommandSink {
    cmd: CommandLine,
}

impl CommandSink {
    /// Creates a sink around `cmd`.
    pub fn new(cmd: CommandLine) -> Self {
        Self { cmd }
    }
}

#[async_trait]
impl Sink for CommandSink {
    async fn render(&self, text: &str) -> Result<(), SinkError> {
        exec::output(&self.cmd.clone().arg(text)).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "command"
    }
}
