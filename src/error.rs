//! Error types used by the aggregator runtime, sources and sinks.
//!
//! This module defines three enums:
//!
//! - [`RuntimeError`] errors raised by the orchestration runtime itself.
//! - [`SourceError`] errors that end one attempt of a source sequence.
//! - [`SinkError`] errors raised while pushing a rendered line to the display.
//!
//! All of them provide `as_label` for logs. None of them is fatal to a running
//! aggregator: source errors are handled by a restart with cooldown, sink errors
//! by a pending re-render.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// # Errors produced by the aggregator runtime.
///
/// Either a startup validation failure (nothing was spawned) or a problem
/// observed while shutting down.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A source declares a slot that the layout does not know about.
    #[error("source {source_name:?} declares unknown slot {slot:?}")]
    UnknownSlot {
        /// Name of the offending source.
        source_name: String,
        /// The undeclared slot.
        slot: String,
    },

    /// Two sources declare ownership of the same slot.
    #[error("slot {slot:?} is owned by both {first:?} and {second:?}")]
    SlotConflict {
        /// The contested slot.
        slot: String,
        /// Source that declared it first.
        first: String,
        /// Source that declared it again.
        second: String,
    },

    /// Shutdown grace period was exceeded; some supervisors had to be aborted.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}; forcing termination")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of sources whose supervisors did not stop in time.
        stuck: Vec<String>,
    },

    /// The merger task ended abnormally (panicked or was aborted).
    #[error("merger task lost: {reason}")]
    MergerLost {
        /// Join error description.
        reason: String,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use statusvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::UnknownSlot { .. } => "runtime_unknown_slot",
            RuntimeError::SlotConflict { .. } => "runtime_slot_conflict",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::MergerLost { .. } => "runtime_merger_lost",
        }
    }
}

/// # Errors that terminate one attempt of a source sequence.
///
/// Every variant is recovered the same way: the supervisor logs it, waits out
/// the cooldown and restarts the source from its priming state.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SourceError {
    /// The external program could not be started.
    #[error("failed to spawn {program:?}: {source}")]
    Spawn {
        /// Program name.
        program: String,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The external program exited with a non-zero status.
    #[error("{program:?} exited with {}", exit_desc(.code))]
    Exit {
        /// Program name.
        program: String,
        /// Exit code, `None` when killed by a signal.
        code: Option<i32>,
    },

    /// Reading the program's output failed.
    #[error("i/o error reading {program:?}: {source}")]
    Io {
        /// Program name.
        program: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The program's stdout closed before it was expected to.
    #[error("stdout of {program:?} closed unexpectedly")]
    StreamClosed {
        /// Program name.
        program: String,
    },

    /// Output could not be turned into an update.
    #[error("{source_name}: unparseable output: {reason}")]
    Parse {
        /// Name of the parsing source.
        source_name: String,
        /// What was wrong with the input.
        reason: String,
    },

    /// The sequence ended before yielding its priming update.
    #[error("sequence ended before priming update")]
    NoPriming,

    /// The priming update did not arrive in time.
    #[error("no priming update within {timeout:?}")]
    PrimingTimeout {
        /// Configured priming timeout.
        timeout: Duration,
    },

    /// The source panicked while building or polling its sequence.
    #[error("source panicked: {reason}")]
    Panicked {
        /// Panic payload message.
        reason: String,
    },

    /// Free-form failure raised by a custom source.
    #[error("source failed: {error}")]
    Fail {
        /// Error message.
        error: String,
    },
}

impl SourceError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use statusvisor::SourceError;
    ///
    /// let err = SourceError::Exit { program: "pactl".into(), code: Some(1) };
    /// assert_eq!(err.as_label(), "source_exit");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SourceError::Spawn { .. } => "source_spawn",
            SourceError::Exit { .. } => "source_exit",
            SourceError::Io { .. } => "source_io",
            SourceError::StreamClosed { .. } => "source_stream_closed",
            SourceError::Parse { .. } => "source_parse",
            SourceError::NoPriming => "source_no_priming",
            SourceError::PrimingTimeout { .. } => "source_priming_timeout",
            SourceError::Panicked { .. } => "source_panicked",
            SourceError::Fail { .. } => "source_failed",
        }
    }

    /// Convenience constructor for [`SourceError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        SourceError::Fail {
            error: error.into(),
        }
    }

    /// Convenience constructor for [`SourceError::Parse`].
    pub fn parse(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        SourceError::Parse {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }
}

fn exit_desc(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("code {c}"),
        None => "signal".to_string(),
    }
}

/// Extracts the message of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// # Errors produced by a [`Sink`](crate::Sink).
///
/// Always recoverable: the merger keeps its snapshot and re-renders later.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SinkError {
    /// Writing to the display failed.
    #[error("sink i/o error: {0}")]
    Io(#[from] io::Error),

    /// The display command failed.
    #[error("sink command failed: {0}")]
    Exec(#[from] SourceError),

    /// The sink panicked while rendering.
    #[error("sink panicked: {reason}")]
    Panicked {
        /// Panic payload message.
        reason: String,
    },

    /// Free-form failure raised by a custom sink.
    #[error("sink failed: {error}")]
    Fail {
        /// Error message.
        error: String,
    },
}

impl SinkError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            SinkError::Io(_) => "sink_io",
            SinkError::Exec(_) => "sink_exec",
            SinkError::Panicked { .. } => "sink_panicked",
            SinkError::Fail { .. } => "sink_failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_message_mentions_code_or_signal() {
        let coded = SourceError::Exit {
            program: "pactl".into(),
            code: Some(3),
        };
        assert_eq!(coded.to_string(), "\"pactl\" exited with code 3");

        let killed = SourceError::Exit {
            program: "pactl".into(),
            code: None,
        };
        assert_eq!(killed.to_string(), "\"pactl\" exited with signal");
    }

    #[test]
    fn sink_error_wraps_exec_failure() {
        let err: SinkError = SourceError::fail("boom").into();
        assert_eq!(err.as_label(), "sink_exec");
        assert!(err.to_string().contains("boom"));
    }
}
