//! # Process-backed source.
//!
//! [`CommandSource`] turns external programs into a status source.
//!
//! ```text
//! Trigger::Follow(cmd), no query:  prime, then parse(line) per stdout line
//! Trigger::Follow(cmd), query:     run query now, then again on every stdout line
//! Trigger::Every(d),    query:     run query now, then every d
//! Trigger::Every(d),    no query:  prime only (nothing to observe)
//!
//! prime (no query): parse(priming query output) when one is set,
//!                   all slots absent when it is unset or exits non-zero
//! ```
//!
//! Any spawn/exit/read/parse failure ends the attempt; the supervisor restarts
//! the whole pipeline after its cooldown.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, BoxStream, StreamExt};

use crate::{
    builtin::ticks,
    error::SourceError,
    exec::{self, CommandLine},
    sources::{Source, UpdateStream},
    state::Update,
};

/// Converts command output (one followed line, or a whole query output) into an update.
pub type LineParser = Arc<dyn Fn(&str) -> Result<Update, SourceError> + Send + Sync>;

/// What makes a [`CommandSource`] produce its next update.
#[derive(Clone, Debug)]
pub enum Trigger {
    /// Each stdout line of a long-running command.
    Follow(CommandLine),
    /// A fixed period.
    Every(Duration),
}

/// Source backed by external commands.
pub struct CommandSource {
    name: String,
    slots: Vec<String>,
    trigger: Trigger,
    query: Option<CommandLine>,
    priming: Option<CommandLine>,
    parse: LineParser,
}

impl CommandSource {
    /// Creates a source owning `slots`, driven by `trigger`.
    pub fn new<I, S, P>(name: impl Into<String>, slots: I, trigger: Trigger, parse: P) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        P: Fn(&str) -> Result<Update, SourceError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            slots: slots.into_iter().map(Into::into).collect(),
            trigger,
            query: None,
            priming: None,
            parse: Arc::new(parse),
        }
    }

    /// Runs `query` on every trigger and parses its stdout instead of the trigger's output.
    #[must_use]
    pub fn with_query(mut self, query: CommandLine) -> Self {
        self.query = Some(query);
        self
    }

    /// Without a query, runs `priming` once per attempt to read the current
    /// state before following.
    ///
    /// A non-zero exit (e.g. nothing playing) primes every slot as absent.
    #[must_use]
    pub fn with_priming_query(mut self, priming: CommandLine) -> Self {
        self.priming = Some(priming);
        self
    }

    /// One-shot command used for the priming update, if any.
    pub fn priming_query(&self) -> Option<&CommandLine> {
        self.priming.as_ref()
    }

    /// Priming update for sources that parse the trigger's own output.
    fn prime(&self) -> impl Future<Output = Result<Update, SourceError>> + Send + 'static {
        let cleared = self.cleared();
        let priming = self.priming.clone();
        let parse = Arc::clone(&self.parse);
        async move {
            let Some(priming) = priming else {
                return Ok(cleared);
            };
            match exec::output(&priming).await {
                Ok(out) => parse(out.trim_end()),
                Err(SourceError::Exit { program, code }) => {
                    tracing::debug!(%program, ?code, "priming query failed, clearing slots");
                    Ok(cleared)
                }
                Err(e) => Err(e),
            }
        }
    }

    fn cleared(&self) -> Update {
        let mut update = Update::new();
        for slot in &self.slots {
            update.insert(slot.as_str(), None);
        }
        update
    }

    /// Trigger occurrences; the first one fires immediately.
    fn triggers(&self) -> BoxStream<'static, Result<(), SourceError>> {
        match &self.trigger {
            Trigger::Follow(cmd) => stream::once(async { Ok(()) })
                .chain(exec::lines(cmd).map(|line| line.map(drop)))
                .boxed(),
            Trigger::Every(period) => ticks(*period).map(Ok).boxed(),
        }
    }
}

impl Source for CommandSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn slots(&self) -> &[String] {
        &self.slots
    }

    fn updates(&self) -> UpdateStream {
        let parse = Arc::clone(&self.parse);
        match (&self.query, &self.trigger) {
            (Some(query), _) => {
                let query = query.clone();
                self.triggers()
                    .then(move |fired| run_query(fired, query.clone(), Arc::clone(&parse)))
                    .boxed()
            }
            (None, Trigger::Follow(cmd)) => stream::once(self.prime())
                .chain(exec::lines(cmd).map(move |line| line.and_then(|l| parse(&l))))
                .boxed(),
            (None, Trigger::Every(_)) => stream::once(self.prime())
                .chain(stream::pending())
                .boxed(),
        }
    }
}

async fn run_query(
    fired: Result<(), SourceError>,
    query: CommandLine,
    parse: LineParser,
) -> Result<Update, SourceError> {
    fired?;
    let out = exec::output(&query).await?;
    parse(out.trim_end())
}
