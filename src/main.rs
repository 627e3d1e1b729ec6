use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use statusvisor::{
    Aggregator, BackoffPolicy, CommandLine, CommandSink, Config, Layout, Sink, Slot, SourceRef,
    SourceSpec, StdoutSink,
    builtin::{self, presets},
};

/// Merge media, volume, load and time into one status line.
#[derive(Parser, Debug)]
#[command(name = "statusvisor", version, about)]
struct Cli {
    /// Seconds to wait before restarting a failed source.
    #[arg(long, default_value_t = 3.0, value_name = "SECS")]
    cooldown: f64,

    /// Text placed between two rendered slots.
    #[arg(long, default_value = "  ")]
    delimiter: String,

    /// Render by running this program with the line appended as last argument (default: stdout).
    #[arg(long, num_args = 1.., value_name = "PROGRAM [ARGS]", allow_hyphen_values = true)]
    sink_cmd: Option<Vec<String>>,

    /// Do not follow the media player.
    #[arg(long)]
    no_media: bool,

    /// Do not follow the audio volume.
    #[arg(long)]
    no_volume: bool,
}

impl Cli {
    fn config(&self) -> Result<Config> {
        let cooldown = Duration::try_from_secs_f64(self.cooldown)
            .with_context(|| format!("invalid --cooldown {}", self.cooldown))?;
        Ok(Config {
            cooldown: BackoffPolicy::fixed(cooldown),
            ..Config::default()
        })
    }

    fn sink(&self) -> Result<Arc<dyn Sink>> {
        match self.sink_cmd.as_deref() {
            None => Ok(Arc::new(StdoutSink)),
            Some([program, args @ ..]) => Ok(Arc::new(CommandSink::new(CommandLine::new(
                program.as_str(),
                args.iter().map(String::as_str),
            )))),
            Some([]) => anyhow::bail!("--sink-cmd needs a program"),
        }
    }

    fn sources(&self) -> Vec<SourceRef> {
        let mut sources: Vec<SourceRef> = Vec::new();
        if !self.no_media {
            sources.push(Arc::new(presets::media()));
        }
        if !self.no_volume {
            sources.push(Arc::new(presets::volume()));
        }
        sources.push(builtin::load("cpu", "mem", Duration::from_secs(2)));
        sources.push(builtin::clock("date", "%a %d %b %H:%M", Duration::from_secs(1)));
        sources
    }
}

fn layout(delimiter: &str) -> Layout {
    Layout::new(vec![
        Slot::new(presets::MEDIA_SLOT, "♫"),
        Slot::new(presets::VOLUME_SLOT, "🔊"),
        Slot::new("cpu", "⚙"),
        Slot::new("mem", "▦"),
        Slot::new("date", "🕐"),
    ])
    .with_delimiter(delimiter)
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout belongs to the status line
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = cli.config()?;
    let specs = cli
        .sources()
        .into_iter()
        .map(|source| SourceSpec::with_defaults(source, &cfg))
        .collect();

    let agg = Aggregator::builder(cfg, layout(&cli.delimiter), cli.sink()?).build();
    let last = agg.run(specs).await.context("status aggregation stopped")?;
    tracing::info!(slots = last.len(), "bye");
    Ok(())
}
