//! Example wiring for common desktop facts.
//!
//! The parsers here target the usual `playerctl`/`pactl` output and are kept
//! deliberately small.

use crate::{
    builtin::command::{CommandSource, Trigger},
    error::SourceError,
    exec::CommandLine,
    state::Update,
};

/// Slot written by [`media`].
pub const MEDIA_SLOT: &str = "media";
/// Slot written by [`volume`].
pub const VOLUME_SLOT: &str = "vol";

const TRACK_FORMAT: &str = "{{artist}} - {{title}}";

/// Currently playing track, followed through `playerctl`.
///
/// Each attempt first asks `playerctl` for the current track so a restart
/// keeps the slot filled.
pub fn media() -> CommandSource {
    let follow = CommandLine::new("playerctl", ["--follow", "metadata", "--format", TRACK_FORMAT]);
    let current = CommandLine::new("playerctl", ["metadata", "--format", TRACK_FORMAT]);
    CommandSource::new("media", [MEDIA_SLOT], Trigger::Follow(follow), |line: &str| {
        Ok(parse_track(line))
    })
    .with_priming_query(current)
}

/// Default sink volume, re-queried on every PulseAudio event.
pub fn volume() -> CommandSource {
    let query = CommandLine::new(
        "sh",
        [
            "-c",
            "pactl get-sink-volume @DEFAULT_SINK@ && pactl get-sink-mute @DEFAULT_SINK@",
        ],
    );
    CommandSource::new(
        "volume",
        [VOLUME_SLOT],
        Trigger::Follow(CommandLine::new("pactl", ["subscribe"])),
        parse_volume,
    )
    .with_query(query)
}

fn parse_track(line: &str) -> Update {
    let track = line.trim();
    // playerctl prints " - " when a player is up but has no metadata
    if track.is_empty() || track == "-" {
        Update::new().clear(MEDIA_SLOT)
    } else {
        Update::new().set(MEDIA_SLOT, track)
    }
}

fn parse_volume(output: &str) -> Result<Update, SourceError> {
    if output.lines().any(|l| l.trim() == "Mute: yes") {
        return Ok(Update::new().set(VOLUME_SLOT, "muted"));
    }
    let level = output
        .split_whitespace()
        .find(|tok| tok.len() > 1 && tok.ends_with('%'))
        .ok_or_else(|| SourceError::parse("volume", format!("no percentage in {output:?}")))?;
    Ok(Update::new().set(VOLUME_SLOT, level))
}
