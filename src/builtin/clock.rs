//! Local wall-clock time.

use std::fmt::Write as _;
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};
use futures::StreamExt;

use crate::{
    builtin::ticks,
    error::SourceError,
    sources::{SourceFn, SourceRef},
    state::Update,
};

/// Clock source writing `Local::now()` formatted with `format` (strftime
/// syntax) into `slot` every `every`.
///
/// An invalid format fails the attempt with [`SourceError::Parse`].
pub fn clock(slot: impl Into<String>, format: impl Into<String>, every: Duration) -> SourceRef {
    let slot = slot.into();
    let format = format.into();
    SourceFn::arc("clock", [slot.clone()], move || {
        let slot = slot.clone();
        let format = format.clone();
        ticks(every).map(move |()| -> Result<Update, SourceError> {
            let text = render(&Local::now(), &format)?;
            Ok(Update::new().set(slot.as_str(), text))
        })
    })
}

fn render<Tz: TimeZone>(at: &DateTime<Tz>, format: &str) -> Result<String, SourceError>
where
    Tz::Offset: std::fmt::Display,
{
    let mut out = String::new();
    write!(out, "{}", at.format(format))
        .map_err(|_| SourceError::parse("clock", format!("invalid time format {format:?}")))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::Source;
    use chrono::Utc;

    #[test]
    fn formats_with_strftime() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 5, 0).unwrap();
        assert_eq!(render(&at, "%a %d %b %H:%M").unwrap(), "Fri 01 Mar 09:05");
    }

    #[test]
    fn bad_format_is_a_parse_error() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 5, 0).unwrap();
        assert!(matches!(render(&at, "%Q"), Err(SourceError::Parse { .. })));
    }

    #[tokio::test]
    async fn primes_the_slot() {
        let src = clock("date", "%Y", Duration::from_secs(60));
        let first = src.updates().next().await.unwrap().unwrap();
        let year = first.get("date").flatten().unwrap();
        assert_eq!(year.len(), 4);
    }
}
