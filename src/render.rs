//! # Status-line rendering.
//!
//! A [`Layout`] is the fixed, ordered list of [`Slot`]s plus the delimiter and
//! edge padding. [`Layout::render`] is a pure function of the layout and a
//! [`Snapshot`]:
//!
//! ```text
//! for slot in layout (fixed order):
//!     value present and non-empty ─► "<icon> <value>"
//!     otherwise                  ─► omitted
//! edge + join(parts, delimiter) + edge
//! ```
//!
//! ## Example
//! ```rust
//! use statusvisor::{Layout, Slot, Snapshot, Update};
//!
//! let layout = Layout::new(vec![
//!     Slot::new("media", "♫"),
//!     Slot::new("vol", "🔊"),
//!     Slot::new("cpu", "⚙"),
//! ]);
//! let mut snap = Snapshot::new();
//! snap.apply(&Update::new().set("media", "Song - Artist").clear("vol").set("cpu", "12%"));
//!
//! assert_eq!(layout.render(&snap), " ♫ Song - Artist  ⚙ 12% ");
//! ```

use crate::state::Snapshot;

/// One named field of the status line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Slot {
    /// Slot name, as used in updates.
    pub name: String,
    /// Static icon/prefix printed before the value.
    pub icon: String,
}

impl Slot {
    /// Creates a slot.
    pub fn new(name: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            icon: icon.into(),
        }
    }
}

/// Ordered slots plus separators. Defined once at startup.
#[derive(Clone, Debug)]
pub struct Layout {
    slots: Vec<Slot>,
    delimiter: String,
    edge: String,
}

impl Layout {
    /// Layout with the default delimiter (two spaces) and edge (one space).
    pub fn new(slots: Vec<Slot>) -> Self {
        Self {
            slots,
            delimiter: "  ".to_string(),
            edge: " ".to_string(),
        }
    }

    /// Replaces the delimiter placed between rendered slots.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Replaces the padding placed at both ends of the line.
    #[must_use]
    pub fn with_edge(mut self, edge: impl Into<String>) -> Self {
        self.edge = edge.into();
        self
    }

    /// Slots in display order.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Whether the layout declares `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.slots.iter().any(|s| s.name == name)
    }

    /// Renders the snapshot into the final display line.
    pub fn render(&self, snapshot: &Snapshot) -> String {
        let parts: Vec<String> = self
            .slots
            .iter()
            .filter_map(|slot| {
                let value = snapshot.get(&slot.name).filter(|v| !v.is_empty())?;
                Some(if slot.icon.is_empty() {
                    value.to_string()
                } else {
                    format!("{} {}", slot.icon, value)
                })
            })
            .collect();

        format!("{}{}{}", self.edge, parts.join(&self.delimiter), self.edge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Update;

    fn bar() -> Layout {
        Layout::new(vec![
            Slot::new("media", "♫"),
            Slot::new("vol", "🔊"),
            Slot::new("cpu", "⚙"),
            Slot::new("mem", "▦"),
            Slot::new("date", "🕐"),
        ])
    }

    #[test]
    fn absent_slots_are_omitted() {
        let mut snap = Snapshot::new();
        snap.apply(
            &Update::new()
                .set("media", "Song - Artist")
                .clear("vol")
                .set("cpu", "12%"),
        );
        assert_eq!(bar().render(&snap), " ♫ Song - Artist  ⚙ 12% ");
    }

    #[test]
    fn empty_values_are_omitted() {
        let mut snap = Snapshot::new();
        snap.apply(&Update::new().set("media", "").set("date", "Mon 12:00"));
        assert_eq!(bar().render(&snap), " 🕐 Mon 12:00 ");
    }

    #[test]
    fn order_follows_layout_not_update() {
        let mut snap = Snapshot::new();
        snap.apply(&Update::new().set("date", "D").set("cpu", "C").set("vol", "V"));
        assert_eq!(bar().render(&snap), " 🔊 V  ⚙ C  🕐 D ");
    }

    #[test]
    fn custom_separators_and_bare_icon() {
        let layout = Layout::new(vec![Slot::new("a", ""), Slot::new("b", "B")])
            .with_delimiter(" | ")
            .with_edge("[");
        let mut snap = Snapshot::new();
        snap.apply(&Update::new().set("a", "1").set("b", "2"));
        assert_eq!(layout.render(&snap), "[1 | B 2[");
    }

    #[test]
    fn empty_snapshot_renders_only_edges() {
        assert_eq!(bar().render(&Snapshot::new()), "  ");
    }
}
