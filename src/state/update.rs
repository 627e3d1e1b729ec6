//! # Partial-state update.
//!
//! An [`Update`] maps a subset of slot names to either a new value or the
//! explicit absent marker (`None`).
//!
//! ## Example
//! ```rust
//! use statusvisor::Update;
//!
//! let u = Update::new().set("media", "Song - Artist").clear("vol");
//! assert_eq!(u.get("media"), Some(Some("Song - Artist")));
//! assert_eq!(u.get("vol"), Some(None));
//! assert_eq!(u.get("cpu"), None);
//! ```

use std::collections::BTreeMap;

/// Mapping from slot name to value-or-absent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Update {
    fields: BTreeMap<String, Option<String>>,
}

impl Update {
    /// Creates an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `slot` to `value`.
    #[must_use]
    pub fn set(mut self, slot: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(slot.into(), Some(value.into()));
        self
    }

    /// Marks `slot` as absent.
    #[must_use]
    pub fn clear(mut self, slot: impl Into<String>) -> Self {
        self.fields.insert(slot.into(), None);
        self
    }

    /// Sets or clears `slot` depending on `value`.
    pub fn insert(&mut self, slot: impl Into<String>, value: Option<String>) {
        self.fields.insert(slot.into(), value);
    }

    /// `None` when the slot is not mentioned, `Some(None)` when explicitly absent.
    pub fn get(&self, slot: &str) -> Option<Option<&str>> {
        self.fields.get(slot).map(Option::as_deref)
    }

    /// Whether the update mentions `slot` at all.
    pub fn contains(&self, slot: &str) -> bool {
        self.fields.contains_key(slot)
    }

    /// Iterates over `(slot, value-or-absent)` pairs in slot-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// Number of mentioned slots.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no slot is mentioned.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Removes and returns every key for which `keep` is false.
    pub(crate) fn split_off_where(&mut self, mut keep: impl FnMut(&str) -> bool) -> Vec<String> {
        let rejected: Vec<String> = self
            .fields
            .keys()
            .filter(|k| !keep(k.as_str()))
            .cloned()
            .collect();
        for key in &rejected {
            self.fields.remove(key);
        }
        rejected
    }
}

impl<K, V> FromIterator<(K, Option<V>)> for Update
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, Option<V>)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.map(Into::into)))
                .collect(),
        }
    }
}
