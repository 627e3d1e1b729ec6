//! # Merged status snapshot.
//!
//! [`Snapshot`] holds the current value of every slot. It is owned and mutated by
//! the merger alone; renders read it through a shared reference.
//!
//! ## Rules
//! - A slot keeps its last value until an update overwrites or clears it.
//! - Keys not mentioned by an update are never touched.
//! - [`Snapshot::apply`] reports whether anything observable changed.

use std::collections::HashMap;

use super::Update;

/// Slot name → current value. Absent slots are not stored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    values: HashMap<String, String>,
}

impl Snapshot {
    /// Creates an empty snapshot (every slot absent).
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of `slot`, `None` when absent.
    pub fn get(&self, slot: &str) -> Option<&str> {
        self.values.get(slot).map(String::as_str)
    }

    /// Number of present slots.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether every slot is absent.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether applying `update` would change at least one slot.
    pub fn differs(&self, update: &Update) -> bool {
        update.iter().any(|(slot, value)| self.get(slot) != value)
    }

    /// Folds `update` into the snapshot if it changes anything.
    ///
    /// Returns `false` (and leaves the snapshot untouched) for a no-op update.
    pub fn apply(&mut self, update: &Update) -> bool {
        if !self.differs(update) {
            return false;
        }
        for (slot, value) in update.iter() {
            match value {
                Some(v) => {
                    self.values.insert(slot.to_string(), v.to_string());
                }
                None => {
                    self.values.remove(slot);
                }
            }
        }
        true
    }
}
