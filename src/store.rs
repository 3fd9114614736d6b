use crate::models::{LeaveEntry, NewLeaveEntry};
use chrono::Utc;

/// Ordered collection of leave entries, most recent date first.
#[derive(Debug, Clone, Default)]
pub struct EntryStore {
    entries: Vec<LeaveEntry>,
}

impl EntryStore {
    pub fn from_entries(entries: Vec<LeaveEntry>) -> Self {
        let mut store = Self { entries };
        store.sort();
        store
    }

    pub fn all(&self) -> &[LeaveEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&LeaveEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn add(&mut self, entry: NewLeaveEntry) -> LeaveEntry {
        self.add_at(entry, Utc::now().timestamp_millis())
    }

    /// Inserts `entry` with an id derived from `epoch_millis`, stepping past
    /// ids already taken in the store.
    pub fn add_at(&mut self, entry: NewLeaveEntry, epoch_millis: i64) -> LeaveEntry {
        let mut candidate = epoch_millis;
        while self.get(&candidate.to_string()).is_some() {
            candidate += 1;
        }

        let entry = entry.with_id(candidate.to_string());
        self.entries.push(entry.clone());
        self.sort();
        entry
    }

    /// Replaces the entry sharing `entry.id`. Returns `false` when no such
    /// entry exists, in which case nothing changes.
    pub fn update(&mut self, entry: LeaveEntry) -> bool {
        let Some(slot) = self.entries.iter_mut().find(|existing| existing.id == entry.id) else {
            return false;
        };
        *slot = entry;
        self.sort();
        true
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    // Stable, so entries on the same date keep their relative order.
    fn sort(&mut self) {
        self.entries.sort_by(|a, b| b.date.cmp(&a.date));
    }
}
