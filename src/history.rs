use serde::{Deserialize, Serialize};

use crate::{
    domain::Mode,
    migrate::{StoredTaskStore, migrate_store},
    tasks::{PriorityMap, TaskStore},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub period_key: String,
    pub mode: Mode,
    pub tasks: TaskStore,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priorities: Option<PriorityMap>,
}

impl HistoryEntry {
    pub fn same_identity(&self, other: &HistoryEntry) -> bool {
        self.period_key == other.period_key && self.mode == other.mode
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredHistoryEntry {
    #[serde(alias = "date")]
    pub period_key: String,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub tasks: StoredTaskStore,
    #[serde(default)]
    pub priorities: Option<PriorityMap>,
}

impl From<StoredHistoryEntry> for HistoryEntry {
    fn from(stored: StoredHistoryEntry) -> Self {
        HistoryEntry {
            period_key: stored.period_key,
            mode: stored.mode,
            tasks: migrate_store(stored.tasks),
            priorities: stored.priorities,
        }
    }
}

#[derive(Clone, Debug)]
pub struct HistoryArchive {
    entries: Vec<HistoryEntry>,
    limit: usize,
}

impl HistoryArchive {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            limit,
        }
    }

    pub fn from_stored(stored: Vec<StoredHistoryEntry>, limit: usize) -> Self {
        let mut archive = Self::new(limit);
        for entry in stored {
            archive.record(entry.into());
        }
        archive
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // Re-recording an existing (period_key, mode) replaces it in its original slot.
    pub fn record(&mut self, entry: HistoryEntry) {
        match self.entries.iter_mut().find(|e| e.same_identity(&entry)) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }

        if self.entries.len() > self.limit {
            let excess = self.entries.len() - self.limit;
            self.entries.drain(..excess);
        }
    }

    pub fn recent(&self, mode: Mode, limit: usize) -> Vec<&HistoryEntry> {
        self.entries
            .iter()
            .rev()
            .filter(|e| e.mode == mode)
            .take(limit)
            .collect()
    }

    pub fn get(&self, period_key: &str, mode: Mode) -> Option<&HistoryEntry> {
        self.entries
            .iter()
            .find(|e| e.period_key == period_key && e.mode == mode)
    }

    /// Daily entries other than today's, most recent first.
    pub fn import_sources(&self, today_key: &str) -> Vec<&HistoryEntry> {
        self.entries
            .iter()
            .rev()
            .filter(|e| e.mode == Mode::Daily && e.period_key != today_key)
            .collect()
    }
}
