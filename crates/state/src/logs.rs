//! Capped request ledger

use cv_types::{ApiLogEntry, LogUpdate};
use std::collections::VecDeque;
use tracing::debug;

use crate::store::{Store, Subscription};

/// Number of entries kept; older entries are evicted first
pub const MAX_LOG_ENTRIES: usize = 100;

/// Ledger of API requests, most recent first
#[derive(Clone, Debug, Default)]
pub struct LogStore {
    logs: Store<VecDeque<ApiLogEntry>>,
}

impl LogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend an entry, dropping the oldest ones beyond [`MAX_LOG_ENTRIES`]
    pub fn add_log(&self, entry: ApiLogEntry) {
        self.logs.modify(|logs| {
            logs.push_front(entry);
            logs.truncate(MAX_LOG_ENTRIES);
        });
    }

    /// Merge `update` into the entry with `id`
    ///
    /// An id that is no longer in the ledger (evicted by newer entries) is
    /// ignored.
    pub fn update_log(&self, id: &str, update: LogUpdate) {
        self.logs.modify(|logs| match logs.iter_mut().find(|log| log.id == id) {
            Some(log) => log.apply(update),
            None => debug!("Log entry {} no longer in ledger, update dropped", id),
        });
    }

    pub fn clear(&self) {
        self.logs.set(VecDeque::new());
    }

    /// Snapshot of the ledger, most recent first
    pub fn entries(&self) -> Vec<ApiLogEntry> {
        self.logs.with(|logs| logs.iter().cloned().collect())
    }

    pub fn get(&self, id: &str) -> Option<ApiLogEntry> {
        self.logs
            .with(|logs| logs.iter().find(|log| log.id == id).cloned())
    }

    pub fn len(&self) -> usize {
        self.logs.with(VecDeque::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscribe(
        &self,
        callback: impl Fn(&VecDeque<ApiLogEntry>) + Send + Sync + 'static,
    ) -> Subscription {
        self.logs.subscribe(callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cv_types::LogStatus;

    fn entry(n: usize) -> ApiLogEntry {
        ApiLogEntry::pending(format!("id-{}", n), "/generate-scenes", "POST")
    }

    #[test]
    fn test_ledger_is_capped_and_most_recent_first() {
        let logs = LogStore::new();
        for n in 0..250 {
            logs.add_log(entry(n));
            assert!(logs.len() <= MAX_LOG_ENTRIES);
        }

        let entries = logs.entries();
        assert_eq!(entries.len(), MAX_LOG_ENTRIES);
        let ids: Vec<_> = entries.iter().map(|e| e.id.clone()).collect();
        let expected: Vec<_> = (150..250).rev().map(|n| format!("id-{}", n)).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_update_log_on_evicted_id_is_noop() {
        let logs = LogStore::new();
        for n in 0..=MAX_LOG_ENTRIES {
            logs.add_log(entry(n));
        }
        assert!(logs.get("id-0").is_none());

        let before = logs.entries();
        logs.update_log("id-0", LogUpdate::success("late"));
        assert_eq!(logs.entries(), before);
    }

    #[test]
    fn test_update_log_merges_into_matching_entry() {
        let logs = LogStore::new();
        logs.add_log(entry(1));
        logs.add_log(entry(2));

        logs.update_log("id-1", LogUpdate::error("HTTP error! status: 502"));

        let updated = logs.get("id-1").unwrap();
        assert_eq!(updated.status, LogStatus::Error);
        assert_eq!(updated.error.as_deref(), Some("HTTP error! status: 502"));
        assert_eq!(logs.get("id-2").unwrap().status, LogStatus::Pending);
    }

    #[test]
    fn test_clear() {
        let logs = LogStore::new();
        logs.add_log(entry(1));
        logs.clear();
        assert!(logs.is_empty());
    }
}
