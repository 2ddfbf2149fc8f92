use std::collections::HashMap;
use std::sync::Mutex;

use serde::Serialize;

/// Cache state of one (account, folder) pair.
///
/// `Empty -> Refreshing -> Cached`, and a forced refresh goes
/// `Cached -> Refreshing -> Cached` by purge-and-replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FolderState {
    Empty,
    Refreshing,
    Cached,
}

type Key = (String, String);

/// Pairs with a remote refresh currently in flight, counted so overlapping
/// refreshes of the same pair stay visible until the last one ends.
#[derive(Default)]
pub struct RefreshTracker {
    in_flight: Mutex<HashMap<Key, usize>>,
}

impl RefreshTracker {
    pub fn begin(&self, account_id: &str, folder: &str) -> RefreshGuard<'_> {
        let key = (account_id.to_string(), folder.to_string());
        *self.map().entry(key.clone()).or_insert(0) += 1;
        RefreshGuard { tracker: self, key }
    }

    pub fn is_refreshing(&self, account_id: &str, folder: &str) -> bool {
        self.map()
            .contains_key(&(account_id.to_string(), folder.to_string()))
    }

    fn map(&self) -> std::sync::MutexGuard<'_, HashMap<Key, usize>> {
        self.in_flight.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub struct RefreshGuard<'a> {
    tracker: &'a RefreshTracker,
    key: Key,
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        let mut map = self.tracker.map();
        if let Some(n) = map.get_mut(&self.key) {
            *n -= 1;
            if *n == 0 {
                map.remove(&self.key);
            }
        }
    }
}
