//! Destination usage ledger
//!
//! Counts how many times each destination has been selected. The counts live
//! in workspace state as a single JSON object keyed by destination id, and
//! every increment rewrites the whole object in one atomic update.
//!
//! Counts only ever go up. Entries for destinations that no longer exist are
//! kept, so a simulator that comes back keeps its ranking.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use xcdest_core::prelude::*;

use crate::state::{WorkspaceState, WorkspaceStateExt};

/// Workspace state key holding the `id -> count` object
pub const USAGE_STATISTICS_KEY: &str = "build.xcodeDestinationsUsageStatistics";

/// Per-destination selection counter
#[derive(Debug, Clone)]
pub struct UsageLedger {
    state: Arc<dyn WorkspaceState>,
}

impl UsageLedger {
    pub fn new(state: Arc<dyn WorkspaceState>) -> Self {
        Self { state }
    }

    fn read(&self) -> Map<String, Value> {
        self.state
            .get_typed::<Map<String, Value>>(USAGE_STATISTICS_KEY)
            .unwrap_or_default()
    }

    /// Whether a ledger has ever been written for this workspace
    pub fn exists(&self) -> bool {
        self.state.get(USAGE_STATISTICS_KEY).is_some()
    }

    /// Add one use of `id` and return the new count
    pub fn increment(&self, id: &str) -> u64 {
        let mut count = 0;
        self.state.update(USAGE_STATISTICS_KEY, &mut |current| {
            let mut ledger = match current {
                Some(Value::Object(ledger)) => ledger,
                Some(other) => {
                    warn!("Replacing malformed usage statistics: {}", other);
                    Map::new()
                }
                None => Map::new(),
            };
            count = ledger
                .get(id)
                .and_then(Value::as_u64)
                .unwrap_or(0)
                .saturating_add(1);
            ledger.insert(id.to_string(), Value::from(count));
            Some(Value::Object(ledger))
        });

        debug!("Usage of {} is now {}", id, count);
        count
    }

    /// Number of recorded uses of `id`, 0 if never used
    pub fn get(&self, id: &str) -> u64 {
        self.read().get(id).and_then(Value::as_u64).unwrap_or(0)
    }

    /// Every recorded `(id, count)` in ledger insertion order
    pub fn counts(&self) -> Vec<(String, u64)> {
        self.read()
            .into_iter()
            .map(|(id, count)| {
                let count = count.as_u64().unwrap_or(0);
                (id, count)
            })
            .collect()
    }

    /// Snapshot of counts for repeated lookups
    pub fn count_map(&self) -> HashMap<String, u64> {
        self.counts().into_iter().collect()
    }

    /// All recorded ids, most used first
    ///
    /// The sort is stable, so ids with equal counts keep the order in which
    /// they first entered the ledger.
    pub fn most_used_order(&self) -> Vec<String> {
        let mut counts = self.counts();
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts.into_iter().map(|(id, _)| id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{FileWorkspaceState, MemoryWorkspaceState};
    use serde_json::json;
    use std::thread;

    fn ledger() -> (UsageLedger, Arc<MemoryWorkspaceState>) {
        let state = Arc::new(MemoryWorkspaceState::new());
        (UsageLedger::new(state.clone()), state)
    }

    #[test]
    fn test_absent_ledger_is_empty() {
        let (ledger, _) = ledger();
        assert!(!ledger.exists());
        assert_eq!(ledger.get("iossimulator-A"), 0);
        assert!(ledger.most_used_order().is_empty());
    }

    #[test]
    fn test_increment_is_a_counter() {
        let (ledger, _) = ledger();
        assert_eq!(ledger.increment("iossimulator-A"), 1);
        assert_eq!(ledger.increment("iossimulator-A"), 2);
        assert_eq!(ledger.increment("iossimulator-A"), 3);
        assert_eq!(ledger.get("iossimulator-A"), 3);
        assert!(ledger.exists());
    }

    #[test]
    fn test_increment_writes_whole_mapping() {
        let (ledger, state) = ledger();
        ledger.increment("a");
        ledger.increment("b");
        ledger.increment("a");

        assert_eq!(
            state.get(USAGE_STATISTICS_KEY),
            Some(json!({"a": 2, "b": 1}))
        );
    }

    #[test]
    fn test_most_used_order_descending() {
        let (ledger, _) = ledger();
        ledger.increment("low");
        for _ in 0..3 {
            ledger.increment("high");
        }
        ledger.increment("mid");
        ledger.increment("mid");

        assert_eq!(ledger.most_used_order(), vec!["high", "mid", "low"]);
    }

    #[test]
    fn test_most_used_ties_keep_insertion_order() {
        let (ledger, _) = ledger();
        ledger.increment("zeta");
        ledger.increment("alpha");
        ledger.increment("mike");

        assert_eq!(ledger.most_used_order(), vec!["zeta", "alpha", "mike"]);
    }

    #[test]
    fn test_existing_key_keeps_position() {
        let (ledger, _) = ledger();
        ledger.increment("first");
        ledger.increment("second");
        ledger.increment("first");
        ledger.increment("second");

        let ids: Vec<_> = ledger.counts().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["first", "second"]);
    }

    #[test]
    fn test_malformed_ledger_treated_as_empty() {
        let (ledger, state) = ledger();
        state.set(USAGE_STATISTICS_KEY, Some(json!(["not", "a", "map"])));
        assert_eq!(ledger.get("a"), 0);
        assert_eq!(ledger.increment("a"), 1);
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        let (ledger, _) = ledger();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = ledger.clone();
                thread::spawn(move || {
                    for _ in 0..500 {
                        ledger.increment("iossimulator-A");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(ledger.get("iossimulator-A"), 4000);
    }

    #[test]
    fn test_concurrent_increments_on_file_state() {
        let temp = tempfile::tempdir().unwrap();
        let ledger = UsageLedger::new(Arc::new(FileWorkspaceState::open(temp.path())));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ledger = ledger.clone();
                thread::spawn(move || {
                    for _ in 0..25 {
                        ledger.increment("macos-arm64");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(ledger.get("macos-arm64"), 100);
        let reopened = UsageLedger::new(Arc::new(FileWorkspaceState::open(temp.path())));
        assert_eq!(reopened.get("macos-arm64"), 100);
    }

    #[test]
    fn test_increment_saturates_at_max() {
        let (ledger, state) = ledger();
        state.set(USAGE_STATISTICS_KEY, Some(json!({ "x": u64::MAX })));

        assert_eq!(ledger.increment("x"), u64::MAX);
        assert_eq!(ledger.get("x"), u64::MAX);
    }
}
