//! Score ledger
//!
//! Tracks the current run's score and the best score ever seen. The best score
//! is written through to a `KeyValueStore` whenever it improves; storage
//! failures are logged and otherwise ignored.

use crate::persistence::KeyValueStore;

pub struct ScoreLedger {
    score: u64,
    best: u64,
    key: String,
    store: Box<dyn KeyValueStore>,
}

impl ScoreLedger {
    /// Open the ledger, reading the stored best score (0 if absent or unreadable)
    pub fn load(store: Box<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        let best = match store.get(&key) {
            Ok(Some(raw)) => raw.trim().parse::<u64>().unwrap_or_else(|_| {
                log::warn!("Ignoring unreadable best score {:?}", raw);
                0
            }),
            Ok(None) => 0,
            Err(e) => {
                log::warn!("Could not read best score: {}", e);
                0
            }
        };
        log::info!("Best score: {}", best);

        Self {
            score: 0,
            best,
            key,
            store,
        }
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn best(&self) -> u64 {
        self.best
    }

    /// Add points to the current score. Returns true if this set a new best.
    pub fn add(&mut self, points: u64) -> bool {
        self.set_score(self.score.saturating_add(points))
    }

    /// Replace the current score. Returns true if this set a new best.
    pub fn set_score(&mut self, score: u64) -> bool {
        self.score = score;
        if score <= self.best {
            return false;
        }
        self.best = score;
        if let Err(e) = self.store.set(&self.key, &score.to_string()) {
            log::warn!("Could not persist best score {}: {}", score, e);
        }
        true
    }

    /// Start a new run; the best score is kept
    pub fn reset(&mut self) {
        self.score = 0;
    }

    /// Give the backing store back (e.g. to reopen it after a restart)
    pub fn into_store(self) -> Box<dyn KeyValueStore> {
        self.store
    }
}

impl std::fmt::Debug for ScoreLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoreLedger")
            .field("score", &self.score)
            .field("best", &self.best)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{MemoryStore, StoreError};

    const KEY: &str = "best";

    /// Store whose every operation fails
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable("broken".to_string()))
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("broken".to_string()))
        }
    }

    #[test]
    fn test_best_score_round_trip() {
        let mut ledger = ScoreLedger::load(Box::new(MemoryStore::new()), KEY);
        assert_eq!(ledger.best(), 0);

        assert!(ledger.set_score(120));
        assert_eq!(ledger.best(), 120);

        // Simulated restart: reopen the same store
        let store = ledger.into_store();
        assert_eq!(store.get(KEY).unwrap().as_deref(), Some("120"));
        let reopened = ScoreLedger::load(store, KEY);
        assert_eq!(reopened.best(), 120);
        assert_eq!(reopened.score(), 0);
    }

    #[test]
    fn test_lower_score_leaves_best_alone() {
        let mut store = MemoryStore::new();
        store.set(KEY, "500").unwrap();
        let mut ledger = ScoreLedger::load(Box::new(store), KEY);

        assert!(!ledger.set_score(300));
        assert!(!ledger.set_score(500));
        assert_eq!(ledger.best(), 500);
        assert_eq!(ledger.score(), 500);

        let store = ledger.into_store();
        assert_eq!(store.get(KEY).unwrap().as_deref(), Some("500"));
    }

    #[test]
    fn test_add_and_reset() {
        let mut ledger = ScoreLedger::load(Box::new(MemoryStore::new()), KEY);
        ledger.add(1);
        ledger.add(3);
        assert_eq!(ledger.score(), 4);
        assert_eq!(ledger.best(), 4);

        ledger.reset();
        assert_eq!(ledger.score(), 0);
        assert_eq!(ledger.best(), 4);
    }

    #[test]
    fn test_garbage_in_store_reads_as_zero() {
        let mut store = MemoryStore::new();
        store.set(KEY, "lots").unwrap();
        let ledger = ScoreLedger::load(Box::new(store), KEY);
        assert_eq!(ledger.best(), 0);
    }

    #[test]
    fn test_broken_store_does_not_block_scoring() {
        let mut ledger = ScoreLedger::load(Box::new(BrokenStore), KEY);
        assert_eq!(ledger.best(), 0);
        assert!(ledger.add(66));
        assert_eq!(ledger.score(), 66);
        assert_eq!(ledger.best(), 66);
    }
}
