//! Time-windowed set of pieces that are still in motion
//!
//! Pieces enter when dropped or created by a merge and leave once their window
//! has passed. Expiry is checked on query; `prune` only reclaims memory.

use std::collections::HashMap;

use super::registry::PieceId;

#[derive(Debug, Clone, Default)]
pub struct FallingSet {
    /// Piece id -> game clock time (ms) at which the exemption ends
    expiry: HashMap<PieceId, f64>,
}

impl FallingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a piece as falling for `window_ms` from `now_ms`.
    /// A later mark replaces an earlier one.
    pub fn mark(&mut self, id: PieceId, now_ms: f64, window_ms: f64) {
        self.expiry.insert(id, now_ms + window_ms);
    }

    pub fn contains(&self, id: PieceId, now_ms: f64) -> bool {
        self.expiry.get(&id).is_some_and(|&until| now_ms < until)
    }

    /// Forget expired entries
    pub fn prune(&mut self, now_ms: f64) {
        self.expiry.retain(|_, until| now_ms < *until);
    }

    pub fn len(&self) -> usize {
        self.expiry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expiry.is_empty()
    }

    pub fn clear(&mut self) {
        self.expiry.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_window_expires() {
        let mut set = FallingSet::new();
        set.mark(PieceId(1), 1000.0, 2000.0);

        assert!(set.contains(PieceId(1), 1000.0));
        assert!(set.contains(PieceId(1), 2999.0));
        assert!(!set.contains(PieceId(1), 3000.0));
        assert!(!set.contains(PieceId(2), 1000.0));
    }

    #[test]
    fn test_prune_drops_only_expired() {
        let mut set = FallingSet::new();
        set.mark(PieceId(1), 0.0, 1500.0);
        set.mark(PieceId(2), 0.0, 2000.0);

        set.prune(1600.0);
        assert_eq!(set.len(), 1);
        assert!(set.contains(PieceId(2), 1600.0));
    }

    proptest! {
        #[test]
        fn prop_membership_matches_window(
            start in 0u32..100_000,
            window in 1u32..5000,
            probe in 0u32..10_000,
        ) {
            let mut set = FallingSet::new();
            set.mark(PieceId(7), f64::from(start), f64::from(window));
            let now = f64::from(start) + f64::from(probe);
            prop_assert_eq!(set.contains(PieceId(7), now), probe < window);
        }
    }
}
