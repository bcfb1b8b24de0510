//! Collision-driven merges
//!
//! Collision callbacks arrive in the middle of a physics step, when the world
//! must not be mutated. The resolver therefore works in two phases:
//!
//! 1. `collect` filters raw contact pairs down to equal-rank settled pieces
//!    below the max rank and queues each unordered pair at most once.
//! 2. `execute` runs once per frame after stepping. Every job re-validates that
//!    both pieces are still alive, since an earlier job in the same batch may
//!    already have consumed one of them.

use std::collections::HashSet;

use glam::Vec2;

use super::falling::FallingSet;
use super::physics::CollisionPair;
use super::rank::Rank;
use super::registry::{PieceId, PieceRegistry};
use crate::score::ScoreLedger;
use crate::tuning::Tuning;

/// What a completed merge did
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub consumed: (PieceId, PieceId),
    pub created: PieceId,
    /// Rank of the created piece
    pub rank: Rank,
    pub position: Vec2,
    /// Merge score for the consumed rank
    pub points: u64,
    /// Max rank bonus (0 unless `rank` is the max rank)
    pub bonus: u64,
}

#[derive(Debug, Clone)]
pub struct MergeResolver {
    /// Queued pairs in arrival order, keyed (min, max)
    jobs: Vec<(PieceId, PieceId)>,
    queued: HashSet<(PieceId, PieceId)>,
    merge_falling_ms: f64,
    max_rank_bonus: u64,
}

impl MergeResolver {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            jobs: Vec::new(),
            queued: HashSet::new(),
            merge_falling_ms: tuning.spawn.merge_falling_ms,
            max_rank_bonus: tuning.scoring.max_rank_bonus,
        }
    }

    /// Queue mergeable pairs from one step's contacts. Returns how many were new.
    pub fn collect(&mut self, pairs: &[CollisionPair], registry: &PieceRegistry) -> usize {
        let mut added = 0;
        for pair in pairs {
            if pair.a == pair.b {
                continue;
            }
            let (Some(a), Some(b)) = (registry.get(pair.a), registry.get(pair.b)) else {
                continue;
            };
            if a.rank != b.rank || !a.rank.can_merge() {
                continue;
            }
            let key = pair.key();
            if self.queued.insert(key) {
                self.jobs.push(key);
                added += 1;
            }
        }
        added
    }

    /// Number of merges waiting for the next frame boundary
    pub fn queued(&self) -> usize {
        self.jobs.len()
    }

    /// Run every queued merge
    pub fn execute(
        &mut self,
        registry: &mut PieceRegistry,
        falling: &mut FallingSet,
        ledger: &mut ScoreLedger,
        now_ms: f64,
    ) -> Vec<MergeOutcome> {
        let jobs = std::mem::take(&mut self.jobs);
        self.queued.clear();

        jobs.into_iter()
            .filter_map(|(a, b)| self.merge(a, b, registry, falling, ledger, now_ms))
            .collect()
    }

    fn merge(
        &self,
        a: PieceId,
        b: PieceId,
        registry: &mut PieceRegistry,
        falling: &mut FallingSet,
        ledger: &mut ScoreLedger,
        now_ms: f64,
    ) -> Option<MergeOutcome> {
        let (Some(piece_a), Some(piece_b)) = (registry.get(a), registry.get(b)) else {
            log::debug!("Skipping stale merge {} + {}", a, b);
            return None;
        };
        if piece_a.rank != piece_b.rank {
            return None;
        }
        let consumed_rank = piece_a.rank;
        let new_rank = consumed_rank.next()?;

        let state_a = registry.body_state(a)?;
        let state_b = registry.body_state(b)?;
        let position = Vec2::new(
            (state_a.position.x + state_b.position.x) / 2.0,
            state_a.position.y.min(state_b.position.y),
        );

        registry.remove_pieces(&[a, b]);
        let created = registry.create_merged(new_rank, position);
        falling.mark(created, now_ms, self.merge_falling_ms);

        let points = consumed_rank.spec().merge_score;
        let bonus = if new_rank.is_max() {
            self.max_rank_bonus
        } else {
            0
        };
        ledger.add(points + bonus);

        log::debug!(
            "Merged {} + {} (rank {}) into {} (rank {}) at ({:.1}, {:.1}), +{}",
            a,
            b,
            consumed_rank,
            created,
            new_rank,
            position.x,
            position.y,
            points + bonus
        );

        Some(MergeOutcome {
            consumed: (a, b),
            created,
            rank: new_rank,
            position,
            points,
            bonus,
        })
    }

    /// Forget queued work (restart)
    pub fn clear(&mut self) {
        self.jobs.clear();
        self.queued.clear();
    }
}
