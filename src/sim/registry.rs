//! Piece registry
//!
//! Owns every live piece together with the physics world, so a logical piece
//! and its body are always created and destroyed in the same call.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::physics::{BodyKind, BodyState, PhysicsWorld};
use super::rank::Rank;
use crate::tuning::Tuning;

/// Stable identity of a piece. Never reused within a registry, even across resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PieceId(pub u32);

impl std::fmt::Display for PieceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Logical record of a live piece
#[derive(Debug, Clone, PartialEq)]
pub struct Piece {
    pub id: PieceId,
    pub rank: Rank,
    pub width: f32,
    pub height: f32,
}

impl Piece {
    fn new(id: PieceId, rank: Rank) -> Self {
        let spec = rank.spec();
        Self {
            id,
            rank,
            width: spec.width,
            height: spec.height,
        }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Half extents of the axis-aligned box around the piece at a given rotation
    pub fn aabb_half_extents(&self, rotation: f32) -> Vec2 {
        let (sin, cos) = rotation.sin_cos();
        let hw = self.width / 2.0;
        let hh = self.height / 2.0;
        Vec2::new(
            (hw * cos).abs() + (hh * sin).abs(),
            (hw * sin).abs() + (hh * cos).abs(),
        )
    }
}

/// Where a settled piece currently is, for placement and overflow checks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PieceBounds {
    pub id: PieceId,
    pub center: Vec2,
    pub half_extents: Vec2,
}

impl PieceBounds {
    /// Smallest Y covered by the piece (Y grows downward)
    pub fn top(&self) -> f32 {
        self.center.y - self.half_extents.y
    }
}

/// Live pieces plus the world that simulates them
pub struct PieceRegistry {
    tuning: Tuning,
    world: PhysicsWorld,
    pending: Option<Piece>,
    /// Sorted by id for deterministic iteration
    settled: Vec<Piece>,
    next_id: u32,
    rng: Pcg32,
    next_rank: Rank,
}

impl PieceRegistry {
    pub fn new(tuning: &Tuning, seed: u64) -> Self {
        let first = Rank::new(tuning.spawn.min_rank).unwrap_or(Rank::MIN);
        Self {
            tuning: tuning.clone(),
            world: PhysicsWorld::new(&tuning.well, &tuning.physics),
            pending: None,
            settled: Vec::new(),
            next_id: 1,
            rng: Pcg32::seed_from_u64(seed),
            next_rank: first,
        }
    }

    fn allocate_id(&mut self) -> PieceId {
        let id = PieceId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Uniform draw from the spawn pool
    fn draw_rank(&mut self) -> Rank {
        let spawn = &self.tuning.spawn;
        let value = self.rng.random_range(spawn.min_rank..=spawn.max_rank);
        Rank::new(value).unwrap_or(Rank::MIN)
    }

    /// Rank the next pending piece will have
    pub fn next_rank(&self) -> Rank {
        self.next_rank
    }

    /// Create the pending piece, replacing any previous one
    pub fn spawn_pending(&mut self, rank: Rank, position: Vec2) -> PieceId {
        if let Some(old) = self.pending.take() {
            log::debug!("Replacing pending piece {}", old.id);
            self.world.remove_piece(old.id);
        }

        let id = self.allocate_id();
        let piece = Piece::new(id, rank);
        let material = self.tuning.materials.dropped(piece.width);
        self.world
            .insert_piece(id, position, piece.size(), &material, BodyKind::Pending);
        self.pending = Some(piece);
        id
    }

    /// Spawn the queued next rank as the pending piece and draw a new next rank
    pub fn spawn_next_pending(&mut self, position: Vec2) -> PieceId {
        let rank = self.next_rank;
        let id = self.spawn_pending(rank, position);
        self.next_rank = self.draw_rank();
        id
    }

    pub fn pending(&self) -> Option<&Piece> {
        self.pending.as_ref()
    }

    /// Reposition the pending piece (no-op without one)
    pub fn move_pending(&mut self, position: Vec2) {
        if let Some(piece) = &self.pending {
            self.world.set_position(piece.id, position);
        }
    }

    /// Hand the pending piece over to gravity and the stack
    pub fn promote_to_settled(&mut self, initial_velocity: Vec2) -> Option<PieceId> {
        let piece = self.pending.take()?;
        if !self.world.settle(piece.id, initial_velocity) {
            log::warn!("Pending piece {} had no body, discarding", piece.id);
            return None;
        }
        let id = piece.id;
        self.insert_settled(piece);
        Some(id)
    }

    /// Create a settled piece with merge-created material
    pub fn create_merged(&mut self, rank: Rank, position: Vec2) -> PieceId {
        let id = self.allocate_id();
        let piece = Piece::new(id, rank);
        let material = self.tuning.materials.merged(piece.width);
        self.world
            .insert_piece(id, position, piece.size(), &material, BodyKind::Settled);
        self.insert_settled(piece);
        id
    }

    fn insert_settled(&mut self, piece: Piece) {
        let idx = self.settled.partition_point(|p| p.id < piece.id);
        self.settled.insert(idx, piece);
    }

    /// Destroy settled pieces and their bodies. Unknown ids are skipped.
    /// Returns how many pieces were removed.
    pub fn remove_pieces(&mut self, ids: &[PieceId]) -> usize {
        let before = self.settled.len();
        self.settled.retain(|p| !ids.contains(&p.id));
        for id in ids {
            self.world.remove_piece(*id);
        }
        before - self.settled.len()
    }

    pub fn all_settled(&self) -> &[Piece] {
        &self.settled
    }

    /// Look up a settled piece
    pub fn get(&self, id: PieceId) -> Option<&Piece> {
        self.settled
            .binary_search_by_key(&id, |p| p.id)
            .ok()
            .map(|idx| &self.settled[idx])
    }

    pub fn is_settled(&self, id: PieceId) -> bool {
        self.get(id).is_some()
    }

    pub fn body_state(&self, id: PieceId) -> Option<BodyState> {
        self.world.body_state(id)
    }

    /// Current bounds of one piece (pending or settled)
    pub fn bounds_of(&self, piece: &Piece) -> Option<PieceBounds> {
        let state = self.world.body_state(piece.id)?;
        Some(PieceBounds {
            id: piece.id,
            center: state.position,
            half_extents: piece.aabb_half_extents(state.rotation),
        })
    }

    /// Current bounds of every settled piece
    pub fn settled_bounds(&self) -> Vec<PieceBounds> {
        self.settled
            .iter()
            .filter_map(|piece| self.bounds_of(piece))
            .collect()
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.world
    }

    /// Drop every piece and rebuild an empty world.
    /// Id allocation and the rank stream carry on.
    pub fn reset(&mut self) {
        self.pending = None;
        self.settled.clear();
        self.world = PhysicsWorld::new(&self.tuning.well, &self.tuning.physics);
    }
}
