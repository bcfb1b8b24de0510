//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by piece id)
//! - No rendering or platform dependencies

pub mod falling;
pub mod game;
pub mod merge;
pub mod physics;
pub mod placement;
pub mod rank;
pub mod registry;
pub mod state;
pub mod timers;

pub use falling::FallingSet;
pub use game::Game;
pub use merge::{MergeOutcome, MergeResolver};
pub use physics::{BodyKind, BodyState, CollisionPair, PhysicsWorld};
pub use placement::PlacementPlanner;
pub use rank::{Rank, RankSpec};
pub use registry::{Piece, PieceBounds, PieceId, PieceRegistry};
pub use state::{GameEvent, GamePhase, Hud, RenderPiece};
pub use timers::{TimerKind, TimerQueue};
