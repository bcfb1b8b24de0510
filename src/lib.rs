//! Merge Well - a physics-based merge drop arcade game
//!
//! Core modules:
//! - `sim`: Simulation core (rigid-body substrate, merges, placement, game state)
//! - `score`: Current/best score with durable best score
//! - `persistence`: String-keyed storage backends
//! - `feedback`: Fire-and-forget sound/haptic notifications
//! - `platform`: Browser/native platform abstraction
//! - `tuning`: Data-driven game balance

pub mod feedback;
pub mod persistence;
pub mod platform;
pub mod score;
pub mod sim;
pub mod tuning;

pub use score::ScoreLedger;
pub use sim::{Game, GameEvent, GamePhase};
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Fixed physics timestep (60 Hz, decoupled from display rate)
    pub const PHYSICS_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame delta accepted by the loop (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Highest rank a piece can reach
    pub const MAX_RANK: u8 = 11;
    /// Width of a rank 1 piece, used for size ratios
    pub const BASE_WIDTH: f32 = 20.0;
}
