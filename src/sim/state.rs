//! Game phases, events and the read-only views handed to presentation code

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::rank::Rank;
use super::registry::PieceId;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Running,
    /// Physics and merges frozen, drops rejected
    Paused,
    /// Stack breached the deadline; only restart is accepted
    GameOver,
}

/// Something presentation code may want to react to (sound, haptics, UI)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Pending piece committed to the stack
    Dropped { id: PieceId, rank: Rank, x: f32 },
    /// Two pieces fused into one of `rank`
    Merged { rank: Rank, position: Vec2 },
    /// A merge produced the max rank
    MaxRankReached { position: Vec2 },
    GameOver { final_score: u64 },
}

/// One piece to draw this frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderPiece {
    pub id: PieceId,
    pub rank: Rank,
    pub position: Vec2,
    pub rotation: f32,
    /// Still following the pointer
    pub pending: bool,
}

/// Values for the score display and next-piece preview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hud {
    pub score: u64,
    pub best: u64,
    pub next_rank: Rank,
    pub phase: GamePhase,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_serialize() {
        let event = GameEvent::Merged {
            rank: Rank::new(3).unwrap(),
            position: Vec2::new(120.0, 400.0),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: GameEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_bad_rank_rejected_on_deserialize() {
        let json = r#"{"score":1,"best":2,"next_rank":12,"phase":"Running"}"#;
        assert!(serde_json::from_str::<Hud>(json).is_err());
    }
}
