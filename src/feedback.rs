//! Sound and haptic feedback
//!
//! The simulation only emits `GameEvent`s. `dispatch` maps them onto a
//! `FeedbackSink`, which is fire-and-forget: a sink that cannot play a sound or
//! vibrate simply does nothing, and nothing flows back into the game.

use crate::sim::{GameEvent, Rank};

/// Vibration pattern for a drop (ms on/off)
pub const DROP_PATTERN: &[u32] = &[50];
/// Vibration pattern for a regular merge
pub const MERGE_PATTERN: &[u32] = &[100, 50, 100];
/// Vibration pattern for creating a max rank piece
pub const MAX_RANK_PATTERN: &[u32] = &[200, 100, 200, 100, 200];
/// Vibration pattern for game over
pub const GAME_OVER_PATTERN: &[u32] = &[300, 200, 300];

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Pending piece released
    Drop,
    /// Two pieces fused into `rank`
    Merge { rank: Rank },
    /// Max rank piece created
    MaxRank,
    GameOver,
}

impl SoundEffect {
    /// Base pitch of the effect. Merges climb a semitone per rank.
    pub fn pitch_hz(self) -> f32 {
        match self {
            SoundEffect::Drop => 220.0,
            SoundEffect::Merge { rank } => 330.0 * 2f32.powf(f32::from(rank.get() - 1) / 12.0),
            SoundEffect::MaxRank => 880.0,
            SoundEffect::GameOver => 110.0,
        }
    }
}

/// Whatever plays sounds and drives the vibration motor
pub trait FeedbackSink {
    fn play(&mut self, effect: SoundEffect);
    fn vibrate(&mut self, pattern: &[u32]);
}

/// Forward a batch of game events to a sink
pub fn dispatch(events: &[GameEvent], sink: &mut impl FeedbackSink) {
    for event in events {
        match event {
            GameEvent::Dropped { .. } => {
                sink.play(SoundEffect::Drop);
                sink.vibrate(DROP_PATTERN);
            }
            GameEvent::Merged { rank, .. } => {
                sink.play(SoundEffect::Merge { rank: *rank });
                if !rank.is_max() {
                    sink.vibrate(MERGE_PATTERN);
                }
            }
            GameEvent::MaxRankReached { .. } => {
                sink.play(SoundEffect::MaxRank);
                sink.vibrate(MAX_RANK_PATTERN);
            }
            GameEvent::GameOver { .. } => {
                sink.play(SoundEffect::GameOver);
                sink.vibrate(GAME_OVER_PATTERN);
            }
        }
    }
}

/// Sink for headless runs: reports feedback through the log
#[derive(Debug, Clone)]
pub struct LogFeedback {
    volume: f32,
    muted: bool,
    haptics: bool,
}

impl Default for LogFeedback {
    fn default() -> Self {
        Self::new()
    }
}

impl LogFeedback {
    pub fn new() -> Self {
        Self {
            volume: 0.8,
            muted: false,
            haptics: true,
        }
    }

    /// Set volume (0.0 - 1.0)
    pub fn set_volume(&mut self, vol: f32) {
        self.volume = vol.clamp(0.0, 1.0);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn set_haptics(&mut self, enabled: bool) {
        self.haptics = enabled;
    }

    fn effective_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.volume }
    }
}

impl FeedbackSink for LogFeedback {
    fn play(&mut self, effect: SoundEffect) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }
        log::debug!("sound {:?} at {:.0} Hz, volume {:.2}", effect, effect.pitch_hz(), vol);
    }

    fn vibrate(&mut self, pattern: &[u32]) {
        if self.haptics {
            log::debug!("vibrate {:?}", pattern);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::PieceId;
    use glam::Vec2;

    #[derive(Default)]
    struct Recorder {
        sounds: Vec<SoundEffect>,
        patterns: Vec<Vec<u32>>,
    }

    impl FeedbackSink for Recorder {
        fn play(&mut self, effect: SoundEffect) {
            self.sounds.push(effect);
        }

        fn vibrate(&mut self, pattern: &[u32]) {
            self.patterns.push(pattern.to_vec());
        }
    }

    #[test]
    fn test_dispatch_maps_events() {
        let rank = Rank::new(4).unwrap();
        let events = [
            GameEvent::Dropped {
                id: PieceId(1),
                rank: Rank::MIN,
                x: 200.0,
            },
            GameEvent::Merged {
                rank,
                position: Vec2::new(100.0, 500.0),
            },
            GameEvent::GameOver { final_score: 12 },
        ];
        let mut sink = Recorder::default();
        dispatch(&events, &mut sink);

        assert_eq!(
            sink.sounds,
            vec![SoundEffect::Drop, SoundEffect::Merge { rank }, SoundEffect::GameOver]
        );
        assert_eq!(sink.patterns, vec![vec![50], vec![100, 50, 100], vec![300, 200, 300]]);
    }

    #[test]
    fn test_max_rank_uses_celebration_pattern_only() {
        let position = Vec2::new(200.0, 300.0);
        let events = [
            GameEvent::Merged {
                rank: Rank::MAX,
                position,
            },
            GameEvent::MaxRankReached { position },
        ];
        let mut sink = Recorder::default();
        dispatch(&events, &mut sink);

        assert_eq!(sink.sounds.len(), 2);
        assert_eq!(sink.patterns, vec![MAX_RANK_PATTERN.to_vec()]);
    }

    #[test]
    fn test_merge_pitch_rises_with_rank() {
        let low = SoundEffect::Merge { rank: Rank::MIN }.pitch_hz();
        let high = SoundEffect::Merge { rank: Rank::MAX }.pitch_hz();
        assert_eq!(low, 330.0);
        assert!(high > low);
    }

    #[test]
    fn test_log_feedback_volume() {
        let mut sink = LogFeedback::new();
        sink.set_volume(3.0);
        assert_eq!(sink.effective_volume(), 1.0);
        sink.set_muted(true);
        assert_eq!(sink.effective_volume(), 0.0);
        // Muted sinks swallow everything
        sink.play(SoundEffect::Drop);
    }
}
