//! Game state machine
//!
//! `Game` owns every component of a run and is driven by the host once per
//! display frame through `update`, plus the discrete player commands. Frame
//! time is folded into fixed physics steps; merges found during those steps are
//! executed after stepping, before the frame returns.

use glam::Vec2;

use super::falling::FallingSet;
use super::merge::MergeResolver;
use super::placement::PlacementPlanner;
use super::registry::PieceRegistry;
use super::state::{GameEvent, GamePhase, Hud, RenderPiece};
use super::timers::{TimerKind, TimerQueue};
use crate::consts::*;
use crate::persistence::{KeyValueStore, MemoryStore};
use crate::score::ScoreLedger;
use crate::tuning::Tuning;

pub struct Game {
    tuning: Tuning,
    phase: GamePhase,
    registry: PieceRegistry,
    planner: PlacementPlanner,
    falling: FallingSet,
    resolver: MergeResolver,
    timers: TimerQueue,
    ledger: ScoreLedger,
    pointer_x: f32,
    /// Cleared on drop, set again when the next pending piece appears
    can_drop: bool,
    /// Game clock (ms), advanced by clamped frame time
    clock_ms: f64,
    accumulator: f32,
    last_game_over_check_ms: f64,
    events: Vec<GameEvent>,
}

impl Game {
    /// Start a run with a pending piece at the center of the well.
    /// An invalid `tuning` is replaced by the defaults.
    pub fn new(tuning: Tuning, store: Box<dyn KeyValueStore>, seed: u64) -> Self {
        let tuning = match tuning.validate() {
            Ok(()) => tuning,
            Err(e) => {
                log::warn!("Ignoring tuning: {}", e);
                Tuning::default()
            }
        };
        let ledger = ScoreLedger::load(store, tuning.scoring.best_score_key.clone());
        let mut game = Self {
            phase: GamePhase::Running,
            registry: PieceRegistry::new(&tuning, seed),
            planner: PlacementPlanner::new(&tuning.placement, &tuning.well),
            falling: FallingSet::new(),
            resolver: MergeResolver::new(&tuning),
            timers: TimerQueue::new(),
            ledger,
            pointer_x: tuning.well.width / 2.0,
            can_drop: true,
            clock_ms: 0.0,
            accumulator: 0.0,
            last_game_over_check_ms: 0.0,
            events: Vec::new(),
            tuning,
        };
        game.spawn_pending();
        log::info!("Game started with seed: {}", seed);
        game
    }

    /// Default tuning, best score kept in memory only
    pub fn with_defaults(seed: u64) -> Self {
        Self::new(Tuning::default(), Box::new(MemoryStore::new()), seed)
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn score(&self) -> u64 {
        self.ledger.score()
    }

    pub fn best(&self) -> u64 {
        self.ledger.best()
    }

    pub fn pointer_x(&self) -> f32 {
        self.pointer_x
    }

    /// Whether a drop command would currently be accepted
    pub fn can_drop(&self) -> bool {
        self.phase == GamePhase::Running && self.can_drop && self.registry.pending().is_some()
    }

    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Where a pending piece of `height` should hang under the pointer
    fn pending_position(&self, height: f32) -> Vec2 {
        let stack = self.registry.settled_bounds();
        let y = self.planner.safe_drop_y(self.pointer_x, height, &stack);
        Vec2::new(self.pointer_x, y)
    }

    fn spawn_pending(&mut self) {
        let rank = self.registry.next_rank();
        let position = self.pending_position(rank.spec().height);
        let id = self.registry.spawn_next_pending(position);
        log::debug!("Pending piece {} (rank {}) at x={:.1}", id, rank, position.x);
    }

    /// Move the pointer; the pending piece follows at a safe height
    pub fn set_pointer_x(&mut self, x: f32) {
        if self.phase == GamePhase::GameOver {
            return;
        }
        self.pointer_x = self.tuning.well.clamp_pointer(x);
        if let Some(height) = self.registry.pending().map(|p| p.height) {
            let position = self.pending_position(height);
            self.registry.move_pending(position);
        }
    }

    /// Commit the pending piece. Returns false (and does nothing) while paused,
    /// after game over, during the cooldown or without a pending piece.
    pub fn drop_piece(&mut self) -> bool {
        if !self.can_drop() {
            log::debug!("Drop rejected ({:?}, cooldown clear: {})", self.phase, self.can_drop);
            return false;
        }
        let Some((height, rank)) = self.registry.pending().map(|p| (p.height, p.rank)) else {
            return false;
        };

        // The stack may have grown while the piece was hanging
        let position = self.pending_position(height);
        self.registry.move_pending(position);

        let kick = Vec2::new(0.0, self.tuning.physics.drop_kick / PHYSICS_DT);
        let Some(id) = self.registry.promote_to_settled(kick) else {
            return false;
        };

        self.falling
            .mark(id, self.clock_ms, self.tuning.spawn.drop_falling_ms);
        self.can_drop = false;
        self.timers.schedule(
            self.clock_ms + self.tuning.spawn.cooldown_ms,
            TimerKind::SpawnPending,
        );
        self.events.push(GameEvent::Dropped {
            id,
            rank,
            x: position.x,
        });
        log::debug!("Dropped {} (rank {}) at ({:.1}, {:.1})", id, rank, position.x, position.y);
        true
    }

    /// Move the pointer to `x` and drop
    pub fn drop_at(&mut self, x: f32) -> bool {
        self.set_pointer_x(x);
        self.drop_piece()
    }

    /// Running <-> Paused. No effect after game over.
    pub fn toggle_pause(&mut self) {
        self.phase = match self.phase {
            GamePhase::Running => {
                log::info!("Paused");
                GamePhase::Paused
            }
            GamePhase::Paused => {
                log::info!("Resumed");
                GamePhase::Running
            }
            GamePhase::GameOver => GamePhase::GameOver,
        };
    }

    /// Tear everything down and start a fresh run. The best score survives.
    pub fn restart(&mut self) {
        self.timers.clear();
        self.resolver.clear();
        self.falling.clear();
        self.registry.reset();
        self.ledger.reset();

        self.phase = GamePhase::Running;
        self.can_drop = true;
        self.accumulator = 0.0;
        self.last_game_over_check_ms = self.clock_ms;
        self.spawn_pending();
        log::info!("Game restarted (best score {})", self.ledger.best());
    }

    /// Advance by one display frame of `frame_dt` seconds
    pub fn update(&mut self, frame_dt: f32) {
        if self.phase == GamePhase::GameOver {
            return;
        }
        let dt = frame_dt.clamp(0.0, MAX_FRAME_DT);
        self.clock_ms += f64::from(dt) * 1000.0;

        if self.phase == GamePhase::Running {
            self.step_physics(dt);
            self.run_merges();
        }

        // Timers keep running while paused
        self.run_timers();

        if self.phase == GamePhase::Running
            && self.clock_ms - self.last_game_over_check_ms
                >= self.tuning.game_over.check_interval_ms
        {
            self.last_game_over_check_ms = self.clock_ms;
            self.check_game_over();
        }

        self.falling.prune(self.clock_ms);
    }

    fn step_physics(&mut self, dt: f32) {
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= PHYSICS_DT && substeps < MAX_SUBSTEPS {
            let pairs = self.registry.world_mut().step();
            self.resolver.collect(&pairs, &self.registry);
            self.accumulator -= PHYSICS_DT;
            substeps += 1;
        }
    }

    fn run_merges(&mut self) {
        let outcomes = self.resolver.execute(
            &mut self.registry,
            &mut self.falling,
            &mut self.ledger,
            self.clock_ms,
        );
        for outcome in outcomes {
            self.events.push(GameEvent::Merged {
                rank: outcome.rank,
                position: outcome.position,
            });
            if outcome.rank.is_max() {
                log::info!("Max rank reached, +{} bonus", outcome.bonus);
                self.events.push(GameEvent::MaxRankReached {
                    position: outcome.position,
                });
            }
        }
    }

    fn run_timers(&mut self) {
        for kind in self.timers.drain_due(self.clock_ms) {
            match kind {
                TimerKind::SpawnPending => {
                    if self.phase == GamePhase::GameOver {
                        continue;
                    }
                    self.spawn_pending();
                    self.can_drop = true;
                }
            }
        }
    }

    /// End the run if any settled piece at rest pokes above the deadline
    fn check_game_over(&mut self) {
        let deadline = self.tuning.well.deadline_y();
        let rest = &self.tuning.game_over;

        let breach = self
            .registry
            .settled_bounds()
            .into_iter()
            .filter(|bounds| bounds.top() < deadline)
            .filter(|bounds| !self.falling.contains(bounds.id, self.clock_ms))
            .find(|bounds| {
                self.registry.body_state(bounds.id).is_some_and(|state| {
                    state.speed_per_step() < rest.rest_speed
                        && state.angular_speed_per_step() < rest.rest_angular_speed
                })
            })
            .map(|bounds| bounds.id);

        if let Some(id) = breach {
            let final_score = self.ledger.score();
            self.phase = GamePhase::GameOver;
            self.can_drop = false;
            self.events.push(GameEvent::GameOver { final_score });
            log::info!("Game over: {} rests above the deadline, final score {}", id, final_score);
        }
    }

    pub fn hud(&self) -> Hud {
        Hud {
            score: self.ledger.score(),
            best: self.ledger.best(),
            next_rank: self.registry.next_rank(),
            phase: self.phase,
        }
    }

    /// Settled pieces (by id) followed by the pending piece
    pub fn render_pieces(&self) -> Vec<RenderPiece> {
        let settled = self.registry.all_settled().iter().map(|p| (p, false));
        let pending = self.registry.pending().map(|p| (p, true));

        settled
            .chain(pending)
            .filter_map(|(piece, pending)| {
                let state = self.registry.body_state(piece.id)?;
                Some(RenderPiece {
                    id: piece.id,
                    rank: piece.rank,
                    position: state.position,
                    rotation: state.rotation,
                    pending,
                })
            })
            .collect()
    }

    /// Take the events emitted since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Hand back the best score store
    pub fn into_store(self) -> Box<dyn KeyValueStore> {
        self.ledger.into_store()
    }
}
