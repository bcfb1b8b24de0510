//! Merge Well entry point
//!
//! Native builds run a headless autoplay session: a simple bot drops pieces on
//! top of matching ranks until the well overflows, then reports the score.
//!
//! Usage: `merge-well [seed] [tuning.json]`

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use merge_well::feedback::{self, LogFeedback};
    use merge_well::platform;
    use merge_well::sim::{Game, GamePhase, RenderPiece};
    use merge_well::tuning::Tuning;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    /// Display refresh the session pretends to run at
    const FRAME_DT: f32 = 1.0 / 60.0;
    /// Give up after this much game time (10 minutes)
    const MAX_FRAMES: u32 = 60 * 60 * 10;

    /// Pick a drop column: over a settled piece of the same rank if any, else random
    fn choose_x(pieces: &[RenderPiece], rng: &mut Pcg32, min_x: f32, max_x: f32) -> f32 {
        let Some(pending) = pieces.iter().find(|p| p.pending) else {
            return rng.random_range(min_x..=max_x);
        };
        pieces
            .iter()
            .filter(|p| !p.pending && p.rank == pending.rank)
            .min_by(|a, b| a.position.y.total_cmp(&b.position.y))
            .map(|p| p.position.x)
            .unwrap_or_else(|| rng.random_range(min_x..=max_x))
    }

    pub fn run() {
        platform::init_logging();
        log::info!("Merge Well (headless) starting...");

        let mut args = std::env::args().skip(1);
        let seed = args
            .next()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or_else(platform::random_seed);
        let tuning = match args.next() {
            Some(path) => Tuning::load(&path).unwrap_or_else(|e| {
                log::warn!("Ignoring tuning file {}: {}", path, e);
                Tuning::default()
            }),
            None => Tuning::default(),
        };

        let mut game = Game::new(tuning, platform::default_store(), seed);
        let well = &game.tuning().well;
        let min_x = well.pointer_margin;
        let max_x = well.width - well.pointer_margin;
        let mut sink = LogFeedback::new();
        let mut bot = Pcg32::seed_from_u64(seed ^ 0x9E37_79B9_7F4A_7C15);
        let mut drops = 0u32;

        for _ in 0..MAX_FRAMES {
            if game.can_drop() {
                let x = choose_x(&game.render_pieces(), &mut bot, min_x, max_x);
                if game.drop_at(x) {
                    drops += 1;
                }
            }
            game.update(FRAME_DT);
            feedback::dispatch(&game.drain_events(), &mut sink);

            if game.phase() == GamePhase::GameOver {
                break;
            }
        }

        let hud = game.hud();
        log::info!(
            "Session over after {} drops and {:.1}s: {:?}",
            drops,
            game.clock_ms() / 1000.0,
            hud.phase
        );
        println!("seed {}  score {}  best {}", seed, hud.score, hud.best);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The web host drives `merge_well::Game` directly; this only sets up logging
    merge_well::platform::init_logging();
}
