//! Data-driven game balance
//!
//! Every gameplay number that is worth tweaking without a rebuild lives here.
//! `Tuning::default()` holds the reference values; a JSON file may override any
//! subset of them.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::BASE_WIDTH;

/// Failure loading a tuning file
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid tuning JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid tuning: {0}")]
    Invalid(String),
}

/// Well geometry. Y grows downward, origin at the top-left corner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WellTuning {
    pub width: f32,
    pub height: f32,
    pub wall_thickness: f32,
    /// Nominal Y at which pending pieces hang
    pub drop_line: f32,
    /// Distance below the drop line that still counts as a breach
    pub game_over_margin: f32,
    /// Pointer X is kept this far away from either wall
    pub pointer_margin: f32,
}

impl Default for WellTuning {
    fn default() -> Self {
        Self {
            width: 400.0,
            height: 600.0,
            wall_thickness: 20.0,
            drop_line: 50.0,
            game_over_margin: 30.0,
            pointer_margin: 30.0,
        }
    }
}

impl WellTuning {
    /// Y of the top surface of the floor
    pub fn floor_y(&self) -> f32 {
        self.height
    }

    /// Y above which a resting piece ends the game
    pub fn deadline_y(&self) -> f32 {
        self.drop_line + self.game_over_margin
    }

    /// Clamp a pointer X into the playable band
    pub fn clamp_pointer(&self, x: f32) -> f32 {
        x.clamp(self.pointer_margin, self.width - self.pointer_margin)
    }
}

/// Substrate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsTuning {
    /// Downward acceleration (units/s²)
    pub gravity: f32,
    /// Typical object size, lets the solver scale its internal tolerances
    pub length_unit: f32,
    /// Initial downward speed given to a dropped piece (units per physics step)
    pub drop_kick: f32,
    pub floor_friction: f32,
    pub floor_restitution: f32,
    pub wall_friction: f32,
    pub wall_restitution: f32,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            gravity: 1000.0,
            length_unit: 50.0,
            drop_kick: 0.1,
            floor_friction: 0.5,
            floor_restitution: 0.3,
            wall_friction: 0.3,
            wall_restitution: 0.2,
        }
    }
}

/// Spawn pool and timing windows
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    pub min_rank: u8,
    pub max_rank: u8,
    /// Delay between a drop and the next pending piece (ms)
    pub cooldown_ms: f64,
    /// How long a dropped piece is exempt from the stillness check (ms)
    pub drop_falling_ms: f64,
    /// How long a merge-created piece is exempt from the stillness check (ms)
    pub merge_falling_ms: f64,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            min_rank: 1,
            max_rank: 5,
            cooldown_ms: 800.0,
            drop_falling_ms: 2000.0,
            merge_falling_ms: 1500.0,
        }
    }
}

/// Safe spawn height search
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementTuning {
    /// Horizontal distance within which settled pieces count as "under" the cursor
    pub search_radius: f32,
    /// Extra clearance kept between a new piece and the stack peak
    pub clearance: f32,
    /// Smallest Y a pending piece may hang at
    pub ceiling: f32,
}

impl Default for PlacementTuning {
    fn default() -> Self {
        Self {
            search_radius: 80.0,
            clearance: 40.0,
            ceiling: 10.0,
        }
    }
}

/// Stack overflow detection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameOverTuning {
    pub check_interval_ms: f64,
    /// Linear speed (units per physics step) below which a piece is at rest
    pub rest_speed: f32,
    /// Angular speed (radians per physics step) below which a piece is at rest
    pub rest_angular_speed: f32,
}

impl Default for GameOverTuning {
    fn default() -> Self {
        Self {
            check_interval_ms: 500.0,
            rest_speed: 0.5,
            rest_angular_speed: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringTuning {
    /// One-time bonus for creating a max rank piece
    pub max_rank_bonus: u64,
    /// Persistence key for the best score
    pub best_score_key: String,
}

impl Default for ScoringTuning {
    fn default() -> Self {
        Self {
            max_rank_bonus: 5000,
            best_score_key: "merge-well-best-score".to_string(),
        }
    }
}

/// Physical material of a piece body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyMaterial {
    pub restitution: f32,
    pub friction: f32,
    pub density: f32,
    /// Per-second linear damping
    pub linear_damping: f32,
    pub lock_rotations: bool,
}

/// Material formulas for dropped and merge-created pieces
///
/// Air friction values are per physics step and converted to per-second damping.
/// Densities are multiplied by `density_scale` so masses stay in a range the
/// solver likes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialTuning {
    pub density_scale: f32,

    pub drop_restitution: f32,
    pub drop_friction: f32,
    pub drop_air_friction: f32,
    pub drop_density_base: f32,
    pub drop_density_per_ratio: f32,
    pub drop_lock_rotations: bool,

    pub merge_restitution_base: f32,
    pub merge_restitution_per_ratio: f32,
    pub merge_restitution_min: f32,
    pub merge_friction_base: f32,
    pub merge_friction_per_ratio: f32,
    pub merge_friction_max: f32,
    pub merge_air_friction_base: f32,
    pub merge_air_friction_per_ratio: f32,
    pub merge_density_base: f32,
    pub merge_density_per_ratio: f32,
}

impl Default for MaterialTuning {
    fn default() -> Self {
        Self {
            density_scale: 1000.0,

            drop_restitution: 0.4,
            drop_friction: 0.6,
            drop_air_friction: 0.01,
            drop_density_base: 0.001,
            drop_density_per_ratio: 0.0005,
            drop_lock_rotations: true,

            merge_restitution_base: 0.5,
            merge_restitution_per_ratio: 0.02,
            merge_restitution_min: 0.3,
            merge_friction_base: 0.4,
            merge_friction_per_ratio: 0.03,
            merge_friction_max: 0.8,
            merge_air_friction_base: 0.005,
            merge_air_friction_per_ratio: 0.002,
            merge_density_base: 0.0008,
            merge_density_per_ratio: 0.0002,
        }
    }
}

/// Convert per-step air friction into per-second linear damping
fn air_friction_to_damping(air_friction: f32) -> f32 {
    air_friction / crate::consts::PHYSICS_DT
}

impl MaterialTuning {
    /// Material for a piece entering through the drop line
    pub fn dropped(&self, width: f32) -> BodyMaterial {
        let ratio = width / BASE_WIDTH;
        BodyMaterial {
            restitution: self.drop_restitution,
            friction: self.drop_friction,
            density: (self.drop_density_base + ratio * self.drop_density_per_ratio)
                * self.density_scale,
            linear_damping: air_friction_to_damping(self.drop_air_friction),
            lock_rotations: self.drop_lock_rotations,
        }
    }

    /// Material for a piece created by a merge: bigger pieces bounce less and grip more
    pub fn merged(&self, width: f32) -> BodyMaterial {
        let ratio = width / BASE_WIDTH;
        BodyMaterial {
            restitution: (self.merge_restitution_base - ratio * self.merge_restitution_per_ratio)
                .max(self.merge_restitution_min),
            friction: (self.merge_friction_base + ratio * self.merge_friction_per_ratio)
                .min(self.merge_friction_max),
            density: (self.merge_density_base + ratio * self.merge_density_per_ratio)
                * self.density_scale,
            linear_damping: air_friction_to_damping(
                self.merge_air_friction_base + ratio * self.merge_air_friction_per_ratio,
            ),
            lock_rotations: false,
        }
    }
}

/// Complete game balance
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub well: WellTuning,
    pub physics: PhysicsTuning,
    pub spawn: SpawnTuning,
    pub placement: PlacementTuning,
    pub game_over: GameOverTuning,
    pub scoring: ScoringTuning,
    pub materials: MaterialTuning,
}

impl Tuning {
    /// Parse tuning from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load tuning from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.as_ref().display());
        Ok(tuning)
    }

    /// Reject combinations the simulation cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        let spawn = &self.spawn;
        if spawn.min_rank == 0 || spawn.min_rank > spawn.max_rank {
            return Err(TuningError::Invalid(format!(
                "spawn rank range {}..={} is empty",
                spawn.min_rank, spawn.max_rank
            )));
        }
        if spawn.max_rank >= crate::consts::MAX_RANK {
            return Err(TuningError::Invalid(format!(
                "spawn max rank {} must stay below {}",
                spawn.max_rank,
                crate::consts::MAX_RANK
            )));
        }
        if self.placement.ceiling > self.well.drop_line {
            return Err(TuningError::Invalid(
                "placement ceiling is below the drop line".to_string(),
            ));
        }
        if self.well.pointer_margin * 2.0 > self.well.width {
            return Err(TuningError::Invalid(
                "pointer margin leaves no playable width".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "spawn": { "max_rank": 3 } }"#).unwrap();
        assert_eq!(tuning.spawn.max_rank, 3);
        assert_eq!(tuning.spawn.min_rank, 1);
        assert_eq!(tuning.well.drop_line, 50.0);
        assert_eq!(tuning.scoring.max_rank_bonus, 5000);
    }

    #[test]
    fn test_invalid_rank_range_rejected() {
        let result = Tuning::from_json(r#"{ "spawn": { "min_rank": 4, "max_rank": 2 } }"#);
        assert!(matches!(result, Err(TuningError::Invalid(_))));

        let result = Tuning::from_json(r#"{ "spawn": { "max_rank": 11 } }"#);
        assert!(matches!(result, Err(TuningError::Invalid(_))));
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(matches!(
            Tuning::from_json("{ not json"),
            Err(TuningError::Json(_))
        ));
    }

    #[test]
    fn test_pointer_clamp() {
        let well = WellTuning::default();
        assert_eq!(well.clamp_pointer(-50.0), 30.0);
        assert_eq!(well.clamp_pointer(500.0), 370.0);
        assert_eq!(well.clamp_pointer(200.0), 200.0);
        assert_eq!(well.deadline_y(), 80.0);
    }

    #[test]
    fn test_merged_material_damps_with_size() {
        let materials = MaterialTuning::default();
        let small = materials.merged(26.0);
        let huge = materials.merged(274.0);

        assert!(huge.restitution < small.restitution);
        assert!(huge.friction > small.friction);
        // Clamped to configured bounds
        assert!((huge.restitution - 0.3).abs() < 1e-6);
        assert!((huge.friction - 0.8).abs() < 1e-6);
        assert!(!huge.lock_rotations);
    }

    #[test]
    fn test_dropped_material() {
        let materials = MaterialTuning::default();
        let m = materials.dropped(20.0);
        assert_eq!(m.restitution, 0.4);
        assert_eq!(m.friction, 0.6);
        assert!((m.density - 1.5).abs() < 1e-4);
        assert!((m.linear_damping - 0.6).abs() < 1e-4);
        assert!(m.lock_rotations);
    }
}
