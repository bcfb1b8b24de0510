//! Collision-free spawn height for the pending piece

use super::registry::PieceBounds;
use crate::tuning::{PlacementTuning, WellTuning};

/// Computes where a pending piece may hang without touching the stack
#[derive(Debug, Clone)]
pub struct PlacementPlanner {
    search_radius: f32,
    clearance: f32,
    ceiling: f32,
    drop_line: f32,
    floor_y: f32,
}

impl PlacementPlanner {
    pub fn new(placement: &PlacementTuning, well: &WellTuning) -> Self {
        Self {
            search_radius: placement.search_radius,
            clearance: placement.clearance,
            ceiling: placement.ceiling,
            drop_line: well.drop_line,
            floor_y: well.floor_y(),
        }
    }

    /// Highest point (smallest Y) of the stack under `x`, or the floor
    pub fn stack_peak(&self, x: f32, stack: &[PieceBounds]) -> f32 {
        stack
            .iter()
            .filter(|b| (b.center.x - x).abs() <= self.search_radius)
            .map(PieceBounds::top)
            .fold(self.floor_y, f32::min)
    }

    /// Center Y for a piece of `piece_height` hanging at `x`.
    ///
    /// Keeps `piece_height + clearance` above the stack peak, never above the
    /// ceiling and never below the drop line.
    pub fn safe_drop_y(&self, x: f32, piece_height: f32, stack: &[PieceBounds]) -> f32 {
        let peak = self.stack_peak(x, stack);
        let y = peak - (piece_height + self.clearance);
        y.clamp(self.ceiling, self.drop_line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::registry::PieceId;
    use glam::Vec2;
    use proptest::prelude::*;

    fn planner() -> PlacementPlanner {
        PlacementPlanner::new(&PlacementTuning::default(), &WellTuning::default())
    }

    fn block(id: u32, x: f32, top: f32, half: Vec2) -> PieceBounds {
        PieceBounds {
            id: PieceId(id),
            center: Vec2::new(x, top + half.y),
            half_extents: half,
        }
    }

    #[test]
    fn test_empty_well_uses_drop_line() {
        let p = planner();
        assert_eq!(p.stack_peak(200.0, &[]), 600.0);
        assert_eq!(p.safe_drop_y(200.0, 24.0, &[]), 50.0);
    }

    #[test]
    fn test_tall_stack_pushes_piece_up() {
        let p = planner();
        let stack = [block(1, 210.0, 120.0, Vec2::new(50.0, 60.0))];
        // 120 - (24 + 40) = 56 is still below the drop line
        assert_eq!(p.safe_drop_y(200.0, 24.0, &stack), 50.0);
        // 120 - (68 + 40) = 12
        assert_eq!(p.safe_drop_y(200.0, 68.0, &stack), 12.0);
    }

    #[test]
    fn test_ceiling_clamp() {
        let p = planner();
        let stack = [block(1, 200.0, 30.0, Vec2::new(20.0, 20.0))];
        assert_eq!(p.safe_drop_y(200.0, 24.0, &stack), 10.0);
    }

    #[test]
    fn test_pieces_outside_radius_ignored() {
        let p = planner();
        let stack = [block(1, 300.0, 20.0, Vec2::new(10.0, 12.0))];
        assert_eq!(p.stack_peak(200.0, &stack), 600.0);
        assert_eq!(p.stack_peak(220.0, &stack), 20.0);
    }

    fn stack_strategy() -> impl Strategy<Value = Vec<(f32, f32, f32, f32)>> {
        // (center x, top, half width, half height)
        prop::collection::vec((0.0f32..400.0, 0.0f32..600.0, 10.0f32..140.0, 12.0f32..165.0), 0..12)
    }

    proptest! {
        #[test]
        fn prop_result_within_ceiling_and_drop_line(
            x in 30.0f32..370.0,
            height in 24.0f32..329.0,
            raw in stack_strategy(),
        ) {
            let stack: Vec<_> = raw
                .iter()
                .enumerate()
                .map(|(i, &(cx, top, hw, hh))| block(i as u32, cx, top, Vec2::new(hw, hh)))
                .collect();
            let y = planner().safe_drop_y(x, height, &stack);
            prop_assert!(y >= 10.0);
            prop_assert!(y <= 50.0);
        }

        #[test]
        fn prop_no_overlap_with_stack_under_cursor(
            x in 30.0f32..370.0,
            height in 24.0f32..120.0,
            raw in stack_strategy(),
        ) {
            let p = planner();
            let stack: Vec<_> = raw
                .iter()
                .enumerate()
                // Only stacks that leave room below the ceiling
                .filter(|(_, (_, top, _, _))| *top >= 10.0 + height + 40.0)
                .map(|(i, &(cx, top, hw, hh))| block(i as u32, cx, top, Vec2::new(hw, hh)))
                .collect();

            let y = p.safe_drop_y(x, height, &stack);
            let bottom = y + height / 2.0;
            for b in stack.iter().filter(|b| (b.center.x - x).abs() <= 80.0) {
                prop_assert!(bottom < b.top(), "bottom {} overlaps top {}", bottom, b.top());
            }
        }
    }
}
