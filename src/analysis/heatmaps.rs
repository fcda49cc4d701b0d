//! Occupancy, touch and pickup heatmaps on a fixed grid over the arena
//! extent. Extents are arena units.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{AnalysisContext, AnalyzerOutput};
use crate::constants::{BACK_WALL_Y, SIDE_WALL_X, STANDARD_PADS};
use crate::frames::Vec3;

pub const X_BINS: usize = 24;
pub const Y_BINS: usize = 16;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridExtent {
    pub x_min: f32,
    pub x_max: f32,
    pub y_min: f32,
    pub y_max: f32,
}

impl Default for GridExtent {
    fn default() -> Self {
        GridExtent {
            x_min: -SIDE_WALL_X,
            x_max: SIDE_WALL_X,
            y_min: -BACK_WALL_Y,
            y_max: BACK_WALL_Y,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heatmaps {
    pub x_bins: usize,
    pub y_bins: usize,
    pub extent: GridExtent,
    pub position_occupancy: Vec<Vec<u32>>,
    pub touch_density: Vec<Vec<u32>>,
    pub boost_pickup_grid: Vec<Vec<u32>>,
}

impl Default for Heatmaps {
    fn default() -> Self {
        let empty = || vec![vec![0u32; X_BINS]; Y_BINS];
        Heatmaps {
            x_bins: X_BINS,
            y_bins: Y_BINS,
            extent: GridExtent::default(),
            position_occupancy: empty(),
            touch_density: empty(),
            boost_pickup_grid: empty(),
        }
    }
}

fn bin_of(position: Vec3) -> (usize, usize) {
    let fx = ((position.x + SIDE_WALL_X) / (2.0 * SIDE_WALL_X)).clamp(0.0, 1.0);
    let fy = ((position.y + BACK_WALL_Y) / (2.0 * BACK_WALL_Y)).clamp(0.0, 1.0);
    let x = ((fx * X_BINS as f32) as usize).min(X_BINS - 1);
    let y = ((fy * Y_BINS as f32) as usize).min(Y_BINS - 1);
    (x, y)
}

pub fn analyze(ctx: &AnalysisContext) -> AnalyzerOutput<Heatmaps> {
    let mut out = AnalyzerOutput::<Heatmaps>::default();
    let mut per_player: BTreeMap<String, Heatmaps> = BTreeMap::new();

    for frame in &ctx.timeline.frames {
        for player in &frame.players {
            let (x, y) = bin_of(player.position);
            per_player
                .entry(player.player_id.clone())
                .or_default()
                .position_occupancy[y][x] += 1;
        }
    }
    for touch in &ctx.events.touches {
        let (x, y) = bin_of(touch.location);
        per_player
            .entry(touch.player_id.clone())
            .or_default()
            .touch_density[y][x] += 1;
    }
    for pickup in &ctx.events.boost_pickups {
        let (px, py, pz, _) = STANDARD_PADS[pickup.pad_id.min(STANDARD_PADS.len() - 1)];
        let (x, y) = bin_of(Vec3::new(px, py, pz));
        per_player
            .entry(pickup.player_id.clone())
            .or_default()
            .boost_pickup_grid[y][x] += 1;
    }

    for identity in &ctx.timeline.players {
        let id = &identity.player_id;
        let record = per_player.remove(id).unwrap_or_default();
        let team = if identity.team == 0 {
            &mut out.blue
        } else {
            &mut out.orange
        };
        for y in 0..Y_BINS {
            for x in 0..X_BINS {
                team.position_occupancy[y][x] += record.position_occupancy[y][x];
                team.touch_density[y][x] += record.touch_density[y][x];
                team.boost_pickup_grid[y][x] += record.boost_pickup_grid[y][x];
            }
        }
        out.per_player.insert(id.clone(), record);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bins_cover_the_arena_corners() {
        assert_eq!(bin_of(Vec3::new(-SIDE_WALL_X, -BACK_WALL_Y, 0.0)), (0, 0));
        assert_eq!(
            bin_of(Vec3::new(SIDE_WALL_X, BACK_WALL_Y, 0.0)),
            (X_BINS - 1, Y_BINS - 1)
        );
        let (cx, cy) = bin_of(Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(cx, X_BINS / 2);
        assert_eq!(cy, Y_BINS / 2);
    }
}
