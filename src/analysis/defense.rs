//! Defensive posture: last-defender time, shadow defense, danger-zone
//! presence and out-of-position time.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{AnalysisContext, AnalyzerOutput};
use crate::constants::{BACK_WALL_Y, GOAL_HALF_WIDTH};
use crate::frames::{PlayerFrame, RawFrame};

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DefenseStats {
    pub time_last_defender_s: f64,
    pub time_shadowing_s: f64,
    pub avg_shadow_angle_deg: f64,
    pub danger_zone_time_s: f64,
    pub time_out_of_position_s: f64,
}

/// Shadowing distance band, between the ball and the shadower's own goal.
const SHADOW_MIN_DIST: f32 = 500.0;
const SHADOW_MAX_DIST: f32 = 3000.0;
const SHADOW_MAX_ANGLE_DEG: f64 = 35.0;
/// Danger zone: own goal mouth area.
const DANGER_DEPTH: f32 = 1200.0;

#[derive(Default)]
struct Accumulator {
    stats: DefenseStats,
    shadow_angle_sum: f64,
    shadow_samples: u64,
}

fn own_goal_y(team: u8) -> f32 {
    if team == 0 {
        -BACK_WALL_Y
    } else {
        BACK_WALL_Y
    }
}

fn is_last_defender(frame: &RawFrame, player: &PlayerFrame) -> bool {
    let goal_y = own_goal_y(player.team);
    let my_depth = (player.position.y - goal_y).abs();
    !frame.players.iter().any(|other| {
        other.team == player.team
            && other.player_id != player.player_id
            && (other.position.y - goal_y).abs() < my_depth
    })
}

pub fn analyze(ctx: &AnalysisContext) -> AnalyzerOutput<DefenseStats> {
    let mut out = AnalyzerOutput::<DefenseStats>::default();
    let dt = ctx.frame_dt();
    let mut accumulators: BTreeMap<String, Accumulator> = BTreeMap::new();

    for frame in &ctx.timeline.frames {
        for player in &frame.players {
            let acc = accumulators.entry(player.player_id.clone()).or_default();
            let goal_y = own_goal_y(player.team);
            let last_defender = is_last_defender(frame, player);
            let ball = frame.ball.position;

            // Behind the ball relative to own goal.
            let behind_ball =
                (player.position.y - goal_y).abs() < (ball.y - goal_y).abs();

            if last_defender {
                acc.stats.time_last_defender_s += dt;
                if !behind_ball {
                    acc.stats.time_out_of_position_s += dt;
                }
            }

            // Shadowing: between ball and own goal at a controlled distance,
            // retreating along the ball-goal line.
            let ball_dist = player.position.distance(ball);
            if behind_ball && (SHADOW_MIN_DIST..=SHADOW_MAX_DIST).contains(&ball_dist) {
                let to_goal = glam::f32::Vec3::new(
                    -ball.x,
                    goal_y - ball.y,
                    0.0,
                )
                .normalize_or_zero();
                let to_player = (player.position.to_glam() - ball.to_glam())
                    .with_z(0.0)
                    .normalize_or_zero();
                let angle = crate::util::angle_between_deg(to_goal, to_player) as f64;
                if angle <= SHADOW_MAX_ANGLE_DEG {
                    acc.stats.time_shadowing_s += dt;
                    acc.shadow_angle_sum += angle;
                    acc.shadow_samples += 1;
                }
            }

            // Danger zone: the goal-mouth box on the player's own wall.
            let in_danger_zone = (player.position.y - goal_y).abs() < DANGER_DEPTH
                && player.position.x.abs() < GOAL_HALF_WIDTH * 1.5;
            if in_danger_zone {
                acc.stats.danger_zone_time_s += dt;
            }
        }
    }

    for identity in &ctx.timeline.players {
        let id = &identity.player_id;
        let acc = accumulators.remove(id).unwrap_or_default();
        let mut record = acc.stats;
        if acc.shadow_samples > 0 {
            record.avg_shadow_angle_deg = acc.shadow_angle_sum / acc.shadow_samples as f64;
        }

        let team = if identity.team == 0 {
            &mut out.blue
        } else {
            &mut out.orange
        };
        team.time_last_defender_s += record.time_last_defender_s;
        team.time_shadowing_s += record.time_shadowing_s;
        team.danger_zone_time_s += record.danger_zone_time_s;
        team.time_out_of_position_s += record.time_out_of_position_s;

        out.per_player.insert(id.clone(), record);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::{BallState, Quat, Vec3};

    fn player(id: &str, team: u8, position: Vec3) -> PlayerFrame {
        PlayerFrame {
            player_id: id.to_string(),
            team,
            position,
            velocity: Vec3::default(),
            rotation: Quat::default(),
            angular_velocity: Vec3::default(),
            boost_amount: 50.0,
            is_supersonic: false,
            is_on_ground: true,
            is_demolished: false,
            is_jumping: None,
            is_dodging: None,
            is_double_jumping: None,
        }
    }

    #[test]
    fn deepest_player_is_last_defender() {
        let frame = RawFrame {
            timestamp: 0.0,
            ball: BallState::default(),
            players: vec![
                player("deep", 0, Vec3::new(0.0, -4000.0, 17.0)),
                player("high", 0, Vec3::new(0.0, 1000.0, 17.0)),
            ],
        };
        assert!(is_last_defender(&frame, &frame.players[0]));
        assert!(!is_last_defender(&frame, &frame.players[1]));
    }
}
