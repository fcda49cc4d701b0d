//! Ball-read scoring: sample the ball's near-term trajectory with simple
//! physics, then score each player's velocity alignment with the path to the
//! predicted intercept point.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{AnalysisContext, AnalyzerOutput};
use crate::constants::{
    BACK_WALL_Y, BALL_BOUNCE_RESTITUTION, BALL_GRAVITY, BALL_RADIUS, SIDE_WALL_X,
};
use crate::frames::{BallState, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReadQuality {
    #[serde(rename = "EXCELLENT")]
    Excellent,
    #[serde(rename = "GOOD")]
    Good,
    #[serde(rename = "AVERAGE")]
    Average,
    #[serde(rename = "POOR")]
    Poor,
    #[serde(rename = "WHIFF")]
    Whiff,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct BallReadStats {
    pub windows: u32,
    pub excellent: u32,
    pub good: u32,
    pub average: u32,
    pub poor: u32,
    pub whiff: u32,
    pub avg_alignment: f64,
}

/// Seconds between scored windows.
const WINDOW_SPACING: f64 = 1.0;
/// Prediction horizon per window.
const HORIZON_S: f32 = 2.0;
const SIM_DT: f32 = 1.0 / 30.0;
/// Players slower than this are not reading the ball, just idle.
const MIN_PLAYER_SPEED: f32 = 300.0;

/// Steps the ball forward under gravity with floor and wall bounces, and
/// returns the predicted intercept point: the first floor touch, or the
/// horizon endpoint.
pub fn predict_intercept(ball: &BallState, horizon_s: f32) -> Vec3 {
    let mut position = ball.position.to_glam();
    let mut velocity = ball.velocity.to_glam();
    let mut t = 0.0f32;
    while t < horizon_s {
        velocity.z -= BALL_GRAVITY * SIM_DT;
        position += velocity * SIM_DT;

        if position.z < BALL_RADIUS && velocity.z < 0.0 {
            position.z = BALL_RADIUS;
            velocity.z = -velocity.z * BALL_BOUNCE_RESTITUTION;
            // First floor contact is the intercept candidate.
            return Vec3::new(position.x, position.y, position.z);
        }
        if position.x.abs() > SIDE_WALL_X - BALL_RADIUS {
            position.x = (SIDE_WALL_X - BALL_RADIUS) * position.x.signum();
            velocity.x = -velocity.x * BALL_BOUNCE_RESTITUTION;
        }
        if position.y.abs() > BACK_WALL_Y - BALL_RADIUS {
            position.y = (BACK_WALL_Y - BALL_RADIUS) * position.y.signum();
            velocity.y = -velocity.y * BALL_BOUNCE_RESTITUTION;
        }
        t += SIM_DT;
    }
    Vec3::new(position.x, position.y, position.z)
}

fn classify(alignment: f32) -> ReadQuality {
    if alignment > 0.8 {
        ReadQuality::Excellent
    } else if alignment > 0.5 {
        ReadQuality::Good
    } else if alignment > 0.2 {
        ReadQuality::Average
    } else if alignment > -0.2 {
        ReadQuality::Poor
    } else {
        ReadQuality::Whiff
    }
}

#[derive(Default)]
struct Accumulator {
    stats: BallReadStats,
    alignment_sum: f64,
}

pub fn analyze(ctx: &AnalysisContext) -> AnalyzerOutput<BallReadStats> {
    let mut out = AnalyzerOutput::<BallReadStats>::default();
    let mut accumulators: BTreeMap<String, Accumulator> = BTreeMap::new();

    let mut next_window = 0.0f64;
    for frame in &ctx.timeline.frames {
        if frame.timestamp < next_window {
            continue;
        }
        next_window = frame.timestamp + WINDOW_SPACING;

        let intercept = predict_intercept(&frame.ball, HORIZON_S);
        for player in &frame.players {
            let speed = player.velocity.length();
            if speed < MIN_PLAYER_SPEED || player.is_demolished {
                continue;
            }
            let to_intercept = (intercept.to_glam() - player.position.to_glam())
                .normalize_or_zero();
            let heading = player.velocity.to_glam().normalize_or_zero();
            let alignment = heading.dot(to_intercept);

            let acc = accumulators.entry(player.player_id.clone()).or_default();
            acc.stats.windows += 1;
            acc.alignment_sum += alignment as f64;
            match classify(alignment) {
                ReadQuality::Excellent => acc.stats.excellent += 1,
                ReadQuality::Good => acc.stats.good += 1,
                ReadQuality::Average => acc.stats.average += 1,
                ReadQuality::Poor => acc.stats.poor += 1,
                ReadQuality::Whiff => acc.stats.whiff += 1,
            }
        }
    }

    for identity in &ctx.timeline.players {
        let id = &identity.player_id;
        let acc = accumulators.remove(id).unwrap_or_default();
        let mut record = acc.stats;
        if record.windows > 0 {
            record.avg_alignment = acc.alignment_sum / record.windows as f64;
        }

        let team = if identity.team == 0 {
            &mut out.blue
        } else {
            &mut out.orange
        };
        team.windows += record.windows;
        team.excellent += record.excellent;
        team.good += record.good;
        team.average += record.average;
        team.poor += record.poor;
        team.whiff += record.whiff;

        out.per_player.insert(id.clone(), record);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falling_ball_intercepts_on_the_floor() {
        let ball = BallState {
            position: Vec3::new(0.0, 0.0, 1000.0),
            velocity: Vec3::new(500.0, 0.0, 0.0),
            angular_velocity: Vec3::default(),
        };
        let intercept = predict_intercept(&ball, 3.0);
        assert!((intercept.z - BALL_RADIUS).abs() < 1.0);
        assert!(intercept.x > 0.0);
    }

    #[test]
    fn alignment_classification_bands() {
        assert_eq!(classify(0.9), ReadQuality::Excellent);
        assert_eq!(classify(0.6), ReadQuality::Good);
        assert_eq!(classify(0.3), ReadQuality::Average);
        assert_eq!(classify(0.0), ReadQuality::Poor);
        assert_eq!(classify(-0.5), ReadQuality::Whiff);
    }
}
