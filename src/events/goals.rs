//! Goal detection. Header tickmarks are authoritative; the network timeline
//! only refines them. Shot speed comes from a backward scan because the
//! engine resets ball physics on the scoring frame.

use super::{GoalEvent, TouchEvent};
use crate::constants::{
    ASSIST_WINDOW, BACK_WALL_Y, GOAL_HALF_WIDTH, GOAL_SHOT_MIN_SPEED, GOAL_SHOT_SCAN_WINDOW,
    GOAL_Z, UU_PER_SEC_TO_KPH,
};
use crate::header::Header;
use crate::normalize::NormalizedTimeline;

pub fn detect(
    timeline: &NormalizedTimeline,
    header: &Header,
    touches: &[TouchEvent],
) -> Vec<GoalEvent> {
    let record_fps = header.record_fps.unwrap_or(30.0) as f64;

    header
        .goals
        .iter()
        .map(|goal| {
            let raw_t = goal.frame as f64 / record_fps;
            let t = (raw_t - timeline.kickoff_offset).max(0.0);
            let scorer = timeline
                .players
                .iter()
                .find(|p| p.display_name == goal.scorer_name)
                .map(|p| p.player_id.clone());

            let (shot_speed_kph, distance_uu, on_target, frame) =
                shot_speed_scan(timeline, t, goal.team);

            let assist = scorer.as_deref().and_then(|scorer_id| {
                touches
                    .iter()
                    .rev()
                    .find(|touch| {
                        touch.team == goal.team
                            && touch.player_id != scorer_id
                            && touch.t < t
                            && t - touch.t <= ASSIST_WINDOW
                    })
                    .map(|touch| touch.player_id.clone())
            });

            GoalEvent {
                t,
                frame,
                scorer,
                team: goal.team,
                assist,
                shot_speed_kph,
                distance_uu,
                on_target,
            }
        })
        .collect()
}

/// Scans backward from the goal time for the last frame inside the window
/// where the ball still carried real velocity, and derives shot speed,
/// distance and on-target classification from that frame.
fn shot_speed_scan(
    timeline: &NormalizedTimeline,
    goal_t: f64,
    team: u8,
) -> (f32, f32, bool, Option<usize>) {
    let goal_y = if team == 0 { BACK_WALL_Y } else { -BACK_WALL_Y };

    let mut best: Option<(usize, f32)> = None;
    for (index, frame) in timeline.frames.iter().enumerate().rev() {
        if frame.timestamp > goal_t {
            continue;
        }
        if goal_t - frame.timestamp > GOAL_SHOT_SCAN_WINDOW {
            break;
        }
        let speed = frame.ball.velocity.length();
        if speed >= GOAL_SHOT_MIN_SPEED {
            best = Some((index, speed));
            break;
        }
    }

    match best {
        Some((index, speed)) => {
            let frame = &timeline.frames[index];
            let position = frame.ball.position;
            let distance = ((position.y - goal_y).powi(2) + position.x.powi(2)).sqrt();
            let on_target = ball_heads_into_goal_mouth(
                position.to_glam(),
                frame.ball.velocity.to_glam(),
                goal_y,
            );
            (speed * UU_PER_SEC_TO_KPH, distance, on_target, Some(index))
        }
        None => (0.0, 0.0, true, None),
    }
}

/// Projects the velocity ray onto the goal plane and checks the crossing
/// point against the goal mouth.
fn ball_heads_into_goal_mouth(
    position: glam::f32::Vec3,
    velocity: glam::f32::Vec3,
    goal_y: f32,
) -> bool {
    let dy = goal_y - position.y;
    if velocity.y.abs() < 1.0 || dy.signum() != velocity.y.signum() {
        return false;
    }
    let time_to_plane = dy / velocity.y;
    let x = position.x + velocity.x * time_to_plane;
    let z = position.z + velocity.z * time_to_plane;
    x.abs() <= GOAL_HALF_WIDTH && (0.0..=GOAL_Z).contains(&z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::{BallState, RawFrame, Vec3};
    use crate::header::HeaderGoal;

    fn ball_frame(t: f64, position: Vec3, velocity: Vec3) -> RawFrame {
        RawFrame {
            timestamp: t,
            ball: BallState {
                position,
                velocity,
                angular_velocity: Vec3::default(),
            },
            players: Vec::new(),
        }
    }

    fn timeline_of(frames: Vec<RawFrame>) -> NormalizedTimeline {
        NormalizedTimeline {
            frames,
            frame_hz: 30.0,
            duration_s: 10.0,
            players: Vec::new(),
            team_size: 1,
            warnings: Vec::new(),
            kickoff_offset: 0.0,
        }
    }

    #[test]
    fn shot_speed_comes_from_pre_goal_window() {
        // 2100 uu/s at t=4.8; velocity reset to zero on the scoring frame.
        let frames = vec![
            ball_frame(4.8, Vec3::new(0.0, 4000.0, 100.0), Vec3::new(0.0, 2100.0, 0.0)),
            ball_frame(5.0, Vec3::new(0.0, 5120.0, 100.0), Vec3::default()),
        ];
        let mut header = Header::synthetic();
        header.record_fps = Some(30.0);
        header.goals.push(HeaderGoal {
            frame: 150,
            scorer_name: "Alpha".to_string(),
            team: 0,
        });

        let goals = detect(&timeline_of(frames), &header, &[]);
        assert_eq!(goals.len(), 1);
        let expected_kph = 2100.0 * UU_PER_SEC_TO_KPH;
        assert!((goals[0].shot_speed_kph - expected_kph).abs() < 0.01);
        assert!(goals[0].shot_speed_kph > 0.0);
        assert!(goals[0].on_target);
    }

    #[test]
    fn goal_mouth_projection_rejects_wide_shots() {
        assert!(!ball_heads_into_goal_mouth(
            glam::f32::Vec3::new(3000.0, 4000.0, 100.0),
            glam::f32::Vec3::new(2000.0, 1000.0, 0.0),
            BACK_WALL_Y,
        ));
        assert!(ball_heads_into_goal_mouth(
            glam::f32::Vec3::new(0.0, 4000.0, 100.0),
            glam::f32::Vec3::new(0.0, 2000.0, 50.0),
            BACK_WALL_Y,
        ));
    }
}
