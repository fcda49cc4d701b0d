//! Touch detection. A touch is a ball-velocity deflection versus the
//! extrapolated pre-touch trajectory, attributed to the nearest car within
//! contact proximity and debounced per player.

use std::collections::HashMap;

use super::{TouchContext, TouchEvent, TouchOutcome};
use crate::constants::{
    BACK_WALL_Y, BALL_CONTACT_PROXIMITY, BALL_GRAVITY, CEILING_Z, LOW_AIR_Z, PASS_WINDOW,
    SIDE_WALL_X, TOUCH_DEBOUNCE, UU_PER_SEC_TO_KPH,
};
use crate::frames::RawFrame;
use crate::normalize::NormalizedTimeline;

/// Minimum deflection from the extrapolated trajectory that counts as a
/// contact, in uu/s.
const MIN_DEFLECTION: f32 = 150.0;
const WALL_PROXIMITY: f32 = 260.0;

pub fn detect(timeline: &NormalizedTimeline) -> Vec<TouchEvent> {
    let frames = &timeline.frames;
    let mut touches: Vec<TouchEvent> = Vec::new();
    let mut last_touch_at: HashMap<String, f64> = HashMap::new();

    for i in 1..frames.len() {
        let prev = &frames[i - 1];
        let frame = &frames[i];
        let dt = (frame.timestamp - prev.timestamp) as f32;
        if dt <= 0.0 {
            continue;
        }

        // Extrapolate the pre-touch trajectory under gravity only.
        let predicted = glam::f32::Vec3::new(
            prev.ball.velocity.x,
            prev.ball.velocity.y,
            prev.ball.velocity.z - BALL_GRAVITY * dt,
        );
        let actual = frame.ball.velocity.to_glam();
        let deflection = (actual - predicted).length();
        if deflection < MIN_DEFLECTION {
            continue;
        }
        // Wall and floor bounces also deflect; require a car in range.
        let Some((player, distance)) = nearest_player(frame) else {
            continue;
        };
        if distance > BALL_CONTACT_PROXIMITY {
            continue;
        }
        let debounced = last_touch_at
            .get(&player.player_id)
            .map(|last| frame.timestamp - last < TOUCH_DEBOUNCE)
            .unwrap_or(false);
        if debounced {
            continue;
        }
        last_touch_at.insert(player.player_id.clone(), frame.timestamp);

        touches.push(TouchEvent {
            t: frame.timestamp,
            frame: i,
            player_id: player.player_id.clone(),
            team: player.team,
            location: frame.ball.position,
            ball_speed_kph: frame.ball.velocity.length() * UU_PER_SEC_TO_KPH,
            context: classify_context(frame, prev, player.position.z),
            outcome: TouchOutcome::Neutral,
        });
    }

    classify_outcomes(timeline, &mut touches);
    touches
}

fn nearest_player(frame: &RawFrame) -> Option<(&crate::frames::PlayerFrame, f32)> {
    frame
        .players
        .iter()
        .filter(|p| !p.is_demolished)
        .map(|p| (p, p.position.distance(frame.ball.position)))
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
}

fn classify_context(frame: &RawFrame, prev: &RawFrame, car_z: f32) -> TouchContext {
    let ball = frame.ball.position;
    let near_wall =
        ball.x.abs() > SIDE_WALL_X - WALL_PROXIMITY || ball.y.abs() > BACK_WALL_Y - WALL_PROXIMITY;
    if ball.z > CEILING_Z - WALL_PROXIMITY {
        TouchContext::Ceiling
    } else if near_wall && car_z > LOW_AIR_Z {
        TouchContext::Wall
    } else if car_z > LOW_AIR_Z {
        TouchContext::Aerial
    } else if prev.ball.velocity.z < -100.0 && frame.ball.velocity.z > 100.0 && ball.z < 250.0 {
        TouchContext::HalfVolley
    } else if car_z <= LOW_AIR_Z {
        TouchContext::Ground
    } else {
        TouchContext::Unknown
    }
}

/// Second pass: outcomes need the subsequent trajectory and the next touch's
/// team ownership.
fn classify_outcomes(timeline: &NormalizedTimeline, touches: &mut [TouchEvent]) {
    let snapshots: Vec<(f64, String, u8)> = touches
        .iter()
        .map(|t| (t.t, t.player_id.clone(), t.team))
        .collect();

    for (index, touch) in touches.iter_mut().enumerate() {
        let next = snapshots.get(index + 1);
        let frame = &timeline.frames[touch.frame];
        let velocity = frame.ball.velocity.to_glam();
        let speed = velocity.length();

        // Opponent goal sits at +y for blue (team 0), -y for orange.
        let goal_y = if touch.team == 0 { BACK_WALL_Y } else { -BACK_WALL_Y };
        let toward_goal = glam::f32::Vec3::new(0.0, goal_y - frame.ball.position.y, 0.0)
            .normalize_or_zero();
        let alignment = velocity.normalize_or_zero().dot(toward_goal);

        let contested = next
            .map(|(nt, _, nteam)| *nteam != touch.team && nt - touch.t < 0.25)
            .unwrap_or(false);
        let own_third = if touch.team == 0 {
            frame.ball.position.y < -BACK_WALL_Y / 3.0
        } else {
            frame.ball.position.y > BACK_WALL_Y / 3.0
        };

        touch.outcome = if contested {
            TouchOutcome::Fifty
        } else if alignment > 0.75 && speed > 1000.0 {
            TouchOutcome::Shot
        } else if own_third && alignment > 0.2 && speed > 1200.0 {
            TouchOutcome::Clear
        } else if let Some((nt, nplayer, nteam)) = next {
            if *nteam == touch.team && nplayer != &touch.player_id && nt - touch.t < PASS_WINDOW {
                TouchOutcome::Pass
            } else if nplayer == &touch.player_id && nt - touch.t < 1.0 {
                TouchOutcome::Dribble
            } else {
                TouchOutcome::Neutral
            }
        } else {
            TouchOutcome::Neutral
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::{BallState, PlayerFrame, Quat, Vec3};
    use crate::normalize::NormalizedTimeline;

    fn player_at(id: &str, team: u8, position: Vec3) -> PlayerFrame {
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

    fn frame(t: f64, ball_pos: Vec3, ball_vel: Vec3, players: Vec<PlayerFrame>) -> RawFrame {
        RawFrame {
            timestamp: t,
            ball: BallState {
                position: ball_pos,
                velocity: ball_vel,
                angular_velocity: Vec3::default(),
            },
            players,
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
    fn deflection_near_car_is_a_touch() {
        let car = Vec3::new(0.0, 100.0, 17.0);
        let frames = vec![
            frame(
                0.0,
                Vec3::new(0.0, 150.0, 93.0),
                Vec3::new(0.0, -500.0, 0.0),
                vec![player_at("a", 0, car)],
            ),
            frame(
                0.033,
                Vec3::new(0.0, 140.0, 93.0),
                Vec3::new(0.0, 900.0, 200.0),
                vec![player_at("a", 0, car)],
            ),
        ];
        let touches = detect(&timeline_of(frames));
        assert_eq!(touches.len(), 1);
        assert_eq!(touches[0].player_id, "a");
        assert_eq!(touches[0].context, TouchContext::Ground);
    }

    #[test]
    fn deflection_without_nearby_car_is_ignored() {
        let car = Vec3::new(2000.0, 2000.0, 17.0);
        let frames = vec![
            frame(
                0.0,
                Vec3::new(0.0, 0.0, 93.0),
                Vec3::new(0.0, -500.0, 0.0),
                vec![player_at("a", 0, car)],
            ),
            frame(
                0.033,
                Vec3::new(0.0, -10.0, 93.0),
                Vec3::new(0.0, 900.0, 0.0),
                vec![player_at("a", 0, car)],
            ),
        ];
        assert!(detect(&timeline_of(frames)).is_empty());
    }

    #[test]
    fn rapid_deflections_debounce_per_player() {
        let car = Vec3::new(0.0, 100.0, 17.0);
        let mk = |t: f64, vy: f32| {
            frame(
                t,
                Vec3::new(0.0, 150.0, 93.0),
                Vec3::new(0.0, vy, 0.0),
                vec![player_at("a", 0, car)],
            )
        };
        let frames = vec![mk(0.0, -500.0), mk(0.033, 900.0), mk(0.066, -900.0)];
        let touches = detect(&timeline_of(frames));
        assert_eq!(touches.len(), 1);
    }

    #[test]
    fn shot_outcome_for_fast_goalward_touch() {
        let car = Vec3::new(0.0, 100.0, 17.0);
        let frames = vec![
            frame(
                0.0,
                Vec3::new(0.0, 150.0, 93.0),
                Vec3::new(0.0, -300.0, 0.0),
                vec![player_at("a", 0, car)],
            ),
            frame(
                0.033,
                Vec3::new(0.0, 160.0, 93.0),
                Vec3::new(0.0, 2400.0, 100.0),
                vec![player_at("a", 0, car)],
            ),
        ];
        let touches = detect(&timeline_of(frames));
        assert_eq!(touches.len(), 1);
        assert_eq!(touches[0].outcome, TouchOutcome::Shot);
    }
}
