//! Challenge (50/50) detection: opposing cars contesting the ball inside a
//! small radius and time window. Outcome follows possession on the next
//! touch.

use super::{ChallengeEvent, ChallengeRisk, TouchEvent};
use crate::constants::{CHALLENGE_RADIUS, CHALLENGE_WINDOW};
use crate::frames::{PlayerFrame, RawFrame};
use crate::normalize::NormalizedTimeline;

/// Quiet period after an emitted challenge before another can begin.
const CHALLENGE_DEBOUNCE: f64 = 1.0;
/// Possession must change hands within this long to count as a win.
const POSSESSION_WINDOW: f64 = 2.0;

pub fn detect(timeline: &NormalizedTimeline, touches: &[TouchEvent]) -> Vec<ChallengeEvent> {
    let mut challenges: Vec<ChallengeEvent> = Vec::new();
    let mut quiet_until = f64::NEG_INFINITY;

    for (index, frame) in timeline.frames.iter().enumerate() {
        if frame.timestamp < quiet_until {
            continue;
        }
        let Some((blue, orange)) = contesting_pair(frame) else {
            continue;
        };

        // Both cars must have entered the radius within the window; with a
        // single sampled frame showing both inside, the window condition is
        // checked against the previous frame's distances.
        let recently_converged = index == 0
            || !both_inside(&timeline.frames[index - 1], CHALLENGE_RADIUS)
            || window_overlap(timeline, index);
        if !recently_converged {
            continue;
        }

        let winner_team = touches
            .iter()
            .find(|touch| {
                touch.t >= frame.timestamp && touch.t - frame.timestamp <= POSSESSION_WINDOW
            })
            .map(|touch| touch.team);

        let risks = vec![
            risk_for(frame, blue),
            risk_for(frame, orange),
        ];
        challenges.push(ChallengeEvent {
            t: frame.timestamp,
            frame: index,
            blue_player: blue.player_id.clone(),
            orange_player: orange.player_id.clone(),
            winner_team,
            depth_y: frame.ball.position.y,
            risks,
        });
        quiet_until = frame.timestamp + CHALLENGE_DEBOUNCE;
    }
    challenges
}

fn contesting_pair(frame: &RawFrame) -> Option<(&PlayerFrame, &PlayerFrame)> {
    let near = |player: &&PlayerFrame| {
        !player.is_demolished
            && player.position.distance(frame.ball.position) <= CHALLENGE_RADIUS
    };
    let blue = frame
        .players
        .iter()
        .filter(|p| p.team == 0)
        .filter(near)
        .min_by(|a, b| {
            let (da, db) = (
                a.position.distance(frame.ball.position),
                b.position.distance(frame.ball.position),
            );
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })?;
    let orange = frame
        .players
        .iter()
        .filter(|p| p.team == 1)
        .filter(near)
        .min_by(|a, b| {
            let (da, db) = (
                a.position.distance(frame.ball.position),
                b.position.distance(frame.ball.position),
            );
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })?;
    Some((blue, orange))
}

fn both_inside(frame: &RawFrame, radius: f32) -> bool {
    let inside = |team: u8| {
        frame
            .players
            .iter()
            .any(|p| p.team == team && p.position.distance(frame.ball.position) <= radius)
    };
    inside(0) && inside(1)
}

/// Whether both sides entered the radius within [`CHALLENGE_WINDOW`] of each
/// other, looking back from `index`.
fn window_overlap(timeline: &NormalizedTimeline, index: usize) -> bool {
    let t = timeline.frames[index].timestamp;
    timeline.frames[..index]
        .iter()
        .rev()
        .take_while(|f| t - f.timestamp <= CHALLENGE_WINDOW)
        .any(|f| !both_inside(f, CHALLENGE_RADIUS))
}

/// Risk composite in [0, 1]: last defender, low boost, ahead of ball.
fn risk_for(frame: &RawFrame, player: &PlayerFrame) -> ChallengeRisk {
    let own_goal_y = if player.team == 0 { -1.0 } else { 1.0 };
    let last_defender = !frame.players.iter().any(|other| {
        other.team == player.team
            && other.player_id != player.player_id
            && (other.position.y - player.position.y) * own_goal_y > 0.0
    });
    let low_boost = player.boost_amount < 30.0;
    let ahead_of_ball = (player.position.y - frame.ball.position.y) * own_goal_y < 0.0;

    let mut risk = 0.0;
    if last_defender {
        risk += 0.4;
    }
    if low_boost {
        risk += 0.3;
    }
    if ahead_of_ball {
        risk += 0.3;
    }
    ChallengeRisk {
        player_id: player.player_id.clone(),
        risk_index: risk,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::{BallState, Quat, Vec3};

    fn player(id: &str, team: u8, position: Vec3, boost: f32) -> PlayerFrame {
        PlayerFrame {
            player_id: id.to_string(),
            team,
            position,
            velocity: Vec3::default(),
            rotation: Quat::default(),
            angular_velocity: Vec3::default(),
            boost_amount: boost,
            is_supersonic: false,
            is_on_ground: true,
            is_demolished: false,
            is_jumping: None,
            is_dodging: None,
            is_double_jumping: None,
        }
    }

    fn frame(t: f64, players: Vec<PlayerFrame>) -> RawFrame {
        RawFrame {
            timestamp: t,
            ball: BallState {
                position: Vec3::new(0.0, 1000.0, 93.0),
                velocity: Vec3::default(),
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
            team_size: 2,
            warnings: Vec::new(),
            kickoff_offset: 0.0,
        }
    }

    #[test]
    fn opposing_cars_in_radius_make_a_challenge() {
        let frames = vec![
            frame(0.0, vec![player("b", 0, Vec3::new(0.0, -2000.0, 17.0), 50.0)]),
            frame(
                0.1,
                vec![
                    player("b", 0, Vec3::new(0.0, 800.0, 17.0), 50.0),
                    player("o", 1, Vec3::new(0.0, 1200.0, 17.0), 10.0),
                ],
            ),
        ];
        let challenges = detect(&timeline_of(frames), &[]);
        assert_eq!(challenges.len(), 1);
        assert_eq!(challenges[0].blue_player, "b");
        assert_eq!(challenges[0].orange_player, "o");
        assert!((challenges[0].depth_y - 1000.0).abs() < 1.0);
        assert!(challenges[0].winner_team.is_none());
    }

    #[test]
    fn risk_composite_counts_components() {
        // Last defender, low boost, ahead of ball: all three components.
        let f = frame(
            0.0,
            vec![
                player("b", 0, Vec3::new(0.0, 1500.0, 17.0), 10.0),
                player("o", 1, Vec3::new(0.0, 1200.0, 17.0), 80.0),
            ],
        );
        let risk = risk_for(&f, &f.players[0]);
        assert!((risk.risk_index - 1.0).abs() < 1e-6);
    }

    #[test]
    fn debounce_suppresses_repeat_frames() {
        let contested = |t| {
            frame(
                t,
                vec![
                    player("b", 0, Vec3::new(0.0, 900.0, 17.0), 50.0),
                    player("o", 1, Vec3::new(0.0, 1100.0, 17.0), 50.0),
                ],
            )
        };
        let frames = vec![
            frame(0.0, vec![player("b", 0, Vec3::new(0.0, -2000.0, 17.0), 50.0)]),
            contested(0.1),
            contested(0.2),
            contested(0.3),
        ];
        let challenges = detect(&timeline_of(frames), &[]);
        assert_eq!(challenges.len(), 1);
    }
}
