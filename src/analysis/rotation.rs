//! Rotation compliance: a rubric score penalizing double-commits, last-man
//! overcommits and ball-chasing.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{AnalysisContext, AnalyzerOutput};
use crate::constants::BACK_WALL_Y;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RotationCompliance {
    pub score: f64,
    pub double_commits: u32,
    pub last_man_overcommits: u32,
    pub ball_chasing_pct: f64,
}

const COMMIT_RADIUS: f32 = 800.0;
const CHASE_RADIUS: f32 = 1500.0;
/// Consecutive qualifying frames collapse into one incident.
const INCIDENT_COOLDOWN: f64 = 2.0;

struct Accumulator {
    double_commits: u32,
    overcommits: u32,
    chase_frames: u64,
    frames: u64,
    last_double_commit: f64,
    last_overcommit: f64,
}

impl Accumulator {
    fn new() -> Self {
        Accumulator {
            double_commits: 0,
            overcommits: 0,
            chase_frames: 0,
            frames: 0,
            last_double_commit: f64::NEG_INFINITY,
            last_overcommit: f64::NEG_INFINITY,
        }
    }
}

pub fn analyze(ctx: &AnalysisContext) -> AnalyzerOutput<RotationCompliance> {
    let mut out = AnalyzerOutput::<RotationCompliance>::default();
    let offensive_third = BACK_WALL_Y / 3.0;
    let mut accumulators: BTreeMap<String, Accumulator> = BTreeMap::new();

    for frame in &ctx.timeline.frames {
        for player in &frame.players {
            let acc = accumulators
                .entry(player.player_id.clone())
                .or_insert_with(Accumulator::new);
            acc.frames += 1;

            let ball_dist = player.position.distance(frame.ball.position);
            if ball_dist < CHASE_RADIUS {
                acc.chase_frames += 1;
            }

            // Double commit: a teammate is also on the ball in the
            // offensive half.
            let forward_y = if player.team == 0 {
                player.position.y
            } else {
                -player.position.y
            };
            if ball_dist < COMMIT_RADIUS && forward_y > 0.0 {
                let teammate_committed = frame.players.iter().any(|other| {
                    other.team == player.team
                        && other.player_id != player.player_id
                        && other.position.distance(frame.ball.position) < COMMIT_RADIUS
                });
                if teammate_committed
                    && frame.timestamp - acc.last_double_commit > INCIDENT_COOLDOWN
                {
                    acc.double_commits += 1;
                    acc.last_double_commit = frame.timestamp;
                }
            }

            // Last-man overcommit: deepest teammate pushing into the
            // offensive third.
            if ctx.timeline.team_size >= 2 && forward_y > offensive_third {
                let own_goal_y = if player.team == 0 { -BACK_WALL_Y } else { BACK_WALL_Y };
                let my_depth = (player.position.y - own_goal_y).abs();
                let is_last = !frame.players.iter().any(|other| {
                    other.team == player.team
                        && other.player_id != player.player_id
                        && (other.position.y - own_goal_y).abs() < my_depth
                });
                if is_last && frame.timestamp - acc.last_overcommit > INCIDENT_COOLDOWN {
                    acc.overcommits += 1;
                    acc.last_overcommit = frame.timestamp;
                }
            }
        }
    }

    for identity in &ctx.timeline.players {
        let id = &identity.player_id;
        let acc = accumulators.remove(id).unwrap_or_else(Accumulator::new);
        let frames = acc.frames.max(1) as f64;
        let chase_pct = acc.chase_frames as f64 / frames * 100.0;
        let chase_penalty = (chase_pct - 60.0).max(0.0) * 0.5;
        let score = (100.0
            - 10.0 * acc.double_commits as f64
            - 15.0 * acc.overcommits as f64
            - chase_penalty)
            .clamp(0.0, 100.0);

        out.per_player.insert(
            id.clone(),
            RotationCompliance {
                score,
                double_commits: acc.double_commits,
                last_man_overcommits: acc.overcommits,
                ball_chasing_pct: chase_pct,
            },
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventStream;
    use crate::frames::{BallState, PlayerFrame, Quat, RawFrame, Vec3};
    use crate::header::Header;
    use crate::normalize::{NormalizedTimeline, PlayerIdentity};

    fn player(id: &str, position: Vec3) -> PlayerFrame {
        PlayerFrame {
            player_id: id.to_string(),
            team: 0,
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
    fn double_commit_detected_once_per_incident() {
        let ball = BallState {
            position: Vec3::new(0.0, 2000.0, 93.0),
            velocity: Vec3::default(),
            angular_velocity: Vec3::default(),
        };
        let frames: Vec<RawFrame> = (0..10)
            .map(|i| RawFrame {
                timestamp: i as f64 / 30.0,
                ball,
                players: vec![
                    player("a", Vec3::new(0.0, 1800.0, 17.0)),
                    player("b", Vec3::new(100.0, 1900.0, 17.0)),
                ],
            })
            .collect();
        let timeline = NormalizedTimeline {
            frames,
            frame_hz: 30.0,
            duration_s: 1.0,
            players: vec![
                PlayerIdentity {
                    player_id: "a".to_string(),
                    display_name: "A".to_string(),
                    team: 0,
                    platform_ids: Default::default(),
                    aliases: vec!["a".to_string()],
                    camera: None,
                    loadout: None,
                    is_bot: false,
                },
                PlayerIdentity {
                    player_id: "b".to_string(),
                    display_name: "B".to_string(),
                    team: 0,
                    platform_ids: Default::default(),
                    aliases: vec!["b".to_string()],
                    camera: None,
                    loadout: None,
                    is_bot: false,
                },
            ],
            team_size: 2,
            warnings: Vec::new(),
            kickoff_offset: 0.0,
        };
        let events = EventStream::default();
        let header = Header::synthetic();
        let ctx = AnalysisContext {
            timeline: &timeline,
            events: &events,
            mechanics: &[],
            header: &header,
        };
        let out = analyze(&ctx);
        let a = out.per_player.get("a").unwrap();
        assert_eq!(a.double_commits, 1);
        assert!(a.score < 100.0);
    }
}
