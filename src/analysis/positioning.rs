//! Positioning: thirds and halves occupancy, ball-relative positioning, and
//! rotation-order shares. `third_man_pct` is null below 3v3.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{AnalysisContext, AnalyzerOutput};
use crate::constants::BACK_WALL_Y;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PositioningStats {
    pub time_offensive_third_s: f64,
    pub time_middle_third_s: f64,
    pub time_defensive_third_s: f64,
    pub time_offensive_half_s: f64,
    pub time_defensive_half_s: f64,
    pub behind_ball_pct: f64,
    pub ahead_ball_pct: f64,
    pub avg_distance_to_ball_uu: f64,
    pub avg_distance_to_teammate_uu: f64,
    pub first_man_pct: f64,
    pub second_man_pct: f64,
    pub third_man_pct: Option<f64>,
}

#[derive(Default)]
struct Accumulator {
    thirds: [f64; 3],
    halves: [f64; 2],
    behind_frames: u64,
    frames: u64,
    ball_distance_sum: f64,
    teammate_distance_sum: f64,
    teammate_samples: u64,
    man_rank_frames: [u64; 3],
}

pub fn analyze(ctx: &AnalysisContext) -> AnalyzerOutput<PositioningStats> {
    let mut out = AnalyzerOutput::<PositioningStats>::default();
    let dt = ctx.frame_dt();
    let third = BACK_WALL_Y / 3.0 * 2.0;

    let mut accumulators: BTreeMap<String, Accumulator> = BTreeMap::new();
    for frame in &ctx.timeline.frames {
        // Rank each team's players by distance to ball for man-order shares.
        let mut ranks: BTreeMap<String, usize> = BTreeMap::new();
        for team in [0u8, 1u8] {
            let mut members: Vec<(&str, f32)> = frame
                .players
                .iter()
                .filter(|p| p.team == team)
                .map(|p| (p.player_id.as_str(), p.position.distance(frame.ball.position)))
                .collect();
            members.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
            for (rank, (id, _)) in members.iter().enumerate() {
                ranks.insert((*id).to_string(), rank);
            }
        }

        for player in &frame.players {
            let acc = accumulators.entry(player.player_id.clone()).or_default();
            acc.frames += 1;

            // Signed y toward the opponent goal.
            let forward_y = if player.team == 0 {
                player.position.y
            } else {
                -player.position.y
            };
            if forward_y > third {
                acc.thirds[0] += dt;
            } else if forward_y < -third {
                acc.thirds[2] += dt;
            } else {
                acc.thirds[1] += dt;
            }
            if forward_y > 0.0 {
                acc.halves[0] += dt;
            } else {
                acc.halves[1] += dt;
            }

            let ball_forward_y = if player.team == 0 {
                frame.ball.position.y
            } else {
                -frame.ball.position.y
            };
            if forward_y <= ball_forward_y {
                acc.behind_frames += 1;
            }

            acc.ball_distance_sum += player.position.distance(frame.ball.position) as f64;
            for teammate in frame
                .players
                .iter()
                .filter(|p| p.team == player.team && p.player_id != player.player_id)
            {
                acc.teammate_distance_sum +=
                    player.position.distance(teammate.position) as f64;
                acc.teammate_samples += 1;
            }

            if let Some(rank) = ranks.get(&player.player_id) {
                if *rank < 3 {
                    acc.man_rank_frames[*rank] += 1;
                }
            }
        }
    }

    let team_size = ctx.timeline.team_size;
    for identity in &ctx.timeline.players {
        let id = &identity.player_id;
        let acc = accumulators.remove(id).unwrap_or_default();
        let frames = acc.frames.max(1) as f64;

        let behind = acc.behind_frames as f64 / frames * 100.0;
        let record = PositioningStats {
            time_offensive_third_s: acc.thirds[0],
            time_middle_third_s: acc.thirds[1],
            time_defensive_third_s: acc.thirds[2],
            time_offensive_half_s: acc.halves[0],
            time_defensive_half_s: acc.halves[1],
            behind_ball_pct: round2(behind),
            ahead_ball_pct: round2(100.0 - behind),
            avg_distance_to_ball_uu: acc.ball_distance_sum / frames,
            avg_distance_to_teammate_uu: if acc.teammate_samples > 0 {
                acc.teammate_distance_sum / acc.teammate_samples as f64
            } else {
                0.0
            },
            first_man_pct: round2(acc.man_rank_frames[0] as f64 / frames * 100.0),
            second_man_pct: round2(acc.man_rank_frames[1] as f64 / frames * 100.0),
            third_man_pct: if team_size >= 3 {
                Some(round2(acc.man_rank_frames[2] as f64 / frames * 100.0))
            } else {
                None
            },
        };

        let team = if identity.team == 0 {
            &mut out.blue
        } else {
            &mut out.orange
        };
        team.time_offensive_third_s += record.time_offensive_third_s;
        team.time_middle_third_s += record.time_middle_third_s;
        team.time_defensive_third_s += record.time_defensive_third_s;
        team.time_offensive_half_s += record.time_offensive_half_s;
        team.time_defensive_half_s += record.time_defensive_half_s;
        team.behind_ball_pct += record.behind_ball_pct;
        team.avg_distance_to_ball_uu += record.avg_distance_to_ball_uu;
        team.avg_distance_to_teammate_uu += record.avg_distance_to_teammate_uu;

        out.per_player.insert(id.clone(), record);
    }

    for (team, size) in [
        (&mut out.blue, ctx.timeline.team_players(0).count()),
        (&mut out.orange, ctx.timeline.team_players(1).count()),
    ] {
        if size > 0 {
            let n = size as f64;
            team.behind_ball_pct = round2(team.behind_ball_pct / n);
            team.ahead_ball_pct = round2(100.0 - team.behind_ball_pct);
            team.avg_distance_to_ball_uu /= n;
            team.avg_distance_to_teammate_uu /= n;
        }
        team.third_man_pct = if team_size >= 3 { Some(0.0) } else { None };
    }
    out
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventStream;
    use crate::frames::{BallState, PlayerFrame, Quat, RawFrame, Vec3};
    use crate::header::Header;
    use crate::normalize::{NormalizedTimeline, PlayerIdentity};

    fn identity(id: &str, team: u8) -> PlayerIdentity {
        PlayerIdentity {
            player_id: id.to_string(),
            display_name: id.to_string(),
            team,
            platform_ids: Default::default(),
            aliases: vec![id.to_string()],
            camera: None,
            loadout: None,
            is_bot: false,
        }
    }

    fn player(id: &str, team: u8, y: f32) -> PlayerFrame {
        PlayerFrame {
            player_id: id.to_string(),
            team,
            position: Vec3::new(0.0, y, 17.0),
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
    fn behind_ball_share_and_null_third_man() {
        // Ball at y=0; blue player behind twice, ahead once.
        let frames = vec![
            RawFrame {
                timestamp: 0.0,
                ball: BallState::default(),
                players: vec![player("a", 0, -1000.0)],
            },
            RawFrame {
                timestamp: 0.5,
                ball: BallState::default(),
                players: vec![player("a", 0, -500.0)],
            },
            RawFrame {
                timestamp: 1.0,
                ball: BallState::default(),
                players: vec![player("a", 0, 800.0)],
            },
        ];
        let timeline = NormalizedTimeline {
            frames,
            frame_hz: 30.0,
            duration_s: 1.0,
            players: vec![identity("a", 0)],
            team_size: 1,
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
        let stats = out.per_player.get("a").unwrap();
        assert!((stats.behind_ball_pct - 66.67).abs() < 0.01);
        assert!(stats.third_man_pct.is_none());
        assert_eq!(stats.first_man_pct, 100.0);
    }
}
