//! Movement profile: speed buckets, air time, distance, powerslides and
//! aerials integrated over the timeline.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{AnalysisContext, AnalyzerOutput};
use crate::constants::{LOW_AIR_Z, SLOW_SPEED, SUPERSONIC_SPEED};
use crate::mechanics::MechanicKind;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MovementStats {
    pub time_slow_s: f64,
    pub time_boost_speed_s: f64,
    pub time_supersonic_s: f64,
    pub time_ground_s: f64,
    pub time_low_air_s: f64,
    pub time_high_air_s: f64,
    pub powerslide_count: u32,
    pub powerslide_duration_s: f64,
    pub aerial_count: u32,
    pub aerial_time_s: f64,
    pub distance_travelled_uu: f64,
    pub avg_speed_uu_s: f64,
}

pub fn analyze(ctx: &AnalysisContext) -> AnalyzerOutput<MovementStats> {
    let mut out = AnalyzerOutput::<MovementStats>::default();
    let dt = ctx.frame_dt();

    let mut per_player: BTreeMap<String, MovementStats> = BTreeMap::new();
    let mut speed_sums: BTreeMap<String, (f64, u64)> = BTreeMap::new();
    let mut prev_positions: BTreeMap<String, crate::frames::Vec3> = BTreeMap::new();

    for frame in &ctx.timeline.frames {
        for player in &frame.players {
            let stats = per_player.entry(player.player_id.clone()).or_default();
            let speed = player.velocity.length();

            if speed < SLOW_SPEED {
                stats.time_slow_s += dt;
            } else if speed < SUPERSONIC_SPEED {
                stats.time_boost_speed_s += dt;
            } else {
                stats.time_supersonic_s += dt;
            }

            if player.is_on_ground && player.position.z < LOW_AIR_Z {
                stats.time_ground_s += dt;
            } else if player.position.z < LOW_AIR_Z {
                stats.time_low_air_s += dt;
            } else {
                stats.time_high_air_s += dt;
            }

            if let Some(prev) = prev_positions.get(&player.player_id) {
                stats.distance_travelled_uu += prev.distance(player.position) as f64;
            }
            prev_positions.insert(player.player_id.clone(), player.position);

            let sums = speed_sums.entry(player.player_id.clone()).or_default();
            sums.0 += speed as f64;
            sums.1 += 1;
        }
    }

    for mechanic in ctx.mechanics {
        let Some(stats) = per_player.get_mut(&mechanic.player_id) else {
            continue;
        };
        match mechanic.kind {
            MechanicKind::PowerSlide => {
                stats.powerslide_count += 1;
                stats.powerslide_duration_s += mechanic.duration.unwrap_or(0.0);
            }
            MechanicKind::Aerial => {
                stats.aerial_count += 1;
                stats.aerial_time_s += mechanic.duration.unwrap_or(0.0);
            }
            _ => {}
        }
    }

    for identity in &ctx.timeline.players {
        let id = &identity.player_id;
        let mut record = per_player.remove(id).unwrap_or_default();
        if let Some((sum, count)) = speed_sums.get(id) {
            if *count > 0 {
                record.avg_speed_uu_s = sum / *count as f64;
            }
        }

        let team = if identity.team == 0 {
            &mut out.blue
        } else {
            &mut out.orange
        };
        team.time_slow_s += record.time_slow_s;
        team.time_boost_speed_s += record.time_boost_speed_s;
        team.time_supersonic_s += record.time_supersonic_s;
        team.time_ground_s += record.time_ground_s;
        team.time_low_air_s += record.time_low_air_s;
        team.time_high_air_s += record.time_high_air_s;
        team.powerslide_count += record.powerslide_count;
        team.powerslide_duration_s += record.powerslide_duration_s;
        team.aerial_count += record.aerial_count;
        team.aerial_time_s += record.aerial_time_s;
        team.distance_travelled_uu += record.distance_travelled_uu;

        out.per_player.insert(id.clone(), record);
    }

    for (team, size) in [
        (&mut out.blue, ctx.timeline.team_players(0).count()),
        (&mut out.orange, ctx.timeline.team_players(1).count()),
    ] {
        if size > 0 && ctx.timeline.duration_s > 0.0 {
            team.avg_speed_uu_s =
                team.distance_travelled_uu / ctx.timeline.duration_s / size as f64;
        }
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

    #[test]
    fn speed_buckets_integrate_time() {
        let mk = |t: f64, vx: f32| RawFrame {
            timestamp: t,
            ball: BallState::default(),
            players: vec![PlayerFrame {
                player_id: "a".to_string(),
                team: 0,
                position: Vec3::new(0.0, 0.0, 17.0),
                velocity: Vec3::new(vx, 0.0, 0.0),
                rotation: Quat::default(),
                angular_velocity: Vec3::default(),
                boost_amount: 50.0,
                is_supersonic: vx >= SUPERSONIC_SPEED,
                is_on_ground: true,
                is_demolished: false,
                is_jumping: None,
                is_dodging: None,
                is_double_jumping: None,
            }],
        };
        let frames: Vec<RawFrame> = (0..30)
            .map(|i| mk(i as f64 / 30.0, if i < 15 { 500.0 } else { 2300.0 }))
            .collect();
        let timeline = NormalizedTimeline {
            frames,
            frame_hz: 30.0,
            duration_s: 1.0,
            players: vec![PlayerIdentity {
                player_id: "a".to_string(),
                display_name: "A".to_string(),
                team: 0,
                platform_ids: Default::default(),
                aliases: vec!["a".to_string()],
                camera: None,
                loadout: None,
                is_bot: false,
            }],
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
        assert!((stats.time_slow_s - 0.5).abs() < 0.05);
        assert!((stats.time_supersonic_s - 0.5).abs() < 0.05);
        assert!(stats.time_ground_s > 0.9);
    }
}
