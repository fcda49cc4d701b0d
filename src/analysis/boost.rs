//! Boost economy. Pad counts come from the authoritative pickup events;
//! consumption and holdings integrate over the timeline.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{AnalysisContext, AnalyzerOutput};
use crate::constants::{BIG_PAD_BOOST, SMALL_PAD_BOOST};
use crate::frames::PadSize;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct BoostStats {
    pub bpm: f64,
    pub bcpm: f64,
    pub avg_boost: f64,
    pub time_zero_boost_s: f64,
    pub time_full_boost_s: f64,
    pub big_pads: u32,
    pub small_pads: u32,
    pub stolen_big_pads: u32,
    pub stolen_small_pads: u32,
    pub amount_collected: f64,
    pub amount_stolen: f64,
    pub overfill: f64,
    pub waste: f64,
}

#[derive(Default)]
struct Accumulator {
    boost_sum: f64,
    samples: u64,
    zero_time: f64,
    full_time: f64,
    used: f64,
    prev_boost: Option<f32>,
}

pub fn analyze(ctx: &AnalysisContext) -> AnalyzerOutput<BoostStats> {
    let mut out = AnalyzerOutput::<BoostStats>::default();
    let dt = ctx.frame_dt();
    let minutes = (ctx.timeline.duration_s / 60.0).max(1.0 / 60.0);

    let mut accumulators: BTreeMap<String, Accumulator> = BTreeMap::new();
    for frame in &ctx.timeline.frames {
        for player in &frame.players {
            let acc = accumulators.entry(player.player_id.clone()).or_default();
            acc.boost_sum += player.boost_amount as f64;
            acc.samples += 1;
            if player.boost_amount <= 0.5 {
                acc.zero_time += dt;
            }
            if player.boost_amount >= 99.5 {
                acc.full_time += dt;
            }
            if let Some(prev) = acc.prev_boost {
                let delta = player.boost_amount - prev;
                if delta < 0.0 {
                    acc.used += -delta as f64;
                }
            }
            acc.prev_boost = Some(player.boost_amount);
        }
    }

    // Boost amount at each pickup, for overfill accounting.
    let mut boost_at: BTreeMap<(usize, String), f32> = BTreeMap::new();
    for pickup in &ctx.events.boost_pickups {
        if let Some(frame) = ctx.timeline.frames.get(pickup.frame.saturating_sub(1)) {
            if let Some(player) = frame
                .players
                .iter()
                .find(|p| p.player_id == pickup.player_id)
            {
                boost_at.insert((pickup.frame, pickup.player_id.clone()), player.boost_amount);
            }
        }
    }

    for identity in &ctx.timeline.players {
        let id = &identity.player_id;
        let acc = accumulators.remove(id).unwrap_or_default();

        let mut record = BoostStats {
            avg_boost: if acc.samples > 0 {
                acc.boost_sum / acc.samples as f64
            } else {
                0.0
            },
            time_zero_boost_s: acc.zero_time,
            time_full_boost_s: acc.full_time,
            ..Default::default()
        };

        for pickup in ctx
            .events
            .boost_pickups
            .iter()
            .filter(|p| p.player_id == *id)
        {
            let pad_amount = match pickup.size {
                PadSize::Big => BIG_PAD_BOOST,
                PadSize::Small => SMALL_PAD_BOOST,
            };
            match pickup.size {
                PadSize::Big => record.big_pads += 1,
                PadSize::Small => record.small_pads += 1,
            }
            if pickup.stolen {
                match pickup.size {
                    PadSize::Big => record.stolen_big_pads += 1,
                    PadSize::Small => record.stolen_small_pads += 1,
                }
                record.amount_stolen += pad_amount as f64;
            }
            let before = boost_at
                .get(&(pickup.frame, pickup.player_id.clone()))
                .copied()
                .unwrap_or(0.0);
            let granted = (100.0 - before).min(pad_amount);
            record.amount_collected += granted as f64;
            record.overfill += (pad_amount - granted).max(0.0) as f64;
        }

        record.bpm = acc.used / minutes;
        record.bcpm = record.amount_collected / minutes;
        // Waste: collected boost that was never spent before match end.
        record.waste = (record.amount_collected - acc.used).max(0.0);

        let team = if identity.team == 0 {
            &mut out.blue
        } else {
            &mut out.orange
        };
        team.bpm += record.bpm;
        team.bcpm += record.bcpm;
        team.avg_boost += record.avg_boost;
        team.time_zero_boost_s += record.time_zero_boost_s;
        team.time_full_boost_s += record.time_full_boost_s;
        team.big_pads += record.big_pads;
        team.small_pads += record.small_pads;
        team.stolen_big_pads += record.stolen_big_pads;
        team.stolen_small_pads += record.stolen_small_pads;
        team.amount_collected += record.amount_collected;
        team.amount_stolen += record.amount_stolen;
        team.overfill += record.overfill;
        team.waste += record.waste;

        out.per_player.insert(id.clone(), record);
    }

    // Team avg_boost is the mean of its players, not the sum.
    for (team, size) in [
        (&mut out.blue, ctx.timeline.team_players(0).count()),
        (&mut out.orange, ctx.timeline.team_players(1).count()),
    ] {
        if size > 0 {
            team.avg_boost /= size as f64;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{BoostPickupEvent, EventStream};
    use crate::frames::{PadSide, PadSize};
    use crate::header::Header;
    use crate::normalize::{NormalizedTimeline, PlayerIdentity};

    fn context_fixture(
        timeline: &NormalizedTimeline,
        events: &EventStream,
        header: &Header,
    ) -> AnalyzerOutput<BoostStats> {
        let ctx = AnalysisContext {
            timeline,
            events,
            mechanics: &[],
            header,
        };
        analyze(&ctx)
    }

    #[test]
    fn stolen_pads_count_by_side_not_total() {
        let timeline = NormalizedTimeline {
            frames: Vec::new(),
            frame_hz: 30.0,
            duration_s: 300.0,
            players: vec![PlayerIdentity {
                player_id: "steam:1".to_string(),
                display_name: "A".to_string(),
                team: 0,
                platform_ids: Default::default(),
                aliases: vec!["steam:1".to_string()],
                camera: None,
                loadout: None,
                is_bot: false,
            }],
            team_size: 1,
            warnings: Vec::new(),
            kickoff_offset: 0.0,
        };
        let mut events = EventStream::default();
        // One big pad on the orange side (stolen), one mid big pad (not).
        events.boost_pickups = vec![
            BoostPickupEvent {
                t: 10.0,
                frame: 300,
                player_id: "steam:1".to_string(),
                team: 0,
                pad_id: 4,
                size: PadSize::Big,
                side: PadSide::Orange,
                stolen: true,
            },
            BoostPickupEvent {
                t: 20.0,
                frame: 600,
                player_id: "steam:1".to_string(),
                team: 0,
                pad_id: 2,
                size: PadSize::Big,
                side: PadSide::Mid,
                stolen: false,
            },
        ];
        let header = Header::synthetic();
        let out = context_fixture(&timeline, &events, &header);
        let stats = out.per_player.get("steam:1").unwrap();
        assert_eq!(stats.big_pads, 2);
        assert_eq!(stats.stolen_big_pads, 1);
    }
}
