//! Per-kind mechanic counts and aggregate durations from the mechanic
//! stream. Every kind is present in the map, zero-filled, so the report
//! shape is closed.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{AnalysisContext, AnalyzerOutput};
use crate::mechanics::MechanicKind;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MechanicStats {
    pub counts: BTreeMap<String, u32>,
    pub total_air_roll_time_s: f64,
    pub total_dribble_time_s: f64,
    pub total_powerslide_time_s: f64,
}

impl Default for MechanicStats {
    fn default() -> Self {
        let counts = MechanicKind::ALL
            .iter()
            .map(|kind| (kind.as_str().to_string(), 0u32))
            .collect();
        MechanicStats {
            counts,
            total_air_roll_time_s: 0.0,
            total_dribble_time_s: 0.0,
            total_powerslide_time_s: 0.0,
        }
    }
}

impl MechanicStats {
    pub fn count(&self, kind: MechanicKind) -> u32 {
        self.counts.get(kind.as_str()).copied().unwrap_or(0)
    }
}

pub fn analyze(ctx: &AnalysisContext) -> AnalyzerOutput<MechanicStats> {
    let mut out = AnalyzerOutput::<MechanicStats>::default();
    let mut per_player: BTreeMap<String, MechanicStats> = BTreeMap::new();

    for event in ctx.mechanics {
        let stats = per_player.entry(event.player_id.clone()).or_default();
        *stats
            .counts
            .entry(event.kind.as_str().to_string())
            .or_insert(0) += 1;
        match event.kind {
            MechanicKind::AirRoll => {
                stats.total_air_roll_time_s += event.duration.unwrap_or(0.0)
            }
            MechanicKind::Dribble => {
                stats.total_dribble_time_s += event.duration.unwrap_or(0.0)
            }
            MechanicKind::PowerSlide => {
                stats.total_powerslide_time_s += event.duration.unwrap_or(0.0)
            }
            _ => {}
        }
    }

    for identity in &ctx.timeline.players {
        let id = &identity.player_id;
        let record = per_player.remove(id).unwrap_or_default();
        let team = if identity.team == 0 {
            &mut out.blue
        } else {
            &mut out.orange
        };
        for (kind, count) in &record.counts {
            *team.counts.entry(kind.clone()).or_insert(0) += count;
        }
        team.total_air_roll_time_s += record.total_air_roll_time_s;
        team.total_dribble_time_s += record.total_dribble_time_s;
        team.total_powerslide_time_s += record.total_powerslide_time_s;
        out.per_player.insert(id.clone(), record);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventStream;
    use crate::frames::Vec3;
    use crate::header::Header;
    use crate::mechanics::MechanicEvent;
    use crate::normalize::{NormalizedTimeline, PlayerIdentity};

    #[test]
    fn counts_and_durations_aggregate() {
        let timeline = NormalizedTimeline {
            frames: Vec::new(),
            frame_hz: 30.0,
            duration_s: 60.0,
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
        let mut events = Vec::new();
        let mut jump = MechanicEvent::basic(
            1.0,
            "a",
            MechanicKind::Jump,
            Vec3::default(),
            Vec3::default(),
        );
        jump.duration = None;
        events.push(jump);
        let mut roll = MechanicEvent::basic(
            2.0,
            "a",
            MechanicKind::AirRoll,
            Vec3::default(),
            Vec3::default(),
        );
        roll.duration = Some(0.6);
        events.push(roll);

        let stream = EventStream::default();
        let header = Header::synthetic();
        let ctx = AnalysisContext {
            timeline: &timeline,
            events: &stream,
            mechanics: &events,
            header: &header,
        };
        let out = analyze(&ctx);
        let stats = out.per_player.get("a").unwrap();
        assert_eq!(stats.count(MechanicKind::Jump), 1);
        assert_eq!(stats.count(MechanicKind::Flip), 0);
        assert!((stats.total_air_roll_time_s - 0.6).abs() < 1e-9);
    }
}
