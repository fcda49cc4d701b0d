//! Challenge aggregates per team and per player.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{AnalysisContext, AnalyzerOutput};
use crate::events::ChallengeOutcome;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ChallengeStats {
    pub contests: u32,
    pub wins: u32,
    pub losses: u32,
    pub neutral: u32,
    pub first_to_ball_pct: f64,
    pub avg_depth_y: f64,
    pub avg_risk_index: f64,
}

#[derive(Default)]
struct Accumulator {
    stats: ChallengeStats,
    depth_sum: f64,
    risk_sum: f64,
    first_to_ball: u32,
}

pub fn analyze(ctx: &AnalysisContext) -> AnalyzerOutput<ChallengeStats> {
    let mut out = AnalyzerOutput::<ChallengeStats>::default();
    let mut accumulators: BTreeMap<String, Accumulator> = BTreeMap::new();

    for challenge in &ctx.events.challenges {
        // First to ball: whoever touches first after the contest begins.
        let first_toucher = ctx
            .events
            .touches
            .iter()
            .find(|touch| touch.t >= challenge.t)
            .map(|touch| touch.player_id.clone());

        for (player_id, team) in [
            (challenge.blue_player.clone(), 0u8),
            (challenge.orange_player.clone(), 1u8),
        ] {
            let acc = accumulators.entry(player_id.clone()).or_default();
            acc.stats.contests += 1;
            match challenge.outcome_for_team(team) {
                ChallengeOutcome::Win => acc.stats.wins += 1,
                ChallengeOutcome::Loss => acc.stats.losses += 1,
                ChallengeOutcome::Neutral => acc.stats.neutral += 1,
            }
            acc.depth_sum += challenge.depth_y as f64;
            if let Some(risk) = challenge
                .risks
                .iter()
                .find(|risk| risk.player_id == player_id)
            {
                acc.risk_sum += risk.risk_index as f64;
            }
            if first_toucher.as_deref() == Some(player_id.as_str()) {
                acc.first_to_ball += 1;
            }
        }
    }

    for identity in &ctx.timeline.players {
        let id = &identity.player_id;
        let acc = accumulators.remove(id).unwrap_or_default();
        let mut record = acc.stats;
        let contests = record.contests.max(1) as f64;
        record.first_to_ball_pct = acc.first_to_ball as f64 / contests * 100.0;
        record.avg_depth_y = acc.depth_sum / contests;
        record.avg_risk_index = acc.risk_sum / contests;

        let team = if identity.team == 0 {
            &mut out.blue
        } else {
            &mut out.orange
        };
        team.contests += record.contests;
        team.wins += record.wins;
        team.losses += record.losses;
        team.neutral += record.neutral;

        out.per_player.insert(id.clone(), record);
    }

    for team in [&mut out.blue, &mut out.orange] {
        let contests = team.contests.max(1) as f64;
        team.first_to_ball_pct = team.wins as f64 / contests * 100.0;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ChallengeEvent, ChallengeRisk, EventStream};
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

    #[test]
    fn win_loss_splits_by_team() {
        let timeline = NormalizedTimeline {
            frames: Vec::new(),
            frame_hz: 30.0,
            duration_s: 60.0,
            players: vec![identity("b", 0), identity("o", 1)],
            team_size: 1,
            warnings: Vec::new(),
            kickoff_offset: 0.0,
        };
        let mut events = EventStream::default();
        events.challenges.push(ChallengeEvent {
            t: 5.0,
            frame: 150,
            blue_player: "b".to_string(),
            orange_player: "o".to_string(),
            winner_team: Some(0),
            depth_y: 1200.0,
            risks: vec![
                ChallengeRisk {
                    player_id: "b".to_string(),
                    risk_index: 0.3,
                },
                ChallengeRisk {
                    player_id: "o".to_string(),
                    risk_index: 0.7,
                },
            ],
        });
        let header = Header::synthetic();
        let ctx = AnalysisContext {
            timeline: &timeline,
            events: &events,
            mechanics: &[],
            header: &header,
        };
        let out = analyze(&ctx);
        assert_eq!(out.per_player.get("b").unwrap().wins, 1);
        assert_eq!(out.per_player.get("o").unwrap().losses, 1);
        assert_eq!(out.blue.wins, 1);
        assert_eq!(out.orange.losses, 1);
    }
}
