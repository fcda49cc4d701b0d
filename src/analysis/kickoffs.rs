//! Kickoff aggregates. Team records satisfy
//! `sum(approach_types) == total_approaches == team_size * count`.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{AnalysisContext, AnalyzerOutput};
use crate::events::KickoffOutcome;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct KickoffStats {
    pub count: u32,
    pub first_possession: u32,
    pub neutral: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub avg_time_to_first_touch_s: f64,
    pub approach_types: BTreeMap<String, u32>,
    pub total_approaches: u32,
}

pub fn analyze(ctx: &AnalysisContext) -> AnalyzerOutput<KickoffStats> {
    let mut out = AnalyzerOutput::<KickoffStats>::default();
    let mut per_player: BTreeMap<String, KickoffStats> = BTreeMap::new();
    let mut touch_sums: BTreeMap<String, (f64, u32)> = BTreeMap::new();
    let mut team_touch_sums = [(0.0f64, 0u32), (0.0f64, 0u32)];

    for kickoff in &ctx.events.kickoffs {
        for (team_index, team_stats) in [&mut out.blue, &mut out.orange].into_iter().enumerate()
        {
            team_stats.count += 1;
            match (kickoff.outcome, team_index as u8) {
                (KickoffOutcome::FirstPossessionBlue, 0)
                | (KickoffOutcome::FirstPossessionOrange, 1) => team_stats.first_possession += 1,
                (KickoffOutcome::GoalFor, 0) | (KickoffOutcome::GoalAgainst, 1) => {
                    team_stats.goals_for += 1
                }
                (KickoffOutcome::GoalFor, 1) | (KickoffOutcome::GoalAgainst, 0) => {
                    team_stats.goals_against += 1
                }
                (KickoffOutcome::Neutral, _) => team_stats.neutral += 1,
                _ => {}
            }
        }

        for participant in &kickoff.participants {
            let stats = per_player.entry(participant.player_id.clone()).or_default();
            stats.count += 1;
            *stats
                .approach_types
                .entry(participant.approach_type.as_str().to_string())
                .or_insert(0) += 1;
            stats.total_approaches += 1;
            match (kickoff.outcome, participant.team) {
                (KickoffOutcome::FirstPossessionBlue, 0)
                | (KickoffOutcome::FirstPossessionOrange, 1) => stats.first_possession += 1,
                (KickoffOutcome::GoalFor, 0) | (KickoffOutcome::GoalAgainst, 1) => {
                    stats.goals_for += 1
                }
                (KickoffOutcome::GoalFor, 1) | (KickoffOutcome::GoalAgainst, 0) => {
                    stats.goals_against += 1
                }
                (KickoffOutcome::Neutral, _) => stats.neutral += 1,
                _ => {}
            }

            let team_stats = if participant.team == 0 {
                &mut out.blue
            } else {
                &mut out.orange
            };
            *team_stats
                .approach_types
                .entry(participant.approach_type.as_str().to_string())
                .or_insert(0) += 1;
            team_stats.total_approaches += 1;

            if let Some(time) = participant.time_to_first_touch {
                let sums = touch_sums.entry(participant.player_id.clone()).or_default();
                sums.0 += time;
                sums.1 += 1;
                let team_sums = &mut team_touch_sums[participant.team.min(1) as usize];
                team_sums.0 += time;
                team_sums.1 += 1;
            }
        }
    }

    for identity in &ctx.timeline.players {
        let id = &identity.player_id;
        let mut record = per_player.remove(id).unwrap_or_default();
        if let Some((sum, count)) = touch_sums.get(id) {
            if *count > 0 {
                record.avg_time_to_first_touch_s = sum / *count as f64;
            }
        }
        out.per_player.insert(id.clone(), record);
    }

    for (team, (sum, count)) in [&mut out.blue, &mut out.orange]
        .into_iter()
        .zip(team_touch_sums)
    {
        if count > 0 {
            team.avg_time_to_first_touch_s = sum / count as f64;
        }
    }
    out
}
