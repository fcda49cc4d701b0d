//! Scoreboard fundamentals, fused from events and the authoritative header
//! stat rows.

use serde::Serialize;

use super::{AnalysisContext, AnalyzerOutput};

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Fundamentals {
    pub goals: u32,
    pub assists: u32,
    pub saves: u32,
    pub shots: u32,
    pub demos_inflicted: u32,
    pub demos_taken: u32,
    pub score: u32,
    pub shooting_pct: f64,
}

fn shooting_pct(goals: u32, shots: u32) -> f64 {
    if shots == 0 {
        0.0
    } else {
        goals as f64 / shots as f64 * 100.0
    }
}

pub fn analyze(ctx: &AnalysisContext) -> AnalyzerOutput<Fundamentals> {
    let mut out = AnalyzerOutput::<Fundamentals>::default();

    for identity in &ctx.timeline.players {
        let id = &identity.player_id;
        let header_row = ctx
            .header
            .player_stats
            .iter()
            .find(|row| row.name == identity.display_name);

        // Header rows are authoritative where present; events fill gaps.
        let goals = header_row.map(|row| row.goals).unwrap_or_else(|| {
            ctx.events
                .goals
                .iter()
                .filter(|g| g.scorer.as_deref() == Some(id))
                .count() as u32
        });
        let assists = header_row.map(|row| row.assists).unwrap_or_else(|| {
            ctx.events
                .goals
                .iter()
                .filter(|g| g.assist.as_deref() == Some(id))
                .count() as u32
        });
        let shots = header_row.map(|row| row.shots).unwrap_or_else(|| {
            ctx.events
                .touches
                .iter()
                .filter(|t| {
                    t.player_id == *id && t.outcome == crate::events::TouchOutcome::Shot
                })
                .count() as u32
        });
        let saves = header_row.map(|row| row.saves).unwrap_or(0);
        let score = header_row.map(|row| row.score).unwrap_or(0);

        let demos_inflicted = ctx
            .events
            .demos
            .iter()
            .filter(|d| d.attacker_id.as_deref() == Some(id))
            .count() as u32;
        let demos_taken = ctx
            .events
            .demos
            .iter()
            .filter(|d| d.victim_id == *id)
            .count() as u32;

        let record = Fundamentals {
            goals,
            assists,
            saves,
            shots,
            demos_inflicted,
            demos_taken,
            score,
            shooting_pct: shooting_pct(goals, shots),
        };

        let team = if identity.team == 0 {
            &mut out.blue
        } else {
            &mut out.orange
        };
        team.goals += record.goals;
        team.assists += record.assists;
        team.saves += record.saves;
        team.shots += record.shots;
        team.demos_inflicted += record.demos_inflicted;
        team.demos_taken += record.demos_taken;
        team.score += record.score;

        out.per_player.insert(id.clone(), record);
    }

    out.blue.shooting_pct = shooting_pct(out.blue.goals, out.blue.shots);
    out.orange.shooting_pct = shooting_pct(out.orange.goals, out.orange.shots);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shooting_pct_handles_zero_shots() {
        assert_eq!(shooting_pct(0, 0), 0.0);
        assert_eq!(shooting_pct(1, 2), 50.0);
    }
}
