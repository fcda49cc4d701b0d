//! Rule-based coaching insights. Each rule fires on a metric threshold and
//! carries its evidence so the reader can check the numbers.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{AnalysisContext, PerTeam, PlayerAnalysis};
use crate::mechanics::MechanicKind;
use crate::normalize::PlayerIdentity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    #[serde(rename = "INFO")]
    Info,
    #[serde(rename = "SUGGESTION")]
    Suggestion,
    #[serde(rename = "WARNING")]
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub severity: Severity,
    pub message: String,
    pub evidence: BTreeMap<String, f64>,
}

fn insight(severity: Severity, message: String, evidence: Vec<(&str, f64)>) -> Insight {
    Insight {
        severity,
        message,
        evidence: evidence
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    }
}

pub fn player_insights(block: &PlayerAnalysis, identity: &PlayerIdentity) -> Vec<Insight> {
    let mut insights = Vec::new();
    let name = &identity.display_name;

    if block.positioning.behind_ball_pct < 50.0 && block.positioning.behind_ball_pct > 0.0 {
        insights.push(insight(
            Severity::Warning,
            format!(
                "{} spends most of the match ahead of the ball; rotate back before committing",
                name
            ),
            vec![("behind_ball_pct", block.positioning.behind_ball_pct)],
        ));
    }

    if block.boost.avg_boost > 0.0 && block.boost.avg_boost < 30.0 {
        insights.push(insight(
            Severity::Suggestion,
            format!(
                "{} runs low on boost; pick up small pads on rotation instead of detouring for big ones",
                name
            ),
            vec![
                ("avg_boost", block.boost.avg_boost),
                ("time_zero_boost_s", block.boost.time_zero_boost_s),
            ],
        ));
    }

    if block.challenges.contests >= 4 {
        let win_rate =
            block.challenges.wins as f64 / block.challenges.contests.max(1) as f64 * 100.0;
        if win_rate < 40.0 {
            insights.push(insight(
                Severity::Warning,
                format!(
                    "{} loses most 50/50s; arrive with more speed or let the challenge go",
                    name
                ),
                vec![
                    ("challenge_win_pct", win_rate),
                    ("contests", block.challenges.contests as f64),
                ],
            ));
        }
    }

    if block.kickoffs.count > 0 && block.mechanics.count(MechanicKind::Speedflip) == 0 {
        insights.push(insight(
            Severity::Suggestion,
            format!("{} never speedflips on kickoff; learning it wins first touches", name),
            vec![("kickoffs", block.kickoffs.count as f64)],
        ));
    }

    if block.rotation_compliance.double_commits > 2 {
        insights.push(insight(
            Severity::Warning,
            format!(
                "{} double-commits with teammates; call the ball or cover the pass lane",
                name
            ),
            vec![(
                "double_commits",
                block.rotation_compliance.double_commits as f64,
            )],
        ));
    }

    if block.recovery.landings > 0 && block.recovery.avg_momentum_retained_pct < 50.0 {
        insights.push(insight(
            Severity::Suggestion,
            format!("{} bleeds speed on landings; practice landing on the wheels", name),
            vec![(
                "avg_momentum_retained_pct",
                block.recovery.avg_momentum_retained_pct,
            )],
        ));
    }

    if block.xg.shots >= 3 && block.xg.goals_above_expected < -1.0 {
        insights.push(insight(
            Severity::Info,
            format!("{} is finishing below expectation for the chances created", name),
            vec![
                ("total_xg", block.xg.total_xg),
                ("goals", block.xg.goals as f64),
            ],
        ));
    }

    insights
}

pub fn team_insights(
    ctx: &AnalysisContext,
    per_team: &PerTeam,
    per_player: &BTreeMap<String, PlayerAnalysis>,
) -> Vec<Insight> {
    let mut insights = Vec::new();

    for (team_name, team) in [("BLUE", &per_team.blue), ("ORANGE", &per_team.orange)] {
        if team.kickoffs.count > 0 {
            let contested = team.kickoffs.first_possession + team.kickoffs.neutral;
            if contested < team.kickoffs.count / 2 {
                insights.push(insight(
                    Severity::Warning,
                    format!("{} loses the kickoff battle more often than not", team_name),
                    vec![
                        ("kickoffs", team.kickoffs.count as f64),
                        ("first_possession", team.kickoffs.first_possession as f64),
                    ],
                ));
            }
        }

        if team.boost.stolen_big_pads == 0 && team.boost.big_pads > 6 {
            insights.push(insight(
                Severity::Info,
                format!(
                    "{} never steals opponent boost; denying pads swings midfield fights",
                    team_name
                ),
                vec![("big_pads", team.boost.big_pads as f64)],
            ));
        }
    }

    // A team-wide passing drought is a structural issue, not one player's.
    let total_passes: u32 = per_player.values().map(|b| b.passing.passes_completed).sum();
    if !per_player.is_empty() && total_passes == 0 && ctx.timeline.duration_s > 120.0 {
        insights.push(insight(
            Severity::Suggestion,
            "No completed passes all match; look for teammates instead of solo plays".to_string(),
            vec![("duration_s", ctx.timeline.duration_s)],
        ));
    }

    insights
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_boost_triggers_suggestion() {
        let mut block = PlayerAnalysis::default();
        block.boost.avg_boost = 20.0;
        let identity = PlayerIdentity {
            player_id: "a".to_string(),
            display_name: "A".to_string(),
            team: 0,
            platform_ids: Default::default(),
            aliases: vec!["a".to_string()],
            camera: None,
            loadout: None,
            is_bot: false,
        };
        let insights = player_insights(&block, &identity);
        assert!(insights
            .iter()
            .any(|i| i.severity == Severity::Suggestion && i.message.contains("boost")));
    }

    #[test]
    fn healthy_block_generates_no_warnings() {
        let mut block = PlayerAnalysis::default();
        block.positioning.behind_ball_pct = 70.0;
        block.boost.avg_boost = 55.0;
        let identity = PlayerIdentity {
            player_id: "a".to_string(),
            display_name: "A".to_string(),
            team: 0,
            platform_ids: Default::default(),
            aliases: vec!["a".to_string()],
            camera: None,
            loadout: None,
            is_bot: false,
        };
        let insights = player_insights(&block, &identity);
        assert!(insights.iter().all(|i| i.severity != Severity::Warning));
    }
}
