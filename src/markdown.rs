//! Human-readable dossier rendered from the success report.

use std::fmt::Write;

use crate::report::{Report, SuccessReport};

pub fn render(report: &Report) -> String {
    match report {
        Report::Success(success) => render_success(success),
        Report::Error(envelope) => {
            format!(
                "# Replay analysis failed\n\n`{}`: {}\n",
                envelope.error, envelope.details
            )
        }
    }
}

fn render_success(report: &SuccessReport) -> String {
    let mut out = String::new();
    let meta = &report.metadata;

    let _ = writeln!(out, "# Match report: {}", meta.map);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "- Playlist: {:?} ({}v{})",
        meta.playlist, meta.team_size, meta.team_size
    );
    let _ = writeln!(out, "- Duration: {:.0} s", meta.duration_seconds);
    let _ = writeln!(
        out,
        "- Score: BLUE {} - {} ORANGE",
        report.teams.blue.score, report.teams.orange.score
    );
    if meta.overtime {
        let _ = writeln!(out, "- Went to overtime");
    }
    if !report.quality.warnings.is_empty() {
        let _ = writeln!(out, "- Warnings: {}", report.quality.warnings.join(", "));
    }

    let _ = writeln!(out, "\n## Players\n");
    let _ = writeln!(
        out,
        "| Player | Team | Goals | Assists | Saves | Shots | Score |"
    );
    let _ = writeln!(out, "|---|---|---|---|---|---|---|");
    for player in &report.players {
        let stats = report
            .analysis
            .per_player
            .get(&player.player_id)
            .map(|block| &block.fundamentals);
        let (goals, assists, saves, shots, score) = stats
            .map(|f| (f.goals, f.assists, f.saves, f.shots, f.score))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} | {} |",
            player.display_name, player.team, goals, assists, saves, shots, score
        );
    }

    if !report.events.goals.is_empty() {
        let _ = writeln!(out, "\n## Goals\n");
        for goal in &report.events.goals {
            let scorer = goal.scorer.as_deref().unwrap_or("unknown");
            let _ = writeln!(
                out,
                "- {:>6.1}s  {} ({}), shot speed {:.1} kph",
                goal.t,
                scorer,
                if goal.team == 0 { "BLUE" } else { "ORANGE" },
                goal.shot_speed_kph
            );
        }
    }

    if !report.analysis.coaching_insights.is_empty() {
        let _ = writeln!(out, "\n## Coaching insights\n");
        for insight in &report.analysis.coaching_insights {
            let _ = writeln!(out, "- [{:?}] {}", insight.severity, insight.message);
        }
    }
    for (id, block) in &report.analysis.per_player {
        if block.insights.is_empty() {
            continue;
        }
        let name = report
            .players
            .iter()
            .find(|p| &p.player_id == id)
            .map(|p| p.display_name.as_str())
            .unwrap_or(id.as_str());
        let _ = writeln!(out, "\n### {}\n", name);
        for insight in &block.insights {
            let _ = writeln!(out, "- [{:?}] {}", insight.severity, insight.message);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ErrorEnvelope;

    #[test]
    fn error_reports_render_the_envelope() {
        let report = Report::Error(ErrorEnvelope::unreadable("file_too_small: 8 KiB"));
        let md = render(&report);
        assert!(md.contains("unreadable_replay_file"));
        assert!(md.contains("file_too_small"));
    }
}
