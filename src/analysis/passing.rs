//! Passing and possession, derived from consecutive-touch relationships.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{AnalysisContext, AnalyzerOutput};
use crate::constants::{PASS_MIN_PROGRESS, PASS_WINDOW};

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PassingStats {
    pub passes_attempted: u32,
    pub passes_completed: u32,
    pub passes_received: u32,
    pub turnovers: u32,
    pub give_and_go_count: u32,
    pub possession_time_s: f64,
}

/// Possession credited to the last toucher is capped per segment so a dead
/// ball does not inflate anyone.
const POSSESSION_CAP_S: f64 = 5.0;
const GIVE_AND_GO_WINDOW: f64 = 4.0;

pub fn analyze(ctx: &AnalysisContext) -> AnalyzerOutput<PassingStats> {
    let mut out = AnalyzerOutput::<PassingStats>::default();
    let mut per_player: BTreeMap<String, PassingStats> = BTreeMap::new();
    let touches = &ctx.events.touches;

    for pair in touches.windows(2) {
        let (from, to) = (&pair[0], &pair[1]);
        let gap = to.t - from.t;

        // Forward progress toward the passer's opponent goal.
        let progress = if from.team == 0 {
            to.location.y - from.location.y
        } else {
            from.location.y - to.location.y
        };
        let advancing = gap <= PASS_WINDOW && progress >= PASS_MIN_PROGRESS;

        if advancing && to.player_id != from.player_id {
            let completed = to.team == from.team;
            let from_stats = per_player.entry(from.player_id.clone()).or_default();
            from_stats.passes_attempted += 1;
            if completed {
                from_stats.passes_completed += 1;
                per_player
                    .entry(to.player_id.clone())
                    .or_default()
                    .passes_received += 1;
            }
        }
        if to.team != from.team {
            per_player
                .entry(from.player_id.clone())
                .or_default()
                .turnovers += 1;
        }

        // Possession: the segment between touches belongs to the first
        // toucher.
        per_player
            .entry(from.player_id.clone())
            .or_default()
            .possession_time_s += gap.min(POSSESSION_CAP_S);
    }
    if let Some(last) = touches.last() {
        let tail = (ctx.timeline.duration_s - last.t).max(0.0);
        per_player
            .entry(last.player_id.clone())
            .or_default()
            .possession_time_s += tail.min(POSSESSION_CAP_S);
    }

    // Give-and-go: A → B → A inside the window, all one team.
    for trio in touches.windows(3) {
        let (a, b, c) = (&trio[0], &trio[1], &trio[2]);
        if a.team == b.team
            && b.team == c.team
            && a.player_id == c.player_id
            && a.player_id != b.player_id
            && c.t - a.t <= GIVE_AND_GO_WINDOW
        {
            per_player
                .entry(a.player_id.clone())
                .or_default()
                .give_and_go_count += 1;
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
        team.passes_attempted += record.passes_attempted;
        team.passes_completed += record.passes_completed;
        team.passes_received += record.passes_received;
        team.turnovers += record.turnovers;
        team.give_and_go_count += record.give_and_go_count;
        team.possession_time_s += record.possession_time_s;
        out.per_player.insert(id.clone(), record);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventStream, TouchContext, TouchEvent, TouchOutcome};
    use crate::frames::Vec3;
    use crate::header::Header;
    use crate::normalize::{NormalizedTimeline, PlayerIdentity};

    fn touch(t: f64, player: &str, team: u8, y: f32) -> TouchEvent {
        TouchEvent {
            t,
            frame: (t * 30.0) as usize,
            player_id: player.to_string(),
            team,
            location: Vec3::new(0.0, y, 93.0),
            ball_speed_kph: 40.0,
            context: TouchContext::Ground,
            outcome: TouchOutcome::Neutral,
        }
    }

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

    fn run(touches: Vec<TouchEvent>, players: Vec<PlayerIdentity>) -> AnalyzerOutput<PassingStats> {
        let timeline = NormalizedTimeline {
            frames: Vec::new(),
            frame_hz: 30.0,
            duration_s: 60.0,
            players,
            team_size: 2,
            warnings: Vec::new(),
            kickoff_offset: 0.0,
        };
        let mut events = EventStream::default();
        events.touches = touches;
        let header = Header::synthetic();
        let ctx = AnalysisContext {
            timeline: &timeline,
            events: &events,
            mechanics: &[],
            header: &header,
        };
        analyze(&ctx)
    }

    #[test]
    fn forward_team_touch_chain_is_a_completed_pass() {
        let out = run(
            vec![touch(1.0, "a", 0, 0.0), touch(2.0, "b", 0, 400.0)],
            vec![identity("a", 0), identity("b", 0)],
        );
        let a = out.per_player.get("a").unwrap();
        let b = out.per_player.get("b").unwrap();
        assert_eq!(a.passes_attempted, 1);
        assert_eq!(a.passes_completed, 1);
        assert_eq!(b.passes_received, 1);
    }

    #[test]
    fn opponent_interception_is_attempt_plus_turnover() {
        let out = run(
            vec![touch(1.0, "a", 0, 0.0), touch(2.0, "x", 1, 400.0)],
            vec![identity("a", 0), identity("x", 1)],
        );
        let a = out.per_player.get("a").unwrap();
        assert_eq!(a.passes_attempted, 1);
        assert_eq!(a.passes_completed, 0);
        assert_eq!(a.turnovers, 1);
    }

    #[test]
    fn give_and_go_detected() {
        let out = run(
            vec![
                touch(1.0, "a", 0, 0.0),
                touch(2.0, "b", 0, 300.0),
                touch(3.0, "a", 0, 700.0),
            ],
            vec![identity("a", 0), identity("b", 0)],
        );
        assert_eq!(out.per_player.get("a").unwrap().give_and_go_count, 1);
    }
}
