//! Demolition events. The demolish attribute stream is authoritative; the
//! spawn-teleport heuristic only runs when the stream never carried one, so
//! attribute-sourced replays never double-report.

use super::DemoEvent;
use crate::constants::{KICKOFF_SPAWNS_BLUE, KICKOFF_SPAWN_TOLERANCE};
use crate::frames::NetworkFrames;
use crate::normalize::NormalizedTimeline;

const TELEPORT_DISTANCE: f32 = 2000.0;
const ATTACK_WINDOW: f64 = 0.2;

pub fn detect(timeline: &NormalizedTimeline, network: &NetworkFrames) -> Vec<DemoEvent> {
    if !network.demolitions.is_empty() {
        return network
            .demolitions
            .iter()
            .filter_map(|notice| {
                let victim = timeline.canonicalize(&notice.victim_id)?.to_string();
                let attacker = notice
                    .attacker_id
                    .as_deref()
                    .and_then(|id| timeline.canonicalize(id))
                    .map(str::to_string);
                Some(DemoEvent {
                    t: (notice.t - timeline.kickoff_offset).max(0.0),
                    frame: Some(notice.frame),
                    attacker_id: attacker,
                    victim_id: victim,
                })
            })
            .collect();
    }
    infer_from_teleports(timeline)
}

fn near_spawn(x: f32, y: f32, team: u8) -> bool {
    let y = if team == 0 { y } else { -y };
    KICKOFF_SPAWNS_BLUE.iter().any(|(sx, sy)| {
        let (dx, dy) = (x - sx, y - sy);
        (dx * dx + dy * dy).sqrt() <= KICKOFF_SPAWN_TOLERANCE * 2.0
    })
}

/// Fallback: an instantaneous position reset to a spawn slot, coincident
/// with an opponent whose velocity vector intersected the victim just
/// before.
fn infer_from_teleports(timeline: &NormalizedTimeline) -> Vec<DemoEvent> {
    let frames = &timeline.frames;
    let mut demos = Vec::new();

    for i in 1..frames.len() {
        let prev = &frames[i - 1];
        let frame = &frames[i];
        for player in &frame.players {
            let Some(before) = prev
                .players
                .iter()
                .find(|p| p.player_id == player.player_id)
            else {
                continue;
            };
            let jump = before.position.distance(player.position);
            if jump < TELEPORT_DISTANCE
                || !near_spawn(player.position.x, player.position.y, player.team)
            {
                continue;
            }

            // Look for an opponent closing on the victim's old position.
            let attacker = frames[..i]
                .iter()
                .rev()
                .take_while(|f| frame.timestamp - f.timestamp <= ATTACK_WINDOW)
                .flat_map(|f| f.players.iter())
                .find(|candidate| {
                    if candidate.team == player.team {
                        return false;
                    }
                    let offset =
                        before.position.to_glam() - candidate.position.to_glam();
                    let closing = candidate.velocity.to_glam().normalize_or_zero();
                    offset.length() < 600.0 && closing.dot(offset.normalize_or_zero()) > 0.7
                })
                .map(|candidate| candidate.player_id.clone());

            demos.push(DemoEvent {
                t: frame.timestamp,
                frame: Some(i),
                attacker_id: attacker,
                victim_id: player.player_id.clone(),
            });
        }
    }
    demos
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::{DemoNotice, NetworkDiagnostics, RosterEntry};

    fn timeline_with_player(id: &str) -> NormalizedTimeline {
        NormalizedTimeline {
            frames: Vec::new(),
            frame_hz: 30.0,
            duration_s: 0.0,
            players: vec![crate::normalize::PlayerIdentity {
                player_id: id.to_string(),
                display_name: "P".to_string(),
                team: 0,
                platform_ids: Default::default(),
                aliases: vec![id.to_string()],
                camera: None,
                loadout: None,
                is_bot: false,
            }],
            team_size: 1,
            warnings: Vec::new(),
            kickoff_offset: 2.0,
        }
    }

    #[test]
    fn attribute_demos_are_preferred_and_rebased() {
        let timeline = timeline_with_player("steam:1");
        let mut network = NetworkFrames::empty(NetworkDiagnostics::ok(0, "test"));
        network.roster.push(RosterEntry {
            player_id: "steam:1".to_string(),
            display_name: "P".to_string(),
            team: 0,
            platform: None,
            online_id: None,
            raw_actor_ids: Vec::new(),
            camera: None,
            loadout: None,
        });
        network
            .demolitions
            .push(DemoNotice::new(5.0, 90, None, "steam:1".to_string()));

        let demos = detect(&timeline, &network);
        assert_eq!(demos.len(), 1);
        assert_eq!(demos[0].victim_id, "steam:1");
        assert!((demos[0].t - 3.0).abs() < 1e-9);
    }
}
