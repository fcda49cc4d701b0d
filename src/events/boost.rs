//! Boost pickup events. The adapter's pad pickups are authoritative; this
//! stage only canonicalizes identities, rebases timestamps, and applies the
//! stolen rule. Player boost deltas are never consulted here.

use super::BoostPickupEvent;
use crate::frames::{NetworkFrames, PadSide};
use crate::normalize::NormalizedTimeline;

fn team_side(team: u8) -> PadSide {
    if team == 0 {
        PadSide::Blue
    } else {
        PadSide::Orange
    }
}

pub fn detect(timeline: &NormalizedTimeline, network: &NetworkFrames) -> Vec<BoostPickupEvent> {
    network
        .pad_pickups
        .iter()
        .filter_map(|pickup| {
            let player_id = timeline.canonicalize(&pickup.player_id)?.to_string();
            let team = timeline.team_of(&player_id)?;
            let stolen = pickup.side != PadSide::Mid && pickup.side != team_side(team);
            Some(BoostPickupEvent {
                t: (pickup.t - timeline.kickoff_offset).max(0.0),
                frame: pickup.frame,
                player_id,
                team,
                pad_id: pickup.pad_id,
                size: pickup.size,
                side: pickup.side,
                stolen,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::{NetworkDiagnostics, PadPickup, PadSize};
    use crate::normalize::PlayerIdentity;

    fn timeline_with(id: &str, team: u8) -> NormalizedTimeline {
        NormalizedTimeline {
            frames: Vec::new(),
            frame_hz: 30.0,
            duration_s: 0.0,
            players: vec![PlayerIdentity {
                player_id: id.to_string(),
                display_name: "P".to_string(),
                team,
                platform_ids: Default::default(),
                aliases: vec![id.to_string()],
                camera: None,
                loadout: None,
                is_bot: false,
            }],
            team_size: 1,
            warnings: Vec::new(),
            kickoff_offset: 0.0,
        }
    }

    fn pickup(side: PadSide, size: PadSize) -> PadPickup {
        PadPickup::new(10.0, 300, 3, side, size, "steam:1".to_string())
    }

    #[test]
    fn stolen_iff_opponent_side_and_not_mid() {
        let timeline = timeline_with("steam:1", 0);
        let mut network = NetworkFrames::empty(NetworkDiagnostics::ok(0, "test"));
        network.pad_pickups = vec![
            pickup(PadSide::Orange, PadSize::Big),
            pickup(PadSide::Mid, PadSize::Big),
            pickup(PadSide::Blue, PadSize::Small),
        ];

        let events = detect(&timeline, &network);
        assert_eq!(events.len(), 3);
        assert!(events[0].stolen);
        assert!(!events[1].stolen);
        assert!(!events[2].stolen);
    }

    #[test]
    fn unknown_players_are_dropped() {
        let timeline = timeline_with("steam:2", 0);
        let mut network = NetworkFrames::empty(NetworkDiagnostics::ok(0, "test"));
        network.pad_pickups = vec![pickup(PadSide::Mid, PadSize::Small)];
        assert!(detect(&timeline, &network).is_empty());
    }
}
