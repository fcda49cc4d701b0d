//! Property tests for the quantified invariants: coordinate clamping,
//! timestamp monotonicity, the stolen-pad rule and detail bounding.

mod common;

use proptest::prelude::*;

use rlcoach::error::truncate_detail;
use rlcoach::events::boost;
use rlcoach::frames::{NetworkDiagnostics, NetworkFrames, PadPickup, PadSide, PadSize, Vec3};
use rlcoach::header::Header;
use rlcoach::normalize::{normalize, NormalizedTimeline, PlayerIdentity};

fn timeline_with_player(team: u8) -> NormalizedTimeline {
    NormalizedTimeline {
        frames: Vec::new(),
        frame_hz: 30.0,
        duration_s: 0.0,
        players: vec![PlayerIdentity {
            player_id: "steam:1".to_string(),
            display_name: "P".to_string(),
            team,
            platform_ids: Default::default(),
            aliases: vec!["steam:1".to_string()],
            camera: None,
            loadout: None,
            is_bot: false,
        }],
        team_size: 1,
        warnings: Vec::new(),
        kickoff_offset: 0.0,
    }
}

proptest! {
    #[test]
    fn normalized_positions_stay_in_the_arena(
        x in -10000.0f32..10000.0,
        y in -12000.0f32..12000.0,
        z in -500.0f32..5000.0,
    ) {
        let frames = vec![common::frame(
            0.0,
            Vec3::new(x, y, z),
            Vec3::default(),
            vec![common::player_frame("a", 0, Vec3::new(y, x, z))],
        )];
        let mut network = NetworkFrames::empty(NetworkDiagnostics::ok(1, "test"));
        network.frames = frames;
        let timeline = normalize(&Header::synthetic(), &network);

        for frame in &timeline.frames {
            let b = frame.ball.position;
            prop_assert!(b.x.abs() <= 4096.0);
            prop_assert!(b.y.abs() <= 5120.0);
            prop_assert!((0.0..=2044.0).contains(&b.z));
            for player in &frame.players {
                let p = player.position;
                prop_assert!(p.x.abs() <= 4096.0);
                prop_assert!(p.y.abs() <= 5120.0);
                prop_assert!((0.0..=2044.0).contains(&p.z));
            }
        }
    }

    #[test]
    fn normalized_timestamps_never_decrease(times in prop::collection::vec(0.0f64..300.0, 1..40)) {
        let frames: Vec<_> = times
            .iter()
            .map(|t| common::frame(
                *t,
                Vec3::new(500.0, 500.0, 93.0),
                Vec3::new(100.0, 0.0, 0.0),
                vec![common::player_frame("a", 0, Vec3::new(0.0, -3000.0, 17.0))],
            ))
            .collect();
        let mut network = NetworkFrames::empty(NetworkDiagnostics::ok(frames.len(), "test"));
        network.frames = frames;
        let timeline = normalize(&Header::synthetic(), &network);

        for pair in timeline.frames.windows(2) {
            prop_assert!(pair[1].timestamp >= pair[0].timestamp);
        }
        if let Some(first) = timeline.frames.first() {
            prop_assert!(first.timestamp >= 0.0);
        }
    }

    #[test]
    fn stolen_iff_pad_on_opponent_side(team in 0u8..2, side_index in 0usize..3, big in any::<bool>()) {
        let side = [PadSide::Blue, PadSide::Orange, PadSide::Mid][side_index];
        let size = if big { PadSize::Big } else { PadSize::Small };
        let timeline = timeline_with_player(team);
        let mut network = NetworkFrames::empty(NetworkDiagnostics::ok(0, "test"));
        network.pad_pickups = vec![PadPickup::new(5.0, 150, 0, side, size, "steam:1".to_string())];

        let events = boost::detect(&timeline, &network);
        prop_assert_eq!(events.len(), 1);
        let own_side = if team == 0 { PadSide::Blue } else { PadSide::Orange };
        let expected = side != PadSide::Mid && side != own_side;
        prop_assert_eq!(events[0].stolen, expected);
    }

    #[test]
    fn detail_truncation_never_exceeds_bound(detail in ".{0,2000}") {
        prop_assert!(truncate_detail(&detail).len() <= 512);
    }
}
