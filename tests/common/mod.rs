//! Shared builders for synthetic replay data used by the integration tests.
#![allow(dead_code)]

use rlcoach::frames::{
    BallState, NetworkDiagnostics, NetworkFrames, PlayerFrame, Quat, RawFrame, RosterEntry, Vec3,
};
use rlcoach::header::{Header, HeaderPlayerRow, Playlist};

pub fn player_frame(id: &str, team: u8, position: Vec3) -> PlayerFrame {
    PlayerFrame {
        player_id: id.to_string(),
        team,
        position,
        velocity: Vec3::default(),
        rotation: Quat::default(),
        angular_velocity: Vec3::default(),
        boost_amount: 33.0,
        is_supersonic: false,
        is_on_ground: true,
        is_demolished: false,
        is_jumping: None,
        is_dodging: None,
        is_double_jumping: None,
    }
}

pub fn frame(t: f64, ball_position: Vec3, ball_velocity: Vec3, players: Vec<PlayerFrame>) -> RawFrame {
    RawFrame {
        timestamp: t,
        ball: BallState {
            position: ball_position,
            velocity: ball_velocity,
            angular_velocity: Vec3::default(),
        },
        players,
    }
}

pub fn roster_entry(id: &str, name: &str, team: u8) -> RosterEntry {
    RosterEntry {
        player_id: id.to_string(),
        display_name: name.to_string(),
        team,
        platform: None,
        online_id: None,
        raw_actor_ids: Vec::new(),
        camera: None,
        loadout: None,
    }
}

pub fn network_with(frames: Vec<RawFrame>, roster: Vec<RosterEntry>) -> NetworkFrames {
    let mut network = NetworkFrames::empty(NetworkDiagnostics::ok(frames.len(), "test"));
    network.diagnostics.frames_emitted = frames.len();
    network.frames = frames;
    network.roster = roster;
    network.crc_checked = true;
    network
}

pub fn duel_header(name_blue: &str, name_orange: &str) -> Header {
    let mut header = Header::synthetic();
    header.playlist = Playlist::Duel;
    header.map_name = "Stadium_P".to_string();
    header.team_size = 1;
    header.duration_seconds = 2.0;
    header.player_stats = vec![
        HeaderPlayerRow {
            name: name_blue.to_string(),
            platform: None,
            online_id: None,
            team: 0,
            goals: 0,
            assists: 0,
            saves: 0,
            shots: 0,
            score: 100,
            is_bot: false,
        },
        HeaderPlayerRow {
            name: name_orange.to_string(),
            platform: None,
            online_id: None,
            team: 1,
            goals: 0,
            assists: 0,
            saves: 0,
            shots: 0,
            score: 80,
            is_bot: false,
        },
    ];
    header
}

/// A minimal two-player duel: kickoff pose, a touch by the blue player, and
/// quiet frames after.
pub fn duel_scenario() -> (Header, NetworkFrames) {
    let header = duel_header("Alpha", "Bravo");
    let blue_spawn = Vec3::new(0.0, -4608.0, 17.0);
    let orange_spawn = Vec3::new(0.0, 4608.0, 17.0);

    let mut blue_near_ball = player_frame("slug:alpha", 0, Vec3::new(0.0, 60.0, 17.0));
    blue_near_ball.velocity = Vec3::new(0.0, 400.0, 0.0);

    let frames = vec![
        frame(
            10.0,
            Vec3::new(0.0, 0.0, 93.0),
            Vec3::default(),
            vec![
                player_frame("slug:alpha", 0, blue_spawn),
                player_frame("slug:bravo", 1, orange_spawn),
            ],
        ),
        frame(
            10.55,
            Vec3::new(0.0, 0.0, 93.0),
            Vec3::default(),
            vec![
                player_frame("slug:alpha", 0, Vec3::new(0.0, -2000.0, 17.0)),
                player_frame("slug:bravo", 1, orange_spawn),
            ],
        ),
        frame(
            11.10,
            Vec3::new(0.0, 160.0, 93.0),
            Vec3::new(0.0, 1710.0, 0.0),
            vec![
                blue_near_ball,
                player_frame("slug:bravo", 1, orange_spawn),
            ],
        ),
    ];
    let roster = vec![
        roster_entry("slug:alpha", "Alpha", 0),
        roster_entry("slug:bravo", "Bravo", 1),
    ];
    (header, network_with(frames, roster))
}
