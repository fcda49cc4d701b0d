//! Normalization: raw adapter frames become the canonical timeline every
//! detector and analyzer reads. Player identities are resolved once here;
//! downstream stages only ever see canonical ids.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::constants::{
    BACK_WALL_Y, CEILING_Z, KICKOFF_BALL_TOLERANCE, KICKOFF_SPAWNS_BLUE,
    KICKOFF_SPAWN_TOLERANCE, LOW_FRAME_RATE_HZ, MAX_OOB_RATIO, SIDE_WALL_X,
};
use crate::frames::{CameraSettings, LoadoutSummary, NetworkFrames, RawFrame, Vec3};
use crate::header::Header;
use crate::util::{median_f32, sanitize_display_name, sanitize_slug};

/// Stable canonical identity. The id is `{platform}:{account}` when a
/// platform identifier resolved, `slug:<name>` otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerIdentity {
    pub player_id: String,
    pub display_name: String,
    pub team: u8,
    pub platform_ids: BTreeMap<String, String>,
    pub aliases: Vec<String>,
    pub camera: Option<CameraSettings>,
    pub loadout: Option<LoadoutSummary>,
    pub is_bot: bool,
}

/// The canonical timeline. Immutable after construction: frames are clamped,
/// ids are canonical, timestamps are zero-based against the first kickoff
/// and strictly non-decreasing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedTimeline {
    pub frames: Vec<RawFrame>,
    pub frame_hz: f32,
    pub duration_s: f64,
    pub players: Vec<PlayerIdentity>,
    pub team_size: u8,
    pub warnings: Vec<String>,
    /// Seconds trimmed off the front of the raw stream when zeroing.
    pub kickoff_offset: f64,
}

impl NormalizedTimeline {
    pub fn player(&self, player_id: &str) -> Option<&PlayerIdentity> {
        self.players.iter().find(|p| p.player_id == player_id)
    }

    pub fn team_players(&self, team: u8) -> impl Iterator<Item = &PlayerIdentity> {
        self.players.iter().filter(move |p| p.team == team)
    }

    /// Maps any alias (raw adapter id, actor id, header index, slug) to the
    /// canonical player id.
    pub fn canonicalize(&self, alias: &str) -> Option<&str> {
        self.players
            .iter()
            .find(|p| p.player_id == alias || p.aliases.iter().any(|a| a == alias))
            .map(|p| p.player_id.as_str())
    }

    pub fn team_of(&self, player_id: &str) -> Option<u8> {
        self.player(player_id).map(|p| p.team)
    }
}

fn platform_tag_to_prefix(tag: &str) -> Option<&'static str> {
    match tag {
        "OnlinePlatform_Steam" => Some("steam"),
        "OnlinePlatform_Epic" => Some("epic"),
        "OnlinePlatform_PS4" | "OnlinePlatform_PS5" => Some("psn"),
        "OnlinePlatform_Dingo" => Some("xbox"),
        "OnlinePlatform_Switch" => Some("switch"),
        _ => None,
    }
}

/// Resolves the full identity set from the network roster and the header
/// stat rows, producing the alias map used to rewrite frame player ids.
fn resolve_identities(
    header: &Header,
    network: &NetworkFrames,
) -> (Vec<PlayerIdentity>, HashMap<String, String>) {
    let mut identities: Vec<PlayerIdentity> = Vec::new();
    let mut aliases: HashMap<String, String> = HashMap::new();

    for entry in &network.roster {
        let display_name = sanitize_display_name(&entry.display_name);
        let header_row = header
            .player_stats
            .iter()
            .find(|row| row.name == entry.display_name);

        // Precedence: platform id from the stream, then the header PRI
        // account, then the display-name slug.
        let canonical = match (&entry.platform, &entry.online_id) {
            (Some(platform), Some(id)) if id != "0" && !id.is_empty() => {
                format!("{}:{}", platform, id)
            }
            _ => header_row
                .and_then(|row| {
                    let prefix = row.platform.as_deref().and_then(platform_tag_to_prefix)?;
                    let id = row.online_id?;
                    Some(format!("{}:{}", prefix, id))
                })
                .unwrap_or_else(|| format!("slug:{}", sanitize_slug(&display_name))),
        };

        let mut platform_ids = BTreeMap::new();
        if let (Some(platform), Some(id)) = (&entry.platform, &entry.online_id) {
            platform_ids.insert(platform.clone(), id.clone());
        }

        let mut alias_list = vec![
            entry.player_id.clone(),
            format!("slug:{}", sanitize_slug(&display_name)),
        ];
        alias_list.extend(entry.raw_actor_ids.iter().map(|id| format!("actor:{}", id)));
        for alias in &alias_list {
            aliases.insert(alias.clone(), canonical.clone());
        }
        aliases.insert(canonical.clone(), canonical.clone());

        identities.push(PlayerIdentity {
            player_id: canonical,
            display_name,
            team: entry.team,
            platform_ids,
            aliases: alias_list,
            camera: entry.camera,
            loadout: entry.loadout,
            is_bot: header_row.map(|row| row.is_bot).unwrap_or(false),
        });
    }

    // Header-only rows: players the network stream never surfaced.
    for (index, row) in header.player_stats.iter().enumerate() {
        let already_known = identities
            .iter()
            .any(|identity| identity.display_name == row.name);
        let header_alias = format!("header:{}", index);
        if already_known {
            if let Some(identity) = identities
                .iter_mut()
                .find(|identity| identity.display_name == row.name)
            {
                identity.aliases.push(header_alias.clone());
                aliases.insert(header_alias, identity.player_id.clone());
            }
            continue;
        }

        let display_name = sanitize_display_name(&row.name);
        let canonical = row
            .platform
            .as_deref()
            .and_then(platform_tag_to_prefix)
            .zip(row.online_id)
            .map(|(prefix, id)| format!("{}:{}", prefix, id))
            .unwrap_or_else(|| format!("slug:{}", sanitize_slug(&display_name)));

        let alias_list = vec![
            header_alias.clone(),
            format!("slug:{}", sanitize_slug(&display_name)),
        ];
        for alias in &alias_list {
            aliases.insert(alias.clone(), canonical.clone());
        }
        aliases.insert(canonical.clone(), canonical.clone());

        identities.push(PlayerIdentity {
            player_id: canonical,
            display_name,
            team: row.team,
            platform_ids: BTreeMap::new(),
            aliases: alias_list,
            camera: None,
            loadout: None,
            is_bot: row.is_bot,
        });
    }

    identities.sort_by(|a, b| (a.team, &a.player_id).cmp(&(b.team, &b.player_id)));
    (identities, aliases)
}

fn out_of_bounds(p: Vec3) -> bool {
    const EPS: f32 = 0.5;
    p.x.abs() > SIDE_WALL_X + EPS || p.y.abs() > BACK_WALL_Y + EPS || p.z < -EPS
        || p.z > CEILING_Z + EPS
}

fn clamp_position(p: Vec3) -> Vec3 {
    Vec3::new(
        p.x.clamp(-SIDE_WALL_X, SIDE_WALL_X),
        p.y.clamp(-BACK_WALL_Y, BACK_WALL_Y),
        p.z.clamp(0.0, CEILING_Z),
    )
}

/// Whether a frame looks like a kickoff pose: ball stationary at the origin
/// with every sampled player near a spawn slot on their own half.
pub fn kickoff_pose(frame: &RawFrame) -> bool {
    let ball = &frame.ball;
    if ball.position.x.abs() > KICKOFF_BALL_TOLERANCE
        || ball.position.y.abs() > KICKOFF_BALL_TOLERANCE
        || ball.velocity.length() > 10.0
    {
        return false;
    }
    if frame.players.is_empty() {
        return false;
    }
    frame.players.iter().all(|player| {
        let (x, y) = (player.position.x, player.position.y);
        let y = if player.team == 0 { y } else { -y };
        KICKOFF_SPAWNS_BLUE.iter().any(|(sx, sy)| {
            let (dx, dy) = (x - sx, y - sy);
            (dx * dx + dy * dy).sqrt() <= KICKOFF_SPAWN_TOLERANCE
        })
    })
}

/// Builds the canonical timeline from the header and a parsed network block.
pub fn normalize(header: &Header, network: &NetworkFrames) -> NormalizedTimeline {
    let (players, aliases) = resolve_identities(header, network);
    let mut warnings: Vec<String> = Vec::new();

    // Sample-rate measurement: median inter-frame delta, clamped to [1, 240].
    let mut deltas: Vec<f32> = network
        .frames
        .windows(2)
        .map(|pair| (pair[1].timestamp - pair[0].timestamp) as f32)
        .filter(|delta| *delta > 0.0)
        .collect();
    let median_delta = median_f32(&mut deltas);
    let frame_hz = if median_delta > 0.0 {
        (1.0 / median_delta).clamp(1.0, 240.0)
    } else {
        30.0
    };
    if !network.frames.is_empty() && frame_hz < LOW_FRAME_RATE_HZ {
        warnings.push("low_frame_rate_sampling".to_string());
    }

    // Coordinate normalization with the corrupt-frame guard: sample the
    // out-of-bounds ratio first, then either clamp (normal) or zero the
    // offending samples (degraded).
    let mut total_samples = 0usize;
    let mut oob_samples = 0usize;
    for frame in &network.frames {
        total_samples += 1 + frame.players.len();
        if out_of_bounds(frame.ball.position) {
            oob_samples += 1;
        }
        oob_samples += frame
            .players
            .iter()
            .filter(|p| out_of_bounds(p.position))
            .count();
    }
    let oob_ratio = if total_samples > 0 {
        oob_samples as f64 / total_samples as f64
    } else {
        0.0
    };
    let zero_oob = oob_ratio > MAX_OOB_RATIO;
    if zero_oob {
        warnings.push("excessive_out_of_bounds_samples".to_string());
    }

    let mut frames: Vec<RawFrame> = Vec::with_capacity(network.frames.len());
    let mut last_timestamp = f64::NEG_INFINITY;
    for raw in &network.frames {
        // Keep timestamps strictly non-decreasing; drop regressions.
        if raw.timestamp < last_timestamp {
            continue;
        }
        last_timestamp = raw.timestamp;

        let mut frame = raw.clone();
        if zero_oob && out_of_bounds(frame.ball.position) {
            frame.ball.position = Vec3::default();
            frame.ball.velocity = Vec3::default();
        } else {
            frame.ball.position = clamp_position(frame.ball.position);
        }
        for player in &mut frame.players {
            if zero_oob && out_of_bounds(player.position) {
                player.position = Vec3::default();
                player.velocity = Vec3::default();
            } else {
                player.position = clamp_position(player.position);
            }
            if let Some(canonical) = aliases.get(&player.player_id) {
                player.player_id = canonical.clone();
            }
        }
        frames.push(frame);
    }

    // Zero the clock at the first kickoff pose that transitions to movement
    // within five seconds; trim everything before it.
    let kickoff_index = frames.iter().enumerate().find_map(|(index, frame)| {
        if !kickoff_pose(frame) {
            return None;
        }
        let pose_t = frame.timestamp;
        let moves = frames[index..]
            .iter()
            .take_while(|f| f.timestamp - pose_t <= 5.0)
            .any(|f| f.ball.velocity.length() > 10.0);
        moves.then_some(index)
    });
    let kickoff_offset = match kickoff_index {
        Some(index) => {
            let offset = frames[index].timestamp;
            frames.drain(..index);
            offset
        }
        None => frames.first().map(|f| f.timestamp).unwrap_or(0.0),
    };
    for frame in &mut frames {
        frame.timestamp -= kickoff_offset;
    }

    let duration_s = frames
        .last()
        .map(|frame| frame.timestamp)
        .filter(|d| *d > 0.0)
        .unwrap_or(header.duration_seconds);

    NormalizedTimeline {
        frames,
        frame_hz,
        duration_s,
        players,
        team_size: header.team_size,
        warnings,
        kickoff_offset,
    }
}
