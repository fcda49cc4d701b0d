//! Engine-facing value types produced by the parser adapters: per-sample
//! frames, roster rows, pad pickups and the degradation diagnostics record
//! every parse carries.

use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::error::DegradationCode;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, new)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, new)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Quat::new(0.0, 0.0, 0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct BallState {
    pub position: Vec3,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
}

/// One player's sampled state within a [`RawFrame`]. The jump/dodge/double
/// jump flags are `None` when the network stream never exposed the component
/// for this sample; detectors then fall back to kinematic inference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerFrame {
    pub player_id: String,
    pub team: u8,
    pub position: Vec3,
    pub velocity: Vec3,
    pub rotation: Quat,
    pub angular_velocity: Vec3,
    pub boost_amount: f32,
    pub is_supersonic: bool,
    pub is_on_ground: bool,
    pub is_demolished: bool,
    pub is_jumping: Option<bool>,
    pub is_dodging: Option<bool>,
    pub is_double_jumping: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawFrame {
    pub timestamp: f64,
    pub ball: BallState,
    pub players: Vec<PlayerFrame>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkStatus {
    Ok,
    Degraded,
    Unavailable,
}

/// Every adapter invocation returns one of these; a parse never silently
/// succeeds with empty output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkDiagnostics {
    pub status: NetworkStatus,
    pub error_code: Option<DegradationCode>,
    pub error_detail: Option<String>,
    pub frames_emitted: usize,
    pub attempted_backends: Vec<String>,
}

impl NetworkDiagnostics {
    pub fn ok(frames_emitted: usize, backend: &str) -> Self {
        Self {
            status: NetworkStatus::Ok,
            error_code: None,
            error_detail: None,
            frames_emitted,
            attempted_backends: vec![backend.to_string()],
        }
    }

    pub fn degraded(
        code: DegradationCode,
        detail: String,
        frames_emitted: usize,
        backend: &str,
    ) -> Self {
        Self {
            status: NetworkStatus::Degraded,
            error_code: Some(code),
            error_detail: Some(crate::error::truncate_detail(&detail)),
            frames_emitted,
            attempted_backends: vec![backend.to_string()],
        }
    }

    pub fn unavailable(backend: &str) -> Self {
        Self {
            status: NetworkStatus::Unavailable,
            error_code: None,
            error_detail: None,
            frames_emitted: 0,
            attempted_backends: vec![backend.to_string()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PadSize {
    #[serde(rename = "BIG")]
    Big,
    #[serde(rename = "SMALL")]
    Small,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PadSide {
    #[serde(rename = "BLUE")]
    Blue,
    #[serde(rename = "ORANGE")]
    Orange,
    #[serde(rename = "MID")]
    Mid,
}

/// Authoritative pad pickup emitted on a pickup attribute flip. Pickups are
/// never inferred from player boost deltas on this path.
#[derive(Debug, Clone, PartialEq, Serialize, new)]
pub struct PadPickup {
    pub t: f64,
    pub frame: usize,
    pub pad_id: usize,
    pub side: PadSide,
    pub size: PadSize,
    pub player_id: String,
}

/// Demolition surfaced from a demolish attribute.
#[derive(Debug, Clone, PartialEq, Serialize, new)]
pub struct DemoNotice {
    pub t: f64,
    pub frame: usize,
    pub attacker_id: Option<String>,
    pub victim_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CameraSettings {
    pub fov: f32,
    pub height: f32,
    pub angle: f32,
    pub distance: f32,
    pub stiffness: f32,
    pub swivel_speed: f32,
    pub transition_speed: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LoadoutSummary {
    pub body: u32,
    pub decal: u32,
    pub wheels: u32,
    pub boost: u32,
    pub antenna: u32,
    pub topper: u32,
}

/// One observed player: the adapter-stable id plus everything the network
/// stream told us about who they are.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterEntry {
    pub player_id: String,
    pub display_name: String,
    pub team: u8,
    pub platform: Option<String>,
    pub online_id: Option<String>,
    pub raw_actor_ids: Vec<i32>,
    pub camera: Option<CameraSettings>,
    pub loadout: Option<LoadoutSummary>,
}

/// Everything a parser adapter produces from the network data block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkFrames {
    pub frames: Vec<RawFrame>,
    pub diagnostics: NetworkDiagnostics,
    pub pad_pickups: Vec<PadPickup>,
    pub demolitions: Vec<DemoNotice>,
    pub roster: Vec<RosterEntry>,
    pub crc_checked: bool,
}

impl NetworkFrames {
    /// Header-only result with the given diagnostics.
    pub fn empty(diagnostics: NetworkDiagnostics) -> Self {
        Self {
            frames: Vec::new(),
            diagnostics,
            pad_pickups: Vec::new(),
            demolitions: Vec::new(),
            roster: Vec::new(),
            crc_checked: false,
        }
    }
}
