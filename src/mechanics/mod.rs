//! Per-player mechanic classification from kinematic state at the sampled
//! rate. Component flags are preferred when the stream exposed them;
//! kinematic inference is the fallback. All discriminators work in car-local
//! coordinates so wall play classifies the same as floor play.

pub mod detector;
pub mod state;

pub use detector::detect;

use serde::Serialize;

use crate::frames::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MechanicKind {
    #[serde(rename = "JUMP")]
    Jump,
    #[serde(rename = "DOUBLE_JUMP")]
    DoubleJump,
    #[serde(rename = "FLIP")]
    Flip,
    #[serde(rename = "FLIP_CANCEL")]
    FlipCancel,
    #[serde(rename = "HALF_FLIP")]
    HalfFlip,
    #[serde(rename = "SPEEDFLIP")]
    Speedflip,
    #[serde(rename = "WAVEDASH")]
    Wavedash,
    #[serde(rename = "AERIAL")]
    Aerial,
    #[serde(rename = "FAST_AERIAL")]
    FastAerial,
    #[serde(rename = "FLIP_RESET_TOUCH")]
    FlipResetTouch,
    #[serde(rename = "FLIP_RESET_USE")]
    FlipResetUse,
    #[serde(rename = "AIR_ROLL")]
    AirRoll,
    #[serde(rename = "DRIBBLE")]
    Dribble,
    #[serde(rename = "FLICK")]
    Flick,
    #[serde(rename = "MUSTY_FLICK")]
    MustyFlick,
    #[serde(rename = "CEILING_SHOT")]
    CeilingShot,
    #[serde(rename = "POWER_SLIDE")]
    PowerSlide,
    #[serde(rename = "GROUND_PINCH")]
    GroundPinch,
    #[serde(rename = "DOUBLE_TOUCH")]
    DoubleTouch,
    #[serde(rename = "REDIRECT")]
    Redirect,
    #[serde(rename = "STALL")]
    Stall,
    #[serde(rename = "SKIM")]
    Skim,
    #[serde(rename = "PSYCHO")]
    Psycho,
}

impl MechanicKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MechanicKind::Jump => "JUMP",
            MechanicKind::DoubleJump => "DOUBLE_JUMP",
            MechanicKind::Flip => "FLIP",
            MechanicKind::FlipCancel => "FLIP_CANCEL",
            MechanicKind::HalfFlip => "HALF_FLIP",
            MechanicKind::Speedflip => "SPEEDFLIP",
            MechanicKind::Wavedash => "WAVEDASH",
            MechanicKind::Aerial => "AERIAL",
            MechanicKind::FastAerial => "FAST_AERIAL",
            MechanicKind::FlipResetTouch => "FLIP_RESET_TOUCH",
            MechanicKind::FlipResetUse => "FLIP_RESET_USE",
            MechanicKind::AirRoll => "AIR_ROLL",
            MechanicKind::Dribble => "DRIBBLE",
            MechanicKind::Flick => "FLICK",
            MechanicKind::MustyFlick => "MUSTY_FLICK",
            MechanicKind::CeilingShot => "CEILING_SHOT",
            MechanicKind::PowerSlide => "POWER_SLIDE",
            MechanicKind::GroundPinch => "GROUND_PINCH",
            MechanicKind::DoubleTouch => "DOUBLE_TOUCH",
            MechanicKind::Redirect => "REDIRECT",
            MechanicKind::Stall => "STALL",
            MechanicKind::Skim => "SKIM",
            MechanicKind::Psycho => "PSYCHO",
        }
    }

    pub const ALL: [MechanicKind; 23] = [
        MechanicKind::Jump,
        MechanicKind::DoubleJump,
        MechanicKind::Flip,
        MechanicKind::FlipCancel,
        MechanicKind::HalfFlip,
        MechanicKind::Speedflip,
        MechanicKind::Wavedash,
        MechanicKind::Aerial,
        MechanicKind::FastAerial,
        MechanicKind::FlipResetTouch,
        MechanicKind::FlipResetUse,
        MechanicKind::AirRoll,
        MechanicKind::Dribble,
        MechanicKind::Flick,
        MechanicKind::MustyFlick,
        MechanicKind::CeilingShot,
        MechanicKind::PowerSlide,
        MechanicKind::GroundPinch,
        MechanicKind::DoubleTouch,
        MechanicKind::Redirect,
        MechanicKind::Stall,
        MechanicKind::Skim,
        MechanicKind::Psycho,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FlipDirection {
    #[serde(rename = "FORWARD")]
    Forward,
    #[serde(rename = "BACKWARD")]
    Backward,
    #[serde(rename = "LEFT")]
    Left,
    #[serde(rename = "RIGHT")]
    Right,
    #[serde(rename = "DIAGONAL_LEFT")]
    DiagonalLeft,
    #[serde(rename = "DIAGONAL_RIGHT")]
    DiagonalRight,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MechanicEvent {
    pub t: f64,
    pub player_id: String,
    pub kind: MechanicKind,
    pub position: Vec3,
    pub velocity: Vec3,
    pub direction: Option<FlipDirection>,
    pub height: f32,
    pub duration: Option<f64>,
    pub ball_position: Option<Vec3>,
    pub ball_velocity_change: Option<f32>,
    pub boost_used: Option<f32>,
}

impl MechanicEvent {
    pub fn basic(t: f64, player_id: &str, kind: MechanicKind, position: Vec3, velocity: Vec3) -> Self {
        MechanicEvent {
            t,
            player_id: player_id.to_string(),
            kind,
            position,
            velocity,
            direction: None,
            height: position.z,
            duration: None,
            ball_position: None,
            ball_velocity_change: None,
            boost_used: None,
        }
    }
}
