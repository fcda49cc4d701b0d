//! The single per-player state record every mechanic classifier reads and
//! mutates. Resets happen in exactly two places: landing and match events
//! (kickoff or demolition). Scattered per-detector state is where leaks come
//! from, so there is none.

use crate::frames::Vec3;
use crate::mechanics::FlipDirection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PsychoPhase {
    WaitingForBounce,
    Inverting,
    SkimReady,
}

#[derive(Debug, Clone, Default)]
pub struct MechanicsState {
    pub is_airborne: bool,
    pub air_start_time: Option<f64>,
    pub last_ground_time: f64,

    pub first_jump_time: Option<f64>,
    pub first_jump_boost_active: bool,
    pub second_jump_time: Option<f64>,
    pub second_jump_boost_active: bool,
    pub last_jump_impulse_time: Option<f64>,

    pub has_flipped: bool,
    pub flip_start_time: Option<f64>,
    pub flip_direction: Option<FlipDirection>,
    /// Sign of the commanded pitch rate at flip start: +1, -1 or 0.
    pub flip_pitch_intent: i8,
    /// Pitch/roll attitude at flip start, for the wavedash setup check.
    pub flip_start_attitude: (f32, f32),
    pub flip_start_speed: f32,
    pub flip_cancel_start_time: Option<f64>,
    pub cancel_reversal_frames: u32,
    pub cancel_emitted: bool,
    pub speedflip_emitted: bool,
    pub half_flip_emitted: bool,
    pub flip_start_forward: Option<Vec3>,

    pub flip_available_from_reset: bool,
    pub last_reset_touch_time: Option<f64>,

    pub aerial_emitted_at: Option<f64>,
    pub fast_aerial_emitted: bool,
    pub high_air_start: Option<f64>,

    pub air_roll_start: Option<f64>,
    pub stall_start: Option<f64>,
    pub stall_emitted: bool,
    pub power_slide_start: Option<f64>,
    pub last_skim_time: Option<f64>,

    pub is_dribbling: bool,
    pub dribble_start_time: Option<f64>,
    pub dribble_qualified: bool,
    pub pending_flick: Option<(f64, f32)>,
    pub pending_musty: Option<(f64, f32)>,

    pub ceiling_contact_frames: u32,
    pub last_ceiling_touch_time: Option<f64>,
    pub has_ceiling_flip: bool,
    pub left_ceiling_yet: bool,
    pub had_surface_contact_since_ceiling: bool,

    pub last_aerial_touch_time: Option<f64>,

    pub prev_position: Option<Vec3>,
    pub prev_velocity: Option<Vec3>,
    pub prev_speed: f32,
    pub prev_angular_speed: f32,
    pub prev_boost: Option<f32>,
    pub recent_boost_deltas: Vec<(f64, f32)>,
    pub prev_jump_flag: bool,
    pub prev_double_jump_flag: bool,
    pub prev_dodge_flag: bool,

    pub psycho_state: Option<PsychoPhase>,
    pub psycho_slam_time: Option<f64>,
}

impl MechanicsState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Landing reset: everything tied to the current air segment. Kinematic
    /// history survives so landing-frame detectors (wavedash) still see it.
    pub fn reset_on_landing(&mut self, t: f64) {
        self.is_airborne = false;
        self.air_start_time = None;
        self.last_ground_time = t;
        self.first_jump_time = None;
        self.first_jump_boost_active = false;
        self.second_jump_time = None;
        self.second_jump_boost_active = false;
        self.has_flipped = false;
        self.flip_start_time = None;
        self.flip_direction = None;
        self.flip_pitch_intent = 0;
        self.flip_cancel_start_time = None;
        self.cancel_reversal_frames = 0;
        self.cancel_emitted = false;
        self.speedflip_emitted = false;
        self.half_flip_emitted = false;
        self.flip_start_forward = None;
        self.flip_available_from_reset = false;
        self.last_reset_touch_time = None;
        self.aerial_emitted_at = None;
        self.fast_aerial_emitted = false;
        self.high_air_start = None;
        self.air_roll_start = None;
        self.stall_start = None;
        self.stall_emitted = false;
        self.had_surface_contact_since_ceiling = true;
        self.psycho_state = None;
        self.psycho_slam_time = None;
    }

    /// Full reset at kickoffs and demolitions.
    pub fn reset_on_match_event(&mut self, t: f64) {
        let prev_position = self.prev_position;
        let prev_velocity = self.prev_velocity;
        *self = MechanicsState::default();
        self.last_ground_time = t;
        self.prev_position = prev_position;
        self.prev_velocity = prev_velocity;
    }

    /// Whether boost was being spent around `t` (a negative delta inside the
    /// window). Pad-pickup upswings are positive deltas and never match.
    pub fn boost_active_near(&self, t: f64, window: f64) -> bool {
        self.recent_boost_deltas
            .iter()
            .any(|(dt, delta)| (t - dt).abs() <= window && *delta < -0.05)
    }

    pub fn push_boost_delta(&mut self, t: f64, delta: f32, keep_window: f64) {
        self.recent_boost_deltas.push((t, delta));
        self.recent_boost_deltas
            .retain(|(dt, _)| t - dt <= keep_window);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landing_clears_air_segment_state() {
        let mut state = MechanicsState::new();
        state.is_airborne = true;
        state.has_flipped = true;
        state.flip_available_from_reset = true;
        state.first_jump_time = Some(1.0);
        state.psycho_state = Some(PsychoPhase::SkimReady);

        state.reset_on_landing(2.0);
        assert!(!state.is_airborne);
        assert!(!state.has_flipped);
        assert!(!state.flip_available_from_reset);
        assert!(state.first_jump_time.is_none());
        assert!(state.psycho_state.is_none());
        assert_eq!(state.last_ground_time, 2.0);
    }

    #[test]
    fn boost_activity_ignores_pickup_upswings() {
        let mut state = MechanicsState::new();
        state.push_boost_delta(1.0, 12.0, 2.0);
        assert!(!state.boost_active_near(1.0, 0.1));
        state.push_boost_delta(1.05, -1.2, 2.0);
        assert!(state.boost_active_near(1.0, 0.1));
    }
}
