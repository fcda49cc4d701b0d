//! The mechanic detection loop. One pass over the timeline; per player, one
//! [`MechanicsState`] that every classifier reads and mutates. Authoritative
//! component flags (jump/dodge/double-jump) trigger detection when the
//! stream carried them; angular-velocity and car-up projections are the
//! kinematic fallback.

use std::collections::HashMap;

use crate::constants::*;
use crate::frames::{PlayerFrame, RawFrame, Vec3};
use crate::mechanics::state::{MechanicsState, PsychoPhase};
use crate::mechanics::{FlipDirection, MechanicEvent, MechanicKind};
use crate::normalize::{kickoff_pose, NormalizedTimeline};
use crate::util::{car_local_angular_rates, world_to_car_local};

/// Ball context shared by every player's classifiers on one frame.
struct BallContext {
    position: Vec3,
    velocity: Vec3,
    speed: f32,
    prev_speed: f32,
    /// Deflection versus the previous frame's velocity, in uu/s.
    deflection: f32,
    nearest_player: Option<String>,
}

pub fn detect(timeline: &NormalizedTimeline) -> Vec<MechanicEvent> {
    let mut detector = Detector {
        states: HashMap::new(),
        events: Vec::new(),
        nominal_dt: 1.0 / timeline.frame_hz.max(1.0) as f64,
        last_wall_bounce: None,
        prev_ball_velocity: None,
    };

    for (index, frame) in timeline.frames.iter().enumerate() {
        let dt = if index > 0 {
            (frame.timestamp - timeline.frames[index - 1].timestamp).max(1e-6)
        } else {
            detector.nominal_dt
        };

        if kickoff_pose(frame) {
            let t = frame.timestamp;
            for state in detector.states.values_mut() {
                state.reset_on_match_event(t);
            }
        }

        detector.track_wall_bounce(frame);
        let ball = detector.ball_context(frame);
        for player in &frame.players {
            detector.step_player(player, &ball, frame.timestamp, dt);
        }
        detector.prev_ball_velocity = Some(frame.ball.velocity);
    }

    detector
        .events
        .sort_by(|a, b| a.t.partial_cmp(&b.t).unwrap_or(std::cmp::Ordering::Equal));
    detector.events
}

struct Detector {
    states: HashMap<String, MechanicsState>,
    events: Vec<MechanicEvent>,
    nominal_dt: f64,
    last_wall_bounce: Option<f64>,
    prev_ball_velocity: Option<Vec3>,
}

impl Detector {
    fn track_wall_bounce(&mut self, frame: &RawFrame) {
        let Some(prev) = self.prev_ball_velocity else {
            return;
        };
        let p = frame.ball.position;
        let v = frame.ball.velocity;
        let near_side = p.x.abs() > SIDE_WALL_X - DOUBLE_TOUCH_WALL_MARGIN;
        let near_back = p.y.abs() > BACK_WALL_Y - DOUBLE_TOUCH_WALL_MARGIN;
        let x_flip = near_side && prev.x.signum() != v.x.signum() && v.x.abs() > 50.0;
        let y_flip = near_back && prev.y.signum() != v.y.signum() && v.y.abs() > 50.0;
        if x_flip || y_flip {
            self.last_wall_bounce = Some(frame.timestamp);
        }
    }

    fn ball_context(&self, frame: &RawFrame) -> BallContext {
        let prev = self.prev_ball_velocity.unwrap_or(frame.ball.velocity);
        let deflection = (frame.ball.velocity.to_glam() - prev.to_glam()).length();
        let nearest_player = frame
            .players
            .iter()
            .filter(|p| !p.is_demolished)
            .map(|p| (p.player_id.clone(), p.position.distance(frame.ball.position)))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(id, _)| id);
        BallContext {
            position: frame.ball.position,
            velocity: frame.ball.velocity,
            speed: frame.ball.velocity.length(),
            prev_speed: prev.length(),
            deflection,
            nearest_player,
        }
    }

    fn emit(&mut self, event: MechanicEvent) {
        self.events.push(event);
    }

    fn step_player(&mut self, player: &PlayerFrame, ball: &BallContext, t: f64, dt: f64) {
        let mut state = self
            .states
            .remove(&player.player_id)
            .unwrap_or_else(MechanicsState::new);

        if player.is_demolished {
            state.reset_on_match_event(t);
            self.finish_player_frame(player, &mut state, t);
            self.states.insert(player.player_id.clone(), state);
            return;
        }

        let up = player.rotation.up();
        let forward = player.rotation.forward();
        let right = player.rotation.right();
        let velocity = player.velocity.to_glam();
        let speed = velocity.length();
        let (roll_rate, pitch_rate, yaw_rate) =
            car_local_angular_rates(player.rotation, player.angular_velocity);
        let angular_speed = player.angular_velocity.length();

        // Boost bookkeeping feeds boost-active detection everywhere.
        if let Some(prev_boost) = state.prev_boost {
            let delta = player.boost_amount - prev_boost;
            if delta.abs() > 1e-3 {
                state.push_boost_delta(t, delta, 2.0);
            }
        }

        let grounded = player.is_on_ground;
        let ball_contact = ball.nearest_player.as_deref() == Some(player.player_id.as_str())
            && player.position.distance(ball.position) < BALL_CONTACT_PROXIMITY
            && ball.deflection > 150.0;

        // Airborne transitions. Wavedash and a pending air-roll segment are
        // judged on the landing frame, before the reset wipes the evidence.
        if state.is_airborne && grounded {
            self.check_wavedash(player, &state, speed, forward, t);
            if let Some(start) = state.air_roll_start {
                if t - start > AIR_ROLL_MIN_DURATION {
                    let mut event = MechanicEvent::basic(
                        start,
                        &player.player_id,
                        MechanicKind::AirRoll,
                        player.position,
                        player.velocity,
                    );
                    event.duration = Some(t - start);
                    self.emit(event);
                }
            }
            state.reset_on_landing(t);
        } else if !state.is_airborne && !grounded {
            state.is_airborne = true;
            state.air_start_time = Some(t);
        }

        if state.is_airborne {
            self.detect_jumps(player, &mut state, up, velocity, t, dt);
            self.detect_flip(
                player, &mut state, ball, pitch_rate, roll_rate, yaw_rate, angular_speed, forward,
                speed, t,
            );
            self.detect_flip_cancel(player, &mut state, pitch_rate, t);
            self.detect_half_flip(player, &mut state, forward, t);
            self.detect_speedflip(player, &mut state, velocity, t);
            self.detect_aerials(player, &mut state, t);
            self.detect_flip_reset_and_skim(player, &mut state, ball, up, t);
            self.detect_air_roll(player, &mut state, roll_rate, t);
            self.detect_stall(player, &mut state, roll_rate, yaw_rate, velocity, t);
            self.detect_ceiling(player, &mut state, ball, up, ball_contact, t);
        } else {
            self.detect_power_slide(player, &mut state, velocity, right, t);
        }

        self.detect_dribble(player, &mut state, ball, t);
        self.detect_flick_windows(player, &mut state, ball, ball_contact, t);
        if ball_contact {
            self.detect_contact_mechanics(player, &mut state, ball, t);
        }
        self.advance_psycho(player, &mut state, ball, up, ball_contact, t);

        state.prev_angular_speed = angular_speed;
        self.finish_player_frame(player, &mut state, t);
        self.states.insert(player.player_id.clone(), state);
    }

    fn finish_player_frame(&mut self, player: &PlayerFrame, state: &mut MechanicsState, _t: f64) {
        state.prev_position = Some(player.position);
        state.prev_velocity = Some(player.velocity);
        state.prev_speed = player.velocity.length();
        state.prev_boost = Some(player.boost_amount);
        state.prev_jump_flag = player.is_jumping.unwrap_or(false);
        state.prev_double_jump_flag = player.is_double_jumping.unwrap_or(false);
        state.prev_dodge_flag = player.is_dodging.unwrap_or(false);
    }

    fn detect_jumps(
        &mut self,
        player: &PlayerFrame,
        state: &mut MechanicsState,
        up: glam::f32::Vec3,
        velocity: glam::f32::Vec3,
        t: f64,
        _dt: f64,
    ) {
        // Authoritative component flag edges win; the kinematic impulse is
        // the fallback when the stream never exposed them.
        let jump_edge = match player.is_jumping {
            Some(flag) => flag && !state.prev_jump_flag,
            None => false,
        };
        let double_edge = match player.is_double_jumping {
            Some(flag) => flag && !state.prev_double_jump_flag,
            None => false,
        };

        let prev_velocity = state
            .prev_velocity
            .map(|v| v.to_glam())
            .unwrap_or(velocity);
        let dv_up = (velocity - prev_velocity).dot(up);
        let cooled = state
            .last_jump_impulse_time
            .map(|last| t - last >= JUMP_COOLDOWN)
            .unwrap_or(true);
        let kinematic_impulse =
            player.is_jumping.is_none() && dv_up > JUMP_IMPULSE_DV && cooled;

        let first = state.first_jump_time.is_none();
        if jump_edge || (kinematic_impulse && first) {
            if first {
                state.first_jump_time = Some(t);
                state.first_jump_boost_active = state.boost_active_near(t, 0.1);
                state.last_jump_impulse_time = Some(t);
                self.emit(MechanicEvent::basic(
                    t,
                    &player.player_id,
                    MechanicKind::Jump,
                    player.position,
                    player.velocity,
                ));
            }
            return;
        }

        // Second impulse without an intervening flip rotation reads as the
        // double jump.
        let second_impulse = double_edge
            || (kinematic_impulse
                && !first
                && state.second_jump_time.is_none()
                && !state.has_flipped
                && state.prev_angular_speed < FLIP_ANGVEL_STEP);
        if second_impulse && state.second_jump_time.is_none() && !state.has_flipped {
            state.second_jump_time = Some(t);
            state.second_jump_boost_active = state.boost_active_near(t, 0.1);
            state.last_jump_impulse_time = Some(t);
            self.emit(MechanicEvent::basic(
                t,
                &player.player_id,
                MechanicKind::DoubleJump,
                player.position,
                player.velocity,
            ));
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn detect_flip(
        &mut self,
        player: &PlayerFrame,
        state: &mut MechanicsState,
        ball: &BallContext,
        pitch_rate: f32,
        roll_rate: f32,
        yaw_rate: f32,
        angular_speed: f32,
        forward: glam::f32::Vec3,
        speed: f32,
        t: f64,
    ) {
        if state.has_flipped {
            return;
        }
        let dodge_edge = match player.is_dodging {
            Some(flag) => flag && !state.prev_dodge_flag,
            None => false,
        };
        let kinematic = player.is_dodging.is_none()
            && angular_speed - state.prev_angular_speed > FLIP_ANGVEL_STEP;
        if !dodge_edge && !kinematic {
            return;
        }

        let (ap, ar) = (pitch_rate.abs(), roll_rate.abs());
        let direction = if ap > 2.0 * ar {
            if pitch_rate > 0.0 {
                FlipDirection::Forward
            } else {
                FlipDirection::Backward
            }
        } else if ar > 2.0 * ap {
            if roll_rate > 0.0 {
                FlipDirection::Right
            } else {
                FlipDirection::Left
            }
        } else if roll_rate > 0.0 || yaw_rate < 0.0 {
            FlipDirection::DiagonalRight
        } else {
            FlipDirection::DiagonalLeft
        };

        state.has_flipped = true;
        state.flip_start_time = Some(t);
        state.flip_direction = Some(direction);
        state.flip_pitch_intent = if ap > 0.5 { pitch_rate.signum() as i8 } else { 0 };
        state.flip_start_attitude = {
            let (pitch, _, roll) = player.rotation.euler();
            (pitch, roll)
        };
        state.flip_start_speed = speed;
        state.flip_start_forward = Some(Vec3::new(forward.x, forward.y, forward.z));
        // A flip consumes the double jump.
        if state.second_jump_time.is_none() {
            state.second_jump_time = Some(t);
        }

        let mut event = MechanicEvent::basic(
            t,
            &player.player_id,
            MechanicKind::Flip,
            player.position,
            player.velocity,
        );
        event.direction = Some(direction);
        self.emit(event);

        if state.flip_available_from_reset {
            let within_window = state
                .last_reset_touch_time
                .map(|touch| t - touch <= FLIP_RESET_USE_WINDOW)
                .unwrap_or(false);
            if within_window {
                self.emit(MechanicEvent::basic(
                    t,
                    &player.player_id,
                    MechanicKind::FlipResetUse,
                    player.position,
                    player.velocity,
                ));
            }
            state.flip_available_from_reset = false;
        }

        if state.is_dribbling || state.dribble_qualified {
            state.pending_flick = Some((t, ball.speed));
        }
        if direction == FlipDirection::Backward {
            state.pending_musty = Some((t, ball.speed));
        }
        if state.left_ceiling_yet && !state.had_surface_contact_since_ceiling {
            state.has_ceiling_flip = true;
        }
    }

    fn detect_flip_cancel(
        &mut self,
        player: &PlayerFrame,
        state: &mut MechanicsState,
        pitch_rate: f32,
        t: f64,
    ) {
        let Some(flip_start) = state.flip_start_time else {
            return;
        };
        if state.cancel_emitted
            || state.flip_pitch_intent == 0
            || t - flip_start > FLIP_CANCEL_WINDOW
        {
            return;
        }
        let reversed = pitch_rate.signum() as i8 == -state.flip_pitch_intent
            && pitch_rate.abs() > 0.5;
        if reversed {
            if state.cancel_reversal_frames == 0 {
                state.flip_cancel_start_time = Some(t);
            }
            state.cancel_reversal_frames += 1;
            if state.cancel_reversal_frames >= 3 {
                state.cancel_emitted = true;
                self.emit(MechanicEvent::basic(
                    state.flip_cancel_start_time.unwrap_or(t),
                    &player.player_id,
                    MechanicKind::FlipCancel,
                    player.position,
                    player.velocity,
                ));
            }
        } else {
            state.cancel_reversal_frames = 0;
            state.flip_cancel_start_time = None;
        }
    }

    fn detect_half_flip(
        &mut self,
        player: &PlayerFrame,
        state: &mut MechanicsState,
        forward: glam::f32::Vec3,
        t: f64,
    ) {
        if state.half_flip_emitted
            || state.flip_direction != Some(FlipDirection::Backward)
            || !state.cancel_emitted
        {
            return;
        }
        let Some(flip_start) = state.flip_start_time else {
            return;
        };
        if t - flip_start > HALF_FLIP_WINDOW {
            return;
        }
        let Some(start_forward) = state.flip_start_forward else {
            return;
        };
        if forward.dot(start_forward.to_glam()) < -0.8 {
            state.half_flip_emitted = true;
            self.emit(MechanicEvent::basic(
                t,
                &player.player_id,
                MechanicKind::HalfFlip,
                player.position,
                player.velocity,
            ));
        }
    }

    fn detect_speedflip(
        &mut self,
        player: &PlayerFrame,
        state: &mut MechanicsState,
        velocity: glam::f32::Vec3,
        t: f64,
    ) {
        if state.speedflip_emitted {
            return;
        }
        let diagonal = matches!(
            state.flip_direction,
            Some(FlipDirection::DiagonalLeft) | Some(FlipDirection::DiagonalRight)
        );
        let (Some(flip_start), Some(cancel_start)) =
            (state.flip_start_time, state.flip_cancel_start_time)
        else {
            return;
        };
        if !diagonal || !state.cancel_emitted || t - flip_start > 0.5 {
            return;
        }
        if cancel_start - flip_start > SPEEDFLIP_CANCEL_WINDOW {
            return;
        }

        let Some(start_forward) = state.flip_start_forward else {
            return;
        };
        let forward_speed = velocity.dot(start_forward.to_glam().normalize_or_zero());
        let forward_gain = forward_speed - state.flip_start_speed;

        let cancel_frames = ((cancel_start - flip_start) / self.nominal_dt).round() as u32;
        let bucket_score = match cancel_frames {
            0..=1 => 3,
            2 => 2,
            3 => 1,
            _ => 0,
        };
        let boost_score = u32::from(state.boost_active_near(t, 0.2));
        let accel_score = u32::from(forward_gain >= SPEEDFLIP_MIN_ACCEL);
        if bucket_score + boost_score + accel_score >= 3 && forward_gain >= SPEEDFLIP_MIN_ACCEL {
            state.speedflip_emitted = true;
            let boost_used: f32 = state
                .recent_boost_deltas
                .iter()
                .filter(|(dt, delta)| t - dt <= 0.5 && *delta < 0.0)
                .map(|(_, delta)| -delta)
                .sum();
            let mut event = MechanicEvent::basic(
                flip_start,
                &player.player_id,
                MechanicKind::Speedflip,
                player.position,
                player.velocity,
            );
            event.direction = state.flip_direction;
            event.boost_used = Some(boost_used);
            self.emit(event);
        }
    }

    /// Wavedash check on the landing frame, before the reset.
    fn check_wavedash(
        &mut self,
        player: &PlayerFrame,
        state: &MechanicsState,
        speed: f32,
        _forward: glam::f32::Vec3,
        t: f64,
    ) {
        let Some(flip_start) = state.flip_start_time else {
            return;
        };
        let delay = t - flip_start;
        if !(WAVEDASH_MIN_LAND_DELAY..=WAVEDASH_MAX_LAND_DELAY).contains(&delay) {
            return;
        }
        let (pitch, roll) = state.flip_start_attitude;
        if pitch.abs() <= 0.2 && roll.abs() <= 0.2 {
            return;
        }
        if speed - state.flip_start_speed >= WAVEDASH_MIN_SPEED_GAIN {
            self.emit(MechanicEvent::basic(
                t,
                &player.player_id,
                MechanicKind::Wavedash,
                player.position,
                player.velocity,
            ));
        }
    }

    fn detect_aerials(&mut self, player: &PlayerFrame, state: &mut MechanicsState, t: f64) {
        if player.position.z > AERIAL_MIN_HEIGHT {
            let start = *state.high_air_start.get_or_insert(t);
            let deduped = state
                .aerial_emitted_at
                .map(|last| t - last < AERIAL_DEDUPE_WINDOW)
                .unwrap_or(false);
            if t - start > AERIAL_MIN_DURATION && !deduped {
                state.aerial_emitted_at = Some(t);
                let boost_used: f32 = state
                    .recent_boost_deltas
                    .iter()
                    .filter(|(dt, delta)| *dt >= start && t - dt <= 5.0 && *delta < 0.0)
                    .map(|(_, delta)| -delta)
                    .sum();
                let mut event = MechanicEvent::basic(
                    t,
                    &player.player_id,
                    MechanicKind::Aerial,
                    player.position,
                    player.velocity,
                );
                event.duration = Some(t - start);
                event.boost_used = Some(boost_used);
                self.emit(event);
            }

            // Fast aerial: boosted double-jump takeoff reaching height fast.
            if !state.fast_aerial_emitted {
                if let (Some(first), Some(second)) =
                    (state.first_jump_time, state.second_jump_time)
                {
                    if second - first <= FAST_AERIAL_SECOND_JUMP_WINDOW
                        && state.first_jump_boost_active
                        && state.second_jump_boost_active
                        && t - first <= FAST_AERIAL_HEIGHT_WINDOW
                    {
                        state.fast_aerial_emitted = true;
                        self.emit(MechanicEvent::basic(
                            t,
                            &player.player_id,
                            MechanicKind::FastAerial,
                            player.position,
                            player.velocity,
                        ));
                    }
                }
            }
        } else {
            state.high_air_start = None;
        }
    }

    fn detect_flip_reset_and_skim(
        &mut self,
        player: &PlayerFrame,
        state: &mut MechanicsState,
        ball: &BallContext,
        up: glam::f32::Vec3,
        t: f64,
    ) {
        let offset = ball.position.to_glam() - player.position.to_glam();
        let distance = offset.length();
        if distance >= FLIP_RESET_DISTANCE {
            return;
        }
        let underside = up.dot(offset.normalize_or_zero()) < FLIP_RESET_DOT;
        if !underside {
            return;
        }

        // Flip reset: underside contact with the flip consumed.
        if state.has_flipped {
            let recently = state
                .last_reset_touch_time
                .map(|last| t - last < 0.5)
                .unwrap_or(false);
            if !recently {
                state.last_reset_touch_time = Some(t);
                state.flip_available_from_reset = true;
                state.has_flipped = false;
                let mut event = MechanicEvent::basic(
                    t,
                    &player.player_id,
                    MechanicKind::FlipResetTouch,
                    player.position,
                    player.velocity,
                );
                event.ball_position = Some(ball.position);
                self.emit(event);
            }
        }

        // Skim: orthogonal to the reset, so it may co-emit. The ball must
        // speed up and trend toward the opponent goal.
        let toward_opponent = if player.team == 0 {
            ball.velocity.y > 0.0
        } else {
            ball.velocity.y < 0.0
        };
        let sped_up = ball.speed > ball.prev_speed + 50.0;
        let deduped = state
            .last_skim_time
            .map(|last| t - last < 0.5)
            .unwrap_or(false);
        if sped_up && toward_opponent && !deduped {
            state.last_skim_time = Some(t);
            let mut event = MechanicEvent::basic(
                t,
                &player.player_id,
                MechanicKind::Skim,
                player.position,
                player.velocity,
            );
            event.ball_position = Some(ball.position);
            event.ball_velocity_change = Some(ball.speed - ball.prev_speed);
            self.emit(event);

            if state.psycho_state == Some(PsychoPhase::SkimReady) {
                let within = state
                    .psycho_slam_time
                    .map(|slam| t - slam <= PSYCHO_SKIM_WINDOW)
                    .unwrap_or(false);
                if within {
                    self.emit(MechanicEvent::basic(
                        t,
                        &player.player_id,
                        MechanicKind::Psycho,
                        player.position,
                        player.velocity,
                    ));
                }
                state.psycho_state = None;
                state.psycho_slam_time = None;
            }
        }
    }

    fn detect_air_roll(
        &mut self,
        player: &PlayerFrame,
        state: &mut MechanicsState,
        roll_rate: f32,
        t: f64,
    ) {
        let post_flip_blackout = state
            .flip_start_time
            .map(|flip| t - flip <= AIR_ROLL_POST_FLIP_BLACKOUT)
            .unwrap_or(false);
        let rolling = roll_rate.abs() > AIR_ROLL_MIN_RATE && !post_flip_blackout;
        if rolling {
            state.air_roll_start.get_or_insert(t);
        } else if let Some(start) = state.air_roll_start.take() {
            if t - start > AIR_ROLL_MIN_DURATION {
                let mut event = MechanicEvent::basic(
                    start,
                    &player.player_id,
                    MechanicKind::AirRoll,
                    player.position,
                    player.velocity,
                );
                event.duration = Some(t - start);
                self.emit(event);
            }
        }
    }

    fn detect_stall(
        &mut self,
        player: &PlayerFrame,
        state: &mut MechanicsState,
        roll_rate: f32,
        yaw_rate: f32,
        velocity: glam::f32::Vec3,
        t: f64,
    ) {
        let stalling = player.position.z > AERIAL_MIN_HEIGHT
            && roll_rate.abs() > STALL_MIN_ROLL_RATE
            && yaw_rate.abs() > STALL_MIN_YAW_RATE
            && roll_rate * yaw_rate < 0.0
            && velocity.z.abs() < STALL_MAX_VZ
            && velocity.truncate().length() < STALL_MAX_VXY;
        if stalling {
            let start = *state.stall_start.get_or_insert(t);
            if t - start > STALL_MIN_DURATION && !state.stall_emitted {
                state.stall_emitted = true;
                let mut event = MechanicEvent::basic(
                    start,
                    &player.player_id,
                    MechanicKind::Stall,
                    player.position,
                    player.velocity,
                );
                event.duration = Some(t - start);
                self.emit(event);
            }
        } else {
            state.stall_start = None;
            state.stall_emitted = false;
        }
    }

    fn detect_ceiling(
        &mut self,
        player: &PlayerFrame,
        state: &mut MechanicsState,
        _ball: &BallContext,
        up: glam::f32::Vec3,
        ball_contact: bool,
        t: f64,
    ) {
        let on_ceiling = player.position.z > CEILING_CONTACT_Z && up.z < -0.7;
        if on_ceiling {
            state.ceiling_contact_frames += 1;
            if state.ceiling_contact_frames >= CEILING_MIN_CONTACT_FRAMES {
                state.last_ceiling_touch_time = Some(t);
                state.left_ceiling_yet = false;
                state.had_surface_contact_since_ceiling = false;
                state.has_ceiling_flip = false;
            }
        } else {
            if state.last_ceiling_touch_time.is_some() && !state.left_ceiling_yet {
                state.left_ceiling_yet = true;
            }
            state.ceiling_contact_frames = 0;
        }

        if ball_contact
            && state.has_ceiling_flip
            && state.left_ceiling_yet
            && !state.had_surface_contact_since_ceiling
        {
            state.has_ceiling_flip = false;
            state.last_ceiling_touch_time = None;
            self.emit(MechanicEvent::basic(
                t,
                &player.player_id,
                MechanicKind::CeilingShot,
                player.position,
                player.velocity,
            ));
        }
    }

    fn detect_power_slide(
        &mut self,
        player: &PlayerFrame,
        state: &mut MechanicsState,
        velocity: glam::f32::Vec3,
        right: glam::f32::Vec3,
        t: f64,
    ) {
        let lateral = velocity.dot(right).abs();
        if lateral > POWER_SLIDE_MIN_LATERAL {
            state.power_slide_start.get_or_insert(t);
        } else if let Some(start) = state.power_slide_start.take() {
            if t - start > POWER_SLIDE_MIN_DURATION {
                let mut event = MechanicEvent::basic(
                    start,
                    &player.player_id,
                    MechanicKind::PowerSlide,
                    player.position,
                    player.velocity,
                );
                event.duration = Some(t - start);
                self.emit(event);
            }
        }
    }

    fn detect_dribble(
        &mut self,
        player: &PlayerFrame,
        state: &mut MechanicsState,
        ball: &BallContext,
        t: f64,
    ) {
        let local = world_to_car_local(player.position, player.rotation, ball.position);
        // Footprint oval: 80 u wide, 120 u long; carry height band above the
        // roof.
        let in_oval = (local.y / DRIBBLE_OVAL_X).powi(2) + (local.x / DRIBBLE_OVAL_Y).powi(2)
            <= 1.0;
        let in_band = local.z > DRIBBLE_MIN_Z && local.z < DRIBBLE_MAX_Z;
        let grounded = player.position.z < GROUNDED_Z;
        let matched_speed = (ball.velocity.to_glam() - player.velocity.to_glam()).length()
            < DRIBBLE_MAX_REL_SPEED;

        if in_oval && in_band && grounded && matched_speed {
            let start = *state.dribble_start_time.get_or_insert(t);
            if t - start > DRIBBLE_MIN_DURATION {
                state.is_dribbling = true;
                state.dribble_qualified = true;
            }
        } else if state.dribble_start_time.is_some() {
            if state.dribble_qualified {
                let start = state.dribble_start_time.unwrap_or(t);
                let mut event = MechanicEvent::basic(
                    start,
                    &player.player_id,
                    MechanicKind::Dribble,
                    player.position,
                    player.velocity,
                );
                event.duration = Some(t - start);
                event.ball_position = Some(ball.position);
                self.emit(event);
            }
            state.is_dribbling = false;
            state.dribble_qualified = false;
            state.dribble_start_time = None;
        }
    }

    fn detect_flick_windows(
        &mut self,
        player: &PlayerFrame,
        state: &mut MechanicsState,
        ball: &BallContext,
        ball_contact: bool,
        t: f64,
    ) {
        if let Some((flip_t, speed_at_flip)) = state.pending_flick {
            if t - flip_t > FLICK_WINDOW {
                state.pending_flick = None;
            } else if ball.speed - speed_at_flip > FLICK_MIN_SPEED_GAIN {
                state.pending_flick = None;
                let mut event = MechanicEvent::basic(
                    t,
                    &player.player_id,
                    MechanicKind::Flick,
                    player.position,
                    player.velocity,
                );
                event.ball_position = Some(ball.position);
                event.ball_velocity_change = Some(ball.speed - speed_at_flip);
                self.emit(event);
            }
        }

        if let Some((flip_t, speed_at_flip)) = state.pending_musty {
            if t - flip_t > FLICK_WINDOW {
                state.pending_musty = None;
            } else if ball_contact && ball.speed > speed_at_flip {
                state.pending_musty = None;
                let mut event = MechanicEvent::basic(
                    t,
                    &player.player_id,
                    MechanicKind::MustyFlick,
                    player.position,
                    player.velocity,
                );
                event.ball_position = Some(ball.position);
                event.ball_velocity_change = Some(ball.speed - speed_at_flip);
                self.emit(event);
            }
        }
    }

    /// Contact-coincident mechanics: ground pinch, double touch, redirect.
    fn detect_contact_mechanics(
        &mut self,
        player: &PlayerFrame,
        state: &mut MechanicsState,
        ball: &BallContext,
        t: f64,
    ) {
        if ball.position.z < GROUND_PINCH_MAX_BALL_Z
            && ball.speed > GROUND_PINCH_MIN_SPEED
            && ball.speed - ball.prev_speed > GROUND_PINCH_MIN_DELTA
        {
            let mut event = MechanicEvent::basic(
                t,
                &player.player_id,
                MechanicKind::GroundPinch,
                player.position,
                player.velocity,
            );
            event.ball_position = Some(ball.position);
            event.ball_velocity_change = Some(ball.speed - ball.prev_speed);
            self.emit(event);
        }

        if player.position.z > AERIAL_MIN_HEIGHT {
            // Double touch: a second aerial touch with a wall bounce between.
            if let Some(last_touch) = state.last_aerial_touch_time {
                let bounced_between = self
                    .last_wall_bounce
                    .map(|bounce| bounce > last_touch && bounce <= t)
                    .unwrap_or(false);
                if t - last_touch <= DOUBLE_TOUCH_WINDOW && bounced_between {
                    self.emit(MechanicEvent::basic(
                        t,
                        &player.player_id,
                        MechanicKind::DoubleTouch,
                        player.position,
                        player.velocity,
                    ));
                }
            }

            // Redirect: an aerial touch bending the ball toward the goal.
            if ball.speed > REDIRECT_MIN_SPEED {
                if let Some(prev_velocity) = self.prev_ball_velocity {
                    let angle = crate::util::angle_between_deg(
                        prev_velocity.to_glam(),
                        ball.velocity.to_glam(),
                    );
                    let toward_opponent = if player.team == 0 {
                        ball.velocity.y > 0.0
                    } else {
                        ball.velocity.y < 0.0
                    };
                    if angle > REDIRECT_MIN_ANGLE_DEG && toward_opponent {
                        let mut event = MechanicEvent::basic(
                            t,
                            &player.player_id,
                            MechanicKind::Redirect,
                            player.position,
                            player.velocity,
                        );
                        event.ball_position = Some(ball.position);
                        self.emit(event);
                    }
                }
            }

            state.last_aerial_touch_time = Some(t);
        }
    }

    /// The psycho state machine: own-goal slam, wall bounce, inversion, then
    /// a skim inside the window (resolved in the skim detector).
    fn advance_psycho(
        &mut self,
        player: &PlayerFrame,
        state: &mut MechanicsState,
        ball: &BallContext,
        up: glam::f32::Vec3,
        ball_contact: bool,
        t: f64,
    ) {
        if let Some(slam) = state.psycho_slam_time {
            if t - slam > PSYCHO_SKIM_WINDOW {
                state.psycho_state = None;
                state.psycho_slam_time = None;
                return;
            }
        }

        match state.psycho_state {
            None => {
                let toward_own_goal = if player.team == 0 {
                    ball.velocity.y < -500.0
                } else {
                    ball.velocity.y > 500.0
                };
                if ball_contact && toward_own_goal && ball.speed > ball.prev_speed {
                    state.psycho_state = Some(PsychoPhase::WaitingForBounce);
                    state.psycho_slam_time = Some(t);
                }
            }
            Some(PsychoPhase::WaitingForBounce) => {
                let bounced = self
                    .last_wall_bounce
                    .zip(state.psycho_slam_time)
                    .map(|(bounce, slam)| bounce > slam && bounce <= t)
                    .unwrap_or(false);
                if bounced {
                    state.psycho_state = Some(PsychoPhase::Inverting);
                }
            }
            Some(PsychoPhase::Inverting) => {
                if up.z < -0.5 {
                    state.psycho_state = Some(PsychoPhase::SkimReady);
                }
            }
            Some(PsychoPhase::SkimReady) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::{BallState, Quat};

    fn base_player(id: &str) -> PlayerFrame {
        PlayerFrame {
            player_id: id.to_string(),
            team: 0,
            position: Vec3::new(1000.0, -2000.0, 17.0),
            velocity: Vec3::default(),
            rotation: Quat::default(),
            angular_velocity: Vec3::default(),
            boost_amount: 50.0,
            is_supersonic: false,
            is_on_ground: true,
            is_demolished: false,
            is_jumping: None,
            is_dodging: None,
            is_double_jumping: None,
        }
    }

    fn frame_with(t: f64, players: Vec<PlayerFrame>) -> RawFrame {
        RawFrame {
            timestamp: t,
            ball: BallState {
                position: Vec3::new(2000.0, 2000.0, 93.0),
                velocity: Vec3::new(100.0, 0.0, 0.0),
                angular_velocity: Vec3::default(),
            },
            players,
        }
    }

    fn timeline_of(frames: Vec<RawFrame>) -> NormalizedTimeline {
        NormalizedTimeline {
            frames,
            frame_hz: 30.0,
            duration_s: 10.0,
            players: Vec::new(),
            team_size: 1,
            warnings: Vec::new(),
            kickoff_offset: 0.0,
        }
    }

    fn kinds_for(events: &[MechanicEvent], player: &str) -> Vec<MechanicKind> {
        events
            .iter()
            .filter(|e| e.player_id == player)
            .map(|e| e.kind)
            .collect()
    }

    #[test]
    fn kinematic_jump_from_upward_impulse() {
        let grounded = base_player("a");
        let mut airborne = base_player("a");
        airborne.position = Vec3::new(1000.0, -2000.0, 60.0);
        airborne.velocity = Vec3::new(0.0, 0.0, 300.0);
        airborne.is_on_ground = false;

        let frames = vec![
            frame_with(0.0, vec![grounded]),
            frame_with(0.033, vec![airborne.clone()]),
            frame_with(0.066, vec![airborne]),
        ];
        let events = detect(&timeline_of(frames));
        assert!(kinds_for(&events, "a").contains(&MechanicKind::Jump));
    }

    #[test]
    fn angular_step_after_jump_is_a_forward_flip() {
        let grounded = base_player("a");
        let mut jumping = base_player("a");
        jumping.position = Vec3::new(1000.0, -2000.0, 80.0);
        jumping.velocity = Vec3::new(0.0, 0.0, 300.0);
        jumping.is_on_ground = false;
        let mut flipping = jumping.clone();
        flipping.position = Vec3::new(1000.0, -2000.0, 120.0);
        flipping.angular_velocity = Vec3::new(0.0, 5.5, 0.0);

        let frames = vec![
            frame_with(0.0, vec![grounded]),
            frame_with(0.033, vec![jumping]),
            frame_with(0.066, vec![flipping.clone()]),
            frame_with(0.1, vec![flipping]),
        ];
        let events = detect(&timeline_of(frames));
        let flip = events
            .iter()
            .find(|e| e.kind == MechanicKind::Flip)
            .expect("flip should emit");
        assert_eq!(flip.direction, Some(FlipDirection::Forward));
    }

    #[test]
    fn component_flag_edges_trigger_jump() {
        let mut grounded = base_player("a");
        grounded.is_jumping = Some(false);
        let mut airborne = base_player("a");
        airborne.position = Vec3::new(1000.0, -2000.0, 60.0);
        airborne.is_on_ground = false;
        airborne.is_jumping = Some(true);

        let frames = vec![
            frame_with(0.0, vec![grounded]),
            frame_with(0.033, vec![airborne.clone()]),
            frame_with(0.066, vec![airborne]),
        ];
        let events = detect(&timeline_of(frames));
        let jumps = kinds_for(&events, "a")
            .iter()
            .filter(|k| **k == MechanicKind::Jump)
            .count();
        assert_eq!(jumps, 1);
    }

    #[test]
    fn sustained_height_emits_one_aerial() {
        let mut high = base_player("a");
        high.position = Vec3::new(1000.0, -2000.0, 800.0);
        high.is_on_ground = false;
        let frames: Vec<RawFrame> = (0..30)
            .map(|i| frame_with(i as f64 / 30.0, vec![high.clone()]))
            .collect();
        let events = detect(&timeline_of(frames));
        let aerials = kinds_for(&events, "a")
            .iter()
            .filter(|k| **k == MechanicKind::Aerial)
            .count();
        assert_eq!(aerials, 1);
    }

    #[test]
    fn lateral_slide_emits_power_slide_with_duration() {
        let mut sliding = base_player("a");
        sliding.velocity = Vec3::new(0.0, 900.0, 0.0);
        let mut stopped = base_player("a");
        stopped.velocity = Vec3::default();

        let mut frames: Vec<RawFrame> = (0..10)
            .map(|i| frame_with(i as f64 / 30.0, vec![sliding.clone()]))
            .collect();
        frames.push(frame_with(10.0 / 30.0, vec![stopped]));
        let events = detect(&timeline_of(frames));
        let slide = events
            .iter()
            .find(|e| e.kind == MechanicKind::PowerSlide)
            .expect("power slide should emit");
        assert!(slide.duration.unwrap() > POWER_SLIDE_MIN_DURATION);
    }

    #[test]
    fn carried_ball_emits_dribble_segment() {
        let mut carrying = base_player("a");
        carrying.velocity = Vec3::new(1000.0, 0.0, 0.0);
        let ball_above = |p: &PlayerFrame| BallState {
            position: Vec3::new(p.position.x + 20.0, p.position.y, p.position.z + 110.0),
            velocity: Vec3::new(1000.0, 0.0, 0.0),
            angular_velocity: Vec3::default(),
        };

        let mut frames: Vec<RawFrame> = (0..25)
            .map(|i| {
                let mut p = carrying.clone();
                p.position.x += i as f32 * 33.0;
                let ball = ball_above(&p);
                RawFrame {
                    timestamp: i as f64 / 30.0,
                    ball,
                    players: vec![p],
                }
            })
            .collect();
        // Ball rolls off the roof.
        let mut last = frames.last().unwrap().clone();
        last.timestamp += 1.0 / 30.0;
        last.ball.position.z = 93.0;
        frames.push(last);

        let events = detect(&timeline_of(frames));
        let dribble = events
            .iter()
            .find(|e| e.kind == MechanicKind::Dribble)
            .expect("dribble should emit");
        assert!(dribble.duration.unwrap() > DRIBBLE_MIN_DURATION);
    }

    #[test]
    fn demolition_resets_state() {
        let mut flipping = base_player("a");
        flipping.position = Vec3::new(1000.0, -2000.0, 300.0);
        flipping.is_on_ground = false;
        flipping.angular_velocity = Vec3::new(0.0, 5.5, 0.0);
        let mut demolished = flipping.clone();
        demolished.is_demolished = true;

        let frames = vec![
            frame_with(0.0, vec![base_player("a")]),
            frame_with(0.033, vec![flipping]),
            frame_with(0.066, vec![demolished.clone()]),
            frame_with(0.1, vec![demolished]),
        ];
        // The run is only required not to leak state or panic.
        let events = detect(&timeline_of(frames));
        assert!(events.iter().all(|e| e.t <= 0.1));
    }
}
