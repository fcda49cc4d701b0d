//! The boxcars-backed native adapter. Decodes header and network stream,
//! models actor state frame by frame, and samples engine-facing
//! [`RawFrame`]s. Actors resolve to a closed [`ActorClass`] through the
//! replay's object table; attribute keys resolve to object ids once and are
//! compared by id afterwards.

use std::collections::HashMap;

use log::{debug, warn};

use super::pads::PadRegistry;
use super::{backend_chain, debug_boost_events, ParserAdapter};
use crate::constants::*;
use crate::error::{DegradationCode, RlCoachError, RlCoachErrorVariant, RlCoachResult};
use crate::frames::{
    BallState, CameraSettings, DemoNotice, LoadoutSummary, NetworkDiagnostics, NetworkFrames,
    PadPickup, PlayerFrame, Quat, RawFrame, RosterEntry, Vec3,
};
use crate::header::Header;
use crate::util::{boxcars_quat, boxcars_vec3, sanitize_display_name, sanitize_slug,
    surface_contact};

/// Respawn delay applied after a demolition notice.
const DEMO_RESPAWN_SECONDS: f64 = 3.0;

/// Closed actor classification. Resolution is exact object-name lookup, with
/// boost pads additionally identified by the pickup attribute they replicate
/// (their object names are level-instanced).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActorClass {
    Ball,
    Car,
    BoostComponent,
    JumpComponent,
    DoubleJumpComponent,
    DodgeComponent,
    PlayerInfo,
    GameEvent,
    Team(u8),
    BoostPad,
    Other,
}

struct ClassTable {
    by_object: HashMap<boxcars::ObjectId, ActorClass>,
    name_to_object: HashMap<String, boxcars::ObjectId>,
}

impl ClassTable {
    fn build(replay: &boxcars::Replay) -> Self {
        let mut by_object = HashMap::new();
        let mut name_to_object = HashMap::new();
        for (index, name) in replay.objects.iter().enumerate() {
            let object_id = boxcars::ObjectId(index as i32);
            name_to_object.insert(name.clone(), object_id);
            let class = if BALL_TYPES.contains(&name.as_str()) {
                ActorClass::Ball
            } else if name == CAR_TYPE {
                ActorClass::Car
            } else if name == BOOST_TYPE {
                ActorClass::BoostComponent
            } else if name == JUMP_TYPE {
                ActorClass::JumpComponent
            } else if name == DOUBLE_JUMP_TYPE {
                ActorClass::DoubleJumpComponent
            } else if name == DODGE_TYPE {
                ActorClass::DodgeComponent
            } else if name == PLAYER_TYPE {
                ActorClass::PlayerInfo
            } else if name == GAME_TYPE {
                ActorClass::GameEvent
            } else if name == TEAM0_TYPE {
                ActorClass::Team(0)
            } else if name == TEAM1_TYPE {
                ActorClass::Team(1)
            } else if name == PAD_TYPE {
                ActorClass::BoostPad
            } else {
                ActorClass::Other
            };
            if class != ActorClass::Other {
                by_object.insert(object_id, class);
            }
        }
        ClassTable {
            by_object,
            name_to_object,
        }
    }

    fn class_of(&self, object_id: boxcars::ObjectId) -> ActorClass {
        self.by_object
            .get(&object_id)
            .copied()
            .unwrap_or(ActorClass::Other)
    }

    fn key(&self, name: &str) -> Option<boxcars::ObjectId> {
        self.name_to_object.get(name).copied()
    }
}

/// Attribute keys resolved to object ids once per replay.
struct Keys {
    rigid_body: Option<boxcars::ObjectId>,
    boost_amount: Option<boxcars::ObjectId>,
    boost_replicated: Option<boxcars::ObjectId>,
    component_active: Option<boxcars::ObjectId>,
    vehicle: Option<boxcars::ObjectId>,
    team: Option<boxcars::ObjectId>,
    unique_id: Option<boxcars::ObjectId>,
    player_name: Option<boxcars::ObjectId>,
    pawn_pri: Option<boxcars::ObjectId>,
    demolish: Option<boxcars::ObjectId>,
    demolish_fx: Option<boxcars::ObjectId>,
    pickup: Option<boxcars::ObjectId>,
    pickup_new: Option<boxcars::ObjectId>,
    camera_settings: Option<boxcars::ObjectId>,
    camera_pri: Option<boxcars::ObjectId>,
    loadout: Option<boxcars::ObjectId>,
}

impl Keys {
    fn resolve(table: &ClassTable) -> Self {
        Keys {
            rigid_body: table.key(RIGID_BODY_STATE_KEY),
            boost_amount: table.key(BOOST_AMOUNT_KEY),
            boost_replicated: table.key(BOOST_REPLICATED_KEY),
            component_active: table.key(COMPONENT_ACTIVE_KEY),
            vehicle: table.key(VEHICLE_KEY),
            team: table.key(TEAM_KEY),
            unique_id: table.key(UNIQUE_ID_KEY),
            player_name: table.key(PLAYER_NAME_KEY),
            pawn_pri: table.key(PLAYER_REPLICATION_KEY),
            demolish: table.key(DEMOLISH_KEY),
            demolish_fx: table.key(DEMOLISH_FX_KEY),
            pickup: table.key(PICKUP_KEY),
            pickup_new: table.key(PICKUP_NEW_KEY),
            camera_settings: table.key(CAMERA_SETTINGS_KEY),
            camera_pri: table.key(CAMERA_PRI_KEY),
            loadout: table.key(LOADOUT_KEY),
        }
    }
}

#[derive(Debug, Clone)]
struct ActorRecord {
    object_id: boxcars::ObjectId,
    spawn: Option<Vec3>,
    attributes: HashMap<boxcars::ObjectId, boxcars::Attribute>,
}

/// Frame-by-frame actor state. A new actor whose id is live under a
/// different object id means the stream and our model have diverged, which
/// degrades the parse.
#[derive(Default)]
struct ActorModel {
    actors: HashMap<boxcars::ActorId, ActorRecord>,
    by_class: HashMap<boxcars::ObjectId, Vec<boxcars::ActorId>>,
}

impl ActorModel {
    fn apply(&mut self, frame: &boxcars::Frame) -> Result<(), String> {
        for actor_id in &frame.deleted_actors {
            if let Some(record) = self.actors.remove(actor_id) {
                if let Some(ids) = self.by_class.get_mut(&record.object_id) {
                    ids.retain(|id| id != actor_id);
                }
            }
        }
        for new_actor in &frame.new_actors {
            if let Some(existing) = self.actors.get(&new_actor.actor_id) {
                if existing.object_id != new_actor.object_id {
                    return Err(format!(
                        "actor {} respawned as object {} while live as object {}",
                        new_actor.actor_id, new_actor.object_id, existing.object_id
                    ));
                }
                continue;
            }
            let spawn = new_actor.initial_trajectory.location.map(|loc| {
                Vec3::new(loc.x as f32, loc.y as f32, loc.z as f32)
            });
            self.actors.insert(
                new_actor.actor_id,
                ActorRecord {
                    object_id: new_actor.object_id,
                    spawn,
                    attributes: HashMap::new(),
                },
            );
            self.by_class
                .entry(new_actor.object_id)
                .or_default()
                .push(new_actor.actor_id);
        }
        for update in &frame.updated_actors {
            match self.actors.get_mut(&update.actor_id) {
                Some(record) => {
                    record
                        .attributes
                        .insert(update.object_id, update.attribute.clone());
                }
                None => {
                    return Err(format!(
                        "update for unknown actor {} (object {})",
                        update.actor_id, update.object_id
                    ));
                }
            }
        }
        Ok(())
    }

    fn attribute(
        &self,
        actor_id: boxcars::ActorId,
        key: Option<boxcars::ObjectId>,
    ) -> Option<&boxcars::Attribute> {
        self.actors.get(&actor_id)?.attributes.get(&key?)
    }

    fn ids_of(&self, object_id: boxcars::ObjectId) -> &[boxcars::ActorId] {
        self.by_class
            .get(&object_id)
            .map(|v| &v[..])
            .unwrap_or(&EMPTY_ACTOR_IDS)
    }
}

#[derive(Debug, Clone, Copy)]
struct BoostModel {
    last_byte: u8,
    amount_bytes: f32,
    active: bool,
}

#[derive(Debug, Clone, Default)]
struct PlayerRecord {
    player_id: Option<String>,
    display_name: Option<String>,
    team: Option<u8>,
    camera: Option<CameraSettings>,
    loadout: Option<LoadoutSummary>,
    raw_actor_ids: Vec<i32>,
    platform: Option<String>,
    online_id: Option<String>,
}

/// Walks the network frames and samples engine frames, pad pickups,
/// demolitions and the roster.
struct FrameSampler<'a> {
    replay: &'a boxcars::Replay,
    table: ClassTable,
    keys: Keys,
    model: ActorModel,
    // PRI actor → player record; link maps mirror the replication graph.
    players: HashMap<boxcars::ActorId, PlayerRecord>,
    car_to_pri: HashMap<boxcars::ActorId, boxcars::ActorId>,
    pri_to_car: HashMap<boxcars::ActorId, boxcars::ActorId>,
    car_to_boost: HashMap<boxcars::ActorId, boxcars::ActorId>,
    car_to_jump: HashMap<boxcars::ActorId, boxcars::ActorId>,
    car_to_double_jump: HashMap<boxcars::ActorId, boxcars::ActorId>,
    car_to_dodge: HashMap<boxcars::ActorId, boxcars::ActorId>,
    boost_models: HashMap<boxcars::ActorId, BoostModel>,
    ball_actor: Option<boxcars::ActorId>,
    pads: PadRegistry,
    demolished_until: HashMap<String, f64>,
    frames: Vec<RawFrame>,
    pad_pickups: Vec<PadPickup>,
    demolitions: Vec<DemoNotice>,
}

impl<'a> FrameSampler<'a> {
    fn new(replay: &'a boxcars::Replay) -> Self {
        let table = ClassTable::build(replay);
        let keys = Keys::resolve(&table);
        FrameSampler {
            replay,
            table,
            keys,
            model: ActorModel::default(),
            players: HashMap::new(),
            car_to_pri: HashMap::new(),
            pri_to_car: HashMap::new(),
            car_to_boost: HashMap::new(),
            car_to_jump: HashMap::new(),
            car_to_double_jump: HashMap::new(),
            car_to_dodge: HashMap::new(),
            boost_models: HashMap::new(),
            ball_actor: None,
            pads: PadRegistry::new(debug_boost_events()),
            demolished_until: HashMap::new(),
            frames: Vec::new(),
            pad_pickups: Vec::new(),
            demolitions: Vec::new(),
        }
    }

    fn run(mut self) -> (NetworkFrames, Option<(DegradationCode, String)>) {
        let Some(network) = self.replay.network_frames.as_ref() else {
            let network_frames =
                NetworkFrames::empty(NetworkDiagnostics::unavailable("boxcars"));
            return (network_frames, None);
        };

        let mut failure = None;
        for (index, frame) in network.frames.iter().enumerate() {
            if let Err(detail) = self.step(frame, index) {
                warn!("network modeling stopped at frame {}: {}", index, detail);
                failure = Some((
                    DegradationCode::UnknownAttribute,
                    format!("frame {}: {}", index, detail),
                ));
                break;
            }
        }

        let roster = self.build_roster();
        let frames_emitted = self.frames.len();
        let diagnostics = match &failure {
            Some((code, detail)) => {
                NetworkDiagnostics::degraded(*code, detail.clone(), frames_emitted, "boxcars")
            }
            None => NetworkDiagnostics::ok(frames_emitted, "boxcars"),
        };
        let network_frames = NetworkFrames {
            frames: self.frames,
            diagnostics,
            pad_pickups: self.pad_pickups,
            demolitions: self.demolitions,
            roster,
            crc_checked: true,
        };
        (network_frames, failure)
    }

    fn step(&mut self, frame: &boxcars::Frame, index: usize) -> Result<(), String> {
        let t = frame.time as f64;
        self.model.apply(frame)?;
        self.refresh_links(frame);
        self.scan_notices(frame, t, index);
        self.update_boost_models(frame.delta);
        if let Some(sample) = self.sample(t) {
            self.frames.push(sample);
        }
        Ok(())
    }

    /// Maintains the actor link maps from this frame's attribute updates,
    /// mirroring the replication graph: PRI→team, car→PRI, component→car.
    fn refresh_links(&mut self, frame: &boxcars::Frame) {
        for update in &frame.updated_actors {
            let class = self
                .model
                .actors
                .get(&update.actor_id)
                .map(|record| self.table.class_of(record.object_id))
                .unwrap_or(ActorClass::Other);

            match class {
                ActorClass::PlayerInfo => self.refresh_player(update),
                ActorClass::Car => {
                    if Some(update.object_id) == self.keys.pawn_pri {
                        if let boxcars::Attribute::ActiveActor(active) = &update.attribute {
                            self.car_to_pri.insert(update.actor_id, active.actor);
                            self.pri_to_car.insert(active.actor, update.actor_id);
                        }
                    }
                }
                ActorClass::BoostComponent
                | ActorClass::JumpComponent
                | ActorClass::DoubleJumpComponent
                | ActorClass::DodgeComponent => {
                    if Some(update.object_id) == self.keys.vehicle {
                        if let boxcars::Attribute::ActiveActor(active) = &update.attribute {
                            let map = match class {
                                ActorClass::BoostComponent => &mut self.car_to_boost,
                                ActorClass::JumpComponent => &mut self.car_to_jump,
                                ActorClass::DoubleJumpComponent => &mut self.car_to_double_jump,
                                _ => &mut self.car_to_dodge,
                            };
                            map.insert(active.actor, update.actor_id);
                        }
                    }
                }
                ActorClass::Ball => {
                    self.ball_actor = Some(update.actor_id);
                }
                _ => {}
            }

            // Camera settings actors link to their PRI separately.
            if Some(update.object_id) == self.keys.camera_settings {
                if let boxcars::Attribute::CamSettings(settings) = &update.attribute {
                    if let Some(pri) = self.camera_owner(update.actor_id) {
                        let record = self.players.entry(pri).or_default();
                        record.camera = Some(CameraSettings {
                            fov: settings.fov,
                            height: settings.height,
                            angle: settings.angle,
                            distance: settings.distance,
                            stiffness: settings.stiffness,
                            swivel_speed: settings.swivel,
                            transition_speed: settings.transition,
                        });
                    }
                }
            }
        }
    }

    fn camera_owner(&self, camera_actor: boxcars::ActorId) -> Option<boxcars::ActorId> {
        match self.model.attribute(camera_actor, self.keys.camera_pri)? {
            boxcars::Attribute::ActiveActor(active) => Some(active.actor),
            _ => None,
        }
    }

    /// Updates the player record behind a PRI actor from one attribute
    /// update. Identity is derived once per PRI and cached.
    fn refresh_player(&mut self, update: &boxcars::UpdatedAttribute) {
        let record = self.players.entry(update.actor_id).or_default();
        let raw_id = i32::from(update.actor_id);
        if !record.raw_actor_ids.contains(&raw_id) {
            record.raw_actor_ids.push(raw_id);
        }

        if Some(update.object_id) == self.keys.player_name {
            if let boxcars::Attribute::String(name) = &update.attribute {
                record.display_name = Some(sanitize_display_name(name));
            }
        } else if Some(update.object_id) == self.keys.unique_id {
            if let boxcars::Attribute::UniqueId(unique) = &update.attribute {
                let (platform, online_id) = describe_remote_id(&unique.remote_id);
                record.platform = Some(platform.to_string());
                record.online_id = online_id.clone();
                if record.player_id.is_none() {
                    record.player_id = Some(stable_player_id(
                        platform,
                        online_id.as_deref(),
                        record.display_name.as_deref(),
                    ));
                }
            }
        } else if Some(update.object_id) == self.keys.team {
            if let boxcars::Attribute::ActiveActor(active) = &update.attribute {
                let team_class = self
                    .model
                    .actors
                    .get(&active.actor)
                    .map(|r| self.table.class_of(r.object_id));
                if let Some(ActorClass::Team(team)) = team_class {
                    record.team = Some(team);
                }
            }
        } else if Some(update.object_id) == self.keys.loadout {
            if let boxcars::Attribute::Loadout(loadout) = &update.attribute {
                record.loadout = Some(LoadoutSummary {
                    body: loadout.body,
                    decal: loadout.decal,
                    wheels: loadout.wheels,
                    boost: loadout.rocket_trail,
                    antenna: loadout.antenna,
                    topper: loadout.topper,
                });
            }
        }
    }

    /// Detects pad pickups and demolitions from this frame's updates.
    fn scan_notices(&mut self, frame: &boxcars::Frame, t: f64, index: usize) {
        for update in &frame.updated_actors {
            let is_pickup_key = Some(update.object_id) == self.keys.pickup
                || Some(update.object_id) == self.keys.pickup_new;
            if is_pickup_key {
                self.handle_pickup(update, t, index);
            } else if Some(update.object_id) == self.keys.demolish
                || Some(update.object_id) == self.keys.demolish_fx
            {
                self.handle_demolish(update, t, index);
            }
        }
        for deleted in &frame.deleted_actors {
            self.pads.deregister(i32::from(*deleted));
        }
    }

    fn handle_pickup(&mut self, update: &boxcars::UpdatedAttribute, t: f64, index: usize) {
        // Only pad actors replicate pickup data, so first sight of the key
        // registers the actor against the pad table.
        let actor_raw = i32::from(update.actor_id);
        if !self.pads.is_pad(actor_raw) {
            let spawn = self
                .model
                .actors
                .get(&update.actor_id)
                .and_then(|record| record.spawn);
            if let Some(spawn) = spawn {
                self.pads.register(actor_raw, spawn);
            }
        }

        let (picked_up, instigator) = match &update.attribute {
            boxcars::Attribute::Pickup(pickup) => (pickup.picked_up, pickup.instigator),
            boxcars::Attribute::PickupNew(pickup) => {
                (pickup.picked_up > 0, pickup.instigator)
            }
            _ => return,
        };
        let player_id = instigator.and_then(|car| self.player_id_of_car(car));
        if let Some(pickup) = self.pads.on_pickup_update(
            actor_raw,
            picked_up,
            player_id.as_deref(),
            t,
            index,
        ) {
            self.pad_pickups.push(pickup);
        }
    }

    fn handle_demolish(&mut self, update: &boxcars::UpdatedAttribute, t: f64, index: usize) {
        let (attacker_car, victim_car) = match &update.attribute {
            boxcars::Attribute::Demolish(demolish) => (demolish.attacker, demolish.victim),
            boxcars::Attribute::DemolishFx(demolish) => (demolish.attacker, demolish.victim),
            boxcars::Attribute::DemolishExtended(demolish) => {
                (demolish.attacker.actor, demolish.victim.actor)
            }
            _ => return,
        };
        let attacker = self.player_id_of_car(attacker_car);
        let Some(victim) = self.player_id_of_car(victim_car) else {
            debug!("demolish at t={:.3} with unresolvable victim car", t);
            return;
        };
        self.demolished_until
            .insert(victim.clone(), t + DEMO_RESPAWN_SECONDS);
        self.demolitions
            .push(DemoNotice::new(t, index, attacker, victim));
    }

    fn player_id_of_car(&self, car: boxcars::ActorId) -> Option<String> {
        let pri = self.car_to_pri.get(&car)?;
        self.players.get(pri)?.player_id.clone()
    }

    /// Advances the drain model for every boost component. A replicated byte
    /// change resets the model; otherwise active boost drains between
    /// updates.
    fn update_boost_models(&mut self, delta: f32) {
        let boost_object = self
            .table
            .name_to_object
            .get(BOOST_TYPE)
            .copied();
        let Some(boost_object) = boost_object else {
            return;
        };
        let ids: Vec<boxcars::ActorId> = self.model.ids_of(boost_object).to_vec();
        for actor_id in ids {
            let byte = match self.model.attribute(actor_id, self.keys.boost_amount) {
                Some(boxcars::Attribute::Byte(byte)) => Some(*byte),
                _ => match self.model.attribute(actor_id, self.keys.boost_replicated) {
                    Some(boxcars::Attribute::ReplicatedBoost(replicated)) => {
                        Some(replicated.boost_amount)
                    }
                    _ => None,
                },
            };
            let active = match self.model.attribute(actor_id, self.keys.component_active) {
                Some(boxcars::Attribute::Byte(active)) => active % 2 == 1,
                _ => false,
            };
            let entry = self.boost_models.entry(actor_id).or_insert(BoostModel {
                last_byte: byte.unwrap_or(0),
                amount_bytes: byte.unwrap_or(0) as f32,
                active,
            });
            entry.active = active;
            match byte {
                Some(byte) if byte != entry.last_byte => {
                    entry.last_byte = byte;
                    entry.amount_bytes = byte as f32;
                }
                _ => {
                    if active {
                        entry.amount_bytes =
                            (entry.amount_bytes - delta * BOOST_USED_PER_SECOND).max(0.0);
                    }
                }
            }
        }
    }

    fn boost_amount_of_car(&self, car: boxcars::ActorId) -> f32 {
        let amount_bytes = self
            .car_to_boost
            .get(&car)
            .and_then(|boost| self.boost_models.get(boost))
            .map(|model| model.amount_bytes)
            .unwrap_or(85.0);
        (amount_bytes / 255.0 * 100.0).clamp(0.0, 100.0)
    }

    fn component_active(
        &self,
        car: boxcars::ActorId,
        map: &HashMap<boxcars::ActorId, boxcars::ActorId>,
    ) -> Option<bool> {
        let component = map.get(&car)?;
        match self.model.attribute(*component, self.keys.component_active) {
            Some(boxcars::Attribute::Byte(active)) => Some(active % 2 == 1),
            _ => None,
        }
    }

    fn rigid_body_of(&self, actor_id: boxcars::ActorId) -> Option<&boxcars::RigidBody> {
        match self.model.attribute(actor_id, self.keys.rigid_body)? {
            boxcars::Attribute::RigidBody(rigid_body) => Some(rigid_body),
            _ => None,
        }
    }

    fn find_ball(&self) -> Option<boxcars::ActorId> {
        if let Some(ball) = self.ball_actor {
            if self.model.actors.contains_key(&ball) {
                return Some(ball);
            }
        }
        for ball_type in BALL_TYPES.iter() {
            if let Some(object_id) = self.table.key(ball_type) {
                if let Some(actor) = self.model.ids_of(object_id).first() {
                    return Some(*actor);
                }
            }
        }
        None
    }

    /// Samples one engine frame, or `None` before the ball has a live rigid
    /// body.
    fn sample(&mut self, t: f64) -> Option<RawFrame> {
        let ball_actor = self.find_ball()?;
        self.ball_actor = Some(ball_actor);
        let ball_rb = self.rigid_body_of(ball_actor)?;
        if ball_rb.sleeping && self.frames.is_empty() {
            // Pre-kickoff lobby frames carry nothing worth sampling.
            return None;
        }
        let ball = BallState {
            position: boxcars_vec3(&ball_rb.location),
            velocity: ball_rb
                .linear_velocity
                .as_ref()
                .map(boxcars_vec3)
                .unwrap_or_default(),
            angular_velocity: ball_rb
                .angular_velocity
                .as_ref()
                .map(boxcars_vec3)
                .unwrap_or_default(),
        };

        let mut players: Vec<PlayerFrame> = Vec::with_capacity(self.players.len());
        for (pri_actor, record) in &self.players {
            let Some(player_id) = record.player_id.clone() else {
                continue;
            };
            let Some(car) = self.pri_to_car.get(pri_actor).copied() else {
                continue;
            };
            let Some(rigid_body) = self.rigid_body_of(car) else {
                continue;
            };
            let position = boxcars_vec3(&rigid_body.location);
            let velocity = rigid_body
                .linear_velocity
                .as_ref()
                .map(boxcars_vec3)
                .unwrap_or_default();
            let demolished = self
                .demolished_until
                .get(&player_id)
                .map(|until| t < *until)
                .unwrap_or(false);
            players.push(PlayerFrame {
                player_id,
                team: record.team.unwrap_or(0),
                position,
                velocity,
                rotation: boxcars_quat(&rigid_body.rotation),
                angular_velocity: rigid_body
                    .angular_velocity
                    .as_ref()
                    .map(boxcars_vec3)
                    .unwrap_or_default(),
                boost_amount: self.boost_amount_of_car(car),
                is_supersonic: velocity.length() >= SUPERSONIC_SPEED,
                is_on_ground: surface_contact(position),
                is_demolished: demolished,
                is_jumping: self.component_active(car, &self.car_to_jump),
                is_dodging: self.component_active(car, &self.car_to_dodge),
                is_double_jumping: self.component_active(car, &self.car_to_double_jump),
            });
        }
        players.sort_by(|a, b| a.player_id.cmp(&b.player_id));

        Some(RawFrame {
            timestamp: t,
            ball,
            players,
        })
    }

    fn build_roster(&self) -> Vec<RosterEntry> {
        let mut roster: Vec<RosterEntry> = self
            .players
            .values()
            .filter_map(|record| {
                let player_id = record.player_id.clone()?;
                Some(RosterEntry {
                    player_id,
                    display_name: record
                        .display_name
                        .clone()
                        .unwrap_or_else(|| "unknown".to_string()),
                    team: record.team.unwrap_or(0),
                    platform: record.platform.clone(),
                    online_id: record.online_id.clone(),
                    raw_actor_ids: record.raw_actor_ids.clone(),
                    camera: record.camera,
                    loadout: record.loadout,
                })
            })
            .collect();
        roster.sort_by(|a, b| a.player_id.cmp(&b.player_id));
        roster
    }
}

fn describe_remote_id(remote_id: &boxcars::RemoteId) -> (&'static str, Option<String>) {
    match remote_id {
        boxcars::RemoteId::Steam(id) => ("steam", Some(id.to_string())),
        boxcars::RemoteId::Epic(id) => ("epic", Some(id.clone())),
        boxcars::RemoteId::Xbox(id) => ("xbox", Some(id.to_string())),
        boxcars::RemoteId::PlayStation(ps4) => ("psn", Some(ps4.online_id.to_string())),
        boxcars::RemoteId::PsyNet(psy) => ("psn", Some(psy.online_id.to_string())),
        boxcars::RemoteId::Switch(switch) => ("switch", Some(switch.online_id.to_string())),
        boxcars::RemoteId::QQ(id) => ("qq", Some(id.to_string())),
        boxcars::RemoteId::SplitScreen(id) => ("split", Some(id.to_string())),
    }
}

fn stable_player_id(
    platform: &str,
    online_id: Option<&str>,
    display_name: Option<&str>,
) -> String {
    match online_id {
        Some(id) if !id.is_empty() && id != "0" => format!("{}:{}", platform, id),
        _ => format!("slug:{}", sanitize_slug(display_name.unwrap_or("unknown"))),
    }
}

/// The boxcars-backed native adapter.
pub struct NativeAdapter;

impl NativeAdapter {
    pub fn new() -> Self {
        NativeAdapter
    }

    fn parse_replay(bytes: &[u8], with_network: bool) -> Result<boxcars::Replay, String> {
        let builder = boxcars::ParserBuilder::new(bytes);
        let builder = if with_network {
            builder.must_parse_network_data().always_check_crc()
        } else {
            builder.never_parse_network_data().never_check_crc()
        };
        builder.parse().map_err(|e| e.to_string())
    }

    fn decode_with_boxcars(&self, bytes: &[u8]) -> NetworkFrames {
        match Self::parse_replay(bytes, true) {
            Ok(replay) => {
                let (network, _) = FrameSampler::new(&replay).run();
                network
            }
            Err(detail) => {
                let code = if detail.to_lowercase().contains("crc") {
                    DegradationCode::CrcFailNetwork
                } else {
                    DegradationCode::NetworkError
                };
                NetworkFrames::empty(NetworkDiagnostics::degraded(code, detail, 0, "boxcars"))
            }
        }
    }
}

impl Default for NativeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserAdapter for NativeAdapter {
    fn name(&self) -> &'static str {
        "rust"
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn supports_network_parsing(&self) -> bool {
        true
    }

    fn parse_header(&self, bytes: &[u8]) -> RlCoachResult<Header> {
        let replay = Self::parse_replay(bytes, false).map_err(|detail| {
            RlCoachError::new(RlCoachErrorVariant::HeaderUnreadable { detail })
        })?;
        crate::header::decode_header(&replay)
    }

    /// Runs the configured backend chain in order; each attempt appends its
    /// name to `attempted_backends`. The first backend that yields frames
    /// wins.
    fn parse_network(&self, bytes: &[u8]) -> NetworkFrames {
        let mut attempted: Vec<String> = Vec::new();
        let mut last: Option<NetworkFrames> = None;

        for backend in backend_chain() {
            match backend.as_str() {
                "boxcars" => {
                    attempted.push(backend.clone());
                    let mut network = self.decode_with_boxcars(bytes);
                    network.diagnostics.attempted_backends = attempted.clone();
                    if !network.frames.is_empty() {
                        return network;
                    }
                    last = Some(network);
                }
                other => {
                    warn!("unknown parser backend {:?} in chain, skipping", other);
                    attempted.push(other.to_string());
                }
            }
        }

        match last {
            Some(mut network) => {
                network.diagnostics.attempted_backends = attempted;
                network
            }
            None => {
                let mut diagnostics = NetworkDiagnostics::degraded(
                    DegradationCode::NetworkError,
                    "no usable backend in chain".to_string(),
                    0,
                    "rust",
                );
                diagnostics.attempted_backends = attempted;
                NetworkFrames::empty(diagnostics)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_player_ids_prefer_platform() {
        assert_eq!(
            stable_player_id("steam", Some("765611"), Some("Alpha")),
            "steam:765611"
        );
        assert_eq!(
            stable_player_id("epic", None, Some("Some Player")),
            "slug:some-player"
        );
        assert_eq!(
            stable_player_id("steam", Some("0"), Some("Zed")),
            "slug:zed"
        );
    }

    #[test]
    fn garbage_bytes_degrade_without_panicking() {
        let adapter = NativeAdapter::new();
        let network = adapter.parse_network(&[0u8; 64]);
        assert_eq!(
            network.diagnostics.status,
            crate::frames::NetworkStatus::Degraded
        );
        assert_eq!(network.diagnostics.frames_emitted, 0);
        assert!(network
            .diagnostics
            .attempted_backends
            .contains(&"boxcars".to_string()));
    }
}
