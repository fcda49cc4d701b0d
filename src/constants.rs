//! Archetype names, replicated-attribute keys, arena geometry and detector
//! thresholds. Actor classification happens by exact lookup against these
//! names, never by substring matching.

pub static BALL_TYPES: [&str; 5] = [
    "Archetypes.Ball.Ball_Default",
    "Archetypes.Ball.Ball_Basketball",
    "Archetypes.Ball.Ball_Puck",
    "Archetypes.Ball.CubeBall",
    "Archetypes.Ball.Ball_Breakout",
];

pub static BOOST_TYPE: &str = "Archetypes.CarComponents.CarComponent_Boost";
pub static CAR_TYPE: &str = "Archetypes.Car.Car_Default";
pub static DODGE_TYPE: &str = "Archetypes.CarComponents.CarComponent_Dodge";
pub static DOUBLE_JUMP_TYPE: &str = "Archetypes.CarComponents.CarComponent_DoubleJump";
pub static GAME_TYPE: &str = "Archetypes.GameEvent.GameEvent_Soccar";
pub static JUMP_TYPE: &str = "Archetypes.CarComponents.CarComponent_Jump";
pub static PLAYER_REPLICATION_KEY: &str = "Engine.Pawn:PlayerReplicationInfo";
pub static PLAYER_TYPE: &str = "TAGame.Default__PRI_TA";
pub static PAD_TYPE: &str = "TheWorld:PersistentLevel.VehiclePickup_Boost_TA";
pub static TEAM0_TYPE: &str = "Archetypes.Teams.Team0";
pub static TEAM1_TYPE: &str = "Archetypes.Teams.Team1";

pub static BOOST_AMOUNT_KEY: &str = "TAGame.CarComponent_Boost_TA:ReplicatedBoostAmount";
pub static BOOST_REPLICATED_KEY: &str = "TAGame.CarComponent_Boost_TA:ReplicatedBoost";
pub static COMPONENT_ACTIVE_KEY: &str = "TAGame.CarComponent_TA:ReplicatedActive";
pub static DEMOLISH_FX_KEY: &str = "TAGame.Car_TA:ReplicatedDemolishGoalExplosion";
pub static DEMOLISH_KEY: &str = "TAGame.Car_TA:ReplicatedDemolish";
pub static PICKUP_KEY: &str = "TAGame.VehiclePickup_TA:ReplicatedPickupData";
pub static PICKUP_NEW_KEY: &str = "TAGame.VehiclePickup_TA:NewReplicatedPickupData";
pub static PLAYER_NAME_KEY: &str = "Engine.PlayerReplicationInfo:PlayerName";
pub static RIGID_BODY_STATE_KEY: &str = "TAGame.RBActor_TA:ReplicatedRBState";
pub static TEAM_KEY: &str = "Engine.PlayerReplicationInfo:Team";
pub static UNIQUE_ID_KEY: &str = "Engine.PlayerReplicationInfo:UniqueId";
pub static VEHICLE_KEY: &str = "TAGame.CarComponent_TA:Vehicle";
pub static CAMERA_SETTINGS_KEY: &str = "TAGame.CameraSettingsActor_TA:ProfileSettings";
pub static CAMERA_PRI_KEY: &str = "TAGame.CameraSettingsActor_TA:PRI";
pub static LOADOUT_KEY: &str = "TAGame.PRI_TA:ClientLoadout";

pub static EMPTY_ACTOR_IDS: [boxcars::ActorId; 0] = [];

/// Active-boost drain rate between replicated byte updates, in boost units
/// per second.
pub static BOOST_USED_PER_SECOND: f32 = 80.0 / 0.93;

// Arena geometry (unreal units). Right-handed, +y toward the orange goal.

pub const SIDE_WALL_X: f32 = 4096.0;
pub const BACK_WALL_Y: f32 = 5120.0;
pub const CEILING_Z: f32 = 2044.0;
pub const GOAL_Z: f32 = 642.775;
pub const GOAL_HALF_WIDTH: f32 = 892.755;

/// File size bounds accepted by ingest, inclusive.
pub const MIN_REPLAY_SIZE: u64 = 10 * 1024;
pub const MAX_REPLAY_SIZE: u64 = 50 * 1024 * 1024;

/// uu/s → kph. 1 uu = 1 cm, so 100 uu/s = 3.6 kph.
pub const UU_PER_SEC_TO_KPH: f32 = 0.036;

// Event detector thresholds (tuned for ~30 Hz sampling).

pub const BALL_CONTACT_PROXIMITY: f32 = 200.0;
pub const TOUCH_DEBOUNCE: f64 = 0.1;
pub const CHALLENGE_RADIUS: f32 = 300.0;
pub const CHALLENGE_WINDOW: f64 = 0.3;
pub const GOAL_SHOT_SCAN_WINDOW: f64 = 1.0;
pub const GOAL_SHOT_MIN_SPEED: f32 = 500.0;
pub const ASSIST_WINDOW: f64 = 5.0;
pub const PASS_WINDOW: f64 = 2.0;
pub const PASS_MIN_PROGRESS: f32 = 80.0;

// Movement speed buckets (uu/s).

pub const SLOW_SPEED: f32 = 1400.0;
pub const SUPERSONIC_SPEED: f32 = 2200.0;
pub const LOW_AIR_Z: f32 = 300.0;
pub const GROUNDED_Z: f32 = 50.0;

/// Sample-rate floor below which timing-sensitive detectors lose their
/// bucket tolerances and the report carries `low_frame_rate_sampling`.
pub const LOW_FRAME_RATE_HZ: f32 = 20.0;

/// Out-of-bounds sample ratio beyond which a parse degrades.
pub const MAX_OOB_RATIO: f64 = 0.05;

/// Pad snap radii used when resolving pad actors against [`STANDARD_PADS`].
pub const SMALL_PAD_SNAP_RADIUS: f32 = 128.0;
pub const BIG_PAD_SNAP_RADIUS: f32 = 160.0;

pub const SMALL_PAD_BOOST: f32 = 12.0;
pub const BIG_PAD_BOOST: f32 = 100.0;

/// Standard-arena boost pad metadata: `(x, y, z, is_big)`. Six big pads plus
/// 28 small pads; pad ids are indices into this table.
pub static STANDARD_PADS: [(f32, f32, f32, bool); 34] = [
    (-3072.0, -4096.0, 73.0, true),
    (3072.0, -4096.0, 73.0, true),
    (-3584.0, 0.0, 73.0, true),
    (3584.0, 0.0, 73.0, true),
    (-3072.0, 4096.0, 73.0, true),
    (3072.0, 4096.0, 73.0, true),
    (0.0, -4240.0, 70.0, false),
    (-1792.0, -4184.0, 70.0, false),
    (1792.0, -4184.0, 70.0, false),
    (-940.0, -3308.0, 70.0, false),
    (940.0, -3308.0, 70.0, false),
    (0.0, -2816.0, 70.0, false),
    (-3584.0, -2484.0, 70.0, false),
    (3584.0, -2484.0, 70.0, false),
    (-1788.0, -2300.0, 70.0, false),
    (1788.0, -2300.0, 70.0, false),
    (-2048.0, -1036.0, 70.0, false),
    (0.0, -1024.0, 70.0, false),
    (2048.0, -1036.0, 70.0, false),
    (-1024.0, 0.0, 70.0, false),
    (1024.0, 0.0, 70.0, false),
    (-2048.0, 1036.0, 70.0, false),
    (0.0, 1024.0, 70.0, false),
    (2048.0, 1036.0, 70.0, false),
    (-1788.0, 2300.0, 70.0, false),
    (1788.0, 2300.0, 70.0, false),
    (-3584.0, 2484.0, 70.0, false),
    (3584.0, 2484.0, 70.0, false),
    (-940.0, 3308.0, 70.0, false),
    (940.0, 3308.0, 70.0, false),
    (0.0, 2816.0, 70.0, false),
    (-1792.0, 4184.0, 70.0, false),
    (1792.0, 4184.0, 70.0, false),
    (0.0, 4240.0, 70.0, false),
];

/// Blue-team kickoff spawn slots `(x, y)`; orange slots are the y-mirror.
pub static KICKOFF_SPAWNS_BLUE: [(f32, f32); 5] = [
    (-2048.0, -2560.0),
    (2048.0, -2560.0),
    (-256.0, -3840.0),
    (256.0, -3840.0),
    (0.0, -4608.0),
];

pub const KICKOFF_SPAWN_TOLERANCE: f32 = 150.0;
pub const KICKOFF_BALL_TOLERANCE: f32 = 60.0;

// Mechanic detector thresholds (bucket-based for 30 Hz sampling).

pub const JUMP_IMPULSE_DV: f32 = 250.0;
pub const JUMP_COOLDOWN: f64 = 0.1;
pub const FLIP_ANGVEL_STEP: f32 = 2.0;
pub const FLIP_CANCEL_WINDOW: f64 = 0.25;
pub const HALF_FLIP_WINDOW: f64 = 0.6;
pub const SPEEDFLIP_CANCEL_WINDOW: f64 = 0.10;
pub const SPEEDFLIP_MIN_ACCEL: f32 = 500.0;
pub const WAVEDASH_MIN_LAND_DELAY: f64 = 0.05;
pub const WAVEDASH_MAX_LAND_DELAY: f64 = 0.125;
pub const WAVEDASH_MIN_SPEED_GAIN: f32 = 100.0;
pub const AERIAL_MIN_HEIGHT: f32 = 300.0;
pub const AERIAL_MIN_DURATION: f64 = 0.5;
pub const AERIAL_DEDUPE_WINDOW: f64 = 1.0;
pub const FAST_AERIAL_SECOND_JUMP_WINDOW: f64 = 0.5;
pub const FAST_AERIAL_HEIGHT_WINDOW: f64 = 1.0;
pub const FLIP_RESET_DOT: f32 = -0.7;
pub const FLIP_RESET_DISTANCE: f32 = 120.0;
pub const FLIP_RESET_USE_WINDOW: f64 = 2.0;
pub const AIR_ROLL_MIN_RATE: f32 = 2.0;
pub const AIR_ROLL_MIN_DURATION: f64 = 0.3;
pub const AIR_ROLL_POST_FLIP_BLACKOUT: f64 = 0.2;
pub const DRIBBLE_MIN_Z: f32 = 90.0;
pub const DRIBBLE_MAX_Z: f32 = 180.0;
pub const DRIBBLE_OVAL_X: f32 = 80.0;
pub const DRIBBLE_OVAL_Y: f32 = 120.0;
pub const DRIBBLE_MAX_REL_SPEED: f32 = 300.0;
pub const DRIBBLE_MIN_DURATION: f64 = 0.5;
pub const FLICK_WINDOW: f64 = 0.3;
pub const FLICK_MIN_SPEED_GAIN: f32 = 500.0;
pub const CEILING_CONTACT_Z: f32 = 2040.0;
pub const CEILING_MIN_CONTACT_FRAMES: u32 = 2;
pub const POWER_SLIDE_MIN_LATERAL: f32 = 500.0;
pub const POWER_SLIDE_MIN_DURATION: f64 = 0.2;
pub const GROUND_PINCH_MAX_BALL_Z: f32 = 100.0;
pub const GROUND_PINCH_MIN_SPEED: f32 = 3000.0;
pub const GROUND_PINCH_MIN_DELTA: f32 = 1500.0;
pub const DOUBLE_TOUCH_WINDOW: f64 = 3.0;
pub const DOUBLE_TOUCH_WALL_MARGIN: f32 = 200.0;
pub const REDIRECT_MIN_ANGLE_DEG: f32 = 45.0;
pub const REDIRECT_MIN_SPEED: f32 = 500.0;
pub const STALL_MIN_ROLL_RATE: f32 = 3.0;
pub const STALL_MIN_YAW_RATE: f32 = 2.0;
pub const STALL_MAX_VZ: f32 = 100.0;
pub const STALL_MAX_VXY: f32 = 500.0;
pub const STALL_MIN_DURATION: f64 = 0.15;
pub const PSYCHO_SKIM_WINDOW: f64 = 3.0;

// Ball prediction (simple physics sampling).

pub const BALL_GRAVITY: f32 = 650.0;
pub const BALL_BOUNCE_RESTITUTION: f32 = 0.6;
pub const BALL_RADIUS: f32 = 91.25;
