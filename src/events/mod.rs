//! Discrete game events derived from the canonical timeline. Each detector
//! is independent and reads the timeline once; the assembled timeline is
//! ordered by `(t, kind priority, insertion index)`.

pub mod boost;
pub mod challenges;
pub mod demos;
pub mod goals;
pub mod kickoffs;
pub mod touches;

use serde::Serialize;

use crate::frames::{PadSide, PadSize, Vec3};
use crate::header::Header;
use crate::frames::NetworkFrames;
use crate::mechanics::MechanicEvent;
use crate::normalize::NormalizedTimeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TouchContext {
    #[serde(rename = "GROUND")]
    Ground,
    #[serde(rename = "AERIAL")]
    Aerial,
    #[serde(rename = "WALL")]
    Wall,
    #[serde(rename = "CEILING")]
    Ceiling,
    #[serde(rename = "HALF_VOLLEY")]
    HalfVolley,
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TouchOutcome {
    #[serde(rename = "SHOT")]
    Shot,
    #[serde(rename = "CLEAR")]
    Clear,
    #[serde(rename = "PASS")]
    Pass,
    #[serde(rename = "DRIBBLE")]
    Dribble,
    #[serde(rename = "50")]
    Fifty,
    #[serde(rename = "NEUTRAL")]
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum KickoffRole {
    #[serde(rename = "GO")]
    Go,
    #[serde(rename = "CHEAT")]
    Cheat,
    #[serde(rename = "WING")]
    Wing,
    #[serde(rename = "BACK")]
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum KickoffApproach {
    #[serde(rename = "STANDARD")]
    Standard,
    #[serde(rename = "SPEEDFLIP")]
    Speedflip,
    #[serde(rename = "STANDARD_FRONTFLIP")]
    StandardFrontflip,
    #[serde(rename = "STANDARD_DIAGONAL")]
    StandardDiagonal,
    #[serde(rename = "STANDARD_WAVEDASH")]
    StandardWavedash,
    #[serde(rename = "STANDARD_BOOST")]
    StandardBoost,
    #[serde(rename = "FAKE_STATIONARY")]
    FakeStationary,
    #[serde(rename = "FAKE_AGGRESSIVE")]
    FakeAggressive,
    #[serde(rename = "FAKE_HALFFLIP")]
    FakeHalfflip,
    #[serde(rename = "DELAY")]
    Delay,
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl KickoffApproach {
    pub fn as_str(&self) -> &'static str {
        match self {
            KickoffApproach::Standard => "STANDARD",
            KickoffApproach::Speedflip => "SPEEDFLIP",
            KickoffApproach::StandardFrontflip => "STANDARD_FRONTFLIP",
            KickoffApproach::StandardDiagonal => "STANDARD_DIAGONAL",
            KickoffApproach::StandardWavedash => "STANDARD_WAVEDASH",
            KickoffApproach::StandardBoost => "STANDARD_BOOST",
            KickoffApproach::FakeStationary => "FAKE_STATIONARY",
            KickoffApproach::FakeAggressive => "FAKE_AGGRESSIVE",
            KickoffApproach::FakeHalfflip => "FAKE_HALFFLIP",
            KickoffApproach::Delay => "DELAY",
            KickoffApproach::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum KickoffOutcome {
    #[serde(rename = "FIRST_POSSESSION_BLUE")]
    FirstPossessionBlue,
    #[serde(rename = "FIRST_POSSESSION_ORANGE")]
    FirstPossessionOrange,
    #[serde(rename = "NEUTRAL")]
    Neutral,
    #[serde(rename = "GOAL_FOR")]
    GoalFor,
    #[serde(rename = "GOAL_AGAINST")]
    GoalAgainst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChallengeOutcome {
    #[serde(rename = "WIN")]
    Win,
    #[serde(rename = "LOSS")]
    Loss,
    #[serde(rename = "NEUTRAL")]
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalEvent {
    pub t: f64,
    pub frame: Option<usize>,
    pub scorer: Option<String>,
    pub team: u8,
    pub assist: Option<String>,
    pub shot_speed_kph: f32,
    pub distance_uu: f32,
    pub on_target: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TouchEvent {
    pub t: f64,
    pub frame: usize,
    pub player_id: String,
    pub team: u8,
    pub location: Vec3,
    pub ball_speed_kph: f32,
    pub context: TouchContext,
    pub outcome: TouchOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemoEvent {
    pub t: f64,
    pub frame: Option<usize>,
    pub attacker_id: Option<String>,
    pub victim_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KickoffParticipant {
    pub player_id: String,
    pub team: u8,
    pub role: KickoffRole,
    pub approach_type: KickoffApproach,
    pub time_to_first_touch: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KickoffEvent {
    pub t: f64,
    pub frame: usize,
    /// Blue-perspective outcome; team analyzers mirror it for orange.
    pub outcome: KickoffOutcome,
    pub first_touch_player: Option<String>,
    pub participants: Vec<KickoffParticipant>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoostPickupEvent {
    pub t: f64,
    pub frame: usize,
    pub player_id: String,
    pub team: u8,
    pub pad_id: usize,
    pub size: PadSize,
    pub side: PadSide,
    pub stolen: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChallengeRisk {
    pub player_id: String,
    pub risk_index: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChallengeEvent {
    pub t: f64,
    pub frame: usize,
    pub blue_player: String,
    pub orange_player: String,
    pub winner_team: Option<u8>,
    /// Signed y of the contested ball; positive is the orange half.
    pub depth_y: f32,
    pub risks: Vec<ChallengeRisk>,
}

impl ChallengeEvent {
    pub fn outcome_for_team(&self, team: u8) -> ChallengeOutcome {
        match self.winner_team {
            Some(winner) if winner == team => ChallengeOutcome::Win,
            Some(_) => ChallengeOutcome::Loss,
            None => ChallengeOutcome::Neutral,
        }
    }
}

/// Flattened row for the report's ordered timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEvent {
    pub t: f64,
    pub kind: String,
    pub player_id: Option<String>,
    pub team: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct EventStream {
    pub timeline: Vec<TimelineEvent>,
    pub goals: Vec<GoalEvent>,
    pub demos: Vec<DemoEvent>,
    pub kickoffs: Vec<KickoffEvent>,
    pub boost_pickups: Vec<BoostPickupEvent>,
    pub touches: Vec<TouchEvent>,
    pub challenges: Vec<ChallengeEvent>,
}

/// Tie-break priority: GOAL > SAVE > DEMO > TOUCH > BOOST_PICKUP >
/// CHALLENGE > KICKOFF. The SAVE slot is reserved for save-classified rows.
fn kind_priority(kind: &str) -> u8 {
    match kind {
        "GOAL" => 0,
        "SAVE" => 1,
        "DEMO" => 2,
        "TOUCH" => 3,
        "BOOST_PICKUP" => 4,
        "CHALLENGE" => 5,
        "KICKOFF" => 6,
        _ => 7,
    }
}

/// Runs all six detectors and assembles the ordered timeline. Mechanics are
/// an input because kickoff approach classification consumes them.
pub fn detect(
    timeline: &NormalizedTimeline,
    header: &Header,
    network: &NetworkFrames,
    mechanics: &[MechanicEvent],
) -> EventStream {
    let mut stream = EventStream::default();
    stream.touches = touches::detect(timeline);
    stream.goals = goals::detect(timeline, header, &stream.touches);
    stream.demos = demos::detect(timeline, network);
    stream.boost_pickups = boost::detect(timeline, network);
    stream.challenges = challenges::detect(timeline, &stream.touches);
    stream.kickoffs = kickoffs::detect(timeline, &stream.touches, &stream.goals, mechanics);
    assemble_timeline(&mut stream);
    stream
}

fn assemble_timeline(stream: &mut EventStream) {
    let mut rows: Vec<TimelineEvent> = Vec::new();
    for goal in &stream.goals {
        rows.push(TimelineEvent {
            t: goal.t,
            kind: "GOAL".to_string(),
            player_id: goal.scorer.clone(),
            team: Some(goal.team),
        });
    }
    for demo in &stream.demos {
        rows.push(TimelineEvent {
            t: demo.t,
            kind: "DEMO".to_string(),
            player_id: Some(demo.victim_id.clone()),
            team: None,
        });
    }
    for touch in &stream.touches {
        rows.push(TimelineEvent {
            t: touch.t,
            kind: "TOUCH".to_string(),
            player_id: Some(touch.player_id.clone()),
            team: Some(touch.team),
        });
    }
    for pickup in &stream.boost_pickups {
        rows.push(TimelineEvent {
            t: pickup.t,
            kind: "BOOST_PICKUP".to_string(),
            player_id: Some(pickup.player_id.clone()),
            team: Some(pickup.team),
        });
    }
    for challenge in &stream.challenges {
        rows.push(TimelineEvent {
            t: challenge.t,
            kind: "CHALLENGE".to_string(),
            player_id: Some(challenge.blue_player.clone()),
            team: None,
        });
    }
    for kickoff in &stream.kickoffs {
        rows.push(TimelineEvent {
            t: kickoff.t,
            kind: "KICKOFF".to_string(),
            player_id: kickoff.first_touch_player.clone(),
            team: None,
        });
    }
    // Stable sort keeps insertion order as the final tie-break.
    rows.sort_by(|a, b| {
        a.t.partial_cmp(&b.t)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| kind_priority(&a.kind).cmp(&kind_priority(&b.kind)))
    });
    stream.timeline = rows;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeline_orders_by_time_then_priority() {
        let mut stream = EventStream::default();
        stream.kickoffs.push(KickoffEvent {
            t: 0.0,
            frame: 0,
            outcome: KickoffOutcome::Neutral,
            first_touch_player: None,
            participants: Vec::new(),
        });
        stream.goals.push(GoalEvent {
            t: 0.0,
            frame: Some(0),
            scorer: None,
            team: 0,
            assist: None,
            shot_speed_kph: 0.0,
            distance_uu: 0.0,
            on_target: true,
        });
        stream.touches.push(TouchEvent {
            t: 0.0,
            frame: 0,
            player_id: "a".to_string(),
            team: 0,
            location: Vec3::default(),
            ball_speed_kph: 0.0,
            context: TouchContext::Ground,
            outcome: TouchOutcome::Neutral,
        });
        assemble_timeline(&mut stream);
        let kinds: Vec<&str> = stream.timeline.iter().map(|e| e.kind.as_str()).collect();
        assert_eq!(kinds, vec!["GOAL", "TOUCH", "KICKOFF"]);
    }
}
