//! Kickoff segmentation and classification. A kickoff begins on the rising
//! edge of the kickoff pose; each participant gets a role from their spawn
//! slot and an approach type from their motion and mechanic invocations over
//! the first ~3 seconds.

use super::{
    GoalEvent, KickoffApproach, KickoffEvent, KickoffOutcome, KickoffParticipant, KickoffRole,
    TouchEvent,
};
use crate::frames::PlayerFrame;
use crate::mechanics::{FlipDirection, MechanicEvent, MechanicKind};
use crate::normalize::{kickoff_pose, NormalizedTimeline};

/// Classification window after the kickoff starts.
const APPROACH_WINDOW: f64 = 3.0;
/// A goal this soon after the kickoff is attributed to it.
const GOAL_WINDOW: f64 = 10.0;
/// Movement below this displacement reads as stationary.
const STATIONARY_DISTANCE: f32 = 300.0;

pub fn detect(
    timeline: &NormalizedTimeline,
    touches: &[TouchEvent],
    goals: &[GoalEvent],
    mechanics: &[MechanicEvent],
) -> Vec<KickoffEvent> {
    let frames = &timeline.frames;
    let mut kickoffs = Vec::new();

    for index in 0..frames.len() {
        let is_pose = kickoff_pose(&frames[index]);
        let was_pose = index > 0 && kickoff_pose(&frames[index - 1]);
        if !is_pose || was_pose {
            continue;
        }
        let t0 = frames[index].timestamp;
        let window_end = t0 + GOAL_WINDOW;

        let participants = frames[index]
            .players
            .iter()
            .map(|player| {
                let role = classify_role(&frames[index].players, player);
                let approach =
                    classify_approach(timeline, index, &player.player_id, mechanics);
                let first_touch = touches
                    .iter()
                    .find(|touch| {
                        touch.player_id == player.player_id
                            && touch.t >= t0
                            && touch.t <= window_end
                    })
                    .map(|touch| touch.t - t0);
                KickoffParticipant {
                    player_id: player.player_id.clone(),
                    team: player.team,
                    role,
                    approach_type: approach,
                    time_to_first_touch: first_touch,
                }
            })
            .collect();

        let first_touch = touches.iter().find(|touch| touch.t >= t0);
        kickoffs.push(KickoffEvent {
            t: t0,
            frame: index,
            outcome: classify_outcome(t0, first_touch, touches, goals),
            first_touch_player: first_touch.map(|touch| touch.player_id.clone()),
            participants,
        });
    }
    kickoffs
}

/// Roles from spawn geometry: nearest to the ball goes, farthest back stays,
/// wide cars are wings, the rest cheat up behind the go.
fn classify_role(players: &[PlayerFrame], player: &PlayerFrame) -> KickoffRole {
    let teammates: Vec<&PlayerFrame> =
        players.iter().filter(|p| p.team == player.team).collect();
    let distance = |p: &PlayerFrame| p.position.xy_length();
    let mine = distance(player);

    let closest = teammates
        .iter()
        .map(|p| distance(p))
        .fold(f32::INFINITY, f32::min);
    let farthest = teammates
        .iter()
        .map(|p| distance(p))
        .fold(0.0f32, f32::max);

    if (mine - closest).abs() < 1.0 {
        KickoffRole::Go
    } else if teammates.len() > 1 && (mine - farthest).abs() < 1.0 {
        KickoffRole::Back
    } else if player.position.x.abs() >= 1000.0 {
        KickoffRole::Wing
    } else {
        KickoffRole::Cheat
    }
}

fn classify_approach(
    timeline: &NormalizedTimeline,
    kickoff_index: usize,
    player_id: &str,
    mechanics: &[MechanicEvent],
) -> KickoffApproach {
    let frames = &timeline.frames;
    let t0 = frames[kickoff_index].timestamp;
    let start = frames[kickoff_index]
        .players
        .iter()
        .find(|p| p.player_id == player_id);
    let Some(start) = start else {
        return KickoffApproach::Unknown;
    };

    let window: Vec<&PlayerFrame> = frames[kickoff_index..]
        .iter()
        .take_while(|f| f.timestamp - t0 <= APPROACH_WINDOW)
        .filter_map(|f| f.players.iter().find(|p| p.player_id == player_id))
        .collect();
    if window.len() < 2 {
        return KickoffApproach::Unknown;
    }

    let in_window = |kind: MechanicKind| {
        mechanics.iter().find(|m| {
            m.player_id == player_id && m.kind == kind && m.t >= t0 && m.t - t0 <= APPROACH_WINDOW
        })
    };

    // Mechanic-backed classifications first.
    if in_window(MechanicKind::Speedflip).is_some() {
        return KickoffApproach::Speedflip;
    }
    if in_window(MechanicKind::HalfFlip).is_some() {
        return KickoffApproach::FakeHalfflip;
    }

    let displacement = |p: &PlayerFrame| p.position.distance(start.position);
    let max_displacement = window.iter().map(|p| displacement(p)).fold(0.0f32, f32::max);
    if max_displacement < STATIONARY_DISTANCE {
        return KickoffApproach::FakeStationary;
    }

    // Time until the car first left its spawn.
    let depart_t = frames[kickoff_index..]
        .iter()
        .take_while(|f| f.timestamp - t0 <= APPROACH_WINDOW)
        .find_map(|f| {
            f.players
                .iter()
                .find(|p| p.player_id == player_id && displacement(p) > STATIONARY_DISTANCE)
                .map(|_| f.timestamp - t0)
        })
        .unwrap_or(APPROACH_WINDOW);
    if depart_t > 1.0 {
        return KickoffApproach::Delay;
    }

    // An approach that stalls out short of the ball reads as a fake.
    let closest_to_ball = window
        .iter()
        .map(|p| p.position.xy_length())
        .fold(f32::INFINITY, f32::min);
    let final_speed = window.last().map(|p| p.velocity.length()).unwrap_or(0.0);
    if closest_to_ball > 1500.0 && final_speed < 400.0 {
        return KickoffApproach::FakeAggressive;
    }

    if in_window(MechanicKind::Wavedash).is_some() {
        return KickoffApproach::StandardWavedash;
    }
    if let Some(flip) = in_window(MechanicKind::Flip) {
        return match flip.direction {
            Some(FlipDirection::Forward) => KickoffApproach::StandardFrontflip,
            Some(FlipDirection::DiagonalLeft) | Some(FlipDirection::DiagonalRight) => {
                KickoffApproach::StandardDiagonal
            }
            _ => KickoffApproach::Standard,
        };
    }

    // Lateral drift without a flip marks the diagonal line.
    let lateral = window
        .iter()
        .map(|p| (p.position.x - start.position.x).abs())
        .fold(0.0f32, f32::max);
    if lateral > 600.0 {
        return KickoffApproach::StandardDiagonal;
    }

    // Boost spent without a single jump marks the boost-only line.
    let boost_spent = start.boost_amount
        - window
            .last()
            .map(|p| p.boost_amount)
            .unwrap_or(start.boost_amount);
    let jumped = in_window(MechanicKind::Jump).is_some();
    if boost_spent > 10.0 && !jumped {
        return KickoffApproach::StandardBoost;
    }

    KickoffApproach::Standard
}

fn classify_outcome(
    t0: f64,
    first_touch: Option<&TouchEvent>,
    touches: &[TouchEvent],
    goals: &[GoalEvent],
) -> KickoffOutcome {
    if let Some(goal) = goals
        .iter()
        .find(|goal| goal.t >= t0 && goal.t - t0 <= GOAL_WINDOW)
    {
        return if goal.team == 0 {
            KickoffOutcome::GoalFor
        } else {
            KickoffOutcome::GoalAgainst
        };
    }

    let Some(first) = first_touch else {
        return KickoffOutcome::Neutral;
    };
    // A near-simultaneous opposing touch neutralizes possession.
    let contested = touches.iter().any(|touch| {
        touch.team != first.team && touch.t >= first.t && touch.t - first.t < 0.5
    });
    if contested {
        KickoffOutcome::Neutral
    } else if first.team == 0 {
        KickoffOutcome::FirstPossessionBlue
    } else {
        KickoffOutcome::FirstPossessionOrange
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::{BallState, Quat, RawFrame, Vec3};

    fn player(id: &str, team: u8, position: Vec3) -> PlayerFrame {
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

    fn kickoff_frame(t: f64, players: Vec<PlayerFrame>) -> RawFrame {
        RawFrame {
            timestamp: t,
            ball: BallState::default(),
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

    #[test]
    fn stationary_players_read_as_fake_stationary() {
        let blue = player("a", 0, Vec3::new(0.0, -4608.0, 17.0));
        let orange = player("b", 1, Vec3::new(0.0, 4608.0, 17.0));
        let frames = vec![
            kickoff_frame(0.0, vec![blue.clone(), orange.clone()]),
            kickoff_frame(1.0, vec![blue.clone(), orange.clone()]),
            kickoff_frame(2.0, vec![blue, orange]),
        ];
        let kickoffs = detect(&timeline_of(frames), &[], &[], &[]);
        assert_eq!(kickoffs.len(), 1);
        assert_eq!(kickoffs[0].t, 0.0);
        assert_eq!(kickoffs[0].participants.len(), 2);
        for participant in &kickoffs[0].participants {
            assert_eq!(participant.role, KickoffRole::Go);
            assert_eq!(participant.approach_type, KickoffApproach::FakeStationary);
        }
        assert_eq!(kickoffs[0].outcome, KickoffOutcome::Neutral);
    }

    #[test]
    fn roles_rank_by_spawn_geometry() {
        let players = vec![
            player("go", 0, Vec3::new(-2048.0, -2560.0, 17.0)),
            player("cheat", 0, Vec3::new(256.0, -3840.0, 17.0)),
            player("back", 0, Vec3::new(0.0, -4608.0, 17.0)),
        ];
        assert_eq!(classify_role(&players, &players[0]), KickoffRole::Go);
        assert_eq!(classify_role(&players, &players[1]), KickoffRole::Cheat);
        assert_eq!(classify_role(&players, &players[2]), KickoffRole::Back);
    }

    #[test]
    fn early_goal_decides_outcome() {
        let goal = GoalEvent {
            t: 6.0,
            frame: None,
            scorer: None,
            team: 0,
            assist: None,
            shot_speed_kph: 60.0,
            distance_uu: 500.0,
            on_target: true,
        };
        assert_eq!(
            classify_outcome(0.0, None, &[], &[goal]),
            KickoffOutcome::GoalFor
        );
    }
}
