//! Expected goals. Only SHOT-outcome touches contribute; pass touches never
//! do. The model conditions on distance, angle, pre-touch ball speed,
//! defender coverage and shot context.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{AnalysisContext, AnalyzerOutput};
use crate::constants::{BACK_WALL_Y, GOAL_HALF_WIDTH};
use crate::events::{TouchContext, TouchEvent, TouchOutcome};

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct XgStats {
    pub shots: u32,
    pub total_xg: f64,
    pub xg_per_shot: f64,
    pub goals: u32,
    pub goals_above_expected: f64,
}

/// Per-shot probability model. Clamped into (0, 0.95] so no shot is ever
/// certain.
pub fn shot_xg(ctx: &AnalysisContext, touch: &TouchEvent) -> f64 {
    let goal_y = if touch.team == 0 {
        BACK_WALL_Y
    } else {
        -BACK_WALL_Y
    };
    let dx = touch.location.x;
    let dy = goal_y - touch.location.y;
    let distance = (dx * dx + dy * dy).sqrt();

    // Distance decay, then the opening angle of the goal mouth.
    let base = (-(distance as f64) / 2500.0).exp() * 0.9;
    let angle = (GOAL_HALF_WIDTH as f64 / (distance as f64).max(1.0)).atan();
    let angle_factor = (angle / std::f64::consts::FRAC_PI_4).clamp(0.15, 1.0);

    let speed_uu = touch.ball_speed_kph as f64 / 0.036;
    let speed_factor = (speed_uu / 3000.0).clamp(0.3, 1.0);

    // Defender coverage: opponents between the ball and the goal mouth.
    let defenders = ctx
        .timeline
        .frames
        .get(touch.frame)
        .map(|frame| {
            frame
                .players
                .iter()
                .filter(|p| p.team != touch.team && !p.is_demolished)
                .filter(|p| {
                    let toward = (goal_y - touch.location.y).signum();
                    let between = (p.position.y - touch.location.y).signum() == toward
                        && (p.position.y - goal_y).abs() < (touch.location.y - goal_y).abs();
                    between && (p.position.x - touch.location.x).abs() < 1200.0
                })
                .count()
        })
        .unwrap_or(0);
    let coverage = (1.0 - 0.3 * defenders as f64).max(0.2);

    let context_factor = match touch.context {
        TouchContext::Aerial | TouchContext::Ceiling => 0.85,
        _ => 1.0,
    };

    (base * angle_factor * speed_factor * coverage * context_factor).clamp(0.01, 0.95)
}

pub fn analyze(ctx: &AnalysisContext) -> AnalyzerOutput<XgStats> {
    let mut out = AnalyzerOutput::<XgStats>::default();
    let mut per_player: BTreeMap<String, XgStats> = BTreeMap::new();

    for touch in &ctx.events.touches {
        if touch.outcome != TouchOutcome::Shot {
            continue;
        }
        let xg = shot_xg(ctx, touch);
        let stats = per_player.entry(touch.player_id.clone()).or_default();
        stats.shots += 1;
        stats.total_xg += xg;
    }

    for goal in &ctx.events.goals {
        if let Some(scorer) = &goal.scorer {
            per_player.entry(scorer.clone()).or_default().goals += 1;
        }
    }

    for identity in &ctx.timeline.players {
        let id = &identity.player_id;
        let mut record = per_player.remove(id).unwrap_or_default();
        if record.shots > 0 {
            record.xg_per_shot = record.total_xg / record.shots as f64;
        }
        record.goals_above_expected = record.goals as f64 - record.total_xg;

        let team = if identity.team == 0 {
            &mut out.blue
        } else {
            &mut out.orange
        };
        team.shots += record.shots;
        team.total_xg += record.total_xg;
        team.goals += record.goals;

        out.per_player.insert(id.clone(), record);
    }

    for team in [&mut out.blue, &mut out.orange] {
        if team.shots > 0 {
            team.xg_per_shot = team.total_xg / team.shots as f64;
        }
        team.goals_above_expected = team.goals as f64 - team.total_xg;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventStream;
    use crate::frames::Vec3;
    use crate::header::Header;
    use crate::normalize::{NormalizedTimeline, PlayerIdentity};

    fn shot(t: f64, player: &str, y: f32, outcome: TouchOutcome) -> TouchEvent {
        TouchEvent {
            t,
            frame: 0,
            player_id: player.to_string(),
            team: 0,
            location: Vec3::new(0.0, y, 93.0),
            ball_speed_kph: 90.0,
            context: crate::events::TouchContext::Ground,
            outcome,
        }
    }

    #[test]
    fn only_shot_touches_contribute() {
        let timeline = NormalizedTimeline {
            frames: Vec::new(),
            frame_hz: 30.0,
            duration_s: 60.0,
            players: vec![PlayerIdentity {
                player_id: "a".to_string(),
                display_name: "A".to_string(),
                team: 0,
                platform_ids: Default::default(),
                aliases: vec!["a".to_string()],
                camera: None,
                loadout: None,
                is_bot: false,
            }],
            team_size: 1,
            warnings: Vec::new(),
            kickoff_offset: 0.0,
        };
        let mut events = EventStream::default();
        events.touches = vec![
            shot(1.0, "a", 4000.0, TouchOutcome::Shot),
            shot(2.0, "a", 4000.0, TouchOutcome::Pass),
        ];
        let header = Header::synthetic();
        let ctx = AnalysisContext {
            timeline: &timeline,
            events: &events,
            mechanics: &[],
            header: &header,
        };
        let out = analyze(&ctx);
        let stats = out.per_player.get("a").unwrap();
        assert_eq!(stats.shots, 1);
        assert!(stats.total_xg > 0.0 && stats.total_xg <= 0.95);
    }

    #[test]
    fn closer_shots_are_worth_more() {
        let timeline = NormalizedTimeline {
            frames: Vec::new(),
            frame_hz: 30.0,
            duration_s: 60.0,
            players: Vec::new(),
            team_size: 1,
            warnings: Vec::new(),
            kickoff_offset: 0.0,
        };
        let events = EventStream::default();
        let header = Header::synthetic();
        let ctx = AnalysisContext {
            timeline: &timeline,
            events: &events,
            mechanics: &[],
            header: &header,
        };
        let close = shot_xg(&ctx, &shot(0.0, "a", 4500.0, TouchOutcome::Shot));
        let far = shot_xg(&ctx, &shot(0.0, "a", -3000.0, TouchOutcome::Shot));
        assert!(close > far);
    }
}
