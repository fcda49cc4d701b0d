//! The analyzer set. Every analyzer is a pure function over the immutable
//! `(timeline, events, mechanics)` triple returning a closed typed record;
//! the aggregator fuses them into per-team and per-player blocks by explicit
//! field assignment. Missing input signals produce zero-filled but
//! schema-valid records, never absent keys.

pub mod ball_read;
pub mod boost;
pub mod challenges;
pub mod defense;
pub mod fundamentals;
pub mod heatmaps;
pub mod insights;
pub mod kickoffs;
pub mod mechanics;
pub mod movement;
pub mod passing;
pub mod positioning;
pub mod recovery;
pub mod rotation;
pub mod xg;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::events::EventStream;
use crate::header::Header;
use crate::mechanics::MechanicEvent;
use crate::normalize::NormalizedTimeline;

/// Read-only inputs shared by every analyzer.
pub struct AnalysisContext<'a> {
    pub timeline: &'a NormalizedTimeline,
    pub events: &'a EventStream,
    pub mechanics: &'a [MechanicEvent],
    pub header: &'a Header,
}

impl<'a> AnalysisContext<'a> {
    /// Frame duration used when integrating per-frame time buckets.
    pub fn frame_dt(&self) -> f64 {
        1.0 / self.timeline.frame_hz.max(1.0) as f64
    }
}

/// The analyzer schedule as data. Order is the report's field order; the
/// names feed logging and the quality block.
pub static ANALYZER_SCHEDULE: [&str; 15] = [
    "fundamentals",
    "boost",
    "movement",
    "positioning",
    "passing",
    "challenges",
    "kickoffs",
    "heatmaps",
    "mechanics",
    "recovery",
    "defense",
    "ball_prediction",
    "xg",
    "rotation_compliance",
    "insights",
];

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PlayerAnalysis {
    pub fundamentals: fundamentals::Fundamentals,
    pub boost: boost::BoostStats,
    pub movement: movement::MovementStats,
    pub positioning: positioning::PositioningStats,
    pub passing: passing::PassingStats,
    pub challenges: challenges::ChallengeStats,
    pub kickoffs: kickoffs::KickoffStats,
    pub heatmaps: heatmaps::Heatmaps,
    pub mechanics: mechanics::MechanicStats,
    pub recovery: recovery::RecoveryStats,
    pub defense: defense::DefenseStats,
    pub ball_prediction: ball_read::BallReadStats,
    pub xg: xg::XgStats,
    pub rotation_compliance: rotation::RotationCompliance,
    pub insights: Vec<insights::Insight>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TeamAnalysis {
    pub fundamentals: fundamentals::Fundamentals,
    pub boost: boost::BoostStats,
    pub movement: movement::MovementStats,
    pub positioning: positioning::PositioningStats,
    pub passing: passing::PassingStats,
    pub challenges: challenges::ChallengeStats,
    pub kickoffs: kickoffs::KickoffStats,
    pub heatmaps: heatmaps::Heatmaps,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PerTeam {
    pub blue: TeamAnalysis,
    pub orange: TeamAnalysis,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Analysis {
    pub per_team: PerTeam,
    pub per_player: BTreeMap<String, PlayerAnalysis>,
    pub coaching_insights: Vec<insights::Insight>,
}

/// Runs the full analyzer set and fuses the outputs. Per-player maps are
/// `BTreeMap`s so report ordering is deterministic.
pub fn analyze(ctx: &AnalysisContext) -> Analysis {
    let fundamentals = fundamentals::analyze(ctx);
    let boost = boost::analyze(ctx);
    let movement = movement::analyze(ctx);
    let positioning = positioning::analyze(ctx);
    let passing = passing::analyze(ctx);
    let challenges = challenges::analyze(ctx);
    let kickoffs = kickoffs::analyze(ctx);
    let heatmaps = heatmaps::analyze(ctx);
    let mechanics = mechanics::analyze(ctx);
    let recovery = recovery::analyze(ctx);
    let defense = defense::analyze(ctx);
    let ball_prediction = ball_read::analyze(ctx);
    let xg = xg::analyze(ctx);
    let rotation = rotation::analyze(ctx);

    let mut per_player: BTreeMap<String, PlayerAnalysis> = BTreeMap::new();
    for identity in &ctx.timeline.players {
        let id = identity.player_id.clone();

        fn pick<T: Clone + Default>(map: &BTreeMap<String, T>, id: &str) -> T {
            map.get(id).cloned().unwrap_or_default()
        }

        let mut block = PlayerAnalysis {
            fundamentals: pick(&fundamentals.per_player, &id),
            boost: pick(&boost.per_player, &id),
            movement: pick(&movement.per_player, &id),
            positioning: pick(&positioning.per_player, &id),
            passing: pick(&passing.per_player, &id),
            challenges: pick(&challenges.per_player, &id),
            kickoffs: pick(&kickoffs.per_player, &id),
            heatmaps: pick(&heatmaps.per_player, &id),
            mechanics: pick(&mechanics.per_player, &id),
            recovery: pick(&recovery.per_player, &id),
            defense: pick(&defense.per_player, &id),
            ball_prediction: pick(&ball_prediction.per_player, &id),
            xg: pick(&xg.per_player, &id),
            rotation_compliance: pick(&rotation.per_player, &id),
            insights: Vec::new(),
        };
        block.insights = insights::player_insights(&block, identity);
        per_player.insert(id, block);
    }

    let per_team = PerTeam {
        blue: TeamAnalysis {
            fundamentals: fundamentals.blue,
            boost: boost.blue,
            movement: movement.blue,
            positioning: positioning.blue,
            passing: passing.blue,
            challenges: challenges.blue,
            kickoffs: kickoffs.blue,
            heatmaps: heatmaps.blue,
        },
        orange: TeamAnalysis {
            fundamentals: fundamentals.orange,
            boost: boost.orange,
            movement: movement.orange,
            positioning: positioning.orange,
            passing: passing.orange,
            challenges: challenges.orange,
            kickoffs: kickoffs.orange,
            heatmaps: heatmaps.orange,
        },
    };

    let coaching_insights = insights::team_insights(ctx, &per_team, &per_player);
    Analysis {
        per_team,
        per_player,
        coaching_insights,
    }
}

/// Standard analyzer output shape: one record per team plus one per player.
#[derive(Debug, Clone, Default)]
pub struct AnalyzerOutput<T> {
    pub blue: T,
    pub orange: T,
    pub per_player: BTreeMap<String, T>,
}
