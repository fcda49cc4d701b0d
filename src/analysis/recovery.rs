//! Landing recovery quality: per landing, how long the car was airborne, how
//! fast it regained control, and how much momentum survived the landing.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{AnalysisContext, AnalyzerOutput};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecoveryQuality {
    #[serde(rename = "EXCELLENT")]
    Excellent,
    #[serde(rename = "GOOD")]
    Good,
    #[serde(rename = "AVERAGE")]
    Average,
    #[serde(rename = "POOR")]
    Poor,
    #[serde(rename = "FAILED")]
    Failed,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RecoveryStats {
    pub landings: u32,
    pub excellent: u32,
    pub good: u32,
    pub average: u32,
    pub poor: u32,
    pub failed: u32,
    pub avg_time_to_control_s: f64,
    /// Capped at 100 in the aggregate.
    pub avg_momentum_retained_pct: f64,
}

/// Airborne stretches shorter than this are hops, not recoveries.
const MIN_AIR_TIME: f64 = 0.5;
/// Control is regained when frame-over-frame speed change settles.
const CONTROL_ACCEL: f32 = 120.0;
const CONTROL_SCAN_S: f64 = 2.0;

fn classify(momentum_pct: f64, time_to_control: f64) -> RecoveryQuality {
    if momentum_pct >= 90.0 && time_to_control <= 0.2 {
        RecoveryQuality::Excellent
    } else if momentum_pct >= 70.0 && time_to_control <= 0.5 {
        RecoveryQuality::Good
    } else if momentum_pct >= 50.0 {
        RecoveryQuality::Average
    } else if momentum_pct >= 25.0 {
        RecoveryQuality::Poor
    } else {
        RecoveryQuality::Failed
    }
}

#[derive(Default)]
struct Accumulator {
    stats: RecoveryStats,
    control_sum: f64,
    momentum_sum: f64,
}

pub fn analyze(ctx: &AnalysisContext) -> AnalyzerOutput<RecoveryStats> {
    let mut out = AnalyzerOutput::<RecoveryStats>::default();
    let frames = &ctx.timeline.frames;
    let mut accumulators: BTreeMap<String, Accumulator> = BTreeMap::new();

    // Airborne-start time and pre-landing speed per player.
    let mut airborne_since: BTreeMap<String, (f64, f32)> = BTreeMap::new();

    for index in 0..frames.len() {
        let frame = &frames[index];
        for player in &frame.players {
            let id = &player.player_id;
            if !player.is_on_ground {
                let entry = airborne_since
                    .entry(id.clone())
                    .or_insert((frame.timestamp, 0.0));
                entry.1 = player.velocity.length();
                continue;
            }
            let Some((air_start, pre_speed)) = airborne_since.remove(id) else {
                continue;
            };
            let air_time = frame.timestamp - air_start;
            if air_time < MIN_AIR_TIME {
                continue;
            }

            let landing_speed = player.velocity.length();
            let momentum_pct = if pre_speed > 1.0 {
                (landing_speed / pre_speed * 100.0).min(100.0) as f64
            } else {
                100.0
            };
            let time_to_control = time_to_control(ctx, index, id, frame.timestamp);

            let acc = accumulators.entry(id.clone()).or_default();
            acc.stats.landings += 1;
            match classify(momentum_pct, time_to_control) {
                RecoveryQuality::Excellent => acc.stats.excellent += 1,
                RecoveryQuality::Good => acc.stats.good += 1,
                RecoveryQuality::Average => acc.stats.average += 1,
                RecoveryQuality::Poor => acc.stats.poor += 1,
                RecoveryQuality::Failed => acc.stats.failed += 1,
            }
            acc.control_sum += time_to_control;
            acc.momentum_sum += momentum_pct;
        }
    }

    for identity in &ctx.timeline.players {
        let id = &identity.player_id;
        let acc = accumulators.remove(id).unwrap_or_default();
        let mut record = acc.stats;
        let landings = record.landings.max(1) as f64;
        record.avg_time_to_control_s = acc.control_sum / landings;
        record.avg_momentum_retained_pct = (acc.momentum_sum / landings).min(100.0);

        let team = if identity.team == 0 {
            &mut out.blue
        } else {
            &mut out.orange
        };
        team.landings += record.landings;
        team.excellent += record.excellent;
        team.good += record.good;
        team.average += record.average;
        team.poor += record.poor;
        team.failed += record.failed;
        team.avg_time_to_control_s += acc.control_sum;
        team.avg_momentum_retained_pct += acc.momentum_sum;

        out.per_player.insert(id.clone(), record);
    }

    for team in [&mut out.blue, &mut out.orange] {
        let landings = team.landings.max(1) as f64;
        team.avg_time_to_control_s /= landings;
        team.avg_momentum_retained_pct = (team.avg_momentum_retained_pct / landings).min(100.0);
    }
    out
}

/// Seconds after the landing until frame-over-frame speed change settles
/// under the control threshold.
fn time_to_control(
    ctx: &AnalysisContext,
    landing_index: usize,
    player_id: &str,
    landing_t: f64,
) -> f64 {
    let frames = &ctx.timeline.frames;
    let mut prev_speed: Option<f32> = None;
    for frame in &frames[landing_index..] {
        if frame.timestamp - landing_t > CONTROL_SCAN_S {
            break;
        }
        let Some(player) = frame.players.iter().find(|p| p.player_id == player_id) else {
            continue;
        };
        let speed = player.velocity.length();
        if let Some(prev) = prev_speed {
            if (speed - prev).abs() < CONTROL_ACCEL {
                return frame.timestamp - landing_t;
            }
        }
        prev_speed = Some(speed);
    }
    CONTROL_SCAN_S
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_ladder_orders_by_momentum_and_control() {
        assert_eq!(classify(95.0, 0.1), RecoveryQuality::Excellent);
        assert_eq!(classify(75.0, 0.4), RecoveryQuality::Good);
        assert_eq!(classify(55.0, 1.0), RecoveryQuality::Average);
        assert_eq!(classify(30.0, 1.5), RecoveryQuality::Poor);
        assert_eq!(classify(10.0, 2.0), RecoveryQuality::Failed);
    }
}
