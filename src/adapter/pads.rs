//! Boost-pad registry. Pad actors are identified by the pickup attribute they
//! replicate, then snapped to the canonical map table by spawn position. Pad
//! pickups come exclusively from pickup attribute flips; player boost deltas
//! only cross-check.

use std::collections::HashMap;

use log::{debug, warn};

use crate::constants::{
    BIG_PAD_SNAP_RADIUS, SMALL_PAD_SNAP_RADIUS, STANDARD_PADS,
};
use crate::frames::{PadPickup, PadSide, PadSize, Vec3};

/// Canonical pad descriptor resolved from [`STANDARD_PADS`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PadInfo {
    pub pad_id: usize,
    pub position: Vec3,
    pub size: PadSize,
    pub side: PadSide,
}

fn side_of(y: f32) -> PadSide {
    if y < -1.0 {
        PadSide::Blue
    } else if y > 1.0 {
        PadSide::Orange
    } else {
        PadSide::Mid
    }
}

/// Snaps a spawn position to the nearest table pad within the per-size snap
/// radius.
pub fn resolve_pad(position: Vec3) -> Option<PadInfo> {
    let mut best: Option<(f32, PadInfo)> = None;
    for (pad_id, (x, y, z, is_big)) in STANDARD_PADS.iter().enumerate() {
        let pad_pos = Vec3::new(*x, *y, *z);
        let radius = if *is_big {
            BIG_PAD_SNAP_RADIUS
        } else {
            SMALL_PAD_SNAP_RADIUS
        };
        // Snap in the ground plane; pad spawn z differs per map revision.
        let dx = position.x - pad_pos.x;
        let dy = position.y - pad_pos.y;
        let dist = (dx * dx + dy * dy).sqrt();
        if dist <= radius && best.map(|(d, _)| dist < d).unwrap_or(true) {
            best = Some((
                dist,
                PadInfo {
                    pad_id,
                    position: pad_pos,
                    size: if *is_big { PadSize::Big } else { PadSize::Small },
                    side: side_of(*y),
                },
            ));
        }
    }
    best.map(|(_, info)| info)
}

/// Actor-id keyed registry of resolved pads plus the pickup-state latch used
/// to turn attribute updates into edge-triggered events.
#[derive(Default)]
pub struct PadRegistry {
    pads: HashMap<i32, PadInfo>,
    picked_up: HashMap<i32, bool>,
    unresolved: usize,
    debug: bool,
}

impl PadRegistry {
    pub fn new(debug: bool) -> Self {
        PadRegistry {
            debug,
            ..Default::default()
        }
    }

    /// Registers a pad actor at its spawn position. Unresolvable positions
    /// are counted and surfaced as a quality warning by the adapter.
    pub fn register(&mut self, actor_id: i32, spawn: Vec3) {
        match resolve_pad(spawn) {
            Some(info) => {
                if self.debug {
                    debug!(
                        "pad actor {} resolved to pad {} at ({}, {})",
                        actor_id, info.pad_id, info.position.x, info.position.y
                    );
                }
                self.pads.insert(actor_id, info);
                self.picked_up.insert(actor_id, false);
            }
            None => {
                warn!(
                    "pad actor {} at ({:.0}, {:.0}, {:.0}) matches no known pad",
                    actor_id, spawn.x, spawn.y, spawn.z
                );
                self.unresolved += 1;
            }
        }
    }

    pub fn deregister(&mut self, actor_id: i32) {
        self.pads.remove(&actor_id);
        self.picked_up.remove(&actor_id);
    }

    pub fn is_pad(&self, actor_id: i32) -> bool {
        self.pads.contains_key(&actor_id)
    }

    pub fn unresolved_count(&self) -> usize {
        self.unresolved
    }

    /// Processes a pickup attribute update. Returns a [`PadPickup`] only on
    /// the rising edge of the picked-up state.
    pub fn on_pickup_update(
        &mut self,
        actor_id: i32,
        picked_up: bool,
        instigator: Option<&str>,
        t: f64,
        frame: usize,
    ) -> Option<PadPickup> {
        let info = *self.pads.get(&actor_id)?;
        let previous = self.picked_up.insert(actor_id, picked_up).unwrap_or(false);
        if !picked_up || previous {
            return None;
        }
        let player_id = instigator?.to_string();
        if self.debug {
            debug!(
                "pad {} ({:?}/{:?}) picked up by {} at t={:.3}",
                info.pad_id, info.size, info.side, player_id, t
            );
        }
        Some(PadPickup::new(
            t,
            frame,
            info.pad_id,
            info.side,
            info.size,
            player_id,
        ))
    }
}
