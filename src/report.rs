//! Report assembly and emission. The success and error envelopes are
//! mutually exclusive; field order is declaration order, maps are ordered,
//! and serialization is 2-space-indented JSON, so identical inputs produce
//! byte-identical reports. Writes are atomic: temp file, fsync, rename.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::analysis::Analysis;
use crate::constants::{BACK_WALL_Y, CEILING_Z, SIDE_WALL_X};
use crate::error::{truncate_detail, RlCoachError, RlCoachErrorVariant, RlCoachResult};
use crate::events::{
    BoostPickupEvent, DemoEvent, EventStream, GoalEvent, KickoffEvent, TimelineEvent, TouchEvent,
};
use crate::frames::{CameraSettings, LoadoutSummary, NetworkDiagnostics};
use crate::header::{Header, Playlist};
use crate::ingest::IngestReport;
use crate::normalize::NormalizedTimeline;

pub const SCHEMA_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinateReference {
    pub side_wall_x: f32,
    pub back_wall_y: f32,
    pub ceiling_z: f32,
}

impl Default for CoordinateReference {
    fn default() -> Self {
        CoordinateReference {
            side_wall_x: SIDE_WALL_X,
            back_wall_y: BACK_WALL_Y,
            ceiling_z: CEILING_Z,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    pub engine_build: Option<String>,
    pub playlist: Playlist,
    pub map: String,
    pub team_size: u8,
    pub overtime: bool,
    pub mutators: BTreeMap<String, String>,
    pub match_guid: Option<String>,
    pub started_at_utc: Option<String>,
    pub duration_seconds: f64,
    pub recorded_frame_hz: f32,
    pub total_frames: usize,
    pub coordinate_reference: CoordinateReference,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParserQuality {
    pub name: String,
    pub version: String,
    pub parsed_header: bool,
    pub parsed_network_data: bool,
    pub crc_checked: bool,
    pub network_diagnostics: NetworkDiagnostics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quality {
    pub parser: ParserQuality,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamBlock {
    pub name: String,
    pub score: u32,
    pub players: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Teams {
    pub blue: TeamBlock,
    pub orange: TeamBlock,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerBlock {
    pub player_id: String,
    pub display_name: String,
    pub team: String,
    pub platform_ids: BTreeMap<String, String>,
    pub camera: Option<CameraSettings>,
    pub loadout: Option<LoadoutSummary>,
}

/// The report's events block. Challenges feed analysis only; the contract
/// exposes these six collections.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventsBlock {
    pub timeline: Vec<TimelineEvent>,
    pub goals: Vec<GoalEvent>,
    pub demos: Vec<DemoEvent>,
    pub kickoffs: Vec<KickoffEvent>,
    pub boost_pickups: Vec<BoostPickupEvent>,
    pub touches: Vec<TouchEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuccessReport {
    pub replay_id: String,
    pub source_file: String,
    pub schema_version: String,
    pub generated_at_utc: String,
    pub metadata: Metadata,
    pub quality: Quality,
    pub teams: Teams,
    pub players: Vec<PlayerBlock>,
    pub events: EventsBlock,
    pub analysis: Analysis,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEnvelope {
    pub error: String,
    pub details: String,
}

impl ErrorEnvelope {
    pub fn unreadable(details: &str) -> Self {
        ErrorEnvelope {
            error: "unreadable_replay_file".to_string(),
            details: truncate_detail(details),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Report {
    Success(Box<SuccessReport>),
    Error(ErrorEnvelope),
}

impl Report {
    pub fn is_error(&self) -> bool {
        matches!(self, Report::Error(_))
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

/// Inputs the assembler fuses into the success envelope.
pub struct AssemblyInput<'a> {
    pub source_file: String,
    pub generated_at: DateTime<Utc>,
    pub ingest: &'a IngestReport,
    pub header: &'a Header,
    pub diagnostics: &'a NetworkDiagnostics,
    pub crc_checked: bool,
    pub parser_name: String,
    pub parser_version: String,
    pub timeline: &'a NormalizedTimeline,
    pub events: &'a EventStream,
    pub analysis: Analysis,
    pub warnings: Vec<String>,
}

fn replay_id(ingest: &IngestReport, header: &Header) -> String {
    let mut hasher = Sha256::new();
    hasher.update(ingest.sha256.as_bytes());
    if let Some(guid) = &header.match_guid {
        hasher.update(guid.as_bytes());
    }
    hex::encode(hasher.finalize())
}

fn team_name(team: u8) -> &'static str {
    if team == 0 {
        "BLUE"
    } else {
        "ORANGE"
    }
}

pub fn assemble(input: AssemblyInput) -> Report {
    let header = input.header;
    let timeline = input.timeline;

    let team_players = |team: u8| -> Vec<String> {
        timeline
            .team_players(team)
            .map(|p| p.player_id.clone())
            .collect()
    };

    // Header scores are authoritative; goal events are the fallback.
    let (mut blue_score, mut orange_score) = (header.team0_score, header.team1_score);
    if blue_score == 0 && orange_score == 0 {
        blue_score = input.events.goals.iter().filter(|g| g.team == 0).count() as u32;
        orange_score = input.events.goals.iter().filter(|g| g.team == 1).count() as u32;
    }

    let players = timeline
        .players
        .iter()
        .map(|identity| PlayerBlock {
            player_id: identity.player_id.clone(),
            display_name: identity.display_name.clone(),
            team: team_name(identity.team).to_string(),
            platform_ids: identity.platform_ids.clone(),
            camera: identity.camera,
            loadout: identity.loadout,
        })
        .collect();

    let report = SuccessReport {
        replay_id: replay_id(input.ingest, header),
        source_file: input.source_file,
        schema_version: SCHEMA_VERSION.to_string(),
        generated_at_utc: input
            .generated_at
            .to_rfc3339_opts(SecondsFormat::Secs, true),
        metadata: Metadata {
            engine_build: header.engine_build.clone(),
            playlist: header.playlist,
            map: header.map_name.clone(),
            team_size: header.team_size,
            overtime: header.overtime,
            mutators: header.mutators.clone(),
            match_guid: header.match_guid.clone(),
            started_at_utc: header
                .started_at
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true)),
            duration_seconds: if timeline.duration_s > 0.0 {
                timeline.duration_s
            } else {
                header.duration_seconds
            },
            recorded_frame_hz: timeline.frame_hz,
            total_frames: timeline.frames.len(),
            coordinate_reference: CoordinateReference::default(),
        },
        quality: Quality {
            parser: ParserQuality {
                name: input.parser_name,
                version: input.parser_version,
                parsed_header: true,
                parsed_network_data: input.diagnostics.frames_emitted > 0,
                crc_checked: input.crc_checked,
                network_diagnostics: input.diagnostics.clone(),
            },
            warnings: input.warnings,
        },
        teams: Teams {
            blue: TeamBlock {
                name: "BLUE".to_string(),
                score: blue_score,
                players: team_players(0),
            },
            orange: TeamBlock {
                name: "ORANGE".to_string(),
                score: orange_score,
                players: team_players(1),
            },
        },
        players,
        events: EventsBlock {
            timeline: input.events.timeline.clone(),
            goals: input.events.goals.clone(),
            demos: input.events.demos.clone(),
            kickoffs: input.events.kickoffs.clone(),
            boost_pickups: input.events.boost_pickups.clone(),
            touches: input.events.touches.clone(),
        },
        analysis: input.analysis,
    };
    Report::Success(Box::new(report))
}

pub fn error_report(err: &RlCoachError) -> Report {
    Report::Error(ErrorEnvelope::unreadable(&err.envelope_details()))
}

/// Atomic write: serialize to a temp file in the destination directory,
/// fsync, then rename over the target.
pub fn write_atomic(path: &Path, contents: &str) -> RlCoachResult<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let map_err = |detail: String| {
        RlCoachError::new(RlCoachErrorVariant::ReportWrite {
            path: path.display().to_string(),
            detail,
        })
    };

    std::fs::create_dir_all(dir).map_err(|e| map_err(e.to_string()))?;
    let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(|e| map_err(e.to_string()))?;
    temp.write_all(contents.as_bytes())
        .map_err(|e| map_err(e.to_string()))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| map_err(e.to_string()))?;
    temp.persist(path).map_err(|e| map_err(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_envelope_serializes_to_two_keys() {
        let report = Report::Error(ErrorEnvelope::unreadable("header_unreadable: truncated"));
        let value: serde_json::Value =
            serde_json::from_str(&report.to_json(false).unwrap()).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert_eq!(object["error"], "unreadable_replay_file");
    }

    #[test]
    fn atomic_write_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        write_atomic(&path, "{\"ok\": true}").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"ok\": true}");

        // Overwrite is atomic too.
        write_atomic(&path, "{\"ok\": false}").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"ok\": false}");
    }
}
