//! Typed header model decoded from the replay's property table. Header data
//! is authoritative where it overlaps the network stream (goal tickmarks,
//! final scores, per-player stat rows).

use std::collections::BTreeMap;

use boxcars::HeaderProp;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use crate::error::{RlCoachError, RlCoachErrorVariant, RlCoachResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Playlist {
    #[serde(rename = "DUEL")]
    Duel,
    #[serde(rename = "DOUBLES")]
    Doubles,
    #[serde(rename = "STANDARD")]
    Standard,
    #[serde(rename = "CHAOS")]
    Chaos,
    #[serde(rename = "PRIVATE")]
    Private,
    #[serde(rename = "EXTRA_MODE")]
    ExtraMode,
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

/// Goal tickmark row from the header `Goals` array. The frame points at the
/// scoring moment; the engine resets ball physics on the same frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderGoal {
    pub frame: i32,
    pub scorer_name: String,
    pub team: u8,
}

/// One `PlayerStats` row. `platform` is the raw `OnlinePlatform_*` tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderPlayerRow {
    pub name: String,
    pub platform: Option<String>,
    pub online_id: Option<u64>,
    pub team: u8,
    pub goals: u32,
    pub assists: u32,
    pub saves: u32,
    pub shots: u32,
    pub score: u32,
    pub is_bot: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Header {
    pub engine_build: Option<String>,
    pub playlist: Playlist,
    pub map_name: String,
    pub team_size: u8,
    pub overtime: bool,
    pub mutators: BTreeMap<String, String>,
    pub match_guid: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub duration_seconds: f64,
    pub num_frames: Option<i32>,
    pub record_fps: Option<f32>,
    pub team0_score: u32,
    pub team1_score: u32,
    pub goals: Vec<HeaderGoal>,
    pub player_stats: Vec<HeaderPlayerRow>,
}

impl Header {
    /// Synthetic header used by the null adapter when nothing but file
    /// metadata is available.
    pub fn synthetic() -> Self {
        Header {
            engine_build: None,
            playlist: Playlist::Unknown,
            map_name: "unknown".to_string(),
            team_size: 1,
            overtime: false,
            mutators: BTreeMap::new(),
            match_guid: None,
            started_at: None,
            duration_seconds: 0.0,
            num_frames: None,
            record_fps: None,
            team0_score: 0,
            team1_score: 0,
            goals: Vec::new(),
            player_stats: Vec::new(),
        }
    }
}

fn get_prop<'a>(props: &'a [(String, HeaderProp)], key: &str) -> Option<&'a HeaderProp> {
    props.iter().find(|(k, _)| k == key).map(|(_, v)| v)
}

fn prop_str(props: &[(String, HeaderProp)], key: &str) -> Option<String> {
    match get_prop(props, key) {
        Some(HeaderProp::Str(s)) | Some(HeaderProp::Name(s)) => Some(s.clone()),
        _ => None,
    }
}

fn prop_int(props: &[(String, HeaderProp)], key: &str) -> Option<i32> {
    match get_prop(props, key) {
        Some(HeaderProp::Int(i)) => Some(*i),
        _ => None,
    }
}

fn prop_f32(props: &[(String, HeaderProp)], key: &str) -> Option<f32> {
    match get_prop(props, key) {
        Some(HeaderProp::Float(f)) => Some(*f),
        _ => None,
    }
}

fn prop_bool(props: &[(String, HeaderProp)], key: &str) -> Option<bool> {
    match get_prop(props, key) {
        Some(HeaderProp::Bool(b)) => Some(*b),
        _ => None,
    }
}

fn prop_qword(props: &[(String, HeaderProp)], key: &str) -> Option<u64> {
    match get_prop(props, key) {
        Some(HeaderProp::QWord(q)) => Some(*q),
        // Some builds replicate OnlineID as a stringified QWord.
        Some(HeaderProp::Str(s)) => s.parse().ok(),
        _ => None,
    }
}

fn prop_byte_tag(props: &[(String, HeaderProp)], key: &str) -> Option<String> {
    match get_prop(props, key) {
        Some(HeaderProp::Byte { value, .. }) => value.clone(),
        _ => None,
    }
}

fn prop_rows<'a>(
    props: &'a [(String, HeaderProp)],
    key: &str,
) -> Option<&'a Vec<Vec<(String, HeaderProp)>>> {
    match get_prop(props, key) {
        Some(HeaderProp::Array(rows)) => Some(rows),
        _ => None,
    }
}

fn classify_playlist(match_type: Option<&str>, team_size: u8) -> Playlist {
    match match_type {
        Some("Private") | Some("Offline") => Playlist::Private,
        Some("Online") | Some("Ranked") | Some("Season") | Some("Tournament") => {
            match team_size {
                1 => Playlist::Duel,
                2 => Playlist::Doubles,
                3 => Playlist::Standard,
                4 => Playlist::Chaos,
                _ => Playlist::Unknown,
            }
        }
        Some(_) => Playlist::ExtraMode,
        None => Playlist::Unknown,
    }
}

fn parse_started_at(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H-%M-%S")
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

fn parse_goals(props: &[(String, HeaderProp)]) -> Vec<HeaderGoal> {
    let Some(rows) = prop_rows(props, "Goals") else {
        return Vec::new();
    };
    rows.iter()
        .filter_map(|row| {
            Some(HeaderGoal {
                frame: prop_int(row, "frame")?,
                scorer_name: prop_str(row, "PlayerName").unwrap_or_default(),
                team: prop_int(row, "PlayerTeam").unwrap_or(0).clamp(0, 1) as u8,
            })
        })
        .collect()
}

fn parse_player_stats(props: &[(String, HeaderProp)]) -> Vec<HeaderPlayerRow> {
    let Some(rows) = prop_rows(props, "PlayerStats") else {
        return Vec::new();
    };
    rows.iter()
        .filter_map(|row| {
            Some(HeaderPlayerRow {
                name: prop_str(row, "Name")?,
                platform: prop_byte_tag(row, "Platform"),
                online_id: prop_qword(row, "OnlineID").filter(|id| *id != 0),
                team: prop_int(row, "Team").unwrap_or(0).clamp(0, 1) as u8,
                goals: prop_int(row, "Goals").unwrap_or(0).max(0) as u32,
                assists: prop_int(row, "Assists").unwrap_or(0).max(0) as u32,
                saves: prop_int(row, "Saves").unwrap_or(0).max(0) as u32,
                shots: prop_int(row, "Shots").unwrap_or(0).max(0) as u32,
                score: prop_int(row, "Score").unwrap_or(0).max(0) as u32,
                is_bot: prop_bool(row, "bBot").unwrap_or(false),
            })
        })
        .collect()
}

fn parse_mutators(props: &[(String, HeaderProp)]) -> BTreeMap<String, String> {
    let mut mutators = BTreeMap::new();
    if let Some(raw) = prop_str(props, "Mutators") {
        for entry in raw.split(',').filter(|s| !s.is_empty()) {
            match entry.split_once('=') {
                Some((k, v)) => mutators.insert(k.trim().to_string(), v.trim().to_string()),
                None => mutators.insert(entry.trim().to_string(), "1".to_string()),
            };
        }
    }
    mutators
}

/// Decodes the typed [`Header`] from a parsed replay. Fails only when the
/// property table is unusable, which is the header-fatal path.
pub fn decode_header(replay: &boxcars::Replay) -> RlCoachResult<Header> {
    let props = &replay.properties;
    if props.is_empty() {
        return RlCoachError::new_result(RlCoachErrorVariant::HeaderUnreadable {
            detail: "empty property table".to_string(),
        });
    }

    let team_size = prop_int(props, "TeamSize").unwrap_or(0).clamp(0, 4) as u8;
    if team_size == 0 {
        return RlCoachError::new_result(RlCoachErrorVariant::HeaderUnreadable {
            detail: "header carries no TeamSize property".to_string(),
        });
    }

    let match_type = prop_str(props, "MatchType");
    let num_frames = prop_int(props, "NumFrames");
    let record_fps = prop_f32(props, "RecordFPS");
    let duration_seconds = match (num_frames, record_fps) {
        (Some(frames), Some(fps)) if fps > 0.0 => frames as f64 / fps as f64,
        (Some(frames), None) => frames as f64 / 30.0,
        _ => 0.0,
    };

    Ok(Header {
        engine_build: prop_str(props, "BuildVersion"),
        playlist: classify_playlist(match_type.as_deref(), team_size),
        map_name: prop_str(props, "MapName").unwrap_or_else(|| "unknown".to_string()),
        team_size,
        overtime: prop_bool(props, "bOverTime")
            .unwrap_or_else(|| prop_int(props, "NumberOfOvertimePeriods").unwrap_or(0) > 0),
        mutators: parse_mutators(props),
        match_guid: prop_str(props, "MatchGuid"),
        started_at: prop_str(props, "Date").as_deref().and_then(parse_started_at),
        duration_seconds,
        num_frames,
        record_fps,
        team0_score: prop_int(props, "Team0Score").unwrap_or(0).max(0) as u32,
        team1_score: prop_int(props, "Team1Score").unwrap_or(0).max(0) as u32,
        goals: parse_goals(props),
        player_stats: parse_player_stats(props),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(entries: Vec<(&str, HeaderProp)>) -> Vec<(String, HeaderProp)> {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn playlist_classification_by_team_size() {
        assert_eq!(classify_playlist(Some("Online"), 1), Playlist::Duel);
        assert_eq!(classify_playlist(Some("Online"), 2), Playlist::Doubles);
        assert_eq!(classify_playlist(Some("Online"), 3), Playlist::Standard);
        assert_eq!(classify_playlist(Some("Online"), 4), Playlist::Chaos);
        assert_eq!(classify_playlist(Some("Private"), 3), Playlist::Private);
        assert_eq!(classify_playlist(None, 3), Playlist::Unknown);
    }

    #[test]
    fn date_parsing_accepts_header_format() {
        let parsed = parse_started_at("2024-03-01 19-22-05").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-03-01T19:22:05+00:00");
        assert!(parse_started_at("not a date").is_none());
    }

    #[test]
    fn goal_rows_decode() {
        let rows = vec![props(vec![
            ("frame", HeaderProp::Int(441)),
            ("PlayerName", HeaderProp::Str("Alpha".into())),
            ("PlayerTeam", HeaderProp::Int(1)),
        ])];
        let header = props(vec![("Goals", HeaderProp::Array(rows))]);
        let goals = parse_goals(&header);
        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0].frame, 441);
        assert_eq!(goals[0].team, 1);
    }

    #[test]
    fn mutator_string_splits_into_map() {
        let header = props(vec![(
            "Mutators",
            HeaderProp::Str("BallType=Cube,LowGravity".into()),
        )]);
        let mutators = parse_mutators(&header);
        assert_eq!(mutators.get("BallType").map(String::as_str), Some("Cube"));
        assert_eq!(mutators.get("LowGravity").map(String::as_str), Some("1"));
    }
}
