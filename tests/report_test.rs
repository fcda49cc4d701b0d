//! Report contract tests: determinism, envelope exclusivity, round-trip
//! stability and schema conformance.

mod common;

use chrono::DateTime;
use rlcoach::analysis::{analyze, AnalysisContext};
use rlcoach::events;
use rlcoach::ingest::IngestReport;
use rlcoach::mechanics;
use rlcoach::normalize::normalize;
use rlcoach::pipeline::render_validated;
use rlcoach::report::{assemble, AssemblyInput, ErrorEnvelope, Report};
use rlcoach::schema;

fn build_report() -> Report {
    let (header, network) = common::duel_scenario();
    let timeline = normalize(&header, &network);
    let mechanic_events = mechanics::detect(&timeline);
    let event_stream = events::detect(&timeline, &header, &network, &mechanic_events);
    let ctx = AnalysisContext {
        timeline: &timeline,
        events: &event_stream,
        mechanics: &mechanic_events,
        header: &header,
    };
    let analysis = analyze(&ctx);
    let ingest = IngestReport {
        size_bytes: 1024 * 64,
        sha256: "cd".repeat(32),
        format_hint: "replay_soccar".to_string(),
        crc_checked: false,
        warnings: Vec::new(),
    };
    assemble(AssemblyInput {
        source_file: "synthetic.replay".to_string(),
        generated_at: DateTime::UNIX_EPOCH,
        ingest: &ingest,
        header: &header,
        diagnostics: &network.diagnostics,
        crc_checked: true,
        parser_name: "rust".to_string(),
        parser_version: "0.4.0".to_string(),
        timeline: &timeline,
        events: &event_stream,
        analysis,
        warnings: Vec::new(),
    })
}

#[test]
fn identical_inputs_produce_identical_bytes() {
    let first = render_validated(&build_report(), true).unwrap();
    let second = render_validated(&build_report(), true).unwrap();
    assert_eq!(first, second);
}

#[test]
fn success_report_round_trips_through_json() {
    let report = build_report();
    let json = render_validated(&report, true).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let rendered_again = serde_json::to_string_pretty(&value).unwrap();
    let reparsed: serde_json::Value = serde_json::from_str(&rendered_again).unwrap();
    assert_eq!(value, reparsed);
}

#[test]
fn success_report_has_required_top_level_keys_in_order() {
    let json = render_validated(&build_report(), true).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
    assert_eq!(
        keys,
        vec![
            "replay_id",
            "source_file",
            "schema_version",
            "generated_at_utc",
            "metadata",
            "quality",
            "teams",
            "players",
            "events",
            "analysis",
        ]
    );
    assert_eq!(value["schema_version"], rlcoach::SCHEMA_VERSION);
}

#[test]
fn envelope_exclusivity_is_enforced_by_the_validator() {
    // A success report never carries `error`.
    let json = render_validated(&build_report(), false).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(value.get("error").is_none());

    // And a success key smuggled into an envelope is rejected.
    let mut envelope = serde_json::to_value(Report::Error(ErrorEnvelope::unreadable("x"))).unwrap();
    envelope
        .as_object_mut()
        .unwrap()
        .insert("metadata".to_string(), serde_json::json!({}));
    assert!(schema::validate(&envelope).is_err());
}

#[test]
fn every_event_references_a_declared_player() {
    let json = render_validated(&build_report(), false).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let ids: Vec<&str> = value["players"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["player_id"].as_str().unwrap())
        .collect();
    for event in value["events"]["timeline"].as_array().unwrap() {
        match event["player_id"].as_str() {
            Some(id) => assert!(ids.contains(&id), "unknown id {id}"),
            None => {}
        }
    }
}

#[test]
fn teams_reference_their_own_players() {
    let json = render_validated(&build_report(), false).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let blue = value["teams"]["blue"]["players"].as_array().unwrap();
    let orange = value["teams"]["orange"]["players"].as_array().unwrap();
    assert_eq!(blue.len(), 1);
    assert_eq!(orange.len(), 1);
    assert_ne!(blue[0], orange[0]);
}
