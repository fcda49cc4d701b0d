//! Structural validation of the serialized report. The report types are
//! closed Rust sums, so this validator is the contract's second witness: it
//! re-checks key sets, enum domains, numeric ranges and envelope exclusivity
//! on the emitted JSON. A violation here is an engine bug, never user error.

use serde_json::Value;

static SUCCESS_KEYS: [&str; 10] = [
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
];

static PARSER_KEYS: [&str; 6] = [
    "name",
    "version",
    "parsed_header",
    "parsed_network_data",
    "crc_checked",
    "network_diagnostics",
];

static PLAYLISTS: [&str; 7] = [
    "DUEL", "DOUBLES", "STANDARD", "CHAOS", "PRIVATE", "EXTRA_MODE", "UNKNOWN",
];

static STATUSES: [&str; 3] = ["ok", "degraded", "unavailable"];

/// Validates a serialized report. Returns every violation found, not just
/// the first.
pub fn validate(value: &Value) -> Result<(), Vec<String>> {
    let mut violations = Vec::new();
    let Some(object) = value.as_object() else {
        return Err(vec!["report is not a JSON object".to_string()]);
    };

    if object.contains_key("error") {
        validate_error_envelope(object, &mut violations);
    } else {
        validate_success(object, &mut violations);
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

fn validate_error_envelope(
    object: &serde_json::Map<String, Value>,
    violations: &mut Vec<String>,
) {
    if object.len() != 2 || !object.contains_key("details") {
        violations.push(format!(
            "error envelope must contain exactly error+details, found keys {:?}",
            object.keys().collect::<Vec<_>>()
        ));
    }
    if object.get("error").and_then(Value::as_str) != Some("unreadable_replay_file") {
        violations.push("error envelope error must be \"unreadable_replay_file\"".to_string());
    }
    match object.get("details").and_then(Value::as_str) {
        Some(details) if details.len() <= 512 => {}
        Some(_) => violations.push("error details exceed 512 chars".to_string()),
        None => violations.push("error details must be a string".to_string()),
    }
    for key in SUCCESS_KEYS {
        if object.contains_key(key) {
            violations.push(format!("error envelope must not carry success key {key:?}"));
        }
    }
}

fn validate_success(object: &serde_json::Map<String, Value>, violations: &mut Vec<String>) {
    for key in SUCCESS_KEYS {
        if !object.contains_key(key) {
            violations.push(format!("missing required key {key:?}"));
        }
    }

    if let Some(metadata) = object.get("metadata").and_then(Value::as_object) {
        match metadata.get("playlist").and_then(Value::as_str) {
            Some(playlist) if PLAYLISTS.contains(&playlist) => {}
            other => violations.push(format!("metadata.playlist invalid: {other:?}")),
        }
        match metadata.get("team_size").and_then(Value::as_u64) {
            Some(size) if (1..=4).contains(&size) => {}
            other => violations.push(format!("metadata.team_size out of range: {other:?}")),
        }
        match metadata.get("recorded_frame_hz").and_then(Value::as_f64) {
            Some(hz) if (1.0..=240.0).contains(&hz) => {}
            other => violations.push(format!("metadata.recorded_frame_hz invalid: {other:?}")),
        }
        let reference = metadata
            .get("coordinate_reference")
            .and_then(Value::as_object);
        match reference {
            Some(reference) => {
                for (key, expected) in
                    [("side_wall_x", 4096.0), ("back_wall_y", 5120.0), ("ceiling_z", 2044.0)]
                {
                    if reference.get(key).and_then(Value::as_f64) != Some(expected) {
                        violations.push(format!("coordinate_reference.{key} != {expected}"));
                    }
                }
            }
            None => violations.push("metadata.coordinate_reference missing".to_string()),
        }
    } else {
        violations.push("metadata must be an object".to_string());
    }

    if let Some(parser) = object
        .get("quality")
        .and_then(|q| q.get("parser"))
        .and_then(Value::as_object)
    {
        // additionalProperties: false on the parser block.
        for key in parser.keys() {
            if !PARSER_KEYS.contains(&key.as_str()) {
                violations.push(format!("quality.parser carries unknown key {key:?}"));
            }
        }
        for key in PARSER_KEYS {
            if !parser.contains_key(key) {
                violations.push(format!("quality.parser missing key {key:?}"));
            }
        }
        let status = parser
            .get("network_diagnostics")
            .and_then(|d| d.get("status"))
            .and_then(Value::as_str);
        match status {
            Some(status) if STATUSES.contains(&status) => {}
            other => violations.push(format!("network_diagnostics.status invalid: {other:?}")),
        }
    } else {
        violations.push("quality.parser must be an object".to_string());
    }

    let player_ids: Vec<&str> = object
        .get("players")
        .and_then(Value::as_array)
        .map(|players| {
            players
                .iter()
                .filter_map(|p| p.get("player_id").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    if let Some(teams) = object.get("teams").and_then(Value::as_object) {
        for side in ["blue", "orange"] {
            match teams.get(side).and_then(Value::as_object) {
                Some(team) => {
                    for id in team
                        .get("players")
                        .and_then(Value::as_array)
                        .into_iter()
                        .flatten()
                        .filter_map(Value::as_str)
                    {
                        if !player_ids.contains(&id) {
                            violations
                                .push(format!("teams.{side} references unknown player {id:?}"));
                        }
                    }
                }
                None => violations.push(format!("teams.{side} missing")),
            }
        }
    }

    // Every timeline event references a declared player or is null where
    // permitted.
    if let Some(timeline) = object
        .get("events")
        .and_then(|e| e.get("timeline"))
        .and_then(Value::as_array)
    {
        for event in timeline {
            match event.get("player_id") {
                Some(Value::Null) | None => {}
                Some(Value::String(id)) => {
                    if !player_ids.contains(&id.as_str()) {
                        violations
                            .push(format!("events.timeline references unknown player {id:?}"));
                    }
                }
                Some(other) => {
                    violations.push(format!("events.timeline player_id not a string: {other:?}"))
                }
            }
        }
    }

    if let Some(analysis) = object.get("analysis").and_then(Value::as_object) {
        match analysis.get("per_team").and_then(Value::as_object) {
            Some(per_team) => {
                for side in ["blue", "orange"] {
                    if !per_team.contains_key(side) {
                        violations.push(format!("analysis.per_team.{side} missing"));
                    }
                }
            }
            None => violations.push("analysis.per_team must be an object".to_string()),
        }
        if let Some(per_player) = analysis.get("per_player").and_then(Value::as_object) {
            for id in per_player.keys() {
                if !player_ids.contains(&id.as_str()) {
                    violations.push(format!("analysis.per_player has unknown player {id:?}"));
                }
            }
        } else {
            violations.push("analysis.per_player must be an object".to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_envelope_validates() {
        let value = json!({"error": "unreadable_replay_file", "details": "short"});
        assert!(validate(&value).is_ok());
    }

    #[test]
    fn mixed_envelope_rejected() {
        let value = json!({
            "error": "unreadable_replay_file",
            "details": "short",
            "metadata": {}
        });
        let violations = validate(&value).unwrap_err();
        assert!(!violations.is_empty());
    }

    #[test]
    fn parser_block_rejects_extra_keys() {
        // Minimal fabricated success report with a stray parser key.
        let value = json!({
            "replay_id": "r", "source_file": "s", "schema_version": "1.0.0",
            "generated_at_utc": "2024-01-01T00:00:00Z",
            "metadata": {
                "playlist": "DUEL", "team_size": 1, "recorded_frame_hz": 30.0,
                "coordinate_reference": {
                    "side_wall_x": 4096.0, "back_wall_y": 5120.0, "ceiling_z": 2044.0
                }
            },
            "quality": {
                "parser": {
                    "name": "rust", "version": "0", "parsed_header": true,
                    "parsed_network_data": true, "crc_checked": true,
                    "network_diagnostics": {"status": "ok"},
                    "extra": 1
                },
                "warnings": []
            },
            "teams": {
                "blue": {"name": "BLUE", "score": 0, "players": []},
                "orange": {"name": "ORANGE", "score": 0, "players": []}
            },
            "players": [],
            "events": {"timeline": []},
            "analysis": {"per_team": {"blue": {}, "orange": {}}, "per_player": {}}
        });
        let violations = validate(&value).unwrap_err();
        assert!(violations.iter().any(|v| v.contains("unknown key")));
    }
}
