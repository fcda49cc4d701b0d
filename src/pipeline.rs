//! The pipeline driver: bytes → ingest → parse → normalize → detect →
//! analyze → assemble. A pure function of (bytes, options); hard failures
//! short-circuit to the error envelope, soft failures degrade through the
//! quality block.

use std::path::Path;

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::adapter::{resolve_adapter, AdapterKind};
use crate::analysis::{self, AnalysisContext};
use crate::error::RlCoachResult;
use crate::events;
use crate::frames::NetworkStatus;
use crate::ingest;
use crate::mechanics;
use crate::report::{self, AssemblyInput, Report};

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub adapter: AdapterKind,
    /// Injected so the engine stays deterministic over its inputs; the CLI
    /// passes wall-clock now.
    pub generated_at: DateTime<Utc>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        PipelineOptions {
            adapter: AdapterKind::Native,
            generated_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

/// Analyzes a replay file. Never fails: every outcome is a [`Report`].
pub fn analyze_file(path: &Path, options: &PipelineOptions) -> Report {
    let (bytes, ingest_report) = match ingest::load_validated(path) {
        Ok(loaded) => loaded,
        Err(err) => return report::error_report(&err),
    };
    analyze_bytes(
        &bytes,
        &ingest_report,
        &path.display().to_string(),
        options,
    )
}

/// Analyzes pre-validated replay bytes.
pub fn analyze_bytes(
    bytes: &[u8],
    ingest_report: &ingest::IngestReport,
    source_file: &str,
    options: &PipelineOptions,
) -> Report {
    let adapter = resolve_adapter(options.adapter);
    info!("analyzing {} with adapter {}", source_file, adapter.name());

    let header = match adapter.parse_header(bytes) {
        Ok(header) => header,
        Err(err) => return report::error_report(&err),
    };

    let network = adapter.parse_network(bytes);
    debug!(
        "network parse: status={:?} frames={}",
        network.diagnostics.status, network.diagnostics.frames_emitted
    );

    let timeline = crate::normalize::normalize(&header, &network);
    let mechanic_events = mechanics::detect(&timeline);
    let event_stream = events::detect(&timeline, &header, &network, &mechanic_events);

    let ctx = AnalysisContext {
        timeline: &timeline,
        events: &event_stream,
        mechanics: &mechanic_events,
        header: &header,
    };
    let analysis = analysis::analyze(&ctx);

    let mut warnings: Vec<String> = Vec::new();
    if !network.crc_checked {
        warnings.extend(ingest_report.warnings.iter().cloned());
    }
    warnings.extend(timeline.warnings.iter().cloned());
    if network.diagnostics.frames_emitted == 0 {
        warnings.push("header_only_mode_limited_metrics".to_string());
    } else if network.diagnostics.status == NetworkStatus::Degraded {
        warnings.push("network_parse_degraded".to_string());
    }
    if boost_deltas_disagree(&timeline, event_stream.boost_pickups.len()) {
        warnings.push("boost_delta_mismatch".to_string());
    }
    warnings.dedup();

    report::assemble(AssemblyInput {
        source_file: source_file.to_string(),
        generated_at: options.generated_at,
        ingest: ingest_report,
        header: &header,
        diagnostics: &network.diagnostics,
        crc_checked: network.crc_checked,
        parser_name: adapter.name().to_string(),
        parser_version: adapter.version().to_string(),
        timeline: &timeline,
        events: &event_stream,
        analysis,
        warnings,
    })
}

/// Cross-checks the authoritative pad pickups against upward jumps in player
/// boost. Deltas never create pickup events; a large disagreement only
/// surfaces as a warning.
fn boost_deltas_disagree(timeline: &crate::normalize::NormalizedTimeline, pickups: usize) -> bool {
    let mut upswings = 0usize;
    let mut last_boost: std::collections::HashMap<&str, f32> = std::collections::HashMap::new();
    for frame in &timeline.frames {
        for player in &frame.players {
            if let Some(prev) = last_boost.get(player.player_id.as_str()) {
                if player.boost_amount - prev > 10.0 {
                    upswings += 1;
                }
            }
            last_boost.insert(player.player_id.as_str(), player.boost_amount);
        }
    }
    // Tolerate pickups the sampler missed and demo refills; flag only a
    // gross mismatch.
    upswings > pickups.saturating_mul(2) + 8
}

/// Serializes, validates and returns the report JSON. A validation failure
/// here is an engine bug (exit code 4 at the CLI).
pub fn render_validated(report: &Report, pretty: bool) -> RlCoachResult<String> {
    let json = report.to_json(pretty).map_err(|e| {
        crate::error::RlCoachError::new(crate::error::RlCoachErrorVariant::ReportWrite {
            path: "<memory>".to_string(),
            detail: e.to_string(),
        })
    })?;
    let value: serde_json::Value = serde_json::from_str(&json).map_err(|e| {
        crate::error::RlCoachError::new(crate::error::RlCoachErrorVariant::ReportWrite {
            path: "<memory>".to_string(),
            detail: e.to_string(),
        })
    })?;
    crate::schema::validate(&value).map_err(|violations| {
        crate::error::RlCoachError::new(crate::error::RlCoachErrorVariant::SchemaViolation {
            violations,
        })
    })?;
    Ok(json)
}
