//! Ingest: size and magic validation, content hashing, CRC scaffold. Ingest
//! never decides the report outcome; it feeds `quality.parser` and hands raw
//! bytes downstream.

use std::path::Path;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::constants::{MAX_REPLAY_SIZE, MIN_REPLAY_SIZE};
use crate::error::{RlCoachError, RlCoachErrorVariant, RlCoachResult};

/// The replay property header names this class a few bytes into the file.
static SOCCAR_MAGIC: &[u8] = b"TAGame.Replay_Soccar_TA";
static REPLAY_MAGIC_PREFIX: &[u8] = b"TAGame.Replay_";
const MAGIC_SCAN_WINDOW: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReport {
    pub size_bytes: u64,
    pub sha256: String,
    pub format_hint: String,
    pub crc_checked: bool,
    pub warnings: Vec<String>,
}

/// Validates the file at `path` and returns its ingest report without
/// retaining the bytes.
pub fn validate(path: &Path) -> RlCoachResult<IngestReport> {
    load_validated(path).map(|(_, report)| report)
}

/// Validates and returns `(bytes, report)` for the pipeline.
pub fn load_validated(path: &Path) -> RlCoachResult<(Vec<u8>, IngestReport)> {
    if !path.exists() {
        return RlCoachError::new_result(RlCoachErrorVariant::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let bytes = std::fs::read(path).map_err(|e| {
        RlCoachError::new(RlCoachErrorVariant::Io {
            path: path.display().to_string(),
            detail: e.to_string(),
        })
    })?;
    let report = validate_bytes(&bytes)?;
    Ok((bytes, report))
}

/// Pure validation over an in-memory byte stream.
pub fn validate_bytes(bytes: &[u8]) -> RlCoachResult<IngestReport> {
    let size = bytes.len() as u64;
    if size < MIN_REPLAY_SIZE {
        return RlCoachError::new_result(RlCoachErrorVariant::FileTooSmall {
            size,
            minimum: MIN_REPLAY_SIZE,
        });
    }
    if size > MAX_REPLAY_SIZE {
        return RlCoachError::new_result(RlCoachErrorVariant::FileTooLarge {
            size,
            maximum: MAX_REPLAY_SIZE,
        });
    }

    let format_hint = match scan_magic(bytes) {
        Some(hint) => hint,
        None => return RlCoachError::new_result(RlCoachErrorVariant::MissingMagicBytes),
    };

    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let sha256 = hex::encode(hasher.finalize());

    // CRC verification is deferred to the native parse; ingest only records
    // that it has not happened yet.
    Ok(IngestReport {
        size_bytes: size,
        sha256,
        format_hint,
        crc_checked: false,
        warnings: vec!["crc_not_verified".to_string()],
    })
}

/// Looks for the replay class marker inside the scan window that follows the
/// 8-byte size/crc prelude.
fn scan_magic(bytes: &[u8]) -> Option<String> {
    let window = &bytes[..bytes.len().min(MAGIC_SCAN_WINDOW)];
    if find_subslice(window, SOCCAR_MAGIC).is_some() {
        Some("replay_soccar".to_string())
    } else if find_subslice(window, REPLAY_MAGIC_PREFIX).is_some() {
        Some("replay_generic".to_string())
    } else {
        None
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replay_bytes(size: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; size];
        bytes[12..12 + SOCCAR_MAGIC.len()].copy_from_slice(SOCCAR_MAGIC);
        bytes
    }

    #[test]
    fn accepts_minimum_size_rejects_below() {
        let ok = replay_bytes(MIN_REPLAY_SIZE as usize);
        assert!(validate_bytes(&ok).is_ok());

        let small = replay_bytes(MIN_REPLAY_SIZE as usize - 1);
        let err = validate_bytes(&small).unwrap_err();
        assert_eq!(err.code(), "file_too_small");
    }

    #[test]
    fn rejects_above_maximum_size() {
        let big = replay_bytes(MAX_REPLAY_SIZE as usize + 1);
        let err = validate_bytes(&big).unwrap_err();
        assert_eq!(err.code(), "file_too_large");
    }

    #[test]
    fn rejects_missing_magic() {
        let bytes = vec![0u8; MIN_REPLAY_SIZE as usize];
        let err = validate_bytes(&bytes).unwrap_err();
        assert_eq!(err.code(), "missing_magic_bytes");
    }

    #[test]
    fn report_hashes_content_and_flags_crc() {
        let bytes = replay_bytes(MIN_REPLAY_SIZE as usize);
        let report = validate_bytes(&bytes).unwrap();
        assert_eq!(report.sha256.len(), 64);
        assert_eq!(report.format_hint, "replay_soccar");
        assert!(!report.crc_checked);
        assert!(report.warnings.iter().any(|w| w == "crc_not_verified"));
    }
}
