use serde::Serialize;
use std::backtrace::Backtrace;
use thiserror::Error;

/// [`RlCoachErrorVariant`] enumerates everything that can go wrong between
/// ingest and report emission. Ingest and header-fatal variants short-circuit
/// to the error envelope; everything parser-side degrades into
/// [`crate::frames::NetworkDiagnostics`] instead of surfacing here.
#[derive(Error, Debug, Clone)]
pub enum RlCoachErrorVariant {
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    #[error("replay file too small: {size} bytes (minimum {minimum})")]
    FileTooSmall { size: u64, minimum: u64 },

    #[error("replay file too large: {size} bytes (maximum {maximum})")]
    FileTooLarge { size: u64, maximum: u64 },

    #[error("missing replay magic bytes")]
    MissingMagicBytes,

    #[error("i/o error reading {path}: {detail}")]
    Io { path: String, detail: String },

    #[error("header could not be decoded: {detail}")]
    HeaderUnreadable { detail: String },

    #[error("unknown parser backend {name:?}")]
    UnknownBackend { name: String },

    #[error("report failed schema validation: {violations:?}")]
    SchemaViolation { violations: Vec<String> },

    #[error("could not write report to {path}: {detail}")]
    ReportWrite { path: String, detail: String },
}

/// [`RlCoachError`] pairs a variant with the backtrace captured where it was
/// raised.
#[derive(Debug)]
pub struct RlCoachError {
    pub backtrace: Backtrace,
    pub variant: RlCoachErrorVariant,
}

impl RlCoachError {
    pub fn new(variant: RlCoachErrorVariant) -> Self {
        Self {
            backtrace: Backtrace::capture(),
            variant,
        }
    }

    pub fn new_result<T>(variant: RlCoachErrorVariant) -> Result<T, Self> {
        Err(Self::new(variant))
    }

    /// Stable taxonomy token for the variant, used in envelope details and
    /// diagnostics.
    pub fn code(&self) -> &'static str {
        match &self.variant {
            RlCoachErrorVariant::FileNotFound { .. } => "file_not_found",
            RlCoachErrorVariant::FileTooSmall { .. } => "file_too_small",
            RlCoachErrorVariant::FileTooLarge { .. } => "file_too_large",
            RlCoachErrorVariant::MissingMagicBytes => "missing_magic_bytes",
            RlCoachErrorVariant::Io { .. } => "io_error",
            RlCoachErrorVariant::HeaderUnreadable { .. } => "header_unreadable",
            RlCoachErrorVariant::UnknownBackend { .. } => "unknown_backend",
            RlCoachErrorVariant::SchemaViolation { .. } => "schema_violation",
            RlCoachErrorVariant::ReportWrite { .. } => "report_write_failed",
        }
    }

    /// `<code>: <detail>` sanitized and bounded for the error envelope.
    pub fn envelope_details(&self) -> String {
        truncate_detail(&format!("{}: {}", self.code(), self.variant))
    }
}

impl std::fmt::Display for RlCoachError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.variant)
    }
}

impl std::error::Error for RlCoachError {}

pub type RlCoachResult<T> = Result<T, RlCoachError>;

/// Maximum length of any human detail string carried in diagnostics or the
/// error envelope.
pub const MAX_DETAIL_LEN: usize = 512;

/// Truncates a detail string to [`MAX_DETAIL_LEN`] on a char boundary.
pub fn truncate_detail(detail: &str) -> String {
    if detail.len() <= MAX_DETAIL_LEN {
        return detail.to_string();
    }
    let mut end = MAX_DETAIL_LEN;
    while !detail.is_char_boundary(end) {
        end -= 1;
    }
    detail[..end].to_string()
}

/// Non-fatal parser degradation codes. These populate
/// `quality.parser.network_diagnostics.error_code` and never abort a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradationCode {
    NetworkError,
    UnknownAttribute,
    CrcFailNetwork,
    ParserResourceExceeded,
}

impl DegradationCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DegradationCode::NetworkError => "network_error",
            DegradationCode::UnknownAttribute => "unknown_attribute",
            DegradationCode::CrcFailNetwork => "crc_fail_network",
            DegradationCode::ParserResourceExceeded => "parser_resource_exceeded",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_details_carry_code_prefix() {
        let err = RlCoachError::new(RlCoachErrorVariant::MissingMagicBytes);
        assert!(err.envelope_details().starts_with("missing_magic_bytes:"));
    }

    #[test]
    fn detail_truncation_bounds_length() {
        let long = "x".repeat(2000);
        assert_eq!(truncate_detail(&long).len(), MAX_DETAIL_LEN);
        assert_eq!(truncate_detail("short"), "short");
    }
}
