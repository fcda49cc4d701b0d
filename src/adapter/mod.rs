//! Parser adapters. An adapter decodes the replay header and network stream
//! into engine-facing frames; failures degrade into diagnostics instead of
//! propagating. The native adapter is boxcars-backed; the null adapter is the
//! always-available last resort.

pub mod native;
pub mod null;
pub mod pads;

pub use native::NativeAdapter;
pub use null::NullAdapter;
pub use pads::PadRegistry;

use crate::error::{RlCoachError, RlCoachErrorVariant, RlCoachResult};
use crate::frames::NetworkFrames;
use crate::header::Header;

/// Ordered backend override, comma separated backend names.
pub static BACKEND_CHAIN_ENV: &str = "RLCOACH_PARSER_BACKEND_CHAIN";

/// Truthy switch enabling verbose pad-pickup logging.
pub static DEBUG_BOOST_EVENTS_ENV: &str = "RLCOACH_DEBUG_BOOST_EVENTS";

/// The contract both adapters implement. `parse_network` never fails: every
/// outcome, including total unavailability, is expressed through
/// [`crate::frames::NetworkDiagnostics`].
pub trait ParserAdapter {
    fn name(&self) -> &'static str;
    fn version(&self) -> &'static str;
    fn supports_network_parsing(&self) -> bool;
    fn parse_header(&self, bytes: &[u8]) -> RlCoachResult<Header>;
    fn parse_network(&self, bytes: &[u8]) -> NetworkFrames;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdapterKind {
    #[default]
    Native,
    Null,
}

impl AdapterKind {
    pub fn from_name(name: &str) -> RlCoachResult<Self> {
        match name {
            // `rust` is the CLI-facing alias for the in-process native parser.
            "rust" | "native" | "boxcars" => Ok(AdapterKind::Native),
            "null" => Ok(AdapterKind::Null),
            other => RlCoachError::new_result(RlCoachErrorVariant::UnknownBackend {
                name: other.to_string(),
            }),
        }
    }
}

pub fn resolve_adapter(kind: AdapterKind) -> Box<dyn ParserAdapter> {
    match kind {
        AdapterKind::Native => Box::new(NativeAdapter::new()),
        AdapterKind::Null => Box::new(NullAdapter),
    }
}

/// The ordered backend names the native adapter will attempt.
pub fn backend_chain() -> Vec<String> {
    match std::env::var(BACKEND_CHAIN_ENV) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        _ => vec!["boxcars".to_string()],
    }
}

pub fn debug_boost_events() -> bool {
    std::env::var(DEBUG_BOOST_EVENTS_ENV)
        .map(|v| {
            let v = v.trim().to_ascii_lowercase();
            !(v.is_empty() || v == "0" || v == "false" || v == "no")
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_kind_resolution() {
        assert_eq!(AdapterKind::from_name("rust").unwrap(), AdapterKind::Native);
        assert_eq!(AdapterKind::from_name("null").unwrap(), AdapterKind::Null);
        assert!(AdapterKind::from_name("haskell").is_err());
    }
}
