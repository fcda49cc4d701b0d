//! The null adapter parses nothing from the network stream. It exists so the
//! pipeline always has a backend to fall back to: header-only mode with an
//! honest `unavailable` status.

use super::ParserAdapter;
use crate::frames::{NetworkDiagnostics, NetworkFrames};
use crate::header::Header;
use crate::error::RlCoachResult;

pub struct NullAdapter;

impl ParserAdapter for NullAdapter {
    fn name(&self) -> &'static str {
        "null"
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn supports_network_parsing(&self) -> bool {
        false
    }

    /// Attempts a real header decode through boxcars without the network
    /// stream; a synthetic header derived from nothing but file shape is the
    /// fallback.
    fn parse_header(&self, bytes: &[u8]) -> RlCoachResult<Header> {
        let parsed = boxcars::ParserBuilder::new(bytes)
            .never_parse_network_data()
            .never_check_crc()
            .parse();
        match parsed {
            Ok(replay) => crate::header::decode_header(&replay),
            Err(_) => Ok(Header::synthetic()),
        }
    }

    fn parse_network(&self, _bytes: &[u8]) -> NetworkFrames {
        NetworkFrames::empty(NetworkDiagnostics::unavailable(self.name()))
    }
}
