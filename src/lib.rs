#![allow(clippy::result_large_err)]

//! # rlcoach
//!
//! [`rlcoach`](crate) is an offline analysis engine for Rocket League
//! `.replay` files. It ingests the binary artifact, decodes it through the
//! [`boxcars`] library, and emits a schema-validated structured report with
//! per-player and per-team metrics, detected events, mechanic
//! classifications and coaching insights.
//!
//! ## Overview of Key Components
//!
//! - **[`adapter`]**: The parser boundary. [`adapter::ParserAdapter`] is the
//!   pluggable contract; [`adapter::NativeAdapter`] models actor state over
//!   the boxcars network stream and samples engine-facing frames, while
//!   [`adapter::NullAdapter`] is the always-available header-only fallback.
//!   Parse failures never unwind past this boundary; they degrade into
//!   [`frames::NetworkDiagnostics`].
//!
//! - **[`normalize`]**: Turns raw frames into the canonical
//!   [`normalize::NormalizedTimeline`]: stable player identities, arena-
//!   clamped coordinates, a measured sample rate, and a clock zeroed at the
//!   first kickoff. The timeline is immutable after construction and every
//!   downstream stage reads it.
//!
//! - **[`events`] / [`mechanics`]**: Independent detectors over the
//!   timeline. Events cover goals, touches, demolitions, kickoffs, boost
//!   pickups and challenges; mechanics classify per-player actions (flips,
//!   wavedashes, flip resets, aerials, dribbles, flicks and the rest) with
//!   one state machine per player in car-local coordinates.
//!
//! - **[`analysis`]**: The analyzer set. Each analyzer is a pure function
//!   over `(timeline, events, mechanics)` returning a closed typed record;
//!   the aggregator fuses them into per-team and per-player blocks.
//!
//! - **[`report`] / [`schema`]**: Deterministic assembly of the success or
//!   error envelope, structural validation of the emitted JSON, and atomic
//!   file writes.
//!
//! ## Example
//!
//! ```no_run
//! use rlcoach::pipeline::{analyze_file, PipelineOptions};
//!
//! fn print_report(path: &std::path::Path) -> anyhow::Result<()> {
//!     let options = PipelineOptions {
//!         generated_at: chrono::Utc::now(),
//!         ..Default::default()
//!     };
//!     let report = analyze_file(path, &options);
//!     println!("{}", rlcoach::pipeline::render_validated(&report, true)?);
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod analysis;
pub mod constants;
pub mod error;
pub mod events;
pub mod frames;
pub mod header;
pub mod ingest;
pub mod markdown;
pub mod mechanics;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod util;

pub use crate::error::{RlCoachError, RlCoachErrorVariant, RlCoachResult};
pub use crate::frames::*;
pub use crate::header::{Header, Playlist};
pub use crate::normalize::{NormalizedTimeline, PlayerIdentity};
pub use crate::report::{Report, SCHEMA_VERSION};
