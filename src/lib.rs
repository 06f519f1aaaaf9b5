#![doc(html_root_url = "https://docs.rs/tsmon/0.1.0")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

//! # tsmon - Transport Stream Quality Monitoring
//!
//! `tsmon` decodes MPEG Transport Stream (TS) byte data into structured
//! packets and derives per-elementary-stream quality metrics for
//! broadcast monitoring.
//!
//! ## Features
//!
//! ### Transport Stream Decoding
//! - Sync-byte location with multi-packet alignment confirmation
//! - 188-byte packet framing with header, adaptation field and PCR
//!   extraction
//! - PES header decoding with PTS/DTS timestamps
//!
//! ### Stream Quality Metrics
//! - Per-PID continuity-counter validation with discontinuity
//!   notifications
//! - Transport-error-indicator counting
//! - PCR delta and clock-drift tracking against the wall clock
//! - Windowed (per-period) counters alongside lifetime totals
//!
//! Network ingestion, PSI/SI table semantics, bitrate metrics and report
//! presentation are left to callers; the crate consumes byte buffers and
//! hands back decoded packets, metric snapshots and discontinuity
//! events.
//!
//! ## Quick Start
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! tsmon = "0.1.0"
//! ```
//!
//! ### Decoding and Monitoring Example
//!
//! ```rust
//! use tsmon::metrics::TsMetrics;
//! use tsmon::ts::framer::decode_packets;
//!
//! # fn main() -> tsmon::Result<()> {
//! // One transport stream packet: PID 0x64, payload present.
//! let mut buffer = [0xFFu8; 188];
//! buffer[0] = 0x47;
//! buffer[1] = 0x00;
//! buffer[2] = 0x64;
//! buffer[3] = 0x10;
//!
//! let metrics = TsMetrics::new();
//! for packet in decode_packets(&buffer)? {
//!     metrics.add_packet(&packet)?;
//! }
//!
//! // A periodic trigger publishes the windowed counters.
//! metrics.tick();
//! let snapshot = metrics.metric(0x64).unwrap().snapshot();
//! assert_eq!(snapshot.packet_count, 1);
//! assert_eq!(snapshot.period_packet_count, 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - `ts`: transport stream decoding
//!   - Sync location and packet framing
//!   - Adaptation field, PCR and PES header extraction
//!
//! - `metrics`: per-PID quality tracking
//!   - Continuity, TEI and PCR drift metrics
//!   - Period windowing and discontinuity events
//!
//! - `error`: error types and utilities
//!
//! - `config`: monitoring session configuration

/// Configuration for monitoring sessions
pub mod config;

/// Error types and utilities
pub mod error;

/// Per-PID stream quality metrics
pub mod metrics;

/// Transport stream decoding
pub mod ts;

pub use config::AnalyzerConfig;
pub use error::{Result, TsMonError};
