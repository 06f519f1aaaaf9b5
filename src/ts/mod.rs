//! # MPEG Transport Stream Decoding
//!
//! This module turns raw transport stream bytes into typed packet
//! records:
//!
//! - Sync-byte location with multi-packet confirmation
//! - 188-byte packet framing and header decoding
//! - Adaptation field and PCR extraction
//! - PES header and PTS/DTS timestamp decoding
//!
//! Payload content beyond the header, PCR and PES-header fields is
//! treated as opaque bytes; PSI/SI table semantics are out of scope.
//!
//! ## Example
//!
//! ```rust
//! use tsmon::ts::framer::decode_packets;
//! use tsmon::ts::types::TS_PACKET_SIZE;
//!
//! # fn main() -> tsmon::Result<()> {
//! let mut unit = [0xFFu8; TS_PACKET_SIZE];
//! unit[0] = 0x47; // sync
//! unit[1] = 0x00;
//! unit[2] = 0x21; // PID 0x21
//! unit[3] = 0x13; // payload present, continuity counter 3
//!
//! let packets = decode_packets(&unit)?;
//! assert_eq!(packets[0].pid, 0x21);
//! assert_eq!(packets[0].continuity_counter, 3);
//! # Ok(())
//! # }
//! ```

/// Packet framing over aligned byte buffers
pub mod framer;

/// PES header handling and timestamp decoding
pub mod pes;

/// Sync-byte location with alignment confirmation
pub mod sync;

/// Core TS types and constants
pub mod types;

// Re-export commonly used types and constants
pub use framer::decode_packets;
pub use pes::PesHeader;
pub use sync::find_sync;
pub use types::{
    AdaptationField,
    PidKind,
    TsPacket,
    NULL_PID,
    SYNC_BYTE,
    TS_PACKET_SIZE,
};
