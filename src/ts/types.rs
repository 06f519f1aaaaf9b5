use super::pes::PesHeader;
use bytes::Bytes;
use std::time::Duration;

/// Fixed size of a transport stream packet in bytes.
pub const TS_PACKET_SIZE: usize = 188;
/// Size of the fixed TS packet header in bytes.
pub const TS_HEADER_SIZE: usize = 4;
/// Sync marker at the start of every TS packet.
pub const SYNC_BYTE: u8 = 0x47;
/// Stuffing PID, exempt from continuity checking.
pub const NULL_PID: u16 = 0x1FFF;

/// PTS/DTS clock rate in Hz.
pub const PTS_HZ: u64 = 90_000;
/// PCR clock rate in Hz.
pub const PCR_HZ: u64 = 27_000_000;
/// PCR ticks per millisecond.
pub const PCR_TICKS_PER_MS: u64 = PCR_HZ / 1000;

/// Optional per-packet structure preceding the payload, carrying timing
/// and control flags.
#[derive(Debug, Clone)]
pub struct AdaptationField {
    /// Total field size in bytes, including the length byte itself.
    pub field_size: usize,
    /// Discontinuity indicator; the PCR on this packet must not feed
    /// drift computation.
    pub discontinuity: bool,
    /// Random access indicator.
    pub random_access: bool,
    /// Elementary stream priority indicator.
    pub es_priority: bool,
    /// PCR present in this field.
    pub pcr_flag: bool,
    /// Original PCR present in this field.
    pub opcr_flag: bool,
    /// Splice countdown present.
    pub splicing_point_flag: bool,
    /// Transport private data present.
    pub private_data_flag: bool,
    /// Adaptation field extension present.
    pub extension_flag: bool,
    /// Program Clock Reference as a 27 MHz tick count, when `pcr_flag`
    /// is set.
    pub pcr: Option<u64>,
}

/// One 188-byte transport stream packet, decoded.
///
/// Constructed by [`decode_packets`](super::framer::decode_packets) and
/// immutable afterwards. `adaptation_field` and `pes_header` are only
/// populated on the payload-decode path (payload present, no transport
/// error, not the null PID).
#[derive(Debug, Clone)]
pub struct TsPacket {
    /// Leading byte, 0x47 on a well-formed packet.
    pub sync_byte: u8,
    /// Set by a demodulator/FEC layer when the packet carries
    /// uncorrectable bit errors, or by the framer when no payload bytes
    /// survive header consumption.
    pub transport_error: bool,
    /// True when this packet starts a PES packet or a PSI section.
    pub payload_unit_start: bool,
    /// Transport priority flag.
    pub transport_priority: bool,
    /// 13-bit packet identifier.
    pub pid: u16,
    /// 2-bit scrambling control field.
    pub scrambling_control: u8,
    /// Adaptation field declared in the header.
    pub adaptation_field_exists: bool,
    /// Payload declared in the header.
    pub contains_payload: bool,
    /// 4-bit per-PID continuity counter.
    pub continuity_counter: u8,
    /// Decoded adaptation field, when declared and decoded.
    pub adaptation_field: Option<AdaptationField>,
    /// Decoded PES header, when this packet starts a PES payload unit.
    pub pes_header: Option<PesHeader>,
    /// Opaque payload bytes remaining after header, adaptation field and
    /// PES header consumption.
    pub payload: Bytes,
}

/// Well-known PID assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PidKind {
    /// Program Association Table (0x0000).
    Pat,
    /// Conditional Access Table (0x0001).
    Cat,
    /// Transport stream description (0x0002).
    TsDescription,
    /// Network Information Table (0x0010).
    Nit,
    /// Service Description Table (0x0011).
    Sdt,
    /// Stuffing (0x1FFF).
    Null,
    /// Anything else: elementary streams, PMTs, private data.
    Other,
}

impl PidKind {
    /// Classifies a PID against the well-known assignments.
    pub fn classify(pid: u16) -> Self {
        match pid {
            0x0000 => PidKind::Pat,
            0x0001 => PidKind::Cat,
            0x0002 => PidKind::TsDescription,
            0x0010 => PidKind::Nit,
            0x0011 => PidKind::Sdt,
            NULL_PID => PidKind::Null,
            _ => PidKind::Other,
        }
    }
}

/// Converts a PCR tick count (27 MHz) into a [`Duration`].
pub fn pcr_to_duration(pcr: u64) -> Duration {
    let secs = pcr / PCR_HZ;
    let nanos = (pcr % PCR_HZ) * 1_000_000_000 / PCR_HZ;
    Duration::new(secs, nanos as u32)
}

/// Converts a PTS/DTS tick count (90 kHz) into a [`Duration`].
pub fn pts_to_duration(pts: u64) -> Duration {
    Duration::from_nanos(pts * 1_000_000_000 / PTS_HZ)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pcr_to_duration() {
        assert_eq!(pcr_to_duration(0), Duration::ZERO);
        assert_eq!(pcr_to_duration(PCR_HZ), Duration::from_secs(1));
        assert_eq!(pcr_to_duration(PCR_TICKS_PER_MS), Duration::from_millis(1));
        assert_eq!(
            pcr_to_duration(PCR_HZ * 90 + PCR_TICKS_PER_MS * 500),
            Duration::from_millis(90_500)
        );
    }

    #[test]
    fn test_pts_to_duration() {
        assert_eq!(pts_to_duration(PTS_HZ), Duration::from_secs(1));
        assert_eq!(pts_to_duration(90), Duration::from_millis(1));
    }

    #[test]
    fn test_pid_classification() {
        assert_eq!(PidKind::classify(0x0000), PidKind::Pat);
        assert_eq!(PidKind::classify(0x0011), PidKind::Sdt);
        assert_eq!(PidKind::classify(0x1FFF), PidKind::Null);
        assert_eq!(PidKind::classify(0x0100), PidKind::Other);
    }
}
