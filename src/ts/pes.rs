use crate::error::{Result, TsMonError};
use bytes::Bytes;

/// Byte offset of the PTS field within a PES header.
const PTS_OFFSET: usize = 9;
/// Byte offset of the DTS field when both timestamps are present.
const DTS_OFFSET: usize = 14;
/// Fixed PES header size preceding the optional fields.
const PES_FIXED_HEADER_SIZE: usize = 9;

/// Packetized Elementary Stream header, decoded from the start of a
/// payload-unit-start packet.
///
/// Only the monitoring-relevant fields are pulled out; the full header
/// bytes up to and including the declared header-data length are kept in
/// `raw` for collaborators that need deeper inspection.
#[derive(Debug, Clone)]
pub struct PesHeader {
    /// Start code: 0x100 plus the stream id byte.
    pub start_code: u16,
    /// Presentation timestamp in 90 kHz ticks, when signalled.
    pub pts: Option<u64>,
    /// Decode timestamp in 90 kHz ticks, when signalled.
    pub dts: Option<u64>,
    /// Raw header bytes, truncated at the packet boundary if the declared
    /// length overruns it.
    pub raw: Bytes,
}

/// Probes `data` for a PES header and decodes it.
///
/// Returns `Ok(None)` when the bytes do not begin with the `00 00 01`
/// start-code prefix; payload-unit-start packets without the prefix carry
/// PSI sections or continuation data, which is not an error. When the
/// prefix is present, the second element of the returned pair is the
/// declared header length (fixed part plus header-data length), which the
/// caller consumes from the packet payload.
///
/// # Errors
///
/// Timestamp syntax violations are fatal for the surrounding buffer:
/// a wrong 4-bit timestamp code, a cleared marker bit, the reserved
/// `pts_dts_flags` value `01`, or a header too short to hold its declared
/// fields.
pub(crate) fn decode_pes_header(data: &[u8]) -> Result<Option<(PesHeader, usize)>> {
    if data.len() < 3 || data[0] != 0x00 || data[1] != 0x00 || data[2] != 0x01 {
        return Ok(None);
    }

    if data.len() < PES_FIXED_HEADER_SIZE {
        return Err(TsMonError::PesSyntax(
            "start code present but header truncated".into(),
        ));
    }

    let start_code = 0x100 + data[3] as u16;
    let pts_dts_flags = data[7] >> 6;

    let (pts, dts) = match pts_dts_flags {
        0b00 => (None, None),
        0b10 => (Some(decode_timestamp(2, data, PTS_OFFSET)?), None),
        0b11 => (
            Some(decode_timestamp(3, data, PTS_OFFSET)?),
            Some(decode_timestamp(1, data, DTS_OFFSET)?),
        ),
        _ => return Err(TsMonError::PesSyntax("pts_dts_flags = 1".into())),
    };

    let declared_len = PES_FIXED_HEADER_SIZE + data[8] as usize;
    let raw = Bytes::copy_from_slice(&data[..declared_len.min(data.len())]);

    Ok(Some((
        PesHeader {
            start_code,
            pts,
            dts,
            raw,
        },
        declared_len,
    )))
}

/// Decodes a 33-bit PES timestamp from the 5-byte 15/15/3-bit wire layout.
///
/// The upper nibble of the first byte must equal `code`, and the three
/// odd-parity marker bits must all be set.
fn decode_timestamp(code: u8, data: &[u8], offset: usize) -> Result<u64> {
    if data.len() < offset + 5 {
        return Err(TsMonError::PesSyntax("timestamp field truncated".into()));
    }

    if data[offset] >> 4 != code {
        return Err(TsMonError::PesSyntax("wrong timestamp code".into()));
    }

    if data[offset] & 1 != 1 || data[offset + 2] & 1 != 1 || data[offset + 4] & 1 != 1 {
        return Err(TsMonError::PesSyntax("invalid timestamp marker bit".into()));
    }

    let high = ((data[offset] >> 1) & 0x07) as u64;
    let mid = ((data[offset + 1] as u64) << 7) | (data[offset + 2] as u64 >> 1);
    let low = ((data[offset + 3] as u64) << 7) | (data[offset + 4] as u64 >> 1);

    Ok((high << 30) | (mid << 15) | low)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Encodes a 33-bit timestamp into the 5-byte wire layout with the
    /// given 4-bit code.
    fn encode_timestamp(code: u8, ts: u64) -> [u8; 5] {
        let ts = ts & 0x1_FFFF_FFFF;
        [
            (code << 4) | (((ts >> 30) as u8 & 0x07) << 1) | 1,
            (ts >> 22) as u8,
            (((ts >> 15) as u8 & 0x7F) << 1) | 1,
            (ts >> 7) as u8,
            ((ts as u8 & 0x7F) << 1) | 1,
        ]
    }

    fn pes_with_pts(pts: u64) -> Vec<u8> {
        let mut data = vec![0x00, 0x00, 0x01, 0xE0, 0x00, 0x00, 0x80, 0x80, 0x05];
        data.extend_from_slice(&encode_timestamp(2, pts));
        data
    }

    #[test]
    fn test_no_start_code_is_not_an_error() {
        assert!(decode_pes_header(&[0x00, 0x00, 0x02, 0xE0]).unwrap().is_none());
        assert!(decode_pes_header(&[0xFF; 10]).unwrap().is_none());
        assert!(decode_pes_header(&[0x00, 0x00]).unwrap().is_none());
    }

    #[test]
    fn test_decode_pts_only() {
        let data = pes_with_pts(0x12345);
        let (header, consumed) = decode_pes_header(&data).unwrap().unwrap();
        assert_eq!(header.start_code, 0x1E0);
        assert_eq!(header.pts, Some(0x12345));
        assert_eq!(header.dts, None);
        assert_eq!(consumed, 14);
        assert_eq!(header.raw.len(), 14);
    }

    #[test]
    fn test_decode_pts_and_dts() {
        let mut data = vec![0x00, 0x00, 0x01, 0xC0, 0x00, 0x00, 0x80, 0xC0, 0x0A];
        data.extend_from_slice(&encode_timestamp(3, 90_000));
        data.extend_from_slice(&encode_timestamp(1, 86_400));
        let (header, consumed) = decode_pes_header(&data).unwrap().unwrap();
        assert_eq!(header.start_code, 0x1C0);
        assert_eq!(header.pts, Some(90_000));
        assert_eq!(header.dts, Some(86_400));
        assert_eq!(consumed, 19);
    }

    #[test]
    fn test_pts_dts_flags_one_is_fatal() {
        let data = vec![0x00, 0x00, 0x01, 0xE0, 0x00, 0x00, 0x80, 0x40, 0x00];
        assert!(matches!(
            decode_pes_header(&data),
            Err(TsMonError::PesSyntax(_))
        ));
    }

    #[test]
    fn test_wrong_timestamp_code_is_fatal() {
        let mut data = vec![0x00, 0x00, 0x01, 0xE0, 0x00, 0x00, 0x80, 0x80, 0x05];
        data.extend_from_slice(&encode_timestamp(3, 1234));
        assert!(matches!(
            decode_pes_header(&data),
            Err(TsMonError::PesSyntax(_))
        ));
    }

    #[test]
    fn test_cleared_marker_bit_is_fatal() {
        let mut data = pes_with_pts(0x12345);
        data[9] &= !1;
        assert!(matches!(
            decode_pes_header(&data),
            Err(TsMonError::PesSyntax(_))
        ));
    }

    #[test]
    fn test_timestamp_round_trip_extremes() {
        for ts in [0u64, 1, 0x1_0000_0000, 0x1_FFFF_FFFF] {
            let wire = encode_timestamp(2, ts);
            assert_eq!(decode_timestamp(2, &wire, 0).unwrap(), ts & 0x1_FFFF_FFFF);
        }
    }
}
