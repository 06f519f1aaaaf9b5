use super::pes::decode_pes_header;
use super::sync::find_sync;
use super::types::*;
use crate::error::{Result, TsMonError};
use bytes::Bytes;

/// Decodes a buffer of transport stream data into packets.
///
/// The buffer is expected to hold whole 188-byte packets, e.g. one network
/// read chunk at a time. Framing starts at the first confirmed sync
/// position and proceeds packet by packet; a missing sync marker at a
/// packet boundary silently ends the pass, since the remainder of the
/// buffer cannot be trusted to be aligned. A buffer with no confirmed sync
/// position yields an empty sequence.
///
/// # Errors
///
/// Structural violations reject the whole buffer with no partial results:
/// an empty input, an adaptation field whose declared size reaches past
/// the packet payload, or PES header syntax errors. Offsets past such a
/// violation are not trustworthy, so decoding never resumes mid-buffer.
pub fn decode_packets(data: &[u8]) -> Result<Vec<TsPacket>> {
    if data.is_empty() {
        return Err(TsMonError::Framing("empty buffer".into()));
    }

    let mut packets = Vec::with_capacity(data.len() / TS_PACKET_SIZE);

    let Some(mut start) = find_sync(data, 0) else {
        return Ok(packets);
    };

    while start + TS_PACKET_SIZE <= data.len() {
        packets.push(decode_unit(&data[start..start + TS_PACKET_SIZE])?);

        start += TS_PACKET_SIZE;
        if start >= data.len() {
            break;
        }
        if data[start] != SYNC_BYTE {
            log::debug!("sync lost at offset {start}, ending frame pass");
            break;
        }
    }

    Ok(packets)
}

/// Decodes one 188-byte unit.
fn decode_unit(unit: &[u8]) -> Result<TsPacket> {
    let header = u32::from_be_bytes([unit[0], unit[1], unit[2], unit[3]]);

    let mut packet = TsPacket {
        sync_byte: (header >> 24) as u8,
        transport_error: header & 0x0080_0000 != 0,
        payload_unit_start: header & 0x0040_0000 != 0,
        transport_priority: header & 0x0020_0000 != 0,
        pid: ((header >> 8) & 0x1FFF) as u16,
        scrambling_control: ((header >> 6) & 0x03) as u8,
        adaptation_field_exists: header & 0x0000_0020 != 0,
        contains_payload: header & 0x0000_0010 != 0,
        continuity_counter: (header & 0x0000_000F) as u8,
        adaptation_field: None,
        pes_header: None,
        payload: Bytes::new(),
    };

    // Packets without payload, with uncorrectable errors, or on the
    // stuffing PID carry nothing worth decoding further.
    if !packet.contains_payload || packet.transport_error || packet.pid == NULL_PID {
        return Ok(packet);
    }

    let mut offset = TS_HEADER_SIZE;
    let mut remaining = TS_PACKET_SIZE - TS_HEADER_SIZE;

    if packet.adaptation_field_exists {
        let field = decode_adaptation_field(unit);
        if field.field_size >= remaining {
            return Err(TsMonError::Framing(format!(
                "adaptation field size {} overruns the {} payload bytes",
                field.field_size, remaining
            )));
        }
        offset += field.field_size;
        remaining -= field.field_size;
        packet.adaptation_field = Some(field);
    }

    if packet.payload_unit_start {
        if let Some((pes, declared_len)) = decode_pes_header(&unit[offset..])? {
            packet.pes_header = Some(pes);
            match remaining.checked_sub(declared_len) {
                Some(left) if left >= 1 => {
                    offset += declared_len;
                    remaining = left;
                }
                _ => {
                    // PES header consumed every remaining byte; the packet
                    // is unusable downstream.
                    packet.transport_error = true;
                    return Ok(packet);
                }
            }
        }
    }

    if remaining < 1 {
        packet.transport_error = true;
    } else {
        packet.payload = Bytes::copy_from_slice(&unit[offset..offset + remaining]);
    }

    Ok(packet)
}

/// Decodes the adaptation field at the head of a unit's payload area.
///
/// The field size includes the length byte itself. A zero-length field
/// (size 1) carries no flags; flag and PCR decoding only happens when the
/// field extends past the length byte.
fn decode_adaptation_field(unit: &[u8]) -> AdaptationField {
    let field_size = 1 + unit[TS_HEADER_SIZE] as usize;

    let mut field = AdaptationField {
        field_size,
        discontinuity: false,
        random_access: false,
        es_priority: false,
        pcr_flag: false,
        opcr_flag: false,
        splicing_point_flag: false,
        private_data_flag: false,
        extension_flag: false,
        pcr: None,
    };

    if field_size < 2 {
        return field;
    }

    let flags = unit[TS_HEADER_SIZE + 1];
    field.discontinuity = flags & 0x80 != 0;
    field.random_access = flags & 0x40 != 0;
    field.es_priority = flags & 0x20 != 0;
    field.pcr_flag = flags & 0x10 != 0;
    field.opcr_flag = flags & 0x08 != 0;
    field.splicing_point_flag = flags & 0x04 != 0;
    field.private_data_flag = flags & 0x02 != 0;
    field.extension_flag = flags & 0x01 != 0;

    if field.pcr_flag {
        field.pcr = Some(decode_pcr(&unit[TS_HEADER_SIZE + 2..TS_HEADER_SIZE + 8]));
    }

    field
}

/// Reconstructs a 42-bit PCR from the 6-byte adaptation field layout.
///
/// Deviation from the standard reconstruction: the 33rd base bit (top bit
/// of the fifth byte) is not folded in, so bit 0 of the base is always
/// clear. Downstream drift figures are calibrated against this truncated
/// value.
fn decode_pcr(bytes: &[u8]) -> u64 {
    let base = (u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as u64) << 1;
    let extension = (((bytes[4] & 0x01) as u64) << 8) | bytes[5] as u64;
    base * 300 + extension
}
