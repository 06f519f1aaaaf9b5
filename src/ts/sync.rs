use super::types::{SYNC_BYTE, TS_PACKET_SIZE};

/// Number of consecutive packet starts that must carry the sync marker
/// before an offset is accepted as true alignment.
const SYNC_CONFIRMATIONS: usize = 5;

/// Scans `data` from `offset` for the start of a TS packet.
///
/// A candidate position must hold the sync marker, and so must every
/// position one packet length ahead of it, up to four packets out, for as
/// long as those positions lie within the buffer. This distinguishes real
/// frame alignment from a 0x47 byte occurring inside payload data.
///
/// Returns the first offset satisfying all in-bounds checks, or `None`
/// when the buffer is shorter than one packet or holds no aligned
/// position.
pub fn find_sync(data: &[u8], offset: usize) -> Option<usize> {
    if data.len() < TS_PACKET_SIZE {
        return None;
    }

    for candidate in offset..data.len() {
        if data[candidate] != SYNC_BYTE {
            continue;
        }

        let confirmed = (1..SYNC_CONFIRMATIONS).all(|ahead| {
            let probe = candidate + ahead * TS_PACKET_SIZE;
            probe >= data.len() || data[probe] == SYNC_BYTE
        });

        if confirmed {
            return Some(candidate);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet_at(buf: &mut [u8], offset: usize) {
        buf[offset] = SYNC_BYTE;
        for b in buf[offset + 1..offset + TS_PACKET_SIZE].iter_mut() {
            *b = 0xAA;
        }
    }

    #[test]
    fn test_rejects_short_buffer() {
        let data = [SYNC_BYTE; 187];
        assert_eq!(find_sync(&data, 0), None);
    }

    #[test]
    fn test_aligned_stream_found_at_zero() {
        let mut data = vec![0u8; TS_PACKET_SIZE * 5];
        for i in 0..5 {
            packet_at(&mut data, i * TS_PACKET_SIZE);
        }
        assert_eq!(find_sync(&data, 0), Some(0));
    }

    #[test]
    fn test_skips_decoy_sync_in_payload() {
        // 10 bytes of junk with a decoy 0x47 at index 2, then two aligned
        // packets at offset 10. The decoy fails its +188 confirmation.
        let mut data = vec![0u8; 10 + TS_PACKET_SIZE * 2];
        data[2] = SYNC_BYTE;
        packet_at(&mut data, 10);
        packet_at(&mut data, 10 + TS_PACKET_SIZE);
        assert_eq!(find_sync(&data, 0), Some(10));
    }

    #[test]
    fn test_no_sync_in_garbage() {
        let data = vec![0xFFu8; TS_PACKET_SIZE * 3];
        assert_eq!(find_sync(&data, 0), None);
    }

    #[test]
    fn test_honors_start_offset() {
        let mut data = vec![0u8; TS_PACKET_SIZE * 2];
        packet_at(&mut data, 0);
        packet_at(&mut data, TS_PACKET_SIZE);
        assert_eq!(find_sync(&data, 1), Some(TS_PACKET_SIZE));
    }
}
