pub mod legacy;
pub mod mwf1;

use thiserror::Error;

/// Wire-format variant spoken by the device firmware.
///
/// `Mwf1` is the canonical flagged payload; `Legacy` is the original
/// bitmap-only payload still burned into early units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    Mwf1,
    Legacy,
}

impl WireFormat {
    pub fn from_name(name: &str) -> Option<WireFormat> {
        match name {
            "mwf1" => Some(WireFormat::Mwf1),
            "legacy" => Some(WireFormat::Legacy),
            _ => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("packet shorter than envelope minimum ({0} bytes)")]
    Truncated(usize),
    #[error("bad magic {0:02x?}")]
    BadMagic([u8; 4]),
    #[error("declared payload length {declared} exceeds packet ({available} bytes available)")]
    LengthMismatch { declared: usize, available: usize },
    #[error("checksum mismatch: computed {computed:08x}, packet carries {carried:08x}")]
    ChecksumMismatch { computed: u32, carried: u32 },
}

/// Envelope: `magic(4) | payload_len u32 LE | payload | crc32(payload) u32 LE`.
/// The checksum covers the payload only. Payload size is not validated here;
/// the link driver rejects payloads that do not match the display resolution.
pub fn frame(magic: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut packet = Vec::with_capacity(12 + payload.len());
    packet.extend_from_slice(magic);
    packet.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    packet.extend_from_slice(payload);
    packet.extend_from_slice(&crc32fast::hash(payload).to_le_bytes());
    packet
}

/// Inverse of [`frame`], returning the payload slice. Host-side this only
/// serves tests and loopback tooling; the device is the real consumer.
pub fn unframe<'a>(magic: &[u8; 4], packet: &'a [u8]) -> Result<&'a [u8], FrameError> {
    if packet.len() < 12 {
        return Err(FrameError::Truncated(packet.len()));
    }
    let got: [u8; 4] = packet[0..4].try_into().unwrap();
    if &got != magic {
        return Err(FrameError::BadMagic(got));
    }
    let declared = u32::from_le_bytes(packet[4..8].try_into().unwrap()) as usize;
    let available = packet.len() - 12;
    if declared != available {
        return Err(FrameError::LengthMismatch {
            declared,
            available,
        });
    }
    let payload = &packet[8..8 + declared];
    let carried = u32::from_le_bytes(packet[8 + declared..12 + declared].try_into().unwrap());
    let computed = crc32fast::hash(payload);
    if computed != carried {
        return Err(FrameError::ChecksumMismatch { computed, carried });
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let payload = b"hello frame".to_vec();
        let packet = frame(mwf1::MAGIC, &payload);
        assert_eq!(unframe(mwf1::MAGIC, &packet).unwrap(), &payload[..]);
    }

    #[test]
    fn test_envelope_layout() {
        let packet = frame(b"MWF1", &[0xAB, 0xCD]);
        assert_eq!(&packet[0..4], b"MWF1");
        assert_eq!(&packet[4..8], &2u32.to_le_bytes());
        assert_eq!(&packet[8..10], &[0xAB, 0xCD]);
        assert_eq!(
            &packet[10..14],
            &crc32fast::hash(&[0xAB, 0xCD]).to_le_bytes()
        );
    }

    #[test]
    fn test_known_crc32_vector() {
        // zlib/PNG CRC-32 of "123456789" is 0xCBF43926.
        let packet = frame(b"MWF1", b"123456789");
        let n = packet.len();
        assert_eq!(
            u32::from_le_bytes(packet[n - 4..].try_into().unwrap()),
            0xCBF43926
        );
    }

    #[test]
    fn test_any_single_bit_flip_breaks_checksum() {
        let payload = vec![0x55u8; 32];
        let packet = frame(b"MWF1", &payload);
        for byte in 0..payload.len() {
            for bit in 0..8 {
                let mut corrupt = packet.clone();
                corrupt[8 + byte] ^= 1 << bit;
                assert!(matches!(
                    unframe(b"MWF1", &corrupt),
                    Err(FrameError::ChecksumMismatch { .. })
                ));
            }
        }
    }

    #[test]
    fn test_bad_magic_rejected() {
        let packet = frame(b"MWF1", b"x");
        assert_eq!(
            unframe(b"MWFR", &packet),
            Err(FrameError::BadMagic(*b"MWF1"))
        );
    }

    #[test]
    fn test_truncated_rejected() {
        assert_eq!(unframe(b"MWF1", &[0u8; 5]), Err(FrameError::Truncated(5)));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let mut packet = frame(b"MWF1", b"abcd");
        packet[4] = 9;
        assert!(matches!(
            unframe(b"MWF1", &packet),
            Err(FrameError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_format_from_name() {
        assert_eq!(WireFormat::from_name("mwf1"), Some(WireFormat::Mwf1));
        assert_eq!(WireFormat::from_name("legacy"), Some(WireFormat::Legacy));
        assert_eq!(WireFormat::from_name("mwf2"), None);
    }
}
