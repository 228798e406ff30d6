use super::frame;

pub const MAGIC: &[u8; 4] = b"MWF1";

/// Payload flags byte, bit 0: receiver must discard incremental-update state
/// and repaint from scratch.
pub const FLAG_FORCE_FULL: u8 = 0x01;

/// Build an MWF1 packet: one flags byte followed by the packed bitmap,
/// wrapped in the standard envelope.
pub fn build_packet(flags: u8, bitmap: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(1 + bitmap.len());
    payload.push(flags);
    payload.extend_from_slice(bitmap);
    frame(MAGIC, &payload)
}
