use super::frame;

pub const MAGIC: &[u8; 4] = b"MWFR";

/// Build a legacy packet: bare bitmap payload, no flags byte. Early firmware
/// always performs a full repaint, so the force-full distinction is lost.
pub fn build_packet(bitmap: &[u8]) -> Vec<u8> {
    frame(MAGIC, bitmap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::unframe;

    #[test]
    fn test_payload_is_bare_bitmap() {
        let packet = build_packet(&[0x12, 0x34]);
        assert_eq!(unframe(MAGIC, &packet).unwrap(), &[0x12, 0x34]);
    }
}
