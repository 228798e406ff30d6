use crate::binarize::Bitmap;

/// What kind of repaint the receiver should perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendKind {
    /// Incremental repaint; receiver may keep its diff/ghosting state.
    Incremental,
    /// Receiver must discard internal state and repaint from scratch.
    ForceFull,
}

/// Retains the most recently transmitted bitmap and suppresses redundant
/// transmissions. Transmitting is expensive (slow physical refresh, serial
/// bandwidth), so an unchanged scene must never go out twice.
#[derive(Debug, Default)]
pub struct FrameCache {
    last_sent: Option<Bitmap>,
}

impl FrameCache {
    pub fn new() -> Self {
        FrameCache { last_sent: None }
    }

    /// Decide whether `frame` needs to go out. `force` wins over an exact
    /// cache hit: the receiver may need to clear ghosting even when nothing
    /// changed host-side.
    pub fn decide(&self, frame: &Bitmap, force: bool) -> Option<SendKind> {
        if force {
            return Some(SendKind::ForceFull);
        }
        match &self.last_sent {
            Some(cached) if cached == frame => None,
            _ => Some(SendKind::Incremental),
        }
    }

    /// Install `frame` as the new baseline. Call only once the packet reached
    /// the wire; a failed write must retry against the old baseline.
    pub fn commit(&mut self, frame: Bitmap) {
        self.last_sent = Some(frame);
    }
}
