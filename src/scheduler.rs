use std::time::{Duration, Instant};

use log::debug;

use crate::binarize::{binarize, BinarizeOptions};
use crate::canvas::Canvas;
use crate::diff::FrameCache;
use crate::link::{LinkDriver, SendOutcome, Transport};

/// What one scheduler tick did, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Rate limiter says not yet.
    NotDue,
    /// Link is down; streaming stays off until an explicit reconnect.
    Offline,
    /// Frame identical to the last transmitted one; nothing sent.
    Unchanged,
    /// A packet went out (or was attempted) with this result.
    Sent(SendOutcome),
}

/// Decouples the fast render cadence from the slow transmission cadence.
///
/// Invoked once per render tick with the latest composed canvas. Latest-wins:
/// there is no frame queue, so edits landing between two due ticks collapse
/// into whatever the canvas shows when a send is next due.
pub struct StreamScheduler<T: Transport> {
    link: LinkDriver<T>,
    cache: FrameCache,
    options: BinarizeOptions,
    interval: Duration,
    next_allowed: Option<Instant>,
    force_full_next: bool,
}

impl<T: Transport> StreamScheduler<T> {
    pub fn new(link: LinkDriver<T>, options: BinarizeOptions, interval: Duration) -> Self {
        StreamScheduler {
            link,
            cache: FrameCache::new(),
            options,
            interval,
            next_allowed: None,
            // First frame always repaints from scratch to clear the boot
            // checkerboard and any ghosting.
            force_full_next: true,
        }
    }

    /// Make the next transmitted frame a full repaint, even if the bitmap is
    /// byte-identical to the last one sent.
    pub fn request_full_refresh(&mut self) {
        self.force_full_next = true;
    }

    pub fn link(&self) -> &LinkDriver<T> {
        &self.link
    }

    pub fn tick(&mut self, canvas: &Canvas, now: Instant) -> TickOutcome {
        if let Some(next) = self.next_allowed {
            if now < next {
                return TickOutcome::NotDue;
            }
        }
        if !self.link.is_connected() {
            return TickOutcome::Offline;
        }

        // Cheap relative to transport I/O, and recomputing every due tick
        // means an edit can never be missed.
        let bitmap = binarize(canvas, self.options);

        // Advance the gate up front: whatever happens below, a stuck device
        // must not turn the scheduler into a busy retry loop.
        self.next_allowed = Some(now + self.interval);

        let kind = match self.cache.decide(&bitmap, self.force_full_next) {
            Some(kind) => kind,
            None => return TickOutcome::Unchanged,
        };

        let outcome = self.link.send(bitmap.as_bytes(), kind);
        match outcome {
            // An unacknowledged frame still reached the wire; it is treated
            // as best-effort delivered rather than retried blindly.
            SendOutcome::Acked | SendOutcome::AckTimeout => {
                self.cache.commit(bitmap);
                self.force_full_next = false;
            }
            SendOutcome::TransportFatal | SendOutcome::Rejected => {
                debug!("frame not committed after {:?}", outcome);
            }
        }
        TickOutcome::Sent(outcome)
    }
}
