//! Frame differencing and streaming core for a slow, flow-controlled
//! e-paper display driven over USB serial.
//!
//! The upstream compositor hands this crate a composed RGB [`canvas::Canvas`]
//! whenever the scene changes; the core binarizes it to a packed 1bpp
//! bitmap, suppresses redundant transmissions, wraps the payload in a
//! CRC-checked envelope and paces delivery to what the panel can absorb.

pub mod binarize;
pub mod canvas;
pub mod config;
pub mod diff;
pub mod link;
pub mod pattern;
pub mod protocol;
pub mod scheduler;
