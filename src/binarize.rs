use crate::canvas::Canvas;

/// Default alpha-coverage cutoff for glyph binarization, roughly 10% of full
/// coverage. Lower makes strokes thinner (risking holes), higher bolder.
pub const DEFAULT_COVERAGE_CUTOFF: u8 = 26;

/// Packed 1bpp frame, row-major, MSB = leftmost column of the row.
/// Bit 1 = white/background, bit 0 = black/foreground. Trailing padding bits
/// of a row's last partial byte are left at 1; receivers ignore them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    bytes: Vec<u8>,
}

impl Bitmap {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Expected packed size for a given resolution.
pub fn frame_bytes(width: usize, height: usize) -> usize {
    ((width + 7) / 8) * height
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BinarizeOptions {
    /// Swap foreground/background polarity on the wire.
    pub invert: bool,
    /// Horizontally mirror the wire bitmap for the headset optics.
    /// Affects only the packed bytes, never the on-screen preview.
    pub mirror: bool,
}

/// Pack a canvas into the wire bitmap. Pure and deterministic.
///
/// A pixel is foreground iff its integer luminance `(30R + 59G + 11B) / 100`
/// is below 128, XORed with `invert`. The buffer starts all-ones and
/// foreground pixels clear bit `7 - (x % 8)` of their row byte.
pub fn binarize(canvas: &Canvas, opts: BinarizeOptions) -> Bitmap {
    let (w, h) = (canvas.width(), canvas.height());
    let bytes_per_row = (w + 7) / 8;
    let mut bytes = vec![0xFFu8; bytes_per_row * h];

    for y in 0..h {
        let row = y * bytes_per_row;
        for x in 0..w {
            let src_x = if opts.mirror { w - 1 - x } else { x };
            let [r, g, b] = canvas.pixel(src_x, y);
            let luma = (30 * r as u32 + 59 * g as u32 + 11 * b as u32) / 100;
            let black = (luma < 128) ^ opts.invert;
            if black {
                bytes[row + x / 8] &= !(1 << (7 - (x % 8)));
            }
        }
    }

    Bitmap { bytes }
}

/// Snap anti-aliased glyph coverage to fully-on or fully-off.
///
/// Meant to run at glyph-generation time, before compositing: thresholding
/// coverage here guarantees thin strokes either survive binarization whole or
/// drop out whole, instead of landing on a gray value that the luminance
/// threshold in [`binarize`] would silently erase.
pub fn threshold_coverage(alpha: &mut [u8], cutoff: u8) {
    for a in alpha.iter_mut() {
        *a = if *a >= cutoff { 0xFF } else { 0 };
    }
}
