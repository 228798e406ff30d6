use crate::binarize::{threshold_coverage, DEFAULT_COVERAGE_CUTOFF};
use crate::canvas::Canvas;

const CHECKER_CELL: usize = 24;
const MARGIN_X: usize = 40;
const MARGIN_Y: usize = 20;

/// Built-in diagnostic pattern: a one-pixel border, a checkerboard inset from
/// the edges, and one disc per eye half. `phase` shifts the checker parity so
/// consecutive frames differ and the diff engine actually has work to do.
pub fn test_pattern(width: usize, height: usize, phase: usize) -> Canvas {
    let mut canvas = Canvas::new(width, height);
    let black = [0u8, 0, 0];

    for x in 0..width {
        canvas.set_pixel(x, 0, black);
        canvas.set_pixel(x, height - 1, black);
    }
    for y in 0..height {
        canvas.set_pixel(0, y, black);
        canvas.set_pixel(width - 1, y, black);
    }

    for y in MARGIN_Y..height.saturating_sub(MARGIN_Y) {
        for x in MARGIN_X..width.saturating_sub(MARGIN_X) {
            if (x / CHECKER_CELL + y / CHECKER_CELL + phase) % 2 == 0 {
                canvas.set_pixel(x, y, black);
            }
        }
    }

    // One disc per eye half, echoing the headset's stereo layout.
    let radius = (width.min(height) / 10) as f32;
    let cy = height as f32 / 2.0;
    draw_disc(&mut canvas, width as f32 / 4.0, cy, radius);
    draw_disc(&mut canvas, width as f32 * 3.0 / 4.0, cy, radius);

    canvas
}

/// Draw a disc from anti-aliased edge coverage snapped to binary before
/// compositing, the same way the glyph renderer keeps thin strokes intact.
/// The resulting canvas never contains gray.
fn draw_disc(canvas: &mut Canvas, cx: f32, cy: f32, radius: f32) {
    let x0 = (cx - radius - 1.0).floor().max(0.0) as usize;
    let x1 = ((cx + radius + 1.0).ceil() as usize).min(canvas.width().saturating_sub(1));
    let y0 = (cy - radius - 1.0).floor().max(0.0) as usize;
    let y1 = ((cy + radius + 1.0).ceil() as usize).min(canvas.height().saturating_sub(1));
    if x1 < x0 || y1 < y0 {
        return;
    }

    let mut coverage = vec![0u8; x1 - x0 + 1];
    for y in y0..=y1 {
        for (i, x) in (x0..=x1).enumerate() {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            let dist = (dx * dx + dy * dy).sqrt();
            coverage[i] = ((radius + 0.5 - dist).clamp(0.0, 1.0) * 255.0) as u8;
        }
        threshold_coverage(&mut coverage, DEFAULT_COVERAGE_CUTOFF);
        for (i, x) in (x0..=x1).enumerate() {
            if coverage[i] == 0xFF {
                canvas.set_pixel(x, y, [0, 0, 0]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binarize::{binarize, BinarizeOptions};

    #[test]
    fn test_border_is_black() {
        let c = test_pattern(100, 60, 0);
        assert_eq!(c.pixel(0, 0), [0, 0, 0]);
        assert_eq!(c.pixel(99, 59), [0, 0, 0]);
        assert_eq!(c.pixel(50, 0), [0, 0, 0]);
        assert_eq!(c.pixel(0, 30), [0, 0, 0]);
    }

    #[test]
    fn test_disc_centers_black() {
        let c = test_pattern(100, 60, 0);
        assert_eq!(c.pixel(25, 30), [0, 0, 0]);
        assert_eq!(c.pixel(75, 30), [0, 0, 0]);
    }

    #[test]
    fn test_pattern_is_pure_black_and_white() {
        let c = test_pattern(100, 60, 0);
        for y in 0..60 {
            for x in 0..100 {
                let px = c.pixel(x, y);
                assert!(px == [0, 0, 0] || px == [0xFF, 0xFF, 0xFF]);
            }
        }
    }

    #[test]
    fn test_phase_changes_frame() {
        let a = binarize(&test_pattern(100, 60, 0), BinarizeOptions::default());
        let b = binarize(&test_pattern(100, 60, 1), BinarizeOptions::default());
        assert_ne!(a, b);
    }

    #[test]
    fn test_phase_period_two() {
        let a = binarize(&test_pattern(100, 60, 0), BinarizeOptions::default());
        let b = binarize(&test_pattern(100, 60, 2), BinarizeOptions::default());
        assert_eq!(a, b);
    }
}
