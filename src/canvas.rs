/// In-memory color render target, regenerated by the compositor whenever the
/// visible scene changes. The streaming core only ever reads it.
#[derive(Debug, Clone)]
pub struct Canvas {
    width: usize,
    height: usize,
    pixels: Vec<[u8; 3]>,
}

impl Canvas {
    /// Create a canvas filled with white. Dimensions are fixed for the
    /// lifetime of the session.
    pub fn new(width: usize, height: usize) -> Self {
        Canvas {
            width,
            height,
            pixels: vec![[0xFF, 0xFF, 0xFF]; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        self.pixels[y * self.width + x]
    }

    /// Out-of-bounds writes are ignored so pattern drawing code does not
    /// need to clip.
    pub fn set_pixel(&mut self, x: usize, y: usize, rgb: [u8; 3]) {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = rgb;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_canvas_is_white() {
        let c = Canvas::new(4, 2);
        assert_eq!(c.pixel(3, 1), [0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_set_pixel_round_trip() {
        let mut c = Canvas::new(4, 2);
        c.set_pixel(2, 1, [1, 2, 3]);
        assert_eq!(c.pixel(2, 1), [1, 2, 3]);
    }

    #[test]
    fn test_out_of_bounds_write_ignored() {
        let mut c = Canvas::new(4, 2);
        c.set_pixel(4, 0, [0, 0, 0]);
        c.set_pixel(0, 2, [0, 0, 0]);
        assert_eq!(c.pixel(3, 1), [0xFF, 0xFF, 0xFF]);
    }
}
