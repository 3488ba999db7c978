use crate::config::Config;
use crate::field::StarField;

pub(crate) const BLACK: [u8; 3] = [0, 0, 0];

/// Minimal drawing seam: everything the rasterizer needs from a backbuffer.
/// Keeps the star/overlay drawing independent of how frames are presented.
pub(crate) trait Surface {
    fn size(&self) -> (u32, u32);
    fn clear(&mut self, color: [u8; 3]);
    fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: [u8; 3]);
}

/// CPU backbuffer: tightly packed RGBA rows, alpha always opaque.
pub(crate) struct PixelCanvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl PixelCanvas {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        let mut canvas = Self {
            width: 0,
            height: 0,
            pixels: Vec::new(),
        };
        canvas.resize(width, height);
        canvas
    }

    pub(crate) fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        let len = self.width as usize * self.height as usize * 4;
        self.pixels.clear();
        self.pixels.resize(len, 0);
    }

    pub(crate) fn data(&self) -> &[u8] {
        &self.pixels
    }

    #[cfg(test)]
    pub(crate) fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let off = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.pixels[off],
            self.pixels[off + 1],
            self.pixels[off + 2],
            self.pixels[off + 3],
        ]
    }
}

impl Surface for PixelCanvas {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self, color: [u8; 3]) {
        for px in self.pixels.chunks_exact_mut(4) {
            px[0] = color[0];
            px[1] = color[1];
            px[2] = color[2];
            px[3] = 255;
        }
    }

    fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: [u8; 3]) {
        let x0 = x.max(0) as u32;
        let y0 = y.max(0) as u32;
        let x1 = (x.saturating_add(w as i32)).clamp(0, self.width as i32) as u32;
        let y1 = (y.saturating_add(h as i32)).clamp(0, self.height as i32) as u32;
        if x0 >= x1 || y0 >= y1 {
            return;
        }
        for row in y0..y1 {
            let start = (row as usize * self.width as usize + x0 as usize) * 4;
            let end = (row as usize * self.width as usize + x1 as usize) * 4;
            for px in self.pixels[start..end].chunks_exact_mut(4) {
                px[0] = color[0];
                px[1] = color[1];
                px[2] = color[2];
                px[3] = 255;
            }
        }
    }
}

/// Clear the frame and draw every active star: a single pixel when size is 0,
/// otherwise a size×size square, colored by brightness-scaled base color.
pub(crate) fn draw_stars(surface: &mut impl Surface, field: &StarField, cfg: &Config) {
    surface.clear(BLACK);

    let side = if cfg.star_size > 0 { cfg.star_size as u32 } else { 1 };
    for star in field.iter() {
        let br = star.brightness.clamp(0, 255);
        let color = if cfg.colored_stars {
            [scale(star.r, br), scale(star.g, br), scale(star.b, br)]
        } else {
            [br as u8; 3]
        };
        surface.fill_rect(star.x.round() as i32, star.y.round() as i32, side, side, color);
    }
}

fn scale(channel: u8, brightness: i32) -> u8 {
    ((channel as i32 * brightness) / 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn clear_paints_every_pixel() {
        let mut canvas = PixelCanvas::new(4, 3);
        canvas.clear([7, 8, 9]);
        for y in 0..3 {
            for x in 0..4 {
                assert_eq!(canvas.pixel(x, y), [7, 8, 9, 255]);
            }
        }
    }

    #[test]
    fn fill_rect_clips_at_edges() {
        let mut canvas = PixelCanvas::new(8, 8);
        canvas.clear(BLACK);
        // hangs off the bottom-right corner
        canvas.fill_rect(6, 6, 5, 5, [255, 0, 0]);
        assert_eq!(canvas.pixel(6, 6), [255, 0, 0, 255]);
        assert_eq!(canvas.pixel(7, 7), [255, 0, 0, 255]);
        assert_eq!(canvas.pixel(5, 5), [0, 0, 0, 255]);
        // fully negative origin still covers the overlap
        canvas.fill_rect(-2, -2, 4, 4, [0, 255, 0]);
        assert_eq!(canvas.pixel(0, 0), [0, 255, 0, 255]);
        assert_eq!(canvas.pixel(1, 1), [0, 255, 0, 255]);
        assert_eq!(canvas.pixel(2, 2), [0, 0, 0, 255]);
    }

    #[test]
    fn empty_field_just_clears() {
        let field = StarField::new();
        let mut canvas = PixelCanvas::new(16, 16);
        draw_stars(&mut canvas, &field, &Config::default());
        assert_eq!(canvas.pixel(8, 8), [0, 0, 0, 255]);
    }

    #[test]
    fn oversized_star_is_clipped_not_fatal() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut field = StarField::new();
        field.init(&mut rng, 5, 4, 4, true);
        let cfg = Config {
            star_size: 16, // larger than the 4x4 canvas
            ..Config::default()
        };
        let mut canvas = PixelCanvas::new(4, 4);
        draw_stars(&mut canvas, &field, &cfg);
    }

    #[test]
    fn grayscale_uses_brightness_directly() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut field = StarField::new();
        field.init(&mut rng, 1, 1, 1, false);
        let cfg = Config {
            colored_stars: false,
            star_size: 3,
            ..Config::default()
        };
        let mut canvas = PixelCanvas::new(4, 4);
        draw_stars(&mut canvas, &field, &cfg);
        let star = field.iter().next().unwrap();
        let expected = star.brightness as u8;
        // the square's anchor pixel is always inside the canvas
        let px = canvas.pixel(star.x.round() as u32, star.y.round() as u32);
        assert_eq!(px[0], expected);
        assert_eq!(px[1], expected);
        assert_eq!(px[2], expected);
    }
}
