use thiserror::Error;

use crate::app::Vec2;

pub type Rgba = [u8; 4];

pub const TRANSPARENT: Rgba = [0, 0, 0, 0];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextureError {
    #[error("texture size {width}x{height} has a zero dimension")]
    ZeroSized { width: u32, height: u32 },
    #[error("texture size {width}x{height} overflows the address space")]
    TooLarge { width: u32, height: u32 },
    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    BufferLength { expected: usize, actual: usize },
}

/// Owned RGBA8 pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Texture {
    pub fn new(width: u32, height: u32) -> Result<Self, TextureError> {
        let len = byte_len(width, height)?;
        Ok(Self {
            width,
            height,
            pixels: vec![0; len],
        })
    }

    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, TextureError> {
        let expected = byte_len(width, height)?;
        if pixels.len() != expected {
            return Err(TextureError::BufferLength {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_rgba(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let mut color = [0; 4];
        color.copy_from_slice(&self.pixels[offset..offset + 4]);
        Some(color)
    }

    pub fn canvas(&mut self) -> Canvas<'_> {
        Canvas::new(&mut self.pixels, self.width, self.height)
    }
}

fn byte_len(width: u32, height: u32) -> Result<usize, TextureError> {
    if width == 0 || height == 0 {
        return Err(TextureError::ZeroSized { width, height });
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|count| count.checked_mul(4))
        .ok_or(TextureError::TooLarge { width, height })
}

/// Clipped drawing onto a borrowed RGBA8 frame. Every primitive silently
/// drops pixels outside the frame.
pub struct Canvas<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
}

impl<'a> Canvas<'a> {
    pub fn new(frame: &'a mut [u8], width: u32, height: u32) -> Self {
        Self {
            frame,
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    pub fn clear(&mut self, color: Rgba) {
        for chunk in self.frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&color);
        }
    }

    fn offset(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        let pixel = (y as usize)
            .checked_mul(self.width as usize)?
            .checked_add(x as usize)?;
        let start = pixel.checked_mul(4)?;
        (start + 4 <= self.frame.len()).then_some(start)
    }

    pub fn put_pixel(&mut self, x: i32, y: i32, color: Rgba) {
        if let Some(start) = self.offset(x, y) {
            self.frame[start..start + 4].copy_from_slice(&color);
        }
    }

    /// Source-over blend of `color` scaled by `alpha_mod`.
    pub fn blend_pixel(&mut self, x: i32, y: i32, color: Rgba, alpha_mod: u8) {
        let Some(start) = self.offset(x, y) else {
            return;
        };
        let dst = &mut self.frame[start..start + 4];
        let alpha = color[3] as u32 * alpha_mod as u32 / 255;
        if alpha == 0 {
            return;
        }
        if alpha == 255 {
            dst.copy_from_slice(&color);
            return;
        }
        let inverse = 255 - alpha;
        for channel in 0..3 {
            dst[channel] =
                ((color[channel] as u32 * alpha + dst[channel] as u32 * inverse) / 255) as u8;
        }
        dst[3] = (alpha + dst[3] as u32 * inverse / 255).min(255) as u8;
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, rect_width: i32, rect_height: i32, color: Rgba) {
        let start_x = x.max(0);
        let start_y = y.max(0);
        let end_x = x.saturating_add(rect_width).min(self.width as i32);
        let end_y = y.saturating_add(rect_height).min(self.height as i32);
        for py in start_y..end_y {
            for px in start_x..end_x {
                self.put_pixel(px, py, color);
            }
        }
    }

    pub fn rect_outline(&mut self, x: i32, y: i32, rect_width: i32, rect_height: i32, color: Rgba) {
        if rect_width <= 1 || rect_height <= 1 {
            return;
        }
        self.fill_rect(x, y, rect_width, 1, color);
        self.fill_rect(x, y + rect_height - 1, rect_width, 1, color);
        self.fill_rect(x, y, 1, rect_height, color);
        self.fill_rect(x + rect_width - 1, y, 1, rect_height, color);
    }

    /// Bresenham segment, endpoints inclusive.
    pub fn line(&mut self, from: (i32, i32), to: (i32, i32), color: Rgba) {
        let (mut x, mut y) = from;
        let dx = (to.0 - x).abs();
        let dy = -(to.1 - y).abs();
        let step_x = if x < to.0 { 1 } else { -1 };
        let step_y = if y < to.1 { 1 } else { -1 };
        let mut error = dx + dy;
        loop {
            self.put_pixel(x, y, color);
            if x == to.0 && y == to.1 {
                break;
            }
            let doubled = 2 * error;
            if doubled >= dy {
                error += dy;
                x += step_x;
            }
            if doubled <= dx {
                error += dx;
                y += step_y;
            }
        }
    }

    pub fn diamond(&mut self, cx: i32, cy: i32, radius: i32, color: Rgba) {
        for dy in -radius..=radius {
            let span = radius - dy.abs();
            for dx in -span..=span {
                self.put_pixel(cx + dx, cy + dy, color);
            }
        }
    }

    pub fn square(&mut self, cx: i32, cy: i32, half_size: i32, color: Rgba) {
        self.fill_rect(
            cx - half_size,
            cy - half_size,
            half_size * 2 + 1,
            half_size * 2 + 1,
            color,
        );
    }

    /// Copies `source` with its top-left corner at (`x`, `y`), blending by
    /// the source alpha.
    pub fn blit(&mut self, source: &Texture, x: i32, y: i32) {
        for sy in 0..source.height() {
            let py = y + sy as i32;
            if py < 0 || py >= self.height as i32 {
                continue;
            }
            for sx in 0..source.width() {
                if let Some(color) = source.pixel(sx, sy) {
                    self.blend_pixel(x + sx as i32, py, color, 255);
                }
            }
        }
    }

    /// Blends a same-sized `layer` over the whole canvas.
    pub fn composite(&mut self, layer: &Texture, alpha_mod: u8) {
        if layer.width() != self.width || layer.height() != self.height {
            return;
        }
        let width = self.width as usize;
        for (index, color) in layer.as_rgba().chunks_exact(4).enumerate() {
            if color[3] == 0 {
                continue;
            }
            let x = (index % width) as i32;
            let y = (index / width) as i32;
            self.blend_pixel(x, y, [color[0], color[1], color[2], color[3]], alpha_mod);
        }
    }

    /// Stretches the `source` region at `origin` with `extent` over the whole
    /// canvas, nearest-neighbour sampled.
    pub fn blit_region_scaled(&mut self, source: &Texture, origin: Vec2, extent: Vec2) {
        if extent.x <= 0.0 || extent.y <= 0.0 || self.width == 0 || self.height == 0 {
            return;
        }
        let step_x = extent.x / self.width as f32;
        let step_y = extent.y / self.height as f32;
        for py in 0..self.height {
            let sy = (origin.y + (py as f32 + 0.5) * step_y).floor();
            if sy < 0.0 || sy >= source.height() as f32 {
                continue;
            }
            for px in 0..self.width {
                let sx = (origin.x + (px as f32 + 0.5) * step_x).floor();
                if sx < 0.0 || sx >= source.width() as f32 {
                    continue;
                }
                if let Some(color) = source.pixel(sx as u32, sy as u32) {
                    self.blend_pixel(px as i32, py as i32, color, 255);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgba = [255, 255, 255, 255];

    #[test]
    fn zero_sized_texture_is_rejected() {
        assert_eq!(
            Texture::new(0, 4),
            Err(TextureError::ZeroSized {
                width: 0,
                height: 4
            })
        );
    }

    #[test]
    fn from_rgba_checks_buffer_length() {
        let error = Texture::from_rgba(2, 2, vec![0; 12]).expect_err("short buffer");
        assert_eq!(
            error,
            TextureError::BufferLength {
                expected: 16,
                actual: 12
            }
        );
    }

    #[test]
    fn put_pixel_clips_outside_frame() {
        let mut texture = Texture::new(2, 2).expect("texture");
        let mut canvas = texture.canvas();
        canvas.put_pixel(-1, 0, WHITE);
        canvas.put_pixel(2, 1, WHITE);
        canvas.put_pixel(1, 1, WHITE);
        assert_eq!(texture.pixel(1, 1), Some(WHITE));
        assert_eq!(texture.pixel(0, 0), Some(TRANSPARENT));
    }

    #[test]
    fn line_covers_both_endpoints() {
        let mut texture = Texture::new(8, 8).expect("texture");
        texture.canvas().line((1, 1), (6, 4), WHITE);
        assert_eq!(texture.pixel(1, 1), Some(WHITE));
        assert_eq!(texture.pixel(6, 4), Some(WHITE));
    }

    #[test]
    fn diamond_excludes_corners() {
        let mut texture = Texture::new(9, 9).expect("texture");
        texture.canvas().diamond(4, 4, 3, WHITE);
        assert_eq!(texture.pixel(4, 1), Some(WHITE));
        assert_eq!(texture.pixel(7, 4), Some(WHITE));
        assert_eq!(texture.pixel(7, 7), Some(TRANSPARENT));
    }

    #[test]
    fn half_alpha_composite_mixes_colors() {
        let mut layer = Texture::new(1, 1).expect("layer");
        layer.canvas().put_pixel(0, 0, [200, 0, 0, 255]);
        let mut target = Texture::new(1, 1).expect("target");
        target.canvas().clear([0, 0, 200, 255]);
        target.canvas().composite(&layer, 128);
        let [r, _, b, a] = target.pixel(0, 0).expect("pixel");
        assert!((99..=101).contains(&r), "r = {r}");
        assert!((98..=100).contains(&b), "b = {b}");
        assert_eq!(a, 255);
    }

    #[test]
    fn scaled_blit_samples_the_requested_region() {
        let mut source = Texture::new(4, 4).expect("source");
        source.canvas().put_pixel(2, 2, WHITE);
        let mut target = Texture::new(4, 4).expect("target");
        target
            .canvas()
            .blit_region_scaled(&source, Vec2::new(2.0, 2.0), Vec2::new(2.0, 2.0));
        assert_eq!(target.pixel(0, 0), Some(WHITE));
        assert_eq!(target.pixel(1, 1), Some(WHITE));
        assert_eq!(target.pixel(2, 2), Some(TRANSPARENT));
    }
}
