use crate::draw::model::Color;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RgbaBuffer {
    pub fn new(width: u32, height: u32, fill: Color) -> Self {
        let len = (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4);
        let mut buffer = Self {
            width,
            height,
            pixels: vec![0u8; len],
        };
        buffer.fill(fill);
        buffer
    }

    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        assert_eq!(pixels.len(), (width * height * 4) as usize);
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn fill(&mut self, color: Color) {
        for chunk in self.pixels.chunks_exact_mut(4) {
            chunk.copy_from_slice(&[color.r, color.g, color.b, color.a]);
        }
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        let idx = ((y * self.width + x) * 4) as usize;
        self.pixels[idx..idx + 4].copy_from_slice(&[color.r, color.g, color.b, color.a]);
    }

    pub fn pixel(&self, x: u32, y: u32) -> Color {
        let idx = ((y * self.width + x) * 4) as usize;
        Color {
            r: self.pixels[idx],
            g: self.pixels[idx + 1],
            b: self.pixels[idx + 2],
            a: self.pixels[idx + 3],
        }
    }

    /// Source-over blend of `color` scaled by `coverage` (0..=1). Out of
    /// bounds coordinates are ignored.
    pub fn blend(&mut self, x: i32, y: i32, color: Color, coverage: f32) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let alpha = (color.a as f32 * coverage.clamp(0.0, 1.0)).round() as u8;
        if alpha == 0 {
            return;
        }
        let idx = ((y as u32 * self.width + x as u32) * 4) as usize;
        let bottom = Color::rgba(
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        );
        let out = blend_pixel(bottom, Color { a: alpha, ..color });
        self.pixels[idx..idx + 4].copy_from_slice(&[out.r, out.g, out.b, out.a]);
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: Color) {
        for py in y.max(0)..(y + height).min(self.height as i32) {
            for px in x.max(0)..(x + width).min(self.width as i32) {
                self.blend(px, py, color, 1.0);
            }
        }
    }

    /// Composites `image` with its top-left corner at `at`.
    pub fn draw_image(&mut self, image: &RgbaBuffer, at: (i32, i32)) {
        for y in 0..image.height {
            for x in 0..image.width {
                self.blend(at.0 + x as i32, at.1 + y as i32, image.pixel(x, y), 1.0);
            }
        }
    }
}

/// Composites `top` over `base` pixel by pixel. Both buffers must match in size.
pub fn blend_in_place(base: &mut RgbaBuffer, top: &RgbaBuffer) {
    assert_eq!(base.width, top.width);
    assert_eq!(base.height, top.height);

    for (dst, src) in base
        .pixels
        .chunks_exact_mut(4)
        .zip(top.pixels.chunks_exact(4))
    {
        if src[3] == 0 {
            continue;
        }
        let blended = blend_pixel(
            Color::rgba(dst[0], dst[1], dst[2], dst[3]),
            Color::rgba(src[0], src[1], src[2], src[3]),
        );
        dst.copy_from_slice(&[blended.r, blended.g, blended.b, blended.a]);
    }
}

pub fn blend_pixel(bottom: Color, top: Color) -> Color {
    let sa = top.a as f32 / 255.0;
    let da = bottom.a as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);

    if out_a <= f32::EPSILON {
        return Color::rgba(0, 0, 0, 0);
    }

    let blend = |s: u8, d: u8| -> u8 {
        (((s as f32 * sa) + (d as f32 * da * (1.0 - sa))) / out_a)
            .round()
            .clamp(0.0, 255.0) as u8
    };

    Color {
        r: blend(top.r, bottom.r),
        g: blend(top.g, bottom.g),
        b: blend(top.b, bottom.b),
        a: (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    }
}

/// Straight RGBA to premultiplied BGRA, the layout layered windows expect.
pub fn rgba_to_premultiplied_bgra(rgba: &[u8], bgra: &mut Vec<u8>) {
    bgra.resize(rgba.len(), 0);
    premultiply_into(rgba, bgra);
}

/// Re-converts only the `width` x `height` block at (`x`, `y`) of `frame`.
/// `bgra` must already hold a full conversion of a frame of the same size.
pub fn update_premultiplied_bgra(
    frame: &RgbaBuffer,
    bgra: &mut [u8],
    (x, y): (u32, u32),
    (width, height): (u32, u32),
) {
    if x >= frame.width || bgra.len() != frame.pixels.len() {
        return;
    }
    let stride = frame.width as usize * 4;
    let span = width.min(frame.width - x) as usize * 4;
    for row in y..y.saturating_add(height).min(frame.height) {
        let start = row as usize * stride + x as usize * 4;
        premultiply_into(
            &frame.pixels[start..start + span],
            &mut bgra[start..start + span],
        );
    }
}

fn premultiply_into(rgba: &[u8], bgra: &mut [u8]) {
    for (src, dst) in rgba.chunks_exact(4).zip(bgra.chunks_exact_mut(4)) {
        let a = src[3] as u16;
        let premultiply = |c: u8| ((c as u16 * a + 127) / 255) as u8;
        dst[0] = premultiply(src[2]);
        dst[1] = premultiply(src[1]);
        dst[2] = premultiply(src[0]);
        dst[3] = src[3];
    }
}
