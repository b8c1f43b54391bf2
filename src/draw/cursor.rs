use crate::draw::assets::AssetRoot;
use crate::draw::composite::RgbaBuffer;
use crate::draw::model::{Color, PenStyle};
use crate::draw::render::render_ring;
use crate::draw::state::CursorKind;

pub const PEN_CURSOR_SIZE: u32 = 42;
pub const ERASER_CURSOR_SIZE: u32 = 24;
const ERASER_RING_COLOR: Color = Color::rgb(255, 88, 88);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorImage {
    pub image: RgbaBuffer,
    pub hotspot: (u32, u32),
}

/// Replaces every pixel's color with `color`, keeping its alpha.
pub fn tint(image: &RgbaBuffer, color: Color) -> RgbaBuffer {
    let mut out = image.clone();
    for px in out.pixels.chunks_exact_mut(4) {
        px[0] = color.r;
        px[1] = color.g;
        px[2] = color.b;
    }
    out
}

/// White arrow outline with an inner arrow in the pen color; the hotspot is
/// the arrow tip at the top-left corner.
pub fn pen_cursor(assets: &AssetRoot, color: Color) -> CursorImage {
    let size = (PEN_CURSOR_SIZE, PEN_CURSOR_SIZE);
    let outer = assets.load_image("arrow_outer.png", size);
    let inner = assets.load_image("arrow_inner.png", size);

    let mut image = RgbaBuffer::new(size.0, size.1, Color::rgba(0, 0, 0, 0));
    image.draw_image(&tint(&outer, Color::rgb(255, 255, 255)), (0, 0));
    image.draw_image(&tint(&inner, color), (0, 0));
    CursorImage {
        image,
        hotspot: (0, 0),
    }
}

pub fn eraser_cursor(assets: &AssetRoot) -> CursorImage {
    let size = (ERASER_CURSOR_SIZE, ERASER_CURSOR_SIZE);
    let image = assets
        .try_load_image_scaled("eraser_pointer.png", size)
        .unwrap_or_else(|err| {
            tracing::debug!(error = %format!("{err:#}"), "drawing fallback eraser cursor");
            eraser_ring(ERASER_CURSOR_SIZE)
        });
    let hotspot = (image.width / 2, image.height / 2);
    CursorImage { image, hotspot }
}

fn eraser_ring(size: u32) -> RgbaBuffer {
    let mut image = RgbaBuffer::new(size, size, Color::rgba(0, 0, 0, 0));
    let center = (size / 2) as i32;
    let style = PenStyle {
        color: ERASER_RING_COLOR,
        width: 1,
    };
    render_ring(&mut image, style, (center, center), size as f32 / 2.0 - 1.0);
    image
}

/// Keeps the cursor images so switching tools does not reload assets. The
/// pen cursor is rebuilt only when the pen color changes.
#[derive(Debug, Clone)]
pub struct CursorCache {
    assets: AssetRoot,
    eraser: CursorImage,
    pen: Option<(Color, CursorImage)>,
}

impl CursorCache {
    pub fn new(assets: AssetRoot) -> Self {
        let eraser = eraser_cursor(&assets);
        Self {
            assets,
            eraser,
            pen: None,
        }
    }

    /// `None` means the system cursor.
    pub fn image_for(&mut self, kind: CursorKind) -> Option<&CursorImage> {
        match kind {
            CursorKind::System => None,
            CursorKind::Eraser => Some(&self.eraser),
            CursorKind::Pen(color) => {
                let stale = !matches!(&self.pen, Some((cached, _)) if *cached == color);
                if stale {
                    self.pen = Some((color, pen_cursor(&self.assets, color)));
                }
                self.pen.as_ref().map(|(_, image)| image)
            }
        }
    }
}
