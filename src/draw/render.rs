use crate::draw::composite::{blend_in_place, blend_pixel, RgbaBuffer};
use crate::draw::model::{point_segment_distance_sq, Color, PenStyle, Segment, Stroke};
use crate::draw::monitor::MonitorRect;

const CLEAR: Color = Color::rgba(0, 0, 0, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl DirtyRect {
    pub fn from_points(a: (i32, i32), b: (i32, i32), pad: i32) -> Self {
        let min_x = a.0.min(b.0) - pad;
        let max_x = a.0.max(b.0) + pad;
        let min_y = a.1.min(b.1) - pad;
        let max_y = a.1.max(b.1) + pad;
        Self {
            x: min_x,
            y: min_y,
            width: (max_x - min_x + 1).max(1),
            height: (max_y - min_y + 1).max(1),
        }
    }

    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width: width as i32,
            height: height as i32,
        }
    }

    pub fn union(self, other: DirtyRect) -> DirtyRect {
        let min_x = self.x.min(other.x);
        let min_y = self.y.min(other.y);
        let max_x = (self.x + self.width).max(other.x + other.width);
        let max_y = (self.y + self.height).max(other.y + other.height);
        DirtyRect {
            x: min_x,
            y: min_y,
            width: (max_x - min_x).max(1),
            height: (max_y - min_y).max(1),
        }
    }

    pub fn clamp(self, width: u32, height: u32) -> Option<DirtyRect> {
        let max_w = width as i32;
        let max_h = height as i32;
        let x0 = self.x.clamp(0, max_w);
        let y0 = self.y.clamp(0, max_h);
        let x1 = (self.x + self.width).clamp(0, max_w);
        let y1 = (self.y + self.height).clamp(0, max_h);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(DirtyRect {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        })
    }
}

fn merge_dirty(acc: Option<DirtyRect>, next: Option<DirtyRect>) -> Option<DirtyRect> {
    match (acc, next) {
        (Some(a), Some(b)) => Some(a.union(b)),
        (a, b) => a.or(b),
    }
}

/// Off-screen ink buffer for one window, sized to the monitor it covers.
///
/// Ink is kept on a fully transparent layer; the background color is only
/// applied in [`RasterSurface::paint`], so changing the background never
/// requires replaying strokes.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    rect: MonitorRect,
    ink: RgbaBuffer,
    background: Color,
    dirty: Option<DirtyRect>,
}

impl RasterSurface {
    pub fn new(rect: MonitorRect, background: Color) -> Self {
        let (width, height) = rect.size();
        Self {
            rect,
            ink: RgbaBuffer::new(width, height, CLEAR),
            background,
            dirty: Some(DirtyRect::full(width, height)),
        }
    }

    pub fn rect(&self) -> MonitorRect {
        self.rect
    }

    pub fn size(&self) -> (u32, u32) {
        self.ink.size()
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn set_background(&mut self, color: Color) {
        if self.background != color {
            self.background = color;
            self.mark_all_dirty();
        }
    }

    pub fn ink(&self) -> &RgbaBuffer {
        &self.ink
    }

    /// Resizes to `rect`, clears, and replays every segment of every stroke
    /// in insertion order.
    pub fn rebuild<'a, I>(&mut self, rect: MonitorRect, strokes: I)
    where
        I: IntoIterator<Item = &'a Stroke>,
    {
        let size = rect.size();
        if self.ink.size() != size {
            self.ink = RgbaBuffer::new(size.0, size.1, CLEAR);
        } else {
            self.ink.fill(CLEAR);
        }
        self.rect = rect;

        let mut segments = 0usize;
        for stroke in strokes {
            for segment in &stroke.segments {
                render_segment(&mut self.ink, stroke.style(), segment, 0);
                segments += 1;
            }
        }
        tracing::debug!(width = size.0, height = size.1, segments, "rebuilt raster surface");
        self.mark_all_dirty();
    }

    /// Draws the steps of `segment` from `from_step` onward over the current
    /// ink without clearing. Returns the touched area.
    pub fn draw_incremental(
        &mut self,
        style: PenStyle,
        segment: &Segment,
        from_step: usize,
    ) -> Option<DirtyRect> {
        let dirty = render_segment(&mut self.ink, style, segment, from_step);
        self.dirty = merge_dirty(self.dirty, dirty);
        dirty
    }

    /// Fills `target` with the background and composites the ink on top.
    pub fn paint(&self, target: &mut RgbaBuffer) {
        if target.size() != self.ink.size() {
            *target = RgbaBuffer::new(self.ink.width, self.ink.height, self.background);
        } else {
            target.fill(self.background);
        }
        blend_in_place(target, &self.ink);
    }

    /// Repaints `rect` of a frame previously produced by [`RasterSurface::paint`].
    /// A frame of the wrong size gets a full paint instead.
    pub fn paint_region(&self, target: &mut RgbaBuffer, rect: DirtyRect) {
        if target.size() != self.ink.size() {
            self.paint(target);
            return;
        }
        let Some(rect) = rect.clamp(self.ink.width, self.ink.height) else {
            return;
        };
        for y in rect.y as u32..(rect.y + rect.height) as u32 {
            for x in rect.x as u32..(rect.x + rect.width) as u32 {
                let ink = self.ink.pixel(x, y);
                let out = if ink.a == 0 {
                    self.background
                } else {
                    blend_pixel(self.background, ink)
                };
                target.set_pixel(x, y, out);
            }
        }
    }

    pub fn take_dirty(&mut self) -> Option<DirtyRect> {
        self.dirty.take()
    }

    fn mark_all_dirty(&mut self) {
        self.dirty = Some(DirtyRect::full(self.ink.width, self.ink.height));
    }
}

/// Rasterizes `segment` with round caps and joins. A polyline is a chain of
/// capsules, one per step, so drawing steps one at a time produces the same
/// pixels as drawing the finished segment. A lone anchor carries no ink.
pub fn render_segment(
    buffer: &mut RgbaBuffer,
    style: PenStyle,
    segment: &Segment,
    from_step: usize,
) -> Option<DirtyRect> {
    match segment {
        Segment::Polyline { points } => {
            let radius = style.width.max(1) as f32 * 0.5;
            points
                .windows(2)
                .skip(from_step)
                .fold(None, |dirty, pair| {
                    merge_dirty(
                        dirty,
                        draw_capsule(buffer, pair[0], pair[1], radius, style.color),
                    )
                })
        }
        Segment::Dot { center, radius } if from_step == 0 => {
            draw_capsule(buffer, *center, *center, *radius, style.color)
        }
        Segment::Dot { .. } => None,
    }
}

/// Antialiased capsule: coverage falls off linearly across the last pixel of
/// the edge.
fn draw_capsule(
    buffer: &mut RgbaBuffer,
    start: (i32, i32),
    end: (i32, i32),
    radius: f32,
    color: Color,
) -> Option<DirtyRect> {
    let pad = radius.ceil() as i32 + 1;
    let clip = DirtyRect::from_points(start, end, pad).clamp(buffer.width, buffer.height)?;

    for y in clip.y..(clip.y + clip.height) {
        for x in clip.x..(clip.x + clip.width) {
            let distance = point_segment_distance_sq((x as f32, y as f32), start, end).sqrt();
            let coverage = (radius + 0.5 - distance).clamp(0.0, 1.0);
            if coverage > 0.0 {
                buffer.blend(x, y, color, coverage);
            }
        }
    }
    Some(clip)
}

/// Circle outline of `style.width` centered on `radius`.
pub fn render_ring(buffer: &mut RgbaBuffer, style: PenStyle, center: (i32, i32), radius: f32) {
    let half = style.width.max(1) as f32 * 0.5;
    let reach = (radius + half).ceil() as i32 + 1;
    let Some(clip) =
        DirtyRect::from_points(center, center, reach).clamp(buffer.width, buffer.height)
    else {
        return;
    };
    for y in clip.y..(clip.y + clip.height) {
        for x in clip.x..(clip.x + clip.width) {
            let dx = (x - center.0) as f32;
            let dy = (y - center.1) as f32;
            let distance = (dx * dx + dy * dy).sqrt();
            let coverage = (half + 0.5 - (distance - radius).abs()).clamp(0.0, 1.0);
            if coverage > 0.0 {
                buffer.blend(x, y, style.color, coverage);
            }
        }
    }
}

/// Filled wedge starting at twelve o'clock and sweeping clockwise over
/// `fraction` of a full turn.
pub fn render_pie(
    buffer: &mut RgbaBuffer,
    color: Color,
    center: (i32, i32),
    radius: f32,
    fraction: f32,
) {
    let fraction = fraction.clamp(0.0, 1.0);
    if fraction <= 0.0 {
        return;
    }
    let sweep = fraction * std::f32::consts::TAU;
    let reach = radius.ceil() as i32 + 1;
    let Some(clip) =
        DirtyRect::from_points(center, center, reach).clamp(buffer.width, buffer.height)
    else {
        return;
    };
    for y in clip.y..(clip.y + clip.height) {
        for x in clip.x..(clip.x + clip.width) {
            let dx = (x - center.0) as f32;
            let dy = (y - center.1) as f32;
            let coverage = (radius + 0.5 - (dx * dx + dy * dy).sqrt()).clamp(0.0, 1.0);
            if coverage <= 0.0 {
                continue;
            }
            // Screen y grows downward, so atan2(dx, -dy) runs clockwise from up.
            let angle = dx.atan2(-dy).rem_euclid(std::f32::consts::TAU);
            if angle <= sweep {
                buffer.blend(x, y, color, coverage);
            }
        }
    }
}
