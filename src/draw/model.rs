use serde::{Deserialize, Serialize};

/// Points per polyline segment before it is sealed and a continuation starts.
pub const SEGMENT_BATCH_POINTS: usize = 40;

/// Background used when no board color is selected. The alpha of 1 keeps the
/// window hit-testable on platforms that drop input over fully clear pixels.
pub const TRANSPARENT_BACKGROUND: Color = Color::rgba(0, 0, 0, 1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// True for the "no background" sentinel and anything fainter.
    pub fn is_transparent_background(self) -> bool {
        self.a <= TRANSPARENT_BACKGROUND.a
    }

    pub fn same_rgb(self, other: Color) -> bool {
        self.r == other.r && self.g == other.g && self.b == other.b
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PenStyle {
    pub color: Color,
    pub width: u32,
}

impl Default for PenStyle {
    fn default() -> Self {
        Self {
            color: Color::rgb(255, 88, 88),
            width: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Polyline { points: Vec<(i32, i32)> },
    Dot { center: (i32, i32), radius: f32 },
}

impl Segment {
    pub fn polyline(start: (i32, i32)) -> Self {
        Segment::Polyline {
            points: vec![start],
        }
    }

    /// Number of line-to steps after the anchor point.
    pub fn steps(&self) -> usize {
        match self {
            Segment::Polyline { points } => points.len().saturating_sub(1),
            Segment::Dot { .. } => 0,
        }
    }

    pub fn last_point(&self) -> Option<(i32, i32)> {
        match self {
            Segment::Polyline { points } => points.last().copied(),
            Segment::Dot { center, .. } => Some(*center),
        }
    }

    /// Inked bounds as `(min_x, min_y, max_x, max_y)` for a stroke of `width`.
    pub fn ink_bounds(&self, width: u32) -> Option<(f32, f32, f32, f32)> {
        match self {
            Segment::Polyline { points } => {
                let first = points.first()?;
                let half = width.max(1) as f32 * 0.5;
                let (mut min_x, mut min_y) = (first.0, first.1);
                let (mut max_x, mut max_y) = (first.0, first.1);
                for &(x, y) in points.iter().skip(1) {
                    min_x = min_x.min(x);
                    min_y = min_y.min(y);
                    max_x = max_x.max(x);
                    max_y = max_y.max(y);
                }
                Some((
                    min_x as f32 - half,
                    min_y as f32 - half,
                    max_x as f32 + half,
                    max_y as f32 + half,
                ))
            }
            Segment::Dot { center, radius } => Some((
                center.0 as f32 - radius,
                center.1 as f32 - radius,
                center.0 as f32 + radius,
                center.1 as f32 + radius,
            )),
        }
    }

    /// Precise hit test: the point lies within `slop` pixels of the inked
    /// geometry (stroke half-width around the centerline, or the dot disc).
    pub fn hit(&self, width: u32, point: (i32, i32), slop: f32) -> bool {
        match self {
            Segment::Polyline { points } => {
                let reach = width.max(1) as f32 * 0.5 + slop;
                let reach_sq = reach * reach;
                let p = (point.0 as f32, point.1 as f32);
                match points.as_slice() {
                    [] => false,
                    [only] => distance_sq(point, *only) <= reach_sq,
                    _ => points
                        .windows(2)
                        .any(|pair| point_segment_distance_sq(p, pair[0], pair[1]) <= reach_sq),
                }
            }
            Segment::Dot { center, radius } => {
                let reach = radius + slop;
                distance_sq(point, *center) <= reach * reach
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: u32,
    pub segments: Vec<Segment>,
}

impl Stroke {
    pub fn new(style: PenStyle) -> Self {
        Self {
            color: style.color,
            width: style.width.max(1),
            segments: Vec::new(),
        }
    }

    pub fn style(&self) -> PenStyle {
        PenStyle {
            color: self.color,
            width: self.width,
        }
    }
}

fn distance_sq(a: (i32, i32), b: (i32, i32)) -> f32 {
    let dx = (a.0 - b.0) as f32;
    let dy = (a.1 - b.1) as f32;
    dx * dx + dy * dy
}

pub(crate) fn point_segment_distance_sq(
    point: (f32, f32),
    start: (i32, i32),
    end: (i32, i32),
) -> f32 {
    let (px, py) = point;
    let x0 = start.0 as f32;
    let y0 = start.1 as f32;
    let vx = end.0 as f32 - x0;
    let vy = end.1 as f32 - y0;
    let wx = px - x0;
    let wy = py - y0;
    let len_sq = vx * vx + vy * vy;
    if len_sq <= f32::EPSILON {
        return wx * wx + wy * wy;
    }
    let t = ((wx * vx + wy * vy) / len_sq).clamp(0.0, 1.0);
    let dx = px - (x0 + vx * t);
    let dy = py - (y0 + vy * t);
    dx * dx + dy * dy
}

#[cfg(test)]
mod tests {
    use super::{Color, Segment, TRANSPARENT_BACKGROUND};

    #[test]
    fn sentinel_background_counts_as_transparent() {
        assert!(TRANSPARENT_BACKGROUND.is_transparent_background());
        assert!(Color::rgba(255, 255, 255, 0).is_transparent_background());
        assert!(!Color::rgb(0, 0, 0).is_transparent_background());
    }

    #[test]
    fn polyline_hit_respects_half_width_and_slop() {
        let segment = Segment::Polyline {
            points: vec![(0, 0), (100, 0)],
        };
        assert!(segment.hit(10, (50, 5), 0.0));
        assert!(!segment.hit(10, (50, 8), 0.0));
        assert!(segment.hit(10, (50, 8), 6.0));
        assert!(segment.hit(10, (-4, 0), 0.0));
        assert!(!segment.hit(10, (-20, 0), 6.0));
    }

    #[test]
    fn dot_hit_is_a_circle_test() {
        let dot = Segment::Dot {
            center: (50, 50),
            radius: 5.0,
        };
        assert!(dot.hit(10, (53, 54), 0.0));
        assert!(!dot.hit(10, (54, 54), 0.0));
        assert!(dot.hit(10, (54, 54), 6.0));
    }

    #[test]
    fn ink_bounds_pad_centerline_by_half_width() {
        let segment = Segment::Polyline {
            points: vec![(10, 20), (30, 5)],
        };
        assert_eq!(segment.ink_bounds(4), Some((8.0, 3.0, 32.0, 22.0)));
    }
}
