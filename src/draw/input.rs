use crate::draw::model::{PenStyle, Segment};
use crate::draw::render::{DirtyRect, RasterSurface};
use crate::draw::store::{AppendOutcome, StrokeHandle, StrokeStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    Idle,
    Drawing { handle: StrokeHandle, style: PenStyle },
    Erasing { pressed: bool },
}

/// What a pointer event did, so the owner can adjust the surrounding
/// windows (panel dimming, restacking) and schedule a present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BuilderEffect {
    Ignored,
    StrokeStarted,
    Inked { dirty: Option<DirtyRect>, sealed: bool },
    StrokeFinished { dot: bool },
    Erased { removed: bool },
    EraseReleased,
}

impl BuilderEffect {
    pub fn needs_present(self) -> bool {
        match self {
            BuilderEffect::Ignored | BuilderEffect::EraseReleased => false,
            BuilderEffect::Inked { dirty, .. } => dirty.is_some(),
            BuilderEffect::Erased { removed } => removed,
            BuilderEffect::StrokeStarted | BuilderEffect::StrokeFinished { .. } => true,
        }
    }
}

/// Pointer-drag state machine. Points are in the canvas' local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeBuilder {
    state: BuilderState,
    erase_buffer: f32,
}

impl StrokeBuilder {
    pub fn new(erase_buffer: f32) -> Self {
        Self {
            state: BuilderState::Idle,
            erase_buffer: erase_buffer.max(0.0),
        }
    }

    pub fn state(&self) -> BuilderState {
        self.state
    }

    pub fn is_erasing(&self) -> bool {
        matches!(self.state, BuilderState::Erasing { .. })
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self.state,
            BuilderState::Drawing { .. } | BuilderState::Erasing { pressed: true }
        )
    }

    pub fn press(
        &mut self,
        point: (i32, i32),
        style: PenStyle,
        store: &mut StrokeStore,
        raster: &mut RasterSurface,
    ) -> BuilderEffect {
        match self.state {
            BuilderState::Erasing { .. } => {
                self.state = BuilderState::Erasing { pressed: true };
                self.erase(point, store, raster)
            }
            BuilderState::Drawing { handle, .. } => {
                // Lost release; close the old stroke before starting over.
                store.finish_stroke(handle);
                self.begin(point, style, store, raster)
            }
            BuilderState::Idle => self.begin(point, style, store, raster),
        }
    }

    pub fn motion(
        &mut self,
        point: (i32, i32),
        store: &mut StrokeStore,
        raster: &mut RasterSurface,
    ) -> BuilderEffect {
        match self.state {
            BuilderState::Drawing { handle, style } => {
                let outcome = store.append_point(handle, point);
                let (index, sealed) = match outcome {
                    AppendOutcome::Extended { segment } => (segment, false),
                    AppendOutcome::Sealed { sealed } => (sealed, true),
                    AppendOutcome::Ignored => return BuilderEffect::Ignored,
                };
                let dirty = store
                    .stroke(handle)
                    .and_then(|stroke| stroke.segments.get(index))
                    .and_then(|segment| draw_newest_step(raster, style, segment));
                if sealed {
                    tracing::trace!(segment = index, "sealed stroke segment");
                }
                BuilderEffect::Inked { dirty, sealed }
            }
            BuilderState::Erasing { pressed: true } => self.erase(point, store, raster),
            BuilderState::Erasing { pressed: false } | BuilderState::Idle => BuilderEffect::Ignored,
        }
    }

    pub fn release(
        &mut self,
        point: (i32, i32),
        store: &mut StrokeStore,
        raster: &mut RasterSurface,
    ) -> BuilderEffect {
        match self.state {
            BuilderState::Drawing { handle, style } => {
                let radius = style.width as f32 / 2.0;
                let dot = store.seal_as_dot(handle, point, radius);
                if dot {
                    if let Some(segment) = store
                        .stroke(handle)
                        .and_then(|stroke| stroke.segments.last())
                    {
                        raster.draw_incremental(style, segment, 0);
                    }
                }
                store.finish_stroke(handle);
                self.state = BuilderState::Idle;
                BuilderEffect::StrokeFinished { dot }
            }
            BuilderState::Erasing { .. } => {
                self.state = BuilderState::Erasing { pressed: false };
                BuilderEffect::EraseReleased
            }
            BuilderState::Idle => BuilderEffect::Ignored,
        }
    }

    pub fn enter_erase_mode(&mut self, store: &mut StrokeStore) {
        self.finish_drawing(store);
        if !self.is_erasing() {
            self.state = BuilderState::Erasing { pressed: false };
        }
    }

    pub fn exit_erase_mode(&mut self) {
        if self.is_erasing() {
            self.state = BuilderState::Idle;
        }
    }

    /// Drops back to `Idle`, closing any stroke in progress. Erase mode is
    /// left as well; the caller remembers whether to resume it.
    pub fn suspend(&mut self, store: &mut StrokeStore) {
        self.finish_drawing(store);
        self.state = BuilderState::Idle;
    }

    fn begin(
        &mut self,
        point: (i32, i32),
        style: PenStyle,
        store: &mut StrokeStore,
        raster: &mut RasterSurface,
    ) -> BuilderEffect {
        let handle = store.begin_stroke(style);
        store.append_point(handle, point);
        if let Some(segment) = store.stroke(handle).and_then(|s| s.segments.last()) {
            raster.draw_incremental(style, segment, 0);
        }
        self.state = BuilderState::Drawing { handle, style };
        BuilderEffect::StrokeStarted
    }

    fn erase(
        &mut self,
        point: (i32, i32),
        store: &mut StrokeStore,
        raster: &mut RasterSurface,
    ) -> BuilderEffect {
        let removed = store.erase_at(point, self.erase_buffer).is_some();
        if removed {
            tracing::debug!(x = point.0, y = point.1, "erased stroke");
            raster.rebuild(raster.rect(), store.strokes());
        }
        BuilderEffect::Erased { removed }
    }

    fn finish_drawing(&mut self, store: &mut StrokeStore) {
        if let BuilderState::Drawing { handle, .. } = self.state {
            store.finish_stroke(handle);
            self.state = BuilderState::Idle;
        }
    }
}

fn draw_newest_step(
    raster: &mut RasterSurface,
    style: PenStyle,
    segment: &Segment,
) -> Option<DirtyRect> {
    let steps = segment.steps();
    if steps == 0 {
        return None;
    }
    raster.draw_incremental(style, segment, steps - 1)
}

#[cfg(test)]
mod tests {
    use super::{BuilderEffect, BuilderState, StrokeBuilder};
    use crate::draw::model::{Color, PenStyle, Segment, TRANSPARENT_BACKGROUND};
    use crate::draw::monitor::MonitorRect;
    use crate::draw::render::RasterSurface;
    use crate::draw::store::StrokeStore;

    struct Harness {
        builder: StrokeBuilder,
        store: StrokeStore,
        raster: RasterSurface,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                builder: StrokeBuilder::new(6.0),
                store: StrokeStore::default(),
                raster: RasterSurface::new(
                    MonitorRect::new(0, 0, 200, 200),
                    TRANSPARENT_BACKGROUND,
                ),
            }
        }

        fn press(&mut self, point: (i32, i32), width: u32) -> BuilderEffect {
            let style = PenStyle {
                color: Color::rgb(255, 0, 0),
                width,
            };
            self.builder
                .press(point, style, &mut self.store, &mut self.raster)
        }

        fn motion(&mut self, point: (i32, i32)) -> BuilderEffect {
            self.builder
                .motion(point, &mut self.store, &mut self.raster)
        }

        fn release(&mut self, point: (i32, i32)) -> BuilderEffect {
            self.builder
                .release(point, &mut self.store, &mut self.raster)
        }

        fn line(&mut self, from: (i32, i32), to: (i32, i32)) {
            self.press(from, 4);
            self.motion(to);
            self.release(to);
        }
    }

    #[test]
    fn drag_of_45_steps_produces_two_segments() {
        let mut h = Harness::new();
        assert_eq!(h.press((10, 10), 5), BuilderEffect::StrokeStarted);

        let mut sealed = 0;
        for step in 1..=45 {
            if let BuilderEffect::Inked { sealed: true, .. } = h.motion((10, 10 + step * 2)) {
                sealed += 1;
            }
        }
        assert_eq!(h.release((10, 100)), BuilderEffect::StrokeFinished { dot: false });

        assert_eq!(sealed, 1);
        assert_eq!(h.store.len(), 1);
        let stroke = h.store.strokes().next().expect("stroke");
        assert_eq!(stroke.segments.len(), 2);
        assert_eq!(stroke.segments[0].steps(), 40);
        assert_eq!(stroke.segments[1].steps(), 5);
        assert_eq!(stroke.segments[1].last_point(), Some((10, 100)));
        assert_eq!(h.builder.state(), BuilderState::Idle);
    }

    #[test]
    fn click_without_motion_becomes_dot() {
        let mut h = Harness::new();
        h.press((50, 50), 10);
        assert_eq!(h.release((50, 50)), BuilderEffect::StrokeFinished { dot: true });

        let stroke = h.store.strokes().next().expect("stroke");
        assert_eq!(
            stroke.segments,
            vec![Segment::Dot {
                center: (50, 50),
                radius: 5.0
            }]
        );
        assert_eq!(h.raster.ink().pixel(50, 50), Color::rgb(255, 0, 0));
    }

    #[test]
    fn moves_without_press_are_ignored() {
        let mut h = Harness::new();
        assert_eq!(h.motion((5, 5)), BuilderEffect::Ignored);
        assert_eq!(h.release((5, 5)), BuilderEffect::Ignored);
        assert!(h.store.is_empty());
    }

    #[test]
    fn erase_mode_removes_strokes_instead_of_drawing() {
        let mut h = Harness::new();
        h.line((20, 20), (120, 20));
        h.line((20, 80), (120, 80));

        h.builder.enter_erase_mode(&mut h.store);
        assert_eq!(h.press((60, 80), 5), BuilderEffect::Erased { removed: true });
        assert_eq!(h.store.len(), 1);

        // Smear erasing while the button stays down.
        assert_eq!(h.motion((60, 21)), BuilderEffect::Erased { removed: true });
        assert!(h.store.is_empty());
        assert!(h.raster.ink().pixels.iter().all(|byte| *byte == 0));

        assert_eq!(h.release((60, 21)), BuilderEffect::EraseReleased);
        assert_eq!(h.motion((60, 80)), BuilderEffect::Ignored);
        assert!(h.builder.is_erasing());
    }

    #[test]
    fn entering_erase_mode_mid_stroke_closes_the_stroke() {
        let mut h = Harness::new();
        h.press((10, 10), 5);
        h.motion((20, 20));
        h.builder.enter_erase_mode(&mut h.store);
        assert_eq!(h.builder.state(), BuilderState::Erasing { pressed: false });
        assert_eq!(h.store.len(), 1);
    }

    #[test]
    fn suspend_returns_to_idle_from_any_state() {
        let mut h = Harness::new();
        h.press((10, 10), 5);
        h.builder.suspend(&mut h.store);
        assert_eq!(h.builder.state(), BuilderState::Idle);
        assert_eq!(h.motion((30, 30)), BuilderEffect::Ignored);

        h.builder.enter_erase_mode(&mut h.store);
        h.builder.suspend(&mut h.store);
        assert_eq!(h.builder.state(), BuilderState::Idle);
    }
}
