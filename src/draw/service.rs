use crate::draw::arbiter::{apply_ops, DockOutcome, DockTab, WindowOp, ZOrderArbiter};
use crate::draw::assets::AssetRoot;
use crate::draw::composite::RgbaBuffer;
use crate::draw::cursor::CursorCache;
use crate::draw::hold::{HoldProgress, HoldToConfirm, HOLD_TICK};
use crate::draw::input::{BuilderEffect, StrokeBuilder};
use crate::draw::model::{Color, Stroke, TRANSPARENT_BACKGROUND};
use crate::draw::monitor::{global_to_local, GeometryRegistry, MonitorRect};
use crate::draw::panel::{
    render_dock_tab, render_panel, ControlPanel, PanelAction, PanelEvent, PanelIcons,
    PanelPalette, PanelView,
};
use crate::draw::platform::{PointerEvent, PointerKind, WindowPlatform, WindowRole};
use crate::draw::render::RasterSurface;
use crate::draw::settings::DrawSettings;
use crate::draw::state::{SurfaceEffect, SurfaceState, Tool};
use crate::draw::store::{StrokeStore, UndoOutcome};
use anyhow::{Context, Result};
use std::time::Instant;

/// The monitor containing this point hosts the overlay at startup.
pub const STARTUP_MONITOR_PROBE: (i32, i32) = (50, 50);
pub const PANEL_START_POSITION: (i32, i32) = (50, 50);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct PendingPresents {
    background: bool,
    canvas: bool,
    panel: bool,
    dock: bool,
}

impl PendingPresents {
    fn all() -> Self {
        Self {
            background: true,
            canvas: true,
            panel: true,
            dock: true,
        }
    }
}

/// Owns every piece of overlay state and the windows that show it. Windows
/// never talk to each other; pointer events and timer ticks come in here and
/// the coordinator drives the platform.
pub struct DrawCoordinator<P: WindowPlatform> {
    platform: P,
    registry: GeometryRegistry,
    current_monitor: MonitorRect,
    store: StrokeStore,
    canvas: RasterSurface,
    canvas_frame: RgbaBuffer,
    background: RasterSurface,
    state: SurfaceState,
    builder: StrokeBuilder,
    arbiter: ZOrderArbiter,
    dock: DockTab,
    panel: ControlPanel,
    icons: PanelIcons,
    hold: HoldToConfirm,
    hold_progress: Option<f32>,
    next_hold_tick: Option<Instant>,
    cursors: CursorCache,
    pending: PendingPresents,
    exit_requested: bool,
}

impl<P: WindowPlatform> DrawCoordinator<P> {
    pub fn new(
        settings: &DrawSettings,
        registry: GeometryRegistry,
        assets: AssetRoot,
        platform: P,
    ) -> Self {
        let monitor = registry.monitor_containing(STARTUP_MONITOR_PROBE);
        let icons = PanelIcons::load(&assets);
        Self {
            platform,
            current_monitor: monitor,
            store: StrokeStore::default(),
            canvas: RasterSurface::new(monitor, TRANSPARENT_BACKGROUND),
            canvas_frame: RgbaBuffer::new(0, 0, TRANSPARENT_BACKGROUND),
            background: RasterSurface::new(monitor, TRANSPARENT_BACKGROUND),
            state: SurfaceState::new(settings.pen_style()),
            builder: StrokeBuilder::new(settings.erase_buffer_px),
            arbiter: ZOrderArbiter::new(settings.active_panel_opacity),
            dock: DockTab::new(monitor),
            panel: ControlPanel::new(PanelPalette::from_settings(settings), PANEL_START_POSITION),
            icons,
            hold: HoldToConfirm::new(settings.hold_to_clear()),
            hold_progress: None,
            next_hold_tick: None,
            cursors: CursorCache::new(assets),
            pending: PendingPresents::all(),
            exit_requested: false,
            registry,
        }
    }

    /// Positions the windows, enters passthrough and shows the first frames.
    pub fn startup(&mut self) -> Result<()> {
        let monitor = self.current_monitor;
        self.platform.set_bounds(WindowRole::Background, monitor);
        self.platform.set_bounds(WindowRole::Canvas, monitor);
        self.platform
            .set_bounds(WindowRole::ControlPanel, self.panel.bounds());
        self.platform.set_bounds(WindowRole::DockTab, self.dock.bounds());
        self.platform
            .set_input_passthrough(WindowRole::Background, true);

        let effects = self.state.enable_passthrough();
        self.apply_effects(effects);
        self.apply_window_ops(self.arbiter.startup());
        self.pending = PendingPresents::all();
        tracing::info!(
            x = monitor.x,
            y = monitor.y,
            width = monitor.width,
            height = monitor.height,
            "overlay started"
        );
        self.flush()
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn store(&self) -> &StrokeStore {
        &self.store
    }

    pub fn state(&self) -> &SurfaceState {
        &self.state
    }

    pub fn builder(&self) -> &StrokeBuilder {
        &self.builder
    }

    pub fn canvas(&self) -> &RasterSurface {
        &self.canvas
    }

    pub fn background_color(&self) -> Color {
        self.background.background()
    }

    pub fn panel(&self) -> &ControlPanel {
        &self.panel
    }

    pub fn dock(&self) -> &DockTab {
        &self.dock
    }

    pub fn registry(&self) -> &GeometryRegistry {
        &self.registry
    }

    pub fn current_monitor(&self) -> MonitorRect {
        self.current_monitor
    }

    pub fn current_monitor_index(&self) -> Option<usize> {
        self.registry.index_of(self.current_monitor)
    }

    pub fn hold_progress(&self) -> Option<f32> {
        self.hold_progress
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    pub fn handle_pointer(&mut self, event: PointerEvent, now: Instant) -> Result<()> {
        match event.role {
            WindowRole::Canvas => self.canvas_pointer(event),
            WindowRole::ControlPanel => self.panel_pointer(event, now),
            WindowRole::DockTab => self.dock_pointer(event),
            WindowRole::Background => {}
        }
        self.flush()
    }

    /// Advances the clear button's hold. Safe to call every loop pass; the
    /// progress only moves once per [`HOLD_TICK`].
    pub fn tick(&mut self, now: Instant) -> Result<()> {
        if self.next_hold_tick.is_some_and(|due| now < due) {
            return Ok(());
        }
        match self.hold.tick(now) {
            HoldProgress::Idle => self.next_hold_tick = None,
            HoldProgress::Filling(fraction) => {
                self.hold_progress = Some(fraction);
                self.next_hold_tick = Some(now + HOLD_TICK);
                self.pending.panel = true;
            }
            HoldProgress::Fired => {
                self.hold_progress = None;
                self.next_hold_tick = None;
                self.pending.panel = true;
                self.perform(PanelAction::Clear);
            }
        }
        self.flush()
    }

    pub fn perform_action(&mut self, action: PanelAction) -> Result<()> {
        self.perform(action);
        self.flush()
    }

    /// Moves the background and canvas onto `monitor`, keeping strokes at the
    /// same canvas-local coordinates.
    pub fn move_to_monitor(&mut self, monitor: MonitorRect) -> Result<()> {
        self.switch_monitor(monitor);
        self.flush()
    }

    fn canvas_pointer(&mut self, event: PointerEvent) {
        if !self.state.accepts_canvas_input() {
            return;
        }
        let local = global_to_local(event.point, self.canvas.rect().origin());
        let was_active = self.builder.is_active();
        let effect = match event.kind {
            PointerKind::Press => {
                self.builder
                    .press(local, self.state.pen(), &mut self.store, &mut self.canvas)
            }
            PointerKind::Move if event.left_down => {
                self.builder.motion(local, &mut self.store, &mut self.canvas)
            }
            PointerKind::Move | PointerKind::Leave => {
                if was_active && !event.left_down {
                    // The button came up outside the window.
                    self.builder.release(local, &mut self.store, &mut self.canvas)
                } else {
                    BuilderEffect::Ignored
                }
            }
            PointerKind::Release => {
                self.builder
                    .release(local, &mut self.store, &mut self.canvas)
            }
        };

        match effect {
            BuilderEffect::StrokeStarted => {
                let colored = !self.state.background().is_transparent_background();
                self.apply_window_ops(self.arbiter.stroke_started(colored));
            }
            BuilderEffect::Erased { .. } if event.kind == PointerKind::Press => {
                self.apply_window_ops(self.arbiter.erasing());
            }
            BuilderEffect::StrokeFinished { .. } | BuilderEffect::EraseReleased if was_active => {
                self.apply_window_ops(self.arbiter.pointer_released());
            }
            _ => {}
        }
        if effect.needs_present() {
            self.pending.canvas = true;
        }
    }

    fn panel_pointer(&mut self, event: PointerEvent, now: Instant) {
        if !self.panel.visible() {
            return;
        }
        let outcome = match event.kind {
            PointerKind::Press => self.panel.press(event.point),
            PointerKind::Move => self.panel.motion(event.point),
            PointerKind::Release => self.panel.release(event.point),
            PointerKind::Leave => self.panel.leave(),
        };
        match outcome {
            PanelEvent::None => {}
            PanelEvent::Dragged { origin } => {
                self.platform
                    .set_bounds(WindowRole::ControlPanel, self.panel.bounds());
                let target = self.registry.monitor_containing(origin);
                if target != self.current_monitor {
                    self.switch_monitor(target);
                }
            }
            PanelEvent::HoldStarted => {
                self.hold.press(now);
                self.hold_progress = Some(0.0);
                self.next_hold_tick = Some(now + HOLD_TICK);
                self.pending.panel = true;
            }
            PanelEvent::HoldCancelled => {
                self.hold.release();
                self.next_hold_tick = None;
                if self.hold_progress.take().is_some() {
                    tracing::debug!("clear hold cancelled");
                }
                self.pending.panel = true;
            }
            PanelEvent::Action(action) => self.perform(action),
        }
    }

    fn dock_pointer(&mut self, event: PointerEvent) {
        let outcome = match event.kind {
            PointerKind::Press => {
                self.dock.press(event.point);
                DockOutcome::None
            }
            PointerKind::Move => self.dock.motion(event.point),
            PointerKind::Release => self.dock.release(),
            PointerKind::Leave => DockOutcome::None,
        };
        match outcome {
            DockOutcome::None => {}
            DockOutcome::Moved(bounds) => {
                self.platform.set_bounds(WindowRole::DockTab, bounds);
            }
            DockOutcome::TogglePanel { panel_visible } => {
                tracing::debug!(panel_visible, "dock tab toggled control panel");
                self.panel.set_visible(panel_visible);
                self.platform
                    .set_visible(WindowRole::ControlPanel, panel_visible);
                if panel_visible {
                    self.apply_window_ops(self.arbiter.focus_control_panel());
                    self.pending.panel = true;
                }
                self.pending.dock = true;
            }
        }
    }

    fn perform(&mut self, action: PanelAction) {
        tracing::debug!(?action, "control panel action");
        let effects = match action {
            PanelAction::TogglePassthrough => self.state.toggle_passthrough(),
            PanelAction::Undo => {
                self.builder.suspend(&mut self.store);
                if self.store.undo_last() != UndoOutcome::Nothing {
                    self.rebuild_canvas();
                }
                // Undo does not leave erase mode.
                if self.state.tool() == Tool::Eraser && !self.state.passthrough_enabled() {
                    self.builder.enter_erase_mode(&mut self.store);
                }
                Vec::new()
            }
            PanelAction::Erase => self.state.enter_erase_mode(),
            PanelAction::Clear => {
                self.store.clear();
                self.rebuild_canvas();
                Vec::new()
            }
            PanelAction::SelectColor(color) => self.state.select_color(color),
            PanelAction::SelectWidth(width) => self.state.select_width(width),
            PanelAction::SetBackground(color) => self.state.set_background(color),
            PanelAction::ToggleCanvas => self.state.toggle_canvas_visibility(),
            PanelAction::Close => {
                tracing::info!("exit requested from control panel");
                self.exit_requested = true;
                Vec::new()
            }
        };
        self.apply_effects(effects);
        self.pending.panel = true;
    }

    fn apply_effects(&mut self, effects: Vec<SurfaceEffect>) {
        for effect in effects {
            match effect {
                SurfaceEffect::SetPassthrough(enabled) => {
                    self.platform
                        .set_input_passthrough(WindowRole::Canvas, enabled);
                    self.pending.panel = true;
                }
                SurfaceEffect::SetCanvasVisible(visible) => {
                    self.platform.set_visible(WindowRole::Background, visible);
                    self.platform.set_visible(WindowRole::Canvas, visible);
                    self.pending.panel = true;
                }
                SurfaceEffect::SetBackground(color) => {
                    self.background.set_background(color);
                    self.pending.background = true;
                }
                SurfaceEffect::SetCursor(kind) => {
                    let cursor = self.cursors.image_for(kind);
                    self.platform.set_cursor(cursor);
                }
                SurfaceEffect::ShowSelectors(_) => self.pending.panel = true,
                SurfaceEffect::FocusControlPanel => {
                    self.apply_window_ops(self.arbiter.focus_control_panel());
                }
                SurfaceEffect::SuspendBuilder => self.builder.suspend(&mut self.store),
                SurfaceEffect::ActivateTool(Tool::Eraser) => {
                    self.builder.enter_erase_mode(&mut self.store);
                }
                SurfaceEffect::ActivateTool(Tool::Pen) => self.builder.exit_erase_mode(),
            }
        }
    }

    fn apply_window_ops(&mut self, ops: Vec<WindowOp>) {
        apply_ops(&mut self.platform, &ops);
    }

    fn rebuild_canvas(&mut self) {
        self.canvas.rebuild(self.canvas.rect(), self.store.strokes());
        self.pending.canvas = true;
    }

    fn switch_monitor(&mut self, monitor: MonitorRect) {
        self.builder.suspend(&mut self.store);
        if self.state.tool() == Tool::Eraser && !self.state.passthrough_enabled() {
            self.builder.enter_erase_mode(&mut self.store);
        }
        self.current_monitor = monitor;
        self.canvas.rebuild(monitor, self.store.strokes());
        self.background
            .rebuild(monitor, std::iter::empty::<&Stroke>());
        self.platform.set_bounds(WindowRole::Background, monitor);
        self.platform.set_bounds(WindowRole::Canvas, monitor);
        let dock_bounds = self.dock.move_to_monitor(monitor);
        self.platform.set_bounds(WindowRole::DockTab, dock_bounds);
        self.apply_window_ops(self.arbiter.monitor_switched());
        self.pending = PendingPresents {
            panel: self.pending.panel,
            ..PendingPresents::all()
        };
        tracing::info!(
            index = ?self.registry.index_of(monitor),
            x = monitor.x,
            y = monitor.y,
            "moved overlay to monitor"
        );
    }

    fn flush(&mut self) -> Result<()> {
        let pending = std::mem::take(&mut self.pending);
        if pending.background {
            let mut frame = RgbaBuffer::new(0, 0, TRANSPARENT_BACKGROUND);
            self.background.paint(&mut frame);
            self.platform
                .present(WindowRole::Background, &frame, None)
                .context("present background layer")?;
        }
        if pending.canvas {
            // Only the area touched since the last present is recomposited.
            let same_size = self.canvas_frame.size() == self.canvas.size();
            let dirty = match self.canvas.take_dirty() {
                Some(rect) if same_size => {
                    self.canvas.paint_region(&mut self.canvas_frame, rect);
                    Some(Some(rect))
                }
                None if same_size => None,
                _ => {
                    self.canvas.paint(&mut self.canvas_frame);
                    Some(None)
                }
            };
            if let Some(dirty) = dirty {
                self.platform
                    .present(WindowRole::Canvas, &self.canvas_frame, dirty)
                    .context("present canvas")?;
            }
        }
        if pending.panel && self.panel.visible() {
            let view = PanelView {
                passthrough: self.state.passthrough_enabled(),
                canvas_visible: self.state.canvas_visible(),
                selectors_visible: self.state.selectors_visible(),
                pen: self.state.pen(),
                hold_progress: self.hold_progress,
            };
            let frame = render_panel(
                self.panel.layout(),
                self.panel.palette(),
                &view,
                &self.icons,
            );
            self.platform
                .present(WindowRole::ControlPanel, &frame, None)
                .context("present control panel")?;
        }
        if pending.dock {
            let frame = render_dock_tab(self.dock.panel_visible());
            self.platform
                .present(WindowRole::DockTab, &frame, None)
                .context("present dock tab")?;
        }
        Ok(())
    }
}
