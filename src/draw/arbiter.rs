use crate::draw::monitor::MonitorRect;
use crate::draw::platform::{WindowPlatform, WindowRole};

pub const TAB_WIDTH: i32 = 40;
pub const TAB_HEIGHT: i32 = 100;
pub const TAB_CONTAINER_WIDTH: i32 = 80;
pub const TAB_CONTAINER_HEIGHT: i32 = 160;
const TAB_OFFSET_X: i32 = 15;
const TAB_CONTAINER_BUFFER: i32 = (TAB_CONTAINER_WIDTH - TAB_WIDTH) / 2 - TAB_OFFSET_X;
const TAB_CLAMP_Y_OFFSET: i32 = 24;
const TAB_CLICK_SLOP: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowOp {
    Raise(WindowRole),
    Lower(WindowRole),
    Activate(WindowRole),
    SetOpacity(WindowRole, f32),
    SetBounds(WindowRole, MonitorRect),
}

pub fn apply_ops(platform: &mut dyn WindowPlatform, ops: &[WindowOp]) {
    for op in ops {
        match *op {
            WindowOp::Raise(role) => platform.raise(role),
            WindowOp::Lower(role) => platform.lower(role),
            WindowOp::Activate(role) => platform.activate(role),
            WindowOp::SetOpacity(role, opacity) => platform.set_opacity(role, opacity),
            WindowOp::SetBounds(role, rect) => platform.set_bounds(role, rect),
        }
    }
}

/// Decides how the four overlay windows are stacked and focused. The
/// background always sits lowest; the panel and dock tab must stay above
/// the canvas so they remain clickable over a colored board.
#[derive(Debug, Clone, PartialEq)]
pub struct ZOrderArbiter {
    active_panel_opacity: f32,
}

impl ZOrderArbiter {
    pub fn new(active_panel_opacity: f32) -> Self {
        Self {
            active_panel_opacity: active_panel_opacity.clamp(0.0, 1.0),
        }
    }

    pub fn startup(&self) -> Vec<WindowOp> {
        WindowRole::ALL.into_iter().map(WindowOp::Raise).collect()
    }

    pub fn stroke_started(&self, colored_background: bool) -> Vec<WindowOp> {
        let mut ops = Vec::new();
        if colored_background {
            ops.push(WindowOp::Raise(WindowRole::ControlPanel));
            ops.push(WindowOp::Raise(WindowRole::DockTab));
        }
        ops.push(WindowOp::SetOpacity(
            WindowRole::ControlPanel,
            self.active_panel_opacity,
        ));
        ops
    }

    /// Erasing lifts the ink above the panel so strokes under it can be hit.
    pub fn erasing(&self) -> Vec<WindowOp> {
        vec![
            WindowOp::Raise(WindowRole::Canvas),
            WindowOp::SetOpacity(WindowRole::ControlPanel, self.active_panel_opacity),
        ]
    }

    pub fn pointer_released(&self) -> Vec<WindowOp> {
        vec![
            WindowOp::SetOpacity(WindowRole::ControlPanel, 1.0),
            WindowOp::Raise(WindowRole::ControlPanel),
            WindowOp::Raise(WindowRole::DockTab),
        ]
    }

    pub fn focus_control_panel(&self) -> Vec<WindowOp> {
        vec![
            WindowOp::Activate(WindowRole::ControlPanel),
            WindowOp::Raise(WindowRole::ControlPanel),
        ]
    }

    pub fn monitor_switched(&self) -> Vec<WindowOp> {
        vec![
            WindowOp::Lower(WindowRole::Background),
            WindowOp::Raise(WindowRole::ControlPanel),
            WindowOp::Activate(WindowRole::ControlPanel),
            WindowOp::Raise(WindowRole::DockTab),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DockOutcome {
    None,
    Moved(MonitorRect),
    TogglePanel { panel_visible: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DockDrag {
    grab_offset_y: i32,
    start_y: i32,
    dragged: bool,
}

/// Handle pinned to the right edge of the current monitor. Dragging moves it
/// vertically; a click toggles the control panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockTab {
    monitor: MonitorRect,
    x: i32,
    y: i32,
    panel_visible: bool,
    drag: Option<DockDrag>,
}

impl DockTab {
    pub fn new(monitor: MonitorRect) -> Self {
        let y = monitor.y + (monitor.height as f32 * 0.25) as i32;
        let mut tab = Self {
            monitor,
            x: pinned_x(monitor),
            y,
            panel_visible: true,
            drag: None,
        };
        tab.y = tab.clamp_y(y);
        tab
    }

    pub fn bounds(&self) -> MonitorRect {
        MonitorRect::new(self.x, self.y, TAB_CONTAINER_WIDTH, TAB_CONTAINER_HEIGHT)
    }

    pub fn panel_visible(&self) -> bool {
        self.panel_visible
    }

    pub fn press(&mut self, global: (i32, i32)) {
        self.drag = Some(DockDrag {
            grab_offset_y: global.1 - self.y,
            start_y: global.1,
            dragged: false,
        });
    }

    pub fn motion(&mut self, global: (i32, i32)) -> DockOutcome {
        let Some(mut drag) = self.drag else {
            return DockOutcome::None;
        };
        if !drag.dragged && (global.1 - drag.start_y).abs() > TAB_CLICK_SLOP {
            drag.dragged = true;
        }
        self.drag = Some(drag);
        self.y = self.clamp_y(global.1 - drag.grab_offset_y);
        DockOutcome::Moved(self.bounds())
    }

    pub fn release(&mut self) -> DockOutcome {
        match self.drag.take() {
            Some(DockDrag { dragged: false, .. }) => {
                self.panel_visible = !self.panel_visible;
                DockOutcome::TogglePanel {
                    panel_visible: self.panel_visible,
                }
            }
            _ => DockOutcome::None,
        }
    }

    /// Re-pins the tab to `monitor`, keeping its height where possible.
    pub fn move_to_monitor(&mut self, monitor: MonitorRect) -> MonitorRect {
        self.monitor = monitor;
        self.x = pinned_x(monitor);
        self.y = self.clamp_y(self.y);
        self.bounds()
    }

    fn clamp_y(&self, y: i32) -> i32 {
        let top = self.monitor.y;
        let bottom = self.monitor.bottom() - 1 - TAB_HEIGHT - TAB_CLAMP_Y_OFFSET;
        y.min(bottom).max(top)
    }
}

fn pinned_x(monitor: MonitorRect) -> i32 {
    monitor.right() - 1 - TAB_WIDTH - TAB_CONTAINER_BUFFER
}

#[cfg(test)]
mod tests {
    use super::{apply_ops, DockOutcome, DockTab, WindowOp, ZOrderArbiter};
    use crate::draw::monitor::MonitorRect;
    use crate::draw::platform::{PlatformCall, RecordingPlatform, WindowRole};

    const PRIMARY: MonitorRect = MonitorRect::new(0, 0, 1920, 1080);
    const SECONDARY: MonitorRect = MonitorRect::new(1920, 200, 1280, 720);

    #[test]
    fn monitor_switch_lowers_background_and_restacks_chrome() {
        let arbiter = ZOrderArbiter::new(0.6);
        let mut platform = RecordingPlatform::default();
        apply_ops(&mut platform, &arbiter.monitor_switched());
        assert_eq!(
            platform.calls,
            vec![
                PlatformCall::Lower(WindowRole::Background),
                PlatformCall::Raise(WindowRole::ControlPanel),
                PlatformCall::Activate(WindowRole::ControlPanel),
                PlatformCall::Raise(WindowRole::DockTab),
            ]
        );
    }

    #[test]
    fn panel_dims_while_active_and_restores_on_release() {
        let arbiter = ZOrderArbiter::new(0.6);
        assert_eq!(
            arbiter.stroke_started(false),
            vec![WindowOp::SetOpacity(WindowRole::ControlPanel, 0.6)]
        );
        assert_eq!(arbiter.stroke_started(true).len(), 3);
        assert_eq!(
            arbiter.pointer_released()[0],
            WindowOp::SetOpacity(WindowRole::ControlPanel, 1.0)
        );
        assert_eq!(arbiter.erasing()[0], WindowOp::Raise(WindowRole::Canvas));
    }

    #[test]
    fn startup_raises_bottom_to_top() {
        let ops = ZOrderArbiter::new(0.6).startup();
        assert_eq!(ops.first(), Some(&WindowOp::Raise(WindowRole::Background)));
        assert_eq!(ops.last(), Some(&WindowOp::Raise(WindowRole::DockTab)));
    }

    #[test]
    fn dock_tab_starts_pinned_right_at_quarter_height() {
        let tab = DockTab::new(PRIMARY);
        let bounds = tab.bounds();
        assert_eq!(bounds.x, 1919 - 40 - 5);
        assert_eq!(bounds.y, 270);
        assert_eq!((bounds.width, bounds.height), (80, 160));
    }

    #[test]
    fn short_press_toggles_panel_and_drag_does_not() {
        let mut tab = DockTab::new(PRIMARY);
        tab.press((1900, 300));
        tab.motion((1900, 303));
        assert_eq!(
            tab.release(),
            DockOutcome::TogglePanel {
                panel_visible: false
            }
        );

        tab.press((1900, 300));
        tab.motion((1900, 340));
        assert_eq!(tab.release(), DockOutcome::None);
        assert!(!tab.panel_visible());
        assert_eq!(tab.bounds().y, 313);
    }

    #[test]
    fn drag_is_clamped_to_monitor() {
        let mut tab = DockTab::new(PRIMARY);
        tab.press((1900, 300));
        tab.motion((1900, -500));
        assert_eq!(tab.bounds().y, 0);
        tab.motion((1900, 5000));
        assert_eq!(tab.bounds().y, 1079 - 100 - 24);
    }

    #[test]
    fn moving_to_another_monitor_repins_and_reclamps() {
        let mut tab = DockTab::new(PRIMARY);
        let bounds = tab.move_to_monitor(SECONDARY);
        assert_eq!(bounds.x, 1920 + 1279 - 40 - 5);
        assert_eq!(bounds.y, 270);

        let mut low = DockTab::new(PRIMARY);
        low.press((1900, 270));
        low.motion((1900, 900));
        let bounds = low.move_to_monitor(SECONDARY);
        assert_eq!(bounds.y, 200 + 719 - 100 - 24);
    }
}
