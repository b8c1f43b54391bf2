use crate::draw::composite::RgbaBuffer;
use crate::draw::cursor::CursorImage;
use crate::draw::monitor::MonitorRect;
use crate::draw::render::DirtyRect;
use anyhow::Result;

/// The four stacked windows of the overlay, bottom to top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowRole {
    Background,
    Canvas,
    ControlPanel,
    DockTab,
}

impl WindowRole {
    pub const ALL: [WindowRole; 4] = [
        WindowRole::Background,
        WindowRole::Canvas,
        WindowRole::ControlPanel,
        WindowRole::DockTab,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Press,
    Move,
    Release,
    Leave,
}

/// A pointer event in global (virtual desktop) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerEvent {
    pub role: WindowRole,
    pub kind: PointerKind,
    pub point: (i32, i32),
    pub left_down: bool,
}

impl PointerEvent {
    pub fn new(role: WindowRole, kind: PointerKind, point: (i32, i32)) -> Self {
        Self {
            role,
            kind,
            point,
            left_down: matches!(kind, PointerKind::Press | PointerKind::Move),
        }
    }

    /// The pointer left `role`'s window at global `point` with the button in
    /// the given state. A leave with the button still down is not a release.
    pub fn leave(role: WindowRole, point: (i32, i32), left_down: bool) -> Self {
        Self {
            role,
            kind: PointerKind::Leave,
            point,
            left_down,
        }
    }
}

/// Windowing capabilities the overlay needs from the OS. Calls that cannot
/// fail in a way the overlay could recover from are infallible; backends log
/// failures instead.
pub trait WindowPlatform {
    fn set_input_passthrough(&mut self, role: WindowRole, enabled: bool);
    fn raise(&mut self, role: WindowRole);
    fn lower(&mut self, role: WindowRole);
    fn activate(&mut self, role: WindowRole);
    fn set_opacity(&mut self, role: WindowRole, opacity: f32);
    fn set_visible(&mut self, role: WindowRole, visible: bool);
    fn set_bounds(&mut self, role: WindowRole, rect: MonitorRect);
    /// `None` restores the system arrow.
    fn set_cursor(&mut self, cursor: Option<&CursorImage>);
    /// `dirty` bounds what changed since the last present of `role`; `None`
    /// means the whole frame.
    fn present(&mut self, role: WindowRole, frame: &RgbaBuffer, dirty: Option<DirtyRect>)
        -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlatformCall {
    SetInputPassthrough(WindowRole, bool),
    Raise(WindowRole),
    Lower(WindowRole),
    Activate(WindowRole),
    SetOpacity(WindowRole, f32),
    SetVisible(WindowRole, bool),
    SetBounds(WindowRole, MonitorRect),
    SetCursor(Option<(u32, u32)>),
    Present(WindowRole, (u32, u32), Option<DirtyRect>),
}

/// Headless platform that records every call; frames presented to it are
/// kept so tests can inspect pixels.
#[derive(Debug, Default)]
pub struct RecordingPlatform {
    pub calls: Vec<PlatformCall>,
    frames: Vec<(WindowRole, RgbaBuffer)>,
}

impl RecordingPlatform {
    pub fn take_calls(&mut self) -> Vec<PlatformCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn last_frame(&self, role: WindowRole) -> Option<&RgbaBuffer> {
        self.frames
            .iter()
            .rev()
            .find(|(frame_role, _)| *frame_role == role)
            .map(|(_, frame)| frame)
    }

    pub fn last_passthrough(&self, role: WindowRole) -> Option<bool> {
        self.calls.iter().rev().find_map(|call| match call {
            PlatformCall::SetInputPassthrough(r, enabled) if *r == role => Some(*enabled),
            _ => None,
        })
    }

    pub fn last_opacity(&self, role: WindowRole) -> Option<f32> {
        self.calls.iter().rev().find_map(|call| match call {
            PlatformCall::SetOpacity(r, opacity) if *r == role => Some(*opacity),
            _ => None,
        })
    }

    pub fn last_present_dirty(&self, role: WindowRole) -> Option<Option<DirtyRect>> {
        self.calls.iter().rev().find_map(|call| match call {
            PlatformCall::Present(r, _, dirty) if *r == role => Some(*dirty),
            _ => None,
        })
    }

    pub fn last_bounds(&self, role: WindowRole) -> Option<MonitorRect> {
        self.calls.iter().rev().find_map(|call| match call {
            PlatformCall::SetBounds(r, rect) if *r == role => Some(*rect),
            _ => None,
        })
    }
}

impl WindowPlatform for RecordingPlatform {
    fn set_input_passthrough(&mut self, role: WindowRole, enabled: bool) {
        self.calls
            .push(PlatformCall::SetInputPassthrough(role, enabled));
    }

    fn raise(&mut self, role: WindowRole) {
        self.calls.push(PlatformCall::Raise(role));
    }

    fn lower(&mut self, role: WindowRole) {
        self.calls.push(PlatformCall::Lower(role));
    }

    fn activate(&mut self, role: WindowRole) {
        self.calls.push(PlatformCall::Activate(role));
    }

    fn set_opacity(&mut self, role: WindowRole, opacity: f32) {
        self.calls.push(PlatformCall::SetOpacity(role, opacity));
    }

    fn set_visible(&mut self, role: WindowRole, visible: bool) {
        self.calls.push(PlatformCall::SetVisible(role, visible));
    }

    fn set_bounds(&mut self, role: WindowRole, rect: MonitorRect) {
        self.calls.push(PlatformCall::SetBounds(role, rect));
    }

    fn set_cursor(&mut self, cursor: Option<&CursorImage>) {
        self.calls.push(PlatformCall::SetCursor(
            cursor.map(|cursor| cursor.image.size()),
        ));
    }

    fn present(
        &mut self,
        role: WindowRole,
        frame: &RgbaBuffer,
        dirty: Option<DirtyRect>,
    ) -> Result<()> {
        self.calls.push(PlatformCall::Present(role, frame.size(), dirty));
        self.frames.retain(|(frame_role, _)| *frame_role != role);
        self.frames.push((role, frame.clone()));
        Ok(())
    }
}
