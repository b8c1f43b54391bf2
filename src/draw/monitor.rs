use anyhow::{anyhow, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MonitorRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl MonitorRect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub fn right(self) -> i32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(self) -> i32 {
        self.y + self.height
    }

    pub fn size(self) -> (u32, u32) {
        (self.width.max(0) as u32, self.height.max(0) as u32)
    }

    pub fn origin(self) -> (i32, i32) {
        (self.x, self.y)
    }

    pub fn union(self, other: MonitorRect) -> MonitorRect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        MonitorRect {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }
}

pub fn monitor_contains_point(rect: MonitorRect, point: (i32, i32)) -> bool {
    point.0 >= rect.x && point.0 < rect.right() && point.1 >= rect.y && point.1 < rect.bottom()
}

pub fn select_monitor_for_point(
    monitors: &[MonitorRect],
    point: (i32, i32),
) -> Option<MonitorRect> {
    monitors
        .iter()
        .copied()
        .find(|rect| monitor_contains_point(*rect, point))
}

pub fn global_to_local(point: (i32, i32), origin: (i32, i32)) -> (i32, i32) {
    (point.0 - origin.0, point.1 - origin.1)
}

/// Monitor layout captured once at startup. Hot-plugging is not tracked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeometryRegistry {
    monitors: Vec<MonitorRect>,
    virtual_bounds: MonitorRect,
}

impl GeometryRegistry {
    pub fn new(monitors: Vec<MonitorRect>) -> Result<Self> {
        let monitors: Vec<MonitorRect> = monitors
            .into_iter()
            .filter(|rect| rect.width > 0 && rect.height > 0)
            .collect();
        let first = monitors
            .first()
            .copied()
            .ok_or_else(|| anyhow!("no monitors available to host the drawing surface"))?;
        let virtual_bounds = monitors
            .iter()
            .skip(1)
            .fold(first, |acc, rect| acc.union(*rect));
        Ok(Self {
            monitors,
            virtual_bounds,
        })
    }

    pub fn enumerate() -> Result<Self> {
        let monitors = enumerate_monitors();
        tracing::debug!(count = monitors.len(), "enumerated monitors");
        Self::new(monitors)
    }

    pub fn geometries_for_all_monitors(&self) -> &[MonitorRect] {
        &self.monitors
    }

    pub fn virtual_bounds(&self) -> MonitorRect {
        self.virtual_bounds
    }

    pub fn monitor_containing(&self, point: (i32, i32)) -> MonitorRect {
        select_monitor_for_point(&self.monitors, point).unwrap_or(self.virtual_bounds)
    }

    pub fn index_of(&self, rect: MonitorRect) -> Option<usize> {
        self.monitors.iter().position(|candidate| *candidate == rect)
    }

    pub fn monitor(&self, index: usize) -> Option<MonitorRect> {
        self.monitors.get(index).copied()
    }
}

#[cfg(windows)]
fn enumerate_monitors() -> Vec<MonitorRect> {
    use windows::Win32::Foundation::{BOOL, LPARAM, RECT};
    use windows::Win32::Graphics::Gdi::{
        EnumDisplayMonitors, GetMonitorInfoW, HDC, HMONITOR, MONITORINFO,
    };

    unsafe extern "system" fn collect(
        handle: HMONITOR,
        _dc: HDC,
        _clip: *mut RECT,
        out: LPARAM,
    ) -> BOOL {
        let found = unsafe { &mut *(out.0 as *mut Vec<MonitorRect>) };
        let mut info = MONITORINFO {
            cbSize: std::mem::size_of::<MONITORINFO>() as u32,
            ..Default::default()
        };
        if unsafe { GetMonitorInfoW(handle, &mut info) }.as_bool() {
            let r = info.rcMonitor;
            found.push(MonitorRect::new(r.left, r.top, r.right - r.left, r.bottom - r.top));
        } else {
            tracing::warn!("GetMonitorInfoW failed; skipping monitor");
        }
        BOOL(1)
    }

    let mut found: Vec<MonitorRect> = Vec::new();
    let ok = unsafe {
        EnumDisplayMonitors(
            HDC::default(),
            None,
            Some(collect),
            LPARAM(&mut found as *mut Vec<MonitorRect> as isize),
        )
    };
    if !ok.as_bool() {
        tracing::warn!("EnumDisplayMonitors reported failure");
    }
    found
}

#[cfg(not(windows))]
fn enumerate_monitors() -> Vec<MonitorRect> {
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::{monitor_contains_point, GeometryRegistry, MonitorRect};

    fn side_by_side() -> GeometryRegistry {
        GeometryRegistry::new(vec![
            MonitorRect::new(-1920, 0, 1920, 1080),
            MonitorRect::new(0, 0, 2560, 1440),
        ])
        .expect("registry")
    }

    #[test]
    fn right_and_bottom_edges_belong_to_the_neighbour() {
        let registry = side_by_side();
        let main = MonitorRect::new(0, 0, 2560, 1440);
        assert!(monitor_contains_point(main, (2559, 1439)));
        assert!(!monitor_contains_point(main, (2560, 10)));
        assert_eq!(registry.monitor_containing((-1, 0)), registry.monitor(0).expect("left"));
        assert_eq!(registry.monitor_containing((0, 0)), main);
        assert_eq!(registry.index_of(main), Some(1));
    }

    #[test]
    fn virtual_bounds_cover_every_monitor() {
        let registry = side_by_side();
        assert_eq!(
            registry.virtual_bounds(),
            MonitorRect::new(-1920, 0, 1920 + 2560, 1440)
        );
    }

    #[test]
    fn point_outside_all_monitors_falls_back_to_virtual_bounds() {
        let registry = side_by_side();
        // Below the shorter left monitor but inside the virtual rect.
        assert_eq!(
            registry.monitor_containing((-100, 1200)),
            registry.virtual_bounds()
        );
        assert_eq!(
            registry.monitor_containing((10, 10)),
            MonitorRect::new(0, 0, 2560, 1440)
        );
    }

    #[test]
    fn overlapping_monitors_resolve_to_first_in_enumeration_order() {
        let registry = GeometryRegistry::new(vec![
            MonitorRect::new(0, 0, 1920, 1080),
            MonitorRect::new(0, 0, 1280, 720),
        ])
        .expect("registry");
        assert_eq!(
            registry.monitor_containing((100, 100)),
            MonitorRect::new(0, 0, 1920, 1080)
        );
    }

    #[test]
    fn empty_enumeration_is_an_error() {
        let err = GeometryRegistry::new(Vec::new()).expect_err("no monitors");
        assert!(err.to_string().contains("no monitors"));
    }
}
