use crate::draw::assets::AssetRoot;
use crate::draw::monitor::GeometryRegistry;
use crate::draw::settings::DrawSettings;
use anyhow::Result;
use std::time::Duration;

/// How long the run loop sleeps when a pass handled no input.
pub const IDLE_WAIT: Duration = Duration::from_millis(4);

/// Creates the overlay windows and runs until the close button is used or
/// the message queue is shut down.
#[cfg(windows)]
pub fn run(settings: &DrawSettings, registry: GeometryRegistry) -> Result<()> {
    use crate::draw::service::DrawCoordinator;
    use std::time::Instant;

    let platform = platform::Win32Platform::create()?;
    let assets = AssetRoot::resolve(settings.asset_dir.as_deref());
    tracing::debug!(root = %assets.root().display(), "resolved asset root");
    let mut coordinator = DrawCoordinator::new(settings, registry, assets, platform);
    coordinator.startup()?;

    loop {
        if !platform::pump_messages() {
            tracing::info!("message queue closed");
            break;
        }
        let events = coordinator.platform().drain_pointer_events();
        let now = Instant::now();
        for event in &events {
            if let Err(err) = coordinator.handle_pointer(*event, now) {
                tracing::warn!(error = %format!("{err:#}"), "failed to handle pointer event");
            }
        }
        if coordinator.hold_progress().is_some() {
            if let Err(err) = coordinator.tick(now) {
                tracing::warn!(error = %format!("{err:#}"), "failed to advance hold");
            }
        }
        if coordinator.exit_requested() {
            break;
        }
        if events.is_empty() {
            std::thread::sleep(IDLE_WAIT);
        }
    }
    Ok(())
}

#[cfg(not(windows))]
pub fn run(settings: &DrawSettings, registry: GeometryRegistry) -> Result<()> {
    let assets = AssetRoot::resolve(settings.asset_dir.as_deref());
    tracing::debug!(
        monitors = registry.geometries_for_all_monitors().len(),
        root = %assets.root().display(),
        "no windowing backend"
    );
    anyhow::bail!("the drawing overlay needs a Windows desktop session")
}

#[cfg(windows)]
pub use platform::Win32Platform;

#[cfg(windows)]
mod platform {
    use crate::draw::composite::{
        rgba_to_premultiplied_bgra, update_premultiplied_bgra, RgbaBuffer,
    };
    use crate::draw::cursor::CursorImage;
    use crate::draw::monitor::MonitorRect;
    use crate::draw::platform::{PointerEvent, PointerKind, WindowPlatform, WindowRole};
    use crate::draw::render::DirtyRect;
    use anyhow::{anyhow, Context, Result};
    use once_cell::sync::Lazy;
    use std::collections::HashMap;
    use std::mem;
    use std::ptr;
    use std::sync::mpsc::{channel, Receiver, Sender};
    use std::sync::{Mutex, Once};
    use windows::core::PCWSTR;
    use windows::Win32::Foundation::{
        BOOL, COLORREF, HANDLE, HWND, LPARAM, LRESULT, POINT, SIZE, WPARAM,
    };
    use windows::Win32::Graphics::Gdi::{
        CreateBitmap, CreateCompatibleDC, CreateDIBSection, DeleteDC, DeleteObject, GetDC,
        ReleaseDC, SelectObject, AC_SRC_ALPHA, AC_SRC_OVER, BITMAPINFO, BITMAPINFOHEADER, BI_RGB,
        BLENDFUNCTION, DIB_RGB_COLORS, HBITMAP, HDC,
    };
    use windows::Win32::System::LibraryLoader::GetModuleHandleW;
    use windows::Win32::UI::Input::KeyboardAndMouse::{
        GetCapture, GetKeyState, ReleaseCapture, SetCapture, TrackMouseEvent, TME_LEAVE,
        TRACKMOUSEEVENT, VK_LBUTTON,
    };
    use windows::Win32::UI::WindowsAndMessaging::{
        CreateIconIndirect, CreateWindowExW, DefWindowProcW, DestroyCursor, DestroyWindow,
        DispatchMessageW, GetCursorPos, GetWindowLongPtrW, LoadCursorW, PeekMessageW, RegisterClassW,
        SetCursor, SetForegroundWindow, SetWindowLongPtrW, SetWindowPos, ShowWindow,
        TranslateMessage, UpdateLayeredWindow, GWL_EXSTYLE, HCURSOR, HWND_TOPMOST, ICONINFO,
        IDC_ARROW, MSG, PM_REMOVE, SWP_NOACTIVATE, SWP_NOMOVE, SWP_NOSIZE, SWP_NOZORDER,
        SW_HIDE, SW_SHOWNOACTIVATE, ULW_ALPHA, WINDOW_EX_STYLE, WINDOW_STYLE, WM_LBUTTONDOWN,
        WM_LBUTTONUP, WM_MOUSEMOVE, WM_QUIT, WM_SETCURSOR, WNDCLASSW, WS_EX_LAYERED,
        WS_EX_NOACTIVATE, WS_EX_TOOLWINDOW, WS_EX_TOPMOST, WS_EX_TRANSPARENT, WS_POPUP,
    };

    const WM_MOUSELEAVE: u32 = 0x02A3;
    const MK_LBUTTON: usize = 0x0001;
    const CLASS_NAME: &str = "EddrawOverlayWindow";

    static POINTER_SENDER: Lazy<Mutex<Option<Sender<PointerEvent>>>> =
        Lazy::new(|| Mutex::new(None));
    /// Role and screen origin per window, keyed by the raw handle.
    static WINDOW_ROLES: Lazy<Mutex<HashMap<isize, (WindowRole, (i32, i32))>>> =
        Lazy::new(|| Mutex::new(HashMap::new()));
    /// Raw handle of the custom canvas cursor, if one is active.
    static CANVAS_CURSOR: Lazy<Mutex<Option<isize>>> = Lazy::new(|| Mutex::new(None));

    pub fn window_ex_style(role: WindowRole) -> WINDOW_EX_STYLE {
        let base = WS_EX_LAYERED | WS_EX_TOPMOST | WS_EX_TOOLWINDOW;
        match role {
            WindowRole::Background | WindowRole::Canvas => base | WS_EX_NOACTIVATE,
            WindowRole::ControlPanel | WindowRole::DockTab => base,
        }
    }

    fn widestring(value: &str) -> Vec<u16> {
        use std::os::windows::ffi::OsStrExt;
        std::ffi::OsStr::new(value)
            .encode_wide()
            .chain(std::iter::once(0))
            .collect()
    }

    /// Drains the thread's message queue. Returns `false` once `WM_QUIT` is seen.
    pub fn pump_messages() -> bool {
        unsafe {
            let mut msg = MSG::default();
            while PeekMessageW(&mut msg, HWND::default(), 0, 0, PM_REMOVE).into() {
                if msg.message == WM_QUIT {
                    return false;
                }
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }
        true
    }

    fn handle_key(hwnd: HWND) -> isize {
        hwnd.0 as isize
    }

    fn send_pointer(hwnd: HWND, kind: PointerKind, lparam: LPARAM, left_down: bool) {
        let local_x = (lparam.0 & 0xffff) as i16 as i32;
        let local_y = ((lparam.0 >> 16) & 0xffff) as i16 as i32;
        let Some((role, origin)) = WINDOW_ROLES
            .lock()
            .ok()
            .and_then(|roles| roles.get(&handle_key(hwnd)).copied())
        else {
            return;
        };
        let mut event = PointerEvent::new(role, kind, (origin.0 + local_x, origin.1 + local_y));
        event.left_down = left_down;
        post_pointer(event);
    }

    /// Reports a leave with the cursor's screen position and the live button
    /// state. While this window holds capture the drag continues and the
    /// matching `WM_LBUTTONUP` ends it, so no leave is sent.
    fn send_leave(hwnd: HWND) {
        if unsafe { GetCapture() } == hwnd {
            return;
        }
        let Some(role) = WINDOW_ROLES
            .lock()
            .ok()
            .and_then(|roles| roles.get(&handle_key(hwnd)).map(|(role, _)| *role))
        else {
            return;
        };
        let mut cursor = POINT::default();
        if unsafe { GetCursorPos(&mut cursor) }.is_err() {
            return;
        }
        let left_down = unsafe { GetKeyState(i32::from(VK_LBUTTON.0)) } < 0;
        post_pointer(PointerEvent::leave(role, (cursor.x, cursor.y), left_down));
    }

    fn post_pointer(event: PointerEvent) {
        if let Ok(sender) = POINTER_SENDER.lock() {
            if let Some(tx) = sender.as_ref() {
                let _ = tx.send(event);
            }
        }
    }

    unsafe extern "system" fn overlay_wndproc(
        hwnd: HWND,
        msg: u32,
        wparam: WPARAM,
        lparam: LPARAM,
    ) -> LRESULT {
        match msg {
            WM_LBUTTONDOWN => {
                let _ = unsafe { SetCapture(hwnd) };
                send_pointer(hwnd, PointerKind::Press, lparam, true);
                LRESULT(0)
            }
            WM_MOUSEMOVE => {
                let mut track = TRACKMOUSEEVENT {
                    cbSize: mem::size_of::<TRACKMOUSEEVENT>() as u32,
                    dwFlags: TME_LEAVE,
                    hwndTrack: hwnd,
                    dwHoverTime: 0,
                };
                let _ = unsafe { TrackMouseEvent(&mut track) };
                let left_down = wparam.0 & MK_LBUTTON != 0;
                send_pointer(hwnd, PointerKind::Move, lparam, left_down);
                LRESULT(0)
            }
            WM_LBUTTONUP => {
                let _ = unsafe { ReleaseCapture() };
                send_pointer(hwnd, PointerKind::Release, lparam, false);
                LRESULT(0)
            }
            WM_MOUSELEAVE => {
                send_leave(hwnd);
                LRESULT(0)
            }
            WM_SETCURSOR => {
                let is_canvas = WINDOW_ROLES
                    .lock()
                    .ok()
                    .and_then(|roles| roles.get(&handle_key(hwnd)).map(|(role, _)| *role))
                    == Some(WindowRole::Canvas);
                let custom = CANVAS_CURSOR.lock().ok().and_then(|cursor| *cursor);
                match custom {
                    Some(raw) if is_canvas => {
                        unsafe { SetCursor(HCURSOR(raw as *mut _)) };
                        LRESULT(1)
                    }
                    _ => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
                }
            }
            _ => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
        }
    }

    #[derive(Debug)]
    struct LayeredWindow {
        hwnd: HWND,
        bounds: MonitorRect,
        alpha: u8,
        /// Premultiplied BGRA copy of the last presented frame.
        bgra: Vec<u8>,
        bgra_size: (u32, u32),
    }

    /// One layered, topmost popup per [`WindowRole`]. Must be created and
    /// used on the thread that pumps messages.
    pub struct Win32Platform {
        windows: HashMap<WindowRole, LayeredWindow>,
        pointer_rx: Receiver<PointerEvent>,
        cursor: Option<HCURSOR>,
    }

    impl Win32Platform {
        pub fn create() -> Result<Self> {
            static REGISTER_CLASS: Once = Once::new();
            let class_name = widestring(CLASS_NAME);
            let hinstance = unsafe { GetModuleHandleW(PCWSTR::null()) }
                .context("resolve module handle")?;

            REGISTER_CLASS.call_once(|| unsafe {
                let wc = WNDCLASSW {
                    hInstance: hinstance.into(),
                    lpszClassName: PCWSTR(class_name.as_ptr()),
                    lpfnWndProc: Some(overlay_wndproc),
                    hCursor: LoadCursorW(None, IDC_ARROW).unwrap_or_default(),
                    ..Default::default()
                };
                let _ = RegisterClassW(&wc);
            });

            let (pointer_tx, pointer_rx) = channel::<PointerEvent>();
            if let Ok(mut sender) = POINTER_SENDER.lock() {
                *sender = Some(pointer_tx);
            }

            let mut platform = Self {
                windows: HashMap::new(),
                pointer_rx,
                cursor: None,
            };
            for role in WindowRole::ALL {
                let hwnd = unsafe {
                    CreateWindowExW(
                        window_ex_style(role),
                        PCWSTR(class_name.as_ptr()),
                        PCWSTR::null(),
                        WINDOW_STYLE(WS_POPUP.0),
                        0,
                        0,
                        1,
                        1,
                        None,
                        None,
                        hinstance,
                        None,
                    )
                }
                .with_context(|| format!("create {role:?} window"))?;
                if let Ok(mut roles) = WINDOW_ROLES.lock() {
                    roles.insert(handle_key(hwnd), (role, (0, 0)));
                }
                unsafe {
                    let _ = ShowWindow(hwnd, SW_SHOWNOACTIVATE);
                }
                platform.windows.insert(
                    role,
                    LayeredWindow {
                        hwnd,
                        bounds: MonitorRect::new(0, 0, 1, 1),
                        alpha: 255,
                        bgra: Vec::new(),
                        bgra_size: (0, 0),
                    },
                );
            }
            tracing::debug!("created overlay windows");
            Ok(platform)
        }

        pub fn drain_pointer_events(&self) -> Vec<PointerEvent> {
            self.pointer_rx.try_iter().collect()
        }

        fn hwnd(&self, role: WindowRole) -> Option<HWND> {
            self.windows.get(&role).map(|window| window.hwnd)
        }

        fn blend(alpha: u8) -> BLENDFUNCTION {
            BLENDFUNCTION {
                BlendOp: AC_SRC_OVER as u8,
                BlendFlags: 0,
                SourceConstantAlpha: alpha,
                AlphaFormat: AC_SRC_ALPHA as u8,
            }
        }

        fn destroy_cursor(&mut self) {
            if let Ok(mut active) = CANVAS_CURSOR.lock() {
                *active = None;
            }
            if let Some(cursor) = self.cursor.take() {
                unsafe {
                    let _ = DestroyCursor(cursor);
                }
            }
        }
    }

    fn bitmap_info(width: u32, height: u32) -> BITMAPINFO {
        BITMAPINFO {
            bmiHeader: BITMAPINFOHEADER {
                biSize: mem::size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: width as i32,
                biHeight: -(height as i32),
                biPlanes: 1,
                biBitCount: 32,
                biCompression: BI_RGB.0,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// 32-bit top-down DIB filled with `bgra`.
    unsafe fn create_dib(hdc: HDC, width: u32, height: u32, bgra: &[u8]) -> Result<HBITMAP> {
        let bmi = bitmap_info(width, height);
        let mut bits: *mut core::ffi::c_void = ptr::null_mut();
        let dib = unsafe {
            CreateDIBSection(hdc, &bmi, DIB_RGB_COLORS, &mut bits, HANDLE::default(), 0)
        }
        .context("create DIB section")?;
        if bits.is_null() {
            unsafe {
                let _ = DeleteObject(dib);
            }
            return Err(anyhow!("DIB section has no pixel storage"));
        }
        unsafe { ptr::copy_nonoverlapping(bgra.as_ptr(), bits as *mut u8, bgra.len()) };
        Ok(dib)
    }

    fn create_cursor(cursor: &CursorImage) -> Result<HCURSOR> {
        let (width, height) = cursor.image.size();
        // Cursor bitmaps take straight alpha.
        let bgra: Vec<u8> = cursor
            .image
            .pixels
            .chunks_exact(4)
            .flat_map(|px| [px[2], px[1], px[0], px[3]])
            .collect();
        unsafe {
            let screen = GetDC(HWND::default());
            let color = create_dib(screen, width, height, &bgra);
            ReleaseDC(HWND::default(), screen);
            let color = color?;
            let mask = CreateBitmap(width as i32, height as i32, 1, 1, None);
            let info = ICONINFO {
                fIcon: BOOL(0),
                xHotspot: cursor.hotspot.0,
                yHotspot: cursor.hotspot.1,
                hbmMask: mask,
                hbmColor: color,
            };
            let icon = CreateIconIndirect(&info);
            let _ = DeleteObject(mask);
            let _ = DeleteObject(color);
            let icon = icon.context("create cursor")?;
            Ok(HCURSOR(icon.0))
        }
    }

    impl WindowPlatform for Win32Platform {
        fn set_input_passthrough(&mut self, role: WindowRole, enabled: bool) {
            let Some(hwnd) = self.hwnd(role) else {
                return;
            };
            unsafe {
                let style = GetWindowLongPtrW(hwnd, GWL_EXSTYLE);
                let transparent = WS_EX_TRANSPARENT.0 as isize;
                let next = if enabled {
                    style | transparent
                } else {
                    style & !transparent
                };
                if next != style {
                    SetWindowLongPtrW(hwnd, GWL_EXSTYLE, next);
                }
            }
        }

        fn raise(&mut self, role: WindowRole) {
            let Some(hwnd) = self.hwnd(role) else {
                return;
            };
            unsafe {
                let _ = SetWindowPos(
                    hwnd,
                    HWND_TOPMOST,
                    0,
                    0,
                    0,
                    0,
                    SWP_NOMOVE | SWP_NOSIZE | SWP_NOACTIVATE,
                );
            }
        }

        /// Places the window directly beneath the canvas (the canvas itself
        /// goes beneath the background).
        fn lower(&mut self, role: WindowRole) {
            let anchor_role = if role == WindowRole::Canvas {
                WindowRole::Background
            } else {
                WindowRole::Canvas
            };
            let (Some(hwnd), Some(anchor)) = (self.hwnd(role), self.hwnd(anchor_role)) else {
                return;
            };
            unsafe {
                let _ = SetWindowPos(
                    hwnd,
                    anchor,
                    0,
                    0,
                    0,
                    0,
                    SWP_NOMOVE | SWP_NOSIZE | SWP_NOACTIVATE,
                );
            }
        }

        fn activate(&mut self, role: WindowRole) {
            if let Some(hwnd) = self.hwnd(role) {
                unsafe {
                    let _ = SetForegroundWindow(hwnd);
                }
            }
        }

        fn set_opacity(&mut self, role: WindowRole, opacity: f32) {
            let Some(window) = self.windows.get_mut(&role) else {
                return;
            };
            window.alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
            let blend = Self::blend(window.alpha);
            let result = unsafe {
                UpdateLayeredWindow(
                    window.hwnd,
                    HDC::default(),
                    None,
                    None,
                    HDC::default(),
                    None,
                    COLORREF(0),
                    Some(&blend as *const BLENDFUNCTION),
                    ULW_ALPHA,
                )
            };
            if let Err(err) = result {
                tracing::warn!(?role, error = %err, "failed to change window opacity");
            }
        }

        fn set_visible(&mut self, role: WindowRole, visible: bool) {
            if let Some(hwnd) = self.hwnd(role) {
                let command = if visible { SW_SHOWNOACTIVATE } else { SW_HIDE };
                unsafe {
                    let _ = ShowWindow(hwnd, command);
                }
            }
        }

        fn set_bounds(&mut self, role: WindowRole, rect: MonitorRect) {
            let Some(window) = self.windows.get_mut(&role) else {
                return;
            };
            window.bounds = rect;
            if let Ok(mut roles) = WINDOW_ROLES.lock() {
                roles.insert(handle_key(window.hwnd), (role, rect.origin()));
            }
            unsafe {
                let _ = SetWindowPos(
                    window.hwnd,
                    HWND::default(),
                    rect.x,
                    rect.y,
                    rect.width,
                    rect.height,
                    SWP_NOZORDER | SWP_NOACTIVATE,
                );
            }
        }

        fn set_cursor(&mut self, cursor: Option<&CursorImage>) {
            self.destroy_cursor();
            let next = match cursor.map(create_cursor).transpose() {
                Ok(next) => next,
                Err(err) => {
                    tracing::warn!(error = %format!("{err:#}"), "falling back to system cursor");
                    None
                }
            };
            self.cursor = next;
            if let Ok(mut active) = CANVAS_CURSOR.lock() {
                *active = next.map(|cursor| cursor.0 as isize);
            }
            unsafe {
                match next {
                    Some(cursor) => {
                        SetCursor(cursor);
                    }
                    None => {
                        SetCursor(LoadCursorW(None, IDC_ARROW).unwrap_or_default());
                    }
                }
            }
        }

        fn present(
            &mut self,
            role: WindowRole,
            frame: &RgbaBuffer,
            dirty: Option<DirtyRect>,
        ) -> Result<()> {
            let window = self
                .windows
                .get_mut(&role)
                .ok_or_else(|| anyhow!("no window for {role:?}"))?;
            match dirty.and_then(|rect| rect.clamp(frame.width, frame.height)) {
                Some(rect) if window.bgra_size == frame.size() => {
                    update_premultiplied_bgra(
                        frame,
                        &mut window.bgra,
                        (rect.x as u32, rect.y as u32),
                        (rect.width as u32, rect.height as u32),
                    );
                }
                _ => {
                    rgba_to_premultiplied_bgra(&frame.pixels, &mut window.bgra);
                    window.bgra_size = frame.size();
                }
            }

            let origin = POINT {
                x: window.bounds.x,
                y: window.bounds.y,
            };
            let size = SIZE {
                cx: frame.width as i32,
                cy: frame.height as i32,
            };
            let source = POINT::default();
            let blend = Self::blend(window.alpha);
            unsafe {
                let screen = GetDC(HWND::default());
                let mem_dc = CreateCompatibleDC(screen);
                let result = create_dib(mem_dc, frame.width, frame.height, &window.bgra)
                    .and_then(|dib| {
                        let old = SelectObject(mem_dc, dib);
                        let updated = UpdateLayeredWindow(
                            window.hwnd,
                            screen,
                            Some(&origin as *const POINT),
                            Some(&size as *const SIZE),
                            mem_dc,
                            Some(&source as *const POINT),
                            COLORREF(0),
                            Some(&blend as *const BLENDFUNCTION),
                            ULW_ALPHA,
                        );
                        SelectObject(mem_dc, old);
                        let _ = DeleteObject(dib);
                        updated.with_context(|| format!("update layered {role:?} window"))
                    });
                let _ = DeleteDC(mem_dc);
                ReleaseDC(HWND::default(), screen);
                result
            }
        }
    }

    impl Drop for Win32Platform {
        fn drop(&mut self) {
            self.destroy_cursor();
            for (_, window) in self.windows.drain() {
                if let Ok(mut roles) = WINDOW_ROLES.lock() {
                    roles.remove(&handle_key(window.hwnd));
                }
                unsafe {
                    let _ = DestroyWindow(window.hwnd);
                }
            }
            if let Ok(mut sender) = POINTER_SENDER.lock() {
                *sender = None;
            }
        }
    }

}
