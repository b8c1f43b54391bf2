use crate::draw::arbiter::{TAB_CONTAINER_HEIGHT, TAB_CONTAINER_WIDTH, TAB_HEIGHT, TAB_WIDTH};
use crate::draw::assets::AssetRoot;
use crate::draw::composite::RgbaBuffer;
use crate::draw::model::{Color, PenStyle, Segment, TRANSPARENT_BACKGROUND};
use crate::draw::monitor::MonitorRect;
use crate::draw::render::{render_pie, render_ring, render_segment};
use crate::draw::settings::DrawSettings;

pub const PANEL_CELL: i32 = 44;
pub const PANEL_COLUMNS: i32 = 2;
pub const PANEL_PADDING: i32 = 8;
pub const PANEL_HEADER_HEIGHT: i32 = 34;
pub const PANEL_FOOTER_HEIGHT: i32 = 36;
pub const PANEL_SECTION_GAP: i32 = 4;
pub const PANEL_WIDTH: i32 = PANEL_PADDING * 2 + PANEL_CELL * PANEL_COLUMNS;
const CLOSE_BUTTON_SIZE: i32 = 28;
const ICON_SIZE: u32 = 32;
const CLOSE_ICON_SIZE: u32 = 20;
const SWATCH_RADIUS: f32 = 16.0;
const SELECTOR_RING_WIDTH: u32 = 3;

const BODY_COLOR: Color = Color::rgb(45, 45, 48);
const HEADER_COLOR: Color = Color::rgb(0, 122, 204);
const CLOSE_COLOR: Color = Color::rgb(255, 88, 88);
const CANVAS_SHOWN_FOOTER: Color = Color::rgb(230, 76, 60);
const CANVAS_HIDDEN_FOOTER: Color = Color::rgb(34, 180, 115);
const WIDTH_INDICATOR_COLOR: Color = Color::rgb(220, 220, 220);
const SELECTOR_COLOR: Color = Color::rgb(255, 255, 255);
const HOLD_PIE_COLOR: Color = Color::rgba(255, 88, 88, 200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    TogglePassthrough,
    Undo,
    Erase,
    Clear,
    SelectColor(Color),
    SelectWidth(u32),
    SetBackground(Color),
    ToggleCanvas,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl PanelRect {
    pub fn contains(self, point: (i32, i32)) -> bool {
        point.0 >= self.x
            && point.0 < self.x + self.w
            && point.1 >= self.y
            && point.1 < self.y + self.h
    }

    fn center(self) -> (i32, i32) {
        (self.x + self.w / 2, self.y + self.h / 2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelHitTarget {
    Header,
    Body,
    Close,
    TogglePassthrough,
    Undo,
    Eraser,
    Clear,
    Color(usize),
    Width(usize),
    Background(usize),
    Canvas,
}

/// Palette entries the panel offers, taken from the settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelPalette {
    pub colors: Vec<Color>,
    pub widths: Vec<u32>,
    pub backgrounds: Vec<Color>,
}

impl PanelPalette {
    pub fn from_settings(settings: &DrawSettings) -> Self {
        Self {
            colors: settings.pen_colors.clone(),
            widths: settings.pen_widths.clone(),
            backgrounds: settings.background_presets.clone(),
        }
    }
}

const TOOL_TARGETS: [PanelHitTarget; 4] = [
    PanelHitTarget::TogglePassthrough,
    PanelHitTarget::Undo,
    PanelHitTarget::Eraser,
    PanelHitTarget::Clear,
];

/// Panel-local rectangles of every control. The panel is its own window, so
/// the layout does not move when the panel is dragged.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelLayout {
    pub panel: PanelRect,
    pub header: PanelRect,
    pub close: PanelRect,
    pub tool_rects: Vec<(PanelHitTarget, PanelRect)>,
    pub color_rects: Vec<PanelRect>,
    pub width_rects: Vec<PanelRect>,
    pub background_rects: Vec<PanelRect>,
    pub footer: PanelRect,
}

impl PanelLayout {
    pub fn for_palette(palette: &PanelPalette) -> Self {
        let mut y = PANEL_HEADER_HEIGHT + PANEL_PADDING;
        let tool_cells = grid(TOOL_TARGETS.len(), &mut y);
        let color_rects = grid(palette.colors.len(), &mut y);
        let width_rects = grid(palette.widths.len(), &mut y);
        let background_rects = grid(palette.backgrounds.len(), &mut y);
        let footer_y = y - PANEL_SECTION_GAP + PANEL_PADDING;

        Self {
            panel: PanelRect {
                x: 0,
                y: 0,
                w: PANEL_WIDTH,
                h: footer_y + PANEL_FOOTER_HEIGHT,
            },
            header: PanelRect {
                x: 0,
                y: 0,
                w: PANEL_WIDTH,
                h: PANEL_HEADER_HEIGHT,
            },
            close: PanelRect {
                x: PANEL_WIDTH - CLOSE_BUTTON_SIZE - 3,
                y: (PANEL_HEADER_HEIGHT - CLOSE_BUTTON_SIZE) / 2,
                w: CLOSE_BUTTON_SIZE,
                h: CLOSE_BUTTON_SIZE,
            },
            tool_rects: TOOL_TARGETS.into_iter().zip(tool_cells).collect(),
            color_rects,
            width_rects,
            background_rects,
            footer: PanelRect {
                x: 0,
                y: footer_y,
                w: PANEL_WIDTH,
                h: PANEL_FOOTER_HEIGHT,
            },
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.panel.w as u32, self.panel.h as u32)
    }

    pub fn hit_test(&self, point: (i32, i32)) -> Option<PanelHitTarget> {
        if !self.panel.contains(point) {
            return None;
        }
        if self.close.contains(point) {
            return Some(PanelHitTarget::Close);
        }
        if self.header.contains(point) {
            return Some(PanelHitTarget::Header);
        }
        if self.footer.contains(point) {
            return Some(PanelHitTarget::Canvas);
        }
        for (target, rect) in &self.tool_rects {
            if rect.contains(point) {
                return Some(*target);
            }
        }
        if let Some(idx) = self.color_rects.iter().position(|r| r.contains(point)) {
            return Some(PanelHitTarget::Color(idx));
        }
        if let Some(idx) = self.width_rects.iter().position(|r| r.contains(point)) {
            return Some(PanelHitTarget::Width(idx));
        }
        if let Some(idx) = self.background_rects.iter().position(|r| r.contains(point)) {
            return Some(PanelHitTarget::Background(idx));
        }
        Some(PanelHitTarget::Body)
    }
}

fn grid(count: usize, y: &mut i32) -> Vec<PanelRect> {
    let rects: Vec<PanelRect> = (0..count as i32)
        .map(|idx| PanelRect {
            x: PANEL_PADDING + (idx % PANEL_COLUMNS) * PANEL_CELL,
            y: *y + (idx / PANEL_COLUMNS) * PANEL_CELL,
            w: PANEL_CELL,
            h: PANEL_CELL,
        })
        .collect();
    let rows = (count as i32 + PANEL_COLUMNS - 1) / PANEL_COLUMNS;
    *y += rows * PANEL_CELL + PANEL_SECTION_GAP;
    rects
}

pub fn map_hit_to_action(target: PanelHitTarget, palette: &PanelPalette) -> Option<PanelAction> {
    match target {
        PanelHitTarget::Header | PanelHitTarget::Body => None,
        PanelHitTarget::Close => Some(PanelAction::Close),
        PanelHitTarget::TogglePassthrough => Some(PanelAction::TogglePassthrough),
        PanelHitTarget::Undo => Some(PanelAction::Undo),
        PanelHitTarget::Eraser => Some(PanelAction::Erase),
        PanelHitTarget::Clear => Some(PanelAction::Clear),
        PanelHitTarget::Color(idx) => palette
            .colors
            .get(idx)
            .copied()
            .map(PanelAction::SelectColor),
        PanelHitTarget::Width(idx) => palette
            .widths
            .get(idx)
            .copied()
            .map(PanelAction::SelectWidth),
        PanelHitTarget::Background(idx) => palette
            .backgrounds
            .get(idx)
            .copied()
            .map(PanelAction::SetBackground),
        PanelHitTarget::Canvas => Some(PanelAction::ToggleCanvas),
    }
}

/// Result of feeding a pointer event to the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelEvent {
    None,
    Dragged { origin: (i32, i32) },
    HoldStarted,
    HoldCancelled,
    Action(PanelAction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PanelGesture {
    Drag { anchor: (i32, i32) },
    Button(PanelHitTarget),
    Hold,
}

/// Floating control panel. Buttons fire on release over the pressed button;
/// the clear button instead runs a hold-to-confirm owned by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlPanel {
    palette: PanelPalette,
    layout: PanelLayout,
    origin: (i32, i32),
    visible: bool,
    gesture: Option<PanelGesture>,
}

impl ControlPanel {
    pub fn new(palette: PanelPalette, origin: (i32, i32)) -> Self {
        let layout = PanelLayout::for_palette(&palette);
        Self {
            palette,
            layout,
            origin,
            visible: true,
            gesture: None,
        }
    }

    pub fn palette(&self) -> &PanelPalette {
        &self.palette
    }

    pub fn layout(&self) -> &PanelLayout {
        &self.layout
    }

    pub fn origin(&self) -> (i32, i32) {
        self.origin
    }

    pub fn bounds(&self) -> MonitorRect {
        MonitorRect::new(
            self.origin.0,
            self.origin.1,
            self.layout.panel.w,
            self.layout.panel.h,
        )
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        if !visible {
            self.gesture = None;
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.gesture, Some(PanelGesture::Drag { .. }))
    }

    fn local(&self, global: (i32, i32)) -> (i32, i32) {
        (global.0 - self.origin.0, global.1 - self.origin.1)
    }

    pub fn press(&mut self, global: (i32, i32)) -> PanelEvent {
        let local = self.local(global);
        let Some(target) = self.layout.hit_test(local) else {
            return PanelEvent::None;
        };
        match target {
            PanelHitTarget::Header | PanelHitTarget::Body => {
                self.gesture = Some(PanelGesture::Drag { anchor: local });
                PanelEvent::None
            }
            PanelHitTarget::Clear => {
                self.gesture = Some(PanelGesture::Hold);
                PanelEvent::HoldStarted
            }
            other => {
                self.gesture = Some(PanelGesture::Button(other));
                PanelEvent::None
            }
        }
    }

    pub fn motion(&mut self, global: (i32, i32)) -> PanelEvent {
        match self.gesture {
            Some(PanelGesture::Drag { anchor }) => {
                self.origin = (global.0 - anchor.0, global.1 - anchor.1);
                PanelEvent::Dragged {
                    origin: self.origin,
                }
            }
            Some(PanelGesture::Hold) => {
                if self.layout.hit_test(self.local(global)) == Some(PanelHitTarget::Clear) {
                    PanelEvent::None
                } else {
                    self.gesture = None;
                    PanelEvent::HoldCancelled
                }
            }
            Some(PanelGesture::Button(_)) | None => PanelEvent::None,
        }
    }

    pub fn release(&mut self, global: (i32, i32)) -> PanelEvent {
        match self.gesture.take() {
            Some(PanelGesture::Button(pressed)) => {
                if self.layout.hit_test(self.local(global)) != Some(pressed) {
                    return PanelEvent::None;
                }
                map_hit_to_action(pressed, &self.palette)
                    .map(PanelEvent::Action)
                    .unwrap_or(PanelEvent::None)
            }
            Some(PanelGesture::Hold) => PanelEvent::HoldCancelled,
            Some(PanelGesture::Drag { .. }) | None => PanelEvent::None,
        }
    }

    pub fn leave(&mut self) -> PanelEvent {
        match self.gesture {
            Some(PanelGesture::Hold) => {
                self.gesture = None;
                PanelEvent::HoldCancelled
            }
            _ => PanelEvent::None,
        }
    }
}

/// What the panel reflects from the coordinator when it is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelView {
    pub passthrough: bool,
    pub canvas_visible: bool,
    pub selectors_visible: bool,
    pub pen: PenStyle,
    pub hold_progress: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelIcons {
    pub draw_mode: RgbaBuffer,
    pub control_mode: RgbaBuffer,
    pub undo: RgbaBuffer,
    pub eraser: RgbaBuffer,
    pub clear: RgbaBuffer,
    pub eye_on: RgbaBuffer,
    pub eye_off: RgbaBuffer,
    pub close: RgbaBuffer,
    pub boards: [(Color, RgbaBuffer); 4],
}

impl PanelIcons {
    pub fn load(assets: &AssetRoot) -> Self {
        let icon = |name: &str| assets.load_image(name, (ICON_SIZE, ICON_SIZE));
        Self {
            draw_mode: icon("comp_draw.png"),
            control_mode: icon("comp_control.png"),
            undo: icon("undo.png"),
            eraser: icon("eraser.png"),
            clear: icon("trash_can.png"),
            eye_on: icon("eye_on.png"),
            eye_off: icon("eye_off.png"),
            close: assets.load_image("btn_x.png", (CLOSE_ICON_SIZE, CLOSE_ICON_SIZE)),
            boards: [
                (TRANSPARENT_BACKGROUND, icon("trans_board.png")),
                (Color::rgb(255, 255, 255), icon("white_board.png")),
                (Color::rgb(0, 0, 0), icon("black_board.png")),
                (Color::rgb(81, 144, 106), icon("green_board.png")),
            ],
        }
    }

    fn board(&self, color: Color) -> Option<&RgbaBuffer> {
        self.boards
            .iter()
            .find(|(preset, _)| *preset == color)
            .map(|(_, icon)| icon)
    }
}

pub fn render_panel(
    layout: &PanelLayout,
    palette: &PanelPalette,
    view: &PanelView,
    icons: &PanelIcons,
) -> RgbaBuffer {
    let (width, height) = layout.size();
    let mut frame = RgbaBuffer::new(width, height, BODY_COLOR);
    fill(&mut frame, layout.header, HEADER_COLOR);
    fill(&mut frame, layout.close, CLOSE_COLOR);
    draw_centered(&mut frame, &icons.close, layout.close);

    for (target, rect) in &layout.tool_rects {
        let icon = match target {
            PanelHitTarget::TogglePassthrough if view.passthrough => &icons.draw_mode,
            PanelHitTarget::TogglePassthrough => &icons.control_mode,
            PanelHitTarget::Undo => &icons.undo,
            PanelHitTarget::Eraser => &icons.eraser,
            _ => &icons.clear,
        };
        draw_centered(&mut frame, icon, *rect);
        if *target == PanelHitTarget::Clear {
            if let Some(progress) = view.hold_progress {
                render_pie(
                    &mut frame,
                    HOLD_PIE_COLOR,
                    rect.center(),
                    SWATCH_RADIUS + 2.0,
                    progress,
                );
            }
        }
    }

    let color_selected = palette
        .colors
        .iter()
        .position(|color| color.same_rgb(view.pen.color));
    for (idx, (rect, color)) in layout.color_rects.iter().zip(&palette.colors).enumerate() {
        fill_disc(&mut frame, *color, rect.center(), SWATCH_RADIUS);
        if view.selectors_visible && color_selected == Some(idx) {
            selector_ring(&mut frame, rect.center(), SWATCH_RADIUS + 3.0);
        }
    }

    let width_selected = palette.widths.iter().position(|w| *w == view.pen.width);
    for (idx, (rect, pen_width)) in layout.width_rects.iter().zip(&palette.widths).enumerate() {
        let diameter = (*pen_width + 10) as f32;
        fill_disc(&mut frame, WIDTH_INDICATOR_COLOR, rect.center(), diameter / 2.0);
        if view.selectors_visible && width_selected == Some(idx) {
            selector_ring(&mut frame, rect.center(), diameter / 2.0 + 3.0);
        }
    }

    for (rect, color) in layout.background_rects.iter().zip(&palette.backgrounds) {
        match icons.board(*color) {
            Some(icon) => draw_centered(&mut frame, icon, *rect),
            None => fill_disc(&mut frame, *color, rect.center(), SWATCH_RADIUS),
        }
    }

    let (footer_color, eye) = if view.canvas_visible {
        (CANVAS_SHOWN_FOOTER, &icons.eye_off)
    } else {
        (CANVAS_HIDDEN_FOOTER, &icons.eye_on)
    };
    fill(&mut frame, layout.footer, footer_color);
    draw_centered(&mut frame, eye, layout.footer);
    frame
}

/// Dock tab art: a blue tab at the container's left edge with a chevron that
/// points the way the panel will move when the tab is clicked.
pub fn render_dock_tab(panel_visible: bool) -> RgbaBuffer {
    let mut frame = RgbaBuffer::new(
        TAB_CONTAINER_WIDTH as u32,
        TAB_CONTAINER_HEIGHT as u32,
        Color::rgba(0, 0, 0, 0),
    );
    let tab = PanelRect {
        x: 0,
        y: (TAB_CONTAINER_HEIGHT - TAB_HEIGHT) / 2,
        w: TAB_WIDTH,
        h: TAB_HEIGHT,
    };
    fill(&mut frame, tab, HEADER_COLOR);

    let (cx, cy) = tab.center();
    let tip = if panel_visible { 6 } else { -6 };
    let chevron = Segment::Polyline {
        points: vec![(cx - tip, cy - 10), (cx + tip, cy), (cx - tip, cy + 10)],
    };
    let style = PenStyle {
        color: SELECTOR_COLOR,
        width: 3,
    };
    render_segment(&mut frame, style, &chevron, 0);
    frame
}

fn fill(frame: &mut RgbaBuffer, rect: PanelRect, color: Color) {
    frame.fill_rect(rect.x, rect.y, rect.w, rect.h, color);
}

fn draw_centered(frame: &mut RgbaBuffer, icon: &RgbaBuffer, rect: PanelRect) {
    let x = rect.x + (rect.w - icon.width as i32) / 2;
    let y = rect.y + (rect.h - icon.height as i32) / 2;
    frame.draw_image(icon, (x, y));
}

fn fill_disc(frame: &mut RgbaBuffer, color: Color, center: (i32, i32), radius: f32) {
    let style = PenStyle { color, width: 1 };
    render_segment(frame, style, &Segment::Dot { center, radius }, 0);
}

fn selector_ring(frame: &mut RgbaBuffer, center: (i32, i32), radius: f32) {
    let style = PenStyle {
        color: SELECTOR_COLOR,
        width: SELECTOR_RING_WIDTH,
    };
    render_ring(frame, style, center, radius);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn palette() -> PanelPalette {
        PanelPalette::from_settings(&DrawSettings::default())
    }

    fn icons() -> (tempfile::TempDir, PanelIcons) {
        let dir = tempfile::tempdir().expect("temp dir");
        let icons = PanelIcons::load(&AssetRoot::new(dir.path()));
        (dir, icons)
    }

    fn view() -> PanelView {
        PanelView {
            passthrough: false,
            canvas_visible: true,
            selectors_visible: true,
            pen: PenStyle::default(),
            hold_progress: None,
        }
    }

    #[test]
    fn layout_stacks_sections_in_two_columns() {
        let layout = PanelLayout::for_palette(&palette());
        assert_eq!(layout.size(), (104, 538));
        assert_eq!(layout.close, PanelRect { x: 73, y: 3, w: 28, h: 28 });
        assert_eq!(layout.color_rects[0], PanelRect { x: 8, y: 134, w: 44, h: 44 });
        assert_eq!(layout.width_rects[1].x, 52);
        assert_eq!(layout.background_rects[0].y, 406);
        assert_eq!(layout.footer.y, 502);
    }

    #[test]
    fn hit_targets_map_to_actions() {
        let palette = palette();
        let layout = PanelLayout::for_palette(&palette);
        let action = |point| {
            layout
                .hit_test(point)
                .and_then(|target| map_hit_to_action(target, &palette))
        };

        assert_eq!(action((20, 60)), Some(PanelAction::TogglePassthrough));
        assert_eq!(action((70, 60)), Some(PanelAction::Undo));
        assert_eq!(action((70, 100)), Some(PanelAction::Clear));
        assert_eq!(
            action((20, 150)),
            Some(PanelAction::SelectColor(Color::rgb(255, 144, 38)))
        );
        assert_eq!(action((70, 330)), Some(PanelAction::SelectWidth(10)));
        assert_eq!(
            action((20, 420)),
            Some(PanelAction::SetBackground(TRANSPARENT_BACKGROUND))
        );
        assert_eq!(action((50, 520)), Some(PanelAction::ToggleCanvas));
        assert_eq!(action((80, 10)), Some(PanelAction::Close));
        assert_eq!(action((20, 10)), None);
        assert_eq!(layout.hit_test((200, 10)), None);
    }

    #[test]
    fn button_fires_only_when_released_over_itself() {
        let mut panel = ControlPanel::new(palette(), (100, 100));
        assert_eq!(panel.press((170, 160)), PanelEvent::None);
        assert_eq!(
            panel.release((170, 160)),
            PanelEvent::Action(PanelAction::Undo)
        );

        panel.press((170, 160));
        assert_eq!(panel.release((120, 160)), PanelEvent::None);
    }

    #[test]
    fn header_drag_moves_the_panel() {
        let mut panel = ControlPanel::new(palette(), (50, 50));
        panel.press((60, 60));
        assert!(panel.is_dragging());
        assert_eq!(
            panel.motion((300, 210)),
            PanelEvent::Dragged { origin: (290, 200) }
        );
        assert_eq!(panel.release((300, 210)), PanelEvent::None);
        assert_eq!(panel.origin(), (290, 200));
        assert_eq!(panel.bounds().x, 290);
    }

    #[test]
    fn clear_button_starts_and_cancels_a_hold() {
        let mut panel = ControlPanel::new(palette(), (0, 0));
        assert_eq!(panel.press((70, 100)), PanelEvent::HoldStarted);
        assert_eq!(panel.motion((72, 102)), PanelEvent::None);
        assert_eq!(panel.motion((20, 150)), PanelEvent::HoldCancelled);
        assert_eq!(panel.release((20, 150)), PanelEvent::None);

        panel.press((70, 100));
        assert_eq!(panel.leave(), PanelEvent::HoldCancelled);
    }

    #[test]
    fn footer_color_tracks_canvas_visibility() {
        let (_dir, icons) = icons();
        let palette = palette();
        let layout = PanelLayout::for_palette(&palette);

        let shown = render_panel(&layout, &palette, &view(), &icons);
        assert_eq!(shown.pixel(2, 505), Color::rgb(230, 76, 60));
        assert_eq!(shown.pixel(2, 2), Color::rgb(0, 122, 204));

        let hidden_view = PanelView {
            canvas_visible: false,
            ..view()
        };
        let hidden = render_panel(&layout, &palette, &hidden_view, &icons);
        assert_eq!(hidden.pixel(2, 505), Color::rgb(34, 180, 115));
    }

    #[test]
    fn selector_rings_follow_the_pen_and_hide_in_passthrough() {
        let (_dir, icons) = icons();
        let palette = palette();
        let layout = PanelLayout::for_palette(&palette);
        // Default pen (255,88,88) width 5: color index 4, width index 0.
        let color_ring = (layout.color_rects[4].center().0 + 19, layout.color_rects[4].center().1);
        let width_ring = (layout.width_rects[0].center().0 + 10, layout.width_rects[0].center().1);

        let frame = render_panel(&layout, &palette, &view(), &icons);
        assert_eq!(frame.pixel(color_ring.0 as u32, color_ring.1 as u32), SELECTOR_COLOR);
        assert_eq!(frame.pixel(width_ring.0 as u32, width_ring.1 as u32), SELECTOR_COLOR);

        let hidden = PanelView {
            selectors_visible: false,
            ..view()
        };
        let frame = render_panel(&layout, &palette, &hidden, &icons);
        assert_eq!(frame.pixel(color_ring.0 as u32, color_ring.1 as u32), BODY_COLOR);
    }

    #[test]
    fn dock_tab_is_opaque_only_over_the_tab() {
        let frame = render_dock_tab(true);
        assert_eq!(frame.size(), (80, 160));
        assert_eq!(frame.pixel(2, 40), HEADER_COLOR);
        assert_eq!(frame.pixel(60, 80).a, 0);
        assert_eq!(frame.pixel(2, 10).a, 0);
        assert_ne!(render_dock_tab(false), frame);
    }

    #[test]
    fn hold_progress_draws_a_pie_over_the_clear_button() {
        let (_dir, icons) = icons();
        let palette = palette();
        let layout = PanelLayout::for_palette(&palette);
        let clear = layout.tool_rects[3].1.center();

        let idle = render_panel(&layout, &palette, &view(), &icons);
        let filling = PanelView {
            hold_progress: Some(0.5),
            ..view()
        };
        let frame = render_panel(&layout, &palette, &filling, &icons);
        let right_half = ((clear.0 + 6) as u32, (clear.1 - 6) as u32);
        let left_half = ((clear.0 - 6) as u32, (clear.1 - 6) as u32);
        assert_ne!(frame.pixel(right_half.0, right_half.1), idle.pixel(right_half.0, right_half.1));
        assert_eq!(frame.pixel(left_half.0, left_half.1), idle.pixel(left_half.0, left_half.1));
    }
}
