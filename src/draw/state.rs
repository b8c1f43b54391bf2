use crate::draw::model::{Color, PenStyle, TRANSPARENT_BACKGROUND};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Pen,
    Eraser,
}

/// Whether pointer input falls through the canvas. The active tool lives
/// inside the state so erasing with passthrough enabled cannot be expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassthroughState {
    Enabled { resume: Tool },
    Disabled { tool: Tool },
}

impl PassthroughState {
    pub fn is_enabled(self) -> bool {
        matches!(self, PassthroughState::Enabled { .. })
    }

    pub fn tool(self) -> Tool {
        match self {
            PassthroughState::Enabled { resume } => resume,
            PassthroughState::Disabled { tool } => tool,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorKind {
    System,
    Pen(Color),
    Eraser,
}

/// Side effects a transition asks the owner to carry out, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEffect {
    SetPassthrough(bool),
    SetCanvasVisible(bool),
    SetBackground(Color),
    SetCursor(CursorKind),
    ShowSelectors(bool),
    FocusControlPanel,
    SuspendBuilder,
    ActivateTool(Tool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceState {
    passthrough: PassthroughState,
    canvas_visible: bool,
    background: Color,
    pen: PenStyle,
}

impl SurfaceState {
    /// Starts in passthrough with a visible canvas, matching startup where
    /// the overlay must not capture clicks until the user opts in.
    pub fn new(pen: PenStyle) -> Self {
        Self {
            passthrough: PassthroughState::Enabled { resume: Tool::Pen },
            canvas_visible: true,
            background: TRANSPARENT_BACKGROUND,
            pen,
        }
    }

    pub fn passthrough(&self) -> PassthroughState {
        self.passthrough
    }

    pub fn passthrough_enabled(&self) -> bool {
        self.passthrough.is_enabled()
    }

    pub fn canvas_visible(&self) -> bool {
        self.canvas_visible
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn pen(&self) -> PenStyle {
        self.pen
    }

    pub fn tool(&self) -> Tool {
        self.passthrough.tool()
    }

    pub fn selectors_visible(&self) -> bool {
        !self.passthrough_enabled()
    }

    /// Pointer input reaches the stroke builder only in this state.
    pub fn accepts_canvas_input(&self) -> bool {
        self.canvas_visible && !self.passthrough_enabled()
    }

    pub fn cursor(&self) -> CursorKind {
        match self.passthrough {
            PassthroughState::Enabled { .. } => CursorKind::System,
            PassthroughState::Disabled { tool: Tool::Eraser } => CursorKind::Eraser,
            PassthroughState::Disabled { tool: Tool::Pen } => CursorKind::Pen(self.pen.color),
        }
    }

    pub fn enable_passthrough(&mut self) -> Vec<SurfaceEffect> {
        self.passthrough = PassthroughState::Enabled { resume: self.tool() };
        self.background = TRANSPARENT_BACKGROUND;
        tracing::info!("passthrough enabled");
        vec![
            SurfaceEffect::SuspendBuilder,
            SurfaceEffect::SetPassthrough(true),
            SurfaceEffect::SetCursor(CursorKind::System),
            SurfaceEffect::SetBackground(TRANSPARENT_BACKGROUND),
            SurfaceEffect::ShowSelectors(false),
        ]
    }

    pub fn disable_passthrough(&mut self) -> Vec<SurfaceEffect> {
        let tool = self.tool();
        self.passthrough = PassthroughState::Disabled { tool };
        tracing::info!(?tool, "passthrough disabled");
        vec![
            SurfaceEffect::SetPassthrough(false),
            SurfaceEffect::ActivateTool(tool),
            SurfaceEffect::SetCursor(self.cursor()),
            SurfaceEffect::FocusControlPanel,
            SurfaceEffect::ShowSelectors(true),
        ]
    }

    /// Leaving passthrough always brings the canvas back into view.
    pub fn toggle_passthrough(&mut self) -> Vec<SurfaceEffect> {
        if self.passthrough_enabled() {
            let mut effects = self.disable_passthrough();
            effects.extend(self.set_canvas_visible(true));
            effects
        } else {
            self.enable_passthrough()
        }
    }

    pub fn set_canvas_visible(&mut self, visible: bool) -> Vec<SurfaceEffect> {
        if self.canvas_visible == visible {
            return Vec::new();
        }
        self.canvas_visible = visible;
        vec![SurfaceEffect::SetCanvasVisible(visible)]
    }

    /// Footer eye button: hiding the canvas also lets clicks through, showing
    /// it resumes annotation.
    pub fn toggle_canvas_visibility(&mut self) -> Vec<SurfaceEffect> {
        let visible = !self.canvas_visible;
        let mut effects = self.set_canvas_visible(visible);
        if visible {
            effects.extend(self.disable_passthrough());
        } else {
            effects.extend(self.enable_passthrough());
        }
        effects
    }

    /// Picking any board, the transparent one included, shows the canvas
    /// and leaves passthrough.
    pub fn set_background(&mut self, color: Color) -> Vec<SurfaceEffect> {
        let color = if color.is_transparent_background() {
            TRANSPARENT_BACKGROUND
        } else {
            color
        };
        self.background = color;
        let mut effects = vec![SurfaceEffect::SetBackground(color)];
        effects.extend(self.set_canvas_visible(true));
        effects.extend(self.disable_passthrough());
        effects
    }

    pub fn select_color(&mut self, color: Color) -> Vec<SurfaceEffect> {
        self.pen.color = color;
        self.select_pen()
    }

    pub fn select_width(&mut self, width: u32) -> Vec<SurfaceEffect> {
        self.pen.width = width.max(1);
        self.select_pen()
    }

    pub fn enter_erase_mode(&mut self) -> Vec<SurfaceEffect> {
        self.set_tool(Tool::Eraser);
        if self.passthrough_enabled() {
            return self.disable_passthrough();
        }
        vec![
            SurfaceEffect::ActivateTool(Tool::Eraser),
            SurfaceEffect::SetCursor(CursorKind::Eraser),
        ]
    }

    fn select_pen(&mut self) -> Vec<SurfaceEffect> {
        self.set_tool(Tool::Pen);
        let mut effects = self.set_canvas_visible(true);
        effects.extend(self.disable_passthrough());
        effects
    }

    fn set_tool(&mut self, tool: Tool) {
        self.passthrough = match self.passthrough {
            PassthroughState::Enabled { .. } => PassthroughState::Enabled { resume: tool },
            PassthroughState::Disabled { .. } => PassthroughState::Disabled { tool },
        };
    }
}

#[cfg(test)]
mod tests {
    use super::{CursorKind, PassthroughState, SurfaceEffect, SurfaceState, Tool};
    use crate::draw::model::{Color, PenStyle, TRANSPARENT_BACKGROUND};

    fn drawing_state() -> SurfaceState {
        let mut state = SurfaceState::new(PenStyle::default());
        state.disable_passthrough();
        state
    }

    #[test]
    fn starts_in_passthrough_with_system_cursor() {
        let state = SurfaceState::new(PenStyle::default());
        assert!(state.passthrough_enabled());
        assert!(state.canvas_visible());
        assert!(!state.accepts_canvas_input());
        assert_eq!(state.cursor(), CursorKind::System);
    }

    #[test]
    fn enabling_passthrough_suspends_input_and_resets_background() {
        let mut state = drawing_state();
        state.set_background(Color::rgb(255, 255, 255));

        let effects = state.enable_passthrough();
        assert_eq!(effects[0], SurfaceEffect::SuspendBuilder);
        assert!(effects.contains(&SurfaceEffect::SetPassthrough(true)));
        assert!(effects.contains(&SurfaceEffect::SetCursor(CursorKind::System)));
        assert!(effects.contains(&SurfaceEffect::SetBackground(TRANSPARENT_BACKGROUND)));
        assert!(effects.contains(&SurfaceEffect::ShowSelectors(false)));
        assert_eq!(state.background(), TRANSPARENT_BACKGROUND);
        assert!(!state.selectors_visible());
    }

    #[test]
    fn disabling_passthrough_restores_pen_cursor_and_focus() {
        let mut state = SurfaceState::new(PenStyle::default());
        let effects = state.disable_passthrough();
        assert!(effects.contains(&SurfaceEffect::SetPassthrough(false)));
        assert!(effects.contains(&SurfaceEffect::SetCursor(CursorKind::Pen(
            PenStyle::default().color
        ))));
        assert!(effects.contains(&SurfaceEffect::FocusControlPanel));
        assert!(effects.contains(&SurfaceEffect::ShowSelectors(true)));
        assert!(state.accepts_canvas_input());
    }

    #[test]
    fn erase_mode_survives_a_passthrough_round_trip() {
        let mut state = drawing_state();
        state.enter_erase_mode();
        state.enable_passthrough();
        assert_eq!(
            state.passthrough(),
            PassthroughState::Enabled {
                resume: Tool::Eraser
            }
        );

        let effects = state.disable_passthrough();
        assert!(effects.contains(&SurfaceEffect::ActivateTool(Tool::Eraser)));
        assert_eq!(state.cursor(), CursorKind::Eraser);
    }

    #[test]
    fn entering_erase_mode_forces_passthrough_off() {
        let mut state = SurfaceState::new(PenStyle::default());
        let effects = state.enter_erase_mode();
        assert!(effects.contains(&SurfaceEffect::SetPassthrough(false)));
        assert_eq!(
            state.passthrough(),
            PassthroughState::Disabled { tool: Tool::Eraser }
        );
    }

    #[test]
    fn toggling_out_of_passthrough_forces_canvas_visible() {
        let mut state = drawing_state();
        state.toggle_canvas_visibility();
        assert!(!state.canvas_visible());
        assert!(state.passthrough_enabled());

        let effects = state.toggle_passthrough();
        assert!(effects.contains(&SurfaceEffect::SetCanvasVisible(true)));
        assert!(state.canvas_visible());
        assert!(!state.passthrough_enabled());
    }

    #[test]
    fn toggling_into_passthrough_keeps_canvas_visible() {
        let mut state = drawing_state();
        let effects = state.toggle_passthrough();
        assert!(state.passthrough_enabled());
        assert!(state.canvas_visible());
        assert!(!effects
            .iter()
            .any(|effect| matches!(effect, SurfaceEffect::SetCanvasVisible(_))));
    }

    #[test]
    fn colored_background_disables_passthrough_and_shows_canvas() {
        let mut state = SurfaceState::new(PenStyle::default());
        state.set_canvas_visible(false);

        let green = Color::rgb(81, 144, 106);
        let effects = state.set_background(green);
        assert_eq!(effects[0], SurfaceEffect::SetBackground(green));
        assert!(state.canvas_visible());
        assert!(!state.passthrough_enabled());
        assert_eq!(state.background(), green);
    }

    #[test]
    fn transparent_board_still_shows_canvas_and_leaves_passthrough() {
        let mut state = SurfaceState::new(PenStyle::default());
        state.disable_passthrough();
        state.toggle_canvas_visibility();
        assert!(!state.canvas_visible());
        assert!(state.passthrough_enabled());

        let effects = state.set_background(TRANSPARENT_BACKGROUND);
        assert!(state.canvas_visible());
        assert!(!state.passthrough_enabled());
        assert_eq!(state.background(), TRANSPARENT_BACKGROUND);
        assert!(effects.contains(&SurfaceEffect::SetCanvasVisible(true)));
        assert!(effects.contains(&SurfaceEffect::SetPassthrough(false)));
        assert_eq!(
            effects[0],
            SurfaceEffect::SetBackground(TRANSPARENT_BACKGROUND)
        );
    }

    #[test]
    fn color_pick_leaves_erase_mode_and_updates_cursor() {
        let mut state = drawing_state();
        state.enter_erase_mode();

        let cyan = Color::rgb(69, 194, 235);
        let effects = state.select_color(cyan);
        assert!(effects.contains(&SurfaceEffect::ActivateTool(Tool::Pen)));
        assert_eq!(state.cursor(), CursorKind::Pen(cyan));
        assert_eq!(state.pen().color, cyan);
    }

    #[test]
    fn width_pick_clamps_to_one_pixel() {
        let mut state = SurfaceState::new(PenStyle::default());
        state.select_width(0);
        assert_eq!(state.pen().width, 1);
        assert!(!state.passthrough_enabled());
    }
}
