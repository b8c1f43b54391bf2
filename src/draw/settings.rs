use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::draw::model::{Color, PenStyle, TRANSPARENT_BACKGROUND};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DrawSettings {
    #[serde(default)]
    pub debug_logging: bool,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    #[serde(default = "default_pen_colors")]
    pub pen_colors: Vec<Color>,
    #[serde(default = "default_pen_widths")]
    pub pen_widths: Vec<u32>,
    #[serde(default = "default_pen_color")]
    pub default_pen_color: Color,
    #[serde(default = "default_pen_width")]
    pub default_pen_width: u32,
    #[serde(default = "default_background_presets")]
    pub background_presets: Vec<Color>,
    #[serde(default = "default_erase_buffer_px")]
    pub erase_buffer_px: f32,
    #[serde(default = "default_hold_to_clear_ms")]
    pub hold_to_clear_ms: u64,
    #[serde(default = "default_active_panel_opacity")]
    pub active_panel_opacity: f32,
    #[serde(default)]
    pub asset_dir: Option<PathBuf>,
}

fn default_pen_colors() -> Vec<Color> {
    vec![
        Color::rgb(255, 144, 38),
        Color::rgb(151, 51, 151),
        Color::rgb(69, 194, 235),
        Color::rgb(255, 153, 204),
        Color::rgb(255, 88, 88),
        Color::rgb(76, 191, 102),
        Color::rgb(0, 0, 0),
        Color::rgb(1, 105, 103),
    ]
}

fn default_pen_widths() -> Vec<u32> {
    vec![5, 10, 15, 20]
}

fn default_pen_color() -> Color {
    PenStyle::default().color
}

fn default_pen_width() -> u32 {
    PenStyle::default().width
}

fn default_background_presets() -> Vec<Color> {
    vec![
        TRANSPARENT_BACKGROUND,
        Color::rgb(255, 255, 255),
        Color::rgb(0, 0, 0),
        Color::rgb(81, 144, 106),
    ]
}

fn default_erase_buffer_px() -> f32 {
    6.0
}

fn default_hold_to_clear_ms() -> u64 {
    1000
}

fn default_active_panel_opacity() -> f32 {
    0.60
}

impl Default for DrawSettings {
    fn default() -> Self {
        Self {
            debug_logging: false,
            log_file: None,
            pen_colors: default_pen_colors(),
            pen_widths: default_pen_widths(),
            default_pen_color: default_pen_color(),
            default_pen_width: default_pen_width(),
            background_presets: default_background_presets(),
            erase_buffer_px: default_erase_buffer_px(),
            hold_to_clear_ms: default_hold_to_clear_ms(),
            active_panel_opacity: default_active_panel_opacity(),
            asset_dir: None,
        }
    }
}

impl DrawSettings {
    pub fn pen_style(&self) -> PenStyle {
        PenStyle {
            color: self.default_pen_color,
            width: self.default_pen_width.max(1),
        }
    }

    pub fn hold_to_clear(&self) -> Duration {
        Duration::from_millis(self.hold_to_clear_ms)
    }

    /// Repairs values a hand-edited file may get wrong. Returns whether
    /// anything changed.
    pub fn sanitize(&mut self) -> bool {
        let before = self.clone();

        self.pen_colors.truncate(8);
        if self.pen_colors.is_empty() {
            self.pen_colors = default_pen_colors();
        }
        for color in &mut self.pen_colors {
            color.a = 255;
        }

        self.pen_widths.retain(|width| *width > 0);
        self.pen_widths.truncate(4);
        if self.pen_widths.is_empty() {
            self.pen_widths = default_pen_widths();
        }

        self.background_presets.truncate(4);
        if self.background_presets.is_empty() {
            self.background_presets = default_background_presets();
        }

        self.default_pen_color.a = 255;
        if !self.pen_colors.contains(&self.default_pen_color) {
            self.default_pen_color = self.pen_colors[0];
        }
        if !self.pen_widths.contains(&self.default_pen_width) {
            self.default_pen_width = self.pen_widths[0];
        }

        if !self.erase_buffer_px.is_finite() || self.erase_buffer_px < 0.0 {
            self.erase_buffer_px = default_erase_buffer_px();
        }
        if !self.active_panel_opacity.is_finite() {
            self.active_panel_opacity = default_active_panel_opacity();
        }
        self.active_panel_opacity = self.active_panel_opacity.clamp(0.0, 1.0);

        *self != before
    }
}

#[cfg(test)]
mod tests {
    use super::DrawSettings;
    use crate::draw::model::{Color, TRANSPARENT_BACKGROUND};

    #[test]
    fn serde_roundtrip_draw_settings() {
        let settings = DrawSettings::default();
        let json = serde_json::to_string(&settings).expect("serialize draw settings");
        let decoded: DrawSettings = serde_json::from_str(&json).expect("deserialize draw settings");
        assert_eq!(decoded, settings);
    }

    #[test]
    fn defaults_match_shipped_palette_and_timings() {
        let settings = DrawSettings::default();
        assert_eq!(settings.pen_colors.len(), 8);
        assert_eq!(settings.pen_colors[0], Color::rgb(255, 144, 38));
        assert_eq!(settings.pen_widths, vec![5, 10, 15, 20]);
        assert_eq!(settings.default_pen_color, Color::rgb(255, 88, 88));
        assert_eq!(settings.default_pen_width, 5);
        assert_eq!(settings.background_presets[0], TRANSPARENT_BACKGROUND);
        assert_eq!(settings.background_presets[3], Color::rgb(81, 144, 106));
        assert_eq!(settings.erase_buffer_px, 6.0);
        assert_eq!(settings.hold_to_clear_ms, 1000);
        assert_eq!(settings.active_panel_opacity, 0.60);
        assert!(!settings.debug_logging);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let decoded: DrawSettings = serde_json::from_value(serde_json::json!({
            "debug_logging": true,
            "pen_widths": [3, 6]
        }))
        .expect("deserialize partial settings");

        assert!(decoded.debug_logging);
        assert_eq!(decoded.pen_widths, vec![3, 6]);
        assert_eq!(decoded.pen_colors, DrawSettings::default().pen_colors);
        assert_eq!(decoded.hold_to_clear_ms, 1000);
    }

    #[test]
    fn sanitize_restores_empty_lists_and_clamps_ranges() {
        let mut settings = DrawSettings {
            pen_colors: Vec::new(),
            pen_widths: vec![0, 0],
            erase_buffer_px: -3.0,
            active_panel_opacity: 4.0,
            ..DrawSettings::default()
        };

        assert!(settings.sanitize());
        assert_eq!(settings.pen_colors, DrawSettings::default().pen_colors);
        assert_eq!(settings.pen_widths, vec![5, 10, 15, 20]);
        assert_eq!(settings.erase_buffer_px, 6.0);
        assert_eq!(settings.active_panel_opacity, 1.0);
        assert!(!DrawSettings::default().sanitize());
    }

    #[test]
    fn sanitize_keeps_default_pen_inside_palette() {
        let mut settings = DrawSettings {
            default_pen_color: Color::rgb(1, 2, 3),
            default_pen_width: 7,
            ..DrawSettings::default()
        };

        settings.sanitize();
        assert_eq!(settings.default_pen_color, Color::rgb(255, 144, 38));
        assert_eq!(settings.default_pen_width, 5);
    }
}
