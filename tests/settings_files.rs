use std::fs;

use eddraw::draw::model::Color;
use eddraw::draw::settings::DrawSettings;
use eddraw::draw::settings_store::{SettingsFile, DRAW_SETTINGS_FILE_NAME};
use tempfile::tempdir;

#[test]
fn partial_file_fills_in_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(DRAW_SETTINGS_FILE_NAME);
    fs::write(&path, r#"{ "debug_logging": true, "pen_widths": [3, 6] }"#).unwrap();

    let settings = SettingsFile::at(&path).load().unwrap();
    assert!(settings.debug_logging);
    assert_eq!(settings.pen_widths, vec![3, 6]);
    assert_eq!(settings.default_pen_width, 3);
    assert_eq!(settings.pen_colors, DrawSettings::default().pen_colors);
}

#[test]
fn saved_settings_load_back_unchanged() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join(DRAW_SETTINGS_FILE_NAME);
    let settings = DrawSettings {
        pen_colors: vec![Color::rgb(1, 2, 3), Color::rgb(4, 5, 6)],
        default_pen_color: Color::rgb(4, 5, 6),
        hold_to_clear_ms: 750,
        log_file: Some(dir.path().join("eddraw.log")),
        ..DrawSettings::default()
    };

    SettingsFile::at(&path).save(&settings).unwrap();
    assert_eq!(SettingsFile::at(&path).load().unwrap(), settings);
}

#[test]
fn oversized_palettes_are_trimmed_on_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(DRAW_SETTINGS_FILE_NAME);
    let colors: Vec<String> = (0..12)
        .map(|i| format!(r#"{{ "r": {i}, "g": 0, "b": 0, "a": 10 }}"#))
        .collect();
    fs::write(
        &path,
        format!(r#"{{ "pen_colors": [{}], "pen_widths": [0, 0] }}"#, colors.join(",")),
    )
    .unwrap();

    let settings = SettingsFile::at(&path).load().unwrap();
    assert_eq!(settings.pen_colors.len(), 8);
    assert!(settings.pen_colors.iter().all(|c| c.a == 255));
    assert_eq!(settings.pen_widths, DrawSettings::default().pen_widths);
    assert_eq!(settings.default_pen_color, Color::rgb(0, 0, 0));
}

#[test]
fn malformed_file_reports_its_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(DRAW_SETTINGS_FILE_NAME);
    fs::write(&path, "{ not json").unwrap();

    let err = SettingsFile::at(&path).load().unwrap_err();
    assert!(format!("{err:#}").contains(DRAW_SETTINGS_FILE_NAME));
}
