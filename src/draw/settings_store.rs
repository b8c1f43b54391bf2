use crate::draw::settings::DrawSettings;
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

pub const DRAW_SETTINGS_FILE_NAME: &str = "draw_settings.json";

/// The JSON settings file. It normally lives beside the executable so a
/// portable copy carries its palette with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn beside(exe_path: &Path) -> Result<Self> {
        let dir = exe_path
            .parent()
            .ok_or_else(|| anyhow!("executable path has no parent: {}", exe_path.display()))?;
        Ok(Self::at(dir.join(DRAW_SETTINGS_FILE_NAME)))
    }

    pub fn beside_current_exe() -> Result<Self> {
        let exe_path = std::env::current_exe().context("resolve current executable")?;
        Self::beside(&exe_path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Reads and repairs the settings. A missing or blank file yields the
    /// defaults; unparsable JSON is an error.
    pub fn load(&self) -> Result<DrawSettings> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no draw settings file; using defaults");
            return Ok(DrawSettings::default());
        }

        let text = std::fs::read_to_string(&self.path)
            .with_context(|| format!("read {}", self.path.display()))?;
        if text.trim().is_empty() {
            return Ok(DrawSettings::default());
        }

        let mut settings: DrawSettings = serde_json::from_str(&text)
            .with_context(|| format!("parse {}", self.path.display()))?;
        if settings.sanitize() {
            tracing::warn!(path = %self.path.display(), "repaired out-of-range draw settings");
        }
        Ok(settings)
    }

    /// Writes the sanitized settings through a sibling temp file so a crash
    /// mid-write never leaves a truncated file behind.
    pub fn save(&self, settings: &DrawSettings) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create settings folder {}", dir.display()))?;
        }

        let mut clean = settings.clone();
        clean.sanitize();
        let json = serde_json::to_string_pretty(&clean).context("serialize draw settings")?;

        let staging = self.path.with_extension("json.tmp");
        std::fs::write(&staging, json)
            .with_context(|| format!("write {}", staging.display()))?;
        std::fs::rename(&staging, &self.path)
            .with_context(|| format!("replace {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::{SettingsFile, DRAW_SETTINGS_FILE_NAME};
    use crate::draw::model::Color;
    use crate::draw::settings::DrawSettings;
    use std::path::Path;

    fn file_in(dir: &tempfile::TempDir) -> SettingsFile {
        SettingsFile::at(dir.path().join(DRAW_SETTINGS_FILE_NAME))
    }

    #[test]
    fn lives_next_to_the_executable() {
        let file = SettingsFile::beside(Path::new("/opt/eddraw/eddraw.exe")).expect("path");
        assert_eq!(file.path(), Path::new("/opt/eddraw").join(DRAW_SETTINGS_FILE_NAME));
    }

    #[test]
    fn bare_root_has_no_parent() {
        assert!(SettingsFile::beside(Path::new("/")).is_err());
    }

    #[test]
    fn missing_or_blank_file_loads_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let file = file_in(&dir);
        assert!(!file.exists());
        assert_eq!(file.load().expect("load"), DrawSettings::default());

        std::fs::write(file.path(), "  \n").expect("write");
        assert_eq!(file.load().expect("load"), DrawSettings::default());
    }

    #[test]
    fn save_replaces_without_leaving_staging_files() {
        let dir = tempfile::tempdir().expect("temp dir");
        let file = file_in(&dir);
        let settings = DrawSettings {
            hold_to_clear_ms: 250,
            default_pen_color: Color::rgb(0, 0, 0),
            ..DrawSettings::default()
        };

        file.save(&DrawSettings::default()).expect("first save");
        file.save(&settings).expect("second save");

        assert_eq!(file.load().expect("load"), settings);
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .expect("list")
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from(DRAW_SETTINGS_FILE_NAME)]);
    }

    #[test]
    fn save_writes_the_repaired_values() {
        let dir = tempfile::tempdir().expect("temp dir");
        let file = file_in(&dir);
        let settings = DrawSettings {
            pen_widths: Vec::new(),
            active_panel_opacity: 3.0,
            ..DrawSettings::default()
        };

        file.save(&settings).expect("save");
        let loaded = file.load().expect("load");
        assert_eq!(loaded.pen_widths, vec![5, 10, 15, 20]);
        assert_eq!(loaded.active_panel_opacity, 1.0);
    }
}
