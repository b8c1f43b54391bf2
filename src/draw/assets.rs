use crate::draw::composite::RgbaBuffer;
use crate::draw::model::{Color, PenStyle, Segment};
use crate::draw::render::render_segment;
use anyhow::{Context, Result};
use image::imageops::FilterType;
use std::path::{Path, PathBuf};

pub const ASSET_DIR_NAME: &str = "assets";
const PLACEHOLDER_COLOR: Color = Color::rgb(128, 128, 128);

/// Directory that logical asset paths are resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRoot {
    root: PathBuf,
}

impl AssetRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// An explicit override wins; a packaged build ships `assets/` next to
    /// the executable; a development run uses the crate or working directory.
    pub fn resolve(override_dir: Option<&Path>) -> Self {
        if let Some(dir) = override_dir {
            return Self::new(dir);
        }
        let packaged = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(ASSET_DIR_NAME)))
            .filter(|dir| dir.is_dir());
        if let Some(dir) = packaged {
            return Self::new(dir);
        }
        let dev_base = std::env::var_os("CARGO_MANIFEST_DIR")
            .map(PathBuf::from)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(dev_base.join(ASSET_DIR_NAME))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, logical: &str) -> PathBuf {
        self.root.join(logical)
    }

    pub fn try_load_image(&self, logical: &str) -> Result<RgbaBuffer> {
        let path = self.path(logical);
        let image = image::open(&path)
            .with_context(|| format!("decode image {}", path.display()))?
            .to_rgba8();
        let (width, height) = image.dimensions();
        Ok(RgbaBuffer::from_pixels(width, height, image.into_raw()))
    }

    /// Loads and fits the image inside `max` keeping its aspect ratio.
    pub fn try_load_image_scaled(&self, logical: &str, max: (u32, u32)) -> Result<RgbaBuffer> {
        let path = self.path(logical);
        let image = image::open(&path)
            .with_context(|| format!("decode image {}", path.display()))?
            .resize(max.0, max.1, FilterType::Triangle)
            .to_rgba8();
        let (width, height) = image.dimensions();
        Ok(RgbaBuffer::from_pixels(width, height, image.into_raw()))
    }

    /// Like [`AssetRoot::try_load_image_scaled`] but never fails: a missing or
    /// undecodable file becomes a filled circle of the requested size.
    pub fn load_image(&self, logical: &str, size: (u32, u32)) -> RgbaBuffer {
        match self.try_load_image_scaled(logical, size) {
            Ok(image) => image,
            Err(err) => {
                tracing::warn!(asset = logical, error = %format!("{err:#}"), "using placeholder image");
                placeholder_image(size)
            }
        }
    }
}

pub fn placeholder_image(size: (u32, u32)) -> RgbaBuffer {
    let mut buffer = RgbaBuffer::new(size.0, size.1, Color::rgba(0, 0, 0, 0));
    let diameter = size.0.min(size.1) as f32;
    let dot = Segment::Dot {
        center: ((size.0 / 2) as i32, (size.1 / 2) as i32),
        radius: (diameter / 2.0 - 1.0).max(0.5),
    };
    let style = PenStyle {
        color: PLACEHOLDER_COLOR,
        width: 1,
    };
    render_segment(&mut buffer, style, &dot, 0);
    buffer
}

#[cfg(test)]
mod tests {
    use super::{placeholder_image, AssetRoot};
    use crate::draw::model::Color;
    use image::{Rgba, RgbaImage};

    #[test]
    fn override_directory_is_used_verbatim() {
        let dir = tempfile::tempdir().expect("temp dir");
        let root = AssetRoot::resolve(Some(dir.path()));
        assert_eq!(root.root(), dir.path());
        assert_eq!(root.path("undo.png"), dir.path().join("undo.png"));
    }

    #[test]
    fn missing_asset_yields_placeholder_of_requested_size() {
        let dir = tempfile::tempdir().expect("temp dir");
        let root = AssetRoot::new(dir.path());
        assert!(root.try_load_image("nope.png").is_err());

        let image = root.load_image("nope.png", (24, 24));
        assert_eq!(image.size(), (24, 24));
        assert_eq!(image.pixel(12, 12), Color::rgb(128, 128, 128));
        assert_eq!(image.pixel(0, 0).a, 0);
        assert_eq!(image, placeholder_image((24, 24)));
    }

    #[test]
    fn png_assets_are_decoded_and_fitted() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("arrow.png");
        RgbaImage::from_pixel(84, 42, Rgba([10, 20, 30, 255]))
            .save(&path)
            .expect("write png");

        let root = AssetRoot::new(dir.path());
        let original = root.try_load_image("arrow.png").expect("decode");
        assert_eq!(original.size(), (84, 42));

        let fitted = root.load_image("arrow.png", (42, 42));
        assert_eq!(fitted.size(), (42, 21));
        let px = fitted.pixel(5, 5);
        assert_eq!(px.a, 255);
        assert!((9..=11).contains(&px.r));
    }
}
