pub mod arbiter;
pub mod assets;
pub mod composite;
pub mod cursor;
pub mod hold;
pub mod input;
pub mod model;
pub mod monitor;
pub mod overlay;
pub mod panel;
pub mod platform;
pub mod render;
pub mod service;
pub mod settings;
pub mod settings_store;
pub mod state;
pub mod store;

pub use model::{Color, PenStyle, Segment, Stroke};
pub use monitor::{GeometryRegistry, MonitorRect};
pub use platform::{PointerEvent, PointerKind, WindowPlatform, WindowRole};
pub use render::RasterSurface;
pub use service::DrawCoordinator;
pub use settings::DrawSettings;
pub use store::StrokeStore;
