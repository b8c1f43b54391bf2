use anyhow::Context;
use eddraw::draw::settings_store::SettingsFile;
use eddraw::draw::{overlay, GeometryRegistry};
use eddraw::logging;

fn main() -> anyhow::Result<()> {
    let settings_file = SettingsFile::beside_current_exe()?;
    let first_run = !settings_file.exists();
    let settings = settings_file.load().context("load draw settings")?;
    logging::init(settings.debug_logging, settings.log_file.clone());

    if first_run {
        match settings_file.save(&settings) {
            Ok(()) => tracing::info!(path = %settings_file.path().display(), "wrote default draw settings"),
            Err(err) => tracing::warn!(error = %format!("{err:#}"), "could not write draw settings"),
        }
    }

    let registry = match GeometryRegistry::enumerate() {
        Ok(registry) => registry,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "cannot establish a drawing surface");
            return Err(err);
        }
    };
    tracing::info!(
        monitors = registry.geometries_for_all_monitors().len(),
        "starting eddraw"
    );

    overlay::run(&settings, registry)
}
