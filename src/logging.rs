use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Keeps the background writer alive for the lifetime of the process.
static FILE_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Initialise logging. The default level is `info`; `debug` can be enabled
/// via the settings file, in which case `RUST_LOG` may override it.
/// When `log_file` is set, output goes to that file instead of stdout.
/// Calling this more than once keeps the first subscriber.
pub fn init(debug: bool, log_file: Option<PathBuf>) {
    if tracing::dispatcher::has_been_set() {
        tracing::debug!("logging already initialised; keeping the first subscriber");
        return;
    }

    // Without debug logging the level is forced to `info` so a stray
    // `RUST_LOG` in the user's environment cannot turn on verbose output.
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("info")
    };

    let Some((dir, file_name)) = log_file.as_deref().and_then(split_log_path) else {
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
        return;
    };

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .is_ok();
    if installed {
        let _ = FILE_GUARD.set(guard);
    }
}

fn split_log_path(path: &Path) -> Option<(PathBuf, PathBuf)> {
    let file_name = path.file_name()?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Some((dir, PathBuf::from(file_name)))
}
