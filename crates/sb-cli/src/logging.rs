use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use sb_core::BuildError;
use tracing_subscriber::EnvFilter;

use crate::map_cli_log_file;

/// Installs the global fmt subscriber. `RUST_LOG` overrides the default
/// `info` level; with a log file, events are appended there instead of
/// stderr.
pub(crate) fn init_logging(log_file: Option<&Path>) -> Result<(), BuildError> {
    let builder = tracing_subscriber::fmt().with_env_filter(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    );
    // Fails only when a subscriber is already installed in this process.
    let _ = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(map_cli_log_file)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };
    Ok(())
}
