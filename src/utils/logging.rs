//! Diagnostic logging.
//!
//! The terminal belongs to the TUI, so tracing output only goes to a file
//! named on the command line. Without one, nothing is installed and the
//! `tracing` macros are no-ops.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_ENV_VAR: &str = "MULTIPLYR_LOG";
const DEFAULT_DIRECTIVES: &str = "info";

/// Filter from `directives`, falling back to `info` when they are missing or
/// malformed.
pub fn build_env_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .map(str::trim)
        .filter(|directives| !directives.is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Install a global subscriber appending to `log_path`.
pub fn init_tracing(log_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let Some(path) = log_path else {
        return Ok(());
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| format!("cannot open debug log {}: {e}", path.display()))?;

    let directives = std::env::var(LOG_ENV_VAR).ok();
    tracing_subscriber::registry()
        .with(build_env_filter(directives.as_deref()))
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true),
        )
        .try_init()
        .map_err(|e| -> Box<dyn std::error::Error> { e.into() })?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "logging started");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_defaults_to_info() {
        assert_eq!(build_env_filter(None).to_string(), "info");
        assert_eq!(build_env_filter(Some("  ")).to_string(), "info");
    }

    #[test]
    fn filter_uses_valid_directives() {
        assert_eq!(
            build_env_filter(Some("multiplyr=debug")).to_string(),
            "multiplyr=debug"
        );
    }

    #[test]
    fn no_path_installs_nothing() {
        assert!(init_tracing(None).is_ok());
    }
}
