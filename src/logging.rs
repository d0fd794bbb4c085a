//! Tracing subscriber setup. The terminal UI owns stdout, so logs go to a
//! file.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_FILTER: &str = "info";

/// Installs the global subscriber writing to `log_file_path`. `RUST_LOG`
/// overrides the default `info` filter.
pub fn init(log_file_path: &Path) -> Result<()> {
    let log_file = File::create(log_file_path)
        .with_context(|| format!("failed to create log file {}", log_file_path.display()))?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    build_subscriber(log_file, filter)
        .try_init()
        .context("failed to install tracing subscriber")
}

pub fn build_subscriber(
    log_file: File,
    filter: EnvFilter,
) -> impl tracing::Subscriber + Send + Sync {
    let fmt_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry().with(fmt_layer).with(filter)
}

#[cfg(test)]
mod tests {
    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn events_are_written_to_the_log_file() {
        let log_file = NamedTempFile::new().unwrap();
        let subscriber = build_subscriber(log_file.reopen().unwrap(), EnvFilter::new("info"));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(level = 3, "indented line");
            tracing::debug!("filtered out");
        });

        let contents = std::fs::read_to_string(log_file.path()).unwrap();
        assert!(contents.contains("INFO"));
        assert!(contents.contains("indented line"));
        assert!(!contents.contains("filtered out"));
    }
}
