use std::fs::{self, File};
use std::path::Path;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use crate::error::{Error, Result};

const DEFAULT_DIRECTIVE: &str = "memtrail=info";
const VERBOSE_DIRECTIVE: &str = "memtrail=debug";

fn env_filter(verbose: bool) -> EnvFilter {
    let fallback = if verbose {
        VERBOSE_DIRECTIVE
    } else {
        DEFAULT_DIRECTIVE
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Human-readable logs on stderr, so the traced command keeps stdout.
pub fn init_stderr(verbose: bool) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| Error::Io(std::io::Error::other(e)))
}

/// JSON lines with span close events (cycle timings) written to `output_path`.
pub fn init_json(output_path: &Path, verbose: bool) -> Result<()> {
    ensure_parent_dir(output_path)?;
    let file = File::create(output_path)?;

    tracing_subscriber::fmt()
        .with_ansi(false)
        .json()
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(env_filter(verbose))
        .with_writer(std::sync::Mutex::new(file))
        .try_init()
        .map_err(|e| Error::Io(std::io::Error::other(e)))
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
