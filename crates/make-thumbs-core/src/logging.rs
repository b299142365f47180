//! Verbosity-gated diagnostics.
//!
//! Components hold a [`Diagnostics`] value instead of consulting global state. The
//! threshold comes from configuration; messages that pass it are forwarded to the
//! `log` facade, so the binary decides where they end up.

use log::{debug, error, info, trace, warn, LevelFilter};
use std::fmt;
use std::path::Path;

/// Verbosity threshold for diagnostics (0 = silent)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Verbosity(pub u8);

impl Verbosity {
    pub const SILENT: Verbosity = Verbosity(0);

    /// `log` filter that lets through everything this verbosity can emit
    pub fn level_filter(&self) -> LevelFilter {
        match self.0 {
            0 => LevelFilter::Off,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// Emits diagnostics at or below the configured verbosity
#[derive(Debug, Clone, Copy, Default)]
pub struct Diagnostics {
    verbosity: Verbosity,
}

impl Diagnostics {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Whether a message at `level` would be emitted
    pub fn enabled(&self, level: u8) -> bool {
        level > 0 && level <= self.verbosity.0
    }

    /// Level 1: outcomes a user running with `-v` wants to see
    pub fn notice(&self, args: fmt::Arguments<'_>) {
        if self.enabled(1) {
            info!("{}", args);
        }
    }

    /// Level 2: per-file progress
    pub fn detail(&self, args: fmt::Arguments<'_>) {
        if self.enabled(2) {
            debug!("{}", args);
        }
    }

    /// Level 3 and above: internals
    pub fn trace(&self, args: fmt::Arguments<'_>) {
        if self.enabled(3) {
            trace!("{}", args);
        }
    }

    /// Log a file operation that failed (level 1)
    pub fn file_error(&self, path: &Path, operation: &str, err: &dyn std::error::Error) {
        if self.enabled(1) {
            error!(
                "File operation failed - Operation: {}, Path: {}, Error: {}",
                operation,
                path.display(),
                err
            );
        }
    }

    /// Log a skipped path that deserves attention (level 1)
    pub fn skipped(&self, path: &Path, reason: &str) {
        if self.enabled(1) {
            warn!("Skipping {}: {}", path.display(), reason);
        }
    }

    /// Log a file system modification (level 2)
    pub fn fs_modification(&self, operation: &str, path: &Path) {
        if self.enabled(2) {
            debug!("FS CHANGE - Operation: {}, Path: {}", operation, path.display());
        }
    }
}
