//! Core functionality for building a tree of thumbnails from a tree of images and videos.
//!
//! This library provides the building blocks of the thumbnail pipeline:
//! - Tree traversal with exclusion filtering
//! - Content sniffing and SHA-256 content fingerprints
//! - A content-addressed thumbnail store (`<thumb_root>/<sha256>/<W>x<H>.jpg`)
//! - Thumbnail synthesis for still images and, through `ffmpeg`, videos
//!
//! Files with identical bytes share one destination directory, and sizes that already
//! exist are not regenerated unless forced.

// -- External Dependencies --
use std::path::Path;

// -- Internal Modules --
mod error;
mod pipeline;

// -- Public Re-exports --
pub use config::*;
pub use error::{Error, Result};
pub use logging::{Diagnostics, Verbosity};
pub use types::*;

// -- Public Modules --
pub mod config;
pub mod discovery;
pub mod logging;
pub mod persistence;
pub mod processing;
pub mod types;

use discovery::{absolute, ExclusionSet, TreeWalker, WalkEntry};
use persistence::{ensure_dir, PairLog, ThumbnailStore};
use pipeline::Pipeline;
use processing::ThumbnailSynthesizer;

/// Counts of what happened during a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Images and videos found
    pub eligible: usize,

    /// Files skipped because they are in the exclusion set
    pub excluded: usize,

    /// Files that are neither images nor videos
    pub unsupported: usize,

    /// Files or directories that could not be read during the walk
    pub unreadable: usize,

    /// Eligible files reported but not processed (dry run)
    pub would_process: usize,

    /// Thumbnails written
    pub generated: usize,

    /// Thumbnails left alone because they already exist
    pub already_present: usize,

    /// Eligible files for which at least one thumbnail could not be produced
    pub failed: usize,
}

/// Main entry point for the thumbnailing process
#[derive(Debug)]
pub struct ThumbnailMaker {
    walker: TreeWalker,
    pipeline: Pipeline,
}

impl ThumbnailMaker {
    /// Create a ThumbnailMaker that extracts video frames with `ffmpeg`.
    ///
    /// Fails on configuration problems: the source root is not a directory, the
    /// thumbnail root exists but is not a directory or is the source root itself, the
    /// excludes file or JSON log cannot be read, or the configuration values are
    /// invalid.
    pub fn new(config: Config) -> Result<Self> {
        let synthesizer = ThumbnailSynthesizer::new(&config);
        Self::with_synthesizer(config, synthesizer)
    }

    /// Create a ThumbnailMaker with a custom synthesizer
    pub fn with_synthesizer(mut config: Config, synthesizer: ThumbnailSynthesizer) -> Result<Self> {
        config.validate()?;
        let diagnostics = Diagnostics::new(Verbosity(config.verbosity));

        if !config.root_dir.is_dir() {
            return Err(Error::Configuration(format!(
                "{} isn't a directory tree",
                config.root_dir.display()
            )));
        }

        prepare_thumb_root(&config, &diagnostics)?;
        config.root_dir = absolute(&config.root_dir);
        config.thumb_root_dir = absolute(&config.thumb_root_dir);

        if config.thumb_root_dir == config.root_dir {
            return Err(Error::Configuration(format!(
                "{} can't be both the root and the thumbnail root",
                config.root_dir.display()
            )));
        }

        let mut exclusions =
            ExclusionSet::compile(&config.excludes, config.excludes_file.as_deref(), &diagnostics)?;
        if config.thumb_root_dir.starts_with(&config.root_dir) {
            diagnostics.notice(format_args!(
                "Excluding {} from the walk (inside {})",
                config.thumb_root_dir.display(),
                config.root_dir.display()
            ));
            exclusions.exclude_dir(&config.thumb_root_dir);
        }

        let pair_log = match (&config.json_log, config.dry_run) {
            (Some(path), false) => Some(PairLog::open(path).map_err(|e| {
                Error::Configuration(format!("Failed to open JSON log {}: {}", path.display(), e))
            })?),
            _ => None,
        };

        let walker = TreeWalker::new(&config.root_dir, exclusions, diagnostics);
        let store = ThumbnailStore::from_config(&config);

        Ok(Self {
            walker,
            pipeline: Pipeline {
                config,
                diagnostics,
                store,
                synthesizer,
                pair_log,
            },
        })
    }

    pub fn config(&self) -> &Config {
        &self.pipeline.config
    }

    pub fn store(&self) -> &ThumbnailStore {
        &self.pipeline.store
    }

    pub fn walker(&self) -> &TreeWalker {
        &self.walker
    }

    pub fn pair_log(&self) -> Option<&PairLog> {
        self.pipeline.pair_log.as_ref()
    }

    /// Walk the source tree and make every missing thumbnail.
    ///
    /// Files are handled one at a time, to completion, in walk order. A file that fails
    /// is reported and skipped; the run always finishes.
    pub fn run(&mut self) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        let diagnostics = self.pipeline.diagnostics;

        diagnostics.notice(format_args!(
            "Making thumbnails of {} in {}",
            self.walker.root().display(),
            self.pipeline.store.root().display()
        ));

        for entry in self.walker.entries() {
            match entry {
                WalkEntry::Eligible(source) => {
                    summary.eligible += 1;
                    self.pipeline.process(&source, &mut summary);
                }
                WalkEntry::Excluded(_) => summary.excluded += 1,
                WalkEntry::Unsupported(_) => summary.unsupported += 1,
                WalkEntry::Unreadable(..) => summary.unreadable += 1,
            }
        }

        diagnostics.notice(format_args!(
            "Done: {} generated, {} already present, {} failed, {} not images or videos",
            summary.generated, summary.already_present, summary.failed, summary.unsupported
        ));

        Ok(summary)
    }
}

/// Make sure the thumbnail root is usable, creating it unless this is a dry run
fn prepare_thumb_root(config: &Config, diagnostics: &Diagnostics) -> Result<()> {
    let thumb_root: &Path = &config.thumb_root_dir;

    if thumb_root.exists() && !thumb_root.is_dir() {
        return Err(Error::NotADirectory(thumb_root.to_path_buf()));
    }

    if !thumb_root.is_dir() {
        if config.dry_run {
            diagnostics.notice(format_args!(
                "Not creating {} (dryrun)",
                thumb_root.display()
            ));
        } else {
            diagnostics.notice(format_args!("Creating {}", thumb_root.display()));
            ensure_dir(thumb_root)?;
        }
    }

    Ok(())
}
