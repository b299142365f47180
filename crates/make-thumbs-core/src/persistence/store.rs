use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::{Artifact, ContentFingerprint, Size};

/// Content-addressed layout of the thumbnail tree:
/// `<root>/<fingerprint>/<W>x<H>.jpg`
#[derive(Debug, Clone)]
pub struct ThumbnailStore {
    root: PathBuf,
    force: bool,
    dry_run: bool,
}

/// Which requested artifacts of one source need generating
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePlan {
    /// Destination directory for this fingerprint
    pub dir: PathBuf,

    /// Whether this plan created `dir`
    pub created: bool,

    /// Artifacts to generate, in request order
    pub pending: Vec<Artifact>,

    /// Artifacts already present and left untouched
    pub existing: Vec<Artifact>,
}

impl ThumbnailStore {
    pub fn new(root: impl Into<PathBuf>, force: bool, dry_run: bool) -> Self {
        Self {
            root: root.into(),
            force,
            dry_run,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.thumb_root_dir.clone(), config.force, config.dry_run)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Destination directory for a fingerprint
    pub fn dir_for(&self, fingerprint: &ContentFingerprint) -> PathBuf {
        self.root.join(fingerprint.to_hex())
    }

    pub fn artifact_for(&self, fingerprint: &ContentFingerprint, size: Size) -> Artifact {
        Artifact {
            size,
            path: self.dir_for(fingerprint).join(size.file_name()),
        }
    }

    /// Decide which of `sizes` need generating for `fingerprint`.
    ///
    /// Creates the destination directory unless this is a dry run. An artifact that
    /// exists is left alone unless `force` is set; presence alone counts, the file's
    /// contents are not inspected.
    pub fn plan(&self, fingerprint: &ContentFingerprint, sizes: &[Size]) -> Result<StorePlan> {
        let dir = self.dir_for(fingerprint);
        let created = if self.dry_run {
            false
        } else {
            ensure_dir(&dir)?
        };

        let mut plan = StorePlan {
            dir,
            created,
            pending: Vec::new(),
            existing: Vec::new(),
        };

        for (i, size) in sizes.iter().enumerate() {
            if sizes[..i].contains(size) {
                continue;
            }

            let artifact = self.artifact_for(fingerprint, *size);
            if !self.force && artifact.path.exists() {
                plan.existing.push(artifact);
            } else {
                plan.pending.push(artifact);
            }
        }

        Ok(plan)
    }
}

/// Create `dir` if it is missing.
///
/// Returns whether the directory was created. A directory that already exists (or
/// appears concurrently) is fine; anything else at that path is an error.
pub fn ensure_dir(dir: &Path) -> Result<bool> {
    if dir.is_dir() {
        return Ok(false);
    }

    match fs::create_dir_all(dir) {
        Ok(()) => Ok(true),
        Err(_) if dir.is_dir() => Ok(false),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists || dir.exists() => {
            Err(Error::NotADirectory(dir.to_path_buf()))
        }
        Err(e) => Err(e.into()),
    }
}
