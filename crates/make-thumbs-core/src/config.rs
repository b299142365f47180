use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::Size;

/// Sizes generated when none are configured
pub const DEFAULT_SIZES: [Size; 2] = [Size::new(100, 100), Size::new(300, 300)];

/// Default JPEG encoder quality for thumbnails
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Configuration for a thumbnailing run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory full of images and videos to make thumbnails of
    pub root_dir: PathBuf,

    /// Directory to populate with a tree full of thumbnails
    pub thumb_root_dir: PathBuf,

    /// Bounding boxes to generate for every source
    pub sizes: Vec<Size>,

    /// Whether to run without writing any files
    pub dry_run: bool,

    /// Whether to regenerate thumbnails that already exist
    pub force: bool,

    /// Directories and files to leave out of the walk
    pub excludes: Vec<PathBuf>,

    /// File with one path per line to leave out of the walk
    pub excludes_file: Option<PathBuf>,

    /// Where to record (source, thumbnail) pairs as JSON
    pub json_log: Option<PathBuf>,

    /// Diagnostic verbosity (0 = silent)
    pub verbosity: u8,

    /// Program used to pull still frames out of videos
    pub ffmpeg_program: PathBuf,

    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("images"),
            thumb_root_dir: PathBuf::from("thumbs"),
            sizes: DEFAULT_SIZES.to_vec(),
            dry_run: false,
            force: false,
            excludes: Vec::new(),
            excludes_file: None,
            json_log: None,
            verbosity: 0,
            ffmpeg_program: PathBuf::from("ffmpeg"),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|e| Error::Configuration(format!("Failed to open config file: {}", e)))?;

        let config: Config = serde_json::from_reader(file)
            .map_err(|e| Error::Configuration(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .map_err(|e| Error::Configuration(format!("Failed to create config file: {}", e)))?;

        serde_json::to_writer_pretty(file, self)
            .map_err(|e| Error::Configuration(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Validate the configuration
    ///
    /// Checks values only. Filesystem checks on the root directories happen when a
    /// [`crate::ThumbnailMaker`] is created.
    pub fn validate(&self) -> Result<()> {
        if self.sizes.is_empty() {
            return Err(Error::Configuration(
                "At least one thumbnail size is required".to_string(),
            ));
        }

        if let Some(size) = self.sizes.iter().find(|s| s.width == 0 || s.height == 0) {
            return Err(Error::Configuration(format!(
                "Thumbnail size {} must have non-zero width and height",
                size
            )));
        }

        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(Error::Configuration(
                "JPEG quality must be between 1 and 100".to_string(),
            ));
        }

        Ok(())
    }
}
