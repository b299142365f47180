use log::debug;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{Error, Result};

/// Offset into the stream of the frame used as a video's thumbnail
pub const FRAME_OFFSET: &str = "00:00:01.000";

/// Pulls a single still frame out of a video
pub trait FrameExtractor: fmt::Debug {
    /// Write the frame at [`FRAME_OFFSET`] of `video` to `output` as a lossless image
    fn extract_frame(&self, video: &Path, output: &Path) -> Result<()>;
}

/// Runs the `ffmpeg` command-line tool
#[derive(Debug, Clone)]
pub struct FfmpegExtractor {
    program: PathBuf,
}

impl FfmpegExtractor {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, video: &Path, output: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-hide_banner", "-loglevel", "error", "-y"])
            .args(["-ss", FRAME_OFFSET])
            .arg("-i")
            .arg(video)
            .args(["-frames:v", "1"])
            .arg(output)
            .stdin(Stdio::null());
        cmd
    }
}

impl Default for FfmpegExtractor {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FrameExtractor for FfmpegExtractor {
    fn extract_frame(&self, video: &Path, output: &Path) -> Result<()> {
        debug!(
            "Extracting frame at {} from {} to {}",
            FRAME_OFFSET,
            video.display(),
            output.display()
        );

        let result = self
            .command(video, output)
            .output()
            .map_err(|e| Error::FrameExtraction {
                path: video.to_path_buf(),
                reason: format!("could not run {}: {}", self.program.display(), e),
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let mut reason = format!("{} exited with {}", self.program.display(), result.status);
            if let Some(line) = stderr.lines().rev().find(|l| !l.trim().is_empty()) {
                reason.push_str(": ");
                reason.push_str(line.trim());
            }
            return Err(Error::FrameExtraction {
                path: video.to_path_buf(),
                reason,
            });
        }

        Ok(())
    }
}
