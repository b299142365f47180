use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::Error;

/// Result of sniffing a file's content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    Image,
    Video,
    Unsupported,
}

impl ContentType {
    /// Classify from a MIME type string; only the part before the slash counts
    pub fn from_mime(mime: &str) -> Self {
        match mime.split('/').next().unwrap_or("") {
            "image" => Self::Image,
            "video" => Self::Video,
            _ => Self::Unsupported,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image)
    }

    pub fn is_video(&self) -> bool {
        matches!(self, Self::Video)
    }

    /// The media kind, if this content can be thumbnailed at all
    pub fn media_kind(&self) -> Option<MediaKind> {
        match self {
            Self::Image => Some(MediaKind::Image),
            Self::Video => Some(MediaKind::Video),
            Self::Unsupported => None,
        }
    }
}

/// Kinds of source media that produce thumbnails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    Image,
    Video,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Video => write!(f, "video"),
        }
    }
}

/// An eligible file discovered by the walker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute path to the file
    pub path: PathBuf,

    /// Classification computed once during the walk
    pub kind: MediaKind,
}

/// SHA-256 digest of a file's bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentFingerprint(pub [u8; 32]);

impl ContentFingerprint {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hexadecimal form, used as the destination directory name
    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ContentFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Pixel bounding box a thumbnail must fit inside
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// File name of the artifact for this box, e.g. `100x100.jpg`
    pub fn file_name(&self) -> String {
        format!("{}.jpg", self)
    }

    /// Dimensions of an image of `width`x`height` scaled to fit this box.
    ///
    /// Aspect ratio is preserved and the result never exceeds the original.
    pub fn fit(&self, width: u32, height: u32) -> (u32, u32) {
        if width <= self.width && height <= self.height {
            return (width, height);
        }

        let ratio = f64::min(
            self.width as f64 / width as f64,
            self.height as f64 / height as f64,
        );
        let scaled_w = ((width as f64 * ratio).round() as u32).clamp(1, self.width);
        let scaled_h = ((height as f64 * ratio).round() as u32).clamp(1, self.height);
        (scaled_w, scaled_h)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Size {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::Configuration(format!("invalid size '{}', expected WxH", s));

        let (w, h) = s.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
        let width: u32 = w.trim().parse().map_err(|_| invalid())?;
        let height: u32 = h.trim().parse().map_err(|_| invalid())?;

        if width == 0 || height == 0 {
            return Err(Error::Configuration(format!(
                "size '{}' must have non-zero width and height",
                s
            )));
        }

        Ok(Self { width, height })
    }
}

/// A thumbnail file, planned or produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Bounding box the thumbnail was made for
    pub size: Size,

    /// `<thumb_root>/<fingerprint>/<W>x<H>.jpg`
    pub path: PathBuf,
}
