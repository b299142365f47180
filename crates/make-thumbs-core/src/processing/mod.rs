// Core modules
mod classify;
mod crypto_hash;
mod synthesize;
mod video;

// Expose content sniffing
pub use classify::{classify, mime_type, sniff_mime, HEADER_LEN, UNKNOWN_MIME};

// Expose cryptographic hash calculations
pub use crypto_hash::*;

// Expose thumbnail synthesis
pub use synthesize::{decode_image, resize_to_fit, ThumbnailSynthesizer};
pub use video::{FfmpegExtractor, FrameExtractor, FRAME_OFFSET};
