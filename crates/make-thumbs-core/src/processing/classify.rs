//! Content sniffing.
//!
//! Files are classified by their leading bytes, never by their name. Signatures follow
//! https://www.garykessler.net/library/file_sigs.html and the ISO base media file
//! format brand registry.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::Result;
use crate::types::ContentType;

/// Number of leading bytes inspected
pub const HEADER_LEN: u64 = 64;

/// MIME type reported when no signature matches
pub const UNKNOWN_MIME: &str = "application/octet-stream";

/// Classify a file as image, video or neither by inspecting its header
pub fn classify<P: AsRef<Path>>(path: P) -> Result<ContentType> {
    Ok(ContentType::from_mime(mime_type(path)?))
}

/// Sniff the MIME type of a file from its first [`HEADER_LEN`] bytes
pub fn mime_type<P: AsRef<Path>>(path: P) -> Result<&'static str> {
    let header = {
        let mut header = Vec::with_capacity(HEADER_LEN as usize);
        File::open(path.as_ref())?
            .take(HEADER_LEN)
            .read_to_end(&mut header)?;
        header
    };

    Ok(sniff_mime(&header).unwrap_or(UNKNOWN_MIME))
}

/// Match a header against the known image and video signatures
pub fn sniff_mime(header: &[u8]) -> Option<&'static str> {
    let starts = |magic: &[u8]| header.starts_with(magic);
    let at = |offset: usize, magic: &[u8]| {
        header
            .get(offset..offset + magic.len())
            .map_or(false, |window| window == magic)
    };

    // Still images
    if starts(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    if starts(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }
    if starts(b"GIF87a") || starts(b"GIF89a") {
        return Some("image/gif");
    }
    if starts(&[0x49, 0x49, 0x2A, 0x00]) || starts(&[0x4D, 0x4D, 0x00, 0x2A]) {
        return Some("image/tiff");
    }
    if starts(b"RIFF") && at(8, b"WEBP") {
        return Some("image/webp");
    }
    if starts(&[0x00, 0x00, 0x01, 0x00]) {
        return Some("image/x-icon");
    }
    if starts(b"BM") && is_bmp_info_header(header) {
        return Some("image/bmp");
    }

    // ISO base media: images (HEIF/AVIF) and videos share the container
    if at(4, b"ftyp") {
        return header.get(8..12).and_then(sniff_ftyp_brand);
    }

    // Video containers
    if starts(b"RIFF") && at(8, b"AVI ") {
        return Some("video/x-msvideo");
    }
    if starts(&[0x1A, 0x45, 0xDF, 0xA3]) {
        return if contains(header, b"webm") {
            Some("video/webm")
        } else {
            Some("video/x-matroska")
        };
    }
    if starts(b"FLV\x01") {
        return Some("video/x-flv");
    }
    if starts(&[0x00, 0x00, 0x01, 0xBA]) || starts(&[0x00, 0x00, 0x01, 0xB3]) {
        return Some("video/mpeg");
    }
    if starts(&[0x30, 0x26, 0xB2, 0x75, 0x8E, 0x66, 0xCF, 0x11]) {
        return Some("video/x-ms-asf");
    }
    if starts(b"OggS") {
        return if contains(header, b"theora") {
            Some("video/ogg")
        } else {
            Some("audio/ogg")
        };
    }

    None
}

fn sniff_ftyp_brand(brand: &[u8]) -> Option<&'static str> {
    match brand {
        b"heic" | b"heix" | b"hevc" | b"hevx" | b"mif1" | b"msf1" => Some("image/heif"),
        b"avif" | b"avis" => Some("image/avif"),
        b"M4A " | b"M4B " | b"M4P " => Some("audio/mp4"),
        b"qt  " => Some("video/quicktime"),
        b"M4V " | b"M4VH" | b"M4VP" => Some("video/x-m4v"),
        [b'3', b'g', ..] => Some("video/3gpp"),
        _ => Some("video/mp4"),
    }
}

/// "BM" alone is too common a prefix; the DIB header size at offset 14 must be one
/// of the known header variants
fn is_bmp_info_header(header: &[u8]) -> bool {
    match header.get(14..18) {
        Some(&[a, b, c, d]) => matches!(
            u32::from_le_bytes([a, b, c, d]),
            12 | 40 | 52 | 56 | 64 | 108 | 124
        ),
        _ => false,
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
