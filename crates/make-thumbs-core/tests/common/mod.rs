#![allow(dead_code)]

use image::{ImageBuffer, Rgb};
use std::fs;
use std::path::{Path, PathBuf};

use make_thumbs_core::Config;

/// Create a real JPEG with a gradient so the encoder has something to chew on
pub fn create_test_jpeg(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    fs::create_dir_all(dir).unwrap();

    let file_path = dir.join(name);
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, 96])
    });
    img.save_with_format(&file_path, image::ImageFormat::Jpeg)
        .unwrap();
    file_path
}

/// Create a PNG with an alpha channel
pub fn create_test_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    fs::create_dir_all(dir).unwrap();

    let file_path = dir.join(name);
    let img = ImageBuffer::from_fn(width, height, |x, _| image::Rgba([200, 10, 10, (x % 256) as u8]));
    img.save_with_format(&file_path, image::ImageFormat::Png)
        .unwrap();
    file_path
}

/// Create a file with arbitrary contents
pub fn create_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    fs::create_dir_all(dir).unwrap();

    let file_path = dir.join(name);
    fs::write(&file_path, data).unwrap();
    file_path
}

/// The start of an MP4 container, enough to be classified as video
pub const MP4_HEADER: &[u8] = b"\x00\x00\x00\x20ftypisom\x00\x00\x02\x00isomiso2avc1mp41";

/// Configuration for a run over `root`, writing into `thumbs`
pub fn test_config(root: &Path, thumbs: &Path) -> Config {
    Config {
        root_dir: root.to_path_buf(),
        thumb_root_dir: thumbs.to_path_buf(),
        ffmpeg_program: PathBuf::from("/nonexistent/bin/ffmpeg"),
        ..Config::default()
    }
}

/// Names of the fingerprint directories under a thumbnail root
pub fn fingerprint_dirs(thumbs: &Path) -> Vec<String> {
    if !thumbs.exists() {
        return Vec::new();
    }

    let mut names: Vec<String> = fs::read_dir(thumbs)
        .unwrap()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().unwrap().is_dir())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Sorted file names inside a directory
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
