//! Thumbnail synthesis.
//!
//! Images are decoded directly. Videos first have a still frame extracted into a
//! scoped temporary directory; from then on both take the same path: fit the box
//! without upscaling, convert to RGB and encode as JPEG.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, GenericImageView, RgbImage};
use log::debug;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::TempDir;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::processing::video::{FfmpegExtractor, FrameExtractor};
use crate::types::{Artifact, MediaKind, Size, SourceFile};

/// File name of the extracted video frame inside its temporary directory
const FRAME_FILE_NAME: &str = "frame.png";

/// Produces downscaled JPEG previews of images and videos
#[derive(Debug)]
pub struct ThumbnailSynthesizer {
    extractor: Box<dyn FrameExtractor>,
    jpeg_quality: u8,
}

impl ThumbnailSynthesizer {
    /// Create a synthesizer that extracts video frames with `ffmpeg`
    pub fn new(config: &Config) -> Self {
        Self::with_extractor(
            Box::new(FfmpegExtractor::new(config.ffmpeg_program.clone())),
            config.jpeg_quality,
        )
    }

    pub fn with_extractor(extractor: Box<dyn FrameExtractor>, jpeg_quality: u8) -> Self {
        Self {
            extractor,
            jpeg_quality,
        }
    }

    /// Produce a single thumbnail
    pub fn synthesize(&self, source: &SourceFile, artifact: &Artifact) -> Result<()> {
        let (image, _frame_dir) = self.load(source)?;
        self.write_thumbnail(&image, artifact)
    }

    /// Produce several thumbnails of the same source.
    ///
    /// The source is decoded (or its frame extracted) once. An error loading the source
    /// fails the whole call; errors writing individual artifacts are returned per
    /// artifact.
    pub fn synthesize_all<'a>(
        &self,
        source: &SourceFile,
        artifacts: &'a [Artifact],
    ) -> Result<Vec<(&'a Artifact, Result<()>)>> {
        if artifacts.is_empty() {
            return Ok(Vec::new());
        }

        // The extracted frame lives until every artifact has been written
        let (image, _frame_dir) = self.load(source)?;

        Ok(artifacts
            .iter()
            .map(|artifact| (artifact, self.write_thumbnail(&image, artifact)))
            .collect())
    }

    /// Decode the source, extracting a frame first for videos.
    ///
    /// For videos the returned guard owns the temporary frame; dropping it removes the
    /// frame whether or not the resize succeeds.
    fn load(&self, source: &SourceFile) -> Result<(DynamicImage, Option<TempDir>)> {
        match source.kind {
            MediaKind::Image => Ok((decode_image(&source.path)?, None)),
            MediaKind::Video => {
                let frame_dir = tempfile::Builder::new().prefix("make-thumbs-").tempdir()?;
                let frame_path = frame_dir.path().join(FRAME_FILE_NAME);

                self.extractor.extract_frame(&source.path, &frame_path)?;

                // ffmpeg exits cleanly without writing anything when the seek
                // lands past the end of a short clip
                match fs::metadata(&frame_path) {
                    Ok(meta) if meta.len() > 0 => {}
                    _ => {
                        return Err(Error::FrameExtraction {
                            path: source.path.clone(),
                            reason: "no frame was produced (video shorter than the seek offset?)"
                                .to_string(),
                        })
                    }
                }

                let image = decode_image(&frame_path).map_err(|e| Error::FrameExtraction {
                    path: source.path.clone(),
                    reason: format!("extracted frame is unreadable: {}", e),
                })?;

                Ok((image, Some(frame_dir)))
            }
        }
    }

    /// Scale `image` into the artifact's box and write it atomically
    fn write_thumbnail(&self, image: &DynamicImage, artifact: &Artifact) -> Result<()> {
        let thumb = resize_to_fit(image, artifact.size);
        debug!(
            "Writing {}x{} thumbnail to {}",
            thumb.width(),
            thumb.height(),
            artifact.path.display()
        );

        let dir = artifact.path.parent().ok_or_else(|| {
            Error::Configuration(format!("{} has no parent", artifact.path.display()))
        })?;

        let mut tmp = tempfile::Builder::new()
            .prefix(".tmp")
            .suffix(".jpg")
            .tempfile_in(dir)?;

        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            JpegEncoder::new_with_quality(&mut writer, self.jpeg_quality).encode(
                &thumb,
                thumb.width(),
                thumb.height(),
                ColorType::Rgb8,
            )?;
            writer.flush()?;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(fs::Permissions::from_mode(0o644))?;
        }

        tmp.persist(&artifact.path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Decode an image, guessing the format from its content
pub fn decode_image(path: &Path) -> Result<DynamicImage> {
    image::io::Reader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| Error::from_image(path, e))
}

/// Fit `image` into `size` preserving aspect ratio, never upscaling
pub fn resize_to_fit(image: &DynamicImage, size: Size) -> RgbImage {
    let (width, height) = image.dimensions();
    let (target_w, target_h) = size.fit(width, height);

    if (target_w, target_h) == (width, height) {
        image.to_rgb8()
    } else {
        image
            .resize_exact(target_w, target_h, FilterType::Lanczos3)
            .to_rgb8()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb, Rgba};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn write_png(path: &Path, width: u32, height: u32) {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        img.save(path).unwrap();
    }

    fn artifact(dir: &Path, size: Size) -> Artifact {
        Artifact {
            size,
            path: dir.join(size.file_name()),
        }
    }

    /// Writes a fixed PNG in place of a real video frame
    #[derive(Debug, Default)]
    struct StubExtractor {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl FrameExtractor for StubExtractor {
        fn extract_frame(&self, video: &Path, output: &Path) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::FrameExtraction {
                    path: video.to_path_buf(),
                    reason: "stub failure".to_string(),
                });
            }
            write_png(output, 640, 360);
            Ok(())
        }
    }

    #[test]
    fn test_resize_to_fit() {
        let img = DynamicImage::ImageRgba8(ImageBuffer::from_pixel(400, 200, Rgba([1, 2, 3, 255])));
        let thumb = resize_to_fit(&img, Size::new(100, 100));
        assert_eq!(thumb.dimensions(), (100, 50));

        let small = resize_to_fit(&img, Size::new(1000, 1000));
        assert_eq!(small.dimensions(), (400, 200));
    }

    #[test]
    fn test_synthesize_image() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("wide.png");
        write_png(&src, 800, 400);

        let synth = ThumbnailSynthesizer::new(&Config::default());
        let source = SourceFile {
            path: src,
            kind: MediaKind::Image,
        };
        let target = artifact(dir.path(), Size::new(200, 200));
        synth.synthesize(&source, &target).unwrap();

        let thumb = image::open(&target.path).unwrap();
        assert_eq!(thumb.dimensions(), (200, 100));
        assert_eq!(
            image::ImageFormat::from_path(&target.path).unwrap(),
            image::ImageFormat::Jpeg
        );
    }

    #[test]
    fn test_corrupt_image_is_decode_error() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("broken.jpg");
        fs::write(&src, [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F']).unwrap();

        let synth = ThumbnailSynthesizer::new(&Config::default());
        let source = SourceFile {
            path: src,
            kind: MediaKind::Image,
        };
        let target = artifact(dir.path(), Size::new(50, 50));

        let err = synth.synthesize(&source, &target).unwrap_err();
        assert!(matches!(err, Error::Decode { .. } | Error::Io(_)), "{:?}", err);
        assert!(!target.path.exists());
    }

    #[test]
    fn test_unknown_payload_is_unsupported_format() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("mystery.heic");
        fs::write(&src, b"\x00\x00\x00\x18ftypheic\x00\x00\x00\x00mif1heic").unwrap();

        let synth = ThumbnailSynthesizer::new(&Config::default());
        let source = SourceFile {
            path: src,
            kind: MediaKind::Image,
        };
        let err = synth
            .synthesize(&source, &artifact(dir.path(), Size::new(50, 50)))
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { .. }), "{:?}", err);
    }

    #[test]
    fn test_video_frame_is_resized_once_for_all_sizes() {
        let dir = tempdir().unwrap();
        let clip = dir.path().join("clip.mp4");
        fs::write(&clip, b"\x00\x00\x00\x20ftypisom").unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let synth = ThumbnailSynthesizer::with_extractor(
            Box::new(StubExtractor {
                calls: calls.clone(),
                fail: false,
            }),
            80,
        );
        let source = SourceFile {
            path: clip,
            kind: MediaKind::Video,
        };
        let targets = vec![
            artifact(dir.path(), Size::new(100, 100)),
            artifact(dir.path(), Size::new(320, 320)),
        ];

        let results = synth.synthesize_all(&source, &targets).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|(_, r)| r.is_ok()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert_eq!(image::open(&targets[0].path).unwrap().dimensions(), (100, 56));
        assert_eq!(image::open(&targets[1].path).unwrap().dimensions(), (320, 180));
    }

    #[test]
    fn test_failed_extraction_writes_nothing() {
        let dir = tempdir().unwrap();
        let clip = dir.path().join("clip.mp4");
        fs::write(&clip, b"\x00\x00\x00\x20ftypisom").unwrap();

        let synth = ThumbnailSynthesizer::with_extractor(
            Box::new(StubExtractor {
                calls: Arc::default(),
                fail: true,
            }),
            80,
        );
        let source = SourceFile {
            path: clip,
            kind: MediaKind::Video,
        };
        let targets = vec![artifact(dir.path(), Size::new(100, 100))];

        let err = synth.synthesize_all(&source, &targets).unwrap_err();
        assert!(matches!(err, Error::FrameExtraction { .. }));
        assert!(!targets[0].path.exists());
    }
}
