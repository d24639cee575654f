//! Media Normalizer
//!
//! Validates uploaded photos and re-encodes them to one canonical form:
//! JPEG, auto-oriented, metadata stripped, longest side capped without
//! upscaling. Count, type and size are checked before any pixel is decoded.

use crate::error::{Error, Result};
use futures::future::try_join_all;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder, ImageReader, Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use tracing::{debug, instrument};

/// Canonical output type
pub const CANONICAL_MIME: &str = "image/jpeg";

/// Upload limits and output settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Images allowed per request
    pub max_files: usize,
    /// Per-file ceiling in bytes
    pub max_file_bytes: usize,
    /// Longest side after downsampling
    pub max_dimension: u32,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            max_files: 4,
            max_file_bytes: 20 * 1024 * 1024,
            max_dimension: 1600,
            jpeg_quality: 85,
        }
    }
}

/// Whitelisted upload types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportedMediaType {
    /// JPEG
    Jpeg,
    /// PNG
    Png,
    /// WebP
    Webp,
    /// HEIC / HEIF
    Heic,
}

impl SupportedMediaType {
    /// Parse a declared content type, ignoring parameters and case
    #[must_use]
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::Webp),
            "image/heic" | "image/heif" => Some(Self::Heic),
            _ => None,
        }
    }

    /// Canonical MIME type
    #[must_use]
    pub fn as_mime(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
            Self::Heic => "image/heic",
        }
    }
}

/// A raw uploaded file
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Encoded bytes
    pub data: Vec<u8>,
    /// Declared content type
    pub content_type: String,
    /// Original file name, if the client sent one
    pub file_name: Option<String>,
}

impl ImageUpload {
    /// Create an upload without a file name
    pub fn new(data: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            data,
            content_type: content_type.into(),
            file_name: None,
        }
    }

    /// Attach a file name
    #[must_use]
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    fn display_name(&self) -> &str {
        self.file_name.as_deref().unwrap_or("upload")
    }
}

/// A re-encoded image ready for the generation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedImage {
    /// JPEG bytes without metadata
    pub data: Vec<u8>,
    /// Always `image/jpeg`
    pub mime_type: String,
    /// Width after orientation and downsampling
    pub width: u32,
    /// Height after orientation and downsampling
    pub height: u32,
}

/// Validates and transcodes uploads
#[derive(Debug, Clone, Copy, Default)]
pub struct MediaNormalizer {
    config: MediaConfig,
}

impl MediaNormalizer {
    /// Create a normalizer
    #[must_use]
    pub fn new(config: MediaConfig) -> Self {
        Self { config }
    }

    /// Limits in effect
    pub fn config(&self) -> &MediaConfig {
        &self.config
    }

    /// Fail with `TooManyFiles` above the per-request limit
    pub fn check_count(&self, count: usize) -> Result<()> {
        if count > self.config.max_files {
            return Err(Error::TooManyFiles {
                count,
                max: self.config.max_files,
            });
        }
        Ok(())
    }

    /// Check type and size without decoding
    pub fn validate(&self, upload: &ImageUpload) -> Result<SupportedMediaType> {
        let media_type = SupportedMediaType::from_content_type(&upload.content_type)
            .ok_or_else(|| Error::UnsupportedMediaType(upload.content_type.clone()))?;
        if upload.data.len() > self.config.max_file_bytes {
            return Err(Error::PayloadTooLarge {
                size: upload.data.len(),
                limit: self.config.max_file_bytes,
            });
        }
        if upload.data.is_empty() {
            return Err(Error::invalid_input(format!(
                "{} is empty",
                upload.display_name()
            )));
        }
        Ok(media_type)
    }

    /// Validate and transcode one upload. CPU bound; run off the async runtime.
    pub fn normalize(&self, upload: &ImageUpload) -> Result<NormalizedImage> {
        let media_type = self.validate(upload)?;
        let image = decode_oriented(&upload.data).map_err(|e| match media_type {
            SupportedMediaType::Heic => Error::UnsupportedMediaType(format!(
                "{} could not be decoded ({}); convert HEIC photos to JPEG",
                upload.display_name(),
                e
            )),
            _ => Error::invalid_input(format!(
                "{} is not a readable {} image: {}",
                upload.display_name(),
                media_type.as_mime(),
                e
            )),
        })?;

        let image = downsample(image, self.config.max_dimension);
        let rgb = flatten(&image);
        let (width, height) = rgb.dimensions();

        let mut data = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut data, self.config.jpeg_quality.clamp(1, 100));
        DynamicImage::ImageRgb8(rgb)
            .write_with_encoder(encoder)
            .map_err(|e| Error::Internal(format!("JPEG encoding failed: {}", e)))?;

        debug!(
            input_bytes = upload.data.len(),
            output_bytes = data.len(),
            width,
            height,
            "image normalized"
        );

        Ok(NormalizedImage {
            data,
            mime_type: CANONICAL_MIME.to_string(),
            width,
            height,
        })
    }

    /// Normalize every upload concurrently on the blocking pool.
    ///
    /// The count is checked before any file is touched and every file is
    /// validated before any transcode starts. One failure fails the batch.
    #[instrument(skip(self, uploads), fields(count = uploads.len()))]
    pub async fn normalize_all(&self, uploads: Vec<ImageUpload>) -> Result<Vec<NormalizedImage>> {
        self.check_count(uploads.len())?;
        for upload in &uploads {
            self.validate(upload)?;
        }

        let tasks = uploads.into_iter().map(|upload| {
            let normalizer = *self;
            async move {
                match tokio::task::spawn_blocking(move || normalizer.normalize(&upload)).await {
                    Ok(result) => result,
                    Err(e) => Err(Error::Internal(format!("Task join error: {}", e))),
                }
            }
        });
        try_join_all(tasks).await
    }
}

/// Decode and apply the embedded orientation
fn decode_oriented(data: &[u8]) -> image::ImageResult<DynamicImage> {
    let reader = ImageReader::new(Cursor::new(data)).with_guessed_format()?;
    let mut decoder = reader.into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut image = DynamicImage::from_decoder(decoder)?;
    image.apply_orientation(orientation);
    Ok(image)
}

/// Fit inside `max_dimension` keeping the aspect ratio; never upscale
fn downsample(image: DynamicImage, max_dimension: u32) -> DynamicImage {
    if image.width().max(image.height()) <= max_dimension {
        return image;
    }
    image.resize(max_dimension, max_dimension, FilterType::Triangle)
}

/// Composite any alpha onto white
fn flatten(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }
    let rgba = image.to_rgba8();
    let mut flattened = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let alpha = u16::from(pixel[3]);
        let blend =
            |channel: u8| -> u8 { (((u16::from(channel) * alpha) + (255 * (255 - alpha))) / 255) as u8 };
        flattened.put_pixel(x, y, Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])]));
    }
    flattened
}
