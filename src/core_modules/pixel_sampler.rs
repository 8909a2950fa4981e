// THEORY:
// The `PixelSampler` is the bridge between an uploaded image and the analysis
// layers. It decodes whatever the `image` crate understands and produces a flat
// RGBA buffer at a bounded "working resolution":
//
//   scale  = min(1, max_dimension / max(W, H))
//   output = round(W * scale) x round(H * scale)
//
// The working resolution caps the per-detection CPU cost regardless of the
// upload size, and the color thresholds downstream are tuned against it, so the
// scale must be a pure function of the source dimensions. The source
// dimensions travel with the buffer because emitted bounding boxes are expressed
// in full-resolution pixel space.

use crate::core_modules::pixel::pixel::{CHANNELS, Pixel};
use crate::error::{DetectionError, Result};
use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};
use log::debug;

/// The downscaled RGBA raster every analysis stage reads from.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingImage {
    /// Width of the working buffer in pixels.
    pub width: u32,
    /// Height of the working buffer in pixels.
    pub height: u32,
    /// Width of the image as uploaded.
    pub source_width: u32,
    /// Height of the image as uploaded.
    pub source_height: u32,
    /// Row-major RGBA bytes, `width * height * 4` long.
    pub buffer: Vec<u8>,
}

impl WorkingImage {
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Iterates `(x, y, pixel)` in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32, Pixel)> + '_ {
        let width = self.width;
        self.buffer
            .chunks_exact(CHANNELS)
            .enumerate()
            .map(move |(index, bytes)| {
                let index = index as u32;
                (
                    index % width,
                    index / width,
                    Pixel::new(bytes[0], bytes[1], bytes[2], bytes[3]),
                )
            })
    }

    pub fn pixel_at(&self, x: u32, y: u32) -> Option<Pixel> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = ((y as usize) * (self.width as usize) + x as usize) * CHANNELS;
        self.buffer
            .get(start..start + CHANNELS)
            .and_then(|bytes| Pixel::try_from(bytes).ok())
    }

    /// Ratio between working and source resolution.
    pub fn scale(&self) -> f64 {
        self.width as f64 / self.source_width as f64
    }
}

/// Computes the working dimensions for a source image.
pub fn working_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let longest = width.max(height).max(1) as f64;
    let scale = (max_dimension as f64 / longest).min(1.0);
    let scaled = |side: u32| ((side as f64 * scale).round() as u32).max(1);
    (scaled(width), scaled(height))
}

/// Decodes images into working-resolution RGBA buffers.
#[derive(Debug, Clone)]
pub struct PixelSampler {
    max_dimension: u32,
}

impl PixelSampler {
    pub fn new(max_dimension: u32) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
        }
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    /// Decodes encoded image bytes (PNG, JPEG, ...) and samples them.
    pub fn sample_bytes(&self, bytes: &[u8]) -> Result<WorkingImage> {
        if bytes.is_empty() {
            return Err(DetectionError::Decode("image data is empty".to_string()));
        }
        let image = image::load_from_memory(bytes)?;
        self.sample_image(&image)
    }

    /// Wraps a raw RGBA buffer of the given dimensions and samples it.
    pub fn sample_rgba(&self, width: u32, height: u32, buffer: Vec<u8>) -> Result<WorkingImage> {
        let raster = RgbaImage::from_raw(width, height, buffer).ok_or_else(|| {
            DetectionError::AnalysisUnavailable(format!(
                "buffer does not hold {width}x{height} RGBA pixels"
            ))
        })?;
        self.sample_image(&DynamicImage::ImageRgba8(raster))
    }

    /// Samples an already decoded image.
    pub fn sample_image(&self, image: &DynamicImage) -> Result<WorkingImage> {
        let (source_width, source_height) = (image.width(), image.height());
        if source_width == 0 || source_height == 0 {
            return Err(DetectionError::AnalysisUnavailable(format!(
                "image has no drawable area ({source_width}x{source_height})"
            )));
        }

        let (width, height) = working_dimensions(source_width, source_height, self.max_dimension);
        let rgba = image.to_rgba8();
        let raster = if (width, height) == (source_width, source_height) {
            rgba
        } else {
            image::imageops::resize(&rgba, width, height, FilterType::Triangle)
        };

        let buffer = raster.into_raw();
        if buffer.len() != (width as usize) * (height as usize) * CHANNELS {
            return Err(DetectionError::AnalysisUnavailable(
                "resized raster has an unexpected length".to_string(),
            ));
        }

        debug!(
            "Sampled {source_width}x{source_height} image at working resolution {width}x{height}"
        );

        Ok(WorkingImage {
            width,
            height,
            source_width,
            source_height,
            buffer,
        })
    }
}

impl Default for PixelSampler {
    fn default() -> Self {
        Self::new(600)
    }
}
