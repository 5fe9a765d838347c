//! In-memory RGB pixel buffer built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::load_from_memory` (pure Rust decoders) |
//! | Crop | `image::imageops::crop_imm` |
//! | Thumbnail / preview | `image::imageops::resize` with `Lanczos3` filter |
//! | Gaussian blur | `image::imageops::blur` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//! | Encode → PNG | `image::codecs::png::PngEncoder` |
//!
//! Samples are stored as normalized `f32` in `[0, 1]`. Every constructor and
//! resampling step clamps back into that range, so a buffer never holds an
//! out-of-range sample. Operations take `&self` and return a new buffer.

use super::calculations::{CropBox, preview_size, square_crop_box, thumbnail_size};
use super::params::{OutputFormat, Quality};
use crate::channel::{Channel, clamp_unit};
use crate::error::{EngineError, Result, check_geometry};
use image::imageops::FilterType;
use image::{ImageEncoder, ImageFormat, Rgb, Rgb32FImage, RgbImage};
use std::sync::LazyLock;

/// Extensions whose decoders are compiled in.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// An immutable RGB image with normalized float samples.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    image: Rgb32FImage,
}

impl PartialEq for PixelBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.image.dimensions() == other.image.dimensions()
            && self.image.as_raw() == other.image.as_raw()
    }
}

fn quantize(v: f32) -> u8 {
    (clamp_unit(v) * 255.0).round() as u8
}

impl PixelBuffer {
    /// Decode an encoded image (any compiled-in format).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let decoded =
            image::load_from_memory(bytes).map_err(|e| EngineError::Decode(e.to_string()))?;
        check_geometry(decoded.width(), decoded.height())?;
        Ok(Self::from_rgb32f(decoded.to_rgb32f()))
    }

    /// Build from interleaved 8-bit RGB samples.
    pub fn from_rgb8(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        check_geometry(width, height)?;
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(EngineError::Decode(format!(
                "expected {expected} RGB bytes for {width}x{height}, got {}",
                data.len()
            )));
        }
        let samples = data.into_iter().map(|b| b as f32 / 255.0).collect();
        Self::from_samples(width, height, samples)
    }

    /// A uniform image of one 8-bit color.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Result<Self> {
        let color = rgb.map(|c| c as f32 / 255.0);
        Self::from_fn(width, height, |_, _| color)
    }

    /// Build from a per-pixel function returning normalized `[r, g, b]`.
    pub fn from_fn(
        width: u32,
        height: u32,
        mut f: impl FnMut(u32, u32) -> [f32; 3],
    ) -> Result<Self> {
        check_geometry(width, height)?;
        let image = Rgb32FImage::from_fn(width, height, |x, y| Rgb(f(x, y).map(clamp_unit)));
        Ok(Self { image })
    }

    fn from_samples(width: u32, height: u32, samples: Vec<f32>) -> Result<Self> {
        Rgb32FImage::from_raw(width, height, samples)
            .map(Self::from_rgb32f)
            .ok_or(EngineError::InvalidGeometry { width, height })
    }

    fn from_rgb32f(mut image: Rgb32FImage) -> Self {
        for v in image.iter_mut() {
            *v = clamp_unit(*v);
        }
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Normalized `[r, g, b]` at `(x, y)`. Panics when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [f32; 3] {
        self.image.get_pixel(x, y).0
    }

    /// Apply `f` to every pixel, producing a new buffer.
    pub fn map_pixels(&self, mut f: impl FnMut([f32; 3]) -> [f32; 3]) -> Self {
        let image = Rgb32FImage::from_fn(self.width(), self.height(), |x, y| {
            Rgb(f(self.image.get_pixel(x, y).0).map(clamp_unit))
        });
        Self { image }
    }

    /// Gaussian blur of all three planes via `image::imageops::blur`.
    pub(crate) fn blur(&self, sigma: f32) -> Self {
        Self::from_rgb32f(image::imageops::blur(&self.image, sigma))
    }

    /// Combine two same-sized buffers sample by sample. Results are clamped.
    pub(crate) fn zip_samples(&self, other: &Self, f: impl Fn(f32, f32) -> f32) -> Result<Self> {
        if other.dimensions() != self.dimensions() {
            return Err(EngineError::InvalidGeometry {
                width: other.width(),
                height: other.height(),
            });
        }
        let samples = self
            .image
            .as_raw()
            .iter()
            .zip(other.image.as_raw())
            .map(|(&a, &b)| f(a, b))
            .collect();
        Self::from_samples(self.width(), self.height(), samples)
    }

    /// Quantize to 8-bit RGB.
    pub fn to_rgb8(&self) -> RgbImage {
        let data = self.image.as_raw().iter().map(|&v| quantize(v)).collect();
        RgbImage::from_raw(self.width(), self.height(), data)
            .unwrap_or_else(|| RgbImage::new(self.width(), self.height()))
    }

    /// All pixels as 8-bit RGB triples, row-major.
    pub fn rgb8_pixels(&self) -> Vec<[u8; 3]> {
        self.image.pixels().map(|p| p.0.map(quantize)).collect()
    }

    /// Split into red, green and blue planes.
    pub fn split(&self) -> [Channel; 3] {
        let (w, h) = self.dimensions();
        let len = w as usize * h as usize;
        let mut planes: [Vec<f32>; 3] = std::array::from_fn(|_| Vec::with_capacity(len));
        for p in self.image.pixels() {
            for (plane, v) in planes.iter_mut().zip(p.0) {
                plane.push(v);
            }
        }
        planes.map(|samples| Channel::from_samples(w, h, samples))
    }

    /// Recombine three planes. Samples are clamped into `[0, 1]`.
    pub fn from_channels(red: &Channel, green: &Channel, blue: &Channel) -> Result<Self> {
        let (w, h) = red.dimensions();
        for plane in [green, blue] {
            if plane.dimensions() != (w, h) {
                let (pw, ph) = plane.dimensions();
                return Err(EngineError::InvalidGeometry {
                    width: pw,
                    height: ph,
                });
            }
        }
        check_geometry(w, h)?;
        let samples = red
            .samples()
            .iter()
            .zip(green.samples())
            .zip(blue.samples())
            .flat_map(|((&r, &g), &b)| [r, g, b])
            .collect();
        Self::from_samples(w, h, samples)
    }

    /// Copy out a rectangular region.
    pub fn crop(&self, region: CropBox) -> Result<Self> {
        check_geometry(region.width(), region.height())?;
        if region.x1 > self.width() || region.y1 > self.height() {
            return Err(EngineError::InvalidGeometry {
                width: region.width(),
                height: region.height(),
            });
        }
        let view = image::imageops::crop_imm(
            &self.image,
            region.x0,
            region.y0,
            region.width(),
            region.height(),
        );
        Ok(Self {
            image: view.to_image(),
        })
    }

    /// Downscale to fit within `bounds`, keeping aspect ratio. Never upscales.
    pub fn thumbnail(&self, bounds: (u32, u32)) -> Result<Self> {
        let (w, h) = thumbnail_size(self.dimensions(), bounds)?;
        if (w, h) == self.dimensions() {
            return Ok(self.clone());
        }
        let resized = image::imageops::resize(&self.image, w, h, FilterType::Lanczos3);
        Ok(Self::from_rgb32f(resized))
    }

    /// Downscale so the longer edge is at most `max_size`.
    pub fn preview(&self, max_size: u32) -> Result<Self> {
        let size = preview_size(self.width(), self.height(), max_size)?;
        self.thumbnail(size)
    }

    /// Center-crop to a square, then downscale to fit `size x size`.
    pub fn square_thumbnail(&self, size: u32) -> Result<Self> {
        let region = square_crop_box(self.width(), self.height())?;
        self.crop(region)?.thumbnail((size, size))
    }

    /// Encode to a byte stream.
    pub fn to_bytes(&self, format: OutputFormat, quality: Quality) -> Result<Vec<u8>> {
        let rgb = self.to_rgb8();
        let mut bytes = Vec::new();
        let (w, h) = rgb.dimensions();
        let written = match format {
            OutputFormat::Jpeg => {
                let q = quality.value().clamp(1, 100) as u8;
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, q)
                    .write_image(rgb.as_raw(), w, h, image::ExtendedColorType::Rgb8)
            }
            OutputFormat::Png => image::codecs::png::PngEncoder::new(&mut bytes).write_image(
                rgb.as_raw(),
                w,
                h,
                image::ExtendedColorType::Rgb8,
            ),
        };
        written.map_err(|e| EngineError::Encode(e.to_string()))?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> PixelBuffer {
        PixelBuffer::from_fn(width, height, |x, y| {
            [x as f32 / width as f32, y as f32 / height as f32, 0.5]
        })
        .unwrap()
    }

    #[test]
    fn supported_extensions_match_decodable_formats() {
        let exts = supported_input_extensions();
        for expected in &["jpg", "jpeg", "png", "tif", "tiff", "webp"] {
            assert!(
                exts.contains(expected),
                "expected {expected} in supported extensions"
            );
        }
    }

    // =========================================================================
    // Construction
    // =========================================================================

    #[test]
    fn from_rgb8_normalizes_samples() {
        let buf = PixelBuffer::from_rgb8(1, 1, vec![255, 0, 51]).unwrap();
        assert_eq!(buf.pixel(0, 0), [1.0, 0.0, 0.2]);
    }

    #[test]
    fn from_rgb8_rejects_wrong_length() {
        let result = PixelBuffer::from_rgb8(2, 2, vec![0; 5]);
        assert!(matches!(result, Err(EngineError::Decode(_))));
    }

    #[test]
    fn zero_area_is_invalid_geometry() {
        assert!(matches!(
            PixelBuffer::solid(0, 4, [0, 0, 0]),
            Err(EngineError::InvalidGeometry { .. })
        ));
    }

    #[test]
    fn from_fn_clamps_out_of_range() {
        let buf = PixelBuffer::from_fn(1, 1, |_, _| [-0.5, 2.0, f32::NAN]).unwrap();
        assert_eq!(buf.pixel(0, 0), [0.0, 1.0, 0.0]);
    }

    #[test]
    fn split_and_merge_is_lossless() {
        let buf = gradient(7, 5);
        let [r, g, b] = buf.split();
        assert_eq!(r.dimensions(), (7, 5));
        let merged = PixelBuffer::from_channels(&r, &g, &b).unwrap();
        assert_eq!(merged, buf);
    }

    #[test]
    fn merge_rejects_mismatched_planes() {
        let [r, g, _] = gradient(4, 4).split();
        let [b, _, _] = gradient(3, 4).split();
        assert!(PixelBuffer::from_channels(&r, &g, &b).is_err());
    }

    // =========================================================================
    // Decode / encode
    // =========================================================================

    #[test]
    fn decode_garbage_is_decode_error() {
        let result = PixelBuffer::from_bytes(b"definitely not an image");
        assert!(matches!(result, Err(EngineError::Decode(_))));
    }

    #[test]
    fn png_encode_decode_preserves_pixels() {
        let buf = PixelBuffer::solid(6, 4, [200, 50, 10]).unwrap();
        let bytes = buf.to_bytes(OutputFormat::Png, Quality::default()).unwrap();
        let decoded = PixelBuffer::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (6, 4));
        assert_eq!(decoded.rgb8_pixels()[0], [200, 50, 10]);
    }

    #[test]
    fn jpeg_encode_produces_decodable_stream() {
        let bytes = gradient(40, 30)
            .to_bytes(OutputFormat::Jpeg, Quality::new(85))
            .unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let decoded = PixelBuffer::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (40, 30));
    }

    #[test]
    fn jpeg_quality_above_range_encodes_as_maximum() {
        let buf = gradient(40, 30);
        let over = buf.to_bytes(OutputFormat::Jpeg, Quality::new(300)).unwrap();
        let max = buf.to_bytes(OutputFormat::Jpeg, Quality::new(100)).unwrap();
        let low = buf.to_bytes(OutputFormat::Jpeg, Quality::new(44)).unwrap();
        assert_eq!(over, max);
        assert_ne!(over, low);
    }

    // =========================================================================
    // Blur
    // =========================================================================

    #[test]
    fn blur_keeps_uniform_buffer() {
        let buf = PixelBuffer::solid(9, 7, [102, 102, 102]).unwrap();
        let out = buf.blur(3.0);
        assert_eq!(out.dimensions(), (9, 7));
        assert_eq!(out.rgb8_pixels(), buf.rgb8_pixels());
    }

    #[test]
    fn zip_samples_rejects_mismatched_sizes() {
        let result = gradient(4, 4).zip_samples(&gradient(3, 4), |a, _| a);
        assert!(matches!(result, Err(EngineError::InvalidGeometry { .. })));
    }

    #[test]
    fn zip_samples_clamps() {
        let buf = PixelBuffer::solid(2, 2, [200, 200, 200]).unwrap();
        let out = buf.zip_samples(&buf, |a, b| a + b).unwrap();
        assert!(out.rgb8_pixels().iter().all(|&p| p == [255, 255, 255]));
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    #[test]
    fn crop_copies_region() {
        let buf = PixelBuffer::from_fn(4, 4, |x, y| [x as f32 / 4.0, y as f32 / 4.0, 0.0]).unwrap();
        let cropped = buf
            .crop(CropBox {
                x0: 1,
                y0: 2,
                x1: 3,
                y1: 4,
            })
            .unwrap();
        assert_eq!(cropped.dimensions(), (2, 2));
        assert_eq!(cropped.pixel(0, 0), buf.pixel(1, 2));
    }

    #[test]
    fn crop_outside_bounds_errors() {
        let buf = gradient(4, 4);
        let result = buf.crop(CropBox {
            x0: 2,
            y0: 0,
            x1: 6,
            y1: 4,
        });
        assert!(matches!(result, Err(EngineError::InvalidGeometry { .. })));
    }

    #[test]
    fn empty_crop_errors() {
        let buf = gradient(4, 4);
        let result = buf.crop(CropBox {
            x0: 2,
            y0: 2,
            x1: 2,
            y1: 4,
        });
        assert!(result.is_err());
    }

    #[test]
    fn thumbnail_keeps_aspect() {
        let thumb = gradient(800, 600).thumbnail((256, 256)).unwrap();
        assert_eq!(thumb.dimensions(), (256, 192));
    }

    #[test]
    fn thumbnail_does_not_mutate_input() {
        let buf = gradient(100, 80);
        let copy = buf.clone();
        let _ = buf.thumbnail((10, 10)).unwrap();
        assert_eq!(buf, copy);
    }

    #[test]
    fn thumbnail_samples_stay_in_range() {
        // Hard edges make Lanczos ring; the result must still be clamped
        let buf = PixelBuffer::from_fn(64, 64, |x, _| if x % 2 == 0 { [1.0; 3] } else { [0.0; 3] })
            .unwrap();
        let thumb = buf.thumbnail((20, 20)).unwrap();
        let [r, _, _] = thumb.split();
        assert!(r.samples().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn preview_caps_longer_edge() {
        let preview = gradient(1000, 400).preview(500).unwrap();
        assert_eq!(preview.dimensions(), (500, 200));
    }

    #[test]
    fn square_thumbnail_is_square() {
        let thumb = gradient(600, 300).square_thumbnail(256).unwrap();
        assert_eq!(thumb.dimensions(), (256, 256));

        let small = gradient(90, 120).square_thumbnail(256).unwrap();
        assert_eq!(small.dimensions(), (90, 90));
    }
}
