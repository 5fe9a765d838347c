//! Single-plane numeric transforms used to build filters.
//!
//! A [`Channel`] is one color plane of a [`PixelBuffer`], stored as
//! normalized `f32` samples. Every primitive here is elementwise (except the
//! blur), returns a fresh channel, and clamps its output into `[0, 1]`.
//!
//! | Primitive | Effect |
//! |---|---|
//! | [`remap`] | Piecewise-linear tone curve, knots evenly spaced over `[0, 1]` |
//! | [`increase`] / [`decrease`] | Constant offset |
//! | [`gaussian_blur`] | Gaussian smoothing (`image::imageops::blur`) |
//! | [`sharpen`] / [`unsharp_mask`] | `original * (1 + a) - blurred * a` on all three planes |

use crate::error::Result;
use crate::imaging::{PixelBuffer, Sharpening};
use image::{ImageBuffer, Luma};

/// Clamp into `[0, 1]`, mapping NaN to 0.
pub(crate) fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

/// A row-major plane of normalized samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    width: u32,
    height: u32,
    samples: Vec<f32>,
}

impl Channel {
    pub(crate) fn from_samples(width: u32, height: u32, samples: Vec<f32>) -> Self {
        debug_assert_eq!(samples.len(), width as usize * height as usize);
        Self {
            width,
            height,
            samples,
        }
    }

    /// A plane where every sample is `value` (clamped).
    pub fn filled(width: u32, height: u32, value: f32) -> Self {
        Self::from_samples(
            width,
            height,
            vec![clamp_unit(value); width as usize * height as usize],
        )
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample at `(x, y)`. Panics when out of bounds.
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.samples[y as usize * self.width as usize + x as usize]
    }

    /// Apply `f` to every sample and clamp the result.
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Self {
        Self::from_samples(
            self.width,
            self.height,
            self.samples.iter().map(|&v| clamp_unit(f(v))).collect(),
        )
    }
}

/// Remap every sample through a piecewise-linear curve.
///
/// `points` are the curve's y-values at `points.len()` evenly spaced knots
/// on `[0, 1]`. Inputs outside `[0, 1]` take the end values. A single point
/// is a constant curve; an empty slice leaves the channel unchanged.
///
/// # Examples
/// ```
/// # use inflex::channel::{Channel, remap};
/// let c = Channel::filled(1, 1, 0.25);
/// // Curve through (0, 0), (0.5, 0.8), (1, 1)
/// let out = remap(&c, &[0.0, 0.8, 1.0]);
/// assert!((out.get(0, 0) - 0.4).abs() < 1e-6);
/// ```
pub fn remap(channel: &Channel, points: &[f32]) -> Channel {
    match points {
        [] => channel.clone(),
        [only] => channel.map(|_| *only),
        _ => {
            let last = points.len() - 1;
            let segments = last as f32;
            channel.map(|v| {
                let pos = clamp_unit(v) * segments;
                let i = (pos.floor() as usize).min(last - 1);
                let t = pos - i as f32;
                points[i] + (points[i + 1] - points[i]) * t
            })
        }
    }
}

/// Add `delta` to every sample, clamped to `[0, 1]`.
pub fn increase(channel: &Channel, delta: f32) -> Channel {
    channel.map(|v| v + delta)
}

/// Subtract `delta` from every sample, clamped to `[0, 1]`.
pub fn decrease(channel: &Channel, delta: f32) -> Channel {
    channel.map(|v| v - delta)
}

/// Gaussian smoothing with standard deviation `sigma`, via
/// `image::imageops::blur`.
///
/// A non-positive `sigma` returns an unchanged copy.
pub fn gaussian_blur(channel: &Channel, sigma: f32) -> Channel {
    if sigma <= 0.0 || channel.samples.is_empty() {
        return channel.clone();
    }
    let plane: Option<ImageBuffer<Luma<f32>, Vec<f32>>> =
        ImageBuffer::from_raw(channel.width, channel.height, channel.samples.clone());
    match plane {
        Some(plane) => Channel::from_samples(
            channel.width,
            channel.height,
            image::imageops::blur(&plane, sigma)
                .into_raw()
                .into_iter()
                .map(clamp_unit)
                .collect(),
        ),
        None => channel.clone(),
    }
}

/// Unsharp mask over all three planes: one blur of the whole buffer, then
/// `clamp(original * (1 + amount) - blurred * amount)` per sample.
pub fn unsharp_mask(buffer: &PixelBuffer, params: Sharpening) -> Result<PixelBuffer> {
    if params.sigma <= 0.0 {
        return Ok(buffer.clone());
    }
    let blurred = buffer.blur(params.sigma);
    buffer.zip_samples(&blurred, |o, bl| o * (1.0 + params.amount) - bl * params.amount)
}

/// Heavy unsharp mask: `clamp(original * 1.3 - blurred * 0.3)` with a σ=10 blur.
pub fn sharpen(buffer: &PixelBuffer) -> Result<PixelBuffer> {
    unsharp_mask(buffer, Sharpening::heavy())
}
