//! Dominant-color analysis.
//!
//! [`analyze`] downsamples a buffer, clusters its pixels with k-means in RGB
//! space, and reports one [`ColorSample`] per cluster plus the most vibrant
//! cluster color.
//!
//! ## Algorithm
//!
//! 1. Thumbnail into `sample_size x sample_size` to bound the cost, then
//!    flatten to 8-bit RGB samples.
//! 2. Seed `k` centroids with k-means++ from a `StdRng` seeded by
//!    [`AnalysisOptions::seed`]. Once every sample coincides with a chosen
//!    centroid, further seeds duplicate an existing sample.
//! 3. Lloyd iterations: assign each sample to its nearest centroid (lowest
//!    index wins exact ties), move each centroid to the mean of its samples,
//!    stop when assignments no longer change or after `max_iterations`.
//! 4. Histogram: cluster size / sample count, in cluster-index order. Clusters
//!    left without samples are dropped, so there may be fewer than `k`
//!    entries.
//! 5. Vibrance = saturation x value in HSV; the first maximal entry wins.
//!
//! Entries are **not** sorted by size. Index order is stable for a given
//! seed, and callers may rely on that.
//!
//! ## HSV convention
//!
//! Hue and saturation are in `[0, 1]`; value is the largest RGB component on
//! the 0–255 scale.

use crate::error::{EngineError, Result};
use crate::imaging::PixelBuffer;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// An 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    pub fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    fn from_centroid(c: [f64; 3]) -> Self {
        let [r, g, b] = c.map(|v| v.round().clamp(0.0, 255.0) as u8);
        Self::new(r, g, b)
    }

    pub fn to_array(self) -> [u8; 3] {
        [self.red, self.green, self.blue]
    }
}

/// A color in HSV space (see the module docs for ranges).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsv {
    pub hue: f64,
    pub saturation: f64,
    pub value: f64,
}

impl Hsv {
    /// Saturation x value, the ranking key for vibrance.
    pub fn vibrance(&self) -> f64 {
        self.saturation * self.value
    }
}

/// Convert RGB components on the 0–255 scale to HSV.
pub fn rgb_to_hsv(rgb: [f64; 3]) -> Hsv {
    let [r, g, b] = rgb;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let saturation = if max > 0.0 { delta / max } else { 0.0 };
    let hue = if delta > 0.0 {
        let sector = if r == max {
            (g - b) / delta
        } else if g == max {
            2.0 + (b - r) / delta
        } else {
            4.0 + (r - g) / delta
        };
        (sector / 6.0).rem_euclid(1.0)
    } else {
        0.0
    };

    Hsv {
        hue,
        saturation,
        value: max,
    }
}

/// One cluster of the palette.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorSample {
    /// `floor(share * 100)`; per-entry truncation means the sum can fall short of 100.
    pub percent: u8,
    pub rgb: Rgb,
    pub hsv: Hsv,
}

/// The most vibrant cluster color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VibrantColor {
    pub rgb: Rgb,
    pub hsv: Hsv,
}

/// Result of [`analyze`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorAnalysis {
    pub vibrant: VibrantColor,
    /// Palette in cluster-index order.
    pub dominant: Vec<ColorSample>,
    /// Unrounded share of each entry in `dominant`; sums to 1.
    pub fractions: Vec<f64>,
    /// Lloyd iterations actually run.
    pub iterations: usize,
}

/// Clustering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisOptions {
    /// Number of clusters (k).
    pub clusters: usize,
    /// Bounding box edge for the downsampled copy that gets clustered.
    pub sample_size: u32,
    pub max_iterations: usize,
    /// Seed for k-means++ initialization.
    pub seed: u64,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            clusters: 5,
            sample_size: 100,
            max_iterations: 300,
            seed: 0,
        }
    }
}

fn dist_sq(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn nearest(sample: &[f64; 3], centroids: &[[f64; 3]]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, c) in centroids.iter().enumerate() {
        let d = dist_sq(sample, c);
        if d < best_dist {
            best = i;
            best_dist = d;
        }
    }
    best
}

/// k-means++ seeding.
fn seed_centroids(samples: &[[f64; 3]], k: usize, rng: &mut StdRng) -> Vec<[f64; 3]> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(samples[rng.gen_range(0..samples.len())]);
    let mut closest: Vec<f64> = samples.iter().map(|s| dist_sq(s, &centroids[0])).collect();

    while centroids.len() < k {
        let total: f64 = closest.iter().sum();
        let next = if total > 0.0 {
            // Pick with probability proportional to squared distance
            let mut target = rng.r#gen::<f64>() * total;
            let mut chosen = None;
            for (i, &d) in closest.iter().enumerate() {
                if d <= 0.0 {
                    continue;
                }
                chosen = Some(i);
                if target < d {
                    break;
                }
                target -= d;
            }
            chosen.map_or(samples[0], |i| samples[i])
        } else {
            samples[rng.gen_range(0..samples.len())]
        };

        for (c, s) in closest.iter_mut().zip(samples) {
            *c = c.min(dist_sq(s, &next));
        }
        centroids.push(next);
    }

    centroids
}

fn assign(samples: &[[f64; 3]], centroids: &[[f64; 3]]) -> Vec<usize> {
    samples.iter().map(|s| nearest(s, centroids)).collect()
}

/// Move each centroid to the mean of its samples; empty clusters stay put.
fn update(samples: &[[f64; 3]], labels: &[usize], centroids: &mut [[f64; 3]]) {
    let mut sums = vec![[0.0f64; 3]; centroids.len()];
    let mut counts = vec![0usize; centroids.len()];
    for (s, &label) in samples.iter().zip(labels) {
        counts[label] += 1;
        for (acc, v) in sums[label].iter_mut().zip(s) {
            *acc += v;
        }
    }
    for ((centroid, sum), count) in centroids.iter_mut().zip(sums).zip(counts) {
        if count > 0 {
            *centroid = sum.map(|v| v / count as f64);
        }
    }
}

/// Fitted clusters.
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    pub centroids: Vec<[f64; 3]>,
    /// Cluster index for every input sample.
    pub labels: Vec<usize>,
    pub iterations: usize,
}

/// Run k-means over RGB samples.
pub fn kmeans(
    samples: &[[f64; 3]],
    k: usize,
    max_iterations: usize,
    seed: u64,
) -> Result<Clustering> {
    if samples.is_empty() {
        return Err(EngineError::ClusteringDegenerate(
            "no samples to cluster".into(),
        ));
    }
    if k == 0 {
        return Err(EngineError::ClusteringDegenerate(
            "cluster count must be at least 1".into(),
        ));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut centroids = seed_centroids(samples, k, &mut rng);
    let mut labels = assign(samples, &centroids);
    let mut iterations = 0;

    while iterations < max_iterations {
        iterations += 1;
        update(samples, &labels, &mut centroids);
        let next = assign(samples, &centroids);
        if next == labels {
            break;
        }
        labels = next;
    }

    Ok(Clustering {
        centroids,
        labels,
        iterations,
    })
}

/// Cluster a buffer's colors and pick the most vibrant one.
pub fn analyze(buffer: &PixelBuffer, options: &AnalysisOptions) -> Result<ColorAnalysis> {
    let small = buffer.thumbnail((options.sample_size, options.sample_size))?;
    let samples: Vec<[f64; 3]> = small
        .rgb8_pixels()
        .into_iter()
        .map(|p| p.map(f64::from))
        .collect();

    let clustering = kmeans(
        &samples,
        options.clusters,
        options.max_iterations,
        options.seed,
    )?;

    let mut counts = vec![0usize; clustering.centroids.len()];
    for &label in &clustering.labels {
        counts[label] += 1;
    }

    let total = samples.len() as f64;
    let mut dominant = Vec::new();
    let mut fractions = Vec::new();
    for (centroid, count) in clustering.centroids.iter().zip(counts) {
        if count == 0 {
            continue;
        }
        let fraction = count as f64 / total;
        fractions.push(fraction);
        dominant.push(ColorSample {
            percent: (fraction * 100.0).floor() as u8,
            rgb: Rgb::from_centroid(*centroid),
            hsv: rgb_to_hsv(*centroid),
        });
    }

    let vibrant = most_vibrant(&dominant).ok_or_else(|| {
        EngineError::ClusteringDegenerate("clustering produced no colors".into())
    })?;

    tracing::debug!(
        samples = samples.len(),
        clusters = dominant.len(),
        iterations = clustering.iterations,
        "Color analysis finished"
    );

    Ok(ColorAnalysis {
        vibrant,
        dominant,
        fractions,
        iterations: clustering.iterations,
    })
}

/// First entry with maximal saturation x value.
pub fn most_vibrant(colors: &[ColorSample]) -> Option<VibrantColor> {
    let mut best: Option<&ColorSample> = None;
    for c in colors {
        if best.is_none_or(|b| c.hsv.vibrance() > b.hsv.vibrance()) {
            best = Some(c);
        }
    }
    best.map(|c| VibrantColor { rgb: c.rgb, hsv: c.hsv })
}

/// A uniform swatch of `rgb`, for publishing the vibrant color as an image.
pub fn color_swatch(rgb: Rgb, width: u32, height: u32) -> Result<PixelBuffer> {
    PixelBuffer::solid(width, height, rgb.to_array())
}
