//! The filter catalog.
//!
//! Filters are unit structs implementing [`Filter`], collected in a static,
//! ordered registry. The registry is a plain `static` slice: it exists before
//! `main` runs, is never mutated, and can be read from any thread.
//!
//! | id | Name | Pipeline |
//! |---|---|---|
//! | `black_and_white` | Black and White | every channel := Rec. 601 luma |
//! | `gotham` | Gotham | R: boost lower tones; B: +0.03, then Gotham curve |
//! | `bridge` | Bridge | R: boost lower tones, then Gotham curve; G: −0.03; sharpen |
//! | `brighter` | Brighter | all channels +0.2 |
//!
//! Every filter is deterministic: the same input buffer always produces the
//! same output samples.

use crate::channel::{decrease, increase, remap, sharpen};
use crate::error::{EngineError, Result};
use crate::imaging::PixelBuffer;

/// Red-channel tone curve shared by Gotham and Bridge.
pub const BOOST_LOWER: [f32; 11] = [0.0, 0.05, 0.1, 0.2, 0.3, 0.5, 0.7, 0.8, 0.9, 0.95, 1.0];

/// Flattened S-curve used by Gotham and Bridge.
pub const GOTHAM_ADJUST: [f32; 17] = [
    0.0, 0.047, 0.118, 0.251, 0.318, 0.392, 0.42, 0.439, 0.475, 0.561, 0.58, 0.627, 0.671, 0.733,
    0.847, 0.925, 1.0,
];

/// A named, pure image transform.
pub trait Filter: Sync {
    /// Stable key used by callers and stored in records.
    fn id(&self) -> &'static str;

    /// Human-readable name.
    fn name(&self) -> &'static str;

    fn apply(&self, buffer: &PixelBuffer) -> Result<PixelBuffer>;
}

pub struct BlackAndWhite;

impl Filter for BlackAndWhite {
    fn id(&self) -> &'static str {
        "black_and_white"
    }

    fn name(&self) -> &'static str {
        "Black and White"
    }

    fn apply(&self, buffer: &PixelBuffer) -> Result<PixelBuffer> {
        Ok(buffer.map_pixels(|[r, g, b]| {
            let luma = 0.299 * r + 0.587 * g + 0.114 * b;
            [luma; 3]
        }))
    }
}

pub struct Gotham;

impl Filter for Gotham {
    fn id(&self) -> &'static str {
        "gotham"
    }

    fn name(&self) -> &'static str {
        "Gotham"
    }

    fn apply(&self, buffer: &PixelBuffer) -> Result<PixelBuffer> {
        let [r, g, b] = buffer.split();
        let red = remap(&r, &BOOST_LOWER);
        let blue = remap(&increase(&b, 0.03), &GOTHAM_ADJUST);
        PixelBuffer::from_channels(&red, &g, &blue)
    }
}

pub struct Bridge;

impl Filter for Bridge {
    fn id(&self) -> &'static str {
        "bridge"
    }

    fn name(&self) -> &'static str {
        "Bridge"
    }

    fn apply(&self, buffer: &PixelBuffer) -> Result<PixelBuffer> {
        let [r, g, b] = buffer.split();
        let red = remap(&remap(&r, &BOOST_LOWER), &GOTHAM_ADJUST);
        let green = decrease(&g, 0.03);
        sharpen(&PixelBuffer::from_channels(&red, &green, &b)?)
    }
}

pub struct Brighter;

impl Filter for Brighter {
    fn id(&self) -> &'static str {
        "brighter"
    }

    fn name(&self) -> &'static str {
        "Brighter"
    }

    fn apply(&self, buffer: &PixelBuffer) -> Result<PixelBuffer> {
        let [r, g, b] = buffer.split().map(|plane| increase(&plane, 0.2));
        PixelBuffer::from_channels(&r, &g, &b)
    }
}

static CATALOG: &[&dyn Filter] = &[&BlackAndWhite, &Gotham, &Bridge, &Brighter];

/// All registered filters, in registration order.
pub fn catalog() -> &'static [&'static dyn Filter] {
    CATALOG
}

/// Look up a filter by id.
pub fn find(id: &str) -> Result<&'static dyn Filter> {
    CATALOG
        .iter()
        .copied()
        .find(|f| f.id() == id)
        .ok_or_else(|| EngineError::UnknownFilter(id.to_string()))
}

/// Apply the filter registered under `id`.
pub fn apply(id: &str, buffer: &PixelBuffer) -> Result<PixelBuffer> {
    let filter = find(id)?;
    tracing::debug!(
        filter = id,
        width = buffer.width(),
        height = buffer.height(),
        "Applying filter"
    );
    filter.apply(buffer)
}

/// `(id, name)` pairs in registration order.
pub fn list() -> Vec<(&'static str, &'static str)> {
    CATALOG.iter().map(|f| (f.id(), f.name())).collect()
}
