//! # Inflex
//!
//! Photo filters and dominant-color analysis for uploaded images.
//!
//! Given an image, Inflex produces a set of deterministic filtered variants
//! (black and white, Gotham, Bridge, Brighter) and summarizes its colors: a
//! k-means palette of dominant colors plus the single most "vibrant" one.
//!
//! # Architecture
//!
//! The core is pure and in-memory: bytes in, pixel buffers and plain data
//! out. Storage and progress reporting sit behind traits the caller injects.
//!
//! ```text
//! imaging   decode / crop / resize / encode      (PixelBuffer)
//!    │
//! channel   per-plane remap, offsets, blur, unsharp mask
//!    │
//! filters   static catalog of named filters
//! analysis  k-means palette, HSV, vibrance, swatch
//!    │
//! process   one image or a batch → sinks + AnalysisRecord
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | `PixelBuffer` (normalized `f32` RGB), crop and resize geometry, JPEG/PNG encoding |
//! | [`channel`] | Single-plane transforms the filters are built from |
//! | [`filters`] | The `Filter` trait and the ordered filter registry |
//! | [`analysis`] | Seeded k-means clustering, color histogram, HSV conversion, vibrant color |
//! | [`process`] | Pipeline: runs every filter and the analysis concurrently, stores results |
//! | [`sinks`] | `ObjectSink` / `RecordSink` traits with directory and JSON-lines implementations |
//! | [`config`] | `inflex.toml` loading, validation, and merging onto stock defaults |
//! | [`output`] | CLI output formatting for pipeline events |
//! | [`error`] | Errors shared by the core modules |
//!
//! # Determinism
//!
//! Filters are pure functions of their input. Clustering seeds its centroid
//! initialization from a configured seed (default `0`), so the same image
//! and options always produce the same palette. Pipeline records differ only
//! in their timestamp.
//!
//! # Pixel Representation
//!
//! Buffers hold normalized samples in `[0, 1]`; every transform clamps its
//! output back into that range before storing it. Conversion to 8-bit
//! happens only when encoding (`round(v * 255)`), so a black-and-white
//! conversion of a pure-red image encodes every channel as `76`.

pub mod analysis;
pub mod channel;
pub mod config;
pub mod error;
pub mod filters;
pub mod imaging;
pub mod output;
pub mod process;
pub mod sinks;
