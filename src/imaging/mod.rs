//! Image buffers and geometry in pure Rust, with no system dependencies.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory` |
//! | **Square crop** | [`square_crop_box`] + `imageops::crop_imm` |
//! | **Thumbnail / preview** | Lanczos3 resize, aspect preserved |
//! | **Encode** | JPEG (default) or PNG |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for crop and resize math (unit testable)
//! - **Parameters**: Encoding and sharpening settings
//! - **Buffer**: [`PixelBuffer`], the value type every filter and analysis consumes

mod buffer;
mod calculations;
mod params;

pub use buffer::{PixelBuffer, supported_input_extensions};
pub use calculations::{CropBox, preview_size, square_crop_box, thumbnail_size};
pub use params::{OutputFormat, Quality, Sharpening};
