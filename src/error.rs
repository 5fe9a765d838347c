//! Error taxonomy shared by the imaging, filter, and analysis modules.
//!
//! Every core operation is pure given its inputs, so any of these errors can
//! be retried by the caller without side effects. Nothing here retries
//! internally.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Input bytes are malformed or in a format without a compiled-in decoder.
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Failed to encode image: {0}")]
    Encode(String),
    /// Zero-area dimensions, before or after a crop/resize.
    #[error("Invalid geometry: {width}x{height}")]
    InvalidGeometry { width: u32, height: u32 },
    #[error("Unknown filter: {0}")]
    UnknownFilter(String),
    /// Clustering could not produce any output (e.g. no samples at all).
    #[error("Clustering failed: {0}")]
    ClusteringDegenerate(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Reject zero-area dimensions.
pub(crate) fn check_geometry(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(EngineError::InvalidGeometry { width, height });
    }
    Ok(())
}
