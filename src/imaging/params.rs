//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it:
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`OutputFormat`]: Encoded output format (JPEG by default, PNG for lossless).
//! - [`Sharpening`]: Unsharp-mask parameters (blur sigma + amount).

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Encoded output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
}

impl OutputFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
        }
    }

    /// Pick a format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
            "png" => Some(OutputFormat::Png),
            _ => None,
        }
    }
}

/// Unsharp-mask parameters.
///
/// - `sigma`: Standard deviation of the Gaussian blur
/// - `amount`: Weight of the subtracted blur; output is
///   `original * (1 + amount) - blurred * amount`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sharpening {
    pub sigma: f32,
    pub amount: f32,
}

impl Sharpening {
    /// Wide, strong mask used by the Bridge filter.
    pub fn heavy() -> Self {
        Self {
            sigma: 10.0,
            amount: 0.3,
        }
    }
}
