//! Pure calculation functions for crop and resize geometry.
//!
//! All functions here are pure and testable without any I/O or images.

use crate::error::{Result, check_geometry};

/// A crop region in pixel coordinates, `x0..x1` by `y0..y1` (end exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl CropBox {
    pub fn width(&self) -> u32 {
        self.x1.saturating_sub(self.x0)
    }

    pub fn height(&self) -> u32 {
        self.y1.saturating_sub(self.y0)
    }
}

/// Calculate the centered square crop of an image.
///
/// The longer axis is trimmed so the region is a square with side
/// `min(width, height)`. When the excess is odd, the extra pixel is taken
/// from the leading edge (`ceil` of half the excess), so the box is shifted
/// by half a pixel toward the trailing edge.
///
/// # Examples
/// ```
/// # use inflex::imaging::{CropBox, square_crop_box};
/// // 600x800 portrait → rows 100..700
/// let b = square_crop_box(600, 800).unwrap();
/// assert_eq!(b, CropBox { x0: 0, y0: 100, x1: 600, y1: 700 });
/// ```
pub fn square_crop_box(width: u32, height: u32) -> Result<CropBox> {
    check_geometry(width, height)?;

    let b = if width < height {
        // Portrait: trim top and bottom
        let top = (height - width).div_ceil(2);
        CropBox {
            x0: 0,
            y0: top,
            x1: width,
            y1: top + width,
        }
    } else if height < width {
        // Landscape: trim left and right
        let left = (width - height).div_ceil(2);
        CropBox {
            x0: left,
            y0: 0,
            x1: left + height,
            y1: height,
        }
    } else {
        CropBox {
            x0: 0,
            y0: 0,
            x1: width,
            y1: height,
        }
    };

    Ok(b)
}

/// Calculate preview dimensions with the longer edge capped at `max_size`.
///
/// Images already within `max_size` on both edges are returned unchanged.
/// Otherwise the longer edge becomes `max_size` and the shorter edge is
/// scaled by the same factor, rounded to the nearest pixel (at least 1).
///
/// # Returns
/// * `(width, height)` - Preview dimensions
pub fn preview_size(width: u32, height: u32, max_size: u32) -> Result<(u32, u32)> {
    check_geometry(width, height)?;
    check_geometry(max_size, max_size)?;

    if width <= max_size && height <= max_size {
        return Ok((width, height));
    }

    let scaled = |other: u32, longer: u32| -> u32 {
        let factor = longer as f64 / max_size as f64;
        ((other as f64 / factor).round() as u32).max(1)
    };

    if width > height {
        Ok((max_size, scaled(height, width)))
    } else {
        Ok((scaled(width, height), max_size))
    }
}

/// Calculate dimensions that fit within `bounds` while keeping the aspect ratio.
///
/// Never upscales: a source already inside the bounds keeps its size.
///
/// # Arguments
/// * `source` - Original dimensions (width, height)
/// * `bounds` - Maximum dimensions (width, height)
pub fn thumbnail_size(source: (u32, u32), bounds: (u32, u32)) -> Result<(u32, u32)> {
    let (src_w, src_h) = source;
    let (max_w, max_h) = bounds;
    check_geometry(src_w, src_h)?;
    check_geometry(max_w, max_h)?;

    if src_w <= max_w && src_h <= max_h {
        return Ok(source);
    }

    let scale = (max_w as f64 / src_w as f64).min(max_h as f64 / src_h as f64);
    let w = ((src_w as f64 * scale).round() as u32).clamp(1, max_w);
    let h = ((src_h as f64 * scale).round() as u32).clamp(1, max_h);
    Ok((w, h))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    // =========================================================================
    // square_crop_box tests
    // =========================================================================

    #[test]
    fn crop_portrait_centers_vertically() {
        let b = square_crop_box(600, 800).unwrap();
        assert_eq!(
            b,
            CropBox {
                x0: 0,
                y0: 100,
                x1: 600,
                y1: 700
            }
        );
    }

    #[test]
    fn crop_landscape_centers_horizontally() {
        let b = square_crop_box(1000, 600).unwrap();
        assert_eq!(
            b,
            CropBox {
                x0: 200,
                y0: 0,
                x1: 800,
                y1: 600
            }
        );
    }

    #[test]
    fn crop_square_is_identity() {
        let b = square_crop_box(300, 300).unwrap();
        assert_eq!(
            b,
            CropBox {
                x0: 0,
                y0: 0,
                x1: 300,
                y1: 300
            }
        );
    }

    #[test]
    fn crop_odd_excess_rounds_leading_edge_up() {
        // 3x6: excess 3, top = ceil(1.5) = 2
        let b = square_crop_box(3, 6).unwrap();
        assert_eq!(b.y0, 2);
        assert_eq!(b.y1, 5);
    }

    #[test]
    fn crop_is_always_min_side_square() {
        for (w, h) in [(1, 1), (1, 9), (9, 1), (3, 6), (7, 4), (640, 481), (1023, 1024)] {
            let b = square_crop_box(w, h).unwrap();
            let side = w.min(h);
            assert_eq!(b.width(), side, "width for {w}x{h}");
            assert_eq!(b.height(), side, "height for {w}x{h}");
            assert!(b.x1 <= w && b.y1 <= h, "box inside {w}x{h}");
        }
    }

    #[test]
    fn crop_rejects_zero_dimensions() {
        assert!(matches!(
            square_crop_box(0, 100),
            Err(EngineError::InvalidGeometry { .. })
        ));
    }

    // =========================================================================
    // preview_size tests
    // =========================================================================

    #[test]
    fn preview_small_image_unchanged() {
        assert_eq!(preview_size(300, 200, 500).unwrap(), (300, 200));
        assert_eq!(preview_size(500, 500, 500).unwrap(), (500, 500));
    }

    #[test]
    fn preview_landscape_caps_width() {
        // 2000x1500 → 500x375
        assert_eq!(preview_size(2000, 1500, 500).unwrap(), (500, 375));
    }

    #[test]
    fn preview_portrait_caps_height() {
        // 1500x2000 → 375x500
        assert_eq!(preview_size(1500, 2000, 500).unwrap(), (375, 500));
    }

    #[test]
    fn preview_square_caps_both() {
        assert_eq!(preview_size(1200, 1200, 500).unwrap(), (500, 500));
    }

    #[test]
    fn preview_longer_edge_matches_max() {
        for (w, h) in [(501, 10), (10, 501), (4000, 3001), (999, 1000)] {
            let (pw, ph) = preview_size(w, h, 500).unwrap();
            assert_eq!(pw.max(ph), 500, "{w}x{h}");
            let expected = w.min(h) as f64 * 500.0 / w.max(h) as f64;
            assert!(((pw.min(ph)) as f64 - expected).abs() <= 1.0, "{w}x{h}");
        }
    }

    #[test]
    fn preview_extreme_aspect_keeps_one_pixel() {
        assert_eq!(preview_size(5000, 1, 500).unwrap(), (500, 1));
    }

    #[test]
    fn preview_rejects_zero() {
        assert!(preview_size(0, 10, 500).is_err());
        assert!(preview_size(10, 10, 0).is_err());
    }

    // =========================================================================
    // thumbnail_size tests
    // =========================================================================

    #[test]
    fn thumbnail_fits_within_bounds() {
        assert_eq!(thumbnail_size((800, 600), (256, 256)).unwrap(), (256, 192));
        assert_eq!(thumbnail_size((600, 800), (256, 256)).unwrap(), (192, 256));
    }

    #[test]
    fn thumbnail_never_upscales() {
        assert_eq!(thumbnail_size((100, 50), (256, 256)).unwrap(), (100, 50));
    }

    #[test]
    fn thumbnail_respects_non_square_bounds() {
        // Height is the binding constraint
        assert_eq!(thumbnail_size((1000, 1000), (400, 100)).unwrap(), (100, 100));
    }
}
