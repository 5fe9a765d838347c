//! CLI output formatting.
//!
//! Every function here is pure: it takes pipeline data and returns display
//! lines. The binary decides where they go (the event printer thread prints
//! them to stdout).
//!
//! # Display Contract
//!
//! Each entity gets a header line (its label or id), followed by indented
//! context lines. Colors are shown as `#rrggbb` hex.
//!
//! ## Filters
//!
//! ```text
//! 001 black_and_white  Black and White
//! 002 gotham           Gotham
//! ```
//!
//! ## Process
//!
//! ```text
//! Processing 2 images
//! photos/dawn.jpg
//!     Id: 3a7bd3e2360a
//!     Original: out/originals/3a7bd3e2360a3d29.jpg
//!     black_and_white → out/filtered/91c0a5d7f0e3b2aa.jpg
//!     gotham → out/filtered/c1d2e3f4a5b6c7d8.jpg
//!     Vibrant: #c82a0a → out/sample/colour/0f1e2d3c4b5a6978.jpg
//!     Palette: #c82a0a 41%, #1a1a1a 33%, #e0e0e0 25%
//! photos/broken.jpg (skipped)
//!     Reason: Image processing failed: Failed to decode image: ...
//! ==> Done: 1 processed, 1 skipped
//!     Objects: out
//!     Records: out/records.jsonl
//! ```

use crate::analysis::{ColorSample, Rgb};
use crate::process::{BatchResult, ProcessEvent};
use std::path::Path;

/// Length of the image id prefix shown in output.
const SHORT_ID_LEN: usize = 12;

/// Format a 1-based positional index as a zero-padded 3-digit string.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `#rrggbb` for an 8-bit color.
pub fn hex(rgb: Rgb) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb.red, rgb.green, rgb.blue)
}

fn palette_line(colors: &[ColorSample]) -> String {
    let entries: Vec<String> = colors
        .iter()
        .map(|c| format!("{} {}%", hex(c.rgb), c.percent))
        .collect();
    format!("Palette: {}", entries.join(", "))
}

/// Format the filter catalog as an indexed, aligned listing.
pub fn format_filter_list(filters: &[(&str, &str)]) -> Vec<String> {
    let width = filters.iter().map(|(id, _)| id.len()).max().unwrap_or(0);
    filters
        .iter()
        .enumerate()
        .map(|(i, (id, name))| format!("{} {:<width$}  {}", format_index(i + 1), id, name))
        .collect()
}

/// Format a single process progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::BatchStarted { image_count } => {
            let noun = if *image_count == 1 { "image" } else { "images" };
            vec![format!("Processing {} {}", image_count, noun)]
        }
        ProcessEvent::ImageProcessed { label, record } => {
            let pad = indent(1);
            let short_id = record.id.get(..SHORT_ID_LEN).unwrap_or(&record.id);
            let mut lines = vec![
                label.clone(),
                format!("{pad}Id: {short_id}"),
                format!("{pad}Original: {}", record.original_url),
            ];
            for filtered in &record.filtered {
                lines.push(format!("{pad}{} \u{2192} {}", filtered.id, filtered.thumb_url));
            }
            let vibrant = &record.properties.vibrant_colour;
            lines.push(format!(
                "{pad}Vibrant: {} \u{2192} {}",
                hex(vibrant.color.rgb),
                vibrant.sample
            ));
            lines.push(format!(
                "{pad}{}",
                palette_line(&record.properties.dominant_colours)
            ));
            lines
        }
        ProcessEvent::ImageSkipped { label, reason } => {
            vec![
                format!("{} (skipped)", label),
                format!("{}Reason: {}", indent(1), reason),
            ]
        }
    }
}

/// One-line batch summary.
pub fn format_batch_summary(result: &BatchResult) -> String {
    format!("==> Done: {}", result)
}

/// Where a batch stored its objects and records.
pub fn format_output_locations(objects_root: &Path, records_path: &Path) -> Vec<String> {
    let pad = indent(1);
    vec![
        format!("{pad}Objects: {}", objects_root.display()),
        format!("{pad}Records: {}", records_path.display()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Hsv, VibrantColor};
    use crate::process::{AnalysisRecord, FilteredImage, Properties, VibrantColour};
    use std::path::PathBuf;

    fn sample(rgb: Rgb, percent: u8) -> ColorSample {
        ColorSample {
            percent,
            rgb,
            hsv: Hsv {
                hue: 0.0,
                saturation: 0.0,
                value: 0.0,
            },
        }
    }

    fn record() -> AnalysisRecord {
        let red = Rgb::new(200, 42, 10);
        AnalysisRecord {
            id: "3a7bd3e2360a3d29eea436fcfb7e44c735d117c42d1c1835420b6b9942dd4f1b".into(),
            original_url: "out/originals/3a7bd3e2360a3d29.png".into(),
            filtered: vec![
                FilteredImage {
                    id: "gotham".into(),
                    name: "Gotham".into(),
                    thumb_url: "out/filtered/aa.jpg".into(),
                },
                FilteredImage {
                    id: "brighter".into(),
                    name: "Brighter".into(),
                    thumb_url: "out/filtered/bb.jpg".into(),
                },
            ],
            properties: Properties {
                vibrant_colour: VibrantColour {
                    color: VibrantColor {
                        rgb: red,
                        hsv: sample(red, 0).hsv,
                    },
                    sample: "out/sample/colour/cc.jpg".into(),
                },
                dominant_colours: vec![
                    sample(red, 60),
                    sample(Rgb::new(255, 255, 255), 39),
                ],
            },
            timestamp: 0.0,
        }
    }

    #[test]
    fn hex_is_lowercase_and_padded() {
        assert_eq!(hex(Rgb::new(200, 42, 10)), "#c82a0a");
        assert_eq!(hex(Rgb::new(0, 0, 0)), "#000000");
    }

    #[test]
    fn filter_list_is_indexed_and_aligned() {
        let lines = format_filter_list(&[("black_and_white", "Black and White"), ("gotham", "Gotham")]);
        assert_eq!(lines[0], "001 black_and_white  Black and White");
        assert_eq!(lines[1], "002 gotham           Gotham");
    }

    #[test]
    fn filter_list_empty() {
        assert!(format_filter_list(&[]).is_empty());
    }

    #[test]
    fn batch_started_pluralizes() {
        let one = format_process_event(&ProcessEvent::BatchStarted { image_count: 1 });
        let many = format_process_event(&ProcessEvent::BatchStarted { image_count: 3 });
        assert_eq!(one, vec!["Processing 1 image"]);
        assert_eq!(many, vec!["Processing 3 images"]);
    }

    #[test]
    fn image_processed_lines() {
        let event = ProcessEvent::ImageProcessed {
            label: "photos/dawn.png".into(),
            record: Box::new(record()),
        };
        let lines = format_process_event(&event);
        assert_eq!(
            lines,
            vec![
                "photos/dawn.png",
                "    Id: 3a7bd3e2360a",
                "    Original: out/originals/3a7bd3e2360a3d29.png",
                "    gotham \u{2192} out/filtered/aa.jpg",
                "    brighter \u{2192} out/filtered/bb.jpg",
                "    Vibrant: #c82a0a \u{2192} out/sample/colour/cc.jpg",
                "    Palette: #c82a0a 60%, #ffffff 39%",
            ]
        );
    }

    #[test]
    fn short_ids_are_not_truncated() {
        let mut rec = record();
        rec.id = "abc".into();
        let event = ProcessEvent::ImageProcessed {
            label: "x".into(),
            record: Box::new(rec),
        };
        assert_eq!(format_process_event(&event)[1], "    Id: abc");
    }

    #[test]
    fn image_skipped_lines() {
        let event = ProcessEvent::ImageSkipped {
            label: "photos/broken.jpg".into(),
            reason: "bad bytes".into(),
        };
        assert_eq!(
            format_process_event(&event),
            vec!["photos/broken.jpg (skipped)", "    Reason: bad bytes"]
        );
    }

    #[test]
    fn batch_summary() {
        let result = BatchResult {
            records: vec![record()],
            skipped: vec![(PathBuf::from("a.jpg"), "bad".into())],
        };
        assert_eq!(format_batch_summary(&result), "==> Done: 1 processed, 1 skipped");
    }

    #[test]
    fn output_locations_are_indented() {
        let lines = format_output_locations(
            Path::new("out"),
            &PathBuf::from("out").join("records.jsonl"),
        );
        assert_eq!(lines[0], "    Objects: out");
        assert!(lines[1].starts_with("    Records: out"));
        assert!(lines[1].ends_with("records.jsonl"));
    }
}
