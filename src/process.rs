//! Image processing pipeline.
//!
//! Takes source image bytes and produces everything a client needs to show
//! the result: the original, one thumbnail per catalog filter, a swatch of
//! the vibrant color, and an [`AnalysisRecord`] tying them together.
//!
//! ## Per-image flow
//!
//! ```text
//! bytes ─┬─ put(originals/)
//!        └─ decode ─┬─ filters (par_iter) ─ thumbnail ─ JPEG ─ put(filtered/)
//!                   └─ analyze ─ vibrant swatch ─ JPEG ─ put(sample/colour/)
//!                                          │
//!                                          └─ AnalysisRecord ─ RecordSink
//! ```
//!
//! The filter fan-out and the clustering run concurrently under
//! [`rayon::join`]. Batches of images are processed with `par_iter`; one
//! failing image is reported and skipped without aborting the batch.
//!
//! Storage is injected through [`ObjectSink`] and [`RecordSink`]; progress is
//! reported on an optional [`Sender<ProcessEvent>`].

use crate::analysis::{self, ColorSample, VibrantColor};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::filters;
use crate::imaging::{OutputFormat, PixelBuffer, Quality, supported_input_extensions};
use crate::sinks::{ObjectSink, RecordSink, SinkError, content_hash};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use walkdir::WalkDir;

/// Folder for uploaded originals.
pub const ORIGINALS_FOLDER: &str = "originals";
/// Folder for filtered thumbnails.
pub const FILTERED_FOLDER: &str = "filtered";
/// Folder for vibrant-color swatches.
pub const SWATCH_FOLDER: &str = "sample/colour";

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image processing failed: {0}")]
    Engine(#[from] EngineError),
    #[error("Storage failed: {0}")]
    Sink(#[from] SinkError),
    #[error("Source image not found: {0}")]
    SourceNotFound(PathBuf),
}

/// One filtered variant of the source image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredImage {
    pub id: String,
    pub name: String,
    pub thumb_url: String,
}

/// The vibrant color plus the address of its rendered swatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VibrantColour {
    #[serde(flatten)]
    pub color: VibrantColor,
    pub sample: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Properties {
    pub vibrant_colour: VibrantColour,
    pub dominant_colours: Vec<ColorSample>,
}

/// Everything produced for one source image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    /// SHA-256 of the source bytes.
    pub id: String,
    pub original_url: String,
    /// One entry per catalog filter, in catalog order.
    pub filtered: Vec<FilteredImage>,
    pub properties: Properties,
    /// Seconds since the UNIX epoch.
    pub timestamp: f64,
}

/// Progress events sent to the caller during processing.
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    /// A batch is about to run over `image_count` files.
    BatchStarted { image_count: usize },
    ImageProcessed {
        label: String,
        record: Box<AnalysisRecord>,
    },
    /// A batch file failed and was left out.
    ImageSkipped { label: String, reason: String },
}

/// Outcome of [`process_path`].
#[derive(Debug, Default)]
pub struct BatchResult {
    /// Records for every image that succeeded, in path order.
    pub records: Vec<AnalysisRecord>,
    /// Files that failed, with the error message.
    pub skipped: Vec<(PathBuf, String)>,
}

impl std::fmt::Display for BatchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} processed, {} skipped",
            self.records.len(),
            self.skipped.len()
        )
    }
}

fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

fn source_content_type(bytes: &[u8]) -> &'static str {
    image::guess_format(bytes)
        .map(|f| f.to_mime_type())
        .unwrap_or("application/octet-stream")
}

/// Apply every catalog filter and store a JPEG thumbnail of each result.
fn filter_all(
    buffer: &PixelBuffer,
    config: &EngineConfig,
    objects: &impl ObjectSink,
) -> Result<Vec<FilteredImage>, ProcessError> {
    let size = config.images.thumbnail_size;
    let quality = Quality::new(config.images.quality);
    filters::catalog()
        .par_iter()
        .map(|filter| -> Result<FilteredImage, ProcessError> {
            let filtered = filters::apply(filter.id(), buffer)?;
            let jpeg = filtered
                .thumbnail((size, size))?
                .to_bytes(OutputFormat::Jpeg, quality)?;
            let thumb_url = objects.put(&jpeg, FILTERED_FOLDER, OutputFormat::Jpeg.content_type())?;
            Ok(FilteredImage {
                id: filter.id().to_string(),
                name: filter.name().to_string(),
                thumb_url,
            })
        })
        .collect()
}

/// Run the full pipeline on one image.
///
/// Stores the original, the filtered thumbnails and the vibrant swatch via
/// `objects`, then hands the finished record to `records` (when given) and
/// reports it on `events` (when given).
pub fn process_image(
    bytes: &[u8],
    label: &str,
    config: &EngineConfig,
    objects: &impl ObjectSink,
    records: Option<&dyn RecordSink>,
    events: Option<&Sender<ProcessEvent>>,
) -> Result<AnalysisRecord, ProcessError> {
    let buffer = PixelBuffer::from_bytes(bytes)?;
    let id = content_hash(bytes);
    let original_url = objects.put(bytes, ORIGINALS_FOLDER, source_content_type(bytes))?;

    let (filtered, analysis) = rayon::join(
        || filter_all(&buffer, config, objects),
        || analysis::analyze(&buffer, &config.analysis),
    );
    let filtered = filtered?;
    let analysis = analysis?;

    let swatch_size = config.swatch.size;
    let swatch = analysis::color_swatch(analysis.vibrant.rgb, swatch_size, swatch_size)?
        .to_bytes(OutputFormat::Jpeg, Quality::new(config.images.quality))?;
    let sample = objects.put(&swatch, SWATCH_FOLDER, OutputFormat::Jpeg.content_type())?;

    let record = AnalysisRecord {
        id,
        original_url,
        filtered,
        properties: Properties {
            vibrant_colour: VibrantColour {
                color: analysis.vibrant,
                sample,
            },
            dominant_colours: analysis.dominant,
        },
        timestamp: unix_timestamp(),
    };

    if let Some(records) = records {
        records.store(&record)?;
    }

    tracing::info!(
        image = label,
        width = buffer.width(),
        height = buffer.height(),
        colours = record.properties.dominant_colours.len(),
        "Processed image"
    );

    if let Some(tx) = events {
        tx.send(ProcessEvent::ImageProcessed {
            label: label.to_string(),
            record: Box::new(record.clone()),
        })
        .ok();
    }

    Ok(record)
}

/// Collect decodable image files under `input`, sorted by path.
///
/// A file path is returned as-is regardless of extension.
pub fn collect_sources(input: &Path) -> Result<Vec<PathBuf>, ProcessError> {
    if !input.exists() {
        return Err(ProcessError::SourceNotFound(input.to_path_buf()));
    }
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    let extensions = supported_input_extensions();
    let mut files: Vec<PathBuf> = WalkDir::new(input)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| extensions.contains(&e.to_lowercase().as_str()))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Process a single image file or every supported image under a directory.
pub fn process_path(
    input: &Path,
    config: &EngineConfig,
    objects: &impl ObjectSink,
    records: Option<&dyn RecordSink>,
    events: Option<Sender<ProcessEvent>>,
) -> Result<BatchResult, ProcessError> {
    let sources = collect_sources(input)?;
    if let Some(tx) = &events {
        tx.send(ProcessEvent::BatchStarted {
            image_count: sources.len(),
        })
        .ok();
    }

    let outcomes: Vec<(PathBuf, Result<AnalysisRecord, ProcessError>)> = sources
        .into_par_iter()
        .map(|path| {
            let label = path.display().to_string();
            let outcome = std::fs::read(&path)
                .map_err(ProcessError::from)
                .and_then(|bytes| {
                    process_image(&bytes, &label, config, objects, records, events.as_ref())
                });
            (path, outcome)
        })
        .collect();

    let mut result = BatchResult::default();
    for (path, outcome) in outcomes {
        match outcome {
            Ok(record) => result.records.push(record),
            Err(e) => {
                let reason = e.to_string();
                tracing::warn!(path = %path.display(), error = %reason, "Skipping image");
                if let Some(tx) = &events {
                    tx.send(ProcessEvent::ImageSkipped {
                        label: path.display().to_string(),
                        reason: reason.clone(),
                    })
                    .ok();
                }
                result.skipped.push((path, reason));
            }
        }
    }
    Ok(result)
}
