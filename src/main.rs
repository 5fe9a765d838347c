use clap::{Parser, Subcommand, ValueEnum};
use inflex::config::{self, EngineConfig};
use inflex::imaging::{OutputFormat, PixelBuffer, Quality};
use inflex::sinks::{DirectorySink, JsonLinesSink};
use inflex::{analysis, filters, output, process};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Name of the record file written inside the process output directory.
const RECORDS_FILE: &str = "records.jsonl";

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "inflex")]
#[command(about = "Photo filters and dominant-color analysis")]
#[command(long_about = "\
Photo filters and dominant-color analysis

Applies a fixed catalog of photo filters to images and extracts a dominant
color palette (k-means) plus the most vibrant color.

Output layout of 'inflex process':

  <output>/
  ├── originals/          # Source images, content-addressed
  ├── filtered/           # One JPEG thumbnail per filter per image
  ├── sample/colour/      # Vibrant-color swatches
  └── records.jsonl       # One analysis record per image

Run 'inflex gen-config' to generate a documented inflex.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Output size for the `filter` command.
#[derive(Clone, Copy, ValueEnum)]
enum OutputSize {
    /// Source dimensions
    Full,
    /// Longer edge at most `images.preview_size`
    Preview,
    /// Fit within `images.thumbnail_size` on both sides
    Thumb,
    /// Center square crop, then fit within `images.thumbnail_size`
    Square,
}

#[derive(Subcommand)]
enum Command {
    /// List available filters
    Filters,
    /// Apply one filter to an image
    Filter {
        /// Source image
        input: PathBuf,
        /// Filter id (see 'inflex filters')
        #[arg(long, short)]
        filter: String,
        /// Output file; the extension picks the format (jpg or png)
        #[arg(long, short)]
        output: PathBuf,
        /// Output size
        #[arg(long, value_enum, default_value_t = OutputSize::Full)]
        size: OutputSize,
    },
    /// Print the color analysis of an image as JSON
    Analyze {
        /// Source image
        input: PathBuf,
    },
    /// Run every filter and the analysis, storing results in a directory
    Process {
        /// Source image or directory of images
        input: PathBuf,
        /// Output directory
        #[arg(long, short, default_value = "inflex-out")]
        output: PathBuf,
    },
    /// Print a stock inflex.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inflex=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    let engine_config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Command::Filters => {
            for line in output::format_filter_list(&filters::list()) {
                println!("{}", line);
            }
        }
        Command::Filter {
            input,
            filter,
            output: out_file,
            size,
        } => {
            let buffer = PixelBuffer::from_bytes(&std::fs::read(&input)?)?;
            let filtered = resize(&filters::apply(&filter, &buffer)?, size, &engine_config)?;
            let format = output_format(&out_file);
            let bytes = filtered.to_bytes(format, Quality::new(engine_config.images.quality))?;
            std::fs::write(&out_file, bytes)?;
            println!("{} \u{2192} {}", filter, out_file.display());
        }
        Command::Analyze { input } => {
            let buffer = PixelBuffer::from_bytes(&std::fs::read(&input)?)?;
            let result = analysis::analyze(&buffer, &engine_config.analysis)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Process {
            input,
            output: out_dir,
        } => {
            init_thread_pool(&engine_config.processing);
            let objects = DirectorySink::new(&out_dir);
            let records = JsonLinesSink::open(out_dir.join(RECORDS_FILE))?;

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_process_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result =
                process::process_path(&input, &engine_config, &objects, Some(&records), Some(tx))?;
            printer.join().map_err(|_| "event printer panicked")?;
            println!("{}", output::format_batch_summary(&result));
            for line in output::format_output_locations(objects.root(), records.path()) {
                println!("{}", line);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn resize(
    buffer: &PixelBuffer,
    size: OutputSize,
    config: &EngineConfig,
) -> Result<PixelBuffer, inflex::error::EngineError> {
    let thumb = config.images.thumbnail_size;
    match size {
        OutputSize::Full => Ok(buffer.clone()),
        OutputSize::Preview => buffer.preview(config.images.preview_size),
        OutputSize::Thumb => buffer.thumbnail((thumb, thumb)),
        OutputSize::Square => buffer.square_thumbnail(thumb),
    }
}

/// Pick the encoding from the output file extension, JPEG when unrecognized.
fn output_format(path: &Path) -> OutputFormat {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(OutputFormat::from_extension)
        .unwrap_or_default()
}

/// Initialize the rayon thread pool based on processing config.
///
/// Never exceeds the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
