//! imsize - image dimensions and uncompressed sizes from file headers.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use rayon::prelude::*;
use tracing::{debug, warn};
use tracing_subscriber::filter::LevelFilter;

use imsize::{ImageInfo, InspectOptions, Inspector};

const EXTENSIONS: &[&str] = &[
    "png", "pnm", "pgm", "ppm", "pfm", "bmp", "jpeg", "jpg", "insp", "tiff", "tif", "hdr", "exr",
    "dng", "cr2", "nef", "orf", "rw2", "raf", "npy",
];

const MEGABYTE: f64 = 1024.0 * 1024.0;

#[derive(Parser, Debug)]
#[command(name = "imsize")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Files or directories to scan
    #[arg(default_value = ".")]
    paths: Vec<PathBuf>,

    /// Show all extracted metadata per image
    #[arg(long, default_value_t = false)]
    all: bool,

    /// Print records as JSON lines
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Only print the summary line
    #[arg(short, long, default_value_t = false)]
    quiet: bool,

    /// Do not read EXIF orientation of RAW files
    #[arg(long, default_value_t = false)]
    no_exif: bool,

    /// Do not decode RAW files
    #[arg(long, default_value_t = false)]
    no_raw: bool,

    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    #[arg(long, default_value_t = false)]
    trace: bool,
}

impl Args {
    fn log_level(&self) -> LevelFilter {
        if self.trace {
            LevelFilter::TRACE
        } else if self.verbose {
            LevelFilter::DEBUG
        } else {
            LevelFilter::WARN
        }
    }

    fn options(&self) -> InspectOptions {
        let mut options = InspectOptions::new();
        if self.no_exif {
            options = options.without_exif();
        }
        if self.no_raw {
            options = options.without_raw();
        }
        options
    }
}

struct Outcome {
    path: PathBuf,
    file_size: u64,
    result: Result<ImageInfo>,
}

fn has_known_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)))
}

fn collect_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let entries = fs::read_dir(path)
                .with_context(|| format!("Failed to read directory {}", path.display()))?;
            for entry in entries {
                let entry = entry?;
                let candidate = entry.path();
                if candidate.is_file() && has_known_extension(&candidate) {
                    files.push(candidate);
                }
            }
        } else {
            files.push(path.clone());
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn inspect_one(inspector: &Inspector, path: PathBuf) -> Outcome {
    let file_size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
    let result = inspector
        .inspect(&path)
        .with_context(|| format!("{}", path.display()));
    Outcome {
        path,
        file_size,
        result,
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

fn format_line(name: &str, info: &ImageInfo) -> String {
    let (width, height) = info.display_dimensions();
    let megs = info.uncompressed_size() as f64 / MEGABYTE;
    let estimated = if info.uncertain { " [estimated]" } else { "" };
    format!(
        "{name}: {width} x {height} x {} x {} bits => {megs:.1} MB{estimated}, {:.1} MP",
        info.channels,
        info.bit_depth,
        info.megapixels()
    )
}

fn run(args: &Args) -> Result<bool> {
    let files = collect_files(&args.paths)?;
    debug!(count = files.len(), "collected input files");

    let inspector = Inspector::with_options(args.options());
    let outcomes: Vec<Outcome> = files
        .into_par_iter()
        .map(|path| inspect_one(&inspector, path))
        .collect();

    let mut processed = 0usize;
    let mut compressed = 0u64;
    let mut uncompressed = 0u64;
    let mut all_ok = true;

    for outcome in &outcomes {
        let name = display_name(&outcome.path);
        match &outcome.result {
            Ok(info) => {
                processed += 1;
                compressed = compressed.saturating_add(outcome.file_size);
                uncompressed = uncompressed.saturating_add(info.uncompressed_size());
                if args.json {
                    println!("{}", serde_json::to_string(info)?);
                } else if !args.quiet {
                    println!("{}", format_line(&name, info));
                    if args.all {
                        println!("{}", serde_json::to_string_pretty(info)?);
                    }
                }
            }
            Err(err) => {
                all_ok = false;
                warn!(path = %outcome.path.display(), "inspection failed");
                if !args.quiet {
                    println!("{name}: {:#}", err.root_cause());
                }
            }
        }
    }

    println!(
        "Scanned {processed} images, total {:.1} MB compressed, {:.1} MB uncompressed",
        compressed as f64 / MEGABYTE,
        uncompressed as f64 / MEGABYTE
    );
    Ok(all_ok)
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("imsize: {err:#}");
            ExitCode::FAILURE
        }
    }
}
