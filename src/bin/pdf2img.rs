//! CLI binary for pdf2img.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig`, writes the PNG and prints a summary.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2img::{
    convert_input, inspect, ConversionConfig, ConversionResult, Smoothing, SourceDocument,
};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Render page 1 next to the current directory as report.png
  pdf2img report.pdf

  # Choose the output file or directory
  pdf2img report.pdf -o thumbs/
  pdf2img report.pdf -o cover.png

  # Sharper output, no anti-aliasing
  pdf2img --scale 4 --smoothing off slides.pdf

  # Convert from URL
  pdf2img https://arxiv.org/pdf/1706.03762 -o attention.png

  # Inspect PDF metadata without rendering
  pdf2img --inspect-only report.pdf

  # Machine-readable result (file bytes reported by size)
  pdf2img --json report.pdf

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH    Path to an existing libpdfium (skips auto-download)
  PDFIUM_CACHE_DIR   Override the default pdfium cache directory
  RUST_LOG           Override the log filter (e.g. pdf2img=debug)

  PDFium (~30 MB) is downloaded automatically on first run and cached in
  ~/.cache/pdf2img/pdfium-7690/ unless --no-download is given.
"#;

/// Render the first page of a PDF to PNG.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2img",
    version,
    about = "Render the first page of a PDF file or URL to a PNG image",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Output PNG file, or a directory to place it in.
    #[arg(short, long, env = "PDF2IMG_OUTPUT")]
    output: Option<PathBuf>,

    /// Upscaling factor from PDF points to pixels (0.25–8).
    #[arg(long, env = "PDF2IMG_SCALE", default_value_t = pdf2img::config::DEFAULT_SCALE)]
    scale: f32,

    /// Anti-aliasing: off, standard, high.
    #[arg(long, env = "PDF2IMG_SMOOTHING", value_enum, default_value = "high")]
    smoothing: SmoothingArg,

    /// Longest-edge pixel cap.
    #[arg(long, env = "PDF2IMG_MAX_PIXELS", default_value_t = 16_000)]
    max_pixels: u32,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2IMG_PASSWORD")]
    password: Option<String>,

    /// Path to the PDFium shared library. Must exist.
    ///
    /// PDFIUM_LIB_PATH is read by the engine loader instead, which skips a
    /// stale value and falls back to the cache.
    #[arg(long)]
    pdfium_lib: Option<PathBuf>,

    /// Never download PDFium; fail if it is not installed.
    #[arg(long, env = "PDF2IMG_NO_DOWNLOAD")]
    no_download: bool,

    /// HTTP download timeout in seconds (URL inputs).
    #[arg(long, env = "PDF2IMG_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Print the result as JSON instead of a summary.
    #[arg(long, env = "PDF2IMG_JSON")]
    json: bool,

    /// Also print the image data URL to stdout.
    #[arg(long)]
    print_url: bool,

    /// Print PDF metadata only, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2IMG_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2IMG_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum SmoothingArg {
    Off,
    Standard,
    High,
}

impl From<SmoothingArg> for Smoothing {
    fn from(v: SmoothingArg) -> Self {
        match v {
            SmoothingArg::Off => Smoothing::Off,
            SmoothingArg::Standard => Smoothing::Standard,
            SmoothingArg::High => Smoothing::High,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || cli.json {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;

    // ── Ensure PDFium engine is available ────────────────────────────────
    // Only the first run downloads; afterwards this is a path check.
    if config.engine_library.is_none() && config.download_engine && !pdfium_loader::is_installed()
    {
        fetch_engine(cli.quiet || cli.json)?;
    }

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let document = SourceDocument::resolve(&cli.input, config.download_timeout_secs)
            .await
            .context("Failed to read PDF")?;
        let meta = inspect(&document, &config)
            .await
            .context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", cli.input);
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            if let Some((w, h)) = meta.first_page_size {
                println!("Page 1:       {:.0} x {:.0} pt", w, h);
            }
            if let Some((w, h)) = meta.rendered_size(config.scale) {
                println!("Output:       {} x {} px", w, h);
            }
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
        }
        return Ok(());
    }

    // ── Run conversion ───────────────────────────────────────────────────
    let result = convert_input(&cli.input, &config).await;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("Failed to serialise result")?
        );
    }

    let ConversionResult {
        image_url,
        file,
        error,
        ..
    } = result;
    let Some(file) = file else {
        let msg = error.unwrap_or_else(|| "conversion produced no image".to_string());
        if !cli.json {
            eprintln!("{} {}", red("✘"), red(&msg));
        }
        std::process::exit(1);
    };

    let destination = output_path(cli.output.as_deref(), &file.name);
    file.write_to(&destination)
        .with_context(|| format!("Failed to write {}", destination.display()))?;

    if cli.print_url {
        println!("{image_url}");
    }
    if !cli.quiet && !cli.json {
        eprintln!(
            "{}  {}  {}",
            green("✔"),
            bold(&destination.display().to_string()),
            dim(&format!("{} bytes", file.size())),
        );
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .scale(cli.scale)
        .smoothing(cli.smoothing.into())
        .max_pixels(cli.max_pixels)
        .download_engine(!cli.no_download)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.engine_library(lib.clone());
    }

    builder.build().context("Invalid configuration")
}

/// Resolve `-o`: a directory (existing, or written with a trailing
/// separator) receives the derived name; anything else is the file itself.
fn output_path(output: Option<&Path>, file_name: &str) -> PathBuf {
    match output {
        None => PathBuf::from(file_name),
        Some(p) if p.is_dir() || p.as_os_str().to_string_lossy().ends_with(['/', '\\']) => {
            p.join(file_name)
        }
        Some(p) => p.to_path_buf(),
    }
}

/// Download PDFium into the cache, with a progress bar unless `quiet`.
fn fetch_engine(quiet: bool) -> Result<()> {
    if quiet {
        tokio::task::block_in_place(|| {
            pdfium_loader::ensure_library(None, pdfium_loader::Fetch::Allowed, None)
        })
        .context("Failed to download PDFium engine")?;
        return Ok(());
    }

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_prefix("PDF engine");
    bar.enable_steady_tick(Duration::from_millis(80));

    let report = |downloaded: u64, total: Option<u64>| {
        if let Some(t) = total {
            if bar.length() != Some(t) {
                bar.set_length(t);
            }
        }
        bar.set_position(downloaded);
    };
    // `report` borrows the bar, so no spawn_blocking here.
    tokio::task::block_in_place(|| {
        pdfium_loader::ensure_library(None, pdfium_loader::Fetch::Allowed, Some(&report))
    })
    .context("Failed to download PDFium engine")?;

    bar.finish_with_message("ready ✓");
    Ok(())
}
