//! CLI binary for chapter2pdf.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ScrapeConfig` and prints results.

use anyhow::{Context, Result};
use chapter2pdf::{
    list_image_urls, scrape, ExportOutcome, ProgressCallback, ScrapeConfig,
    ScrapeProgressCallback,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
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
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: renders a live progress bar and a per-image
/// log line using [indicatif]. Downloads are sequential, so lines always
/// appear in candidate order.
struct CliProgressCallback {
    /// The single progress bar anchored at the bottom of the terminal.
    bar: ProgressBar,
    /// Per-image wall-clock start times for elapsed reporting.
    start_times: Mutex<HashMap<usize, Instant>>,
}

impl CliProgressCallback {
    /// Create a callback whose progress-bar length is set dynamically
    /// by `on_scrape_start` (called before any images are downloaded).
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_scrape_start

        // Initial style: spinner only (no counter until we know the total).
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Scanning");
        bar.set_message("Fetching chapter page…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    /// Switch to the full progress-bar style once we know `total`.
    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} images  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Downloading");
        self.bar.reset_eta();
    }
}

/// Cap an overlong skip reason so the ✗ line stays a single line. Skip
/// reasons embed the image URL verbatim, which need not be ASCII, so the cut
/// must land on a char boundary.
fn truncate_reason(reason: String) -> String {
    if reason.len() <= 80 {
        return reason;
    }
    let mut cut = 79;
    while !reason.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}\u{2026}", &reason[..cut])
}

impl ScrapeProgressCallback for CliProgressCallback {
    fn on_scrape_start(&self, total: usize) {
        // Switch from spinner-only style to full progress bar now that we
        // know the actual candidate count.
        self.activate_bar(total);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Found {total} image links, downloading…"))
        ));
    }

    fn on_image_start(&self, index: usize, _total: usize) {
        self.start_times
            .lock()
            .unwrap()
            .insert(index, Instant::now());
        self.bar.set_message(format!("image {index}"));
    }

    fn on_image_complete(&self, index: usize, total: usize, width: u32, height: u32) {
        let elapsed_ms = self
            .start_times
            .lock()
            .unwrap()
            .remove(&index)
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);

        self.bar.println(format!(
            "  {} Image {:>3}/{:<3}  {:<11}  {}",
            green("✓"),
            index,
            total,
            dim(&format!("{width}x{height} px")),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_image_skip(&self, index: usize, total: usize, reason: String) {
        let elapsed_ms = self
            .start_times
            .lock()
            .unwrap()
            .remove(&index)
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);

        let msg = truncate_reason(reason);

        self.bar.println(format!(
            "  {} Image {:>3}/{:<3}  {}  {}",
            red("✗"),
            index,
            total,
            red(&msg),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_scrape_complete(&self, total: usize, accepted: usize) {
        let skipped = total.saturating_sub(accepted);
        self.bar.finish_and_clear();

        if skipped == 0 {
            eprintln!(
                "{} {} images accepted",
                green("✔"),
                bold(&accepted.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} images accepted  ({} skipped)",
                if accepted == 0 { red("✘") } else { cyan("⚠") },
                bold(&accepted.to_string()),
                total,
                red(&skipped.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Scrape a chapter page into chapter.pdf
  chapter2pdf https://chapters.example.com/ch5

  # Name the output
  chapter2pdf https://chapters.example.com/ch5 -o ch5.pdf

  # Hotlink-protected CDN: present the chapter page as Referer
  chapter2pdf --referer https://chapters.example.com/ch5 \
      https://chapters.example.com/ch5

  # Keep every accepted image as a numbered PNG as well
  chapter2pdf --save-images pages/ https://chapters.example.com/ch5

  # One PDF page per image, no stacking
  chapter2pdf --no-paginate https://chapters.example.com/ch5

  # Print the image URLs that would be downloaded, then exit
  chapter2pdf --list-urls https://chapters.example.com/ch5

  # Machine-readable run report
  chapter2pdf --json https://chapters.example.com/ch5 > report.json

FILTERING:
  A downloaded candidate is dropped (and listed in the report) when it
    - has a body under --min-bytes         tracking pixels, error pages
    - is narrower or shorter than --min-dimension   icons, ad thumbnails
    - declares more pixels than the decode budget   decompression bombs
    - fails to download or decode at all

  Filtering never aborts the run; each drop is recorded in the report and
  the run continues. A run that drops every single candidate fails, since
  nothing remains to bind.

PAGINATION:
  Accepted images are stacked top-to-bottom onto page canvases, cutting to a
  new page before an image would push the canvas past --max-page-height.
  An image taller than the cap gets a page of its own. Pages are as wide as
  the widest accepted image.

ENVIRONMENT VARIABLES:
  CHAPTER2PDF_OUTPUT       Output path (same as -o)
  CHAPTER2PDF_USER_AGENT   User-Agent header for every request
  CHAPTER2PDF_REFERER      Referer header for every request
  CHAPTER2PDF_TIMEOUT      Per-request timeout in seconds

FALLBACK:
  If the PDF itself cannot be written (for example a page too tall for JPEG),
  every composed page is written as {output-stem}_page_{N}.png next to the
  output path instead, and the run still succeeds.
"#;

/// Scrape a chapter webpage's images into a single PDF.
#[derive(Parser, Debug)]
#[command(
    name = "chapter2pdf",
    version,
    about = "Scrape a chapter webpage's images into a single PDF",
    long_about = "Download every image linked from a chapter webpage (webcomic, manga mirror, \
scanlation site), screen out icons and tracking pixels, stack the rest into tall pages in \
reading order, and bind them as a single PDF.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Chapter page URL (http or https).
    url: String,

    /// Path of the PDF to write.
    #[arg(short, long, env = "CHAPTER2PDF_OUTPUT", default_value = "chapter.pdf")]
    output: PathBuf,

    /// User-Agent header sent with every request.
    #[arg(
        long,
        env = "CHAPTER2PDF_USER_AGENT",
        long_help = "User-Agent header sent with every request. Defaults to a desktop Chrome \
          string; many image CDNs reject obviously non-browser agents."
    )]
    user_agent: Option<String>,

    /// Referer header sent with every request.
    #[arg(
        long,
        env = "CHAPTER2PDF_REFERER",
        long_help = "Referer header sent with every request. Hotlink-protected CDNs usually \
          accept the chapter page's own URL here."
    )]
    referer: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, env = "CHAPTER2PDF_TIMEOUT", default_value_t = 10)]
    timeout: u64,

    /// Drop downloads with a body smaller than this many bytes.
    #[arg(long, env = "CHAPTER2PDF_MIN_BYTES", default_value_t = 1000)]
    min_bytes: usize,

    /// Drop images narrower or shorter than this many pixels.
    #[arg(long, env = "CHAPTER2PDF_MIN_DIMENSION", default_value_t = 100)]
    min_dimension: u32,

    /// Maximum height of a composed page in pixels (JPEG caps out at 65535).
    #[arg(long, env = "CHAPTER2PDF_MAX_PAGE_HEIGHT", default_value_t = 60_000,
          value_parser = clap::value_parser!(u32).range(1..=65_535))]
    max_page_height: u32,

    /// Page width in pixels when no accepted image dictates one.
    #[arg(long, env = "CHAPTER2PDF_PAGE_WIDTH", default_value_t = 800)]
    page_width: u32,

    /// One PDF page per image at its native size; skip stacking.
    #[arg(long, env = "CHAPTER2PDF_NO_PAGINATE")]
    no_paginate: bool,

    /// Also write each accepted image as a numbered PNG into DIR.
    #[arg(long, value_name = "DIR", env = "CHAPTER2PDF_SAVE_IMAGES")]
    save_images: Option<PathBuf>,

    /// JPEG quality for embedded page images (1-100).
    #[arg(long, env = "CHAPTER2PDF_JPEG_QUALITY", default_value_t = 85,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    jpeg_quality: u8,

    /// Resolution the PDF page geometry is derived at (18-600).
    #[arg(long, env = "CHAPTER2PDF_DPI", default_value_t = 100,
          value_parser = clap::value_parser!(u32).range(18..=600))]
    dpi: u32,

    /// Print the extracted image URLs, one per line, and exit.
    #[arg(long)]
    list_urls: bool,

    /// Output the run report as JSON instead of the summary lines.
    #[arg(long, env = "CHAPTER2PDF_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "CHAPTER2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "CHAPTER2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "CHAPTER2PDF_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.list_urls;
    let filter = if cli.quiet || show_progress {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    // In verbose mode we always want all logs regardless of progress.
    let filter = if cli.verbose { "debug" } else { filter };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── List-urls mode ───────────────────────────────────────────────────
    if cli.list_urls {
        let config = build_config(&cli, None)?;
        let urls = list_image_urls(&config)
            .await
            .context("Failed to extract image URLs")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&urls).context("Failed to serialise URL list")?
            );
        } else {
            for url in &urls {
                println!("{url}");
            }
            if !cli.quiet {
                eprintln!("{} image links on {}", urls.len(), cli.url);
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    // The progress bar starts as a spinner (no candidate count yet);
    // `on_scrape_start` resizes it to the correct total once the chapter
    // page has been parsed. `show_progress` was already computed above.

    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ScrapeProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Run scrape ───────────────────────────────────────────────────────
    let report = scrape(&config).await.context("Scrape failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
        return Ok(());
    }

    // Summary lines (the callback already printed the per-image log).
    if !cli.quiet {
        match &report.export {
            ExportOutcome::Document { path, pages } => {
                eprintln!(
                    "{}  {}/{} images  {} pages  {}ms  →  {}",
                    green("✔"),
                    report.images_accepted,
                    report.urls_found,
                    pages,
                    report.total_duration_ms,
                    bold(&path.display().to_string()),
                );
            }
            ExportOutcome::FallbackImages { written, failed } => {
                eprintln!(
                    "{}  document could not be written; {} fallback page images saved ({} failed)",
                    cyan("⚠"),
                    bold(&written.to_string()),
                    failed,
                );
            }
            ExportOutcome::NothingWritten => {
                eprintln!("{}  nothing to write", cyan("⚠"));
            }
        }
        if report.images_rejected > 0 || report.images_failed > 0 {
            eprintln!(
                "   {} filtered  /  {} failed",
                dim(&report.images_rejected.to_string()),
                dim(&report.images_failed.to_string()),
            );
        }
    }

    Ok(())
}

/// Map CLI args to `ScrapeConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ScrapeConfig> {
    let mut builder = ScrapeConfig::builder(&cli.url)
        .output(&cli.output)
        .timeout_secs(cli.timeout)
        .min_bytes(cli.min_bytes)
        .min_dimension(cli.min_dimension)
        .max_page_height(cli.max_page_height)
        .page_width(cli.page_width)
        .paginate(!cli.no_paginate)
        .jpeg_quality(cli.jpeg_quality)
        .dpi(cli.dpi);

    if let Some(ref ua) = cli.user_agent {
        builder = builder.user_agent(ua);
    }
    if let Some(ref referer) = cli.referer {
        builder = builder.referer(referer);
    }
    if let Some(ref dir) = cli.save_images {
        builder = builder.save_dir(dir);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
