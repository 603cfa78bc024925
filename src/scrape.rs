//! Single-run scrape entry points.
//!
//! ## Why strictly sequential?
//!
//! Downloads run one at a time, in document order. Reading order is the
//! product here: page N of the output must be the N-th thing the chapter
//! page showed, and a sequential loop keeps that guarantee trivial (the
//! accepted list is built in order, nothing is ever sorted back into
//! place). It also keeps the tool polite to the single host everything is
//! fetched from.

use crate::config::ScrapeConfig;
use crate::error::ScrapeError;
use crate::pipeline::{compose, export, extract, fetch};
use crate::report::ScrapeReport;
use crate::transport::resolve_fetcher;
use std::time::Instant;
use tracing::{debug, info};

/// Scrape one chapter page and bind its images into a PDF.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(ScrapeReport)` on success, even when individual images were skipped
/// or the document fell back to per-page PNG files (check `report.export`).
///
/// # Errors
/// Returns `Err(ScrapeError)` only for fatal conditions:
/// - the chapter page could not be fetched
/// - the page contained no image links, or none survived screening
/// - the `--save-images` directory could not be created
/// - neither the document nor a single fallback image could be written
pub async fn scrape(config: &ScrapeConfig) -> Result<ScrapeReport, ScrapeError> {
    let total_start = Instant::now();
    info!("Starting scrape: {}", config.page_url);

    // ── Step 1: Resolve transport ────────────────────────────────────────
    let fetcher = resolve_fetcher(config)?;

    // ── Step 2: Extract candidate URLs ───────────────────────────────────
    let urls = extract::extract_image_urls(&fetcher, &config.page_url).await?;
    if urls.is_empty() {
        return Err(ScrapeError::NoImagesFound {
            url: config.page_url.clone(),
        });
    }
    info!("Found {} image URLs", urls.len());

    if let Some(ref cb) = config.progress_callback {
        cb.on_scrape_start(urls.len());
    }

    // ── Step 3: Download and screen ──────────────────────────────────────
    let fetch_start = Instant::now();
    let summary = fetch::download_images(&fetcher, &urls, config).await?;
    let fetch_duration_ms = fetch_start.elapsed().as_millis() as u64;

    let accepted = summary.images.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_scrape_complete(urls.len(), accepted);
    }
    if accepted == 0 {
        return Err(ScrapeError::NoImagesAccepted {
            candidates: urls.len(),
        });
    }
    info!(
        "Accepted {}/{} images in {}ms",
        accepted,
        urls.len(),
        fetch_duration_ms
    );

    let images_rejected = summary.rejected();
    let images_failed = summary.failed();
    let fetch::FetchSummary { images, skips } = summary;

    // ── Step 4: Compose pages ────────────────────────────────────────────
    let compose_start = Instant::now();
    let pages = if config.paginate {
        compose::compose_pages(images, config).await?
    } else {
        debug!("Pagination disabled; one page per image");
        compose::single_image_pages(images)
    };
    let page_count = pages.len();
    let compose_duration_ms = compose_start.elapsed().as_millis() as u64;

    // ── Step 5: Export ───────────────────────────────────────────────────
    let export_start = Instant::now();
    let export = export::export_document(pages, config).await?;
    let export_duration_ms = export_start.elapsed().as_millis() as u64;

    let report = ScrapeReport {
        page_url: config.page_url.clone(),
        urls_found: urls.len(),
        images_accepted: accepted,
        images_rejected,
        images_failed,
        skips,
        pages: page_count,
        export,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        fetch_duration_ms,
        compose_duration_ms,
        export_duration_ms,
    };

    info!(
        "Scrape complete: {} in {}ms",
        report.summary(),
        report.total_duration_ms
    );
    Ok(report)
}

/// Synchronous wrapper around [`scrape`].
///
/// Creates a temporary tokio runtime internally.
pub fn scrape_sync(config: &ScrapeConfig) -> Result<ScrapeReport, ScrapeError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ScrapeError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(scrape(config))
}

/// List the candidate image URLs on a chapter page without downloading any.
///
/// Useful to preview what a run would attempt, or to feed another tool.
pub async fn list_image_urls(config: &ScrapeConfig) -> Result<Vec<String>, ScrapeError> {
    let fetcher = resolve_fetcher(config)?;
    extract::extract_image_urls(&fetcher, &config.page_url).await
}
