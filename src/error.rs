//! Error types for the chapter2pdf library.
//!
//! Three distinct error types reflect three distinct failure modes:
//!
//! * [`ScrapeError`] — **Fatal**: the run cannot produce anything useful
//!   (bad configuration, the chapter page itself failed to load, zero images
//!   survived screening). Returned as `Err(ScrapeError)` from the top-level
//!   `scrape*` functions.
//!
//! * [`ImageSkip`] — **Non-fatal**: one candidate image was dropped (body too
//!   small, decode failure, dimensions below the floor) but the run continues
//!   with the rest. Collected in [`crate::pipeline::fetch::FetchSummary`] and
//!   reported in [`crate::report::ScrapeReport`] so callers can see exactly
//!   what was left out.
//!
//! * [`FetchError`] — **Transport**: what a [`crate::transport::Fetcher`]
//!   reports for a single GET. The pipeline maps it into `ScrapeError` for the
//!   chapter page and into `ImageSkip` for individual images.
//!
//! The separation lets callers decide their own tolerance: treat any skip as
//! fatal, log and continue, or mine the report afterwards.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the chapter2pdf library.
///
/// Per-image failures use [`ImageSkip`] and are carried in stage summaries
/// rather than propagated here.
#[derive(Debug, Error)]
pub enum ScrapeError {
    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Page errors ───────────────────────────────────────────────────────
    /// The chapter page itself could not be fetched.
    #[error("Failed to fetch page '{url}': {reason}\nCheck the URL and your internet connection.")]
    PageFetchFailed { url: String, reason: String },

    /// The page loaded but contained no image links at all.
    #[error("No image links found at '{url}'\nThe page may build its gallery with JavaScript, which this tool does not execute.")]
    NoImagesFound { url: String },

    /// Every candidate was skipped or rejected; there is nothing to bind.
    #[error("All {candidates} candidate images were skipped or rejected.\nLower --min-bytes or --min-dimension if the page uses small images.")]
    NoImagesAccepted { candidates: usize },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create the directory for `--save-images`.
    #[error("Failed to create image directory '{path}': {source}")]
    SaveDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document could not be written and the per-page fallback produced
    /// no files either, so the run has nothing to show.
    #[error("Failed to write '{path}' and every one of {pages} fallback page images.\nLast error: {detail}")]
    ExportFailed {
        path: PathBuf,
        pages: usize,
        detail: String,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal condition that dropped a single candidate image.
///
/// Carried in [`crate::pipeline::fetch::FetchSummary`] and the final
/// [`crate::report::ScrapeReport`]. The run continues unless ALL candidates
/// end up here.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum ImageSkip {
    /// The GET for this image failed (network error or non-2xx status).
    #[error("image {url}: download failed: {reason}")]
    FetchFailed { url: String, reason: String },

    /// The body was fetched but no decoder could make sense of it.
    #[error("image {url}: decode failed: {detail}")]
    DecodeFailed { url: String, detail: String },

    /// The body is too small to be a content image (tracking pixels,
    /// error pages served as 200).
    #[error("image {url}: body is {len} bytes, below the {min}-byte minimum")]
    TooFewBytes { url: String, len: usize, min: usize },

    /// Decoded fine but at least one dimension is below the floor
    /// (icons, spacers, ad thumbnails).
    #[error("image {url}: {width}x{height} is below the {min}px minimum")]
    TooSmall {
        url: String,
        width: u32,
        height: u32,
        min: u32,
    },

    /// The encoded header declares more pixels than the configured budget.
    /// Rejected before decoding so a hostile file cannot exhaust memory.
    #[error("image {url}: {width}x{height} exceeds the {budget}-pixel budget")]
    TooManyPixels {
        url: String,
        width: u32,
        height: u32,
        budget: u64,
    },
}

impl ImageSkip {
    /// `true` for deliberate filter rejections (the image was fine, just not
    /// wanted), `false` for failures (download, decode, pixel budget).
    pub fn is_rejection(&self) -> bool {
        matches!(self, ImageSkip::TooFewBytes { .. } | ImageSkip::TooSmall { .. })
    }

    /// The URL of the candidate this skip refers to.
    pub fn url(&self) -> &str {
        match self {
            ImageSkip::FetchFailed { url, .. }
            | ImageSkip::DecodeFailed { url, .. }
            | ImageSkip::TooFewBytes { url, .. }
            | ImageSkip::TooSmall { url, .. }
            | ImageSkip::TooManyPixels { url, .. } => url,
        }
    }
}

/// A transport-level failure for a single GET, as reported by a
/// [`crate::transport::Fetcher`] implementation.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error("HTTP status {status}")]
    Status { status: u16 },

    /// The request exceeded the configured timeout.
    #[error("timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Connection-level failure (DNS, TLS, reset, malformed response).
    #[error("{0}")]
    Transport(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_images_accepted_display() {
        let e = ScrapeError::NoImagesAccepted { candidates: 12 };
        let msg = e.to_string();
        assert!(msg.contains("12"), "got: {msg}");
        assert!(msg.contains("--min-bytes"));
    }

    #[test]
    fn page_fetch_failed_display() {
        let e = ScrapeError::PageFetchFailed {
            url: "https://chapters.example.com/ch5".into(),
            reason: "HTTP status 503".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("ch5"));
        assert!(msg.contains("503"));
    }

    #[test]
    fn too_small_display() {
        let e = ImageSkip::TooSmall {
            url: "https://cdn.example.com/spacer.gif".into(),
            width: 1,
            height: 1,
            min: 100,
        };
        let msg = e.to_string();
        assert!(msg.contains("1x1"));
        assert!(msg.contains("100px"));
    }

    #[test]
    fn skip_classification() {
        let reject = ImageSkip::TooFewBytes {
            url: "u".into(),
            len: 40,
            min: 1000,
        };
        let fail = ImageSkip::FetchFailed {
            url: "u".into(),
            reason: "HTTP status 404".into(),
        };
        let bomb = ImageSkip::TooManyPixels {
            url: "u".into(),
            width: 80_000,
            height: 80_000,
            budget: 178_956_970,
        };
        assert!(reject.is_rejection());
        assert!(!fail.is_rejection());
        assert!(!bomb.is_rejection());
    }

    #[test]
    fn fetch_error_display() {
        assert_eq!(FetchError::Status { status: 404 }.to_string(), "HTTP status 404");
        assert!(FetchError::Timeout { secs: 10 }.to_string().contains("10s"));
    }
}
