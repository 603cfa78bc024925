//! # chapter2pdf
//!
//! Scrape the images off a chapter webpage and bind them into a single PDF.
//!
//! ## Why this crate?
//!
//! Webcomics, manga mirrors and scanlation sites publish a chapter as one
//! long page of `<img>` tags. Reading that offline, or on an e-reader, means
//! collecting every image by hand and stitching them together. This crate
//! does the whole run in one shot: fetch the page, collect the image links
//! in reading order, screen out the ads and icons that ride along, stack
//! the survivors into tall pages, and bind them as a PDF.
//!
//! ## Pipeline Overview
//!
//! ```text
//! chapter URL
//!  │
//!  ├─ 1. Extract  every img src, resolved to absolute URLs, document order
//!  ├─ 2. Fetch    sequential downloads; byte/dimension screening; RGB decode
//!  ├─ 3. Compose  greedy stacking into height-capped page canvases
//!  └─ 4. Export   JPEG-in-PDF document, or per-page PNG fallback
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chapter2pdf::{scrape, ScrapeConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ScrapeConfig::builder("https://chapters.example.com/ch5")
//!         .output("chapter5.pdf")
//!         .build()?;
//!     let report = scrape(&config).await?;
//!     println!("{}", report.summary());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `chapter2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! chapter2pdf = { version = "0.3", default-features = false }
//! ```
//!
//! ## Testing your integration
//!
//! Every byte of network I/O goes through the [`Fetcher`] trait. Hand the
//! config an in-memory implementation and the whole pipeline, screening,
//! pagination and PDF writing included, runs without a socket:
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use chapter2pdf::{FetchError, Fetcher, ScrapeConfig};
//! use std::sync::Arc;
//!
//! struct Canned;
//!
//! #[async_trait]
//! impl Fetcher for Canned {
//!     async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
//!         Ok(format!("<img src=\"{url}/1.png\">").into_bytes())
//!     }
//! }
//!
//! let config = ScrapeConfig::builder("https://chapters.example.com/ch5")
//!     .fetcher(Arc::new(Canned))
//!     .build()
//!     .unwrap();
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod report;
pub mod scrape;
pub mod transport;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ScrapeConfig, ScrapeConfigBuilder, DEFAULT_USER_AGENT};
pub use error::{FetchError, ImageSkip, ScrapeError};
pub use progress::{NoopProgressCallback, ProgressCallback, ScrapeProgressCallback};
pub use report::{ExportOutcome, ScrapeReport};
pub use scrape::{list_image_urls, scrape, scrape_sync};
pub use transport::{Fetcher, HttpFetcher};
