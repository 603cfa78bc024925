//! Pipeline stages for chapter scraping.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. a different export format) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! extract ──▶ fetch ──▶ compose ──▶ export
//! (img[src])  (filter)  (paginate)  (PDF / PNG fallback)
//! ```
//!
//! 1. [`extract`] — pull every `img` source off the chapter page and resolve
//!    it to an absolute URL, in document order
//! 2. [`fetch`]   — download each candidate, screen out ads and broken files,
//!    decode survivors to RGB
//! 3. [`compose`] — stack images into height-capped page canvases; runs in
//!    `spawn_blocking` because canvas work is CPU-bound
//! 4. [`export`]  — bind the pages into one PDF, or fall back to per-page
//!    PNG files when the document cannot be written
//!
//! Order is the contract: candidates, accepted images and document pages all
//! keep the source page's document order. Nothing reorders, nothing
//! deduplicates.

pub mod compose;
pub mod export;
pub mod extract;
pub mod fetch;
