//! The result of a completed run: what was found, what was kept, what was
//! written where.
//!
//! [`ScrapeReport`] is the success value of [`crate::scrape`]. It is serde-
//! serialisable so the CLI's `--json` mode and any host application can log
//! or persist it verbatim.

use crate::error::ImageSkip;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the run's output ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportOutcome {
    /// The PDF was written whole.
    Document { path: PathBuf, pages: usize },

    /// The document could not be produced; individual page images were
    /// written instead. `failed` counts pages whose PNG also failed.
    FallbackImages { written: usize, failed: usize },

    /// There was nothing to write (empty page set).
    NothingWritten,
}

impl ExportOutcome {
    /// `true` when the run produced at least one file.
    pub fn wrote_something(&self) -> bool {
        match self {
            ExportOutcome::Document { .. } => true,
            ExportOutcome::FallbackImages { written, .. } => *written > 0,
            ExportOutcome::NothingWritten => false,
        }
    }
}

/// Summary of one scrape run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeReport {
    /// The chapter page that was scraped.
    pub page_url: String,

    /// Candidate image URLs extracted from the page.
    pub urls_found: usize,

    /// Candidates that survived every filter and went into the document.
    pub images_accepted: usize,

    /// Candidates dropped by a deliberate filter (size or dimension floor).
    pub images_rejected: usize,

    /// Candidates dropped by a failure (download, decode, pixel budget).
    pub images_failed: usize,

    /// Every skip, in candidate order, with its reason.
    pub skips: Vec<ImageSkip>,

    /// Pages the accepted images were composed into.
    pub pages: usize,

    /// What was written.
    pub export: ExportOutcome,

    /// Wall-clock duration of the whole run.
    pub total_duration_ms: u64,

    /// Time spent downloading and screening images.
    pub fetch_duration_ms: u64,

    /// Time spent composing page canvases.
    pub compose_duration_ms: u64,

    /// Time spent encoding and writing the output.
    pub export_duration_ms: u64,
}

impl ScrapeReport {
    /// One-line human summary, used by the CLI's closing line.
    pub fn summary(&self) -> String {
        let output = match &self.export {
            ExportOutcome::Document { path, pages } => {
                format!("{} ({} pages)", path.display(), pages)
            }
            ExportOutcome::FallbackImages { written, failed } => {
                format!("{written} fallback page images ({failed} failed)")
            }
            ExportOutcome::NothingWritten => "nothing written".to_string(),
        };
        format!(
            "{}/{} images accepted -> {}",
            self.images_accepted, self.urls_found, output
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> ScrapeReport {
        ScrapeReport {
            page_url: "https://chapters.example.com/ch5".into(),
            urls_found: 12,
            images_accepted: 10,
            images_rejected: 2,
            images_failed: 0,
            skips: vec![ImageSkip::TooSmall {
                url: "https://cdn.example.com/icon.png".into(),
                width: 32,
                height: 32,
                min: 100,
            }],
            pages: 3,
            export: ExportOutcome::Document {
                path: PathBuf::from("chapter.pdf"),
                pages: 3,
            },
            total_duration_ms: 4200,
            fetch_duration_ms: 3900,
            compose_duration_ms: 150,
            export_duration_ms: 120,
        }
    }

    #[test]
    fn report_roundtrips_through_json() {
        let report = sample_report();
        let json = serde_json::to_string(&report).unwrap();
        let back: ScrapeReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.urls_found, 12);
        assert_eq!(back.pages, 3);
        assert!(matches!(back.export, ExportOutcome::Document { pages: 3, .. }));
    }

    #[test]
    fn summary_mentions_counts_and_output() {
        let s = sample_report().summary();
        assert!(s.contains("10/12"), "got: {s}");
        assert!(s.contains("chapter.pdf"));
    }

    #[test]
    fn outcome_wrote_something() {
        assert!(ExportOutcome::Document {
            path: PathBuf::from("c.pdf"),
            pages: 1
        }
        .wrote_something());
        assert!(ExportOutcome::FallbackImages {
            written: 2,
            failed: 1
        }
        .wrote_something());
        assert!(!ExportOutcome::FallbackImages {
            written: 0,
            failed: 3
        }
        .wrote_something());
        assert!(!ExportOutcome::NothingWritten.wrote_something());
    }
}
