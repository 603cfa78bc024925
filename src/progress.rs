//! Progress-callback trait for per-image scrape events.
//!
//! Inject an [`Arc<dyn ScrapeProgressCallback>`] via
//! [`crate::config::ScrapeConfigBuilder::progress_callback`] to receive
//! real-time events as the pipeline works through the candidate list.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a Tokio channel, a WebSocket, a database record, or a
//! terminal progress bar without the library knowing anything about how the
//! host application communicates. The trait is `Send + Sync` because the
//! pipeline future may migrate between runtime worker threads.
//!
//! # Example
//!
//! ```rust
//! use chapter2pdf::{ScrapeProgressCallback, ScrapeConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     downloaded: Arc<AtomicUsize>,
//! }
//!
//! impl ScrapeProgressCallback for CountingCallback {
//!     fn on_image_complete(&self, index: usize, total: usize, width: u32, height: u32) {
//!         self.downloaded.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("image {}/{} done ({}x{})", index, total, width, height);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     downloaded: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = ScrapeConfig::builder("https://chapters.example.com/ch5")
//!     .progress_callback(counter as Arc<dyn ScrapeProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the scrape pipeline as it downloads each candidate image.
///
/// Downloads run strictly in document order, so events for one image never
/// interleave with another's. All methods have default no-op implementations
/// so callers only override what they care about.
pub trait ScrapeProgressCallback: Send + Sync {
    /// Called once after link extraction, before any download.
    ///
    /// # Arguments
    /// * `total` — number of candidate URLs that will be attempted
    fn on_scrape_start(&self, total: usize) {
        let _ = total;
    }

    /// Called just before a candidate's GET is sent.
    ///
    /// # Arguments
    /// * `index` — 1-indexed candidate number
    /// * `total` — total candidates
    fn on_image_start(&self, index: usize, total: usize) {
        let _ = (index, total);
    }

    /// Called when a candidate is downloaded, decoded and accepted.
    ///
    /// # Arguments
    /// * `index`  — 1-indexed candidate number
    /// * `total`  — total candidates
    /// * `width`  — decoded width in pixels
    /// * `height` — decoded height in pixels
    fn on_image_complete(&self, index: usize, total: usize, width: u32, height: u32) {
        let _ = (index, total, width, height);
    }

    /// Called when a candidate is dropped (filter rejection or failure).
    ///
    /// # Arguments
    /// * `index`  — 1-indexed candidate number
    /// * `total`  — total candidates
    /// * `reason` — human-readable skip description
    fn on_image_skip(&self, index: usize, total: usize, reason: String) {
        let _ = (index, total, reason);
    }

    /// Called once after every candidate has been attempted.
    ///
    /// # Arguments
    /// * `total`    — total candidates
    /// * `accepted` — candidates that survived every filter
    fn on_scrape_complete(&self, total: usize, accepted: usize) {
        let _ = (total, accepted);
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl ScrapeProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ScrapeConfig`].
pub type ProgressCallback = Arc<dyn ScrapeProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TrackingCallback {
        starts: Arc<AtomicUsize>,
        completes: Arc<AtomicUsize>,
        skips: Arc<AtomicUsize>,
        started_total: Arc<AtomicUsize>,
        final_accepted: Arc<AtomicUsize>,
    }

    impl ScrapeProgressCallback for TrackingCallback {
        fn on_scrape_start(&self, total: usize) {
            self.started_total.store(total, Ordering::SeqCst);
        }

        fn on_image_start(&self, _index: usize, _total: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_image_complete(&self, _index: usize, _total: usize, _width: u32, _height: u32) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_image_skip(&self, _index: usize, _total: usize, _reason: String) {
            self.skips.fetch_add(1, Ordering::SeqCst);
        }

        fn on_scrape_complete(&self, _total: usize, accepted: usize) {
            self.final_accepted.store(accepted, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_scrape_start(5);
        cb.on_image_start(1, 5);
        cb.on_image_complete(1, 5, 800, 1200);
        cb.on_image_skip(2, 5, "too small".into());
        cb.on_scrape_complete(5, 4);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback {
            starts: Arc::new(AtomicUsize::new(0)),
            completes: Arc::new(AtomicUsize::new(0)),
            skips: Arc::new(AtomicUsize::new(0)),
            started_total: Arc::new(AtomicUsize::new(0)),
            final_accepted: Arc::new(AtomicUsize::new(0)),
        };

        tracker.on_scrape_start(3);
        assert_eq!(tracker.started_total.load(Ordering::SeqCst), 3);

        tracker.on_image_start(1, 3);
        tracker.on_image_complete(1, 3, 800, 1100);
        tracker.on_image_start(2, 3);
        tracker.on_image_skip(2, 3, "body is 120 bytes".into());
        tracker.on_image_start(3, 3);
        tracker.on_image_complete(3, 3, 780, 990);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.skips.load(Ordering::SeqCst), 1);

        tracker.on_scrape_complete(3, 2);
        assert_eq!(tracker.final_accepted.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn ScrapeProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_scrape_start(10);
        cb.on_image_start(1, 10);
        cb.on_image_complete(1, 10, 640, 480);
    }
}
