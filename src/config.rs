//! Configuration types for a chapter scrape.
//!
//! All run behaviour is controlled through [`ScrapeConfig`], built via its
//! [`ScrapeConfigBuilder`]. Keeping every knob in one struct makes it trivial
//! to share configs across threads, log them, and diff two runs to understand
//! why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A fifteen-field constructor is unreadable and breaks on every new field.
//! The builder pattern lets callers set only what they care about and rely on
//! well-documented defaults for the rest. The one argument every run needs,
//! the chapter URL, is the builder's single required parameter.

use crate::error::ScrapeError;
use crate::progress::ProgressCallback;
use crate::transport::Fetcher;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default User-Agent header, a desktop Chrome string.
///
/// Many image CDNs answer a bare `reqwest` UA with 403 or a placeholder
/// image. Presenting as a mainstream browser keeps them honest. Override
/// with [`ScrapeConfigBuilder::user_agent`] if a site demands otherwise.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Configuration for one chapter scrape.
///
/// Built via [`ScrapeConfig::builder()`].
///
/// # Example
/// ```rust
/// use chapter2pdf::ScrapeConfig;
///
/// let config = ScrapeConfig::builder("https://chapters.example.com/ch5")
///     .output("chapter5.pdf")
///     .min_dimension(200)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ScrapeConfig {
    /// URL of the chapter page whose `<img>` links are collected.
    pub page_url: String,

    /// Path of the PDF to write. Default: `chapter.pdf`.
    ///
    /// Fallback page images land next to it as `{stem}_page_{N}.png` when the
    /// document itself cannot be written.
    pub output: PathBuf,

    /// User-Agent header sent with every request. Default: [`DEFAULT_USER_AGENT`].
    pub user_agent: String,

    /// Optional Referer header. Default: none.
    ///
    /// Image CDNs that hotlink-protect their files usually accept the chapter
    /// page's own URL here.
    pub referer: Option<String>,

    /// Per-request timeout in seconds. Default: 10.
    pub timeout_secs: u64,

    /// Minimum body size in bytes for a candidate to be considered. Default: 1000.
    ///
    /// Tracking pixels, spacer GIFs and error pages served as 200 are almost
    /// always under a kilobyte; real chapter images are tens of kilobytes and
    /// up. Screening on size rejects the junk before a decode is attempted.
    pub min_bytes: usize,

    /// Minimum width AND height in pixels for an accepted image. Default: 100.
    ///
    /// Icons, rating stars and ad thumbnails decode fine but are not content.
    /// Both dimensions must reach the floor.
    pub min_dimension: u32,

    /// Maximum `width * height` an encoded image may declare. Default: 178 956 970.
    ///
    /// Read from the header before the pixel decode, so a hostile file that
    /// claims absurd dimensions is rejected before any large allocation.
    pub max_pixels: u64,

    /// Maximum height of a composed page in pixels. Default: 60 000.
    ///
    /// JPEG cannot encode a dimension above 65 535, so any page taller than
    /// that would force the run into the PNG fallback. The default leaves
    /// headroom under the format limit.
    pub max_page_height: u32,

    /// Page width when no image dictates one. Default: 800.
    ///
    /// Composed pages are as wide as the widest accepted image; this value
    /// only matters for the degenerate empty set.
    pub page_width: u32,

    /// JPEG quality for embedded page images, 1 to 100. Default: 85.
    pub jpeg_quality: u8,

    /// Resolution the PDF page geometry is derived at. Default: 100.
    ///
    /// A pixel maps to `72 / dpi` points, so 100 DPI renders a 800 px wide
    /// page as 576 pt, slightly narrower than US Letter.
    pub dpi: u32,

    /// Stack images into height-capped pages before export. Default: true.
    ///
    /// When off, every accepted image becomes its own PDF page at its native
    /// size.
    pub paginate: bool,

    /// Also write each accepted image as a PNG into this directory. Default: off.
    ///
    /// Files are named by candidate index (`000.png`, `001.png`, ...), so a
    /// skipped candidate leaves a visible gap instead of renumbering.
    pub save_dir: Option<PathBuf>,

    /// Observer notified as the run progresses. Default: none.
    pub progress_callback: Option<ProgressCallback>,

    /// Pre-constructed transport. Takes precedence over the built-in
    /// reqwest client; tests inject in-memory fakes here.
    pub fetcher: Option<Arc<dyn Fetcher>>,
}

impl fmt::Debug for ScrapeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrapeConfig")
            .field("page_url", &self.page_url)
            .field("output", &self.output)
            .field("user_agent", &self.user_agent)
            .field("referer", &self.referer)
            .field("timeout_secs", &self.timeout_secs)
            .field("min_bytes", &self.min_bytes)
            .field("min_dimension", &self.min_dimension)
            .field("max_pixels", &self.max_pixels)
            .field("max_page_height", &self.max_page_height)
            .field("page_width", &self.page_width)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("dpi", &self.dpi)
            .field("paginate", &self.paginate)
            .field("save_dir", &self.save_dir)
            .field("fetcher", &self.fetcher.as_ref().map(|_| "<dyn Fetcher>"))
            .finish()
    }
}

impl ScrapeConfig {
    /// Create a builder for a scrape of `page_url`, with every other field at
    /// its default.
    pub fn builder(page_url: impl Into<String>) -> ScrapeConfigBuilder {
        ScrapeConfigBuilder {
            config: ScrapeConfig {
                page_url: page_url.into(),
                output: PathBuf::from("chapter.pdf"),
                user_agent: DEFAULT_USER_AGENT.to_string(),
                referer: None,
                timeout_secs: 10,
                min_bytes: 1000,
                min_dimension: 100,
                max_pixels: 178_956_970,
                max_page_height: 60_000,
                page_width: 800,
                jpeg_quality: 85,
                dpi: 100,
                paginate: true,
                save_dir: None,
                progress_callback: None,
                fetcher: None,
            },
        }
    }
}

/// Builder for [`ScrapeConfig`].
pub struct ScrapeConfigBuilder {
    config: ScrapeConfig,
}

impl ScrapeConfigBuilder {
    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output = path.into();
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn referer(mut self, referer: impl Into<String>) -> Self {
        self.config.referer = Some(referer.into());
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs.max(1);
        self
    }

    pub fn min_bytes(mut self, n: usize) -> Self {
        self.config.min_bytes = n;
        self
    }

    pub fn min_dimension(mut self, px: u32) -> Self {
        self.config.min_dimension = px;
        self
    }

    pub fn max_pixels(mut self, budget: u64) -> Self {
        self.config.max_pixels = budget.max(1);
        self
    }

    pub fn max_page_height(mut self, px: u32) -> Self {
        self.config.max_page_height = px.max(1);
        self
    }

    pub fn page_width(mut self, px: u32) -> Self {
        self.config.page_width = px.max(1);
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q.clamp(1, 100);
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(18, 600);
        self
    }

    pub fn paginate(mut self, v: bool) -> Self {
        self.config.paginate = v;
        self
    }

    pub fn save_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.save_dir = Some(dir.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.config.fetcher = Some(fetcher);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ScrapeConfig, ScrapeError> {
        let c = &self.config;
        if c.page_url.trim().is_empty() {
            return Err(ScrapeError::InvalidConfig("Page URL is empty".into()));
        }
        let parsed = url::Url::parse(c.page_url.trim()).map_err(|e| {
            ScrapeError::InvalidConfig(format!("Page URL '{}' is not a URL: {e}", c.page_url))
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ScrapeError::InvalidConfig(format!(
                "Page URL must be http or https, got '{}'",
                parsed.scheme()
            )));
        }
        if c.output.as_os_str().is_empty() {
            return Err(ScrapeError::InvalidConfig("Output path is empty".into()));
        }
        if c.jpeg_quality == 0 || c.jpeg_quality > 100 {
            return Err(ScrapeError::InvalidConfig(format!(
                "JPEG quality must be 1-100, got {}",
                c.jpeg_quality
            )));
        }
        if c.max_page_height == 0 {
            return Err(ScrapeError::InvalidConfig(
                "Max page height must be at least 1 pixel".into(),
            ));
        }
        Ok(self.config)
    }
}
