//! Asset fetching: candidate URLs in, screened RGB images out.
//!
//! Candidates are downloaded strictly in order, one at a time. Each body
//! climbs a screening ladder before it is accepted:
//!
//! 1. byte-size floor, rejecting tracking pixels and error pages before any
//!    decode is attempted
//! 2. header-only dimension probe against the pixel budget, so a hostile
//!    file that declares absurd dimensions never reaches the allocator
//! 3. full decode, normalised to 8-bit RGB
//! 4. dimension floor, rejecting icons and ad thumbnails
//!
//! A candidate that fails any rung is recorded as an [`ImageSkip`] and the
//! loop moves on; nothing a single image does can abort the batch. Accepted
//! images keep their candidate index so downstream stages and the optional
//! PNG persistence can refer to the original document order.

use crate::config::ScrapeConfig;
use crate::error::{ImageSkip, ScrapeError};
use crate::transport::Fetcher;
use image::{ImageReader, RgbImage};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One accepted image, tagged with where it came from.
#[derive(Debug)]
pub struct FetchedImage {
    /// 0-based index into the candidate list. Gaps appear where candidates
    /// were skipped.
    pub index: usize,
    /// The URL the bytes were fetched from.
    pub url: String,
    /// The decoded raster, always 8-bit RGB.
    pub image: RgbImage,
}

/// Everything the fetch stage has to say about a run.
#[derive(Debug)]
pub struct FetchSummary {
    /// Accepted images, in candidate order.
    pub images: Vec<FetchedImage>,
    /// Every dropped candidate with its reason, in candidate order.
    pub skips: Vec<ImageSkip>,
}

impl FetchSummary {
    /// Candidates dropped by a deliberate filter.
    pub fn rejected(&self) -> usize {
        self.skips.iter().filter(|s| s.is_rejection()).count()
    }

    /// Candidates dropped by a failure.
    pub fn failed(&self) -> usize {
        self.skips.iter().filter(|s| !s.is_rejection()).count()
    }
}

/// Download and screen every candidate, in order.
///
/// Only two conditions are fatal: the `--save-images` directory cannot be
/// created, or (decided by the caller) the summary comes back empty.
pub async fn download_images(
    fetcher: &Arc<dyn Fetcher>,
    urls: &[String],
    config: &ScrapeConfig,
) -> Result<FetchSummary, ScrapeError> {
    info!("Downloading {} images", urls.len());

    if let Some(ref dir) = config.save_dir {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| ScrapeError::SaveDirFailed {
                path: dir.clone(),
                source: e,
            })?;
    }

    let total = urls.len();
    let mut images = Vec::new();
    let mut skips = Vec::new();

    for (idx, url) in urls.iter().enumerate() {
        if let Some(ref cb) = config.progress_callback {
            cb.on_image_start(idx + 1, total);
        }

        let outcome = match fetcher.get(url).await {
            Ok(body) => screen_candidate(url, &body, config),
            Err(e) => Err(ImageSkip::FetchFailed {
                url: url.clone(),
                reason: e.to_string(),
            }),
        };

        let image = match outcome {
            Ok(image) => image,
            Err(skip) => {
                if skip.is_rejection() {
                    info!("Skipping {}", skip);
                } else {
                    warn!("{}", skip);
                }
                if let Some(ref cb) = config.progress_callback {
                    cb.on_image_skip(idx + 1, total, skip.to_string());
                }
                skips.push(skip);
                continue;
            }
        };

        let (width, height) = image.dimensions();
        info!("Downloaded image {}/{} ({}x{})", idx + 1, total, width, height);
        if let Some(ref cb) = config.progress_callback {
            cb.on_image_complete(idx + 1, total, width, height);
        }

        if let Some(ref dir) = config.save_dir {
            save_image(dir, idx, &image);
        }

        images.push(FetchedImage {
            index: idx,
            url: url.clone(),
            image,
        });
    }

    Ok(FetchSummary { images, skips })
}

/// Run one body up the screening ladder.
///
/// Pure function; the transport is already out of the picture, so the unit
/// tests feed it crafted byte buffers directly.
pub(crate) fn screen_candidate(
    url: &str,
    bytes: &[u8],
    config: &ScrapeConfig,
) -> Result<RgbImage, ImageSkip> {
    if bytes.len() < config.min_bytes {
        return Err(ImageSkip::TooFewBytes {
            url: url.to_string(),
            len: bytes.len(),
            min: config.min_bytes,
        });
    }

    // The reader peels dimensions out of the header without touching pixel
    // data, which is what makes the budget check safe to run first.
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ImageSkip::DecodeFailed {
            url: url.to_string(),
            detail: e.to_string(),
        })?;
    let (width, height) = reader.into_dimensions().map_err(|e| ImageSkip::DecodeFailed {
        url: url.to_string(),
        detail: e.to_string(),
    })?;
    if u64::from(width) * u64::from(height) > config.max_pixels {
        return Err(ImageSkip::TooManyPixels {
            url: url.to_string(),
            width,
            height,
            budget: config.max_pixels,
        });
    }

    let decoded = image::load_from_memory(bytes).map_err(|e| ImageSkip::DecodeFailed {
        url: url.to_string(),
        detail: e.to_string(),
    })?;
    let rgb = decoded.to_rgb8();

    if rgb.width() < config.min_dimension || rgb.height() < config.min_dimension {
        return Err(ImageSkip::TooSmall {
            url: url.to_string(),
            width: rgb.width(),
            height: rgb.height(),
            min: config.min_dimension,
        });
    }

    Ok(rgb)
}

/// Persist one accepted image under its candidate index.
///
/// A write failure costs the file, not the run.
fn save_image(dir: &Path, index: usize, image: &RgbImage) {
    let path = dir.join(format!("{index:03}.png"));
    match image.save_with_format(&path, image::ImageFormat::Png) {
        Ok(()) => debug!("Saved {}", path.display()),
        Err(e) => warn!("Failed to save {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Serves canned bodies; any URL not in the map 404s.
    struct CannedFetcher {
        bodies: HashMap<String, Vec<u8>>,
    }

    #[async_trait]
    impl Fetcher for CannedFetcher {
        async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            self.bodies
                .get(url)
                .cloned()
                .ok_or(FetchError::Status { status: 404 })
        }
    }

    fn fetcher_with(pairs: Vec<(&str, Vec<u8>)>) -> Arc<dyn Fetcher> {
        Arc::new(CannedFetcher {
            bodies: pairs
                .into_iter()
                .map(|(url, body)| (url.to_string(), body))
                .collect(),
        })
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 251) as u8, (y % 241) as u8, ((x + y) % 253) as u8])
        });
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    fn config() -> ScrapeConfig {
        ScrapeConfig::builder("https://chapters.example.com/ch1")
            .min_bytes(1)
            .build()
            .unwrap()
    }

    // ── screen_candidate ──────────────────────────────────────────────────

    #[test]
    fn accepts_a_normal_image() {
        let rgb = screen_candidate("u", &png_bytes(200, 300), &config()).unwrap();
        assert_eq!(rgb.dimensions(), (200, 300));
    }

    #[test]
    fn byte_floor_fires_before_any_decode() {
        // 500 bytes of garbage: if the decoder ran first this would be a
        // DecodeFailed, not a TooFewBytes.
        let cfg = ScrapeConfig::builder("https://x.example/a").build().unwrap();
        let err = screen_candidate("u", &vec![0xAB; 500], &cfg).unwrap_err();
        assert!(matches!(err, ImageSkip::TooFewBytes { len: 500, min: 1000, .. }));
    }

    #[test]
    fn rejects_undecodable_bodies() {
        let err = screen_candidate("u", &vec![0xAB; 4000], &config()).unwrap_err();
        assert!(matches!(err, ImageSkip::DecodeFailed { .. }));
    }

    #[test]
    fn rejects_either_dimension_below_the_floor() {
        let narrow = screen_candidate("u", &png_bytes(64, 400), &config()).unwrap_err();
        assert!(matches!(narrow, ImageSkip::TooSmall { width: 64, .. }));

        let short = screen_candidate("u", &png_bytes(400, 64), &config()).unwrap_err();
        assert!(matches!(short, ImageSkip::TooSmall { height: 64, .. }));

        // Exactly at the floor passes.
        assert!(screen_candidate("u", &png_bytes(100, 100), &config()).is_ok());
    }

    #[test]
    fn rejects_images_over_the_pixel_budget() {
        let cfg = ScrapeConfig::builder("https://x.example/a")
            .min_bytes(1)
            .max_pixels(10_000)
            .build()
            .unwrap();
        let err = screen_candidate("u", &png_bytes(200, 300), &cfg).unwrap_err();
        assert!(matches!(
            err,
            ImageSkip::TooManyPixels { width: 200, height: 300, budget: 10_000, .. }
        ));
    }

    #[test]
    fn normalises_alpha_images_to_rgb() {
        let rgba = image::RgbaImage::from_pixel(150, 150, image::Rgba([10, 20, 30, 128]));
        let mut buf = Vec::new();
        rgba.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();

        let rgb = screen_candidate("u", &buf, &config()).unwrap();
        assert_eq!(rgb.get_pixel(0, 0), &image::Rgb([10, 20, 30]));
    }

    // ── download_images ───────────────────────────────────────────────────

    #[tokio::test]
    async fn skips_rejects_and_keeps_order() {
        // Five candidates: 2 filter rejections in the middle of the pack.
        let urls: Vec<String> = (0..5)
            .map(|i| format!("https://cdn.example.com/{i}.png"))
            .collect();
        let fetcher = fetcher_with(vec![
            ("https://cdn.example.com/0.png", png_bytes(300, 400)),
            ("https://cdn.example.com/1.png", vec![0x47, 0x49, 0x46]), // 3 bytes
            ("https://cdn.example.com/2.png", png_bytes(310, 410)),
            ("https://cdn.example.com/3.png", png_bytes(40, 40)),
            ("https://cdn.example.com/4.png", png_bytes(320, 420)),
        ]);
        let cfg = ScrapeConfig::builder("https://chapters.example.com/ch1")
            .min_bytes(100)
            .build()
            .unwrap();

        let summary = download_images(&fetcher, &urls, &cfg).await.unwrap();

        let indices: Vec<usize> = summary.images.iter().map(|i| i.index).collect();
        assert_eq!(indices, vec![0, 2, 4]);
        assert_eq!(summary.rejected(), 2);
        assert_eq!(summary.failed(), 0);
    }

    #[tokio::test]
    async fn a_failed_download_does_not_abort_the_batch() {
        let urls = vec![
            "https://cdn.example.com/gone.png".to_string(),
            "https://cdn.example.com/ok.png".to_string(),
        ];
        let fetcher = fetcher_with(vec![("https://cdn.example.com/ok.png", png_bytes(200, 200))]);

        let summary = download_images(&fetcher, &urls, &config()).await.unwrap();

        assert_eq!(summary.images.len(), 1);
        assert_eq!(summary.images[0].index, 1);
        assert_eq!(summary.failed(), 1);
        assert!(matches!(summary.skips[0], ImageSkip::FetchFailed { .. }));
    }

    #[tokio::test]
    async fn persistence_names_files_by_candidate_index() {
        let dir = tempfile::tempdir().unwrap();
        let urls = vec![
            "https://cdn.example.com/0.png".to_string(),
            "https://cdn.example.com/1.png".to_string(),
            "https://cdn.example.com/2.png".to_string(),
        ];
        // Middle candidate 404s, so its index must be missing on disk.
        let fetcher = fetcher_with(vec![
            ("https://cdn.example.com/0.png", png_bytes(200, 200)),
            ("https://cdn.example.com/2.png", png_bytes(210, 210)),
        ]);
        let cfg = ScrapeConfig::builder("https://chapters.example.com/ch1")
            .min_bytes(1)
            .save_dir(dir.path())
            .build()
            .unwrap();

        let summary = download_images(&fetcher, &urls, &cfg).await.unwrap();

        assert_eq!(summary.images.len(), 2);
        assert!(dir.path().join("000.png").exists());
        assert!(!dir.path().join("001.png").exists());
        assert!(dir.path().join("002.png").exists());
    }

    #[tokio::test]
    async fn unreachable_save_dir_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let cfg = ScrapeConfig::builder("https://chapters.example.com/ch1")
            .save_dir(blocker.join("sub"))
            .build()
            .unwrap();
        let fetcher = fetcher_with(vec![]);

        let err = download_images(&fetcher, &[], &cfg).await.unwrap_err();
        assert!(matches!(err, ScrapeError::SaveDirFailed { .. }));
    }
}
