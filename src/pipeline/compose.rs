//! Page composition: accepted images in, page canvases out.
//!
//! Images are stacked vertically, in order, onto white canvases. A page is
//! cut whenever adding the next image would push the stack past the height
//! cap, unless the page is still empty, so a single over-tall image gets a
//! page of its own rather than being dropped or split. Every canvas is as
//! wide as the widest accepted image; narrower images keep their size and
//! leave white margin on the right.
//!
//! ## Why spawn_blocking?
//!
//! A full page canvas at the default cap is 800 x 60 000 RGB, roughly
//! 140 MB of pixels to allocate, fill and copy into. That is CPU work with
//! no await points, so it runs on the blocking pool instead of stalling a
//! runtime worker.

use crate::config::ScrapeConfig;
use crate::error::ScrapeError;
use crate::pipeline::fetch::FetchedImage;
use image::{imageops, Rgb, RgbImage};
use std::ops::Range;
use tracing::info;

const PAGE_BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Stack `images` into height-capped pages.
///
/// Consumes the fetched images; their rasters move into the page canvases.
pub async fn compose_pages(
    images: Vec<FetchedImage>,
    config: &ScrapeConfig,
) -> Result<Vec<RgbImage>, ScrapeError> {
    let max_height = config.max_page_height;
    let default_width = config.page_width;

    tokio::task::spawn_blocking(move || compose_pages_blocking(images, max_height, default_width))
        .await
        .map_err(|e| ScrapeError::Internal(format!("Compose task panicked: {e}")))
}

/// Pagination disabled: every accepted image is its own page at native size.
pub fn single_image_pages(images: Vec<FetchedImage>) -> Vec<RgbImage> {
    images.into_iter().map(|f| f.image).collect()
}

fn compose_pages_blocking(
    images: Vec<FetchedImage>,
    max_height: u32,
    default_width: u32,
) -> Vec<RgbImage> {
    let rasters: Vec<RgbImage> = images.into_iter().map(|f| f.image).collect();
    let width = rasters
        .iter()
        .map(|img| img.width())
        .max()
        .unwrap_or(default_width);
    let heights: Vec<u32> = rasters.iter().map(|img| img.height()).collect();
    let plan = plan_pages(&heights, max_height);

    info!(
        "Composing {} images into {} pages at {}px wide",
        rasters.len(),
        plan.len(),
        width
    );

    plan.into_iter()
        .map(|range| render_page(&rasters[range], width))
        .collect()
}

/// Greedy packing: walk the heights in order, cut a page when the next image
/// would cross `max_height` and the page already holds something.
///
/// Returns contiguous index ranges, so order preservation holds by
/// construction.
pub(crate) fn plan_pages(heights: &[u32], max_height: u32) -> Vec<Range<usize>> {
    let mut pages = Vec::new();
    let mut start = 0usize;
    let mut stacked: u64 = 0;

    for (i, &h) in heights.iter().enumerate() {
        if stacked + u64::from(h) > u64::from(max_height) && i > start {
            pages.push(start..i);
            start = i;
            stacked = u64::from(h);
        } else {
            stacked += u64::from(h);
        }
    }
    if start < heights.len() {
        pages.push(start..heights.len());
    }
    pages
}

/// Paste one page's members top to bottom onto a white canvas.
fn render_page(members: &[RgbImage], width: u32) -> RgbImage {
    let height: u32 = members.iter().map(|img| img.height()).sum();
    let mut canvas = RgbImage::from_pixel(width, height, PAGE_BACKGROUND);

    let mut y = 0i64;
    for img in members {
        imageops::replace(&mut canvas, img, 0, y);
        y += i64::from(img.height());
    }
    canvas
}
