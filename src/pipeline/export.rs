//! Document export: page canvases in, one PDF out, with a PNG fallback.
//!
//! Each page canvas is JPEG-encoded at the configured quality and embedded
//! as a DCTDecode image XObject on its own PDF page. Page geometry maps one
//! pixel to `72 / dpi` points, so the document prints at the configured
//! resolution. The file is written to a temporary sibling and renamed over
//! the output path, so a crash mid-write never leaves a truncated PDF
//! behind.
//!
//! If anything in that chain fails (a canvas taller than JPEG's 65 535 px
//! limit, a full disk), the stage falls back to writing every page as
//! `{stem}_page_{N}.png` next to the output. Individual fallback failures
//! are logged and skipped; only a fallback that writes nothing at all comes
//! back as an error, because then the run has produced no output to point
//! the user at.

use crate::config::ScrapeConfig;
use crate::error::ScrapeError;
use crate::report::ExportOutcome;
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Resource name of the single image each page draws.
const IMAGE_NAME: Name<'static> = Name(b"Im1");

/// What broke while producing the document. Never escapes this module; a
/// document failure turns into the PNG fallback, not an error.
#[derive(Debug, Error)]
enum ExportError {
    #[error("JPEG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Task(String),
}

/// Write `pages` as one PDF at the configured output path.
///
/// Returns which of the three outcomes happened: document written, fallback
/// images written, or nothing to write.
pub async fn export_document(
    pages: Vec<RgbImage>,
    config: &ScrapeConfig,
) -> Result<ExportOutcome, ScrapeError> {
    if pages.is_empty() {
        warn!("No pages to export");
        return Ok(ExportOutcome::NothingWritten);
    }

    let page_count = pages.len();
    let output = config.output.clone();
    info!("Saving {} pages as PDF: {}", page_count, output.display());

    // Both the document attempt and the fallback need the canvases, so they
    // are shared rather than moved into the first blocking task.
    let pages = Arc::new(pages);

    match write_pdf(Arc::clone(&pages), &output, config.jpeg_quality, config.dpi).await {
        Ok(()) => Ok(ExportOutcome::Document {
            path: output,
            pages: page_count,
        }),
        Err(e) => {
            warn!(
                "Could not write PDF ({}); falling back to per-page PNG files",
                e
            );
            let (written, failed) = write_fallback_images(pages, &output).await?;
            if written == 0 {
                return Err(ScrapeError::ExportFailed {
                    path: output,
                    pages: page_count,
                    detail: e.to_string(),
                });
            }
            Ok(ExportOutcome::FallbackImages { written, failed })
        }
    }
}

/// Render the document on the blocking pool, then write it atomically.
async fn write_pdf(
    pages: Arc<Vec<RgbImage>>,
    output: &Path,
    quality: u8,
    dpi: u32,
) -> Result<(), ExportError> {
    let bytes = tokio::task::spawn_blocking(move || render_pdf(&pages, quality, dpi))
        .await
        .map_err(|e| ExportError::Task(format!("Export task panicked: {e}")))??;

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    // Atomic write: temp sibling, then rename.
    let tmp_path = output.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, &bytes).await?;
    tokio::fs::rename(&tmp_path, output).await?;
    Ok(())
}

/// Serialise all pages into PDF bytes.
fn render_pdf(pages: &[RgbImage], quality: u8, dpi: u32) -> Result<Vec<u8>, ExportError> {
    // One pixel maps to 72/dpi points.
    let scale = 72.0 / dpi as f32;

    let mut next_id = 1;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();

    struct PageObjects {
        page_id: Ref,
        content_id: Ref,
        image_id: Ref,
        jpeg: Vec<u8>,
        width: u32,
        height: u32,
    }

    let mut objects = Vec::with_capacity(pages.len());
    for page in pages {
        objects.push(PageObjects {
            page_id: alloc(),
            content_id: alloc(),
            image_id: alloc(),
            jpeg: encode_jpeg(page, quality)?,
            width: page.width(),
            height: page.height(),
        });
    }

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(objects.iter().map(|o| o.page_id))
        .count(objects.len() as i32);

    for obj in &objects {
        let w_pt = obj.width as f32 * scale;
        let h_pt = obj.height as f32 * scale;

        {
            let mut xobj = pdf.image_xobject(obj.image_id, &obj.jpeg);
            xobj.filter(Filter::DctDecode);
            xobj.width(obj.width as i32);
            xobj.height(obj.height as i32);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
        }

        // The unit square scaled up to the media box: the image covers the
        // page exactly.
        let mut content = Content::new();
        content.save_state();
        content.transform([w_pt, 0.0, 0.0, h_pt, 0.0, 0.0]);
        content.x_object(IMAGE_NAME);
        content.restore_state();
        pdf.stream(obj.content_id, &content.finish());

        let mut page = pdf.page(obj.page_id);
        page.media_box(Rect::new(0.0, 0.0, w_pt, h_pt))
            .parent(pages_id)
            .contents(obj.content_id);
        page.resources().x_objects().pair(IMAGE_NAME, obj.image_id);
    }

    Ok(pdf.finish())
}

fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut buf), quality);
    image.write_with_encoder(encoder)?;
    Ok(buf)
}

/// Write every page as `{stem}_page_{N}.png` next to the output path.
///
/// Returns `(written, failed)`.
async fn write_fallback_images(
    pages: Arc<Vec<RgbImage>>,
    output: &Path,
) -> Result<(usize, usize), ScrapeError> {
    let output = output.to_path_buf();
    tokio::task::spawn_blocking(move || write_fallback_blocking(&pages, &output))
        .await
        .map_err(|e| ScrapeError::Internal(format!("Fallback task panicked: {e}")))
}

fn write_fallback_blocking(pages: &[RgbImage], output: &Path) -> (usize, usize) {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "chapter".to_string());
    let dir = output.parent().map(Path::to_path_buf).unwrap_or_default();

    let mut written = 0;
    let mut failed = 0;
    for (i, page) in pages.iter().enumerate() {
        let path = dir.join(format!("{}_page_{}.png", stem, i + 1));
        match page.save_with_format(&path, image::ImageFormat::Png) {
            Ok(()) => {
                info!("Saved fallback page: {}", path.display());
                written += 1;
            }
            Err(e) => {
                warn!("Failed to save {}: {}", path.display(), e);
                failed += 1;
            }
        }
    }
    (written, failed)
}
