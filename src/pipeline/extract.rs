//! Link extraction: chapter page HTML in, absolute image URLs out.
//!
//! The page is fetched once, parsed once, and discarded. Every `<img>`
//! element carrying a `src` attribute contributes one candidate, in document
//! order, duplicates included. Reachability, file type and size are someone
//! else's problem; deferring all validation to the fetch stage keeps this
//! stage a pure function over the HTML text.
//!
//! ## Why not filter here?
//!
//! A page author who repeats an image wants it twice, and a `src` pointing at
//! a dead CDN is indistinguishable from a live one without a request. The
//! only work that belongs here is turning whatever the page says into
//! something a HTTP client can GET.

use crate::error::ScrapeError;
use crate::transport::Fetcher;
use scraper::{Html, Selector};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Fetch `page_url` and return the absolute URL of every image on it.
///
/// A transport failure on the page itself is fatal; an empty result is not,
/// the caller decides what zero candidates means.
pub async fn extract_image_urls(
    fetcher: &Arc<dyn Fetcher>,
    page_url: &str,
) -> Result<Vec<String>, ScrapeError> {
    info!("Fetching image URLs from {}", page_url);

    let base = Url::parse(page_url).map_err(|e| {
        ScrapeError::InvalidConfig(format!("Page URL '{page_url}' is not a URL: {e}"))
    })?;

    let body = fetcher
        .get(page_url)
        .await
        .map_err(|e| ScrapeError::PageFetchFailed {
            url: page_url.to_string(),
            reason: e.to_string(),
        })?;

    // Chapter pages are overwhelmingly UTF-8; lossy conversion keeps the
    // ASCII-only attribute values we care about intact either way.
    let html = String::from_utf8_lossy(&body);
    let urls = collect_image_urls(&html, &base);
    debug!("Extracted {} candidate image URLs", urls.len());
    Ok(urls)
}

/// Parse `html` and collect every `img` source, resolved against `base`.
///
/// Pure function; the unit tests drive it with inline fragments.
pub fn collect_image_urls(html: &str, base: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let selector_img = Selector::parse("img").expect("img selector");

    let mut urls = Vec::new();
    for img in document.select(&selector_img) {
        let Some(raw) = img.value().attr("src") else {
            continue;
        };
        match normalize_image_url(raw, base) {
            Some(url) => urls.push(url),
            None => warn!("Skipping unresolvable image reference '{}'", raw.trim()),
        }
    }
    urls
}

/// Resolve one `src` value to an absolute URL.
///
/// Policy: protocol-relative references are completed with `https:` no
/// matter what scheme the page itself uses; references that already start
/// with `http://` or `https://` pass through untouched; everything else is
/// joined against the page URL per RFC 3986. Surrounding whitespace is
/// trimmed first.
fn normalize_image_url(raw: &str, base: &Url) -> Option<String> {
    let src = raw.trim();
    if src.is_empty() {
        return None;
    }
    if let Some(rest) = src.strip_prefix("//") {
        return Some(format!("https://{rest}"));
    }
    if src.starts_with("http://") || src.starts_with("https://") {
        return Some(src.to_string());
    }
    base.join(src).ok().map(|joined| joined.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(url: &str) -> Url {
        Url::parse(url).unwrap()
    }

    #[test]
    fn resolves_the_three_reference_forms_in_order() {
        let html = r#"
            <html><body>
                <img src="//cdn.example.com/a.jpg">
                <img src="/b.jpg">
                <img src="https://cdn.example.com/c.jpg">
            </body></html>
        "#;
        let urls = collect_image_urls(html, &base("https://site.example.com/ch1"));
        assert_eq!(
            urls,
            vec![
                "https://cdn.example.com/a.jpg",
                "https://site.example.com/b.jpg",
                "https://cdn.example.com/c.jpg",
            ]
        );
    }

    #[test]
    fn joins_relative_paths_against_the_page_directory() {
        let html = r#"<img src="pages/004.png">"#;
        let urls = collect_image_urls(html, &base("https://site.example.com/ch1/"));
        assert_eq!(urls, vec!["https://site.example.com/ch1/pages/004.png"]);
    }

    #[test]
    fn trims_whitespace_before_classifying() {
        let html = "<img src=\"  //cdn.example.com/a.jpg \">\n<img src=\" /b.jpg\t\">";
        let urls = collect_image_urls(html, &base("https://site.example.com/ch1"));
        assert_eq!(
            urls,
            vec![
                "https://cdn.example.com/a.jpg",
                "https://site.example.com/b.jpg",
            ]
        );
    }

    #[test]
    fn skips_img_without_src_and_empty_src() {
        let html = r#"
            <img alt="lazy loaded" data-src="https://cdn.example.com/real.jpg">
            <img src="">
            <img src="   ">
            <img src="https://cdn.example.com/kept.jpg">
        "#;
        let urls = collect_image_urls(html, &base("https://site.example.com/ch1"));
        assert_eq!(urls, vec!["https://cdn.example.com/kept.jpg"]);
    }

    #[test]
    fn keeps_duplicates_and_document_order() {
        let html = r#"
            <img src="https://cdn.example.com/1.png">
            <div><img src="https://cdn.example.com/2.png"></div>
            <img src="https://cdn.example.com/1.png">
        "#;
        let urls = collect_image_urls(html, &base("https://site.example.com/ch1"));
        assert_eq!(
            urls,
            vec![
                "https://cdn.example.com/1.png",
                "https://cdn.example.com/2.png",
                "https://cdn.example.com/1.png",
            ]
        );
    }

    #[test]
    fn protocol_relative_stays_https_even_on_http_pages() {
        let html = r#"<img src="//cdn.example.com/a.jpg">"#;
        let urls = collect_image_urls(html, &base("http://site.example.com/ch1"));
        assert_eq!(urls, vec!["https://cdn.example.com/a.jpg"]);
    }

    #[test]
    fn a_src_merely_starting_with_http_is_treated_as_relative() {
        // "http-cats/1.png" has no scheme; only a real http(s) prefix
        // passes through unchanged.
        let html = r#"<img src="http-cats/1.png">"#;
        let urls = collect_image_urls(html, &base("https://site.example.com/ch1/"));
        assert_eq!(urls, vec!["https://site.example.com/ch1/http-cats/1.png"]);
    }

    #[test]
    fn query_strings_survive_normalization() {
        let html = r#"<img src="/img?id=9&size=full">"#;
        let urls = collect_image_urls(html, &base("https://site.example.com/ch1"));
        assert_eq!(urls, vec!["https://site.example.com/img?id=9&size=full"]);
    }

    #[test]
    fn empty_page_yields_empty_list() {
        let urls = collect_image_urls("<html><body><p>text only</p></body></html>",
            &base("https://site.example.com/ch1"));
        assert!(urls.is_empty());
    }
}
