//! Block-page detection and article text extraction.
//!
//! The block detector is a coarse, false-negative-tolerant heuristic: it only
//! recognizes challenge pages whose text contains one of a small set of
//! marker phrases. It runs on the article fetch, never the listing fetch.
//!
//! Container selection tries an ordered list of selectors from most specific
//! (explicit article-body markers) to least specific (a bare `article` tag),
//! first match wins. The specific selectors keep navigation and sidebar
//! chrome out of the extraction; the generic fallback keeps the operation
//! degrading gracefully when the site's markup shifts.

use crate::error::{DigestError, Result};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

/// Container candidates, most specific first.
static CONTAINER_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "[data-article-body]",
        "div.tm-article-body",
        "div.tm-article-presenter__content",
        "div.article-formatted-body",
        "article",
    ]
    .iter()
    .map(|s| Selector::parse(s).expect("valid selector"))
    .collect()
});

/// Block-level tags that make up the readable body, in the order they are
/// collected from the container.
static BLOCK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1, h2, h3, p, li, pre, blockquote, figcaption").expect("valid selector"));

/// Does the page look like a CAPTCHA/access-restriction interstitial?
///
/// Scans the lowercased text of the whole document for any marker phrase.
/// Markers are site-specific and configurable; they must be lowercase.
pub fn looks_blocked(html: &str, markers: &[String]) -> bool {
    let document = Html::parse_document(html);
    let text = document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    markers.iter().any(|marker| text.contains(marker.as_str()))
}

/// Pick the article's main content region: first matching candidate wins.
pub fn pick_container(document: &Html) -> Option<ElementRef<'_>> {
    CONTAINER_SELECTORS
        .iter()
        .find_map(|selector| document.select(selector).next())
}

/// Linearize a container into plain text.
///
/// Walks the block-level tags in document order, keeps each tag's visible
/// text with internal line breaks preserved, drops empty blocks, and joins
/// the rest with blank lines.
pub fn linearize(container: ElementRef<'_>) -> String {
    let mut blocks = Vec::new();
    for element in container.select(&BLOCK_SELECTOR) {
        let text = element
            .text()
            .map(str::trim)
            .filter(|piece| !piece.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        if !text.is_empty() {
            blocks.push(text);
        }
    }
    blocks.join("\n\n")
}

/// Extract the article body from a fetched page.
///
/// Both failure modes — no container matched, and a matched container that
/// yields no text — are [`DigestError::ContentExtraction`]; the caller dumps
/// the raw page for offline inspection in either case.
pub fn extract_text(html: &str) -> Result<String> {
    let document = Html::parse_document(html);
    let container = pick_container(&document).ok_or_else(|| {
        DigestError::ContentExtraction("no article container matched".to_string())
    })?;
    let text = linearize(container);
    if text.is_empty() {
        return Err(DigestError::ContentExtraction(
            "container matched but produced no text".to_string(),
        ));
    }
    Ok(text)
}
