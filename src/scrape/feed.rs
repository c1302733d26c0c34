//! Latest-item locator for feed listing pages.
//!
//! The listing presents articles newest-first, so the first entry in document
//! order is the newest item. Its link href doubles as the item identity: a
//! stable path compared for equality against persisted state, never parsed.
//! Title text plays no part in identity.

use crate::error::{DigestError, Result};
use crate::models::ItemMeta;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

static ITEM_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("article.tm-articles-list__item").expect("valid selector"));
static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.tm-title__link").expect("valid selector"));

/// Extract the newest item from a feed listing page.
///
/// `base` is the listing URL; relative hrefs are resolved against it.
/// A listing with no entries, or an entry with no link, is a hard
/// [`DigestError::FeedParse`] — there is no partial or best-effort meta.
pub fn locate_latest(html: &str, base: &Url) -> Result<ItemMeta> {
    let document = Html::parse_document(html);

    let item = document.select(&ITEM_SELECTOR).next().ok_or_else(|| {
        DigestError::FeedParse("no article entries in the listing (markup changed or blocked)".to_string())
    })?;

    let link = item.select(&LINK_SELECTOR).next().ok_or_else(|| {
        DigestError::FeedParse("first listing entry has no title link".to_string())
    })?;

    let href = link
        .value()
        .attr("href")
        .filter(|h| !h.is_empty())
        .ok_or_else(|| DigestError::FeedParse("title link has no href".to_string()))?;

    let url = base
        .join(href)
        .map_err(|e| DigestError::FeedParse(format!("cannot resolve href {href:?}: {e}")))?;

    let title = link.text().collect::<String>().trim().to_string();
    debug!(id = href, %title, "located newest feed item");

    Ok(ItemMeta {
        id: href.to_string(),
        title,
        url: url.to_string(),
    })
}
