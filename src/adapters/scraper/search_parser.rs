use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use crate::domain::listing::Listing;
use crate::error::{CraigslistError, Result};

const RESULTS_CONTAINER: &str = "ol.cl-static-search-results";
const RESULT_ITEM: &str = "li.cl-static-search-result";
const RESULT_LINK: &str = "a[href]";

/// Extract unfetched listings from a search-results page, in page order.
///
/// A page without the results container is a markup change and fails; a
/// container with no result items is a search that matched nothing.
pub fn parse_search_results(html: &str, page_url: &str) -> Result<Vec<Listing>> {
    let document = Html::parse_document(html);
    let container_sel = selector(RESULTS_CONTAINER)?;
    let item_sel = selector(RESULT_ITEM)?;
    let link_sel = selector(RESULT_LINK)?;

    let container = document
        .select(&container_sel)
        .next()
        .ok_or_else(|| CraigslistError::Parse {
            reason: format!("search results container '{RESULTS_CONTAINER}' not found"),
        })?;

    let base = Url::parse(page_url).ok();
    let mut listings = Vec::new();

    for (idx, item) in container.select(&item_sel).enumerate() {
        let href = item
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| CraigslistError::Parse {
                reason: format!("search result {idx} has no listing link"),
            })?;

        let url = resolve_href(base.as_ref(), href)?;
        debug!(url, "Found search result");
        listings.push(Listing::new(url));
    }

    debug!(count = listings.len(), "Parsed search results");
    Ok(listings)
}

fn resolve_href(base: Option<&Url>, href: &str) -> Result<String> {
    if let Ok(absolute) = Url::parse(href) {
        return Ok(absolute.to_string());
    }
    let base = base.ok_or_else(|| CraigslistError::Parse {
        reason: format!("relative result link '{href}' on a page without a base url"),
    })?;
    Ok(base.join(href)?.to_string())
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| CraigslistError::Parse {
        reason: format!("invalid CSS selector '{css}': {e}"),
    })
}
