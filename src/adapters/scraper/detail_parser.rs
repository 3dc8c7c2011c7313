use std::collections::BTreeMap;

use scraper::{Html, Selector};
use tracing::debug;

use crate::domain::listing::ListingPage;
use crate::domain::normalize::{extract_id, format_price};
use crate::error::{CraigslistError, Result};

const QR_LABEL: &str = "p.print-qrcode-label";
const CANONICAL_URL: &str = r#"meta[property="og:url"]"#;
const PRICE: &str = "span.price";
const TITLE: &str = "span#titletextonly";
const DESCRIPTION: &str = "section#postingbody";
const ATTR_GROUP: &str = ".attrgroup";
const ATTR_ENTRY: &str = "span";
const THUMBNAIL: &str = "a.thumb";

const ATTR_SEPARATOR: &str = ": ";

/// Extract the deterministic fields of a listing detail page.
///
/// Title, description and the canonical url (which carries the listing id)
/// are mandatory. A missing price is not an error, an unreadable one is.
pub fn parse_listing_page(html: &str) -> Result<ListingPage> {
    let mut document = Html::parse_document(html);
    strip_qr_labels(&mut document)?;

    let canonical_url = extract_canonical_url(&document)?;
    let external_id = extract_id(&canonical_url)?;
    let title = extract_required_text(&document, "title", TITLE)?;
    let price = extract_price(&document)?;
    let description = extract_required_text(&document, "description", DESCRIPTION)?;
    let attributes = extract_attributes(&document)?;
    let image_urls = extract_image_urls(&document)?;

    debug!(
        external_id,
        attributes = attributes.len(),
        images = image_urls.len(),
        "Parsed listing page"
    );

    Ok(ListingPage {
        canonical_url,
        price,
        title,
        external_id,
        description,
        attributes,
        image_urls,
    })
}

/// The printable QR caption sits inside the posting body and would otherwise
/// end up in the description.
fn strip_qr_labels(document: &mut Html) -> Result<()> {
    let qr_sel = selector(QR_LABEL)?;
    let ids: Vec<_> = document.select(&qr_sel).map(|el| el.id()).collect();
    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
    Ok(())
}

fn extract_canonical_url(document: &Html) -> Result<String> {
    let sel = selector(CANONICAL_URL)?;
    document
        .select(&sel)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(String::from)
        .ok_or(CraigslistError::MissingElement {
            field: "canonical url",
            selector: CANONICAL_URL,
        })
}

fn extract_required_text(
    document: &Html,
    field: &'static str,
    css: &'static str,
) -> Result<String> {
    let sel = selector(css)?;
    document
        .select(&sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or(CraigslistError::MissingElement {
            field,
            selector: css,
        })
}

fn extract_price(document: &Html) -> Result<Option<f64>> {
    let sel = selector(PRICE)?;
    document
        .select(&sel)
        .next()
        .map(|el| format_price(&el.text().collect::<String>()))
        .transpose()
}

/// Key/value attributes such as `"laundry: w/d in unit"`. Entries that do not
/// split into exactly one key and one value are free text and are skipped.
fn extract_attributes(document: &Html) -> Result<BTreeMap<String, String>> {
    let group_sel = selector(ATTR_GROUP)?;
    let entry_sel = selector(ATTR_ENTRY)?;

    let mut attributes = BTreeMap::new();
    for group in document.select(&group_sel) {
        for entry in group.select(&entry_sel) {
            let text = entry.text().collect::<String>();
            if let Some((key, value)) = split_attribute(&text) {
                attributes.insert(key, value);
            }
        }
    }
    Ok(attributes)
}

fn split_attribute(text: &str) -> Option<(String, String)> {
    let parts: Vec<&str> = text.trim().split(ATTR_SEPARATOR).collect();
    match parts.as_slice() {
        [key, value] => Some((key.trim().to_string(), value.trim().to_string())),
        _ => None,
    }
}

fn extract_image_urls(document: &Html) -> Result<Vec<String>> {
    let sel = selector(THUMBNAIL)?;
    Ok(document
        .select(&sel)
        .filter_map(|a| a.value().attr("href"))
        .map(String::from)
        .collect())
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| CraigslistError::Parse {
        reason: format!("invalid CSS selector '{css}': {e}"),
    })
}
