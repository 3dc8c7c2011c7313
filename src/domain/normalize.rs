use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::{CraigslistError, Result};

static LISTING_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(\d+)\.html").expect("listing id pattern is valid"));

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
];

/// Convert a display price such as `"$3,200"` into its numeric value.
pub fn format_price(price: &str) -> Result<f64> {
    let cleaned: String = price
        .trim()
        .chars()
        .filter(|c| *c != '$' && *c != ',')
        .collect();
    cleaned.parse::<f64>().map_err(|_| CraigslistError::Parse {
        reason: format!("unreadable price '{price}'"),
    })
}

/// Listing id embedded in a listing url (`.../<digits>.html`).
pub fn extract_id(url: &str) -> Result<u64> {
    LISTING_ID
        .captures(url)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .ok_or_else(|| CraigslistError::InvalidId {
            url: url.to_string(),
        })
}

/// Rewrite a date in one of the common written forms as `YYYY-MM-DD`.
/// Anything unrecognised ("immediately", "June 1") is returned trimmed but
/// otherwise untouched.
pub fn normalize_date(date: &str) -> String {
    let trimmed = date.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .map_or_else(|| trimmed.to_string(), |d| d.format("%Y-%m-%d").to_string())
}
