use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::domain::enrichment::{Enrichment, EnrichmentFailure};

/// Deterministic fields read straight from a listing page's markup.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingPage {
    pub canonical_url: String,
    pub price: Option<f64>,
    pub title: String,
    pub external_id: u64,
    pub description: String,
    pub attributes: BTreeMap<String, String>,
    pub image_urls: Vec<String>,
}

/// Everything known about a listing once its page has been fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingDetails {
    pub price: Option<f64>,
    pub title: String,
    pub external_id: u64,
    pub description: String,
    pub attributes: BTreeMap<String, String>,
    pub image_urls: Vec<String>,
    pub enrichment: Enrichment,
}

impl ListingDetails {
    pub fn from_page(page: ListingPage, enrichment: Enrichment) -> Self {
        Self {
            price: page.price,
            title: page.title,
            external_id: page.external_id,
            description: page.description,
            attributes: page.attributes,
            image_urls: page.image_urls,
            enrichment,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListingState {
    Unfetched,
    Fetched(Box<ListingDetails>),
}

/// A single housing ad. Starts out holding only its url and moves to the
/// fetched state, all fields at once, after a successful page fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    url: String,
    state: ListingState,
}

impl Listing {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            state: ListingState::Unfetched,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> &ListingState {
        &self.state
    }

    pub fn is_fetched(&self) -> bool {
        matches!(self.state, ListingState::Fetched(_))
    }

    pub fn details(&self) -> Option<&ListingDetails> {
        match &self.state {
            ListingState::Fetched(details) => Some(details),
            ListingState::Unfetched => None,
        }
    }

    pub fn price(&self) -> Option<f64> {
        self.details().and_then(|d| d.price)
    }

    pub fn title(&self) -> Option<&str> {
        self.details().map(|d| d.title.as_str())
    }

    pub fn external_id(&self) -> Option<u64> {
        self.details().map(|d| d.external_id)
    }

    pub fn description(&self) -> Option<&str> {
        self.details().map(|d| d.description.as_str())
    }

    pub fn attributes(&self) -> Option<&BTreeMap<String, String>> {
        self.details().map(|d| &d.attributes)
    }

    pub fn image_urls(&self) -> Option<&[String]> {
        self.details().map(|d| d.image_urls.as_slice())
    }

    pub fn enrichment(&self) -> Option<&Enrichment> {
        self.details().map(|d| &d.enrichment)
    }

    pub(crate) fn mark_fetched(&mut self, details: ListingDetails) {
        self.state = ListingState::Fetched(Box::new(details));
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.details() {
            Some(ListingDetails {
                title,
                price: Some(price),
                ..
            }) => write!(f, "{title} (${price}): {}", self.url),
            Some(ListingDetails { title, .. }) => write!(f, "{title}: {}", self.url),
            None => write!(f, "{}", self.url),
        }
    }
}

/// Flat mapping with a fixed key set; unfetched listings and failed
/// enrichment fields come out as `null`.
impl Serialize for Listing {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let details = self.details();
        let enrichment = details.map(|d| &d.enrichment);

        let mut state = serializer.serialize_struct("Listing", 13)?;
        state.serialize_field("url", &self.url)?;
        state.serialize_field("price", &details.and_then(|d| d.price))?;
        state.serialize_field("title", &details.map(|d| &d.title))?;
        state.serialize_field("external_id", &details.map(|d| d.external_id))?;
        state.serialize_field("description", &details.map(|d| &d.description))?;
        state.serialize_field("image_urls", &details.map(|d| &d.image_urls))?;
        state.serialize_field("attributes", &details.map(|d| &d.attributes))?;
        state.serialize_field(
            "lease_period",
            &enrichment.and_then(|e| e.lease_period.as_ref()),
        )?;
        state.serialize_field("roommates", &enrichment.and_then(|e| e.roommates.as_ref()))?;
        state.serialize_field(
            "dates_available",
            &enrichment.and_then(|e| e.dates_available.as_ref()),
        )?;
        state.serialize_field(
            "bedrooms_bathrooms",
            &enrichment.and_then(|e| e.bedrooms_bathrooms.as_ref()),
        )?;
        state.serialize_field("furnished", &enrichment.and_then(|e| e.furnished.as_ref()))?;
        state.serialize_field(
            "application_fee",
            &enrichment.and_then(|e| e.application_fee.as_ref()),
        )?;
        state.end()
    }
}

/// Outcome of fetching one listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchReport {
    pub status: u16,
    pub failed_enrichments: Vec<EnrichmentFailure>,
}

impl FetchReport {
    pub fn status_only(status: u16) -> Self {
        Self {
            status,
            failed_enrichments: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    /// Fetched and every enrichment call succeeded.
    pub fn is_complete(&self) -> bool {
        self.is_success() && self.failed_enrichments.is_empty()
    }
}

/// Outcome of fetching a search-results page.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchReport {
    pub status: u16,
    pub url: String,
    pub listings: Vec<Listing>,
}

impl SearchReport {
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::enrichment::{ApplicationFee, EnrichmentField, LeasePeriod, LeaseUnit};
    use pretty_assertions::assert_eq;

    const KEYS: [&str; 13] = [
        "url",
        "price",
        "title",
        "external_id",
        "description",
        "image_urls",
        "attributes",
        "lease_period",
        "roommates",
        "dates_available",
        "bedrooms_bathrooms",
        "furnished",
        "application_fee",
    ];

    fn sample_details() -> ListingDetails {
        ListingDetails {
            price: Some(3200.0),
            title: "Sunny one bedroom".into(),
            external_id: 7_812_345_678,
            description: "Bright and quiet.".into(),
            attributes: BTreeMap::from([("laundry".to_string(), "in unit".to_string())]),
            image_urls: vec!["https://images.example.org/a.jpg".into()],
            enrichment: Enrichment {
                lease_period: Some(LeasePeriod {
                    unit: LeaseUnit::Yearly,
                    duration: Some("12 months".into()),
                }),
                application_fee: Some(ApplicationFee { amount: 45 }),
                ..Default::default()
            },
        }
    }

    #[test]
    fn new_listing_is_unfetched() {
        let listing = Listing::new("https://sfbay.craigslist.org/sfc/apa/d/x/1.html");
        assert!(!listing.is_fetched());
        assert!(listing.title().is_none());
        assert!(listing.price().is_none());
        assert!(listing.external_id().is_none());
        assert!(listing.description().is_none());
        assert!(listing.attributes().is_none());
        assert!(listing.image_urls().is_none());
    }

    #[test]
    fn mark_fetched_populates_all_fields() {
        let mut listing = Listing::new("https://sfbay.craigslist.org/sfc/apa/d/x/7812345678.html");
        listing.mark_fetched(sample_details());
        assert!(listing.is_fetched());
        assert_eq!(listing.title(), Some("Sunny one bedroom"));
        assert_eq!(listing.external_id(), Some(7_812_345_678));
        assert_eq!(listing.image_urls().map(<[String]>::len), Some(1));
    }

    #[test]
    fn unfetched_serializes_nulls_for_every_other_key() {
        let listing = Listing::new("https://example.org/1.html");
        let value = serde_json::to_value(&listing).unwrap();
        let map = value.as_object().unwrap();
        assert_eq!(map.len(), KEYS.len());
        for key in KEYS {
            assert!(map.contains_key(key), "missing key {key}");
        }
        assert_eq!(map["url"], "https://example.org/1.html");
        assert!(KEYS[1..].iter().all(|k| map[*k].is_null()));
    }

    #[test]
    fn fetched_serializes_fixed_key_set() {
        let mut listing = Listing::new("https://example.org/7812345678.html");
        listing.mark_fetched(sample_details());
        let value = serde_json::to_value(&listing).unwrap();
        let map = value.as_object().unwrap();

        let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
        keys.sort_unstable();
        let mut expected = KEYS.to_vec();
        expected.sort_unstable();
        assert_eq!(keys, expected);

        assert_eq!(map["price"], 3200.0);
        assert_eq!(map["external_id"], 7_812_345_678_u64);
        assert_eq!(map["attributes"]["laundry"], "in unit");
        assert_eq!(map["lease_period"]["unit"], "yearly");
        assert_eq!(map["application_fee"]["amount"], 45);
        assert!(map["roommates"].is_null());
        assert!(map["furnished"].is_null());
    }

    #[test]
    fn serialized_key_order_is_stable() {
        let json = serde_json::to_string(&Listing::new("u")).unwrap();
        let positions: Vec<usize> = KEYS
            .iter()
            .map(|k| json.find(&format!("\"{k}\"")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn display_formats() {
        let mut listing = Listing::new("https://example.org/7812345678.html");
        assert_eq!(listing.to_string(), "https://example.org/7812345678.html");
        listing.mark_fetched(sample_details());
        assert_eq!(
            listing.to_string(),
            "Sunny one bedroom ($3200): https://example.org/7812345678.html"
        );
    }

    #[test]
    fn fetch_report_completeness() {
        let mut report = FetchReport::status_only(200);
        assert!(report.is_complete());
        report.failed_enrichments.push(EnrichmentFailure {
            field: EnrichmentField::Roommates,
            reason: "timeout".into(),
        });
        assert!(report.is_success());
        assert!(!report.is_complete());
        assert!(!FetchReport::status_only(404).is_success());
    }
}
