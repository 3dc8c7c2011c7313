use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CraigslistError, Result};

/// Housing section of the marketplace; each maps to a fixed path code.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[default]
    Apartment,
    SubletTemp,
    Room,
}

impl Category {
    pub const ALL: [Self; 3] = [Self::Apartment, Self::SubletTemp, Self::Room];

    pub fn code(self) -> &'static str {
        match self {
            Self::Apartment => "apa",
            Self::SubletTemp => "sub",
            Self::Room => "roo",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Self::Apartment => "apartment",
            Self::SubletTemp => "sublet",
            Self::Room => "room",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Category {
    type Err = CraigslistError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.slug() == wanted || c.code() == wanted)
            .ok_or_else(|| CraigslistError::InvalidParams {
                reason: format!("unknown category '{s}' (expected apartment, sublet or room)"),
            })
    }
}

/// San Francisco neighborhoods, with the display name used on the site and
/// the numeric `nh` value the search endpoint filters on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Neighborhood {
    Soma,
    Usf,
    BernalHeights,
    Castro,
    ColeValley,
    Downtown,
    GlenPark,
    LowerHaight,
    HaightAshbury,
    HayesValley,
    InnerRichmond,
    InnerSunset,
    NoeValley,
    Nopa,
}

impl Neighborhood {
    pub const ALL: [Self; 14] = [
        Self::Soma,
        Self::Usf,
        Self::BernalHeights,
        Self::Castro,
        Self::ColeValley,
        Self::Downtown,
        Self::GlenPark,
        Self::LowerHaight,
        Self::HaightAshbury,
        Self::HayesValley,
        Self::InnerRichmond,
        Self::InnerSunset,
        Self::NoeValley,
        Self::Nopa,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Soma => "SOMA / south beach",
            Self::Usf => "USF / panhandle",
            Self::BernalHeights => "bernal heights",
            Self::Castro => "castro / upper market",
            Self::ColeValley => "cole valley / ashbury hts",
            Self::Downtown => "downtown / civic / van ness",
            Self::GlenPark => "glen park",
            Self::LowerHaight => "lower haight",
            Self::HaightAshbury => "haight ashbury",
            Self::HayesValley => "hayes valley",
            Self::InnerRichmond => "inner richmond",
            Self::InnerSunset => "inner sunset / UCSF",
            Self::NoeValley => "noe valley",
            Self::Nopa => "alamo square / nopa",
        }
    }

    pub fn code(self) -> u32 {
        match self {
            Self::Soma => 1,
            Self::Usf => 2,
            Self::BernalHeights => 4,
            Self::Castro => 5,
            Self::ColeValley => 6,
            Self::Downtown => 7,
            Self::GlenPark => 10,
            Self::LowerHaight => 11,
            Self::HaightAshbury => 12,
            Self::HayesValley => 13,
            Self::InnerRichmond => 15,
            Self::InnerSunset => 16,
            Self::NoeValley => 21,
            Self::Nopa => 149,
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Self::Soma => "soma",
            Self::Usf => "usf",
            Self::BernalHeights => "bernal-heights",
            Self::Castro => "castro",
            Self::ColeValley => "cole-valley",
            Self::Downtown => "downtown",
            Self::GlenPark => "glen-park",
            Self::LowerHaight => "lower-haight",
            Self::HaightAshbury => "haight-ashbury",
            Self::HayesValley => "hayes-valley",
            Self::InnerRichmond => "inner-richmond",
            Self::InnerSunset => "inner-sunset",
            Self::NoeValley => "noe-valley",
            Self::Nopa => "nopa",
        }
    }
}

impl fmt::Display for Neighborhood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Neighborhood {
    type Err = CraigslistError;

    /// Accepts either the slug (`noe-valley`) or the site's display name.
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|n| n.slug() == wanted || n.display_name().to_lowercase() == wanted)
            .ok_or_else(|| CraigslistError::InvalidParams {
                reason: format!("unknown neighborhood '{s}'"),
            })
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Laundry {
    InUnit,
    InBuilding,
    OnSite,
    Hookups,
    None,
}

impl Laundry {
    pub const ALL: [Self; 5] = [
        Self::InUnit,
        Self::InBuilding,
        Self::OnSite,
        Self::Hookups,
        Self::None,
    ];

    pub fn code(self) -> u8 {
        match self {
            Self::InUnit => 1,
            Self::InBuilding => 2,
            Self::OnSite => 3,
            Self::Hookups => 4,
            Self::None => 5,
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Self::InUnit => "in-unit",
            Self::InBuilding => "in-building",
            Self::OnSite => "on-site",
            Self::Hookups => "hookups",
            Self::None => "none",
        }
    }
}

impl fmt::Display for Laundry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Laundry {
    type Err = CraigslistError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase().replace(['_', ' '], "-");
        Self::ALL
            .into_iter()
            .find(|l| l.slug() == wanted)
            .ok_or_else(|| CraigslistError::InvalidParams {
                reason: format!(
                    "unknown laundry type '{s}' (expected in-unit, in-building, on-site, hookups or none)"
                ),
            })
    }
}

/// Constraints narrowing a search. Sets keep the encoded parameters in a
/// stable order and drop duplicate selections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub max_bedrooms: Option<u32>,
    pub max_price: Option<u32>,
    #[serde(default)]
    pub neighborhoods: BTreeSet<Neighborhood>,
    #[serde(default)]
    pub laundry: BTreeSet<Laundry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub category: Category,
    /// Marketplace subdomain, e.g. `sfbay`.
    pub city: String,
    #[serde(default)]
    pub filters: SearchFilters,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, category: Category, city: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            category,
            city: city.into(),
            filters: SearchFilters::default(),
        }
    }

    #[must_use]
    pub fn with_filters(mut self, filters: SearchFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let city = self.city.trim();
        if city.is_empty() {
            return Err(CraigslistError::InvalidParams {
                reason: "city is required".into(),
            });
        }
        if !city
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(CraigslistError::InvalidParams {
                reason: format!("city '{city}' is not a marketplace subdomain"),
            });
        }
        Ok(())
    }

    /// Origin of the city's marketplace site.
    pub fn site_url(&self) -> String {
        format!("https://{}.craigslist.org", self.city.trim())
    }

    pub fn url(&self) -> String {
        build_search_url(&self.site_url(), self)
    }

    /// Same as [`SearchRequest::url`] against another origin (mirrors, test servers).
    pub fn url_with_base(&self, base_url: &str) -> String {
        build_search_url(base_url, self)
    }

    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("query".to_string(), self.query.clone())];

        if let Some(max_bedrooms) = self.filters.max_bedrooms {
            pairs.push(("max_bedrooms".into(), max_bedrooms.to_string()));
        }
        if let Some(max_price) = self.filters.max_price {
            pairs.push(("max_price".into(), max_price.to_string()));
        }
        for neighborhood in &self.filters.neighborhoods {
            pairs.push(("nh".into(), neighborhood.code().to_string()));
        }
        for laundry in &self.filters.laundry {
            pairs.push(("laundry".into(), laundry.code().to_string()));
        }

        pairs
    }
}

pub fn build_search_url(base_url: &str, request: &SearchRequest) -> String {
    let base = format!(
        "{}/search/{}",
        base_url.trim_end_matches('/'),
        request.category.code()
    );
    let query_pairs = request.to_query_pairs();

    // Use url crate for proper encoding of query parameters
    if let Ok(mut parsed) = Url::parse(&base) {
        {
            let mut qp = parsed.query_pairs_mut();
            for (k, v) in &query_pairs {
                qp.append_pair(k, v);
            }
        }
        parsed.to_string()
    } else {
        // Fallback: manual construction if base URL can't be parsed
        let encoded: String = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&query_pairs)
            .finish();
        format!("{base}?{encoded}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request() -> SearchRequest {
        SearchRequest::new("", Category::Apartment, "sfbay")
    }

    #[test]
    fn category_codes() {
        assert_eq!(Category::Apartment.code(), "apa");
        assert_eq!(Category::SubletTemp.code(), "sub");
        assert_eq!(Category::Room.code(), "roo");
    }

    #[test]
    fn category_parses_slug_or_code() {
        assert_eq!("room".parse::<Category>().unwrap(), Category::Room);
        assert_eq!("SUB".parse::<Category>().unwrap(), Category::SubletTemp);
        assert!("condo".parse::<Category>().is_err());
    }

    #[test]
    fn neighborhood_parses_slug_or_display_name() {
        assert_eq!(
            "noe-valley".parse::<Neighborhood>().unwrap(),
            Neighborhood::NoeValley
        );
        assert_eq!(
            "SOMA / south beach".parse::<Neighborhood>().unwrap(),
            Neighborhood::Soma
        );
        assert!("mission".parse::<Neighborhood>().is_err());
    }

    #[test]
    fn laundry_parses_loosely() {
        assert_eq!("in_unit".parse::<Laundry>().unwrap(), Laundry::InUnit);
        assert_eq!("On Site".parse::<Laundry>().unwrap(), Laundry::OnSite);
        assert!("dryer".parse::<Laundry>().is_err());
    }

    #[test]
    fn laundry_codes_are_one_through_five() {
        let codes: Vec<u8> = Laundry::ALL.iter().map(|l| l.code()).collect();
        assert_eq!(codes, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn url_without_filters() {
        let url = base_request().url();
        assert_eq!(url, "https://sfbay.craigslist.org/search/apa?query=");
    }

    #[test]
    fn url_encodes_query_text() {
        let mut request = base_request();
        request.query = "month to month & pets".into();
        let url = request.url();
        assert!(!url.contains("month to month"));
        assert!(
            url.contains("query=month+to+month+%26+pets")
                || url.contains("query=month%20to%20month%20%26%20pets")
        );
    }

    #[test]
    fn url_with_full_filter_set() {
        let request = base_request().with_filters(SearchFilters {
            max_bedrooms: Some(1),
            max_price: Some(3500),
            neighborhoods: [Neighborhood::Usf, Neighborhood::Soma].into_iter().collect(),
            laundry: [Laundry::OnSite, Laundry::InUnit, Laundry::InBuilding]
                .into_iter()
                .collect(),
        });
        assert_eq!(
            request.url(),
            "https://sfbay.craigslist.org/search/apa?query=&max_bedrooms=1&max_price=3500&nh=1&nh=2&laundry=1&laundry=2&laundry=3"
        );
    }

    #[test]
    fn repeated_parameter_per_selected_value() {
        let mut request = base_request();
        request.filters.neighborhoods = Neighborhood::ALL.into_iter().collect();
        let pairs = request.to_query_pairs();
        let nh_count = pairs.iter().filter(|(k, _)| k == "nh").count();
        assert_eq!(nh_count, Neighborhood::ALL.len());
    }

    #[test]
    fn url_with_base_replaces_origin() {
        let request = SearchRequest::new("loft", Category::Room, "sfbay");
        let url = request.url_with_base("http://127.0.0.1:9999/");
        assert_eq!(url, "http://127.0.0.1:9999/search/roo?query=loft");
    }

    #[test]
    fn url_fallback_still_encodes() {
        let mut request = base_request();
        request.query = "a&b=c".into();
        let url = build_search_url("not-a-valid-url", &request);
        assert_eq!(url, "not-a-valid-url/search/apa?query=a%26b%3Dc");
    }

    #[test]
    fn empty_city_fails_validation() {
        let request = SearchRequest::new("", Category::Apartment, "  ");
        assert!(request.validate().is_err());
    }

    #[test]
    fn city_with_dots_fails_validation() {
        let request = SearchRequest::new("", Category::Apartment, "evil.example.com/");
        assert!(request.validate().is_err());
    }

    #[test]
    fn valid_city_passes() {
        assert!(base_request().validate().is_ok());
    }

    #[test]
    fn neighborhood_codes_are_unique() {
        let codes: BTreeSet<u32> = Neighborhood::ALL.iter().map(|n| n.code()).collect();
        assert_eq!(codes.len(), Neighborhood::ALL.len());
    }
}
