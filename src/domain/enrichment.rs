//! Structured shapes the model is asked to fill in from a listing description.
//!
//! Every type derives `JsonSchema`; the generated schema is sent with the
//! request and the reply is deserialized back into the same type, so a reply
//! that does not fit is rejected rather than defaulted.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::normalize::normalize_date;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LeaseUnit {
    Monthly,
    Yearly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct LeasePeriod {
    /// Whether the lease is month-to-month or a yearly lease.
    pub unit: LeaseUnit,
    /// Length of the lease as written, e.g. "12 months".
    pub duration: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DatesAvailable {
    /// First day the place can be moved into.
    pub start_date: String,
    /// Last day of availability, for sublets and temporary stays.
    pub end_date: Option<String>,
}

impl DatesAvailable {
    /// Rewrite both dates as `YYYY-MM-DD` where they are recognisable.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            start_date: normalize_date(&self.start_date),
            end_date: self.end_date.as_deref().map(normalize_date),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ApplicationFee {
    /// Fee in whole dollars.
    pub amount: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RoommateInfo {
    pub age: Option<u32>,
    pub occupation: Option<String>,
    /// Anything else said about this roommate.
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Roommates {
    /// Number of people already living there.
    pub amount: Option<u32>,
    pub roommates: Option<Vec<RoommateInfo>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct BedroomsBathrooms {
    pub bedrooms: u32,
    pub bathrooms: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Furnished {
    pub is_furnished: bool,
    /// What furniture is included, or why it is unfurnished.
    pub description: String,
}

/// Model-derived fields of a listing. A `None` is either an absent answer or
/// a failed call; failures are reported separately.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrichment {
    pub lease_period: Option<LeasePeriod>,
    pub dates_available: Option<DatesAvailable>,
    pub roommates: Option<Roommates>,
    pub bedrooms_bathrooms: Option<BedroomsBathrooms>,
    pub furnished: Option<Furnished>,
    pub application_fee: Option<ApplicationFee>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentField {
    LeasePeriod,
    DatesAvailable,
    Roommates,
    BedroomsBathrooms,
    Furnished,
    ApplicationFee,
}

impl EnrichmentField {
    pub const ALL: [Self; 6] = [
        Self::LeasePeriod,
        Self::DatesAvailable,
        Self::Roommates,
        Self::BedroomsBathrooms,
        Self::Furnished,
        Self::ApplicationFee,
    ];

    /// Key under which the field is serialized.
    pub fn key(self) -> &'static str {
        match self {
            Self::LeasePeriod => "lease_period",
            Self::DatesAvailable => "dates_available",
            Self::Roommates => "roommates",
            Self::BedroomsBathrooms => "bedrooms_bathrooms",
            Self::Furnished => "furnished",
            Self::ApplicationFee => "application_fee",
        }
    }

    pub fn question(self) -> &'static str {
        match self {
            Self::LeasePeriod => "How long is the lease period for?",
            Self::DatesAvailable => "On which dates is the place available?",
            Self::Roommates => "Are there roommates? If so, fill out their details.",
            Self::BedroomsBathrooms => "How many bedrooms and bathrooms are there?",
            Self::Furnished => "Is the place furnished?",
            Self::ApplicationFee => "What is the application fee?",
        }
    }
}

impl fmt::Display for EnrichmentField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One enrichment call that did not produce a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentFailure {
    pub field: EnrichmentField,
    pub reason: String,
}

impl fmt::Display for EnrichmentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}
