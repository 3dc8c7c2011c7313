use std::time::Instant;

use tracing::{debug, warn};

use crate::adapters::llm::schema::StructuredOutput;
use crate::domain::enrichment::{
    ApplicationFee, BedroomsBathrooms, DatesAvailable, Enrichment, EnrichmentFailure,
    EnrichmentField, Furnished, LeasePeriod, Roommates,
};
use crate::error::{CraigslistError, Result};
use crate::ports::classifier::{ClassificationRequest, TextClassifier};

pub const SYSTEM_PROMPT: &str = "You are an expert at parsing information out of text. \
     Use the given input to answer the question. Answer in the format specified.";

pub fn build_prompt(description: &str, field: EnrichmentField) -> String {
    format!(
        "Here is the description of a housing listing:\n\n{}\n\n{}",
        description.trim(),
        field.question()
    )
}

/// Ask one question about `description` and decode the answer as `T`.
///
/// An answer that is valid JSON but does not fit `T` is a validation error.
pub async fn classify<T: StructuredOutput>(
    classifier: &dyn TextClassifier,
    description: &str,
    field: EnrichmentField,
) -> Result<T> {
    let request = ClassificationRequest {
        system: SYSTEM_PROMPT.to_string(),
        prompt: build_prompt(description, field),
        schema_name: T::response_name(),
        schema: T::response_schema(),
    };

    let value = classifier.classify(&request).await?;
    serde_json::from_value(value).map_err(|e| CraigslistError::Validation {
        schema: request.schema_name,
        reason: e.to_string(),
    })
}

/// Run every enrichment question against `description` concurrently.
///
/// Each call stands alone: a failed call leaves its field `None` and is
/// returned as a failure, the others are kept.
pub async fn enrich(
    classifier: &dyn TextClassifier,
    description: &str,
) -> (Enrichment, Vec<EnrichmentFailure>) {
    let start = Instant::now();

    let (lease_period, dates_available, roommates, bedrooms_bathrooms, furnished, application_fee) = tokio::join!(
        classify::<LeasePeriod>(classifier, description, EnrichmentField::LeasePeriod),
        classify::<DatesAvailable>(classifier, description, EnrichmentField::DatesAvailable),
        classify::<Roommates>(classifier, description, EnrichmentField::Roommates),
        classify::<BedroomsBathrooms>(classifier, description, EnrichmentField::BedroomsBathrooms),
        classify::<Furnished>(classifier, description, EnrichmentField::Furnished),
        classify::<ApplicationFee>(classifier, description, EnrichmentField::ApplicationFee),
    );

    let mut failures = Vec::new();
    let enrichment = Enrichment {
        lease_period: settle(EnrichmentField::LeasePeriod, lease_period, &mut failures),
        dates_available: settle(EnrichmentField::DatesAvailable, dates_available, &mut failures)
            .map(DatesAvailable::normalized),
        roommates: settle(EnrichmentField::Roommates, roommates, &mut failures),
        bedrooms_bathrooms: settle(
            EnrichmentField::BedroomsBathrooms,
            bedrooms_bathrooms,
            &mut failures,
        ),
        furnished: settle(EnrichmentField::Furnished, furnished, &mut failures),
        application_fee: settle(EnrichmentField::ApplicationFee, application_fee, &mut failures),
    };

    debug!(
        failed = failures.len(),
        duration_ms = start.elapsed().as_millis(),
        "Enrichment finished"
    );
    (enrichment, failures)
}

fn settle<T>(
    field: EnrichmentField,
    result: Result<T>,
    failures: &mut Vec<EnrichmentFailure>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(field = %field, error = %e, "Enrichment call failed");
            failures.push(EnrichmentFailure {
                field,
                reason: e.to_string(),
            });
            None
        }
    }
}
