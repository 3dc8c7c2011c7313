use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::adapters::scraper::detail_parser::parse_listing_page;
use crate::adapters::scraper::search_parser::parse_search_results;
use crate::domain::enrichment::EnrichmentFailure;
use crate::domain::listing::{FetchReport, Listing, ListingDetails, SearchReport};
use crate::domain::search_params::SearchRequest;
use crate::enrichment::enrich;
use crate::error::Result;
use crate::ports::classifier::TextClassifier;
use crate::ports::page_source::PageSource;

/// Runs searches and fills in listings using a page source for markup and a
/// classifier for the model-derived fields.
pub struct Scout {
    source: Arc<dyn PageSource>,
    classifier: Arc<dyn TextClassifier>,
    base_url: Option<String>,
}

impl Scout {
    pub fn new(source: Arc<dyn PageSource>, classifier: Arc<dyn TextClassifier>) -> Self {
        Self {
            source,
            classifier,
            base_url: None,
        }
    }

    /// Send search requests to `base_url` instead of the city's own site.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Fetch one search-results page. A non-200 page yields an empty list
    /// alongside its status.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchReport> {
        request.validate()?;
        let url = match &self.base_url {
            Some(base) => request.url_with_base(base),
            None => request.url(),
        };
        info!(url = %url, "Searching");

        let page = self.source.fetch_page(&url).await?;
        if !page.is_success() {
            warn!(status = page.status, url = %url, "Search page not available");
            return Ok(SearchReport {
                status: page.status,
                url,
                listings: Vec::new(),
            });
        }

        let listings = parse_search_results(&page.body, &url)?;
        info!(count = listings.len(), "Search complete");
        Ok(SearchReport {
            status: page.status,
            url,
            listings,
        })
    }

    /// Fetch a listing's page and populate it.
    ///
    /// The listing only changes state when the page came back 200 and parsed;
    /// on a non-200 status or an error it is left as it was.
    pub async fn fetch_listing(&self, listing: &mut Listing) -> Result<FetchReport> {
        let page = self.source.fetch_page(listing.url()).await?;
        if !page.is_success() {
            warn!(status = page.status, url = listing.url(), "Listing page not available");
            return Ok(FetchReport::status_only(page.status));
        }

        let (details, failed_enrichments) = self.extract(&page.body).await?;
        debug!(
            external_id = details.external_id,
            failed = failed_enrichments.len(),
            "Listing fetched"
        );
        listing.mark_fetched(details);

        Ok(FetchReport {
            status: page.status,
            failed_enrichments,
        })
    }

    /// Fetch a listing known only by its url.
    pub async fn fetch_url(&self, url: &str) -> Result<(Listing, FetchReport)> {
        let mut listing = Listing::new(url);
        let report = self.fetch_listing(&mut listing).await?;
        Ok((listing, report))
    }

    /// Parse a listing page and enrich its description. Markup errors fail
    /// before any model call is made.
    pub async fn extract(&self, html: &str) -> Result<(ListingDetails, Vec<EnrichmentFailure>)> {
        let page = parse_listing_page(html)?;
        let (enrichment, failures) = enrich(self.classifier.as_ref(), &page.description).await;
        Ok((ListingDetails::from_page(page, enrichment), failures))
    }
}
