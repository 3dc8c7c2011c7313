use async_trait::async_trait;

use crate::error::Result;

/// Raw result of a GET. Any status is a valid page; callers decide what a
/// non-200 means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub status: u16,
    pub body: String,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

#[async_trait]
pub trait PageSource: Send + Sync {
    /// Transport failures are errors; HTTP statuses are not.
    async fn fetch_page(&self, url: &str) -> Result<FetchedPage>;
}
