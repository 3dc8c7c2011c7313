use async_trait::async_trait;

use crate::error::Result;

/// One structured-output request: instructions, the question about the
/// text, and the JSON schema the answer must follow.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationRequest {
    pub system: String,
    pub prompt: String,
    pub schema_name: String,
    pub schema: serde_json::Value,
}

#[async_trait]
pub trait TextClassifier: Send + Sync {
    /// Returns the model's answer as parsed JSON, not yet checked against
    /// `request.schema`.
    async fn classify(&self, request: &ClassificationRequest) -> Result<serde_json::Value>;
}
