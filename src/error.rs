use thiserror::Error;

#[derive(Error, Debug)]
pub enum CraigslistError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to parse HTML response: {reason}")]
    Parse { reason: String },

    #[error("Listing page is missing its {field} ({selector})")]
    MissingElement {
        field: &'static str,
        selector: &'static str,
    },

    #[error("No listing id found in url: {url}")]
    InvalidId { url: String },

    #[error("Invalid search parameters: {reason}")]
    InvalidParams { reason: String },

    #[error("Model service request failed: {reason}")]
    ModelService { reason: String },

    #[error("Model output does not match the {schema} schema: {reason}")]
    Validation { schema: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, CraigslistError>;
