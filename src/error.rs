#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Cannot submit a transmission while the SparkPost API key is not set")]
    MissingApiKey,

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("SparkPost API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MailError {
    /// HTTP status reported by the SparkPost API, if the failure came from it
    pub fn status(&self) -> Option<u16> {
        match self {
            MailError::Api { status, .. } => Some(*status),
            MailError::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, MailError>;
