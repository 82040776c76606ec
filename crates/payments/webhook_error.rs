use thiserror::Error;

/// Why an inbound provider payload did not become a canonical event.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WebhookError {
    /// Signature, timestamp or origin check failed.
    #[error("verification failed: {0}")]
    Verification(String),
    #[error("malformed payload: {0}")]
    Malformed(String),
    /// Well-formed but not actionable here (other environment, unhandled type, unknown SKU).
    #[error("ignored: {0}")]
    Ignored(String),
}

impl WebhookError {
    pub fn kind(&self) -> &'static str {
        match self {
            WebhookError::Verification(_) => "verification",
            WebhookError::Malformed(_) => "malformed",
            WebhookError::Ignored(_) => "ignored",
        }
    }
}
