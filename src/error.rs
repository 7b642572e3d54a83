// Error taxonomy shared by the models, the API client and the terminal
// interface. Library code returns `BeeminderError`; the binary wraps it in
// `anyhow` at the edges.

/// Errors surfaced by the Beeminder client.
#[derive(Debug, thiserror::Error)]
pub enum BeeminderError {
    /// Missing or invalid credentials/settings. Only raised at startup.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Malformed API payload or invalid user input.
    #[error("invalid data: {0}")]
    Validation(String),

    /// The service rejected the API key (HTTP 401/403).
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Unknown user or goal slug (HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),

    /// The HTTP exchange itself failed (DNS, TLS, timeout, ...). The request
    /// URL is stripped since it carries the auth token.
    #[error("network error: {0}")]
    Network(reqwest::Error),

    /// Any other non-2xx answer.
    #[error("Beeminder API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

impl BeeminderError {
    /// Whether the service refused our credentials.
    pub fn is_auth(&self) -> bool {
        matches!(self, BeeminderError::Authentication(_))
    }
}

impl From<reqwest::Error> for BeeminderError {
    fn from(err: reqwest::Error) -> Self {
        BeeminderError::Network(err.without_url())
    }
}

pub type Result<T> = std::result::Result<T, BeeminderError>;
