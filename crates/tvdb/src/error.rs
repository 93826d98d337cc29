use thiserror::Error;

#[derive(Debug, Error)]
pub enum TvdbError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to parse JSON response at '{path}': {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },

    #[error("API error: {status_code} - {message}")]
    Api { status_code: u16, message: String },

    #[error("Login rejected: {0}")]
    Auth(String),
}

impl TvdbError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, TvdbError::Api { status_code: 404, .. })
    }

    pub(crate) fn is_unauthorized(&self) -> bool {
        matches!(self, TvdbError::Api { status_code: 401, .. })
    }
}
