use thiserror::Error;

#[derive(Debug, Error)]
pub enum TmdbError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to parse JSON response at '{path}': {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },

    #[error("API error: {status_code} - {message}")]
    Api { status_code: u16, message: String },
}

impl TmdbError {
    /// TMDB answers 404 for ids it does not know.
    pub fn is_not_found(&self) -> bool {
        matches!(self, TmdbError::Api { status_code: 404, .. })
    }
}
