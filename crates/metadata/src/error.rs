use thiserror::Error;

/// Transport or provider-side failure. "Nothing found" is never an error.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("BGM.tv error: {0}")]
    Bgmtv(#[from] bgmtv::BgmtvError),

    #[error("TMDB error: {0}")]
    Tmdb(#[from] tmdb::TmdbError),

    #[error("TVDB error: {0}")]
    Tvdb(#[from] tvdb::TvdbError),

    #[error("Invalid external id: {0}")]
    InvalidId(String),

    #[error("{0}")]
    Other(String),
}
