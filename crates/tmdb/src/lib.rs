mod client;
mod error;
mod external_ids;
mod movie;
mod search;
mod tv;
pub mod models;

pub use client::{ApiKey, TmdbClient};
pub use error::TmdbError;
pub use models::{
    ExternalIds, Movie, MovieDetails, PaginatedResponse, SearchMultiResult, TvShow, TvShowDetails,
};

pub type Result<T> = std::result::Result<T, TmdbError>;
