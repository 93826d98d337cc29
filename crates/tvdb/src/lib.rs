//! Thin client for TheTVDB v4 API.
//!
//! Only the endpoints needed for localized series titles are covered:
//! login, the series base record and series translations.

mod client;
mod error;
mod series;
pub mod models;

pub use client::TvdbClient;
pub use error::TvdbError;
pub use models::{SeriesBase, Translation};

pub type Result<T> = std::result::Result<T, TvdbError>;
