mod calendar;
mod client;
mod error;
pub mod models;

pub use client::BgmtvClient;
pub use error::BgmtvError;
pub use models::{CalendarDay, CalendarImages, CalendarSubject, Weekday, SUBJECT_TYPE_ANIME};

pub type Result<T> = std::result::Result<T, BgmtvError>;
