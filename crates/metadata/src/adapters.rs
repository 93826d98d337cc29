mod bgmtv_adapter;
mod tmdb_adapter;
mod tvdb_adapter;

pub use bgmtv_adapter::{BgmtvCatalog, CALENDAR_LIST};
pub use tmdb_adapter::{clean_title_for_search, TmdbProvider};
pub use tvdb_adapter::TvdbProvider;
