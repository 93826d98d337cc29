use serde::Deserialize;

use crate::{
    models::{Movie, PaginatedResponse, SearchMultiResult, TvShow},
    TmdbClient,
};

#[derive(Debug, Deserialize)]
struct RawPaginatedResponse {
    page: i64,
    results: Vec<serde_json::Value>,
    total_pages: i64,
    total_results: i64,
}

impl TmdbClient {
    /// Search for movies and TV shows using the multi search endpoint.
    ///
    /// This method filters out person results and only returns movie and TV results.
    pub async fn search_multi(
        &self,
        query: &str,
        language: &str,
    ) -> crate::Result<PaginatedResponse<SearchMultiResult>> {
        let raw: RawPaginatedResponse = self
            .get(
                "/search/multi",
                &[
                    ("language", language),
                    ("query", query),
                    ("include_adult", "false"),
                ],
            )
            .await?;

        Ok(filter_multi(raw))
    }
}

fn filter_multi(raw: RawPaginatedResponse) -> PaginatedResponse<SearchMultiResult> {
    let results: Vec<SearchMultiResult> = raw
        .results
        .into_iter()
        .filter_map(|value| {
            let media_type = value.get("media_type")?.as_str()?;
            match media_type {
                "tv" => {
                    let tv: TvShow = serde_json::from_value(value).ok()?;
                    Some(SearchMultiResult::Tv(tv))
                }
                "movie" => {
                    let movie: Movie = serde_json::from_value(value).ok()?;
                    Some(SearchMultiResult::Movie(movie))
                }
                _ => None, // Filter out "person" and other types
            }
        })
        .collect();

    PaginatedResponse {
        page: raw.page,
        results,
        total_pages: raw.total_pages,
        total_results: raw.total_results,
    }
}
