use crate::{models::TvShowDetails, TmdbClient};

impl TmdbClient {
    /// Get the details of a TV show by its ID.
    ///
    /// GET /tv/{series_id}
    pub async fn get_tv_details(
        &self,
        series_id: i64,
        language: &str,
    ) -> crate::Result<TvShowDetails> {
        self.get(&format!("/tv/{}", series_id), &[("language", language)])
            .await
    }
}
