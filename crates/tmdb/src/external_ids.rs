use crate::{models::ExternalIds, TmdbClient};

impl TmdbClient {
    /// GET /tv/{series_id}/external_ids
    pub async fn get_tv_external_ids(&self, series_id: i64) -> crate::Result<ExternalIds> {
        self.get(&format!("/tv/{}/external_ids", series_id), &[])
            .await
    }

    /// GET /movie/{movie_id}/external_ids
    pub async fn get_movie_external_ids(&self, movie_id: i64) -> crate::Result<ExternalIds> {
        self.get(&format!("/movie/{}/external_ids", movie_id), &[])
            .await
    }
}
