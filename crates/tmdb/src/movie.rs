use crate::{models::MovieDetails, TmdbClient};

impl TmdbClient {
    /// Get movie details
    ///
    /// GET /movie/{movie_id}
    pub async fn get_movie_details(
        &self,
        movie_id: i64,
        language: &str,
    ) -> crate::Result<MovieDetails> {
        self.get(&format!("/movie/{}", movie_id), &[("language", language)])
            .await
    }
}
