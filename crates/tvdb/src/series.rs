use crate::models::{SeriesBase, Translation};
use crate::TvdbClient;

impl TvdbClient {
    /// GET /series/{id}
    pub async fn get_series(&self, series_id: i64) -> crate::Result<SeriesBase> {
        self.get(&format!("/series/{}", series_id)).await
    }

    /// GET /series/{id}/translations/{language}
    ///
    /// `language` is a three-letter TVDB code such as `eng` or `deu`.
    pub async fn get_series_translation(
        &self,
        series_id: i64,
        language: &str,
    ) -> crate::Result<Translation> {
        self.get(&format!("/series/{}/translations/{}", series_id, language))
            .await
    }
}
