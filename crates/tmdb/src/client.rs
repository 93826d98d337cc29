use std::sync::Arc;

use parking_lot::RwLock;
use reqwest::Client;

use crate::error::TmdbError;

const BASE_URL: &str = "https://api.themoviedb.org/3";

/// Shared API key that can be updated at runtime.
pub type ApiKey = Arc<RwLock<String>>;

pub struct TmdbClient {
    client: Client,
    api_key: ApiKey,
    base_url: String,
}

impl TmdbClient {
    /// `api_key` is read on every request, so updating it takes effect immediately.
    pub fn new(client: Client, api_key: ApiKey) -> Self {
        Self {
            client,
            api_key,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET `path` with the api key and the given extra query pairs.
    ///
    /// Non-2xx answers become [`TmdbError::Api`] carrying the response body.
    pub(crate) async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> crate::Result<T> {
        let api_key = self.api_key.read().clone();
        let response = self
            .client
            .get(self.url(path))
            .query(&[("api_key", api_key.as_str())])
            .query(query)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(TmdbError::Api {
                status_code: status.as_u16(),
                message: body,
            });
        }
        decode(&body)
    }
}

pub(crate) fn decode<T: serde::de::DeserializeOwned>(body: &str) -> crate::Result<T> {
    let deserializer = &mut serde_json::Deserializer::from_str(body);
    serde_path_to_error::deserialize(deserializer).map_err(|e| TmdbError::Json {
        path: e.path().to_string(),
        source: e.into_inner(),
    })
}
