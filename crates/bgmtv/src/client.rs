use reqwest::Client;

const BASE_URL: &str = "https://api.bgm.tv";
pub(crate) const USER_AGENT: &str = concat!("catalog-bgmtv/", env!("CARGO_PKG_VERSION"));

pub struct BgmtvClient {
    client: Client,
    base_url: String,
}

impl BgmtvClient {
    /// Create a BgmtvClient with a reqwest Client.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Point the client at a different host (mirrors, local fixtures).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> crate::Result<T> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(crate::BgmtvError::Api {
                status_code: status.as_u16(),
                message: body,
            });
        }
        crate::models::decode(&body)
    }
}
