use parking_lot::RwLock;
use reqwest::Client;

use crate::error::TvdbError;
use crate::models::{decode, Envelope, LoginData, LoginRequest};

const BASE_URL: &str = "https://api4.thetvdb.com/v4";

pub struct TvdbClient {
    client: Client,
    api_key: String,
    base_url: String,
    /// Bearer token from POST /login, valid for a month.
    token: RwLock<Option<String>>,
}

impl TvdbClient {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
            token: RwLock::new(None),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn login(&self) -> crate::Result<String> {
        let response = self
            .client
            .post(self.url("/login"))
            .json(&LoginRequest {
                apikey: &self.api_key,
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(TvdbError::Auth(format!("{} - {}", status.as_u16(), body)));
        }

        let envelope: Envelope<LoginData> = decode(&body)?;
        *self.token.write() = Some(envelope.data.token.clone());
        tracing::debug!("Obtained TVDB bearer token");
        Ok(envelope.data.token)
    }

    async fn token(&self) -> crate::Result<String> {
        let cached = self.token.read().clone();
        match cached {
            Some(token) => Ok(token),
            None => self.login().await,
        }
    }

    /// GET `path`, logging in first if needed and once more if the token expired.
    pub(crate) async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> crate::Result<T> {
        let token = self.token().await?;
        match self.get_with_token(path, &token).await {
            Err(e) if e.is_unauthorized() => {
                *self.token.write() = None;
                let token = self.login().await?;
                self.get_with_token(path, &token).await
            }
            other => other,
        }
    }

    async fn get_with_token<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        token: &str,
    ) -> crate::Result<T> {
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(TvdbError::Api {
                status_code: status.as_u16(),
                message: body,
            });
        }
        let envelope: Envelope<T> = decode(&body)?;
        Ok(envelope.data)
    }
}
