use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::Result;

/// Single GET returning the response body, whatever the status code. Error
/// bodies are interpreted by the caller.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn get(&self, url: &Url) -> Result<String>;
}

pub struct HttpFetch {
    client: reqwest::Client,
    token: Option<String>,
}

impl HttpFetch {
    pub fn new(timeout: Duration, token: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("sscc/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, token })
    }
}

#[async_trait]
impl Fetch for HttpFetch {
    async fn get(&self, url: &Url) -> Result<String> {
        let mut request = self.client.get(url.clone());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        debug!(%url, status = %response.status(), "GET");
        Ok(response.text().await?)
    }
}
