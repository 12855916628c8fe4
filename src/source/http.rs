use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::PayloadSource;
use crate::error::LoadError;

/// One GET against a fixed endpoint per fetch.
pub struct HttpSource {
    client: Client,
    endpoint: String,
}

impl HttpSource {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, LoadError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PayloadSource for HttpSource {
    fn describe(&self) -> String {
        self.endpoint().to_string()
    }

    async fn fetch_body(&self) -> Result<Vec<u8>, LoadError> {
        let resp = self.client.get(&self.endpoint).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(LoadError::Status { status: status.as_u16() });
        }
        Ok(resp.bytes().await?.to_vec())
    }
}
