//! Remote copy of the knowledge base
//!
//! The remote is a single opaque object that is always replaced whole.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

const REMOTE_TIMEOUT: Duration = Duration::from_secs(30);

#[async_trait]
pub trait RemoteBlob: Send + Sync {
    /// Fetch the whole remote object
    async fn download(&self) -> Result<Vec<u8>>;

    /// Replace the whole remote object
    async fn upload(&self, bytes: Vec<u8>) -> Result<()>;
}

/// Remote object reachable with plain GET and PUT on one URL
pub struct HttpBlob {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl HttpBlob {
    pub fn new(url: impl Into<String>, token: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REMOTE_TIMEOUT)
            .build()
            .context("building knowledge store HTTP client")?;
        Ok(Self {
            client,
            url: url.into(),
            token,
        })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl RemoteBlob for HttpBlob {
    async fn download(&self) -> Result<Vec<u8>> {
        let response = self
            .authorize(self.client.get(&self.url))
            .send()
            .await
            .context("downloading knowledge base")?
            .error_for_status()?;
        let bytes = response.bytes().await?;
        debug!("Downloaded knowledge base ({} bytes)", bytes.len());
        Ok(bytes.to_vec())
    }

    async fn upload(&self, bytes: Vec<u8>) -> Result<()> {
        let size = bytes.len();
        self.authorize(self.client.put(&self.url))
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .context("uploading knowledge base")?
            .error_for_status()?;
        debug!("Uploaded knowledge base ({size} bytes)");
        Ok(())
    }
}
