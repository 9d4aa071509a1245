//! HTTP client used by the download operation

use reqwest::{Client, ClientBuilder};
use std::collections::HashMap;
use std::time::Duration;

use super::error::FsError;

/// Thin wrapper over a configured `reqwest` client
#[derive(Clone)]
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    pub fn new(timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(concat!("hostsuite/", env!("CARGO_PKG_VERSION")));

        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Issue a GET and fail on any non-success status
    pub async fn fetch(&self, url: &str) -> Result<DownloadResponse, FsError> {
        tracing::debug!("Downloading {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FsError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FsError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();

        Ok(DownloadResponse {
            url: url.to_string(),
            status: status.as_u16(),
            headers,
            response,
        })
    }
}

/// Successful response whose body has not been consumed yet
pub struct DownloadResponse {
    pub url: String,
    pub status: u16,
    pub headers: HashMap<String, String>,
    response: reqwest::Response,
}

impl DownloadResponse {
    /// Next body chunk, `None` at the end of the stream
    pub async fn chunk(&mut self) -> Result<Option<Vec<u8>>, FsError> {
        self.response
            .chunk()
            .await
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
            .map_err(|source| FsError::Request {
                url: self.url.clone(),
                source,
            })
    }
}
