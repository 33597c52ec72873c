use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{ConfigError, FetchError, StoreError};
use crate::model::{Location, PageContentRecord};
use crate::store::PageContentStore;

/// HTTP client for the content authority.
///
/// Every request carries the configured timeout, which covers connecting,
/// the response headers and the body. When it elapses reqwest drops the
/// in-flight request, closing its connection.
#[derive(Debug, Clone)]
pub struct AuthorityClient {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl AuthorityClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let mut normalized = base_url.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let base_url = Url::parse(&normalized).map_err(|_| ConfigError::InvalidUrl {
            key: "AUTHORITY_URL".to_string(),
            value: base_url.to_string(),
        })?;
        Ok(AuthorityClient {
            client: Client::new(),
            base_url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        self.base_url
            .join(path)
            .map_err(|e| FetchError::Transient(format!("bad authority path '{}': {}", path, e)))
    }

    /// Raw body of a 2xx response, at most `max_bytes` long. Validation is
    /// the caller's job.
    #[tracing::instrument(skip(self), fields(base = %self.base_url))]
    pub async fn fetch_xml(&self, path: &str, max_bytes: usize) -> Result<String, FetchError> {
        let url = self.endpoint(path)?;
        let mut response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/xml")
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Transient(format!("{} returned {}", path, status)));
        }
        if let Some(declared) = response.content_length() {
            if declared > max_bytes as u64 {
                return Err(FetchError::Malformed(format!(
                    "{} declares {} bytes, limit is {}",
                    path, declared, max_bytes
                )));
            }
        }

        // Content-Length may be absent or wrong, so count while reading.
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > max_bytes {
                return Err(FetchError::Malformed(format!(
                    "{} body exceeds {} bytes",
                    path, max_bytes
                )));
            }
            body.extend_from_slice(&chunk);
        }
        String::from_utf8(body)
            .map_err(|e| FetchError::Malformed(format!("{} is not UTF-8: {}", path, e)))
    }

    /// JSON body of a 2xx response; `None` on 404.
    async fn fetch_json<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .header(header::ACCEPT, "application/json")
            .timeout(self.timeout)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let bytes = response.bytes().await?;
                serde_json::from_slice(&bytes)
                    .map(Some)
                    .map_err(|e| FetchError::Malformed(format!("{}: {}", url.path(), e)))
            }
            status => Err(FetchError::Transient(format!("{} returned {}", url.path(), status))),
        }
    }
}

#[async_trait]
impl PageContentStore for AuthorityClient {
    async fn page_by_url(&self, page_url: &str) -> Result<Option<PageContentRecord>, StoreError> {
        let mut url = self.endpoint("seo-pages/by-url")?;
        url.query_pairs_mut().append_pair("url", page_url);
        Ok(self.fetch_json(url).await?)
    }

    async fn first_page_for_keyword(
        &self,
        keyword_slug: &str,
    ) -> Result<Option<PageContentRecord>, StoreError> {
        let url = self.endpoint(&format!("seo-pages/keyword/{}/first", keyword_slug))?;
        Ok(self.fetch_json(url).await?)
    }

    async fn location_by_id(&self, id: i32) -> Result<Option<Location>, StoreError> {
        let url = self.endpoint(&format!("seo-pages/locations/{}", id))?;
        Ok(self.fetch_json(url).await?)
    }
}
