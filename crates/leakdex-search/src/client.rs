//! Search engine HTTP client.

use crate::error::{SearchError, SearchResult};
use crate::types::*;
use leakdex_config::SearchConfig;
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Client for the search engine's document API.
#[derive(Clone)]
pub struct SearchClient {
    client: Client,
    base: Url,
    index: String,
    auth: Option<(String, Option<String>)>,
    timeout: Duration,
}

impl SearchClient {
    /// Create a new client from configuration.
    pub fn from_config(config: &SearchConfig) -> SearchResult<Self> {
        let auth = config
            .username
            .as_ref()
            .map(|user| (user.clone(), config.password.clone()));
        Self::build(
            &config.url,
            config.index.clone(),
            Duration::from_secs(config.timeout_seconds),
            auth,
        )
    }

    /// Create a new client with default settings.
    pub fn new(url: &str, index: impl Into<String>) -> SearchResult<Self> {
        Self::build(url, index.into(), Duration::from_secs(30), None)
    }

    fn build(
        url: &str,
        index: String,
        timeout: Duration,
        auth: Option<(String, Option<String>)>,
    ) -> SearchResult<Self> {
        let base = Url::parse(url.trim_end_matches('/'))
            .map_err(|e| SearchError::InvalidConfig(format!("invalid search url {}: {}", url, e)))?;
        if base.cannot_be_a_base() {
            return Err(SearchError::InvalidConfig(format!(
                "search url cannot carry a path: {}",
                url
            )));
        }

        if index.trim().is_empty() {
            return Err(SearchError::InvalidConfig("index name is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SearchError::Http)?;

        Ok(Self {
            client,
            base,
            index,
            auth,
            timeout,
        })
    }

    /// The index documents are written to.
    pub fn index(&self) -> &str {
        &self.index
    }

    /// The engine base URL.
    pub fn url(&self) -> &str {
        self.base.as_str()
    }

    /// Check if the search engine is reachable.
    pub async fn is_available(&self) -> bool {
        match self.request(Method::GET, self.base.clone()).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// Fetch cluster name and version.
    pub async fn info(&self) -> SearchResult<ClusterInfo> {
        debug!("Fetching cluster info from {}", self.base);
        let response = self.send(self.request(Method::GET, self.base.clone())).await?;
        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }

    /// Store `document` under `id`, replacing any previous version.
    ///
    /// The write does not force an index refresh, so the document may take a
    /// moment to become searchable.
    pub async fn index_document<T: Serialize + ?Sized>(
        &self,
        id: &str,
        document: &T,
    ) -> SearchResult<IndexResponse> {
        let mut url = self.doc_url(id)?;
        url.query_pairs_mut().append_pair("refresh", "false");

        let response = self
            .send(self.request(Method::PUT, url).json(document))
            .await?;
        let response = Self::check_status(response).await?;
        let indexed: IndexResponse = response.json().await?;
        debug!("Indexed {} into {} ({:?})", indexed.id, indexed.index, indexed.result);
        Ok(indexed)
    }

    fn doc_url(&self, id: &str) -> SearchResult<Url> {
        self.with_segments(&[self.index.as_str(), "_doc", id])
    }

    fn with_segments(&self, segments: &[&str]) -> SearchResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| SearchError::InvalidConfig(format!("bad base url {}", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.auth {
            Some((user, password)) => builder.basic_auth(user, password.as_ref()),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> SearchResult<Response> {
        builder.send().await.map_err(|e| {
            if e.is_connect() {
                SearchError::ServerNotRunning {
                    url: self.base.to_string(),
                }
            } else if e.is_timeout() {
                SearchError::Timeout {
                    seconds: self.timeout.as_secs(),
                }
            } else {
                SearchError::Http(e)
            }
        })
    }

    async fn check_status(response: Response) -> SearchResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&text)
            .map(|e| e.error.describe())
            .unwrap_or(text);

        Err(SearchError::ApiError {
            status: status.as_u16(),
            message,
        })
    }
}
