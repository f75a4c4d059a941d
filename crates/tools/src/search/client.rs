//! HTTP client for the search engine's REST API.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use retail_agents_core::query::QueryRequest;
use retail_agents_core::{HitRecord, SearchResult};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;
use url::Url;

use crate::config::{ConnectionConfig, Credentials};

use super::error::SearchError;

/// Search engine client.
///
/// Cheap to clone; clones share one connection pool. Credentials are baked
/// into default headers at construction and never logged.
#[derive(Clone)]
pub struct EsClient {
    inner: Arc<EsClientInner>,
}

struct EsClientInner {
    client: reqwest::Client,
    base_url: Url,
}

/// Cluster identity reported by `GET /`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterInfo {
    /// Cluster name.
    pub cluster_name: String,
    /// Engine version.
    pub version: ClusterVersion,
}

/// Version block of [`ClusterInfo`].
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterVersion {
    /// Version number, e.g. `8.15.0`.
    pub number: String,
}

impl EsClient {
    /// Build a client from connection settings without contacting the engine.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Connection` when no credential option is
    /// complete or the credentials cannot be encoded as a header.
    pub fn new(config: &ConnectionConfig) -> Result<Self, SearchError> {
        let endpoint = config
            .resolve()
            .map_err(|e| SearchError::Connection(e.to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(value) = authorization_header(&endpoint.credentials)? {
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| SearchError::Connection(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            inner: Arc::new(EsClientInner {
                client,
                base_url: endpoint.url,
            }),
        })
    }

    /// Build a client and verify the engine answers.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Connection` when the engine is unreachable or
    /// rejects the credentials.
    pub async fn connect(config: &ConnectionConfig) -> Result<(Self, ClusterInfo), SearchError> {
        let client = Self::new(config)?;
        let info = client.ping().await?;
        tracing::info!(
            cluster = %info.cluster_name,
            version = %info.version.number,
            "Connected to search engine"
        );
        Ok((client, info))
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Fetch cluster identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the engine answers with an
    /// error status.
    #[instrument(skip(self), fields(endpoint = %self.inner.base_url))]
    pub async fn ping(&self) -> Result<ClusterInfo, SearchError> {
        let url = self.endpoint(&[])?;
        let body = self.send(self.inner.client.get(url)).await?;
        serde_json::from_value(body)
            .map_err(|e| SearchError::Decode(format!("unexpected cluster info: {e}")))
    }

    /// Execute a search request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the index does not exist, or
    /// the response cannot be parsed.
    #[instrument(skip(self, request), fields(index = %request.index, size = request.size))]
    pub async fn search(&self, request: &QueryRequest) -> Result<SearchResult, SearchError> {
        let url = self.endpoint(&[&request.index, "_search"])?;
        let body = request.to_body();
        tracing::debug!(body = %body, "Sending search request");

        let response = self.send(self.inner.client.post(url).json(&body)).await?;
        let result = SearchResult::from_response(&response)?;
        tracing::debug!(total = result.total, hits = result.hits.len(), "Search completed");
        Ok(result)
    }

    /// Fetch one document by id.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::NotFound` when the document does not exist, or
    /// another error if the request fails.
    #[instrument(skip(self))]
    pub async fn get_by_id(&self, index: &str, id: &str) -> Result<HitRecord, SearchError> {
        let url = self.endpoint(&[index, "_doc", id])?;
        let response = self
            .inner
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SearchError::from_transport(&e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SearchError::from_transport(&e))?;

        let not_found = || SearchError::NotFound {
            index: index.to_string(),
            id: id.to_string(),
        };

        if status == reqwest::StatusCode::NOT_FOUND {
            // A missing index also answers 404, but with an error body.
            return match serde_json::from_str::<Value>(&text) {
                Ok(body) if body.get("error").is_some() => {
                    Err(SearchError::from_status(status.as_u16(), &text))
                }
                _ => Err(not_found()),
            };
        }
        if !status.is_success() {
            return Err(SearchError::from_status(status.as_u16(), &text));
        }

        let body: Value = serde_json::from_str(&text)
            .map_err(|e| SearchError::Decode(format!("invalid document response: {e}")))?;
        if body.get("found").and_then(Value::as_bool) == Some(false) {
            return Err(not_found());
        }
        Ok(HitRecord::from_value(&body)?)
    }

    /// Send a request and return its JSON body, mapping error statuses.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value, SearchError> {
        let response = request
            .send()
            .await
            .map_err(|e| SearchError::from_transport(&e))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SearchError::from_transport(&e))?;

        if !status.is_success() {
            return Err(SearchError::from_status(status.as_u16(), &text));
        }
        serde_json::from_str(&text)
            .map_err(|e| SearchError::Decode(format!("invalid JSON response: {e}")))
    }

    /// Join percent-encoded path segments onto the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, SearchError> {
        let mut url = self.inner.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                SearchError::Connection("endpoint URL cannot be a base".to_string())
            })?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }
}

fn authorization_header(credentials: &Credentials) -> Result<Option<HeaderValue>, SearchError> {
    let raw = match credentials {
        Credentials::ApiKey(key) => format!("ApiKey {}", key.expose_secret()),
        Credentials::Basic { username, password } => {
            let token = STANDARD.encode(format!("{username}:{}", password.expose_secret()));
            format!("Basic {token}")
        }
        Credentials::None => return Ok(None),
    };
    let mut value = HeaderValue::from_str(&raw).map_err(|_| {
        SearchError::Connection("credentials contain invalid header characters".to_string())
    })?;
    value.set_sensitive(true);
    Ok(Some(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn local_config() -> ConnectionConfig {
        ConnectionConfig {
            endpoint_url: Some("http://localhost:9200".to_string()),
            ..ConnectionConfig::default()
        }
    }

    #[test]
    fn test_es_client_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<EsClient>();
    }

    #[test]
    fn test_es_client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<EsClient>();
    }

    #[test]
    fn test_new_without_endpoint_is_connection_error() {
        let result = EsClient::new(&ConnectionConfig::default());
        assert!(matches!(result, Err(SearchError::Connection(_))));
    }

    #[test]
    fn test_endpoint_encodes_index_names() {
        let client = EsClient::new(&local_config()).unwrap();
        let url = client
            .endpoint(&["customer_shopping_data.csv", "_search"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:9200/customer_shopping_data.csv/_search"
        );
        let url = client.endpoint(&["products", "_doc", "a/b c"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:9200/products/_doc/a%2Fb%20c");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let config = ConnectionConfig {
            endpoint_url: Some("https://proxy.example.net/es/".to_string()),
            ..ConnectionConfig::default()
        };
        let client = EsClient::new(&config).unwrap();
        let url = client.endpoint(&["faqs_data", "_search"]).unwrap();
        assert_eq!(url.as_str(), "https://proxy.example.net/es/faqs_data/_search");
    }

    #[test]
    fn test_authorization_headers() {
        let api = authorization_header(&Credentials::ApiKey(SecretString::from("abc")))
            .unwrap()
            .unwrap();
        assert_eq!(api.to_str().unwrap(), "ApiKey abc");
        assert!(api.is_sensitive());

        let basic = authorization_header(&Credentials::Basic {
            username: "elastic".to_string(),
            password: SecretString::from("changeme"),
        })
        .unwrap()
        .unwrap();
        assert_eq!(basic.to_str().unwrap(), "Basic ZWxhc3RpYzpjaGFuZ2VtZQ==");

        assert!(authorization_header(&Credentials::None).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unreachable_engine_is_connection_error() {
        let config = ConnectionConfig {
            endpoint_url: Some("http://127.0.0.1:1".to_string()),
            timeout: std::time::Duration::from_secs(2),
            ..ConnectionConfig::default()
        };
        let result = EsClient::connect(&config).await;
        assert!(matches!(result, Err(SearchError::Connection(_))));
    }
}
