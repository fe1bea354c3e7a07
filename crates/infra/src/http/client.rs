use std::time::Duration;

use async_trait::async_trait;
use ekuiper_domain::constants::{DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_READ_TIMEOUT_MS};
use ekuiper_domain::{HttpVerb, KuiperError};
use reqwest::header::HeaderMap;
use reqwest::{Client as ReqwestClient, Method};
use tracing::debug;
use url::Url;

use crate::errors::TransportError;

/// One fully-resolved HTTP exchange.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub verb: HttpVerb,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

/// A successful (2xx) response with its body read to a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Performs exactly one HTTP exchange per call.
///
/// Non-2xx answers are reported as [`TransportError::Status`] with the body
/// preserved, so the caller can look for an engine error inside it.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// [`Transport`] backed by reqwest, with independent connect and read timeouts.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: ReqwestClient,
}

impl ReqwestTransport {
    /// Start building a new transport.
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::default()
    }

    /// Convenience constructor with default timeouts.
    pub fn new() -> Result<Self, KuiperError> {
        Self::builder().build()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = to_method(request.verb);
        let url = request.url.to_string();
        debug!(%method, %url, "sending HTTP request");

        let mut builder = self.client.request(method.clone(), request.url).headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|err| {
            debug!(%method, %url, error = %err, "HTTP request failed");
            TransportError::from_reqwest(&err, &url)
        })?;

        let status = response.status();
        debug!(%method, %url, %status, "received HTTP response");

        let body = response.text().await.map_err(|err| TransportError::from_reqwest(&err, &url))?;

        if status.is_success() {
            Ok(HttpResponse { status: status.as_u16(), body })
        } else {
            Err(TransportError::Status { url, status: status.as_u16(), body })
        }
    }
}

/// Builder for [`ReqwestTransport`].
#[derive(Debug)]
pub struct ReqwestTransportBuilder {
    connect_timeout: Duration,
    read_timeout: Duration,
    user_agent: Option<String>,
}

impl Default for ReqwestTransportBuilder {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            read_timeout: Duration::from_millis(DEFAULT_READ_TIMEOUT_MS),
            user_agent: None,
        }
    }
}

impl ReqwestTransportBuilder {
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> Result<ReqwestTransport, KuiperError> {
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("ekuiper-rs/{}", env!("CARGO_PKG_VERSION")));

        let client = ReqwestClient::builder()
            .connect_timeout(self.connect_timeout)
            .read_timeout(self.read_timeout)
            .user_agent(user_agent)
            .no_proxy()
            .build()
            .map_err(|err| {
                KuiperError::Configuration(format!("Failed to build HTTP client: {err}"))
            })?;

        Ok(ReqwestTransport { client })
    }
}

pub(crate) fn to_method(verb: HttpVerb) -> Method {
    match verb {
        HttpVerb::Get => Method::GET,
        HttpVerb::Post => Method::POST,
        HttpVerb::Put => Method::PUT,
        HttpVerb::Delete => Method::DELETE,
    }
}
