//! Authentication header providers
//!
//! A provider is chosen once at client construction and asked for a header
//! set on every request. Static credentials are encoded once; token
//! credentials are read from the [`TokenManager`] on each call so a rotated
//! token is picked up by the next request.

use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use ekuiper_domain::constants::JSON_CONTENT_TYPE;
use ekuiper_domain::KuiperError;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};

use crate::credentials::TokenManager;

/// Produces the headers attached to one request.
///
/// Implementations must not block; header construction happens on the
/// request path.
pub trait AuthHeaderProvider: Send + Sync {
    fn headers(&self) -> Result<HeaderMap, KuiperError>;
}

fn base_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    headers.insert(ACCEPT, HeaderValue::from_static(JSON_CONTENT_TYPE));
    headers
}

fn sensitive_value(value: &str) -> Result<HeaderValue, KuiperError> {
    let mut header = HeaderValue::from_str(value).map_err(|e| {
        KuiperError::Credential(format!("Credential is not a valid header value: {e}"))
    })?;
    header.set_sensitive(true);
    Ok(header)
}

/// No credentials
#[derive(Debug, Clone, Default)]
pub struct NoAuth;

impl AuthHeaderProvider for NoAuth {
    fn headers(&self) -> Result<HeaderMap, KuiperError> {
        Ok(base_headers())
    }
}

/// Static basic-auth credentials, encoded once
#[derive(Clone)]
pub struct BasicAuth {
    headers: HeaderMap,
}

impl BasicAuth {
    /// # Errors
    /// Returns `KuiperError::Credential` if the encoded value is not a valid
    /// header value.
    pub fn new(username: &str, password: &str) -> Result<Self, KuiperError> {
        let encoded = STANDARD.encode(format!("{username}:{password}"));
        let mut headers = base_headers();
        headers.insert(AUTHORIZATION, sensitive_value(&format!("Basic {encoded}"))?);
        Ok(Self { headers })
    }
}

impl AuthHeaderProvider for BasicAuth {
    fn headers(&self) -> Result<HeaderMap, KuiperError> {
        Ok(self.headers.clone())
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth").finish_non_exhaustive()
    }
}

/// Signed-token credentials, read fresh for every request
pub struct TokenAuth {
    manager: Arc<TokenManager>,
    scheme: Option<String>,
}

impl TokenAuth {
    /// `scheme`, when set, prefixes the token (`Bearer <token>`); otherwise
    /// the bare token is sent.
    pub fn new(manager: Arc<TokenManager>, scheme: Option<String>) -> Self {
        Self { manager, scheme }
    }
}

impl AuthHeaderProvider for TokenAuth {
    fn headers(&self) -> Result<HeaderMap, KuiperError> {
        let mut headers = base_headers();
        if let Some(token) = self.manager.get_token()? {
            let value = match &self.scheme {
                Some(scheme) => format!("{scheme} {}", token.as_str()),
                None => token.as_str().to_string(),
            };
            headers.insert(AUTHORIZATION, sensitive_value(&value)?);
        }
        Ok(headers)
    }
}

impl fmt::Debug for TokenAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenAuth").field("scheme", &self.scheme).finish_non_exhaustive()
    }
}
