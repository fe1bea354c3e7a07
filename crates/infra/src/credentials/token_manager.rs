//! Token manager
//!
//! Mints RS256 tokens from the [`KeyStore`] and holds the single current
//! token. Readers load it without locking; [`TokenManager::refresh`] swaps in
//! a new one atomically, so a reader sees either the old or the new token.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, TimeZone, Utc};
use ekuiper_domain::JwtConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::key_store::KeyStore;
use crate::errors::CredentialError;

/// Registered claims carried by every token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// A signed token and its validity window
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    value: String,
    id: Uuid,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl Token {
    /// Compact JWS representation.
    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("id", &self.id)
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

struct Signer {
    key_store: Arc<KeyStore>,
    issuer: String,
    audience: String,
    validity: Duration,
}

/// Issues tokens and holds the current one.
pub struct TokenManager {
    signer: Option<Signer>,
    current: ArcSwapOption<Token>,
}

impl TokenManager {
    pub fn new(key_store: Arc<KeyStore>, config: &JwtConfig) -> Self {
        Self {
            signer: Some(Signer {
                key_store,
                issuer: config.issuer.clone(),
                audience: config.audience.clone(),
                validity: config.token_validity(),
            }),
            current: ArcSwapOption::empty(),
        }
    }

    /// A manager that never issues tokens.
    pub fn disabled() -> Self {
        Self { signer: None, current: ArcSwapOption::empty() }
    }

    pub fn is_enabled(&self) -> bool {
        self.signer.is_some()
    }

    /// Current token, minting the first one if none exists yet.
    ///
    /// Returns `Ok(None)` when token auth is disabled, without touching any
    /// key material. Concurrent first calls may each mint, but all of them
    /// return the token that won the race.
    ///
    /// # Errors
    /// Returns `CredentialError::Signing` if the first mint fails.
    pub fn get_token(&self) -> Result<Option<Arc<Token>>, CredentialError> {
        let Some(signer) = &self.signer else {
            return Ok(None);
        };

        if let Some(token) = self.current.load_full() {
            return Ok(Some(token));
        }

        let minted = Arc::new(mint(signer)?);
        self.current.rcu(|current| current.clone().or_else(|| Some(Arc::clone(&minted))));
        Ok(Some(self.current.load_full().unwrap_or(minted)))
    }

    /// Mint a new token and make it current.
    ///
    /// # Errors
    /// Returns `CredentialError::Disabled` when token auth is off, or
    /// `CredentialError::Signing` if minting fails. On error the previous
    /// token stays current.
    pub fn refresh(&self) -> Result<Arc<Token>, CredentialError> {
        let signer = self.signer.as_ref().ok_or(CredentialError::Disabled)?;
        let token = Arc::new(mint(signer)?);
        self.current.store(Some(Arc::clone(&token)));
        debug!(token_id = %token.id, expires_at = %token.expires_at, "Token refreshed");
        Ok(token)
    }
}

impl fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenManager")
            .field("enabled", &self.is_enabled())
            .field("current", &self.current.load_full())
            .finish()
    }
}

fn mint(signer: &Signer) -> Result<Token, CredentialError> {
    let ttl = i64::try_from(signer.validity.as_secs())
        .map_err(|_| CredentialError::Signing("token validity out of range".to_string()))?;

    let iat = Utc::now().timestamp();
    let exp = iat.saturating_add(ttl);
    let id = Uuid::new_v4();

    let claims = Claims {
        iss: signer.issuer.clone(),
        aud: signer.audience.clone(),
        iat,
        exp,
        jti: id.to_string(),
    };
    let value = signer.key_store.sign(&claims)?;

    Ok(Token {
        value,
        id,
        issued_at: timestamp(iat)?,
        expires_at: timestamp(exp)?,
    })
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, CredentialError> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| CredentialError::Signing(format!("timestamp out of range: {secs}")))
}
