//! eKuiper management client
//!
//! [`KuiperClient`] wires configuration, credentials, transport and the
//! endpoint registry together and hands out the per-resource APIs.

use std::sync::Arc;

use ekuiper_domain::{AuthMode, ClientConfig, EndpointRegistry, KuiperError, Result};
use tracing::{debug, info, instrument, warn};

use super::config_keys::ConfigKeysApi;
use super::connections::ConnectionsApi;
use super::dispatcher::Dispatcher;
use super::overview::OverviewApi;
use super::rules::RulesApi;
use super::streams::StreamsApi;
use crate::auth::{AuthHeaderProvider, BasicAuth, NoAuth, TokenAuth};
use crate::credentials::{KeyStore, TokenManager, TokenRotation};
use crate::http::{ReqwestTransport, Transport};

/// Client for the eKuiper REST management API
pub struct KuiperClient {
    config: ClientConfig,
    dispatcher: Arc<Dispatcher>,
    token_manager: Option<Arc<TokenManager>>,
    rotation: Option<TokenRotation>,
}

impl KuiperClient {
    /// Create a builder for fluent configuration
    pub fn builder() -> KuiperClientBuilder {
        KuiperClientBuilder::default()
    }

    /// Build a client from `config` with the default transport.
    ///
    /// # Errors
    /// See [`KuiperClientBuilder::build`].
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        Self::builder().config(config).build().await
    }

    pub fn overview(&self) -> OverviewApi {
        OverviewApi::new(Arc::clone(&self.dispatcher))
    }

    pub fn streams(&self) -> StreamsApi {
        StreamsApi::new(Arc::clone(&self.dispatcher))
    }

    pub fn rules(&self) -> RulesApi {
        RulesApi::new(Arc::clone(&self.dispatcher))
    }

    pub fn connections(&self) -> ConnectionsApi {
        ConnectionsApi::new(Arc::clone(&self.dispatcher))
    }

    pub fn config_keys(&self) -> ConfigKeysApi {
        ConfigKeysApi::new(Arc::clone(&self.dispatcher))
    }

    /// Raw dispatcher, for operations not covered by the typed APIs.
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn registry(&self) -> &EndpointRegistry {
        self.dispatcher.registry()
    }

    /// Token manager, present only when token auth is configured.
    pub fn token_manager(&self) -> Option<&Arc<TokenManager>> {
        self.token_manager.as_ref()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Stop background token rotation.
    ///
    /// Calling this more than once is harmless.
    pub async fn shutdown(&mut self) {
        if let Some(mut rotation) = self.rotation.take() {
            if let Err(e) = rotation.stop().await {
                warn!(error = %e, "token rotation did not stop cleanly");
            }
        }
    }
}

impl std::fmt::Debug for KuiperClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KuiperClient")
            .field("base_url", &self.dispatcher.base_url())
            .field("auth_mode", &self.config.auth_mode())
            .field("rotating", &self.rotation.is_some())
            .finish()
    }
}

/// Builder for [`KuiperClient`]
#[derive(Default)]
pub struct KuiperClientBuilder {
    config: Option<ClientConfig>,
    transport: Option<Arc<dyn Transport>>,
    auth: Option<Arc<dyn AuthHeaderProvider>>,
}

impl KuiperClientBuilder {
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Replace the default reqwest transport
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use `auth` instead of the provider derived from the configuration.
    ///
    /// No key material is touched and no rotation is started.
    pub fn auth_provider(mut self, auth: Arc<dyn AuthHeaderProvider>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Build the client
    ///
    /// With token auth enabled this loads or generates the key pair, deploys
    /// the public key, mints the first token and starts rotation, so it must
    /// run inside a Tokio runtime.
    ///
    /// # Errors
    ///
    /// - `KuiperError::Configuration` for invalid settings or when rotation
    ///   cannot be started
    /// - `KuiperError::Credential` when key material cannot be loaded or a
    ///   token cannot be signed
    #[instrument(skip(self))]
    pub async fn build(self) -> Result<KuiperClient> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let registry = Arc::new(EndpointRegistry::standard()?);
        debug!(endpoints = registry.len(), "endpoint registry ready");

        let mut token_manager = None;
        let mut rotation = None;

        let auth: Arc<dyn AuthHeaderProvider> = match self.auth {
            Some(auth) => auth,
            None => match config.auth_mode() {
                AuthMode::Jwt => {
                    let jwt = config.jwt.clone();
                    let key_store = tokio::task::spawn_blocking(move || KeyStore::initialize(&jwt))
                        .await
                        .map_err(|e| {
                            KuiperError::Credential(format!("Key initialization task failed: {e}"))
                        })??;

                    let manager = Arc::new(TokenManager::new(Arc::new(key_store), &config.jwt));
                    manager.get_token()?;

                    let mut task =
                        TokenRotation::new(Arc::clone(&manager), config.jwt.refresh_interval());
                    task.start().await.map_err(|e| {
                        KuiperError::Configuration(format!("Failed to start token rotation: {e}"))
                    })?;

                    let provider = TokenAuth::new(Arc::clone(&manager), config.jwt.header_scheme.clone());
                    token_manager = Some(manager);
                    rotation = Some(task);
                    Arc::new(provider)
                }
                AuthMode::Basic => {
                    let username = config.basic.username.as_deref().unwrap_or_default();
                    let password = config.basic.password.as_deref().unwrap_or_default();
                    Arc::new(BasicAuth::new(username, password)?)
                }
                AuthMode::None => Arc::new(NoAuth),
            },
        };

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(
                ReqwestTransport::builder()
                    .connect_timeout(config.connect_timeout())
                    .read_timeout(config.read_timeout())
                    .build()?,
            ),
        };

        let dispatcher = Dispatcher::new(&config.base_url(), transport, auth, registry)?;
        info!(base_url = %dispatcher.base_url(), auth_mode = ?config.auth_mode(), "eKuiper client ready");

        Ok(KuiperClient { config, dispatcher: Arc::new(dispatcher), token_manager, rotation })
    }
}
