//! # eKuiper management client
//!
//! Infrastructure side of the eKuiper REST management SDK.
//!
//! This crate contains:
//! - The HTTP transport (reqwest) and response decoding
//! - Authentication header providers (none, basic, signed token)
//! - RSA key material, token minting and background rotation
//! - The endpoint dispatcher and typed per-resource APIs
//! - Configuration loading from environment and files
//!
//! ## Architecture
//! - Pure types (config, endpoint descriptors, errors) live in
//!   `ekuiper-domain`
//! - Everything doing I/O lives here

pub mod api;
pub mod auth;
pub mod config;
pub mod credentials;
pub mod errors;
pub mod http;

pub use api::{
    ConfigKeysApi, ConnectionsApi, Dispatcher, KuiperClient, KuiperClientBuilder, OverviewApi,
    QueryParams, RulesApi, StreamsApi,
};
pub use auth::{AuthHeaderProvider, BasicAuth, NoAuth, TokenAuth};
pub use credentials::{KeyStore, RotationError, Token, TokenManager, TokenRotation};
pub use errors::{CredentialError, TransportError};
pub use http::{HttpRequest, HttpResponse, ReqwestTransport, ReqwestTransportBuilder, Transport};
