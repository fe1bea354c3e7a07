//! Credential lifecycle
//!
//! - [`KeyStore`]: RSA key pair on disk, public key deployment
//! - [`TokenManager`]: token minting and the shared current token
//! - [`TokenRotation`]: periodic background refresh

pub mod key_store;
pub mod rotation;
pub mod token_manager;

pub use key_store::KeyStore;
pub use rotation::{RotationError, TokenRotation};
pub use token_manager::{Claims, Token, TokenManager};
