//! Infrastructure error types and their conversions into `KuiperError`.

pub mod conversions;

pub use conversions::{CredentialError, TransportError};
