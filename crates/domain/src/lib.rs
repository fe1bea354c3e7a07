//! # eKuiper Domain
//!
//! Pure types for the eKuiper management API client.
//!
//! This crate contains:
//! - The error taxonomy and engine error-code table
//! - Client configuration structures
//! - Endpoint descriptors, response shapes and the endpoint registry
//! - Response records with a stable schema
//!
//! ## Architecture
//! - No I/O, no async runtime
//! - Only external dependencies allowed

pub mod config;
pub mod constants;
pub mod endpoint;
pub mod errors;
pub mod models;
pub mod registry;

// Re-export commonly used items
pub use config::*;
pub use endpoint::{
    placeholder_count, Endpoint, EndpointDescriptor, HttpVerb, Operation, RequestShape,
    ResponseShape,
};
pub use errors::*;
pub use models::{RuleSummary, ServerInfo, StreamDefinition};
pub use registry::{standard, EndpointRegistry, RegistryError};
