//! eKuiper management API
//!
//! [`KuiperClient`] is the entry point. Each resource family has its own
//! thin API type over a shared [`Dispatcher`], which resolves endpoint
//! descriptors into HTTP requests and maps responses and failures.

pub mod client;
pub mod config_keys;
pub mod connections;
pub mod dispatcher;
pub mod overview;
pub mod rules;
pub mod streams;

pub use client::{KuiperClient, KuiperClientBuilder};
pub use config_keys::ConfigKeysApi;
pub use connections::ConnectionsApi;
pub use dispatcher::{Dispatcher, QueryParams};
pub use overview::OverviewApi;
pub use rules::RulesApi;
pub use streams::StreamsApi;
