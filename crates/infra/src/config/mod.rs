//! Client configuration loading
//!
//! Reads [`ekuiper_domain::ClientConfig`] from the environment or from a
//! JSON/TOML file.

pub mod loader;

pub use loader::{load, load_from_env, load_from_file, probe_config_paths};
