//! Configuration loading and schema.
//!
//! The configuration is an immutable [`ProvisionConfig`] value: load it
//! once with [`load_config`] and pass it down by reference.

pub mod loader;
pub mod schema;

pub use loader::{load_config, load_config_file, DEFAULT_CONFIG_PATH};
pub use schema::{BuildConfig, ModuleConfig, PathsConfig, ProvisionConfig};
