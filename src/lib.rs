//! ec-provision - Make the `ec_sys` kernel module available with write support.
//!
//! Userspace tools that read or write embedded-controller registers need
//! `ec_sys` loaded with `write_support=1`. Many distribution kernels either
//! do not ship the module or ship it without debugfs support, so this crate
//! checks the host, tries a cheap load, and otherwise builds and installs
//! the module for the exact running kernel.
//!
//! # Modules
//!
//! - [`probe`] - Read-only readiness check
//! - [`activation`] - Privileged load/reload attempt
//! - [`detection`] - Package manager family detection
//! - [`pipeline`] - Build-and-install strategies and the run state machine
//! - [`progress`] - Ordered progress stream between pipeline and caller
//! - [`config`] - Configuration loading, defaults, and validation
//! - [`kernel`] - Running kernel identity
//! - [`shell`] - External command execution
//! - [`fetch`] - Upstream source download
//! - [`error`] - Error types and result aliases
//! - [`ui`] - Terminal output, prompts, and spinners
//! - [`cli`] - Command-line interface and argument parsing
//!
//! # Example
//!
//! ```
//! use ec_provision::config::ProvisionConfig;
//! use ec_provision::probe::ModuleProbe;
//!
//! let mut config = ProvisionConfig::default();
//! config.paths.proc_modules = "/nonexistent/modules".into();
//!
//! // Missing status files never count as ready
//! assert!(!ModuleProbe::new(&config).check().is_ready());
//! ```
//!
//! End-to-end pipeline runs with scripted commands live in the integration
//! tests.

pub mod activation;
pub mod cli;
pub mod config;
pub mod detection;
pub mod error;
pub mod fetch;
pub mod kernel;
pub mod pipeline;
pub mod probe;
pub mod progress;
pub mod shell;
pub mod ui;

pub use error::{ProvisionError, Result};
