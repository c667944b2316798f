//! Error types for provisioning operations.
//!
//! This module defines [`ProvisionError`], the error type returned by every
//! stage of the provisioning flow, and a [`Result`] type alias.
//!
//! # Error Handling Strategy
//!
//! - Failures inside a build strategy are wrapped with the [`StepId`] that
//!   produced them, so the user always learns which step broke
//! - Raw command failures surface as [`ProvisionError::CommandFailed`] and are
//!   re-tagged with their step by the pipeline
//! - Use `anyhow::Error` (via `ProvisionError::Other`) for unexpected errors

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Identifies one numbered step of a build strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepId {
    /// Strategy name ("dnf" or "apt").
    pub strategy: &'static str,
    /// 1-based step number.
    pub number: u8,
    /// Number of steps in the strategy.
    pub total: u8,
    /// Short human-readable label.
    pub label: &'static str,
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} step {}/{} ({})",
            self.strategy, self.number, self.total, self.label
        )
    }
}

/// Core error type for provisioning operations.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The capability module is not loaded with write support.
    ///
    /// `step` is set when the check that failed closed a build strategy.
    #[error("Module '{module}' is not ready{}: {reason}", after_step(.step))]
    EnvironmentUnready {
        module: String,
        reason: String,
        step: Option<StepId>,
    },

    /// No supported package manager was found.
    #[error("Unsupported platform: {message}")]
    UnsupportedPlatform { message: String },

    /// Installing toolchain or build dependencies failed.
    #[error("Dependency install failed at {step}: {message}")]
    DependencyInstallFailed { step: StepId, message: String },

    /// Downloading or locating kernel source failed.
    #[error("Source acquisition failed at {step}: {message}")]
    SourceAcquisitionFailed { step: StepId, message: String },

    /// Extracting, locating, or patching the source tree failed.
    #[error("Source preparation failed at {step}: {message}")]
    SourcePreparationFailed { step: StepId, message: String },

    /// Compilation failed.
    #[error("Build failed at {step}: {message}")]
    BuildFailed { step: StepId, message: String },

    /// An expected artifact was not produced.
    #[error("Artifact missing at {step}: {path}")]
    ArtifactMissing { step: StepId, path: PathBuf },

    /// Copying the module, refreshing the index, or loading it failed.
    #[error("Install failed at {step}: {message}")]
    InstallFailed { step: StepId, message: String },

    /// A command exited unsuccessfully.
    #[error("Command failed with exit code {code:?}: {command}")]
    CommandFailed { command: String, code: Option<i32> },

    /// A command could not be started at all.
    #[error("Could not run {command}: {source}")]
    CommandSpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Operation needs root and no elevation method is configured.
    #[error("'{operation}' requires root privileges (run with sudo or set use_sudo: true)")]
    PrivilegeRequired { operation: String },

    /// Explicitly requested configuration file does not exist.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid configuration values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ProvisionError {
    /// The step this error is attributed to, if any.
    pub fn step(&self) -> Option<StepId> {
        match self {
            Self::DependencyInstallFailed { step, .. }
            | Self::SourceAcquisitionFailed { step, .. }
            | Self::SourcePreparationFailed { step, .. }
            | Self::BuildFailed { step, .. }
            | Self::ArtifactMissing { step, .. }
            | Self::InstallFailed { step, .. } => Some(*step),
            Self::EnvironmentUnready { step, .. } => *step,
            _ => None,
        }
    }
}

fn after_step(step: &Option<StepId>) -> String {
    step.map(|s| format!(" after {}", s)).unwrap_or_default()
}

/// Result type alias for provisioning operations.
pub type Result<T> = std::result::Result<T, ProvisionError>;
