//! Ephemeral build directory.

use std::path::Path;

use tempfile::{Builder, TempDir};

use crate::error::Result;

const PREFIX: &str = "ec_sys_build.";

/// A scratch directory owned by exactly one pipeline run.
///
/// The directory is removed when the workspace is dropped, so every exit
/// path (success, step failure, early return, unwinding panic) cleans up.
/// Killing the process outright skips the cleanup.
#[derive(Debug)]
pub struct BuildWorkspace {
    dir: TempDir,
}

impl BuildWorkspace {
    /// Create a fresh workspace under `parent`, or the system temp directory.
    pub fn create(parent: Option<&Path>) -> Result<Self> {
        let mut builder = Builder::new();
        builder.prefix(PREFIX);
        let dir = match parent {
            Some(parent) => builder.tempdir_in(parent)?,
            None => builder.tempdir()?,
        };
        tracing::debug!("Created workspace {}", dir.path().display());
        Ok(Self { dir })
    }

    /// Workspace root.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the workspace now, surfacing any removal error.
    pub fn close(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        tracing::debug!("Removed workspace {}", path.display());
        Ok(())
    }
}
