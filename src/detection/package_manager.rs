//! Package manager family detection.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::shell::resolve_tool_path;

/// Supported package ecosystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageFamily {
    /// rpm/dnf (Fedora, RHEL): full kernel source rebuild.
    Dnf,
    /// apt/dpkg (Debian, Ubuntu): out-of-tree single-file build.
    Apt,
}

impl PackageFamily {
    /// Executable whose presence identifies the family.
    pub fn executable(self) -> &'static str {
        match self {
            Self::Dnf => "dnf",
            Self::Apt => "apt-get",
        }
    }
}

impl fmt::Display for PackageFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dnf => write!(f, "dnf (Fedora/RHEL)"),
            Self::Apt => write!(f, "apt (Debian/Ubuntu)"),
        }
    }
}

/// Detects the host's package family from executables on a search path.
pub struct PackageManagerDetector;

impl PackageManagerDetector {
    /// Detect using the process PATH.
    pub fn detect() -> Option<PackageFamily> {
        Self::detect_in(&crate::shell::search_path())
    }

    /// Detect using explicit search path entries. dnf is checked first.
    pub fn detect_in(path_entries: &[PathBuf]) -> Option<PackageFamily> {
        let family = [PackageFamily::Dnf, PackageFamily::Apt]
            .into_iter()
            .find(|f| resolve_tool_path(f.executable(), path_entries).is_some());
        tracing::debug!("Detected package family: {:?}", family);
        family
    }
}
