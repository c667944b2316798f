//! Platform queries: CI detection, privilege, and PATH resolution.

use std::path::{Path, PathBuf};

/// Check if running in a CI environment.
///
/// Used to force non-interactive mode in `main()`. Checks common CI
/// environment variables: `CI`, `GITHUB_ACTIONS`, `GITLAB_CI`, `CIRCLECI`,
/// `TRAVIS`, `JENKINS_URL`.
pub fn is_ci() -> bool {
    std::env::var("CI").is_ok()
        || std::env::var("GITHUB_ACTIONS").is_ok()
        || std::env::var("GITLAB_CI").is_ok()
        || std::env::var("CIRCLECI").is_ok()
        || std::env::var("TRAVIS").is_ok()
        || std::env::var("JENKINS_URL").is_ok()
}

/// Check if running as root.
pub fn is_elevated() -> bool {
    #[cfg(unix)]
    {
        // SAFETY: geteuid() is a simple syscall that returns the effective user ID
        unsafe { libc::geteuid() == 0 }
    }

    #[cfg(not(unix))]
    {
        false
    }
}

/// Check whether a file has executable permission bits set.
#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
pub fn is_executable(_path: &Path) -> bool {
    true
}

/// Parse the PATH environment variable into a list of directories.
pub fn search_path() -> Vec<PathBuf> {
    std::env::var_os("PATH")
        .map(|path| std::env::split_paths(&path).collect())
        .unwrap_or_default()
}

/// Resolve a tool's binary path by iterating over `path_entries`.
///
/// Returns the first match that exists and is executable. Does not shell
/// out to `which`.
pub fn resolve_tool_path(tool: &str, path_entries: &[PathBuf]) -> Option<PathBuf> {
    for dir in path_entries {
        let candidate = dir.join(tool);
        if candidate.is_file() && is_executable(&candidate) {
            return Some(candidate);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[cfg(unix)]
    fn make_executable(path: &Path) {
        use std::os::unix::fs::PermissionsExt;
        fs::write(path, "#!/bin/sh\n").unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn resolves_first_executable_match() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        make_executable(&b.path().join("dnf"));
        make_executable(&a.path().join("dnf"));

        let entries = vec![a.path().to_path_buf(), b.path().to_path_buf()];
        assert_eq!(
            resolve_tool_path("dnf", &entries),
            Some(a.path().join("dnf"))
        );
    }

    #[cfg(unix)]
    #[test]
    fn skips_non_executable_files() {
        let a = TempDir::new().unwrap();
        fs::write(a.path().join("apt-get"), "").unwrap();
        let entries = vec![a.path().to_path_buf()];
        assert_eq!(resolve_tool_path("apt-get", &entries), None);
    }

    #[test]
    fn missing_tool_is_none() {
        let a = TempDir::new().unwrap();
        assert_eq!(resolve_tool_path("dnf", &[a.path().to_path_buf()]), None);
    }

    #[test]
    fn is_ci_does_not_panic() {
        let _ = is_ci();
    }
}
