//! Running kernel identity.

use serde::Serialize;

use crate::error::{ProvisionError, Result};

/// Release and architecture of the running kernel.
///
/// Queried once at the start of a provisioning run and never re-derived,
/// even if the host boots another kernel meanwhile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KernelIdentity {
    release: String,
    arch: String,
}

impl KernelIdentity {
    /// Build an identity from known strings.
    pub fn new(release: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            release: release.into(),
            arch: arch.into(),
        }
    }

    /// Query the running kernel (`uname -r` / `uname -m`).
    #[cfg(unix)]
    pub fn current() -> Result<Self> {
        // SAFETY: utsname is plain old data; uname fills it in or returns -1.
        let mut uts: libc::utsname = unsafe { std::mem::zeroed() };
        let rc = unsafe { libc::uname(&mut uts) };
        if rc != 0 {
            return Err(std::io::Error::last_os_error().into());
        }
        let release = c_field(&uts.release);
        let arch = c_field(&uts.machine);
        if release.is_empty() {
            return Err(ProvisionError::Other(anyhow::anyhow!(
                "uname returned an empty kernel release"
            )));
        }
        tracing::debug!("Running kernel {} ({})", release, arch);
        Ok(Self { release, arch })
    }

    #[cfg(not(unix))]
    pub fn current() -> Result<Self> {
        Err(ProvisionError::UnsupportedPlatform {
            message: "kernel module provisioning requires Linux".to_string(),
        })
    }

    /// Full release string, e.g. `6.8.0-200.fc39.x86_64`.
    pub fn release(&self) -> &str {
        &self.release
    }

    /// Machine architecture, e.g. `x86_64`.
    pub fn arch(&self) -> &str {
        &self.arch
    }

    /// Portion of the release before the first `-`.
    pub fn base_version(&self) -> &str {
        self.release
            .split_once('-')
            .map(|(base, _)| base)
            .unwrap_or(&self.release)
    }

    /// Portion of the release after the first `-`, if any.
    pub fn release_suffix(&self) -> Option<&str> {
        self.release
            .split_once('-')
            .map(|(_, suffix)| suffix)
            .filter(|s| !s.is_empty())
    }

    /// Version used for upstream tags: a trailing `.0` patch level is dropped
    /// (`6.8.0` is tagged `v6.8`).
    pub fn upstream_version(&self) -> &str {
        let base = self.base_version();
        match base.strip_suffix(".0") {
            Some(short) if short.matches('.').count() == 1 => short,
            _ => base,
        }
    }
}

#[cfg(unix)]
fn c_field(field: &[libc::c_char]) -> String {
    let bytes: Vec<u8> = field
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fedora_release_splits() {
        let k = KernelIdentity::new("6.8.0-200.fc39.x86_64", "x86_64");
        assert_eq!(k.base_version(), "6.8.0");
        assert_eq!(k.release_suffix(), Some("200.fc39.x86_64"));
        assert_eq!(k.arch(), "x86_64");
    }

    #[test]
    fn suffix_splits_on_first_dash_only() {
        let k = KernelIdentity::new("6.8.0-45-generic", "x86_64");
        assert_eq!(k.base_version(), "6.8.0");
        assert_eq!(k.release_suffix(), Some("45-generic"));
    }

    #[test]
    fn release_without_dash_has_no_suffix() {
        let k = KernelIdentity::new("6.8.0", "x86_64");
        assert_eq!(k.base_version(), "6.8.0");
        assert_eq!(k.release_suffix(), None);
    }

    #[test]
    fn trailing_dash_has_no_suffix() {
        let k = KernelIdentity::new("6.8.0-", "x86_64");
        assert_eq!(k.release_suffix(), None);
    }

    #[test]
    fn upstream_version_drops_zero_patch() {
        assert_eq!(
            KernelIdentity::new("6.8.0-45-generic", "x86_64").upstream_version(),
            "6.8"
        );
        assert_eq!(
            KernelIdentity::new("6.8.12-300.fc40.x86_64", "x86_64").upstream_version(),
            "6.8.12"
        );
        assert_eq!(
            KernelIdentity::new("6.10-rc1", "x86_64").upstream_version(),
            "6.10"
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn current_kernel_has_release() {
        let k = KernelIdentity::current().unwrap();
        assert!(!k.release().is_empty());
        assert!(!k.arch().is_empty());
    }
}
