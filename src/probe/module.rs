//! Read-only capability check.
//!
//! Ready means the module appears in the loaded-module list and its
//! write-support parameter reads `Y` or `1`. Missing status files count as
//! not ready; nothing here requires privilege or mutates the host.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::ProvisionConfig;

/// Verdict of a capability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    Ready,
    NotReady,
}

impl Readiness {
    /// `true` for [`Readiness::Ready`].
    pub fn is_ready(self) -> bool {
        self == Self::Ready
    }
}

/// Detailed probe result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeReport {
    /// Module name that was checked.
    pub module: String,
    /// Module appears in the loaded-module list.
    pub loaded: bool,
    /// Write-support parameter reads as enabled.
    pub write_support: bool,
    /// EC register file exists (informational; debugfs may be unmounted).
    pub device_present: bool,
}

impl ProbeReport {
    /// Overall verdict.
    pub fn readiness(&self) -> Readiness {
        if self.loaded && self.write_support {
            Readiness::Ready
        } else {
            Readiness::NotReady
        }
    }
}

/// Checks the capability module's status files.
#[derive(Debug, Clone)]
pub struct ModuleProbe {
    module: String,
    proc_modules: PathBuf,
    write_parameter: PathBuf,
    ec_device: PathBuf,
}

impl ModuleProbe {
    /// Build a probe from configuration.
    pub fn new(config: &ProvisionConfig) -> Self {
        Self {
            module: config.module.name.clone(),
            proc_modules: config.paths.proc_modules.clone(),
            write_parameter: config.write_parameter_path(),
            ec_device: config.paths.ec_device.clone(),
        }
    }

    /// Module name being probed.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Quick verdict.
    pub fn check(&self) -> Readiness {
        let readiness = self.report().readiness();
        tracing::debug!("Probe {}: {:?}", self.module, readiness);
        readiness
    }

    /// Full report.
    pub fn report(&self) -> ProbeReport {
        ProbeReport {
            module: self.module.clone(),
            loaded: self.is_loaded(),
            write_support: self.write_support_enabled(),
            device_present: self.ec_device.exists(),
        }
    }

    /// Module is listed in the loaded-module file.
    pub fn is_loaded(&self) -> bool {
        fs::read_to_string(&self.proc_modules)
            .map(|content| module_listed(&content, &self.module))
            .unwrap_or(false)
    }

    /// Write-support parameter reads `Y` or `1`.
    pub fn write_support_enabled(&self) -> bool {
        read_flag(&self.write_parameter)
    }
}

/// `true` when `module` is the first field of any line.
fn module_listed(proc_modules: &str, module: &str) -> bool {
    proc_modules
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .any(|name| name == module)
}

fn read_flag(path: &Path) -> bool {
    match fs::read_to_string(path) {
        Ok(content) => matches!(content.trim(), "Y" | "1"),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const LOADED: &str = "\
ec_sys 16384 0 - Live 0x0000000000000000
nvme 61440 3 - Live 0x0000000000000000
";

    fn probe_with(proc_modules: Option<&str>, param: Option<&str>) -> (TempDir, ModuleProbe) {
        let temp = TempDir::new().unwrap();
        let mut config = ProvisionConfig::default();
        config.paths.proc_modules = temp.path().join("modules");
        config.paths.sys_module_root = temp.path().join("sys");
        config.paths.ec_device = temp.path().join("io");

        if let Some(content) = proc_modules {
            fs::write(&config.paths.proc_modules, content).unwrap();
        }
        if let Some(value) = param {
            let path = config.write_parameter_path();
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, value).unwrap();
        }
        let probe = ModuleProbe::new(&config);
        (temp, probe)
    }

    #[test]
    fn ready_when_loaded_with_y() {
        let (_t, probe) = probe_with(Some(LOADED), Some("Y\n"));
        assert_eq!(probe.check(), Readiness::Ready);
    }

    #[test]
    fn ready_when_loaded_with_one() {
        let (_t, probe) = probe_with(Some(LOADED), Some("1\n"));
        assert_eq!(probe.check(), Readiness::Ready);
    }

    #[test]
    fn not_ready_when_write_disabled() {
        let (_t, probe) = probe_with(Some(LOADED), Some("N\n"));
        assert_eq!(probe.check(), Readiness::NotReady);
        let report = probe.report();
        assert!(report.loaded);
        assert!(!report.write_support);
    }

    #[test]
    fn not_ready_when_not_loaded() {
        let (_t, probe) = probe_with(Some("nvme 61440 3 - Live 0x0\n"), Some("Y\n"));
        assert_eq!(probe.check(), Readiness::NotReady);
    }

    #[test]
    fn not_ready_when_neither() {
        let (_t, probe) = probe_with(Some("nvme 61440 3 - Live 0x0\n"), Some("N\n"));
        assert_eq!(probe.check(), Readiness::NotReady);
    }

    #[test]
    fn missing_files_are_not_ready() {
        let (_t, probe) = probe_with(None, None);
        assert_eq!(probe.check(), Readiness::NotReady);
        let report = probe.report();
        assert!(!report.loaded);
        assert!(!report.write_support);
        assert!(!report.device_present);
    }

    #[test]
    fn module_name_must_match_whole_field() {
        assert!(!module_listed("ec_sys_extra 100 0 - Live 0x0\n", "ec_sys"));
        assert!(!module_listed("foo 100 0 ec_sys, Live 0x0\n", "ec_sys"));
        assert!(module_listed(LOADED, "ec_sys"));
    }

    #[test]
    fn report_serializes_to_json() {
        let (_t, probe) = probe_with(Some(LOADED), Some("Y"));
        let json = serde_json::to_string(&probe.report()).unwrap();
        assert!(json.contains("\"loaded\":true"));
        assert!(json.contains("\"write_support\":true"));
    }
}
