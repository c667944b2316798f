//! Configuration schema.
//!
//! Every field has a default matching a stock Linux host, so an empty
//! file (or no file at all) yields a working configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ProvisionError, Result};

/// Top-level provisioning configuration.
///
/// Built once by the caller and handed to every component by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionConfig {
    /// The capability module being provisioned.
    pub module: ModuleConfig,

    /// Host filesystem locations.
    pub paths: PathsConfig,

    /// Build settings.
    pub build: BuildConfig,

    /// Prefix privileged commands with `sudo`.
    pub use_sudo: bool,

    /// Capacity of the bounded progress queue.
    pub progress_capacity: usize,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            module: ModuleConfig::default(),
            paths: PathsConfig::default(),
            build: BuildConfig::default(),
            use_sudo: false,
            progress_capacity: 10,
        }
    }
}

/// Module identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    /// Kernel module name.
    pub name: String,
    /// Module parameter that gates writes.
    pub write_parameter: String,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            name: "ec_sys".to_string(),
            write_parameter: "write_support".to_string(),
        }
    }
}

/// Host paths consulted or written during provisioning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Loaded-module list.
    pub proc_modules: PathBuf,
    /// Root of per-module sysfs directories.
    pub sys_module_root: PathBuf,
    /// Root of per-release module directories.
    pub modules_root: PathBuf,
    /// Directory holding installed kernel configs (`config-<release>`).
    pub boot_dir: PathBuf,
    /// Directory holding installed kernel-devel trees.
    pub kernel_source_root: PathBuf,
    /// EC register file exposed once the module is active.
    pub ec_device: PathBuf,
    /// Parent directory for build workspaces (system temp when unset).
    pub work_root: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            proc_modules: PathBuf::from("/proc/modules"),
            sys_module_root: PathBuf::from("/sys/module"),
            modules_root: PathBuf::from("/lib/modules"),
            boot_dir: PathBuf::from("/boot"),
            kernel_source_root: PathBuf::from("/usr/src/kernels"),
            ec_device: PathBuf::from("/sys/kernel/debug/ec/ec0/io"),
            work_root: None,
        }
    }
}

/// Build settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Kernel config option enabling the driver.
    pub debug_option: String,
    /// Driver subtree compiled in a full source build.
    pub driver_subdir: String,
    /// Raw URL of the driver source; `{version}` becomes the upstream tag version.
    pub upstream_url: String,
    /// HTTP timeout for the single-file download, in seconds.
    pub fetch_timeout_secs: u64,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            debug_option: "CONFIG_ACPI_EC_DEBUGFS".to_string(),
            driver_subdir: "drivers/acpi".to_string(),
            upstream_url:
                "https://raw.githubusercontent.com/torvalds/linux/refs/tags/v{version}/drivers/acpi/ec_sys.c"
                    .to_string(),
            fetch_timeout_secs: 30,
        }
    }
}

impl ProvisionConfig {
    /// Check values that cannot be expressed in the type system.
    pub fn validate(&self) -> Result<()> {
        if self.module.name.trim().is_empty() {
            return Err(invalid("module.name must not be empty"));
        }
        if self.module.write_parameter.trim().is_empty() {
            return Err(invalid("module.write_parameter must not be empty"));
        }
        if self.progress_capacity == 0 {
            return Err(invalid("progress_capacity must be at least 1"));
        }
        if !self.build.upstream_url.contains("{version}") {
            return Err(invalid("build.upstream_url must contain {version}"));
        }
        if self.build.fetch_timeout_secs == 0 {
            return Err(invalid("build.fetch_timeout_secs must be at least 1"));
        }
        Ok(())
    }

    /// File name of the compiled module, e.g. `ec_sys.ko`.
    pub fn artifact_name(&self) -> String {
        format!("{}.ko", self.module.name)
    }

    /// File name of the driver source, e.g. `ec_sys.c`.
    pub fn source_name(&self) -> String {
        format!("{}.c", self.module.name)
    }

    /// Sysfs file holding the write-support parameter.
    pub fn write_parameter_path(&self) -> PathBuf {
        self.paths
            .sys_module_root
            .join(&self.module.name)
            .join("parameters")
            .join(&self.module.write_parameter)
    }

    /// `<modules_root>/<release>`.
    pub fn release_modules_dir(&self, release: &str) -> PathBuf {
        self.paths.modules_root.join(release)
    }

    /// `<modules_root>/<release>/extra`.
    pub fn extra_modules_dir(&self, release: &str) -> PathBuf {
        self.release_modules_dir(release).join("extra")
    }

    /// Installation target for the module artifact.
    pub fn install_destination(&self, release: &str) -> PathBuf {
        self.extra_modules_dir(release).join(self.artifact_name())
    }

    /// Header/build tree shipped with the running kernel.
    pub fn headers_dir(&self, release: &str) -> PathBuf {
        self.release_modules_dir(release).join("build")
    }

    /// Installed kernel build configuration.
    pub fn boot_config(&self, release: &str) -> PathBuf {
        self.paths.boot_dir.join(format!("config-{}", release))
    }

    /// Installed symbol-version manifest (may not exist).
    pub fn installed_symvers(&self, release: &str) -> PathBuf {
        self.paths
            .kernel_source_root
            .join(release)
            .join("Module.symvers")
    }

    /// Upstream URL for the driver source of the given tag version.
    pub fn upstream_source_url(&self, version: &str) -> String {
        self.build.upstream_url.replace("{version}", version)
    }

    /// Module parameter argument for `modprobe`, e.g. `write_support=1`.
    pub fn write_parameter_arg(&self) -> String {
        format!("{}=1", self.module.write_parameter)
    }

    /// Workspace parent, if configured.
    pub fn work_root(&self) -> Option<&Path> {
        self.paths.work_root.as_deref()
    }
}

fn invalid(message: &str) -> ProvisionError {
    ProvisionError::ConfigValidationError {
        message: message.to_string(),
    }
}
