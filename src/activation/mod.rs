//! Cheap privileged load/reload before falling back to a build.
//!
//! Commands issued here are best-effort: their exit codes are logged and
//! ignored, and the verdict always comes from re-running the probe.

use crate::config::ProvisionConfig;
use crate::probe::{ModuleProbe, Readiness};
use crate::shell::{CommandRunner, CommandSpec};

/// Loads the capability module with write support enabled.
pub struct CapabilityActivator<'a> {
    config: &'a ProvisionConfig,
    runner: &'a dyn CommandRunner,
    probe: ModuleProbe,
}

impl<'a> CapabilityActivator<'a> {
    /// Create an activator.
    pub fn new(config: &'a ProvisionConfig, runner: &'a dyn CommandRunner) -> Self {
        Self {
            config,
            runner,
            probe: ModuleProbe::new(config),
        }
    }

    /// Try to get the module loaded with write support.
    ///
    /// Loaded without write support: unload, then reload with the parameter.
    /// Not loaded: load with the parameter. Either way the probe decides.
    pub fn activate(&self) -> Readiness {
        if self.probe.is_loaded() {
            if self.probe.write_support_enabled() {
                return Readiness::Ready;
            }
            tracing::debug!(
                "{} loaded without write support, reloading",
                self.probe.module()
            );
            self.best_effort(self.unload_command());
            self.best_effort(self.load_command());
        } else {
            tracing::debug!("{} not loaded, loading", self.probe.module());
            self.best_effort(self.load_command());
        }
        self.probe.check()
    }

    /// `modprobe <module> <param>=1`, privileged.
    pub fn load_command(&self) -> CommandSpec {
        privileged(
            self.config,
            CommandSpec::new("modprobe")
                .arg(&self.config.module.name)
                .arg(self.config.write_parameter_arg()),
        )
    }

    fn unload_command(&self) -> CommandSpec {
        privileged(
            self.config,
            CommandSpec::new("modprobe")
                .arg("-r")
                .arg(&self.config.module.name),
        )
    }

    fn best_effort(&self, spec: CommandSpec) {
        match self.runner.run_quiet(&spec) {
            Ok(result) if result.success => tracing::debug!("{} succeeded", spec),
            Ok(result) => tracing::debug!("{} exited with {:?}", spec, result.exit_code),
            Err(e) => tracing::debug!("{} could not run: {}", spec, e),
        }
    }
}

/// Apply the configured elevation to a privileged command.
pub fn privileged(config: &ProvisionConfig, spec: CommandSpec) -> CommandSpec {
    if config.use_sudo {
        spec.with_sudo()
    } else {
        spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::{MockResponse, MockRunner};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn config_in(dir: &Path) -> ProvisionConfig {
        let mut config = ProvisionConfig::default();
        config.paths.proc_modules = dir.join("modules");
        config.paths.sys_module_root = dir.join("sys");
        config.paths.ec_device = dir.join("io");
        config
    }

    fn set_state(config: &ProvisionConfig, loaded: bool, write: Option<&str>) {
        let listing = if loaded { "ec_sys 16384 0 - Live 0x0\n" } else { "" };
        fs::write(&config.paths.proc_modules, listing).unwrap();
        let param = config.write_parameter_path();
        match write {
            Some(v) => {
                fs::create_dir_all(param.parent().unwrap()).unwrap();
                fs::write(param, v).unwrap();
            }
            None => {
                let _ = fs::remove_file(param);
            }
        }
    }

    /// A runner whose `modprobe ec_sys write_support=1` makes the module ready.
    fn loading_runner(config: &ProvisionConfig) -> MockRunner {
        let c = config.clone();
        MockRunner::new().on(
            &["modprobe", "ec_sys"],
            MockResponse::ok().with_effect(move |_| set_state(&c, true, Some("Y"))),
        )
    }

    #[test]
    fn already_ready_issues_no_commands() {
        let temp = TempDir::new().unwrap();
        let config = config_in(temp.path());
        set_state(&config, true, Some("Y"));
        let runner = MockRunner::new();

        let verdict = CapabilityActivator::new(&config, &runner).activate();

        assert_eq!(verdict, Readiness::Ready);
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn not_loaded_issues_single_load() {
        let temp = TempDir::new().unwrap();
        let config = config_in(temp.path());
        set_state(&config, false, None);
        let runner = loading_runner(&config);

        let verdict = CapabilityActivator::new(&config, &runner).activate();

        assert_eq!(verdict, Readiness::Ready);
        assert_eq!(
            runner.command_lines(),
            vec!["modprobe ec_sys write_support=1"]
        );
    }

    #[test]
    fn loaded_without_write_reloads() {
        let temp = TempDir::new().unwrap();
        let config = config_in(temp.path());
        set_state(&config, true, Some("N"));
        let runner = loading_runner(&config);

        let verdict = CapabilityActivator::new(&config, &runner).activate();

        assert_eq!(verdict, Readiness::Ready);
        assert_eq!(
            runner.command_lines(),
            vec!["modprobe -r ec_sys", "modprobe ec_sys write_support=1"]
        );
    }

    #[test]
    fn failed_unload_does_not_abort_reload() {
        let temp = TempDir::new().unwrap();
        let config = config_in(temp.path());
        set_state(&config, true, Some("N"));
        let c = config.clone();
        let runner = MockRunner::new()
            .on(&["modprobe", "-r"], MockResponse::fail(1))
            .on(
                &["modprobe", "ec_sys"],
                MockResponse::ok().with_effect(move |_| set_state(&c, true, Some("1"))),
            );

        let verdict = CapabilityActivator::new(&config, &runner).activate();

        assert_eq!(verdict, Readiness::Ready);
        assert_eq!(runner.count(&["modprobe"]), 2);
    }

    #[test]
    fn successful_command_without_postcondition_is_not_ready() {
        let temp = TempDir::new().unwrap();
        let config = config_in(temp.path());
        set_state(&config, false, None);
        // modprobe "succeeds" but nothing changes on disk
        let runner = MockRunner::new();

        let verdict = CapabilityActivator::new(&config, &runner).activate();

        assert_eq!(verdict, Readiness::NotReady);
    }

    #[test]
    fn load_failure_is_not_ready() {
        let temp = TempDir::new().unwrap();
        let config = config_in(temp.path());
        set_state(&config, false, None);
        let runner = MockRunner::new().on(&["modprobe"], MockResponse::fail(1));

        let verdict = CapabilityActivator::new(&config, &runner).activate();

        assert_eq!(verdict, Readiness::NotReady);
    }

    #[test]
    fn sudo_prefix_applied_when_configured() {
        let temp = TempDir::new().unwrap();
        let mut config = config_in(temp.path());
        config.use_sudo = true;
        let runner = MockRunner::new();
        let activator = CapabilityActivator::new(&config, &runner);
        assert_eq!(
            activator.load_command().to_string(),
            "sudo modprobe ec_sys write_support=1"
        );
    }
}
