//! Activate command implementation.
//!
//! The `ec-provision activate` command tries a plain load/reload of the
//! module with write support. It never builds anything.

use std::sync::Arc;

use crate::activation::CapabilityActivator;
use crate::config::ProvisionConfig;
use crate::error::Result;
use crate::shell::CommandRunner;
use crate::ui::UserInterface;

use super::dispatcher::{require_privileges, Command, CommandResult};

/// The activate command implementation.
pub struct ActivateCommand {
    config: ProvisionConfig,
    runner: Arc<dyn CommandRunner>,
    elevated: bool,
}

impl ActivateCommand {
    /// Create a new activate command.
    pub fn new(config: ProvisionConfig, runner: Arc<dyn CommandRunner>, elevated: bool) -> Self {
        Self {
            config,
            runner,
            elevated,
        }
    }
}

impl Command for ActivateCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        require_privileges(&self.config, self.elevated, "activate")?;

        let module = &self.config.module.name;
        let mut spinner = ui.start_spinner(&format!("Loading {} with write support", module));
        let readiness = CapabilityActivator::new(&self.config, self.runner.as_ref()).activate();

        if readiness.is_ready() {
            spinner.finish_success(&format!("{} is loaded with write support", module));
            Ok(CommandResult::success())
        } else {
            spinner.finish_error(&format!("{} could not be activated", module));
            ui.message(&format!(
                "The installed {} may be missing or built for another kernel. \
                 Run 'ec-provision setup' to build it.",
                module
            ));
            Ok(CommandResult::failure(1))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProvisionError;
    use crate::shell::{MockResponse, MockRunner};
    use crate::ui::MockUI;
    use std::fs;
    use tempfile::TempDir;

    fn config_in(temp: &TempDir) -> ProvisionConfig {
        let mut config = ProvisionConfig::default();
        config.paths.proc_modules = temp.path().join("modules");
        config.paths.sys_module_root = temp.path().join("sys");
        config.paths.ec_device = temp.path().join("io");
        fs::write(&config.paths.proc_modules, "").unwrap();
        config
    }

    #[test]
    fn requires_privileges() {
        let temp = TempDir::new().unwrap();
        let runner = Arc::new(MockRunner::new());
        let cmd = ActivateCommand::new(config_in(&temp), runner.clone(), false);
        let mut ui = MockUI::new();

        let err = cmd.execute(&mut ui).unwrap_err();

        assert!(matches!(err, ProvisionError::PrivilegeRequired { .. }));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn successful_load_exits_zero() {
        let temp = TempDir::new().unwrap();
        let config = config_in(&temp);
        let c = config.clone();
        let runner = Arc::new(MockRunner::new().on(
            &["modprobe", "ec_sys"],
            MockResponse::ok().with_effect(move |_| {
                fs::write(&c.paths.proc_modules, "ec_sys 16384 0 - Live 0x0\n").unwrap();
                let param = c.write_parameter_path();
                fs::create_dir_all(param.parent().unwrap()).unwrap();
                fs::write(param, "Y\n").unwrap();
            }),
        ));
        let mut ui = MockUI::new();

        let result = ActivateCommand::new(config, runner, true)
            .execute(&mut ui)
            .unwrap();

        assert_eq!(result.exit_code, 0);
        assert_eq!(ui.spinners().len(), 1);
    }

    #[test]
    fn failed_load_suggests_setup() {
        let temp = TempDir::new().unwrap();
        let runner = Arc::new(MockRunner::new().on(&["modprobe"], MockResponse::fail(1)));
        let mut ui = MockUI::new();

        let result = ActivateCommand::new(config_in(&temp), runner, true)
            .execute(&mut ui)
            .unwrap();

        assert_eq!(result.exit_code, 1);
        assert!(ui.has_message("ec-provision setup"));
    }
}
