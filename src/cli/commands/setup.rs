//! Setup command implementation.
//!
//! The `ec-provision setup` command runs the whole provisioning pipeline on
//! a background thread and renders its progress stream while it works.

use std::sync::Mutex;

use crate::cli::args::SetupArgs;
use crate::error::{ProvisionError, Result};
use crate::pipeline::{self, Outcome, Provisioner};
use crate::probe::ModuleProbe;
use crate::ui::{live_event_view, UserInterface};

use super::dispatcher::{require_privileges, Command, CommandResult};

/// Output lines kept under the spinner.
const LIVE_LINES: usize = 3;

/// The setup command implementation.
pub struct SetupCommand {
    args: SetupArgs,
    // taken by the single run this command performs
    provisioner: Mutex<Option<Provisioner>>,
    elevated: bool,
}

impl SetupCommand {
    /// Create a new setup command.
    pub fn new(args: SetupArgs, provisioner: Provisioner, elevated: bool) -> Self {
        Self {
            args,
            provisioner: Mutex::new(Some(provisioner)),
            elevated,
        }
    }

    fn take_provisioner(&self) -> Result<Provisioner> {
        self.provisioner
            .lock()
            .ok()
            .and_then(|mut slot| slot.take())
            .ok_or_else(|| anyhow::anyhow!("setup has already run").into())
    }
}

impl Command for SetupCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let provisioner = self.take_provisioner()?;
        let config = provisioner.config().clone();
        let module = config.module.name.clone();

        ui.show_header(&format!("{} setup", module));

        if ModuleProbe::new(&config).check().is_ready() {
            ui.success(&format!("{} is already loaded with write support", module));
            return Ok(CommandResult::success());
        }

        require_privileges(&config, self.elevated, "setup")?;

        if ui.is_interactive() && !self.args.yes {
            let question = format!(
                "{} is not ready. Load it, building it from source if needed?",
                module
            );
            if !ui.confirm(&question, true)? {
                ui.warning("Setup cancelled");
                return Ok(CommandResult::failure(1));
            }
        }

        let handle = pipeline::spawn(provisioner)?;
        let mut spinner = ui.start_spinner(&format!("Provisioning {}", module));
        match spinner.progress_bar() {
            Some(bar) => {
                let mut view = live_event_view(bar, ui.output_mode(), LIVE_LINES);
                while let Some(event) = handle.recv() {
                    view(&event);
                }
            }
            None => {
                while let Some(event) = handle.recv() {
                    ui.show_event(&event);
                }
            }
        }

        match handle.outcome() {
            Ok(outcome) => {
                spinner.finish_success(&describe(&module, &outcome));
                Ok(CommandResult::success())
            }
            Err(err) => {
                spinner.finish_error(&format!("{} setup failed", module));
                ui.error(&err.to_string());
                if let Some(hint) = hint_for(&err) {
                    ui.message(hint);
                }
                Ok(CommandResult::failure(1))
            }
        }
    }
}

fn describe(module: &str, outcome: &Outcome) -> String {
    match outcome {
        Outcome::AlreadyReady => format!("{} is already loaded with write support", module),
        Outcome::Activated => format!("{} loaded with write support", module),
        Outcome::Installed { artifact, .. } => format!(
            "Installed {} and loaded {} with write support",
            artifact.display(),
            module
        ),
    }
}

fn hint_for(err: &ProvisionError) -> Option<&'static str> {
    match err {
        ProvisionError::UnsupportedPlatform { .. } => {
            Some("Only dnf-based (Fedora/RHEL) and apt-based (Debian/Ubuntu) hosts are supported.")
        }
        ProvisionError::SourceAcquisitionFailed { .. } => {
            Some("Check network access to the package repositories and upstream sources.")
        }
        ProvisionError::EnvironmentUnready { .. } => Some(
            "The module was installed but did not come up with write support; \
             check 'dmesg' for load errors.",
        ),
        _ => None,
    }
}
