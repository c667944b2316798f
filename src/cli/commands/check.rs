//! Check command implementation.
//!
//! The `ec-provision check` command reports whether the module is loaded
//! with write support, without changing anything.

use crate::cli::args::CheckArgs;
use crate::config::ProvisionConfig;
use crate::error::Result;
use crate::probe::{ModuleProbe, ProbeReport};
use crate::ui::{ProvisionTheme, UserInterface};

use super::dispatcher::{Command, CommandResult};

/// The check command implementation.
pub struct CheckCommand {
    config: ProvisionConfig,
    args: CheckArgs,
}

impl CheckCommand {
    /// Create a new check command.
    pub fn new(config: ProvisionConfig, args: CheckArgs) -> Self {
        Self { config, args }
    }
}

impl Command for CheckCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let report = ModuleProbe::new(&self.config).report();

        if self.args.json {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| anyhow::anyhow!("Failed to serialize probe report: {}", e))?;
            println!("{}", json);
        } else {
            show_report(ui, &report);
        }

        if report.readiness().is_ready() {
            Ok(CommandResult::success())
        } else {
            Ok(CommandResult::failure(1))
        }
    }
}

fn show_report(ui: &mut dyn UserInterface, report: &ProbeReport) {
    let theme = ProvisionTheme::detect();
    ui.show_header(&format!("{} status", report.module));
    ui.message(&theme.format_key_value("Loaded", yes_no(report.loaded)));
    ui.message(&theme.format_key_value("Write support", yes_no(report.write_support)));
    ui.message(&theme.format_key_value("EC device", yes_no(report.device_present)));
    ui.message("");

    if report.readiness().is_ready() {
        ui.success(&format!("{} is ready", report.module));
    } else {
        ui.warning(&format!(
            "{} is not ready; run 'ec-provision setup' to fix it",
            report.module
        ));
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
