//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::sync::Arc;

use crate::cli::args::{Cli, Commands, SetupArgs};
use crate::config::ProvisionConfig;
use crate::error::{ProvisionError, Result};
use crate::pipeline::Provisioner;
use crate::shell::{is_elevated, SystemRunner};
use crate::ui::UserInterface;

use super::activate::ActivateCommand;
use super::check::CheckCommand;
use super::completions::CompletionsCommand;
use super::setup::SetupCommand;

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command.
    ///
    /// # Arguments
    ///
    /// * `ui` - User interface for displaying output and prompts
    ///
    /// # Returns
    ///
    /// A [`CommandResult`] indicating success/failure and exit code.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Fail with [`ProvisionError::PrivilegeRequired`] unless the process is
/// root or privileged commands are configured to go through `sudo`.
pub fn require_privileges(config: &ProvisionConfig, elevated: bool, operation: &str) -> Result<()> {
    if elevated || config.use_sudo {
        Ok(())
    } else {
        Err(ProvisionError::PrivilegeRequired {
            operation: operation.to_string(),
        })
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    config: ProvisionConfig,
    elevated: bool,
}

impl CommandDispatcher {
    /// Create a dispatcher for the given configuration.
    pub fn new(config: ProvisionConfig) -> Self {
        Self {
            config,
            elevated: is_elevated(),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ProvisionConfig {
        &self.config
    }

    /// Dispatch and execute a command.
    ///
    /// Routes the CLI subcommand to the appropriate command implementation
    /// and executes it.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        match &cli.command {
            Some(Commands::Check(args)) => {
                let cmd = CheckCommand::new(self.config.clone(), args.clone());
                cmd.execute(ui)
            }
            Some(Commands::Activate) => {
                let cmd = ActivateCommand::new(
                    self.config.clone(),
                    Arc::new(SystemRunner),
                    self.elevated,
                );
                cmd.execute(ui)
            }
            Some(Commands::Setup(args)) => self.setup(args.clone(), ui),
            Some(Commands::Completions(args)) => {
                let cmd = CompletionsCommand::new(args.clone());
                cmd.execute(ui)
            }
            None => self.setup(SetupArgs::default(), ui),
        }
    }

    fn setup(&self, args: SetupArgs, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let provisioner = Provisioner::system(self.config.clone())?;
        SetupCommand::new(args, provisioner, self.elevated).execute(ui)
    }
}
