//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations. This allows:
//! - Single binary with subcommands (`ec-provision check`, `ec-provision setup`)
//! - Shared configuration loaded once by the caller
//! - Consistent global flag handling

pub mod activate;
pub mod check;
pub mod completions;
pub mod dispatcher;
pub mod setup;

pub use dispatcher::{require_privileges, Command, CommandDispatcher, CommandResult};
