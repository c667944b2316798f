//! External command execution and platform queries.

pub mod command;
pub mod mock;
pub mod platform;

pub use command::{CommandResult, CommandRunner, CommandSpec, OutputLine, SystemRunner};
pub use mock::{MockResponse, MockRunner};
pub use platform::{is_ci, is_elevated, is_executable, resolve_tool_path, search_path};
