//! Non-interactive UI for CI/headless environments.

use crate::error::Result;
use crate::progress::{EventKind, ProgressEvent};

use super::theme::ProvisionTheme;
use super::{OutputMode, SpinnerHandle, UserInterface};

/// UI implementation for non-interactive mode.
///
/// Nothing animates: every progress event becomes one line on stdout, and
/// confirmations resolve to their default answer.
pub struct NonInteractiveUI {
    mode: OutputMode,
    theme: ProvisionTheme,
}

impl NonInteractiveUI {
    /// Create a new non-interactive UI.
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            theme: ProvisionTheme::detect(),
        }
    }

    /// Line printed for `event`, if this mode shows it.
    fn event_line(&self, event: &ProgressEvent) -> Option<String> {
        match event.kind {
            EventKind::Stage if self.mode.shows_status() => Some(event.message.clone()),
            EventKind::Command | EventKind::Info if self.mode.shows_progress() => {
                Some(event.message.clone())
            }
            EventKind::Output if self.mode.shows_progress() => {
                Some(format!("    {}", event.message))
            }
            _ => None,
        }
    }
}

impl UserInterface for NonInteractiveUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("{}", msg);
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("{}", self.theme.format_success(msg));
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("{}", self.theme.format_warning(msg));
        }
    }

    fn error(&mut self, msg: &str) {
        eprintln!("{}", self.theme.format_error(msg));
    }

    fn confirm(&mut self, question: &str, default: bool) -> Result<bool> {
        tracing::debug!("Non-interactive: '{}' -> {}", question, default);
        Ok(default)
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.shows_status() {
            println!("{}", message);
        }
        Box::new(NoopSpinner {
            theme: self.theme.clone(),
            quiet: !self.mode.shows_status(),
        })
    }

    fn show_event(&mut self, event: &ProgressEvent) {
        if let Some(line) = self.event_line(event) {
            println!("{}", line);
        }
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_status() {
            println!("{}", self.theme.format_header(title));
        }
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

/// Spinner that only prints its final status.
struct NoopSpinner {
    theme: ProvisionTheme,
    quiet: bool,
}

impl SpinnerHandle for NoopSpinner {
    fn set_message(&mut self, _msg: &str) {}

    fn finish_success(&mut self, msg: &str) {
        if !self.quiet {
            println!("{}", self.theme.format_success(msg));
        }
    }

    fn finish_error(&mut self, msg: &str) {
        eprintln!("{}", self.theme.format_error(msg));
    }
}
