//! Interactive terminal UI.

use console::Term;
use std::io::Write;

use crate::error::Result;
use crate::progress::{EventKind, ProgressEvent};

use super::prompts::confirm_on;
use super::{NonInteractiveUI, OutputMode, ProgressSpinner, ProvisionTheme, SpinnerHandle, UserInterface};

/// Interactive terminal UI implementation.
pub struct TerminalUI {
    term: Term,
    theme: ProvisionTheme,
    mode: OutputMode,
}

impl TerminalUI {
    /// Create a new terminal UI.
    pub fn new(mode: OutputMode) -> Self {
        Self {
            term: Term::stdout(),
            theme: ProvisionTheme::detect(),
            mode,
        }
    }
}

impl UserInterface for TerminalUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", msg).ok();
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", self.theme.format_success(msg)).ok();
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", self.theme.format_warning(msg)).ok();
        }
    }

    fn error(&mut self, msg: &str) {
        writeln!(self.term, "{}", self.theme.format_error(msg)).ok();
    }

    fn confirm(&mut self, question: &str, default: bool) -> Result<bool> {
        confirm_on(&self.term, question, default)
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.shows_spinners() {
            Box::new(ProgressSpinner::new(message))
        } else {
            Box::new(ProgressSpinner::hidden())
        }
    }

    fn show_event(&mut self, event: &ProgressEvent) {
        let line = match event.kind {
            EventKind::Stage if self.mode.shows_status() => {
                self.theme.info.apply_to(&event.message).to_string()
            }
            EventKind::Command if self.mode.shows_progress() => {
                self.theme.command.apply_to(&event.message).to_string()
            }
            EventKind::Output if self.mode.shows_command_output() => {
                format!("    {}", event.message)
            }
            EventKind::Info if self.mode.shows_progress() => {
                self.theme.dim.apply_to(&event.message).to_string()
            }
            _ => return,
        };
        writeln!(self.term, "{}", line).ok();
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "\n{}\n", self.theme.format_header(title)).ok();
        }
    }

    fn is_interactive(&self) -> bool {
        self.term.is_term()
    }
}

/// Create the appropriate UI based on context.
pub fn create_ui(interactive: bool, mode: OutputMode) -> Box<dyn UserInterface> {
    if interactive && Term::stdout().is_term() {
        Box::new(TerminalUI::new(mode))
    } else {
        Box::new(NonInteractiveUI::new(mode))
    }
}
