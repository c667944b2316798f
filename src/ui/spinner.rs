//! Progress spinners.

use indicatif::{ProgressBar, ProgressStyle};
use std::collections::VecDeque;
use std::time::Duration;

use crate::progress::{EventKind, ProgressEvent};

use super::theme::ProvisionTheme;
use super::{OutputMode, SpinnerHandle};

const MAX_LINE_WIDTH: usize = 72;

/// A progress spinner for long-running operations.
pub struct ProgressSpinner {
    bar: ProgressBar,
    theme: ProvisionTheme,
}

impl ProgressSpinner {
    /// Create a new spinner with a message.
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                .template("{spinner:.magenta} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));

        Self {
            bar,
            theme: ProvisionTheme::detect(),
        }
    }

    /// Create a spinner that doesn't show (for silent mode).
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            theme: ProvisionTheme::plain(),
        }
    }

    fn finish_with(&mut self, line: String) {
        self.bar.set_style(
            ProgressStyle::default_spinner()
                .template("{msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        self.bar.finish_with_message(line);
    }
}

impl SpinnerHandle for ProgressSpinner {
    fn set_message(&mut self, msg: &str) {
        self.bar.set_message(msg.to_string());
    }

    fn finish_success(&mut self, msg: &str) {
        let line = self.theme.format_success(msg);
        self.finish_with(line);
    }

    fn finish_error(&mut self, msg: &str) {
        let line = self.theme.format_error(msg);
        self.finish_with(line);
    }

    fn progress_bar(&self) -> Option<ProgressBar> {
        Some(self.bar.clone())
    }
}

/// Create an event handler that renders pipeline progress on a spinner.
///
/// The spinner message shows the current step banner followed by the last
/// `max_lines` lines of command output. Step banners are also printed above
/// the spinner so the finished steps stay visible. In verbose mode every
/// command and output line is printed in full instead of being folded into
/// the spinner.
pub fn live_event_view(
    bar: ProgressBar,
    mode: OutputMode,
    max_lines: usize,
) -> impl FnMut(&ProgressEvent) {
    let theme = ProvisionTheme::detect();
    let mut base = bar.message();
    let mut buffer: VecDeque<String> = VecDeque::new();

    move |event: &ProgressEvent| {
        match event.kind {
            EventKind::Stage => {
                if mode.shows_progress() {
                    bar.println(theme.info.apply_to(&event.message).to_string());
                }
                base = event.message.clone();
                buffer.clear();
            }
            EventKind::Command if mode.shows_command_output() => {
                bar.println(theme.command.apply_to(&event.message).to_string());
            }
            EventKind::Output if mode.shows_command_output() => {
                bar.println(format!("    {}", event.message));
            }
            EventKind::Command | EventKind::Output => {
                let text = event.message.trim_end();
                if text.is_empty() {
                    return;
                }
                buffer.push_back(truncate(text));
                while buffer.len() > max_lines {
                    buffer.pop_front();
                }
            }
            EventKind::Info => {
                if mode.shows_progress() {
                    bar.println(theme.dim.apply_to(&event.message).to_string());
                }
            }
        }

        let mut msg = base.clone();
        for line in &buffer {
            msg.push_str("\n    ");
            msg.push_str(&theme.dim.apply_to(format!("» {}", line)).to_string());
        }
        bar.set_message(msg);
    }
}

fn truncate(text: &str) -> String {
    if text.chars().count() > MAX_LINE_WIDTH {
        let cut: String = text.chars().take(MAX_LINE_WIDTH - 3).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: EventKind, msg: &str) -> ProgressEvent {
        ProgressEvent::new(kind, msg)
    }

    #[test]
    fn spinner_finish_success() {
        let mut spinner = ProgressSpinner::new("Testing...");
        spinner.finish_success("Done");
    }

    #[test]
    fn spinner_finish_error() {
        let mut spinner = ProgressSpinner::new("Testing...");
        spinner.finish_error("Failed");
    }

    #[test]
    fn hidden_spinner_has_bar() {
        let spinner = ProgressSpinner::hidden();
        assert!(spinner.progress_bar().is_some());
    }

    #[test]
    fn stage_becomes_base_message() {
        let bar = ProgressBar::hidden();
        let mut view = live_event_view(bar.clone(), OutputMode::Normal, 2);

        view(&event(EventKind::Stage, "[5/6] Building module"));
        assert!(bar.message().contains("[5/6] Building module"));
        bar.finish();
    }

    #[test]
    fn output_keeps_last_lines() {
        let bar = ProgressBar::hidden();
        let mut view = live_event_view(bar.clone(), OutputMode::Normal, 2);

        view(&event(EventKind::Stage, "[5/6] Building module"));
        view(&event(EventKind::Output, "line 1"));
        view(&event(EventKind::Output, "line 2"));
        view(&event(EventKind::Output, "line 3"));

        let msg = bar.message();
        assert!(msg.starts_with("[5/6] Building module"));
        assert!(!msg.contains("line 1"));
        assert!(msg.contains("line 2"));
        assert!(msg.contains("line 3"));
        bar.finish();
    }

    #[test]
    fn new_stage_clears_output() {
        let bar = ProgressBar::hidden();
        let mut view = live_event_view(bar.clone(), OutputMode::Normal, 3);

        view(&event(EventKind::Output, "old output"));
        view(&event(EventKind::Stage, "[6/6] Installing module"));

        assert!(!bar.message().contains("old output"));
        bar.finish();
    }

    #[test]
    fn empty_lines_are_skipped() {
        let bar = ProgressBar::hidden();
        let mut view = live_event_view(bar.clone(), OutputMode::Quiet, 2);

        view(&event(EventKind::Stage, "[1/6] Checking kernel headers"));
        view(&event(EventKind::Output, ""));
        view(&event(EventKind::Output, "real output"));

        assert_eq!(bar.message().matches('\n').count(), 1);
        bar.finish();
    }

    #[test]
    fn long_lines_are_truncated() {
        let long = "x".repeat(100);
        let cut = truncate(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), MAX_LINE_WIDTH);
        assert_eq!(truncate("short"), "short");
    }
}
