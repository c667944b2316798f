//! Scripted command runner for tests.
//!
//! `MockRunner` implements [`CommandRunner`] without spawning anything. Each
//! rule matches a command by a prefix of its program-plus-arguments and
//! answers with scripted output lines, an exit code, and an optional side
//! effect (typically creating the files the real command would produce).
//! Unmatched commands succeed silently. Every call is recorded.
//!
//! # Example
//!
//! ```
//! use ec_provision::shell::{CommandRunner, CommandSpec, MockResponse, MockRunner};
//!
//! let runner = MockRunner::new()
//!     .on(&["depmod"], MockResponse::lines(&["indexing"]))
//!     .on(&["modprobe", "-r"], MockResponse::fail(1));
//!
//! let mut seen = Vec::new();
//! let result = runner
//!     .run(&CommandSpec::new("depmod").arg("-a"), &mut |l| seen.push(l))
//!     .unwrap();
//! assert!(result.success);
//! assert_eq!(seen.len(), 1);
//! assert_eq!(runner.count(&["depmod"]), 1);
//! ```

use std::sync::Mutex;
use std::time::Duration;

use crate::error::Result;

use super::command::{CommandResult, CommandRunner, CommandSpec, OutputLine};

type Effect = Box<dyn Fn(&CommandSpec) + Send + Sync>;

/// Scripted answer for a matched command.
pub struct MockResponse {
    lines: Vec<String>,
    exit_code: i32,
    effect: Option<Effect>,
}

impl MockResponse {
    /// Succeed with no output.
    pub fn ok() -> Self {
        Self {
            lines: Vec::new(),
            exit_code: 0,
            effect: None,
        }
    }

    /// Succeed after printing `lines` to stdout.
    pub fn lines(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|s| s.to_string()).collect(),
            ..Self::ok()
        }
    }

    /// Exit with a non-zero code.
    pub fn fail(exit_code: i32) -> Self {
        Self {
            exit_code,
            ..Self::ok()
        }
    }

    /// Run `effect` when the command is invoked (before output is emitted).
    pub fn with_effect<F>(mut self, effect: F) -> Self
    where
        F: Fn(&CommandSpec) + Send + Sync + 'static,
    {
        self.effect = Some(Box::new(effect));
        self
    }
}

struct Rule {
    pattern: Vec<String>,
    response: MockResponse,
}

impl Rule {
    fn matches(&self, spec: &CommandSpec) -> bool {
        let parts = spec.parts();
        self.pattern.len() <= parts.len()
            && self.pattern.iter().zip(parts.iter()).all(|(p, a)| p == a)
    }
}

/// Mock [`CommandRunner`]. The first matching rule wins.
#[derive(Default)]
pub struct MockRunner {
    rules: Vec<Rule>,
    calls: Mutex<Vec<CommandSpec>>,
}

impl MockRunner {
    /// Create a runner where every command succeeds silently.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule for commands starting with `pattern`.
    pub fn on(mut self, pattern: &[&str], response: MockResponse) -> Self {
        self.rules.push(Rule {
            pattern: pattern.iter().map(|s| s.to_string()).collect(),
            response,
        });
        self
    }

    /// All recorded invocations, in order.
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Recorded invocations rendered as command lines.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(|c| c.to_string()).collect()
    }

    /// Number of recorded invocations starting with `pattern`.
    pub fn count(&self, pattern: &[&str]) -> usize {
        self.position_all(pattern).len()
    }

    /// Indices of recorded invocations starting with `pattern`.
    pub fn position_all(&self, pattern: &[&str]) -> Vec<usize> {
        self.calls()
            .iter()
            .enumerate()
            .filter(|(_, spec)| {
                let parts = spec.parts();
                pattern.len() <= parts.len()
                    && pattern.iter().zip(parts.iter()).all(|(p, a)| p == a)
            })
            .map(|(i, _)| i)
            .collect()
    }
}

impl CommandRunner for MockRunner {
    fn run(
        &self,
        spec: &CommandSpec,
        on_line: &mut dyn FnMut(OutputLine),
    ) -> Result<CommandResult> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(spec.clone());
        }

        let Some(rule) = self.rules.iter().find(|r| r.matches(spec)) else {
            return Ok(CommandResult::success(Duration::ZERO));
        };

        if let Some(effect) = &rule.response.effect {
            effect(spec);
        }
        for line in &rule.response.lines {
            on_line(OutputLine::Stdout(line.clone()));
        }

        if rule.response.exit_code == 0 {
            Ok(CommandResult::success(Duration::ZERO))
        } else {
            Ok(CommandResult::failure(
                Some(rule.response.exit_code),
                Duration::ZERO,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmatched_commands_succeed() {
        let runner = MockRunner::new();
        let result = runner.run_quiet(&CommandSpec::new("anything")).unwrap();
        assert!(result.success);
        assert_eq!(runner.command_lines(), vec!["anything"]);
    }

    #[test]
    fn first_matching_rule_wins() {
        let runner = MockRunner::new()
            .on(&["modprobe", "-r"], MockResponse::fail(1))
            .on(&["modprobe"], MockResponse::ok());

        let unload = runner
            .run_quiet(&CommandSpec::new("modprobe").args(["-r", "ec_sys"]))
            .unwrap();
        let load = runner
            .run_quiet(&CommandSpec::new("modprobe").arg("ec_sys"))
            .unwrap();

        assert!(!unload.success);
        assert_eq!(unload.exit_code, Some(1));
        assert!(load.success);
    }

    #[test]
    fn pattern_longer_than_command_does_not_match() {
        let runner = MockRunner::new().on(&["make", "modules"], MockResponse::fail(2));
        let result = runner.run_quiet(&CommandSpec::new("make")).unwrap();
        assert!(result.success);
    }

    #[test]
    fn effect_runs_and_lines_stream() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = Arc::clone(&hits);
        let runner = MockRunner::new().on(
            &["make"],
            MockResponse::lines(&["CC ec_sys.o", "LD ec_sys.ko"]).with_effect(move |_| {
                hits_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );

        let mut lines = Vec::new();
        runner
            .run(&CommandSpec::new("make"), &mut |l| lines.push(l.text().to_string()))
            .unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(lines, vec!["CC ec_sys.o", "LD ec_sys.ko"]);
    }

    #[test]
    fn position_all_reports_order() {
        let runner = MockRunner::new();
        runner.run_quiet(&CommandSpec::new("cp")).unwrap();
        runner.run_quiet(&CommandSpec::new("depmod")).unwrap();
        runner.run_quiet(&CommandSpec::new("cp")).unwrap();
        assert_eq!(runner.position_all(&["cp"]), vec![0, 2]);
        assert_eq!(runner.position_all(&["depmod"]), vec![1]);
    }
}
