//! Shared state for the steps of one strategy run.

use std::path::{Path, PathBuf};

use crate::activation::privileged;
use crate::config::ProvisionConfig;
use crate::error::{ProvisionError, Result};
use crate::fetch::SourceFetcher;
use crate::kernel::KernelIdentity;
use crate::probe::ModuleProbe;
use crate::progress::ProgressReporter;
use crate::shell::{CommandRunner, CommandSpec};

use super::steps::StepDef;

/// Everything a step needs, borrowed for the duration of one run.
pub struct StepContext<'a> {
    pub config: &'a ProvisionConfig,
    pub kernel: &'a KernelIdentity,
    pub runner: &'a dyn CommandRunner,
    pub fetcher: &'a dyn SourceFetcher,
    pub reporter: &'a ProgressReporter,
}

impl StepContext<'_> {
    /// Announce `step`, run `body`, and attribute any failure to the step.
    pub fn step<T>(&self, step: &StepDef, body: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        tracing::debug!("{}", step.id);
        self.reporter.stage(step.banner());
        body(self).map_err(|err| {
            let err = step.attribute(err);
            tracing::debug!("{} failed: {}", step.id, err);
            err
        })
    }

    /// Run a command, streaming its output; non-zero exit is an error.
    pub fn run(&self, spec: CommandSpec) -> Result<()> {
        self.reporter.command(format!("Running: {}", spec));
        let reporter = self.reporter;
        let result = self
            .runner
            .run(&spec, &mut |line| reporter.output(line.text()))?;
        if result.success {
            Ok(())
        } else {
            Err(ProvisionError::CommandFailed {
                command: spec.to_string(),
                code: result.exit_code,
            })
        }
    }

    /// [`run`](Self::run) with the configured elevation applied.
    pub fn run_privileged(&self, spec: CommandSpec) -> Result<()> {
        self.run(privileged(self.config, spec))
    }

    /// Run a command whose failure is logged and reported but not fatal.
    pub fn run_best_effort(&self, spec: CommandSpec) {
        if let Err(err) = self.run(spec) {
            tracing::debug!("Ignoring failure: {}", err);
            self.reporter.info(format!("{} (continuing)", err));
        }
    }

    /// `make` with one job per available CPU.
    pub fn make(&self, dir: &Path) -> CommandSpec {
        let jobs = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        CommandSpec::new("make")
            .arg(format!("-j{}", jobs))
            .current_dir(dir)
    }

    /// Copy `artifact` into the extra-modules directory of the running
    /// release, refresh the dependency index, load the module with write
    /// support and confirm it through the probe.
    ///
    /// Returns the installed path.
    pub fn install_and_activate(&self, artifact: &Path) -> Result<PathBuf> {
        let release = self.kernel.release();
        let dest_dir = self.config.extra_modules_dir(release);
        let dest = self.config.install_destination(release);
        let module = &self.config.module.name;

        self.run_privileged(CommandSpec::new("mkdir").arg("-p").path_arg(&dest_dir))?;
        self.run_privileged(CommandSpec::new("cp").path_arg(artifact).path_arg(&dest))?;
        self.run_privileged(CommandSpec::new("depmod").arg("-a").arg(release))?;

        let probe = ModuleProbe::new(self.config);
        if probe.is_loaded() {
            // stale copy without write support
            self.run_best_effort(privileged(
                self.config,
                CommandSpec::new("modprobe").arg("-r").arg(module),
            ));
        }
        self.run_privileged(
            CommandSpec::new("modprobe")
                .arg(module)
                .arg(self.config.write_parameter_arg()),
        )?;

        if !probe.check().is_ready() {
            return Err(ProvisionError::EnvironmentUnready {
                module: module.clone(),
                reason: format!(
                    "installed to {} but {} is not enabled",
                    dest.display(),
                    self.config.module.write_parameter
                ),
                step: None,
            });
        }
        self.reporter
            .info(format!("Installed {} and loaded with write support", dest.display()));
        Ok(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MockFetcher;
    use crate::pipeline::steps::{APT_COMPILE, DNF_INSTALL_TOOLS};
    use crate::progress::EventKind;
    use crate::shell::{MockResponse, MockRunner};

    struct Fixture {
        config: ProvisionConfig,
        kernel: KernelIdentity,
        fetcher: MockFetcher,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                config: ProvisionConfig::default(),
                kernel: KernelIdentity::new("6.8.0-45-generic", "x86_64"),
                fetcher: MockFetcher::failing(),
            }
        }

        fn ctx<'a>(
            &'a self,
            runner: &'a MockRunner,
            reporter: &'a ProgressReporter,
        ) -> StepContext<'a> {
            StepContext {
                config: &self.config,
                kernel: &self.kernel,
                runner,
                fetcher: &self.fetcher,
                reporter,
            }
        }
    }

    #[test]
    fn command_is_announced_before_output() {
        let fx = Fixture::new();
        let runner = MockRunner::new().on(&["make"], MockResponse::lines(&["L1", "L2"]));
        let (reporter, stream) = ProgressReporter::channel(8);

        fx.ctx(&runner, &reporter)
            .run(CommandSpec::new("make").arg("modules"))
            .unwrap();
        drop(reporter);

        let events: Vec<_> = stream.map(|e| (e.kind, e.message)).collect();
        assert_eq!(
            events,
            vec![
                (EventKind::Command, "Running: make modules".to_string()),
                (EventKind::Output, "L1".to_string()),
                (EventKind::Output, "L2".to_string()),
            ]
        );
    }

    #[test]
    fn failing_command_is_error_with_code() {
        let fx = Fixture::new();
        let runner = MockRunner::new().on(&["make"], MockResponse::fail(2));
        let reporter = ProgressReporter::console();

        let err = fx
            .ctx(&runner, &reporter)
            .run(CommandSpec::new("make"))
            .unwrap_err();
        assert!(matches!(
            err,
            ProvisionError::CommandFailed { code: Some(2), .. }
        ));
    }

    #[test]
    fn step_attributes_failure() {
        let fx = Fixture::new();
        let runner = MockRunner::new().on(&["make"], MockResponse::fail(2));
        let (reporter, stream) = ProgressReporter::channel(8);

        let err = fx
            .ctx(&runner, &reporter)
            .step(&APT_COMPILE, |ctx| ctx.run(CommandSpec::new("make")))
            .unwrap_err();
        drop(reporter);

        assert!(matches!(err, ProvisionError::BuildFailed { step, .. } if step.number == 5));
        let first = stream.recv().unwrap();
        assert_eq!(first.kind, EventKind::Stage);
        assert_eq!(first.message, "[5/6] Building module");
    }

    #[test]
    fn best_effort_swallows_failure() {
        let fx = Fixture::new();
        let runner = MockRunner::new().on(&["dnf", "config-manager"], MockResponse::fail(1));
        let reporter = ProgressReporter::console();

        let ctx = fx.ctx(&runner, &reporter);
        let result = ctx.step(&DNF_INSTALL_TOOLS, |ctx| {
            ctx.run_best_effort(CommandSpec::new("dnf").arg("config-manager"));
            Ok(())
        });
        assert!(result.is_ok());
        assert_eq!(runner.count(&["dnf", "config-manager"]), 1);
    }

    #[test]
    fn privileged_uses_sudo_when_configured() {
        let mut fx = Fixture::new();
        fx.config.use_sudo = true;
        let runner = MockRunner::new();
        let reporter = ProgressReporter::console();

        fx.ctx(&runner, &reporter)
            .run_privileged(CommandSpec::new("depmod").arg("-a"))
            .unwrap();
        assert_eq!(runner.command_lines(), vec!["sudo depmod -a"]);
    }

    #[test]
    fn make_runs_in_directory_with_jobs() {
        let fx = Fixture::new();
        let runner = MockRunner::new();
        let reporter = ProgressReporter::console();
        let spec = fx.ctx(&runner, &reporter).make(Path::new("/tmp/tree"));
        assert_eq!(spec.program, "make");
        assert!(spec.args[0].starts_with("-j"));
        assert_eq!(spec.cwd.as_deref(), Some(Path::new("/tmp/tree")));
    }
}
