//! The probe, activate, detect and build flow behind one entry point.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::activation::CapabilityActivator;
use crate::config::ProvisionConfig;
use crate::detection::{PackageFamily, PackageManagerDetector};
use crate::error::{ProvisionError, Result};
use crate::fetch::{HttpFetcher, SourceFetcher};
use crate::kernel::KernelIdentity;
use crate::probe::ModuleProbe;
use crate::progress::ProgressReporter;
use crate::shell::{self, CommandRunner, SystemRunner};

use super::context::StepContext;
use super::state::{Outcome, PipelineRun, PipelineState, Transitions};
use super::workspace::BuildWorkspace;
use super::{apt, dnf};

/// Gets the capability module loaded with write support, building and
/// installing it when a plain load is not enough.
///
/// One `Provisioner` drives one run at a time; concurrent runs against the
/// same host are not coordinated.
pub struct Provisioner {
    config: ProvisionConfig,
    runner: Arc<dyn CommandRunner>,
    fetcher: Arc<dyn SourceFetcher>,
    kernel: Option<KernelIdentity>,
    search_path: Option<Vec<PathBuf>>,
}

impl Provisioner {
    /// Provisioner with explicit collaborators.
    pub fn new(
        config: ProvisionConfig,
        runner: Arc<dyn CommandRunner>,
        fetcher: Arc<dyn SourceFetcher>,
    ) -> Self {
        Self {
            config,
            runner,
            fetcher,
            kernel: None,
            search_path: None,
        }
    }

    /// Provisioner running real processes and real downloads.
    pub fn system(config: ProvisionConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(Duration::from_secs(config.build.fetch_timeout_secs))?;
        Ok(Self::new(config, Arc::new(SystemRunner), Arc::new(fetcher)))
    }

    /// Use a fixed kernel identity instead of querying the host.
    pub fn with_kernel(mut self, kernel: KernelIdentity) -> Self {
        self.kernel = Some(kernel);
        self
    }

    /// Detect package managers on these directories instead of `PATH`.
    pub fn with_search_path(mut self, entries: Vec<PathBuf>) -> Self {
        self.search_path = Some(entries);
        self
    }

    pub fn config(&self) -> &ProvisionConfig {
        &self.config
    }

    /// Run to completion and return only the outcome.
    pub fn ensure_ready(&self, reporter: &ProgressReporter) -> Result<Outcome> {
        self.run(reporter).result
    }

    /// Run to completion, recording every state transition.
    pub fn run(&self, reporter: &ProgressReporter) -> PipelineRun {
        let mut transitions = Transitions::new();
        let result = self.drive(reporter, &mut transitions);
        match &result {
            Ok(outcome) => tracing::debug!("Provisioning finished: {:?}", outcome),
            Err(err) => tracing::debug!("Provisioning failed: {}", err),
        }
        PipelineRun {
            states: transitions.into_states(),
            result,
        }
    }

    fn drive(&self, reporter: &ProgressReporter, t: &mut Transitions) -> Result<Outcome> {
        let kernel = match self.kernel.clone().map_or_else(KernelIdentity::current, Ok) {
            Ok(kernel) => kernel,
            Err(err) => {
                t.enter(PipelineState::Failed);
                return Err(err);
            }
        };
        let module = &self.config.module.name;

        t.enter(PipelineState::Probing);
        reporter.info(format!("Checking {} on kernel {}", module, kernel.release()));
        if ModuleProbe::new(&self.config).check().is_ready() {
            t.enter(PipelineState::Ready);
            reporter.info(format!("{} is loaded with write support", module));
            return Ok(Outcome::AlreadyReady);
        }

        t.enter(PipelineState::Activating);
        reporter.info(format!("Loading {} with write support", module));
        if CapabilityActivator::new(&self.config, self.runner.as_ref())
            .activate()
            .is_ready()
        {
            t.enter(PipelineState::Ready);
            reporter.info(format!("{} is loaded with write support", module));
            return Ok(Outcome::Activated);
        }

        t.enter(PipelineState::BuildRequired);
        reporter.info(format!("{} could not be activated; building it", module));

        t.enter(PipelineState::DetectingFamily);
        let Some(family) = self.detect_family() else {
            t.enter(PipelineState::Unsupported);
            return Err(ProvisionError::UnsupportedPlatform {
                message: "neither dnf nor apt-get was found on PATH".to_string(),
            });
        };
        reporter.info(format!("Detected package manager: {}", family));

        t.enter(PipelineState::Building(family));
        match self.build(family, &kernel, reporter) {
            Ok(artifact) => {
                t.enter(PipelineState::Installed);
                Ok(Outcome::Installed { family, artifact })
            }
            Err(err) => {
                t.enter(PipelineState::Failed);
                Err(err)
            }
        }
    }

    fn detect_family(&self) -> Option<PackageFamily> {
        match &self.search_path {
            Some(entries) => PackageManagerDetector::detect_in(entries),
            None => PackageManagerDetector::detect_in(&shell::search_path()),
        }
    }

    fn build(
        &self,
        family: PackageFamily,
        kernel: &KernelIdentity,
        reporter: &ProgressReporter,
    ) -> Result<PathBuf> {
        let workspace = BuildWorkspace::create(self.config.work_root())?;
        let ctx = StepContext {
            config: &self.config,
            kernel,
            runner: self.runner.as_ref(),
            fetcher: self.fetcher.as_ref(),
            reporter,
        };

        let result = match family {
            PackageFamily::Dnf => dnf::provision(&ctx, &workspace),
            PackageFamily::Apt => apt::provision(&ctx, &workspace),
        };

        if let Err(err) = workspace.close() {
            tracing::warn!("Could not remove build workspace: {}", err);
        }
        result
    }
}
