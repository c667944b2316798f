//! Pipeline state machine values.

use std::fmt;
use std::path::PathBuf;

use crate::detection::PackageFamily;
use crate::error::Result;

/// Where a provisioning run currently is.
///
/// ```text
/// Idle -> Probing -> Ready
///                 -> Activating -> Ready
///                               -> BuildRequired -> DetectingFamily -> Building -> Installed | Failed
///                                                                   -> Unsupported
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Probing,
    Activating,
    BuildRequired,
    DetectingFamily,
    Building(PackageFamily),
    Ready,
    Installed,
    Failed,
    Unsupported,
}

impl PipelineState {
    /// No transition leaves a terminal state.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Ready | Self::Installed | Self::Failed | Self::Unsupported
        )
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Probing => write!(f, "probing"),
            Self::Activating => write!(f, "activating"),
            Self::BuildRequired => write!(f, "build required"),
            Self::DetectingFamily => write!(f, "detecting package manager"),
            Self::Building(family) => write!(f, "building with {}", family.executable()),
            Self::Ready => write!(f, "ready"),
            Self::Installed => write!(f, "installed"),
            Self::Failed => write!(f, "failed"),
            Self::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// How a successful run got the module ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to do.
    AlreadyReady,
    /// A load/reload was enough.
    Activated,
    /// The module was built and installed.
    Installed {
        family: PackageFamily,
        artifact: PathBuf,
    },
}

/// Terminal value of one run plus the states it passed through.
#[derive(Debug)]
pub struct PipelineRun {
    pub states: Vec<PipelineState>,
    pub result: Result<Outcome>,
}

impl PipelineRun {
    /// Last recorded state.
    pub fn final_state(&self) -> PipelineState {
        self.states.last().copied().unwrap_or(PipelineState::Idle)
    }
}

/// Records transitions in order.
#[derive(Debug, Default)]
pub(crate) struct Transitions {
    states: Vec<PipelineState>,
}

impl Transitions {
    pub(crate) fn new() -> Self {
        Self {
            states: vec![PipelineState::Idle],
        }
    }

    pub(crate) fn enter(&mut self, state: PipelineState) {
        tracing::debug!("Pipeline state: {}", state);
        self.states.push(state);
    }

    pub(crate) fn into_states(self) -> Vec<PipelineState> {
        self.states
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(PipelineState::Ready.is_terminal());
        assert!(PipelineState::Installed.is_terminal());
        assert!(PipelineState::Failed.is_terminal());
        assert!(PipelineState::Unsupported.is_terminal());
        assert!(!PipelineState::Building(PackageFamily::Dnf).is_terminal());
        assert!(!PipelineState::Idle.is_terminal());
    }

    #[test]
    fn transitions_start_idle() {
        let mut t = Transitions::new();
        t.enter(PipelineState::Probing);
        t.enter(PipelineState::Ready);
        assert_eq!(
            t.into_states(),
            vec![
                PipelineState::Idle,
                PipelineState::Probing,
                PipelineState::Ready
            ]
        );
    }

    #[test]
    fn display_names_family() {
        assert_eq!(
            PipelineState::Building(PackageFamily::Apt).to_string(),
            "building with apt-get"
        );
    }
}
