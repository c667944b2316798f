//! Provisioning pipeline.
//!
//! [`Provisioner`] walks `probe -> activate -> detect -> build` and stops at
//! the first stage that leaves the module ready. Building dispatches to one
//! of two strategies:
//!
//! - **dnf**: fourteen steps rebuilding the driver from the distribution's
//!   kernel source package
//! - **apt**: six steps building the single driver file out of tree against
//!   the installed headers
//!
//! Every external command is announced on the progress stream before it
//! runs and its output is forwarded line by line. The first failing step
//! aborts the run with an error naming that step. The build workspace is
//! removed on every exit path.
//!
//! Runs either inline with [`Provisioner::ensure_ready`] or on a background
//! thread with [`spawn`].

mod apt;
mod context;
mod dnf;
mod handle;
mod provisioner;
pub mod source;
mod state;
pub mod steps;
mod workspace;

pub use handle::{spawn, ProvisionHandle};
pub use provisioner::Provisioner;
pub use state::{Outcome, PipelineRun, PipelineState};
pub use steps::{StepDef, StepKind, APT_STEPS, DNF_STEPS};
pub use workspace::BuildWorkspace;
