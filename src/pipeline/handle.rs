//! Running the pipeline on its own thread.

use std::thread::{self, JoinHandle};

use crate::error::{ProvisionError, Result};
use crate::progress::{ProgressEvent, ProgressReporter, ProgressStream};

use super::provisioner::Provisioner;
use super::state::{Outcome, PipelineRun, PipelineState};

/// A pipeline run in progress: its event stream plus a completion signal.
///
/// Read events with [`recv`](Self::recv) until it returns `None`, then call
/// [`wait`](Self::wait) for the outcome.
pub struct ProvisionHandle {
    events: ProgressStream,
    thread: JoinHandle<PipelineRun>,
}

/// Start `provisioner` on a background thread.
///
/// The reporter lives on that thread and is dropped when the run returns,
/// which closes the stream exactly once.
pub fn spawn(provisioner: Provisioner) -> Result<ProvisionHandle> {
    let (reporter, events) = ProgressReporter::channel(provisioner.config().progress_capacity);
    let thread = thread::Builder::new()
        .name("ec-provision".to_string())
        .spawn(move || {
            let run = provisioner.run(&reporter);
            drop(reporter);
            run
        })?;
    Ok(ProvisionHandle { events, thread })
}

impl ProvisionHandle {
    /// Next event, or `None` once the run has finished.
    pub fn recv(&self) -> Option<ProgressEvent> {
        self.events.recv()
    }

    /// Wait for the run to finish.
    ///
    /// Unread events are discarded so a blocked producer can complete.
    pub fn wait(self) -> PipelineRun {
        for event in self.events {
            tracing::trace!("Discarding unread event: {}", event);
        }
        self.thread.join().unwrap_or_else(|_| PipelineRun {
            states: vec![PipelineState::Failed],
            result: Err(ProvisionError::Other(anyhow::anyhow!(
                "provisioning thread panicked"
            ))),
        })
    }

    /// Wait for the run to finish and return only its outcome.
    pub fn outcome(self) -> Result<Outcome> {
        self.wait().result
    }
}
