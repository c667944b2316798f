//! Ordered progress stream from the pipeline to one consumer.
//!
//! A [`ProgressReporter`] either feeds a bounded queue read through a
//! [`ProgressStream`], or, when nobody is listening, prints each event as a
//! line on stdout. Pipeline code only calls the reporter and never knows
//! which mode is active.
//!
//! The reporter is the only producer and is not `Clone`; dropping it closes
//! the stream, after which the consumer sees `None`.
//!
//! # Example
//!
//! ```
//! use ec_provision::progress::ProgressReporter;
//!
//! let (reporter, stream) = ProgressReporter::channel(4);
//! reporter.info("one");
//! reporter.info("two");
//! drop(reporter);
//!
//! let lines: Vec<String> = stream.map(|e| e.message).collect();
//! assert_eq!(lines, vec!["one", "two"]);
//! ```

use std::fmt;
use std::sync::mpsc::{self, Receiver, SyncSender};

/// What a progress event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A numbered pipeline step is starting.
    Stage,
    /// An external command is about to run.
    Command,
    /// A line of command output.
    Output,
    /// Any other status message.
    Info,
}

/// One human-readable progress message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub kind: EventKind,
    pub message: String,
}

impl ProgressEvent {
    pub fn new(kind: EventKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

enum Sink {
    Channel(SyncSender<ProgressEvent>),
    Console,
}

/// Producer side of the progress stream.
pub struct ProgressReporter {
    sink: Sink,
}

impl ProgressReporter {
    /// Reporter that prints events synchronously, one per line.
    pub fn console() -> Self {
        Self {
            sink: Sink::Console,
        }
    }

    /// Reporter feeding a bounded queue of `capacity` events.
    ///
    /// `emit` blocks while the queue is full, so a slow consumer throttles
    /// the producer instead of losing events.
    pub fn channel(capacity: usize) -> (Self, ProgressStream) {
        let (tx, rx) = mpsc::sync_channel(capacity.max(1));
        (
            Self {
                sink: Sink::Channel(tx),
            },
            ProgressStream { rx },
        )
    }

    /// `true` when a consumer stream is attached.
    pub fn is_streaming(&self) -> bool {
        matches!(self.sink, Sink::Channel(_))
    }

    /// Deliver one event.
    pub fn emit(&self, event: ProgressEvent) {
        tracing::debug!(kind = ?event.kind, "{}", event.message);
        match &self.sink {
            Sink::Channel(tx) => {
                if tx.send(event).is_err() {
                    tracing::debug!("Progress consumer went away");
                }
            }
            Sink::Console => println!("{}", event.message),
        }
    }

    pub fn stage(&self, message: impl Into<String>) {
        self.emit(ProgressEvent::new(EventKind::Stage, message));
    }

    pub fn command(&self, message: impl Into<String>) {
        self.emit(ProgressEvent::new(EventKind::Command, message));
    }

    pub fn output(&self, message: impl Into<String>) {
        self.emit(ProgressEvent::new(EventKind::Output, message));
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(ProgressEvent::new(EventKind::Info, message));
    }
}

/// Consumer side of the progress stream.
///
/// Iteration yields events in emission order and ends once the reporter
/// has been dropped and the queue drained.
pub struct ProgressStream {
    rx: Receiver<ProgressEvent>,
}

impl ProgressStream {
    /// Block for the next event; `None` once the stream is closed.
    pub fn recv(&self) -> Option<ProgressEvent> {
        self.rx.recv().ok()
    }
}

impl Iterator for ProgressStream {
    type Item = ProgressEvent;

    fn next(&mut self) -> Option<Self::Item> {
        self.recv()
    }
}
