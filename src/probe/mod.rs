//! Capability status probing.

pub mod module;

pub use module::{ModuleProbe, ProbeReport, Readiness};
