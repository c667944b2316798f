//! Running kernel queries.

pub mod identity;

pub use identity::KernelIdentity;
