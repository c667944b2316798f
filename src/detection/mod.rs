//! Host package ecosystem detection.

pub mod package_manager;

pub use package_manager::{PackageFamily, PackageManagerDetector};
