//! Host capability detection and the package catalog interface.

pub mod capabilities;
pub mod packages;

pub use capabilities::{HostCapabilities, PackageManager, SchedulerFamily};
pub use packages::{install_invocation, runtime_packages, HostPackages};
