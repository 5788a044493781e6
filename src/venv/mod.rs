//! Isolated execution environment for the logger package.
//!
//! Reused across runs unless pip fails its liveness check, in which case it
//! is re-bootstrapped once in place; a second failure is fatal.

pub mod provisioner;

pub use provisioner::{venv_python, EnvKind, Environment, EnvironmentProvisioner};
