//! Runtime resolution.
//!
//! Finds a validated language runtime through an ordered chain of
//! strategies, and installs one unattended when the chain comes up empty.
//!
//! The chain, in priority order:
//! 1. a version-aware launcher
//! 2. the Windows registry (highest version first)
//! 3. well-known install locations
//! 4. a depth-limited scan of a few fixed roots
//! 5. the command search path
//!
//! Candidates are re-resolved on every run; nothing is cached.

pub mod candidate;
pub mod installer;
pub mod resolver;
pub mod strategy;

pub use candidate::{
    is_stub, parse_version_output, validate, RuntimeCandidate, RuntimeVersion, StrategyKind,
};
pub use installer::{
    bundle_python, enable_site_import, installer_args, InstallScope, RuntimeInstaller,
    RuntimeSources, PINNED_VERSION,
};
pub use resolver::{remove_stubs, windows_apps_dir, RuntimeResolver};
pub use strategy::{default_chain, ProbeContext, ResolutionStrategy};

use tracing::warn;

use crate::error::Result;

/// Resolve a runtime, installing one through `installer` if the chain finds
/// nothing. `None` forbids unattended installation.
pub fn resolve_or_install(
    resolver: &RuntimeResolver,
    installer: Option<&RuntimeInstaller>,
) -> Result<RuntimeCandidate> {
    match resolver.resolve() {
        Ok(candidate) => Ok(candidate),
        Err(err) => match installer {
            Some(installer) => {
                warn!("No usable runtime on this host ({err}); installing one");
                installer.install_and_resolve(resolver)
            }
            None => Err(err),
        },
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SetupError;
    use crate::shell::{MockRunner, Platform};

    #[test]
    fn no_installer_means_no_install() {
        let runner = MockRunner::new();
        let resolver = RuntimeResolver::with_chain(
            ProbeContext {
                runner: &runner,
                platform: Platform::Linux,
                path_dirs: Vec::new(),
                known_locations: Vec::new(),
                scan_roots: Vec::new(),
            },
            Vec::new(),
            RuntimeVersion::new(3, 8, 0),
        );

        let err = resolve_or_install(&resolver, None).unwrap_err();
        assert!(matches!(err, SetupError::NoRuntimeFound { .. }));
        assert!(runner.calls().is_empty());
    }
}
