//! Post-install trial run.
//!
//! One short, bounded invocation through the published wrapper. The result
//! never changes the installer's exit code; a failure only means the install
//! could not be confirmed from here (no network, probe permissions).

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, SetupError};
use crate::shell::{CommandRunner, Invocation};

/// Hard limit on the trial run.
pub const SELF_TEST_TIMEOUT: Duration = Duration::from_secs(120);

/// `<wrapper> <target> --no-screen --duration 5 --probes 1`
pub fn self_test_invocation(wrapper: &Path, target: &str) -> Invocation {
    Invocation::new(wrapper.to_string_lossy())
        .arg(target)
        .args(["--no-screen", "--duration", "5", "--probes", "1"])
        .timeout(SELF_TEST_TIMEOUT)
}

/// Run the trial. Any failure is [`SetupError::SelfTestInconclusive`].
pub fn run_self_test(runner: &dyn CommandRunner, wrapper: &Path, target: &str) -> Result<()> {
    let invocation = self_test_invocation(wrapper, target);
    debug!("self-test: {}", invocation.display());

    let result = runner
        .run(&invocation)
        .map_err(|e| SetupError::SelfTestInconclusive {
            message: format!("could not start {}: {}", wrapper.display(), e),
        })?;

    if result.timed_out {
        return Err(SetupError::SelfTestInconclusive {
            message: format!(
                "no result within {}s",
                SELF_TEST_TIMEOUT.as_secs()
            ),
        });
    }
    if !result.success {
        let tail = result.output_tail();
        return Err(SetupError::SelfTestInconclusive {
            message: match result.exit_code {
                Some(code) if tail.is_empty() => format!("exit code {code}"),
                Some(code) => format!("exit code {code}: {tail}"),
                None => format!("terminated: {tail}"),
            },
        });
    }

    info!("Self-test passed against {}", target);
    Ok(())
}
