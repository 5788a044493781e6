//! Wrapper and uninstall entry points.
//!
//! The publisher writes a wrapper command that forwards to the installed
//! package, an uninstall script that works without `mtr-setup`, and makes
//! the wrapper directory part of the persistent `PATH` exactly once.

pub mod posix;
pub mod publisher;
pub mod windows;

use std::path::PathBuf;

pub use publisher::{EntryPointPublisher, PublishedEntryPoints, PROFILE_DIR};
pub use windows::{merge_path_entry, remove_path_entry};

/// Everything the generated scripts need to know.
#[derive(Debug, Clone)]
pub struct ScriptContext {
    pub command_name: String,
    /// Interpreter of the provisioned environment.
    pub python: PathBuf,
    pub package_module: String,
    pub wrapper_path: PathBuf,
    pub uninstall_path: PathBuf,
    pub install_root: PathBuf,
    pub bin_dir: PathBuf,
    pub log_dir: PathBuf,
    /// Scheduler jobs the uninstall script removes.
    pub job_names: Vec<String>,
    /// Directory of the cron `flock` files.
    pub lock_dir: PathBuf,
    /// Managed profile fragment, on hosts that use one.
    pub profile_script: Option<PathBuf>,
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::ScriptContext;
    use crate::shell::Platform;
    use std::path::PathBuf;

    pub fn context(platform: Platform) -> ScriptContext {
        let jobs = vec!["mtr-logger".to_string(), "mtr-logger-archiver".to_string()];
        if platform.is_windows() {
            ScriptContext {
                command_name: "mtr-logger".to_string(),
                python: PathBuf::from(r"C:\ProgramData\mtr-logger\venv\Scripts\python.exe"),
                package_module: "mtrpy".to_string(),
                wrapper_path: PathBuf::from(r"C:\ProgramData\mtr-logger\bin\mtr-logger.cmd"),
                uninstall_path: PathBuf::from(
                    r"C:\ProgramData\mtr-logger\bin\mtr-logger-uninstall.cmd",
                ),
                install_root: PathBuf::from(r"C:\ProgramData\mtr-logger"),
                bin_dir: PathBuf::from(r"C:\ProgramData\mtr-logger\bin"),
                log_dir: PathBuf::from(r"C:\mtr\logs"),
                job_names: jobs,
                lock_dir: PathBuf::new(),
                profile_script: None,
            }
        } else {
            ScriptContext {
                command_name: "mtr-logger".to_string(),
                python: PathBuf::from("/opt/mtr-logger/venv/bin/python"),
                package_module: "mtrpy".to_string(),
                wrapper_path: PathBuf::from("/usr/local/bin/mtr-logger"),
                uninstall_path: PathBuf::from("/usr/local/bin/mtr-logger-uninstall"),
                install_root: PathBuf::from("/opt/mtr-logger"),
                bin_dir: PathBuf::from("/usr/local/bin"),
                log_dir: PathBuf::from("/root/mtr/logs"),
                job_names: jobs,
                lock_dir: PathBuf::from("/var/lock"),
                profile_script: Some(PathBuf::from("/etc/profile.d/mtr-logger.sh")),
            }
        }
    }
}
