//! Writes entry points and keeps the wrapper directory on `PATH`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{posix, windows, ScriptContext};
use crate::config::DesiredConfig;
use crate::error::Result;
use crate::jobs::cron::LOCK_DIR;
use crate::shell::{run_checked, CommandRunner, Invocation, Platform};

/// Where the managed `PATH` fragment goes on Unix.
pub const PROFILE_DIR: &str = "/etc/profile.d";

/// Result of [`EntryPointPublisher::publish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedEntryPoints {
    pub wrapper: PathBuf,
    pub uninstall: PathBuf,
    /// Profile script or registry value that carries the `PATH` entry.
    pub path_entry: String,
    /// Whether the persistent `PATH` was changed by this run.
    pub path_changed: bool,
}

pub struct EntryPointPublisher<'a> {
    runner: &'a dyn CommandRunner,
    platform: Platform,
    profile_dir: PathBuf,
    lock_dir: PathBuf,
}

impl<'a> EntryPointPublisher<'a> {
    pub fn new(runner: &'a dyn CommandRunner, platform: Platform) -> Self {
        Self {
            runner,
            platform,
            profile_dir: PathBuf::from(PROFILE_DIR),
            lock_dir: PathBuf::from(LOCK_DIR),
        }
    }

    pub fn with_profile_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.profile_dir = dir.into();
        self
    }

    pub fn with_lock_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.lock_dir = dir.into();
        self
    }

    fn script_name(&self, stem: &str) -> String {
        if self.platform.is_windows() {
            format!("{stem}.cmd")
        } else {
            stem.to_string()
        }
    }

    pub fn wrapper_path(&self, config: &DesiredConfig) -> PathBuf {
        config.bin_dir.join(self.script_name(&config.command_name))
    }

    pub fn uninstall_path(&self, config: &DesiredConfig) -> PathBuf {
        config
            .bin_dir
            .join(self.script_name(&format!("{}-uninstall", config.command_name)))
    }

    fn profile_script(&self, config: &DesiredConfig) -> PathBuf {
        self.profile_dir.join(format!("{}.sh", config.command_name))
    }

    /// Inputs for the generated scripts.
    pub fn context(&self, config: &DesiredConfig, python: &Path, job_names: &[String]) -> ScriptContext {
        ScriptContext {
            command_name: config.command_name.clone(),
            python: python.to_path_buf(),
            package_module: config.package_module.clone(),
            wrapper_path: self.wrapper_path(config),
            uninstall_path: self.uninstall_path(config),
            install_root: config.install_root.clone(),
            bin_dir: config.bin_dir.clone(),
            log_dir: config.log_dir.clone(),
            job_names: job_names.to_vec(),
            lock_dir: self.lock_dir.clone(),
            profile_script: (!self.platform.is_windows()).then(|| self.profile_script(config)),
        }
    }

    /// Write the wrapper and uninstall scripts, then put `bin_dir` on the
    /// persistent `PATH`. Safe to repeat: every file is rewritten in place.
    pub fn publish(
        &self,
        config: &DesiredConfig,
        python: &Path,
        job_names: &[String],
    ) -> Result<PublishedEntryPoints> {
        let ctx = self.context(config, python, job_names);
        fs::create_dir_all(&config.bin_dir)?;

        let (wrapper, uninstall) = if self.platform.is_windows() {
            (windows::render_wrapper(&ctx), windows::render_uninstall(&ctx))
        } else {
            (posix::render_wrapper(&ctx), posix::render_uninstall(&ctx))
        };
        write_script(&ctx.wrapper_path, &wrapper)?;
        write_script(&ctx.uninstall_path, &uninstall)?;
        info!("Published {}", ctx.wrapper_path.display());

        let (path_entry, path_changed) = self.ensure_on_path(config)?;
        Ok(PublishedEntryPoints {
            wrapper: ctx.wrapper_path,
            uninstall: ctx.uninstall_path,
            path_entry,
            path_changed,
        })
    }

    /// Make `bin_dir` appear exactly once on the persistent `PATH`.
    pub fn ensure_on_path(&self, config: &DesiredConfig) -> Result<(String, bool)> {
        if self.platform.is_windows() {
            let entry = config.bin_dir.display().to_string();
            let current = self.read_machine_path()?;
            let merged = windows::merge_path_entry(&current, &entry);
            let changed = merged != current;
            if changed {
                self.write_machine_path(&merged)?;
                info!("Added {} to the machine Path", entry);
            } else {
                debug!("{} already on the machine Path", entry);
            }
            Ok((format!(r"{}\Path", windows::ENVIRONMENT_KEY), changed))
        } else {
            let profile = self.profile_script(config);
            let content = posix::render_profile(&config.bin_dir);
            let changed = fs::read_to_string(&profile).ok().as_deref() != Some(content.as_str());
            if changed {
                fs::create_dir_all(&self.profile_dir)?;
                fs::write(&profile, content)?;
                info!("Wrote {}", profile.display());
            }
            Ok((profile.display().to_string(), changed))
        }
    }

    /// Remove the wrapper, the uninstall script and the `PATH` entry.
    pub fn unpublish(&self, config: &DesiredConfig) -> Result<()> {
        for path in [self.wrapper_path(config), self.uninstall_path(config)] {
            remove_if_exists(&path)?;
        }

        if self.platform.is_windows() {
            let current = self.read_machine_path()?;
            let pruned =
                windows::remove_path_entry(&current, &config.bin_dir.display().to_string());
            if pruned != current {
                self.write_machine_path(&pruned)?;
            }
        } else {
            remove_if_exists(&self.profile_script(config))?;
        }
        Ok(())
    }

    fn read_machine_path(&self) -> Result<String> {
        let query = Invocation::new("reg").args(["query", windows::ENVIRONMENT_KEY, "/v", "Path"]);
        let result = run_checked(self.runner, &query)?;
        Ok(windows::parse_reg_path(&result.stdout).unwrap_or_default())
    }

    fn write_machine_path(&self, value: &str) -> Result<()> {
        let add = Invocation::new("reg").args([
            "add",
            windows::ENVIRONMENT_KEY,
            "/v",
            "Path",
            "/t",
            "REG_EXPAND_SZ",
            "/d",
            value,
            "/f",
        ]);
        run_checked(self.runner, &add)?;
        Ok(())
    }
}

fn write_script(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    }
    Ok(())
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!("removed {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::{ARCHIVER_JOB, LOGGER_JOB};
    use crate::shell::{MockResponse, MockRunner};
    use tempfile::TempDir;

    fn jobs() -> Vec<String> {
        vec![LOGGER_JOB.to_string(), ARCHIVER_JOB.to_string()]
    }

    fn unix_config(temp: &TempDir) -> DesiredConfig {
        DesiredConfig {
            install_root: temp.path().join("opt"),
            bin_dir: temp.path().join("bin"),
            log_dir: temp.path().join("logs"),
            ..DesiredConfig::for_platform(Platform::Linux)
        }
    }

    #[test]
    fn publishes_unix_scripts_and_profile() {
        let temp = TempDir::new().unwrap();
        let config = unix_config(&temp);
        let runner = MockRunner::new();
        let publisher = EntryPointPublisher::new(&runner, Platform::Linux)
            .with_profile_dir(temp.path().join("profile.d"));

        let published = publisher
            .publish(&config, Path::new("/opt/mtr-logger/venv/bin/python"), &jobs())
            .unwrap();

        assert_eq!(published.wrapper, config.bin_dir.join("mtr-logger"));
        assert_eq!(published.uninstall, config.bin_dir.join("mtr-logger-uninstall"));
        assert!(published.path_changed);
        let wrapper = fs::read_to_string(&published.wrapper).unwrap();
        assert!(wrapper.contains("-m mtrpy \"$@\""));
        let profile = fs::read_to_string(temp.path().join("profile.d/mtr-logger.sh")).unwrap();
        assert!(profile.contains(&config.bin_dir.display().to_string()));
        assert!(runner.calls().is_empty());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&published.uninstall).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[test]
    fn republishing_leaves_path_untouched() {
        let temp = TempDir::new().unwrap();
        let config = unix_config(&temp);
        let runner = MockRunner::new();
        let publisher = EntryPointPublisher::new(&runner, Platform::Linux)
            .with_profile_dir(temp.path().join("profile.d"));
        let python = Path::new("/venv/bin/python");

        publisher.publish(&config, python, &jobs()).unwrap();
        let again = publisher.publish(&config, python, &jobs()).unwrap();
        assert!(!again.path_changed);
    }

    #[test]
    fn unpublish_removes_unix_files() {
        let temp = TempDir::new().unwrap();
        let config = unix_config(&temp);
        let runner = MockRunner::new();
        let publisher = EntryPointPublisher::new(&runner, Platform::Linux)
            .with_profile_dir(temp.path().join("profile.d"));
        let published = publisher.publish(&config, Path::new("/venv/bin/python"), &jobs()).unwrap();

        publisher.unpublish(&config).unwrap();
        assert!(!published.wrapper.exists());
        assert!(!published.uninstall.exists());
        assert!(!temp.path().join("profile.d/mtr-logger.sh").exists());
        publisher.unpublish(&config).unwrap();
    }

    fn reg_output(path: &str) -> String {
        format!(
            "\r\nHKEY_LOCAL_MACHINE\\SYSTEM\\CurrentControlSet\\Control\\Session Manager\\Environment\r\n    Path    REG_EXPAND_SZ    {path}\r\n"
        )
    }

    #[test]
    fn windows_path_gains_bin_dir_once() {
        let runner = MockRunner::new();
        runner.on("reg query", MockResponse::ok(&reg_output(r"C:\Windows;C:\Windows\System32")));
        runner.on("reg add", MockResponse::ok("The operation completed successfully."));
        let config = DesiredConfig {
            bin_dir: PathBuf::from(r"C:\ProgramData\mtr-logger\bin"),
            ..DesiredConfig::for_platform(Platform::Windows)
        };

        let (entry, changed) = EntryPointPublisher::new(&runner, Platform::Windows)
            .ensure_on_path(&config)
            .unwrap();
        assert!(changed);
        assert!(entry.ends_with(r"Environment\Path"));

        let add = runner
            .calls()
            .into_iter()
            .find(|c| c.args.first().map(String::as_str) == Some("add"))
            .unwrap();
        assert!(add
            .args
            .contains(&r"C:\Windows;C:\Windows\System32;C:\ProgramData\mtr-logger\bin".to_string()));
    }

    #[test]
    fn windows_path_already_present_is_not_rewritten() {
        let runner = MockRunner::new();
        runner.on(
            "reg query",
            MockResponse::ok(&reg_output(r"C:\Windows;C:\ProgramData\mtr-logger\bin")),
        );
        let config = DesiredConfig {
            bin_dir: PathBuf::from(r"C:\ProgramData\mtr-logger\bin"),
            ..DesiredConfig::for_platform(Platform::Windows)
        };

        let (_, changed) = EntryPointPublisher::new(&runner, Platform::Windows)
            .ensure_on_path(&config)
            .unwrap();
        assert!(!changed);
        assert!(!runner.was_called("reg add"));
    }

    #[test]
    fn windows_script_names_end_in_cmd() {
        let runner = MockRunner::new();
        let publisher = EntryPointPublisher::new(&runner, Platform::Windows);
        let config = DesiredConfig::for_platform(Platform::Windows);
        assert!(publisher.wrapper_path(&config).to_string_lossy().ends_with("mtr-logger.cmd"));
        assert!(publisher
            .uninstall_path(&config)
            .to_string_lossy()
            .ends_with("mtr-logger-uninstall.cmd"));
        assert!(publisher.context(&config, Path::new("python.exe"), &[]).profile_script.is_none());
    }
}
