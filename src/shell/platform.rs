//! Platform facts and PATH lookups.

use std::path::{Path, PathBuf};

/// Operating system family the installer targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    MacOS,
    Windows,
}

impl Platform {
    /// The family this binary was built for. Other Unixes count as Linux.
    pub fn current() -> Self {
        match std::env::consts::OS {
            "windows" => Platform::Windows,
            "macos" => Platform::MacOS,
            _ => Platform::Linux,
        }
    }

    pub fn is_windows(self) -> bool {
        self == Platform::Windows
    }

    /// `python` becomes `python.exe` on Windows.
    pub fn exe_name(self, stem: &str) -> String {
        match self {
            Platform::Windows => format!("{stem}.exe"),
            Platform::Linux | Platform::MacOS => stem.to_owned(),
        }
    }
}

const CI_MARKERS: &[&str] = &[
    "CI",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "CIRCLECI",
    "TRAVIS",
    "JENKINS_URL",
    "BUILDKITE",
];

/// True under a known CI service; prompts are never shown there.
pub fn is_ci() -> bool {
    CI_MARKERS.iter().any(|var| std::env::var_os(var).is_some())
}

/// Root on Unix, an elevated token on Windows.
pub fn is_elevated() -> bool {
    #[cfg(unix)]
    {
        // SAFETY: geteuid has no preconditions and cannot fail.
        unsafe { libc::geteuid() == 0 }
    }

    #[cfg(windows)]
    {
        // `net session` is refused without an elevated token.
        std::process::Command::new("net")
            .arg("session")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .is_ok_and(|s| s.success())
    }

    #[cfg(not(any(unix, windows)))]
    {
        false
    }
}

/// A regular file some user may execute.
#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    match path.metadata() {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

/// A regular file with a launchable extension.
#[cfg(not(unix))]
pub fn is_executable(path: &Path) -> bool {
    let launchable = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .is_some_and(|e| matches!(e.as_str(), "exe" | "cmd" | "bat"));
    launchable && path.is_file()
}

/// Directories on this process's `PATH`, in order.
pub fn parse_system_path() -> Vec<PathBuf> {
    match std::env::var_os("PATH") {
        Some(raw) => std::env::split_paths(&raw).collect(),
        None => Vec::new(),
    }
}

/// First executable `tool` in `dirs`. A bare name also matches `tool.exe`
/// on Windows.
pub fn resolve_tool_path(tool: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
    let mut names = Vec::with_capacity(2);
    if cfg!(windows) && Path::new(tool).extension().is_none() {
        names.push(format!("{tool}.exe"));
    }
    names.push(tool.to_owned());

    dirs.iter()
        .flat_map(|dir| names.iter().map(move |name| dir.join(name)))
        .find(|candidate| is_executable(candidate))
}

pub fn which(tool: &str) -> Option<PathBuf> {
    resolve_tool_path(tool, &parse_system_path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[cfg(unix)]
    fn place(dir: &Path, name: &str, mode: u32) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        fs::create_dir_all(dir).unwrap();
        let file = dir.join(name);
        fs::write(&file, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&file, fs::Permissions::from_mode(mode)).unwrap();
        file
    }

    #[test]
    fn executable_names() {
        assert_eq!(Platform::Windows.exe_name("python"), "python.exe");
        assert_eq!(Platform::MacOS.exe_name("python3"), "python3");
        assert!(!Platform::Linux.is_windows());
    }

    #[cfg(unix)]
    #[test]
    fn earlier_path_entries_win() {
        let temp = TempDir::new().unwrap();
        let first = place(&temp.path().join("usr-local"), "git", 0o755);
        place(&temp.path().join("usr"), "git", 0o755);

        let dirs = [temp.path().join("usr-local"), temp.path().join("usr")];
        assert_eq!(resolve_tool_path("git", &dirs), Some(first));
    }

    #[cfg(unix)]
    #[test]
    fn plain_files_are_passed_over() {
        let temp = TempDir::new().unwrap();
        place(&temp.path().join("a"), "tar", 0o644);
        let real = place(&temp.path().join("b"), "tar", 0o755);

        let dirs = [temp.path().join("a"), temp.path().join("b")];
        assert_eq!(resolve_tool_path("tar", &dirs), Some(real));
    }

    #[test]
    fn missing_tool_and_file() {
        let temp = TempDir::new().unwrap();
        assert_eq!(resolve_tool_path("crontab", &[temp.path().to_path_buf()]), None);
        assert!(!is_executable(&temp.path().join("absent")));
    }
}
