//! Runtime resolution strategies.
//!
//! Each strategy proposes interpreter paths, best first. The resolver
//! validates proposals and stops at the first one that passes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;
use walkdir::WalkDir;

use crate::shell::{is_executable, parse_system_path, resolve_tool_path, CommandRunner, Invocation, Platform};

use super::candidate::{is_stub, RuntimeVersion, StrategyKind};

/// Depth limit for [`BoundedScan`].
pub const SCAN_MAX_DEPTH: usize = 4;

/// Oldest and newest minor versions probed at well-known locations.
const KNOWN_MINORS: std::ops::RangeInclusive<u32> = 8..=13;

const LAUNCHER_TIMEOUT: Duration = Duration::from_secs(30);

/// Host facts the strategies search against.
pub struct ProbeContext<'a> {
    pub runner: &'a dyn CommandRunner,
    pub platform: Platform,
    /// Directories of the command search path.
    pub path_dirs: Vec<PathBuf>,
    /// Well-known interpreter locations, system-wide first.
    pub known_locations: Vec<PathBuf>,
    /// Roots for the bounded scan.
    pub scan_roots: Vec<PathBuf>,
}

impl<'a> ProbeContext<'a> {
    /// Context for the running host. `install_root` contributes the location
    /// of a self-contained runtime bundle.
    pub fn for_host(runner: &'a dyn CommandRunner, platform: Platform, install_root: &Path) -> Self {
        let home = dirs::home_dir();
        let local_app_data = dirs::data_local_dir();
        Self {
            runner,
            platform,
            path_dirs: parse_system_path(),
            known_locations: known_locations(platform, home.as_deref(), local_app_data.as_deref(), install_root),
            scan_roots: scan_roots(platform, local_app_data.as_deref()),
        }
    }
}

/// Well-known install locations for `platform`, system-wide then per-user.
pub fn known_locations(
    platform: Platform,
    home: Option<&Path>,
    local_app_data: Option<&Path>,
    install_root: &Path,
) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if platform.is_windows() {
        for minor in KNOWN_MINORS.rev() {
            paths.push(PathBuf::from(format!(r"C:\Program Files\Python3{minor}\python.exe")));
            paths.push(PathBuf::from(format!(r"C:\Python3{minor}\python.exe")));
        }
        if let Some(local) = local_app_data {
            for minor in KNOWN_MINORS.rev() {
                paths.push(
                    local
                        .join("Programs")
                        .join("Python")
                        .join(format!("Python3{minor}"))
                        .join("python.exe"),
                );
            }
        }
        paths.push(install_root.join("runtime").join("python.exe"));
    } else {
        for dir in ["/usr/bin", "/usr/local/bin", "/opt/homebrew/bin", "/opt/local/bin"] {
            paths.push(Path::new(dir).join("python3"));
        }
        if let Some(home) = home {
            paths.push(home.join(".local").join("bin").join("python3"));
            paths.push(home.join(".pyenv").join("shims").join("python3"));
        }
    }
    paths
}

/// Fixed roots for the bounded scan.
pub fn scan_roots(platform: Platform, local_app_data: Option<&Path>) -> Vec<PathBuf> {
    if platform.is_windows() {
        let mut roots = vec![PathBuf::from(r"C:\Program Files")];
        if let Some(local) = local_app_data {
            roots.push(local.join("Programs"));
        }
        roots
    } else {
        vec![PathBuf::from("/opt"), PathBuf::from("/usr/local")]
    }
}

/// One way of finding an interpreter.
pub trait ResolutionStrategy {
    fn kind(&self) -> StrategyKind;

    /// Paths worth validating, best first. Empty means "not found".
    fn propose(&self, ctx: &ProbeContext) -> Vec<PathBuf>;
}

/// The strategies in priority order.
pub fn default_chain() -> Vec<Box<dyn ResolutionStrategy>> {
    vec![
        Box::new(Launcher),
        Box::new(Registry),
        Box::new(KnownLocations),
        Box::new(BoundedScan {
            max_depth: SCAN_MAX_DEPTH,
        }),
        Box::new(SearchPath),
    ]
}

/// Ask a version-aware launcher (`py -3` on Windows, `pyenv` elsewhere)
/// for the executable it would run.
pub struct Launcher;

impl ResolutionStrategy for Launcher {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Launcher
    }

    fn propose(&self, ctx: &ProbeContext) -> Vec<PathBuf> {
        let inv = if ctx.platform.is_windows() {
            Invocation::new("py").args(["-3", "-c", "import sys; print(sys.executable)"])
        } else {
            Invocation::new("pyenv").args(["which", "python3"])
        };
        let inv = inv.timeout(LAUNCHER_TIMEOUT);

        match ctx.runner.run(&inv) {
            Ok(result) if result.success => {
                let reported = result.stdout.lines().next().unwrap_or("").trim();
                if reported.is_empty() {
                    return Vec::new();
                }
                let path = PathBuf::from(reported);
                // Forwarding stubs report paths that do not exist.
                if path.is_file() {
                    vec![path]
                } else {
                    debug!("launcher reported missing path {}", path.display());
                    Vec::new()
                }
            }
            _ => Vec::new(),
        }
    }
}

/// Query the Windows registry's PythonCore keys; highest version first.
pub struct Registry;

impl ResolutionStrategy for Registry {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Registry
    }

    fn propose(&self, ctx: &ProbeContext) -> Vec<PathBuf> {
        if !ctx.platform.is_windows() {
            return Vec::new();
        }

        let mut found = Vec::new();
        for hive in ["HKLM", "HKCU"] {
            let inv = Invocation::new("reg").args([
                "query",
                &format!(r"{hive}\SOFTWARE\Python\PythonCore"),
                "/s",
                "/v",
                "ExecutablePath",
            ]);
            if let Ok(result) = ctx.runner.run(&inv) {
                if result.success {
                    found.extend(parse_registry_output(&result.stdout));
                }
            }
        }

        // Stable sort keeps HKLM ahead of HKCU for equal versions.
        found.sort_by(|a, b| b.0.cmp(&a.0));
        found.into_iter().map(|(_, path)| path).collect()
    }
}

/// Parse `reg query ... /s /v ExecutablePath` output into `(version, path)`.
pub fn parse_registry_output(output: &str) -> Vec<(RuntimeVersion, PathBuf)> {
    let mut entries = Vec::new();
    let mut current: Option<RuntimeVersion> = None;

    for line in output.lines() {
        let trimmed = line.trim();
        if trimmed.to_ascii_uppercase().starts_with("HKEY_") {
            current = trimmed
                .split('\\')
                .skip_while(|seg| !seg.eq_ignore_ascii_case("PythonCore"))
                .nth(1)
                .and_then(|tag| {
                    // Tags look like "3.12" or "3.12-32".
                    let numeric: String = tag
                        .chars()
                        .take_while(|c| c.is_ascii_digit() || *c == '.')
                        .collect();
                    numeric.parse::<RuntimeVersion>().ok()
                });
            continue;
        }

        let mut fields = trimmed.splitn(3, char::is_whitespace).filter(|f| !f.is_empty());
        if !fields
            .next()
            .is_some_and(|name| name.eq_ignore_ascii_case("ExecutablePath"))
        {
            continue;
        }
        // The remainder holds the type and the value separated by runs of spaces.
        let rest = trimmed["ExecutablePath".len()..].trim_start();
        let Some(value) = rest
            .strip_prefix("REG_SZ")
            .or_else(|| rest.strip_prefix("REG_EXPAND_SZ"))
            .map(str::trim)
        else {
            continue;
        };
        if let (Some(version), false) = (current, value.is_empty()) {
            entries.push((version, PathBuf::from(value)));
        }
    }

    entries
}

/// Probe well-known install locations in order.
pub struct KnownLocations;

impl ResolutionStrategy for KnownLocations {
    fn kind(&self) -> StrategyKind {
        StrategyKind::KnownLocation
    }

    fn propose(&self, ctx: &ProbeContext) -> Vec<PathBuf> {
        ctx.known_locations
            .iter()
            .filter(|p| p.is_file())
            .cloned()
            .collect()
    }
}

/// Depth-limited walk of a few fixed roots; stops at the first match.
pub struct BoundedScan {
    pub max_depth: usize,
}

impl ResolutionStrategy for BoundedScan {
    fn kind(&self) -> StrategyKind {
        StrategyKind::BoundedScan
    }

    fn propose(&self, ctx: &ProbeContext) -> Vec<PathBuf> {
        let wanted: &[&str] = if ctx.platform.is_windows() {
            &["python.exe", "python3.exe"]
        } else {
            &["python3"]
        };

        for root in &ctx.scan_roots {
            if !root.is_dir() {
                continue;
            }
            let walker = WalkDir::new(root)
                .max_depth(self.max_depth)
                .follow_links(false)
                .into_iter()
                .filter_entry(|e| !is_stub(e.path()));

            for entry in walker.flatten() {
                let name = entry.file_name().to_string_lossy();
                if wanted.iter().any(|w| name.eq_ignore_ascii_case(w))
                    && is_executable(entry.path())
                {
                    debug!("bounded scan hit {}", entry.path().display());
                    return vec![entry.into_path()];
                }
            }
        }
        Vec::new()
    }
}

/// Resolve the bare command names through the search path.
pub struct SearchPath;

impl ResolutionStrategy for SearchPath {
    fn kind(&self) -> StrategyKind {
        StrategyKind::SearchPath
    }

    fn propose(&self, ctx: &ProbeContext) -> Vec<PathBuf> {
        let mut found = Vec::new();
        for name in ["python3", "python"] {
            let tool = ctx.platform.exe_name(name);
            if let Some(path) = resolve_tool_path(&tool, &ctx.path_dirs) {
                // Accept only real files, never a dangling link.
                if let Ok(real) = path.canonicalize() {
                    if real.is_file() && !found.contains(&path) {
                        found.push(path);
                    }
                }
            }
        }
        found
    }
}
