//! `.cmd` wrapper, uninstall script and machine `Path` handling.

use super::ScriptContext;
use crate::jobs::schtasks::task_name;

/// Registry key holding the machine-wide environment.
pub const ENVIRONMENT_KEY: &str =
    r"HKLM\SYSTEM\CurrentControlSet\Control\Session Manager\Environment";

/// Wrapper script. `call` plus `exit /b %ERRORLEVEL%` hands the uninstall
/// script's exit code back to the caller.
pub fn render_wrapper(ctx: &ScriptContext) -> String {
    [
        "@echo off".to_string(),
        format!("rem {} wrapper, generated by mtr-setup.", ctx.command_name),
        r#"if /i "%~1"=="uninstall" goto uninstall"#.to_string(),
        format!(
            r#""{}" -m {} %*"#,
            ctx.python.display(),
            ctx.package_module
        ),
        "exit /b %ERRORLEVEL%".to_string(),
        ":uninstall".to_string(),
        format!(r#"call "{}""#, ctx.uninstall_path.display()),
        "exit /b %ERRORLEVEL%".to_string(),
    ]
    .join("\r\n")
        + "\r\n"
}

fn confirm(lines: &mut Vec<String>, question: &str, label: &str) {
    lines.push("set \"ANSWER=\"".to_string());
    lines.push(format!("set /p ANSWER=\"{question} [y/N] \""));
    lines.push(format!(r#"if /i "%ANSWER%"=="y" goto {label}"#));
    lines.push(format!(r#"if /i "%ANSWER%"=="yes" goto {label}"#));
}

/// Stand-alone uninstall routine. The install root is removed last because
/// the script itself lives under it.
pub fn render_uninstall(ctx: &ScriptContext) -> String {
    let bin_dir = ctx.bin_dir.display().to_string();
    let mut lines = vec![
        "@echo off".to_string(),
        format!(
            "rem Removes {} from this host. Generated by mtr-setup.",
            ctx.command_name
        ),
        "setlocal".to_string(),
        r#"if /i "%~1"=="--yes" goto confirmed"#.to_string(),
    ];
    confirm(
        &mut lines,
        &format!("Remove {} and its scheduled jobs?", ctx.command_name),
        "confirmed",
    );
    lines.push("echo Aborted.".to_string());
    lines.push("exit /b 1".to_string());
    lines.push(":confirmed".to_string());

    for name in &ctx.job_names {
        lines.push(format!(
            r#"schtasks /Delete /TN "{}" /F >nul 2>&1"#,
            task_name(name)
        ));
    }

    lines.push(format!(
        "powershell.exe -NoProfile -NonInteractive -Command \"$p = [Environment]::GetEnvironmentVariable('Path', 'Machine'); \
         $n = ($p -split ';' | Where-Object {{ $_ -and $_.TrimEnd('\\') -ne '{}' }}) -join ';'; \
         [Environment]::SetEnvironmentVariable('Path', $n, 'Machine')\"",
        bin_dir.trim_end_matches('\\').replace('\'', "''")
    ));

    confirm(
        &mut lines,
        &format!("Also delete logs in {}?", ctx.log_dir.display()),
        "purge_logs",
    );
    lines.push("goto remove_files".to_string());
    lines.push(":purge_logs".to_string());
    lines.push(format!(r#"rmdir /s /q "{}""#, ctx.log_dir.display()));
    lines.push(":remove_files".to_string());
    lines.push(format!(r#"echo {} removed."#, ctx.command_name));
    lines.push(format!(r#"del /f /q "{}" >nul 2>&1"#, ctx.wrapper_path.display()));
    // cmd reads scripts lazily; leave the batch context before this file goes away
    lines.push(format!(
        r#"(goto) 2>nul & del /f /q "{}" >nul 2>&1 & rmdir /s /q "{}" & exit /b 0"#,
        ctx.uninstall_path.display(),
        ctx.install_root.display()
    ));

    lines.join("\r\n") + "\r\n"
}

fn normalize(entry: &str) -> String {
    entry.trim().trim_end_matches('\\').to_lowercase()
}

/// `path_value` with `entry` present exactly once. An existing occurrence
/// keeps its position; otherwise `entry` is appended.
pub fn merge_path_entry(path_value: &str, entry: &str) -> String {
    let wanted = normalize(entry);
    let mut seen = false;
    let mut parts = Vec::new();
    for part in path_value.split(';').filter(|p| !p.trim().is_empty()) {
        if normalize(part) == wanted {
            if seen {
                continue;
            }
            seen = true;
        }
        parts.push(part.to_string());
    }
    if !seen {
        parts.push(entry.to_string());
    }
    parts.join(";")
}

/// `path_value` with every occurrence of `entry` removed.
pub fn remove_path_entry(path_value: &str, entry: &str) -> String {
    let unwanted = normalize(entry);
    path_value
        .split(';')
        .filter(|p| !p.trim().is_empty() && normalize(p) != unwanted)
        .collect::<Vec<_>>()
        .join(";")
}

/// Value of `Path` from `reg query <key> /v Path` output.
pub fn parse_reg_path(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let line = line.trim();
        if !line.to_lowercase().starts_with("path") {
            return None;
        }
        ["REG_EXPAND_SZ", "REG_SZ"].iter().find_map(|kind| {
            line.find(kind)
                .map(|pos| line[pos + kind.len()..].trim().to_string())
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publish::testutil::context;
    use crate::shell::Platform;

    #[test]
    fn wrapper_delegates_uninstall() {
        let script = render_wrapper(&context(Platform::Windows));
        assert_eq!(
            script,
            "@echo off\r\n\
             rem mtr-logger wrapper, generated by mtr-setup.\r\n\
             if /i \"%~1\"==\"uninstall\" goto uninstall\r\n\
             \"C:\\ProgramData\\mtr-logger\\venv\\Scripts\\python.exe\" -m mtrpy %*\r\n\
             exit /b %ERRORLEVEL%\r\n\
             :uninstall\r\n\
             call \"C:\\ProgramData\\mtr-logger\\bin\\mtr-logger-uninstall.cmd\"\r\n\
             exit /b %ERRORLEVEL%\r\n"
        );
    }

    #[test]
    fn uninstall_deletes_tasks_and_confirms_twice() {
        let script = render_uninstall(&context(Platform::Windows));
        assert!(script.contains(r#"schtasks /Delete /TN "\MTR\mtr-logger" /F"#));
        assert!(script.contains(r#"schtasks /Delete /TN "\MTR\mtr-logger-archiver" /F"#));
        assert!(script.contains("Remove mtr-logger and its scheduled jobs? [y/N] "));
        assert!(script.contains(r"Also delete logs in C:\mtr\logs? [y/N] "));
        assert!(script.contains(r"-ne 'C:\ProgramData\mtr-logger\bin'"));
        assert!(script.contains(r#"rmdir /s /q "C:\ProgramData\mtr-logger" & exit /b 0"#));
        assert!(script.ends_with("\r\n"));
    }

    #[test]
    fn merge_appends_missing_entry() {
        assert_eq!(
            merge_path_entry(r"C:\Windows;C:\Windows\System32", r"C:\mtr\bin"),
            r"C:\Windows;C:\Windows\System32;C:\mtr\bin"
        );
    }

    #[test]
    fn merge_keeps_single_existing_entry() {
        let path = r"C:\Windows;c:\MTR\bin\;C:\Tools";
        assert_eq!(merge_path_entry(path, r"C:\mtr\bin"), path);
    }

    #[test]
    fn merge_collapses_duplicates_and_empties() {
        assert_eq!(
            merge_path_entry(r"C:\mtr\bin;;C:\Windows;C:\MTR\BIN", r"C:\mtr\bin"),
            r"C:\mtr\bin;C:\Windows"
        );
    }

    #[test]
    fn remove_drops_every_occurrence() {
        assert_eq!(
            remove_path_entry(r"C:\mtr\bin;C:\Windows;c:\mtr\bin\", r"C:\mtr\bin"),
            r"C:\Windows"
        );
    }

    #[test]
    fn parses_reg_query_output() {
        let output = "\r\nHKEY_LOCAL_MACHINE\\SYSTEM\\CurrentControlSet\\Control\\Session Manager\\Environment\r\n\
                      \x20   Path    REG_EXPAND_SZ    %SystemRoot%\\system32;C:\\Program Files\\Git\\cmd\r\n\r\n";
        assert_eq!(
            parse_reg_path(output).as_deref(),
            Some(r"%SystemRoot%\system32;C:\Program Files\Git\cmd")
        );
        assert_eq!(parse_reg_path("ERROR: not found"), None);
    }
}
