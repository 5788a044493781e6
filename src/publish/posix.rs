//! `sh` wrapper, uninstall script and profile entry.

use std::path::Path;

use super::ScriptContext;
use crate::jobs::cron::{lock_file, marker};

fn q(path: &Path) -> String {
    shell_words::quote(&path.display().to_string()).into_owned()
}

/// Matches `uninstall` in any letter case.
const UNINSTALL_PATTERN: &str = "[Uu][Nn][Ii][Nn][Ss][Tt][Aa][Ll][Ll]";

/// Wrapper forwarding to the package, or to the uninstall script when the
/// first argument is `uninstall`. Either way `exec` hands over the exit code.
pub fn render_wrapper(ctx: &ScriptContext) -> String {
    format!(
        "#!/bin/sh\n\
         # {name} wrapper, generated by mtr-setup.\n\
         case \"${{1:-}}\" in\n\
         \x20   {pattern})\n\
         \x20       exec {uninstall}\n\
         \x20       ;;\n\
         esac\n\
         exec {python} -m {module} \"$@\"\n",
        name = ctx.command_name,
        pattern = UNINSTALL_PATTERN,
        uninstall = q(&ctx.uninstall_path),
        python = q(&ctx.python),
        module = shell_words::quote(&ctx.package_module),
    )
}

/// Stand-alone uninstall routine. `--yes` skips the first confirmation;
/// `--purge-logs` and `--keep-logs` answer the second.
pub fn render_uninstall(ctx: &ScriptContext) -> String {
    let mut out = String::new();
    out.push_str("#!/bin/sh\n");
    out.push_str(&format!(
        "# Removes {} from this host. Generated by mtr-setup.\n",
        ctx.command_name
    ));
    out.push_str(
        "set -u\n\
         \n\
         confirm() {\n\
         \x20   printf '%s [y/N] ' \"$1\"\n\
         \x20   read -r answer || answer=\"\"\n\
         \x20   case \"$answer\" in\n\
         \x20       [Yy]|[Yy][Ee][Ss]) return 0 ;;\n\
         \x20       *) return 1 ;;\n\
         \x20   esac\n\
         }\n\
         \n\
         assume_yes=0\n\
         purge_logs=ask\n\
         for arg in \"$@\"; do\n\
         \x20   case \"$arg\" in\n\
         \x20       --yes|-y) assume_yes=1 ;;\n\
         \x20       --purge-logs) purge_logs=yes ;;\n\
         \x20       --keep-logs) purge_logs=no ;;\n\
         \x20   esac\n\
         done\n\
         \n",
    );
    out.push_str(&format!(
        "if [ \"$assume_yes\" -ne 1 ]; then\n\
         \x20   confirm \"Remove {} and its scheduled jobs?\" || {{ echo \"Aborted.\"; exit 1; }}\n\
         fi\n\n",
        ctx.command_name
    ));

    if !ctx.job_names.is_empty() {
        let patterns = ctx
            .job_names
            .iter()
            .map(|name| format!("-e {}", shell_words::quote(&format!("{}$", marker(name)))))
            .collect::<Vec<_>>()
            .join(" ");
        out.push_str(&format!(
            "if command -v crontab >/dev/null 2>&1; then\n\
             \x20   crontab -l 2>/dev/null | grep -v {patterns} | crontab -\n\
             fi\n"
        ));
        let locks = ctx
            .job_names
            .iter()
            .map(|name| q(&lock_file(&ctx.lock_dir, name)))
            .collect::<Vec<_>>()
            .join(" ");
        out.push_str(&format!("rm -f {locks}\n"));
    }

    out.push_str(&format!("rm -rf {}\n", q(&ctx.install_root)));
    if let Some(profile) = &ctx.profile_script {
        out.push_str(&format!("rm -f {}\n", q(profile)));
    }
    out.push_str(&format!(
        "\n\
         if [ \"$purge_logs\" = yes ] || {{ [ \"$purge_logs\" = ask ] && confirm \"Also delete logs in {logs}?\"; }}; then\n\
         \x20   rm -rf {logs_q}\n\
         fi\n\n\
         rm -f {wrapper} {uninstall}\n\
         echo \"{name} removed.\"\n\
         exit 0\n",
        logs = ctx.log_dir.display(),
        logs_q = q(&ctx.log_dir),
        wrapper = q(&ctx.wrapper_path),
        uninstall = q(&ctx.uninstall_path),
        name = ctx.command_name,
    ));
    out
}

/// Profile fragment that prepends `bin_dir` to `PATH` unless already there.
pub fn render_profile(bin_dir: &Path) -> String {
    let dir = q(bin_dir);
    format!(
        "# Added by mtr-setup.\n\
         case \":$PATH:\" in\n\
         \x20   *:{dir}:*) ;;\n\
         \x20   *) PATH={dir}:\"$PATH\"; export PATH ;;\n\
         esac\n"
    )
}
