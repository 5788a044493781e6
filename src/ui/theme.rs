//! Colors and line shapes shared by the terminal front ends.

use console::Style;

/// Styles for installer output. [`SetupTheme::plain`] renders the same
/// shapes without escape codes.
#[derive(Debug, Clone)]
pub struct SetupTheme {
    pub success: Style,
    pub warning: Style,
    pub error: Style,
    pub header: Style,
    /// The `[n/8]` counter.
    pub step: Style,
    /// Error-block frame and other secondary text.
    pub muted: Style,
}

impl Default for SetupTheme {
    fn default() -> Self {
        Self::new()
    }
}

impl SetupTheme {
    pub fn new() -> Self {
        Self {
            success: Style::new().green(),
            warning: Style::new().yellow(),
            error: Style::new().red().bold(),
            header: Style::new().bold().cyan(),
            step: Style::new().cyan(),
            muted: Style::new().dim(),
        }
    }

    pub fn plain() -> Self {
        Self {
            success: Style::new(),
            warning: Style::new(),
            error: Style::new(),
            header: Style::new(),
            step: Style::new(),
            muted: Style::new(),
        }
    }

    /// Colored when the terminal and `NO_COLOR` allow it, plain otherwise.
    pub fn detect() -> Self {
        if should_use_colors() {
            Self::new()
        } else {
            Self::plain()
        }
    }

    pub fn format_success(&self, msg: &str) -> String {
        self.success.apply_to(format!("✓ {msg}")).to_string()
    }

    pub fn format_warning(&self, msg: &str) -> String {
        self.warning.apply_to(format!("⚠ {msg}")).to_string()
    }

    pub fn format_error(&self, msg: &str) -> String {
        self.error.apply_to(format!("✗ {msg}")).to_string()
    }

    /// `[3/8] Syncing repository`
    pub fn format_progress(&self, current: usize, total: usize, label: &str) -> String {
        format!("{} {}", self.step.apply_to(format!("[{current}/{total}]")), label)
    }

    pub fn format_header(&self, title: &str) -> String {
        self.header.apply_to(format!("== {title} ==")).to_string()
    }

    /// Frame the tail of a failed child's output.
    pub fn format_block(&self, title: &str, output: &str) -> Vec<String> {
        let rule = "─".repeat(title.chars().count().max(30) + 2);
        let mut lines = vec![format!("  {} {}", self.muted.apply_to("┌"), title)];
        lines.extend(
            output
                .lines()
                .map(|line| format!("  {} {}", self.muted.apply_to("│"), line)),
        );
        lines.push(format!("  {}", self.muted.apply_to(format!("└{rule}"))));
        lines
    }
}

/// Colors are on for a stdout terminal unless `NO_COLOR` is set.
pub fn should_use_colors() -> bool {
    std::env::var_os("NO_COLOR").is_none() && console::Term::stdout().is_term()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_status_lines() {
        let theme = SetupTheme::plain();
        assert_eq!(theme.format_success("Package installed"), "✓ Package installed");
        assert_eq!(theme.format_warning("Self-test inconclusive"), "⚠ Self-test inconclusive");
        assert_eq!(theme.format_error("No usable Python"), "✗ No usable Python");
    }

    #[test]
    fn plain_progress_and_header() {
        let theme = SetupTheme::plain();
        assert_eq!(
            theme.format_progress(3, 8, "Syncing repository"),
            "[3/8] Syncing repository"
        );
        assert_eq!(theme.format_header("Installing mtr-logger"), "== Installing mtr-logger ==");
    }

    #[test]
    fn block_frames_every_output_line() {
        let lines = SetupTheme::plain().format_block("pip", "Collecting mtrpy\nERROR: no wheel");
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "  ┌ pip");
        assert_eq!(lines[2], "  │ ERROR: no wheel");
        assert!(lines[3].starts_with("  └──"));
    }
}
