//! Terminal styling for CLI reports.
//!
//! Plain text is emitted for `NO_COLOR` and whenever stdout is redirected, so
//! piped reports stay free of escape codes.

use console::Style;
use owo_colors::{AnsiColors, OwoColorize};
use std::sync::LazyLock;

/// Shared styling for every report the CLI prints.
pub static THEME: LazyLock<Theme> = LazyLock::new(Theme::default);

#[derive(Debug, Clone)]
pub struct Theme {
    pub success: Style,
    pub error: Style,
    pub warning: Style,
    /// Section headings
    pub header: Style,
    /// Suggestions and other secondary lines
    pub dim: Style,
    pub path: Style,
    /// Counts and metric values
    pub number: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            success: Style::new().green().bright(),
            error: Style::new().red().bright(),
            warning: Style::new().yellow().bright(),
            header: Style::new().cyan().bold(),
            dim: Style::new().dim(),
            path: Style::new().magenta(),
            number: Style::new().cyan(),
        }
    }
}

impl Theme {
    fn marked(&self, mark: &str, color: AnsiColors, style: &Style, text: &str) -> String {
        if Self::should_disable_colors() {
            format!("{mark} {text}")
        } else {
            format!("{} {}", mark.color(color), style.apply_to(text))
        }
    }

    pub fn success_with_icon(&self, text: &str) -> String {
        self.marked("✓", AnsiColors::Green, &self.success, text)
    }

    pub fn error_with_icon(&self, text: &str) -> String {
        self.marked("✗", AnsiColors::Red, &self.error, text)
    }

    pub fn warning_with_icon(&self, text: &str) -> String {
        self.marked("⚠", AnsiColors::Yellow, &self.warning, text)
    }

    /// Heading printed above each report table, preceded by a blank line.
    pub fn section(&self, title: &str) -> String {
        format!("\n{}", self.marked("▸", AnsiColors::Cyan, &self.header, title))
    }

    pub fn should_disable_colors() -> bool {
        use is_terminal::IsTerminal;
        std::env::var("NO_COLOR").is_ok() || !std::io::stdout().is_terminal()
    }

    /// Applies `style` unless colors are disabled.
    pub fn apply<T: std::fmt::Display>(&self, style: &Style, text: T) -> String {
        if Self::should_disable_colors() {
            text.to_string()
        } else {
            style.apply_to(text).to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_output_when_colors_disabled() {
        if !Theme::should_disable_colors() {
            return;
        }
        assert_eq!(THEME.success_with_icon("done"), "✓ done");
        assert_eq!(THEME.warning_with_icon("few chunks"), "⚠ few chunks");
        assert_eq!(THEME.apply(&THEME.number, 42), "42");
        assert_eq!(THEME.section("Clusters"), "\n▸ Clusters");
    }
}
