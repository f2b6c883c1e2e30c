//! Pure formatting functions for UI output.
//!
//! This module contains all display logic for release phases. Colors come
//! from `console`, which drops styling when the terminal does not support it.

use console::style;

use crate::boundary::ReleaseWarning;
use crate::domain::SemanticVersion;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Display a release warning to the user.
pub fn display_boundary_warning(warning: &ReleaseWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), warning);
}

/// Render the version a release rotates to.
///
/// # Arguments
/// * `previous` - Last released version (None for the first release)
/// * `next` - Version being released
pub fn format_version_change(previous: Option<&SemanticVersion>, next: &str) -> String {
    match previous {
        Some(previous) => format!(
            "\n{}\n  From: {}\n  To:   {}",
            style("Release Version:").bold(),
            style(previous).red(),
            style(next).green()
        ),
        None => format!(
            "\n{}\n  Version: {}",
            style("Initial Release:").bold(),
            style(next).green()
        ),
    }
}

/// Display the version a release rotates to.
pub fn display_version_change(previous: Option<&SemanticVersion>, next: &str) {
    println!("{}", format_version_change(previous, next));
}

/// Render the description of the release, at most 10 lines.
pub fn format_release_description(description: &str) -> String {
    let lines: Vec<&str> = description.lines().collect();
    let mut out = style("Release notes:").underlined().to_string();
    for line in lines.iter().take(10) {
        out.push_str(&format!("\n  {}", line));
    }
    if lines.len() > 10 {
        out.push_str(&format!("\n  ... and {} more lines", lines.len() - 10));
    }
    out
}

pub fn display_release_description(description: &str) {
    println!("{}", format_release_description(description));
}
