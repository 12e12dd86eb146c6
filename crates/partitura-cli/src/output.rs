//! Terminal output helpers.

use console::style;
use std::path::Path;
use std::time::Duration;

/// Print a section header.
pub fn header(message: &str) {
    println!("{}", style(message).cyan().bold());
}

/// Print an informational line.
pub fn info(message: &str) {
    println!("{} {message}", style("i").blue());
}

/// Print a success line.
pub fn success(message: &str) {
    println!("{} {message}", style("✓").green().bold());
}

/// Print a warning to stderr.
pub fn warning(message: &str) {
    eprintln!("{} {}", style("!").yellow().bold(), style(message).yellow());
}

/// Print an error to stderr.
pub fn error(message: &str) {
    eprintln!("{} {message}", style("error:").red().bold());
}

/// Print an indented `label: value` line.
pub fn detail(label: &str, value: &str) {
    println!("  {:<10} {value}", style(format!("{label}:")).dim());
}

/// Style a filesystem path.
pub fn path(path: &Path) -> String {
    style(path.display()).underlined().to_string()
}

/// Human-readable duration.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{secs:.1}s")
    } else {
        format!("{}m{:02}s", duration.as_secs() / 60, duration.as_secs() % 60)
    }
}
