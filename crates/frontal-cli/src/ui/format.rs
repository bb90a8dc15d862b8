//! Formatting for sizes, durations and build summaries.

use console::Term;
use frontal_bundler::BuildStats;
use owo_colors::Style;
use std::time::Duration;

use super::paint;

/// Format file size in human-readable format.
///
/// ```
/// use frontal_cli::ui::format_size;
///
/// assert_eq!(format_size(0), "0 B");
/// assert_eq!(format_size(1024), "1.00 KB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];

    let mut size = bytes as f64;
    let mut unit_idx = 0;
    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

/// Format duration as `50ms`, `1.50s` or `1m 30s`.
pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();

    if total_ms < 1000 {
        format!("{}ms", total_ms)
    } else if total_ms < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// Print the written files of a build with their sizes, then the total.
pub fn print_build_summary(stats: &BuildStats, duration: Duration) {
    let width = Term::stderr().size().1 as usize;
    let rule = "─".repeat(width.clamp(20, 80));

    eprintln!("\n{}", paint("Build Summary", Style::new().bold().underline()));
    eprintln!("{}", rule);

    let written: Vec<_> = stats.assets.iter().filter(|a| !a.development).collect();
    for asset in &written {
        eprintln!(
            "  {} {} {}",
            paint("▸", Style::new().blue()),
            paint(&asset.name, Style::new().bright_white().bold()),
            paint(format_size(asset.size as u64), Style::new().dimmed())
        );
    }

    eprintln!("{}", rule);

    let total: u64 = written.iter().map(|a| a.size as u64).sum();
    eprintln!(
        "  {} {} files, {} in {} ({})",
        paint("Total:", Style::new().bold()),
        written.len(),
        paint(format_size(total), Style::new().green()),
        paint(format_duration(duration), Style::new().green()),
        paint(&stats.hash, Style::new().dimmed())
    );
}
