//! Status lines on stderr.

use owo_colors::Style;

use super::paint;

pub fn success(message: &str) {
    eprintln!("{} {}", paint("✓", Style::new().green().bold()), message);
}

pub fn info(message: &str) {
    eprintln!("{} {}", paint("ℹ", Style::new().blue().bold()), message);
}

pub fn warning(message: &str) {
    let style = Style::new().yellow();
    eprintln!("{} {}", paint("⚠", style.bold()), paint(message, style));
}

pub fn error(message: &str) {
    let style = Style::new().red();
    eprintln!("{} {}", paint("✗", style.bold()), paint(message, style));
}

/// Only printed when `RUST_LOG` is set.
pub fn debug(message: &str) {
    if std::env::var_os("RUST_LOG").is_some() {
        let style = Style::new().dimmed();
        eprintln!("{} {}", paint("◆", style), paint(message, style));
    }
}
