//! Terminal output: status lines, a spinner and build summaries.

mod format;
mod messages;
mod spinner;

use std::fmt::Display;

use owo_colors::{OwoColorize, Stream, Style};

pub use format::{format_duration, format_size, print_build_summary};
pub use messages::{debug, error, info, success, warning};
pub use spinner::Spinner;

/// Check if running in a CI environment.
pub fn is_ci() -> bool {
    ["CI", "GITHUB_ACTIONS", "GITLAB_CI", "CIRCLECI", "TRAVIS"]
        .iter()
        .any(|var| std::env::var_os(var).is_some())
}

/// Apply the color choice to every status line printed afterwards.
pub fn init_colors(no_color: bool) {
    let enabled = !no_color && crate::logger::should_use_colors();
    owo_colors::set_override(enabled);
}

/// Render `value` with `style` when stderr takes colors.
pub(crate) fn paint<T: Display>(value: T, style: Style) -> String {
    value
        .if_supports_color(Stream::Stderr, |v| v.style(style))
        .to_string()
}
