//! Conversion of CLI errors to miette reports.

use miette::Report;

use crate::error::CliError;

pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        // Carries its own code and help.
        CliError::Bundler(e) => Report::new(e),
        other => match other.hint() {
            Some(hint) => miette::miette!(help = hint, "{}", other),
            None => miette::miette!("{}", other),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundler_error_keeps_diagnostic_code() {
        let report = cli_error_to_miette(CliError::Bundler(frontal_bundler::Error::Resolution {
            specifier: "@assets/x.js".into(),
            requested_by: "bundle `main`".into(),
        }));
        assert_eq!(report.code().unwrap().to_string(), "RESOLUTION_ERROR");
    }

    #[test]
    fn test_hint_becomes_help() {
        let report = cli_error_to_miette(CliError::BuildFailed { count: 1 });
        assert!(report.help().is_some());
        assert_eq!(report.to_string(), "Build failed with 1 error(s)");
    }
}
