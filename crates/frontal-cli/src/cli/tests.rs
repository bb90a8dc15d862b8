#[cfg(test)]
mod tests {
    use crate::cli::{Cli, Command};
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn test_build_with_cwd() {
        let cli = Cli::try_parse_from(["frontal", "build", "--cwd", "site"]).unwrap();
        match cli.command {
            Command::Build(args) => assert_eq!(args.cwd, Some(PathBuf::from("site"))),
            other => panic!("expected build, got {other:?}"),
        }
    }

    #[test]
    fn test_dev_overrides() {
        let cli = Cli::try_parse_from(["frontal", "dev", "--port", "4000", "--host", "0.0.0.0"])
            .unwrap();
        match cli.command {
            Command::Dev(args) => {
                assert_eq!(args.port, Some(4000));
                assert_eq!(args.host.as_deref(), Some("0.0.0.0"));
                assert!(args.cwd.is_none());
            }
            other => panic!("expected dev, got {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["frontal", "build", "--verbose", "--no-color"]).unwrap();
        assert!(cli.verbose);
        assert!(cli.no_color);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["frontal", "-v", "-q", "build"]).is_err());
    }

    #[test]
    fn test_invalid_port_rejected() {
        assert!(Cli::try_parse_from(["frontal", "dev", "--port", "99999"]).is_err());
    }
}
