use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Import a Cyrus mail spool into Gmail, one label per folder.
///
/// Safe to interrupt: running the same command again skips everything
/// already imported.
#[derive(Debug, Parser)]
#[command(name = "mailport", version, about)]
pub struct Args {
    /// The user's spool directory.
    pub root: PathBuf,
    /// Service account the access token is minted for.
    pub service_account: String,
    /// Mailbox to import into.
    pub account: String,
    /// Service account key [default: ~/key.pem].
    #[arg(long, value_name = "PATH")]
    pub key: Option<PathBuf>,
    /// Put every label under this one.
    #[arg(long, value_name = "LABEL")]
    pub subfolder: Option<String>,
    /// Import every folder into a single label (drafts and trash excepted).
    #[arg(long)]
    pub flatten: bool,
    /// Also import the Trash folder.
    #[arg(long)]
    pub include_trash: bool,
    /// Also import the Drafts folder.
    #[arg(long)]
    pub include_drafts: bool,
    /// Extra configuration file (TOML, YAML or JSON).
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Maximum number of requests in flight.
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,
    /// More output; repeat for even more. `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use clap::error::ErrorKind;
    use rstest::rstest;

    #[test]
    fn test_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_full_invocation() {
        let args = Args::try_parse_from([
            "mailport",
            "/var/spool/imap/j/user/jane",
            "importer@project.iam.gserviceaccount.com",
            "jane@example.com",
            "--subfolder",
            "Archive2020",
            "--flatten",
            "--include-trash",
            "--concurrency",
            "5",
            "-vv",
        ])
        .unwrap();
        assert_eq!(args.account, "jane@example.com");
        assert_eq!(args.subfolder.as_deref(), Some("Archive2020"));
        assert!(args.flatten && args.include_trash && !args.include_drafts);
        assert_eq!(args.concurrency, Some(5));
        assert_eq!(args.verbose, 2);
        assert!(args.key.is_none());
    }

    #[rstest]
    #[case(&["mailport", "/spool", "svc@example.com"])]
    #[case(&["mailport", "/spool"])]
    fn test_missing_positionals(#[case] argv: &[&str]) {
        let err = Args::try_parse_from(argv).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert_eq!(err.exit_code(), 2);
    }
}
