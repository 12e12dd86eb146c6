//! CLI commands for Partitura.

pub mod delete_paths;
pub mod dump;

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Partitura - static Composer repository generator
#[derive(Parser, Debug)]
#[command(name = "partitura")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Working directory
    #[arg(short = 'd', long, global = true)]
    pub working_dir: Option<PathBuf>,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    pub no_ansi: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Publish a snapshot as a static Composer repository
    Dump(dump::DumpArgs),

    /// Delete superseded repository files
    #[command(name = "delete-paths")]
    DeletePaths(delete_paths::DeletePathsArgs),
}

/// Resolve `path` against the working directory.
pub fn resolve_path(working_dir: &std::path::Path, path: &std::path::Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        working_dir.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_dump() {
        let cli = Cli::try_parse_from([
            "partitura",
            "-vv",
            "dump",
            "--snapshot",
            "snapshot.json",
            "--webroot",
            "/srv/composer",
            "--grace",
            "5m",
            "--parallel",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        let Commands::Dump(args) = cli.command else {
            panic!("expected dump");
        };
        assert_eq!(args.snapshot, PathBuf::from("snapshot.json"));
        assert_eq!(args.webroot, Some(PathBuf::from("/srv/composer")));
        assert_eq!(args.grace, Some(300));
        assert!(args.parallel);
        assert!(!args.no_retire);
    }

    #[test]
    fn parses_delete_paths() {
        let cli = Cli::try_parse_from(["partitura", "-q", "delete-paths", "a.json", "b.json"])
            .unwrap();
        assert!(cli.quiet);
        let Commands::DeletePaths(args) = cli.command else {
            panic!("expected delete-paths");
        };
        assert_eq!(args.paths.len(), 2);
    }

    #[test]
    fn rejects_bad_grace() {
        assert!(
            Cli::try_parse_from(["partitura", "dump", "--snapshot", "s.json", "--grace", "soon"])
                .is_err()
        );
    }

    #[test]
    fn relative_paths_follow_working_dir() {
        let base = std::path::Path::new("/srv");
        assert_eq!(
            resolve_path(base, std::path::Path::new("s.json")),
            PathBuf::from("/srv/s.json")
        );
        assert_eq!(
            resolve_path(base, std::path::Path::new("/tmp/s.json")),
            PathBuf::from("/tmp/s.json")
        );
    }
}
