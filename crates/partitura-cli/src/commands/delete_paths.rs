//! Delete-paths command - remove superseded repository files.
//!
//! Pairs with `dump --no-retire` when an external scheduler owns the grace
//! period.

use super::resolve_path;
use crate::output;
use anyhow::{Context, Result};
use clap::Args;
use partitura_store::delete_paths;
use std::path::PathBuf;
use std::process::ExitCode;

/// Arguments for the delete-paths command
#[derive(Args, Debug, Clone)]
pub struct DeletePathsArgs {
    /// Files or directories to delete
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

/// Run the delete-paths command
pub async fn run(args: DeletePathsArgs, working_dir: PathBuf, quiet: bool) -> Result<ExitCode> {
    let paths: Vec<PathBuf> = args
        .paths
        .iter()
        .map(|p| resolve_path(&working_dir, p))
        .collect();

    let report = tokio::task::spawn_blocking(move || delete_paths(&paths))
        .await
        .context("deletion task failed")?;

    if !quiet {
        output::success(&format!(
            "Deleted {} path(s) ({} already gone)",
            report.deleted, report.missing
        ));
    }
    if report.failed > 0 {
        output::warning(&format!("{} path(s) could not be deleted", report.failed));
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deletes_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("old.json"), b"{}").unwrap();

        let code = run(
            DeletePathsArgs {
                paths: vec!["old.json".into(), "gone.json".into()],
            },
            dir.path().to_path_buf(),
            true,
        )
        .await
        .unwrap();

        assert_eq!(code, ExitCode::SUCCESS);
        assert!(!dir.path().join("old.json").exists());
    }
}
