//! Dump command - publish a snapshot as a static Composer repository.

use super::resolve_path;
use crate::output;
use anyhow::{Context, Result};
use clap::Args;
use partitura_config::{CliOverrides, ConfigLoader, parse_duration_secs};
use partitura_core::to_json_pretty;
use partitura_repository::{DumpReport, Dumper, MemorySource};
use partitura_store::{CollectingSink, DeferredDeleter, StaleSink};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

/// Arguments for the dump command
#[derive(Args, Debug, Clone)]
pub struct DumpArgs {
    /// Snapshot of package, version and dependency rows (JSON)
    #[arg(short, long)]
    pub snapshot: PathBuf,

    /// Directory the repository is written to
    #[arg(short, long)]
    pub webroot: Option<PathBuf>,

    /// Config file to use instead of partitura.json
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Grace period before superseded files are deleted (e.g. 300, 5m)
    #[arg(short, long, value_parser = parse_grace)]
    pub grace: Option<u64>,

    /// Write provider files in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Do not delete superseded files; list them instead
    #[arg(long)]
    pub no_retire: bool,

    /// Print the dump report as JSON
    #[arg(long)]
    pub json: bool,
}

fn parse_grace(s: &str) -> Result<u64, String> {
    parse_duration_secs(s).ok_or_else(|| format!("invalid duration '{s}'"))
}

/// Run the dump command
pub async fn run(args: DumpArgs, working_dir: PathBuf, quiet: bool) -> Result<ExitCode> {
    let mut loader = ConfigLoader::new(&working_dir);
    if let Some(file) = &args.config {
        loader = loader.with_file(resolve_path(&working_dir, file));
    }
    let config = loader
        .resolve(CliOverrides {
            webroot: args.webroot.as_deref().map(|p| resolve_path(&working_dir, p)),
            grace_period: args.grace,
            parallel_writes: args.parallel.then_some(true),
        })
        .context("failed to resolve configuration")?;

    let snapshot = resolve_path(&working_dir, &args.snapshot);
    let source = MemorySource::from_file(&snapshot)
        .with_context(|| format!("failed to load snapshot {}", snapshot.display()))?;

    if !quiet && !args.json {
        output::header(&format!("Dumping repository to {}", config.webroot.display()));
    }

    let grace = config.grace_period();
    let deleter = (!args.no_retire).then(|| Arc::new(DeferredDeleter::on_current(grace)));
    let collector = Arc::new(CollectingSink::new());
    let sink: Arc<dyn StaleSink> = match &deleter {
        Some(deleter) => Arc::clone(deleter) as Arc<dyn StaleSink>,
        None => Arc::clone(&collector) as Arc<dyn StaleSink>,
    };

    let dumper = Dumper::new(source, config);
    let report = tokio::task::spawn_blocking(move || dumper.dump(sink.as_ref()))
        .await
        .context("dump task failed")??;

    if args.json {
        println!("{}", to_json_pretty(&report)?);
    } else if !quiet {
        print_summary(&report);
    }

    match deleter {
        Some(deleter) if !report.stale_paths.is_empty() => {
            if !quiet && !args.json {
                output::info(&format!(
                    "Deleting {} superseded file(s) in {}",
                    report.stale_paths.len(),
                    output::format_duration(grace)
                ));
            }
            let deleted = deleter.wait().await;
            if !quiet && !args.json {
                output::success(&format!(
                    "Retired {} file(s) ({} already gone, {} republished, {} failed)",
                    deleted.deleted, deleted.missing, deleted.reclaimed, deleted.failed
                ));
            }
        }
        Some(_) => {}
        None if !args.json => {
            for path in collector.paths() {
                println!("{}", path.display());
            }
        }
        None => {}
    }

    Ok(ExitCode::SUCCESS)
}

fn print_summary(report: &DumpReport) {
    output::success(&format!(
        "Published {} package(s), {} version(s)",
        report.packages, report.versions
    ));
    output::detail("written", &report.written.to_string());
    output::detail("unchanged", &report.unchanged.to_string());
    output::detail("stale", &report.stale_paths.len().to_string());
    output::detail("index", &report.index_hash);
    output::detail("root", &output::path(&report.root_path));
    output::detail(
        "took",
        &output::format_duration(Duration::from_millis(report.duration_ms)),
    );
}
