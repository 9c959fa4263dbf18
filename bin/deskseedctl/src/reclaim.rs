//! ---
//! seed_section: "06-cli"
//! seed_subsection: "binary"
//! seed_type: "source"
//! seed_scope: "code"
//! seed_description: "Reclaim subcommand."
//! seed_version: "v0.0.0-prealpha"
//! seed_owner: "tbd"
//! ---
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Args, ValueEnum};
use deskseed_common::{RunIdentity, RunManifest};
use deskseed_config::AppConfig;
use deskseed_reclaimer::{MatchStrategy, Reclaimer};
use deskseed_transport::HttpTransport;

/// Classification strategy selector.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StrategyArg {
    /// Exact match on a single run identity.
    RunScoped,
    /// Structural pattern match across any recognisable run.
    Heuristic,
    /// Id-set membership in a persisted manifest.
    Manifest,
}

/// Arguments for `deskseedctl reclaim`.
#[derive(Debug, Args)]
pub struct ReclaimArgs {
    #[arg(long, value_enum, help = "How listed entities are classified")]
    strategy: StrategyArg,
    #[arg(long = "run-id", help = "Run identity for the run-scoped strategy")]
    run_id: Option<String>,
    #[arg(long, help = "Manifest path for the manifest strategy")]
    manifest: Option<PathBuf>,
    #[arg(long, help = "Classify and report without deleting anything")]
    dry_run: bool,
}

fn build_strategy(args: &ReclaimArgs) -> Result<MatchStrategy> {
    match args.strategy {
        StrategyArg::RunScoped => {
            let run_id = args
                .run_id
                .as_ref()
                .ok_or_else(|| anyhow!("--run-id is required with --strategy run-scoped"))?;
            Ok(MatchStrategy::RunScoped(RunIdentity::from_label(run_id)))
        }
        StrategyArg::Heuristic => Ok(MatchStrategy::Heuristic),
        StrategyArg::Manifest => {
            let path = args
                .manifest
                .as_ref()
                .ok_or_else(|| anyhow!("--manifest is required with --strategy manifest"))?;
            let manifest = RunManifest::load(path)
                .with_context(|| format!("failed to load manifest {}", path.display()))?;
            Ok(MatchStrategy::Manifest(manifest))
        }
    }
}

/// Execute a reclamation run against the configured tenant.
pub async fn run(config: &AppConfig, args: ReclaimArgs) -> Result<()> {
    let strategy = build_strategy(&args)?;
    let transport = HttpTransport::new(&config.tenant)?;

    let report = Reclaimer::new(&transport, strategy)
        .dry_run(args.dry_run)
        .run()
        .await;

    for stage in &report.stages {
        match &stage.stage_error {
            Some(error) => println!("{}s: stage failed: {error}", stage.kind),
            None if args.dry_run => {
                println!("{}s: {} would be deleted", stage.kind, stage.matched.len())
            }
            None => println!(
                "{}s: {} matched, {} deleted, {} failed",
                stage.kind,
                stage.matched.len(),
                stage.deleted.len(),
                stage.failures.len()
            ),
        }
    }

    if !report.any_stage_ran() {
        return Err(anyhow!("every reclamation stage failed to run"));
    }
    Ok(())
}
