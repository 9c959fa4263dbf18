//! ---
//! seed_section: "06-cli"
//! seed_subsection: "binary"
//! seed_type: "source"
//! seed_scope: "code"
//! seed_description: "Provision subcommand."
//! seed_version: "v0.0.0-prealpha"
//! seed_owner: "tbd"
//! ---
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use deskseed_common::RunIdentity;
use deskseed_config::AppConfig;
use deskseed_provisioner::{ProvisionPlan, Provisioner};
use deskseed_transport::HttpTransport;

/// Arguments for `deskseedctl provision`.
#[derive(Debug, Args)]
pub struct ProvisionArgs {
    #[arg(long, help = "Number of org/user/ticket triples to create")]
    count: Option<usize>,
    #[arg(long, help = "Display label embedded in generated names")]
    label: Option<String>,
    #[arg(
        long = "run-id",
        help = "Explicit run identity (defaults to a clock-derived token)"
    )]
    run_id: Option<String>,
    #[arg(long, help = "Tag created orgs and users with the run identity")]
    tag: bool,
    #[arg(long, help = "Max create requests in flight within one stage")]
    concurrency: Option<usize>,
    #[arg(long, help = "Write a manifest of created ids to this path")]
    manifest: Option<PathBuf>,
}

/// Execute a provisioning run against the configured tenant.
pub async fn run(config: &AppConfig, args: ProvisionArgs) -> Result<()> {
    let run = match args.run_id {
        Some(label) => RunIdentity::from_label(label),
        None => RunIdentity::from_clock(),
    };
    let count = args.count.unwrap_or(config.provision.count);
    let label = args.label.unwrap_or_else(|| config.provision.label.clone());
    let concurrency = args
        .concurrency
        .unwrap_or(config.provision.stage_concurrency);

    let mut plan =
        ProvisionPlan::new(count, label, run.clone()).with_stage_concurrency(concurrency);
    if args.tag {
        plan = plan.with_tag(run.as_str());
    }

    let transport = HttpTransport::new(&config.tenant)?;
    let report = Provisioner::new(&transport, plan)
        .run()
        .await
        .with_context(|| format!("provisioning run {run} failed"))?;

    if let Some(path) = &args.manifest {
        report
            .manifest
            .persist(path)
            .with_context(|| format!("failed to persist manifest for run {run}"))?;
        println!("manifest written to {}", path.display());
    }

    println!(
        "run {} complete: {} organizations, {} users, {} tickets",
        report.run,
        report.organizations.len(),
        report.users.len(),
        report.tickets.len()
    );
    println!("keep the run id to reclaim later: {}", report.run);
    Ok(())
}
