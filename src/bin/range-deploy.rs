// Copyright (c) 2025 - Cowboy AI, Inc.
//! Range Deployment Tool
//!
//! Validates an exercise specification and, on request, materializes it
//! against the in-memory platform as a dry run so the full provisioning
//! pipeline (masters, templates, instances) can be inspected before driving
//! a real backend.
//!
//! Usage:
//!   range-deploy [--check-syntax] [--dry-run] [--verbose] [--file LOGINS] SPEC
//!
//! Cleanup phases prompt for confirmation before destroying anything.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use range_orchestrator::platform::{InMemoryPlatform, LoginConfig, PlatformConfig};
use range_orchestrator::provision::{Orchestrator, ProvisionConfig};
use range_orchestrator::spec::{check_syntax, document, ExerciseSpec, ServiceOrigin, SpecKind};

/// Invocation settings parsed from the command line
#[derive(Debug, Clone, Default)]
struct DeployArgs {
    spec_path: Option<PathBuf>,
    login_file: Option<PathBuf>,
    check_syntax_only: bool,
    dry_run: bool,
    cleanup: bool,
    verbose: bool,
}

impl DeployArgs {
    fn from_env() -> Result<Self> {
        let mut args = Self::default();
        let mut argv = std::env::args().skip(1);
        while let Some(arg) = argv.next() {
            match arg.as_str() {
                "--check-syntax" | "-c" => args.check_syntax_only = true,
                "--dry-run" => args.dry_run = true,
                "--cleanup" => args.cleanup = true,
                "--verbose" | "-v" => args.verbose = true,
                "--file" | "-f" => {
                    let path = argv.next().context("--file requires a path")?;
                    args.login_file = Some(PathBuf::from(path));
                }
                other if !other.starts_with('-') => args.spec_path = Some(PathBuf::from(other)),
                other => bail!("Unknown argument: {other}"),
            }
        }
        if args.spec_path.is_none() {
            bail!("Usage: range-deploy [--check-syntax] [--dry-run] [--cleanup] [--verbose] [--file LOGINS] SPEC");
        }
        Ok(args)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = DeployArgs::from_env()?;

    let default_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_level.into()),
        )
        .init();

    let spec_path = args.spec_path.clone().context("missing spec path")?;
    let (doc, report) = check_syntax(&spec_path, SpecKind::Exercise)
        .with_context(|| format!("ingesting {}", spec_path.display()))?;
    if !report.is_acceptable() {
        bail!(
            "specification rejected with {} errors, {} warnings",
            report.errors(),
            report.warnings()
        );
    }
    if args.check_syntax_only {
        return Ok(());
    }

    let spec = ExerciseSpec::from_document(&doc).context("building exercise model")?;

    // Resolve the platform configuration the spec points at
    let infra_doc = document::parse_yaml_file(&spec.metadata.infra_file)
        .with_context(|| format!("reading {}", spec.metadata.infra_file.display()))?;
    let platforms = PlatformConfig::from_document(&infra_doc)?;
    let vsphere = platforms.iter().find_map(|p| match p {
        PlatformConfig::VmwareVsphere(config) => Some(config.clone()),
        _ => None,
    });
    let Some(vsphere) = vsphere else {
        bail!("no vmware-vsphere platform declared in {}", spec.metadata.infra_file.display());
    };

    // Fail fast on unusable credentials before any provisioning
    if let Some(login_file) = args.login_file.as_ref().or(vsphere.login_file.as_ref()) {
        let login = LoginConfig::from_file(login_file)?;
        info!("Loaded credentials for {}@{}", login.username, login.host);
    } else {
        warn!("No login file configured; proceeding without credentials");
    }

    if !args.dry_run && !args.cleanup {
        info!("Validation complete. Re-run with --dry-run to materialize the environment in memory.");
        return Ok(());
    }

    // Materialize against the in-memory platform, seeded with the templates
    // the specification expects to find
    let platform = Arc::new(InMemoryPlatform::new());
    for (_, service) in spec.services.iter() {
        if let ServiceOrigin::Template(template) = &service.origin {
            platform.seed_template(
                &format!("/{}", vsphere.template_folder),
                template,
                service.network_interfaces.len(),
            );
        }
    }

    let config = ProvisionConfig::from_vsphere(&vsphere);
    let mut orchestrator = Orchestrator::new(platform.clone(), spec, config);

    orchestrator.initialize().await?;
    let masters = orchestrator.create_masters().await?;
    for (service, error) in masters.failed() {
        warn!("Master {} skipped: {}", service, error);
    }
    let outcome = orchestrator.deploy_environment().await?;
    info!(
        "Dry run complete: {} masters, {} instances, {} skipped items",
        masters.succeeded().len(),
        outcome.deployed.succeeded().len(),
        masters.failed().len() + outcome.converted.failed().len() + outcome.deployed.failed().len()
    );

    println!("Deployed inventory:");
    for vm in platform.vm_ids() {
        println!("  {vm}");
    }
    println!("Port-groups:");
    for network in platform.network_names() {
        println!("  {network}");
    }

    if args.cleanup {
        if !confirm("Destroy the deployed environment and its port-groups?")? {
            info!("Cleanup aborted by operator");
            return Ok(());
        }
        orchestrator.cleanup_environment(true).await?;
        info!("Environment cleaned up");
    }

    Ok(())
}

/// Prompt the operator before a destructive phase
fn confirm(question: &str) -> Result<bool> {
    print!("{question} [y/N] ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
