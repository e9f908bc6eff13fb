//! Main workflow orchestration logic
//!
//! Keeps argument and configuration merging out of main.rs so the release
//! workflow can be driven programmatically without depending on clap.

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::engine::{EngineSettings, ReleaseEngine, RunReport};
use crate::gateway::repository::Tagger;
use crate::gateway::{DryRunGateway, Gateway, Git2Gateway};

/// Arguments for the release workflow
///
/// Mirrors the CLI Args in a shape suitable for orchestration logic.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseWorkflowArgs {
    /// Path to custom config file
    pub config_path: Option<String>,

    /// Repository to operate on
    pub repo_path: String,

    /// Trunk branch, overrides the configured one
    pub trunk: Option<String>,

    /// Remote to fetch from and push to, overrides the configured one
    pub remote: Option<String>,

    /// Commits per history page, overrides the configured one
    pub page_size: Option<usize>,

    /// Preview mode: compute every write, perform none
    pub dry_run: bool,
}

impl From<&super::Args> for ReleaseWorkflowArgs {
    fn from(args: &super::Args) -> Self {
        ReleaseWorkflowArgs {
            config_path: args.config.clone(),
            repo_path: args.repo_path.clone(),
            trunk: args.trunk.clone(),
            remote: args.remote.clone(),
            page_size: args.page_size,
            dry_run: args.dry_run,
        }
    }
}

/// Engine settings from command line values layered over the config file
pub fn engine_settings(args: &ReleaseWorkflowArgs, config: &Config) -> Result<EngineSettings> {
    let trunk = config.resolve_trunk(args.trunk.as_deref())?;
    let page_size = args.page_size.unwrap_or(config.history.page_size);
    if page_size == 0 {
        anyhow::bail!("Page size must be at least 1");
    }

    Ok(EngineSettings {
        trunk,
        page_size,
        max_pages: config.history.page_ceiling(),
    })
}

/// Main release workflow
///
/// 1. Merge arguments over configuration
/// 2. Open the repository, fetching from the remote when one is set
/// 3. Run the release engine, through a dry-run gateway when previewing
pub fn run_release_workflow(args: ReleaseWorkflowArgs, config: Config) -> Result<RunReport> {
    let settings = engine_settings(&args, &config)?;
    let remote = args.remote.clone().or_else(|| config.publish.remote.clone());
    let tagger = Tagger {
        name: config.publish.tagger_name.clone(),
        email: config.publish.tagger_email.clone(),
    };

    let gateway = Git2Gateway::open(&args.repo_path, remote, tagger)
        .with_context(|| format!("Failed to open repository at {}", args.repo_path))?;

    info!(trunk = %settings.trunk, dry_run = args.dry_run, "starting release run");
    execute_on(gateway, settings, args.dry_run)
}

/// Run the engine on any gateway; writes are only recorded when `dry_run` is set
pub fn execute_on<G: Gateway>(
    gateway: G,
    settings: EngineSettings,
    dry_run: bool,
) -> Result<RunReport> {
    let report = if dry_run {
        let preview = DryRunGateway::new(gateway);
        ReleaseEngine::new(&preview, settings).run()?
    } else {
        ReleaseEngine::new(&gateway, settings).run()?
    };
    Ok(report)
}
