use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use release_tagger::cli::orchestration::{run_release_workflow, ReleaseWorkflowArgs};
use release_tagger::cli::Args;
use release_tagger::{config, ui};

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("release_tagger={}", default_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let workflow = ReleaseWorkflowArgs::from(&args);

    // Load configuration
    let config = match config::load_config(workflow.config_path.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            ui::display_error(&format!("Error loading config: {}", e));
            std::process::exit(1);
        }
    };

    if workflow.dry_run {
        ui::display_status("Dry run: no tags or branches will be written");
    }

    let dry_run = workflow.dry_run;
    match run_release_workflow(workflow, config) {
        Ok(report) => {
            ui::display_report(&report, dry_run);
            Ok(())
        }
        Err(e) => {
            ui::display_error(&format!("{:#}", e));
            std::process::exit(1);
        }
    }
}
