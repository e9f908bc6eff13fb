//! Command line surface

pub mod orchestration;

use clap::Parser;

#[derive(Parser, Debug, Clone, PartialEq)]
#[command(
    name = "release-tagger",
    version,
    about = "Create version tags and release branches from conventional commits"
)]
pub struct Args {
    #[arg(long, value_name = "BRANCH", help = "Trunk branch to cut minor and major releases from")]
    pub trunk: Option<String>,

    #[arg(short, long, value_name = "PATH", help = "Custom configuration file path")]
    pub config: Option<String>,

    #[arg(
        short = 'C',
        long = "repo",
        value_name = "PATH",
        default_value = ".",
        help = "Repository to operate on"
    )]
    pub repo_path: String,

    #[arg(long, value_name = "NAME", help = "Remote to fetch from and push to")]
    pub remote: Option<String>,

    #[arg(long, value_name = "N", help = "Commits requested per history page")]
    pub page_size: Option<usize>,

    #[arg(long, help = "Preview what would happen without making changes")]
    pub dry_run: bool,

    #[arg(short, long, help = "Log debug diagnostics")]
    pub verbose: bool,
}
