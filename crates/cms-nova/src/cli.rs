//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use cms_nova_core::UpgradeMode;

/// Create a CMS Nova project, or upgrade an existing one from the template
#[derive(Parser, Debug)]
#[command(name = "create-cms-nova")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
#[command(after_help = "Examples:\n  create-cms-nova my-site\n  create-cms-nova upgrade --dry-run\n  create-cms-nova upgrade --mode merge")]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(flatten)]
    pub create: CreateArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Bring the project in the current directory up to date with the template
    Upgrade(UpgradeArgs),
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Directory name for the new project
    pub name: Option<String>,

    /// Template repository to clone
    #[arg(long, env = "CMS_NOVA_TEMPLATE_REPO")]
    pub template_repo: Option<String>,

    /// Template branch or tag to clone
    #[arg(long)]
    pub branch: Option<String>,

    /// Do not run npm install
    #[arg(long)]
    pub skip_install: bool,
}

#[derive(Args, Debug)]
pub struct UpgradeArgs {
    /// Template tag, branch or commit to upgrade to (default: the remote's HEAD)
    #[arg(long)]
    pub tag: Option<String>,

    /// Upgrade strategy
    #[arg(long, value_enum, default_value_t = ModeArg::Paths)]
    pub mode: ModeArg,

    /// Show what would change without touching the project
    #[arg(long)]
    pub dry_run: bool,

    /// Comma-separated paths to sync instead of the built-in list
    #[arg(long, value_delimiter = ',')]
    pub paths: Option<Vec<String>>,

    /// Tag HEAD as backup-<timestamp> before changing anything
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    pub backup: bool,

    /// Run even if the working tree has uncommitted changes
    #[arg(long)]
    pub allow_dirty: bool,

    /// Ask before each change; false applies template changes in batch
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    pub interactive: bool,

    /// Template repository used for the upstream remote
    #[arg(long, env = "CMS_NOVA_TEMPLATE_REPO")]
    pub template_repo: Option<String>,

    /// Project directory (default: current directory)
    #[arg(short = 'C', long)]
    pub dir: Option<Utf8PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    /// Reconcile a curated set of paths file by file
    Paths,
    /// Merge the template branch into the project
    Merge,
}

impl From<ModeArg> for UpgradeMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Paths => UpgradeMode::Paths,
            ModeArg::Merge => UpgradeMode::Merge,
        }
    }
}
