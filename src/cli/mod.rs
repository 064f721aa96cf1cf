//! Command-line interface.

pub mod banner;
pub mod check;
pub mod completions;
pub mod output;
pub mod setup;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::core::settings::SecretMethod;

/// streamhost - run a 24/7 YouTube Live restream on GitHub Actions.
#[derive(Parser)]
#[command(
    name = "streamhost",
    about = "Provision a GitHub repository that restreams a video to YouTube Live",
    version,
    after_help = "Your PC can be off. The stream keeps going."
)]
pub struct Cli {
    /// Show debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Create the repository, upload files, set secrets and start the workflow
    Setup(SetupArgs),

    /// Validate local files and configuration without touching the network
    Check {
        /// Directory holding setup_github.txt and the payload files
        #[arg(short, long, env = "STREAMHOST_DIR", default_value = ".")]
        dir: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Options for `streamhost setup`.
#[derive(Args, Debug)]
pub struct SetupArgs {
    /// Directory holding setup_github.txt and the payload files
    #[arg(short, long, env = "STREAMHOST_DIR", default_value = ".")]
    pub dir: PathBuf,

    /// GitHub REST endpoint (e.g. a GitHub Enterprise /api/v3 URL)
    #[arg(long, env = "STREAMHOST_API_URL")]
    pub api_url: Option<String>,

    /// How to write repository secrets: auto, api or cli
    #[arg(long, env = "STREAMHOST_SECRET_METHOD")]
    pub secret_method: Option<SecretMethod>,

    /// Do not require git to be installed
    #[arg(long)]
    pub skip_git_check: bool,

    /// Skip ASCII art banner
    #[arg(long)]
    pub no_banner: bool,
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

/// Execute a command.
pub fn execute(command: Command) -> crate::error::Result<()> {
    match command {
        Command::Setup(args) => setup::execute(args),
        Command::Check { dir } => check::execute(&dir),
        Command::Completions { shell } => completions::execute(shell),
    }
}
