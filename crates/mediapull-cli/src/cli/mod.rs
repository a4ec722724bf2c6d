//! CLI for mediapull.

mod commands;
mod validate;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use mediapull_core::config;
use std::path::PathBuf;

use commands::{run_completions, run_list, run_man, run_pull};

/// Top-level CLI for mediapull.
#[derive(Debug, Parser)]
#[command(name = "mediapull")]
#[command(about = "Download every image from a media library account", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Account, credentials and listing filters shared by `pull` and `list`.
#[derive(Debug, Clone, Args)]
pub struct AccountArgs {
    /// Account identifier (cloud name).
    #[arg(long, short = 'c', value_name = "NAME")]
    pub cloud: String,

    /// API key.
    #[arg(long, short = 'k', env = "MEDIAPULL_API_KEY", hide_env_values = true)]
    pub key: String,

    /// API secret.
    #[arg(long, short = 's', env = "MEDIAPULL_API_SECRET", hide_env_values = true)]
    pub secret: String,

    /// Only include images whose public ID starts with this prefix.
    #[arg(long, short = 'p')]
    pub prefix: Option<String>,

    /// Entries per listing request (1-500; default from config, 500).
    #[arg(long, value_name = "N")]
    pub page_size: Option<u32>,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// List every image, then download them all into the output directory.
    Pull {
        #[command(flatten)]
        account: AccountArgs,

        /// Existing directory to download into.
        #[arg(long, short = 'o', value_name = "DIR")]
        output_dir: PathBuf,

        /// Maximum concurrent downloads (default from config, 5).
        #[arg(long, short = 'j', value_name = "N")]
        concurrency: Option<usize>,

        /// Print a line for every image as it is fetched.
        #[arg(long, short = 'v')]
        verbose: bool,

        /// Don't draw the live progress bar.
        #[arg(long)]
        no_progress: bool,
    },

    /// List images without downloading anything.
    List {
        #[command(flatten)]
        account: AccountArgs,
    },

    /// Generate shell completions on stdout.
    Completions {
        /// Target shell.
        shell: Shell,
    },

    /// Print the man page (roff) on stdout.
    Man,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Pull {
                account,
                output_dir,
                concurrency,
                verbose,
                no_progress,
            } => {
                let cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg);
                let run_cfg = validate::pull_config(
                    &cfg,
                    &account,
                    output_dir,
                    concurrency,
                    verbose,
                    !no_progress,
                )?;
                run_pull(run_cfg).await?;
            }
            CliCommand::List { account } => {
                let cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg);
                let run_cfg = validate::list_config(&cfg, &account)?;
                run_list(run_cfg).await?;
            }
            CliCommand::Completions { shell } => run_completions(shell),
            CliCommand::Man => run_man()?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
