//! CLI for the mediagrab page media downloader.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use mediagrab_core::config;
use mediagrab_core::pipeline::Mode;
use std::path::PathBuf;

use commands::{run_completions, run_grab, run_robots, GrabOptions};

/// Top-level CLI for mediagrab.
#[derive(Debug, Parser)]
#[command(name = "mediagrab")]
#[command(about = "Download the images (and optionally videos) of a web page", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

/// What to download from the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Image,
    Video,
    Both,
}

impl From<ModeArg> for Mode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Image => Mode::Image,
            ModeArg::Video => Mode::Video,
            ModeArg::Both => Mode::Both,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download the media referenced by a page.
    Grab {
        /// Page URL (http or https).
        url: String,

        /// Image tags, videos via the external downloader, or both.
        #[arg(short, long, value_enum, default_value = "image")]
        mode: ModeArg,

        /// Output directory (default from config, normally ./media_download).
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Concurrent image downloads.
        #[arg(short, long, value_name = "N")]
        workers: Option<usize>,

        /// Only download videos whose title matches (case-insensitive). Implies video mode.
        #[arg(short, long)]
        keyword: Option<String>,

        /// Skip images whose declared size is below this many KB.
        #[arg(long, value_name = "KB")]
        min_size: Option<u64>,
    },

    /// Check whether the site's robots.txt allows fetching a page.
    Robots {
        /// Page URL to check.
        url: String,
    },

    /// Print a shell completion script to stdout.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Completions { shell } => run_completions(shell),
            CliCommand::Robots { url } => {
                let cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg);
                run_robots(&cfg, &url).await?;
            }
            CliCommand::Grab {
                url,
                mode,
                output,
                workers,
                keyword,
                min_size,
            } => {
                let cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg);
                let opts = GrabOptions {
                    url,
                    mode: mode.into(),
                    output,
                    workers,
                    keyword,
                    min_size_kb: min_size,
                };
                run_grab(&cfg, opts).await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
