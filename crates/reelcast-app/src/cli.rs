use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "reelcast",
    version,
    about = "Show what you're watching on Netflix and Disney+ as Discord rich presence"
)]
pub struct Cli {
    /// Config file to use instead of the one in the platform config dir
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Watch for playback and publish presence (default)
    Run,
    /// Sample titles once and show how each one classifies
    Detect,
    /// Write a starter config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Search the metadata service for a title
    Lookup {
        title: String,
        /// Treat the title as a show and prefer this season's poster
        #[arg(long)]
        season: Option<u32>,
    },
}

impl Cli {
    pub fn action(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run)
    }
}
