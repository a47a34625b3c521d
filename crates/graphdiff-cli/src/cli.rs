use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "graphdiff",
    about = "Structural diff of two JSON documents",
    version
)]
pub struct Cli {
    /// The working (new) document
    pub working: PathBuf,

    /// The base (old) document
    pub base: PathBuf,

    /// TOML comparison configuration
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Ignore the node at PATH, e.g. `/[meta]` (repeatable)
    #[arg(long = "ignore", value_name = "PATH")]
    pub ignore: Vec<String>,

    /// Print every node, including hidden ones
    #[arg(long)]
    pub all: bool,

    /// Print per-state counts after the nodes
    #[arg(long)]
    pub summary: bool,

    #[arg(long, default_value = "text")]
    pub format: OutputFormat,

    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
