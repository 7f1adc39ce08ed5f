use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "org-navigator")]
#[command(about = "A TUI for browsing and reorganizing the intranet org-unit hierarchy")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to the TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the org-unit API, overrides the configuration
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Log to stderr (non-interactive commands only)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the interactive TUI (default)
    Run,
    /// Print the filtered tree of a saved API response
    Dump {
        /// Path to a JSON tree response
        #[arg(short, long)]
        snapshot: PathBuf,
        /// Search query applied before printing
        #[arg(short, long, default_value = "")]
        query: String,
        /// Include inactive units
        #[arg(long)]
        show_inactive: bool,
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the parents a unit may be moved under
    Candidates {
        /// Path to a JSON tree response
        #[arg(short, long)]
        snapshot: PathBuf,
        /// ID of the unit being moved
        #[arg(short, long)]
        node: String,
        /// Only keep candidates whose title contains this text
        #[arg(short, long)]
        filter: Option<String>,
        /// Offer inactive units as targets
        #[arg(long)]
        include_inactive: bool,
    },
    /// Render one frame of the TUI from a saved API response
    Screenshot {
        /// Path to a JSON tree response
        #[arg(short, long)]
        snapshot: PathBuf,
        /// Output file for the screenshot (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Terminal width for rendering
        #[arg(long, default_value = "120")]
        width: u16,
        /// Terminal height for rendering
        #[arg(long, default_value = "40")]
        height: u16,
        /// Search query to apply before rendering
        #[arg(short, long)]
        query: Option<String>,
        /// ID of the unit to select before rendering
        #[arg(long)]
        select: Option<String>,
    },
}
