use clap::{Parser, Subcommand, ValueEnum};
use pagekeep_common::CaptureMode;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pagekeep")]
#[command(about = "Capture web pages as readable, size-bounded bookmarks")]
#[command(version)]
pub struct Cli {
    /// YAML configuration file (defaults to the per-user config if present)
    #[arg(long, global = true, value_name = "PATH", env = "PAGEKEEP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Also write logs to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full pipeline and print the page record as JSON
    Extract {
        url: String,

        /// Use this HTML instead of fetching (implies `--mode client`)
        #[arg(long, value_name = "PATH")]
        html_file: Option<PathBuf>,

        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// Skip article extraction; only cleaned HTML is produced
        #[arg(long)]
        no_full_content: bool,

        /// Rendered-text budget of the cleaned HTML
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        max_chars: Option<u64>,

        #[arg(long)]
        pretty: bool,
    },

    /// Normalize a local HTML file and print the cleaned document
    Normalize {
        #[arg(long, value_name = "PATH")]
        html_file: PathBuf,

        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        max_chars: Option<u64>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    ServerSide,
    Client,
}

impl From<ModeArg> for CaptureMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::ServerSide => CaptureMode::ServerSide,
            ModeArg::Client => CaptureMode::Client,
        }
    }
}
