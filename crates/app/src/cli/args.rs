pub use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ndn-share")]
#[command(about = "Seal files for a set of recipients and open files sealed for you")]
pub struct Args {
    /// Path to the ndn-share state directory (defaults to ~/.ndn-share)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    /// Log level, overrides the configured one (RUST_LOG still wins)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: crate::Command,
}
