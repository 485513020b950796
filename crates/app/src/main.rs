// CLI modules
mod cli;

use std::str::FromStr;

use clap::{Parser, Subcommand};
use cli::{args::Args, op::Op, Contact, Init, Inspect, Open, Seal, Version, Whoami};
use ndn_share::state::AppState;
use tracing::level_filters::LevelFilter;

command_enum! {
    Contact,
    Init,
    Inspect,
    Open,
    Seal,
    Version,
    Whoami,
}

/// Flag > config file > info
fn resolve_log_level(explicit: Option<&str>, state: Option<&AppState>) -> (LevelFilter, Option<String>) {
    if let Some(level) = explicit {
        return match LevelFilter::from_str(level) {
            Ok(level) => (level, None),
            Err(_) => (
                LevelFilter::INFO,
                Some(format!("ignoring invalid --log-level {:?}", level)),
            ),
        };
    }
    match state.map(|s| s.config.log_level()) {
        Some(Ok(level)) => (level, None),
        Some(Err(e)) => (LevelFilter::INFO, Some(e.to_string())),
        None => (LevelFilter::INFO, None),
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Logging settings come from the state directory when there is one
    let state = AppState::load(args.config_path.clone()).ok();
    let (level, warning) = resolve_log_level(args.log_level.as_deref(), state.as_ref());
    let log_dir = state.as_ref().and_then(|s| s.config.log_dir.clone());
    let guards = ndn_share::logging::init_logging(level, log_dir.as_deref());
    if let Some(warning) = warning {
        tracing::warn!("{}", warning);
    }

    let ctx = cli::op::OpContext::new(args.config_path);

    let code = match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    // flush the non-blocking writers before exiting
    drop(guards);
    std::process::exit(code);
}
