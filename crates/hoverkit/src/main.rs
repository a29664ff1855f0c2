//! Binary entrypoint for hoverkit.
use std::{path::PathBuf, process};

use clap::{Parser, Subcommand};
use config::Config;
use hoverkit_engine::{HandlerRegistry, ServiceOptions};
use tracing::{debug, error};

/// Scripted host and headless window layer.
mod headless;
/// Scenario files and their replay.
mod replay;

#[derive(Parser, Debug)]
#[command(
    name = "hoverkit",
    about = "Overlay handler dispatch and UI tree scanning",
    version
)]
/// Command-line interface for the `hoverkit` binary.
struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,

    /// Logging controls
    #[command(flatten)]
    log: logging::LogArgs,

    /// Optional path to the config file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
/// Top-level CLI subcommands.
enum Command {
    /// Load and validate the configuration then exit.
    Check {
        /// Dump the resolved configuration as JSON to stdout
        #[arg(long)]
        dump: bool,
    },
    /// Run the service against a scripted headless host.
    Replay {
        /// Scenario file (RON list of steps)
        scenario: PathBuf,

        /// Print a text report after each scan result
        #[arg(long)]
        report: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(&cli.log);

    let cfg = match config::load(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}", e.pretty());
            process::exit(1);
        }
    };

    match cli.command {
        Command::Check { dump } => check(&cfg, dump),
        Command::Replay { scenario, report } => {
            if let Err(e) = replay::run(&cfg, &scenario, report) {
                error!(error = %e, "replay_failed");
                eprintln!("{e}");
                process::exit(1);
            }
        }
    }
}

/// Validate everything the service would build from `cfg`.
fn check(cfg: &Config, dump: bool) {
    let options = match ServiceOptions::from_config(cfg) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };
    let registry = HandlerRegistry::from_profiles(&cfg.apps, &options.overlay);
    debug!(packages = registry.len(), "config_checked");
    if dump {
        match serde_json::to_string_pretty(cfg) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Failed to serialize config: {e}");
                process::exit(1);
            }
        }
    } else {
        println!("OK");
    }
}
